use alloc::string::String;
use alloc::sync::Arc;
use core::any::TypeId;
use core::marker::PhantomData;

use crate::class::class::BaseLink;
use crate::class::{
    AttributeDesc, Class, ClassType, ConstructorDesc, DEFAULT_CONSTRUCTOR, IntoConstructor,
    IntoMethod, MethodDesc, SignalDesc, SlotDesc, root_class,
};
use crate::event::{EventArgs, Signal, Slot};
use crate::object::{Object, ObjectExt};
use crate::types::RttiType;

// -----------------------------------------------------------------------------
// ClassBuilder

/// Fluent builder of the [`Class`] of `C`.
///
/// Unless [`base`](Self::base), [`base_name`](Self::base_name) or
/// [`no_base`](Self::no_base) is called, the class derives from the root
/// class `PLCore::Object`.
///
/// # Examples
///
/// ```
/// use pl_rtti::class::ClassBuilder;
/// use pl_rtti::event::Signal;
/// # use pl_rtti::class::{Class, ClassCell, ClassRef, ClassType};
/// # use pl_rtti::object::Object;
///
/// #[derive(Default)]
/// struct Lamp {
///     power: f32,
///     on: bool,
///     switched: Signal<(bool,)>,
/// }
/// # impl Object for Lamp {
/// #     fn class(&self) -> ClassRef { Self::static_class() }
/// # }
/// # impl ClassType for Lamp {
/// #     fn build_class() -> Class { build() }
/// #     fn static_class() -> ClassRef {
/// #         static CELL: ClassCell = ClassCell::new();
/// #         CELL.get_or_build::<Self>()
/// #     }
/// # }
///
/// fn build() -> Class {
///     ClassBuilder::<Lamp>::new("Lamp")
///         .namespace("Demo")
///         .description("A light source")
///         .property("Icon", "lamp.png")
///         .field("Power", 60.0f32, |l| &l.power, |l| &mut l.power)
///         .accessor("On", false, |l: &Lamp| l.on, Some(|l: &mut Lamp, on| l.on = on))
///         .method("Toggle", |l: &mut Lamp| {
///             l.on = !l.on;
///             l.switched.emit((l.on,));
///         })
///         .signal("Switched", |l| &l.switched)
///         .default_constructor()
///         .build()
/// }
///
/// let class = build();
/// assert_eq!(class.full_name(), "Demo::Lamp");
/// assert_eq!(class.property("Icon"), Some("lamp.png"));
/// assert_eq!(class.method("Toggle").unwrap().signature(), "void()");
/// ```
pub struct ClassBuilder<C: Object> {
    class: Class,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Object> ClassBuilder<C> {
    /// Starts a class named `name`, deriving from the root class.
    pub fn new(name: &'static str) -> Self {
        let mut class = Class::new(name, "", BaseLink::Static(root_class));
        class.type_id = Some(TypeId::of::<C>());
        Self {
            class,
            _marker: PhantomData,
        }
    }

    /// Sets the namespace, the full name becomes `namespace::name`.
    pub fn namespace(mut self, namespace: &'static str) -> Self {
        self.class.namespace = namespace;
        self.class.full_name = if namespace.is_empty() {
            String::from(self.class.name)
        } else {
            alloc::format!("{namespace}::{}", self.class.name)
        };
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.class.description = description;
        self
    }

    /// Adds a free-form property. A repeated key replaces the previous value.
    pub fn property(mut self, key: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.class.properties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.class.properties.push((key, value)),
        }
        self
    }

    /// Derives from the class of `B`.
    pub fn base<B: ClassType>(mut self) -> Self {
        self.class.base = BaseLink::Static(B::static_class);
        self
    }

    /// Derives from a class resolved by name, through the manager the class
    /// is registered in or the global one.
    pub fn base_name(mut self, name: &'static str) -> Self {
        self.class.base = BaseLink::named(name);
        self
    }

    /// Removes the base class link.
    pub fn no_base(mut self) -> Self {
        self.class.base = BaseLink::None;
        self
    }

    // ----- Attributes

    /// Adds a prepared attribute descriptor.
    ///
    /// An attribute with the same name on this class is replaced.
    pub fn attribute(mut self, desc: AttributeDesc) -> Self {
        let desc = Arc::new(desc);
        let list = &mut self.class.attributes;
        match list.iter().position(|a| a.name() == desc.name()) {
            Some(index) => list[index] = desc,
            None => list.push(desc),
        }
        self
    }

    /// Adds a read-write attribute stored in a field.
    pub fn field<T: RttiType>(
        self,
        name: &'static str,
        default: T,
        get: fn(&C) -> &T,
        get_mut: fn(&mut C) -> &mut T,
    ) -> Self {
        self.attribute(AttributeDesc::field(name, default, get, get_mut))
    }

    /// Adds a read-only attribute stored in a field.
    pub fn read_only_field<T: RttiType>(
        self,
        name: &'static str,
        default: T,
        get: fn(&C) -> &T,
    ) -> Self {
        self.attribute(AttributeDesc::read_only_field(name, default, get))
    }

    /// Adds an attribute backed by a getter and an optional setter.
    pub fn accessor<T: RttiType>(
        self,
        name: &'static str,
        default: T,
        get: fn(&C) -> T,
        set: Option<fn(&mut C, T)>,
    ) -> Self {
        self.attribute(AttributeDesc::property(name, default, get, set))
    }

    // ----- Methods

    /// Adds a prepared method descriptor.
    pub fn method_desc(mut self, desc: MethodDesc) -> Self {
        let desc = Arc::new(desc);
        let list = &mut self.class.methods;
        match list.iter().position(|m| m.name() == desc.name()) {
            Some(index) => list[index] = desc,
            None => list.push(desc),
        }
        self
    }

    /// Adds a method, see [`IntoMethod`] for the accepted functions.
    pub fn method<M, F: IntoMethod<C, M>>(self, name: &'static str, f: F) -> Self {
        self.method_desc(MethodDesc::new(name, f))
    }

    // ----- Constructors

    /// Adds a constructor, see [`IntoConstructor`] for the accepted functions.
    pub fn constructor<M, F: IntoConstructor<C, M>>(mut self, name: &'static str, f: F) -> Self {
        let desc = Arc::new(ConstructorDesc::new(name, f));
        let list = &mut self.class.constructors;
        match list.iter().position(|c| c.name() == name) {
            Some(index) => list[index] = desc,
            None => list.push(desc),
        }
        self
    }

    /// Adds `DefaultConstructor` using [`Default`].
    ///
    /// The new instance has every attribute set to its declared default.
    pub fn default_constructor(self) -> Self
    where
        C: Default,
    {
        self.constructor(DEFAULT_CONSTRUCTOR, || {
            let mut object = C::default();
            object.set_default_values();
            object
        })
    }

    // ----- Events

    /// Adds a prepared signal descriptor.
    pub fn signal_desc(mut self, desc: SignalDesc) -> Self {
        let desc = Arc::new(desc);
        let list = &mut self.class.signals;
        match list.iter().position(|s| s.name() == desc.name()) {
            Some(index) => list[index] = desc,
            None => list.push(desc),
        }
        self
    }

    /// Adds a signal stored in a field.
    pub fn signal<A: EventArgs>(self, name: &'static str, get: fn(&C) -> &Signal<A>) -> Self {
        self.signal_desc(SignalDesc::field(name, get))
    }

    /// Adds a prepared slot descriptor.
    pub fn slot_desc(mut self, desc: SlotDesc) -> Self {
        let desc = Arc::new(desc);
        let list = &mut self.class.slots;
        match list.iter().position(|s| s.name() == desc.name()) {
            Some(index) => list[index] = desc,
            None => list.push(desc),
        }
        self
    }

    /// Adds a slot stored in a field.
    pub fn slot<A: EventArgs>(self, name: &'static str, get: fn(&C) -> &Slot<A>) -> Self {
        self.slot_desc(SlotDesc::field(name, get))
    }

    /// Finishes the class.
    pub fn build(self) -> Class {
        #[cfg(feature = "debug")]
        log::trace!(
            "Built class `{}` with {} attribute(s), {} method(s)",
            self.class.full_name,
            self.class.attributes.len(),
            self.class.methods.len(),
        );
        self.class
    }
}
