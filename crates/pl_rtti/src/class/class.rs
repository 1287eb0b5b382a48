use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::OnceLock;

use crate::class::{AttributeDesc, ConstructorDesc, MethodDesc, SignalDesc, SlotDesc};
use crate::object::{CallError, DynParams, Object, ObjectRef};
use crate::registry::ClassManager;

/// A shared handle to a [`Class`].
pub type ClassRef = Arc<Class>;

// -----------------------------------------------------------------------------
// ClassType

/// A Rust type with a per-type [`Class`] singleton.
///
/// Usually implemented through `#[derive(Object)]`. A manual
/// implementation keeps the singleton in a [`ClassCell`].
pub trait ClassType: Object + Sized {
    /// Builds the class. Called once, by [`static_class`](ClassType::static_class).
    fn build_class() -> Class;

    /// Returns the class singleton of this type.
    fn static_class() -> ClassRef;
}

/// Lazily built class singleton.
pub struct ClassCell(OnceLock<ClassRef>);

impl ClassCell {
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the class of `C`, building it on first use.
    #[inline]
    pub fn get_or_build<C: ClassType>(&self) -> ClassRef {
        Arc::clone(self.0.get_or_init(|| Arc::new(C::build_class())))
    }
}

// -----------------------------------------------------------------------------
// BaseLink

pub(crate) enum BaseLink {
    None,
    Static(fn() -> ClassRef),
    Named {
        name: &'static str,
        resolved: OnceLock<ClassRef>,
    },
}

impl BaseLink {
    pub(crate) fn named(name: &'static str) -> Self {
        Self::Named {
            name,
            resolved: OnceLock::new(),
        }
    }

    fn resolve(&self) -> Option<ClassRef> {
        match self {
            Self::None => None,
            Self::Static(get) => Some(get()),
            Self::Named { name, resolved } => {
                if let Some(class) = resolved.get() {
                    return Some(Arc::clone(class));
                }
                let class = ClassManager::global().get_class(name)?;
                Some(Arc::clone(resolved.get_or_init(|| class)))
            }
        }
    }

    fn bind(&self, manager: &ClassManager) -> bool {
        if let Self::Named { name, resolved } = self
            && resolved.get().is_none()
            && let Some(class) = manager.get_class(name)
        {
            return resolved.set(class).is_ok();
        }
        false
    }
}

struct Members {
    attributes: Vec<Arc<AttributeDesc>>,
    methods: Vec<Arc<MethodDesc>>,
    signals: Vec<Arc<SignalDesc>>,
    slots: Vec<Arc<SlotDesc>>,
}

/// Appends `own` to `merged`, replacing same-named entries in place.
fn merge<T>(merged: &mut Vec<Arc<T>>, own: &[Arc<T>], name: impl Fn(&T) -> &'static str) {
    for item in own {
        let key = name(item.as_ref());
        match merged.iter().position(|m| name(m.as_ref()) == key) {
            Some(index) => merged[index] = Arc::clone(item),
            None => merged.push(Arc::clone(item)),
        }
    }
}

// -----------------------------------------------------------------------------
// Class

/// Runtime description of a reflected class.
///
/// A class is identified by its full name `Namespace::Name` and links to at
/// most one base class. Member lists come in two flavours:
///
/// - `own_*` returns the members declared on this class.
/// - The plain accessors return the merged view over the whole base chain,
///   base members first. A member declared with the name of a base member
///   replaces it at the base member's position.
///
/// Classes are shared through [`ClassRef`]. They are built with
/// [`ClassBuilder`](crate::class::ClassBuilder).
pub struct Class {
    pub(crate) name: &'static str,
    pub(crate) namespace: &'static str,
    pub(crate) full_name: String,
    pub(crate) description: &'static str,
    pub(crate) type_id: Option<TypeId>,
    pub(crate) base: BaseLink,
    pub(crate) properties: Vec<(&'static str, String)>,
    pub(crate) attributes: Vec<Arc<AttributeDesc>>,
    pub(crate) methods: Vec<Arc<MethodDesc>>,
    pub(crate) constructors: Vec<Arc<ConstructorDesc>>,
    pub(crate) signals: Vec<Arc<SignalDesc>>,
    pub(crate) slots: Vec<Arc<SlotDesc>>,
    merged: OnceLock<Members>,
    registrations: AtomicUsize,
    unloaded: AtomicBool,
}

impl Class {
    pub(crate) fn new(name: &'static str, namespace: &'static str, base: BaseLink) -> Self {
        let full_name = if namespace.is_empty() {
            String::from(name)
        } else {
            format!("{namespace}::{name}")
        };
        Self {
            name,
            namespace,
            full_name,
            description: "",
            type_id: None,
            base,
            properties: Vec::new(),
            attributes: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            signals: Vec::new(),
            slots: Vec::new(),
            merged: OnceLock::new(),
            registrations: AtomicUsize::new(0),
            unloaded: AtomicBool::new(false),
        }
    }

    // ----- Identity

    /// Returns the class name without namespace.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// Returns `Namespace::Name`, or just the name without a namespace.
    #[inline]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[inline]
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Returns the [`TypeId`] of the Rust type, `None` for the root class.
    #[inline]
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    /// Returns `true` if `name` is the full or the short name of this class.
    #[inline]
    pub fn has_name(&self, name: &str) -> bool {
        self.full_name == name || self.name == name
    }

    /// Returns the free-form properties in declaration order.
    #[inline]
    pub fn properties(&self) -> &[(&'static str, String)] {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    // ----- Inheritance

    /// Returns the base class.
    ///
    /// A base given by name resolves through the [`ClassManager`] the class
    /// is registered in, falling back to the global one, and stays fixed
    /// once resolved.
    pub fn base(&self) -> Option<ClassRef> {
        self.base.resolve()
    }

    /// Resolves a base given by name through `manager`.
    ///
    /// Returns `false` if there is no such base, it is already resolved or
    /// `manager` does not know it.
    pub(crate) fn bind_base(&self, manager: &ClassManager) -> bool {
        self.base.bind(manager)
    }

    /// Returns the name of the base class, without resolving it.
    pub fn base_name(&self) -> Option<String> {
        match &self.base {
            BaseLink::None => None,
            BaseLink::Static(get) => Some(String::from(get().full_name())),
            BaseLink::Named { name, .. } => Some(String::from(*name)),
        }
    }

    /// Returns the resolved base chain, nearest base first.
    ///
    /// The walk stops at an unresolvable base or at a repeated class.
    pub fn base_chain(&self) -> Vec<ClassRef> {
        let mut chain: Vec<ClassRef> = Vec::new();
        let mut next = self.base();
        while let Some(class) = next {
            let repeated = core::ptr::eq(Arc::as_ptr(&class), self)
                || chain.iter().any(|c| Arc::ptr_eq(c, &class));
            if repeated {
                log::warn!("Cyclic base chain at class `{}`", class.full_name);
                break;
            }
            next = class.base();
            chain.push(class);
        }
        chain
    }

    /// Returns `true` if this class is `name` or derives from it.
    pub fn is_derived_from(&self, name: &str) -> bool {
        self.has_name(name) || self.base_chain().iter().any(|c| c.has_name(name))
    }

    /// Returns `true` if this class is `class` or derives from it.
    pub fn is_derived_from_class(&self, class: &Class) -> bool {
        core::ptr::eq(self, class)
            || self
                .base_chain()
                .iter()
                .any(|c| core::ptr::eq(Arc::as_ptr(c), class))
    }

    // ----- Members

    fn build_members(&self) -> (Members, bool) {
        let chain = self.base_chain();
        let mut complete = match &self.base {
            BaseLink::None => true,
            _ => !chain.is_empty(),
        };
        if let Some(last) = chain.last() {
            complete &= matches!(last.base, BaseLink::None);
        }

        let mut members = Members {
            attributes: Vec::new(),
            methods: Vec::new(),
            signals: Vec::new(),
            slots: Vec::new(),
        };
        let root_first = chain.iter().rev().map(|c| &**c).chain(core::iter::once(self));
        for class in root_first {
            merge(&mut members.attributes, &class.attributes, AttributeDesc::name);
            merge(&mut members.methods, &class.methods, MethodDesc::name);
            merge(&mut members.signals, &class.signals, SignalDesc::name);
            merge(&mut members.slots, &class.slots, SlotDesc::name);
        }
        (members, complete)
    }

    fn with_members<R>(&self, f: impl FnOnce(&Members) -> R) -> R {
        if let Some(members) = self.merged.get() {
            return f(members);
        }
        let (members, complete) = self.build_members();
        if complete {
            f(self.merged.get_or_init(|| members))
        } else {
            // Keep resolving until the whole chain is known.
            f(&members)
        }
    }

    /// Returns all attributes, inherited ones included.
    pub fn attributes(&self) -> Vec<Arc<AttributeDesc>> {
        self.with_members(|m| m.attributes.clone())
    }

    /// Finds an attribute by name, inherited ones included.
    pub fn attribute(&self, name: &str) -> Option<Arc<AttributeDesc>> {
        self.with_members(|m| m.attributes.iter().find(|a| a.name() == name).cloned())
    }

    /// Returns all methods, inherited ones included.
    pub fn methods(&self) -> Vec<Arc<MethodDesc>> {
        self.with_members(|m| m.methods.clone())
    }

    /// Finds a method by name, inherited ones included.
    pub fn method(&self, name: &str) -> Option<Arc<MethodDesc>> {
        self.with_members(|m| m.methods.iter().find(|a| a.name() == name).cloned())
    }

    /// Returns all signals, inherited ones included.
    pub fn signals(&self) -> Vec<Arc<SignalDesc>> {
        self.with_members(|m| m.signals.clone())
    }

    /// Finds a signal by name, inherited ones included.
    pub fn signal(&self, name: &str) -> Option<Arc<SignalDesc>> {
        self.with_members(|m| m.signals.iter().find(|a| a.name() == name).cloned())
    }

    /// Returns all slots, inherited ones included.
    pub fn slots(&self) -> Vec<Arc<SlotDesc>> {
        self.with_members(|m| m.slots.clone())
    }

    /// Finds a slot by name, inherited ones included.
    pub fn slot(&self, name: &str) -> Option<Arc<SlotDesc>> {
        self.with_members(|m| m.slots.iter().find(|a| a.name() == name).cloned())
    }

    #[inline]
    pub fn own_attributes(&self) -> &[Arc<AttributeDesc>] {
        &self.attributes
    }

    #[inline]
    pub fn own_methods(&self) -> &[Arc<MethodDesc>] {
        &self.methods
    }

    #[inline]
    pub fn own_signals(&self) -> &[Arc<SignalDesc>] {
        &self.signals
    }

    #[inline]
    pub fn own_slots(&self) -> &[Arc<SlotDesc>] {
        &self.slots
    }

    /// Returns the constructors. Constructors are never inherited.
    #[inline]
    pub fn constructors(&self) -> &[Arc<ConstructorDesc>] {
        &self.constructors
    }

    pub fn constructor(&self, name: &str) -> Option<&Arc<ConstructorDesc>> {
        self.constructors.iter().find(|c| c.name() == name)
    }

    /// Returns `true` if the class has no constructor.
    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.constructors.is_empty()
    }

    // ----- Construction

    /// Creates an instance with the `DefaultConstructor`, or with the
    /// first constructor taking no parameters.
    pub fn create(&self) -> Option<ObjectRef> {
        let ctor = self.constructor(DEFAULT_CONSTRUCTOR).or_else(|| {
            self.constructors
                .iter()
                .find(|c| c.param_types().is_empty())
        })?;
        match ctor.invoke(&DynParams::new()) {
            Ok(object) => Some(ObjectRef::from_box(object)),
            Err(err) => {
                log::warn!("Failed to create `{}`: {err}", self.full_name);
                None
            }
        }
    }

    /// Creates an instance with a named constructor.
    pub fn create_with(&self, name: &str, params: &DynParams) -> Result<ObjectRef, CallError> {
        let Some(ctor) = self.constructor(name) else {
            return Err(CallError::NoConstructor {
                class: self.full_name.clone(),
                name: String::from(name),
            });
        };
        ctor.invoke(params).map(ObjectRef::from_box)
    }

    // ----- Registration state

    pub(crate) fn mark_registered(&self) {
        self.registrations.fetch_add(1, Ordering::AcqRel);
        self.unloaded.store(false, Ordering::Release);
    }

    pub(crate) fn mark_unregistered(&self) {
        let prev = self
            .registrations
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .unwrap_or(0);
        if prev == 1 {
            self.unloaded.store(true, Ordering::Release);
        }
    }

    /// Returns `true` if the class is in at least one [`ClassManager`].
    #[inline]
    pub fn is_registered(&self) -> bool {
        self.registrations.load(Ordering::Acquire) > 0
    }

    /// Returns `true` if the class was registered and has since been
    /// removed from every [`ClassManager`].
    #[inline]
    pub fn is_unloaded(&self) -> bool {
        self.unloaded.load(Ordering::Acquire)
    }
}

/// Name of the constructor used by [`Class::create`].
pub const DEFAULT_CONSTRUCTOR: &str = "DefaultConstructor";

impl PartialEq for Class {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self, other)
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.full_name)
            .field("base", &self.base_name())
            .field("attributes", &self.attributes.len())
            .field("methods", &self.methods.len())
            .field("signals", &self.signals.len())
            .field("slots", &self.slots.len())
            .finish()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.full_name)
    }
}
