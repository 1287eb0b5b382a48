use core::any::Any;

use crate::class::ClassRef;
use crate::object::ObjectRef;

// -----------------------------------------------------------------------------
// Object

/// A reflected object.
///
/// `class` must return the class of the most-derived type. A type that
/// extends another reflected type embeds it as a field and returns it from
/// [`super_object`](Object::super_object), which lets members declared on
/// the base class reach the embedded base through any derived instance.
///
/// Usually implemented through `#[derive(Object)]`, see [`derive`](crate::derive).
///
/// # Examples
///
/// A manual implementation:
///
/// ```
/// use pl_rtti::class::{Class, ClassBuilder, ClassCell, ClassRef, ClassType};
/// use pl_rtti::object::Object;
///
/// #[derive(Default)]
/// struct Counter {
///     count: i32,
/// }
///
/// impl Object for Counter {
///     fn class(&self) -> ClassRef {
///         Self::static_class()
///     }
/// }
///
/// impl ClassType for Counter {
///     fn build_class() -> Class {
///         ClassBuilder::<Self>::new("Counter")
///             .namespace("Demo")
///             .field("Count", 0i32, |c| &c.count, |c| &mut c.count)
///             .default_constructor()
///             .build()
///     }
///
///     fn static_class() -> ClassRef {
///         static CELL: ClassCell = ClassCell::new();
///         CELL.get_or_build::<Self>()
///     }
/// }
///
/// assert_eq!(Counter::default().class().full_name(), "Demo::Counter");
/// ```
pub trait Object: Any + Send + Sync {
    /// Returns the most-derived class of this object.
    fn class(&self) -> ClassRef;

    /// Returns the embedded base object, if this type extends another reflected type.
    #[inline]
    fn super_object(&self) -> Option<&dyn Object> {
        None
    }

    /// Mutable variant of [`super_object`](Object::super_object).
    #[inline]
    fn super_object_mut(&mut self) -> Option<&mut dyn Object> {
        None
    }

    /// Called once when the object is moved into an [`ObjectRef`].
    ///
    /// This is where slots bind to their receiver with
    /// [`Slot::for_object`](crate::event::Slot::for_object).
    #[inline]
    fn on_attach(&mut self, handle: &ObjectRef) {
        if let Some(base) = self.super_object_mut() {
            base.on_attach(handle);
        }
    }
}

/// Finds the part of `object` that has type `C`.
///
/// Walks the chain of [`super_object`](Object::super_object)s, starting with
/// `object` itself.
pub fn resolve<C: Object>(object: &dyn Object) -> Option<&C> {
    let mut current = object;
    loop {
        let any: &dyn Any = current;
        if let Some(found) = any.downcast_ref::<C>() {
            return Some(found);
        }
        current = current.super_object()?;
    }
}

/// Mutable variant of [`resolve`].
pub fn resolve_mut<C: Object>(object: &mut dyn Object) -> Option<&mut C> {
    if (&*object as &dyn Any).is::<C>() {
        return (object as &mut dyn Any).downcast_mut::<C>();
    }
    resolve_mut::<C>(object.super_object_mut()?)
}

// -----------------------------------------------------------------------------
// AsObject

/// Conversion into `&dyn Object`, implemented for every sized [`Object`]
/// and for `dyn Object` itself.
pub trait AsObject {
    fn as_object(&self) -> &dyn Object;

    fn as_object_mut(&mut self) -> &mut dyn Object;
}

impl<T: Object> AsObject for T {
    #[inline(always)]
    fn as_object(&self) -> &dyn Object {
        self
    }

    #[inline(always)]
    fn as_object_mut(&mut self) -> &mut dyn Object {
        self
    }
}

impl AsObject for dyn Object {
    #[inline(always)]
    fn as_object(&self) -> &dyn Object {
        self
    }

    #[inline(always)]
    fn as_object_mut(&mut self) -> &mut dyn Object {
        self
    }
}
