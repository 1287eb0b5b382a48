//! Classes and member descriptors.
//!
//! A [`Class`] describes a reflected Rust type: identity, base class and
//! ordered lists of attribute, method, constructor, signal and slot
//! descriptors. Every class built with a [`ClassBuilder`] derives from the
//! [root class](root_class) unless told otherwise.

mod attribute;
mod builder;
mod class;
mod event;
mod method;
mod root;

pub use attribute::{Access, AttributeAccess, AttributeDesc};
pub use builder::ClassBuilder;
pub use class::{Class, ClassCell, ClassRef, ClassType, DEFAULT_CONSTRUCTOR};
pub use event::{SignalAccess, SignalDesc, SlotAccess, SlotDesc};
pub use method::{
    ConstructorDesc, ConstructorInvoker, IntoConstructor, IntoMethod, MethodDesc, MethodInvoker,
};
pub use root::{ROOT_NAME, ROOT_NAMESPACE, root_class};

#[cfg(test)]
mod tests;
