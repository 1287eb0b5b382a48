#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// Generated code refers to `pl_rtti`, which must also work inside this crate.
extern crate self as pl_rtti;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

pub mod class;
pub mod event;
pub mod hash;
pub mod object;
pub mod plugin;
pub mod registry;
pub mod serialize;
pub mod types;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports {
    #[cfg(feature = "auto_register")]
    pub use inventory;
}

pub use pl_rtti_derive as derive;

/// Commonly used items.
pub mod prelude {
    pub use crate::class::{Class, ClassBuilder, ClassRef, ClassType};
    pub use crate::derive::Object;
    pub use crate::event::{Signal, Slot};
    pub use crate::object::{DynParams, Object, ObjectExt, ObjectRef};
    pub use crate::registry::ClassManager;
    pub use crate::serialize::DefaultValue;
    pub use crate::types::{RttiType, Value};
}
