//! Reflected objects and their type-erased member handles.
//!
//! An [`Object`] is any Rust value with a [`Class`](crate::class::Class).
//! [`ObjectRef`] owns an instance behind an explicit reference count, and
//! [`ObjectExt`] reaches its attributes, methods, signals and slots by name.

mod dyn_event;
mod dyn_func;
mod dyn_var;
mod error;
mod ext;
mod handle;
mod object;

pub use dyn_event::{DynEvent, DynEventHandler};
pub use dyn_func::{DynFunc, DynParams};
pub use dyn_var::DynVar;
pub use error::{CallError, ObjectError};
pub use ext::ObjectExt;
pub use handle::{ForeignObject, ObjectId, ObjectRef, WeakObjectRef};
pub use object::{AsObject, Object, resolve, resolve_mut};
