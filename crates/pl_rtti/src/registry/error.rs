use alloc::string::String;

use thiserror::Error;

use crate::registry::ModuleId;

/// An error that occurs when a class or module is registered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegisterError {
    /// Another class with the same full name is already registered.
    /// The first registration stays in effect.
    #[error("Class `{0}` is already registered")]
    DuplicateClass(String),

    #[error("Module {0:?} is not registered")]
    UnknownModule(ModuleId),
}
