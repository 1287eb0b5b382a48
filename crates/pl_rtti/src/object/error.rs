use alloc::string::String;

use thiserror::Error;

use crate::event::EventError;
use crate::object::ObjectId;

// -----------------------------------------------------------------------------
// Error

/// An error that occurs when an object is accessed through its handle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ObjectError {
    #[error("Object {0} has already been destroyed")]
    Destroyed(ObjectId),

    #[error("Class `{0}` of the object has been unregistered")]
    ClassUnregistered(String),

    #[error("Object {0} is locked by another access")]
    Busy(ObjectId),

    #[error("Class has no signal named `{0}`")]
    UnknownSignal(String),

    #[error("Class has no slot named `{0}`")]
    UnknownSlot(String),

    #[error(transparent)]
    Event(#[from] EventError),
}

/// An error that occurs when a method or constructor is called dynamically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CallError {
    #[error("Class has no method named `{0}`")]
    UnknownMethod(String),

    #[error("Method `{method}` expects {expected} parameter(s), found {found}")]
    ParamCount {
        method: String,
        expected: usize,
        found: usize,
    },

    #[error("Object is not an instance of the class declaring `{0}`")]
    TargetMismatch(String),

    #[error("Class `{class}` has no constructor named `{name}`")]
    NoConstructor { class: String, name: String },
}
