use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use thiserror::Error;

use crate::event::{ConnectionId, EventArgs, Signal, Slot};
use crate::types::{RttiType, TypeInfo, Value, format_signature};

// -----------------------------------------------------------------------------
// EventError

/// An error that occurs when a signal or slot is driven through its
/// type-erased interface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EventError {
    /// The slot does not accept the arguments of the signal.
    #[error("Signature mismatch: expected `{expected}`, found `{found}`")]
    SignatureMismatch { expected: String, found: String },
    /// The number of parameters does not match the signature.
    #[error("Expected {expected} event parameter(s), found {found}")]
    ParamCount { expected: usize, found: usize },
}

fn event_signature(params: &[&TypeInfo]) -> String {
    format_signature(<() as RttiType>::type_info(), params)
}

// -----------------------------------------------------------------------------
// DynSignal

/// Type-erased access to a [`Signal`].
pub trait DynSignal: Send + Sync {
    /// Returns the parameter types of the signal.
    fn param_types(&self) -> Vec<&'static TypeInfo>;

    /// Returns the signature, e.g. `void(int32)`.
    fn signature(&self) -> String {
        event_signature(&self.param_types())
    }

    /// Returns the number of connections.
    fn connection_count(&self) -> usize;

    /// Emits the signal with converted parameters.
    fn emit_params(&self, params: &[Value]) -> Result<(), EventError>;

    /// Connects a slot with the same argument types.
    fn connect_dyn(&self, slot: &dyn DynSlot) -> Result<ConnectionId, EventError>;

    /// Disconnects a slot, `false` if it was not connected or has another signature.
    fn disconnect_dyn(&self, slot: &dyn DynSlot) -> bool;

    /// Removes every connection.
    fn disconnect_all(&self);

    /// Returns a handle sharing the same connections.
    fn share(&self) -> Box<dyn DynSignal>;
}

impl<A: EventArgs> DynSignal for Signal<A> {
    fn param_types(&self) -> Vec<&'static TypeInfo> {
        A::param_types()
    }

    fn connection_count(&self) -> usize {
        Signal::connection_count(self)
    }

    fn emit_params(&self, params: &[Value]) -> Result<(), EventError> {
        match A::from_params(params) {
            Some(args) => {
                self.emit(args);
                Ok(())
            }
            None => Err(EventError::ParamCount {
                expected: A::param_types().len(),
                found: params.len(),
            }),
        }
    }

    fn connect_dyn(&self, slot: &dyn DynSlot) -> Result<ConnectionId, EventError> {
        match slot.as_any().downcast_ref::<Slot<A>>() {
            Some(slot) => Ok(self.connect(slot)),
            None => Err(EventError::SignatureMismatch {
                expected: DynSignal::signature(self),
                found: slot.signature(),
            }),
        }
    }

    fn disconnect_dyn(&self, slot: &dyn DynSlot) -> bool {
        match slot.as_any().downcast_ref::<Slot<A>>() {
            Some(slot) => self.disconnect(slot),
            None => false,
        }
    }

    fn disconnect_all(&self) {
        Signal::disconnect_all(self);
    }

    fn share(&self) -> Box<dyn DynSignal> {
        Box::new(Signal::share(self))
    }
}

// -----------------------------------------------------------------------------
// DynSlot

/// Type-erased access to a [`Slot`].
pub trait DynSlot: Send + Sync {
    /// Returns `self` for downcasting to the concrete slot.
    fn as_any(&self) -> &dyn Any;

    /// Returns the parameter types of the slot.
    fn param_types(&self) -> Vec<&'static TypeInfo>;

    /// Returns the signature, e.g. `void(int32)`.
    fn signature(&self) -> String {
        event_signature(&self.param_types())
    }

    /// Invokes the slot with converted parameters.
    fn invoke_params(&self, params: &[Value]) -> Result<(), EventError>;
}

impl<A: EventArgs> DynSlot for Slot<A> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn param_types(&self) -> Vec<&'static TypeInfo> {
        A::param_types()
    }

    fn invoke_params(&self, params: &[Value]) -> Result<(), EventError> {
        match A::from_params(params) {
            Some(args) => {
                self.invoke(&args);
                Ok(())
            }
            None => Err(EventError::ParamCount {
                expected: A::param_types().len(),
                found: params.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicI64, Ordering};

    use super::{DynSignal, DynSlot, EventError};
    use crate::event::{Signal, Slot};
    use crate::types::Value;

    #[test]
    fn dynamic_connect_and_emit() {
        let total = Arc::new(AtomicI64::new(0));
        let sink = total.clone();
        let slot = Slot::new(move |(a, b): &(i32, i64)| {
            sink.fetch_add(*a as i64 + *b, Ordering::Relaxed);
        });
        let signal = Signal::<(i32, i64)>::new();

        let signal_dyn: &dyn DynSignal = &signal;
        let slot_dyn: &dyn DynSlot = &slot;
        assert_eq!(signal_dyn.signature(), "void(int32,int64)");

        signal_dyn.connect_dyn(slot_dyn).unwrap();
        signal_dyn
            .emit_params(&[Value::Int(2), Value::from("40")])
            .unwrap();
        assert_eq!(total.load(Ordering::Relaxed), 42);

        let err = signal_dyn.emit_params(&[Value::Int(1)]).unwrap_err();
        assert_eq!(err, EventError::ParamCount { expected: 2, found: 1 });

        assert!(signal_dyn.disconnect_dyn(slot_dyn));
        assert_eq!(signal_dyn.connection_count(), 0);
    }

    #[test]
    fn mismatched_slot_is_rejected() {
        let signal = Signal::<(i32,)>::new();
        let slot = Slot::new(|_: &(String,)| {});
        let err = DynSignal::connect_dyn(&signal, &slot).unwrap_err();
        assert_eq!(
            err,
            EventError::SignatureMismatch {
                expected: String::from("void(int32)"),
                found: String::from("void(String)"),
            }
        );
    }
}
