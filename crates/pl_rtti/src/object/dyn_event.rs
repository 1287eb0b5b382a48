use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use crate::class::{SignalDesc, SlotDesc};
use crate::event::{ConnectionId, DynSignal, DynSlot, EventError};
use crate::types::{TypeInfo, Value};

// -----------------------------------------------------------------------------
// DynEvent

/// A signal bound to an object instance.
///
/// Obtained from [`ObjectExt::get_signal`](crate::object::ObjectExt::get_signal).
pub struct DynEvent<'a> {
    desc: Arc<SignalDesc>,
    signal: &'a dyn DynSignal,
}

impl<'a> DynEvent<'a> {
    #[inline]
    pub(crate) fn new(desc: Arc<SignalDesc>, signal: &'a dyn DynSignal) -> Self {
        Self { desc, signal }
    }

    #[inline]
    pub fn descriptor(&self) -> &SignalDesc {
        &self.desc
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.desc.name()
    }

    #[inline]
    pub fn param_types(&self) -> &[&'static TypeInfo] {
        self.desc.param_types()
    }

    /// Returns the signature, e.g. `void(int32)`.
    pub fn signature(&self) -> String {
        self.desc.signature()
    }

    /// Returns the underlying signal.
    #[inline]
    pub fn signal(&self) -> &'a dyn DynSignal {
        self.signal
    }

    #[inline]
    pub fn connection_count(&self) -> usize {
        self.signal.connection_count()
    }

    /// Emits the signal, converting each parameter to the declared type.
    pub fn emit(&self, params: &[Value]) -> Result<(), EventError> {
        #[cfg(feature = "debug")]
        log::trace!("Emit `{}` with {} parameter(s)", self.desc.name(), params.len());
        self.signal.emit_params(params)
    }

    /// Connects a handler with the same signature.
    pub fn connect(&self, handler: &DynEventHandler<'_>) -> Result<ConnectionId, EventError> {
        self.signal.connect_dyn(handler.slot)
    }

    /// Disconnects a handler, `false` if it was not connected.
    pub fn disconnect(&self, handler: &DynEventHandler<'_>) -> bool {
        self.signal.disconnect_dyn(handler.slot)
    }

    /// Removes every connection of the signal.
    pub fn disconnect_all(&self) {
        self.signal.disconnect_all();
    }
}

impl fmt::Debug for DynEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynEvent")
            .field("name", &self.desc.name())
            .field("connections", &self.connection_count())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// DynEventHandler

/// A slot bound to an object instance.
pub struct DynEventHandler<'a> {
    desc: Arc<SlotDesc>,
    slot: &'a dyn DynSlot,
}

impl<'a> DynEventHandler<'a> {
    #[inline]
    pub(crate) fn new(desc: Arc<SlotDesc>, slot: &'a dyn DynSlot) -> Self {
        Self { desc, slot }
    }

    #[inline]
    pub fn descriptor(&self) -> &SlotDesc {
        &self.desc
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.desc.name()
    }

    #[inline]
    pub fn param_types(&self) -> &[&'static TypeInfo] {
        self.desc.param_types()
    }

    pub fn signature(&self) -> String {
        self.desc.signature()
    }

    /// Returns the underlying slot.
    #[inline]
    pub fn slot(&self) -> &'a dyn DynSlot {
        self.slot
    }

    /// Invokes the handler directly, bypassing any signal.
    pub fn invoke(&self, params: &[Value]) -> Result<(), EventError> {
        self.slot.invoke_params(params)
    }
}

impl fmt::Debug for DynEventHandler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynEventHandler")
            .field("name", &self.desc.name())
            .finish()
    }
}
