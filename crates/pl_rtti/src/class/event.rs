use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::event::{DynSignal, DynSlot, EventArgs, Signal, Slot};
use crate::object::{Object, resolve};
use crate::types::{RttiType, TypeInfo, format_signature};

/// Projects a signal out of a type-erased object.
pub trait SignalAccess: Send + Sync {
    fn get<'a>(&self, object: &'a dyn Object) -> Option<&'a dyn DynSignal>;
}

/// Projects a slot out of a type-erased object.
pub trait SlotAccess: Send + Sync {
    fn get<'a>(&self, object: &'a dyn Object) -> Option<&'a dyn DynSlot>;
}

struct SignalField<C, A: EventArgs> {
    get: fn(&C) -> &Signal<A>,
}

impl<C: Object, A: EventArgs> SignalAccess for SignalField<C, A> {
    fn get<'a>(&self, object: &'a dyn Object) -> Option<&'a dyn DynSignal> {
        resolve::<C>(object).map(|c| (self.get)(c) as &dyn DynSignal)
    }
}

struct SlotField<C, A: EventArgs> {
    get: fn(&C) -> &Slot<A>,
}

impl<C: Object, A: EventArgs> SlotAccess for SlotField<C, A> {
    fn get<'a>(&self, object: &'a dyn Object) -> Option<&'a dyn DynSlot> {
        resolve::<C>(object).map(|c| (self.get)(c) as &dyn DynSlot)
    }
}

fn void_signature(params: &[&'static TypeInfo]) -> String {
    format_signature(<() as RttiType>::type_info(), params)
}

// -----------------------------------------------------------------------------
// SignalDesc

/// Descriptor of a reflected signal.
pub struct SignalDesc {
    name: &'static str,
    description: &'static str,
    param_types: Vec<&'static TypeInfo>,
    accessor: Box<dyn SignalAccess>,
}

impl SignalDesc {
    /// Creates a descriptor for a [`Signal`] field of `C`.
    pub fn field<C: Object, A: EventArgs>(name: &'static str, get: fn(&C) -> &Signal<A>) -> Self {
        Self {
            name,
            description: "",
            param_types: A::param_types(),
            accessor: Box::new(SignalField { get }),
        }
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn description(&self) -> &'static str {
        self.description
    }

    #[inline]
    pub fn param_types(&self) -> &[&'static TypeInfo] {
        &self.param_types
    }

    /// Returns the signature, e.g. `void(int32)`.
    pub fn signature(&self) -> String {
        void_signature(&self.param_types)
    }

    /// Returns the signal of `object`.
    #[inline]
    pub fn get<'a>(&self, object: &'a dyn Object) -> Option<&'a dyn DynSignal> {
        self.accessor.get(object)
    }
}

impl fmt::Debug for SignalDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalDesc")
            .field("name", &self.name)
            .field("signature", &self.signature())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// SlotDesc

/// Descriptor of a reflected slot.
pub struct SlotDesc {
    name: &'static str,
    description: &'static str,
    param_types: Vec<&'static TypeInfo>,
    accessor: Box<dyn SlotAccess>,
}

impl SlotDesc {
    /// Creates a descriptor for a [`Slot`] field of `C`.
    pub fn field<C: Object, A: EventArgs>(name: &'static str, get: fn(&C) -> &Slot<A>) -> Self {
        Self {
            name,
            description: "",
            param_types: A::param_types(),
            accessor: Box::new(SlotField { get }),
        }
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn description(&self) -> &'static str {
        self.description
    }

    #[inline]
    pub fn param_types(&self) -> &[&'static TypeInfo] {
        &self.param_types
    }

    /// Returns the signature, e.g. `void(int32)`.
    pub fn signature(&self) -> String {
        void_signature(&self.param_types)
    }

    /// Returns the slot of `object`.
    #[inline]
    pub fn get<'a>(&self, object: &'a dyn Object) -> Option<&'a dyn DynSlot> {
        self.accessor.get(object)
    }
}

impl fmt::Debug for SlotDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotDesc")
            .field("name", &self.name)
            .field("signature", &self.signature())
            .finish()
    }
}
