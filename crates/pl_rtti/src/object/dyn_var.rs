use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use crate::class::AttributeDesc;
use crate::object::Object;
use crate::types::{RttiType, TypeInfo, Value};

// -----------------------------------------------------------------------------
// DynVar

/// An attribute bound to an object instance.
///
/// Reads never fail: an object that lost the declaring class part reads as
/// the zero value. Writes to read-only attributes are ignored.
pub struct DynVar<'a> {
    object: &'a mut dyn Object,
    desc: Arc<AttributeDesc>,
}

impl<'a> DynVar<'a> {
    #[inline]
    pub(crate) fn new(object: &'a mut dyn Object, desc: Arc<AttributeDesc>) -> Self {
        Self { object, desc }
    }

    /// Returns the attribute descriptor.
    #[inline]
    pub fn descriptor(&self) -> &AttributeDesc {
        &self.desc
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.desc.name()
    }

    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        self.desc.type_info()
    }

    // ----- String access

    /// Returns the value in canonical string form.
    pub fn get_string(&self) -> String {
        self.desc.get_string(&*self.object).unwrap_or_default()
    }

    /// Sets the value from a string, parsed leniently.
    ///
    /// Returns `false` if the attribute is read-only.
    pub fn set_string(&mut self, value: &str) -> bool {
        self.desc.set_string(&mut *self.object, value)
    }

    // ----- Typed access

    pub fn get_value(&self) -> Value {
        self.desc.get_value(&*self.object).unwrap_or_default()
    }

    pub fn set_value(&mut self, value: &Value) -> bool {
        self.desc.set_value(&mut *self.object, value)
    }

    /// Reads the value converted to `T`.
    ///
    /// Conversions are implicit: a float read as an integer is truncated.
    pub fn get<T: RttiType>(&self) -> T {
        T::from_value(&self.get_value())
    }

    /// Writes a value of any [`RttiType`], converted to the attribute type.
    pub fn set<T: RttiType>(&mut self, value: T) -> bool {
        self.set_value(&value.to_value())
    }

    pub fn get_bool(&self) -> bool {
        self.get_value().to_bool()
    }

    pub fn get_int(&self) -> i64 {
        self.get_value().to_i64()
    }

    pub fn get_uint(&self) -> u64 {
        self.get_value().to_u64()
    }

    pub fn get_float(&self) -> f32 {
        self.get_value().to_f32()
    }

    pub fn get_double(&self) -> f64 {
        self.get_value().to_f64()
    }

    // ----- Defaults

    /// Returns the default value in canonical string form.
    #[inline]
    pub fn default_value(&self) -> &str {
        self.desc.default_value()
    }

    /// Returns `true` if the current value equals the default.
    pub fn is_default(&self) -> bool {
        self.desc.is_default(&*self.object)
    }

    /// Resets the value to the default.
    pub fn set_default(&mut self) -> bool {
        self.desc.set_default(&mut *self.object)
    }
}

impl fmt::Debug for DynVar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynVar")
            .field("name", &self.desc.name())
            .field("value", &self.get_string())
            .finish()
    }
}
