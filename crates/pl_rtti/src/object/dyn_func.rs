use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::class::MethodDesc;
use crate::object::{CallError, Object};
use crate::serialize::parse_values;
use crate::types::Value;

// -----------------------------------------------------------------------------
// DynParams

/// A type-erased parameter list with a slot for the return value.
///
/// # Examples
///
/// ```
/// use pl_rtti::object::DynParams;
/// use pl_rtti::types::Value;
///
/// let params = DynParams::new().with(3).with("four");
/// assert_eq!(params.len(), 2);
/// assert_eq!(params.get(1), Some(&Value::from("four")));
///
/// let parsed = DynParams::from_string("Param1='b' Param0='a'");
/// assert_eq!(parsed.params(), [Value::from("a"), Value::from("b")]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DynParams {
    params: Vec<Value>,
    ret: Value,
}

impl DynParams {
    /// Creates an empty parameter list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            params: Vec::new(),
            ret: Value::None,
        }
    }

    /// Creates a parameter list from values.
    #[inline]
    pub fn from_values(params: Vec<Value>) -> Self {
        Self {
            params,
            ret: Value::None,
        }
    }

    /// Parses `Param0='..' Param1='..'`.
    ///
    /// Parameters are collected by index, starting at `Param0` and stopping
    /// at the first missing index. The values stay strings and are converted
    /// when the method reads them.
    pub fn from_string(s: &str) -> Self {
        let pairs = parse_values(s);
        let mut params = Vec::new();
        loop {
            let key = format!("Param{}", params.len());
            match pairs.iter().find(|(name, _)| *name == key) {
                Some((_, value)) => params.push(Value::String(value.clone())),
                None => break,
            }
        }
        Self::from_values(params)
    }

    /// Appends a parameter.
    #[inline]
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Appends a parameter.
    #[inline]
    pub fn push(&mut self, value: impl Into<Value>) {
        self.params.push(value.into());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.params.get(index)
    }

    #[inline]
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Returns the return value, [`Value::None`] before a call.
    #[inline]
    pub fn return_value(&self) -> &Value {
        &self.ret
    }

    #[inline]
    pub fn set_return(&mut self, value: Value) {
        self.ret = value;
    }

    /// Takes the return value out, leaving [`Value::None`].
    #[inline]
    pub fn take_return(&mut self) -> Value {
        core::mem::take(&mut self.ret)
    }
}

// -----------------------------------------------------------------------------
// DynFunc

/// A method bound to an object instance.
pub struct DynFunc<'a> {
    object: &'a mut dyn Object,
    desc: Arc<MethodDesc>,
}

impl<'a> DynFunc<'a> {
    #[inline]
    pub(crate) fn new(object: &'a mut dyn Object, desc: Arc<MethodDesc>) -> Self {
        Self { object, desc }
    }

    /// Returns the method descriptor.
    #[inline]
    pub fn descriptor(&self) -> &MethodDesc {
        &self.desc
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.desc.name()
    }

    /// Returns the signature, e.g. `int32(int32,int32)`.
    pub fn signature(&self) -> String {
        self.desc.signature()
    }

    /// Calls the method, the return value is stored in `params`.
    pub fn call(&mut self, params: &mut DynParams) -> Result<(), CallError> {
        self.desc.invoke(&mut *self.object, params)
    }

    /// Calls the method with `Param0='..'` parameters and returns the
    /// return value as a string.
    pub fn call_string(&mut self, params: &str) -> Result<String, CallError> {
        let mut params = DynParams::from_string(params);
        self.call(&mut params)?;
        Ok(params.return_value().to_string_value())
    }
}

#[cfg(test)]
mod tests {
    use super::DynParams;
    use crate::types::Value;

    #[test]
    fn params_from_string_stop_at_gap() {
        let params = DynParams::from_string("Param0='1' Param2='3'");
        assert_eq!(params.params(), [Value::from("1")]);
        assert!(DynParams::from_string("").is_empty());
    }

    #[test]
    fn return_slot() {
        let mut params = DynParams::new().with(1i32);
        assert!(params.return_value().is_none());
        params.set_return(Value::Int(5));
        assert_eq!(params.take_return(), Value::Int(5));
        assert!(params.return_value().is_none());
    }
}
