use alloc::string::String;
use core::fmt;

use crate::object::ObjectRef;
use crate::types::parse;

// -----------------------------------------------------------------------------
// Value

/// A dynamically typed value.
///
/// `Value` is the currency of every type-erased access: attribute reads
/// and writes, method parameters and return values, and signal arguments.
///
/// The `to_*` conversions never fail. Reading a value as a different
/// type performs the usual implicit conversion: floats are truncated
/// when read as integers, strings are parsed leniently, and anything
/// unparseable becomes zero.
///
/// # Examples
///
/// ```
/// use pl_rtti::types::Value;
///
/// assert_eq!(Value::Double(3.9).to_i64(), 3);
/// assert_eq!(Value::from("12px").to_i64(), 12);
/// assert_eq!(Value::Bool(true).to_string_value(), "true");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// No value.
    #[default]
    None,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    String(String),
    Object(Option<ObjectRef>),
}

impl Value {
    /// Returns the name of the variant, for diagnostics.
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::UInt(_) => "UInt",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::String(_) => "String",
            Self::Object(_) => "Object",
        }
    }

    /// Returns `true` for [`Value::None`].
    #[inline]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn to_bool(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(v) => *v,
            Self::Int(v) => *v != 0,
            Self::UInt(v) => *v != 0,
            Self::Float(v) => *v != 0.0,
            Self::Double(v) => *v != 0.0,
            Self::String(s) => parse::parse_bool(s),
            Self::Object(o) => o.is_some(),
        }
    }

    pub fn to_i64(&self) -> i64 {
        match self {
            Self::None | Self::Object(_) => 0,
            Self::Bool(v) => *v as i64,
            Self::Int(v) => *v,
            Self::UInt(v) => *v as i64,
            Self::Float(v) => *v as i64,
            Self::Double(v) => *v as i64,
            Self::String(s) => parse::parse_int(s) as i64,
        }
    }

    pub fn to_u64(&self) -> u64 {
        match self {
            Self::None | Self::Object(_) => 0,
            Self::Bool(v) => *v as u64,
            Self::Int(v) => *v as u64,
            Self::UInt(v) => *v,
            Self::Float(v) => *v as u64,
            Self::Double(v) => *v as u64,
            Self::String(s) => parse::parse_int(s) as u64,
        }
    }

    pub fn to_f32(&self) -> f32 {
        match self {
            Self::Float(v) => *v,
            other => other.to_f64() as f32,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Self::None | Self::Object(_) => 0.0,
            Self::Bool(v) => *v as u8 as f64,
            Self::Int(v) => *v as f64,
            Self::UInt(v) => *v as f64,
            Self::Float(v) => *v as f64,
            Self::Double(v) => *v,
            Self::String(s) => parse::parse_float(s),
        }
    }

    /// Returns the canonical string form of the value.
    pub fn to_string_value(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Bool(v) => v.to_string(),
            Self::Int(v) => v.to_string(),
            Self::UInt(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Double(v) => v.to_string(),
            Self::String(s) => s.clone(),
            Self::Object(None) => String::new(),
            Self::Object(Some(o)) => o.id().to_string(),
        }
    }

    /// Returns the referenced object, if this is a non-null object value.
    pub fn to_object(&self) -> Option<ObjectRef> {
        match self {
            Self::Object(o) => o.clone(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.to_string_value())
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident as $wide:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value as $wide)
                }
            }
        )*
    };
}

impl_from_for_value! {
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => UInt as u64,
    u16 => UInt as u64,
    u32 => UInt as u64,
    u64 => UInt as u64,
    f32 => Float as f32,
    f64 => Double as f64,
}

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(String::from(value))
    }
}

impl From<ObjectRef> for Value {
    #[inline]
    fn from(value: ObjectRef) -> Self {
        Self::Object(Some(value))
    }
}

impl From<Option<ObjectRef>> for Value {
    #[inline]
    fn from(value: Option<ObjectRef>) -> Self {
        Self::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Value;

    #[test]
    fn implicit_conversions() {
        assert_eq!(Value::Float(2.75).to_i64(), 2);
        assert_eq!(Value::Double(-1.5).to_i64(), -1);
        assert_eq!(Value::Int(7).to_f64(), 7.0);
        assert!(Value::Int(3).to_bool());
        assert!(!Value::None.to_bool());
        assert_eq!(Value::from("0.5").to_f32(), 0.5);
        assert_eq!(Value::from("junk").to_u64(), 0);
        assert_eq!(Value::Bool(true).to_i64(), 1);
    }

    #[test]
    fn canonical_strings() {
        assert_eq!(Value::Float(1.0).to_string_value(), "1");
        assert_eq!(Value::Double(0.25).to_string_value(), "0.25");
        assert_eq!(Value::Int(-4).to_string_value(), "-4");
        assert_eq!(Value::None.to_string_value(), "");
        assert_eq!(Value::Object(None).to_string_value(), "");
    }
}
