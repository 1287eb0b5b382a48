use alloc::string::String;

use crate::types::{TypeInfo, TypeKind, Value, parse};

// -----------------------------------------------------------------------------
// RttiType

/// A value type that can be stored in a reflected attribute, passed
/// as a method parameter or carried by a signal.
///
/// Implementations convert between the native value, its canonical string
/// form and the dynamically typed [`Value`].
///
/// - `to_rtti_string` never fails.
/// - `from_rtti_string` is lenient and returns the zero value on input it
///   cannot parse, it never reports an error.
///
/// Implemented for `bool`, `i8`-`i64`, `u8`-`u64`, `f32`, `f64`, `String`,
/// `()` and `Option<ObjectRef>`. Enums use [`rtti_enum!`] and bitflags use
/// [`impl_rtti_flags!`].
///
/// [`rtti_enum!`]: crate::rtti_enum
/// [`impl_rtti_flags!`]: crate::impl_rtti_flags
///
/// # Examples
///
/// ```
/// use pl_rtti::types::RttiType;
///
/// assert_eq!(true.to_rtti_string(), "true");
/// assert_eq!(<bool as RttiType>::from_rtti_string("1"), true);
/// assert_eq!(<i32 as RttiType>::from_rtti_string("not a number"), 0);
/// assert_eq!(2.5f32.to_rtti_string(), "2.5");
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` can not be used as a reflected value type",
    note = "consider `rtti_enum!` for enums or `impl_rtti_flags!` for bitflags"
)]
pub trait RttiType: Clone + Send + Sync + 'static {
    /// Returns the static [`TypeInfo`] of this type.
    fn type_info() -> &'static TypeInfo;

    /// Returns the canonical string form.
    fn to_rtti_string(&self) -> String;

    /// Parses the string form, falling back to the zero value.
    fn from_rtti_string(s: &str) -> Self;

    /// Converts into a dynamically typed [`Value`].
    fn to_value(&self) -> Value;

    /// Converts from a [`Value`] of any variant.
    fn from_value(value: &Value) -> Self;
}

// -----------------------------------------------------------------------------
// Primitive implementations

macro_rules! impl_rtti_integer {
    ($($ty:ty => $name:literal, $variant:ident, $wide:ty, $conv:ident;)*) => {
        $(
            impl RttiType for $ty {
                fn type_info() -> &'static TypeInfo {
                    static INFO: TypeInfo = TypeInfo::new($name, TypeKind::Primitive);
                    &INFO
                }

                #[inline]
                fn to_rtti_string(&self) -> String {
                    self.to_string()
                }

                /// Out-of-range values saturate at the bounds of the type.
                #[inline]
                fn from_rtti_string(s: &str) -> Self {
                    parse::parse_int(s).clamp(<$ty>::MIN as i128, <$ty>::MAX as i128) as $ty
                }

                #[inline]
                fn to_value(&self) -> Value {
                    Value::$variant(*self as $wide)
                }

                #[inline]
                fn from_value(value: &Value) -> Self {
                    value.$conv() as $ty
                }
            }
        )*
    };
}

impl_rtti_integer! {
    i8 => "int8", Int, i64, to_i64;
    i16 => "int16", Int, i64, to_i64;
    i32 => "int32", Int, i64, to_i64;
    i64 => "int64", Int, i64, to_i64;
    u8 => "uint8", UInt, u64, to_u64;
    u16 => "uint16", UInt, u64, to_u64;
    u32 => "uint32", UInt, u64, to_u64;
    u64 => "uint64", UInt, u64, to_u64;
}

impl RttiType for f32 {
    fn type_info() -> &'static TypeInfo {
        static INFO: TypeInfo = TypeInfo::new("float", TypeKind::Primitive);
        &INFO
    }

    #[inline]
    fn to_rtti_string(&self) -> String {
        self.to_string()
    }

    #[inline]
    fn from_rtti_string(s: &str) -> Self {
        parse::parse_float(s) as f32
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    #[inline]
    fn from_value(value: &Value) -> Self {
        value.to_f32()
    }
}

impl RttiType for f64 {
    fn type_info() -> &'static TypeInfo {
        static INFO: TypeInfo = TypeInfo::new("double", TypeKind::Primitive);
        &INFO
    }

    #[inline]
    fn to_rtti_string(&self) -> String {
        self.to_string()
    }

    #[inline]
    fn from_rtti_string(s: &str) -> Self {
        parse::parse_float(s)
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::Double(*self)
    }

    #[inline]
    fn from_value(value: &Value) -> Self {
        value.to_f64()
    }
}

impl RttiType for bool {
    fn type_info() -> &'static TypeInfo {
        static INFO: TypeInfo = TypeInfo::new("bool", TypeKind::Primitive);
        &INFO
    }

    #[inline]
    fn to_rtti_string(&self) -> String {
        self.to_string()
    }

    #[inline]
    fn from_rtti_string(s: &str) -> Self {
        parse::parse_bool(s)
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    #[inline]
    fn from_value(value: &Value) -> Self {
        value.to_bool()
    }
}

impl RttiType for String {
    fn type_info() -> &'static TypeInfo {
        static INFO: TypeInfo = TypeInfo::new("String", TypeKind::Primitive);
        &INFO
    }

    #[inline]
    fn to_rtti_string(&self) -> String {
        self.clone()
    }

    #[inline]
    fn from_rtti_string(s: &str) -> Self {
        String::from(s)
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    #[inline]
    fn from_value(value: &Value) -> Self {
        value.to_string_value()
    }
}

impl RttiType for () {
    fn type_info() -> &'static TypeInfo {
        static INFO: TypeInfo = TypeInfo::new("void", TypeKind::Void);
        &INFO
    }

    #[inline]
    fn to_rtti_string(&self) -> String {
        String::new()
    }

    #[inline]
    fn from_rtti_string(_: &str) -> Self {}

    #[inline]
    fn to_value(&self) -> Value {
        Value::None
    }

    #[inline]
    fn from_value(_: &Value) -> Self {}
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::RttiType;
    use crate::types::{TypeKind, Value};

    #[test]
    fn integer_round_trip() {
        assert_eq!(42i32.to_rtti_string(), "42");
        assert_eq!(<i32 as RttiType>::from_rtti_string("42"), 42);
        assert_eq!(<i8 as RttiType>::from_rtti_string("-5"), -5);
        assert_eq!(<u16 as RttiType>::from_rtti_string("x"), 0);
        assert_eq!(<u64 as RttiType>::type_info().name(), "uint64");
    }

    #[test]
    fn integer_strings_saturate() {
        assert_eq!(<u8 as RttiType>::from_rtti_string("300"), u8::MAX);
        assert_eq!(<u32 as RttiType>::from_rtti_string("-1"), 0);
        assert_eq!(<i8 as RttiType>::from_rtti_string("-200"), i8::MIN);
        assert_eq!(<u64 as RttiType>::from_rtti_string("18446744073709551615"), u64::MAX);
    }

    #[test]
    fn float_reads_as_int_truncate() {
        assert_eq!(<i32 as RttiType>::from_value(&Value::Float(9.99)), 9);
        assert_eq!(<u8 as RttiType>::from_value(&Value::Double(1.2)), 1);
        assert_eq!(<f64 as RttiType>::from_value(&Value::Int(3)), 3.0);
    }

    #[test]
    fn bool_canonicalizes() {
        let parsed = <bool as RttiType>::from_rtti_string("1");
        assert_eq!(parsed.to_rtti_string(), "true");
        assert_eq!(<bool as RttiType>::from_rtti_string("garbage"), false);
    }

    #[test]
    fn string_and_void() {
        let s = <String as RttiType>::from_rtti_string("a 'quoted' text");
        assert_eq!(s, "a 'quoted' text");
        assert_eq!(<String as RttiType>::from_value(&Value::Int(5)), "5");
        assert_eq!(<() as RttiType>::type_info().kind(), TypeKind::Void);
        assert!(().to_value().is_none());
    }
}
