use alloc::vec::Vec;

use bitflags::Flags;

use crate::types::{EnumSymbol, TypeInfo};

// -----------------------------------------------------------------------------
// Enumerations

/// Declares an enum that can be used as a reflected value type.
///
/// Every variant needs an explicit discriminant. The enum keeps its
/// declaration and gets an [`RttiType`] implementation whose
/// string form is the variant name.
///
/// Parsing a symbol or integer that matches no variant yields the
/// first variant.
///
/// [`RttiType`]: crate::types::RttiType
///
/// # Examples
///
/// ```
/// use pl_rtti::rtti_enum;
/// use pl_rtti::types::RttiType;
///
/// rtti_enum! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
///     pub enum Shape: "Shape" {
///         Circle = 0,
///         Square = 1,
///         Triangle = 4,
///     }
/// }
///
/// assert_eq!(Shape::Square.to_rtti_string(), "Square");
/// assert_eq!(Shape::from_rtti_string("Triangle"), Shape::Triangle);
/// assert_eq!(Shape::from_rtti_string("4"), Shape::Triangle);
/// assert_eq!(Shape::from_rtti_string("Hexagon"), Shape::Circle);
/// ```
#[macro_export]
macro_rules! rtti_enum {
    (@first $first:ident $(, $rest:ident)*) => {
        Self::$first
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $type_name:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            const RTTI_SYMBOLS: &'static [$crate::types::EnumSymbol] = &[
                $( $crate::types::EnumSymbol::new(::core::stringify!($variant), $value) ),+
            ];

            fn rtti_to_i64(&self) -> i64 {
                match self {
                    $( Self::$variant => $value, )+
                }
            }

            fn rtti_from_i64(value: i64) -> Self {
                $(
                    if value == $value {
                        return Self::$variant;
                    }
                )+
                $crate::rtti_enum!(@first $($variant),+)
            }
        }

        impl $crate::types::RttiType for $name {
            fn type_info() -> &'static $crate::types::TypeInfo {
                static INFO: $crate::types::TypeInfo =
                    $crate::types::TypeInfo::enumeration($type_name, $name::RTTI_SYMBOLS);
                &INFO
            }

            fn to_rtti_string(&self) -> ::std::string::String {
                <Self as $crate::types::RttiType>::type_info().format_enum(self.rtti_to_i64())
            }

            fn from_rtti_string(s: &str) -> Self {
                Self::rtti_from_i64(<Self as $crate::types::RttiType>::type_info().parse_enum(s))
            }

            fn to_value(&self) -> $crate::types::Value {
                $crate::types::Value::Int(self.rtti_to_i64())
            }

            fn from_value(value: &$crate::types::Value) -> Self {
                match value {
                    $crate::types::Value::String(s) => {
                        <Self as $crate::types::RttiType>::from_rtti_string(s)
                    }
                    other => Self::rtti_from_i64(other.to_i64()),
                }
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Bitflags

/// Implements [`RttiType`] for a type generated by [`bitflags`].
///
/// The symbol table is read from the named flags of the type. The string
/// form is `A|B`, parsing also accepts integers as parts (`A|4`).
///
/// [`RttiType`]: crate::types::RttiType
///
/// # Examples
///
/// ```
/// use pl_rtti::impl_rtti_flags;
/// use pl_rtti::types::RttiType;
///
/// bitflags::bitflags! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
///     pub struct Mode: u32 {
///         const READ = 1;
///         const WRITE = 2;
///     }
/// }
///
/// impl_rtti_flags!(Mode, "Mode");
///
/// assert_eq!((Mode::READ | Mode::WRITE).to_rtti_string(), "READ|WRITE");
/// assert_eq!(Mode::from_rtti_string("WRITE"), Mode::WRITE);
/// ```
#[macro_export]
macro_rules! impl_rtti_flags {
    ($ty:ty, $type_name:literal) => {
        impl $crate::types::RttiType for $ty {
            fn type_info() -> &'static $crate::types::TypeInfo {
                static INFO: ::std::sync::OnceLock<$crate::types::TypeInfo> =
                    ::std::sync::OnceLock::new();
                INFO.get_or_init(|| $crate::types::flags_type_info::<$ty>($type_name))
            }

            fn to_rtti_string(&self) -> ::std::string::String {
                <Self as $crate::types::RttiType>::type_info()
                    .format_flags($crate::types::flags_to_bits(self))
            }

            fn from_rtti_string(s: &str) -> Self {
                $crate::types::flags_from_bits(
                    <Self as $crate::types::RttiType>::type_info().parse_flags(s),
                )
            }

            fn to_value(&self) -> $crate::types::Value {
                $crate::types::Value::UInt($crate::types::flags_to_bits(self))
            }

            fn from_value(value: &$crate::types::Value) -> Self {
                match value {
                    $crate::types::Value::String(s) => {
                        <Self as $crate::types::RttiType>::from_rtti_string(s)
                    }
                    other => $crate::types::flags_from_bits(other.to_u64()),
                }
            }
        }
    };
}

/// Builds the [`TypeInfo`] of a bitflags type from its named flags.
pub fn flags_type_info<F>(name: &'static str) -> TypeInfo
where
    F: Flags,
    F::Bits: Into<u64>,
{
    let symbols: Vec<EnumSymbol> = F::FLAGS
        .iter()
        .filter(|flag| flag.is_named())
        .map(|flag| EnumSymbol::new(flag.name(), flag.value().bits().into() as i64))
        .collect();
    TypeInfo::flags(name, symbols)
}

/// Widens the bits of a flags value.
#[inline]
pub fn flags_to_bits<F>(flags: &F) -> u64
where
    F: Flags,
    F::Bits: Into<u64>,
{
    flags.bits().into()
}

/// Narrows bits into a flags value, dropping bits no flag declares.
pub fn flags_from_bits<F>(bits: u64) -> F
where
    F: Flags,
    F::Bits: Into<u64> + TryFrom<u64>,
{
    let known: u64 = F::all().bits().into();
    match F::Bits::try_from(bits & known) {
        Ok(bits) => F::from_bits_retain(bits),
        Err(_) => F::empty(),
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{RttiType, TypeKind, Value};

    crate::rtti_enum! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum Align: "Align" {
            Left = 0,
            Center = 1,
            Right = 2,
        }
    }

    bitflags::bitflags! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        struct Style: u8 {
            const BOLD = 1;
            const ITALIC = 2;
            const UNDERLINE = 4;
        }
    }

    crate::impl_rtti_flags!(Style, "Style");

    #[test]
    fn enum_symbols() {
        let info = Align::type_info();
        assert_eq!(info.kind(), TypeKind::Enum);
        assert_eq!(info.symbols().len(), 3);
        assert_eq!(Align::Right.to_rtti_string(), "Right");
        assert_eq!(Align::from_rtti_string(" Center "), Align::Center);
        assert_eq!(Align::from_rtti_string("2"), Align::Right);
        assert_eq!(Align::from_rtti_string("Justify"), Align::Left);
        assert_eq!(Align::from_value(&Value::Int(1)), Align::Center);
        assert_eq!(Align::from_value(&Value::from("Right")), Align::Right);
    }

    #[test]
    fn flags_symbols() {
        let info = Style::type_info();
        assert_eq!(info.kind(), TypeKind::Flags);
        assert_eq!((Style::BOLD | Style::UNDERLINE).to_rtti_string(), "BOLD|UNDERLINE");
        assert_eq!(Style::empty().to_rtti_string(), "0");
        assert_eq!(Style::from_rtti_string("ITALIC|1"), Style::BOLD | Style::ITALIC);
        assert_eq!(Style::from_value(&Value::UInt(0xFF)), Style::all());
        assert_eq!((Style::ITALIC).to_value(), Value::UInt(2));
    }
}
