use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::types::parse;

// -----------------------------------------------------------------------------
// TypeKind

/// The category of a reflected value type.
///
/// The category decides how a value is converted to and from its
/// canonical string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// No value, used for method return types.
    Void,
    /// `bool`, integers, floats and `String`.
    Primitive,
    /// An enumeration, stringified through its symbol table.
    Enum,
    /// A bitmask, stringified as `A|B` through its symbol table.
    Flags,
    /// A reference to another reflected object.
    ObjectRef,
    /// Anything else, stringified by the type itself.
    Opaque,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.pad("Void"),
            Self::Primitive => f.pad("Primitive"),
            Self::Enum => f.pad("Enum"),
            Self::Flags => f.pad("Flags"),
            Self::ObjectRef => f.pad("ObjectRef"),
            Self::Opaque => f.pad("Opaque"),
        }
    }
}

// -----------------------------------------------------------------------------
// EnumSymbol

/// One named value of an enum or flags type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumSymbol {
    name: &'static str,
    value: i64,
}

impl EnumSymbol {
    /// Creates a new symbol.
    #[inline]
    pub const fn new(name: &'static str, value: i64) -> Self {
        Self { name, value }
    }

    /// Returns the symbol name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the integer value.
    #[inline]
    pub const fn value(&self) -> i64 {
        self.value
    }
}

// -----------------------------------------------------------------------------
// TypeInfo

/// Runtime description of a reflected value type.
///
/// Every [`RttiType`](crate::types::RttiType) returns a `&'static TypeInfo`,
/// so two infos can be compared by address or by name.
///
/// # Examples
///
/// ```
/// use pl_rtti::types::{RttiType, TypeKind};
///
/// let info = <i32 as RttiType>::type_info();
/// assert_eq!(info.name(), "int32");
/// assert_eq!(info.kind(), TypeKind::Primitive);
/// ```
#[derive(Debug, Clone)]
pub struct TypeInfo {
    name: &'static str,
    kind: TypeKind,
    symbols: Cow<'static, [EnumSymbol]>,
}

impl TypeInfo {
    /// Creates a type info without symbols.
    #[inline]
    pub const fn new(name: &'static str, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            symbols: Cow::Borrowed(&[]),
        }
    }

    /// Creates the type info of an enumeration.
    #[inline]
    pub const fn enumeration(name: &'static str, symbols: &'static [EnumSymbol]) -> Self {
        Self {
            name,
            kind: TypeKind::Enum,
            symbols: Cow::Borrowed(symbols),
        }
    }

    /// Creates the type info of a bitmask with a symbol table built at runtime.
    #[inline]
    pub fn flags(name: &'static str, symbols: Vec<EnumSymbol>) -> Self {
        Self {
            name,
            kind: TypeKind::Flags,
            symbols: Cow::Owned(symbols),
        }
    }

    /// Returns the type name, e.g. `"int32"` or `"String"`.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the [`TypeKind`].
    #[inline]
    pub const fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Returns the symbol table in declaration order.
    #[inline]
    pub fn symbols(&self) -> &[EnumSymbol] {
        &self.symbols
    }

    /// Returns the name of the symbol with exactly this value.
    pub fn symbol_of(&self, value: i64) -> Option<&'static str> {
        self.symbols
            .iter()
            .find(|s| s.value == value)
            .map(EnumSymbol::name)
    }

    /// Returns the value of the symbol with this name.
    pub fn value_of(&self, symbol: &str) -> Option<i64> {
        self.symbols
            .iter()
            .find(|s| s.name == symbol)
            .map(EnumSymbol::value)
    }

    /// Formats an enum value: its symbol if one matches exactly,
    /// otherwise the decimal integer.
    pub fn format_enum(&self, value: i64) -> String {
        match self.symbol_of(value) {
            Some(name) => String::from(name),
            None => value.to_string(),
        }
    }

    /// Parses an enum value from a symbol or an integer.
    ///
    /// Unknown input yields `0`.
    pub fn parse_enum(&self, s: &str) -> i64 {
        let s = s.trim();
        match self.value_of(s) {
            Some(value) => value,
            None => parse::parse_int(s) as i64,
        }
    }

    /// Formats a bitmask as `A|B`.
    ///
    /// If some set bits are not covered by any symbol, the whole
    /// value is written as a decimal integer instead.
    pub fn format_flags(&self, bits: u64) -> String {
        if bits == 0 {
            return match self.symbol_of(0) {
                Some(name) => String::from(name),
                None => String::from("0"),
            };
        }

        let mut remaining = bits;
        let mut names: Vec<&'static str> = Vec::new();
        for symbol in self.symbols.iter() {
            let value = symbol.value as u64;
            if value != 0 && bits & value == value && remaining & value != 0 {
                names.push(symbol.name);
                remaining &= !value;
            }
        }

        if remaining != 0 || names.is_empty() {
            bits.to_string()
        } else {
            names.join("|")
        }
    }

    /// Parses a bitmask from `A|B|4`.
    ///
    /// Every part is either a symbol or an integer, unknown parts contribute `0`.
    pub fn parse_flags(&self, s: &str) -> u64 {
        s.split('|')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .fold(0u64, |bits, part| {
                let value = match self.value_of(part) {
                    Some(value) => value as u64,
                    None => parse::parse_int(part) as u64,
                };
                bits | value
            })
    }
}

/// Formats a call signature such as `int32(int32,String)`.
pub fn format_signature(ret: &TypeInfo, params: &[&TypeInfo]) -> String {
    let mut out = String::from(ret.name);
    out.push('(');
    for (index, param) in params.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push_str(param.name);
    }
    out.push(')');
    out
}

impl PartialEq for TypeInfo {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self, other) || (self.name == other.name && self.kind == other.kind)
    }
}

impl Eq for TypeInfo {}

impl fmt::Display for TypeInfo {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::{EnumSymbol, TypeInfo, TypeKind, format_signature};

    const SYMBOLS: &[EnumSymbol] = &[
        EnumSymbol::new("None", 0),
        EnumSymbol::new("Visible", 1),
        EnumSymbol::new("Active", 2),
        EnumSymbol::new("All", 3),
    ];

    #[test]
    fn enum_format_falls_back_to_integer() {
        let info = TypeInfo::enumeration("State", SYMBOLS);
        assert_eq!(info.format_enum(2), "Active");
        assert_eq!(info.format_enum(7), "7");
        assert_eq!(info.parse_enum("Visible"), 1);
        assert_eq!(info.parse_enum(" 42 "), 42);
        assert_eq!(info.parse_enum("Unknown"), 0);
    }

    #[test]
    fn signature_lists_params() {
        let int = TypeInfo::new("int32", TypeKind::Primitive);
        let void = TypeInfo::new("void", TypeKind::Void);
        assert_eq!(format_signature(&int, &[&int, &int]), "int32(int32,int32)");
        assert_eq!(format_signature(&void, &[]), "void()");
    }

    #[test]
    fn flags_decompose() {
        let info = TypeInfo::flags(
            "Mask",
            alloc::vec![
                EnumSymbol::new("Visible", 1),
                EnumSymbol::new("Active", 2),
                EnumSymbol::new("Locked", 8),
            ],
        );
        assert_eq!(info.kind(), TypeKind::Flags);
        assert_eq!(info.format_flags(3), "Visible|Active");
        assert_eq!(info.format_flags(0), "0");
        // Bit 4 has no symbol.
        assert_eq!(info.format_flags(5), "5");
        assert_eq!(info.parse_flags("Visible|Locked"), 9);
        assert_eq!(info.parse_flags("Active | 4"), 6);
        assert_eq!(info.parse_flags("Nope"), 0);
    }
}
