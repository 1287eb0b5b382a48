//! Reflected value types.
//!
//! - [`TypeInfo`] and [`TypeKind`]: runtime descriptors of value types.
//! - [`RttiType`]: conversion between native values, canonical strings and [`Value`].
//! - [`Value`]: the dynamically typed value used by every type-erased access.
//! - [`rtti_enum!`](crate::rtti_enum) and [`impl_rtti_flags!`](crate::impl_rtti_flags):
//!   reflection for enums and bitflags.

mod enums;
mod rtti_type;
mod type_info;
mod value;

pub mod parse;

pub use enums::{flags_from_bits, flags_to_bits, flags_type_info};
pub use rtti_type::RttiType;
pub use type_info::{EnumSymbol, TypeInfo, TypeKind, format_signature};
pub use value::Value;
