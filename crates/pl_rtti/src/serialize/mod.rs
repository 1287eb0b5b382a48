//! String, XML and serde persistence of attribute values.
//!
//! The reflective entry points live on [`ObjectExt`](crate::object::ObjectExt):
//! `get_values`/`set_values` for the `Name='Value'` string,
//! `get_values_xml`/`set_values_xml`/`to_xml` for XML attributes.

mod serde;
mod values;
mod xml;

pub use serde::{ObjectValues, ObjectValuesSeed};
pub use values::{format_values, parse_values};
pub use xml::{XML_CLASS_ATTRIBUTE, XML_OBJECT_ELEMENT, XmlElement, XmlError};

crate::rtti_enum! {
    /// Whether attributes at their default value are written.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub enum DefaultValue: "DefaultValue" {
        /// Write every attribute.
        WithDefault = 0,
        /// Leave out attributes at their default value.
        #[default]
        NoDefault = 1,
    }
}
