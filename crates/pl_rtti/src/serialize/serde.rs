//! Serde bridge for the attribute set of an object.
//!
//! Attributes are written as a map from attribute name to the canonical
//! string form. Reading accepts strings, numbers and booleans for values.

use alloc::string::{String, ToString};
use core::fmt::{self, Formatter};

use serde_core::de::{self, DeserializeSeed, MapAccess, Visitor};
use serde_core::ser::SerializeMap;
use serde_core::{Deserializer, Serialize, Serializer};

use crate::object::{Object, ObjectExt};
use crate::serialize::DefaultValue;

// -----------------------------------------------------------------------------
// Serialize

/// Serializes the attributes of an object as a map.
///
/// # Examples
///
/// ```
/// use pl_rtti::serialize::{DefaultValue, ObjectValues};
/// # use pl_rtti::class::{Class, ClassBuilder, ClassCell, ClassRef, ClassType};
/// # use pl_rtti::object::Object;
/// # #[derive(Default)]
/// # struct Widget { count: i32 }
/// # impl Object for Widget {
/// #     fn class(&self) -> ClassRef { Self::static_class() }
/// # }
/// # impl ClassType for Widget {
/// #     fn build_class() -> Class {
/// #         ClassBuilder::<Self>::new("Widget")
/// #             .field("Count", 0i32, |w| &w.count, |w| &mut w.count)
/// #             .build()
/// #     }
/// #     fn static_class() -> ClassRef {
/// #         static CELL: ClassCell = ClassCell::new();
/// #         CELL.get_or_build::<Self>()
/// #     }
/// # }
///
/// let widget = Widget { count: 7 };
/// let json = serde_json::to_string(&ObjectValues::new(&widget, DefaultValue::WithDefault)).unwrap();
/// assert_eq!(json, r#"{"Count":"7"}"#);
/// ```
pub struct ObjectValues<'a> {
    object: &'a dyn Object,
    default: DefaultValue,
}

impl<'a> ObjectValues<'a> {
    #[inline]
    pub fn new(object: &'a dyn Object, default: DefaultValue) -> Self {
        Self { object, default }
    }
}

impl Serialize for ObjectValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let attributes = self.object.class().attributes();
        let mut state = serializer.serialize_map(None)?;
        for desc in &attributes {
            if self.default == DefaultValue::NoDefault && desc.is_default(self.object) {
                continue;
            }
            if let Some(value) = desc.get_string(self.object) {
                state.serialize_entry(desc.name(), &value)?;
            }
        }
        state.end()
    }
}

// -----------------------------------------------------------------------------
// Deserialize

/// Applies a map of attribute values to an existing object.
///
/// Unknown names are skipped, like [`ObjectExt::set_values`].
pub struct ObjectValuesSeed<'a> {
    object: &'a mut dyn Object,
}

impl<'a> ObjectValuesSeed<'a> {
    #[inline]
    pub fn new(object: &'a mut dyn Object) -> Self {
        Self { object }
    }
}

impl<'de> DeserializeSeed<'de> for ObjectValuesSeed<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(ValuesVisitor {
            object: self.object,
        })
    }
}

struct ValuesVisitor<'a> {
    object: &'a mut dyn Object,
}

impl<'de> Visitor<'de> for ValuesVisitor<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("a map of attribute values")
    }

    fn visit_map<V: MapAccess<'de>>(self, mut map: V) -> Result<(), V::Error> {
        while let Some((name, AttributeText(value))) = map.next_entry::<String, AttributeText>()? {
            self.object.set_attribute(&name, &value);
        }
        Ok(())
    }
}

/// A scalar value read as its string form.
struct AttributeText(String);

impl<'de> serde_core::Deserialize<'de> for AttributeText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TextVisitor).map(AttributeText)
    }
}

struct TextVisitor;

impl Visitor<'_> for TextVisitor {
    type Value = String;

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("a string, number or boolean")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(String::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_unit<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }
}
