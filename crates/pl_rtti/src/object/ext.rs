use alloc::string::String;
use alloc::vec::Vec;

use crate::class::Class;
use crate::object::{AsObject, CallError, DynEvent, DynEventHandler, DynFunc, DynParams, DynVar};
use crate::serialize::{
    DefaultValue, XML_CLASS_ATTRIBUTE, XML_OBJECT_ELEMENT, XmlElement, format_values, parse_values,
};
use crate::types::Value;

// -----------------------------------------------------------------------------
// ObjectExt

/// Reflective access to any [`Object`](crate::object::Object).
///
/// Every lookup goes through the merged member lists of the object's class.
/// Unknown names never fail loudly: getters return `None`, setters are
/// skipped and logged at debug level.
///
/// # Examples
///
/// ```
/// use pl_rtti::object::ObjectExt;
/// use pl_rtti::serialize::DefaultValue;
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
/// let mut widget = Widget::default();
/// widget.set_attribute("Count", "42");
///
/// assert_eq!(widget.get_attribute("Count").unwrap().get_int(), 42);
/// assert_eq!(widget.get_values(DefaultValue::NoDefault), "Count='42'");
/// ```
pub trait ObjectExt: AsObject {
    // ----- Class

    /// Returns `true` if the class of this object is `name` or derives from it.
    fn is_instance_of(&self, name: &str) -> bool {
        self.as_object().class().is_derived_from(name)
    }

    /// Returns `true` if the class of this object is `class` or derives from it.
    fn is_instance_of_class(&self, class: &Class) -> bool {
        self.as_object().class().is_derived_from_class(class)
    }

    // ----- Attributes

    /// Returns the attribute `name` bound to this object.
    fn get_attribute(&mut self, name: &str) -> Option<DynVar<'_>> {
        let desc = self.as_object().class().attribute(name)?;
        Some(DynVar::new(self.as_object_mut(), desc))
    }

    /// Returns the value of the attribute `name` in string form.
    fn get_attribute_string(&self, name: &str) -> Option<String> {
        let object = self.as_object();
        object.class().attribute(name)?.get_string(object)
    }

    /// Returns the value of the attribute `name`.
    fn get_attribute_value(&self, name: &str) -> Option<Value> {
        let object = self.as_object();
        object.class().attribute(name)?.get_value(object)
    }

    /// Sets the attribute `name` from a string.
    ///
    /// Returns `false` if the attribute does not exist or is read-only.
    fn set_attribute(&mut self, name: &str, value: &str) -> bool {
        let object = self.as_object_mut();
        match object.class().attribute(name) {
            Some(desc) => desc.set_string(object, value),
            None => {
                log::debug!("Unknown attribute `{name}` on `{}`", object.class().full_name());
                false
            }
        }
    }

    /// Sets the attribute `name` from a typed value.
    fn set_attribute_value(&mut self, name: &str, value: &Value) -> bool {
        let object = self.as_object_mut();
        match object.class().attribute(name) {
            Some(desc) => desc.set_value(object, value),
            None => {
                log::debug!("Unknown attribute `{name}` on `{}`", object.class().full_name());
                false
            }
        }
    }

    /// Copies the value of another bound attribute into the attribute `name`.
    ///
    /// Does nothing if `var` is `None`.
    fn set_attribute_var(&mut self, name: &str, var: Option<&DynVar<'_>>) -> bool {
        match var {
            Some(var) => self.set_attribute(name, &var.get_string()),
            None => false,
        }
    }

    /// Resets the attribute `name` to its default value.
    fn set_attribute_default(&mut self, name: &str) -> bool {
        let object = self.as_object_mut();
        match object.class().attribute(name) {
            Some(desc) => desc.set_default(object),
            None => {
                log::debug!("Unknown attribute `{name}` on `{}`", object.class().full_name());
                false
            }
        }
    }

    // ----- Methods

    /// Returns the method `name` bound to this object.
    fn get_method(&mut self, name: &str) -> Option<DynFunc<'_>> {
        let desc = self.as_object().class().method(name)?;
        Some(DynFunc::new(self.as_object_mut(), desc))
    }

    /// Calls the method `name`, the return value is stored in `params`.
    ///
    /// An unknown method is reported as [`CallError::UnknownMethod`] and
    /// otherwise does nothing.
    fn call_method(&mut self, name: &str, params: &mut DynParams) -> Result<(), CallError> {
        let object = self.as_object_mut();
        let class = object.class();
        let Some(desc) = class.method(name) else {
            log::debug!("Unknown method `{name}` on `{}`", class.full_name());
            return Err(CallError::UnknownMethod(String::from(name)));
        };
        #[cfg(feature = "debug")]
        log::trace!("Call `{}::{name}` with {} parameter(s)", class.full_name(), params.len());
        desc.invoke(object, params)
    }

    /// Calls the method `name` with `Param0='..'` parameters and returns the
    /// return value as a string.
    fn call_method_string(&mut self, name: &str, params: &str) -> Result<String, CallError> {
        let mut params = DynParams::from_string(params);
        self.call_method(name, &mut params)?;
        Ok(params.return_value().to_string_value())
    }

    // ----- Events

    /// Returns the signal `name` of this object.
    fn get_signal(&self, name: &str) -> Option<DynEvent<'_>> {
        let object = self.as_object();
        let desc = object.class().signal(name)?;
        let signal = desc.get(object)?;
        Some(DynEvent::new(desc, signal))
    }

    /// Returns the slot `name` of this object.
    fn get_slot(&self, name: &str) -> Option<DynEventHandler<'_>> {
        let object = self.as_object();
        let desc = object.class().slot(name)?;
        let slot = desc.get(object)?;
        Some(DynEventHandler::new(desc, slot))
    }

    // ----- Values

    /// Returns every attribute as `Name='Value'`, in declaration order.
    ///
    /// With [`DefaultValue::NoDefault`] attributes at their default value
    /// are left out.
    fn get_values(&self, default: DefaultValue) -> String {
        let object = self.as_object();
        let pairs: Vec<(&'static str, String)> = object
            .class()
            .attributes()
            .iter()
            .filter(|desc| default == DefaultValue::WithDefault || !desc.is_default(object))
            .filter_map(|desc| Some((desc.name(), desc.get_string(object)?)))
            .collect();
        format_values(pairs.iter().map(|(name, value)| (*name, value.as_str())))
    }

    /// Applies a `Name='Value'` string. Unknown names are skipped.
    fn set_values(&mut self, values: &str) {
        for (name, value) in parse_values(values) {
            self.set_attribute(&name, &value);
        }
    }

    /// Resets every attribute to its default value.
    fn set_default_values(&mut self) {
        let object = self.as_object_mut();
        for desc in object.class().attributes() {
            desc.set_default(object);
        }
    }

    /// Writes every attribute as an XML attribute of `element`.
    fn get_values_xml(&self, element: &mut XmlElement, default: DefaultValue) {
        let object = self.as_object();
        for desc in object.class().attributes() {
            if default == DefaultValue::NoDefault && desc.is_default(object) {
                continue;
            }
            if let Some(value) = desc.get_string(object) {
                element.set_attribute(desc.name(), value);
            }
        }
    }

    /// Applies the XML attributes of `element`. Unknown names are skipped.
    fn set_values_xml(&mut self, element: &XmlElement) {
        let object = self.as_object_mut();
        let class = object.class();
        for (name, value) in element.attributes() {
            match class.attribute(name) {
                Some(desc) => {
                    desc.set_string(object, value);
                }
                None if name == XML_CLASS_ATTRIBUTE => {}
                None => log::debug!("Unknown attribute `{name}` on `{}`", class.full_name()),
            }
        }
    }

    /// Returns an `<Object Class=".."/>` element carrying every attribute.
    fn to_xml(&self, default: DefaultValue) -> XmlElement {
        let mut element = XmlElement::new(XML_OBJECT_ELEMENT);
        element.set_attribute(XML_CLASS_ATTRIBUTE, self.as_object().class().full_name());
        self.get_values_xml(&mut element, default);
        element
    }
}

impl<T: AsObject + ?Sized> ObjectExt for T {}
