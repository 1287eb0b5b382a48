use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use crate::object::{Object, resolve, resolve_mut};
use crate::types::{RttiType, TypeInfo, Value};

// -----------------------------------------------------------------------------
// Access

/// Whether an attribute can be written through reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Access {
    #[default]
    ReadWrite,
    ReadOnly,
}

// -----------------------------------------------------------------------------
// AttributeAccess

/// Reads and writes one attribute on a type-erased object.
///
/// Every operation returns `None`/`false` if the object does not contain
/// the class that declares the attribute.
pub trait AttributeAccess: Send + Sync {
    fn get_string(&self, object: &dyn Object) -> Option<String>;

    fn set_string(&self, object: &mut dyn Object, value: &str) -> bool;

    fn get_value(&self, object: &dyn Object) -> Option<Value>;

    fn set_value(&self, object: &mut dyn Object, value: &Value) -> bool;
}

/// Attribute stored directly in a field of `C`.
struct FieldAccess<C, T> {
    get: fn(&C) -> &T,
    get_mut: Option<fn(&mut C) -> &mut T>,
}

impl<C: Object, T: RttiType> AttributeAccess for FieldAccess<C, T> {
    fn get_string(&self, object: &dyn Object) -> Option<String> {
        resolve::<C>(object).map(|c| (self.get)(c).to_rtti_string())
    }

    fn set_string(&self, object: &mut dyn Object, value: &str) -> bool {
        let Some(get_mut) = self.get_mut else {
            return false;
        };
        match resolve_mut::<C>(object) {
            Some(c) => {
                *get_mut(c) = T::from_rtti_string(value);
                true
            }
            None => false,
        }
    }

    fn get_value(&self, object: &dyn Object) -> Option<Value> {
        resolve::<C>(object).map(|c| (self.get)(c).to_value())
    }

    fn set_value(&self, object: &mut dyn Object, value: &Value) -> bool {
        let Some(get_mut) = self.get_mut else {
            return false;
        };
        match resolve_mut::<C>(object) {
            Some(c) => {
                *get_mut(c) = T::from_value(value);
                true
            }
            None => false,
        }
    }
}

/// Attribute computed by a getter and stored by an optional setter.
struct PropertyAccess<C, T> {
    get: fn(&C) -> T,
    set: Option<fn(&mut C, T)>,
}

impl<C: Object, T: RttiType> AttributeAccess for PropertyAccess<C, T> {
    fn get_string(&self, object: &dyn Object) -> Option<String> {
        resolve::<C>(object).map(|c| (self.get)(c).to_rtti_string())
    }

    fn set_string(&self, object: &mut dyn Object, value: &str) -> bool {
        let Some(set) = self.set else {
            return false;
        };
        match resolve_mut::<C>(object) {
            Some(c) => {
                set(c, T::from_rtti_string(value));
                true
            }
            None => false,
        }
    }

    fn get_value(&self, object: &dyn Object) -> Option<Value> {
        resolve::<C>(object).map(|c| (self.get)(c).to_value())
    }

    fn set_value(&self, object: &mut dyn Object, value: &Value) -> bool {
        let Some(set) = self.set else {
            return false;
        };
        match resolve_mut::<C>(object) {
            Some(c) => {
                set(c, T::from_value(value));
                true
            }
            None => false,
        }
    }
}

// -----------------------------------------------------------------------------
// AttributeDesc

/// Descriptor of a reflected attribute.
///
/// The default value is kept in canonical string form, so
/// `is_default` is a string comparison against the current value.
pub struct AttributeDesc {
    name: &'static str,
    description: &'static str,
    annotation: &'static str,
    default: String,
    access: Access,
    type_info: &'static TypeInfo,
    canonicalize: fn(&str) -> String,
    accessor: Box<dyn AttributeAccess>,
}

fn canonical<T: RttiType>(s: &str) -> String {
    T::from_rtti_string(s).to_rtti_string()
}

impl AttributeDesc {
    /// Creates an attribute stored in a field of `C`.
    pub fn field<C: Object, T: RttiType>(
        name: &'static str,
        default: T,
        get: fn(&C) -> &T,
        get_mut: fn(&mut C) -> &mut T,
    ) -> Self {
        Self::with_accessor::<T>(
            name,
            &default,
            Access::ReadWrite,
            Box::new(FieldAccess {
                get,
                get_mut: Some(get_mut),
            }),
        )
    }

    /// Creates a read-only attribute stored in a field of `C`.
    pub fn read_only_field<C: Object, T: RttiType>(
        name: &'static str,
        default: T,
        get: fn(&C) -> &T,
    ) -> Self {
        Self::with_accessor::<T>(
            name,
            &default,
            Access::ReadOnly,
            Box::new(FieldAccess { get, get_mut: None }),
        )
    }

    /// Creates an attribute backed by a getter and an optional setter.
    ///
    /// Without a setter the attribute is read-only.
    pub fn property<C: Object, T: RttiType>(
        name: &'static str,
        default: T,
        get: fn(&C) -> T,
        set: Option<fn(&mut C, T)>,
    ) -> Self {
        let access = if set.is_some() {
            Access::ReadWrite
        } else {
            Access::ReadOnly
        };
        Self::with_accessor::<T>(name, &default, access, Box::new(PropertyAccess { get, set }))
    }

    /// Creates an attribute with a custom accessor.
    pub fn with_accessor<T: RttiType>(
        name: &'static str,
        default: &T,
        access: Access,
        accessor: Box<dyn AttributeAccess>,
    ) -> Self {
        Self {
            name,
            description: "",
            annotation: "",
            default: default.to_rtti_string(),
            access,
            type_info: T::type_info(),
            canonicalize: canonical::<T>,
            accessor,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the free-form annotation.
    pub fn with_annotation(mut self, annotation: &'static str) -> Self {
        self.annotation = annotation;
        self
    }

    /// Replaces the default value, given in string form.
    ///
    /// The string is canonicalized through the attribute type.
    pub fn with_default(mut self, default: &str) -> Self {
        self.default = (self.canonicalize)(default);
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn description(&self) -> &'static str {
        self.description
    }

    #[inline]
    pub fn annotation(&self) -> &'static str {
        self.annotation
    }

    /// Returns the default value in canonical string form.
    #[inline]
    pub fn default_value(&self) -> &str {
        &self.default
    }

    #[inline]
    pub fn access(&self) -> Access {
        self.access
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.access == Access::ReadOnly
    }

    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        self.type_info
    }

    /// Returns the canonical form of `s` for this attribute's type.
    #[inline]
    pub fn canonicalize(&self, s: &str) -> String {
        (self.canonicalize)(s)
    }

    // ----- Instance access

    /// Reads the attribute of `object` as a string.
    pub fn get_string(&self, object: &dyn Object) -> Option<String> {
        self.accessor.get_string(object)
    }

    /// Writes the attribute of `object` from a string.
    ///
    /// Returns `false` for read-only attributes, which are left untouched.
    pub fn set_string(&self, object: &mut dyn Object, value: &str) -> bool {
        if self.is_read_only() {
            log::debug!("Ignored write to read-only attribute `{}`", self.name);
            return false;
        }
        self.accessor.set_string(object, value)
    }

    /// Reads the attribute of `object` as a [`Value`].
    pub fn get_value(&self, object: &dyn Object) -> Option<Value> {
        self.accessor.get_value(object)
    }

    /// Writes the attribute of `object` from a [`Value`].
    pub fn set_value(&self, object: &mut dyn Object, value: &Value) -> bool {
        if self.is_read_only() {
            log::debug!("Ignored write to read-only attribute `{}`", self.name);
            return false;
        }
        self.accessor.set_value(object, value)
    }

    /// Returns `true` if the current value equals the default.
    pub fn is_default(&self, object: &dyn Object) -> bool {
        self.get_string(object)
            .is_some_and(|current| current == self.default)
    }

    /// Resets the attribute of `object` to its default.
    pub fn set_default(&self, object: &mut dyn Object) -> bool {
        if self.is_read_only() {
            return false;
        }
        self.accessor.set_string(object, &self.default)
    }
}

impl fmt::Debug for AttributeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDesc")
            .field("name", &self.name)
            .field("type", &self.type_info.name())
            .field("default", &self.default)
            .field("access", &self.access)
            .finish()
    }
}
