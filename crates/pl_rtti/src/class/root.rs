use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use std::sync::OnceLock;

use crate::class::class::BaseLink;
use crate::class::{Class, ClassRef, MethodDesc};
use crate::object::{DynParams, Object, ObjectExt};
use crate::serialize::DefaultValue;
use crate::types::{RttiType, TypeInfo, Value};

/// Namespace of the root class.
pub const ROOT_NAMESPACE: &str = "PLCore";

/// Name of the root class.
pub const ROOT_NAME: &str = "Object";

fn string_param(params: &DynParams, index: usize) -> String {
    params
        .get(index)
        .map(Value::to_string_value)
        .unwrap_or_default()
}

fn root_method(
    name: &'static str,
    ret: &'static TypeInfo,
    params: Vec<&'static TypeInfo>,
    body: fn(&mut dyn Object, &mut DynParams),
) -> Arc<MethodDesc> {
    Arc::new(MethodDesc::raw(
        name,
        ret,
        params,
        Box::new(move |object: &mut dyn Object, params: &mut DynParams| {
            body(object, params);
            true
        }),
    ))
}

fn build_root() -> Class {
    let string = <String as RttiType>::type_info();
    let void = <() as RttiType>::type_info();
    let boolean = <bool as RttiType>::type_info();
    let default_value = <DefaultValue as RttiType>::type_info();

    let mut class = Class::new(ROOT_NAME, ROOT_NAMESPACE, BaseLink::None);
    class.description = "Root class of all reflected objects";
    class.methods = vec![
        root_method("GetValues", string, vec![default_value], |object, params| {
            let default = params
                .get(0)
                .map(DefaultValue::from_value)
                .unwrap_or(DefaultValue::NoDefault);
            let values = object.get_values(default);
            params.set_return(Value::String(values));
        }),
        root_method("SetValues", void, vec![string], |object, params| {
            let values = string_param(params, 0);
            object.set_values(&values);
        }),
        root_method("SetDefaultValues", void, vec![], |object, _| {
            object.set_default_values();
        }),
        root_method("IsInstanceOf", boolean, vec![string], |object, params| {
            let name = string_param(params, 0);
            let result = object.is_instance_of(&name);
            params.set_return(Value::Bool(result));
        }),
        root_method("SetAttribute", void, vec![string, string], |object, params| {
            let name = string_param(params, 0);
            let value = string_param(params, 1);
            object.set_attribute(&name, &value);
        }),
        root_method("GetAttribute", string, vec![string], |object, params| {
            let name = string_param(params, 0);
            let value = object.get_attribute_string(&name).unwrap_or_default();
            params.set_return(Value::String(value));
        }),
        root_method("SetAttributeDefault", void, vec![string], |object, params| {
            let name = string_param(params, 0);
            object.set_attribute_default(&name);
        }),
    ];
    class
}

/// Returns the root class `PLCore::Object`.
///
/// It has no attributes and no constructor. Its methods drive the
/// reflection of any object through [`call_method`](ObjectExt::call_method):
///
/// | Method | Signature |
/// |---|---|
/// | `GetValues` | `String(DefaultValue)` |
/// | `SetValues` | `void(String)` |
/// | `SetDefaultValues` | `void()` |
/// | `IsInstanceOf` | `bool(String)` |
/// | `SetAttribute` | `void(String,String)` |
/// | `GetAttribute` | `String(String)` |
/// | `SetAttributeDefault` | `void(String)` |
pub fn root_class() -> ClassRef {
    static ROOT: OnceLock<ClassRef> = OnceLock::new();
    Arc::clone(ROOT.get_or_init(|| Arc::new(build_root())))
}
