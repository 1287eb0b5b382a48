use alloc::vec::Vec;

use crate::types::{RttiType, TypeInfo, Value};

/// The argument tuple carried by a [`Signal`](crate::event::Signal).
///
/// Implemented for `()` and tuples of up to four [`RttiType`] values,
/// which lets type-erased callers emit a signal from a list of [`Value`]s.
pub trait EventArgs: Send + Sync + 'static {
    /// Returns the parameter types in order.
    fn param_types() -> Vec<&'static TypeInfo>;

    /// Converts the arguments into values.
    fn to_params(&self) -> Vec<Value>;

    /// Rebuilds the arguments, returns `None` if the count does not match.
    fn from_params(params: &[Value]) -> Option<Self>
    where
        Self: Sized;
}

macro_rules! impl_event_args {
    ($count:literal: $($arg:ident $index:tt),*) => {
        impl<$($arg: RttiType),*> EventArgs for ($($arg,)*) {
            fn param_types() -> Vec<&'static TypeInfo> {
                alloc::vec![$(<$arg as RttiType>::type_info()),*]
            }

            fn to_params(&self) -> Vec<Value> {
                alloc::vec![$(self.$index.to_value()),*]
            }

            fn from_params(params: &[Value]) -> Option<Self> {
                if params.len() != $count {
                    return None;
                }
                Some(($(<$arg as RttiType>::from_value(&params[$index]),)*))
            }
        }
    };
}

impl_event_args!(0:);
impl_event_args!(1: A0 0);
impl_event_args!(2: A0 0, A1 1);
impl_event_args!(3: A0 0, A1 1, A2 2);
impl_event_args!(4: A0 0, A1 1, A2 2, A3 3);

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::EventArgs;
    use crate::types::Value;

    #[test]
    fn tuple_params() {
        let types = <(i32, String)>::param_types();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].name(), "int32");
        assert_eq!(types[1].name(), "String");

        let params = (7i32, String::from("seven")).to_params();
        assert_eq!(params, [Value::Int(7), Value::from("seven")]);

        let back = <(i32, String)>::from_params(&params);
        assert_eq!(back, Some((7, String::from("seven"))));
        assert_eq!(<(i32, String)>::from_params(&params[..1]), None);
        assert_eq!(<()>::from_params(&[]), Some(()));
    }
}
