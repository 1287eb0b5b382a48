use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::object::{CallError, DynParams, Object, resolve, resolve_mut};
use crate::types::{RttiType, TypeInfo, format_signature};

/// Type-erased method body. Returns `false` if the object does not
/// contain the declaring class.
pub type MethodInvoker = Box<dyn Fn(&mut dyn Object, &mut DynParams) -> bool + Send + Sync>;

/// Type-erased constructor body.
pub type ConstructorInvoker = Box<dyn Fn(&DynParams) -> Box<dyn Object> + Send + Sync>;

// -----------------------------------------------------------------------------
// MethodDesc

/// Descriptor of a reflected method.
pub struct MethodDesc {
    name: &'static str,
    description: &'static str,
    return_type: &'static TypeInfo,
    param_types: Vec<&'static TypeInfo>,
    invoker: MethodInvoker,
}

impl MethodDesc {
    /// Creates a descriptor from a typed function, see [`IntoMethod`].
    pub fn new<C, M, F>(name: &'static str, f: F) -> Self
    where
        F: IntoMethod<C, M>,
    {
        Self {
            name,
            description: "",
            return_type: F::return_type(),
            param_types: F::param_types(),
            invoker: f.into_invoker(),
        }
    }

    /// Creates a descriptor from a type-erased body.
    ///
    /// The parameter count is checked before `invoker` runs.
    pub fn raw(
        name: &'static str,
        return_type: &'static TypeInfo,
        param_types: Vec<&'static TypeInfo>,
        invoker: MethodInvoker,
    ) -> Self {
        Self {
            name,
            description: "",
            return_type,
            param_types,
            invoker,
        }
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
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
    pub fn return_type(&self) -> &'static TypeInfo {
        self.return_type
    }

    #[inline]
    pub fn param_types(&self) -> &[&'static TypeInfo] {
        &self.param_types
    }

    /// Returns the signature, e.g. `int32(int32,int32)`.
    pub fn signature(&self) -> String {
        format_signature(self.return_type, &self.param_types)
    }

    /// Calls the method on `object`, the return value is stored in `params`.
    pub fn invoke(&self, object: &mut dyn Object, params: &mut DynParams) -> Result<(), CallError> {
        if params.len() != self.param_types.len() {
            return Err(CallError::ParamCount {
                method: String::from(self.name),
                expected: self.param_types.len(),
                found: params.len(),
            });
        }
        #[cfg(feature = "debug")]
        log::trace!("Calling `{}` on `{}`", self.signature(), object.class().full_name());
        if (self.invoker)(object, params) {
            Ok(())
        } else {
            Err(CallError::TargetMismatch(String::from(self.name)))
        }
    }
}

impl fmt::Debug for MethodDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDesc")
            .field("name", &self.name)
            .field("signature", &self.signature())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ConstructorDesc

/// Descriptor of a reflected constructor.
pub struct ConstructorDesc {
    name: &'static str,
    description: &'static str,
    param_types: Vec<&'static TypeInfo>,
    invoker: ConstructorInvoker,
}

impl ConstructorDesc {
    /// Creates a descriptor from a typed function, see [`IntoConstructor`].
    pub fn new<C, M, F>(name: &'static str, f: F) -> Self
    where
        F: IntoConstructor<C, M>,
    {
        Self {
            name,
            description: "",
            param_types: F::param_types(),
            invoker: f.into_invoker(),
        }
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
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
    pub fn param_types(&self) -> &[&'static TypeInfo] {
        &self.param_types
    }

    /// Returns the signature, e.g. `void(int32)`.
    pub fn signature(&self) -> String {
        format_signature(<() as RttiType>::type_info(), &self.param_types)
    }

    /// Builds a new object from `params`.
    pub fn invoke(&self, params: &DynParams) -> Result<Box<dyn Object>, CallError> {
        if params.len() != self.param_types.len() {
            return Err(CallError::ParamCount {
                method: String::from(self.name),
                expected: self.param_types.len(),
                found: params.len(),
            });
        }
        Ok((self.invoker)(params))
    }
}

impl fmt::Debug for ConstructorDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDesc")
            .field("name", &self.name)
            .field("signature", &self.signature())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// IntoMethod

/// A function that can be registered as a method of `C`.
///
/// Implemented for functions and closures taking `&C` or `&mut C`
/// followed by up to four [`RttiType`] parameters and returning an
/// [`RttiType`] (or `()`). `Marker` only disambiguates the implementations.
#[diagnostic::on_unimplemented(
    message = "`{Self}` can not be registered as a method of `{C}`",
    note = "the receiver must be `&{C}` or `&mut {C}`, parameters and the return type must implement `RttiType`"
)]
pub trait IntoMethod<C, Marker>: Send + Sync + Sized + 'static {
    fn param_types() -> Vec<&'static TypeInfo>;

    fn return_type() -> &'static TypeInfo;

    fn into_invoker(self) -> MethodInvoker;
}

macro_rules! impl_into_method {
    ($($arg:ident $index:tt),*) => {
        impl<C, F, R, $($arg,)*> IntoMethod<C, fn(&mut C, $($arg),*) -> R> for F
        where
            C: Object,
            F: Fn(&mut C, $($arg),*) -> R + Send + Sync + 'static,
            R: RttiType,
            $($arg: RttiType,)*
        {
            fn param_types() -> Vec<&'static TypeInfo> {
                alloc::vec![$(<$arg as RttiType>::type_info()),*]
            }

            fn return_type() -> &'static TypeInfo {
                R::type_info()
            }

            fn into_invoker(self) -> MethodInvoker {
                Box::new(move |object: &mut dyn Object, params: &mut DynParams| {
                    let Some(target) = resolve_mut::<C>(object) else {
                        return false;
                    };
                    let ret = (self)(target, $(<$arg as RttiType>::from_value(&params.params()[$index])),*);
                    params.set_return(ret.to_value());
                    true
                })
            }
        }

        impl<C, F, R, $($arg,)*> IntoMethod<C, fn(&C, $($arg),*) -> R> for F
        where
            C: Object,
            F: Fn(&C, $($arg),*) -> R + Send + Sync + 'static,
            R: RttiType,
            $($arg: RttiType,)*
        {
            fn param_types() -> Vec<&'static TypeInfo> {
                alloc::vec![$(<$arg as RttiType>::type_info()),*]
            }

            fn return_type() -> &'static TypeInfo {
                R::type_info()
            }

            fn into_invoker(self) -> MethodInvoker {
                Box::new(move |object: &mut dyn Object, params: &mut DynParams| {
                    let Some(target) = resolve::<C>(object) else {
                        return false;
                    };
                    let ret = (self)(target, $(<$arg as RttiType>::from_value(&params.params()[$index])),*);
                    params.set_return(ret.to_value());
                    true
                })
            }
        }
    };
}

impl_into_method!();
impl_into_method!(A0 0);
impl_into_method!(A0 0, A1 1);
impl_into_method!(A0 0, A1 1, A2 2);
impl_into_method!(A0 0, A1 1, A2 2, A3 3);

// -----------------------------------------------------------------------------
// IntoConstructor

/// A function that can be registered as a constructor of `C`.
///
/// Implemented for functions and closures taking up to four
/// [`RttiType`] parameters and returning `C`.
pub trait IntoConstructor<C, Marker>: Send + Sync + Sized + 'static {
    fn param_types() -> Vec<&'static TypeInfo>;

    fn into_invoker(self) -> ConstructorInvoker;
}

macro_rules! impl_into_constructor {
    ($($arg:ident $index:tt),*) => {
        impl<C, F, $($arg,)*> IntoConstructor<C, fn($($arg),*) -> C> for F
        where
            C: Object,
            F: Fn($($arg),*) -> C + Send + Sync + 'static,
            $($arg: RttiType,)*
        {
            fn param_types() -> Vec<&'static TypeInfo> {
                alloc::vec![$(<$arg as RttiType>::type_info()),*]
            }

            #[allow(unused_variables, reason = "constructors without parameters")]
            fn into_invoker(self) -> ConstructorInvoker {
                Box::new(move |params: &DynParams| -> Box<dyn Object> {
                    Box::new((self)($(<$arg as RttiType>::from_value(&params.params()[$index])),*))
                })
            }
        }
    };
}

impl_into_constructor!();
impl_into_constructor!(A0 0);
impl_into_constructor!(A0 0, A1 1);
impl_into_constructor!(A0 0, A1 1, A2 2);
impl_into_constructor!(A0 0, A1 1, A2 2, A3 3);
