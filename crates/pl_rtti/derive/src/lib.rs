//! `#[derive(Object)]` for `pl_rtti`.
//!
//! Usually used through the re-export `pl_rtti::derive::Object`.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

// -----------------------------------------------------------------------------
// Modules

mod attrs;
mod expand;
mod manifest;

// -----------------------------------------------------------------------------
// Macros

/// # Object Derivation
///
/// `#[derive(Object)]` implements `Object` and `ClassType` for a struct with
/// named fields (or a unit struct). Generic types are not supported.
///
/// ```rust, ignore
/// use pl_rtti::prelude::*;
///
/// #[derive(Default, Object)]
/// #[rtti(namespace = "Demo", description = "A counter")]
/// #[rtti(default_constructor, auto_register)]
/// struct Counter {
///     #[rtti(attribute, default = "1")]
///     step: i32,
///     #[rtti(attribute = "Total", read_only)]
///     total: i32,
///     #[rtti(signal)]
///     changed: Signal<(i32,)>,
///     #[rtti(slot = "OnTick", handler = Counter::on_tick)]
///     tick: Slot<()>,
/// }
///
/// impl Counter {
///     fn on_tick(&mut self, _: &()) {
///         self.total += self.step;
///         self.changed.emit((self.total,));
///     }
/// }
/// ```
///
/// ## Type attributes
///
/// - `name = "..."`: class name, defaults to the type name.
/// - `namespace = "..."`, `description = "..."`.
/// - `property(Key = "value", ...)`: free-form class properties.
/// - `default_constructor`: adds `DefaultConstructor` (requires `Default`).
/// - `extend = path`: a `fn(ClassBuilder<Self>) -> ClassBuilder<Self>`
///   applied after the generated members, for methods and constructors.
///   May be repeated.
/// - `auto_register`: submits the class for `ClassManager::auto_register`.
///   Requires the `auto_register` feature.
/// - `crate = "path"`: path of `pl_rtti`, when the lookup through
///   `Cargo.toml` does not find it.
///
/// ## Field attributes
///
/// - `base`: the field embeds the base class object. At most one.
/// - `attribute` or `attribute = "Name"`: a reflected attribute. The
///   name defaults to the field name in `UpperCamelCase`. Accepts
///   `read_only`, `default = "..."` (string form, parsed through the field
///   type), `description` and `annotation`.
/// - `signal` or `signal = "Name"`: a `Signal<A>` field.
/// - `slot` or `slot = "Name"` with `handler = path`: a `Slot<A>` field
///   bound to `fn(&mut Self, &A)` when the object is moved into an
///   `ObjectRef`.
#[proc_macro_derive(Object, attributes(rtti))]
pub fn derive_object(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    expand::derive_object(ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
