//! Code generation of `#[derive(Object)]`.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Path, Type};

use crate::attrs::{FieldAttributes, FieldRole, TypeAttributes};

struct ReflectedField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    attrs: FieldAttributes,
}

pub(crate) fn derive_object(ast: DeriveInput) -> syn::Result<TokenStream> {
    if !ast.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast.generics,
            "`#[derive(Object)]` does not support generic types",
        ));
    }

    let fields = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    &ast.ident,
                    "`#[derive(Object)]` requires named fields",
                ));
            }
        },
        Data::Enum(_) | Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &ast.ident,
                "`#[derive(Object)]` only supports structs",
            ));
        }
    };

    let type_attrs = TypeAttributes::parse_attrs(&ast.attrs)?;

    let mut reflected = Vec::with_capacity(fields.len());
    for field in fields {
        let attrs = FieldAttributes::parse_field(field)?;
        if matches!(attrs.role, FieldRole::None) {
            continue;
        }
        // Named fields always carry an ident.
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        reflected.push(ReflectedField {
            ident,
            ty: &field.ty,
            attrs,
        });
    }

    let mut bases = reflected
        .iter()
        .filter(|f| matches!(f.attrs.role, FieldRole::Base));
    let base = bases.next();
    if let Some(extra) = bases.next() {
        return Err(syn::Error::new_spanned(
            extra.ident,
            "only one field can be the `base`",
        ));
    }

    let pl = match &type_attrs.crate_path {
        Some(path) => path.clone(),
        None => crate::manifest::rtti_path(),
    };

    let object_impl = object_impl(&pl, &ast.ident, base, &reflected);
    let class_type_impl = class_type_impl(&pl, &ast.ident, &type_attrs, base, &reflected);
    let auto_register = auto_register_impl(&pl, &ast.ident, &type_attrs);

    Ok(quote! {
        #object_impl
        #class_type_impl
        #auto_register
    })
}

fn lit(value: &str) -> LitStr {
    LitStr::new(value, Span::call_site())
}

// -----------------------------------------------------------------------------
// Object

fn object_impl(
    pl: &Path,
    ident: &Ident,
    base: Option<&ReflectedField>,
    fields: &[ReflectedField],
) -> TokenStream {
    let super_object = base.map(|base| {
        let field = base.ident;
        quote! {
            #[inline]
            fn super_object(&self) -> ::core::option::Option<&dyn #pl::object::Object> {
                ::core::option::Option::Some(&self.#field)
            }

            #[inline]
            fn super_object_mut(&mut self) -> ::core::option::Option<&mut dyn #pl::object::Object> {
                ::core::option::Option::Some(&mut self.#field)
            }
        }
    });

    let slots = fields
        .iter()
        .filter_map(|f| match &f.attrs.role {
            FieldRole::Slot { handler, .. } => {
                let field = f.ident;
                Some(quote! {
                    self.#field = #pl::event::Slot::for_object::<Self>(handle, #handler);
                })
            }
            _ => None,
        })
        .collect::<Vec<_>>();

    let on_attach = (!slots.is_empty()).then(|| {
        let attach_base = base.map(|base| {
            let field = base.ident;
            quote! { #pl::object::Object::on_attach(&mut self.#field, handle); }
        });
        quote! {
            fn on_attach(&mut self, handle: &#pl::object::ObjectRef) {
                #attach_base
                #(#slots)*
            }
        }
    });

    quote! {
        #[automatically_derived]
        impl #pl::object::Object for #ident {
            #[inline]
            fn class(&self) -> #pl::class::ClassRef {
                <Self as #pl::class::ClassType>::static_class()
            }

            #super_object
            #on_attach
        }
    }
}

// -----------------------------------------------------------------------------
// ClassType

fn member(pl: &Path, field: &ReflectedField) -> TokenStream {
    let ReflectedField { ident, ty, attrs } = field;
    let description = attrs
        .description
        .as_ref()
        .map(|d| quote!(.with_description(#d)));

    match &attrs.role {
        FieldRole::None | FieldRole::Base => TokenStream::new(),
        FieldRole::Attribute {
            name,
            read_only,
            default,
        } => {
            let name = lit(name);
            let default = default.clone().unwrap_or_else(|| lit(""));
            let annotation = attrs
                .annotation
                .as_ref()
                .map(|a| quote!(.with_annotation(#a)));
            let default = quote! {
                <#ty as #pl::types::RttiType>::from_rtti_string(#default)
            };
            let desc = if *read_only {
                quote! {
                    #pl::class::AttributeDesc::read_only_field::<Self, #ty>(
                        #name,
                        #default,
                        |this| &this.#ident,
                    )
                }
            } else {
                quote! {
                    #pl::class::AttributeDesc::field::<Self, #ty>(
                        #name,
                        #default,
                        |this| &this.#ident,
                        |this| &mut this.#ident,
                    )
                }
            };
            quote! { .attribute(#desc #description #annotation) }
        }
        FieldRole::Signal { name } => {
            let name = lit(name);
            quote! {
                .signal_desc(
                    #pl::class::SignalDesc::field::<Self, _>(#name, |this| &this.#ident)
                        #description
                )
            }
        }
        FieldRole::Slot { name, .. } => {
            let name = lit(name);
            quote! {
                .slot_desc(
                    #pl::class::SlotDesc::field::<Self, _>(#name, |this| &this.#ident)
                        #description
                )
            }
        }
    }
}

fn class_type_impl(
    pl: &Path,
    ident: &Ident,
    type_attrs: &TypeAttributes,
    base: Option<&ReflectedField>,
    fields: &[ReflectedField],
) -> TokenStream {
    let name = match &type_attrs.name {
        Some(name) => name.clone(),
        None => lit(&ident.to_string()),
    };
    let namespace = type_attrs.namespace.as_ref().map(|ns| quote!(.namespace(#ns)));
    let description = type_attrs
        .description
        .as_ref()
        .map(|d| quote!(.description(#d)));
    let properties = type_attrs.properties.iter().map(|(key, value)| {
        let key = lit(key);
        quote!(.property(#key, #value))
    });
    let base = base.map(|base| {
        let ty = base.ty;
        quote!(.base::<#ty>())
    });
    let members = fields.iter().map(|f| member(pl, f));
    let default_constructor = type_attrs
        .default_constructor
        .then(|| quote!(.default_constructor()));
    let extend = type_attrs.extend.iter().map(|path| {
        quote! { let builder = #path(builder); }
    });

    quote! {
        #[automatically_derived]
        impl #pl::class::ClassType for #ident {
            fn build_class() -> #pl::class::Class {
                let builder = #pl::class::ClassBuilder::<Self>::new(#name)
                    #namespace
                    #description
                    #(#properties)*
                    #base
                    #(#members)*
                    #default_constructor;
                #(#extend)*
                builder.build()
            }

            fn static_class() -> #pl::class::ClassRef {
                static CELL: #pl::class::ClassCell = #pl::class::ClassCell::new();
                CELL.get_or_build::<Self>()
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Auto registration

#[cfg(feature = "auto_register")]
fn auto_register_impl(pl: &Path, ident: &Ident, type_attrs: &TypeAttributes) -> TokenStream {
    use quote::quote_spanned;

    match type_attrs.auto_register {
        Some(span) => quote_spanned! { span =>
            #pl::__macro_exports::inventory::submit! {
                #pl::registry::AutoRegisterClass::new(
                    <#ident as #pl::class::ClassType>::static_class
                )
            }
        },
        None => TokenStream::new(),
    }
}

#[cfg(not(feature = "auto_register"))]
fn auto_register_impl(_: &Path, _: &Ident, _: &TypeAttributes) -> TokenStream {
    TokenStream::new()
}
