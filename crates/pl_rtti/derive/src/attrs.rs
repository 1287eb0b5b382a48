//! Parsing of `#[rtti(...)]` attributes.

use heck::ToUpperCamelCase;
use proc_macro2::Span;
use syn::meta::ParseNestedMeta;
use syn::spanned::Spanned;
use syn::{Attribute, Field, LitStr, Path};

pub(crate) const RTTI_ATTRIBUTE_NAME: &str = "rtti";

fn parse_rtti_attrs(
    attrs: &[Attribute],
    mut f: impl FnMut(ParseNestedMeta) -> syn::Result<()>,
) -> syn::Result<()> {
    for attr in attrs {
        if attr.path().is_ident(RTTI_ATTRIBUTE_NAME) {
            attr.parse_nested_meta(&mut f)?;
        }
    }
    Ok(())
}

fn parse_str(meta: &ParseNestedMeta) -> syn::Result<LitStr> {
    meta.value()?.parse()
}

fn set_once<T>(slot: &mut Option<T>, value: T, meta: &ParseNestedMeta) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error("duplicate attribute"));
    }
    *slot = Some(value);
    Ok(())
}

// -----------------------------------------------------------------------------
// TypeAttributes

/// Attributes on the struct itself.
///
/// ```ignore
/// #[rtti(name = "Widget", namespace = "Demo", description = "...")]
/// #[rtti(default_constructor, auto_register)]
/// #[rtti(property(Icon = "widget.png"), extend = widget_methods)]
/// #[rtti(crate = "::pl_core::rtti")]
/// ```
#[derive(Default)]
pub(crate) struct TypeAttributes {
    pub name: Option<LitStr>,
    pub namespace: Option<LitStr>,
    pub description: Option<LitStr>,
    pub default_constructor: bool,
    pub auto_register: Option<Span>,
    pub crate_path: Option<Path>,
    pub extend: Vec<Path>,
    pub properties: Vec<(String, LitStr)>,
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        parse_rtti_attrs(attrs, |meta| {
            if meta.path.is_ident("name") {
                set_once(&mut this.name, parse_str(&meta)?, &meta)
            } else if meta.path.is_ident("namespace") {
                set_once(&mut this.namespace, parse_str(&meta)?, &meta)
            } else if meta.path.is_ident("description") {
                set_once(&mut this.description, parse_str(&meta)?, &meta)
            } else if meta.path.is_ident("default_constructor") {
                this.default_constructor = true;
                Ok(())
            } else if meta.path.is_ident("auto_register") {
                this.auto_register = Some(meta.path.span());
                Ok(())
            } else if meta.path.is_ident("crate") {
                let path = parse_str(&meta)?.parse::<Path>()?;
                set_once(&mut this.crate_path, path, &meta)
            } else if meta.path.is_ident("extend") {
                this.extend.push(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("property") {
                meta.parse_nested_meta(|inner| {
                    let Some(key) = inner.path.get_ident() else {
                        return Err(inner.error("expected a property key"));
                    };
                    this.properties.push((key.to_string(), parse_str(&inner)?));
                    Ok(())
                })
            } else {
                Err(meta.error("unknown type attribute"))
            }
        })?;
        Ok(this)
    }
}

// -----------------------------------------------------------------------------
// FieldAttributes

/// What a field contributes to the class.
pub(crate) enum FieldRole {
    /// Not reflected.
    None,
    /// The embedded base object.
    Base,
    Attribute {
        name: String,
        read_only: bool,
        default: Option<LitStr>,
    },
    Signal {
        name: String,
    },
    Slot {
        name: String,
        handler: Path,
    },
}

/// Attributes on a field.
///
/// ```ignore
/// #[rtti(base)]
/// #[rtti(attribute, default = "42", description = "...", annotation = "...")]
/// #[rtti(attribute = "Size", read_only)]
/// #[rtti(signal = "Changed")]
/// #[rtti(slot, handler = Self::on_changed)]
/// ```
pub(crate) struct FieldAttributes {
    pub role: FieldRole,
    pub description: Option<LitStr>,
    pub annotation: Option<LitStr>,
}

#[derive(Default)]
struct RawField {
    base: Option<Span>,
    attribute: Option<Option<LitStr>>,
    signal: Option<Option<LitStr>>,
    slot: Option<Option<LitStr>>,
    read_only: bool,
    default: Option<LitStr>,
    description: Option<LitStr>,
    annotation: Option<LitStr>,
    handler: Option<Path>,
}

/// `key` or `key = "Name"`.
fn optional_name(meta: &ParseNestedMeta) -> syn::Result<Option<LitStr>> {
    if meta.input.peek(syn::Token![=]) {
        Ok(Some(parse_str(meta)?))
    } else {
        Ok(None)
    }
}

fn member_name(field: &Field, explicit: Option<LitStr>) -> String {
    match explicit {
        Some(name) => name.value(),
        None => field
            .ident
            .as_ref()
            .map(|ident| {
                let raw = ident.to_string();
                raw.trim_start_matches("r#").to_upper_camel_case()
            })
            .unwrap_or_default(),
    }
}

impl FieldAttributes {
    pub fn parse_field(field: &Field) -> syn::Result<Self> {
        let mut raw = RawField::default();
        parse_rtti_attrs(&field.attrs, |meta| {
            if meta.path.is_ident("base") {
                raw.base = Some(meta.path.span());
                Ok(())
            } else if meta.path.is_ident("attribute") {
                let name = optional_name(&meta)?;
                set_once(&mut raw.attribute, name, &meta)
            } else if meta.path.is_ident("signal") {
                let name = optional_name(&meta)?;
                set_once(&mut raw.signal, name, &meta)
            } else if meta.path.is_ident("slot") {
                let name = optional_name(&meta)?;
                set_once(&mut raw.slot, name, &meta)
            } else if meta.path.is_ident("read_only") {
                raw.read_only = true;
                Ok(())
            } else if meta.path.is_ident("default") {
                set_once(&mut raw.default, parse_str(&meta)?, &meta)
            } else if meta.path.is_ident("description") {
                set_once(&mut raw.description, parse_str(&meta)?, &meta)
            } else if meta.path.is_ident("annotation") {
                set_once(&mut raw.annotation, parse_str(&meta)?, &meta)
            } else if meta.path.is_ident("handler") {
                let path = meta.value()?.parse()?;
                set_once(&mut raw.handler, path, &meta)
            } else {
                Err(meta.error("unknown field attribute"))
            }
        })?;

        let roles = usize::from(raw.base.is_some())
            + usize::from(raw.attribute.is_some())
            + usize::from(raw.signal.is_some())
            + usize::from(raw.slot.is_some());
        if roles > 1 {
            return Err(syn::Error::new_spanned(
                field,
                "a field is at most one of `base`, `attribute`, `signal` or `slot`",
            ));
        }

        let attribute_only = raw.read_only || raw.default.is_some() || raw.annotation.is_some();
        if attribute_only && raw.attribute.is_none() {
            return Err(syn::Error::new_spanned(
                field,
                "`read_only`, `default` and `annotation` require `attribute`",
            ));
        }
        if raw.handler.is_some() && raw.slot.is_none() {
            return Err(syn::Error::new_spanned(field, "`handler` requires `slot`"));
        }

        let role = if raw.base.is_some() {
            FieldRole::Base
        } else if let Some(name) = raw.attribute {
            FieldRole::Attribute {
                name: member_name(field, name),
                read_only: raw.read_only,
                default: raw.default,
            }
        } else if let Some(name) = raw.signal {
            FieldRole::Signal {
                name: member_name(field, name),
            }
        } else if let Some(name) = raw.slot {
            let Some(handler) = raw.handler else {
                return Err(syn::Error::new_spanned(
                    field,
                    "`slot` requires `handler = path`",
                ));
            };
            FieldRole::Slot {
                name: member_name(field, name),
                handler,
            }
        } else {
            FieldRole::None
        };

        if matches!(role, FieldRole::Base | FieldRole::None) && raw.description.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                "`description` requires `attribute`, `signal` or `slot`",
            ));
        }

        Ok(Self {
            role,
            description: raw.description,
            annotation: raw.annotation,
        })
    }
}
