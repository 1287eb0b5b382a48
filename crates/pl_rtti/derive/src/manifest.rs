use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

/// Name of the reflection crate.
const RTTI_CRATE: &str = "pl_rtti";

/// Facade crate re-exporting the reflection crate as `rtti`.
const FACADE_CRATE: &str = "pl_core";

/// The `Cargo.toml` of the crate invoking the macro.
///
/// Generated code must name the reflection crate the way the invoking
/// crate sees it:
///
/// 1. `pl_rtti` listed in `dependencies` gives `::pl_rtti`.
/// 2. `pl_core` listed in `dependencies` gives `::pl_core::rtti`.
/// 3. Steps 1-2 are repeated with `dev-dependencies`.
/// 4. Otherwise `::pl_rtti`, which also covers `pl_rtti` itself through
///    `extern crate self as pl_rtti`.
struct Manifest {
    document: Option<Document<Box<str>>>,
    modified_time: Option<SystemTime>,
}

impl Manifest {
    fn manifest_path() -> Option<PathBuf> {
        let mut path = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR")?);
        path.push("Cargo.toml");
        Some(path)
    }

    fn modified_time(path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }

    fn read(path: &Path) -> Self {
        let document = std::fs::read_to_string(path)
            .ok()
            .and_then(|text| Document::parse(text.into_boxed_str()).ok());
        Self {
            document,
            modified_time: Self::modified_time(path),
        }
    }

    fn find_in_deps(deps: &Table) -> Option<syn::Path> {
        if deps.contains_key(RTTI_CRATE) {
            return Some(syn::parse_quote!(::pl_rtti));
        }
        if deps.contains_key(FACADE_CRATE) {
            return Some(syn::parse_quote!(::pl_core::rtti));
        }
        None
    }

    fn rtti_path(&self) -> syn::Path {
        let Some(document) = &self.document else {
            return syn::parse_quote!(::pl_rtti);
        };
        for section in ["dependencies", "dev-dependencies"] {
            if let Some(Item::Table(deps)) = document.get(section)
                && let Some(path) = Self::find_in_deps(deps)
            {
                return path;
            }
        }
        syn::parse_quote!(::pl_rtti)
    }
}

/// Returns the path of the reflection crate as seen by the invoking crate.
///
/// Manifests are cached per path and re-read when they change.
pub(crate) fn rtti_path() -> syn::Path {
    static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

    let Some(path) = Manifest::manifest_path() else {
        return syn::parse_quote!(::pl_rtti);
    };
    let modified_time = Manifest::modified_time(&path);

    let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
    if let Some(manifest) = manifests.get(&path)
        && manifest.modified_time == modified_time
    {
        return manifest.rtti_path();
    }
    drop(manifests);

    let manifest = Manifest::read(&path);
    let result = manifest.rtti_path();
    MANIFESTS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(path, manifest);
    result
}
