use alloc::string::String;

use slotmap::new_key_type;

new_key_type! {
    /// Key of a module registered in a [`ClassManager`](crate::registry::ClassManager).
    ///
    /// Keys are generation-tagged: the key of an unregistered module never
    /// refers to a module registered later.
    pub struct ModuleId;
}

/// Name of the module every [`ClassManager`](crate::registry::ClassManager)
/// starts with. Classes registered without a module belong to it.
pub const MAIN_MODULE: &str = "Main";

/// Metadata of a module, a named group of classes that is registered and
/// unregistered as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub vendor: String,
    pub license: String,
    pub description: String,
    /// ABI version the module was built against.
    pub version: u32,
}

impl ModuleInfo {
    /// Creates module info with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
