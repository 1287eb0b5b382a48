//! Plugin discovery.
//!
//! A plugin is described by a `.plugin` XML file next to its module.
//! [`ClassManager::scan_plugins`] finds these files, asks a [`ModuleLoader`]
//! for the module each one names and lets the module register its classes
//! into a fresh [module](crate::registry::ModuleId).
//!
//! Modules linked into the executable are submitted with
//! [`plugin_module!`](crate::plugin_module) and found by the
//! `StaticModuleLoader`. A [`ModuleTable`] serves modules from an explicit
//! list.
//!
//! [`ClassManager::scan_plugins`]: crate::registry::ClassManager::scan_plugins

mod descriptor;
mod error;
mod loader;

pub use descriptor::PluginDescriptor;
pub use error::PluginError;
pub use loader::{ModuleLoader, ModuleRegistrar, ModuleTable, PluginModule, ScanOptions};

#[cfg(feature = "auto_register")]
pub use loader::StaticModuleLoader;

/// Module ABI version of this build. A module built against another version
/// is rejected.
pub const PLUGIN_ABI_VERSION: u32 = 1;
