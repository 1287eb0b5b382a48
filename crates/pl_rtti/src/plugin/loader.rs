use alloc::vec::Vec;
use core::fmt;

use crate::class::{ClassRef, ClassType};
use crate::plugin::{PLUGIN_ABI_VERSION, PluginDescriptor, PluginError};
use crate::registry::{ClassManager, ModuleId};

// -----------------------------------------------------------------------------
// PluginModule

/// The entry point of a plugin module.
///
/// A module names itself, states the ABI version it was built against and
/// registers its classes through a [`ModuleRegistrar`].
#[derive(Clone, Copy)]
pub struct PluginModule {
    name: &'static str,
    abi_version: u32,
    register: fn(&mut ModuleRegistrar<'_>),
}

impl PluginModule {
    /// Creates a module built against the current [`PLUGIN_ABI_VERSION`].
    #[inline]
    pub const fn new(name: &'static str, register: fn(&mut ModuleRegistrar<'_>)) -> Self {
        Self {
            name,
            abi_version: PLUGIN_ABI_VERSION,
            register,
        }
    }

    /// Overrides the ABI version.
    #[inline]
    pub const fn with_abi_version(mut self, abi_version: u32) -> Self {
        self.abi_version = abi_version;
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn abi_version(&self) -> u32 {
        self.abi_version
    }

    /// Runs the registration function of the module.
    #[inline]
    pub fn register(&self, registrar: &mut ModuleRegistrar<'_>) {
        (self.register)(registrar);
    }
}

impl fmt::Debug for PluginModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginModule")
            .field("name", &self.name)
            .field("abi_version", &self.abi_version)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(PluginModule);

// -----------------------------------------------------------------------------
// ModuleRegistrar

/// Registers the classes of a module that is being loaded.
pub struct ModuleRegistrar<'a> {
    manager: &'a ClassManager,
    module: ModuleId,
    registered: usize,
}

impl<'a> ModuleRegistrar<'a> {
    #[inline]
    pub(crate) fn new(manager: &'a ClassManager, module: ModuleId) -> Self {
        Self {
            manager,
            module,
            registered: 0,
        }
    }

    /// Returns the id of the module being loaded.
    #[inline]
    pub fn module(&self) -> ModuleId {
        self.module
    }

    #[inline]
    pub fn manager(&self) -> &'a ClassManager {
        self.manager
    }

    /// Registers the class of `C`. Returns `false` on a duplicate name.
    #[inline]
    pub fn register<C: ClassType>(&mut self) -> bool {
        self.register_class(C::static_class())
    }

    /// Registers a class. Returns `false` on a duplicate name.
    pub fn register_class(&mut self, class: ClassRef) -> bool {
        let ok = self.manager.register_class_in(self.module, class).is_ok();
        if ok {
            self.registered += 1;
        }
        ok
    }

    /// Returns the number of classes registered so far.
    #[inline]
    pub fn registered(&self) -> usize {
        self.registered
    }
}

// -----------------------------------------------------------------------------
// ModuleLoader

/// Resolves the module named by a plugin descriptor.
pub trait ModuleLoader {
    fn load(&self, descriptor: &PluginDescriptor) -> Result<PluginModule, PluginError>;
}

/// A loader backed by an explicit list of modules.
///
/// A descriptor is matched against module names by its `Library` entry.
///
/// # Examples
///
/// ```
/// use pl_rtti::plugin::{ModuleTable, PluginModule};
///
/// let table = ModuleTable::new().with(PluginModule::new("demo", |_| {}));
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModuleTable {
    modules: Vec<PluginModule>,
}

impl ModuleTable {
    #[inline]
    pub const fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    pub fn with(mut self, module: PluginModule) -> Self {
        self.insert(module);
        self
    }

    /// Adds a module, replacing one with the same name.
    pub fn insert(&mut self, module: PluginModule) {
        match self.modules.iter_mut().find(|m| m.name == module.name) {
            Some(slot) => *slot = module,
            None => self.modules.push(module),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleLoader for ModuleTable {
    fn load(&self, descriptor: &PluginDescriptor) -> Result<PluginModule, PluginError> {
        self.modules
            .iter()
            .find(|m| m.name == descriptor.library)
            .copied()
            .ok_or_else(|| PluginError::LibraryNotFound(descriptor.library.clone()))
    }
}

/// A loader for modules linked into the executable.
///
/// Modules are submitted with [`plugin_module!`](crate::plugin_module).
#[cfg(feature = "auto_register")]
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticModuleLoader;

#[cfg(feature = "auto_register")]
impl ModuleLoader for StaticModuleLoader {
    fn load(&self, descriptor: &PluginDescriptor) -> Result<PluginModule, PluginError> {
        inventory::iter::<PluginModule>
            .into_iter()
            .find(|m| m.name == descriptor.library)
            .copied()
            .ok_or_else(|| PluginError::LibraryNotFound(descriptor.library.clone()))
    }
}

/// Submits a [`PluginModule`] for the [`StaticModuleLoader`].
///
/// ```ignore
/// fn register(registrar: &mut pl_rtti::plugin::ModuleRegistrar<'_>) {
///     registrar.register::<Widget>();
/// }
///
/// pl_rtti::plugin_module!("demo", register);
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! plugin_module {
    ($name:literal, $register:path) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::plugin::PluginModule::new($name, $register)
        }
    };
}

// -----------------------------------------------------------------------------
// ScanOptions

/// Options of [`ClassManager::scan_plugins`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Descend into sub-directories.
    pub recursive: bool,
    /// Extension of descriptor files, without the dot.
    pub extension: &'static str,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            extension: "plugin",
        }
    }
}

impl ScanOptions {
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn extension(mut self, extension: &'static str) -> Self {
        self.extension = extension;
        self
    }
}
