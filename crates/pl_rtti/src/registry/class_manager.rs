use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use slotmap::SlotMap;

use crate::class::{ClassRef, ClassType, root_class};
use crate::hash::{HashMap, HashSet, new_map, new_set};
use crate::object::{ObjectExt, ObjectRef};
use crate::plugin::{
    ModuleLoader, ModuleRegistrar, PLUGIN_ABI_VERSION, PluginDescriptor, PluginError, ScanOptions,
};
use crate::registry::{MAIN_MODULE, ModuleId, ModuleInfo, RegisterError};
use crate::serialize::{XML_CLASS_ATTRIBUTE, XmlElement};

// -----------------------------------------------------------------------------
// Query options

/// Whether [`ClassManager::derived_classes`] follows the whole base chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recursion {
    /// Classes deriving from the base at any depth.
    Recursive,
    /// Only classes naming the base as their direct base.
    Direct,
}

/// Whether [`ClassManager::derived_classes`] returns the base class itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncludeBase {
    Include,
    Exclude,
}

// -----------------------------------------------------------------------------
// Registry

struct ClassEntry {
    class: ClassRef,
    module: ModuleId,
}

struct ModuleEntry {
    info: ModuleInfo,
    /// Full names in registration order.
    classes: Vec<String>,
}

struct Registry {
    classes: HashMap<String, ClassEntry>,
    short_names: HashMap<&'static str, String>,
    ambiguous_names: HashSet<&'static str>,
    type_ids: HashMap<TypeId, String>,
    modules: SlotMap<ModuleId, ModuleEntry>,
}

impl Registry {
    fn new() -> Self {
        Self {
            classes: new_map(),
            short_names: new_map(),
            ambiguous_names: new_set(),
            type_ids: new_map(),
            modules: SlotMap::with_key(),
        }
    }

    fn index_short_name(&mut self, class: &ClassRef) {
        let name = class.name();
        if self.ambiguous_names.contains(name) {
            return;
        }
        match self.short_names.get(name) {
            Some(full_name) if full_name != class.full_name() => {
                self.short_names.remove(name);
                self.ambiguous_names.insert(name);
            }
            Some(_) => {}
            None => {
                self.short_names.insert(name, String::from(class.full_name()));
            }
        }
    }

    fn rebuild_short_names(&mut self) {
        self.short_names.clear();
        self.ambiguous_names.clear();
        let classes: Vec<ClassRef> = self
            .classes
            .values()
            .map(|entry| Arc::clone(&entry.class))
            .collect();
        for class in &classes {
            self.index_short_name(class);
        }
    }

    /// Returns `Ok(false)` if the same class is already registered.
    fn insert(&mut self, module: ModuleId, class: &ClassRef) -> Result<bool, RegisterError> {
        if !self.modules.contains_key(module) {
            return Err(RegisterError::UnknownModule(module));
        }
        if let Some(existing) = self.classes.get(class.full_name()) {
            if Arc::ptr_eq(&existing.class, class) {
                return Ok(false);
            }
            return Err(RegisterError::DuplicateClass(String::from(class.full_name())));
        }

        let full_name = String::from(class.full_name());
        if let Some(entry) = self.modules.get_mut(module) {
            entry.classes.push(full_name.clone());
        }
        if let Some(type_id) = class.type_id() {
            self.type_ids.entry(type_id).or_insert_with(|| full_name.clone());
        }
        self.classes.insert(
            full_name,
            ClassEntry {
                class: Arc::clone(class),
                module,
            },
        );
        self.index_short_name(class);
        class.mark_registered();
        Ok(true)
    }

    fn remove(&mut self, full_name: &str) -> Option<ClassRef> {
        let entry = self.classes.remove(full_name)?;
        if let Some(module) = self.modules.get_mut(entry.module) {
            module.classes.retain(|name| name != full_name);
        }
        if let Some(type_id) = entry.class.type_id()
            && self.type_ids.get(&type_id).is_some_and(|name| name == full_name)
        {
            self.type_ids.remove(&type_id);
        }
        entry.class.mark_unregistered();
        Some(entry.class)
    }

    fn get(&self, name: &str) -> Option<&ClassRef> {
        if let Some(entry) = self.classes.get(name) {
            return Some(&entry.class);
        }
        let full_name = self.short_names.get(name)?;
        self.classes.get(full_name.as_str()).map(|entry| &entry.class)
    }
}

// -----------------------------------------------------------------------------
// ClassManager

/// The registry of classes, grouped into modules.
///
/// Classes are looked up by full name (`Namespace::Name`), by short name if
/// it is unambiguous, or by the [`TypeId`] of their Rust type. Full names
/// are unique: the first registration wins.
///
/// Every manager starts with the [main module](MAIN_MODULE) holding the
/// [root class](crate::class::root_class). [`ClassManager::global`] is the
/// process-wide instance that name-based base links resolve against.
///
/// # Examples
///
/// ```
/// use pl_rtti::registry::ClassManager;
/// # use pl_rtti::class::{Class, ClassBuilder, ClassCell, ClassRef, ClassType};
/// # use pl_rtti::object::Object;
/// # #[derive(Default)]
/// # struct Widget;
/// # impl Object for Widget {
/// #     fn class(&self) -> ClassRef { Self::static_class() }
/// # }
/// # impl ClassType for Widget {
/// #     fn build_class() -> Class {
/// #         ClassBuilder::<Self>::new("Widget").namespace("Demo").default_constructor().build()
/// #     }
/// #     fn static_class() -> ClassRef {
/// #         static CELL: ClassCell = ClassCell::new();
/// #         CELL.get_or_build::<Self>()
/// #     }
/// # }
///
/// let manager = ClassManager::new();
/// manager.register::<Widget>().unwrap();
///
/// let class = manager.get_class("Widget").unwrap();
/// assert_eq!(class.full_name(), "Demo::Widget");
/// assert!(class.is_derived_from("PLCore::Object"));
///
/// let widget = manager.create("Demo::Widget").unwrap();
/// assert!(widget.is::<Widget>());
/// ```
pub struct ClassManager {
    registry: RwLock<Registry>,
    main_module: ModuleId,
}

impl Default for ClassManager {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ClassManager {
    /// Creates a manager with the main module and the root class.
    pub fn new() -> Self {
        let mut registry = Registry::new();
        let main_module = registry.modules.insert(ModuleEntry {
            info: ModuleInfo {
                version: PLUGIN_ABI_VERSION,
                ..ModuleInfo::new(MAIN_MODULE)
            },
            classes: Vec::new(),
        });
        let root = root_class();
        if let Err(err) = registry.insert(main_module, &root) {
            log::warn!("Failed to register the root class: {err}");
        }
        Self {
            registry: RwLock::new(registry),
            main_module,
        }
    }

    /// Returns the process-wide manager.
    ///
    /// Created on first use. With the `auto_register` feature, every class
    /// declared with `#[rtti(auto_register)]` is registered at that point.
    pub fn global() -> &'static ClassManager {
        static GLOBAL: LazyLock<ClassManager> = LazyLock::new(|| {
            let manager = ClassManager::new();
            manager.auto_register();
            manager
        });
        &GLOBAL
    }

    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ----- Modules

    /// Returns the module classes are registered in by default.
    #[inline]
    pub fn main_module(&self) -> ModuleId {
        self.main_module
    }

    /// Registers an empty module.
    pub fn register_module(&self, info: ModuleInfo) -> ModuleId {
        #[cfg(feature = "debug")]
        log::trace!("Register module `{}`", info.name);
        self.write().modules.insert(ModuleEntry {
            info,
            classes: Vec::new(),
        })
    }

    /// Unregisters a module and every class registered in it.
    ///
    /// Returns the removed classes. Existing instances of these classes stay
    /// valid, but [`ObjectRef::class`] reports them as unregistered unless
    /// they are still registered in another manager. The main module is
    /// emptied but stays registered.
    pub fn unregister_module(&self, id: ModuleId) -> Result<Vec<ClassRef>, RegisterError> {
        let mut registry = self.write();
        let names = match registry.modules.get_mut(id) {
            Some(entry) => core::mem::take(&mut entry.classes),
            None => return Err(RegisterError::UnknownModule(id)),
        };
        if id != self.main_module {
            registry.modules.remove(id);
        }
        let removed: Vec<ClassRef> = names
            .iter()
            .filter_map(|name| registry.remove(name))
            .collect();
        registry.rebuild_short_names();
        log::debug!("Unregistered module {id:?} with {} class(es)", removed.len());
        Ok(removed)
    }

    /// Returns the info of a module.
    pub fn module(&self, id: ModuleId) -> Option<ModuleInfo> {
        self.read().modules.get(id).map(|entry| entry.info.clone())
    }

    /// Returns every module, the main module first.
    pub fn modules(&self) -> Vec<(ModuleId, ModuleInfo)> {
        let registry = self.read();
        let mut modules: Vec<(ModuleId, ModuleInfo)> = registry
            .modules
            .iter()
            .map(|(id, entry)| (id, entry.info.clone()))
            .collect();
        modules.sort_by_key(|(id, _)| *id != self.main_module);
        modules
    }

    /// Finds a module by name.
    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        self.read()
            .modules
            .iter()
            .find(|(_, entry)| entry.info.name == name)
            .map(|(id, _)| id)
    }

    // ----- Registration

    fn register_in(&self, module: ModuleId, class: &ClassRef) -> Result<bool, RegisterError> {
        let result = self.write().insert(module, class);
        match &result {
            Ok(true) => {
                #[cfg(feature = "debug")]
                log::trace!("Register class `{}`", class.full_name());
                self.bind_named_bases();
            }
            Ok(false) => {}
            Err(err) => log::warn!("{err}"),
        }
        result
    }

    /// Resolves bases given by name against this manager, so that classes
    /// of a local manager never depend on the global one.
    fn bind_named_bases(&self) {
        for class in self.classes() {
            if class.bind_base(self) {
                #[cfg(feature = "debug")]
                log::trace!("Bind base of class `{}`", class.full_name());
            }
        }
    }

    /// Registers a class in the main module.
    ///
    /// Registering the same class again does nothing. A different class
    /// with the same full name is rejected and the first one stays.
    pub fn register_class(&self, class: ClassRef) -> Result<(), RegisterError> {
        self.register_in(self.main_module, &class).map(|_| ())
    }

    /// Registers a class in the given module.
    pub fn register_class_in(&self, module: ModuleId, class: ClassRef) -> Result<(), RegisterError> {
        self.register_in(module, &class).map(|_| ())
    }

    /// Registers the class of `C` in the main module.
    #[inline]
    pub fn register<C: ClassType>(&self) -> Result<(), RegisterError> {
        self.register_class(C::static_class())
    }

    /// Removes a class, returning it.
    pub fn unregister_class(&self, name: &str) -> Option<ClassRef> {
        let mut registry = self.write();
        let full_name = String::from(registry.get(name)?.full_name());
        let class = registry.remove(&full_name);
        registry.rebuild_short_names();
        class
    }

    /// Registers every class submitted for automatic registration.
    ///
    /// Returns the number of classes that were not registered before.
    /// Without the `auto_register` feature this does nothing.
    pub fn auto_register(&self) -> usize {
        #[cfg(feature = "auto_register")]
        {
            let mut count = 0;
            for entry in inventory::iter::<crate::registry::AutoRegisterClass> {
                if let Ok(true) = self.register_in(self.main_module, &entry.class()) {
                    count += 1;
                }
            }
            count
        }
        #[cfg(not(feature = "auto_register"))]
        {
            0
        }
    }

    // ----- Lookup

    /// Returns the class with the given full name, or with the given short
    /// name if exactly one registered class has it.
    pub fn get_class(&self, name: &str) -> Option<ClassRef> {
        self.read().get(name).map(Arc::clone)
    }

    /// Returns the class registered for a Rust type.
    pub fn get_class_by_type(&self, type_id: TypeId) -> Option<ClassRef> {
        let registry = self.read();
        let full_name = registry.type_ids.get(&type_id)?;
        registry
            .classes
            .get(full_name.as_str())
            .map(|entry| Arc::clone(&entry.class))
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.read().get(name).is_some()
    }

    /// Returns the number of registered classes, the root class included.
    #[inline]
    pub fn len(&self) -> usize {
        self.read().classes.len()
    }

    /// Returns every class, sorted by full name.
    pub fn classes(&self) -> Vec<ClassRef> {
        let mut classes: Vec<ClassRef> = self
            .read()
            .classes
            .values()
            .map(|entry| Arc::clone(&entry.class))
            .collect();
        classes.sort_by(|a, b| a.full_name().cmp(b.full_name()));
        classes
    }

    /// Returns the classes of a module in registration order.
    pub fn classes_of_module(&self, id: ModuleId) -> Vec<ClassRef> {
        let registry = self.read();
        let Some(module) = registry.modules.get(id) else {
            return Vec::new();
        };
        module
            .classes
            .iter()
            .filter_map(|name| registry.classes.get(name.as_str()))
            .map(|entry| Arc::clone(&entry.class))
            .collect()
    }

    /// Returns the registered classes deriving from `base`, sorted by full name.
    pub fn derived_classes(
        &self,
        base: &str,
        recursion: Recursion,
        include: IncludeBase,
    ) -> Vec<ClassRef> {
        // Base links may resolve through the global manager, so the lock
        // must be released before walking them.
        let classes = self.classes();
        classes
            .into_iter()
            .filter(|class| {
                if class.has_name(base) {
                    return include == IncludeBase::Include;
                }
                match recursion {
                    Recursion::Recursive => class.is_derived_from(base),
                    Recursion::Direct => class.base().is_some_and(|b| b.has_name(base)),
                }
            })
            .collect()
    }

    // ----- Construction

    /// Creates an instance of the class `name` with its default constructor.
    pub fn create(&self, name: &str) -> Option<ObjectRef> {
        let class = self.get_class(name)?;
        let object = class.create();
        if object.is_none() {
            log::debug!("Class `{}` has no default constructor", class.full_name());
        }
        object
    }

    /// Creates an instance from an element written by
    /// [`ObjectExt::to_xml`] and applies its attributes.
    ///
    /// The class is taken from the `Class` attribute, or from the element
    /// name if that is missing.
    pub fn create_from_xml(&self, element: &XmlElement) -> Option<ObjectRef> {
        let name = element
            .attribute(XML_CLASS_ATTRIBUTE)
            .unwrap_or_else(|| element.name());
        let object = self.create(name)?;
        if let Err(err) = object.with_mut(|object| object.set_values_xml(element)) {
            log::warn!("Failed to apply XML values to `{name}`: {err}");
        }
        Some(object)
    }

    // ----- Plugins

    /// Loads the plugin described by a `.plugin` file.
    ///
    /// The module is resolved through `loader`, registered under the plugin
    /// name and asked to register its classes.
    pub fn load_plugin(
        &self,
        path: impl AsRef<Path>,
        loader: &dyn ModuleLoader,
    ) -> Result<ModuleId, PluginError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| PluginError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let descriptor = PluginDescriptor::parse(&text, path)?;
        if !descriptor.active {
            return Err(PluginError::Inactive(descriptor.name));
        }
        if self.find_module(&descriptor.name).is_some() {
            return Err(PluginError::AlreadyLoaded(descriptor.name));
        }

        let module = loader.load(&descriptor)?;
        if module.abi_version() != PLUGIN_ABI_VERSION {
            return Err(PluginError::IncompatibleAbi {
                module: descriptor.name,
                found: module.abi_version(),
                expected: PLUGIN_ABI_VERSION,
            });
        }

        let id = self.register_module(descriptor.module_info());
        let mut registrar = ModuleRegistrar::new(self, id);
        module.register(&mut registrar);
        log::debug!(
            "Loaded plugin `{}` with {} class(es)",
            descriptor.name,
            registrar.registered()
        );
        Ok(id)
    }

    /// Loads every plugin descriptor found in `dir`.
    ///
    /// Files are visited in path order. A plugin that fails to load is
    /// skipped with a warning. Returns the modules that were loaded.
    pub fn scan_plugins(
        &self,
        dir: impl AsRef<Path>,
        options: &ScanOptions,
        loader: &dyn ModuleLoader,
    ) -> Vec<ModuleId> {
        let mut files = Vec::new();
        collect_descriptors(dir.as_ref(), options, &mut files);
        files.sort();

        files
            .iter()
            .filter_map(|path| match self.load_plugin(path, loader) {
                Ok(id) => Some(id),
                Err(err) => {
                    log::warn!("Skipped plugin `{}`: {err}", path.display());
                    None
                }
            })
            .collect()
    }
}

fn collect_descriptors(dir: &Path, options: &ScanOptions, files: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("Failed to scan `{}` for plugins: {err}", dir.display());
            return;
        }
    };
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if options.recursive {
                collect_descriptors(&path, options, files);
            }
        } else if path.extension() == Some(OsStr::new(options.extension)) {
            files.push(path);
        }
    }
}

impl fmt::Debug for ClassManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.read();
        f.debug_struct("ClassManager")
            .field("classes", &registry.classes.len())
            .field("modules", &registry.modules.len())
            .finish()
    }
}
