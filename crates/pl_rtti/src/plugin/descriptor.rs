use alloc::format;
use alloc::string::{String, ToString};
use std::path::{Path, PathBuf};

use crate::plugin::{PLUGIN_ABI_VERSION, PluginError};
use crate::registry::ModuleInfo;
use crate::serialize::XmlElement;
use crate::types::RttiType;

/// Root element of a plugin descriptor.
const ROOT_ELEMENT: &str = "Plugin";

/// Supported value of the `Version` attribute of the root element.
const FORMAT_VERSION: &str = "1";

/// The contents of a `.plugin` descriptor file.
///
/// ```xml
/// <Plugin Version="1">
///     <Active>1</Active>
///     <Name>Demo</Name>
///     <Version>1</Version>
///     <Vendor>Example Vendor</Vendor>
///     <License>MIT</License>
///     <Description>Demo classes</Description>
///     <Library>demo</Library>
/// </Plugin>
/// ```
///
/// Only `Name` is required. `Active` defaults to true, `Version` to
/// [`PLUGIN_ABI_VERSION`] and `Library` to the plugin name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub path: PathBuf,
    pub active: bool,
    pub name: String,
    pub version: u32,
    pub vendor: String,
    pub license: String,
    pub description: String,
    pub library: String,
}

impl PluginDescriptor {
    /// Parses a descriptor. `path` is kept for error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, PluginError> {
        let invalid = |reason: String| PluginError::InvalidDescriptor {
            path: path.to_path_buf(),
            reason,
        };

        let root = XmlElement::parse(text).map_err(|err| invalid(err.to_string()))?;
        if root.name() != ROOT_ELEMENT {
            return Err(invalid(format!("root element is `{}`", root.name())));
        }
        match root.attribute("Version") {
            Some(FORMAT_VERSION) | None => {}
            Some(other) => return Err(invalid(format!("unsupported format version `{other}`"))),
        }

        let text_of = |name: &str| String::from(root.child_text(name).unwrap_or_default());
        let name = text_of("Name");
        if name.is_empty() {
            return Err(invalid(String::from("missing plugin name")));
        }
        let library = match root.child_text("Library") {
            Some(library) if !library.is_empty() => String::from(library),
            _ => name.clone(),
        };

        Ok(Self {
            path: path.to_path_buf(),
            active: root.child_text("Active").is_none_or(bool::from_rtti_string),
            version: root
                .child_text("Version")
                .map_or(PLUGIN_ABI_VERSION, u32::from_rtti_string),
            vendor: text_of("Vendor"),
            license: text_of("License"),
            description: text_of("Description"),
            name,
            library,
        })
    }

    /// Returns the info the module is registered with.
    pub fn module_info(&self) -> ModuleInfo {
        ModuleInfo {
            name: self.name.clone(),
            vendor: self.vendor.clone(),
            license: self.license.clone(),
            description: self.description.clone(),
            version: self.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::PluginDescriptor;
    use crate::plugin::{PLUGIN_ABI_VERSION, PluginError};

    #[test]
    fn parse_full_descriptor() {
        let text = r#"
            <Plugin Version="1">
                <Active>0</Active>
                <Name>Demo</Name>
                <Version>3</Version>
                <Vendor>Vendor</Vendor>
                <License>MIT</License>
                <Description>Demo classes</Description>
                <Library>libdemo</Library>
            </Plugin>"#;
        let descriptor = PluginDescriptor::parse(text, Path::new("demo.plugin")).unwrap();

        assert!(!descriptor.active);
        assert_eq!(descriptor.name, "Demo");
        assert_eq!(descriptor.version, 3);
        assert_eq!(descriptor.library, "libdemo");
        assert_eq!(descriptor.module_info().license, "MIT");
    }

    #[test]
    fn defaults() {
        let text = "<Plugin><Name>Demo</Name></Plugin>";
        let descriptor = PluginDescriptor::parse(text, Path::new("demo.plugin")).unwrap();

        assert!(descriptor.active);
        assert_eq!(descriptor.version, PLUGIN_ABI_VERSION);
        assert_eq!(descriptor.library, "Demo");
        assert_eq!(descriptor.vendor, "");
    }

    #[test]
    fn invalid_descriptors() {
        let path = Path::new("bad.plugin");
        for text in [
            "<Module><Name>Demo</Name></Module>",
            "<Plugin Version=\"2\"><Name>Demo</Name></Plugin>",
            "<Plugin><Active>1</Active></Plugin>",
            "<Plugin><Name>Demo",
        ] {
            assert!(
                matches!(
                    PluginDescriptor::parse(text, path),
                    Err(PluginError::InvalidDescriptor { .. })
                ),
                "{text}"
            );
        }
    }
}
