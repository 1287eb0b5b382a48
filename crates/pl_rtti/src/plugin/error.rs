use alloc::string::String;
use std::path::PathBuf;

use thiserror::Error;

/// An error that occurs while loading a plugin.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PluginError {
    #[error("Failed to read `{}`: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("Invalid plugin descriptor `{}`: {reason}", path.display())]
    InvalidDescriptor { path: PathBuf, reason: String },

    #[error("Plugin `{0}` is not active")]
    Inactive(String),

    #[error("Plugin `{module}` was built for ABI version {found}, expected {expected}")]
    IncompatibleAbi {
        module: String,
        found: u32,
        expected: u32,
    },

    #[error("No module library `{0}` is available")]
    LibraryNotFound(String),

    #[error("Plugin `{0}` is already loaded")]
    AlreadyLoaded(String),
}
