//! The class registry.
//!
//! A [`ClassManager`] maps class names to [`Class`]es and groups them into
//! modules. Modules are registered and unregistered as a whole, which is how
//! plugins add and remove their classes.
//!
//! ## auto_register
//!
//! With the `auto_register` feature, classes declared with
//! `#[rtti(auto_register)]` are collected with the [`inventory`] crate and
//! registered by [`ClassManager::auto_register`]. The
//! [global manager](ClassManager::global) does this on first use.
//!
//! [`Class`]: crate::class::Class
//! [`inventory`]: https://docs.rs/inventory

mod class_manager;
mod error;
mod module;

#[cfg(feature = "auto_register")]
mod auto;

pub use class_manager::{ClassManager, IncludeBase, Recursion};
pub use error::RegisterError;
pub use module::{MAIN_MODULE, ModuleId, ModuleInfo};

#[cfg(feature = "auto_register")]
pub use auto::AutoRegisterClass;
