use crate::class::ClassRef;

/// A class submitted for registration by [`ClassManager::auto_register`].
///
/// Generated by `#[rtti(auto_register)]`. Manual submission:
///
/// ```ignore
/// pl_rtti::__macro_exports::inventory::submit! {
///     pl_rtti::registry::AutoRegisterClass::new(<Widget as pl_rtti::class::ClassType>::static_class)
/// }
/// ```
///
/// [`ClassManager::auto_register`]: crate::registry::ClassManager::auto_register
pub struct AutoRegisterClass {
    class: fn() -> ClassRef,
}

impl AutoRegisterClass {
    #[inline]
    pub const fn new(class: fn() -> ClassRef) -> Self {
        Self { class }
    }

    /// Returns the class, building it on first use.
    #[inline]
    pub fn class(&self) -> ClassRef {
        (self.class)()
    }
}

inventory::collect!(AutoRegisterClass);
