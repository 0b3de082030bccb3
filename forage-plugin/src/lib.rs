//! Bean factory boundary for Forage
//!
//! A [`BeanFactory`] turns a module configuration into a bean. The
//! [`BeanRegistrar`] asks prefix discovery how many instances each factory
//! should build: a single default bean when no prefixed keys exist, or one
//! named bean per discovered prefix.

pub mod error;
pub mod factory;
pub mod registrar;
pub mod registry;

// Re-export main types
pub use error::{PluginError, PluginResult};
pub use factory::{Bean, BeanFactory, FactoryKind, FactoryMetadata, FactoryRegistration};
pub use registrar::{BeanInstance, BeanRegistrar, InstancePlan};
pub use registry::FactoryRegistry;

/// Factory registration macros
pub mod macros {
    pub use inventory;

    /// Register a bean factory for [`FactoryRegistry::discover`](crate::FactoryRegistry::discover)
    ///
    /// # Example
    /// ```rust,ignore
    /// use forage_plugin::{register_factory, BeanFactory};
    ///
    /// struct JdbcFactory;
    ///
    /// impl BeanFactory for JdbcFactory {
    ///     // implementation
    /// }
    ///
    /// register_factory!(JdbcFactory);
    /// ```
    #[macro_export]
    macro_rules! register_factory {
        ($factory:expr) => {
            $crate::macros::inventory::submit! {
                $crate::FactoryRegistration::new(|| ::std::boxed::Box::new($factory))
            }
        };
    }
}
