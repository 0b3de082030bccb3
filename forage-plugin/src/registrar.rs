//! Bean registration driven by prefix discovery
//!
//! A factory whose module has no prefixed keys in any source yields one
//! default bean named after the factory id. Otherwise one bean is built per
//! discovered prefix, each from its own named [`ModuleConfig`].

use forage_config::{ConfigContext, ModuleConfig};
use std::fmt;
use std::sync::Arc;

use crate::error::{PluginError, PluginResult};
use crate::factory::{Bean, BeanFactory};
use crate::registry::FactoryRegistry;

/// Which instances a factory should build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstancePlan {
    /// No prefixes configured: one unnamed instance
    Default,
    /// One instance per prefix, sorted
    Named(Vec<String>),
}

/// A bean built by a factory for one instance
#[derive(Clone)]
pub struct BeanInstance {
    /// Registration name: the prefix, or the factory id for the default instance
    pub name: String,
    pub factory_id: String,
    pub prefix: Option<String>,
    pub bean: Bean,
}

impl BeanInstance {
    /// Borrow the bean as its concrete type
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.bean.downcast_ref::<T>()
    }
}

impl fmt::Debug for BeanInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanInstance")
            .field("name", &self.name)
            .field("factory_id", &self.factory_id)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Builds beans for the factories of a registry
pub struct BeanRegistrar<'a> {
    context: Arc<ConfigContext>,
    factories: &'a FactoryRegistry,
}

impl<'a> BeanRegistrar<'a> {
    /// Registrar reading the process-wide configuration context
    pub fn new(factories: &'a FactoryRegistry) -> Self {
        Self::with_context(ConfigContext::global(), factories)
    }

    pub fn with_context(context: Arc<ConfigContext>, factories: &'a FactoryRegistry) -> Self {
        Self { context, factories }
    }

    pub fn context(&self) -> &Arc<ConfigContext> {
        &self.context
    }

    /// Decide between the default instance and named instances
    pub fn plan(&self, factory: &dyn BeanFactory) -> PluginResult<InstancePlan> {
        let prefixes = self.context.read_prefixes(factory.schema())?;
        if prefixes.is_empty() {
            Ok(InstancePlan::Default)
        } else {
            Ok(InstancePlan::Named(prefixes.into_iter().collect()))
        }
    }

    /// Build every instance of one factory
    ///
    /// Named instances are built concurrently; results keep prefix order.
    pub fn instantiate(&self, factory: &dyn BeanFactory) -> PluginResult<Vec<BeanInstance>> {
        let plan = self.plan(factory)?;
        tracing::debug!(
            target: "forage_plugin",
            factory = %factory.metadata().id,
            plan = ?plan,
            "Planned bean instances"
        );

        match plan {
            InstancePlan::Default => Ok(vec![self.create(factory, None)?]),
            InstancePlan::Named(prefixes) => std::thread::scope(|scope| {
                let handles: Vec<_> = prefixes
                    .iter()
                    .map(|prefix| {
                        let handle = scope.spawn(move || self.create(factory, Some(prefix.as_str())));
                        (prefix, handle)
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|(prefix, handle)| {
                        handle.join().unwrap_or_else(|_| {
                            Err(PluginError::creation_failed(
                                &factory.metadata().id,
                                prefix,
                                "factory panicked",
                            ))
                        })
                    })
                    .collect()
            }),
        }
    }

    /// Build every instance of every registered factory, in factory id order
    pub fn instantiate_all(&self) -> PluginResult<Vec<BeanInstance>> {
        let mut instances = Vec::new();
        for factory in self.factories.factories() {
            instances.extend(self.instantiate(factory.as_ref())?);
        }

        tracing::info!(
            target: "forage_plugin",
            factories = self.factories.len(),
            beans = instances.len(),
            "Registered beans"
        );
        Ok(instances)
    }

    fn create(&self, factory: &dyn BeanFactory, prefix: Option<&str>) -> PluginResult<BeanInstance> {
        let factory_id = factory.metadata().id.clone();
        let name = prefix.unwrap_or(&factory_id).to_string();

        let config = ModuleConfig::with_context(&self.context, factory.schema(), prefix)?;
        let bean = factory.create(&config).map_err(|err| match err {
            PluginError::CreationFailed { .. } => err,
            other => PluginError::creation_failed(&factory_id, &name, other.to_string()),
        })?;

        tracing::debug!(
            target: "forage_plugin",
            factory = %factory_id,
            bean = %name,
            "Created bean"
        );

        Ok(BeanInstance {
            name,
            factory_id,
            prefix: prefix.map(str::to_string),
            bean,
        })
    }
}
