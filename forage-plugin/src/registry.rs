//! Factory registry

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{PluginError, PluginResult};
use crate::factory::{BeanFactory, FactoryKind, FactoryMetadata, FactoryRegistration};

/// Bean factories keyed by id
#[derive(Default)]
pub struct FactoryRegistry {
    factories: BTreeMap<String, Arc<dyn BeanFactory>>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every factory submitted with `register_factory!`
    pub fn discover() -> PluginResult<Self> {
        let mut registry = Self::new();
        for registration in inventory::iter::<FactoryRegistration> {
            registry.register(Arc::from(registration.factory()))?;
        }

        tracing::info!(
            target: "forage_plugin",
            factories = registry.len(),
            "Discovered statically registered bean factories"
        );
        Ok(registry)
    }

    /// Register a factory; ids must be unique
    pub fn register(&mut self, factory: Arc<dyn BeanFactory>) -> PluginResult<()> {
        let id = factory.metadata().id.clone();
        if self.factories.contains_key(&id) {
            return Err(PluginError::FactoryAlreadyExists { id });
        }

        tracing::debug!(
            target: "forage_plugin",
            factory = %id,
            kind = %factory.metadata().kind,
            module = %factory.schema().id(),
            "Registered bean factory"
        );
        self.factories.insert(id, factory);
        Ok(())
    }

    pub fn get(&self, id: &str) -> PluginResult<Arc<dyn BeanFactory>> {
        self.factories
            .get(id)
            .cloned()
            .ok_or_else(|| PluginError::not_found(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Factories producing beans of one kind, ordered by id
    pub fn by_kind(&self, kind: FactoryKind) -> Vec<Arc<dyn BeanFactory>> {
        self.factories
            .values()
            .filter(|factory| factory.metadata().kind == kind)
            .cloned()
            .collect()
    }

    /// Every registered factory, ordered by id
    pub fn factories(&self) -> impl Iterator<Item = &Arc<dyn BeanFactory>> {
        self.factories.values()
    }

    pub fn list(&self) -> Vec<FactoryMetadata> {
        self.factories
            .values()
            .map(|factory| factory.metadata().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
