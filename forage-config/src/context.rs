//! Process-wide configuration context
//!
//! The context owns every module registry, the system property store, the
//! environment source and the properties-file cache. [`ConfigContext::global`]
//! is initialized on first use and reads the live process environment; tests
//! build isolated contexts with [`ConfigContext::builder`].

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::discovery;
use crate::error::ConfigResult;
use crate::registry::EntryRegistry;
use crate::schema::ModuleSchema;
use crate::source::{EnvSource, Properties, PropertySource, SystemProperties};

/// Environment variable listing extra properties-file directories
pub const CONFIG_PATH_ENV: &str = "FORAGE_CONFIG_PATH";

static GLOBAL: Lazy<Arc<ConfigContext>> = Lazy::new(|| Arc::new(ConfigContext::builder().build()));

/// Owner of registries and sources for a set of modules
pub struct ConfigContext {
    environment: Box<dyn PropertySource>,
    system_properties: SystemProperties,
    search_path: Vec<PathBuf>,
    registries: DashMap<String, Arc<EntryRegistry>>,
    /// Properties files by module id; `None` caches "not found"
    properties: DashMap<String, Option<Arc<Properties>>>,
}

impl ConfigContext {
    /// The process-wide context
    pub fn global() -> Arc<ConfigContext> {
        GLOBAL.clone()
    }

    pub fn builder() -> ConfigContextBuilder {
        ConfigContextBuilder::default()
    }

    /// Environment variable source
    pub fn environment(&self) -> &dyn PropertySource {
        self.environment.as_ref()
    }

    pub fn system_properties(&self) -> &SystemProperties {
        &self.system_properties
    }

    /// Directories searched for module properties files, in order
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Registry for a module, created on first use
    ///
    /// Registries are keyed by module id; the first schema seen for an id wins.
    pub fn registry(&self, schema: &Arc<ModuleSchema>) -> Arc<EntryRegistry> {
        self.registries
            .entry(schema.id().to_string())
            .or_insert_with(|| {
                tracing::debug!(
                    target: "forage_config",
                    module = %schema.id(),
                    entries = schema.len(),
                    "Created configuration registry"
                );
                Arc::new(EntryRegistry::new(schema.clone()))
            })
            .clone()
    }

    /// Properties file for a module, read at most once and cached
    pub fn properties_for(&self, schema: &ModuleSchema) -> ConfigResult<Option<Arc<Properties>>> {
        if let Some(cached) = self.properties.get(schema.id()) {
            return Ok(cached.value().clone());
        }

        let loaded = self
            .properties
            .entry(schema.id().to_string())
            .or_try_insert_with(|| self.load_properties(schema))?;
        Ok(loaded.value().clone())
    }

    fn load_properties(&self, schema: &ModuleSchema) -> ConfigResult<Option<Arc<Properties>>> {
        let Some(path) = self.locate(schema.properties_file()) else {
            tracing::debug!(
                target: "forage_config",
                module = %schema.id(),
                file = %schema.properties_file(),
                "No properties file on search path"
            );
            return Ok(None);
        };

        let properties = Properties::load(&path)?;
        tracing::debug!(
            target: "forage_config",
            module = %schema.id(),
            path = %path.display(),
            keys = properties.len(),
            "Loaded properties file"
        );
        Ok(Some(Arc::new(properties)))
    }

    fn locate(&self, file_name: &str) -> Option<PathBuf> {
        self.search_path
            .iter()
            .map(|dir| dir.join(file_name))
            .find(|candidate| candidate.is_file())
    }

    /// Named instances configured for a module
    pub fn read_prefixes(&self, schema: &ModuleSchema) -> ConfigResult<BTreeSet<String>> {
        discovery::read_prefixes(self, schema)
    }

    /// Drop every registry, cached file and system property
    pub fn reset(&self) {
        self.registries.clear();
        self.properties.clear();
        self.system_properties.clear();
    }
}

impl fmt::Debug for ConfigContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigContext")
            .field("search_path", &self.search_path)
            .field("modules", &self.registries.len())
            .finish()
    }
}

/// Builder for [`ConfigContext`]
#[derive(Default)]
pub struct ConfigContextBuilder {
    environment: Option<Box<dyn PropertySource>>,
    search_path: Option<Vec<PathBuf>>,
    system_properties: Vec<(String, String)>,
}

impl ConfigContextBuilder {
    /// Replace the process environment with another source
    pub fn environment(mut self, source: impl PropertySource + 'static) -> Self {
        self.environment = Some(Box::new(source));
        self
    }

    /// Replace the default search path
    pub fn search_path<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_path = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    /// Append one directory to the search path
    pub fn search_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.search_path
            .get_or_insert_with(Vec::new)
            .push(dir.as_ref().to_path_buf());
        self
    }

    /// Seed a system property
    pub fn system_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.system_properties.push((key.into(), value.into()));
        self
    }

    pub fn build(self) -> ConfigContext {
        let environment = self
            .environment
            .unwrap_or_else(|| Box::new(EnvSource::Process));
        let search_path = self
            .search_path
            .unwrap_or_else(|| default_search_path(environment.as_ref()));

        let system_properties = SystemProperties::new();
        for (key, value) in self.system_properties {
            system_properties.set(key, value);
        }

        ConfigContext {
            environment,
            system_properties,
            search_path,
            registries: DashMap::new(),
            properties: DashMap::new(),
        }
    }
}

/// `FORAGE_CONFIG_PATH` entries, then the working directory, then the user config dir
fn default_search_path(environment: &dyn PropertySource) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = environment
        .get(CONFIG_PATH_ENV)
        .map(|value| std::env::split_paths(&value).collect())
        .unwrap_or_default();
    dirs.push(PathBuf::from("."));
    if let Some(config_dir) = dirs::config_dir() {
        dirs.push(config_dir.join("forage"));
    }
    dirs
}
