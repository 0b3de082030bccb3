//! Layered value resolution
//!
//! Precedence, highest first: environment variable, system property, module
//! properties file, declared default.

use std::sync::Arc;

use crate::context::ConfigContext;
use crate::entry::ConfigEntry;
use crate::error::ConfigResult;
use crate::registry::EntryRegistry;
use crate::schema::ModuleSchema;
use crate::source::{Properties, PropertySource, SourceKind};

/// A resolved value and the source that provided it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub value: String,
    pub source: SourceKind,
}

/// Resolves entries of one module against the sources of a context
pub struct SourceResolver<'a> {
    context: &'a ConfigContext,
    file: Option<Arc<Properties>>,
}

impl<'a> SourceResolver<'a> {
    /// Create a resolver, reading the module properties file through the context cache
    pub fn new(context: &'a ConfigContext, schema: &ModuleSchema) -> ConfigResult<Self> {
        Ok(Self {
            context,
            file: context.properties_for(schema)?,
        })
    }

    /// First present value for an entry, or its default
    pub fn resolve(&self, entry: &ConfigEntry) -> Option<Resolved> {
        let found = |value: String, source: SourceKind| Resolved { value, source };

        self.context
            .environment()
            .get(&entry.env_name())
            .map(|value| found(value, SourceKind::Environment))
            .or_else(|| {
                self.context
                    .system_properties()
                    .get(entry.name())
                    .map(|value| found(value, SourceKind::SystemProperty))
            })
            .or_else(|| {
                self.file
                    .as_ref()
                    .and_then(|file| file.get(entry.name()))
                    .map(|value| found(value, SourceKind::PropertiesFile))
            })
            .or_else(|| {
                entry
                    .default_value()
                    .map(|value| found(value.to_string(), SourceKind::Default))
            })
    }

    /// Resolve every registered entry of `prefix` into the registry
    ///
    /// Entries with no value anywhere are cleared, never rejected: a required
    /// key only fails when it is read. Returns the number of entries set.
    pub fn load(&self, registry: &EntryRegistry, prefix: Option<&str>) -> usize {
        let mut resolved = 0;

        for entry in registry.entries(prefix) {
            match self.resolve(&entry) {
                Some(Resolved { value, source }) => {
                    tracing::trace!(
                        target: "forage_config",
                        key = %entry.name(),
                        %source,
                        "Resolved configuration entry"
                    );
                    registry.set(&entry, value);
                    resolved += 1;
                }
                None => registry.clear(&entry),
            }
        }

        tracing::debug!(
            target: "forage_config",
            module = %registry.schema().id(),
            prefix = prefix.unwrap_or_default(),
            resolved,
            "Loaded configuration values"
        );

        resolved
    }
}
