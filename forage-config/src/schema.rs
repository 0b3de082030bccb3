//! Module schemas: the static entry set owned by one configuration module

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

use crate::discovery::PrefixPattern;
use crate::entry::ConfigEntry;
use crate::error::ConfigResult;

/// What to do with a properties-file key that maps to no known entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeyPolicy {
    /// Skip the key; the file may carry properties for other consumers
    #[default]
    Ignore,
    /// Fail facade construction with [`crate::ConfigError::UnknownProperty`]
    Reject,
}

/// Immutable template arena for one module
///
/// Entries keep their declaration order; the index of an entry in this arena
/// is the key under which its named variants are memoized.
#[derive(Debug)]
pub struct ModuleSchema {
    id: String,
    namespace: String,
    properties_file: String,
    entries: Vec<ConfigEntry>,
    by_short_name: HashMap<String, usize>,
    unknown_keys: UnknownKeyPolicy,
    pattern: OnceCell<PrefixPattern>,
}

impl ModuleSchema {
    /// Start a schema for module `id` whose keys live under `namespace`
    pub fn builder(id: impl Into<String>, namespace: impl Into<String>) -> ModuleSchemaBuilder {
        let id = id.into();
        ModuleSchemaBuilder {
            properties_file: format!("{id}.properties"),
            id,
            namespace: namespace.into(),
            entries: Vec::new(),
            unknown_keys: UnknownKeyPolicy::default(),
        }
    }

    /// Module identifier, also the owner recorded on every entry
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Dotted namespace shared by every canonical name of this module
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// File name looked up on the resource search path
    pub fn properties_file(&self) -> &str {
        &self.properties_file
    }

    pub fn unknown_keys(&self) -> UnknownKeyPolicy {
        self.unknown_keys
    }

    /// Template entries in declaration order
    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Template entry by arena index
    pub fn get(&self, index: usize) -> Option<&ConfigEntry> {
        self.entries.get(index)
    }

    /// Arena index of the template with this short name
    pub fn index_of(&self, short_name: &str) -> Option<usize> {
        self.by_short_name.get(short_name).copied()
    }

    /// Template entry by short name
    pub fn entry(&self, short_name: &str) -> Option<&ConfigEntry> {
        self.index_of(short_name).and_then(|index| self.entries.get(index))
    }

    /// Prefix discovery pattern, derived once from the namespace
    pub fn prefix_pattern(&self) -> ConfigResult<&PrefixPattern> {
        self.pattern
            .get_or_try_init(|| PrefixPattern::for_namespace(&self.namespace))
    }
}

/// Builder for [`ModuleSchema`]
#[derive(Debug)]
pub struct ModuleSchemaBuilder {
    id: String,
    namespace: String,
    properties_file: String,
    entries: Vec<ConfigEntry>,
    unknown_keys: UnknownKeyPolicy,
}

impl ModuleSchemaBuilder {
    /// Declare an entry; its canonical name should start with the namespace
    pub fn entry(mut self, entry: ConfigEntry) -> Self {
        debug_assert_eq!(entry.module(), self.id, "entry declared for a different module");
        self.entries.push(entry.within_namespace(&self.namespace));
        self
    }

    /// Override the properties file name (defaults to `<id>.properties`)
    pub fn properties_file(mut self, file_name: impl Into<String>) -> Self {
        self.properties_file = file_name.into();
        self
    }

    pub fn unknown_keys(mut self, policy: UnknownKeyPolicy) -> Self {
        self.unknown_keys = policy;
        self
    }

    pub fn build(self) -> Arc<ModuleSchema> {
        let mut entries = Vec::with_capacity(self.entries.len());
        let mut by_short_name = HashMap::with_capacity(self.entries.len());

        for entry in self.entries {
            if by_short_name.contains_key(entry.short_name()) {
                tracing::warn!(
                    target: "forage_config",
                    module = %self.id,
                    entry = %entry.name(),
                    "Duplicate entry declaration ignored"
                );
                continue;
            }
            by_short_name.insert(entry.short_name().to_string(), entries.len());
            entries.push(entry);
        }

        Arc::new(ModuleSchema {
            id: self.id,
            namespace: self.namespace,
            properties_file: self.properties_file,
            entries,
            by_short_name,
            unknown_keys: self.unknown_keys,
            pattern: OnceCell::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;

    fn schema() -> Arc<ModuleSchema> {
        ModuleSchema::builder("forage-test", "forage.test")
            .entry(ConfigEntry::of("forage-test", "forage.test.host").with_default("localhost"))
            .entry(ConfigEntry::of("forage-test", "forage.test.port").with_type(EntryType::Int))
            .entry(ConfigEntry::of("forage-test", "forage.test.host").with_default("ignored"))
            .build()
    }

    #[test]
    fn test_schema_defaults() {
        let schema = schema();
        assert_eq!(schema.id(), "forage-test");
        assert_eq!(schema.namespace(), "forage.test");
        assert_eq!(schema.properties_file(), "forage-test.properties");
        assert_eq!(schema.unknown_keys(), UnknownKeyPolicy::Ignore);
    }

    #[test]
    fn test_duplicates_keep_first_declaration() {
        let schema = schema();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.entry("host").unwrap().default_value(), Some("localhost"));
    }

    #[test]
    fn test_short_name_index() {
        let schema = schema();
        assert_eq!(schema.index_of("host"), Some(0));
        assert_eq!(schema.index_of("port"), Some(1));
        assert_eq!(schema.get(1).unwrap().name(), "forage.test.port");
        assert!(schema.entry("forage.test.port").is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let schema = ModuleSchema::builder("forage-x", "x")
            .properties_file("custom.properties")
            .unknown_keys(UnknownKeyPolicy::Reject)
            .build();
        assert_eq!(schema.properties_file(), "custom.properties");
        assert_eq!(schema.unknown_keys(), UnknownKeyPolicy::Reject);
        assert!(schema.is_empty());
    }
}
