//! Per-module entry registry
//!
//! The registry maps every known descriptor of one module (the schema
//! templates plus the named variants registered so far) to its current value.
//! Named variants are memoized by `(template index, prefix)` so each one is
//! built exactly once, however many facades ask for it concurrently.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::entry::{ConfigEntry, SEPARATOR};
use crate::schema::ModuleSchema;

/// Live descriptor set and value holder for one module
#[derive(Debug)]
pub struct EntryRegistry {
    schema: Arc<ModuleSchema>,
    /// Named variants keyed by template index and prefix
    variants: DashMap<(usize, Arc<str>), ConfigEntry>,
    /// Every registered descriptor keyed by canonical name
    entries: DashMap<Arc<str>, ConfigEntry>,
    /// Resolved values keyed by canonical name
    values: DashMap<Arc<str>, String>,
}

impl EntryRegistry {
    /// Create a registry holding the schema's unprefixed templates
    pub fn new(schema: Arc<ModuleSchema>) -> Self {
        let entries = DashMap::with_capacity(schema.len());
        for entry in schema.entries() {
            entries.insert(entry.shared_name(), entry.clone());
        }

        Self {
            schema,
            variants: DashMap::new(),
            entries,
            values: DashMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<ModuleSchema> {
        &self.schema
    }

    /// Register the named variant of every template for `prefix`
    ///
    /// Insert-if-absent: repeated calls never replace a descriptor or touch a
    /// resolved value. Returns the number of descriptors that were added.
    pub fn register(&self, prefix: Option<&str>) -> usize {
        let Some(prefix) = prefix.filter(|p| !p.is_empty()) else {
            return 0;
        };
        let prefix: Arc<str> = Arc::from(prefix);
        let mut added = 0;

        for (index, template) in self.schema.entries().iter().enumerate() {
            let named = self
                .variants
                .entry((index, prefix.clone()))
                .or_insert_with(|| template.as_named(Some(&*prefix)))
                .clone();

            if let Entry::Vacant(slot) = self.entries.entry(named.shared_name()) {
                slot.insert(named);
                added += 1;
            }
        }

        if added > 0 {
            tracing::debug!(
                target: "forage_config",
                module = %self.schema.id(),
                prefix = %prefix,
                entries = added,
                "Registered named configuration entries"
            );
        }

        added
    }

    /// Find the registered descriptor for a short name and optional prefix
    ///
    /// Matches the canonical name `<prefix>.<namespace>.<short>` (or
    /// `<namespace>.<short>` without a prefix) by exact string equality.
    pub fn find(&self, prefix: Option<&str>, short_name: &str) -> Option<ConfigEntry> {
        let canonical = format!("{}{}{}", self.schema.namespace(), SEPARATOR, short_name);
        match prefix.filter(|p| !p.is_empty()) {
            Some(prefix) => self.lookup(&format!("{prefix}{SEPARATOR}{canonical}")),
            None => self.lookup(&canonical),
        }
    }

    /// Find the registered descriptor with exactly this canonical name
    pub fn lookup(&self, key: &str) -> Option<ConfigEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Registered descriptors for one prefix, in schema order
    pub fn entries(&self, prefix: Option<&str>) -> Vec<ConfigEntry> {
        match prefix.filter(|p| !p.is_empty()) {
            None => self.schema.entries().to_vec(),
            Some(prefix) => {
                let prefix: Arc<str> = Arc::from(prefix);
                (0..self.schema.len())
                    .filter_map(|index| {
                        self.variants
                            .get(&(index, prefix.clone()))
                            .map(|entry| entry.value().clone())
                    })
                    .collect()
            }
        }
    }

    /// Prefixes registered so far, sorted
    pub fn prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self
            .variants
            .iter()
            .map(|variant| variant.key().1.to_string())
            .collect();
        prefixes.sort();
        prefixes.dedup();
        prefixes
    }

    /// Current value of an entry
    pub fn get(&self, entry: &ConfigEntry) -> Option<String> {
        self.values.get(entry.name()).map(|value| value.value().clone())
    }

    /// Store a value, replacing any previous one
    ///
    /// Descriptors owned by another module are not stored.
    pub fn set(&self, entry: &ConfigEntry, value: impl Into<String>) {
        if entry.module() != self.schema.id() {
            tracing::warn!(
                target: "forage_config",
                module = %self.schema.id(),
                owner = %entry.module(),
                key = %entry.name(),
                "Ignoring value for a foreign entry"
            );
            return;
        }
        self.entries
            .entry(entry.shared_name())
            .or_insert_with(|| entry.clone());
        self.values.insert(entry.shared_name(), value.into());
    }

    /// Forget the value of an entry
    pub fn clear(&self, entry: &ConfigEntry) {
        self.values.remove(entry.name());
    }

    /// Number of registered descriptors, templates included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
