//! Prefix discovery: find the named instances configured for a module
//!
//! A module with namespace `forage.jdbc` has named instances when keys such as
//! `ds1.forage.jdbc.url` (property form) or `DS1_FORAGE_JDBC_URL` (environment
//! form) are present. Unprefixed keys never produce a prefix.
//!
//! Environment names carry no case, so an environment prefix that matches a
//! property-form prefix ignoring ASCII case is reported in the property form.

use regex::Regex;
use std::collections::BTreeSet;

use crate::context::ConfigContext;
use crate::entry::env_name;
use crate::error::ConfigResult;
use crate::schema::ModuleSchema;
use crate::source::PropertySource;

/// Patterns that extract an instance prefix from source keys
#[derive(Debug, Clone)]
pub struct PrefixPattern {
    property: Regex,
    environment: Regex,
}

impl PrefixPattern {
    /// Derive both patterns from a module namespace
    pub fn for_namespace(namespace: &str) -> ConfigResult<Self> {
        let property = Regex::new(&format!(r"^([^.]+)\.{}\..+$", regex::escape(namespace)))?;
        let environment = Regex::new(&format!(
            r"^([A-Za-z0-9_]+?)_{}_.+$",
            regex::escape(&env_name(namespace))
        ))?;
        Ok(Self { property, environment })
    }

    /// Prefix captured from a dotted property key
    pub fn capture(&self, key: &str) -> Option<String> {
        self.property
            .captures(key)
            .and_then(|captures| captures.get(1))
            .map(|prefix| prefix.as_str().to_string())
    }

    /// Prefix captured from an environment variable name, lower-cased
    pub fn capture_env(&self, name: &str) -> Option<String> {
        self.environment
            .captures(name)
            .and_then(|captures| captures.get(1))
            .map(|prefix| prefix.as_str().to_ascii_lowercase())
    }

    pub fn property_regex(&self) -> &Regex {
        &self.property
    }

    pub fn environment_regex(&self) -> &Regex {
        &self.environment
    }
}

/// Collect distinct prefixes from dotted keys
pub fn read_prefixes_from<I, S>(keys: I, pattern: &PrefixPattern) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keys.into_iter()
        .filter_map(|key| pattern.capture(key.as_ref()))
        .collect()
}

/// Collect distinct prefixes from environment variable names
pub fn read_env_prefixes_from<I, S>(names: I, pattern: &PrefixPattern) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| pattern.capture_env(name.as_ref()))
        .collect()
}

/// Add environment prefixes not already present in any letter case
pub fn merge_env_prefixes(prefixes: &mut BTreeSet<String>, env: BTreeSet<String>) {
    for prefix in env {
        if !prefixes.iter().any(|known| known.eq_ignore_ascii_case(&prefix)) {
            prefixes.insert(prefix);
        }
    }
}

/// Discover the named instances of a module from every source of a context
///
/// Scans environment variable names, system property names and the keys of
/// the module's properties file. An empty result means only the default
/// instance is configured.
pub fn read_prefixes(context: &ConfigContext, schema: &ModuleSchema) -> ConfigResult<BTreeSet<String>> {
    let pattern = schema.prefix_pattern()?;

    let mut prefixes = read_prefixes_from(context.system_properties().keys(), pattern);
    if let Some(file) = context.properties_for(schema)? {
        prefixes.extend(read_prefixes_from(file.keys(), pattern));
    }
    merge_env_prefixes(
        &mut prefixes,
        read_env_prefixes_from(context.environment().keys(), pattern),
    );

    tracing::debug!(
        target: "forage_config",
        module = %schema.id(),
        prefixes = ?prefixes,
        "Discovered configuration prefixes"
    );

    Ok(prefixes)
}
