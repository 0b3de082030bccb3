//! Module configuration facade
//!
//! [`ModuleConfig`] is what a bean factory constructs to read its settings.
//! Construction registers the named entries for the prefix, feeds the module's
//! properties file through [`Config::register`], and finally lets the
//! environment and system properties override file values. Getters only read.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::context::ConfigContext;
use crate::entry::{ConfigEntry, EntryType, SEPARATOR};
use crate::error::{ConfigError, ConfigResult};
use crate::registry::EntryRegistry;
use crate::resolver::{Resolved, SourceResolver};
use crate::schema::{ModuleSchema, UnknownKeyPolicy};

/// Placeholder shown instead of secret values
pub const MASK: &str = "****";

/// Capability implemented by every module configuration
pub trait Config {
    /// Module identifier; also names the module's properties file
    fn name(&self) -> &str;

    /// Accept one `key=value` pair read from the module's properties file
    fn register(&self, key: &str, value: &str) -> ConfigResult<()>;
}

/// Typed view over one (optionally prefixed) instance of a module
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    context: Arc<ConfigContext>,
    registry: Arc<EntryRegistry>,
    prefix: Option<String>,
}

impl ModuleConfig {
    /// Build against the process-wide context
    pub fn new(schema: &Arc<ModuleSchema>, prefix: Option<&str>) -> ConfigResult<Self> {
        Self::with_context(&ConfigContext::global(), schema, prefix)
    }

    /// Build against an explicit context
    pub fn with_context(
        context: &Arc<ConfigContext>,
        schema: &Arc<ModuleSchema>,
        prefix: Option<&str>,
    ) -> ConfigResult<Self> {
        let prefix = match prefix.filter(|p| !p.is_empty()) {
            Some(p) if p.contains(SEPARATOR) => {
                return Err(ConfigError::InvalidPrefix { prefix: p.to_string() })
            }
            other => other.map(str::to_string),
        };

        let config = Self {
            context: context.clone(),
            registry: context.registry(schema),
            prefix,
        };

        config.registry.register(config.prefix());

        if let Some(file) = context.properties_for(schema)? {
            for (key, value) in file.iter() {
                config.register(key, value)?;
            }
        }

        SourceResolver::new(context, schema)?.load(&config.registry, config.prefix());

        Ok(config)
    }

    /// Instance prefix, `None` for the default instance
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Identifier of the module this instance belongs to
    pub fn module(&self) -> &str {
        self.schema().id()
    }

    pub fn schema(&self) -> &Arc<ModuleSchema> {
        self.registry.schema()
    }

    pub fn registry(&self) -> &Arc<EntryRegistry> {
        &self.registry
    }

    /// Descriptor of this instance for a short name
    pub fn entry(&self, short_name: &str) -> ConfigResult<ConfigEntry> {
        self.registry
            .find(self.prefix(), short_name)
            .ok_or_else(|| ConfigError::UnknownEntry {
                module: self.schema().id().to_string(),
                name: short_name.to_string(),
            })
    }

    /// Stored value, falling back to the declared default
    fn raw(&self, entry: &ConfigEntry) -> Option<String> {
        self.registry
            .get(entry)
            .or_else(|| entry.default_value().map(str::to_string))
    }

    fn present(&self, short_name: &str) -> ConfigResult<Option<(ConfigEntry, String)>> {
        let entry = self.entry(short_name)?;
        match self.raw(&entry) {
            Some(value) => Ok(Some((entry, value))),
            None if entry.is_required() => Err(ConfigError::missing(entry.name())),
            None => Ok(None),
        }
    }

    /// String value; fails only if required and absent
    pub fn string(&self, short_name: &str) -> ConfigResult<Option<String>> {
        Ok(self.present(short_name)?.map(|(_, value)| value))
    }

    pub fn required_string(&self, short_name: &str) -> ConfigResult<String> {
        let entry = self.entry(short_name)?;
        self.raw(&entry).ok_or_else(|| ConfigError::missing(entry.name()))
    }

    /// Parse a value with [`FromStr`]
    pub fn parse<T: FromStr>(&self, short_name: &str) -> ConfigResult<Option<T>> {
        self.present(short_name)?
            .map(|(entry, value)| parse_as(&entry, &value))
            .transpose()
    }

    pub fn required<T: FromStr>(&self, short_name: &str) -> ConfigResult<T> {
        let entry = self.entry(short_name)?;
        let value = self.raw(&entry).ok_or_else(|| ConfigError::missing(entry.name()))?;
        parse_as(&entry, &value)
    }

    pub fn int(&self, short_name: &str) -> ConfigResult<Option<i64>> {
        self.parse(short_name)
    }

    pub fn double(&self, short_name: &str) -> ConfigResult<Option<f64>> {
        self.parse(short_name)
    }

    /// Boolean value; accepts `true`/`false` in any case
    pub fn boolean(&self, short_name: &str) -> ConfigResult<Option<bool>> {
        self.present(short_name)?
            .map(|(entry, value)| parse_bool(&entry, &value))
            .transpose()
    }

    pub fn required_boolean(&self, short_name: &str) -> ConfigResult<bool> {
        let entry = self.entry(short_name)?;
        let value = self.raw(&entry).ok_or_else(|| ConfigError::missing(entry.name()))?;
        parse_bool(&entry, &value)
    }

    /// Current resolution of an entry and the source that wins
    pub fn explain(&self, short_name: &str) -> ConfigResult<Option<Resolved>> {
        let entry = self.entry(short_name)?;
        let resolver = SourceResolver::new(&self.context, self.schema())?;
        Ok(resolver.resolve(&entry))
    }

    /// Every entry of this instance with its value; secrets are masked
    pub fn snapshot(&self) -> BTreeMap<String, Option<String>> {
        self.registry
            .entries(self.prefix())
            .into_iter()
            .map(|entry| {
                let value = self.raw(&entry).map(|value| {
                    if entry.is_secret() {
                        MASK.to_string()
                    } else {
                        value
                    }
                });
                (entry.name().to_string(), value)
            })
            .collect()
    }

    /// Whether a key from another source belongs to a different instance
    fn belongs_to_other_instance(&self, key: &str) -> bool {
        match self.schema().prefix_pattern() {
            Ok(pattern) => pattern
                .capture(key)
                .is_some_and(|found| Some(found.as_str()) != self.prefix()),
            Err(_) => false,
        }
    }
}

impl Config for ModuleConfig {
    fn name(&self) -> &str {
        self.module()
    }

    fn register(&self, key: &str, value: &str) -> ConfigResult<()> {
        match self.registry.lookup(key) {
            Some(entry) if entry.prefix() == self.prefix() => {
                self.registry.set(&entry, value);
                Ok(())
            }
            Some(_) => Ok(()),
            None if self.belongs_to_other_instance(key) => Ok(()),
            None => match self.schema().unknown_keys() {
                UnknownKeyPolicy::Ignore => {
                    tracing::debug!(
                        target: "forage_config",
                        module = %self.schema().id(),
                        key,
                        "Ignoring unknown property"
                    );
                    Ok(())
                }
                UnknownKeyPolicy::Reject => Err(ConfigError::UnknownProperty {
                    module: self.schema().id().to_string(),
                    key: key.to_string(),
                }),
            },
        }
    }
}

fn parse_as<T: FromStr>(entry: &ConfigEntry, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_value(entry.name(), entry.entry_type(), value))
}

fn parse_bool(entry: &ConfigEntry, value: &str) -> ConfigResult<bool> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ConfigError::invalid_value(entry.name(), EntryType::Boolean, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{EnvSource, SourceKind};

    fn schema(policy: UnknownKeyPolicy) -> Arc<ModuleSchema> {
        ModuleSchema::builder("forage-facade", "facade")
            .entry(ConfigEntry::of("forage-facade", "facade.url").required())
            .entry(
                ConfigEntry::of("forage-facade", "facade.port")
                    .with_type(EntryType::Int)
                    .with_default("8080"),
            )
            .entry(ConfigEntry::of("forage-facade", "facade.ratio").with_type(EntryType::Double))
            .entry(ConfigEntry::of("forage-facade", "facade.enabled").with_type(EntryType::Boolean))
            .entry(ConfigEntry::of("forage-facade", "facade.secret").with_type(EntryType::Password))
            .unknown_keys(policy)
            .build()
    }

    fn context(env: &[(&str, &str)], file: Option<&str>) -> (Arc<ConfigContext>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        if let Some(content) = file {
            std::fs::write(dir.path().join("forage-facade.properties"), content).unwrap();
        }
        let context = ConfigContext::builder()
            .environment(EnvSource::from_vars(env.iter().copied()))
            .search_path([dir.path().to_path_buf()])
            .build();
        (Arc::new(context), dir)
    }

    #[test]
    fn test_required_missing_fails_on_read_not_construction() {
        let (context, _dir) = context(&[], None);
        let config = ModuleConfig::with_context(&context, &schema(UnknownKeyPolicy::Ignore), None).unwrap();

        let err = config.required_string("url").unwrap_err();
        assert!(matches!(err, ConfigError::MissingConfiguration { ref key } if key == "facade.url"));
        assert!(config.string("url").is_err());
    }

    #[test]
    fn test_named_missing_names_prefixed_key() {
        let (context, _dir) = context(&[("FACADE_URL", "http://default")], None);
        let schema = schema(UnknownKeyPolicy::Ignore);

        let default = ModuleConfig::with_context(&context, &schema, None).unwrap();
        assert_eq!(default.required_string("url").unwrap(), "http://default");

        let named = ModuleConfig::with_context(&context, &schema, Some("alt")).unwrap();
        let err = named.required_string("url").unwrap_err();
        assert_eq!(err.key(), Some("alt.facade.url"));
        assert!(err.to_string().contains("alt.facade.url"));
    }

    #[test]
    fn test_typed_getters_and_defaults() {
        let (context, _dir) = context(
            &[("FACADE_RATIO", "0.25"), ("FACADE_ENABLED", "TRUE")],
            None,
        );
        let config = ModuleConfig::with_context(&context, &schema(UnknownKeyPolicy::Ignore), None).unwrap();

        assert_eq!(config.int("port").unwrap(), Some(8080));
        assert_eq!(config.parse::<u16>("port").unwrap(), Some(8080));
        assert_eq!(config.double("ratio").unwrap(), Some(0.25));
        assert_eq!(config.boolean("enabled").unwrap(), Some(true));
        assert_eq!(config.string("secret").unwrap(), None);
    }

    #[test]
    fn test_malformed_value_reported_by_getter() {
        let (context, _dir) = context(&[("FACADE_PORT", "eighty"), ("FACADE_ENABLED", "yes")], None);
        let config = ModuleConfig::with_context(&context, &schema(UnknownKeyPolicy::Ignore), None).unwrap();

        let err = config.int("port").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, expected: EntryType::Int, ref value }
                if key == "facade.port" && value == "eighty"
        ));
        assert!(config.boolean("enabled").is_err());
        // the raw string is still readable
        assert_eq!(config.string("port").unwrap().as_deref(), Some("eighty"));
    }

    #[test]
    fn test_file_values_overridden_by_env() {
        let (context, _dir) = context(
            &[("FACADE_PORT", "9090")],
            Some("facade.url=http://file\nfacade.port=7070\n"),
        );
        let config = ModuleConfig::with_context(&context, &schema(UnknownKeyPolicy::Ignore), None).unwrap();

        assert_eq!(config.required_string("url").unwrap(), "http://file");
        assert_eq!(config.int("port").unwrap(), Some(9090));

        let explained = config.explain("port").unwrap().unwrap();
        assert_eq!(explained.source, SourceKind::Environment);
        let explained = config.explain("url").unwrap().unwrap();
        assert_eq!(explained.source, SourceKind::PropertiesFile);
    }

    #[test]
    fn test_file_keys_for_other_prefixes_are_skipped() {
        let (context, _dir) = context(
            &[],
            Some("one.facade.url=http://one\ntwo.facade.url=http://two\n"),
        );
        let schema = schema(UnknownKeyPolicy::Reject);

        let one = ModuleConfig::with_context(&context, &schema, Some("one")).unwrap();
        let two = ModuleConfig::with_context(&context, &schema, Some("two")).unwrap();
        assert_eq!(one.required_string("url").unwrap(), "http://one");
        assert_eq!(two.required_string("url").unwrap(), "http://two");

        let default = ModuleConfig::with_context(&context, &schema, None).unwrap();
        assert!(default.required_string("url").is_err());
    }

    #[test]
    fn test_unknown_key_policy() {
        let (context, _dir) = context(&[], Some("facade.bogus=1\n"));

        let ignoring = ModuleConfig::with_context(&context, &schema(UnknownKeyPolicy::Ignore), None);
        assert!(ignoring.is_ok());

        context.reset();
        let rejecting = ModuleConfig::with_context(&context, &schema(UnknownKeyPolicy::Reject), None);
        assert!(matches!(
            rejecting,
            Err(ConfigError::UnknownProperty { ref key, .. }) if key == "facade.bogus"
        ));
    }

    #[test]
    fn test_register_callback() {
        let (context, _dir) = context(&[], None);
        let config = ModuleConfig::with_context(&context, &schema(UnknownKeyPolicy::Reject), Some("cb")).unwrap();

        config.register("cb.facade.url", "http://callback").unwrap();
        assert_eq!(config.required_string("url").unwrap(), "http://callback");
        assert_eq!(config.name(), "forage-facade");

        // default-instance keys are not ours but are known, so not an error
        config.register("facade.url", "http://default").unwrap();
        assert_eq!(config.required_string("url").unwrap(), "http://callback");
        assert!(config.register("cb.facade.unknown", "x").is_err());
    }

    #[test]
    fn test_invalid_prefix() {
        let (context, _dir) = context(&[], None);
        let err = ModuleConfig::with_context(&context, &schema(UnknownKeyPolicy::Ignore), Some("a.b")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrefix { .. }));

        let empty = ModuleConfig::with_context(&context, &schema(UnknownKeyPolicy::Ignore), Some("")).unwrap();
        assert_eq!(empty.prefix(), None);
    }

    #[test]
    fn test_unknown_entry() {
        let (context, _dir) = context(&[], None);
        let config = ModuleConfig::with_context(&context, &schema(UnknownKeyPolicy::Ignore), None).unwrap();
        assert!(matches!(config.string("nope"), Err(ConfigError::UnknownEntry { .. })));
    }

    #[test]
    fn test_snapshot_masks_secrets() {
        let (context, _dir) = context(&[("FACADE_SECRET", "hunter2"), ("FACADE_URL", "http://x")], None);
        let config = ModuleConfig::with_context(&context, &schema(UnknownKeyPolicy::Ignore), None).unwrap();

        let snapshot = config.snapshot();
        assert_eq!(snapshot["facade.secret"].as_deref(), Some(MASK));
        assert_eq!(snapshot["facade.url"].as_deref(), Some("http://x"));
        assert_eq!(snapshot["facade.ratio"], None);
    }

    #[test]
    fn test_getters_do_not_write() {
        let (context, _dir) = context(&[], None);
        let config = ModuleConfig::with_context(&context, &schema(UnknownKeyPolicy::Ignore), None).unwrap();
        let before = config.snapshot();
        let _ = config.string("url");
        let _ = config.int("port");
        let _ = config.explain("port");
        assert_eq!(before, config.snapshot());
    }
}
