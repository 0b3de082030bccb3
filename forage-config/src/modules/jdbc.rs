//! JDBC datasource configuration

use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::context::ConfigContext;
use crate::entry::{ConfigEntry, EntryTag, EntryType};
use crate::error::ConfigResult;
use crate::facade::{Config, ModuleConfig};
use crate::schema::ModuleSchema;
use crate::validation::{validate_positive, validation_error, Validatable};

pub const MODULE: &str = "forage-jdbc";
pub const NAMESPACE: &str = "forage.jdbc";

static SCHEMA: Lazy<Arc<ModuleSchema>> = Lazy::new(|| {
    ModuleSchema::builder(MODULE, NAMESPACE)
        .entry(
            ConfigEntry::of(MODULE, "forage.jdbc.url")
                .with_label("JDBC URL")
                .with_description("The JDBC connection URL")
                .required(),
        )
        .entry(
            ConfigEntry::of(MODULE, "forage.jdbc.db.kind")
                .with_label("Database Kind")
                .with_description("Database vendor, e.g. postgresql, mysql, h2")
                .with_default("postgresql"),
        )
        .entry(ConfigEntry::of(MODULE, "forage.jdbc.username").with_label("Username"))
        .entry(
            ConfigEntry::of(MODULE, "forage.jdbc.password")
                .with_label("Password")
                .with_type(EntryType::Password)
                .with_tag(EntryTag::Security),
        )
        .entry(
            ConfigEntry::of(MODULE, "forage.jdbc.pool.initial.size")
                .with_description("Connections opened when the pool starts")
                .with_type(EntryType::Int)
                .with_default("5"),
        )
        .entry(
            ConfigEntry::of(MODULE, "forage.jdbc.pool.min.size")
                .with_type(EntryType::Int)
                .with_default("2"),
        )
        .entry(
            ConfigEntry::of(MODULE, "forage.jdbc.pool.max.size")
                .with_type(EntryType::Int)
                .with_default("20"),
        )
        .entry(
            ConfigEntry::of(MODULE, "forage.jdbc.pool.acquisition.timeout.seconds")
                .with_description("Seconds to wait for a free connection")
                .with_type(EntryType::Int)
                .with_default("5")
                .with_tag(EntryTag::Advanced),
        )
        .entry(
            ConfigEntry::of(MODULE, "forage.jdbc.transaction.enabled")
                .with_type(EntryType::Boolean)
                .with_default("false"),
        )
        .entry(
            ConfigEntry::of(MODULE, "forage.jdbc.transaction.timeout.seconds")
                .with_type(EntryType::Int)
                .with_default("30")
                .with_tag(EntryTag::Advanced),
        )
        .build()
});

/// Schema shared by every JDBC datasource instance
pub fn schema() -> &'static Arc<ModuleSchema> {
    &SCHEMA
}

/// Configuration of one JDBC datasource
#[derive(Debug, Clone)]
pub struct JdbcConfig {
    config: ModuleConfig,
}

impl JdbcConfig {
    /// Default (unnamed) datasource from the process-wide context
    pub fn new() -> ConfigResult<Self> {
        Self::named(None)
    }

    /// Named datasource from the process-wide context
    pub fn named(prefix: Option<&str>) -> ConfigResult<Self> {
        Self::with_context(&ConfigContext::global(), prefix)
    }

    pub fn with_context(context: &Arc<ConfigContext>, prefix: Option<&str>) -> ConfigResult<Self> {
        Ok(Self {
            config: ModuleConfig::with_context(context, schema(), prefix)?,
        })
    }

    pub fn url(&self) -> ConfigResult<String> {
        self.config.required_string("url")
    }

    pub fn db_kind(&self) -> ConfigResult<String> {
        self.config.required_string("db.kind")
    }

    pub fn username(&self) -> ConfigResult<Option<String>> {
        self.config.string("username")
    }

    pub fn password(&self) -> ConfigResult<Option<String>> {
        self.config.string("password")
    }

    pub fn pool_initial_size(&self) -> ConfigResult<u32> {
        self.config.required("pool.initial.size")
    }

    pub fn pool_min_size(&self) -> ConfigResult<u32> {
        self.config.required("pool.min.size")
    }

    pub fn pool_max_size(&self) -> ConfigResult<u32> {
        self.config.required("pool.max.size")
    }

    pub fn pool_acquisition_timeout_seconds(&self) -> ConfigResult<u64> {
        self.config.required("pool.acquisition.timeout.seconds")
    }

    pub fn transaction_enabled(&self) -> ConfigResult<bool> {
        self.config.required_boolean("transaction.enabled")
    }

    pub fn transaction_timeout_seconds(&self) -> ConfigResult<u64> {
        self.config.required("transaction.timeout.seconds")
    }
}

impl Validatable for JdbcConfig {
    fn validate(&self) -> ConfigResult<()> {
        let url = self.url()?;
        if !url.starts_with("jdbc:") {
            return Err(validation_error(
                self.config.entry("url")?.name(),
                format!("must start with 'jdbc:', got '{}'", url),
            ));
        }

        let max = self.pool_max_size()?;
        validate_positive(max, self.config.entry("pool.max.size")?.name())?;

        let min = self.pool_min_size()?;
        if min > max {
            return Err(validation_error(
                self.config.entry("pool.min.size")?.name(),
                format!("must not exceed pool max size {}, got {}", max, min),
            ));
        }

        Ok(())
    }
}

impl Config for JdbcConfig {
    fn name(&self) -> &str {
        self.config.name()
    }

    fn register(&self, key: &str, value: &str) -> ConfigResult<()> {
        self.config.register(key, value)
    }
}

impl From<ModuleConfig> for JdbcConfig {
    fn from(config: ModuleConfig) -> Self {
        debug_assert_eq!(config.module(), MODULE);
        Self { config }
    }
}

impl AsRef<ModuleConfig> for JdbcConfig {
    fn as_ref(&self) -> &ModuleConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::source::EnvSource;
    use std::path::PathBuf;

    fn context(env: &[(&str, &str)]) -> Arc<ConfigContext> {
        Arc::new(
            ConfigContext::builder()
                .environment(EnvSource::from_vars(env.iter().copied()))
                .search_path(Vec::<PathBuf>::new())
                .build(),
        )
    }

    #[test]
    fn test_jdbc_defaults() {
        let config = JdbcConfig::with_context(&context(&[]), None).unwrap();
        assert_eq!(config.db_kind().unwrap(), "postgresql");
        assert_eq!(config.pool_initial_size().unwrap(), 5);
        assert_eq!(config.pool_min_size().unwrap(), 2);
        assert_eq!(config.pool_max_size().unwrap(), 20);
        assert!(!config.transaction_enabled().unwrap());
        assert_eq!(config.transaction_timeout_seconds().unwrap(), 30);
        assert!(config.username().unwrap().is_none());
    }

    #[test]
    fn test_default_and_named_datasources() {
        let context = context(&[("FORAGE_JDBC_URL", "jdbc:postgresql://host/db")]);

        let default = JdbcConfig::with_context(&context, None).unwrap();
        assert_eq!(default.url().unwrap(), "jdbc:postgresql://host/db");

        let named = JdbcConfig::with_context(&context, Some("ds1")).unwrap();
        match named.url() {
            Err(ConfigError::MissingConfiguration { key }) => assert_eq!(key, "ds1.forage.jdbc.url"),
            other => panic!("expected missing configuration, got {:?}", other),
        }
    }

    #[test]
    fn test_named_datasource_from_env() {
        let context = context(&[
            ("DS1_FORAGE_JDBC_URL", "jdbc:mysql://one/db"),
            ("DS1_FORAGE_JDBC_POOL_MAX_SIZE", "50"),
        ]);
        let named = JdbcConfig::with_context(&context, Some("ds1")).unwrap();
        assert_eq!(named.url().unwrap(), "jdbc:mysql://one/db");
        assert_eq!(named.pool_max_size().unwrap(), 50);
    }

    #[test]
    fn test_validation() {
        let valid = JdbcConfig::with_context(&context(&[("FORAGE_JDBC_URL", "jdbc:h2:mem:test")]), None).unwrap();
        assert!(valid.validate().is_ok());

        let bad_url = JdbcConfig::with_context(&context(&[("FORAGE_JDBC_URL", "postgres://x")]), None).unwrap();
        assert!(matches!(bad_url.validate(), Err(ConfigError::Validation { .. })));

        let bad_pool = JdbcConfig::with_context(
            &context(&[
                ("FORAGE_JDBC_URL", "jdbc:h2:mem:test"),
                ("FORAGE_JDBC_POOL_MIN_SIZE", "30"),
            ]),
            None,
        )
        .unwrap();
        let err = bad_pool.validate().unwrap_err();
        assert_eq!(err.key(), Some("forage.jdbc.pool.min.size"));
    }

    #[test]
    fn test_password_is_masked_in_snapshot() {
        let context = context(&[("FORAGE_JDBC_PASSWORD", "s3cret")]);
        let config = JdbcConfig::with_context(&context, None).unwrap();
        assert_eq!(config.password().unwrap().as_deref(), Some("s3cret"));
        let snapshot = config.as_ref().snapshot();
        assert_eq!(snapshot["forage.jdbc.password"].as_deref(), Some(crate::facade::MASK));
    }
}
