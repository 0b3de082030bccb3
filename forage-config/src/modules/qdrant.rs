//! Qdrant vector store configuration

use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::context::ConfigContext;
use crate::entry::{ConfigEntry, EntryTag, EntryType};
use crate::error::ConfigResult;
use crate::facade::{Config, ModuleConfig};
use crate::schema::{ModuleSchema, UnknownKeyPolicy};
use crate::validation::{validate_positive, validate_required_string, Validatable};

pub const MODULE: &str = "forage-vectordb-qdrant";
pub const NAMESPACE: &str = "qdrant";

// Unknown keys in the properties file are errors for this module.
static SCHEMA: Lazy<Arc<ModuleSchema>> = Lazy::new(|| {
    ModuleSchema::builder(MODULE, NAMESPACE)
        .entry(
            ConfigEntry::of(MODULE, "qdrant.collection.name")
                .with_label("Collection")
                .required(),
        )
        .entry(ConfigEntry::of(MODULE, "qdrant.host").with_default("localhost"))
        .entry(
            ConfigEntry::of(MODULE, "qdrant.port")
                .with_description("gRPC port")
                .with_type(EntryType::Int)
                .with_default("6334"),
        )
        .entry(
            ConfigEntry::of(MODULE, "qdrant.use.tls")
                .with_type(EntryType::Boolean)
                .with_default("false"),
        )
        .entry(
            ConfigEntry::of(MODULE, "qdrant.api.key")
                .with_type(EntryType::Password)
                .with_tag(EntryTag::Security),
        )
        .entry(
            ConfigEntry::of(MODULE, "qdrant.timeout.seconds")
                .with_type(EntryType::Int)
                .with_default("5")
                .with_tag(EntryTag::Advanced),
        )
        .unknown_keys(UnknownKeyPolicy::Reject)
        .build()
});

pub fn schema() -> &'static Arc<ModuleSchema> {
    &SCHEMA
}

/// Configuration of one Qdrant collection client
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    config: ModuleConfig,
}

impl QdrantConfig {
    pub fn new() -> ConfigResult<Self> {
        Self::named(None)
    }

    pub fn named(prefix: Option<&str>) -> ConfigResult<Self> {
        Self::with_context(&ConfigContext::global(), prefix)
    }

    pub fn with_context(context: &Arc<ConfigContext>, prefix: Option<&str>) -> ConfigResult<Self> {
        Ok(Self {
            config: ModuleConfig::with_context(context, schema(), prefix)?,
        })
    }

    pub fn collection_name(&self) -> ConfigResult<String> {
        self.config.required_string("collection.name")
    }

    pub fn host(&self) -> ConfigResult<String> {
        self.config.required_string("host")
    }

    pub fn port(&self) -> ConfigResult<u16> {
        self.config.required("port")
    }

    pub fn use_tls(&self) -> ConfigResult<bool> {
        self.config.required_boolean("use.tls")
    }

    pub fn api_key(&self) -> ConfigResult<Option<String>> {
        self.config.string("api.key")
    }

    pub fn timeout_seconds(&self) -> ConfigResult<u64> {
        self.config.required("timeout.seconds")
    }
}

impl Validatable for QdrantConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.collection_name()?, self.config.entry("collection.name")?.name())?;
        validate_required_string(&self.host()?, self.config.entry("host")?.name())?;
        validate_positive(self.port()?, self.config.entry("port")?.name())?;
        Ok(())
    }
}

impl Config for QdrantConfig {
    fn name(&self) -> &str {
        self.config.name()
    }

    fn register(&self, key: &str, value: &str) -> ConfigResult<()> {
        self.config.register(key, value)
    }
}

impl From<ModuleConfig> for QdrantConfig {
    fn from(config: ModuleConfig) -> Self {
        debug_assert_eq!(config.module(), MODULE);
        Self { config }
    }
}

impl AsRef<ModuleConfig> for QdrantConfig {
    fn as_ref(&self) -> &ModuleConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::source::EnvSource;

    fn fixture(file: &str) -> (Arc<ConfigContext>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("forage-vectordb-qdrant.properties"), file).unwrap();
        let context = ConfigContext::builder()
            .environment(EnvSource::from_vars([("QDRANT_PORT", "6333")]))
            .search_dir(dir.path())
            .build();
        (Arc::new(context), dir)
    }

    #[test]
    fn test_qdrant_values() {
        let (context, _dir) = fixture("qdrant.collection.name=docs\nqdrant.host=vectors.internal\n");
        let config = QdrantConfig::with_context(&context, None).unwrap();

        assert_eq!(config.collection_name().unwrap(), "docs");
        assert_eq!(config.host().unwrap(), "vectors.internal");
        assert_eq!(config.port().unwrap(), 6333);
        assert!(!config.use_tls().unwrap());
        assert_eq!(config.timeout_seconds().unwrap(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let (context, _dir) = fixture("qdrant.colection.name=docs\n");
        let err = QdrantConfig::with_context(&context, None).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProperty { ref key, .. } if key == "qdrant.colection.name"));
    }

    #[test]
    fn test_port_out_of_range() {
        let (context, _dir) = fixture("qdrant.collection.name=docs\n");
        context.system_properties().set("qdrant.port", "70000");
        // environment still wins over the system property
        let config = QdrantConfig::with_context(&context, None).unwrap();
        assert_eq!(config.port().unwrap(), 6333);

        let (context, _dir) = fixture("store1.qdrant.collection.name=docs\nstore1.qdrant.port=70000\n");
        let store1 = QdrantConfig::with_context(&context, Some("store1")).unwrap();
        assert!(matches!(store1.port(), Err(ConfigError::InvalidValue { .. })));
    }
}
