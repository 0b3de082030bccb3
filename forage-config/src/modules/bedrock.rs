//! Amazon Bedrock chat model configuration

use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::context::ConfigContext;
use crate::entry::{ConfigEntry, EntryTag, EntryType};
use crate::error::ConfigResult;
use crate::facade::{Config, ModuleConfig};
use crate::schema::ModuleSchema;
use crate::validation::{validate_positive, validate_range, Validatable};

pub const MODULE: &str = "forage-model-bedrock";
pub const NAMESPACE: &str = "bedrock";

static SCHEMA: Lazy<Arc<ModuleSchema>> = Lazy::new(|| {
    ModuleSchema::builder(MODULE, NAMESPACE)
        .entry(
            ConfigEntry::of(MODULE, "bedrock.model.id")
                .with_label("Model ID")
                .with_description("Bedrock model identifier, e.g. anthropic.claude-3-haiku-20240307-v1:0")
                .required(),
        )
        .entry(
            ConfigEntry::of(MODULE, "bedrock.region")
                .with_label("AWS Region")
                .with_default("us-east-1"),
        )
        .entry(
            ConfigEntry::of(MODULE, "bedrock.access.key.id")
                .with_type(EntryType::Password)
                .with_tag(EntryTag::Security),
        )
        .entry(
            ConfigEntry::of(MODULE, "bedrock.secret.access.key")
                .with_type(EntryType::Password)
                .with_tag(EntryTag::Security),
        )
        .entry(
            ConfigEntry::of(MODULE, "bedrock.temperature")
                .with_description("Sampling temperature between 0.0 and 1.0")
                .with_type(EntryType::Double),
        )
        .entry(ConfigEntry::of(MODULE, "bedrock.max.tokens").with_type(EntryType::Int))
        .entry(
            ConfigEntry::of(MODULE, "bedrock.top.p")
                .with_type(EntryType::Double)
                .with_tag(EntryTag::Advanced),
        )
        .build()
});

pub fn schema() -> &'static Arc<ModuleSchema> {
    &SCHEMA
}

/// Configuration of one Bedrock chat model
#[derive(Debug, Clone)]
pub struct BedrockConfig {
    config: ModuleConfig,
}

impl BedrockConfig {
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

    pub fn model_id(&self) -> ConfigResult<String> {
        self.config.required_string("model.id")
    }

    pub fn region(&self) -> ConfigResult<String> {
        self.config.required_string("region")
    }

    pub fn access_key_id(&self) -> ConfigResult<Option<String>> {
        self.config.string("access.key.id")
    }

    pub fn secret_access_key(&self) -> ConfigResult<Option<String>> {
        self.config.string("secret.access.key")
    }

    pub fn temperature(&self) -> ConfigResult<Option<f64>> {
        self.config.double("temperature")
    }

    pub fn max_tokens(&self) -> ConfigResult<Option<u32>> {
        self.config.parse("max.tokens")
    }

    pub fn top_p(&self) -> ConfigResult<Option<f64>> {
        self.config.double("top.p")
    }
}

impl Validatable for BedrockConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.model_id()?;
        if let Some(temperature) = self.temperature()? {
            validate_range(temperature, 0.0, 1.0, self.config.entry("temperature")?.name())?;
        }
        if let Some(top_p) = self.top_p()? {
            validate_range(top_p, 0.0, 1.0, self.config.entry("top.p")?.name())?;
        }
        if let Some(max_tokens) = self.max_tokens()? {
            validate_positive(max_tokens, self.config.entry("max.tokens")?.name())?;
        }
        Ok(())
    }
}

impl Config for BedrockConfig {
    fn name(&self) -> &str {
        self.config.name()
    }

    fn register(&self, key: &str, value: &str) -> ConfigResult<()> {
        self.config.register(key, value)
    }
}

impl From<ModuleConfig> for BedrockConfig {
    fn from(config: ModuleConfig) -> Self {
        debug_assert_eq!(config.module(), MODULE);
        Self { config }
    }
}

impl AsRef<ModuleConfig> for BedrockConfig {
    fn as_ref(&self) -> &ModuleConfig {
        &self.config
    }
}
