//! Ollama chat model configuration

use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::context::ConfigContext;
use crate::entry::{ConfigEntry, EntryTag, EntryType};
use crate::error::ConfigResult;
use crate::facade::{Config, ModuleConfig};
use crate::schema::ModuleSchema;
use crate::validation::{validate_http_url, validate_positive, validate_range, Validatable};

pub const MODULE: &str = "forage-model-ollama";
pub const NAMESPACE: &str = "ollama";

static SCHEMA: Lazy<Arc<ModuleSchema>> = Lazy::new(|| {
    ModuleSchema::builder(MODULE, NAMESPACE)
        .entry(
            ConfigEntry::of(MODULE, "ollama.base.url")
                .with_label("Base URL")
                .with_description("Ollama server endpoint")
                .with_default("http://localhost:11434"),
        )
        .entry(
            ConfigEntry::of(MODULE, "ollama.model.name")
                .with_label("Model")
                .with_default("llama3"),
        )
        .entry(ConfigEntry::of(MODULE, "ollama.temperature").with_type(EntryType::Double))
        .entry(ConfigEntry::of(MODULE, "ollama.top.k").with_type(EntryType::Int))
        .entry(ConfigEntry::of(MODULE, "ollama.top.p").with_type(EntryType::Double))
        .entry(
            ConfigEntry::of(MODULE, "ollama.num.ctx")
                .with_description("Context window size in tokens")
                .with_type(EntryType::Int)
                .with_tag(EntryTag::Advanced),
        )
        .entry(
            ConfigEntry::of(MODULE, "ollama.format")
                .with_description("Response format, e.g. json")
                .with_tag(EntryTag::Advanced),
        )
        .entry(
            ConfigEntry::of(MODULE, "ollama.log.requests")
                .with_type(EntryType::Boolean)
                .with_default("false"),
        )
        .entry(
            ConfigEntry::of(MODULE, "ollama.log.responses")
                .with_type(EntryType::Boolean)
                .with_default("false"),
        )
        .build()
});

pub fn schema() -> &'static Arc<ModuleSchema> {
    &SCHEMA
}

/// Configuration of one Ollama chat model
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    config: ModuleConfig,
}

impl OllamaConfig {
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

    pub fn base_url(&self) -> ConfigResult<String> {
        self.config.required_string("base.url")
    }

    pub fn model_name(&self) -> ConfigResult<String> {
        self.config.required_string("model.name")
    }

    pub fn temperature(&self) -> ConfigResult<Option<f64>> {
        self.config.double("temperature")
    }

    pub fn top_k(&self) -> ConfigResult<Option<u32>> {
        self.config.parse("top.k")
    }

    pub fn top_p(&self) -> ConfigResult<Option<f64>> {
        self.config.double("top.p")
    }

    pub fn num_ctx(&self) -> ConfigResult<Option<u32>> {
        self.config.parse("num.ctx")
    }

    pub fn format(&self) -> ConfigResult<Option<String>> {
        self.config.string("format")
    }

    pub fn log_requests(&self) -> ConfigResult<bool> {
        self.config.required_boolean("log.requests")
    }

    pub fn log_responses(&self) -> ConfigResult<bool> {
        self.config.required_boolean("log.responses")
    }
}

impl Validatable for OllamaConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_http_url(&self.base_url()?, self.config.entry("base.url")?.name())?;
        if let Some(temperature) = self.temperature()? {
            validate_range(temperature, 0.0, 2.0, self.config.entry("temperature")?.name())?;
        }
        if let Some(top_k) = self.top_k()? {
            validate_positive(top_k, self.config.entry("top.k")?.name())?;
        }
        Ok(())
    }
}

impl Config for OllamaConfig {
    fn name(&self) -> &str {
        self.config.name()
    }

    fn register(&self, key: &str, value: &str) -> ConfigResult<()> {
        self.config.register(key, value)
    }
}

impl From<ModuleConfig> for OllamaConfig {
    fn from(config: ModuleConfig) -> Self {
        debug_assert_eq!(config.module(), MODULE);
        Self { config }
    }
}

impl AsRef<ModuleConfig> for OllamaConfig {
    fn as_ref(&self) -> &ModuleConfig {
        &self.config
    }
}
