//! Configuration resolution for Forage modules
//!
//! Every module declares a [`ModuleSchema`] of [`ConfigEntry`] descriptors.
//! A [`ModuleConfig`] facade resolves those entries for one instance, either
//! the default one or a named one (`ds1.forage.jdbc.url`), from the process
//! environment, system properties, the module's properties file and the
//! declared defaults, in that order. Instance prefixes can be discovered from
//! the same sources with [`read_prefixes`].

pub mod context;
pub mod discovery;
pub mod entry;
pub mod error;
pub mod facade;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod source;
pub mod validation;

// Built-in module configurations
pub mod modules;

// Re-export main types
pub use context::{ConfigContext, ConfigContextBuilder, CONFIG_PATH_ENV};
pub use discovery::{read_prefixes, PrefixPattern};
pub use entry::{ConfigEntry, EntryTag, EntryType};
pub use error::{ConfigError, ConfigResult};
pub use facade::{Config, ModuleConfig};
pub use registry::EntryRegistry;
pub use resolver::{Resolved, SourceResolver};
pub use schema::{ModuleSchema, UnknownKeyPolicy};
pub use source::{EnvSource, Properties, PropertySource, SourceKind, SystemProperties};
pub use validation::Validatable;

pub use modules::{BedrockConfig, JdbcConfig, OllamaConfig, QdrantConfig};
