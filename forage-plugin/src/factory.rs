//! Bean factory trait and metadata

use forage_config::{ModuleConfig, ModuleSchema};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::PluginResult;

/// A bean built by a factory; callers downcast to the concrete type
pub type Bean = Arc<dyn Any + Send + Sync>;

/// Kind of bean a factory produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactoryKind {
    /// Chat model or agent
    Agent,
    /// JDBC-style datasource
    DataSource,
    /// Messaging connection factory
    ConnectionFactory,
    /// Vector store client
    VectorStore,
}

impl fmt::Display for FactoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent => write!(f, "agent"),
            Self::DataSource => write!(f, "datasource"),
            Self::ConnectionFactory => write!(f, "connectionfactory"),
            Self::VectorStore => write!(f, "vectorstore"),
        }
    }
}

/// Factory metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryMetadata {
    /// Unique factory identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Bean kind
    pub kind: FactoryKind,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FactoryMetadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: FactoryKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Builds beans of one kind from a module configuration
///
/// The registrar constructs the [`ModuleConfig`] for each instance (default or
/// named) against [`BeanFactory::schema`] and hands it to [`BeanFactory::create`].
pub trait BeanFactory: Send + Sync {
    fn metadata(&self) -> &FactoryMetadata;

    /// Schema of the module this factory reads
    fn schema(&self) -> &Arc<ModuleSchema>;

    /// Build one bean from a resolved configuration
    fn create(&self, config: &ModuleConfig) -> PluginResult<Bean>;
}

/// Static factory registration collected by `inventory`
pub struct FactoryRegistration {
    constructor: fn() -> Box<dyn BeanFactory>,
}

impl FactoryRegistration {
    pub const fn new(constructor: fn() -> Box<dyn BeanFactory>) -> Self {
        Self { constructor }
    }

    /// Instantiate the registered factory
    pub fn factory(&self) -> Box<dyn BeanFactory> {
        (self.constructor)()
    }
}

inventory::collect!(FactoryRegistration);
