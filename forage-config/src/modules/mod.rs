//! Built-in module configurations

pub mod bedrock;
pub mod jdbc;
pub mod ollama;
pub mod qdrant;

use std::sync::Arc;

use crate::schema::ModuleSchema;

pub use bedrock::BedrockConfig;
pub use jdbc::JdbcConfig;
pub use ollama::OllamaConfig;
pub use qdrant::QdrantConfig;

/// Schemas of every built-in module
pub fn schemas() -> [&'static Arc<ModuleSchema>; 4] {
    [jdbc::schema(), bedrock::schema(), ollama::schema(), qdrant::schema()]
}
