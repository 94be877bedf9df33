//! Chunk envelope
//!
//! A chunk is one self-contained unit of structured UI output. The `type`
//! tag names its shape ("TextBlock", "AggregatedCard", ...); every other
//! key is shape-specific and checked by the mapping contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shape tag of the standard error chunk
pub const ERROR_CHUNK_TYPE: &str = "ErrorBlock";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(rename = "type")]
    pub chunk_type: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkSeverity {
    Info,
    Warning,
    Error,
}

impl ChunkSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkSeverity::Info => "info",
            ChunkSeverity::Warning => "warning",
            ChunkSeverity::Error => "error",
        }
    }
}

impl Chunk {
    pub fn new(chunk_type: impl Into<String>) -> Self {
        Self {
            chunk_type: chunk_type.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The standard error chunk: fixed shape of severity, title, message
    pub fn error(
        severity: ChunkSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Chunk::new(ERROR_CHUNK_TYPE)
            .with("severity", severity.as_str())
            .with("title", title.into())
            .with("message", message.into())
    }

    pub fn is_error(&self) -> bool {
        self.chunk_type == ERROR_CHUNK_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chunk_flattens_fields() {
        let chunk = Chunk::new("TextBlock").with("content", "hello");
        assert_eq!(
            serde_json::to_value(&chunk).unwrap(),
            json!({"type": "TextBlock", "content": "hello"})
        );
    }

    #[test]
    fn test_chunk_deserializes_from_flat_object() {
        let chunk: Chunk = serde_json::from_value(json!({
            "type": "AggregatedCard",
            "title": "X",
            "sources": []
        }))
        .unwrap();
        assert_eq!(chunk.chunk_type, "AggregatedCard");
        assert_eq!(chunk.get("title"), Some(&json!("X")));
        assert!(chunk.get("type").is_none());
    }

    #[test]
    fn test_error_chunk_shape() {
        let chunk = Chunk::error(ChunkSeverity::Error, "Oops", "Bad chunk");
        assert!(chunk.is_error());
        assert_eq!(chunk.get("severity"), Some(&json!("error")));
        assert_eq!(chunk.fields.len(), 3);
    }
}
