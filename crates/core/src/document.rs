//! Knowledge retrieval documents

use serde::{Deserialize, Serialize};

/// A document returned by the knowledge retriever
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier
    pub id: String,

    /// Retrieved text content
    pub content: String,

    /// Relevance score assigned by the retriever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Retriever-specific metadata (source, chunk offsets, etc.)
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl Document {
    /// Create a new document
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            score: None,
            metadata: serde_json::Value::Null,
        }
    }

    /// Set the relevance score
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_serde() {
        let doc = Document::new("doc-1", "some passage").with_score(0.87);
        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
