//! Error types for treeflat

use thiserror::Error;

/// Errors that can occur while parsing or flattening a document
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("Structural lookup failed under <{anchor}>: missing child <{missing}>")]
    StructuralLookup { anchor: String, missing: String },

    #[error("Schema mismatch in {record}: {detail}")]
    SchemaMismatch { record: String, detail: String },

    #[error("Tree depth exceeds limit of {max_depth} at <{tag}>")]
    DepthExceeded { max_depth: usize, tag: String },

    #[error("Malformed markup: {0}")]
    Markup(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl FlattenError {
    pub(crate) fn schema(record: impl Into<String>, detail: impl Into<String>) -> Self {
        FlattenError::SchemaMismatch {
            record: record.into(),
            detail: detail.into(),
        }
    }

    /// Whether the error is a missing structural element, which the skip policy may tolerate
    pub fn is_structural(&self) -> bool {
        matches!(self, FlattenError::StructuralLookup { .. })
    }
}
