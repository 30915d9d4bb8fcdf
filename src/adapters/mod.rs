//! Input document adapters
//!
//! This module provides adapters that parse raw document text at the boundary and
//! hand the flattening core a fully built structure. Malformed input is rejected
//! here, so the core never sees a partial tree.

mod markup;
mod sessions;

pub use markup::MarkupAdapter;
pub use sessions::{SessionAdapter, SessionLayout, ValidationResult};

use crate::error::FlattenError;

/// Trait for boundary document adapters
pub trait DocumentAdapter {
    /// Parsed structure handed to the core
    type Document;

    /// Parse raw text into a complete document
    fn parse(&self, raw: &str) -> Result<Self::Document, FlattenError>;
}
