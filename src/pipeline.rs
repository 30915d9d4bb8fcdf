//! Pipeline orchestration
//!
//! This module provides the public API for treeflat. It wires the boundary
//! adapters to the flattening core for both supported document forms.

use tracing::debug;

use crate::adapters::{DocumentAdapter, MarkupAdapter, SessionAdapter, ValidationResult};
use crate::config::FlattenConfig;
use crate::customer::CustomerEvents;
use crate::error::FlattenError;
use crate::heartbeat::{ExamineeJoiner, HeartbeatFlattener, Session};
use crate::table::{Schema, Table};
use crate::tree::Node;

/// Flatten a session JSON document with default settings.
///
/// # Example
/// ```ignore
/// let table = sessions_to_table(r#"[{"id": 1, "heartbeats": []}]"#)?;
/// ```
pub fn sessions_to_table(json: &str) -> Result<Table, FlattenError> {
    FlattenProcessor::new().process_sessions(json)
}

/// Flatten a customer markup document with default settings.
///
/// # Example
/// ```ignore
/// let table = markup_to_table(xml)?;
/// ```
pub fn markup_to_table(xml: &str) -> Result<Table, FlattenError> {
    FlattenProcessor::new().process_markup(xml)
}

/// Configured processor for both document forms
#[derive(Debug, Clone, Default)]
pub struct FlattenProcessor {
    config: FlattenConfig,
}

impl FlattenProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor from a validated configuration
    pub fn with_config(config: FlattenConfig) -> Result<Self, FlattenError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    fn examinee_joiner(&self) -> Result<ExamineeJoiner, FlattenError> {
        let sessions = &self.config.sessions;
        let flattener = HeartbeatFlattener::new(sessions.heartbeat.clone())?;
        Ok(ExamineeJoiner::new(sessions.sequence_column.clone(), flattener))
    }

    fn customer_events(&self) -> CustomerEvents {
        CustomerEvents::new(
            self.config.markup.clone(),
            self.config.lookup_policy,
            self.config.max_depth,
        )
    }

    /// Parse a session document without flattening it
    pub fn parse_sessions(&self, json: &str) -> Result<Vec<Session>, FlattenError> {
        SessionAdapter::new(self.config.sessions.layout.clone()).parse(json)
    }

    /// Parse a markup document without flattening it
    pub fn parse_markup(&self, xml: &str) -> Result<Node, FlattenError> {
        MarkupAdapter::with_max_depth(self.config.max_depth).parse(xml)
    }

    /// Session JSON → examinee table
    pub fn process_sessions(&self, json: &str) -> Result<Table, FlattenError> {
        let sessions = self.parse_sessions(json)?;
        debug!(sessions = sessions.len(), "parsed session document");
        self.flatten_sessions(&sessions)
    }

    /// Already parsed sessions → examinee table
    pub fn flatten_sessions(&self, sessions: &[Session]) -> Result<Table, FlattenError> {
        let table = self.examinee_joiner()?.join(sessions)?;
        debug!(rows = table.len(), columns = table.schema().len(), "flattened sessions");
        Ok(table)
    }

    /// Markup text → customer event table
    pub fn process_markup(&self, xml: &str) -> Result<Table, FlattenError> {
        let root = self.parse_markup(xml)?;
        self.flatten_markup(&root)
    }

    /// Already parsed markup tree → customer event table
    pub fn flatten_markup(&self, root: &Node) -> Result<Table, FlattenError> {
        let table = self.customer_events().extract(root)?;
        debug!(rows = table.len(), columns = table.schema().len(), "flattened markup");
        Ok(table)
    }

    /// Per-session problems in a session document
    pub fn validate_sessions(&self, json: &str) -> Result<Vec<ValidationResult>, FlattenError> {
        SessionAdapter::new(self.config.sessions.layout.clone()).validate(json)
    }

    /// Matched markup records whose sibling lookup fails, keyed by path
    pub fn validate_markup(&self, xml: &str) -> Result<Vec<(String, FlattenError)>, FlattenError> {
        let root = self.parse_markup(xml)?;
        self.customer_events().validate(&root)
    }

    /// Columns a session table has before any metadata is known
    pub fn session_columns(&self) -> Result<Schema, FlattenError> {
        self.examinee_joiner()?.columns(&[])
    }
}
