//! Flattening configuration
//!
//! Every schema descriptor the core needs (tag patterns, lookup chains, column
//! names) is carried here and passed down explicitly.

use serde::{Deserialize, Serialize};

use crate::adapters::SessionLayout;
use crate::error::FlattenError;
use crate::heartbeat::{HeartbeatSchema, DEFAULT_SEQUENCE_COLUMN};
use crate::tree::DEFAULT_MAX_DEPTH;

/// What to do with a matched record whose structural lookup fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupPolicy {
    /// Abort the whole batch
    #[default]
    FailFast,
    /// Drop the record and log a warning
    Skip,
}

/// Markup (customer event) extraction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Local tag names from beneath the document root down to the event element
    pub event_pattern: Vec<String>,
    /// Steps from the record anchor to the element holding the name values
    pub name_chain: Vec<String>,
    pub first_name_column: String,
    pub last_name_column: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            event_pattern: vec![
                "CustomerRecord".to_string(),
                "CustomerEventData".to_string(),
                "TestSessionEvent".to_string(),
            ],
            name_chain: vec!["CustomerResultData".to_string(), "CustomerName".to_string()],
            first_name_column: "FirstName".to_string(),
            last_name_column: "LastName".to_string(),
        }
    }
}

/// Session document settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    #[serde(flatten)]
    pub layout: SessionLayout,
    pub sequence_column: String,
    pub heartbeat: HeartbeatSchema,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            layout: SessionLayout::default(),
            sequence_column: DEFAULT_SEQUENCE_COLUMN.to_string(),
            heartbeat: HeartbeatSchema::default(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenConfig {
    pub max_depth: usize,
    pub lookup_policy: LookupPolicy,
    pub markup: MarkupConfig,
    pub sessions: SessionConfig,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            lookup_policy: LookupPolicy::default(),
            markup: MarkupConfig::default(),
            sessions: SessionConfig::default(),
        }
    }
}

impl FlattenConfig {
    /// Parse and validate a JSON configuration document; omitted keys take defaults
    pub fn from_json(json: &str) -> Result<Self, FlattenError> {
        let config: FlattenConfig =
            serde_json::from_str(json).map_err(|e| FlattenError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, FlattenError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), FlattenError> {
        if self.max_depth == 0 {
            return Err(FlattenError::Config("max_depth must be at least 1".to_string()));
        }
        if self.markup.first_name_column == self.markup.last_name_column {
            return Err(FlattenError::Config(
                "first and last name columns must differ".to_string(),
            ));
        }
        if self.sessions.sequence_column.is_empty() {
            return Err(FlattenError::Config(
                "sequence_column must not be empty".to_string(),
            ));
        }
        self.sessions
            .heartbeat
            .validate()
            .map_err(|e| FlattenError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_takes_defaults() {
        let config = FlattenConfig::from_json(
            r#"{"lookup_policy": "skip", "sessions": {"collection_field": "heartbeat"}}"#,
        )
        .unwrap();

        assert_eq!(config.lookup_policy, LookupPolicy::Skip);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.sessions.layout.collection_field, "heartbeat");
        assert_eq!(config.sessions.layout.sessions_field, "sessions");
        assert_eq!(config.markup.event_pattern.len(), 3);
    }

    #[test]
    fn test_round_trip_defaults() {
        let json = FlattenConfig::default().to_json().unwrap();
        assert_eq!(FlattenConfig::from_json(&json).unwrap(), FlattenConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            FlattenConfig::from_json(r#"{"max_depth": 0}"#),
            Err(FlattenError::Config(_))
        ));
        assert!(matches!(
            FlattenConfig::from_json(r#"{"lookup_policy": "retry"}"#),
            Err(FlattenError::Config(_))
        ));
        assert!(matches!(
            FlattenConfig::from_json(
                r#"{"sessions": {"heartbeat": {"event_fields": ["bogus"]}}}"#
            ),
            Err(FlattenError::Config(_))
        ));
    }
}
