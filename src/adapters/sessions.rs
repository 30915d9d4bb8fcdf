//! Session document adapter
//!
//! Parses the nested key/value form: a list of session objects, each with scalar
//! metadata and a heartbeat collection. Object key order is preserved, so metadata
//! columns follow the order the source declares them in.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::DocumentAdapter;
use crate::error::FlattenError;
use crate::heartbeat::{Heartbeat, Session};
use crate::table::Value;

/// Where sessions and their heartbeat collections live in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionLayout {
    /// Field of the root object holding the session list; a bare array root is also accepted
    pub sessions_field: String,
    /// Field of each session holding its heartbeat list
    pub collection_field: String,
}

impl Default for SessionLayout {
    fn default() -> Self {
        Self {
            sessions_field: "sessions".to_string(),
            collection_field: "heartbeats".to_string(),
        }
    }
}

/// A session that failed to convert
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub error: FlattenError,
}

/// JSON → `Vec<Session>` adapter
#[derive(Debug, Clone, Default)]
pub struct SessionAdapter {
    layout: SessionLayout,
}

impl SessionAdapter {
    pub fn new(layout: SessionLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SessionLayout {
        &self.layout
    }

    /// Convert an already parsed JSON document into sessions
    pub fn from_json_value(&self, root: JsonValue) -> Result<Vec<Session>, FlattenError> {
        self.session_list(root)?
            .into_iter()
            .enumerate()
            .map(|(idx, session)| self.session(idx, session))
            .collect()
    }

    /// Check every session independently, collecting all failures instead of stopping at the first
    pub fn validate(&self, raw: &str) -> Result<Vec<ValidationResult>, FlattenError> {
        let root: JsonValue = serde_json::from_str(raw)?;
        let list = self.session_list(root)?;
        let total = list.len();
        let failures: Vec<ValidationResult> = list
            .into_iter()
            .enumerate()
            .filter_map(|(index, session)| {
                self.session(index, session)
                    .err()
                    .map(|error| ValidationResult { index, error })
            })
            .collect();
        debug!(total, invalid = failures.len(), "validated sessions");
        Ok(failures)
    }

    fn session_list(&self, root: JsonValue) -> Result<Vec<JsonValue>, FlattenError> {
        match root {
            JsonValue::Array(list) => Ok(list),
            JsonValue::Object(mut map) => match map.remove(&self.layout.sessions_field) {
                Some(JsonValue::Array(list)) => Ok(list),
                Some(_) => Err(FlattenError::schema(
                    "document",
                    format!("`{}` is not a list", self.layout.sessions_field),
                )),
                None => Err(FlattenError::schema(
                    "document",
                    format!("missing field `{}`", self.layout.sessions_field),
                )),
            },
            _ => Err(FlattenError::schema(
                "document",
                "root must be a list of sessions or an object holding one",
            )),
        }
    }

    fn session(&self, idx: usize, value: JsonValue) -> Result<Session, FlattenError> {
        let record = format!("session {}", idx);
        let JsonValue::Object(map) = value else {
            return Err(FlattenError::schema(record, "session is not an object"));
        };

        let (metadata, collection) = self.split_session(map);
        let collection = collection.ok_or_else(|| {
            FlattenError::schema(
                record.as_str(),
                format!("missing field `{}`", self.layout.collection_field),
            )
        })?;
        let JsonValue::Array(entries) = collection else {
            return Err(FlattenError::schema(
                record,
                format!("`{}` is not a list", self.layout.collection_field),
            ));
        };

        let heartbeats = entries
            .into_iter()
            .enumerate()
            .map(|(hb_idx, entry)| {
                serde_json::from_value::<Heartbeat>(entry).map_err(|e| {
                    FlattenError::schema(format!("{} heartbeat {}", record, hb_idx), e.to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Session {
            metadata,
            heartbeats,
        })
    }

    /// Separate the heartbeat collection from the scalar metadata
    fn split_session(
        &self,
        map: Map<String, JsonValue>,
    ) -> (Vec<(String, Value)>, Option<JsonValue>) {
        let mut metadata = Vec::with_capacity(map.len());
        let mut collection = None;
        for (key, value) in map {
            if key == self.layout.collection_field {
                collection = Some(value);
            } else {
                metadata.push((key, Value::from(value)));
            }
        }
        (metadata, collection)
    }
}

impl DocumentAdapter for SessionAdapter {
    type Document = Vec<Session>;

    fn parse(&self, raw: &str) -> Result<Vec<Session>, FlattenError> {
        let root: JsonValue = serde_json::from_str(raw)?;
        self.from_json_value(root)
    }
}
