//! Session metadata × heartbeat rows

use tracing::{debug, warn};

use super::flattener::HeartbeatFlattener;
use super::types::Session;
use crate::error::FlattenError;
use crate::table::{Row, Schema, Table, Value};

/// Default name of the session sequence column
pub const DEFAULT_SEQUENCE_COLUMN: &str = "session";

/// Cross-joins each session's scalar metadata with its flattened heartbeat rows.
///
/// Output columns are the sequence number, the metadata columns (union across
/// sessions, first-seen order) and the heartbeat union columns. Only the first
/// heartbeat of a session is flattened; extra entries are logged and ignored.
#[derive(Debug, Clone)]
pub struct ExamineeJoiner {
    sequence_column: String,
    flattener: HeartbeatFlattener,
}

impl Default for ExamineeJoiner {
    fn default() -> Self {
        Self::new(DEFAULT_SEQUENCE_COLUMN, HeartbeatFlattener::default())
    }
}

impl ExamineeJoiner {
    pub fn new(sequence_column: impl Into<String>, flattener: HeartbeatFlattener) -> Self {
        Self {
            sequence_column: sequence_column.into(),
            flattener,
        }
    }

    pub fn flattener(&self) -> &HeartbeatFlattener {
        &self.flattener
    }

    /// Union of metadata field names in first-seen order
    pub fn metadata_columns(sessions: &[Session]) -> Schema {
        let mut schema = Schema::default();
        for session in sessions {
            for (name, _) in &session.metadata {
                schema.push_unique(name);
            }
        }
        schema
    }

    /// Full output column list for these sessions
    pub fn columns(&self, sessions: &[Session]) -> Result<Schema, FlattenError> {
        let metadata = Self::metadata_columns(sessions);
        let heartbeat = self.flattener.columns();

        for name in metadata.columns() {
            if *name == self.sequence_column || heartbeat.index_of(name).is_some() {
                return Err(FlattenError::schema(
                    "session metadata",
                    format!("field `{}` collides with an output column", name),
                ));
            }
        }
        if heartbeat.index_of(&self.sequence_column).is_some() {
            return Err(FlattenError::schema(
                "session metadata",
                format!(
                    "sequence column `{}` collides with a heartbeat column",
                    self.sequence_column
                ),
            ));
        }

        let mut schema = Schema::new([self.sequence_column.as_str()]);
        schema.extend(&metadata);
        schema.extend(&heartbeat);
        Ok(schema)
    }

    pub fn join(&self, sessions: &[Session]) -> Result<Table, FlattenError> {
        let schema = self.columns(sessions)?;
        let metadata_columns = Self::metadata_columns(sessions);
        let mut table = Table::new(schema);

        for (sequence, session) in sessions.iter().enumerate() {
            let Some(heartbeat) = session.first_heartbeat() else {
                warn!(session = sequence, "session has no heartbeat entry; no rows produced");
                continue;
            };
            if session.heartbeats.len() > 1 {
                warn!(
                    session = sequence,
                    ignored = session.heartbeats.len() - 1,
                    "only the first heartbeat entry is flattened"
                );
            }

            let mut prefix = Vec::with_capacity(metadata_columns.len() + 1);
            prefix.push(Value::from(sequence));
            prefix.extend(
                metadata_columns
                    .columns()
                    .iter()
                    .map(|name| session.metadata_value(name).cloned().unwrap_or_default()),
            );

            let rows = self.flattener.flatten(heartbeat);
            debug!(session = sequence, rows = rows.len(), "flattened heartbeat");
            for row in rows {
                let mut cells = prefix.clone();
                cells.extend(row.0);
                table.push(Row(cells))?;
            }
        }

        Ok(table)
    }
}
