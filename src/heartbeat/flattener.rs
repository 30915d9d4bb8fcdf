//! Union-schema flattening of a single heartbeat
//!
//! Interactions and events have different shapes. Each is kept as its own variant
//! ([`HeartbeatRecord`]) and only projected onto the shared column set when rows are
//! produced, with nulls for the columns that belong to the other variant.

use serde::{Deserialize, Serialize};

use super::types::{Heartbeat, HeartbeatRecord, RecordKind};
use crate::error::FlattenError;
use crate::table::{Row, Schema, Table, Value};

/// Fields an interaction can populate
pub const INTERACTION_FIELDS: [&str; 4] = ["index", "interactionType", "value", "time"];

/// Fields an event can populate
pub const EVENT_FIELDS: [&str; 6] = ["type", "action", "time", "itemId", "from", "to"];

/// Explicit column descriptor for flattened heartbeat rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatSchema {
    /// Name of the column holding "interaction" or "event"
    pub discriminator: String,
    pub interaction_fields: Vec<String>,
    pub event_fields: Vec<String>,
}

impl Default for HeartbeatSchema {
    fn default() -> Self {
        Self {
            discriminator: "kind".to_string(),
            interaction_fields: INTERACTION_FIELDS.iter().map(|s| s.to_string()).collect(),
            event_fields: EVENT_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl HeartbeatSchema {
    /// Check that every declared field exists on its variant
    pub fn validate(&self) -> Result<(), FlattenError> {
        if self.discriminator.is_empty() {
            return Err(FlattenError::schema(
                "heartbeat schema",
                "discriminator column name is empty",
            ));
        }

        let checks = [
            ("interaction", &self.interaction_fields, &INTERACTION_FIELDS[..]),
            ("event", &self.event_fields, &EVENT_FIELDS[..]),
        ];
        for (variant, declared, known) in checks {
            for field in declared.iter() {
                if !known.contains(&field.as_str()) {
                    return Err(FlattenError::schema(
                        "heartbeat schema",
                        format!("{} has no field `{}`", variant, field),
                    ));
                }
                if *field == self.discriminator {
                    return Err(FlattenError::schema(
                        "heartbeat schema",
                        format!("field `{}` collides with the discriminator", field),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Discriminator, then interaction fields, then event fields not already present
    pub fn columns(&self) -> Schema {
        let mut schema = Schema::new([self.discriminator.as_str()]);
        for field in self.interaction_fields.iter().chain(&self.event_fields) {
            schema.push_unique(field);
        }
        schema
    }

    fn declares(&self, kind: RecordKind, column: &str) -> bool {
        let fields = match kind {
            RecordKind::Interaction => &self.interaction_fields,
            RecordKind::Event => &self.event_fields,
        };
        fields.iter().any(|f| f == column)
    }

    /// Project one record onto `columns`, normally the result of [`Self::columns`]
    pub fn project(&self, columns: &Schema, record: &HeartbeatRecord<'_>) -> Row {
        let kind = record.kind();
        let cells = columns
            .columns()
            .iter()
            .map(|column| {
                if *column == self.discriminator {
                    Value::from(kind.as_str())
                } else if self.declares(kind, column) {
                    record.field(column).unwrap_or_default()
                } else {
                    Value::Null
                }
            })
            .collect();
        Row(cells)
    }
}

/// Flattens a heartbeat into union-schema rows.
///
/// Row order groups by kind: every interaction in source order, then every event in
/// source order.
#[derive(Debug, Clone, Default)]
pub struct HeartbeatFlattener {
    schema: HeartbeatSchema,
}

impl HeartbeatFlattener {
    pub fn new(schema: HeartbeatSchema) -> Result<Self, FlattenError> {
        schema.validate()?;
        Ok(Self { schema })
    }

    pub fn schema(&self) -> &HeartbeatSchema {
        &self.schema
    }

    pub fn columns(&self) -> Schema {
        self.schema.columns()
    }

    /// Typed records in output order
    pub fn records<'a>(
        &self,
        heartbeat: &'a Heartbeat,
    ) -> impl Iterator<Item = HeartbeatRecord<'a>> + 'a {
        let interactions =
            heartbeat
                .interactions
                .iter()
                .enumerate()
                .map(|(position, interaction)| HeartbeatRecord::Interaction {
                    index: interaction.index.unwrap_or(position as i64),
                    interaction,
                });
        let events = heartbeat.events.iter().map(HeartbeatRecord::Event);
        interactions.chain(events)
    }

    pub fn flatten(&self, heartbeat: &Heartbeat) -> Vec<Row> {
        let columns = self.schema.columns();
        self.records(heartbeat)
            .map(|record| self.schema.project(&columns, &record))
            .collect()
    }

    pub fn flatten_table(&self, heartbeat: &Heartbeat) -> Result<Table, FlattenError> {
        let mut table = Table::new(self.columns());
        for row in self.flatten(heartbeat) {
            table.push(row)?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn heartbeat() -> Heartbeat {
        serde_json::from_str(
            r#"{
                "interactions": [
                    {"interactionType": "select", "value": "A", "time": 10},
                    {"index": 9, "interactionType": "select", "value": "C", "time": 12}
                ],
                "events": [
                    {"type": "item", "action": "answer", "time": 13, "itemId": "Q1",
                     "value": {"from": "A", "to": "C"}},
                    {"type": "item", "action": "flag", "time": 14, "itemId": "Q2",
                     "value": {"from": "none"}},
                    {"type": "test", "action": "pause", "time": 15, "itemId": "Q2"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_project_onto_given_columns() {
        let hb = heartbeat();
        let schema = HeartbeatSchema::default();
        let columns = Schema::new(["action", "kind", "interactionType"]);

        let row = schema.project(&columns, &HeartbeatRecord::Event(&hb.events[0]));
        assert_eq!(
            row.cells(),
            &[Value::from("answer"), Value::from("event"), Value::Null]
        );

        let full = schema.columns();
        let flattened = HeartbeatFlattener::default().flatten(&hb);
        assert!(flattened.iter().all(|r| r.len() == full.len()));
    }

    #[test]
    fn test_default_columns() {
        let columns = HeartbeatFlattener::default().columns();
        assert_eq!(
            columns.columns(),
            &[
                "kind",
                "index",
                "interactionType",
                "value",
                "time",
                "type",
                "action",
                "itemId",
                "from",
                "to"
            ]
        );
    }

    #[test]
    fn test_rows_grouped_by_kind() {
        let table = HeartbeatFlattener::default()
            .flatten_table(&heartbeat())
            .unwrap();

        let kinds: Vec<_> = table
            .column("kind")
            .unwrap()
            .into_iter()
            .map(|v| v.to_text())
            .collect();
        assert_eq!(
            kinds,
            vec!["interaction", "interaction", "event", "event", "event"]
        );
        assert!(table.rows().iter().all(|r| r.len() == table.schema().len()));
    }

    #[test]
    fn test_other_variant_fields_are_null() {
        let table = HeartbeatFlattener::default()
            .flatten_table(&heartbeat())
            .unwrap();

        // interaction row
        assert_eq!(table.get(0, "index"), Some(&Value::Int(0)));
        assert_eq!(table.get(0, "time"), Some(&Value::Int(10)));
        assert_eq!(table.get(0, "itemId"), Some(&Value::Null));
        assert_eq!(table.get(0, "from"), Some(&Value::Null));
        assert_eq!(table.get(1, "index"), Some(&Value::Int(9)));

        // event row
        assert_eq!(table.get(2, "index"), Some(&Value::Null));
        assert_eq!(table.get(2, "value"), Some(&Value::Null));
        assert_eq!(table.get(2, "time"), Some(&Value::Int(13)));
        assert_eq!(table.get(2, "from"), Some(&Value::from("A")));
        assert_eq!(table.get(2, "to"), Some(&Value::from("C")));
    }

    #[test]
    fn test_partial_and_missing_transitions() {
        let table = HeartbeatFlattener::default()
            .flatten_table(&heartbeat())
            .unwrap();

        assert_eq!(table.get(3, "from"), Some(&Value::from("none")));
        assert_eq!(table.get(3, "to"), Some(&Value::Null));
        assert_eq!(table.get(4, "from"), Some(&Value::Null));
        assert_eq!(table.get(4, "to"), Some(&Value::Null));
    }

    #[test]
    fn test_schema_rejects_unknown_field() {
        let schema = HeartbeatSchema {
            event_fields: vec!["type".to_string(), "interactionType".to_string()],
            ..HeartbeatSchema::default()
        };
        assert!(matches!(
            HeartbeatFlattener::new(schema),
            Err(FlattenError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_custom_schema_subset() {
        let schema = HeartbeatSchema {
            discriminator: "record".to_string(),
            interaction_fields: vec!["time".to_string(), "value".to_string()],
            event_fields: vec!["time".to_string(), "action".to_string()],
        };
        let flattener = HeartbeatFlattener::new(schema).unwrap();
        let table = flattener.flatten_table(&heartbeat()).unwrap();

        assert_eq!(table.schema().columns(), &["record", "time", "value", "action"]);
        assert_eq!(table.get(4, "action"), Some(&Value::from("pause")));
        assert_eq!(table.get(4, "value"), Some(&Value::Null));
    }
}
