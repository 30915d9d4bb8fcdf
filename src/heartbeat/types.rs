//! Heartbeat data types
//!
//! These mirror the nested session document: each session carries scalar examinee
//! metadata and a heartbeat collection, and each heartbeat bundles two heterogeneous
//! lists (interactions and events).

use serde::{Deserialize, Serialize};

use crate::table::Value;

/// A timestamped examinee action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// Explicit index; when absent the position within the heartbeat is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    pub interaction_type: serde_json::Value,
    pub value: serde_json::Value,
    pub time: serde_json::Value,
}

/// A from/to transition carried by some events
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueChange {
    #[serde(default)]
    pub from: Option<serde_json::Value>,
    #[serde(default)]
    pub to: Option<serde_json::Value>,
}

/// A timestamped lifecycle record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: serde_json::Value,
    pub action: serde_json::Value,
    pub time: serde_json::Value,
    pub item_id: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ValueChange>,
}

/// One snapshot of an examinee's interactions and events
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Heartbeat {
    pub interactions: Vec<Interaction>,
    pub events: Vec<Event>,
}

/// One examinee session: ordered scalar metadata plus its heartbeat collection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub metadata: Vec<(String, Value)>,
    pub heartbeats: Vec<Heartbeat>,
}

impl Session {
    pub fn metadata_value(&self, name: &str) -> Option<&Value> {
        self.metadata
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// The heartbeat entry that is flattened; later entries are not consumed
    pub fn first_heartbeat(&self) -> Option<&Heartbeat> {
        self.heartbeats.first()
    }
}

/// Discriminator of a flattened heartbeat row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Interaction,
    Event,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Interaction => "interaction",
            RecordKind::Event => "event",
        }
    }
}

/// A heartbeat entry carrying only its own variant's fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeartbeatRecord<'a> {
    Interaction {
        index: i64,
        interaction: &'a Interaction,
    },
    Event(&'a Event),
}

impl HeartbeatRecord<'_> {
    pub fn kind(&self) -> RecordKind {
        match self {
            HeartbeatRecord::Interaction { .. } => RecordKind::Interaction,
            HeartbeatRecord::Event(_) => RecordKind::Event,
        }
    }

    /// Value of a named field of this variant, or None if the variant has no such field
    pub fn field(&self, name: &str) -> Option<Value> {
        match self {
            HeartbeatRecord::Interaction { index, interaction } => match name {
                "index" => Some(Value::Int(*index)),
                "interactionType" => Some(interaction.interaction_type.clone().into()),
                "value" => Some(interaction.value.clone().into()),
                "time" => Some(interaction.time.clone().into()),
                _ => None,
            },
            HeartbeatRecord::Event(event) => {
                let change = event.value.as_ref();
                match name {
                    "type" => Some(event.event_type.clone().into()),
                    "action" => Some(event.action.clone().into()),
                    "time" => Some(event.time.clone().into()),
                    "itemId" => Some(event.item_id.clone().into()),
                    "from" => Some(change.and_then(|c| c.from.clone()).into()),
                    "to" => Some(change.and_then(|c| c.to.clone()).into()),
                    _ => None,
                }
            }
        }
    }
}
