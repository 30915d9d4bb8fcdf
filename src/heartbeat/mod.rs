//! Heartbeat flattening
//!
//! Pipeline: Session JSON → SessionAdapter → [`HeartbeatFlattener`] (union rows per
//! heartbeat) → [`ExamineeJoiner`] (session metadata × rows) → Table

pub mod examinee;
pub mod flattener;
pub mod types;

pub use examinee::{ExamineeJoiner, DEFAULT_SEQUENCE_COLUMN};
pub use flattener::{HeartbeatFlattener, HeartbeatSchema, EVENT_FIELDS, INTERACTION_FIELDS};
pub use types::{
    Event, Heartbeat, HeartbeatRecord, Interaction, RecordKind, Session, ValueChange,
};
