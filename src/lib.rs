//! treeflat - Flatten hierarchical assessment documents into tabular row sets
//!
//! treeflat turns two semi-structured document forms into fixed-schema tables
//! through a deterministic pipeline: boundary adaptation → tree traversal → path
//! filtering → structural joins → union-schema projection.
//!
//! ## Modules
//!
//! - **Tree**: generic lazy walker, exact path filter and sibling lookups over any
//!   rooted node tree
//! - **Customer events**: markup records joined with their customer's name block
//! - **Heartbeat**: interactions and events flattened per session and joined with
//!   examinee metadata

pub mod adapters;
pub mod config;
pub mod customer;
pub mod error;
pub mod heartbeat;
pub mod pipeline;
pub mod table;
pub mod tree;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{FlattenConfig, LookupPolicy};
pub use error::FlattenError;
pub use pipeline::{markup_to_table, sessions_to_table, FlattenProcessor};
pub use table::{Row, Schema, Table, Value};

/// Crate version embedded in table documents
pub const TREEFLAT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for table documents
pub const PRODUCER_NAME: &str = "treeflat";
