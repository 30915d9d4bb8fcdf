//! Generic hierarchical tree flattening
//!
//! Pipeline: [`Node`] tree → [`TreeWalker`] (lazy path + leaf fields) →
//! [`PathFilter`] (exact ancestor chain) → [`RecordJoiner`] (sibling lookups).

mod filter;
mod join;
mod node;
mod path;
mod walker;

pub use filter::{MatchPath, PathFilter};
pub use join::{LookupChain, RecordJoiner};
pub use node::{local_name, Node};
pub use path::Path;
pub use walker::{LeafFields, LeafRecord, TreeWalker, DEFAULT_MAX_DEPTH};
