//! Customer test-session events from a markup tree
//!
//! Every element whose chain below the document root matches the configured event
//! pattern becomes one row. Rows are prefixed with the customer's first and last
//! name, which live elsewhere in the same customer record and are fetched through a
//! [`RecordJoiner`]. Event fields differ between records, so the event columns are
//! the union of field names in first-seen order with nulls where a record lacks one.

use tracing::{debug, warn};

use crate::config::{LookupPolicy, MarkupConfig};
use crate::error::FlattenError;
use crate::table::{Row, Schema, Table, Value};
use crate::tree::{LeafFields, LeafRecord, LookupChain, MatchPath, Node, RecordJoiner, TreeWalker};

/// Extracts customer event rows from a parsed markup tree
#[derive(Debug, Clone)]
pub struct CustomerEvents {
    config: MarkupConfig,
    joiner: RecordJoiner,
    policy: LookupPolicy,
    max_depth: usize,
}

impl CustomerEvents {
    pub fn new(config: MarkupConfig, policy: LookupPolicy, max_depth: usize) -> Self {
        let joiner = RecordJoiner::new(LookupChain::new(config.name_chain.iter().cloned()), 2);
        Self {
            config,
            joiner,
            policy,
            max_depth,
        }
    }

    pub fn config(&self) -> &MarkupConfig {
        &self.config
    }

    /// A record naming the same field twice cannot map onto one column per name
    fn check_fields(record: &LeafRecord<'_>) -> Result<(), FlattenError> {
        match record.fields.duplicate_name() {
            Some(name) => Err(FlattenError::schema(
                record.path.to_string(),
                format!("field `{}` occurs more than once", name),
            )),
            None => Ok(()),
        }
    }

    /// Every matched record with repeated fields or a failing sibling lookup, with the
    /// record's path
    pub fn validate(&self, root: &Node) -> Result<Vec<(String, FlattenError)>, FlattenError> {
        let mut failures = Vec::new();
        let walker = TreeWalker::with_max_depth(root, self.max_depth);
        for record in walker.matching(self.config.event_pattern.as_slice()) {
            let record = record?;
            let checked = Self::check_fields(&record).and_then(|()| self.joiner.join(&record));
            if let Err(e) = checked {
                failures.push((record.path.to_string(), e));
            }
        }
        Ok(failures)
    }

    /// Walk, filter and join the tree into a table
    pub fn extract(&self, root: &Node) -> Result<Table, FlattenError> {
        let mut joined: Vec<(Vec<Option<String>>, LeafFields)> = Vec::new();
        let mut skipped = 0usize;

        let walker = TreeWalker::with_max_depth(root, self.max_depth);
        for record in walker.matching(self.config.event_pattern.as_slice()) {
            let record = record?;
            Self::check_fields(&record)?;
            match self.joiner.join(&record) {
                Ok(names) => joined.push((names, record.fields)),
                Err(e) if e.is_structural() && self.policy == LookupPolicy::Skip => {
                    warn!(path = %record.path, error = %e, "skipping record");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        debug!(rows = joined.len(), skipped, "matched customer events");

        let mut event_columns = Schema::default();
        for (_, fields) in &joined {
            for name in fields.names() {
                event_columns.push_unique(name);
            }
        }

        let mut schema = Schema::new([
            self.config.first_name_column.as_str(),
            self.config.last_name_column.as_str(),
        ]);
        for column in event_columns.columns() {
            if schema.index_of(column).is_some() {
                return Err(FlattenError::schema(
                    "customer event",
                    format!("field `{}` collides with a name column", column),
                ));
            }
        }
        schema.extend(&event_columns);

        let mut table = Table::new(schema);
        for (names, fields) in joined {
            let mut cells: Vec<Value> = names.into_iter().map(Value::from).collect();
            cells.extend(
                event_columns
                    .columns()
                    .iter()
                    .map(|column| Value::from(fields.get(column))),
            );
            table.push(Row(cells))?;
        }
        Ok(table)
    }
}

impl Default for CustomerEvents {
    fn default() -> Self {
        Self::new(
            MarkupConfig::default(),
            LookupPolicy::default(),
            crate::tree::DEFAULT_MAX_DEPTH,
        )
    }
}
