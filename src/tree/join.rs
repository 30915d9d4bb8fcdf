//! Secondary structural lookups for matched records
//!
//! A matched record only carries its own leaf fields. Sibling data (for example the
//! name block of the record that owns an event) is fetched by anchoring at the top of
//! the matched chain and descending a fixed [`LookupChain`].

use super::node::Node;
use super::path::Path;
use super::walker::LeafRecord;
use crate::error::FlattenError;

/// Ordered "first child with this local name" steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupChain {
    steps: Vec<String>,
}

impl LookupChain {
    pub fn new<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: steps.into_iter().map(Into::into).collect(),
        }
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Follow every step from `anchor`; a missing child is a structural error
    pub fn resolve<'a>(&self, anchor: &'a Node) -> Result<&'a Node, FlattenError> {
        self.steps.iter().try_fold(anchor, |node, step| {
            node.first_child(step)
                .ok_or_else(|| FlattenError::StructuralLookup {
                    anchor: node.local_name().to_string(),
                    missing: step.clone(),
                })
        })
    }
}

/// Joins a matched record with positional text values found under its anchor
#[derive(Debug, Clone)]
pub struct RecordJoiner {
    chain: LookupChain,
    arity: usize,
}

impl RecordJoiner {
    /// `arity` positional children are read from the node the chain resolves to
    pub fn new(chain: LookupChain, arity: usize) -> Self {
        Self { chain, arity }
    }

    pub fn chain(&self) -> &LookupChain {
        &self.chain
    }

    /// Top of the matched chain: the path element directly beneath the document root
    pub fn anchor<'a>(path: &Path<'a>) -> &'a Node {
        path.get(1).unwrap_or_else(|| path.first())
    }

    /// Sibling values for one record.
    ///
    /// A positional child that exists but has no text yields `None`; a child that does
    /// not exist at all is a [`FlattenError::StructuralLookup`].
    pub fn join(&self, record: &LeafRecord<'_>) -> Result<Vec<Option<String>>, FlattenError> {
        let target = self.chain.resolve(Self::anchor(&record.path))?;
        let children = target.children();

        (0..self.arity)
            .map(|position| {
                children
                    .get(position)
                    .map(|child| child.trimmed_text().map(str::to_string))
                    .ok_or_else(|| FlattenError::StructuralLookup {
                        anchor: target.local_name().to_string(),
                        missing: format!("child #{}", position + 1),
                    })
            })
            .collect()
    }
}
