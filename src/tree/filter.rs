//! Exact ancestor-chain filtering of walker output

use super::walker::LeafRecord;
use crate::error::FlattenError;

/// Iterator adapter keeping records whose path below the root equals a tag pattern.
///
/// Matching is case-sensitive on local names with no wildcards. Errors from the
/// underlying walker are passed through.
pub struct PathFilter<I> {
    inner: I,
    pattern: Vec<String>,
}

impl<I> PathFilter<I> {
    pub fn new<S: AsRef<str>>(inner: I, pattern: &[S]) -> Self {
        Self {
            inner,
            pattern: pattern.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    pub fn pattern(&self) -> &[String] {
        &self.pattern
    }
}

impl<'a, I> Iterator for PathFilter<I>
where
    I: Iterator<Item = Result<LeafRecord<'a>, FlattenError>>,
{
    type Item = Result<LeafRecord<'a>, FlattenError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(record) if record.path.matches_below_root(self.pattern.as_slice()) => {
                    return Some(Ok(record))
                }
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Extension for chaining a [`PathFilter`] onto walker output
pub trait MatchPath<'a>: Iterator<Item = Result<LeafRecord<'a>, FlattenError>> + Sized {
    fn matching<S: AsRef<str>>(self, pattern: &[S]) -> PathFilter<Self> {
        PathFilter::new(self, pattern)
    }
}

impl<'a, I> MatchPath<'a> for I where I: Iterator<Item = Result<LeafRecord<'a>, FlattenError>> {}
