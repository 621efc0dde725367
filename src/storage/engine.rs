use std::ops::{Bound, RangeBounds};

use crate::error::Result;

/// Ordered byte-level key/value engine
///
/// Rows, and anything else the database persists outside the catalog
/// snapshot, end up as keys in one of these.
pub trait Engine {
    type EngineIterator<'a>: EngineIterator
    where
        Self: 'a;

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;
    fn get(&mut self, key: Vec<u8>) -> Result<Option<Vec<u8>>>;
    /// Deleting an absent key is not an error
    fn delete(&mut self, key: Vec<u8>) -> Result<()>;
    fn scan(&mut self, range: impl RangeBounds<Vec<u8>>) -> Self::EngineIterator<'_>;

    /// Scans every key starting with `prefix`.
    ///
    /// The exclusive upper bound is the prefix with its last byte below 0xFF
    /// incremented and anything after it dropped: "ab\xff" scans up to "ac".
    /// A prefix made only of 0xFF bytes has no upper bound.
    fn scan_prefix(&mut self, prefix: Vec<u8>) -> Self::EngineIterator<'_> {
        let mut upper = prefix.clone();
        while let Some(last) = upper.pop() {
            if last < u8::MAX {
                upper.push(last + 1);
                break;
            }
        }
        let end = if upper.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(upper)
        };
        self.scan((Bound::Included(prefix), end))
    }
}

/// Storage engine iterator trait (supports reverse traversal)
pub trait EngineIterator: DoubleEndedIterator<Item = Result<(Vec<u8>, Vec<u8>)>> {}
