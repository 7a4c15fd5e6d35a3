//! Key ranges
//!
//! Bound arithmetic shared by the backends: clamping a range to a seek target
//! and stepping past the last key a cursor yielded.

use std::cmp::Ordering;
use std::ops::Bound;

use crate::config::IteratorOptions;

/// A half-open, closed or unbounded range of byte keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub lower: Bound<Vec<u8>>,
    pub upper: Bound<Vec<u8>>,
}

impl KeyRange {
    /// The whole keyspace
    pub fn full() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    pub fn from_options(options: &IteratorOptions) -> Self {
        Self {
            lower: options.lower.clone(),
            upper: options.upper.clone(),
        }
    }

    /// Bounds in the form `BTreeMap::range` / `sled::Tree::range` accept
    pub fn bounds(&self) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
        (self.lower.clone(), self.upper.clone())
    }

    /// True if `key` falls inside the range
    pub fn contains(&self, key: &[u8]) -> bool {
        let above = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(lower) => key >= lower.as_slice(),
            Bound::Excluded(lower) => key > lower.as_slice(),
        };
        let below = match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(upper) => key <= upper.as_slice(),
            Bound::Excluded(upper) => key < upper.as_slice(),
        };
        above && below
    }

    /// True if no key can fall inside the range
    ///
    /// Callers check this before handing bounds to `BTreeMap::range`, which
    /// panics on inverted or doubly-excluded equal bounds.
    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => false,
            (Bound::Included(lower), Bound::Included(upper)) => lower > upper,
            (Bound::Included(lower), Bound::Excluded(upper))
            | (Bound::Excluded(lower), Bound::Included(upper))
            | (Bound::Excluded(lower), Bound::Excluded(upper)) => lower >= upper,
        }
    }

    /// Clamp the range so it starts at `target` (ends at it, in reverse)
    pub fn seeked(&self, target: &[u8], reverse: bool) -> Self {
        let mut range = self.clone();
        if reverse {
            range.upper = tighter_upper(&self.upper, Bound::Included(target.to_vec()));
        } else {
            range.lower = tighter_lower(&self.lower, Bound::Included(target.to_vec()));
        }
        range
    }

    /// The part of the range not yet visited once `last` has been yielded
    pub fn after(&self, last: &[u8], reverse: bool) -> Self {
        let mut range = self.clone();
        if reverse {
            range.upper = Bound::Excluded(last.to_vec());
        } else {
            range.lower = Bound::Excluded(last.to_vec());
        }
        range
    }
}

impl Default for KeyRange {
    fn default() -> Self {
        Self::full()
    }
}

fn tighter_lower(current: &Bound<Vec<u8>>, candidate: Bound<Vec<u8>>) -> Bound<Vec<u8>> {
    let candidate_key = match &candidate {
        Bound::Included(key) | Bound::Excluded(key) => key,
        Bound::Unbounded => return current.clone(),
    };
    match current {
        Bound::Unbounded => candidate,
        Bound::Included(key) | Bound::Excluded(key) => match candidate_key.cmp(key) {
            Ordering::Greater => candidate,
            Ordering::Less => current.clone(),
            // Same key: keep whichever excludes it
            Ordering::Equal => match current {
                Bound::Excluded(_) => current.clone(),
                _ => candidate,
            },
        },
    }
}

fn tighter_upper(current: &Bound<Vec<u8>>, candidate: Bound<Vec<u8>>) -> Bound<Vec<u8>> {
    let candidate_key = match &candidate {
        Bound::Included(key) | Bound::Excluded(key) => key,
        Bound::Unbounded => return current.clone(),
    };
    match current {
        Bound::Unbounded => candidate,
        Bound::Included(key) | Bound::Excluded(key) => match candidate_key.cmp(key) {
            Ordering::Less => candidate,
            Ordering::Greater => current.clone(),
            Ordering::Equal => match current {
                Bound::Excluded(_) => current.clone(),
                _ => candidate,
            },
        },
    }
}
