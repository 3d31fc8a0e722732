//! Index trait definitions.
//!
//! Every index kind implements [`Index`]. Indices hold entry handles, never
//! entries: lookups that need to look at stored fields go through an
//! [`EntrySource`], normally the slab of the owning store.

use crate::stats::IndexStats;
use core::ops::Bound;
use thiserror::Error;
use viewstore_core::{Entry, EntryId, IndexKind};

/// Read access to the entries an index refers to.
pub trait EntrySource {
    /// Returns the entry behind `id`, if it is still live.
    fn entry(&self, id: EntryId) -> Option<&Entry>;
}

/// Plain entry lists resolve a handle by its slot; the generation is ignored.
impl EntrySource for Vec<Entry> {
    fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.get(id.slot() as usize)
    }
}

/// A key range for ordered index queries.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyRange<K> {
    /// All keys
    All,
    /// A single key (equality)
    Only(K),
    /// Keys >= lower bound
    LowerBound { value: K, exclusive: bool },
    /// Keys <= upper bound
    UpperBound { value: K, exclusive: bool },
    /// Keys between lower and upper bounds
    Bound {
        lower: K,
        upper: K,
        lower_exclusive: bool,
        upper_exclusive: bool,
    },
}

impl<K> KeyRange<K> {
    /// Creates a range for all keys.
    pub fn all() -> Self {
        KeyRange::All
    }

    /// Creates a range for a single key.
    pub fn only(key: K) -> Self {
        KeyRange::Only(key)
    }

    /// Creates a range with a lower bound.
    pub fn lower_bound(value: K, exclusive: bool) -> Self {
        KeyRange::LowerBound { value, exclusive }
    }

    /// Creates a range with an upper bound.
    pub fn upper_bound(value: K, exclusive: bool) -> Self {
        KeyRange::UpperBound { value, exclusive }
    }

    /// Creates a range with both bounds.
    pub fn bound(lower: K, upper: K, lower_exclusive: bool, upper_exclusive: bool) -> Self {
        KeyRange::Bound {
            lower,
            upper,
            lower_exclusive,
            upper_exclusive,
        }
    }

    /// Returns true if this range represents a single value.
    pub fn is_only(&self) -> bool {
        matches!(self, KeyRange::Only(_))
    }

    /// Returns true if this range is unbounded.
    pub fn is_all(&self) -> bool {
        matches!(self, KeyRange::All)
    }

    /// Converts the bound values, keeping the bound structure.
    pub fn map<U>(self, mut f: impl FnMut(K) -> U) -> KeyRange<U> {
        match self {
            KeyRange::All => KeyRange::All,
            KeyRange::Only(k) => KeyRange::Only(f(k)),
            KeyRange::LowerBound { value, exclusive } => KeyRange::LowerBound {
                value: f(value),
                exclusive,
            },
            KeyRange::UpperBound { value, exclusive } => KeyRange::UpperBound {
                value: f(value),
                exclusive,
            },
            KeyRange::Bound {
                lower,
                upper,
                lower_exclusive,
                upper_exclusive,
            } => KeyRange::Bound {
                lower: f(lower),
                upper: f(upper),
                lower_exclusive,
                upper_exclusive,
            },
        }
    }

    /// Returns the range as a pair of standard bounds.
    pub fn as_bounds(&self) -> (Bound<&K>, Bound<&K>) {
        fn edge<K>(value: &K, exclusive: bool) -> Bound<&K> {
            if exclusive {
                Bound::Excluded(value)
            } else {
                Bound::Included(value)
            }
        }
        match self {
            KeyRange::All => (Bound::Unbounded, Bound::Unbounded),
            KeyRange::Only(k) => (Bound::Included(k), Bound::Included(k)),
            KeyRange::LowerBound { value, exclusive } => (edge(value, *exclusive), Bound::Unbounded),
            KeyRange::UpperBound { value, exclusive } => (Bound::Unbounded, edge(value, *exclusive)),
            KeyRange::Bound {
                lower,
                upper,
                lower_exclusive,
                upper_exclusive,
            } => (edge(lower, *lower_exclusive), edge(upper, *upper_exclusive)),
        }
    }
}

/// Core trait for all index implementations.
///
/// `add` and `remove` must be given the entry version the handle is (or was)
/// placed under; the store removes with the pre-mutation copy and adds with
/// the post-mutation entry.
pub trait Index {
    /// Returns the kind of this index.
    fn kind(&self) -> IndexKind;

    /// Returns whether this index rejects equal keys.
    fn is_unique(&self) -> bool;

    /// Returns the number of handles in the index.
    fn len(&self) -> usize;

    /// Returns true if the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Places `id` under the key of `entry`.
    fn add(&mut self, id: EntryId, entry: &Entry, src: &dyn EntrySource) -> Result<(), IndexError>;

    /// Removes `id`, placed under the key of `entry`. Returns false if it was
    /// not there.
    fn remove(&mut self, id: EntryId, entry: &Entry) -> bool;

    /// Returns true if the placement of an entry depends on a field that
    /// differs between the two versions.
    fn is_affected(&self, before: &Entry, after: &Entry) -> bool;

    /// Returns the first handle matching `key` in natural order.
    fn get(&self, key: &Entry, src: &dyn EntrySource) -> Option<EntryId>;

    /// Visits every handle matching `key`. Unset key fields match anything.
    fn slice(&self, key: &Entry, src: &dyn EntrySource, visit: &mut dyn FnMut(EntryId));

    /// Visits every handle in natural order.
    fn for_each(&self, visit: &mut dyn FnMut(EntryId));

    /// Clears all handles from the index.
    fn clear(&mut self);

    /// Returns the statistics for this index.
    fn stats(&self) -> &IndexStats;
}

/// Error type for index operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A unique index already holds an equal key.
    #[error("duplicate key in unique index, held by {existing:?}")]
    DuplicateKey { existing: EntryId },
    /// An array index key falls outside the declared bounds.
    #[error("key outside the bounds of the array index")]
    OutOfBounds,
}
