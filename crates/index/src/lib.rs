//! Viewstore Index - Index implementations for the viewstore record store.
//!
//! Every index holds entry handles and is keyed on a projection of the entry
//! fields, described by a generated `KeySpec`:
//!
//! - `ListIndex`: insertion order, linear scans
//! - `HashIndex`: O(1) point queries on the generated key hash
//! - `TreeIndex`: ordered keys with range and extremal queries
//! - `ArrayIndex`: direct addressing over bounded integer keys
//! - `SliceHeapIndex`: per-group min/max heap on a target field
//!
//! Unset key fields in a probe act as wildcards.
//!
//! # Example
//!
//! ```rust
//! use viewstore_core::{Comparison, Entry, EntryId, ShapeRegistry, Value};
//! use viewstore_index::{HashIndex, Index};
//!
//! let entries = vec![
//!     Entry::from_values(vec![Value::Int(1), Value::from("a")]),
//!     Entry::from_values(vec![Value::Int(2), Value::from("b")]),
//! ];
//! let spec = ShapeRegistry::global()
//!     .key_spec(entries[0].shape(), &[1], Comparison::Equality)
//!     .unwrap();
//!
//! let mut index = HashIndex::new(spec, true);
//! for (slot, entry) in entries.iter().enumerate() {
//!     index.add(EntryId::new(slot as u32, 0), entry, &entries).unwrap();
//! }
//!
//! let probe = Entry::key(entries[0].shape(), [(1, 2)]);
//! assert_eq!(index.get(&probe, &entries), Some(EntryId::new(1, 0)));
//! ```

extern crate alloc;

pub mod any;
pub mod array;
pub mod comparator;
pub mod hash;
pub mod list;
pub mod slice_heap;
pub mod stats;
pub mod traits;
pub mod tree;

pub use any::AnyIndex;
pub use array::ArrayIndex;
pub use comparator::{Comparator, Order, TargetComparator};
pub use hash::HashIndex;
pub use list::ListIndex;
pub use slice_heap::SliceHeapIndex;
pub use stats::IndexStats;
pub use traits::{EntrySource, Index, IndexError, KeyRange};
pub use tree::TreeIndex;
