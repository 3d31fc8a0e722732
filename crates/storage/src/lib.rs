//! Viewstore Storage - Indexed entry store.
//!
//! This crate owns the entries and keeps their indices consistent:
//!
//! - `EntrySlab`: generational slot storage handing out `EntryId`s
//! - `Store`: entries of one shape under a primary and secondary indices
//! - `StoreBuilder`: declares the index layout of a store
//!
//! # Example
//!
//! ```rust
//! use viewstore_core::{Entry, FieldType, Shape, Value};
//! use viewstore_storage::StoreBuilder;
//!
//! let shape = Shape::of(&[FieldType::Int, FieldType::Str]);
//! let mut store = StoreBuilder::new(shape.clone())
//!     .primary_hash(&[1])
//!     .build()
//!     .unwrap();
//!
//! store
//!     .insert(Entry::from_values(vec![Value::Int(1), Value::from("a")]))
//!     .unwrap();
//! let dup = store.insert(Entry::from_values(vec![Value::Int(1), Value::from("b")]));
//! assert!(dup.unwrap_err().is_duplicate_key());
//!
//! let found = store.get(0, &Entry::key(&shape, [(1, 1)])).unwrap();
//! assert_eq!(found.get(2).as_str(), Some("a"));
//! assert_eq!(store.len(), 1);
//! ```

pub mod builder;
pub mod slab;
pub mod store;

pub use builder::StoreBuilder;
pub use slab::EntrySlab;
pub use store::Store;

pub use viewstore_core::{Entry, EntryId, Error, IndexDescriptor, IndexKind, Result, Shape, Value};
pub use viewstore_index::{Index, IndexStats, KeyRange, Order};
