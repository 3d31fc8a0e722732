//! Viewstore Core - Field, shape and entry model for the viewstore record store.
//!
//! This crate provides the foundational types shared by every index and store:
//!
//! - `FieldType` / `Value`: typed scalars, each with an unset sentinel
//! - `Shape`: interned field-type signature of a record family
//! - `Entry`: a mutable fixed-arity record, addressed from position 1
//! - `EntryId`: generational handle of an entry held by a store
//! - `IndexDescriptor`: kind, key positions and options of one index
//! - `KeySpec`: generated hash and compare routines for a key projection
//! - `Error`: error types for store operations
//!
//! # Example
//!
//! ```rust
//! use viewstore_core::{Comparison, Entry, FieldType, Shape, ShapeRegistry, Value};
//!
//! let shape = Shape::of(&[FieldType::Int, FieldType::Str]);
//! let mut entry = Entry::new(&shape);
//! entry.set(1, 7);
//! entry.set(2, "x");
//! assert_eq!(entry.get(1), &Value::Int(7));
//!
//! let spec = ShapeRegistry::global()
//!     .key_spec(&shape, &[1], Comparison::Equality)
//!     .unwrap();
//! let probe = Entry::key(&shape, [(1, 7)]);
//! assert_eq!(spec.hash(&entry), spec.hash(&probe));
//! ```

mod descriptor;
mod entry;
mod error;
pub mod hash;
mod id;
mod key;
mod shape;
mod types;
mod value;

pub use descriptor::{IndexDescriptor, IndexKind, MAX_ARRAY_SLOTS};
pub use entry::Entry;
pub use error::{Error, Result};
pub use id::EntryId;
pub use key::{Comparison, KeySpec, KeyTuple};
pub use shape::{Shape, ShapeId, ShapeRegistry};
pub use types::FieldType;
pub use value::{Value, DOUBLE_TOLERANCE};
