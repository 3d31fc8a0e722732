//! Index descriptors.
//!
//! A descriptor names the kind of an index and the entry positions it is keyed
//! on. Positions are 1-based, like entry accessors.

use crate::error::{Error, Result};
use crate::key::Comparison;
use crate::shape::Shape;
use core::fmt;

/// Largest number of slots an array index may address.
pub const MAX_ARRAY_SLOTS: usize = 1 << 24;

/// Index kind enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// No structure, scan-only.
    List,
    /// Bucketed hash table over the key fields.
    Hash,
    /// Key-ordered index with range and extremal queries.
    Tree,
    /// Direct-addressed array over bounded integer keys.
    Array,
    /// Per-group min-heap on a target field.
    SliceHeapMin,
    /// Per-group max-heap on a target field.
    SliceHeapMax,
}

impl IndexKind {
    /// Returns the comparison flavour generated for this kind.
    pub fn comparison(&self) -> Comparison {
        match self {
            IndexKind::Tree => Comparison::Ordering,
            _ => Comparison::Equality,
        }
    }

    /// Returns whether this is one of the slice-heap kinds.
    pub fn is_slice_heap(&self) -> bool {
        matches!(self, IndexKind::SliceHeapMin | IndexKind::SliceHeapMax)
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexKind::List => "list",
            IndexKind::Hash => "hash",
            IndexKind::Tree => "tree",
            IndexKind::Array => "array",
            IndexKind::SliceHeapMin => "slice-heap-min",
            IndexKind::SliceHeapMax => "slice-heap-max",
        };
        f.write_str(name)
    }
}

/// Description of one index of a store.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexDescriptor {
    kind: IndexKind,
    /// Key positions (group positions for slice heaps).
    fields: Vec<usize>,
    unique: bool,
    /// Heap-ordered position of a slice heap.
    target: Option<usize>,
    /// Slot of the grouping hash index of a slice heap.
    partition: Option<usize>,
    /// Half-open `[lo, hi)` bounds per key field of an array index.
    bounds: Vec<(i64, i64)>,
}

impl IndexDescriptor {
    fn new(kind: IndexKind, fields: &[usize], unique: bool) -> Self {
        Self {
            kind,
            fields: fields.to_vec(),
            unique,
            target: None,
            partition: None,
            bounds: Vec::new(),
        }
    }

    /// Scan-only list. Lookups compare `fields`, or every field when empty.
    pub fn list(fields: &[usize]) -> Self {
        Self::new(IndexKind::List, fields, false)
    }

    /// Hash index over `fields`.
    pub fn hash(fields: &[usize], unique: bool) -> Self {
        Self::new(IndexKind::Hash, fields, unique)
    }

    /// Ordered index over `fields`.
    pub fn tree(fields: &[usize], unique: bool) -> Self {
        Self::new(IndexKind::Tree, fields, unique)
    }

    /// Unique direct-addressed index; each key is `(position, lo, hi)`.
    pub fn array(keys: &[(usize, i64, i64)]) -> Self {
        let fields: Vec<usize> = keys.iter().map(|&(p, _, _)| p).collect();
        let mut desc = Self::new(IndexKind::Array, &fields, true);
        desc.bounds = keys.iter().map(|&(_, lo, hi)| (lo, hi)).collect();
        desc
    }

    /// Min-heap on `target`, one heap per distinct `group` key.
    pub fn slice_min(group: &[usize], target: usize) -> Self {
        let mut desc = Self::new(IndexKind::SliceHeapMin, group, false);
        desc.target = Some(target);
        desc
    }

    /// Max-heap on `target`, one heap per distinct `group` key.
    pub fn slice_max(group: &[usize], target: usize) -> Self {
        let mut desc = Self::new(IndexKind::SliceHeapMax, group, false);
        desc.target = Some(target);
        desc
    }

    /// Sets the slot of the grouping hash index of a slice heap.
    pub fn with_partition(mut self, slot: usize) -> Self {
        self.partition = Some(slot);
        self
    }

    /// Returns the index kind.
    #[inline]
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Returns the key (or group) positions.
    #[inline]
    pub fn fields(&self) -> &[usize] {
        &self.fields
    }

    /// Returns whether this index enforces uniqueness.
    #[inline]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns the heap-ordered position of a slice heap.
    #[inline]
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Returns the grouping hash index slot of a slice heap.
    #[inline]
    pub fn partition(&self) -> Option<usize> {
        self.partition
    }

    /// Returns the array bounds.
    #[inline]
    pub fn bounds(&self) -> &[(i64, i64)] {
        &self.bounds
    }

    /// Number of slots spanned by the array bounds, if it stays within
    /// [`MAX_ARRAY_SLOTS`].
    pub fn array_slots(&self) -> Option<usize> {
        self.bounds.iter().try_fold(1usize, |total, &(lo, hi)| {
            let span = usize::try_from(hi.checked_sub(lo)?).ok()?;
            total
                .checked_mul(span)
                .filter(|&slots| slots <= MAX_ARRAY_SLOTS)
        })
    }

    /// Checks this descriptor against a shape and the descriptors of the
    /// slots before it.
    pub fn validate(&self, shape: &Shape, slot: usize, earlier: &[IndexDescriptor]) -> Result<()> {
        let arity = shape.arity();
        for (i, &pos) in self.fields.iter().enumerate() {
            if pos == 0 || pos > arity {
                return Err(Error::invalid_descriptor(format!(
                    "{} index {slot}: position {pos} out of range for shape {shape}",
                    self.kind
                )));
            }
            if self.fields[..i].contains(&pos) {
                return Err(Error::invalid_descriptor(format!(
                    "{} index {slot}: position {pos} listed twice",
                    self.kind
                )));
            }
        }

        match self.kind {
            IndexKind::List => {
                if self.unique {
                    return Err(Error::invalid_descriptor(format!(
                        "list index {slot} cannot be unique"
                    )));
                }
            }
            IndexKind::Hash | IndexKind::Tree => {
                if self.fields.is_empty() {
                    return Err(Error::invalid_descriptor(format!(
                        "{} index {slot} needs at least one key field",
                        self.kind
                    )));
                }
            }
            IndexKind::Array => {
                if self.fields.is_empty() || self.bounds.len() != self.fields.len() {
                    return Err(Error::invalid_descriptor(format!(
                        "array index {slot} needs one bound per key field"
                    )));
                }
                for (&pos, &(lo, hi)) in self.fields.iter().zip(&self.bounds) {
                    if lo >= hi {
                        return Err(Error::invalid_descriptor(format!(
                            "array index {slot}: empty bounds [{lo}, {hi}) on position {pos}"
                        )));
                    }
                    let ty = shape.fields()[pos - 1];
                    if !ty.is_integral() {
                        return Err(Error::invalid_descriptor(format!(
                            "array index {slot}: position {pos} has non-integral type {ty}"
                        )));
                    }
                }
                if self.array_slots().is_none() {
                    return Err(Error::invalid_descriptor(format!(
                        "array index {slot} addresses more than {MAX_ARRAY_SLOTS} slots"
                    )));
                }
            }
            IndexKind::SliceHeapMin | IndexKind::SliceHeapMax => {
                if self.fields.is_empty() {
                    return Err(Error::invalid_descriptor(format!(
                        "slice heap {slot} needs at least one group field"
                    )));
                }
                let target = self.target.ok_or_else(|| {
                    Error::invalid_descriptor(format!("slice heap {slot} has no target field"))
                })?;
                if target == 0 || target > arity {
                    return Err(Error::invalid_descriptor(format!(
                        "slice heap {slot}: target {target} out of range for shape {shape}"
                    )));
                }
                if self.fields.contains(&target) {
                    return Err(Error::invalid_descriptor(format!(
                        "slice heap {slot}: target {target} is part of its group key"
                    )));
                }
                if self.unique {
                    return Err(Error::invalid_descriptor(format!(
                        "slice heap {slot} cannot be unique"
                    )));
                }
                if slot == 0 {
                    return Err(Error::invalid_descriptor(
                        "a slice heap cannot be the primary index",
                    ));
                }
                if let Some(partition) = self.partition {
                    let grouping = earlier.get(partition).ok_or_else(|| {
                        Error::invalid_descriptor(format!(
                            "slice heap {slot}: partition index {partition} is not declared before it"
                        ))
                    })?;
                    if grouping.kind != IndexKind::Hash || grouping.fields != self.fields {
                        return Err(Error::invalid_descriptor(format!(
                            "slice heap {slot}: partition index {partition} is not a hash index on the same group"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
