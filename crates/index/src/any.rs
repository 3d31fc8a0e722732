//! Index dispatch over every kind.

use crate::array::ArrayIndex;
use crate::comparator::Order;
use crate::hash::HashIndex;
use crate::list::ListIndex;
use crate::slice_heap::SliceHeapIndex;
use crate::stats::IndexStats;
use crate::traits::{EntrySource, Index, IndexError};
use crate::tree::TreeIndex;
use viewstore_core::{Entry, EntryId, Error, IndexDescriptor, IndexKind, Shape, ShapeRegistry};

/// One index of a store, of any kind.
#[derive(Debug)]
pub enum AnyIndex {
    List(ListIndex),
    Hash(HashIndex),
    Tree(TreeIndex),
    Array(ArrayIndex),
    SliceHeap(SliceHeapIndex),
}

macro_rules! dispatch {
    ($self:expr, $index:ident => $body:expr) => {
        match $self {
            AnyIndex::List($index) => $body,
            AnyIndex::Hash($index) => $body,
            AnyIndex::Tree($index) => $body,
            AnyIndex::Array($index) => $body,
            AnyIndex::SliceHeap($index) => $body,
        }
    };
}

impl AnyIndex {
    /// Builds an empty index for `descriptor` over `shape`. The descriptor is
    /// assumed to be validated already.
    pub fn build(
        descriptor: &IndexDescriptor,
        shape: &Shape,
        capacity: usize,
    ) -> viewstore_core::Result<Self> {
        let spec = ShapeRegistry::global().key_spec(
            shape,
            descriptor.fields(),
            descriptor.kind().comparison(),
        )?;
        let index = match descriptor.kind() {
            IndexKind::List => AnyIndex::List(ListIndex::with_capacity(spec, capacity)),
            IndexKind::Hash => AnyIndex::Hash(HashIndex::with_capacity(
                spec,
                descriptor.is_unique(),
                capacity,
            )),
            IndexKind::Tree => AnyIndex::Tree(TreeIndex::new(spec, descriptor.is_unique())),
            IndexKind::Array => AnyIndex::Array(ArrayIndex::new(spec, descriptor.bounds())),
            kind @ (IndexKind::SliceHeapMin | IndexKind::SliceHeapMax) => {
                let target = descriptor.target().ok_or_else(|| {
                    Error::invalid_descriptor("slice heap descriptor without a target field")
                })?;
                let order = if kind == IndexKind::SliceHeapMin {
                    Order::Asc
                } else {
                    Order::Desc
                };
                AnyIndex::SliceHeap(SliceHeapIndex::new(spec, target, order))
            }
        };
        Ok(index)
    }

    /// Returns the tree index, if this is one.
    pub fn as_tree(&self) -> Option<&TreeIndex> {
        match self {
            AnyIndex::Tree(index) => Some(index),
            _ => None,
        }
    }

    /// Returns the slice-heap index, if this is one.
    pub fn as_slice_heap(&self) -> Option<&SliceHeapIndex> {
        match self {
            AnyIndex::SliceHeap(index) => Some(index),
            _ => None,
        }
    }
}

impl Index for AnyIndex {
    fn kind(&self) -> IndexKind {
        dispatch!(self, index => index.kind())
    }

    fn is_unique(&self) -> bool {
        dispatch!(self, index => index.is_unique())
    }

    fn len(&self) -> usize {
        dispatch!(self, index => index.len())
    }

    fn add(&mut self, id: EntryId, entry: &Entry, src: &dyn EntrySource) -> Result<(), IndexError> {
        dispatch!(self, index => index.add(id, entry, src))
    }

    fn remove(&mut self, id: EntryId, entry: &Entry) -> bool {
        dispatch!(self, index => index.remove(id, entry))
    }

    fn is_affected(&self, before: &Entry, after: &Entry) -> bool {
        dispatch!(self, index => index.is_affected(before, after))
    }

    fn get(&self, key: &Entry, src: &dyn EntrySource) -> Option<EntryId> {
        dispatch!(self, index => index.get(key, src))
    }

    fn slice(&self, key: &Entry, src: &dyn EntrySource, visit: &mut dyn FnMut(EntryId)) {
        dispatch!(self, index => index.slice(key, src, visit))
    }

    fn for_each(&self, visit: &mut dyn FnMut(EntryId)) {
        dispatch!(self, index => index.for_each(visit))
    }

    fn clear(&mut self) {
        dispatch!(self, index => index.clear())
    }

    fn stats(&self) -> &IndexStats {
        dispatch!(self, index => index.stats())
    }
}
