//! Indexed entry store.
//!
//! A `Store` owns the entries of one shape and keeps every declared index in
//! step with them. Slot 0 is the primary index. Every live entry is placed in
//! every index exactly once; inserts, key-touching updates and deletes either
//! reach all indices or none of them.

use crate::slab::EntrySlab;
use hashbrown::HashSet;
use viewstore_core::{
    Entry, EntryId, Error, IndexDescriptor, IndexKind, Result, Shape, ShapeRegistry, Value,
};
use viewstore_index::{AnyIndex, Index, IndexError, IndexStats, KeyRange};

/// Entries of one shape under a fixed list of indices.
#[derive(Debug)]
pub struct Store {
    shape: Shape,
    descriptors: Vec<IndexDescriptor>,
    indices: Vec<AnyIndex>,
    slab: EntrySlab,
    capacity: usize,
}

impl Store {
    /// Creates a store for `shape` with the given index layout. The first
    /// descriptor is the primary index.
    pub fn new(shape: Shape, descriptors: Vec<IndexDescriptor>) -> Result<Self> {
        Self::with_capacity(shape, descriptors, 0)
    }

    /// Creates a store with room for `capacity` entries.
    pub fn with_capacity(
        shape: Shape,
        descriptors: Vec<IndexDescriptor>,
        capacity: usize,
    ) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(Error::invalid_descriptor("a store needs a primary index"));
        }
        let mut indices = Vec::with_capacity(descriptors.len());
        for (slot, descriptor) in descriptors.iter().enumerate() {
            descriptor.validate(&shape, slot, &descriptors[..slot])?;
            indices.push(AnyIndex::build(descriptor, &shape, capacity)?);
        }
        ShapeRegistry::global().record_layout(&shape, &descriptors);
        tracing::debug!(shape = %shape, indices = indices.len(), "built store");

        Ok(Self {
            shape,
            descriptors,
            indices,
            slab: EntrySlab::with_capacity(capacity),
            capacity,
        })
    }

    /// Returns the shape of the entries.
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.slab.len()
    }

    /// Returns true if the store is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slab.is_empty()
    }

    /// Returns the number of indices.
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Returns the descriptor of index `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a slot of this store.
    pub fn descriptor(&self, index: usize) -> &IndexDescriptor {
        &self.descriptors[index]
    }

    /// Returns the number of handles held by index `index`.
    pub fn index_len(&self, index: usize) -> usize {
        self.indices[index].len()
    }

    /// Returns the statistics of index `index`.
    pub fn index_stats(&self, index: usize) -> &IndexStats {
        self.indices[index].stats()
    }

    /// Returns the first slot holding an index of `kind` on exactly `fields`.
    pub fn find_index(&self, kind: IndexKind, fields: &[usize]) -> Option<usize> {
        self.descriptors
            .iter()
            .position(|d| d.kind() == kind && d.fields() == fields)
    }

    /// Inserts an entry. On a duplicate key no index keeps the entry.
    pub fn insert(&mut self, entry: Entry) -> Result<EntryId> {
        self.check_shape(&entry)?;
        let id = self.slab.insert(entry);
        let Some(stored) = self.slab.get(id) else {
            unreachable!("entry inserted into the slab just now");
        };

        let mut failure = None;
        for (slot, index) in self.indices.iter_mut().enumerate() {
            if let Err(err) = index.add(id, stored, &self.slab) {
                failure = Some((slot, err));
                break;
            }
        }

        if let Some((slot, err)) = failure {
            let err = index_error(slot, self.descriptors[slot].fields(), err, stored);
            for index in &mut self.indices[..slot] {
                index.remove(id, stored);
            }
            self.slab.remove(id);
            tracing::trace!(index = slot, "insert rejected: {err}");
            return Err(err);
        }
        Ok(id)
    }

    /// Applies `mutate` to the entry behind `id` and moves it in every index
    /// whose key it touched. Returns `Ok(None)` if `id` is not in the store.
    ///
    /// If the new key collides in a unique index, the entry and every index
    /// are restored to their prior state and the duplicate is reported.
    pub fn update<R>(&mut self, id: EntryId, mutate: impl FnOnce(&mut Entry) -> R) -> Result<Option<R>> {
        let Some(entry) = self.slab.get_mut(id) else {
            return Ok(None);
        };
        let before = entry.clone();
        let result = mutate(entry);
        if entry.shape() != &self.shape {
            let got = entry.shape().clone();
            *entry = before;
            return Err(Error::ShapeMismatch {
                expected: self.shape.clone(),
                got,
            });
        }

        let Some(after) = self.slab.get(id) else {
            unreachable!("entry checked above");
        };
        let affected: Vec<usize> = (0..self.indices.len())
            .filter(|&slot| self.indices[slot].is_affected(&before, after))
            .collect();
        if affected.is_empty() {
            return Ok(Some(result));
        }

        for &slot in &affected {
            self.indices[slot].remove(id, &before);
        }
        let mut failure = None;
        for (n, &slot) in affected.iter().enumerate() {
            if let Err(err) = self.indices[slot].add(id, after, &self.slab) {
                failure = Some((n, slot, err));
                break;
            }
        }
        let Some((n, slot, err)) = failure else {
            return Ok(Some(result));
        };

        let err = index_error(slot, self.descriptors[slot].fields(), err, after);
        for &placed in &affected[..n] {
            self.indices[placed].remove(id, after);
        }
        if let Some(entry) = self.slab.get_mut(id) {
            *entry = before.clone();
        }
        for &restored in &affected {
            let replaced = self.indices[restored].add(id, &before, &self.slab);
            debug_assert!(replaced.is_ok(), "prior placement must be restorable");
        }
        tracing::trace!(index = slot, "update rolled back: {err}");
        Err(err)
    }

    /// Removes the entry behind `id` from every index and returns it.
    /// Returns `None` if the entry is not in the store.
    pub fn delete(&mut self, id: EntryId) -> Option<Entry> {
        let entry = self.slab.get(id)?;
        for index in &mut self.indices {
            index.remove(id, entry);
        }
        self.slab.remove(id)
    }

    /// Deletes the first entry matching `key` under index `index`.
    pub fn delete_by_key(&mut self, index: usize, key: &Entry) -> Option<Entry> {
        let id = self.get_id(index, key)?;
        self.delete(id)
    }

    /// Returns the entry behind `id`.
    #[inline]
    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.slab.get(id)
    }

    /// Returns true if `id` refers to an entry of this store.
    pub fn contains(&self, id: EntryId) -> bool {
        self.slab.contains(id)
    }

    /// Returns the handle of the first entry matching `key` under index
    /// `index`, in that index's natural order.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a slot of this store.
    pub fn get_id(&self, index: usize, key: &Entry) -> Option<EntryId> {
        self.debug_check_key(key);
        self.indices[index].get(key, &self.slab)
    }

    /// Point lookup through index `index`.
    pub fn get(&self, index: usize, key: &Entry) -> Option<&Entry> {
        self.get_id(index, key).and_then(|id| self.slab.get(id))
    }

    /// Point lookup returning a detached copy.
    pub fn get_copy(&self, index: usize, key: &Entry) -> Option<Entry> {
        self.get(index, key).cloned()
    }

    /// Visits every entry matching `key` under index `index`. Unset fields
    /// of `key` match anything.
    pub fn slice(&self, index: usize, key: &Entry, mut visit: impl FnMut(EntryId, &Entry)) {
        self.debug_check_key(key);
        let slab = &self.slab;
        self.indices[index].slice(key, slab, &mut |id| {
            if let Some(entry) = slab.get(id) {
                visit(id, entry);
            }
        });
    }

    /// Applies `mutate` to every entry matching `key` under index `index`.
    /// Matches are collected first, so a mutation that moves an entry within
    /// the same index does not revisit it. Returns the number of entries
    /// updated.
    pub fn slice_update(
        &mut self,
        index: usize,
        key: &Entry,
        mut mutate: impl FnMut(&mut Entry),
    ) -> Result<usize> {
        let mut ids = Vec::new();
        self.slice(index, key, |id, _| ids.push(id));
        let mut updated = 0;
        for id in ids {
            if self.update(id, |entry| mutate(entry))?.is_some() {
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Visits every entry in the natural order of the primary index.
    pub fn for_each(&self, mut visit: impl FnMut(EntryId, &Entry)) {
        let slab = &self.slab;
        self.indices[0].for_each(&mut |id| {
            if let Some(entry) = slab.get(id) {
                visit(id, entry);
            }
        });
    }

    /// Visits, in key order, every entry whose key under tree index `index`
    /// falls inside `range`. Bound entries are projected onto the index key.
    pub fn range(
        &self,
        index: usize,
        range: KeyRange<&Entry>,
        mut visit: impl FnMut(EntryId, &Entry),
    ) -> Result<()> {
        let tree = self.tree(index)?;
        let range = range.map(|bound| tree.spec().project(bound));
        let slab = &self.slab;
        tree.range(&range, &mut |id| {
            if let Some(entry) = slab.get(id) {
                visit(id, entry);
            }
        });
        Ok(())
    }

    /// Returns the smallest-keyed entry matching `key` under tree index
    /// `index`.
    pub fn first(&self, index: usize, key: &Entry) -> Result<Option<&Entry>> {
        self.debug_check_key(key);
        let tree = self.tree(index)?;
        Ok(tree.first(key).and_then(|id| self.slab.get(id)))
    }

    /// Returns the largest-keyed entry matching `key` under tree index
    /// `index`.
    pub fn last(&self, index: usize, key: &Entry) -> Result<Option<&Entry>> {
        self.debug_check_key(key);
        let tree = self.tree(index)?;
        Ok(tree.last(key).and_then(|id| self.slab.get(id)))
    }

    /// Returns the entry of the group `key` (on `group`) with the smallest
    /// `target`. The backing slice heap, and its grouping hash index, are
    /// created on first use.
    pub fn slice_min(&mut self, key: &Entry, group: &[usize], target: usize) -> Result<Option<&Entry>> {
        self.slice_extreme(IndexKind::SliceHeapMin, key, group, target)
    }

    /// Returns the entry of the group `key` (on `group`) with the largest
    /// `target`. See [`Store::slice_min`].
    pub fn slice_max(&mut self, key: &Entry, group: &[usize], target: usize) -> Result<Option<&Entry>> {
        self.slice_extreme(IndexKind::SliceHeapMax, key, group, target)
    }

    /// Like [`Store::slice_min`] but only consults an existing slice heap.
    pub fn peek_min(&self, key: &Entry, group: &[usize], target: usize) -> Option<&Entry> {
        let slot = self.find_slice_heap(IndexKind::SliceHeapMin, group, target)?;
        self.get(slot, key)
    }

    /// Like [`Store::slice_max`] but only consults an existing slice heap.
    pub fn peek_max(&self, key: &Entry, group: &[usize], target: usize) -> Option<&Entry> {
        let slot = self.find_slice_heap(IndexKind::SliceHeapMax, group, target)?;
        self.get(slot, key)
    }

    /// Declares one more index and fills it from the current entries.
    /// Returns its slot.
    pub fn add_index(&mut self, descriptor: IndexDescriptor) -> Result<usize> {
        let slot = self.indices.len();
        descriptor.validate(&self.shape, slot, &self.descriptors)?;
        let mut index = AnyIndex::build(&descriptor, &self.shape, self.capacity)?;
        let mut ids = Vec::with_capacity(self.len());
        self.indices[0].for_each(&mut |id| ids.push(id));
        for id in ids {
            let Some(entry) = self.slab.get(id) else {
                continue;
            };
            if let Err(err) = index.add(id, entry, &self.slab) {
                return Err(index_error(slot, descriptor.fields(), err, entry));
            }
        }
        self.indices.push(index);
        self.descriptors.push(descriptor);
        ShapeRegistry::global().record_layout(&self.shape, &self.descriptors);
        Ok(slot)
    }

    /// Removes every entry from every index.
    pub fn clear(&mut self) {
        for index in &mut self.indices {
            index.clear();
        }
        self.slab.clear();
    }

    /// Removes every entry and returns them in the natural order of the
    /// primary index.
    pub fn drain(&mut self) -> Vec<Entry> {
        let mut ids = Vec::with_capacity(self.len());
        self.indices[0].for_each(&mut |id| ids.push(id));
        let entries = ids.into_iter().filter_map(|id| self.slab.remove(id)).collect();
        self.clear();
        entries
    }

    /// Returns true if both stores hold the same multiset of entries, doubles
    /// compared within tolerance. Entries of `self` are looked up through the
    /// primary index of `other` with their double fields left as wildcards.
    pub fn same_contents(&self, other: &Store) -> bool {
        if self.shape != other.shape || self.len() != other.len() {
            return false;
        }
        let mut used: HashSet<EntryId> = HashSet::with_capacity(self.len());
        let mut all_found = true;
        self.for_each(|_, entry| {
            if !all_found {
                return;
            }
            let mut lookup = entry.clone();
            for (i, value) in entry.values().iter().enumerate() {
                if matches!(value, Value::Double(_)) {
                    lookup.unset(i + 1);
                }
            }
            let mut found = None;
            other.slice(0, &lookup, |id, candidate| {
                if found.is_none() && !used.contains(&id) && candidate.approx_eq(entry) {
                    found = Some(id);
                }
            });
            match found {
                Some(id) => {
                    used.insert(id);
                }
                None => all_found = false,
            }
        });
        all_found
    }

    fn slice_extreme(
        &mut self,
        kind: IndexKind,
        key: &Entry,
        group: &[usize],
        target: usize,
    ) -> Result<Option<&Entry>> {
        let slot = match self.find_slice_heap(kind, group, target) {
            Some(slot) => slot,
            None => {
                let (partition, grouping) = match self.find_index(IndexKind::Hash, group) {
                    Some(slot) => (slot, None),
                    None => (self.indices.len(), Some(IndexDescriptor::hash(group, false))),
                };
                let heap = if kind == IndexKind::SliceHeapMin {
                    IndexDescriptor::slice_min(group, target)
                } else {
                    IndexDescriptor::slice_max(group, target)
                }
                .with_partition(partition);

                // Check the heap against the layout it will land in before
                // anything is added.
                let mut layout = self.descriptors.clone();
                layout.extend(grouping.iter().cloned());
                heap.validate(&self.shape, layout.len(), &layout)?;
                if let Some(grouping) = grouping {
                    self.add_index(grouping)?;
                }
                let slot = self.add_index(heap)?;
                tracing::debug!(
                    shape = %self.shape,
                    index = slot,
                    partition,
                    target,
                    "materialized {kind} index"
                );
                slot
            }
        };
        Ok(self.get(slot, key))
    }

    fn find_slice_heap(&self, kind: IndexKind, group: &[usize], target: usize) -> Option<usize> {
        self.descriptors.iter().position(|d| {
            d.kind() == kind && d.fields() == group && d.target() == Some(target)
        })
    }

    fn tree(&self, index: usize) -> Result<&viewstore_index::TreeIndex> {
        self.indices[index].as_tree().ok_or_else(|| {
            Error::invalid_descriptor(format!(
                "index {index} is a {} index, not a tree index",
                self.descriptors[index].kind()
            ))
        })
    }

    fn check_shape(&self, entry: &Entry) -> Result<()> {
        if entry.shape() != &self.shape {
            return Err(Error::ShapeMismatch {
                expected: self.shape.clone(),
                got: entry.shape().clone(),
            });
        }
        Ok(())
    }

    #[inline]
    fn debug_check_key(&self, key: &Entry) {
        debug_assert_eq!(key.shape(), &self.shape, "lookup key of a different shape");
    }
}

/// Reports an index rejection with the key it was raised for.
fn index_error(slot: usize, fields: &[usize], err: IndexError, entry: &Entry) -> Error {
    let key: Vec<Value> = if fields.is_empty() {
        entry.values().to_vec()
    } else {
        fields.iter().map(|&p| entry.get(p).clone()).collect()
    };
    match err {
        IndexError::DuplicateKey { .. } => Error::duplicate_key(slot, key),
        IndexError::OutOfBounds => Error::KeyOutOfBounds { index: slot, key },
    }
}
