//! Direct-addressed array index.
//!
//! Every key field is an integer with declared half-open bounds `[lo, hi)`.
//! The key maps to a dense slot by mixed-radix combination of `v - lo`, so a
//! lookup is one multiplication per field and an array read.

use crate::stats::IndexStats;
use crate::traits::{EntrySource, Index, IndexError};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use viewstore_core::{Entry, EntryId, IndexKind, KeySpec, MAX_ARRAY_SLOTS};

/// Unique index over bounded integer keys. Natural order is slot order.
#[derive(Debug)]
pub struct ArrayIndex {
    spec: Arc<KeySpec>,
    bounds: Vec<(i64, i64)>,
    slots: Vec<Option<EntryId>>,
    stats: IndexStats,
}

impl ArrayIndex {
    /// Creates an array index; `bounds` holds one `[lo, hi)` pair per key
    /// field of `spec`. Bounds spanning more than [`MAX_ARRAY_SLOTS`] slots
    /// leave the index without slots, so every key is out of bounds.
    pub fn new(spec: Arc<KeySpec>, bounds: &[(i64, i64)]) -> Self {
        let size = bounds
            .iter()
            .try_fold(1usize, |total, &(lo, hi)| {
                let span = usize::try_from(hi.checked_sub(lo)?).ok()?;
                total.checked_mul(span)
            })
            .filter(|&size| size <= MAX_ARRAY_SLOTS)
            .unwrap_or(0);
        Self {
            spec,
            bounds: bounds.to_vec(),
            slots: vec![None; size],
            stats: IndexStats::new(),
        }
    }

    /// Returns the key spec.
    pub fn spec(&self) -> &Arc<KeySpec> {
        &self.spec
    }

    /// Returns the number of addressable slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the slot of a fully set key.
    fn slot_of(&self, entry: &Entry) -> Result<usize, IndexError> {
        if self.slots.is_empty() {
            return Err(IndexError::OutOfBounds);
        }
        let mut slot = 0usize;
        for (position, &(lo, hi)) in self.spec.positions().zip(&self.bounds) {
            let v = entry
                .get(position)
                .as_integral()
                .ok_or(IndexError::OutOfBounds)?;
            if v < lo || v >= hi {
                return Err(IndexError::OutOfBounds);
            }
            slot = slot * (hi - lo) as usize + (v - lo) as usize;
        }
        Ok(slot)
    }

    fn occupied(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.slots.iter().flatten().copied()
    }
}

impl Index for ArrayIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Array
    }

    fn is_unique(&self) -> bool {
        true
    }

    fn len(&self) -> usize {
        self.stats.entries()
    }

    fn add(&mut self, id: EntryId, entry: &Entry, _src: &dyn EntrySource) -> Result<(), IndexError> {
        let slot = self.slot_of(entry)?;
        match self.slots[slot] {
            Some(existing) if existing != id => Err(IndexError::DuplicateKey { existing }),
            Some(_) => Ok(()),
            None => {
                self.slots[slot] = Some(id);
                self.stats.add_entry();
                self.stats.add_key();
                Ok(())
            }
        }
    }

    fn remove(&mut self, id: EntryId, entry: &Entry) -> bool {
        match self.slot_of(entry) {
            Ok(slot) if self.slots[slot] == Some(id) => {
                self.slots[slot] = None;
                self.stats.remove_entry();
                self.stats.remove_key();
                true
            }
            _ => false,
        }
    }

    fn is_affected(&self, before: &Entry, after: &Entry) -> bool {
        self.spec.changed(before, after)
    }

    fn get(&self, key: &Entry, src: &dyn EntrySource) -> Option<EntryId> {
        if self.spec.is_partial(key) {
            return self
                .occupied()
                .find(|&id| src.entry(id).is_some_and(|e| self.spec.matches(key, e)));
        }
        self.slot_of(key).ok().and_then(|slot| self.slots[slot])
    }

    fn slice(&self, key: &Entry, src: &dyn EntrySource, visit: &mut dyn FnMut(EntryId)) {
        if self.spec.is_partial(key) {
            self.occupied()
                .filter(|&id| src.entry(id).is_some_and(|e| self.spec.matches(key, e)))
                .for_each(visit);
        } else if let Some(id) = self.get(key, src) {
            visit(id);
        }
    }

    fn for_each(&self, visit: &mut dyn FnMut(EntryId)) {
        self.occupied().for_each(visit);
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.stats.clear();
    }

    fn stats(&self) -> &IndexStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewstore_core::{Comparison, ShapeRegistry, Value};

    /// (warehouse, district, tax)
    fn district(w: i32, d: i32) -> Entry {
        Entry::from_values(vec![Value::Int(w), Value::Int(d), Value::Double(0.1)])
    }

    fn index() -> ArrayIndex {
        let spec = ShapeRegistry::global()
            .key_spec(district(0, 0).shape(), &[1, 2], Comparison::Equality)
            .unwrap();
        ArrayIndex::new(spec, &[(1, 3), (1, 11)])
    }

    #[test]
    fn test_capacity() {
        assert_eq!(index().capacity(), 20);
    }

    #[test]
    fn test_add_get() {
        let entries = vec![district(1, 10), district(2, 1)];
        let mut index = index();
        index.add(EntryId::new(0, 0), &entries[0], &entries).unwrap();
        index.add(EntryId::new(1, 0), &entries[1], &entries).unwrap();
        assert_eq!(index.get(&district(1, 10), &entries), Some(EntryId::new(0, 0)));
        assert_eq!(index.get(&district(2, 1), &entries), Some(EntryId::new(1, 0)));
        assert_eq!(index.get(&district(2, 2), &entries), None);
        assert_eq!(index.get(&district(9, 9), &entries), None);
    }

    #[test]
    fn test_slot_order() {
        let entries = vec![district(2, 1), district(1, 5), district(1, 2)];
        let mut index = index();
        for (i, e) in entries.iter().enumerate() {
            index.add(EntryId::new(i as u32, 0), e, &entries).unwrap();
        }
        let mut order = Vec::new();
        index.for_each(&mut |id| order.push(id.slot()));
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn test_out_of_bounds_and_duplicate() {
        let entries = vec![district(3, 1), district(1, 1), district(1, 1)];
        let mut index = index();
        assert_eq!(
            index.add(EntryId::new(0, 0), &entries[0], &entries),
            Err(IndexError::OutOfBounds)
        );
        index.add(EntryId::new(1, 0), &entries[1], &entries).unwrap();
        assert_eq!(
            index.add(EntryId::new(2, 0), &entries[2], &entries),
            Err(IndexError::DuplicateKey { existing: EntryId::new(1, 0) })
        );
    }

    #[test]
    fn test_partial_slice() {
        let entries = vec![district(1, 1), district(2, 1), district(1, 2)];
        let mut index = index();
        for (i, e) in entries.iter().enumerate() {
            index.add(EntryId::new(i as u32, 0), e, &entries).unwrap();
        }
        let key = Entry::key(entries[0].shape(), [(1, 1)]);
        let mut hits = Vec::new();
        index.slice(&key, &entries, &mut |id| hits.push(id.slot()));
        assert_eq!(hits, vec![0, 2]);
    }

    #[test]
    fn test_oversized_bounds_have_no_slots() {
        let spec = ShapeRegistry::global()
            .key_spec(district(0, 0).shape(), &[1], Comparison::Equality)
            .unwrap();
        let mut index = ArrayIndex::new(spec, &[(-1, i64::MAX)]);
        assert_eq!(index.capacity(), 0);
        let entries = vec![district(1, 1)];
        assert_eq!(
            index.add(EntryId::new(0, 0), &entries[0], &entries),
            Err(IndexError::OutOfBounds)
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let entries = vec![district(1, 1), district(1, 2)];
        let mut index = index();
        index.add(EntryId::new(0, 0), &entries[0], &entries).unwrap();
        index.add(EntryId::new(1, 0), &entries[1], &entries).unwrap();
        assert!(index.remove(EntryId::new(0, 0), &entries[0]));
        assert!(!index.remove(EntryId::new(0, 0), &entries[0]));
        assert_eq!(index.len(), 1);
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.capacity(), 20);
    }
}
