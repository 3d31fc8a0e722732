//! Scan-only list index.

use crate::stats::IndexStats;
use crate::traits::{EntrySource, Index, IndexError};
use alloc::sync::Arc;
use alloc::vec::Vec;
use viewstore_core::{Entry, EntryId, IndexKind, KeySpec};

/// Handles kept in insertion order. Every lookup is a linear scan comparing
/// its key fields.
#[derive(Debug)]
pub struct ListIndex {
    spec: Arc<KeySpec>,
    ids: Vec<EntryId>,
    stats: IndexStats,
}

impl ListIndex {
    /// Creates an empty list comparing the fields of `spec`.
    pub fn new(spec: Arc<KeySpec>) -> Self {
        Self::with_capacity(spec, 0)
    }

    /// Creates an empty list with room for `capacity` handles.
    pub fn with_capacity(spec: Arc<KeySpec>, capacity: usize) -> Self {
        Self {
            spec,
            ids: Vec::with_capacity(capacity),
            stats: IndexStats::new(),
        }
    }

    /// Returns the key spec.
    pub fn spec(&self) -> &Arc<KeySpec> {
        &self.spec
    }

    fn matching<'a>(
        &'a self,
        key: &'a Entry,
        src: &'a dyn EntrySource,
    ) -> impl Iterator<Item = EntryId> + 'a {
        self.ids.iter().copied().filter(move |&id| {
            src.entry(id)
                .is_some_and(|entry| self.spec.matches(key, entry))
        })
    }
}

impl Index for ListIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::List
    }

    fn is_unique(&self) -> bool {
        false
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn add(&mut self, id: EntryId, _entry: &Entry, _src: &dyn EntrySource) -> Result<(), IndexError> {
        self.ids.push(id);
        self.stats.add_entry();
        Ok(())
    }

    fn remove(&mut self, id: EntryId, _entry: &Entry) -> bool {
        match self.ids.iter().position(|&x| x == id) {
            Some(pos) => {
                self.ids.remove(pos);
                self.stats.remove_entry();
                true
            }
            None => false,
        }
    }

    fn is_affected(&self, _before: &Entry, _after: &Entry) -> bool {
        false
    }

    fn get(&self, key: &Entry, src: &dyn EntrySource) -> Option<EntryId> {
        self.matching(key, src).next()
    }

    fn slice(&self, key: &Entry, src: &dyn EntrySource, visit: &mut dyn FnMut(EntryId)) {
        self.matching(key, src).for_each(visit);
    }

    fn for_each(&self, visit: &mut dyn FnMut(EntryId)) {
        self.ids.iter().copied().for_each(visit);
    }

    fn clear(&mut self) {
        self.ids.clear();
        self.stats.clear();
    }

    fn stats(&self) -> &IndexStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use viewstore_core::{Comparison, Shape, ShapeRegistry, Value};

    fn entries() -> Vec<Entry> {
        [(1, "a"), (2, "b"), (1, "c")]
            .iter()
            .map(|&(k, s)| Entry::from_values(vec![Value::Int(k), Value::from(s)]))
            .collect()
    }

    fn list(fields: &[usize]) -> (ListIndex, Vec<Entry>) {
        let entries = entries();
        let spec = ShapeRegistry::global()
            .key_spec(entries[0].shape(), fields, Comparison::Equality)
            .unwrap();
        let mut index = ListIndex::new(spec);
        for (i, e) in entries.iter().enumerate() {
            index.add(EntryId::new(i as u32, 0), e, &entries).unwrap();
        }
        (index, entries)
    }

    fn collect(index: &ListIndex, key: &Entry, src: &Vec<Entry>) -> Vec<u32> {
        let mut out = Vec::new();
        index.slice(key, src, &mut |id| out.push(id.slot()));
        out
    }

    #[test]
    fn test_insertion_order() {
        let (index, _) = list(&[]);
        let mut order = Vec::new();
        index.for_each(&mut |id| order.push(id.slot()));
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_slice_wildcard() {
        let (index, entries) = list(&[1]);
        let shape: Shape = entries[0].shape().clone();
        let key = Entry::key(&shape, [(1, 1)]);
        assert_eq!(collect(&index, &key, &entries), vec![0, 2]);
        assert_eq!(index.get(&key, &entries), Some(EntryId::new(0, 0)));
        assert_eq!(collect(&index, &Entry::new(&shape), &entries), vec![0, 1, 2]);
    }

    #[test]
    fn test_full_field_compare() {
        let (index, entries) = list(&[]);
        let probe = Entry::from_values(vec![Value::Int(1), Value::from("c")]);
        assert_eq!(index.get(&probe, &entries), Some(EntryId::new(2, 0)));
    }

    #[test]
    fn test_remove_keeps_order() {
        let (mut index, entries) = list(&[]);
        assert!(index.remove(EntryId::new(1, 0), &entries[1]));
        assert!(!index.remove(EntryId::new(1, 0), &entries[1]));
        let mut order = Vec::new();
        index.for_each(&mut |id| order.push(id.slot()));
        assert_eq!(order, vec![0, 2]);
        assert_eq!(index.stats().entries(), 2);
    }
}
