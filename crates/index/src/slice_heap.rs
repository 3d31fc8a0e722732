//! Slice-heap index.
//!
//! Entries are partitioned by their group key, and each group keeps a binary
//! heap ordered on one target field. The root of a group is its minimum (or
//! maximum), readable in O(1). Every handle's heap position is tracked so
//! that removing an arbitrary entry costs O(log n).

use crate::comparator::{Comparator, Order, TargetComparator};
use crate::stats::IndexStats;
use crate::traits::{EntrySource, Index, IndexError};
use alloc::sync::Arc;
use alloc::vec::Vec;
use hashbrown::HashMap;
use viewstore_core::{Entry, EntryId, IndexKind, KeySpec, KeyTuple, Value};

type HeapItem = (Value, EntryId);

#[derive(Debug)]
struct HeapGroup {
    key: KeyTuple,
    heap: Vec<HeapItem>,
}

impl HeapGroup {
    fn sift_up(
        &mut self,
        mut pos: usize,
        cmp: &TargetComparator,
        positions: &mut HashMap<EntryId, usize>,
    ) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !cmp.is_before(&self.heap[pos], &self.heap[parent]) {
                break;
            }
            self.heap.swap(pos, parent);
            positions.insert(self.heap[pos].1, pos);
            pos = parent;
        }
        positions.insert(self.heap[pos].1, pos);
        pos
    }

    fn sift_down(
        &mut self,
        mut pos: usize,
        cmp: &TargetComparator,
        positions: &mut HashMap<EntryId, usize>,
    ) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut best = pos;
            if left < len && cmp.is_before(&self.heap[left], &self.heap[best]) {
                best = left;
            }
            if right < len && cmp.is_before(&self.heap[right], &self.heap[best]) {
                best = right;
            }
            if best == pos {
                break;
            }
            self.heap.swap(pos, best);
            positions.insert(self.heap[pos].1, pos);
            pos = best;
        }
        positions.insert(self.heap[pos].1, pos);
    }
}

/// Per-group heaps on a target field.
#[derive(Debug)]
pub struct SliceHeapIndex {
    /// Group key.
    spec: Arc<KeySpec>,
    /// 1-based target position.
    target: usize,
    cmp: TargetComparator,
    groups: HashMap<u32, Vec<HeapGroup>>,
    positions: HashMap<EntryId, usize>,
    stats: IndexStats,
}

impl SliceHeapIndex {
    /// Creates an empty index grouping by `spec` and ordering on `target`.
    pub fn new(spec: Arc<KeySpec>, target: usize, order: Order) -> Self {
        Self {
            spec,
            target,
            cmp: TargetComparator::new(order),
            groups: HashMap::new(),
            positions: HashMap::new(),
            stats: IndexStats::new(),
        }
    }

    /// Returns the group key spec.
    pub fn spec(&self) -> &Arc<KeySpec> {
        &self.spec
    }

    /// Returns the 1-based target position.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Returns the heap order.
    pub fn order(&self) -> Order {
        self.cmp.order()
    }

    /// Returns the number of non-empty groups.
    pub fn group_count(&self) -> usize {
        self.stats.keys()
    }

    /// Returns the root of the group of `key`. With unset group fields, the
    /// best root among every matching group.
    pub fn peek(&self, key: &Entry) -> Option<EntryId> {
        if self.spec.is_partial(key) {
            return self
                .matching_groups(key)
                .filter_map(|g| g.heap.first())
                .min_by(|a, b| self.cmp.compare(*a, *b))
                .map(|item| item.1);
        }
        let bucket = self.groups.get(&self.spec.hash(key))?;
        bucket
            .iter()
            .find(|g| self.is_group_of(key, g))
            .and_then(|g| g.heap.first())
            .map(|item| item.1)
    }

    fn is_group_of(&self, entry: &Entry, group: &HeapGroup) -> bool {
        self.spec
            .positions()
            .zip(&group.key)
            .all(|(p, v)| entry.get(p) == v)
    }

    fn matching_groups<'a>(&'a self, key: &'a Entry) -> impl Iterator<Item = &'a HeapGroup> + 'a {
        let probe = self.spec.project(key);
        self.groups
            .values()
            .flatten()
            .filter(move |g| self.spec.equals(&probe, &g.key))
    }
}

impl Index for SliceHeapIndex {
    fn kind(&self) -> IndexKind {
        match self.cmp.order() {
            Order::Asc => IndexKind::SliceHeapMin,
            Order::Desc => IndexKind::SliceHeapMax,
        }
    }

    fn is_unique(&self) -> bool {
        false
    }

    fn len(&self) -> usize {
        self.positions.len()
    }

    fn add(&mut self, id: EntryId, entry: &Entry, _src: &dyn EntrySource) -> Result<(), IndexError> {
        let hash = self.spec.hash(entry);
        let item = (entry.get(self.target).clone(), id);
        let bucket = self.groups.entry(hash).or_default();
        let at = match bucket.iter().position(|g| {
            self.spec
                .positions()
                .zip(&g.key)
                .all(|(p, v)| entry.get(p) == v)
        }) {
            Some(at) => at,
            None => {
                bucket.push(HeapGroup {
                    key: self.spec.project(entry),
                    heap: Vec::new(),
                });
                self.stats.add_key();
                bucket.len() - 1
            }
        };
        let group = &mut bucket[at];
        group.heap.push(item);
        group.sift_up(group.heap.len() - 1, &self.cmp, &mut self.positions);
        self.stats.add_entry();
        Ok(())
    }

    fn remove(&mut self, id: EntryId, entry: &Entry) -> bool {
        let hash = self.spec.hash(entry);
        let Some(bucket) = self.groups.get_mut(&hash) else {
            return false;
        };
        let spec = &self.spec;
        let Some(at) = bucket.iter().position(|g| {
            spec.positions()
                .zip(&g.key)
                .all(|(p, v)| entry.get(p) == v)
        }) else {
            return false;
        };
        let group = &mut bucket[at];
        let Some(&pos) = self.positions.get(&id) else {
            return false;
        };
        if group.heap.get(pos).map(|item| item.1) != Some(id) {
            return false;
        }

        self.positions.remove(&id);
        group.heap.swap_remove(pos);
        if pos < group.heap.len() {
            let settled = group.sift_up(pos, &self.cmp, &mut self.positions);
            if settled == pos {
                group.sift_down(pos, &self.cmp, &mut self.positions);
            }
        }
        if group.heap.is_empty() {
            bucket.swap_remove(at);
            self.stats.remove_key();
            if bucket.is_empty() {
                self.groups.remove(&hash);
            }
        }
        self.stats.remove_entry();
        true
    }

    fn is_affected(&self, before: &Entry, after: &Entry) -> bool {
        self.spec.changed(before, after) || before.get(self.target) != after.get(self.target)
    }

    fn get(&self, key: &Entry, _src: &dyn EntrySource) -> Option<EntryId> {
        self.peek(key)
    }

    fn slice(&self, key: &Entry, _src: &dyn EntrySource, visit: &mut dyn FnMut(EntryId)) {
        for group in self.matching_groups(key) {
            group.heap.iter().for_each(|item| visit(item.1));
        }
    }

    fn for_each(&self, visit: &mut dyn FnMut(EntryId)) {
        for group in self.groups.values().flatten() {
            group.heap.iter().for_each(|item| visit(item.1));
        }
    }

    fn clear(&mut self) {
        self.groups.clear();
        self.positions.clear();
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
    use viewstore_core::{Comparison, ShapeRegistry};

    /// (warehouse, district, order id, carrier)
    fn order(w: i32, d: i32, o: i32) -> Entry {
        Entry::from_values(vec![Value::Int(w), Value::Int(d), Value::Int(o), Value::Bool(false)])
    }

    fn heap(order_by: Order, entries: &Vec<Entry>) -> SliceHeapIndex {
        let spec = ShapeRegistry::global()
            .key_spec(entries[0].shape(), &[1, 2], Comparison::Equality)
            .unwrap();
        let mut index = SliceHeapIndex::new(spec, 3, order_by);
        for (i, e) in entries.iter().enumerate() {
            index.add(EntryId::new(i as u32, 0), e, entries).unwrap();
        }
        index
    }

    fn group(w: i32, d: i32) -> Entry {
        Entry::key(order(0, 0, 0).shape(), [(1, w), (2, d)])
    }

    #[test]
    fn test_min_per_group() {
        let entries = vec![order(1, 1, 7), order(1, 1, 3), order(1, 2, 1), order(1, 1, 5)];
        let index = heap(Order::Asc, &entries);
        assert_eq!(index.peek(&group(1, 1)), Some(EntryId::new(1, 0)));
        assert_eq!(index.peek(&group(1, 2)), Some(EntryId::new(2, 0)));
        assert_eq!(index.peek(&group(2, 1)), None);
        assert_eq!(index.group_count(), 2);
        assert_eq!(index.kind(), IndexKind::SliceHeapMin);
    }

    #[test]
    fn test_max_per_group() {
        let entries = vec![order(1, 1, 7), order(1, 1, 9), order(1, 1, 5)];
        let index = heap(Order::Desc, &entries);
        assert_eq!(index.peek(&group(1, 1)), Some(EntryId::new(1, 0)));
    }

    #[test]
    fn test_ties_pick_smaller_handle() {
        let entries = vec![order(1, 1, 4), order(1, 1, 4), order(1, 1, 4)];
        assert_eq!(heap(Order::Asc, &entries).peek(&group(1, 1)), Some(EntryId::new(0, 0)));
        assert_eq!(heap(Order::Desc, &entries).peek(&group(1, 1)), Some(EntryId::new(0, 0)));
    }

    #[test]
    fn test_remove_root_and_interior() {
        let entries: Vec<Entry> = [8, 3, 6, 1, 9, 2, 7].iter().map(|&o| order(1, 1, o)).collect();
        let mut index = heap(Order::Asc, &entries);

        assert!(index.remove(EntryId::new(3, 0), &entries[3]));
        assert_eq!(index.peek(&group(1, 1)), Some(EntryId::new(5, 0)));
        assert!(index.remove(EntryId::new(2, 0), &entries[2]));
        assert!(index.remove(EntryId::new(5, 0), &entries[5]));
        assert_eq!(index.peek(&group(1, 1)), Some(EntryId::new(1, 0)));
        assert!(!index.remove(EntryId::new(5, 0), &entries[5]));
        assert_eq!(index.len(), 4);

        let mut drained = Vec::new();
        while let Some(id) = index.peek(&group(1, 1)) {
            let slot = id.slot() as usize;
            drained.push(entries[slot].get(3).as_int().unwrap());
            assert!(index.remove(id, &entries[slot]));
        }
        assert_eq!(drained, vec![3, 7, 8, 9]);
        assert_eq!(index.group_count(), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_partial_group_peek() {
        let entries = vec![order(1, 1, 7), order(1, 2, 3), order(2, 1, 1)];
        let index = heap(Order::Asc, &entries);
        let w1 = Entry::key(entries[0].shape(), [(1, 1)]);
        assert_eq!(index.peek(&w1), Some(EntryId::new(1, 0)));

        let mut members = Vec::new();
        index.slice(&w1, &entries, &mut |id| members.push(id.slot()));
        members.sort();
        assert_eq!(members, vec![0, 1]);
    }

    #[test]
    fn test_is_affected() {
        let entries = vec![order(1, 1, 1)];
        let index = heap(Order::Asc, &entries);
        let mut moved = order(1, 1, 1);
        moved.set(4, true);
        assert!(!index.is_affected(&entries[0], &moved));
        moved.set(3, 2);
        assert!(index.is_affected(&entries[0], &moved));
    }
}
