//! Ordered tree index.
//!
//! Keys are projected into owned tuples and kept in a `BTreeMap`, which gives
//! ordered iteration, range scans and extremal queries. A partial probe whose
//! leading fields are set is answered by seeking to the first key with that
//! prefix and walking forward while the prefix still matches. Once any stored
//! key holds an unset field, partial probes fall back to a filtered walk of
//! every key, since such keys sort outside the prefix they match.

use crate::stats::IndexStats;
use crate::traits::{EntrySource, Index, IndexError, KeyRange};
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::ops::{Bound, ControlFlow};
use viewstore_core::{Entry, EntryId, IndexKind, KeySpec, KeyTuple, Value};

/// Key-ordered index. Handles sharing a key keep insertion order.
#[derive(Debug)]
pub struct TreeIndex {
    spec: Arc<KeySpec>,
    map: BTreeMap<KeyTuple, Vec<EntryId>>,
    /// Number of stored keys with an unset field.
    unset_keys: usize,
    unique: bool,
    stats: IndexStats,
}

impl TreeIndex {
    /// Creates a new tree index.
    pub fn new(spec: Arc<KeySpec>, unique: bool) -> Self {
        Self {
            spec,
            map: BTreeMap::new(),
            unset_keys: 0,
            unique,
            stats: IndexStats::new(),
        }
    }

    /// Returns the key spec.
    pub fn spec(&self) -> &Arc<KeySpec> {
        &self.spec
    }

    /// Returns the first handle (in key order) matching `key`.
    pub fn first(&self, key: &Entry) -> Option<EntryId> {
        let mut found = None;
        self.scan(&self.spec.project(key), &mut |ids| {
            found = ids.first().copied();
            ControlFlow::Break(())
        });
        found
    }

    /// Returns the last handle (in key order) matching `key`.
    pub fn last(&self, key: &Entry) -> Option<EntryId> {
        let probe = self.spec.project(key);
        if self.spec.fixed_prefix(&probe) == 0 {
            return self
                .map
                .iter()
                .rev()
                .find(|(stored, _)| self.spec.equals(&probe, stored))
                .and_then(|(_, ids)| ids.last().copied());
        }
        let mut found = None;
        self.scan(&probe, &mut |ids| {
            found = ids.last().copied();
            ControlFlow::Continue(())
        });
        found
    }

    /// Visits every handle whose key falls inside `range`, in key order.
    ///
    /// A bound whose trailing fields are unset acts on its set prefix only:
    /// an inclusive upper bound `(5, *)` admits every key starting with 5.
    pub fn range(&self, range: &KeyRange<KeyTuple>, visit: &mut dyn FnMut(EntryId)) {
        let (lower, upper) = range.as_bounds();
        let start = match lower {
            Bound::Included(k) | Bound::Excluded(k) => Bound::Included(k),
            Bound::Unbounded => Bound::Unbounded,
        };
        for (key, ids) in self.map.range::<KeyTuple, _>((start, Bound::Unbounded)) {
            let above_lower = match lower {
                Bound::Included(b) => self.spec.compare(key, b) != Ordering::Less,
                Bound::Excluded(b) => self.spec.compare(key, b) == Ordering::Greater,
                Bound::Unbounded => true,
            };
            if !above_lower {
                continue;
            }
            let below_upper = match upper {
                Bound::Included(b) => self.spec.compare(key, b) != Ordering::Greater,
                Bound::Excluded(b) => self.spec.compare(key, b) == Ordering::Less,
                Bound::Unbounded => true,
            };
            if !below_upper {
                break;
            }
            ids.iter().copied().for_each(&mut *visit);
        }
    }

    /// Returns the number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.map.len()
    }

    /// Visits the handle lists of matching keys in key order.
    fn scan(&self, probe: &[Value], visit: &mut dyn FnMut(&[EntryId]) -> ControlFlow<()>) {
        if !self.spec.has_wildcard(probe) {
            if let Some(ids) = self.map.get(probe) {
                let _ = visit(ids);
            }
            return;
        }

        let fixed = self.spec.fixed_prefix(probe);
        if fixed == 0 || self.unset_keys > 0 {
            for (key, ids) in &self.map {
                if self.spec.equals(probe, key) && visit(ids).is_break() {
                    return;
                }
            }
            return;
        }

        // Unset sorts before every set value of its type, so the padded
        // prefix is a lower bound of every key sharing it.
        let lower: KeyTuple = probe
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if i < fixed {
                    v.clone()
                } else {
                    Value::unset(v.field_type())
                }
            })
            .collect();
        for (key, ids) in self.map.range::<KeyTuple, _>(lower..) {
            if self.spec.compare(&key[..fixed], &probe[..fixed]) != Ordering::Equal {
                break;
            }
            if self.spec.equals(probe, key) && visit(ids).is_break() {
                return;
            }
        }
    }
}

impl Index for TreeIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Tree
    }

    fn is_unique(&self) -> bool {
        self.unique
    }

    fn len(&self) -> usize {
        self.stats.entries()
    }

    fn add(&mut self, id: EntryId, entry: &Entry, _src: &dyn EntrySource) -> Result<(), IndexError> {
        let key = self.spec.project(entry);
        let partial = self.spec.has_wildcard(&key);
        let ids = self.map.entry(key).or_default();
        if self.unique {
            if let Some(&existing) = ids.iter().find(|&&other| other != id) {
                return Err(IndexError::DuplicateKey { existing });
            }
        }
        if ids.is_empty() {
            self.stats.add_key();
            if partial {
                self.unset_keys += 1;
            }
        }
        ids.push(id);
        self.stats.add_entry();
        Ok(())
    }

    fn remove(&mut self, id: EntryId, entry: &Entry) -> bool {
        let key = self.spec.project(entry);
        let Some(ids) = self.map.get_mut(&key) else {
            return false;
        };
        let Some(pos) = ids.iter().position(|&x| x == id) else {
            return false;
        };
        ids.remove(pos);
        if ids.is_empty() {
            self.map.remove(&key);
            self.stats.remove_key();
            if self.spec.has_wildcard(&key) {
                self.unset_keys -= 1;
            }
        }
        self.stats.remove_entry();
        true
    }

    fn is_affected(&self, before: &Entry, after: &Entry) -> bool {
        self.spec.changed(before, after)
    }

    fn get(&self, key: &Entry, _src: &dyn EntrySource) -> Option<EntryId> {
        self.first(key)
    }

    fn slice(&self, key: &Entry, _src: &dyn EntrySource, visit: &mut dyn FnMut(EntryId)) {
        self.scan(&self.spec.project(key), &mut |ids| {
            ids.iter().copied().for_each(&mut *visit);
            ControlFlow::Continue(())
        });
    }

    fn for_each(&self, visit: &mut dyn FnMut(EntryId)) {
        self.map.values().flatten().copied().for_each(visit);
    }

    fn clear(&mut self) {
        self.map.clear();
        self.unset_keys = 0;
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
    use viewstore_core::{Comparison, FieldType, ShapeRegistry};

    /// (warehouse, district, next order id)
    fn district(w: i32, d: i32, next: i32) -> Entry {
        Entry::from_values(vec![Value::Int(w), Value::Int(d), Value::Int(next)])
    }

    fn build(fields: &[usize], unique: bool, entries: &Vec<Entry>) -> TreeIndex {
        let spec = ShapeRegistry::global()
            .key_spec(district(0, 0, 0).shape(), fields, Comparison::Ordering)
            .unwrap();
        let mut index = TreeIndex::new(spec, unique);
        for (i, e) in entries.iter().enumerate() {
            index.add(EntryId::new(i as u32, 0), e, entries).unwrap();
        }
        index
    }

    fn slots(index: &TreeIndex, key: &Entry) -> Vec<u32> {
        let mut out = Vec::new();
        index.slice(key, &Vec::<Entry>::new(), &mut |id| out.push(id.slot()));
        out
    }

    fn wild(w: Option<i32>, d: Option<i32>) -> Entry {
        let shape = district(0, 0, 0).shape().clone();
        let mut key = Entry::new(&shape);
        if let Some(w) = w {
            key.set(1, w);
        }
        if let Some(d) = d {
            key.set(2, d);
        }
        key
    }

    #[test]
    fn test_natural_order() {
        let entries = vec![district(2, 1, 0), district(1, 2, 0), district(1, 1, 0)];
        let index = build(&[1, 2], true, &entries);
        let mut order = Vec::new();
        index.for_each(&mut |id| order.push(id.slot()));
        assert_eq!(order, vec![2, 1, 0]);
        assert_eq!(index.key_count(), 3);
    }

    #[test]
    fn test_unique_rejects() {
        let entries = vec![district(1, 1, 0), district(1, 1, 5)];
        let spec = ShapeRegistry::global()
            .key_spec(entries[0].shape(), &[1, 2], Comparison::Ordering)
            .unwrap();
        let mut index = TreeIndex::new(spec, true);
        index.add(EntryId::new(0, 0), &entries[0], &entries).unwrap();
        assert_eq!(
            index.add(EntryId::new(1, 0), &entries[1], &entries),
            Err(IndexError::DuplicateKey { existing: EntryId::new(0, 0) })
        );
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_prefix_slice() {
        let entries = vec![
            district(1, 1, 0),
            district(2, 1, 0),
            district(1, 3, 0),
            district(3, 1, 0),
            district(1, 2, 0),
        ];
        let index = build(&[1, 2], true, &entries);
        assert_eq!(slots(&index, &wild(Some(1), None)), vec![0, 4, 2]);
        assert_eq!(slots(&index, &wild(None, Some(1))), vec![0, 1, 3]);
        assert_eq!(slots(&index, &wild(None, None)).len(), 5);
        assert_eq!(slots(&index, &wild(Some(4), None)), Vec::<u32>::new());
    }

    #[test]
    fn test_first_last_within_prefix() {
        let entries = vec![
            district(1, 5, 0),
            district(1, 2, 0),
            district(2, 9, 0),
            district(1, 7, 0),
        ];
        let index = build(&[1, 2], true, &entries);
        assert_eq!(index.first(&wild(Some(1), None)), Some(EntryId::new(1, 0)));
        assert_eq!(index.last(&wild(Some(1), None)), Some(EntryId::new(3, 0)));
        assert_eq!(index.last(&wild(None, None)), Some(EntryId::new(2, 0)));
        assert_eq!(index.first(&wild(Some(3), None)), None);
    }

    #[test]
    fn test_non_unique_get_is_first_inserted() {
        let entries = vec![district(1, 1, 10), district(1, 1, 20)];
        let index = build(&[1], false, &entries);
        assert_eq!(index.get(&wild(Some(1), None), &entries), Some(EntryId::new(0, 0)));
        assert_eq!(index.last(&wild(Some(1), None)), Some(EntryId::new(1, 0)));
    }

    #[test]
    fn test_range() {
        let entries: Vec<Entry> = (1..=6).map(|d| district(1, d, 0)).collect();
        let index = build(&[1, 2], true, &entries);
        let key = |d: i32| vec![Value::Int(1), Value::Int(d)];

        let mut hits = Vec::new();
        index.range(&KeyRange::bound(key(2), key(4), false, true), &mut |id| {
            hits.push(id.slot())
        });
        assert_eq!(hits, vec![1, 2]);

        hits.clear();
        index.range(&KeyRange::lower_bound(key(5), true), &mut |id| hits.push(id.slot()));
        assert_eq!(hits, vec![5]);

        hits.clear();
        index.range(&KeyRange::bound(key(4), key(2), false, false), &mut |id| {
            hits.push(id.slot())
        });
        assert!(hits.is_empty());
    }

    #[test]
    fn test_range_partial_bounds() {
        let entries = vec![district(1, 1, 0), district(2, 1, 0), district(2, 2, 0), district(3, 1, 0)];
        let index = build(&[1, 2], true, &entries);
        let two = vec![Value::Int(2), Value::Unset(FieldType::Int)];

        let mut hits = Vec::new();
        index.range(&KeyRange::only(two.clone()), &mut |id| hits.push(id.slot()));
        assert_eq!(hits, vec![1, 2]);

        hits.clear();
        index.range(&KeyRange::upper_bound(two.clone(), true), &mut |id| hits.push(id.slot()));
        assert_eq!(hits, vec![0]);

        hits.clear();
        index.range(&KeyRange::lower_bound(two, true), &mut |id| hits.push(id.slot()));
        assert_eq!(hits, vec![3]);
    }

    #[test]
    fn test_unset_stored_key_agrees_with_hash() {
        use crate::hash::HashIndex;
        let unset = Value::Unset(FieldType::Int);
        let entries = vec![
            Entry::from_values(vec![unset, Value::Int(5), Value::Int(1)]),
            district(7, 5, 0),
            district(7, 6, 0),
            district(8, 1, 0),
        ];
        let tree = build(&[1, 2], false, &entries);
        let spec = ShapeRegistry::global()
            .key_spec(entries[1].shape(), &[1, 2], Comparison::Equality)
            .unwrap();
        let mut hash = HashIndex::new(spec, false);
        for (i, e) in entries.iter().enumerate() {
            hash.add(EntryId::new(i as u32, 0), e, &entries).unwrap();
        }

        for key in [
            wild(Some(7), None),
            wild(None, Some(5)),
            wild(Some(8), None),
            wild(Some(7), Some(5)),
            wild(None, None),
        ] {
            let mut from_tree = Vec::new();
            tree.slice(&key, &entries, &mut |id| from_tree.push(id.slot()));
            let mut from_hash = Vec::new();
            hash.slice(&key, &entries, &mut |id| from_hash.push(id.slot()));
            from_tree.sort_unstable();
            from_hash.sort_unstable();
            assert_eq!(from_tree, from_hash, "{key:?}");
        }
        assert_eq!(slots(&tree, &wild(Some(7), None)), vec![0, 1, 2]);

        let mut tree = tree;
        assert!(tree.remove(EntryId::new(0, 0), &entries[0]));
        assert_eq!(slots(&tree, &wild(Some(7), None)), vec![1, 2]);
    }

    #[test]
    fn test_remove() {
        let entries = vec![district(1, 1, 0), district(1, 2, 0)];
        let mut index = build(&[1, 2], true, &entries);
        assert!(index.remove(EntryId::new(0, 0), &entries[0]));
        assert!(!index.remove(EntryId::new(0, 0), &entries[0]));
        assert_eq!(index.len(), 1);
        assert_eq!(index.key_count(), 1);
        assert!(index.is_affected(&entries[0], &entries[1]));
    }
}
