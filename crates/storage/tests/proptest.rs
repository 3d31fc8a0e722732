//! Property-based tests for viewstore-storage using proptest.

use proptest::prelude::*;
use viewstore_core::{Entry, EntryId, FieldType, Shape, Value};
use viewstore_storage::{Store, StoreBuilder};

/// (id, group, amount)
fn shape() -> Shape {
    Shape::of(&[FieldType::Int, FieldType::Int, FieldType::Long])
}

fn row(id: i32, group: i32, amount: i64) -> Entry {
    Entry::from_values(vec![Value::Int(id), Value::Int(group), Value::Long(amount)])
}

fn id_key(id: i32) -> Entry {
    Entry::key(&shape(), [(1, id)])
}

fn group_key(group: i32) -> Entry {
    Entry::key(&shape(), [(2, group)])
}

fn store() -> Store {
    StoreBuilder::new(shape())
        .primary_hash(&[1])
        .tree_index(&[2, 3], false)
        .slice_max(&[2], 3)
        .build()
        .unwrap()
}

#[derive(Clone, Debug)]
enum Op {
    Insert(i32, i32, i64),
    SetAmount(i32, i64),
    SetGroup(i32, i32),
    Delete(i32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0i32..30, 0i32..4, -100i64..100).prop_map(|(i, g, a)| Op::Insert(i, g, a)),
        2 => (0i32..30, -100i64..100).prop_map(|(i, a)| Op::SetAmount(i, a)),
        1 => (0i32..30, 0i32..4).prop_map(|(i, g)| Op::SetGroup(i, g)),
        1 => (0i32..30).prop_map(Op::Delete),
    ]
}

fn apply(store: &mut Store, op: &Op) {
    match *op {
        Op::Insert(i, g, a) => {
            let _ = store.insert(row(i, g, a));
        }
        Op::SetAmount(i, a) => {
            if let Some(id) = store.get_id(0, &id_key(i)) {
                store.update(id, |e| e.set(3, a)).unwrap();
            }
        }
        Op::SetGroup(i, g) => {
            if let Some(id) = store.get_id(0, &id_key(i)) {
                store.update(id, |e| e.set(2, g)).unwrap();
            }
        }
        Op::Delete(i) => {
            store.delete_by_key(0, &id_key(i));
        }
    }
}

fn count(store: &Store) -> usize {
    let mut n = 0;
    store.for_each(|_, _| n += 1);
    n
}

proptest! {
    /// The entry count equals the length of one full traversal, and every
    /// index holds every entry.
    #[test]
    fn prop_len_matches_traversal(ops in prop::collection::vec(op(), 0..120)) {
        let mut store = store();
        for op in &ops {
            apply(&mut store, op);
            prop_assert_eq!(store.len(), count(&store));
        }
        for slot in 0..store.index_count() {
            prop_assert_eq!(store.index_len(slot), store.len());
        }
    }

    /// The slice maximum equals the maximum over a filtered traversal.
    #[test]
    fn prop_slice_max_matches_scan(ops in prop::collection::vec(op(), 0..120)) {
        let mut store = store();
        for op in &ops {
            apply(&mut store, op);
            for group in 0..4 {
                let mut expected: Option<i64> = None;
                store.for_each(|_, e| {
                    if e.get(2).as_int() == Some(group) {
                        let amount = e.get(3).as_long().unwrap();
                        expected = Some(expected.map_or(amount, |m| m.max(amount)));
                    }
                });
                let got = store
                    .slice_max(&group_key(group), &[2], 3)
                    .unwrap()
                    .map(|e| e.get(3).as_long().unwrap());
                prop_assert_eq!(got, expected);
            }
        }
    }

    /// Lookups through the primary and the tree reflect the latest values.
    #[test]
    fn prop_lookups_follow_updates(ops in prop::collection::vec(op(), 0..120)) {
        let mut store = store();
        for op in &ops {
            apply(&mut store, op);
        }
        let mut live: Vec<(EntryId, Entry)> = Vec::new();
        store.for_each(|id, e| live.push((id, e.clone())));
        for (id, entry) in &live {
            let key = entry.get(1).as_int().unwrap();
            prop_assert_eq!(store.get_id(0, &id_key(key)), Some(*id));

            let mut tree_key = Entry::new(&shape());
            tree_key.set(2, entry.get(2).clone());
            tree_key.set(3, entry.get(3).clone());
            let mut found = false;
            store.slice(1, &tree_key, |hit, _| found |= hit == *id);
            prop_assert!(found);
        }
    }

    /// Distinct primary keys round trip through traversal and clear.
    #[test]
    fn prop_round_trip_and_clear(ids in prop::collection::hash_set(0i32..1000, 0..100)) {
        let mut store = store();
        for &i in &ids {
            store.insert(row(i, i % 4, i64::from(i))).unwrap();
        }
        prop_assert_eq!(count(&store), ids.len());
        store.clear();
        prop_assert_eq!(count(&store), 0);
        prop_assert!(store.is_empty());
    }

    /// A rejected duplicate leaves the store exactly as it was.
    #[test]
    fn prop_duplicate_rejected(rows in prop::collection::vec((0i32..20, 0i32..4, -5i64..5), 1..60)) {
        let mut store = store();
        for &(i, g, a) in &rows {
            let before = store.len();
            let existing = store.get_copy(0, &id_key(i));
            let result = store.insert(row(i, g, a));
            match existing {
                Some(old) => {
                    prop_assert!(result.unwrap_err().is_duplicate_key());
                    prop_assert_eq!(store.len(), before);
                    prop_assert_eq!(store.get_copy(0, &id_key(i)), Some(old));
                }
                None => {
                    prop_assert!(result.is_ok());
                    prop_assert_eq!(store.len(), before + 1);
                }
            }
        }
    }
}
