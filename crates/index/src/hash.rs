//! Hash index.
//!
//! Handles are bucketed by the generated hash of their key fields. A bucket
//! chain keeps insertion order, and the stored entries are compared through
//! the entry source, so no key is copied into the index.

use crate::stats::IndexStats;
use crate::traits::{EntrySource, Index, IndexError};
use alloc::sync::Arc;
use alloc::vec::Vec;
use hashbrown::HashMap;
use viewstore_core::{Entry, EntryId, IndexKind, KeySpec};

/// A hash-based index for O(1) point queries.
///
/// Probes with an unset key field cannot be hashed and fall back to a
/// filtered scan of every bucket.
#[derive(Debug)]
pub struct HashIndex {
    spec: Arc<KeySpec>,
    /// Generated hash to bucket chain.
    buckets: HashMap<u32, Vec<EntryId>>,
    unique: bool,
    stats: IndexStats,
}

impl HashIndex {
    /// Creates a new hash index.
    pub fn new(spec: Arc<KeySpec>, unique: bool) -> Self {
        Self::with_capacity(spec, unique, 0)
    }

    /// Creates a new hash index with room for `capacity` buckets.
    pub fn with_capacity(spec: Arc<KeySpec>, unique: bool, capacity: usize) -> Self {
        Self {
            spec,
            buckets: HashMap::with_capacity(capacity),
            unique,
            stats: IndexStats::new(),
        }
    }

    /// Returns the key spec.
    pub fn spec(&self) -> &Arc<KeySpec> {
        &self.spec
    }

    /// Returns the number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Visits matching handles until `visit` returns false.
    fn scan(&self, key: &Entry, src: &dyn EntrySource, visit: &mut dyn FnMut(EntryId) -> bool) {
        let matches = |id: EntryId| {
            src.entry(id)
                .is_some_and(|entry| self.spec.matches(key, entry))
        };
        if self.spec.is_partial(key) {
            for &id in self.buckets.values().flatten() {
                if matches(id) && !visit(id) {
                    return;
                }
            }
        } else if let Some(bucket) = self.buckets.get(&self.spec.hash(key)) {
            for &id in bucket {
                if matches(id) && !visit(id) {
                    return;
                }
            }
        }
    }
}

impl Index for HashIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Hash
    }

    fn is_unique(&self) -> bool {
        self.unique
    }

    fn len(&self) -> usize {
        self.stats.entries()
    }

    fn add(&mut self, id: EntryId, entry: &Entry, src: &dyn EntrySource) -> Result<(), IndexError> {
        let hash = self.spec.hash(entry);
        if self.unique {
            if let Some(bucket) = self.buckets.get(&hash) {
                let clash = bucket.iter().copied().find(|&other| {
                    other != id
                        && src
                            .entry(other)
                            .is_some_and(|stored| self.spec.same_key(entry, stored))
                });
                if let Some(existing) = clash {
                    return Err(IndexError::DuplicateKey { existing });
                }
            }
        }

        let bucket = self.buckets.entry(hash).or_default();
        if bucket.is_empty() {
            self.stats.add_key();
        }
        bucket.push(id);
        self.stats.add_entry();
        Ok(())
    }

    fn remove(&mut self, id: EntryId, entry: &Entry) -> bool {
        let hash = self.spec.hash(entry);
        let Some(bucket) = self.buckets.get_mut(&hash) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|&x| x == id) else {
            return false;
        };
        bucket.remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(&hash);
            self.stats.remove_key();
        }
        self.stats.remove_entry();
        true
    }

    fn is_affected(&self, before: &Entry, after: &Entry) -> bool {
        self.spec.changed(before, after)
    }

    fn get(&self, key: &Entry, src: &dyn EntrySource) -> Option<EntryId> {
        let mut found = None;
        self.scan(key, src, &mut |id| {
            found = Some(id);
            false
        });
        found
    }

    fn slice(&self, key: &Entry, src: &dyn EntrySource, visit: &mut dyn FnMut(EntryId)) {
        self.scan(key, src, &mut |id| {
            visit(id);
            true
        });
    }

    fn for_each(&self, visit: &mut dyn FnMut(EntryId)) {
        self.buckets.values().flatten().copied().for_each(visit);
    }

    fn clear(&mut self) {
        self.buckets.clear();
        self.stats.clear();
    }

    fn stats(&self) -> &IndexStats {
        &self.stats
    }
}
