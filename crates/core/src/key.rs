//! Generated key hashers and comparators.
//!
//! A `KeySpec` is produced once per (shape, key positions, comparison) and
//! cached by the shape registry. It projects entries onto their key, hashes the
//! projection with the mixing hash, and compares keys field by field. An unset
//! field on either side compares equal, which is what makes partial-key
//! lookups work.

use crate::entry::Entry;
use crate::hash;
use crate::shape::Shape;
use crate::value::Value;
use core::cmp::Ordering;

/// Comparison flavour of a generated key spec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// Equal / not equal (hash and list indices).
    Equality,
    /// Three-way ordering (tree indices).
    Ordering,
}

/// Projected key of an entry, in key-position order.
pub type KeyTuple = Vec<Value>;

/// Hash and compare routines specialised for one key projection of a shape.
#[derive(Debug)]
pub struct KeySpec {
    shape: Shape,
    /// Zero-based positions.
    offsets: Box<[usize]>,
    comparison: Comparison,
}

impl KeySpec {
    pub(crate) fn new(shape: Shape, positions: &[usize], comparison: Comparison) -> Self {
        Self {
            shape,
            offsets: positions.iter().map(|p| p - 1).collect(),
            comparison,
        }
    }

    /// Returns the shape this spec was generated for.
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the comparison flavour.
    #[inline]
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// Returns the number of key fields.
    #[inline]
    pub fn width(&self) -> usize {
        self.offsets.len()
    }

    /// Returns the 1-based key positions.
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.offsets.iter().map(|o| o + 1)
    }

    /// Projects an entry onto this key.
    pub fn project(&self, entry: &Entry) -> KeyTuple {
        self.offsets
            .iter()
            .map(|&o| entry.values()[o].clone())
            .collect()
    }

    /// Hashes the key fields of an entry.
    pub fn hash(&self, entry: &Entry) -> u32 {
        let values = entry.values();
        let acc = self
            .offsets
            .iter()
            .fold(hash::SEED, |acc, &o| hash::mix(acc, values[o].scalar_hash()));
        hash::finish(acc, self.offsets.len() as u32)
    }

    /// Returns true if any key field of `key` is unset.
    pub fn has_wildcard(&self, key: &[Value]) -> bool {
        key.iter().any(Value::is_unset)
    }

    /// Number of leading key fields that are set.
    pub fn fixed_prefix(&self, key: &[Value]) -> usize {
        key.iter().take_while(|v| !v.is_unset()).count()
    }

    /// Wildcard-aware key equality.
    pub fn equals(&self, a: &[Value], b: &[Value]) -> bool {
        a.iter()
            .zip(b)
            .all(|(x, y)| x.is_unset() || y.is_unset() || x == y)
    }

    /// Wildcard-aware three-way ordering; the first unequal field decides.
    pub fn compare(&self, a: &[Value], b: &[Value]) -> Ordering {
        for (x, y) in a.iter().zip(b) {
            if x.is_unset() || y.is_unset() {
                continue;
            }
            match x.cmp(y) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        Ordering::Equal
    }

    /// Returns true if `entry` matches the partial key held in `probe`.
    pub fn matches(&self, probe: &Entry, entry: &Entry) -> bool {
        let (p, e) = (probe.values(), entry.values());
        self.offsets
            .iter()
            .all(|&o| p[o].is_unset() || e[o].is_unset() || p[o] == e[o])
    }

    /// Returns true if any key field of `probe` is unset.
    pub fn is_partial(&self, probe: &Entry) -> bool {
        let values = probe.values();
        self.offsets.iter().any(|&o| values[o].is_unset())
    }

    /// Exact key equality between two entries, sentinels included. Used for
    /// uniqueness checks.
    pub fn same_key(&self, a: &Entry, b: &Entry) -> bool {
        let (x, y) = (a.values(), b.values());
        self.offsets.iter().all(|&o| x[o] == y[o])
    }

    /// Returns true if any key field differs between the two versions.
    pub fn changed(&self, before: &Entry, after: &Entry) -> bool {
        let (b, a) = (before.values(), after.values());
        self.offsets.iter().any(|&o| b[o] != a[o])
    }
}
