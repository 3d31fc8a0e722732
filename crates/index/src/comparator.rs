//! Ordering helpers for heap-ordered indices.

use core::cmp::Ordering;
use viewstore_core::{EntryId, Value};

/// Sort order of a heap-ordered index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    /// Ascending order (smallest first)
    Asc,
    /// Descending order (largest first)
    Desc,
}

impl Order {
    /// Applies this order to a comparison result.
    #[inline]
    pub fn apply(&self, ord: Ordering) -> Ordering {
        match self {
            Order::Asc => ord,
            Order::Desc => ord.reverse(),
        }
    }
}

/// Trait for comparing heap items.
pub trait Comparator<K> {
    /// Compares two items according to the comparator's ordering.
    fn compare(&self, a: &K, b: &K) -> Ordering;

    /// Returns true if `a` must sit above `b`.
    fn is_before(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

/// Orders `(target value, handle)` pairs by value under an [`Order`]. Equal
/// values fall back to the smaller handle in both orders, so the root of a
/// heap is deterministic.
#[derive(Clone, Copy, Debug)]
pub struct TargetComparator {
    order: Order,
}

impl TargetComparator {
    /// Creates a comparator with the given order.
    pub fn new(order: Order) -> Self {
        Self { order }
    }

    /// Returns the order.
    pub fn order(&self) -> Order {
        self.order
    }
}

impl Comparator<(Value, EntryId)> for TargetComparator {
    fn compare(&self, a: &(Value, EntryId), b: &(Value, EntryId)) -> Ordering {
        self.order.apply(a.0.cmp(&b.0)).then_with(|| a.1.cmp(&b.1))
    }
}
