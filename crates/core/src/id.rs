//! Stable entry handles.

use core::fmt;

/// Handle of an entry held by a store.
///
/// The slot is reused after a delete; the generation is bumped on every reuse
/// so that stale handles never alias a newer entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId {
    slot: u32,
    generation: u32,
}

impl EntryId {
    /// Creates a handle from its parts.
    #[inline]
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// Returns the slot number.
    #[inline]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Returns the generation of the slot this handle was issued for.
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.slot, self.generation)
    }
}
