//! Entry slab.
//!
//! Entries of a store live in a slab of generational slots. A deleted slot
//! goes on a free list and is reused by the next insert with its generation
//! bumped, so an `EntryId` held past a delete never reaches the new occupant.

use viewstore_core::{Entry, EntryId};
use viewstore_index::EntrySource;

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Generational storage for the entries of one store.
#[derive(Debug, Default)]
pub struct EntrySlab {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl EntrySlab {
    /// Creates an empty slab.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty slab with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Returns the number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no entry is live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores an entry and returns its handle.
    pub fn insert(&mut self, entry: Entry) -> EntryId {
        self.len += 1;
        match self.free.pop() {
            Some(slot) => {
                let cell = &mut self.slots[slot as usize];
                cell.entry = Some(entry);
                EntryId::new(slot, cell.generation)
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                EntryId::new(slot, 0)
            }
        }
    }

    /// Removes and returns the entry behind `id`.
    pub fn remove(&mut self, id: EntryId) -> Option<Entry> {
        let cell = self.slots.get_mut(id.slot() as usize)?;
        if cell.generation != id.generation() {
            return None;
        }
        let entry = cell.entry.take()?;
        cell.generation = cell.generation.wrapping_add(1);
        self.free.push(id.slot());
        self.len -= 1;
        Some(entry)
    }

    /// Returns the entry behind `id`.
    #[inline]
    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.slots
            .get(id.slot() as usize)
            .filter(|cell| cell.generation == id.generation())
            .and_then(|cell| cell.entry.as_ref())
    }

    /// Returns the entry behind `id` mutably.
    #[inline]
    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.slots
            .get_mut(id.slot() as usize)
            .filter(|cell| cell.generation == id.generation())
            .and_then(|cell| cell.entry.as_mut())
    }

    /// Returns true if `id` refers to a live entry.
    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    /// Iterates live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &Entry)> + '_ {
        self.slots.iter().enumerate().filter_map(|(slot, cell)| {
            cell.entry
                .as_ref()
                .map(|entry| (EntryId::new(slot as u32, cell.generation), entry))
        })
    }

    /// Removes every entry. Outstanding handles are invalidated.
    pub fn clear(&mut self) {
        self.drain();
    }

    /// Removes every entry and returns them in slot order.
    pub fn drain(&mut self) -> Vec<Entry> {
        let mut out = Vec::with_capacity(self.len);
        self.free.clear();
        for (slot, cell) in self.slots.iter_mut().enumerate() {
            if let Some(entry) = cell.entry.take() {
                cell.generation = cell.generation.wrapping_add(1);
                out.push(entry);
            }
            self.free.push(slot as u32);
        }
        self.len = 0;
        out
    }
}

impl EntrySource for EntrySlab {
    fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.get(id)
    }
}
