//! Index statistics.

/// Counters kept by every index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Handles currently held.
    entries: usize,
    /// Distinct keys, buckets or groups currently held.
    keys: usize,
    /// Largest number of handles ever held at once.
    peak: usize,
}

impl IndexStats {
    /// Creates a new empty stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of handles.
    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Returns the number of distinct keys.
    #[inline]
    pub fn keys(&self) -> usize {
        self.keys
    }

    /// Returns the high-water mark of handles.
    #[inline]
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Records one added handle.
    pub fn add_entry(&mut self) {
        self.entries += 1;
        self.peak = self.peak.max(self.entries);
    }

    /// Records one removed handle.
    pub fn remove_entry(&mut self) {
        self.entries = self.entries.saturating_sub(1);
    }

    /// Records a key that gained its first handle.
    pub fn add_key(&mut self) {
        self.keys += 1;
    }

    /// Records a key that lost its last handle.
    pub fn remove_key(&mut self) {
        self.keys = self.keys.saturating_sub(1);
    }

    /// Resets the live counters; the peak is kept.
    pub fn clear(&mut self) {
        self.entries = 0;
        self.keys = 0;
    }
}
