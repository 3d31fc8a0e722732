//! Store layout builder.

use crate::store::Store;
use viewstore_core::{Error, IndexDescriptor, IndexKind, Result, Shape, ShapeRegistry};

/// Builder for a [`Store`] and its index layout.
///
/// The primary index always lands in slot 0 and secondary indices follow in
/// declaration order. Each slice heap is placed after the secondaries,
/// preceded by a non-unique hash index on its group unless one is declared.
///
/// ```rust
/// use viewstore_core::{FieldType, Shape};
/// use viewstore_storage::StoreBuilder;
///
/// let shape = Shape::of(&[FieldType::Int, FieldType::Int, FieldType::Double]);
/// let store = StoreBuilder::new(shape)
///     .primary_hash(&[1])
///     .slice_min(&[2], 3)
///     .build()
///     .unwrap();
/// assert_eq!(store.index_count(), 3);
/// ```
#[derive(Debug)]
pub struct StoreBuilder {
    shape: Shape,
    primary: Option<IndexDescriptor>,
    secondary: Vec<IndexDescriptor>,
    heaps: Vec<IndexDescriptor>,
    capacity: usize,
}

impl StoreBuilder {
    /// Starts a layout for `shape`.
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            primary: None,
            secondary: Vec::new(),
            heaps: Vec::new(),
            capacity: 0,
        }
    }

    /// Starts from the layout last recorded for `shape` by any store.
    pub fn like(shape: &Shape) -> Result<Self> {
        let mut layout = ShapeRegistry::global()
            .layout(shape)
            .ok_or_else(|| Error::invalid_descriptor(format!("no layout recorded for {shape}")))?
            .into_iter();
        let mut builder = Self::new(shape.clone());
        builder.primary = layout.next();
        builder.secondary = layout.collect();
        Ok(builder)
    }

    /// Sets a unique hash primary index.
    pub fn primary_hash(self, fields: &[usize]) -> Self {
        self.primary(IndexDescriptor::hash(fields, true))
    }

    /// Sets a unique tree primary index.
    pub fn primary_tree(self, fields: &[usize]) -> Self {
        self.primary(IndexDescriptor::tree(fields, true))
    }

    /// Sets an array primary index; each key is `(position, lo, hi)`.
    pub fn primary_array(self, keys: &[(usize, i64, i64)]) -> Self {
        self.primary(IndexDescriptor::array(keys))
    }

    /// Sets a list primary index, for stores that are only scanned.
    pub fn primary_list(self) -> Self {
        self.primary(IndexDescriptor::list(&[]))
    }

    /// Sets the primary index.
    pub fn primary(mut self, descriptor: IndexDescriptor) -> Self {
        self.primary = Some(descriptor);
        self
    }

    /// Adds a secondary hash index.
    pub fn hash_index(self, fields: &[usize], unique: bool) -> Self {
        self.index(IndexDescriptor::hash(fields, unique))
    }

    /// Adds a secondary tree index.
    pub fn tree_index(self, fields: &[usize], unique: bool) -> Self {
        self.index(IndexDescriptor::tree(fields, unique))
    }

    /// Adds a secondary list index.
    pub fn list_index(self, fields: &[usize]) -> Self {
        self.index(IndexDescriptor::list(fields))
    }

    /// Adds a secondary index.
    pub fn index(mut self, descriptor: IndexDescriptor) -> Self {
        self.secondary.push(descriptor);
        self
    }

    /// Adds a min slice heap on `target` per `group`.
    pub fn slice_min(mut self, group: &[usize], target: usize) -> Self {
        self.heaps.push(IndexDescriptor::slice_min(group, target));
        self
    }

    /// Adds a max slice heap on `target` per `group`.
    pub fn slice_max(mut self, group: &[usize], target: usize) -> Self {
        self.heaps.push(IndexDescriptor::slice_max(group, target));
        self
    }

    /// Sets the expected number of entries.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builds the store.
    pub fn build(self) -> Result<Store> {
        let primary = self
            .primary
            .ok_or_else(|| Error::invalid_descriptor("a store needs a primary index"))?;
        let mut descriptors = Vec::with_capacity(1 + self.secondary.len() + 2 * self.heaps.len());
        descriptors.push(primary);
        descriptors.extend(self.secondary);

        for heap in self.heaps {
            let grouping = descriptors
                .iter()
                .position(|d| d.kind() == IndexKind::Hash && d.fields() == heap.fields());
            let partition = match grouping {
                Some(slot) => slot,
                None => {
                    descriptors.push(IndexDescriptor::hash(heap.fields(), false));
                    descriptors.len() - 1
                }
            };
            descriptors.push(heap.with_partition(partition));
        }

        Store::with_capacity(self.shape, descriptors, self.capacity)
    }
}
