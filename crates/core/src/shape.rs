//! Shapes and the process-wide shape registry.
//!
//! A shape is the ordered field-type signature of a record family. Shapes are
//! interned the first time a signature is seen and live for the rest of the
//! process. The registry also caches the generated key specs of every
//! (shape, key positions, comparison) triple and remembers the index layout
//! declared for each shape, so that further stores of the same shape can be
//! built with an identical layout.

use crate::descriptor::IndexDescriptor;
use crate::error::{Error, Result};
use crate::key::{Comparison, KeySpec};
use crate::types::FieldType;
use core::fmt;
use core::hash::{Hash, Hasher};
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

/// Interned identifier of a shape.
pub type ShapeId = u32;

#[derive(Debug)]
struct ShapeInner {
    id: ShapeId,
    fields: Box<[FieldType]>,
    signature: String,
}

/// Ordered field-type signature of a record family. Cheap to clone.
#[derive(Clone)]
pub struct Shape(Arc<ShapeInner>);

impl Shape {
    /// Returns the interned shape for the given field types.
    pub fn of(fields: &[FieldType]) -> Self {
        ShapeRegistry::global().intern(fields)
    }

    /// Parses a signature such as `"IISDS"`.
    pub fn parse(signature: &str) -> Option<Self> {
        let fields: Option<Vec<FieldType>> = signature.chars().map(FieldType::from_code).collect();
        fields.map(|f| Self::of(&f))
    }

    /// Returns the interned id.
    #[inline]
    pub fn id(&self) -> ShapeId {
        self.0.id
    }

    /// Returns the number of fields.
    #[inline]
    pub fn arity(&self) -> usize {
        self.0.fields.len()
    }

    /// Returns the field types in position order.
    #[inline]
    pub fn fields(&self) -> &[FieldType] {
        &self.0.fields
    }

    /// Returns the type of a 1-based position.
    pub fn field(&self, position: usize) -> Option<FieldType> {
        position
            .checked_sub(1)
            .and_then(|i| self.0.fields.get(i))
            .copied()
    }

    /// Returns the signature string.
    #[inline]
    pub fn signature(&self) -> &str {
        &self.0.signature
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Shape {}

impl Hash for Shape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({})", self.0.signature)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SEntry{}_{}", self.arity(), self.0.signature)
    }
}

type SpecKey = (ShapeId, Box<[usize]>, Comparison);

#[derive(Default)]
struct RegistryInner {
    shapes: HashMap<Box<[FieldType]>, Shape>,
    specs: HashMap<SpecKey, Arc<KeySpec>>,
    layouts: HashMap<ShapeId, Vec<IndexDescriptor>>,
}

/// Process-wide registry of shapes, key specs and index layouts.
pub struct ShapeRegistry {
    inner: Mutex<RegistryInner>,
}

impl ShapeRegistry {
    /// Returns the process-wide registry.
    pub fn global() -> &'static ShapeRegistry {
        static REGISTRY: OnceLock<ShapeRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| ShapeRegistry {
            inner: Mutex::new(RegistryInner::default()),
        })
    }

    /// Interns a field-type signature.
    pub fn intern(&self, fields: &[FieldType]) -> Shape {
        let mut inner = self.inner.lock();
        if let Some(shape) = inner.shapes.get(fields) {
            return shape.clone();
        }
        let shape = Shape(Arc::new(ShapeInner {
            id: inner.shapes.len() as ShapeId,
            fields: fields.into(),
            signature: fields.iter().map(FieldType::code).collect(),
        }));
        tracing::debug!(shape = %shape, id = shape.id(), "interned new shape");
        inner.shapes.insert(fields.into(), shape.clone());
        shape
    }

    /// Returns the cached key spec for the given projection, generating it on
    /// first request.
    ///
    /// Positions are 1-based. An empty position list selects every field.
    pub fn key_spec(
        &self,
        shape: &Shape,
        positions: &[usize],
        comparison: Comparison,
    ) -> Result<Arc<KeySpec>> {
        let all: Vec<usize>;
        let positions = if positions.is_empty() {
            all = (1..=shape.arity()).collect();
            &all[..]
        } else {
            positions
        };
        for (i, &p) in positions.iter().enumerate() {
            if p == 0 || p > shape.arity() {
                return Err(Error::invalid_descriptor(format!(
                    "key position {p} out of range for shape {shape}"
                )));
            }
            if positions[..i].contains(&p) {
                return Err(Error::invalid_descriptor(format!(
                    "key position {p} listed twice"
                )));
            }
        }

        let key: SpecKey = (shape.id(), positions.into(), comparison);
        let mut inner = self.inner.lock();
        let spec = inner
            .specs
            .entry(key)
            .or_insert_with(|| Arc::new(KeySpec::new(shape.clone(), positions, comparison)));
        Ok(Arc::clone(spec))
    }

    /// Records the index layout used for stores of `shape`.
    pub fn record_layout(&self, shape: &Shape, descriptors: &[IndexDescriptor]) {
        self.inner
            .lock()
            .layouts
            .insert(shape.id(), descriptors.to_vec());
    }

    /// Returns the index layout last recorded for `shape`.
    pub fn layout(&self, shape: &Shape) -> Option<Vec<IndexDescriptor>> {
        self.inner.lock().layouts.get(&shape.id()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning() {
        let a = Shape::of(&[FieldType::Int, FieldType::Str]);
        let b = Shape::of(&[FieldType::Int, FieldType::Str]);
        let c = Shape::of(&[FieldType::Str, FieldType::Int]);
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert_ne!(a, c);
    }

    #[test]
    fn test_signature() {
        let s = Shape::parse("IISDS").unwrap();
        assert_eq!(s.signature(), "IISDS");
        assert_eq!(s.arity(), 5);
        assert_eq!(s.field(3), Some(FieldType::Str));
        assert_eq!(s.field(0), None);
        assert_eq!(s.field(6), None);
        assert_eq!(s.to_string(), "SEntry5_IISDS");
        assert!(Shape::parse("IQ").is_none());
    }

    #[test]
    fn test_key_spec_cached() {
        let s = Shape::parse("IIID").unwrap();
        let reg = ShapeRegistry::global();
        let a = reg.key_spec(&s, &[1, 2], Comparison::Equality).unwrap();
        let b = reg.key_spec(&s, &[1, 2], Comparison::Equality).unwrap();
        let c = reg.key_spec(&s, &[1, 2], Comparison::Ordering).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_key_spec_rejects_bad_positions() {
        let s = Shape::parse("II").unwrap();
        let reg = ShapeRegistry::global();
        assert!(reg.key_spec(&s, &[3], Comparison::Equality).is_err());
        assert!(reg.key_spec(&s, &[0], Comparison::Equality).is_err());
        assert!(reg.key_spec(&s, &[1, 1], Comparison::Equality).is_err());
        assert_eq!(reg.key_spec(&s, &[], Comparison::Equality).unwrap().width(), 2);
    }

    #[test]
    fn test_layout_roundtrip() {
        let s = Shape::parse("LLS").unwrap();
        let reg = ShapeRegistry::global();
        let layout = vec![IndexDescriptor::hash(&[1], true)];
        reg.record_layout(&s, &layout);
        assert_eq!(reg.layout(&s), Some(layout));
    }
}
