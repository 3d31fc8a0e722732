//! Entry structure.
//!
//! An `Entry` is a fixed-arity tuple of values conforming to one shape. Entries
//! are addressed positionally starting at 1.

use crate::error::{Error, Result};
use crate::shape::Shape;
use crate::types::FieldType;
use crate::value::Value;
use core::fmt;

/// A mutable record of one shape.
#[derive(Clone, PartialEq)]
pub struct Entry {
    shape: Shape,
    values: Box<[Value]>,
}

impl Entry {
    /// Creates an entry of the given shape with every field unset.
    pub fn new(shape: &Shape) -> Self {
        Self {
            values: shape.fields().iter().map(|&ty| Value::Unset(ty)).collect(),
            shape: shape.clone(),
        }
    }

    /// Creates an entry from values, interning the shape they imply.
    pub fn from_values(values: Vec<Value>) -> Self {
        let types: Vec<FieldType> = values.iter().map(Value::field_type).collect();
        Self {
            shape: Shape::of(&types),
            values: values.into_boxed_slice(),
        }
    }

    /// Creates a lookup key: every field unset except the given ones.
    ///
    /// # Panics
    ///
    /// Panics if a position is out of range or a value has the wrong type.
    pub fn key<V: Into<Value>>(shape: &Shape, fields: impl IntoIterator<Item = (usize, V)>) -> Self {
        let mut entry = Self::new(shape);
        for (position, value) in fields {
            entry.set(position, value);
        }
        entry
    }

    /// Returns the shape.
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the number of fields.
    #[inline]
    pub fn arity(&self) -> usize {
        self.values.len()
    }

    /// Returns all values in position order.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the value at a 1-based position.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of range.
    #[inline]
    pub fn get(&self, position: usize) -> &Value {
        &self.values[self.offset(position)]
    }

    /// Writes a value at a 1-based position.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of range or the value has the wrong type.
    pub fn set(&mut self, position: usize, value: impl Into<Value>) {
        if let Err(err) = self.try_set(position, value) {
            panic!("{err}");
        }
    }

    /// Checked form of [`Entry::set`].
    pub fn try_set(&mut self, position: usize, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let offset = self.checked_offset(position)?;
        let expected = self.shape.fields()[offset];
        if value.field_type() != expected {
            return Err(Error::TypeMismatch {
                position,
                expected,
                got: value.field_type(),
            });
        }
        self.values[offset] = value;
        Ok(())
    }

    /// Resets a position to its sentinel.
    pub fn unset(&mut self, position: usize) {
        let offset = self.offset(position);
        self.values[offset] = Value::Unset(self.shape.fields()[offset]);
    }

    /// Returns true if the position holds its sentinel.
    #[inline]
    pub fn is_unset(&self, position: usize) -> bool {
        self.get(position).is_unset()
    }

    /// Adds `delta` to a numeric position. Integers saturate, doubles
    /// accumulate, and an unset position starts from zero.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of range, not numeric, or `delta` has a
    /// different type.
    pub fn increase(&mut self, position: usize, delta: impl Into<Value>) {
        self.accumulate(position, delta.into(), false);
    }

    /// Subtracts `delta` from a numeric position. See [`Entry::increase`].
    pub fn decrease(&mut self, position: usize, delta: impl Into<Value>) {
        self.accumulate(position, delta.into(), true);
    }

    fn accumulate(&mut self, position: usize, delta: Value, negate: bool) {
        let offset = self.offset(position);
        let ty = self.shape.fields()[offset];
        assert!(
            ty.is_numeric() && delta.field_type() == ty,
            "cannot accumulate {} into {ty} position {position}",
            delta.field_type()
        );
        let current = &self.values[offset];
        let next = match (current, &delta) {
            (Value::Unset(_), _) if !negate => delta.clone(),
            (Value::Unset(_), Value::Int(d)) => Value::Int(0i32.saturating_sub(*d)),
            (Value::Unset(_), Value::Long(d)) => Value::Long(0i64.saturating_sub(*d)),
            (Value::Unset(_), Value::Date(d)) => Value::Date(0i64.saturating_sub(*d)),
            (Value::Unset(_), Value::Double(d)) => Value::Double(-d),
            (Value::Int(c), Value::Int(d)) if negate => Value::Int(c.saturating_sub(*d)),
            (Value::Int(c), Value::Int(d)) => Value::Int(c.saturating_add(*d)),
            (Value::Long(c), Value::Long(d)) if negate => Value::Long(c.saturating_sub(*d)),
            (Value::Long(c), Value::Long(d)) => Value::Long(c.saturating_add(*d)),
            (Value::Date(c), Value::Date(d)) if negate => Value::Date(c.saturating_sub(*d)),
            (Value::Date(c), Value::Date(d)) => Value::Date(c.saturating_add(*d)),
            (Value::Double(c), Value::Double(d)) if negate => Value::Double(c - d),
            (Value::Double(c), Value::Double(d)) => Value::Double(c + d),
            // unset delta leaves the field as it is
            _ => current.clone(),
        };
        self.values[offset] = next;
    }

    /// Field-wise equality with a tolerance on doubles.
    pub fn approx_eq(&self, other: &Entry) -> bool {
        self.shape == other.shape
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(a, b)| a.approx_eq(b))
    }

    #[inline]
    fn offset(&self, position: usize) -> usize {
        match self.checked_offset(position) {
            Ok(offset) => offset,
            Err(err) => panic!("{err}"),
        }
    }

    fn checked_offset(&self, position: usize) -> Result<usize> {
        if position == 0 || position > self.values.len() {
            return Err(Error::PositionOutOfRange {
                position,
                arity: self.values.len(),
            });
        }
        Ok(position - 1)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.shape.signature())?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str(")")
    }
}
