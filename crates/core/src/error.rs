//! Error types for viewstore.

use crate::shape::Shape;
use crate::types::FieldType;
use crate::value::Value;
use thiserror::Error;

/// Result type alias for viewstore operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for store, entry and descriptor operations.
///
/// Only [`Error::DuplicateKey`] is an ordinary control-flow result. Every other
/// variant reports a caller bug; see [`Error::is_fatal`].
#[derive(Debug, Error)]
pub enum Error {
    /// Entry shape differs from the store shape.
    #[error("shape mismatch: store holds {expected}, entry is {got}")]
    ShapeMismatch { expected: Shape, got: Shape },

    /// Value written into a position of a different field type.
    #[error("type mismatch at position {position}: expected {expected}, got {got}")]
    TypeMismatch {
        position: usize,
        expected: FieldType,
        got: FieldType,
    },

    /// Position outside `1..=arity`.
    #[error("position {position} out of range for arity {arity}")]
    PositionOutOfRange { position: usize, arity: usize },

    /// Malformed index descriptor or index request.
    #[error("invalid index descriptor: {message}")]
    InvalidDescriptor { message: String },

    /// Array index key outside its declared bounds.
    #[error("key {key:?} outside the bounds of array index {index}")]
    KeyOutOfBounds { index: usize, key: Vec<Value> },

    /// Unique index already holds an entry with an equal key.
    #[error("duplicate key on index {index}: {key:?}")]
    DuplicateKey { index: usize, key: Vec<Value> },
}

impl Error {
    /// Creates an invalid descriptor error.
    pub fn invalid_descriptor(message: impl Into<String>) -> Self {
        Error::InvalidDescriptor {
            message: message.into(),
        }
    }

    /// Creates a duplicate key error.
    pub fn duplicate_key(index: usize, key: Vec<Value>) -> Self {
        Error::DuplicateKey { index, key }
    }

    /// Returns true for errors that indicate a caller bug and must abort the
    /// current trigger.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::DuplicateKey { .. })
    }

    /// Returns true for unique-key violations.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Error::DuplicateKey { .. })
    }
}
