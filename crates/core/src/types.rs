//! Field type definitions.
//!
//! This module defines the scalar types an entry position can hold.

use core::fmt;

/// Scalar type of one entry position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 64-bit floating point number
    Double,
    /// UTF-8 string
    Str,
    /// Date stored as a signed day/epoch count
    Date,
    /// Boolean type (true/false)
    Bool,
}

impl FieldType {
    /// Returns the single-letter code used in shape signatures.
    pub fn code(&self) -> char {
        match self {
            FieldType::Int => 'I',
            FieldType::Long => 'L',
            FieldType::Double => 'D',
            FieldType::Str => 'S',
            FieldType::Date => 'T',
            FieldType::Bool => 'B',
        }
    }

    /// Parses a signature code back into a field type.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'I' => Some(FieldType::Int),
            'L' => Some(FieldType::Long),
            'D' => Some(FieldType::Double),
            'S' => Some(FieldType::Str),
            'T' => Some(FieldType::Date),
            'B' => Some(FieldType::Bool),
            _ => None,
        }
    }

    /// Returns whether `increase`/`decrease` apply to this type.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Int | FieldType::Long | FieldType::Double | FieldType::Date
        )
    }

    /// Returns whether this type can key an array index.
    pub fn is_integral(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Long | FieldType::Date)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Int => "int",
            FieldType::Long => "long",
            FieldType::Double => "double",
            FieldType::Str => "string",
            FieldType::Date => "date",
            FieldType::Bool => "bool",
        };
        f.write_str(name)
    }
}
