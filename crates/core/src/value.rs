//! Value type definitions.
//!
//! This module defines the `Value` enum which represents the content of one
//! entry position, including the typed "unset" sentinel.

use crate::hash;
use crate::types::FieldType;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Tolerance used by [`Value::approx_eq`] for doubles.
pub const DOUBLE_TOLERANCE: f64 = 0.01;

/// A value that can be stored in an entry position.
///
/// `Unset` is the sentinel of its field type: the default of a fresh entry, and
/// a "match any" wildcard when the entry is used as a lookup key.
#[derive(Clone, Debug)]
pub enum Value {
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 64-bit floating point
    Double(f64),
    /// UTF-8 string
    Str(String),
    /// Date as a signed day/epoch count
    Date(i64),
    /// Boolean value
    Bool(bool),
    /// Sentinel of the given type
    Unset(FieldType),
}

impl Value {
    /// Returns the field type of this value. Sentinels keep their type.
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Int(_) => FieldType::Int,
            Value::Long(_) => FieldType::Long,
            Value::Double(_) => FieldType::Double,
            Value::Str(_) => FieldType::Str,
            Value::Date(_) => FieldType::Date,
            Value::Bool(_) => FieldType::Bool,
            Value::Unset(ty) => *ty,
        }
    }

    /// Returns true if this value is the sentinel of its type.
    #[inline]
    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset(_))
    }

    /// Returns the i32 value if this is an Int, None otherwise.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the i64 value if this is a Long, None otherwise.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the f64 value if this is a Double, None otherwise.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a Str, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns the day count if this is a Date, None otherwise.
    pub fn as_date(&self) -> Option<i64> {
        match self {
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean value if this is a Bool, None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any integral payload widened to i64.
    pub fn as_integral(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) | Value::Date(v) => Some(*v),
            _ => None,
        }
    }

    /// Creates the sentinel for the given field type.
    #[inline]
    pub fn unset(ty: FieldType) -> Self {
        Value::Unset(ty)
    }

    /// Per-value 32-bit hash fed into key hashers.
    pub fn scalar_hash(&self) -> u32 {
        match self {
            Value::Int(v) => *v as u32,
            Value::Long(v) | Value::Date(v) => hash::fold64(*v as u64),
            Value::Double(v) => {
                // -0.0 and 0.0 compare equal, so they must hash equal
                let bits = if *v == 0.0 {
                    0
                } else if v.is_nan() {
                    f64::NAN.to_bits()
                } else {
                    v.to_bits()
                };
                hash::fold64(bits)
            }
            Value::Str(s) => hash::hash_bytes(s.as_bytes()),
            Value::Bool(b) => u32::from(*b),
            Value::Unset(_) => 0,
        }
    }

    /// Equality with a tolerance on doubles, used when comparing store contents.
    pub fn approx_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Double(a), Value::Double(b)) => (a - b).abs() < DOUBLE_TOLERANCE,
            _ => self == other,
        }
    }

    /// Returns a type ordering value for comparing values of different types.
    fn type_order(&self) -> u8 {
        match self.field_type() {
            FieldType::Int => 0,
            FieldType::Long => 1,
            FieldType::Double => 2,
            FieldType::Str => 3,
            FieldType::Date => 4,
            FieldType::Bool => 5,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Unset(a), Value::Unset(b)) => a.cmp(b),
            (Value::Unset(a), b) if *a == b.field_type() => Ordering::Less,
            (a, Value::Unset(b)) if a.field_type() == *b => Ordering::Greater,
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Long(a), Value::Long(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => {
                // NaN sorts after every number
                match (a.is_nan(), b.is_nan()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
                }
            }
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => self.type_order().cmp(&other.type_order()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_order().hash(state);
        state.write_u32(self.scalar_hash());
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}L"),
            Value::Double(v) => write!(f, "{v:?}"),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Date(v) => write!(f, "date({v})"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Unset(_) => f.write_str("*"),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type() {
        assert_eq!(Value::Int(1).field_type(), FieldType::Int);
        assert_eq!(Value::Str("a".into()).field_type(), FieldType::Str);
        assert_eq!(Value::Unset(FieldType::Double).field_type(), FieldType::Double);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::Long(7).as_long(), Some(7));
        assert_eq!(Value::Double(2.5).as_double(), Some(2.5));
        assert_eq!(Value::Str("hi".into()).as_str(), Some("hi"));
        assert_eq!(Value::Date(19000).as_date(), Some(19000));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(3).as_integral(), Some(3));
        assert_eq!(Value::Double(3.0).as_integral(), None);
        assert_eq!(Value::Unset(FieldType::Int).as_int(), None);
    }

    #[test]
    fn test_unset_sorts_first_within_type() {
        assert!(Value::Unset(FieldType::Int) < Value::Int(i32::MIN));
        assert!(Value::Unset(FieldType::Str) < Value::Str(String::new()));
        assert_eq!(Value::Unset(FieldType::Int), Value::Unset(FieldType::Int));
        assert_ne!(Value::Unset(FieldType::Int), Value::Unset(FieldType::Long));
    }

    #[test]
    fn test_ordering() {
        assert!(Value::Int(1) < Value::Int(2));
        assert!(Value::Str("a".into()) < Value::Str("b".into()));
        assert!(Value::Double(1.0) < Value::Double(f64::NAN));
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_ne!(Value::Int(1), Value::Long(1));
    }

    #[test]
    fn test_scalar_hash_consistent_with_eq() {
        assert_eq!(Value::Double(0.0).scalar_hash(), Value::Double(-0.0).scalar_hash());
        assert_eq!(Value::Double(0.0), Value::Double(-0.0));
        assert_eq!(
            Value::Str("district".into()).scalar_hash(),
            Value::Str("district".into()).scalar_hash()
        );
    }

    #[test]
    fn test_approx_eq() {
        assert!(Value::Double(10.0).approx_eq(&Value::Double(10.005)));
        assert!(!Value::Double(10.0).approx_eq(&Value::Double(10.5)));
        assert!(Value::Int(3).approx_eq(&Value::Int(3)));
        assert!(!Value::Int(3).approx_eq(&Value::Long(3)));
    }

    #[test]
    fn test_from_impls() {
        let v: Value = 42i32.into();
        assert_eq!(v, Value::Int(42));
        let v: Value = "x".into();
        assert_eq!(v.as_str(), Some("x"));
        let v: Value = 1.5f64.into();
        assert_eq!(v.as_double(), Some(1.5));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(5).to_string(), "5");
        assert_eq!(Value::Str("b".into()).to_string(), "\"b\"");
        assert_eq!(Value::Unset(FieldType::Int).to_string(), "*");
    }
}
