//! The host-side value domain the codec binds from and decodes into.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

use crate::kernels::text;

/// A host value for one ClickHouse cell.
///
/// `DateTime` and `DateTime64` hold UTC instants; the column's timezone only
/// affects their text rendering. Enum cells are represented by their member
/// name as a `String`. `Map` keeps its pairs in wire order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The explicit "no value" marker admitted by `Nullable` columns.
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTime64(NaiveDateTime),
    Decimal(Decimal),
    Uuid(Uuid),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Builds a `Map` value from any iterator of convertible pairs.
    pub fn map_from<K, V, I>(pairs: I) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// A short name for the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Int8(_) => "Int8",
            Value::Int16(_) => "Int16",
            Value::Int32(_) => "Int32",
            Value::Int64(_) => "Int64",
            Value::UInt8(_) => "UInt8",
            Value::UInt16(_) => "UInt16",
            Value::UInt32(_) => "UInt32",
            Value::UInt64(_) => "UInt64",
            Value::Float32(_) => "Float32",
            Value::Float64(_) => "Float64",
            Value::String(_) => "String",
            Value::Date(_) => "Date",
            Value::DateTime(_) => "DateTime",
            Value::DateTime64(_) => "DateTime64",
            Value::Decimal(_) => "Decimal",
            Value::Uuid(_) => "UUID",
            Value::Array(_) => "Array",
            Value::Tuple(_) => "Tuple",
            Value::Map(_) => "Map",
        }
    }
}

/// Human-readable rendering, close to ClickHouse literal syntax. Used for
/// diagnostics only; the wire forms are produced by the processors.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt8(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", text::quote(s)),
            Value::Date(d) => write!(f, "'{}'", d),
            Value::DateTime(dt) | Value::DateTime64(dt) => write!(f, "'{}'", dt),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Uuid(u) => write!(f, "'{}'", u),
            Value::Array(items) => {
                write!(f, "[")?;
                join(f, items)?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                join(f, items)?;
                write!(f, ")")
            }
            Value::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

//==================================================================================
// Conversions
//==================================================================================

macro_rules! impl_from_primitive {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => String,
    NaiveDate => Date,
    Decimal => Decimal,
    Uuid => Uuid,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from(5i32), Value::Int32(5));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(
            Value::from(vec!["x", "y"]),
            Value::Array(vec![Value::String("x".into()), Value::String("y".into())])
        );
        assert_eq!(
            Value::map_from([("a", 1i32)]),
            Value::Map(vec![(Value::String("a".into()), Value::Int32(1))])
        );
    }

    #[test]
    fn test_display_is_literal_like() {
        let v = Value::Array(vec![
            Value::map_from([("it's", Some(1u8))]),
            Value::Tuple(vec![Value::Null, Value::Float64(1.5)]),
        ]);
        assert_eq!(v.to_string(), "[{'it\\'s': 1}, (NULL, 1.5)]");
    }
}
