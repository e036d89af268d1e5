//! This module defines the canonical, type-safe representation of ClickHouse
//! column types used by every processor in the codec.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CodecError;
use crate::kernels::text;

/// Default fractional-second digits for `DateTime64` when none are declared.
pub const DEFAULT_DATETIME64_PRECISION: u8 = 3;

/// The widest scale `rust_decimal` can represent.
const MAX_HOST_DECIMAL_SCALE: u8 = 28;

//==================================================================================
// I. Enum Members
//==================================================================================

/// The declared name→ordinal mapping of an `Enum8`/`Enum16` column, in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumMembers(Vec<(String, i16)>);

impl EnumMembers {
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = (S, i16)>,
        S: Into<String>,
    {
        Self(members.into_iter().map(|(n, o)| (n.into(), o)).collect())
    }

    pub fn ordinal_of(&self, name: &str) -> Option<i16> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, o)| *o)
    }

    pub fn name_of(&self, ordinal: i16) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, o)| *o == ordinal)
            .map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i16)> {
        self.0.iter().map(|(n, o)| (n.as_str(), *o))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

//==================================================================================
// II. The Type Descriptor
//==================================================================================

/// A declared ClickHouse column type.
///
/// Composite variants own their children, so every descriptor tree is finite
/// and immutable once built. Descriptors serialize as their ClickHouse type name
/// (`"Map(LowCardinality(String), Int32)"`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum TypeDescriptor {
    String,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Date,
    DateTime {
        timezone: Option<Tz>,
    },
    DateTime64 {
        precision: u8,
        timezone: Option<Tz>,
    },
    Decimal {
        precision: u8,
        scale: u8,
    },
    Uuid,
    Enum8(EnumMembers),
    Enum16(EnumMembers),

    Array(Box<TypeDescriptor>),
    Nullable(Box<TypeDescriptor>),
    LowCardinality(Box<TypeDescriptor>),
    Tuple(Vec<TypeDescriptor>),
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
}

impl TypeDescriptor {
    pub fn array(item: TypeDescriptor) -> Self {
        Self::Array(Box::new(item))
    }

    pub fn nullable(inner: TypeDescriptor) -> Self {
        Self::Nullable(Box::new(inner))
    }

    pub fn low_cardinality(inner: TypeDescriptor) -> Self {
        Self::LowCardinality(Box::new(inner))
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    pub fn tuple(items: Vec<TypeDescriptor>) -> Self {
        Self::Tuple(items)
    }

    pub fn datetime(timezone: Option<Tz>) -> Self {
        Self::DateTime { timezone }
    }

    pub fn datetime64(precision: u8, timezone: Option<Tz>) -> Self {
        Self::DateTime64 {
            precision,
            timezone,
        }
    }

    pub fn decimal(precision: u8, scale: u8) -> Self {
        Self::Decimal { precision, scale }
    }

    /// Returns `true` if the descriptor admits NULL, looking through `LowCardinality`.
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Nullable(_) => true,
            Self::LowCardinality(inner) => inner.is_nullable(),
            _ => false,
        }
    }

    /// Looks through any `LowCardinality`/`Nullable` wrappers to the value type.
    pub fn strip_wrappers(&self) -> &TypeDescriptor {
        match self {
            Self::Nullable(inner) | Self::LowCardinality(inner) => inner.strip_wrappers(),
            other => other,
        }
    }

    /// The bare type name without arguments, e.g. `"Map"` for `Map(String, Int32)`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::UInt8 => "UInt8",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::Date => "Date",
            Self::DateTime { .. } => "DateTime",
            Self::DateTime64 { .. } => "DateTime64",
            Self::Decimal { .. } => "Decimal",
            Self::Uuid => "UUID",
            Self::Enum8(_) => "Enum8",
            Self::Enum16(_) => "Enum16",
            Self::Array(_) => "Array",
            Self::Nullable(_) => "Nullable",
            Self::LowCardinality(_) => "LowCardinality",
            Self::Tuple(_) => "Tuple",
            Self::Map(..) => "Map",
        }
    }

    /// Checks the descriptor tree against ClickHouse's type rules and the limits
    /// of the host value model.
    pub fn validate(&self) -> Result<(), CodecError> {
        let invalid = |msg: String| -> Result<(), CodecError> { Err(CodecError::InvalidType(msg)) };
        match self {
            Self::DateTime64 { precision, .. } if *precision > 9 => {
                invalid(format!("DateTime64 precision must be in 0..=9, got {}", precision))
            }
            Self::Decimal { precision, scale } => {
                if !(1..=76).contains(precision) {
                    invalid(format!("Decimal precision must be in 1..=76, got {}", precision))
                } else if scale > precision {
                    invalid(format!(
                        "Decimal scale {} exceeds precision {}",
                        scale, precision
                    ))
                } else if *scale > MAX_HOST_DECIMAL_SCALE {
                    invalid(format!(
                        "Decimal scale {} exceeds the supported maximum of {}",
                        scale, MAX_HOST_DECIMAL_SCALE
                    ))
                } else {
                    Ok(())
                }
            }
            Self::Enum8(members) | Self::Enum16(members) => {
                if members.is_empty() {
                    return invalid(format!("{} must declare at least one member", self.kind_name()));
                }
                let entries: Vec<_> = members.iter().collect();
                for (i, (name, ordinal)) in entries.iter().enumerate() {
                    if matches!(self, Self::Enum8(_)) && i8::try_from(*ordinal).is_err() {
                        return invalid(format!("Enum8 ordinal {} for '{}' is out of range", ordinal, name));
                    }
                    for (other_name, other_ordinal) in &entries[i + 1..] {
                        if name == other_name {
                            return invalid(format!("duplicate enum name '{}'", name));
                        }
                        if ordinal == other_ordinal {
                            return invalid(format!("duplicate enum ordinal {}", ordinal));
                        }
                    }
                }
                Ok(())
            }
            Self::Array(item) => item.validate(),
            Self::Nullable(inner) => {
                if matches!(**inner, Self::Nullable(_)) {
                    return invalid("Nullable(Nullable(..)) is not allowed".to_string());
                }
                inner.validate()
            }
            Self::LowCardinality(inner) => inner.validate(),
            Self::Tuple(items) => {
                if items.is_empty() {
                    return invalid("Tuple must have at least one element".to_string());
                }
                items.iter().try_for_each(|item| item.validate())
            }
            Self::Map(key, value) => {
                if matches!(
                    key.as_ref(),
                    Self::Nullable(_) | Self::Array(_) | Self::Map(..) | Self::Tuple(_)
                ) {
                    return invalid(format!("{} cannot be used as a Map key", key));
                }
                key.validate()?;
                value.validate()
            }
            _ => Ok(()),
        }
    }
}

//==================================================================================
// III. Canonical Type Names
//==================================================================================

/// Renders the canonical ClickHouse spelling, as used in DDL.
impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DateTime { timezone: None } => write!(f, "DateTime"),
            Self::DateTime {
                timezone: Some(tz),
            } => write!(f, "DateTime({})", text::quote(tz.name())),
            Self::DateTime64 {
                precision,
                timezone: None,
            } => write!(f, "DateTime64({})", precision),
            Self::DateTime64 {
                precision,
                timezone: Some(tz),
            } => write!(f, "DateTime64({}, {})", precision, text::quote(tz.name())),
            Self::Decimal { precision, scale } => write!(f, "Decimal({}, {})", precision, scale),
            Self::Enum8(members) | Self::Enum16(members) => {
                write!(f, "{}(", self.kind_name())?;
                for (i, (name, ordinal)) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", text::quote(name), ordinal)?;
                }
                write!(f, ")")
            }
            Self::Array(inner) | Self::Nullable(inner) | Self::LowCardinality(inner) => {
                write!(f, "{}({})", self.kind_name(), inner)
            }
            Self::Tuple(items) => {
                write!(f, "Tuple(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Self::Map(key, value) => write!(f, "Map({}, {})", key, value),
            scalar => write!(f, "{}", scalar.kind_name()),
        }
    }
}

impl TryFrom<String> for TypeDescriptor {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeDescriptor> for String {
    fn from(value: TypeDescriptor) -> Self {
        value.to_string()
    }
}
