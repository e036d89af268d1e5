//! The primitive codec: scalar encode/decode for both wire encodings.
//!
//! Every routine here handles exactly one scalar descriptor. Composite
//! descriptors never reach this layer; the processor chains unwrap them first.

use std::io::Cursor;
use uuid::Uuid;

use crate::error::CodecError;
use crate::kernels::binary::{self, FixedWidth};
use crate::kernels::literal::Literal;
use crate::transport::Transport;
use crate::types::{EnumMembers, TypeDescriptor, Value};

pub mod decimal;
pub mod numeric;
pub mod temporal;

use numeric::{coerce_f32, coerce_f64, coerce_int};

fn wrong_kind(desc: &TypeDescriptor, value: &Value) -> CodecError {
    CodecError::Encoding(format!(
        "cannot bind a {} value to a {} column",
        value.kind_name(),
        desc
    ))
}

fn not_scalar(desc: &TypeDescriptor) -> CodecError {
    CodecError::InvalidType(format!("{} is not a scalar type", desc))
}

fn invalid(desc: &TypeDescriptor, raw: &str) -> CodecError {
    CodecError::InvalidScalar {
        type_name: desc.to_string(),
        raw: raw.to_string(),
    }
}

//==================================================================================
// 1. Enums
//==================================================================================

/// Resolves a host enum value (member name or ordinal) to its ordinal.
fn enum_ordinal(members: &EnumMembers, value: &Value) -> Result<i16, CodecError> {
    match value {
        Value::String(name) => members
            .ordinal_of(name)
            .ok_or_else(|| CodecError::UnknownEnumMember(name.clone())),
        other => {
            let ordinal: i16 = coerce_int(other, "Enum")
                .map_err(|_| CodecError::UnknownEnumMember(other.to_string()))?;
            members
                .name_of(ordinal)
                .map(|_| ordinal)
                .ok_or_else(|| CodecError::UnknownEnumMember(ordinal.to_string()))
        }
    }
}

fn enum_name(members: &EnumMembers, value: &Value) -> Result<String, CodecError> {
    let ordinal = enum_ordinal(members, value)?;
    members
        .name_of(ordinal)
        .map(str::to_string)
        .ok_or_else(|| CodecError::UnknownEnumMember(ordinal.to_string()))
}

/// The server sends member names; a bare ordinal is accepted as a fallback.
fn enum_from_text(members: &EnumMembers, raw: &str) -> Result<Value, CodecError> {
    if members.ordinal_of(raw).is_some() {
        return Ok(Value::String(raw.to_string()));
    }
    raw.trim()
        .parse::<i16>()
        .ok()
        .and_then(|ordinal| members.name_of(ordinal))
        .map(|name| Value::String(name.to_string()))
        .ok_or_else(|| CodecError::UnknownEnumMember(raw.to_string()))
}

fn enum_from_ordinal(members: &EnumMembers, ordinal: i16) -> Result<Value, CodecError> {
    members
        .name_of(ordinal)
        .map(|name| Value::String(name.to_string()))
        .ok_or_else(|| CodecError::UnknownEnumMember(ordinal.to_string()))
}

//==================================================================================
// 2. Text Encoding
//==================================================================================

/// Appends the SQL literal for a scalar `value` to `out`.
pub fn bind_text(
    desc: &TypeDescriptor,
    value: &Value,
    transport: &dyn Transport,
    out: &mut String,
) -> Result<(), CodecError> {
    use TypeDescriptor as T;
    match desc {
        T::String => match value {
            Value::String(s) => out.push_str(&transport.quote_literal(s)),
            other => return Err(wrong_kind(desc, other)),
        },
        T::Int8 => numeric::write_int(coerce_int::<i8>(value, "Int8")?, out),
        T::Int16 => numeric::write_int(coerce_int::<i16>(value, "Int16")?, out),
        T::Int32 => numeric::write_int(coerce_int::<i32>(value, "Int32")?, out),
        T::Int64 => numeric::write_int(coerce_int::<i64>(value, "Int64")?, out),
        T::UInt8 => numeric::write_int(coerce_int::<u8>(value, "UInt8")?, out),
        T::UInt16 => numeric::write_int(coerce_int::<u16>(value, "UInt16")?, out),
        T::UInt32 => numeric::write_int(coerce_int::<u32>(value, "UInt32")?, out),
        T::UInt64 => numeric::write_int(coerce_int::<u64>(value, "UInt64")?, out),
        T::Float32 => numeric::write_float(coerce_f32(value)?, out),
        T::Float64 => numeric::write_float(coerce_f64(value)?, out),
        T::Date => match value {
            Value::Date(d) => {
                out.push('\'');
                temporal::write_date_text(d, out)?;
                out.push('\'');
            }
            other => return Err(wrong_kind(desc, other)),
        },
        T::DateTime { timezone } => match value {
            Value::DateTime(dt) | Value::DateTime64(dt) => {
                out.push('\'');
                temporal::write_datetime_text(dt, *timezone, out)?;
                out.push('\'');
            }
            other => return Err(wrong_kind(desc, other)),
        },
        T::DateTime64 {
            precision,
            timezone,
        } => match value {
            Value::DateTime(dt) | Value::DateTime64(dt) => {
                out.push('\'');
                temporal::write_datetime64_text(dt, *precision, *timezone, out);
                out.push('\'');
            }
            other => return Err(wrong_kind(desc, other)),
        },
        T::Decimal { precision, scale } => decimal::write_text(value, *precision, *scale, out)?,
        T::Uuid => match value {
            Value::Uuid(u) => out.push_str(&transport.quote_literal(&u.hyphenated().to_string())),
            other => return Err(wrong_kind(desc, other)),
        },
        T::Enum8(members) | T::Enum16(members) => {
            out.push_str(&transport.quote_literal(&enum_name(members, value)?));
        }
        _ => return Err(not_scalar(desc)),
    }
    Ok(())
}

//==================================================================================
// 3. Text Decoding
//==================================================================================

/// Decodes a scalar literal into a host value.
pub fn result_text(desc: &TypeDescriptor, literal: &Literal) -> Result<Value, CodecError> {
    use TypeDescriptor as T;
    let raw = literal.scalar_text().ok_or_else(|| CodecError::TypeMismatch {
        expected: desc.to_string(),
        found: literal.kind_name().to_string(),
    })?;
    Ok(match desc {
        T::String => Value::String(raw.to_string()),
        T::Int8 => Value::Int8(numeric::parse_int(raw, "Int8")?),
        T::Int16 => Value::Int16(numeric::parse_int(raw, "Int16")?),
        T::Int32 => Value::Int32(numeric::parse_int(raw, "Int32")?),
        T::Int64 => Value::Int64(numeric::parse_int(raw, "Int64")?),
        T::UInt8 => Value::UInt8(numeric::parse_bool_or_u8(raw)?),
        T::UInt16 => Value::UInt16(numeric::parse_int(raw, "UInt16")?),
        T::UInt32 => Value::UInt32(numeric::parse_int(raw, "UInt32")?),
        T::UInt64 => Value::UInt64(numeric::parse_int(raw, "UInt64")?),
        T::Float32 => Value::Float32(numeric::parse_float(raw, "Float32")?),
        T::Float64 => Value::Float64(numeric::parse_float(raw, "Float64")?),
        T::Date => Value::Date(temporal::parse_date(raw)?),
        T::DateTime { timezone } => Value::DateTime(temporal::parse_datetime(raw, *timezone)?),
        T::DateTime64 {
            precision,
            timezone,
        } => Value::DateTime64(temporal::parse_datetime64(raw, *precision, *timezone)?),
        T::Decimal { precision, scale } => Value::Decimal(decimal::parse(raw, *precision, *scale)?),
        T::Uuid => Value::Uuid(Uuid::parse_str(raw.trim()).map_err(|_| invalid(desc, raw))?),
        T::Enum8(members) | T::Enum16(members) => enum_from_text(members, raw)?,
        _ => return Err(not_scalar(desc)),
    })
}

//==================================================================================
// 4. Binary Encoding
//==================================================================================

/// Appends the RowBinary layout of a scalar `value` to `out`.
pub fn bind_binary(desc: &TypeDescriptor, value: &Value, out: &mut Vec<u8>) -> Result<(), CodecError> {
    use TypeDescriptor as T;
    match desc {
        T::String => match value {
            Value::String(s) => binary::write_string(s, out)?,
            other => return Err(wrong_kind(desc, other)),
        },
        T::Int8 => coerce_int::<i8>(value, "Int8")?.write_le(out),
        T::Int16 => coerce_int::<i16>(value, "Int16")?.write_le(out),
        T::Int32 => coerce_int::<i32>(value, "Int32")?.write_le(out),
        T::Int64 => coerce_int::<i64>(value, "Int64")?.write_le(out),
        T::UInt8 => coerce_int::<u8>(value, "UInt8")?.write_le(out),
        T::UInt16 => coerce_int::<u16>(value, "UInt16")?.write_le(out),
        T::UInt32 => coerce_int::<u32>(value, "UInt32")?.write_le(out),
        T::UInt64 => coerce_int::<u64>(value, "UInt64")?.write_le(out),
        T::Float32 => coerce_f32(value)?.write_le(out),
        T::Float64 => coerce_f64(value)?.write_le(out),
        T::Date => match value {
            Value::Date(d) => temporal::write_date_binary(d, out)?,
            other => return Err(wrong_kind(desc, other)),
        },
        T::DateTime { .. } => match value {
            Value::DateTime(dt) | Value::DateTime64(dt) => temporal::write_datetime_binary(dt, out)?,
            other => return Err(wrong_kind(desc, other)),
        },
        T::DateTime64 { precision, .. } => match value {
            Value::DateTime(dt) | Value::DateTime64(dt) => {
                temporal::write_datetime64_binary(dt, *precision, out)?
            }
            other => return Err(wrong_kind(desc, other)),
        },
        T::Decimal { precision, scale } => decimal::write_binary(value, *precision, *scale, out)?,
        T::Uuid => match value {
            Value::Uuid(u) => {
                let (high, low) = u.as_u64_pair();
                high.write_le(out);
                low.write_le(out);
            }
            other => return Err(wrong_kind(desc, other)),
        },
        T::Enum8(members) => {
            let ordinal = enum_ordinal(members, value)?;
            // Ordinals were range-checked against i8 when the descriptor was validated.
            i8::try_from(ordinal)
                .map_err(|_| CodecError::UnknownEnumMember(ordinal.to_string()))?
                .write_le(out)
        }
        T::Enum16(members) => enum_ordinal(members, value)?.write_le(out),
        _ => return Err(not_scalar(desc)),
    }
    Ok(())
}

//==================================================================================
// 5. Binary Decoding
//==================================================================================

/// Reads one scalar of type `desc` from the cursor.
pub fn result_binary(desc: &TypeDescriptor, cursor: &mut Cursor<&[u8]>) -> Result<Value, CodecError> {
    use TypeDescriptor as T;
    Ok(match desc {
        T::String => Value::String(binary::read_string(cursor)?),
        T::Int8 => Value::Int8(numeric::read_fixed(cursor)?),
        T::Int16 => Value::Int16(numeric::read_fixed(cursor)?),
        T::Int32 => Value::Int32(numeric::read_fixed(cursor)?),
        T::Int64 => Value::Int64(numeric::read_fixed(cursor)?),
        T::UInt8 => Value::UInt8(numeric::read_fixed(cursor)?),
        T::UInt16 => Value::UInt16(numeric::read_fixed(cursor)?),
        T::UInt32 => Value::UInt32(numeric::read_fixed(cursor)?),
        T::UInt64 => Value::UInt64(numeric::read_fixed(cursor)?),
        T::Float32 => Value::Float32(numeric::read_fixed(cursor)?),
        T::Float64 => Value::Float64(numeric::read_fixed(cursor)?),
        T::Date => Value::Date(temporal::read_date_binary(cursor)?),
        T::DateTime { .. } => Value::DateTime(temporal::read_datetime_binary(cursor)?),
        T::DateTime64 { precision, .. } => {
            Value::DateTime64(temporal::read_datetime64_binary(cursor, *precision)?)
        }
        T::Decimal { precision, scale } => {
            Value::Decimal(decimal::read_binary(cursor, *precision, *scale)?)
        }
        T::Uuid => {
            let high: u64 = numeric::read_fixed(cursor)?;
            let low: u64 = numeric::read_fixed(cursor)?;
            Value::Uuid(Uuid::from_u64_pair(high, low))
        }
        T::Enum8(members) => enum_from_ordinal(members, i16::from(numeric::read_fixed::<i8>(cursor)?))?,
        T::Enum16(members) => enum_from_ordinal(members, numeric::read_fixed::<i16>(cursor)?)?,
        _ => return Err(not_scalar(desc)),
    })
}

#[cfg(test)]
mod tests;
