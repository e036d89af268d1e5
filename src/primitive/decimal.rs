//! `Decimal(P, S)` scalars, carried on the host as `rust_decimal::Decimal`.
//!
//! The wire value is the integer mantissa `value * 10^S`, stored in the
//! narrowest of Int32/Int64/Int128/Int256 that holds `P` digits.

use rust_decimal::{Decimal, RoundingStrategy};
use std::io::Cursor;
use std::str::FromStr;

use crate::error::CodecError;
use crate::kernels::binary::{self, FixedWidth};
use crate::types::Value;

/// Largest integer-digit count whose bound `10^n` fits in a `Decimal`.
const MAX_CHECKED_INTEGER_DIGITS: u8 = 28;

fn type_name(precision: u8, scale: u8) -> String {
    format!("Decimal({}, {})", precision, scale)
}

//==================================================================================
// 1. Normalization
//==================================================================================

/// Brings a host value to exactly `scale` fractional digits (midpoint rounds
/// away from zero) and checks that it fits in `precision` digits.
pub fn normalize(value: &Value, precision: u8, scale: u8) -> Result<Decimal, CodecError> {
    let raw = match value {
        Value::Decimal(d) => *d,
        Value::Int8(v) => Decimal::from(*v),
        Value::Int16(v) => Decimal::from(*v),
        Value::Int32(v) => Decimal::from(*v),
        Value::Int64(v) => Decimal::from(*v),
        Value::UInt8(v) => Decimal::from(*v),
        Value::UInt16(v) => Decimal::from(*v),
        Value::UInt32(v) => Decimal::from(*v),
        Value::UInt64(v) => Decimal::from(*v),
        Value::Float32(v) => Decimal::try_from(*v).map_err(|e| CodecError::Encoding(e.to_string()))?,
        Value::Float64(v) => Decimal::try_from(*v).map_err(|e| CodecError::Encoding(e.to_string()))?,
        other => {
            return Err(CodecError::Encoding(format!(
                "cannot bind a {} value to a {} column",
                other.kind_name(),
                type_name(precision, scale)
            )))
        }
    };

    let mut rounded = raw.round_dp_with_strategy(u32::from(scale), RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(u32::from(scale));
    if rounded.scale() != u32::from(scale) {
        return Err(CodecError::Encoding(format!(
            "{} cannot be represented with scale {}",
            raw, scale
        )));
    }

    let integer_digits = precision - scale;
    if integer_digits <= MAX_CHECKED_INTEGER_DIGITS {
        let bound = Decimal::from_i128_with_scale(10i128.pow(u32::from(integer_digits)), 0);
        if rounded.abs() >= bound {
            return Err(CodecError::Encoding(format!(
                "{} is out of range for {}",
                raw,
                type_name(precision, scale)
            )));
        }
    }
    Ok(rounded)
}

//==================================================================================
// 2. Text Form
//==================================================================================

pub fn write_text(value: &Value, precision: u8, scale: u8, out: &mut String) -> Result<(), CodecError> {
    let normalized = normalize(value, precision, scale)?;
    out.push_str(&normalized.to_string());
    Ok(())
}

pub fn parse(raw: &str, precision: u8, scale: u8) -> Result<Decimal, CodecError> {
    let trimmed = raw.trim();
    let parsed = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| CodecError::InvalidScalar {
            type_name: type_name(precision, scale),
            raw: raw.to_string(),
        })?;
    let mut at_scale = parsed;
    at_scale.rescale(u32::from(scale));
    Ok(at_scale)
}

//==================================================================================
// 3. Binary Form
//==================================================================================

fn narrow<T: TryFrom<i128>>(mantissa: i128, precision: u8, scale: u8) -> Result<T, CodecError> {
    T::try_from(mantissa).map_err(|_| {
        CodecError::Encoding(format!(
            "mantissa {} does not fit {}",
            mantissa,
            type_name(precision, scale)
        ))
    })
}

pub fn write_binary(value: &Value, precision: u8, scale: u8, out: &mut Vec<u8>) -> Result<(), CodecError> {
    let mantissa = normalize(value, precision, scale)?.mantissa();
    match precision {
        0..=9 => narrow::<i32>(mantissa, precision, scale)?.write_le(out),
        10..=18 => narrow::<i64>(mantissa, precision, scale)?.write_le(out),
        19..=38 => mantissa.write_le(out),
        _ => binary::write_i256(mantissa, out),
    }
    Ok(())
}

pub fn read_binary(cursor: &mut Cursor<&[u8]>, precision: u8, scale: u8) -> Result<Decimal, CodecError> {
    let mantissa: i128 = match precision {
        0..=9 => i128::from(binary::read_fixed::<i32>(cursor)?),
        10..=18 => i128::from(binary::read_fixed::<i64>(cursor)?),
        19..=38 => binary::read_fixed::<i128>(cursor)?,
        _ => binary::read_i256(cursor)?,
    };
    Decimal::try_from_i128_with_scale(mantissa, u32::from(scale)).map_err(|_| CodecError::InvalidScalar {
        type_name: type_name(precision, scale),
        raw: mantissa.to_string(),
    })
}
