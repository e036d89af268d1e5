//! Integer and floating-point scalars.
//!
//! Binds accept any integer host variant as long as it fits the column
//! (checked with `NumCast`); float columns additionally accept integers.

use num_traits::NumCast;
use std::fmt::Display;
use std::io::Cursor;
use std::str::FromStr;

use crate::error::CodecError;
use crate::kernels::binary::{self, FixedWidth};
use crate::types::Value;

//==================================================================================
// 1. Host Value Coercion
//==================================================================================

fn out_of_range(value: &Value, type_name: &str) -> CodecError {
    CodecError::Encoding(format!("{} is out of range for {}", value, type_name))
}

fn wrong_kind(value: &Value, type_name: &str) -> CodecError {
    CodecError::Encoding(format!(
        "cannot bind a {} value to a {} column",
        value.kind_name(),
        type_name
    ))
}

/// Converts any integer host value into `T`, failing if it does not fit.
pub fn coerce_int<T: NumCast>(value: &Value, type_name: &str) -> Result<T, CodecError> {
    let converted = match value {
        Value::Int8(v) => <T as NumCast>::from(*v),
        Value::Int16(v) => <T as NumCast>::from(*v),
        Value::Int32(v) => <T as NumCast>::from(*v),
        Value::Int64(v) => <T as NumCast>::from(*v),
        Value::UInt8(v) => <T as NumCast>::from(*v),
        Value::UInt16(v) => <T as NumCast>::from(*v),
        Value::UInt32(v) => <T as NumCast>::from(*v),
        Value::UInt64(v) => <T as NumCast>::from(*v),
        other => return Err(wrong_kind(other, type_name)),
    };
    converted.ok_or_else(|| out_of_range(value, type_name))
}

pub fn coerce_f64(value: &Value) -> Result<f64, CodecError> {
    match value {
        Value::Float64(v) => Ok(*v),
        Value::Float32(v) => Ok(<f64 as From<f32>>::from(*v)),
        other => coerce_int(other, "Float64"),
    }
}

/// `Float64` narrows to `f32` only when finite values stay within range.
pub fn coerce_f32(value: &Value) -> Result<f32, CodecError> {
    match value {
        Value::Float32(v) => Ok(*v),
        Value::Float64(v) if !v.is_finite() => Ok(*v as f32),
        Value::Float64(v) => {
            if v.abs() > <f64 as From<f32>>::from(f32::MAX) {
                Err(out_of_range(value, "Float32"))
            } else {
                Ok(*v as f32)
            }
        }
        other => coerce_int(other, "Float32"),
    }
}

//==================================================================================
// 2. Text Form
//==================================================================================

pub fn write_int<T: Display>(value: T, out: &mut String) {
    out.push_str(&value.to_string());
}

/// Shortest round-trip decimal, with `inf`, `-inf` and `nan` spelled the way
/// the server reads them.
pub fn write_float<T: Display + num_traits::Float>(value: T, out: &mut String) {
    if value.is_nan() {
        out.push_str("nan");
    } else if value.is_infinite() {
        out.push_str(if value.is_sign_negative() { "-inf" } else { "inf" });
    } else {
        out.push_str(&value.to_string());
    }
}

fn invalid(type_name: &str, raw: &str) -> CodecError {
    CodecError::InvalidScalar {
        type_name: type_name.to_string(),
        raw: raw.to_string(),
    }
}

pub fn parse_int<T: FromStr>(raw: &str, type_name: &str) -> Result<T, CodecError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    trimmed.parse().map_err(|_| invalid(type_name, raw))
}

/// `Bool` columns are `UInt8` and come back as `true`/`false`.
pub fn parse_bool_or_u8(raw: &str) -> Result<u8, CodecError> {
    match raw.trim() {
        t if t.eq_ignore_ascii_case("true") => Ok(1),
        t if t.eq_ignore_ascii_case("false") => Ok(0),
        t => parse_int(t, "UInt8"),
    }
}

pub fn parse_float<T: FromStr + num_traits::Float>(raw: &str, type_name: &str) -> Result<T, CodecError> {
    let lowered = raw.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "nan" | "-nan" | "+nan" => Ok(T::nan()),
        other => other.parse().map_err(|_| invalid(type_name, raw)),
    }
}

//==================================================================================
// 3. Binary Form
//==================================================================================

pub fn read_fixed<T: FixedWidth>(cursor: &mut Cursor<&[u8]>) -> Result<T, CodecError> {
    binary::read_fixed(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_int_range_checks() {
        assert_eq!(coerce_int::<i8>(&Value::Int64(-128), "Int8").unwrap(), -128);
        assert_eq!(coerce_int::<u64>(&Value::Int8(7), "UInt64").unwrap(), 7);
        assert!(matches!(
            coerce_int::<u8>(&Value::Int32(-1), "UInt8"),
            Err(CodecError::Encoding(_))
        ));
        assert!(matches!(
            coerce_int::<i32>(&Value::String("1".into()), "Int32"),
            Err(CodecError::Encoding(_))
        ));
    }

    #[test]
    fn test_coerce_f32_narrowing() {
        assert_eq!(coerce_f32(&Value::Float64(1.5)).unwrap(), 1.5f32);
        assert!(coerce_f32(&Value::Float64(f64::INFINITY)).unwrap().is_infinite());
        assert!(coerce_f32(&Value::Float64(1e300)).is_err());
        assert_eq!(coerce_f64(&Value::UInt32(3)).unwrap(), 3.0);
        assert_eq!(coerce_f64(&Value::Float32(0.25)).unwrap(), 0.25);
        assert_eq!(
            coerce_f32(&Value::Float64(f32::MIN as f64)).unwrap(),
            f32::MIN
        );
    }

    #[test]
    fn test_float_text_specials() {
        let mut out = String::new();
        write_float(f64::NEG_INFINITY, &mut out);
        out.push(' ');
        write_float(f64::NAN, &mut out);
        out.push(' ');
        write_float(0.1f64, &mut out);
        assert_eq!(out, "-inf nan 0.1");

        assert!(parse_float::<f64>("-Inf", "Float64").unwrap().is_infinite());
        assert!(parse_float::<f32>("NaN", "Float32").unwrap().is_nan());
        assert!(parse_float::<f64>("abc", "Float64").is_err());
    }

    #[test]
    fn test_parse_int_and_bool() {
        assert_eq!(parse_int::<i16>(" -300 ", "Int16").unwrap(), -300);
        assert_eq!(parse_int::<u32>("+5", "UInt32").unwrap(), 5);
        assert!(parse_int::<u8>("256", "UInt8").is_err());
        assert_eq!(parse_bool_or_u8("true").unwrap(), 1);
        assert_eq!(parse_bool_or_u8("0").unwrap(), 0);
    }
}
