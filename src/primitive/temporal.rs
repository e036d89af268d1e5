//! Date, DateTime and DateTime64 scalars.
//!
//! Host values are UTC instants. In text, a column timezone turns them into
//! that zone's wall-clock time; on the binary wire they are always epoch-based
//! (days, seconds or `10^-precision` ticks).

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::io::Cursor;

use crate::error::CodecError;
use crate::kernels::binary::{self, FixedWidth};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NANOS_PER_SECOND: i64 = 1_000_000_000;

fn epoch() -> NaiveDate {
    DateTime::<Utc>::UNIX_EPOCH.date_naive()
}

fn invalid(type_name: &str, raw: &str) -> CodecError {
    CodecError::InvalidScalar {
        type_name: type_name.to_string(),
        raw: raw.to_string(),
    }
}

fn out_of_range(what: impl std::fmt::Display, type_name: &str) -> CodecError {
    CodecError::Encoding(format!("{} is out of range for {}", what, type_name))
}

fn ten_pow(precision: u8) -> i64 {
    10i64.pow(u32::from(precision))
}

//==================================================================================
// 1. Timezone Conversion
//==================================================================================

fn to_wall_clock(instant: &NaiveDateTime, timezone: Option<Tz>) -> NaiveDateTime {
    match timezone {
        Some(tz) => tz.from_utc_datetime(instant).naive_local(),
        None => *instant,
    }
}

/// Resolves a wall-clock reading in `timezone` to UTC. Ambiguous readings
/// (DST fall-back) take the earlier instant; nonexistent ones are rejected.
fn from_wall_clock(
    local: NaiveDateTime,
    timezone: Option<Tz>,
    type_name: &str,
    raw: &str,
) -> Result<NaiveDateTime, CodecError> {
    match timezone {
        Some(tz) => tz
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| invalid(type_name, raw)),
        None => Ok(local),
    }
}

//==================================================================================
// 2. Date
//==================================================================================

/// Days since the epoch, failing outside the `UInt16` range a `Date` column stores.
fn date_days(date: &NaiveDate) -> Result<u16, CodecError> {
    let days = date.signed_duration_since(epoch()).num_days();
    u16::try_from(days).map_err(|_| out_of_range(date, "Date"))
}

pub fn write_date_text(date: &NaiveDate, out: &mut String) -> Result<(), CodecError> {
    date_days(date)?;
    out.push_str(&date.format(DATE_FORMAT).to_string());
    Ok(())
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, CodecError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| invalid("Date", raw))
}

pub fn write_date_binary(date: &NaiveDate, out: &mut Vec<u8>) -> Result<(), CodecError> {
    date_days(date)?.write_le(out);
    Ok(())
}

pub fn read_date_binary(cursor: &mut Cursor<&[u8]>) -> Result<NaiveDate, CodecError> {
    let days: u16 = binary::read_fixed(cursor)?;
    epoch()
        .checked_add_days(chrono::Days::new(u64::from(days)))
        .ok_or_else(|| invalid("Date", &days.to_string()))
}

//==================================================================================
// 3. DateTime (second precision)
//==================================================================================

fn epoch_seconds(instant: &NaiveDateTime) -> Result<u32, CodecError> {
    u32::try_from(instant.and_utc().timestamp()).map_err(|_| out_of_range(instant, "DateTime"))
}

pub fn write_datetime_text(
    instant: &NaiveDateTime,
    timezone: Option<Tz>,
    out: &mut String,
) -> Result<(), CodecError> {
    epoch_seconds(instant)?;
    let local = to_wall_clock(instant, timezone);
    out.push_str(&local.format(DATETIME_FORMAT).to_string());
    Ok(())
}

pub fn parse_datetime(raw: &str, timezone: Option<Tz>) -> Result<NaiveDateTime, CodecError> {
    let trimmed = raw.trim();
    // Fractional seconds are not part of the type; drop them if present.
    let whole = trimmed.split('.').next().unwrap_or(trimmed);
    let local = NaiveDateTime::parse_from_str(whole, DATETIME_FORMAT)
        .map_err(|_| invalid("DateTime", raw))?;
    from_wall_clock(local, timezone, "DateTime", raw)
}

pub fn write_datetime_binary(instant: &NaiveDateTime, out: &mut Vec<u8>) -> Result<(), CodecError> {
    epoch_seconds(instant)?.write_le(out);
    Ok(())
}

pub fn read_datetime_binary(cursor: &mut Cursor<&[u8]>) -> Result<NaiveDateTime, CodecError> {
    let seconds: u32 = binary::read_fixed(cursor)?;
    DateTime::from_timestamp(i64::from(seconds), 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| invalid("DateTime", &seconds.to_string()))
}

//==================================================================================
// 4. DateTime64 (sub-second precision)
//==================================================================================

/// The fraction of `instant`, truncated to `precision` digits.
fn fraction_at_precision(instant: &NaiveDateTime, precision: u8) -> i64 {
    let nanos = i64::from(instant.and_utc().timestamp_subsec_nanos());
    nanos / ten_pow(9 - precision)
}

pub fn write_datetime64_text(
    instant: &NaiveDateTime,
    precision: u8,
    timezone: Option<Tz>,
    out: &mut String,
) {
    let local = to_wall_clock(instant, timezone);
    out.push_str(&local.format(DATETIME_FORMAT).to_string());
    if precision > 0 {
        let fraction = fraction_at_precision(instant, precision);
        out.push_str(&format!(".{:0width$}", fraction, width = usize::from(precision)));
    }
}

pub fn parse_datetime64(
    raw: &str,
    precision: u8,
    timezone: Option<Tz>,
) -> Result<NaiveDateTime, CodecError> {
    let trimmed = raw.trim();
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("DateTime64", raw));
    }
    let local = NaiveDateTime::parse_from_str(whole, DATETIME_FORMAT)
        .map_err(|_| invalid("DateTime64", raw))?;

    // Keep only the declared digits, then scale to nanoseconds.
    let kept: String = fraction
        .chars()
        .take(usize::from(precision))
        .chain(std::iter::repeat('0'))
        .take(9)
        .collect();
    let nanos: u32 = kept.parse().map_err(|_| invalid("DateTime64", raw))?;
    let local = local
        .with_nanosecond(nanos)
        .ok_or_else(|| invalid("DateTime64", raw))?;
    from_wall_clock(local, timezone, "DateTime64", raw)
}

pub fn write_datetime64_binary(
    instant: &NaiveDateTime,
    precision: u8,
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let seconds = instant.and_utc().timestamp();
    let ticks = seconds
        .checked_mul(ten_pow(precision))
        .and_then(|t| t.checked_add(fraction_at_precision(instant, precision)))
        .ok_or_else(|| out_of_range(instant, "DateTime64"))?;
    ticks.write_le(out);
    Ok(())
}

pub fn read_datetime64_binary(
    cursor: &mut Cursor<&[u8]>,
    precision: u8,
) -> Result<NaiveDateTime, CodecError> {
    let ticks: i64 = binary::read_fixed(cursor)?;
    let scale = ten_pow(precision);
    let seconds = ticks.div_euclid(scale);
    let nanos = ticks.rem_euclid(scale) * (NANOS_PER_SECOND / scale);
    // `nanos` is in 0..1e9 by construction.
    DateTime::from_timestamp(seconds, nanos as u32)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| invalid("DateTime64", &ticks.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap()
    }

    #[test]
    fn test_date_layouts() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let mut text = String::new();
        write_date_text(&date, &mut text).unwrap();
        assert_eq!(text, "2024-02-29");
        assert_eq!(parse_date(&text).unwrap(), date);

        let mut buf = Vec::new();
        write_date_binary(&date, &mut buf).unwrap();
        assert_eq!(buf, 19782u16.to_le_bytes());
        let mut cursor = Cursor::new(buf.as_slice());
        assert_eq!(read_date_binary(&mut cursor).unwrap(), date);

        let before_epoch = NaiveDate::from_ymd_opt(1969, 12, 31).unwrap();
        assert!(matches!(
            write_date_binary(&before_epoch, &mut Vec::new()),
            Err(CodecError::Encoding(_))
        ));
    }

    #[test]
    fn test_datetime_timezone_wall_clock() {
        let utc = instant("2024-07-01 10:00:00");
        let mut text = String::new();
        write_datetime_text(&utc, Some(chrono_tz::Europe::Berlin), &mut text).unwrap();
        assert_eq!(text, "2024-07-01 12:00:00");
        assert_eq!(
            parse_datetime(&text, Some(chrono_tz::Europe::Berlin)).unwrap(),
            utc
        );
        assert_eq!(parse_datetime("2024-07-01 10:00:00", None).unwrap(), utc);
    }

    #[test]
    fn test_datetime64_precision_and_truncation() {
        let utc = instant("2024-01-02 03:04:05.123456789");
        let mut text = String::new();
        write_datetime64_text(&utc, 3, None, &mut text);
        assert_eq!(text, "2024-01-02 03:04:05.123");

        let parsed = parse_datetime64("2024-01-02 03:04:05.123999", 3, None).unwrap();
        assert_eq!(parsed, instant("2024-01-02 03:04:05.123"));
        let parsed = parse_datetime64("2024-01-02 03:04:05.5", 6, None).unwrap();
        assert_eq!(parsed, instant("2024-01-02 03:04:05.5"));

        let mut zero = String::new();
        write_datetime64_text(&utc, 0, None, &mut zero);
        assert_eq!(zero, "2024-01-02 03:04:05");
    }

    #[test]
    fn test_datetime64_ticks_before_epoch() {
        let utc = instant("1969-12-31 23:59:59.250");
        let mut buf = Vec::new();
        write_datetime64_binary(&utc, 3, &mut buf).unwrap();
        assert_eq!(buf, (-750i64).to_le_bytes());
        let mut cursor = Cursor::new(buf.as_slice());
        assert_eq!(read_datetime64_binary(&mut cursor, 3).unwrap(), utc);
    }
}
