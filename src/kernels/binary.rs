//! Pure, stateless kernels for the little-endian RowBinary value layout.
//!
//! Fixed-width numbers are written with `to_le_bytes` and read back through a
//! bounds-checked cursor; variable-width strings carry a LEB128 byte-length prefix.

use std::io::Cursor;

use crate::error::CodecError;
use crate::kernels::leb128;

//==================================================================================
// 1. Fixed-Width Numbers
//==================================================================================

/// A primitive that has a fixed-size little-endian wire form.
pub trait FixedWidth: Sized + Copy {
    const WIDTH: usize;

    fn write_le(self, out: &mut Vec<u8>);

    /// `bytes` is guaranteed by the caller to be exactly `WIDTH` long.
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_fixed_width {
    ($($t:ty),* $(,)?) => {
        $(
            impl FixedWidth for $t {
                const WIDTH: usize = std::mem::size_of::<$t>();

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(bytes);
                    <$t>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_fixed_width!(i8, i16, i32, i64, i128, u8, u16, u32, u64, f32, f64);

/// Borrows the next `len` bytes from the cursor and advances past them.
pub fn take_bytes<'a>(cursor: &mut Cursor<&'a [u8]>, len: usize) -> Result<&'a [u8], CodecError> {
    let buf: &'a [u8] = *cursor.get_ref();
    let start = cursor.position() as usize;
    let end = start.checked_add(len).ok_or(CodecError::UnexpectedEof)?;
    let slice = buf.get(start..end).ok_or(CodecError::UnexpectedEof)?;
    cursor.set_position(end as u64);
    Ok(slice)
}

/// Reads one fixed-width little-endian value.
pub fn read_fixed<T: FixedWidth>(cursor: &mut Cursor<&[u8]>) -> Result<T, CodecError> {
    let bytes = take_bytes(cursor, T::WIDTH)?;
    Ok(T::from_le_slice(bytes))
}

/// Number of bytes the cursor has not consumed yet.
pub fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    cursor
        .get_ref()
        .len()
        .saturating_sub(cursor.position() as usize)
}

//==================================================================================
// 2. 256-bit Integers (stored as sign-extended i128)
//==================================================================================

/// Writes an `i128` as a 32-byte two's-complement little-endian integer.
pub fn write_i256(value: i128, out: &mut Vec<u8>) {
    value.write_le(out);
    let extension = if value < 0 { 0xFF } else { 0x00 };
    out.extend_from_slice(&[extension; 16]);
}

/// Reads a 32-byte integer, failing if it does not fit in an `i128`.
pub fn read_i256(cursor: &mut Cursor<&[u8]>) -> Result<i128, CodecError> {
    let bytes = take_bytes(cursor, 32)?;
    let low = i128::from_le_slice(&bytes[..16]);
    let extension = if low < 0 { 0xFF } else { 0x00 };
    if bytes[16..].iter().any(|&b| b != extension) {
        return Err(CodecError::InvalidScalar {
            type_name: "Int256".to_string(),
            raw: "value exceeds 128 bits".to_string(),
        });
    }
    Ok(low)
}

//==================================================================================
// 3. Length-Prefixed Strings
//==================================================================================

/// Writes a LEB128 length followed by the raw UTF-8 bytes.
pub fn write_string(value: &str, out: &mut Vec<u8>) -> Result<(), CodecError> {
    leb128::encode_one(value.len() as u64, out)?;
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

/// Reads a LEB128 length-prefixed UTF-8 string.
pub fn read_string(cursor: &mut Cursor<&[u8]>) -> Result<String, CodecError> {
    // `take_bytes` checks the length against the payload before anything is copied.
    let len = leb128::decode_len(cursor)?;
    let bytes = take_bytes(cursor, len)?;
    String::from_utf8(bytes.to_vec()).map_err(|e| CodecError::InvalidScalar {
        type_name: "String".to_string(),
        raw: e.to_string(),
    })
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_little_endian_layout() {
        let mut buf = Vec::new();
        0x0102_0304i32.write_le(&mut buf);
        (-2i16).write_le(&mut buf);
        assert_eq!(buf, vec![0x04, 0x03, 0x02, 0x01, 0xFE, 0xFF]);

        let mut cursor = Cursor::new(buf.as_slice());
        assert_eq!(read_fixed::<i32>(&mut cursor).unwrap(), 0x0102_0304);
        assert_eq!(read_fixed::<i16>(&mut cursor).unwrap(), -2);
        assert!(matches!(
            read_fixed::<u8>(&mut cursor),
            Err(CodecError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_i256_sign_extension() {
        let mut buf = Vec::new();
        write_i256(-5, &mut buf);
        assert_eq!(buf.len(), 32);
        assert!(buf[16..].iter().all(|&b| b == 0xFF));
        let mut cursor = Cursor::new(buf.as_slice());
        assert_eq!(read_i256(&mut cursor).unwrap(), -5);

        let mut too_wide = vec![0u8; 32];
        too_wide[20] = 1;
        let mut cursor = Cursor::new(too_wide.as_slice());
        assert!(read_i256(&mut cursor).is_err());
    }

    #[test]
    fn test_string_prefix_and_truncation() {
        let mut buf = Vec::new();
        write_string("héllo", &mut buf).unwrap();
        assert_eq!(buf[0], 6);

        let mut cursor = Cursor::new(buf.as_slice());
        assert_eq!(read_string(&mut cursor).unwrap(), "héllo");

        // Payload size is bounded only by the buffer.
        let large = "x".repeat(17 * 1024 * 1024);
        let mut buf_large = Vec::new();
        write_string(&large, &mut buf_large).unwrap();
        let mut cursor = Cursor::new(buf_large.as_slice());
        assert_eq!(read_string(&mut cursor).unwrap().len(), large.len());

        let truncated = &buf[..4];
        let mut cursor = Cursor::new(truncated);
        assert!(matches!(
            read_string(&mut cursor),
            Err(CodecError::UnexpectedEof)
        ));
    }
}
