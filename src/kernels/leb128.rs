//! This module contains the pure, stateless kernels for performing LEB128
//! (Little-Endian Base 128) variable-length integer encoding and decoding.
//!
//! RowBinary uses unsigned LEB128 for every length prefix: string byte lengths,
//! array element counts and map pair counts. It is fully panic-free.

use num_traits::{PrimInt, Unsigned};
use std::io::Cursor;

use crate::error::CodecError;

//==================================================================================
// 1. Public API for Single-Value Operations
//==================================================================================

/// Encodes a single unsigned integer into a LEB128 byte sequence, writing to a buffer.
pub fn encode_one<T>(value: T, buffer: &mut Vec<u8>) -> Result<(), CodecError>
where
    T: PrimInt + Unsigned,
{
    let zero = T::zero();
    let seven_bit_mask = T::from(0x7F)
        .ok_or_else(|| CodecError::Leb128("Failed to create 7-bit mask for type".to_string()))?;
    let continuation_bit_t = T::from(0x80).ok_or_else(|| {
        CodecError::Leb128("Failed to create continuation bit for type".to_string())
    })?;

    let mut current_value = value;
    loop {
        let mut byte = current_value & seven_bit_mask;
        current_value = current_value >> 7;
        if current_value != zero {
            byte = byte | continuation_bit_t;
        }

        let byte_u8 = byte.to_u8().ok_or_else(|| {
            CodecError::Leb128("Failed to convert generic integer to u8".to_string())
        })?;
        buffer.push(byte_u8);

        if current_value == zero {
            break;
        }
    }
    Ok(())
}

/// Decodes a single unsigned integer from a LEB128 byte stream cursor.
pub fn decode_one<T>(cursor: &mut Cursor<&[u8]>) -> Result<T, CodecError>
where
    T: PrimInt + Unsigned,
{
    let mut result = T::zero();
    let mut shift = 0;
    let total_bits = std::mem::size_of::<T>() * 8;

    loop {
        let pos = cursor.position() as usize;
        let byte = *cursor.get_ref().get(pos).ok_or(CodecError::UnexpectedEof)?;
        cursor.set_position((pos + 1) as u64);

        let seven_bit_payload = T::from(byte & 0x7F).ok_or_else(|| {
            CodecError::Leb128("Failed to create 7-bit payload from byte".to_string())
        })?;

        if shift >= total_bits {
            return Err(CodecError::Leb128(
                "Integer overflow during decoding".to_string(),
            ));
        }

        result = result | (seven_bit_payload << shift);

        if byte & 0x80 == 0 {
            // The final group may not set bits beyond the width of `T`.
            if shift + 7 > total_bits && (byte >> (total_bits - shift)) > 0 {
                return Err(CodecError::Leb128(
                    "Integer overflow during decoding".to_string(),
                ));
            }
            return Ok(result);
        }

        shift += 7;
    }
}

/// Decodes a length prefix and converts it to `usize`.
pub fn decode_len(cursor: &mut Cursor<&[u8]>) -> Result<usize, CodecError> {
    let len: u64 = decode_one(cursor)?;
    usize::try_from(len)
        .map_err(|_| CodecError::Leb128(format!("Length prefix {} does not fit in usize", len)))
}
