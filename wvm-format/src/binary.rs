// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WebAssembly binary format handling.
//!
//! Constants for the module header, section IDs and type tags, plus the
//! primitive readers and writers every section is built from. Readers take
//! the whole buffer and a position and return the decoded value together
//! with the number of bytes consumed.

use wvm_error::{codes, kinds, Result};

/// Magic bytes for WebAssembly modules: \0asm
pub const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];

/// Magic number as a little-endian u32
pub const WASM_MAGIC_U32: u32 = 0x6D73_6100;

/// WebAssembly binary format version
pub const WASM_VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Version as a little-endian u32
pub const WASM_VERSION_U32: u32 = 1;

// Section IDs
pub const CUSTOM_SECTION_ID: u8 = 0x00;
pub const TYPE_SECTION_ID: u8 = 0x01;
pub const IMPORT_SECTION_ID: u8 = 0x02;
pub const FUNCTION_SECTION_ID: u8 = 0x03;
pub const TABLE_SECTION_ID: u8 = 0x04;
pub const MEMORY_SECTION_ID: u8 = 0x05;
pub const GLOBAL_SECTION_ID: u8 = 0x06;
pub const EXPORT_SECTION_ID: u8 = 0x07;
pub const START_SECTION_ID: u8 = 0x08;
pub const ELEMENT_SECTION_ID: u8 = 0x09;
pub const CODE_SECTION_ID: u8 = 0x0A;
pub const DATA_SECTION_ID: u8 = 0x0B;

// Value types
pub const I32_TYPE: u8 = 0x7F;
pub const I64_TYPE: u8 = 0x7E;
pub const F32_TYPE: u8 = 0x7D;
pub const F64_TYPE: u8 = 0x7C;
pub const FUNCREF_TYPE: u8 = 0x70;

/// Leading byte of a function type
pub const FUNC_TYPE_TAG: u8 = 0x60;

/// Block type byte for "no params, no results"
pub const BLOCK_TYPE_EMPTY: u8 = 0x40;

// Import/export descriptor tags
pub const EXTERNAL_FUNC: u8 = 0x00;
pub const EXTERNAL_TABLE: u8 = 0x01;
pub const EXTERNAL_MEMORY: u8 = 0x02;
pub const EXTERNAL_GLOBAL: u8 = 0x03;

// Limits flags
pub const LIMITS_MIN_ONLY: u8 = 0x00;
pub const LIMITS_MIN_MAX: u8 = 0x01;

/// Size of a WebAssembly memory page in bytes
pub const PAGE_SIZE: usize = 65536;

/// Maximum number of pages addressable with 32-bit offsets
pub const MAX_PAGES: u32 = 65536;

/// Name of a section ID, used in error context
#[must_use]
pub const fn section_name(id: u8) -> &'static str {
    match id {
        CUSTOM_SECTION_ID => "custom",
        TYPE_SECTION_ID => "type",
        IMPORT_SECTION_ID => "import",
        FUNCTION_SECTION_ID => "function",
        TABLE_SECTION_ID => "table",
        MEMORY_SECTION_ID => "memory",
        GLOBAL_SECTION_ID => "global",
        EXPORT_SECTION_ID => "export",
        START_SECTION_ID => "start",
        ELEMENT_SECTION_ID => "element",
        CODE_SECTION_ID => "code",
        DATA_SECTION_ID => "data",
        _ => "unknown",
    }
}

fn eof(what: &str, pos: usize) -> wvm_error::Error {
    kinds::parse_error(codes::UNEXPECTED_EOF, format!("unexpected end of input reading {what} at offset {pos}"))
}

/// Read an unsigned LEB128 integer of at most `bits` significant bits.
///
/// At most `ceil(bits / 7)` bytes are consumed. A continuation bit on the
/// last permitted byte, or set bits above `bits` in it, is an overflow.
pub fn read_leb128_unsigned(bytes: &[u8], pos: usize, bits: u32) -> Result<(u64, usize)> {
    debug_assert!(bits > 0 && bits <= 64);
    let max_bytes = bits.div_ceil(7) as usize;
    let mut result = 0u64;
    let mut shift = 0u32;
    let mut offset = 0usize;

    loop {
        let byte = *bytes.get(pos + offset).ok_or_else(|| eof("unsigned varint", pos))?;
        offset += 1;

        if offset == max_bytes {
            // Only `bits - shift` payload bits may be set on the final byte.
            let used = bits - shift;
            if byte & 0x80 != 0 || (u32::from(byte & 0x7F) >> used) != 0 {
                return Err(kinds::parse_error(
                    codes::LEB128_OVERFLOW,
                    format!("integer representation too long for u{bits} at offset {pos}"),
                ));
            }
        }

        result |= u64::from(byte & 0x7F) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((result, offset));
        }
    }
}

/// Read a signed LEB128 integer of at most `bits` significant bits.
///
/// The value is sign-extended from the top payload bit of the last byte.
/// On the last permitted byte the unused high bits must repeat the sign bit.
pub fn read_leb128_signed(bytes: &[u8], pos: usize, bits: u32) -> Result<(i64, usize)> {
    debug_assert!(bits > 0 && bits <= 64);
    let max_bytes = bits.div_ceil(7) as usize;
    let mut result = 0i64;
    let mut shift = 0u32;
    let mut offset = 0usize;

    loop {
        let byte = *bytes.get(pos + offset).ok_or_else(|| eof("signed varint", pos))?;
        offset += 1;

        if offset == max_bytes {
            let used = bits - shift;
            let high = u32::from(byte & 0x7F) >> (used - 1);
            let all_ones = 0x7F >> (used - 1);
            if byte & 0x80 != 0 || (high != 0 && high != all_ones) {
                return Err(kinds::parse_error(
                    codes::LEB128_OVERFLOW,
                    format!("integer representation too long for i{bits} at offset {pos}"),
                ));
            }
        }

        result |= i64::from(byte & 0x7F) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            if shift < 64 && byte & 0x40 != 0 {
                result |= -1i64 << shift;
            }
            return Ok((result, offset));
        }
    }
}

/// Read a LEB128 unsigned 32-bit integer
pub fn read_leb128_u32(bytes: &[u8], pos: usize) -> Result<(u32, usize)> {
    let (value, size) = read_leb128_unsigned(bytes, pos, 32)?;
    Ok((value as u32, size))
}

/// Read a LEB128 unsigned 64-bit integer
pub fn read_leb128_u64(bytes: &[u8], pos: usize) -> Result<(u64, usize)> {
    read_leb128_unsigned(bytes, pos, 64)
}

/// Read a LEB128 signed 32-bit integer
pub fn read_leb128_i32(bytes: &[u8], pos: usize) -> Result<(i32, usize)> {
    let (value, size) = read_leb128_signed(bytes, pos, 32)?;
    Ok((value as i32, size))
}

/// Read a LEB128 signed 33-bit integer (block types)
pub fn read_leb128_i33(bytes: &[u8], pos: usize) -> Result<(i64, usize)> {
    read_leb128_signed(bytes, pos, 33)
}

/// Read a LEB128 signed 64-bit integer
pub fn read_leb128_i64(bytes: &[u8], pos: usize) -> Result<(i64, usize)> {
    read_leb128_signed(bytes, pos, 64)
}

/// Write a LEB128 unsigned 32-bit integer
#[must_use]
pub fn write_leb128_u32(value: u32) -> Vec<u8> {
    write_leb128_u64(u64::from(value))
}

/// Write a LEB128 unsigned 64-bit integer
#[must_use]
pub fn write_leb128_u64(value: u64) -> Vec<u8> {
    let mut result = Vec::new();
    let mut value = value;

    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if value != 0 {
            byte |= 0x80;
        }

        result.push(byte);

        if value == 0 {
            return result;
        }
    }
}

/// Write a LEB128 signed 32-bit integer
#[must_use]
pub fn write_leb128_i32(value: i32) -> Vec<u8> {
    write_leb128_i64(i64::from(value))
}

/// Write a LEB128 signed 64-bit integer
#[must_use]
pub fn write_leb128_i64(value: i64) -> Vec<u8> {
    let mut result = Vec::new();
    let mut value = value;

    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;

        // Done once the remaining bits are pure sign extension of bit 6.
        let sign_bit_set = byte & 0x40 != 0;
        let done = (value == 0 && !sign_bit_set) || (value == -1 && sign_bit_set);

        if done {
            result.push(byte);
            return result;
        }
        result.push(byte | 0x80);
    }
}

/// Read a 32-bit IEEE 754 float (little-endian)
pub fn read_f32(bytes: &[u8], pos: usize) -> Result<(f32, usize)> {
    let raw = bytes.get(pos..pos + 4).ok_or_else(|| eof("f32", pos))?;
    let mut buf = [0u8; 4];
    buf.copy_from_slice(raw);
    Ok((f32::from_le_bytes(buf), 4))
}

/// Read a 64-bit IEEE 754 float (little-endian)
pub fn read_f64(bytes: &[u8], pos: usize) -> Result<(f64, usize)> {
    let raw = bytes.get(pos..pos + 8).ok_or_else(|| eof("f64", pos))?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(raw);
    Ok((f64::from_le_bytes(buf), 8))
}

/// Read a little-endian u32 (header fields)
pub fn read_u32_le(bytes: &[u8], pos: usize) -> Result<(u32, usize)> {
    let raw = bytes.get(pos..pos + 4).ok_or_else(|| eof("u32", pos))?;
    let mut buf = [0u8; 4];
    buf.copy_from_slice(raw);
    Ok((u32::from_le_bytes(buf), 4))
}

/// Read a length-prefixed UTF-8 name
pub fn read_string(bytes: &[u8], pos: usize) -> Result<(String, usize)> {
    let (len, len_size) = read_leb128_u32(bytes, pos)?;
    let start = pos + len_size;
    let end = start
        .checked_add(len as usize)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| eof("name", pos))?;

    match core::str::from_utf8(&bytes[start..end]) {
        Ok(s) => Ok((s.to_string(), len_size + len as usize)),
        Err(e) => Err(kinds::parse_error(
            codes::INVALID_UTF8,
            format!("malformed UTF-8 encoding at offset {pos}: {e}"),
        )),
    }
}

/// Write a WebAssembly UTF-8 name (length prefixed)
#[must_use]
pub fn write_string(value: &str) -> Vec<u8> {
    let mut result = write_leb128_u32(value.len() as u32);
    result.extend_from_slice(value.as_bytes());
    result
}

/// Write a section with its ID and byte length
#[must_use]
pub fn write_section(id: u8, payload: &[u8]) -> Vec<u8> {
    let mut result = vec![id];
    result.extend_from_slice(&write_leb128_u32(payload.len() as u32));
    result.extend_from_slice(payload);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u32_fixture() {
        let (value, size) = read_leb128_u32(&[0xE5, 0x8E, 0x26], 0).unwrap();
        assert_eq!(value, 0x09_8765);
        assert_eq!(size, 3);
    }

    #[test]
    fn test_five_byte_input_overflows_u32_but_fits_u64() {
        let bytes = [0xFF, 0xFF, 0xE5, 0x8E, 0x26];
        let err = read_leb128_u32(&bytes, 0).unwrap_err();
        assert_eq!(err.code, codes::LEB128_OVERFLOW);

        let (value, size) = read_leb128_u64(&bytes, 0).unwrap();
        assert_eq!(value, 0x2_61D9_7FFF);
        assert_eq!(size, 5);
    }

    #[test]
    fn test_all_continuation_bytes_overflow() {
        let bytes = [0x80, 0x80, 0x80, 0x80, 0x80, 0x00];
        assert_eq!(read_leb128_u32(&bytes, 0).unwrap_err().code, codes::LEB128_OVERFLOW);
        assert_eq!(read_leb128_i32(&bytes, 0).unwrap_err().code, codes::LEB128_OVERFLOW);
    }

    #[test]
    fn test_read_signed_fixture() {
        let (value, size) = read_leb128_i32(&[0xC0, 0xBB, 0x78], 0).unwrap();
        assert_eq!(value, -123_456);
        assert_eq!(size, 3);
        let (value, _) = read_leb128_i64(&[0xC0, 0xBB, 0x78], 0).unwrap();
        assert_eq!(value, -123_456);
    }

    #[test]
    fn test_signed_boundaries() {
        // i32::MIN: 0x80 0x80 0x80 0x80 0x78
        assert_eq!(read_leb128_i32(&[0x80, 0x80, 0x80, 0x80, 0x78], 0).unwrap().0, i32::MIN);
        // i32::MAX: 0xFF 0xFF 0xFF 0xFF 0x07
        assert_eq!(read_leb128_i32(&[0xFF, 0xFF, 0xFF, 0xFF, 0x07], 0).unwrap().0, i32::MAX);
        // Bit 32 set without matching sign extension
        let err = read_leb128_i32(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F], 0).unwrap_err();
        assert_eq!(err.code, codes::LEB128_OVERFLOW);
        let err = read_leb128_i32(&[0x80, 0x80, 0x80, 0x80, 0x70], 0).unwrap_err();
        assert_eq!(err.code, codes::LEB128_OVERFLOW);
    }

    #[test]
    fn test_block_type_i33() {
        assert_eq!(read_leb128_i33(&[0x40], 0).unwrap(), (-64, 1));
        assert_eq!(read_leb128_i33(&[0x7F], 0).unwrap(), (-1, 1));
        assert_eq!(read_leb128_i33(&[0x05], 0).unwrap(), (5, 1));
    }

    #[test]
    fn test_truncated_varint() {
        let err = read_leb128_u32(&[0x80, 0x80], 0).unwrap_err();
        assert_eq!(err.code, codes::UNEXPECTED_EOF);
    }

    #[test]
    fn test_write_known_encodings() {
        assert_eq!(write_leb128_u32(0), [0x00]);
        assert_eq!(write_leb128_u32(624_485), [0xE5, 0x8E, 0x26]);
        assert_eq!(write_leb128_i32(-123_456), [0xC0, 0xBB, 0x78]);
        assert_eq!(write_leb128_i32(-1), [0x7F]);
        assert_eq!(write_leb128_i32(64), [0xC0, 0x00]);
        assert_eq!(write_leb128_i64(i64::MIN).len(), 10);
    }

    #[test]
    fn test_f32_nan_bits_preserved() {
        let bits = 0x7FA0_0001u32;
        let (decoded, size) = read_f32(&bits.to_le_bytes(), 0).unwrap();
        assert_eq!(size, 4);
        assert_eq!(decoded.to_bits(), bits);
    }

    #[test]
    fn test_read_string() {
        let bytes = write_string("main");
        assert_eq!(read_string(&bytes, 0).unwrap(), ("main".to_string(), 5));

        let err = read_string(&[0x02, 0xC3, 0x28], 0).unwrap_err();
        assert_eq!(err.code, codes::INVALID_UTF8);

        let err = read_string(&[0x05, b'a'], 0).unwrap_err();
        assert_eq!(err.code, codes::UNEXPECTED_EOF);
    }
}
