// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Constructors for decoding errors that carry byte offsets and section ids.

use wvm_error::{Error, codes, kinds};
use wvm_format::binary;

/// Input ended before a complete item was read
pub fn unexpected_end(offset: usize, what: &str) -> Error {
    kinds::parse_error(
        codes::UNEXPECTED_EOF,
        format!("unexpected end of input reading {what} at offset {offset}"),
    )
}

/// Magic number did not match `\0asm`
pub fn invalid_magic(actual: u32) -> Error {
    kinds::parse_error(
        codes::BAD_MAGIC,
        format!("magic header not detected: expected 0x{:08x}, found 0x{actual:08x}", binary::WASM_MAGIC_U32),
    )
}

/// Version other than 1
pub fn unsupported_version(actual: u32) -> Error {
    kinds::parse_error(codes::BAD_VERSION, format!("unknown binary version: {actual}"))
}

/// A non-custom section id that does not increase
pub fn malformed_order(previous: u8, got: u8, offset: usize) -> Error {
    kinds::parse_error(
        codes::MALFORMED_SECTION_ORDER,
        format!(
            "malformed section order: {} section (id {got}) after {} section (id {previous}) at offset {offset}",
            binary::section_name(got),
            binary::section_name(previous),
        ),
    )
}

/// Section content consumed a different byte count than declared
pub fn size_mismatch(id: u8, declared: usize, consumed: usize) -> Error {
    kinds::parse_error(
        codes::SECTION_SIZE_MISMATCH,
        format!(
            "section size mismatch in {} section: declared {declared} bytes, consumed {consumed}",
            binary::section_name(id),
        ),
    )
}

/// Section id above the data section
pub fn unknown_section(id: u8, offset: usize) -> Error {
    kinds::parse_error(codes::UNKNOWN_SECTION, format!("unknown section id {id} at offset {offset}"))
}

/// Opcode byte outside the supported set
pub fn unknown_opcode(byte: u8, offset: usize) -> Error {
    kinds::parse_error(codes::UNKNOWN_OPCODE, format!("unknown opcode 0x{byte:02x} at offset {offset}"))
}

/// Malformed tag byte of a structured field
pub fn invalid_tag(code: u16, what: &str, byte: u8, offset: usize) -> Error {
    kinds::parse_error(code, format!("invalid {what} 0x{byte:02x} at offset {offset}"))
}
