// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Module decoder.
//!
//! A [`Decoder`] is a byte cursor over an immutable buffer. The section
//! loop lives here; the typed contents of each section are decoded in
//! [`crate::sections`] and instruction sequences in
//! [`crate::instructions`].

use log::{debug, warn};
use wvm_error::{Result, ResultExt};
use wvm_format::{
    binary::{self, CUSTOM_SECTION_ID, DATA_SECTION_ID},
    module::{CustomSection, Module},
    types::ValueType,
};

use crate::section_error;

/// Byte cursor used by all decoding routines
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    bytes: &'a [u8],
    pos:   usize,
}

impl<'a> Decoder<'a> {
    /// Create a decoder positioned at the start of `bytes`
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current byte offset
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether every byte has been consumed
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    pub(crate) fn peek_u8(&self) -> Result<u8> {
        self.bytes.get(self.pos).copied().ok_or_else(|| section_error::unexpected_end(self.pos, "byte"))
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let byte = self.peek_u8()?;
        self.pos += 1;
        Ok(byte)
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| section_error::unexpected_end(self.pos, "byte sequence"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        let (value, size) = binary::read_leb128_u32(self.bytes, self.pos)?;
        self.pos += size;
        Ok(value)
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32> {
        let (value, size) = binary::read_leb128_i32(self.bytes, self.pos)?;
        self.pos += size;
        Ok(value)
    }

    pub(crate) fn read_i33(&mut self) -> Result<i64> {
        let (value, size) = binary::read_leb128_i33(self.bytes, self.pos)?;
        self.pos += size;
        Ok(value)
    }

    pub(crate) fn read_i64(&mut self) -> Result<i64> {
        let (value, size) = binary::read_leb128_i64(self.bytes, self.pos)?;
        self.pos += size;
        Ok(value)
    }

    pub(crate) fn read_f32(&mut self) -> Result<f32> {
        let (value, size) = binary::read_f32(self.bytes, self.pos)?;
        self.pos += size;
        Ok(value)
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64> {
        let (value, size) = binary::read_f64(self.bytes, self.pos)?;
        self.pos += size;
        Ok(value)
    }

    pub(crate) fn read_u32_le(&mut self) -> Result<u32> {
        let (value, size) = binary::read_u32_le(self.bytes, self.pos)?;
        self.pos += size;
        Ok(value)
    }

    pub(crate) fn read_name(&mut self) -> Result<String> {
        let (name, size) = binary::read_string(self.bytes, self.pos)?;
        self.pos += size;
        Ok(name)
    }

    pub(crate) fn read_value_type(&mut self) -> Result<ValueType> {
        let offset = self.pos;
        ValueType::from_byte(self.read_u8()?).with_context(|| format!("offset {offset}"))
    }

    /// Read a count-prefixed vector, one element per `read_elem` call
    pub(crate) fn read_vec<T>(&mut self, mut read_elem: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let count = self.read_u32()? as usize;
        // Every element takes at least one byte.
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(read_elem(self)?);
        }
        Ok(items)
    }

    /// Decode a complete module
    pub fn decode_module(&mut self) -> Result<Module> {
        let magic = self.read_u32_le()?;
        if magic != binary::WASM_MAGIC_U32 {
            return Err(section_error::invalid_magic(magic));
        }
        let version = self.read_u32_le()?;
        if version != binary::WASM_VERSION_U32 {
            return Err(section_error::unsupported_version(version));
        }

        let mut module = Module { magic, version, ..Module::default() };
        let mut last_id = CUSTOM_SECTION_ID;

        while !self.is_at_end() {
            let header_offset = self.pos;
            let id = self.read_u8()?;
            if id > DATA_SECTION_ID {
                return Err(section_error::unknown_section(id, header_offset));
            }
            if id != CUSTOM_SECTION_ID {
                if id <= last_id {
                    return Err(section_error::malformed_order(last_id, id, header_offset));
                }
                last_id = id;
            }

            let size = self.read_u32()? as usize;
            let start = self.pos;
            if size > self.remaining() {
                return Err(section_error::unexpected_end(start, binary::section_name(id)));
            }
            debug!("{} section: {size} bytes at offset {start}", binary::section_name(id));

            if id == CUSTOM_SECTION_ID {
                let custom = self.read_custom_section(size)?;
                module.customs.push(custom);
            } else {
                self.read_section(id, &mut module).with_context(|| {
                    format!("{} section at offset {start}", binary::section_name(id))
                })?;
            }

            let consumed = self.pos - start;
            if consumed != size {
                return Err(section_error::size_mismatch(id, size, consumed));
            }
        }

        debug!(
            "decoded module: {} types, {} imports, {} functions, {} exports",
            module.types.len(),
            module.imports.len(),
            module.functions.len(),
            module.exports.len(),
        );
        Ok(module)
    }

    fn read_custom_section(&mut self, size: usize) -> Result<CustomSection> {
        let start = self.pos;
        let name = self.read_name().context("custom section name")?;
        let name_len = self.pos - start;
        let Some(payload_len) = size.checked_sub(name_len) else {
            return Err(section_error::size_mismatch(CUSTOM_SECTION_ID, size, name_len));
        };
        let bytes = self.read_bytes(payload_len)?.to_vec();
        if name.is_empty() {
            warn!("custom section with empty name at offset {start}");
        }
        Ok(CustomSection { name, bytes })
    }
}

/// Decode a module from a byte buffer
pub fn decode_module(bytes: &[u8]) -> Result<Module> {
    Decoder::new(bytes).decode_module()
}
