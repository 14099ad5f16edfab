// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Section parsers for the WebAssembly binary format.
//!
//! Every non-custom section is a count-prefixed vector of fixed-grammar
//! elements, except the start section which is a single function index.

use log::trace;
use wvm_error::{Result, ResultExt, codes, kinds};
use wvm_format::{
    binary::{self, *},
    instructions::{END, Opcode},
    module::{Code, Data, Element, Export, ExportDesc, ExternalKind, Global, Import, ImportDesc, Locals, Module},
    types::{FuncType, GlobalType, Limits, TableType},
};

use crate::{decoder::Decoder, section_error};

/// Upper bound on declared locals per function body
pub const MAX_LOCALS: u64 = 50_000;

impl Decoder<'_> {
    pub(crate) fn read_section(&mut self, id: u8, module: &mut Module) -> Result<()> {
        match id {
            TYPE_SECTION_ID => module.types = self.read_vec(Self::read_func_type)?,
            IMPORT_SECTION_ID => module.imports = self.read_vec(Self::read_import)?,
            FUNCTION_SECTION_ID => module.functions = self.read_vec(Self::read_u32)?,
            TABLE_SECTION_ID => module.tables = self.read_vec(Self::read_table_type)?,
            MEMORY_SECTION_ID => module.memories = self.read_vec(Self::read_limits)?,
            GLOBAL_SECTION_ID => module.globals = self.read_vec(Self::read_global)?,
            EXPORT_SECTION_ID => module.exports = self.read_vec(Self::read_export)?,
            START_SECTION_ID => module.start = Some(self.read_u32()?),
            ELEMENT_SECTION_ID => module.elements = self.read_vec(Self::read_element)?,
            CODE_SECTION_ID => {
                let mut index = 0usize;
                module.codes = self.read_vec(|d| {
                    let code = d.read_code().with_context(|| format!("code[{index}]"))?;
                    index += 1;
                    Ok(code)
                })?;
            }
            DATA_SECTION_ID => module.data = self.read_vec(Self::read_data)?,
            _ => return Err(section_error::unknown_section(id, self.position())),
        }
        Ok(())
    }

    fn read_func_type(&mut self) -> Result<FuncType> {
        let offset = self.position();
        let tag = self.read_u8()?;
        if tag != FUNC_TYPE_TAG {
            return Err(section_error::invalid_tag(codes::INVALID_FUNC_TYPE, "function type tag", tag, offset));
        }
        let params = self.read_vec(Self::read_value_type)?;
        let results = self.read_vec(Self::read_value_type)?;
        Ok(FuncType::new(params, results))
    }

    fn read_limits(&mut self) -> Result<Limits> {
        let offset = self.position();
        match self.read_u8()? {
            LIMITS_MIN_ONLY => Ok(Limits::new(self.read_u32()?, None)),
            LIMITS_MIN_MAX => {
                let min = self.read_u32()?;
                let max = self.read_u32()?;
                Ok(Limits::new(min, Some(max)))
            }
            flag => Err(section_error::invalid_tag(codes::MALFORMED_LIMITS, "limits flag", flag, offset)),
        }
    }

    fn read_table_type(&mut self) -> Result<TableType> {
        let offset = self.position();
        let elem_type = self.read_u8()?;
        if elem_type != FUNCREF_TYPE {
            return Err(section_error::invalid_tag(
                codes::INVALID_ELEMENT_TYPE,
                "table element type",
                elem_type,
                offset,
            ));
        }
        Ok(TableType { limits: self.read_limits()? })
    }

    fn read_global_type(&mut self) -> Result<GlobalType> {
        let value_type = self.read_value_type()?;
        let offset = self.position();
        let mutable = match self.read_u8()? {
            0x00 => false,
            0x01 => true,
            flag => {
                return Err(section_error::invalid_tag(codes::INVALID_MUTABILITY, "mutability", flag, offset));
            }
        };
        Ok(GlobalType { value_type, mutable })
    }

    fn read_import(&mut self) -> Result<Import> {
        let module = self.read_name()?;
        let name = self.read_name()?;
        let offset = self.position();
        let desc = match self.read_u8()? {
            EXTERNAL_FUNC => ImportDesc::Func(self.read_u32()?),
            EXTERNAL_TABLE => ImportDesc::Table(self.read_table_type()?),
            EXTERNAL_MEMORY => ImportDesc::Memory(self.read_limits()?),
            EXTERNAL_GLOBAL => ImportDesc::Global(self.read_global_type()?),
            kind => {
                return Err(section_error::invalid_tag(codes::INVALID_EXTERNAL_KIND, "import kind", kind, offset));
            }
        };
        trace!("import {module}.{name}: {}", desc.kind());
        Ok(Import { module, name, desc })
    }

    fn read_export(&mut self) -> Result<Export> {
        let name = self.read_name()?;
        let offset = self.position();
        let kind = match self.read_u8()? {
            EXTERNAL_FUNC => ExternalKind::Func,
            EXTERNAL_TABLE => ExternalKind::Table,
            EXTERNAL_MEMORY => ExternalKind::Memory,
            EXTERNAL_GLOBAL => ExternalKind::Global,
            kind => {
                return Err(section_error::invalid_tag(codes::INVALID_EXTERNAL_KIND, "export kind", kind, offset));
            }
        };
        let index = self.read_u32()?;
        Ok(Export { name, desc: ExportDesc { kind, index } })
    }

    fn read_global(&mut self) -> Result<Global> {
        let global_type = self.read_global_type()?;
        let init = self.read_expr().context("global initializer")?;
        Ok(Global { global_type, init })
    }

    fn read_element(&mut self) -> Result<Element> {
        let table_index = self.read_u32()?;
        let offset = self.read_expr().context("element offset")?;
        let init = self.read_vec(Self::read_u32)?;
        Ok(Element { table_index, offset, init })
    }

    fn read_data(&mut self) -> Result<Data> {
        let memory_index = self.read_u32()?;
        let offset = self.read_expr().context("data offset")?;
        let len = self.read_u32()? as usize;
        let init = self.read_bytes(len)?.to_vec();
        Ok(Data { memory_index, offset, init })
    }

    fn read_code(&mut self) -> Result<Code> {
        let size = self.read_u32()? as usize;
        let start = self.position();
        if size > self.remaining() {
            return Err(section_error::unexpected_end(start, "function body"));
        }

        let locals = self.read_vec(|d| {
            let count = d.read_u32()?;
            let value_type = d.read_value_type()?;
            Ok(Locals { count, value_type })
        })?;
        let total: u64 = locals.iter().map(|l| u64::from(l.count)).sum();
        if total > MAX_LOCALS {
            return Err(kinds::parse_error(
                codes::TOO_MANY_LOCALS,
                format!("too many locals: {total} declared, at most {MAX_LOCALS} allowed"),
            ));
        }

        let body = self.read_expr()?;
        let consumed = self.position() - start;
        if consumed != size {
            return Err(kinds::parse_error(
                codes::SECTION_SIZE_MISMATCH,
                format!("function body size mismatch: declared {size} bytes, consumed {consumed}"),
            ));
        }
        Ok(Code { locals, body })
    }
}

/// Encode an `end`-terminated constant expression body
///
/// Used by tools that assemble modules by hand, mirroring what
/// [`Decoder`] accepts for initializers.
#[must_use]
pub fn encode_i32_const_expr(value: i32) -> Vec<u8> {
    let mut bytes = vec![Opcode::I32Const.byte()];
    bytes.extend_from_slice(&binary::write_leb128_i32(value));
    bytes.push(END);
    bytes
}
