// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Instruction sequence decoding.
//!
//! Structured instructions recurse: `block` and `loop` read one sequence
//! up to `end`, `if` reads a then-sequence that stops at `else` or `end`
//! and, after `else`, an else-sequence up to `end`. The terminators are
//! consumed and never stored.

use wvm_error::{Result, codes, kinds};
use wvm_format::{
    binary::BLOCK_TYPE_EMPTY,
    instructions::{Block, BrTable, ELSE, END, Expr, IfBlock, Instruction, MemArg, Opcode, Operands, TruncSatOp},
    types::{BlockType, ValueType},
};

use crate::{decoder::Decoder, section_error};

impl Decoder<'_> {
    /// Read an instruction sequence terminated by `end`
    pub fn read_expr(&mut self) -> Result<Expr> {
        let offset = self.position();
        let (instrs, terminator) = self.read_instructions()?;
        if terminator != END {
            return Err(kinds::parse_error(
                codes::UNKNOWN_OPCODE,
                format!("`else` without matching `if` in sequence starting at offset {offset}"),
            ));
        }
        Ok(instrs.into())
    }

    /// Read instructions until `end` or `else`; returns the terminator byte
    fn read_instructions(&mut self) -> Result<(Vec<Instruction>, u8)> {
        let mut instrs = Vec::new();
        loop {
            let offset = self.position();
            let byte = self.read_u8()?;
            if byte == END || byte == ELSE {
                return Ok((instrs, byte));
            }
            let opcode = Opcode::from_byte(byte).ok_or_else(|| section_error::unknown_opcode(byte, offset))?;
            let operands = self.read_operands(opcode)?;
            instrs.push(Instruction::new(opcode, operands));
        }
    }

    fn read_operands(&mut self, opcode: Opcode) -> Result<Operands> {
        Ok(match opcode {
            Opcode::Block | Opcode::Loop => {
                let block_type = self.read_block_type()?;
                let body = self.read_expr()?;
                Operands::Block(Block { block_type, body })
            }
            Opcode::If => {
                let block_type = self.read_block_type()?;
                let (then_body, terminator) = self.read_instructions()?;
                let else_body = if terminator == ELSE { self.read_expr()? } else { Expr::from([]) };
                Operands::If(IfBlock { block_type, then_body: then_body.into(), else_body })
            }
            Opcode::Br
            | Opcode::BrIf
            | Opcode::Call
            | Opcode::LocalGet
            | Opcode::LocalSet
            | Opcode::LocalTee
            | Opcode::GlobalGet
            | Opcode::GlobalSet => Operands::Index(self.read_u32()?),
            Opcode::BrTable => {
                let labels = self.read_vec(Self::read_u32)?;
                let default = self.read_u32()?;
                Operands::BrTable(BrTable { labels, default })
            }
            Opcode::CallIndirect => {
                let type_index = self.read_u32()?;
                self.read_zero_byte("call_indirect table index")?;
                Operands::TypeIndex(type_index)
            }
            Opcode::MemorySize | Opcode::MemoryGrow => {
                self.read_zero_byte("memory index")?;
                Operands::None
            }
            Opcode::I32Const => Operands::I32(self.read_i32()?),
            Opcode::I64Const => Operands::I64(self.read_i64()?),
            Opcode::F32Const => Operands::F32(self.read_f32()?),
            Opcode::F64Const => Operands::F64(self.read_f64()?),
            Opcode::TruncSat => {
                let offset = self.position();
                let sub = self.read_u32()?;
                let op = TruncSatOp::from_sub_opcode(sub).ok_or_else(|| {
                    kinds::parse_error(
                        codes::UNKNOWN_OPCODE,
                        format!("unknown opcode 0xfc {sub} at offset {offset}"),
                    )
                })?;
                Operands::TruncSat(op)
            }
            op if op.memory_access_width().is_some() => {
                let align = self.read_u32()?;
                let offset = self.read_u32()?;
                Operands::MemArg(MemArg { align, offset })
            }
            _ => Operands::None,
        })
    }

    /// Block types are a signed 33-bit varint: `-0x40` is empty, small
    /// negative values are value types, non-negative values type indices.
    fn read_block_type(&mut self) -> Result<BlockType> {
        let offset = self.position();
        if self.peek_u8()? == BLOCK_TYPE_EMPTY {
            self.read_u8()?;
            return Ok(BlockType::Empty);
        }
        let value = self.read_i33()?;
        if value >= 0 {
            return Ok(BlockType::TypeIndex(value as u32));
        }
        match value {
            -0x40 => Ok(BlockType::Empty),
            // single-byte value type tags 0x7C..=0x7F
            -4..=-1 => {
                let byte = (value & 0x7F) as u8;
                ValueType::from_byte(byte)
                    .map(BlockType::Value)
                    .map_err(|_| section_error::invalid_tag(codes::INVALID_BLOCK_TYPE, "block type", byte, offset))
            }
            _ => Err(kinds::parse_error(
                codes::INVALID_BLOCK_TYPE,
                format!("invalid block type {value} at offset {offset}"),
            )),
        }
    }

    fn read_zero_byte(&mut self, what: &str) -> Result<()> {
        let offset = self.position();
        match self.read_u8()? {
            0x00 => Ok(()),
            byte => Err(section_error::invalid_tag(codes::ZERO_BYTE_EXPECTED, what, byte, offset)),
        }
    }
}
