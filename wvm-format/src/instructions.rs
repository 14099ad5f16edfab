// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Opcodes and decoded instructions.
//!
//! The in-memory instruction form keeps structured control flow nested:
//! `block`/`loop`/`if` own their bodies, and there is never an explicit
//! `else` or `end` instruction. Every operand shape is a variant of
//! [`Operands`].

use core::fmt;
use std::sync::Arc;

use crate::types::BlockType;

/// Marker byte closing an instruction sequence
pub const END: u8 = 0x0B;
/// Marker byte separating the two arms of an `if`
pub const ELSE: u8 = 0x05;
/// Prefix byte of the saturating truncation family
pub const MISC_PREFIX: u8 = 0xFC;

macro_rules! define_opcodes {
    ($( $variant:ident = $byte:literal => $name:literal, )*) => {
        /// The closed set of single-byte opcodes understood by wvm
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $(
                #[doc = $name]
                $variant = $byte,
            )*
        }

        impl Opcode {
            /// Look up an opcode byte
            #[must_use]
            pub const fn from_byte(byte: u8) -> Option<Self> {
                match byte {
                    $( $byte => Some(Self::$variant), )*
                    _ => None,
                }
            }

            /// Text-format mnemonic
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )*
                }
            }
        }
    };
}

define_opcodes! {
    Unreachable = 0x00 => "unreachable",
    Nop = 0x01 => "nop",
    Block = 0x02 => "block",
    Loop = 0x03 => "loop",
    If = 0x04 => "if",
    Br = 0x0C => "br",
    BrIf = 0x0D => "br_if",
    BrTable = 0x0E => "br_table",
    Return = 0x0F => "return",
    Call = 0x10 => "call",
    CallIndirect = 0x11 => "call_indirect",
    Drop = 0x1A => "drop",
    Select = 0x1B => "select",
    LocalGet = 0x20 => "local.get",
    LocalSet = 0x21 => "local.set",
    LocalTee = 0x22 => "local.tee",
    GlobalGet = 0x23 => "global.get",
    GlobalSet = 0x24 => "global.set",
    I32Load = 0x28 => "i32.load",
    I64Load = 0x29 => "i64.load",
    F32Load = 0x2A => "f32.load",
    F64Load = 0x2B => "f64.load",
    I32Load8S = 0x2C => "i32.load8_s",
    I32Load8U = 0x2D => "i32.load8_u",
    I32Load16S = 0x2E => "i32.load16_s",
    I32Load16U = 0x2F => "i32.load16_u",
    I64Load8S = 0x30 => "i64.load8_s",
    I64Load8U = 0x31 => "i64.load8_u",
    I64Load16S = 0x32 => "i64.load16_s",
    I64Load16U = 0x33 => "i64.load16_u",
    I64Load32S = 0x34 => "i64.load32_s",
    I64Load32U = 0x35 => "i64.load32_u",
    I32Store = 0x36 => "i32.store",
    I64Store = 0x37 => "i64.store",
    F32Store = 0x38 => "f32.store",
    F64Store = 0x39 => "f64.store",
    I32Store8 = 0x3A => "i32.store8",
    I32Store16 = 0x3B => "i32.store16",
    I64Store8 = 0x3C => "i64.store8",
    I64Store16 = 0x3D => "i64.store16",
    I64Store32 = 0x3E => "i64.store32",
    MemorySize = 0x3F => "memory.size",
    MemoryGrow = 0x40 => "memory.grow",
    I32Const = 0x41 => "i32.const",
    I64Const = 0x42 => "i64.const",
    F32Const = 0x43 => "f32.const",
    F64Const = 0x44 => "f64.const",
    I32Eqz = 0x45 => "i32.eqz",
    I32Eq = 0x46 => "i32.eq",
    I32Ne = 0x47 => "i32.ne",
    I32LtS = 0x48 => "i32.lt_s",
    I32LtU = 0x49 => "i32.lt_u",
    I32GtS = 0x4A => "i32.gt_s",
    I32GtU = 0x4B => "i32.gt_u",
    I32LeS = 0x4C => "i32.le_s",
    I32LeU = 0x4D => "i32.le_u",
    I32GeS = 0x4E => "i32.ge_s",
    I32GeU = 0x4F => "i32.ge_u",
    I64Eqz = 0x50 => "i64.eqz",
    I64Eq = 0x51 => "i64.eq",
    I64Ne = 0x52 => "i64.ne",
    I64LtS = 0x53 => "i64.lt_s",
    I64LtU = 0x54 => "i64.lt_u",
    I64GtS = 0x55 => "i64.gt_s",
    I64GtU = 0x56 => "i64.gt_u",
    I64LeS = 0x57 => "i64.le_s",
    I64LeU = 0x58 => "i64.le_u",
    I64GeS = 0x59 => "i64.ge_s",
    I64GeU = 0x5A => "i64.ge_u",
    F32Eq = 0x5B => "f32.eq",
    F32Ne = 0x5C => "f32.ne",
    F32Lt = 0x5D => "f32.lt",
    F32Gt = 0x5E => "f32.gt",
    F32Le = 0x5F => "f32.le",
    F32Ge = 0x60 => "f32.ge",
    F64Eq = 0x61 => "f64.eq",
    F64Ne = 0x62 => "f64.ne",
    F64Lt = 0x63 => "f64.lt",
    F64Gt = 0x64 => "f64.gt",
    F64Le = 0x65 => "f64.le",
    F64Ge = 0x66 => "f64.ge",
    I32Clz = 0x67 => "i32.clz",
    I32Ctz = 0x68 => "i32.ctz",
    I32Popcnt = 0x69 => "i32.popcnt",
    I32Add = 0x6A => "i32.add",
    I32Sub = 0x6B => "i32.sub",
    I32Mul = 0x6C => "i32.mul",
    I32DivS = 0x6D => "i32.div_s",
    I32DivU = 0x6E => "i32.div_u",
    I32RemS = 0x6F => "i32.rem_s",
    I32RemU = 0x70 => "i32.rem_u",
    I32And = 0x71 => "i32.and",
    I32Or = 0x72 => "i32.or",
    I32Xor = 0x73 => "i32.xor",
    I32Shl = 0x74 => "i32.shl",
    I32ShrS = 0x75 => "i32.shr_s",
    I32ShrU = 0x76 => "i32.shr_u",
    I32Rotl = 0x77 => "i32.rotl",
    I32Rotr = 0x78 => "i32.rotr",
    I64Clz = 0x79 => "i64.clz",
    I64Ctz = 0x7A => "i64.ctz",
    I64Popcnt = 0x7B => "i64.popcnt",
    I64Add = 0x7C => "i64.add",
    I64Sub = 0x7D => "i64.sub",
    I64Mul = 0x7E => "i64.mul",
    I64DivS = 0x7F => "i64.div_s",
    I64DivU = 0x80 => "i64.div_u",
    I64RemS = 0x81 => "i64.rem_s",
    I64RemU = 0x82 => "i64.rem_u",
    I64And = 0x83 => "i64.and",
    I64Or = 0x84 => "i64.or",
    I64Xor = 0x85 => "i64.xor",
    I64Shl = 0x86 => "i64.shl",
    I64ShrS = 0x87 => "i64.shr_s",
    I64ShrU = 0x88 => "i64.shr_u",
    I64Rotl = 0x89 => "i64.rotl",
    I64Rotr = 0x8A => "i64.rotr",
    F32Abs = 0x8B => "f32.abs",
    F32Neg = 0x8C => "f32.neg",
    F32Ceil = 0x8D => "f32.ceil",
    F32Floor = 0x8E => "f32.floor",
    F32Trunc = 0x8F => "f32.trunc",
    F32Nearest = 0x90 => "f32.nearest",
    F32Sqrt = 0x91 => "f32.sqrt",
    F32Add = 0x92 => "f32.add",
    F32Sub = 0x93 => "f32.sub",
    F32Mul = 0x94 => "f32.mul",
    F32Div = 0x95 => "f32.div",
    F32Min = 0x96 => "f32.min",
    F32Max = 0x97 => "f32.max",
    F32Copysign = 0x98 => "f32.copysign",
    F64Abs = 0x99 => "f64.abs",
    F64Neg = 0x9A => "f64.neg",
    F64Ceil = 0x9B => "f64.ceil",
    F64Floor = 0x9C => "f64.floor",
    F64Trunc = 0x9D => "f64.trunc",
    F64Nearest = 0x9E => "f64.nearest",
    F64Sqrt = 0x9F => "f64.sqrt",
    F64Add = 0xA0 => "f64.add",
    F64Sub = 0xA1 => "f64.sub",
    F64Mul = 0xA2 => "f64.mul",
    F64Div = 0xA3 => "f64.div",
    F64Min = 0xA4 => "f64.min",
    F64Max = 0xA5 => "f64.max",
    F64Copysign = 0xA6 => "f64.copysign",
    I32WrapI64 = 0xA7 => "i32.wrap_i64",
    I32TruncF32S = 0xA8 => "i32.trunc_f32_s",
    I32TruncF32U = 0xA9 => "i32.trunc_f32_u",
    I32TruncF64S = 0xAA => "i32.trunc_f64_s",
    I32TruncF64U = 0xAB => "i32.trunc_f64_u",
    I64ExtendI32S = 0xAC => "i64.extend_i32_s",
    I64ExtendI32U = 0xAD => "i64.extend_i32_u",
    I64TruncF32S = 0xAE => "i64.trunc_f32_s",
    I64TruncF32U = 0xAF => "i64.trunc_f32_u",
    I64TruncF64S = 0xB0 => "i64.trunc_f64_s",
    I64TruncF64U = 0xB1 => "i64.trunc_f64_u",
    F32ConvertI32S = 0xB2 => "f32.convert_i32_s",
    F32ConvertI32U = 0xB3 => "f32.convert_i32_u",
    F32ConvertI64S = 0xB4 => "f32.convert_i64_s",
    F32ConvertI64U = 0xB5 => "f32.convert_i64_u",
    F32DemoteF64 = 0xB6 => "f32.demote_f64",
    F64ConvertI32S = 0xB7 => "f64.convert_i32_s",
    F64ConvertI32U = 0xB8 => "f64.convert_i32_u",
    F64ConvertI64S = 0xB9 => "f64.convert_i64_s",
    F64ConvertI64U = 0xBA => "f64.convert_i64_u",
    F64PromoteF32 = 0xBB => "f64.promote_f32",
    I32ReinterpretF32 = 0xBC => "i32.reinterpret_f32",
    I64ReinterpretF64 = 0xBD => "i64.reinterpret_f64",
    F32ReinterpretI32 = 0xBE => "f32.reinterpret_i32",
    F64ReinterpretI64 = 0xBF => "f64.reinterpret_i64",
    I32Extend8S = 0xC0 => "i32.extend8_s",
    I32Extend16S = 0xC1 => "i32.extend16_s",
    I64Extend8S = 0xC2 => "i64.extend8_s",
    I64Extend16S = 0xC3 => "i64.extend16_s",
    I64Extend32S = 0xC4 => "i64.extend32_s",
    TruncSat = 0xFC => "trunc_sat",
}

impl Opcode {
    /// The opcode byte
    #[must_use]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Access width in bytes of a load or store, `None` for other opcodes
    #[must_use]
    pub const fn memory_access_width(self) -> Option<u32> {
        match self {
            Self::I32Load8S | Self::I32Load8U | Self::I64Load8S | Self::I64Load8U
            | Self::I32Store8 | Self::I64Store8 => Some(1),
            Self::I32Load16S | Self::I32Load16U | Self::I64Load16S | Self::I64Load16U
            | Self::I32Store16 | Self::I64Store16 => Some(2),
            Self::I32Load | Self::F32Load | Self::I64Load32S | Self::I64Load32U
            | Self::I32Store | Self::F32Store | Self::I64Store32 => Some(4),
            Self::I64Load | Self::F64Load | Self::I64Store | Self::F64Store => Some(8),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sub-opcodes behind the `0xFC` prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TruncSatOp {
    /// `i32.trunc_sat_f32_s`
    I32F32S,
    /// `i32.trunc_sat_f32_u`
    I32F32U,
    /// `i32.trunc_sat_f64_s`
    I32F64S,
    /// `i32.trunc_sat_f64_u`
    I32F64U,
    /// `i64.trunc_sat_f32_s`
    I64F32S,
    /// `i64.trunc_sat_f32_u`
    I64F32U,
    /// `i64.trunc_sat_f64_s`
    I64F64S,
    /// `i64.trunc_sat_f64_u`
    I64F64U,
}

impl TruncSatOp {
    /// Look up a sub-opcode
    #[must_use]
    pub const fn from_sub_opcode(sub: u32) -> Option<Self> {
        Some(match sub {
            0 => Self::I32F32S,
            1 => Self::I32F32U,
            2 => Self::I32F64S,
            3 => Self::I32F64U,
            4 => Self::I64F32S,
            5 => Self::I64F32U,
            6 => Self::I64F64S,
            7 => Self::I64F64U,
            _ => return None,
        })
    }

    /// Text-format mnemonic
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::I32F32S => "i32.trunc_sat_f32_s",
            Self::I32F32U => "i32.trunc_sat_f32_u",
            Self::I32F64S => "i32.trunc_sat_f64_s",
            Self::I32F64U => "i32.trunc_sat_f64_u",
            Self::I64F32S => "i64.trunc_sat_f32_s",
            Self::I64F32U => "i64.trunc_sat_f32_u",
            Self::I64F64S => "i64.trunc_sat_f64_s",
            Self::I64F64U => "i64.trunc_sat_f64_u",
        }
    }
}

/// An instruction sequence. Cheap to clone so control frames can hold one.
pub type Expr = Arc<[Instruction]>;

/// Memory access immediate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemArg {
    /// Alignment exponent (log2 of the byte alignment)
    pub align:  u32,
    /// Static offset added to the dynamic address
    pub offset: u32,
}

impl fmt::Display for MemArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{align: {}, offset: {}}}", self.align, self.offset)
    }
}

/// Body of `block` and `loop`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Block signature
    pub block_type: BlockType,
    /// Nested instructions
    pub body:       Expr,
}

/// Body of `if`
#[derive(Debug, Clone, PartialEq)]
pub struct IfBlock {
    /// Block signature
    pub block_type: BlockType,
    /// Instructions run when the condition is non-zero
    pub then_body:  Expr,
    /// Instructions run otherwise; empty when there was no `else`
    pub else_body:  Expr,
}

/// `br_table` immediate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrTable {
    /// Label depths indexed by the operand
    pub labels:  Vec<u32>,
    /// Label depth for out-of-range operands
    pub default: u32,
}

impl fmt::Display for BrTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} default={}", self.labels, self.default)
    }
}

/// Opcode-dependent instruction payload
#[derive(Debug, Clone, PartialEq)]
pub enum Operands {
    /// No immediate
    None,
    /// Function, local, global or label index
    Index(u32),
    /// `call_indirect` type index
    TypeIndex(u32),
    /// `i32.const`
    I32(i32),
    /// `i64.const`
    I64(i64),
    /// `f32.const`
    F32(f32),
    /// `f64.const`
    F64(f64),
    /// Loads and stores
    MemArg(MemArg),
    /// `block` and `loop`
    Block(Block),
    /// `if`
    If(IfBlock),
    /// `br_table`
    BrTable(BrTable),
    /// `0xFC` saturating truncations
    TruncSat(TruncSatOp),
}

impl fmt::Display for Operands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None | Self::TruncSat(_) => Ok(()),
            Self::Index(idx) => write!(f, "{idx}"),
            Self::TypeIndex(idx) => write!(f, "type={idx}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::MemArg(arg) => write!(f, "{arg}"),
            Self::Block(block) => write!(f, "{}", block.block_type),
            Self::If(block) => write!(f, "{}", block.block_type),
            Self::BrTable(table) => write!(f, "{table}"),
        }
    }
}

/// A decoded instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Opcode byte
    pub opcode:   Opcode,
    /// Immediate payload
    pub operands: Operands,
}

impl Instruction {
    /// Create an instruction
    #[must_use]
    pub const fn new(opcode: Opcode, operands: Operands) -> Self {
        Self { opcode, operands }
    }

    /// Create an instruction without immediates
    #[must_use]
    pub const fn simple(opcode: Opcode) -> Self {
        Self { opcode, operands: Operands::None }
    }

    /// Mnemonic, resolving `0xFC` sub-opcodes
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self.operands {
            Operands::TruncSat(op) => op.name(),
            _ => self.opcode.name(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operands {
            Operands::None | Operands::TruncSat(_) => f.write_str(self.name()),
            _ => write!(f, "{} {}", self.name(), self.operands),
        }
    }
}
