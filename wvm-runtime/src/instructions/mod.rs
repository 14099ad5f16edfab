// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Instruction dispatch.
//!
//! [`Vm::execute`] is one exhaustive match over [`Opcode`]: adding an opcode
//! to the format crate fails to compile until it has a handler here.

mod control;
mod conversion;
mod memory;
mod numeric;
mod parametric;
mod variable;

use wvm_error::{Error, Result, codes, kinds};
use wvm_format::instructions::{Instruction, Opcode as Op};
use wvm_math as math;

use crate::vm::Vm;

/// Error for an instruction whose immediate does not fit its opcode
pub(crate) fn malformed(instr: &Instruction) -> Error {
    kinds::validation_error(codes::TYPE_MISMATCH, format!("malformed immediate for {}", instr.name()))
}

impl Vm {
    /// Execute one instruction of the top frame
    pub(crate) fn execute(&mut self, instr: &Instruction) -> Result<()> {
        match instr.opcode {
            Op::Unreachable => Err(kinds::trap(codes::UNREACHABLE, "unreachable executed")),
            Op::Nop => Ok(()),
            Op::Block | Op::Loop => self.exec_block(instr),
            Op::If => self.exec_if(instr),
            Op::Br => self.exec_br(instr),
            Op::BrIf => self.exec_br_if(instr),
            Op::BrTable => self.exec_br_table(instr),
            Op::Return => self.exec_return(),
            Op::Call => self.exec_call(instr),
            Op::CallIndirect => self.exec_call_indirect(instr),

            Op::Drop => self.exec_drop(),
            Op::Select => self.exec_select(),

            Op::LocalGet => self.exec_local_get(instr),
            Op::LocalSet => self.exec_local_set(instr),
            Op::LocalTee => self.exec_local_tee(instr),
            Op::GlobalGet => self.exec_global_get(instr),
            Op::GlobalSet => self.exec_global_set(instr),

            Op::I32Load => self.load(instr, i32::from_le_bytes),
            Op::I64Load => self.load(instr, i64::from_le_bytes),
            Op::F32Load => self.load(instr, f32::from_le_bytes),
            Op::F64Load => self.load(instr, f64::from_le_bytes),
            Op::I32Load8S => self.load(instr, |b: [u8; 1]| i32::from(i8::from_le_bytes(b))),
            Op::I32Load8U => self.load(instr, |b: [u8; 1]| i32::from(b[0])),
            Op::I32Load16S => self.load(instr, |b: [u8; 2]| i32::from(i16::from_le_bytes(b))),
            Op::I32Load16U => self.load(instr, |b: [u8; 2]| i32::from(u16::from_le_bytes(b))),
            Op::I64Load8S => self.load(instr, |b: [u8; 1]| i64::from(i8::from_le_bytes(b))),
            Op::I64Load8U => self.load(instr, |b: [u8; 1]| i64::from(b[0])),
            Op::I64Load16S => self.load(instr, |b: [u8; 2]| i64::from(i16::from_le_bytes(b))),
            Op::I64Load16U => self.load(instr, |b: [u8; 2]| i64::from(u16::from_le_bytes(b))),
            Op::I64Load32S => self.load(instr, |b: [u8; 4]| i64::from(i32::from_le_bytes(b))),
            Op::I64Load32U => self.load(instr, |b: [u8; 4]| i64::from(u32::from_le_bytes(b))),
            Op::I32Store => self.store(instr, i32::to_le_bytes),
            Op::I64Store => self.store(instr, i64::to_le_bytes),
            Op::F32Store => self.store(instr, f32::to_le_bytes),
            Op::F64Store => self.store(instr, f64::to_le_bytes),
            Op::I32Store8 => self.store(instr, |v: i32| [v as u8]),
            Op::I32Store16 => self.store(instr, |v: i32| (v as u16).to_le_bytes()),
            Op::I64Store8 => self.store(instr, |v: i64| [v as u8]),
            Op::I64Store16 => self.store(instr, |v: i64| (v as u16).to_le_bytes()),
            Op::I64Store32 => self.store(instr, |v: i64| (v as u32).to_le_bytes()),
            Op::MemorySize => self.exec_memory_size(),
            Op::MemoryGrow => self.exec_memory_grow(),

            Op::I32Const | Op::I64Const | Op::F32Const | Op::F64Const => self.exec_const(instr),

            Op::I32Eqz => self.unop(|a: i32| a == 0),
            Op::I32Eq => self.binop(|a: i32, b| a == b),
            Op::I32Ne => self.binop(|a: i32, b| a != b),
            Op::I32LtS => self.binop(|a: i32, b| a < b),
            Op::I32LtU => self.binop(|a: u32, b| a < b),
            Op::I32GtS => self.binop(|a: i32, b| a > b),
            Op::I32GtU => self.binop(|a: u32, b| a > b),
            Op::I32LeS => self.binop(|a: i32, b| a <= b),
            Op::I32LeU => self.binop(|a: u32, b| a <= b),
            Op::I32GeS => self.binop(|a: i32, b| a >= b),
            Op::I32GeU => self.binop(|a: u32, b| a >= b),

            Op::I64Eqz => self.unop(|a: i64| a == 0),
            Op::I64Eq => self.binop(|a: i64, b| a == b),
            Op::I64Ne => self.binop(|a: i64, b| a != b),
            Op::I64LtS => self.binop(|a: i64, b| a < b),
            Op::I64LtU => self.binop(|a: u64, b| a < b),
            Op::I64GtS => self.binop(|a: i64, b| a > b),
            Op::I64GtU => self.binop(|a: u64, b| a > b),
            Op::I64LeS => self.binop(|a: i64, b| a <= b),
            Op::I64LeU => self.binop(|a: u64, b| a <= b),
            Op::I64GeS => self.binop(|a: i64, b| a >= b),
            Op::I64GeU => self.binop(|a: u64, b| a >= b),

            Op::F32Eq => self.binop(|a: f32, b| a == b),
            Op::F32Ne => self.binop(|a: f32, b| a != b),
            Op::F32Lt => self.binop(|a: f32, b| a < b),
            Op::F32Gt => self.binop(|a: f32, b| a > b),
            Op::F32Le => self.binop(|a: f32, b| a <= b),
            Op::F32Ge => self.binop(|a: f32, b| a >= b),

            Op::F64Eq => self.binop(|a: f64, b| a == b),
            Op::F64Ne => self.binop(|a: f64, b| a != b),
            Op::F64Lt => self.binop(|a: f64, b| a < b),
            Op::F64Gt => self.binop(|a: f64, b| a > b),
            Op::F64Le => self.binop(|a: f64, b| a <= b),
            Op::F64Ge => self.binop(|a: f64, b| a >= b),

            Op::I32Clz => self.unop(u32::leading_zeros),
            Op::I32Ctz => self.unop(u32::trailing_zeros),
            Op::I32Popcnt => self.unop(u32::count_ones),
            Op::I32Add => self.binop(i32::wrapping_add),
            Op::I32Sub => self.binop(i32::wrapping_sub),
            Op::I32Mul => self.binop(i32::wrapping_mul),
            Op::I32DivS => self.binop_trap(math::i32_div_s),
            Op::I32DivU => self.binop_trap(math::i32_div_u),
            Op::I32RemS => self.binop_trap(math::i32_rem_s),
            Op::I32RemU => self.binop_trap(math::i32_rem_u),
            Op::I32And => self.binop(|a: u32, b| a & b),
            Op::I32Or => self.binop(|a: u32, b| a | b),
            Op::I32Xor => self.binop(|a: u32, b| a ^ b),
            Op::I32Shl => self.binop(|a: u32, b| a.wrapping_shl(b)),
            Op::I32ShrS => self.binop(|a: i32, b| a.wrapping_shr(b as u32)),
            Op::I32ShrU => self.binop(|a: u32, b| a.wrapping_shr(b)),
            Op::I32Rotl => self.binop(|a: u32, b| a.rotate_left(b)),
            Op::I32Rotr => self.binop(|a: u32, b| a.rotate_right(b)),

            Op::I64Clz => self.unop(|a: u64| u64::from(a.leading_zeros())),
            Op::I64Ctz => self.unop(|a: u64| u64::from(a.trailing_zeros())),
            Op::I64Popcnt => self.unop(|a: u64| u64::from(a.count_ones())),
            Op::I64Add => self.binop(i64::wrapping_add),
            Op::I64Sub => self.binop(i64::wrapping_sub),
            Op::I64Mul => self.binop(i64::wrapping_mul),
            Op::I64DivS => self.binop_trap(math::i64_div_s),
            Op::I64DivU => self.binop_trap(math::i64_div_u),
            Op::I64RemS => self.binop_trap(math::i64_rem_s),
            Op::I64RemU => self.binop_trap(math::i64_rem_u),
            Op::I64And => self.binop(|a: u64, b| a & b),
            Op::I64Or => self.binop(|a: u64, b| a | b),
            Op::I64Xor => self.binop(|a: u64, b| a ^ b),
            Op::I64Shl => self.binop(|a: u64, b| a.wrapping_shl(b as u32)),
            Op::I64ShrS => self.binop(|a: i64, b| a.wrapping_shr(b as u32)),
            Op::I64ShrU => self.binop(|a: u64, b| a.wrapping_shr(b as u32)),
            Op::I64Rotl => self.binop(|a: u64, b| a.rotate_left((b % 64) as u32)),
            Op::I64Rotr => self.binop(|a: u64, b| a.rotate_right((b % 64) as u32)),

            Op::F32Abs => self.unop(f32::abs),
            Op::F32Neg => self.unop(|a: f32| -a),
            Op::F32Ceil => self.unop(f32::ceil),
            Op::F32Floor => self.unop(f32::floor),
            Op::F32Trunc => self.unop(f32::trunc),
            Op::F32Nearest => self.unop(math::f32_nearest),
            Op::F32Sqrt => self.unop(f32::sqrt),
            Op::F32Add => self.binop(|a: f32, b| a + b),
            Op::F32Sub => self.binop(|a: f32, b| a - b),
            Op::F32Mul => self.binop(|a: f32, b| a * b),
            Op::F32Div => self.binop(|a: f32, b| a / b),
            Op::F32Min => self.binop(math::f32_min),
            Op::F32Max => self.binop(math::f32_max),
            Op::F32Copysign => self.binop(f32::copysign),

            Op::F64Abs => self.unop(f64::abs),
            Op::F64Neg => self.unop(|a: f64| -a),
            Op::F64Ceil => self.unop(f64::ceil),
            Op::F64Floor => self.unop(f64::floor),
            Op::F64Trunc => self.unop(f64::trunc),
            Op::F64Nearest => self.unop(math::f64_nearest),
            Op::F64Sqrt => self.unop(f64::sqrt),
            Op::F64Add => self.binop(|a: f64, b| a + b),
            Op::F64Sub => self.binop(|a: f64, b| a - b),
            Op::F64Mul => self.binop(|a: f64, b| a * b),
            Op::F64Div => self.binop(|a: f64, b| a / b),
            Op::F64Min => self.binop(math::f64_min),
            Op::F64Max => self.binop(math::f64_max),
            Op::F64Copysign => self.binop(f64::copysign),

            Op::I32WrapI64 => self.unop(|a: i64| a as i32),
            Op::I32TruncF32S => self.unop_trap(math::i32_trunc_f32_s),
            Op::I32TruncF32U => self.unop_trap(math::i32_trunc_f32_u),
            Op::I32TruncF64S => self.unop_trap(math::i32_trunc_f64_s),
            Op::I32TruncF64U => self.unop_trap(math::i32_trunc_f64_u),
            Op::I64ExtendI32S => self.unop(|a: i32| i64::from(a)),
            Op::I64ExtendI32U => self.unop(|a: u32| u64::from(a)),
            Op::I64TruncF32S => self.unop_trap(math::i64_trunc_f32_s),
            Op::I64TruncF32U => self.unop_trap(math::i64_trunc_f32_u),
            Op::I64TruncF64S => self.unop_trap(math::i64_trunc_f64_s),
            Op::I64TruncF64U => self.unop_trap(math::i64_trunc_f64_u),
            Op::F32ConvertI32S => self.unop(|a: i32| a as f32),
            Op::F32ConvertI32U => self.unop(|a: u32| a as f32),
            Op::F32ConvertI64S => self.unop(|a: i64| a as f32),
            Op::F32ConvertI64U => self.unop(|a: u64| a as f32),
            Op::F32DemoteF64 => self.unop(|a: f64| a as f32),
            Op::F64ConvertI32S => self.unop(|a: i32| f64::from(a)),
            Op::F64ConvertI32U => self.unop(|a: u32| f64::from(a)),
            Op::F64ConvertI64S => self.unop(|a: i64| a as f64),
            Op::F64ConvertI64U => self.unop(|a: u64| a as f64),
            Op::F64PromoteF32 => self.unop(|a: f32| f64::from(a)),
            Op::I32ReinterpretF32 => self.unop(f32::to_bits),
            Op::I64ReinterpretF64 => self.unop(f64::to_bits),
            Op::F32ReinterpretI32 => self.unop(f32::from_bits),
            Op::F64ReinterpretI64 => self.unop(f64::from_bits),

            Op::I32Extend8S => self.unop(|a: i32| i32::from(a as i8)),
            Op::I32Extend16S => self.unop(|a: i32| i32::from(a as i16)),
            Op::I64Extend8S => self.unop(|a: i64| i64::from(a as i8)),
            Op::I64Extend16S => self.unop(|a: i64| i64::from(a as i16)),
            Op::I64Extend32S => self.unop(|a: i64| i64::from(a as i32)),
            Op::TruncSat => self.exec_trunc_sat(instr),
        }
    }
}
