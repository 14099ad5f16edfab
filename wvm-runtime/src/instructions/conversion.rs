// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Saturating truncation (`0xFC 0..7`).

use wvm_error::Result;
use wvm_format::instructions::{Instruction, Operands, TruncSatOp};
use wvm_math as math;

use super::malformed;
use crate::vm::Vm;

impl Vm {
    pub(super) fn exec_trunc_sat(&mut self, instr: &Instruction) -> Result<()> {
        let Operands::TruncSat(op) = instr.operands else { return Err(malformed(instr)) };
        match op {
            TruncSatOp::I32F32S => self.unop(math::i32_trunc_sat_f32_s),
            TruncSatOp::I32F32U => self.unop(math::i32_trunc_sat_f32_u),
            TruncSatOp::I32F64S => self.unop(math::i32_trunc_sat_f64_s),
            TruncSatOp::I32F64U => self.unop(math::i32_trunc_sat_f64_u),
            TruncSatOp::I64F32S => self.unop(math::i64_trunc_sat_f32_s),
            TruncSatOp::I64F32U => self.unop(math::i64_trunc_sat_f32_u),
            TruncSatOp::I64F64S => self.unop(math::i64_trunc_sat_f64_s),
            TruncSatOp::I64F64U => self.unop(math::i64_trunc_sat_f64_u),
        }
    }
}
