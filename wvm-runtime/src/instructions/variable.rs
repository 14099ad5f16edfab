// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Locals and globals.
//!
//! Locals have no storage of their own: local `i` of the running call is
//! operand stack slot `local0 + i`.

use wvm_error::{Result, codes, kinds};
use wvm_format::{
    instructions::{Instruction, Operands},
    types::Value,
};
use wvm_host::{Global, GlobalRef};

use super::malformed;
use crate::vm::Vm;

impl Vm {
    fn local_slot(&self, instr: &Instruction) -> Result<usize> {
        let Operands::Index(index) = instr.operands else { return Err(malformed(instr)) };
        Ok(self.local0 + index as usize)
    }

    fn global_ref(&self, instr: &Instruction) -> Result<&GlobalRef> {
        let Operands::Index(index) = instr.operands else { return Err(malformed(instr)) };
        self.globals
            .get(index as usize)
            .ok_or_else(|| kinds::trap(codes::INVALID_GLOBAL_ACCESS, format!("unknown global {index}")))
    }

    pub(super) fn exec_local_get(&mut self, instr: &Instruction) -> Result<()> {
        let bits = self.stack.get(self.local_slot(instr)?)?;
        self.stack.push(bits)
    }

    pub(super) fn exec_local_set(&mut self, instr: &Instruction) -> Result<()> {
        let slot = self.local_slot(instr)?;
        let bits = self.stack.pop()?;
        self.stack.set(slot, bits)
    }

    pub(super) fn exec_local_tee(&mut self, instr: &Instruction) -> Result<()> {
        let slot = self.local_slot(instr)?;
        let bits = self.stack.peek()?;
        self.stack.set(slot, bits)
    }

    pub(super) fn exec_global_get(&mut self, instr: &Instruction) -> Result<()> {
        let value = self.global_ref(instr)?.borrow().get();
        self.stack.push(value.to_bits())
    }

    pub(super) fn exec_global_set(&mut self, instr: &Instruction) -> Result<()> {
        let bits = self.stack.pop()?;
        let global = self.global_ref(instr)?;
        let ty = global.borrow().global_type().value_type;
        global.borrow_mut().set(Value::from_bits(ty, bits))
    }
}
