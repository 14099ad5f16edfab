// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Typed operand helpers for the numeric instruction family.
//!
//! Each numeric opcode is a plain function over Rust scalars; the helpers
//! here pop the operands in the right order, reinterpret the raw slots and
//! push the result back.

use wvm_error::Result;
use wvm_format::instructions::{Instruction, Operands};

use super::malformed;
use crate::vm::Vm;

/// A scalar that can be stored in an operand stack slot
pub(crate) trait Slot: Sized {
    fn from_slot(bits: u64) -> Self;
    fn into_slot(self) -> u64;
}

impl Slot for i32 {
    fn from_slot(bits: u64) -> Self {
        bits as u32 as i32
    }

    fn into_slot(self) -> u64 {
        u64::from(self as u32)
    }
}

impl Slot for u32 {
    fn from_slot(bits: u64) -> Self {
        bits as u32
    }

    fn into_slot(self) -> u64 {
        u64::from(self)
    }
}

impl Slot for i64 {
    fn from_slot(bits: u64) -> Self {
        bits as i64
    }

    fn into_slot(self) -> u64 {
        self as u64
    }
}

impl Slot for u64 {
    fn from_slot(bits: u64) -> Self {
        bits
    }

    fn into_slot(self) -> u64 {
        self
    }
}

impl Slot for f32 {
    fn from_slot(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }

    fn into_slot(self) -> u64 {
        u64::from(self.to_bits())
    }
}

impl Slot for f64 {
    fn from_slot(bits: u64) -> Self {
        f64::from_bits(bits)
    }

    fn into_slot(self) -> u64 {
        self.to_bits()
    }
}

impl Slot for bool {
    fn from_slot(bits: u64) -> Self {
        bits as u32 != 0
    }

    fn into_slot(self) -> u64 {
        u64::from(self)
    }
}

impl Vm {
    #[inline]
    pub(super) fn unop<T: Slot, R: Slot>(&mut self, f: impl FnOnce(T) -> R) -> Result<()> {
        let a = T::from_slot(self.stack.pop()?);
        self.stack.push(f(a).into_slot())
    }

    #[inline]
    pub(super) fn binop<T: Slot, R: Slot>(&mut self, f: impl FnOnce(T, T) -> R) -> Result<()> {
        let b = T::from_slot(self.stack.pop()?);
        let a = T::from_slot(self.stack.pop()?);
        self.stack.push(f(a, b).into_slot())
    }

    /// Unary operation that may trap
    #[inline]
    pub(super) fn unop_trap<T: Slot, R: Slot>(&mut self, f: impl FnOnce(T) -> Result<R>) -> Result<()> {
        let a = T::from_slot(self.stack.pop()?);
        self.stack.push(f(a)?.into_slot())
    }

    /// Binary operation that may trap
    #[inline]
    pub(super) fn binop_trap<T: Slot, R: Slot>(&mut self, f: impl FnOnce(T, T) -> Result<R>) -> Result<()> {
        let b = T::from_slot(self.stack.pop()?);
        let a = T::from_slot(self.stack.pop()?);
        self.stack.push(f(a, b)?.into_slot())
    }

    pub(super) fn exec_const(&mut self, instr: &Instruction) -> Result<()> {
        match instr.operands {
            Operands::I32(v) => self.stack.push_i32(v),
            Operands::I64(v) => self.stack.push_i64(v),
            Operands::F32(v) => self.stack.push_f32(v),
            Operands::F64(v) => self.stack.push_f64(v),
            _ => Err(malformed(instr)),
        }
    }
}
