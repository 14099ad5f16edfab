// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Loads, stores and memory sizing.

use log::debug;
use wvm_error::Result;
use wvm_format::instructions::{Instruction, MemArg, Operands};
use wvm_host::{Memory, MemoryRef};

use super::{malformed, numeric::Slot};
use crate::vm::{Vm, missing};

/// `offset + addr` without wrapping; checked against the memory size later
fn effective_address(memarg: MemArg, addr: u32) -> u64 {
    u64::from(memarg.offset) + u64::from(addr)
}

impl Vm {
    fn memory_ref(&self) -> Result<&MemoryRef> {
        self.memory.as_ref().ok_or_else(|| missing("memory"))
    }

    /// Load `N` bytes and decode them with `decode`
    pub(super) fn load<const N: usize, R: Slot>(
        &mut self,
        instr: &Instruction,
        decode: impl FnOnce([u8; N]) -> R,
    ) -> Result<()> {
        let Operands::MemArg(memarg) = instr.operands else { return Err(malformed(instr)) };
        let addr = self.stack.pop_u32()?;
        let mut buf = [0u8; N];
        self.memory_ref()?.borrow().read(effective_address(memarg, addr), &mut buf)?;
        self.stack.push(decode(buf).into_slot())
    }

    /// Encode the popped value with `encode` and store the bytes
    pub(super) fn store<const N: usize, T: Slot>(
        &mut self,
        instr: &Instruction,
        encode: impl FnOnce(T) -> [u8; N],
    ) -> Result<()> {
        let Operands::MemArg(memarg) = instr.operands else { return Err(malformed(instr)) };
        let value = T::from_slot(self.stack.pop()?);
        let addr = self.stack.pop_u32()?;
        self.memory_ref()?.borrow_mut().write(effective_address(memarg, addr), &encode(value))
    }

    pub(super) fn exec_memory_size(&mut self) -> Result<()> {
        let pages = self.memory_ref()?.borrow().size();
        self.stack.push_u32(pages)
    }

    /// `memory.grow` pushes the old size in pages, or -1 on failure
    pub(super) fn exec_memory_grow(&mut self) -> Result<()> {
        let delta = self.stack.pop_u32()?;
        let grown = self.memory_ref()?.borrow_mut().grow(delta);
        match grown {
            Ok(old) => self.stack.push_u32(old),
            Err(err) => {
                debug!("memory.grow({delta}) failed: {err}");
                self.stack.push_i32(-1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_address_does_not_wrap() {
        let memarg = MemArg { align: 0, offset: u32::MAX };
        assert_eq!(effective_address(memarg, u32::MAX), 2 * u64::from(u32::MAX));
        assert_eq!(effective_address(MemArg::default(), 8), 8);
    }
}
