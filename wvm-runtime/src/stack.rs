// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The operand stack.
//!
//! Every value occupies one raw 64-bit slot; 32-bit values are stored
//! zero-extended and reinterpreted by the instruction that pops them.
//! Parameters and locals of active calls live in the same storage.

use wvm_error::{Error, ErrorCategory, Result, codes};

pub(crate) const UNDERFLOW: Error = Error::new(ErrorCategory::RuntimeTrap, codes::STACK_UNDERFLOW, "operand stack underflow");
pub(crate) const OVERFLOW: Error = Error::new(ErrorCategory::RuntimeTrap, codes::STACK_OVERFLOW, "operand stack overflow");

/// Slot stack shared by all frames of an instance
#[derive(Debug)]
pub struct OperandStack {
    slots: Vec<u64>,
    limit: usize,
}

impl OperandStack {
    /// Create an empty stack holding at most `limit` slots
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { slots: Vec::with_capacity(limit.min(1024)), limit }
    }

    /// Number of slots in use
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the stack is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Push a raw slot
    #[inline]
    pub fn push(&mut self, bits: u64) -> Result<()> {
        if self.slots.len() >= self.limit {
            return Err(OVERFLOW);
        }
        self.slots.push(bits);
        Ok(())
    }

    /// Push `count` zeroed slots
    pub fn push_zeros(&mut self, count: usize) -> Result<()> {
        if self.limit.saturating_sub(self.slots.len()) < count {
            return Err(OVERFLOW);
        }
        self.slots.resize(self.slots.len() + count, 0);
        Ok(())
    }

    /// Pop a raw slot
    #[inline]
    pub fn pop(&mut self) -> Result<u64> {
        self.slots.pop().ok_or(UNDERFLOW)
    }

    /// Read the slot at absolute position `index`
    #[inline]
    pub fn get(&self, index: usize) -> Result<u64> {
        self.slots.get(index).copied().ok_or(UNDERFLOW)
    }

    /// Overwrite the slot at absolute position `index`
    #[inline]
    pub fn set(&mut self, index: usize, bits: u64) -> Result<()> {
        let slot = self.slots.get_mut(index).ok_or(UNDERFLOW)?;
        *slot = bits;
        Ok(())
    }

    /// Top slot without popping
    pub fn peek(&self) -> Result<u64> {
        self.slots.last().copied().ok_or(UNDERFLOW)
    }

    /// Keep the top `keep` slots, discarding everything between `base` and them
    pub fn unwind(&mut self, base: usize, keep: usize) -> Result<()> {
        let len = self.slots.len();
        if len < base + keep {
            return Err(UNDERFLOW);
        }
        self.slots.drain(base..len - keep);
        Ok(())
    }

    /// Drop everything above `len`
    pub fn truncate(&mut self, len: usize) {
        self.slots.truncate(len);
    }

    /// Remove and return the top `count` slots in push order
    pub fn pop_n(&mut self, count: usize) -> Result<Vec<u64>> {
        let len = self.slots.len();
        if len < count {
            return Err(UNDERFLOW);
        }
        Ok(self.slots.split_off(len - count))
    }

    /// Pop an `i32`
    #[inline]
    pub fn pop_i32(&mut self) -> Result<i32> {
        Ok(self.pop()? as u32 as i32)
    }

    /// Pop an `i32` as unsigned
    #[inline]
    pub fn pop_u32(&mut self) -> Result<u32> {
        Ok(self.pop()? as u32)
    }

    /// Pop an `i64` as unsigned
    #[inline]
    pub fn pop_u64(&mut self) -> Result<u64> {
        self.pop()
    }

    /// Pop an `f32`
    #[inline]
    pub fn pop_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.pop()? as u32))
    }

    /// Push an `i32`
    #[inline]
    pub fn push_i32(&mut self, value: i32) -> Result<()> {
        self.push(u64::from(value as u32))
    }

    /// Push an unsigned `i32`
    #[inline]
    pub fn push_u32(&mut self, value: u32) -> Result<()> {
        self.push(u64::from(value))
    }

    /// Push an `i64`
    #[inline]
    pub fn push_i64(&mut self, value: i64) -> Result<()> {
        self.push(value as u64)
    }

    /// Push an `f32`
    #[inline]
    pub fn push_f32(&mut self, value: f32) -> Result<()> {
        self.push(u64::from(value.to_bits()))
    }

    /// Push an `f64`
    #[inline]
    pub fn push_f64(&mut self, value: f64) -> Result<()> {
        self.push(value.to_bits())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_slots() {
        let mut stack = OperandStack::new(16);
        stack.push_i32(-1).unwrap();
        assert_eq!(stack.peek().unwrap(), 0xFFFF_FFFF);
        assert_eq!(stack.pop_i32().unwrap(), -1);

        stack.push_f32(1.5).unwrap();
        assert_eq!(stack.pop_f32().unwrap(), 1.5);
        stack.push_i64(-2).unwrap();
        assert_eq!(stack.pop_u64().unwrap(), u64::MAX - 1);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_unwind_keeps_results() {
        let mut stack = OperandStack::new(16);
        for v in 1..=6 {
            stack.push(v).unwrap();
        }
        stack.unwind(2, 1).unwrap();
        assert_eq!(stack.pop_n(3).unwrap(), vec![1, 2, 6]);

        stack.push(9).unwrap();
        assert_eq!(stack.unwind(0, 2).unwrap_err().code, codes::STACK_UNDERFLOW);
    }

    #[test]
    fn test_limits() {
        let mut stack = OperandStack::new(2);
        stack.push(1).unwrap();
        assert_eq!(stack.push_zeros(2).unwrap_err().code, codes::STACK_OVERFLOW);
        stack.push(2).unwrap();
        assert_eq!(stack.push(3).unwrap_err().code, codes::STACK_OVERFLOW);
        stack.truncate(0);
        assert_eq!(stack.pop().unwrap_err().code, codes::STACK_UNDERFLOW);
        assert!(stack.get(0).unwrap_err().is_trap());
    }
}
