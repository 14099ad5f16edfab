// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Structured control flow and calls.

use std::rc::Rc;

use wvm_error::{Result, codes, kinds};
use wvm_format::{
    instructions::{Expr, Instruction, Operands},
    types::{BlockType, Value},
};
use wvm_host::{FuncRef, Function, Table, linker};

use super::malformed;
use crate::{
    frame::{ControlFrame, FrameKind},
    func::Func,
    stack::UNDERFLOW,
    vm::{Vm, missing},
};

impl Vm {
    fn block_arity(&self, block_type: BlockType) -> Result<(usize, usize)> {
        match block_type {
            BlockType::Empty => Ok((0, 0)),
            BlockType::Value(_) => Ok((0, 1)),
            BlockType::TypeIndex(idx) => self
                .module
                .types
                .get(idx as usize)
                .map(|ty| (ty.params.len(), ty.results.len()))
                .ok_or_else(|| kinds::validation_error(codes::INVALID_TYPE_INDEX, format!("unknown type {idx}"))),
        }
    }

    fn enter_block(&mut self, kind: FrameKind, body: &Expr, block_type: BlockType) -> Result<()> {
        let (params, results) = self.block_arity(block_type)?;
        let base = self.stack.len().checked_sub(params).ok_or(UNDERFLOW)?;
        self.frames.push(ControlFrame::block(kind, Expr::clone(body), base, params, results));
        Ok(())
    }

    pub(super) fn exec_block(&mut self, instr: &Instruction) -> Result<()> {
        let Operands::Block(block) = &instr.operands else { return Err(malformed(instr)) };
        let kind = if instr.opcode == wvm_format::instructions::Opcode::Loop { FrameKind::Loop } else { FrameKind::Block };
        self.enter_block(kind, &block.body, block.block_type)
    }

    pub(super) fn exec_if(&mut self, instr: &Instruction) -> Result<()> {
        let Operands::If(if_block) = &instr.operands else { return Err(malformed(instr)) };
        let body = if self.stack.pop_u32()? != 0 { &if_block.then_body } else { &if_block.else_body };
        self.enter_block(FrameKind::If, body, if_block.block_type)
    }

    pub(super) fn exec_br(&mut self, instr: &Instruction) -> Result<()> {
        let Operands::Index(depth) = instr.operands else { return Err(malformed(instr)) };
        self.branch(depth)
    }

    pub(super) fn exec_br_if(&mut self, instr: &Instruction) -> Result<()> {
        let Operands::Index(depth) = instr.operands else { return Err(malformed(instr)) };
        if self.stack.pop_u32()? != 0 { self.branch(depth) } else { Ok(()) }
    }

    pub(super) fn exec_br_table(&mut self, instr: &Instruction) -> Result<()> {
        let Operands::BrTable(table) = &instr.operands else { return Err(malformed(instr)) };
        let index = self.stack.pop_u32()?;
        let depth = table.labels.get(index as usize).copied().unwrap_or(table.default);
        self.branch(depth)
    }

    pub(super) fn exec_return(&mut self) -> Result<()> {
        let depth = self
            .frames
            .iter()
            .rev()
            .position(|frame| frame.kind == FrameKind::Call)
            .ok_or_else(|| missing("call frame"))?;
        self.branch(depth as u32)
    }

    /// Branch to the label `depth` frames out.
    ///
    /// Frames inside the target are discarded. A loop target keeps its frame
    /// and restarts with its parameters on the stack; any other target exits
    /// with its results.
    pub(crate) fn branch(&mut self, depth: u32) -> Result<()> {
        let depth = depth as usize;
        if depth >= self.frames.len() {
            return Err(kinds::trap(codes::STACK_UNDERFLOW, format!("branch depth {depth} exceeds control stack")));
        }
        self.frames.truncate(self.frames.len() - depth);

        let Some(target) = self.frames.last_mut() else { return Err(missing("control frame")) };
        if target.kind == FrameKind::Loop {
            self.stack.unwind(target.base, target.branch_arity())?;
            target.pc = 0;
            Ok(())
        } else {
            self.exit_frame()
        }
    }

    pub(super) fn exec_call(&mut self, instr: &Instruction) -> Result<()> {
        let Operands::Index(index) = instr.operands else { return Err(malformed(instr)) };
        self.call(index)
    }

    /// Call a function by index with its arguments already on the stack
    pub(crate) fn call(&mut self, index: u32) -> Result<()> {
        let (body, params, results, local_count) = match self.func(index)? {
            Func::Internal { ty, local_count, body } => {
                (Expr::clone(body), ty.params.len(), ty.results.len(), *local_count)
            }
            Func::External(func) => {
                let func = Rc::clone(func);
                return self.call_external(&func);
            }
        };

        if self.call_depth >= self.config.max_call_depth {
            return Err(kinds::trap(
                codes::CALL_STACK_EXHAUSTED,
                format!("call stack exhausted at depth {}", self.call_depth),
            ));
        }
        let base = self.stack.len().checked_sub(params).ok_or(UNDERFLOW)?;
        self.stack.push_zeros(local_count)?;
        self.frames.push(ControlFrame::call(body, base, params, results, self.local0));
        self.local0 = base;
        self.call_depth += 1;
        Ok(())
    }

    /// Call through the linker contract: pop typed arguments, push results
    fn call_external(&mut self, func: &FuncRef) -> Result<()> {
        let ty = func.func_type();
        let bits = self.stack.pop_n(ty.params.len())?;
        let args: Vec<Value> = ty.params.iter().zip(bits).map(|(ty, bits)| Value::from_bits(*ty, bits)).collect();

        let results = func.call(self, &args)?;
        linker::check_results(ty, &results)?;
        for value in results {
            self.stack.push(value.to_bits())?;
        }
        Ok(())
    }

    pub(super) fn exec_call_indirect(&mut self, instr: &Instruction) -> Result<()> {
        let Operands::TypeIndex(type_idx) = instr.operands else { return Err(malformed(instr)) };
        let elem_index = self.stack.pop_u32()?;

        let table = self.table.as_ref().ok_or_else(|| missing("table"))?;
        let func = table.borrow().get(elem_index)?.ok_or_else(|| {
            kinds::trap(codes::UNINITIALIZED_ELEMENT, format!("uninitialized element {elem_index}"))
        })?;

        let expected = self
            .module
            .types
            .get(type_idx as usize)
            .ok_or_else(|| kinds::validation_error(codes::INVALID_TYPE_INDEX, format!("unknown type {type_idx}")))?;
        if func.func_type() != expected {
            return Err(kinds::trap(
                codes::INDIRECT_CALL_TYPE_MISMATCH,
                format!("indirect call type mismatch: expected {expected}, found {}", func.func_type()),
            ));
        }

        match self.own_func_index(&func) {
            Some(index) => self.call(index),
            None => self.call_external(&func),
        }
    }
}
