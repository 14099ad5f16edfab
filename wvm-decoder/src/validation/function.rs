// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Function body validation.
//!
//! A single pass over the body with two stacks: abstract operand types and
//! control frames. Inside unreachable code the operand stack of the current
//! frame becomes polymorphic: popping past the frame's entry height yields
//! an unknown type instead of failing.

use log::trace;
use wvm_error::{Result, ResultExt, codes, kinds};
use wvm_format::{
    instructions::{BrTable, Expr, Instruction, MemArg, Opcode, Operands, TruncSatOp},
    module::{Code, Module},
    types::{BlockType, FuncType, ValueType},
};

const I32: ValueType = ValueType::I32;
const I64: ValueType = ValueType::I64;
const F32: ValueType = ValueType::F32;
const F64: ValueType = ValueType::F64;

/// Operand type on the abstract stack; `None` is unknown
type Operand = Option<ValueType>;

#[derive(Debug)]
struct ControlFrame {
    opcode:      Opcode,
    start_types: Vec<ValueType>,
    end_types:   Vec<ValueType>,
    height:      usize,
    unreachable: bool,
}

impl ControlFrame {
    /// Types a branch to this frame must supply
    fn label_types(&self) -> &[ValueType] {
        if self.opcode == Opcode::Loop { &self.start_types } else { &self.end_types }
    }
}

fn type_mismatch(expected: ValueType, actual: ValueType) -> wvm_error::Error {
    kinds::validation_error(codes::TYPE_MISMATCH, format!("type mismatch: expected {expected}, found {actual}"))
}

struct FunctionValidator<'m> {
    module:   &'m Module,
    locals:   Vec<ValueType>,
    operands: Vec<Operand>,
    frames:   Vec<ControlFrame>,
}

impl FunctionValidator<'_> {
    fn push(&mut self, ty: Operand) {
        self.operands.push(ty);
    }

    fn push_types(&mut self, types: &[ValueType]) {
        self.operands.extend(types.iter().copied().map(Some));
    }

    fn current(&self) -> Result<&ControlFrame> {
        self.frames
            .last()
            .ok_or_else(|| kinds::validation_error(codes::STACK_HEIGHT_MISMATCH, "control stack is empty"))
    }

    fn pop(&mut self) -> Result<Operand> {
        let frame = self.current()?;
        if self.operands.len() == frame.height {
            if frame.unreachable {
                return Ok(None);
            }
            return Err(kinds::validation_error(
                codes::STACK_HEIGHT_MISMATCH,
                "type mismatch: operand stack underflow",
            ));
        }
        Ok(self.operands.pop().flatten())
    }

    fn pop_expect(&mut self, expected: ValueType) -> Result<Operand> {
        match self.pop()? {
            Some(actual) if actual != expected => Err(type_mismatch(expected, actual)),
            Some(actual) => Ok(Some(actual)),
            None => Ok(Some(expected)),
        }
    }

    fn pop_types(&mut self, types: &[ValueType]) -> Result<()> {
        for ty in types.iter().rev() {
            self.pop_expect(*ty)?;
        }
        Ok(())
    }

    fn push_frame(&mut self, opcode: Opcode, ty: FuncType) {
        let height = self.operands.len();
        self.push_types(&ty.params);
        self.frames.push(ControlFrame {
            opcode,
            start_types: ty.params,
            end_types: ty.results,
            height,
            unreachable: false,
        });
    }

    fn pop_frame(&mut self) -> Result<ControlFrame> {
        let end_types = self.current()?.end_types.clone();
        self.pop_types(&end_types)?;
        let frame = self.current()?;
        if self.operands.len() != frame.height {
            return Err(kinds::validation_error(
                codes::STACK_HEIGHT_MISMATCH,
                format!(
                    "type mismatch: {} values left on the operand stack at end of {}",
                    self.operands.len() - frame.height,
                    frame.opcode,
                ),
            ));
        }
        self.frames
            .pop()
            .ok_or_else(|| kinds::validation_error(codes::STACK_HEIGHT_MISMATCH, "control stack is empty"))
    }

    fn set_unreachable(&mut self) -> Result<()> {
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| kinds::validation_error(codes::STACK_HEIGHT_MISMATCH, "control stack is empty"))?;
        self.operands.truncate(frame.height);
        frame.unreachable = true;
        Ok(())
    }

    fn label_types(&self, depth: u32) -> Result<Vec<ValueType>> {
        let idx = self
            .frames
            .len()
            .checked_sub(1 + depth as usize)
            .ok_or_else(|| kinds::validation_error(codes::INVALID_LABEL_INDEX, format!("unknown label {depth}")))?;
        Ok(self.frames[idx].label_types().to_vec())
    }

    fn block_signature(&self, block_type: BlockType) -> Result<FuncType> {
        block_type.resolve(&self.module.types).ok_or_else(|| {
            kinds::validation_error(codes::INVALID_TYPE_INDEX, format!("unknown block type {block_type}"))
        })
    }

    fn local(&self, idx: u32) -> Result<ValueType> {
        self.locals
            .get(idx as usize)
            .copied()
            .ok_or_else(|| kinds::validation_error(codes::INVALID_LOCAL_INDEX, format!("unknown local {idx}")))
    }

    fn check_memory(&self, opcode: Opcode, memarg: Option<&MemArg>) -> Result<()> {
        if self.module.memory_count() == 0 {
            return Err(kinds::validation_error(codes::INVALID_MEMORY_INDEX, "unknown memory 0"));
        }
        if let (Some(width), Some(arg)) = (opcode.memory_access_width(), memarg) {
            if arg.align >= 32 || (1u64 << arg.align) > u64::from(width) {
                return Err(kinds::validation_error(
                    codes::INVALID_ALIGNMENT,
                    format!("alignment 2^{} must not be larger than natural ({width} bytes)", arg.align),
                ));
            }
        }
        Ok(())
    }

    fn validate_expr(&mut self, expr: &Expr) -> Result<()> {
        for (i, instr) in expr.iter().enumerate() {
            self.validate_instruction(instr).with_context(|| format!("instruction {i} ({})", instr.name()))?;
        }
        Ok(())
    }

    fn validate_instruction(&mut self, instr: &Instruction) -> Result<()> {
        trace!("validate {instr}");
        match (&instr.opcode, &instr.operands) {
            (Opcode::Unreachable, _) => self.set_unreachable()?,
            (Opcode::Nop, _) => {}
            (Opcode::Block | Opcode::Loop, Operands::Block(block)) => {
                let sig = self.block_signature(block.block_type)?;
                self.pop_types(&sig.params)?;
                self.push_frame(instr.opcode, sig);
                self.validate_expr(&block.body)?;
                let frame = self.pop_frame()?;
                self.push_types(&frame.end_types);
            }
            (Opcode::If, Operands::If(block)) => {
                let sig = self.block_signature(block.block_type)?;
                self.pop_expect(I32)?;
                self.pop_types(&sig.params)?;
                self.push_frame(Opcode::If, sig.clone());
                self.validate_expr(&block.then_body)?;
                self.pop_frame()?;
                // An absent else arm must pass the params through unchanged.
                self.push_frame(Opcode::If, sig);
                self.validate_expr(&block.else_body).context("else")?;
                let frame = self.pop_frame()?;
                self.push_types(&frame.end_types);
            }
            (Opcode::Br, Operands::Index(depth)) => {
                let types = self.label_types(*depth)?;
                self.pop_types(&types)?;
                self.set_unreachable()?;
            }
            (Opcode::BrIf, Operands::Index(depth)) => {
                self.pop_expect(I32)?;
                let types = self.label_types(*depth)?;
                self.pop_types(&types)?;
                self.push_types(&types);
            }
            (Opcode::BrTable, Operands::BrTable(table)) => self.validate_br_table(table)?,
            (Opcode::Return, _) => {
                let types = self.frames.first().map(|f| f.end_types.clone()).unwrap_or_default();
                self.pop_types(&types)?;
                self.set_unreachable()?;
            }
            (Opcode::Call, Operands::Index(func_idx)) => {
                let ty = self.module.func_type(*func_idx).cloned().ok_or_else(|| {
                    kinds::validation_error(codes::INVALID_FUNCTION_INDEX, format!("unknown function {func_idx}"))
                })?;
                self.pop_types(&ty.params)?;
                self.push_types(&ty.results);
            }
            (Opcode::CallIndirect, Operands::TypeIndex(type_idx)) => {
                if self.module.table_count() == 0 {
                    return Err(kinds::validation_error(codes::INVALID_TABLE_INDEX, "unknown table 0"));
                }
                let ty = self.module.types.get(*type_idx as usize).cloned().ok_or_else(|| {
                    kinds::validation_error(codes::INVALID_TYPE_INDEX, format!("unknown type {type_idx}"))
                })?;
                self.pop_expect(I32)?;
                self.pop_types(&ty.params)?;
                self.push_types(&ty.results);
            }
            (Opcode::Drop, _) => {
                self.pop()?;
            }
            (Opcode::Select, _) => {
                self.pop_expect(I32)?;
                let first = self.pop()?;
                let second = self.pop()?;
                if let (Some(a), Some(b)) = (first, second) {
                    if a != b {
                        return Err(type_mismatch(a, b));
                    }
                }
                self.push(first.or(second));
            }
            (Opcode::LocalGet, Operands::Index(idx)) => {
                let ty = self.local(*idx)?;
                self.push(Some(ty));
            }
            (Opcode::LocalSet, Operands::Index(idx)) => {
                let ty = self.local(*idx)?;
                self.pop_expect(ty)?;
            }
            (Opcode::LocalTee, Operands::Index(idx)) => {
                let ty = self.local(*idx)?;
                self.pop_expect(ty)?;
                self.push(Some(ty));
            }
            (Opcode::GlobalGet, Operands::Index(idx)) => {
                let global = self.module.global_type(*idx).ok_or_else(|| {
                    kinds::validation_error(codes::INVALID_GLOBAL_INDEX, format!("unknown global {idx}"))
                })?;
                self.push(Some(global.value_type));
            }
            (Opcode::GlobalSet, Operands::Index(idx)) => {
                let global = self.module.global_type(*idx).ok_or_else(|| {
                    kinds::validation_error(codes::INVALID_GLOBAL_INDEX, format!("unknown global {idx}"))
                })?;
                if !global.mutable {
                    return Err(kinds::validation_error(
                        codes::IMMUTABLE_GLOBAL,
                        format!("global {idx} is immutable"),
                    ));
                }
                self.pop_expect(global.value_type)?;
            }
            (Opcode::MemorySize, _) => {
                self.check_memory(instr.opcode, None)?;
                self.push(Some(I32));
            }
            (Opcode::MemoryGrow, _) => {
                self.check_memory(instr.opcode, None)?;
                self.pop_expect(I32)?;
                self.push(Some(I32));
            }
            (Opcode::I32Const, _) => self.push(Some(I32)),
            (Opcode::I64Const, _) => self.push(Some(I64)),
            (Opcode::F32Const, _) => self.push(Some(F32)),
            (Opcode::F64Const, _) => self.push(Some(F64)),
            (Opcode::TruncSat, Operands::TruncSat(op)) => {
                let (from, to) = trunc_sat_types(*op);
                self.pop_expect(from)?;
                self.push(Some(to));
            }
            (opcode, operands) => {
                let (params, results) = operator_types(*opcode).ok_or_else(|| {
                    kinds::validation_error(
                        codes::TYPE_MISMATCH,
                        format!("malformed operands for {opcode}: {operands:?}"),
                    )
                })?;
                if let Operands::MemArg(arg) = operands {
                    self.check_memory(*opcode, Some(arg))?;
                }
                self.pop_types(params)?;
                self.push_types(results);
            }
        }
        Ok(())
    }

    fn validate_br_table(&mut self, table: &BrTable) -> Result<()> {
        self.pop_expect(I32)?;
        let default_types = self.label_types(table.default)?;
        for label in &table.labels {
            let types = self.label_types(*label)?;
            if types.len() != default_types.len() {
                return Err(kinds::validation_error(
                    codes::BR_TABLE_ARITY_MISMATCH,
                    format!("br_table label {label} has arity {}, default has {}", types.len(), default_types.len()),
                ));
            }
            if types != default_types {
                return Err(kinds::validation_error(
                    codes::TYPE_MISMATCH,
                    format!("type mismatch: br_table label {label} disagrees with the default label"),
                ));
            }
        }
        self.pop_types(&default_types)?;
        self.set_unreachable()
    }
}

const fn trunc_sat_types(op: TruncSatOp) -> (ValueType, ValueType) {
    match op {
        TruncSatOp::I32F32S | TruncSatOp::I32F32U => (F32, I32),
        TruncSatOp::I32F64S | TruncSatOp::I32F64U => (F64, I32),
        TruncSatOp::I64F32S | TruncSatOp::I64F32U => (F32, I64),
        TruncSatOp::I64F64S | TruncSatOp::I64F64U => (F64, I64),
    }
}

/// Fixed pop/push signature of loads, stores and numeric operators
#[allow(clippy::too_many_lines)]
fn operator_types(opcode: Opcode) -> Option<(&'static [ValueType], &'static [ValueType])> {
    use Opcode as O;

    Some(match opcode {
        O::I32Load | O::I32Load8S | O::I32Load8U | O::I32Load16S | O::I32Load16U => (&[I32], &[I32]),
        O::I64Load
        | O::I64Load8S
        | O::I64Load8U
        | O::I64Load16S
        | O::I64Load16U
        | O::I64Load32S
        | O::I64Load32U => (&[I32], &[I64]),
        O::F32Load => (&[I32], &[F32]),
        O::F64Load => (&[I32], &[F64]),
        O::I32Store | O::I32Store8 | O::I32Store16 => (&[I32, I32], &[]),
        O::I64Store | O::I64Store8 | O::I64Store16 | O::I64Store32 => (&[I32, I64], &[]),
        O::F32Store => (&[I32, F32], &[]),
        O::F64Store => (&[I32, F64], &[]),

        O::I32Eqz => (&[I32], &[I32]),
        O::I32Eq | O::I32Ne | O::I32LtS | O::I32LtU | O::I32GtS | O::I32GtU | O::I32LeS | O::I32LeU
        | O::I32GeS | O::I32GeU => (&[I32, I32], &[I32]),
        O::I64Eqz => (&[I64], &[I32]),
        O::I64Eq | O::I64Ne | O::I64LtS | O::I64LtU | O::I64GtS | O::I64GtU | O::I64LeS | O::I64LeU
        | O::I64GeS | O::I64GeU => (&[I64, I64], &[I32]),
        O::F32Eq | O::F32Ne | O::F32Lt | O::F32Gt | O::F32Le | O::F32Ge => (&[F32, F32], &[I32]),
        O::F64Eq | O::F64Ne | O::F64Lt | O::F64Gt | O::F64Le | O::F64Ge => (&[F64, F64], &[I32]),

        O::I32Clz | O::I32Ctz | O::I32Popcnt | O::I32Extend8S | O::I32Extend16S => (&[I32], &[I32]),
        O::I32Add | O::I32Sub | O::I32Mul | O::I32DivS | O::I32DivU | O::I32RemS | O::I32RemU
        | O::I32And | O::I32Or | O::I32Xor | O::I32Shl | O::I32ShrS | O::I32ShrU | O::I32Rotl
        | O::I32Rotr => (&[I32, I32], &[I32]),
        O::I64Clz | O::I64Ctz | O::I64Popcnt | O::I64Extend8S | O::I64Extend16S | O::I64Extend32S => {
            (&[I64], &[I64])
        }
        O::I64Add | O::I64Sub | O::I64Mul | O::I64DivS | O::I64DivU | O::I64RemS | O::I64RemU
        | O::I64And | O::I64Or | O::I64Xor | O::I64Shl | O::I64ShrS | O::I64ShrU | O::I64Rotl
        | O::I64Rotr => (&[I64, I64], &[I64]),
        O::F32Abs | O::F32Neg | O::F32Ceil | O::F32Floor | O::F32Trunc | O::F32Nearest | O::F32Sqrt => {
            (&[F32], &[F32])
        }
        O::F32Add | O::F32Sub | O::F32Mul | O::F32Div | O::F32Min | O::F32Max | O::F32Copysign => {
            (&[F32, F32], &[F32])
        }
        O::F64Abs | O::F64Neg | O::F64Ceil | O::F64Floor | O::F64Trunc | O::F64Nearest | O::F64Sqrt => {
            (&[F64], &[F64])
        }
        O::F64Add | O::F64Sub | O::F64Mul | O::F64Div | O::F64Min | O::F64Max | O::F64Copysign => {
            (&[F64, F64], &[F64])
        }

        O::I32WrapI64 => (&[I64], &[I32]),
        O::I32TruncF32S | O::I32TruncF32U | O::I32ReinterpretF32 => (&[F32], &[I32]),
        O::I32TruncF64S | O::I32TruncF64U => (&[F64], &[I32]),
        O::I64ExtendI32S | O::I64ExtendI32U => (&[I32], &[I64]),
        O::I64TruncF32S | O::I64TruncF32U => (&[F32], &[I64]),
        O::I64TruncF64S | O::I64TruncF64U | O::I64ReinterpretF64 => (&[F64], &[I64]),
        O::F32ConvertI32S | O::F32ConvertI32U | O::F32ReinterpretI32 => (&[I32], &[F32]),
        O::F32ConvertI64S | O::F32ConvertI64U => (&[I64], &[F32]),
        O::F32DemoteF64 => (&[F64], &[F32]),
        O::F64ConvertI32S | O::F64ConvertI32U => (&[I32], &[F64]),
        O::F64ConvertI64S | O::F64ConvertI64U | O::F64ReinterpretI64 => (&[I64], &[F64]),
        O::F64PromoteF32 => (&[F32], &[F64]),

        _ => return None,
    })
}

/// Validate one function body against its declared signature
pub fn validate_function(module: &Module, type_idx: u32, code: &Code) -> Result<()> {
    let ty = module.types.get(type_idx as usize).cloned().ok_or_else(|| {
        kinds::validation_error(codes::INVALID_TYPE_INDEX, format!("unknown type {type_idx}"))
    })?;

    let mut locals = ty.params.clone();
    locals.extend(code.local_types());

    let mut validator = FunctionValidator { module, locals, operands: Vec::new(), frames: Vec::new() };
    // The function frame starts empty: parameters live in the locals.
    validator.push_frame(Opcode::Call, FuncType::new(Vec::new(), ty.results));
    validator.validate_expr(&code.body)?;
    validator.pop_frame()?;
    Ok(())
}
