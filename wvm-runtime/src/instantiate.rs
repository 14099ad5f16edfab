// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Instantiation: import resolution and index space initialization.

use log::debug;
use wvm_error::{Result, ResultExt, codes, kinds};
use wvm_format::{
    instructions::{Expr, Opcode, Operands},
    module::{Import, ImportDesc},
    types::{FuncType, Limits, Value},
};
use wvm_host::{Externals, Function, Global, GlobalCell, GlobalRef, Member, Memory, Table};

use crate::{func::Func, memory::MemoryInstance, table::TableInstance, vm::Vm};

impl Vm {
    /// Fill the index spaces and run the start function.
    ///
    /// Imports come first in every index space. Globals are initialized
    /// before memory so data and element offsets may read any earlier
    /// immutable global.
    pub(crate) fn instantiate(&mut self, externals: &Externals) -> Result<()> {
        self.resolve_imports(externals)?;
        self.init_globals()?;
        self.init_memory()?;
        self.init_funcs();
        self.init_table()?;

        if let Some(start) = self.module.start {
            debug!("running start function {start}");
            self.invoke_index(start, &[]).context("start function")?;
        }
        Ok(())
    }

    fn resolve_imports(&mut self, externals: &Externals) -> Result<()> {
        for import in &self.module.imports {
            debug!("resolving import {}.{}", import.module, import.name);
            match resolve_import(import, externals, &self.module.types)? {
                Member::Func(func) => self.funcs.push(Func::External(func)),
                Member::Global(global) => self.globals.push(global),
                Member::Memory(memory) => self.memory = Some(memory),
                Member::Table(table) => self.table = Some(table),
            }
        }
        Ok(())
    }

    fn init_globals(&mut self) -> Result<()> {
        for (i, global) in self.module.globals.iter().enumerate() {
            let value = eval_const_expr(&global.init, &self.globals).with_context(|| format!("global[{i}]"))?;
            self.globals.push(GlobalCell::new(value, global.global_type.mutable).into_ref());
        }
        Ok(())
    }

    fn init_memory(&mut self) -> Result<()> {
        if let Some(limits) = self.module.memories.first() {
            self.memory = Some(MemoryInstance::new(*limits, self.config.max_memory_pages)?.into_ref());
        }
        for (i, data) in self.module.data.iter().enumerate() {
            let offset = const_offset(&data.offset, &self.globals).with_context(|| format!("data[{i}]"))?;
            let memory = self.memory.as_ref().ok_or_else(|| crate::vm::missing("memory"))?;
            memory.borrow_mut().write(u64::from(offset), &data.init).with_context(|| format!("data[{i}]"))?;
        }
        Ok(())
    }

    fn init_funcs(&mut self) {
        let defined = self.module.functions.iter().zip(&self.module.codes);
        for (type_idx, code) in defined {
            let ty = self.module.types.get(*type_idx as usize).cloned().unwrap_or_default();
            self.funcs.push(Func::Internal {
                ty,
                local_count: code.local_count() as usize,
                body: Expr::clone(&code.body),
            });
        }
        debug!("function index space has {} entries", self.funcs.len());
    }

    fn init_table(&mut self) -> Result<()> {
        if let Some(ty) = self.module.tables.first() {
            self.table = Some(TableInstance::new(*ty).into_ref());
        }
        for (i, elem) in self.module.elements.iter().enumerate() {
            let offset = const_offset(&elem.offset, &self.globals).with_context(|| format!("element[{i}]"))?;
            let table = self.table.as_ref().ok_or_else(|| crate::vm::missing("table"))?;

            // A segment is written whole or not at all; the table may be shared.
            let size = table.borrow().size();
            let end = u32::try_from(elem.init.len()).ok().and_then(|len| offset.checked_add(len));
            if end.is_none_or(|end| end > size) {
                return Err(kinds::trap(
                    codes::TABLE_OUT_OF_BOUNDS,
                    format!("element[{i}]: {} entries at offset {offset} exceed table size {size}", elem.init.len()),
                ));
            }
            let funcs = elem
                .init
                .iter()
                .map(|func_idx| {
                    self.func_ref(*func_idx).ok_or_else(|| {
                        kinds::trap(codes::UNDEFINED_FUNCTION, format!("element[{i}]: undefined function {func_idx}"))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let mut table = table.borrow_mut();
            for (func, slot) in funcs.into_iter().zip(offset..) {
                table.set(slot, Some(func)).with_context(|| format!("element[{i}]"))?;
            }
        }
        Ok(())
    }
}

fn resolve_import(import: &Import, externals: &Externals, types: &[FuncType]) -> Result<Member> {
    let provider = externals.get(&import.module).ok_or_else(|| {
        kinds::link_error(codes::UNKNOWN_IMPORT_MODULE, format!("unknown import module {:?}", import.module))
    })?;
    let member = provider.get_member(&import.name).ok_or_else(|| {
        kinds::link_error(codes::UNKNOWN_IMPORT, format!("unknown import {}.{}", import.module, import.name))
    })?;

    let compatible = match (&import.desc, &member) {
        (ImportDesc::Func(type_idx), Member::Func(func)) => {
            types.get(*type_idx as usize).is_some_and(|ty| ty == func.func_type())
        }
        (ImportDesc::Global(ty), Member::Global(global)) => global.borrow().global_type() == *ty,
        (ImportDesc::Memory(required), Member::Memory(memory)) => {
            let memory = memory.borrow();
            Limits::new(memory.size(), memory.limits().max).is_subtype_of(required)
        }
        (ImportDesc::Table(required), Member::Table(table)) => {
            let table = table.borrow();
            Limits::new(table.size(), table.table_type().limits.max).is_subtype_of(&required.limits)
        }
        _ => false,
    };
    if !compatible {
        let expected = match &import.desc {
            ImportDesc::Func(type_idx) => types
                .get(*type_idx as usize)
                .map_or_else(|| format!("func type[{type_idx}]"), |ty| format!("func {ty}")),
            ImportDesc::Table(ty) => format!("table {ty}"),
            ImportDesc::Memory(limits) => format!("memory {limits}"),
            ImportDesc::Global(ty) => format!("global {ty}"),
        };
        return Err(kinds::link_error(
            codes::INCOMPATIBLE_IMPORT_TYPE,
            format!("incompatible import type for {}.{}: expected {expected}, found {member:?}", import.module, import.name),
        ));
    }
    Ok(member)
}

/// Evaluate a validated constant expression
pub(crate) fn eval_const_expr(expr: &Expr, globals: &[GlobalRef]) -> Result<Value> {
    let malformed = || kinds::validation_error(codes::CONSTANT_EXPRESSION_REQUIRED, "constant expression required");
    let [instr] = &expr[..] else { return Err(malformed()) };
    match (instr.opcode, &instr.operands) {
        (Opcode::I32Const, Operands::I32(v)) => Ok(Value::I32(*v)),
        (Opcode::I64Const, Operands::I64(v)) => Ok(Value::I64(*v)),
        (Opcode::F32Const, Operands::F32(v)) => Ok(Value::F32(*v)),
        (Opcode::F64Const, Operands::F64(v)) => Ok(Value::F64(*v)),
        (Opcode::GlobalGet, Operands::Index(idx)) => globals
            .get(*idx as usize)
            .map(|global| global.borrow().get())
            .ok_or_else(|| kinds::trap(codes::INVALID_GLOBAL_ACCESS, format!("global {idx} is not initialized yet"))),
        _ => Err(malformed()),
    }
}

fn const_offset(expr: &Expr, globals: &[GlobalRef]) -> Result<u32> {
    match eval_const_expr(expr, globals)? {
        Value::I32(offset) => Ok(offset as u32),
        other => Err(kinds::validation_error(
            codes::TYPE_MISMATCH,
            format!("segment offset must be i32, found {}", other.value_type()),
        )),
    }
}
