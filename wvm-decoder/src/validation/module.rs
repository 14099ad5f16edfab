// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use wvm_error::{Result, ResultExt, codes, kinds};
use wvm_format::{
    binary::MAX_PAGES,
    instructions::{Expr, Opcode, Operands},
    module::{Element, ExternalKind, ImportDesc, Module},
    types::{Limits, ValueType},
};

fn check_type_index(module: &Module, type_idx: u32) -> Result<()> {
    if (type_idx as usize) < module.types.len() {
        Ok(())
    } else {
        Err(kinds::validation_error(codes::INVALID_TYPE_INDEX, format!("unknown type {type_idx}")))
    }
}

fn check_index(code: u16, what: &str, index: u32, count: usize) -> Result<()> {
    if (index as usize) < count {
        Ok(())
    } else {
        Err(kinds::validation_error(code, format!("unknown {what} {index}")))
    }
}

fn check_limits(limits: &Limits, bound: Option<u32>, what: &str) -> Result<()> {
    if let Some(bound) = bound {
        if limits.min > bound || limits.max.is_some_and(|max| max > bound) {
            return Err(kinds::validation_error(
                codes::INVALID_LIMITS,
                format!("{what} size must be at most {bound} pages"),
            ));
        }
    }
    if limits.max.is_some_and(|max| max < limits.min) {
        return Err(kinds::validation_error(
            codes::INVALID_LIMITS,
            format!("{what} minimum {} exceeds maximum", limits.min),
        ));
    }
    Ok(())
}

/// Validate a constant expression.
///
/// The expression must be exactly one `*.const` of `expected` type, or a
/// `global.get` of an immutable global whose index is below
/// `visible_globals`.
pub fn validate_const_expr(module: &Module, expr: &Expr, expected: ValueType, visible_globals: usize) -> Result<()> {
    let [instr] = &expr[..] else {
        return Err(kinds::validation_error(
            codes::CONSTANT_EXPRESSION_REQUIRED,
            format!("constant expression required, found {} instructions", expr.len()),
        ));
    };

    let actual = match (&instr.opcode, &instr.operands) {
        (Opcode::I32Const, _) => ValueType::I32,
        (Opcode::I64Const, _) => ValueType::I64,
        (Opcode::F32Const, _) => ValueType::F32,
        (Opcode::F64Const, _) => ValueType::F64,
        (Opcode::GlobalGet, Operands::Index(idx)) => {
            check_index(codes::INVALID_GLOBAL_INDEX, "global", *idx, visible_globals)?;
            let global = module.global_type(*idx).ok_or_else(|| {
                kinds::validation_error(codes::INVALID_GLOBAL_INDEX, format!("unknown global {idx}"))
            })?;
            if global.mutable {
                return Err(kinds::validation_error(
                    codes::CONSTANT_EXPRESSION_REQUIRED,
                    format!("constant expression required: global {idx} is mutable"),
                ));
            }
            global.value_type
        }
        _ => {
            return Err(kinds::validation_error(
                codes::CONSTANT_EXPRESSION_REQUIRED,
                format!("constant expression required, found {}", instr.name()),
            ));
        }
    };

    if actual != expected {
        return Err(kinds::validation_error(
            codes::TYPE_MISMATCH,
            format!("type mismatch in constant expression: expected {expected}, found {actual}"),
        ));
    }
    Ok(())
}

fn validate_imports(module: &Module) -> Result<()> {
    for (i, import) in module.imports.iter().enumerate() {
        match &import.desc {
            ImportDesc::Func(type_idx) => check_type_index(module, *type_idx),
            ImportDesc::Table(table) => check_limits(&table.limits, None, "table"),
            ImportDesc::Memory(limits) => check_limits(limits, Some(MAX_PAGES), "memory"),
            ImportDesc::Global(_) => Ok(()),
        }
        .with_context(|| format!("import[{i}] {}.{}", import.module, import.name))?;
    }
    Ok(())
}

fn validate_exports(module: &Module) -> Result<()> {
    let mut names = HashSet::new();
    for export in &module.exports {
        let index = export.desc.index;
        match export.desc.kind {
            ExternalKind::Func => check_index(codes::INVALID_FUNCTION_INDEX, "function", index, module.func_count()),
            ExternalKind::Table => check_index(codes::INVALID_TABLE_INDEX, "table", index, module.table_count()),
            ExternalKind::Memory => check_index(codes::INVALID_MEMORY_INDEX, "memory", index, module.memory_count()),
            ExternalKind::Global => check_index(codes::INVALID_GLOBAL_INDEX, "global", index, module.global_count()),
        }
        .with_context(|| format!("export {:?}", export.name))?;

        if !names.insert(export.name.as_str()) {
            return Err(kinds::validation_error(
                codes::DUPLICATE_EXPORT,
                format!("duplicate export name {:?}", export.name),
            ));
        }
    }
    Ok(())
}

fn validate_start(module: &Module) -> Result<()> {
    let Some(start) = module.start else { return Ok(()) };
    let ty = module.func_type(start).ok_or_else(|| {
        kinds::validation_error(codes::INVALID_FUNCTION_INDEX, format!("unknown start function {start}"))
    })?;
    if !ty.params.is_empty() || !ty.results.is_empty() {
        return Err(kinds::validation_error(
            codes::INVALID_START_FUNCTION,
            format!("start function {start} must have type ()->(), found {ty}"),
        ));
    }
    Ok(())
}

fn validate_element(module: &Module, elem: &Element) -> Result<()> {
    check_index(codes::INVALID_TABLE_INDEX, "table", elem.table_index, module.table_count())?;
    validate_const_expr(module, &elem.offset, ValueType::I32, module.global_count())?;
    for func_idx in &elem.init {
        check_index(codes::INVALID_FUNCTION_INDEX, "function", *func_idx, module.func_count())?;
    }
    Ok(())
}

fn validate_segments(module: &Module) -> Result<()> {
    for (i, elem) in module.elements.iter().enumerate() {
        validate_element(module, elem).with_context(|| format!("element[{i}]"))?;
    }

    for (i, data) in module.data.iter().enumerate() {
        check_index(codes::INVALID_MEMORY_INDEX, "memory", data.memory_index, module.memory_count())
            .and_then(|()| validate_const_expr(module, &data.offset, ValueType::I32, module.global_count()))
            .with_context(|| format!("data[{i}]"))?;
    }
    Ok(())
}

/// Module-level well-formedness: everything except function bodies
pub(super) fn validate_structure(module: &Module) -> Result<()> {
    validate_imports(module)?;

    for (i, type_idx) in module.functions.iter().enumerate() {
        check_type_index(module, *type_idx).with_context(|| format!("function[{i}]"))?;
    }

    if module.table_count() > 1 {
        return Err(kinds::validation_error(codes::MULTIPLE_TABLES, "multiple tables"));
    }
    if module.memory_count() > 1 {
        return Err(kinds::validation_error(codes::MULTIPLE_MEMORIES, "multiple memories"));
    }
    for table in &module.tables {
        check_limits(&table.limits, None, "table")?;
    }
    for memory in &module.memories {
        check_limits(memory, Some(MAX_PAGES), "memory")?;
    }

    let imported_globals = module.imported_global_count();
    for (i, global) in module.globals.iter().enumerate() {
        validate_const_expr(module, &global.init, global.global_type.value_type, imported_globals + i)
            .with_context(|| format!("global[{}]", imported_globals + i))?;
    }

    validate_exports(module)?;
    validate_start(module)?;
    validate_segments(module)?;

    if module.functions.len() != module.codes.len() {
        return Err(kinds::validation_error(
            codes::FUNCTION_CODE_MISMATCH,
            format!(
                "function and code section have inconsistent lengths: {} declared, {} bodies",
                module.functions.len(),
                module.codes.len()
            ),
        ));
    }
    Ok(())
}
