// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Section listing for `wvmd dump`.
//!
//! Index spaces are numbered the way the module sees them, so defined
//! functions, tables, memories and globals start after the imports of the
//! same kind.

use std::fmt::{self, Write};

use wvm::{
    Module,
    prelude::{ExternalKind, FuncType},
};
use wvm_format::{
    instructions::{Expr, Operands},
    module::ImportDesc,
    types::BlockType,
};

#[derive(Debug, Default, Clone, Copy)]
struct ImportCounts {
    func:   usize,
    table:  usize,
    memory: usize,
    global: usize,
}

/// Render the whole module
pub fn dump(module: &Module) -> String {
    let mut out = String::new();
    // formatting into a String is infallible
    let _ = write_module(&mut out, module);
    out
}

fn write_module<W: Write>(out: &mut W, module: &Module) -> fmt::Result {
    writeln!(out, "Version: 0x{:02x}", module.version)?;

    writeln!(out, "Type[{}]:", module.types.len())?;
    for (i, ty) in module.types.iter().enumerate() {
        writeln!(out, "  type[{i}]: {ty}")?;
    }

    let counts = write_imports(out, module)?;

    writeln!(out, "Function[{}]:", module.functions.len())?;
    for (i, type_idx) in module.functions.iter().enumerate() {
        writeln!(out, "  func[{}]: sig={type_idx}", counts.func + i)?;
    }
    writeln!(out, "Table[{}]:", module.tables.len())?;
    for (i, table) in module.tables.iter().enumerate() {
        writeln!(out, "  table[{}]: {}", counts.table + i, table.limits)?;
    }
    writeln!(out, "Memory[{}]:", module.memories.len())?;
    for (i, limits) in module.memories.iter().enumerate() {
        writeln!(out, "  memory[{}]: {limits}", counts.memory + i)?;
    }
    writeln!(out, "Global[{}]:", module.globals.len())?;
    for (i, global) in module.globals.iter().enumerate() {
        writeln!(out, "  global[{}]: {}, init={}", counts.global + i, global.global_type, const_expr(&global.init))?;
    }

    writeln!(out, "Export[{}]:", module.exports.len())?;
    for export in &module.exports {
        writeln!(out, "  {}[{}]: name={}", export.desc.kind, export.desc.index, export.name)?;
    }

    writeln!(out, "Start:")?;
    if let Some(start) = module.start {
        writeln!(out, "  func={start}")?;
    }

    writeln!(out, "Element[{}]:", module.elements.len())?;
    for (i, elem) in module.elements.iter().enumerate() {
        writeln!(
            out,
            "  elem[{i}]: table={}, offset={}, funcs={:?}",
            elem.table_index,
            const_expr(&elem.offset),
            elem.init
        )?;
    }

    writeln!(out, "Code[{}]:", module.codes.len())?;
    for (i, code) in module.codes.iter().enumerate() {
        let locals: Vec<String> = code.locals.iter().map(|l| format!("{} x {}", l.value_type, l.count)).collect();
        writeln!(out, "  func[{}]: locals=[{}]", counts.func + i, locals.join(", "))?;
        write_expr(out, "    ", &module.types, &code.body)?;
    }

    writeln!(out, "Data[{}]:", module.data.len())?;
    for (i, data) in module.data.iter().enumerate() {
        writeln!(
            out,
            "  data[{i}]: mem={}, offset={}, len={}",
            data.memory_index,
            const_expr(&data.offset),
            data.init.len()
        )?;
    }

    writeln!(out, "Custom[{}]:", module.customs.len())?;
    for (i, custom) in module.customs.iter().enumerate() {
        writeln!(out, "  custom[{i}]: name={}, size={}", custom.name, custom.bytes.len())?;
    }
    Ok(())
}

fn write_imports<W: Write>(out: &mut W, module: &Module) -> Result<ImportCounts, fmt::Error> {
    writeln!(out, "Import[{}]:", module.imports.len())?;
    let mut counts = ImportCounts::default();
    for import in &module.imports {
        let (kind, index, detail) = match &import.desc {
            ImportDesc::Func(type_idx) => (ExternalKind::Func, &mut counts.func, format!("sig={type_idx}")),
            ImportDesc::Table(table) => (ExternalKind::Table, &mut counts.table, table.limits.to_string()),
            ImportDesc::Memory(limits) => (ExternalKind::Memory, &mut counts.memory, limits.to_string()),
            ImportDesc::Global(global) => (ExternalKind::Global, &mut counts.global, global.to_string()),
        };
        writeln!(out, "  {kind}[{index}]: {}.{}, {detail}", import.module, import.name)?;
        *index += 1;
    }
    Ok(counts)
}

fn write_expr<W: Write>(out: &mut W, indent: &str, types: &[FuncType], expr: &Expr) -> fmt::Result {
    let nested = format!("{indent}  ");
    for instr in expr.iter() {
        match &instr.operands {
            Operands::Block(block) => {
                writeln!(out, "{indent}{} {}", instr.name(), block_signature(block.block_type, types))?;
                write_expr(out, &nested, types, &block.body)?;
                writeln!(out, "{indent}end")?;
            }
            Operands::If(block) => {
                writeln!(out, "{indent}if {}", block_signature(block.block_type, types))?;
                write_expr(out, &nested, types, &block.then_body)?;
                if !block.else_body.is_empty() {
                    writeln!(out, "{indent}else")?;
                    write_expr(out, &nested, types, &block.else_body)?;
                }
                writeln!(out, "{indent}end")?;
            }
            _ => writeln!(out, "{indent}{instr}")?,
        }
    }
    Ok(())
}

fn block_signature(block_type: BlockType, types: &[FuncType]) -> String {
    match block_type {
        BlockType::TypeIndex(idx) => {
            types.get(idx as usize).map_or_else(|| block_type.to_string(), ToString::to_string)
        }
        other => other.to_string(),
    }
}

fn const_expr(expr: &Expr) -> String {
    expr.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump_wat(wat: &str) -> String {
        let bytes = wat::parse_str(wat).unwrap();
        dump(&wvm::decode_module_from_bytes(&bytes).unwrap())
    }

    #[test]
    fn test_index_spaces_start_after_imports() {
        let text = dump_wat(
            r#"(module
                (import "env" "f" (func (param i32)))
                (import "env" "g" (global i64))
                (global (mut i32) (i32.const 5))
                (memory 1 2)
                (func (export "main") (result i32) (i32.const 42))
                (start 1))"#,
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Version: 0x01");
        assert!(lines.contains(&"  func[0]: env.f, sig=0"), "{text}");
        assert!(lines.contains(&"  global[0]: env.g, {type: i64, mut: false}"), "{text}");
        assert!(lines.contains(&"  func[1]: sig=1"), "{text}");
        assert!(lines.contains(&"  global[1]: {type: i32, mut: true}, init=i32.const 5"), "{text}");
        assert!(lines.contains(&"  memory[0]: {min: 1, max: 2}"), "{text}");
        assert!(lines.contains(&"  func[1]: name=main"), "{text}");
        assert!(lines.contains(&"  func=1"), "{text}");
        assert!(lines.contains(&"    i32.const 42"), "{text}");
    }

    #[test]
    fn test_nested_instruction_listing() {
        let text = dump_wat(
            r#"(module
                (func (param i32) (result i32) (local i64 i64)
                  (block (result i32)
                    (if (result i32) (local.get 0)
                      (then (i32.const 1))
                      (else (i32.const 2))))))"#,
        );
        let code: Vec<&str> = text.lines().skip_while(|l| !l.starts_with("Code[")).take(10).collect();
        assert_eq!(
            code,
            [
                "Code[1]:",
                "  func[0]: locals=[i64 x 2]",
                "    block ()->(i32)",
                "      local.get 0",
                "      if ()->(i32)",
                "        i32.const 1",
                "      else",
                "        i32.const 2",
                "      end",
                "    end",
            ]
        );
    }

    #[test]
    fn test_segments_and_customs() {
        let mut bytes = wat::parse_str(
            r#"(module
                (table 2 funcref)
                (memory 1)
                (func $f)
                (elem (i32.const 1) $f)
                (data (i32.const 8) "abc"))"#,
        )
        .unwrap();
        // custom section "note" carrying two payload bytes
        bytes.extend_from_slice(&[0x00, 0x07, 0x04, b'n', b'o', b't', b'e', b'h', b'i']);
        let text = dump(&wvm::decode_module_from_bytes(&bytes).unwrap());

        assert!(text.contains("  table[0]: {min: 2}"), "{text}");
        assert!(text.contains("  elem[0]: table=0, offset=i32.const 1, funcs=[0]"), "{text}");
        assert!(text.contains("  data[0]: mem=0, offset=i32.const 8, len=3"), "{text}");
        // `wat` also emits a `name` section for the `$f` identifier
        assert!(text.contains("name=note, size=2"), "{text}");
    }
}
