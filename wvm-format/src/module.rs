// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WebAssembly module format.
//!
//! The decoded, immutable representation of a binary module. Index spaces
//! for functions, tables, memories and globals start with the imports of
//! that kind, followed by the module's own definitions.

use core::fmt;

use crate::{
    instructions::Expr,
    types::{FuncType, GlobalType, Limits, TableType, ValueType},
};

/// Kind of an imported or exported entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalKind {
    /// Function
    Func,
    /// Table
    Table,
    /// Memory
    Memory,
    /// Global
    Global,
}

impl fmt::Display for ExternalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Func => "func",
            Self::Table => "table",
            Self::Memory => "memory",
            Self::Global => "global",
        })
    }
}

/// WebAssembly import description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportDesc {
    /// Function import with its type index
    Func(u32),
    /// Table import
    Table(TableType),
    /// Memory import
    Memory(Limits),
    /// Global import
    Global(GlobalType),
}

impl ImportDesc {
    /// Kind of the imported entity
    #[must_use]
    pub const fn kind(&self) -> ExternalKind {
        match self {
            Self::Func(_) => ExternalKind::Func,
            Self::Table(_) => ExternalKind::Table,
            Self::Memory(_) => ExternalKind::Memory,
            Self::Global(_) => ExternalKind::Global,
        }
    }
}

/// WebAssembly import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Module name
    pub module: String,
    /// Member name
    pub name:   String,
    /// Import description
    pub desc:   ImportDesc,
}

/// WebAssembly export description: a kind and an index into its space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportDesc {
    /// Export kind
    pub kind:  ExternalKind,
    /// Index in the kind's index space
    pub index: u32,
}

/// WebAssembly export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Export name
    pub name: String,
    /// What is exported
    pub desc: ExportDesc,
}

/// Module-defined global
#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    /// Global type
    pub global_type: GlobalType,
    /// Constant initializer expression
    pub init:        Expr,
}

/// Active element segment
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Table index
    pub table_index: u32,
    /// Constant offset expression
    pub offset:      Expr,
    /// Function indices placed starting at the offset
    pub init:        Vec<u32>,
}

/// A run of locals of one type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locals {
    /// Number of locals in the run
    pub count:      u32,
    /// Their type
    pub value_type: ValueType,
}

/// A function body
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    /// Local declarations, in runs
    pub locals: Vec<Locals>,
    /// Instruction sequence
    pub body:   Expr,
}

impl Code {
    /// Total number of declared locals (excluding parameters)
    #[must_use]
    pub fn local_count(&self) -> u64 {
        self.locals.iter().map(|l| u64::from(l.count)).sum()
    }

    /// Declared locals expanded to one type per slot
    #[must_use]
    pub fn local_types(&self) -> Vec<ValueType> {
        self.locals
            .iter()
            .flat_map(|l| core::iter::repeat_n(l.value_type, l.count as usize))
            .collect()
    }
}

/// Active data segment
#[derive(Debug, Clone, PartialEq)]
pub struct Data {
    /// Memory index
    pub memory_index: u32,
    /// Constant offset expression
    pub offset:       Expr,
    /// Bytes copied into memory at instantiation
    pub init:         Vec<u8>,
}

/// Custom section: a name and opaque bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSection {
    /// Section name
    pub name:  String,
    /// Raw payload after the name
    pub bytes: Vec<u8>,
}

/// Represents a decoded WebAssembly module.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    /// Magic number (`0x6D736100`)
    pub magic:     u32,
    /// Binary format version
    pub version:   u32,
    /// Function types
    pub types:     Vec<FuncType>,
    /// Imports
    pub imports:   Vec<Import>,
    /// Type index of each module-defined function
    pub functions: Vec<u32>,
    /// Table definitions
    pub tables:    Vec<TableType>,
    /// Memory definitions
    pub memories:  Vec<Limits>,
    /// Global definitions
    pub globals:   Vec<Global>,
    /// Exports
    pub exports:   Vec<Export>,
    /// Start function
    pub start:     Option<u32>,
    /// Element segments
    pub elements:  Vec<Element>,
    /// Function bodies, parallel to `functions`
    pub codes:     Vec<Code>,
    /// Data segments
    pub data:      Vec<Data>,
    /// Custom sections, in order of appearance
    pub customs:   Vec<CustomSection>,
}

impl Module {
    fn imports_of(&self, kind: ExternalKind) -> impl Iterator<Item = &Import> {
        self.imports.iter().filter(move |i| i.desc.kind() == kind)
    }

    /// Number of imported functions
    #[must_use]
    pub fn imported_func_count(&self) -> usize {
        self.imports_of(ExternalKind::Func).count()
    }

    /// Number of imported tables
    #[must_use]
    pub fn imported_table_count(&self) -> usize {
        self.imports_of(ExternalKind::Table).count()
    }

    /// Number of imported memories
    #[must_use]
    pub fn imported_memory_count(&self) -> usize {
        self.imports_of(ExternalKind::Memory).count()
    }

    /// Number of imported globals
    #[must_use]
    pub fn imported_global_count(&self) -> usize {
        self.imports_of(ExternalKind::Global).count()
    }

    /// Type index of a function in the function index space
    #[must_use]
    pub fn func_type_index(&self, func_idx: u32) -> Option<u32> {
        let idx = func_idx as usize;
        let mut imported = 0;
        for import in &self.imports {
            if let ImportDesc::Func(ty) = import.desc {
                if imported == idx {
                    return Some(ty);
                }
                imported += 1;
            }
        }
        self.functions.get(idx - imported).copied()
    }

    /// Signature of a function in the function index space
    #[must_use]
    pub fn func_type(&self, func_idx: u32) -> Option<&FuncType> {
        self.func_type_index(func_idx).and_then(|ty| self.types.get(ty as usize))
    }

    /// Type of a global in the global index space
    #[must_use]
    pub fn global_type(&self, global_idx: u32) -> Option<GlobalType> {
        let idx = global_idx as usize;
        let mut imported = 0;
        for import in &self.imports {
            if let ImportDesc::Global(ty) = import.desc {
                if imported == idx {
                    return Some(ty);
                }
                imported += 1;
            }
        }
        self.globals.get(idx - imported).map(|g| g.global_type)
    }

    /// Total number of functions (imported and defined)
    #[must_use]
    pub fn func_count(&self) -> usize {
        self.imported_func_count() + self.functions.len()
    }

    /// Total number of tables (imported and defined)
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.imported_table_count() + self.tables.len()
    }

    /// Total number of memories (imported and defined)
    #[must_use]
    pub fn memory_count(&self) -> usize {
        self.imported_memory_count() + self.memories.len()
    }

    /// Total number of globals (imported and defined)
    #[must_use]
    pub fn global_count(&self) -> usize {
        self.imported_global_count() + self.globals.len()
    }

    /// Find an export by name
    #[must_use]
    pub fn export(&self, name: &str) -> Option<&Export> {
        self.exports.iter().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::Instruction;

    fn import(name: &str, desc: ImportDesc) -> Import {
        Import { module: "env".to_string(), name: name.to_string(), desc }
    }

    #[test]
    fn test_index_spaces_put_imports_first() {
        let module = Module {
            types: vec![
                FuncType::new(vec![ValueType::I32], vec![]),
                FuncType::new(vec![], vec![ValueType::I64]),
            ],
            imports: vec![
                import("g", ImportDesc::Global(GlobalType { value_type: ValueType::F32, mutable: false })),
                import("f", ImportDesc::Func(0)),
            ],
            functions: vec![1, 1],
            globals: vec![Global {
                global_type: GlobalType { value_type: ValueType::I32, mutable: true },
                init: Vec::<Instruction>::new().into(),
            }],
            ..Module::default()
        };

        assert_eq!(module.func_count(), 3);
        assert_eq!(module.func_type_index(0), Some(0));
        assert_eq!(module.func_type_index(1), Some(1));
        assert_eq!(module.func_type_index(3), None);
        assert_eq!(module.func_type(2).map(|t| t.results.clone()), Some(vec![ValueType::I64]));

        assert_eq!(module.global_count(), 2);
        assert_eq!(module.global_type(0).map(|g| g.value_type), Some(ValueType::F32));
        assert_eq!(module.global_type(1).map(|g| g.mutable), Some(true));
        assert_eq!(module.global_type(2), None);
    }

    #[test]
    fn test_lookup_with_interleaved_imports() {
        let i32_const = GlobalType { value_type: ValueType::I32, mutable: false };
        let module = Module {
            imports: vec![
                import("f0", ImportDesc::Func(4)),
                import("g0", ImportDesc::Global(i32_const)),
                import("m", ImportDesc::Memory(Limits { min: 1, max: None })),
                import("f1", ImportDesc::Func(5)),
                import("g1", ImportDesc::Global(GlobalType { value_type: ValueType::I64, mutable: true })),
            ],
            functions: vec![6],
            ..Module::default()
        };

        assert_eq!(module.func_type_index(0), Some(4));
        assert_eq!(module.func_type_index(1), Some(5));
        assert_eq!(module.func_type_index(2), Some(6));
        assert_eq!(module.func_type_index(u32::MAX), None);
        assert_eq!(module.global_type(0), Some(i32_const));
        assert_eq!(module.global_type(1).map(|g| g.value_type), Some(ValueType::I64));
        assert_eq!(module.global_type(2), None);
    }

    #[test]
    fn test_code_local_expansion() {
        let code = Code {
            locals: vec![
                Locals { count: 2, value_type: ValueType::I32 },
                Locals { count: 1, value_type: ValueType::F64 },
            ],
            body: Vec::<Instruction>::new().into(),
        };
        assert_eq!(code.local_count(), 3);
        assert_eq!(code.local_types(), vec![ValueType::I32, ValueType::I32, ValueType::F64]);
    }
}
