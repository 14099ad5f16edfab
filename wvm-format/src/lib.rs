// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]

//! WebAssembly binary format support for wvm.
//!
//! This crate holds everything that describes a module without executing
//! it:
//!
//! - [`binary`]: header and section constants, LEB128 and IEEE-754
//!   primitives
//! - [`types`]: value types, function types, limits and runtime [`Value`]s
//! - [`instructions`]: the closed opcode set and typed instruction operands
//! - [`module`]: the decoded, immutable [`Module`]
//!
//! ```
//! use wvm_format::binary::{read_leb128_u32, write_leb128_u32};
//!
//! let bytes = write_leb128_u32(624_485);
//! assert_eq!(bytes, [0xE5, 0x8E, 0x26]);
//! assert_eq!(read_leb128_u32(&bytes, 0).unwrap(), (624_485, 3));
//! ```

#![warn(missing_docs)]

pub mod binary;
pub mod instructions;
pub mod module;
pub mod types;

pub use instructions::{Block, BrTable, Expr, IfBlock, Instruction, MemArg, Opcode, Operands, TruncSatOp};
pub use module::{
    Code, CustomSection, Data, Element, Export, ExportDesc, ExternalKind, Global, Import,
    ImportDesc, Locals, Module,
};
pub use types::{BlockType, FuncType, GlobalType, Limits, TableType, Value, ValueType};
