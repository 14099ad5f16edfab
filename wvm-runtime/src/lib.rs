// WVM - wvm-runtime
// Module: Stack Machine
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Interpreter for validated WebAssembly modules.
//!
//! [`RuntimeModule::instantiate`] validates a decoded module, resolves its
//! imports through the linker contract of `wvm-host`, builds the function,
//! global, memory and table index spaces and runs the start function. The
//! resulting instance executes on a single operand stack of raw 64-bit
//! slots and a stack of control frames.
//!
//! # Example
//!
//! ```
//! use wvm_format::types::Value;
//! use wvm_host::Externals;
//! use wvm_runtime::{RuntimeModule, VmConfig};
//!
//! // (func (export "main") (result i32) i32.const 42)
//! let bytes = [
//!     0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00, // header
//!     0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7F, // type: ()->(i32)
//!     0x03, 0x02, 0x01, 0x00, // function: type 0
//!     0x07, 0x08, 0x01, 0x04, b'm', b'a', b'i', b'n', 0x00, 0x00, // export "main"
//!     0x0A, 0x06, 0x01, 0x04, 0x00, 0x41, 0x2A, 0x0B, // code: i32.const 42
//! ];
//! let module = wvm_decoder::decode_module(&bytes)?;
//! let instance = RuntimeModule::instantiate(module, &Externals::new(), VmConfig::default())?;
//! assert_eq!(instance.invoke("main", &[])?, vec![Value::I32(42)]);
//! # Ok::<(), wvm_error::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod frame;
pub mod func;
pub mod instance;
mod instantiate;
mod instructions;
pub mod memory;
pub mod stack;
pub mod table;
pub mod vm;

pub use config::VmConfig;
pub use func::{Func, VmFunc};
pub use instance::RuntimeModule;
pub use memory::MemoryInstance;
pub use table::TableInstance;
pub use vm::Vm;
