// WVM - wvm
// Module: WebAssembly Runtime
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! WebAssembly Virtual Machine (WVM)
//!
//! A pure Rust interpreter for WebAssembly MVP modules. A module goes
//! through three steps before it runs:
//!
//! 1. **Decode** the binary into a [`Module`]
//! 2. **Validate** it, so execution never sees ill-typed code
//! 3. **Instantiate** it against a set of import providers ([`Externals`])
//!
//! The resulting [`RuntimeModule`] invokes exports by name and can itself
//! serve as an import provider for further instantiations.
//!
//! ```
//! use wvm::prelude::*;
//!
//! // (module (func (export "main") (result i32) i32.const 42))
//! let bytes = [
//!     0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00,
//!     0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7F,
//!     0x03, 0x02, 0x01, 0x00,
//!     0x07, 0x08, 0x01, 0x04, b'm', b'a', b'i', b'n', 0x00, 0x00,
//!     0x0A, 0x06, 0x01, 0x04, 0x00, 0x41, 0x2A, 0x0B,
//! ];
//! let module = wvm::decode_module_from_bytes(&bytes)?;
//! wvm::validate(&module)?;
//! let instance = wvm::instantiate(module, &Externals::new())?;
//! assert_eq!(instance.invoke("main", &[])?, vec![Value::I32(42)]);
//! # Ok::<(), wvm::Error>(())
//! ```

pub mod prelude;

use std::path::Path;

use log::debug;
pub use wvm_error::{Error, ErrorCategory, Result, ResultExt, codes};
pub use wvm_format::{
    module::Module,
    types::{FuncType, Value, ValueType},
};
pub use wvm_host::{Externals, HostBuilder, Member};
pub use wvm_runtime::{RuntimeModule, VmConfig};

/// Decode a module from its binary encoding
///
/// # Errors
///
/// Returns a parse error naming the offending section and byte offset.
pub fn decode_module_from_bytes(bytes: &[u8]) -> Result<Module> {
    wvm_decoder::decode_module(bytes)
}

/// Read and decode a module from a file
///
/// # Errors
///
/// Returns an [`ErrorCategory::Io`] error if the file cannot be read, or a
/// parse error if its contents are malformed.
pub fn decode_module_from_file(path: impl AsRef<Path>) -> Result<Module> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(Error::from).with_context(|| path.display().to_string())?;
    debug!("read {} bytes from {}", bytes.len(), path.display());
    decode_module_from_bytes(&bytes).with_context(|| path.display().to_string())
}

/// Validate a decoded module
///
/// # Errors
///
/// Returns a validation error naming the offending function and instruction.
pub fn validate(module: &Module) -> Result<()> {
    wvm_decoder::validate_module(module)
}

/// Instantiate a module with the default [`VmConfig`]
///
/// The module is validated first; instantiation resolves imports against
/// `externals`, initializes globals, memory and table, and runs the start
/// function.
///
/// # Errors
///
/// Validation, link and start-function trap errors.
pub fn instantiate(module: Module, externals: &Externals) -> Result<RuntimeModule> {
    instantiate_with_config(module, externals, VmConfig::default())
}

/// Instantiate a module with explicit resource limits
///
/// # Errors
///
/// See [`instantiate`].
pub fn instantiate_with_config(module: Module, externals: &Externals, config: VmConfig) -> Result<RuntimeModule> {
    RuntimeModule::instantiate(module, externals, config)
}
