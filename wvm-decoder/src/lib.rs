// WVM - wvm-decoder
// Module: WebAssembly Binary Decoder
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]

//! WebAssembly module decoder and validator for wvm.
//!
//! The decoder turns a byte buffer into a [`Module`]: it checks the header,
//! walks the sections in ascending id order (custom sections may appear
//! anywhere), and recursively decodes function bodies into nested
//! instruction sequences. The validator then proves the module is well
//! typed before anything runs.
//!
//! ```
//! let bytes = [0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00];
//! let module = wvm_decoder::decode_module(&bytes).unwrap();
//! wvm_decoder::validate_module(&module).unwrap();
//! ```

pub mod decoder;
pub mod instructions;
pub mod section_error;
pub mod sections;
pub mod validation;

pub use decoder::{Decoder, decode_module};
pub use validation::{validate_const_expr, validate_function, validate_module};
pub use wvm_format::module::Module;

/// Decode and validate in one step
pub fn decode_and_validate(bytes: &[u8]) -> wvm_error::Result<Module> {
    let module = decode_module(bytes)?;
    validate_module(&module)?;
    Ok(module)
}
