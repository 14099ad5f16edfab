// WVM - wvm-error
// Module: Error Handling
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error handling for the wvm runtime.
//!
//! Every crate in the workspace reports failures through one [`Error`] type.
//! An error carries a category, a numeric code and a message. Codes are
//! grouped by range so the category can be recovered from the code alone:
//!
//! ## Parse errors (1000-1099)
//! - Bad magic or version
//! - Section order and section size violations
//! - Unknown opcodes, bad type tags, overflowing varints
//!
//! ## Validation errors (2000-2099)
//! - Operand type mismatches and leftover operands
//! - Index-space bound violations
//! - Constant expression, alignment, export and start function rules
//!
//! ## Link errors (3000-3099)
//! - Unknown import modules or members
//! - Imports whose kind or type does not match the declaration
//!
//! ## Runtime traps (4000-4099)
//! - `unreachable`, division by zero, integer overflow
//! - Out-of-bounds memory and table accesses
//! - Indirect call signature mismatches, call stack exhaustion
//!
//! ## Host errors (5000-5099)
//! - Malformed native signatures, missing exports, bad invocation arguments
//!
//! # Usage
//!
//! ```
//! use wvm_error::{codes, Error, ErrorCategory, ResultExt};
//!
//! let error = Error::new(
//!     ErrorCategory::RuntimeTrap,
//!     codes::DIVISION_BY_ZERO,
//!     "integer divide by zero",
//! );
//! assert!(error.is_trap());
//!
//! let result: wvm_error::Result<()> = Err(error);
//! let err = result.context("func[3]").unwrap_err();
//! assert_eq!(err.message, "func[3]: integer divide by zero");
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Error codes for wvm
pub mod codes;
/// Context helpers for `Result`
pub mod context;
/// Error and error category types
pub mod errors;
/// Constructors for the common error kinds
pub mod kinds;

pub use context::ResultExt;
pub use errors::{Error, ErrorCategory};

/// A specialized `Result` type for wvm operations.
pub type Result<T> = core::result::Result<T, Error>;
