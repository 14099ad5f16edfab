// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Numeric operations for wvm.
//!
//! Integer division and remainder, float-to-integer truncation (trapping
//! and saturating), and the float operators whose WebAssembly semantics
//! differ from what a bare Rust operator does (`min`, `max`, `nearest`).
//!
//! ```
//! use wvm_math::{f32_min, i32_div_s};
//!
//! assert_eq!(i32_div_s(-7, 2).unwrap(), -3);
//! assert!(i32_div_s(1, 0).unwrap_err().is_trap());
//! assert!(f32_min(-0.0, 0.0).is_sign_negative());
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs, clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic)]
#![allow(clippy::float_arithmetic, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

pub mod float_bits;
pub mod ops;

pub use float_bits::{FloatBits32, FloatBits64};
pub use ops::*;
pub use wvm_error::{Error as MathError, Result as MathResult};
