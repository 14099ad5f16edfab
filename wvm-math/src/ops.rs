// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WebAssembly numeric operations.
//!
//! Only the operators that can trap, or whose result differs from the plain
//! Rust operator, live here. Wrapping arithmetic, bit counting, shifts and
//! comparisons map directly onto `core` integer and float methods.

use wvm_error::{Error, ErrorCategory, Result, codes};

use crate::float_bits::{FloatBits32, FloatBits64};

const DIVIDE_BY_ZERO: Error =
    Error::new(ErrorCategory::RuntimeTrap, codes::DIVISION_BY_ZERO, "integer divide by zero");
const DIVIDE_OVERFLOW: Error =
    Error::new(ErrorCategory::RuntimeTrap, codes::INTEGER_OVERFLOW, "integer overflow");
const NAN_CONVERSION: Error = Error::new(
    ErrorCategory::RuntimeTrap,
    codes::INVALID_CONVERSION_TO_INTEGER,
    "invalid conversion to integer",
);

// ============================================================================
// Integer division
// ============================================================================

/// `i32.div_s`: traps on a zero divisor and on `i32::MIN / -1`
pub fn i32_div_s(lhs: i32, rhs: i32) -> Result<i32> {
    if rhs == 0 {
        return Err(DIVIDE_BY_ZERO);
    }
    lhs.checked_div(rhs).ok_or(DIVIDE_OVERFLOW)
}

/// `i32.div_u`
pub fn i32_div_u(lhs: u32, rhs: u32) -> Result<u32> {
    lhs.checked_div(rhs).ok_or(DIVIDE_BY_ZERO)
}

/// `i32.rem_s`: `i32::MIN % -1` is 0
pub fn i32_rem_s(lhs: i32, rhs: i32) -> Result<i32> {
    if rhs == 0 {
        return Err(DIVIDE_BY_ZERO);
    }
    Ok(lhs.wrapping_rem(rhs))
}

/// `i32.rem_u`
pub fn i32_rem_u(lhs: u32, rhs: u32) -> Result<u32> {
    lhs.checked_rem(rhs).ok_or(DIVIDE_BY_ZERO)
}

/// `i64.div_s`: traps on a zero divisor and on `i64::MIN / -1`
pub fn i64_div_s(lhs: i64, rhs: i64) -> Result<i64> {
    if rhs == 0 {
        return Err(DIVIDE_BY_ZERO);
    }
    lhs.checked_div(rhs).ok_or(DIVIDE_OVERFLOW)
}

/// `i64.div_u`
pub fn i64_div_u(lhs: u64, rhs: u64) -> Result<u64> {
    lhs.checked_div(rhs).ok_or(DIVIDE_BY_ZERO)
}

/// `i64.rem_s`: `i64::MIN % -1` is 0
pub fn i64_rem_s(lhs: i64, rhs: i64) -> Result<i64> {
    if rhs == 0 {
        return Err(DIVIDE_BY_ZERO);
    }
    Ok(lhs.wrapping_rem(rhs))
}

/// `i64.rem_u`
pub fn i64_rem_u(lhs: u64, rhs: u64) -> Result<u64> {
    lhs.checked_rem(rhs).ok_or(DIVIDE_BY_ZERO)
}

// ============================================================================
// Float to integer truncation
// ============================================================================

// Each bound pair is exclusive and exactly representable in the source
// float type, so the comparison happens before any rounding of the input.
macro_rules! trapping_trunc {
    ($(#[$doc:meta])* $name:ident, $float:ty => $int:ty, $lower:expr, $upper:expr) => {
        $(#[$doc])*
        pub fn $name(value: $float) -> Result<$int> {
            if value.is_nan() {
                return Err(NAN_CONVERSION);
            }
            if value <= $lower || value >= $upper {
                return Err(DIVIDE_OVERFLOW);
            }
            Ok(value as $int)
        }
    };
}

trapping_trunc!(
    /// `i32.trunc_f32_s`
    i32_trunc_f32_s, f32 => i32, -2_147_483_904.0_f32, 2_147_483_648.0_f32
);
trapping_trunc!(
    /// `i32.trunc_f32_u`
    i32_trunc_f32_u, f32 => u32, -1.0_f32, 4_294_967_296.0_f32
);
trapping_trunc!(
    /// `i32.trunc_f64_s`
    i32_trunc_f64_s, f64 => i32, -2_147_483_649.0_f64, 2_147_483_648.0_f64
);
trapping_trunc!(
    /// `i32.trunc_f64_u`
    i32_trunc_f64_u, f64 => u32, -1.0_f64, 4_294_967_296.0_f64
);
trapping_trunc!(
    /// `i64.trunc_f32_s`
    i64_trunc_f32_s, f32 => i64, -9_223_373_136_366_403_584.0_f32, 9_223_372_036_854_775_808.0_f32
);
trapping_trunc!(
    /// `i64.trunc_f32_u`
    i64_trunc_f32_u, f32 => u64, -1.0_f32, 18_446_744_073_709_551_616.0_f32
);
trapping_trunc!(
    /// `i64.trunc_f64_s`
    i64_trunc_f64_s, f64 => i64, -9_223_372_036_854_777_856.0_f64, 9_223_372_036_854_775_808.0_f64
);
trapping_trunc!(
    /// `i64.trunc_f64_u`
    i64_trunc_f64_u, f64 => u64, -1.0_f64, 18_446_744_073_709_551_616.0_f64
);

// `as` from float to integer already saturates and maps NaN to zero, which
// is exactly the `trunc_sat` family.

/// `i32.trunc_sat_f32_s`
#[must_use]
pub fn i32_trunc_sat_f32_s(value: f32) -> i32 {
    value as i32
}

/// `i32.trunc_sat_f32_u`
#[must_use]
pub fn i32_trunc_sat_f32_u(value: f32) -> u32 {
    value as u32
}

/// `i32.trunc_sat_f64_s`
#[must_use]
pub fn i32_trunc_sat_f64_s(value: f64) -> i32 {
    value as i32
}

/// `i32.trunc_sat_f64_u`
#[must_use]
pub fn i32_trunc_sat_f64_u(value: f64) -> u32 {
    value as u32
}

/// `i64.trunc_sat_f32_s`
#[must_use]
pub fn i64_trunc_sat_f32_s(value: f32) -> i64 {
    value as i64
}

/// `i64.trunc_sat_f32_u`
#[must_use]
pub fn i64_trunc_sat_f32_u(value: f32) -> u64 {
    value as u64
}

/// `i64.trunc_sat_f64_s`
#[must_use]
pub fn i64_trunc_sat_f64_s(value: f64) -> i64 {
    value as i64
}

/// `i64.trunc_sat_f64_u`
#[must_use]
pub fn i64_trunc_sat_f64_u(value: f64) -> u64 {
    value as u64
}

// ============================================================================
// Float operators
// ============================================================================

/// `f32.min`: NaN if either operand is NaN, and `-0 < +0`
#[must_use]
pub fn f32_min(lhs: f32, rhs: f32) -> f32 {
    if lhs.is_nan() || rhs.is_nan() {
        return FloatBits32::NAN.value();
    }
    if lhs == rhs {
        // Equal operands differ at most in the sign of zero.
        return f32::from_bits(lhs.to_bits() | rhs.to_bits());
    }
    if lhs < rhs { lhs } else { rhs }
}

/// `f32.max`: NaN if either operand is NaN, and `+0 > -0`
#[must_use]
pub fn f32_max(lhs: f32, rhs: f32) -> f32 {
    if lhs.is_nan() || rhs.is_nan() {
        return FloatBits32::NAN.value();
    }
    if lhs == rhs {
        return f32::from_bits(lhs.to_bits() & rhs.to_bits());
    }
    if lhs > rhs { lhs } else { rhs }
}

/// `f64.min`: NaN if either operand is NaN, and `-0 < +0`
#[must_use]
pub fn f64_min(lhs: f64, rhs: f64) -> f64 {
    if lhs.is_nan() || rhs.is_nan() {
        return FloatBits64::NAN.value();
    }
    if lhs == rhs {
        return f64::from_bits(lhs.to_bits() | rhs.to_bits());
    }
    if lhs < rhs { lhs } else { rhs }
}

/// `f64.max`: NaN if either operand is NaN, and `+0 > -0`
#[must_use]
pub fn f64_max(lhs: f64, rhs: f64) -> f64 {
    if lhs.is_nan() || rhs.is_nan() {
        return FloatBits64::NAN.value();
    }
    if lhs == rhs {
        return f64::from_bits(lhs.to_bits() & rhs.to_bits());
    }
    if lhs > rhs { lhs } else { rhs }
}

/// `f32.nearest`: round half to even
#[must_use]
pub fn f32_nearest(value: f32) -> f32 {
    value.round_ties_even()
}

/// `f64.nearest`: round half to even
#[must_use]
pub fn f64_nearest(value: f64) -> f64 {
    value.round_ties_even()
}
