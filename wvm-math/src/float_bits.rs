// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Float values compared and hashed by bit pattern.
//!
//! Operand stack slots and globals hold raw bits, so two floats are the same
//! value only when their bits match. `NaN == NaN` holds here when the
//! payloads agree and `-0.0 != +0.0`.

use core::hash::{Hash, Hasher};

/// f32 compared by bit pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct FloatBits32(pub u32);

impl FloatBits32 {
    /// Canonical `NaN`: sign 0, exponent all ones, quiet bit set.
    pub const NAN: Self = FloatBits32(0x7fc0_0000);

    /// Sign bit mask
    pub const SIGN_MASK: u32 = 0x8000_0000;

    /// Creates a new `FloatBits32` from an `f32` value.
    #[must_use]
    pub fn from_float(val: f32) -> Self {
        Self(val.to_bits())
    }

    /// Returns the `f32` value represented by this `FloatBits32`.
    #[must_use]
    pub const fn value(self) -> f32 {
        f32::from_bits(self.0)
    }

    /// Returns the underlying bits.
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Whether the bits encode the canonical `NaN` of either sign
    #[must_use]
    pub const fn is_canonical_nan(self) -> bool {
        self.0 & !Self::SIGN_MASK == Self::NAN.0
    }
}

impl Hash for FloatBits32 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl From<f32> for FloatBits32 {
    fn from(val: f32) -> Self {
        Self::from_float(val)
    }
}

/// f64 compared by bit pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct FloatBits64(pub u64);

impl FloatBits64 {
    /// Canonical `NaN`: sign 0, exponent all ones, quiet bit set.
    pub const NAN: Self = FloatBits64(0x7ff8_0000_0000_0000);

    /// Sign bit mask
    pub const SIGN_MASK: u64 = 0x8000_0000_0000_0000;

    /// Creates a new `FloatBits64` from an `f64` value.
    #[must_use]
    pub fn from_float(val: f64) -> Self {
        Self(val.to_bits())
    }

    /// Returns the `f64` value represented by this `FloatBits64`.
    #[must_use]
    pub const fn value(self) -> f64 {
        f64::from_bits(self.0)
    }

    /// Returns the underlying bits.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Whether the bits encode the canonical `NaN` of either sign
    #[must_use]
    pub const fn is_canonical_nan(self) -> bool {
        self.0 & !Self::SIGN_MASK == Self::NAN.0
    }
}

impl Hash for FloatBits64 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl From<f64> for FloatBits64 {
    fn from(val: f64) -> Self {
        Self::from_float(val)
    }
}
