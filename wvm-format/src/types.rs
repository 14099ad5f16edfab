// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WebAssembly type definitions.
//!
//! Value types, function signatures, limits and the runtime [`Value`]. A
//! value travels through the operand stack as a raw 64-bit slot; [`Value`]
//! is the typed form used at the host boundary.

use core::fmt;

use wvm_error::{codes, kinds, Result};

use crate::binary::{F32_TYPE, F64_TYPE, I32_TYPE, I64_TYPE};

/// WebAssembly value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// 32-bit integer
    I32,
    /// 64-bit integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl ValueType {
    /// Parse a value type byte
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            I32_TYPE => Ok(Self::I32),
            I64_TYPE => Ok(Self::I64),
            F32_TYPE => Ok(Self::F32),
            F64_TYPE => Ok(Self::F64),
            _ => Err(kinds::parse_error(
                codes::INVALID_VALUE_TYPE,
                format!("invalid value type byte: 0x{byte:02x}"),
            )),
        }
    }

    /// Binary representation of this type
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::I32 => I32_TYPE,
            Self::I64 => I64_TYPE,
            Self::F32 => F32_TYPE,
            Self::F64 => F64_TYPE,
        }
    }

    /// Parse a type token as written in native signatures (`i32`, ...)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "i32" => Some(Self::I32),
            "i64" => Some(Self::I64),
            "f32" => Some(Self::F32),
            "f64" => Some(Self::F64),
            _ => None,
        }
    }

    /// Textual name of this type
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A function signature. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FuncType {
    /// Parameter types
    pub params:  Vec<ValueType>,
    /// Result types
    pub results: Vec<ValueType>,
}

impl FuncType {
    /// Create a new function type
    #[must_use]
    pub fn new(params: Vec<ValueType>, results: Vec<ValueType>) -> Self {
        Self { params, results }
    }
}

fn write_type_list(f: &mut fmt::Formatter<'_>, types: &[ValueType]) -> fmt::Result {
    f.write_str("(")?;
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{ty}")?;
    }
    f.write_str(")")
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type_list(f, &self.params)?;
        f.write_str("->")?;
        write_type_list(f, &self.results)
    }
}

/// Limits for memory page counts and table element counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limits {
    /// Minimum size
    pub min: u32,
    /// Maximum size, if declared
    pub max: Option<u32>,
}

impl Limits {
    /// Create limits
    #[must_use]
    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Whether a maximum is declared
    #[must_use]
    pub const fn has_max(&self) -> bool {
        self.max.is_some()
    }

    /// Import matching: `self` (the provided limits) must be at least as
    /// strict as `required`.
    #[must_use]
    pub fn is_subtype_of(&self, required: &Limits) -> bool {
        if self.min < required.min {
            return false;
        }
        match (self.max, required.max) {
            (_, None) => true,
            (Some(provided), Some(required)) => provided <= required,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for Limits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{{min: {}, max: {}}}", self.min, max),
            None => write!(f, "{{min: {}}}", self.min),
        }
    }
}

/// Table type. The element type is always `funcref`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableType {
    /// Element count limits
    pub limits: Limits,
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "funcref {}", self.limits)
    }
}

/// Global type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalType {
    /// Value type
    pub value_type: ValueType,
    /// Whether the global can be written
    pub mutable:    bool,
}

impl fmt::Display for GlobalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{type: {}, mut: {}}}", self.value_type, self.mutable)
    }
}

/// Block signature of `block`, `loop` and `if`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// No params, no results
    Empty,
    /// No params, one result
    Value(ValueType),
    /// Signature taken from the type section
    TypeIndex(u32),
}

impl BlockType {
    /// Resolve to a full function type against the module's type section
    #[must_use]
    pub fn resolve(&self, types: &[FuncType]) -> Option<FuncType> {
        match *self {
            Self::Empty => Some(FuncType::default()),
            Self::Value(ty) => Some(FuncType::new(Vec::new(), vec![ty])),
            Self::TypeIndex(idx) => types.get(idx as usize).cloned(),
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("()->()"),
            Self::Value(ty) => write!(f, "()->({ty})"),
            Self::TypeIndex(idx) => write!(f, "type[{idx}]"),
        }
    }
}

/// A typed WebAssembly value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
}

impl Value {
    /// Zero value of a type
    #[must_use]
    pub const fn default_for(ty: ValueType) -> Self {
        match ty {
            ValueType::I32 => Self::I32(0),
            ValueType::I64 => Self::I64(0),
            ValueType::F32 => Self::F32(0.0),
            ValueType::F64 => Self::F64(0.0),
        }
    }

    /// Type of this value
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::I32(_) => ValueType::I32,
            Self::I64(_) => ValueType::I64,
            Self::F32(_) => ValueType::F32,
            Self::F64(_) => ValueType::F64,
        }
    }

    /// Encode as an operand stack slot. 32-bit values are zero-extended.
    #[must_use]
    pub fn to_bits(&self) -> u64 {
        match *self {
            Self::I32(v) => u64::from(v as u32),
            Self::I64(v) => v as u64,
            Self::F32(v) => u64::from(v.to_bits()),
            Self::F64(v) => v.to_bits(),
        }
    }

    /// Decode an operand stack slot as `ty`
    #[must_use]
    pub fn from_bits(ty: ValueType, bits: u64) -> Self {
        match ty {
            ValueType::I32 => Self::I32(bits as u32 as i32),
            ValueType::I64 => Self::I64(bits as i64),
            ValueType::F32 => Self::F32(f32::from_bits(bits as u32)),
            ValueType::F64 => Self::F64(f64::from_bits(bits)),
        }
    }

    /// Get the i32 payload
    #[must_use]
    pub const fn as_i32(&self) -> Option<i32> {
        match *self {
            Self::I32(v) => Some(v),
            _ => None,
        }
    }

    /// Get the i64 payload
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Get the f32 payload
    #[must_use]
    pub const fn as_f32(&self) -> Option<f32> {
        match *self {
            Self::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Get the f64 payload
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Parse a textual literal of the given type (`42`, `-1.5`, `nan`)
    pub fn parse(ty: ValueType, text: &str) -> Result<Self> {
        let bad = || {
            kinds::runtime_error(codes::ARGUMENT_MISMATCH, format!("cannot parse {text:?} as {ty}"))
        };
        Ok(match ty {
            ValueType::I32 => Self::I32(text.parse::<i32>().or_else(|_| text.parse::<u32>().map(|v| v as i32)).map_err(|_| bad())?),
            ValueType::I64 => Self::I64(text.parse::<i64>().or_else(|_| text.parse::<u64>().map(|v| v as i64)).map_err(|_| bad())?),
            ValueType::F32 => Self::F32(text.parse::<f32>().map_err(|_| bad())?),
            ValueType::F64 => Self::F64(text.parse::<f64>().map_err(|_| bad())?),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I32(v) => write!(f, "{v}:i32"),
            Self::I64(v) => write!(f, "{v}:i64"),
            Self::F32(v) => write!(f, "{v}:f32"),
            Self::F64(v) => write!(f, "{v}:f64"),
        }
    }
}
