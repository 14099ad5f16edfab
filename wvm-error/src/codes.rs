// WVM - wvm-error
// Module: Error Codes
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error codes for wvm

// Parse error codes (1000-1099)
/// Module does not start with `\0asm`
pub const BAD_MAGIC: u16 = 1000;
/// Module version is not 1
pub const BAD_VERSION: u16 = 1001;
/// Input ended in the middle of a value
pub const UNEXPECTED_EOF: u16 = 1002;
/// Varint needs more bits than its declared width
pub const LEB128_OVERFLOW: u16 = 1003;
/// Non-custom sections are not in strictly increasing order
pub const MALFORMED_SECTION_ORDER: u16 = 1004;
/// A section's payload does not match its declared byte length
pub const SECTION_SIZE_MISMATCH: u16 = 1005;
/// Section ID outside 0..=11
pub const UNKNOWN_SECTION: u16 = 1006;
/// Opcode byte (or 0xFC sub-opcode) not in the supported set
pub const UNKNOWN_OPCODE: u16 = 1007;
/// Value type tag is not i32/i64/f32/f64
pub const INVALID_VALUE_TYPE: u16 = 1008;
/// Block type is neither empty, a value type nor a type index
pub const INVALID_BLOCK_TYPE: u16 = 1009;
/// Name is not valid UTF-8
pub const INVALID_UTF8: u16 = 1010;
/// Limits flag is not 0 or 1
pub const MALFORMED_LIMITS: u16 = 1011;
/// Import or export descriptor tag is unknown
pub const INVALID_EXTERNAL_KIND: u16 = 1012;
/// Table element type is not `funcref`
pub const INVALID_ELEMENT_TYPE: u16 = 1013;
/// Reserved immediate byte is not zero
pub const ZERO_BYTE_EXPECTED: u16 = 1014;
/// Global mutability flag is not 0 or 1
pub const INVALID_MUTABILITY: u16 = 1015;
/// Declared local count does not fit in 32 bits
pub const TOO_MANY_LOCALS: u16 = 1016;
/// Function type does not start with 0x60
pub const INVALID_FUNC_TYPE: u16 = 1017;
/// Reading the module from disk failed
pub const IO_ERROR: u16 = 1018;
/// Bytes remain after an `end` that closes a function body
pub const TRAILING_BYTES: u16 = 1019;

// Validation error codes (2000-2099)
/// Operand type does not match the expected type
pub const TYPE_MISMATCH: u16 = 2000;
/// Operand stack height differs from the frame's expected height
pub const STACK_HEIGHT_MISMATCH: u16 = 2001;
/// Type index out of range
pub const INVALID_TYPE_INDEX: u16 = 2002;
/// Function index out of range
pub const INVALID_FUNCTION_INDEX: u16 = 2003;
/// Table index out of range, or no table declared
pub const INVALID_TABLE_INDEX: u16 = 2004;
/// Memory index out of range, or no memory declared
pub const INVALID_MEMORY_INDEX: u16 = 2005;
/// Global index out of range
pub const INVALID_GLOBAL_INDEX: u16 = 2006;
/// Local index out of range
pub const INVALID_LOCAL_INDEX: u16 = 2007;
/// Branch depth exceeds the control stack
pub const INVALID_LABEL_INDEX: u16 = 2008;
/// More than one table in the module
pub const MULTIPLE_TABLES: u16 = 2009;
/// More than one memory in the module
pub const MULTIPLE_MEMORIES: u16 = 2010;
/// Limits with min > max or above the allowed range
pub const INVALID_LIMITS: u16 = 2011;
/// Two exports share a name
pub const DUPLICATE_EXPORT: u16 = 2012;
/// Initializer is not a constant expression
pub const CONSTANT_EXPRESSION_REQUIRED: u16 = 2013;
/// Alignment larger than the natural alignment of the access
pub const INVALID_ALIGNMENT: u16 = 2014;
/// Start function has parameters or results
pub const INVALID_START_FUNCTION: u16 = 2015;
/// `global.set` on an immutable global
pub const IMMUTABLE_GLOBAL: u16 = 2016;
/// Function and code sections declare different counts
pub const FUNCTION_CODE_MISMATCH: u16 = 2017;
/// `br_table` targets disagree on their label types
pub const BR_TABLE_ARITY_MISMATCH: u16 = 2018;

// Link error codes (3000-3099)
/// No external module registered under the import's module name
pub const UNKNOWN_IMPORT_MODULE: u16 = 3000;
/// External module has no member with the import's name
pub const UNKNOWN_IMPORT: u16 = 3001;
/// Resolved member has the wrong kind or type
pub const INCOMPATIBLE_IMPORT_TYPE: u16 = 3002;

// Runtime trap codes (4000-4099)
/// `unreachable` executed
pub const UNREACHABLE: u16 = 4000;
/// Integer division or remainder by zero
pub const DIVISION_BY_ZERO: u16 = 4001;
/// Integer overflow (signed division of MIN by -1, truncation out of range)
pub const INTEGER_OVERFLOW: u16 = 4002;
/// Truncation of NaN to an integer
pub const INVALID_CONVERSION_TO_INTEGER: u16 = 4003;
/// Linear memory access outside the current size
pub const MEMORY_OUT_OF_BOUNDS: u16 = 4004;
/// Table access outside the current size
pub const TABLE_OUT_OF_BOUNDS: u16 = 4005;
/// Table slot holds no function
pub const UNINITIALIZED_ELEMENT: u16 = 4006;
/// `call_indirect` callee signature differs from the declared type
pub const INDIRECT_CALL_TYPE_MISMATCH: u16 = 4007;
/// Operand stack popped below the active frame
pub const STACK_UNDERFLOW: u16 = 4008;
/// Operand stack grew past the configured limit
pub const STACK_OVERFLOW: u16 = 4009;
/// Call depth grew past the configured limit
pub const CALL_STACK_EXHAUSTED: u16 = 4010;
/// Function index not present in the function table
pub const UNDEFINED_FUNCTION: u16 = 4011;
/// Global written with the wrong type or while immutable
pub const INVALID_GLOBAL_ACCESS: u16 = 4012;
/// Memory or table instruction without an instantiated memory or table
pub const MISSING_INSTANCE: u16 = 4013;

// Host error codes (5000-5099)
/// Native signature string does not parse
pub const INVALID_SIGNATURE: u16 = 5000;
/// No export with the requested name and kind
pub const EXPORT_NOT_FOUND: u16 = 5001;
/// Invocation arguments do not match the function signature
pub const ARGUMENT_MISMATCH: u16 = 5002;
/// Host function reported a failure
pub const HOST_FUNCTION_FAILED: u16 = 5003;
/// Member name registered twice on a native module
pub const DUPLICATE_MEMBER: u16 = 5004;
/// Owning instance was dropped or is already executing
pub const INSTANCE_UNAVAILABLE: u16 = 5005;
/// Instance would exceed a configured resource limit
pub const RESOURCE_LIMIT_EXCEEDED: u16 = 5006;
