// WVM - wvm-error
// Module: Error Types
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

use std::{borrow::Cow, fmt};

use crate::codes;

/// `Error` categories for wvm operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCategory {
    /// Validation errors
    Validation  = 5,
    /// Runtime errors raised by the embedding layer (host functions, invoke)
    Runtime     = 7,
    /// Binary decoding errors
    Parse       = 10,
    /// WebAssembly trap errors (specific runtime errors defined by Wasm spec)
    RuntimeTrap = 13,
    /// Import resolution errors during instantiation
    Link        = 14,
    /// I/O errors
    Io          = 20,
}

impl ErrorCategory {
    /// Category implied by a code range
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        match code {
            codes::IO_ERROR => Self::Io,
            1000..=1999 => Self::Parse,
            2000..=2999 => Self::Validation,
            3000..=3999 => Self::Link,
            4000..=4999 => Self::RuntimeTrap,
            _ => Self::Runtime,
        }
    }
}

/// wvm `Error` type
///
/// Categorized error with a numeric code and a message. Messages built at
/// runtime carry positional context (section, function, instruction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// `Error` category
    pub category: ErrorCategory,
    /// `Error` code
    pub code:     u16,
    /// `Error` message
    pub message:  Cow<'static, str>,
}

impl Error {
    /// Create a new error with a static message
    #[must_use]
    pub const fn new(category: ErrorCategory, code: u16, message: &'static str) -> Self {
        Self { category, code, message: Cow::Borrowed(message) }
    }

    /// Create a new error with an owned or formatted message
    #[must_use]
    pub fn with_message(
        category: ErrorCategory,
        code: u16,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self { category, code, message: message.into() }
    }

    /// Create an error whose category is derived from the code range
    #[must_use]
    pub fn from_code(code: u16, message: impl Into<Cow<'static, str>>) -> Self {
        Self::with_message(ErrorCategory::from_code(code), code, message)
    }

    /// Prefix the message with positional context
    #[must_use]
    pub fn context(mut self, context: impl fmt::Display) -> Self {
        self.message = Cow::Owned(format!("{context}: {}", self.message));
        self
    }

    /// Check if this is a decoding error
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        self.category == ErrorCategory::Parse
    }

    /// Check if this is a validation error
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        self.category == ErrorCategory::Validation
    }

    /// Check if this is an import resolution error
    #[must_use]
    pub fn is_link_error(&self) -> bool {
        self.category == ErrorCategory::Link
    }

    /// Check if this is a WebAssembly trap
    #[must_use]
    pub fn is_trap(&self) -> bool {
        self.category == ErrorCategory::RuntimeTrap
    }

    /// Check if this is an embedding/runtime error
    #[must_use]
    pub fn is_runtime_error(&self) -> bool {
        self.category == ErrorCategory::Runtime
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}][E{:04X}] {}", self.category, self.code, self.message)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::with_message(ErrorCategory::Io, codes::IO_ERROR, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(codes::BAD_MAGIC), ErrorCategory::Parse);
        assert_eq!(ErrorCategory::from_code(codes::IO_ERROR), ErrorCategory::Io);
        assert_eq!(ErrorCategory::from_code(codes::DUPLICATE_EXPORT), ErrorCategory::Validation);
        assert_eq!(ErrorCategory::from_code(codes::UNKNOWN_IMPORT), ErrorCategory::Link);
        assert_eq!(ErrorCategory::from_code(codes::UNREACHABLE), ErrorCategory::RuntimeTrap);
        assert_eq!(ErrorCategory::from_code(codes::EXPORT_NOT_FOUND), ErrorCategory::Runtime);
    }

    #[test]
    fn test_display_format() {
        let err = Error::new(ErrorCategory::RuntimeTrap, codes::DIVISION_BY_ZERO, "integer divide by zero");
        assert_eq!(err.to_string(), "[RuntimeTrap][E0FA1] integer divide by zero");
    }

    #[test]
    fn test_context_nests_outermost_first() {
        let err = Error::new(ErrorCategory::Parse, codes::UNEXPECTED_EOF, "unexpected end")
            .context("offset 12")
            .context("code section");
        assert_eq!(err.message, "code section: offset 12: unexpected end");
        assert!(err.is_parse_error());
        assert!(!err.is_trap());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.wasm");
        let err = Error::from(io);
        assert_eq!(err.category, ErrorCategory::Io);
        assert_eq!(err.code, codes::IO_ERROR);
    }
}
