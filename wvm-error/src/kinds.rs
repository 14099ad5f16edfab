// WVM - wvm-error
// Module: Error Kinds
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

use std::borrow::Cow;

use crate::{Error, ErrorCategory};

/// Create a decoding error
pub fn parse_error(code: u16, message: impl Into<Cow<'static, str>>) -> Error {
    Error::with_message(ErrorCategory::Parse, code, message)
}

/// Create a validation error
pub fn validation_error(code: u16, message: impl Into<Cow<'static, str>>) -> Error {
    Error::with_message(ErrorCategory::Validation, code, message)
}

/// Create an import resolution error
pub fn link_error(code: u16, message: impl Into<Cow<'static, str>>) -> Error {
    Error::with_message(ErrorCategory::Link, code, message)
}

/// Create a WebAssembly trap
pub fn trap(code: u16, message: impl Into<Cow<'static, str>>) -> Error {
    Error::with_message(ErrorCategory::RuntimeTrap, code, message)
}

/// Create an embedding/runtime error
pub fn runtime_error(code: u16, message: impl Into<Cow<'static, str>>) -> Error {
    Error::with_message(ErrorCategory::Runtime, code, message)
}
