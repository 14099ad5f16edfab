// WVM - wvm-error
// Module: Error Context
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

use core::fmt::Display;

use crate::{Error, Result};

/// Attach positional context to the error side of a `Result`.
pub trait ResultExt<T> {
    /// Prefix the error message with `context`
    fn context<C: Display>(self, context: C) -> Result<T>;

    /// Prefix the error message with a lazily built context
    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T>;
}

impl<T> ResultExt<T> for core::result::Result<T, Error> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.map_err(|e| e.context(f()))
    }
}
