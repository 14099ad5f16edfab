// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

use wvm_error::Result;

use crate::vm::Vm;

impl Vm {
    pub(super) fn exec_drop(&mut self) -> Result<()> {
        self.stack.pop().map(drop)
    }

    /// `select`: keep the first operand if the condition is non-zero
    pub(super) fn exec_select(&mut self) -> Result<()> {
        let cond = self.stack.pop_u32()?;
        let second = self.stack.pop()?;
        let first = self.stack.pop()?;
        self.stack.push(if cond != 0 { first } else { second })
    }
}
