// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Control frames.

use wvm_format::instructions::Expr;

/// What opened a control frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// `block`
    Block,
    /// `loop`; branching to it restarts the body
    Loop,
    /// `if`, running whichever arm was selected
    If,
    /// A wasm function activation
    Call,
}

/// One active block, loop, if or call scope
#[derive(Debug, Clone)]
pub struct ControlFrame {
    /// Frame kind
    pub kind:    FrameKind,
    /// Instructions being executed
    pub body:    Expr,
    /// Index of the next instruction in `body`
    pub pc:      usize,
    /// Operand stack height where the frame's parameters start. For calls
    /// this is the first local slot.
    pub base:    usize,
    /// Number of parameters
    pub params:  usize,
    /// Number of results
    pub results: usize,
    /// Caller's first local slot, restored when a call frame exits
    pub saved_local0: usize,
}

impl ControlFrame {
    /// Frame for a block, loop or if arm
    #[must_use]
    pub fn block(kind: FrameKind, body: Expr, base: usize, params: usize, results: usize) -> Self {
        Self { kind, body, pc: 0, base, params, results, saved_local0: 0 }
    }

    /// Frame for a function activation
    #[must_use]
    pub fn call(body: Expr, base: usize, params: usize, results: usize, saved_local0: usize) -> Self {
        Self { kind: FrameKind::Call, body, pc: 0, base, params, results, saved_local0 }
    }

    /// Values a branch to this frame carries: parameters for loops,
    /// results otherwise
    #[must_use]
    pub fn branch_arity(&self) -> usize {
        if self.kind == FrameKind::Loop { self.params } else { self.results }
    }

    /// Whether every instruction has run
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.pc >= self.body.len()
    }
}
