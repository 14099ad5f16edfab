// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Instance resource limits.

use wvm_format::binary::MAX_PAGES;

/// Limits applied to one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum nesting of wasm function calls
    pub max_call_depth:    usize,
    /// Maximum number of operand stack slots, locals included
    pub max_operand_stack: usize,
    /// Upper bound on linear memory size in pages
    pub max_memory_pages:  u32,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self { max_call_depth: 1024, max_operand_stack: 1 << 20, max_memory_pages: MAX_PAGES }
    }
}

impl VmConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum call depth
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Set maximum operand stack slots
    #[must_use]
    pub fn with_max_operand_stack(mut self, slots: usize) -> Self {
        self.max_operand_stack = slots;
        self
    }

    /// Set maximum memory pages; clamped to the 4 GiB address space
    #[must_use]
    pub fn with_max_memory_pages(mut self, pages: u32) -> Self {
        self.max_memory_pages = pages.min(MAX_PAGES);
        self
    }
}
