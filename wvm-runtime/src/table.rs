// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Function tables.

use core::{cell::RefCell, fmt};
use std::rc::Rc;

use wvm_error::{Result, codes, kinds};
use wvm_format::types::TableType;
use wvm_host::{FuncRef, Table, TableRef};

/// A module-owned table of function references
pub struct TableInstance {
    ty:       TableType,
    elements: Vec<Option<FuncRef>>,
}

impl TableInstance {
    /// Allocate `ty.limits.min` empty slots
    #[must_use]
    pub fn new(ty: TableType) -> Self {
        Self { ty, elements: vec![None; ty.limits.min as usize] }
    }

    /// Wrap as a shared handle
    #[must_use]
    pub fn into_ref(self) -> TableRef {
        Rc::new(RefCell::new(self))
    }

    fn out_of_bounds(&self, index: u32) -> wvm_error::Error {
        kinds::trap(
            codes::TABLE_OUT_OF_BOUNDS,
            format!("table index {index} out of bounds for table of size {}", self.elements.len()),
        )
    }
}

impl Table for TableInstance {
    fn table_type(&self) -> TableType {
        self.ty
    }

    fn size(&self) -> u32 {
        self.elements.len() as u32
    }

    fn grow(&mut self, delta: u32) -> Result<u32> {
        let old = self.size();
        let max = self.ty.limits.max.unwrap_or(u32::MAX);
        let new = old.checked_add(delta).filter(|new| *new <= max).ok_or_else(|| {
            kinds::runtime_error(
                codes::RESOURCE_LIMIT_EXCEEDED,
                format!("cannot grow table from {old} by {delta}, maximum is {max}"),
            )
        })?;
        self.elements.resize(new as usize, None);
        Ok(old)
    }

    fn get(&self, index: u32) -> Result<Option<FuncRef>> {
        self.elements.get(index as usize).cloned().ok_or_else(|| self.out_of_bounds(index))
    }

    fn set(&mut self, index: u32, func: Option<FuncRef>) -> Result<()> {
        let err = self.out_of_bounds(index);
        let slot = self.elements.get_mut(index as usize).ok_or(err)?;
        *slot = func;
        Ok(())
    }
}

impl fmt::Debug for TableInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled = self.elements.iter().filter(|e| e.is_some()).count();
        f.debug_struct("TableInstance").field("type", &self.ty).field("size", &self.elements.len()).field("filled", &filled).finish()
    }
}
