// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Linear memory instances.
//!
//! A memory is a byte vector whose length is always a whole number of
//! 64 KiB pages. Instances are handed out as [`MemoryRef`] handles so an
//! exported memory and its importers observe the same bytes.

use core::cell::RefCell;
use std::rc::Rc;

use log::debug;
use wvm_error::{Result, codes, kinds};
use wvm_format::{binary::PAGE_SIZE, types::Limits};
use wvm_host::{Memory, MemoryRef};

/// A module-owned linear memory
#[derive(Debug)]
pub struct MemoryInstance {
    limits:    Limits,
    data:      Vec<u8>,
    max_pages: u32,
}

impl MemoryInstance {
    /// Allocate `limits.min` zeroed pages
    ///
    /// # Arguments
    ///
    /// * `limits` - Declared page limits
    /// * `max_pages` - Instance-wide bound from the configuration
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_LIMIT_EXCEEDED` if the initial size is above
    /// `max_pages`
    pub fn new(limits: Limits, max_pages: u32) -> Result<Self> {
        if limits.min > max_pages {
            return Err(kinds::runtime_error(
                codes::RESOURCE_LIMIT_EXCEEDED,
                format!("memory needs {} pages, limit is {max_pages}", limits.min),
            ));
        }
        debug!("allocating memory {limits}");
        Ok(Self { limits, data: vec![0; pages_to_bytes(limits.min)], max_pages })
    }

    /// Wrap as a shared handle
    #[must_use]
    pub fn into_ref(self) -> MemoryRef {
        Rc::new(RefCell::new(self))
    }

    /// Current size in bytes
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.data.len()
    }

    /// Raw contents
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn range(&self, offset: u64, len: usize) -> Result<core::ops::Range<usize>> {
        let end = offset.checked_add(len as u64).filter(|end| *end <= self.data.len() as u64);
        match end {
            Some(end) => Ok(offset as usize..end as usize),
            None => Err(kinds::trap(
                codes::MEMORY_OUT_OF_BOUNDS,
                format!(
                    "out of bounds memory access: {len} bytes at {offset} in memory of {} bytes",
                    self.data.len()
                ),
            )),
        }
    }
}

fn pages_to_bytes(pages: u32) -> usize {
    pages as usize * PAGE_SIZE
}

impl Memory for MemoryInstance {
    fn limits(&self) -> Limits {
        self.limits
    }

    fn size(&self) -> u32 {
        (self.data.len() / PAGE_SIZE) as u32
    }

    /// Grow by `delta` pages
    ///
    /// # Returns
    ///
    /// The previous number of pages
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_LIMIT_EXCEEDED` if the new size is above the
    /// declared maximum or the configured bound
    fn grow(&mut self, delta: u32) -> Result<u32> {
        let old = self.size();
        let max = self.limits.max.unwrap_or(u32::MAX).min(self.max_pages);
        let new = old.checked_add(delta).filter(|new| *new <= max).ok_or_else(|| {
            kinds::runtime_error(
                codes::RESOURCE_LIMIT_EXCEEDED,
                format!("cannot grow memory from {old} by {delta} pages, maximum is {max}"),
            )
        })?;
        self.data.resize(pages_to_bytes(new), 0);
        Ok(old)
    }

    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let range = self.range(offset, buf.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let range = self.range(offset, data.len())?;
        self.data[range].copy_from_slice(data);
        Ok(())
    }
}
