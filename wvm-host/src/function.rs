// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Host function closures.

use std::rc::Rc;

use wvm_error::Result;
use wvm_format::types::Value;

use crate::linker::Module;

/// A host callback: receives the calling module and the arguments
pub trait HostFn {
    /// Call the function
    fn call(&self, caller: &mut dyn Module, args: &[Value]) -> Result<Vec<Value>>;
}

impl<F> HostFn for F
where
    F: Fn(&mut dyn Module, &[Value]) -> Result<Vec<Value>>,
{
    fn call(&self, caller: &mut dyn Module, args: &[Value]) -> Result<Vec<Value>> {
        self(caller, args)
    }
}

/// Cloneable handle to a host callback
#[derive(Clone)]
pub struct HostFunctionHandler(Rc<dyn HostFn>);

impl HostFunctionHandler {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn Module, &[Value]) -> Result<Vec<Value>> + 'static,
    {
        Self(Rc::new(f))
    }

    /// Call the wrapped closure
    pub fn call(&self, caller: &mut dyn Module, args: &[Value]) -> Result<Vec<Value>> {
        self.0.call(caller, args)
    }
}

impl core::fmt::Debug for HostFunctionHandler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("HostFunctionHandler")
    }
}
