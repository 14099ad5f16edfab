// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Shared handle to an instantiated module.

use core::{cell::RefCell, fmt};
use std::rc::Rc;

use log::debug;
use wvm_decoder::validate_module;
use wvm_error::{Result, codes, kinds};
use wvm_format::{
    module::{ExternalKind, Module},
    types::Value,
};
use wvm_host::{Externals, Member, MemoryRef, Module as HostModule};

use crate::{config::VmConfig, vm::Vm};

/// An instantiated module.
///
/// Cloning yields another handle to the same instance, so a module can be
/// placed in [`Externals`] to satisfy the imports of later instantiations
/// while the embedder keeps using it.
#[derive(Clone)]
pub struct RuntimeModule {
    vm: Rc<RefCell<Vm>>,
}

impl RuntimeModule {
    /// Validate `module`, resolve its imports against `externals`,
    /// initialize its index spaces and run its start function
    pub fn instantiate(module: Module, externals: &Externals, config: VmConfig) -> Result<Self> {
        validate_module(&module)?;
        debug!(
            "instantiating module: {} functions, {} imports, {} exports",
            module.func_count(),
            module.imports.len(),
            module.exports.len()
        );
        let vm = Rc::new_cyclic(|weak| RefCell::new(Vm::new(module, config, weak.clone())));
        vm.try_borrow_mut().map_err(|_| busy())?.instantiate(externals)?;
        Ok(Self { vm })
    }

    /// Call the exported function `name`
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Vec<Value>> {
        self.vm.try_borrow_mut().map_err(|_| busy())?.invoke(name, args)
    }

    /// Look up an export
    #[must_use]
    pub fn get_member(&self, name: &str) -> Option<Member> {
        self.vm.try_borrow().ok()?.get_member(name)
    }

    /// Export names and kinds in declaration order
    #[must_use]
    pub fn exports(&self) -> Vec<(String, ExternalKind)> {
        self.vm
            .try_borrow()
            .map(|vm| vm.module().exports.iter().map(|e| (e.name.clone(), e.desc.kind)).collect())
            .unwrap_or_default()
    }

    /// The instance's memory, if it has one
    #[must_use]
    pub fn memory(&self) -> Option<MemoryRef> {
        self.vm.try_borrow().ok()?.memory()
    }

    /// Run `f` with exclusive access to the underlying [`Vm`]
    pub fn with_vm<R>(&self, f: impl FnOnce(&mut Vm) -> R) -> Result<R> {
        let mut vm = self.vm.try_borrow_mut().map_err(|_| busy())?;
        Ok(f(&mut *vm))
    }
}

fn busy() -> wvm_error::Error {
    kinds::runtime_error(codes::INSTANCE_UNAVAILABLE, "instance is already executing")
}

impl HostModule for RuntimeModule {
    fn get_member(&self, name: &str) -> Option<Member> {
        self.vm.try_borrow().ok()?.get_member(name)
    }

    fn invoke_func(&mut self, name: &str, args: &[Value]) -> Result<Vec<Value>> {
        self.invoke(name, args)
    }

    fn get_global(&self, name: &str) -> Result<Value> {
        self.vm.try_borrow().map_err(|_| busy())?.get_global(name)
    }

    fn set_global(&mut self, name: &str, value: Value) -> Result<()> {
        self.vm.try_borrow_mut().map_err(|_| busy())?.set_global(name, value)
    }
}

impl fmt::Debug for RuntimeModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeModule").field("exports", &self.exports()).finish()
    }
}
