// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Function table entries.

use core::{any::Any, cell::RefCell};
use std::rc::Weak;

use wvm_error::{Result, codes, kinds};
use wvm_format::{instructions::Expr, types::{FuncType, Value}};
use wvm_host::{FuncRef, Function, Module};

use crate::vm::Vm;

/// An entry of an instance's function index space
#[derive(Clone)]
pub enum Func {
    /// Defined by the module: runs on the instance's own stacks
    Internal {
        /// Signature
        ty:          FuncType,
        /// Number of declared locals, excluding parameters
        local_count: usize,
        /// Body
        body:        Expr,
    },
    /// Imported: called through the linker contract
    External(FuncRef),
}

impl Func {
    /// Signature of the function
    #[must_use]
    pub fn func_type(&self) -> &FuncType {
        match self {
            Self::Internal { ty, .. } => ty,
            Self::External(func) => func.func_type(),
        }
    }
}

/// Handle to a function of an instance, as exported or stored in a table
pub struct VmFunc {
    pub(crate) ty:    FuncType,
    pub(crate) index: u32,
    pub(crate) owner: Weak<RefCell<Vm>>,
}

impl VmFunc {
    /// Index in the owning instance's function index space
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl Function for VmFunc {
    fn func_type(&self) -> &FuncType {
        &self.ty
    }

    fn call(&self, _caller: &mut dyn Module, args: &[Value]) -> Result<Vec<Value>> {
        let owner = self
            .owner
            .upgrade()
            .ok_or_else(|| kinds::runtime_error(codes::INSTANCE_UNAVAILABLE, "owning instance was dropped"))?;
        let mut vm = owner.try_borrow_mut().map_err(|_| {
            kinds::runtime_error(
                codes::INSTANCE_UNAVAILABLE,
                format!("cannot call func[{}]: owning instance is already executing", self.index),
            )
        })?;
        vm.invoke_index(self.index, args)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
