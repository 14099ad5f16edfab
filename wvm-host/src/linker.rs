// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The linker contract.
//!
//! Imports are resolved against capabilities rather than concrete types:
//! anything that can be called with a signature is a [`Function`], anything
//! with typed get/set is a [`Global`], and so on. A [`Module`] bundles named
//! members. Host registries and instantiated wasm modules both implement
//! [`Module`], so either can satisfy another module's imports.

use core::{any::Any, cell::RefCell, fmt};
use std::{collections::HashMap, rc::Rc};

use wvm_error::{Result, codes, kinds};
use wvm_format::{
    module::ExternalKind,
    types::{FuncType, GlobalType, Limits, TableType, Value},
};

/// A callable with a fixed signature
pub trait Function {
    /// Signature of the function
    fn func_type(&self) -> &FuncType;

    /// Call with already type-checked arguments. `caller` is the module the
    /// call comes from; hosts may call back into it.
    fn call(&self, caller: &mut dyn Module, args: &[Value]) -> Result<Vec<Value>>;

    /// Downcasting hook, used by instances to recognise their own functions
    fn as_any(&self) -> &dyn Any;
}

/// A typed, possibly mutable value cell
pub trait Global {
    /// Declared type
    fn global_type(&self) -> GlobalType;

    /// Current value
    fn get(&self) -> Value;

    /// Replace the value; fails for immutable globals and wrong types
    fn set(&mut self, value: Value) -> Result<()>;
}

/// A linear memory measured in 64 KiB pages
pub trait Memory {
    /// Declared limits
    fn limits(&self) -> Limits;

    /// Current size in pages
    fn size(&self) -> u32;

    /// Grow by `delta` pages, returning the previous size in pages
    fn grow(&mut self, delta: u32) -> Result<u32>;

    /// Copy `buf.len()` bytes starting at `offset` into `buf`
    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Copy `data` into memory starting at `offset`
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<()>;
}

/// A table of function references
pub trait Table {
    /// Declared type
    fn table_type(&self) -> TableType;

    /// Current number of slots
    fn size(&self) -> u32;

    /// Append `delta` empty slots, returning the previous size
    fn grow(&mut self, delta: u32) -> Result<u32>;

    /// Element at `index`; `None` for an empty slot
    fn get(&self, index: u32) -> Result<Option<FuncRef>>;

    /// Replace the element at `index`
    fn set(&mut self, index: u32, func: Option<FuncRef>) -> Result<()>;
}

/// Shared function handle
pub type FuncRef = Rc<dyn Function>;
/// Shared global handle
pub type GlobalRef = Rc<RefCell<dyn Global>>;
/// Shared memory handle
pub type MemoryRef = Rc<RefCell<dyn Memory>>;
/// Shared table handle
pub type TableRef = Rc<RefCell<dyn Table>>;

/// A named member of a [`Module`]
#[derive(Clone)]
pub enum Member {
    /// Function
    Func(FuncRef),
    /// Global
    Global(GlobalRef),
    /// Memory
    Memory(MemoryRef),
    /// Table
    Table(TableRef),
}

impl Member {
    /// Kind of the member
    #[must_use]
    pub fn kind(&self) -> ExternalKind {
        match self {
            Self::Func(_) => ExternalKind::Func,
            Self::Global(_) => ExternalKind::Global,
            Self::Memory(_) => ExternalKind::Memory,
            Self::Table(_) => ExternalKind::Table,
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Func(func) => write!(f, "Func({})", func.func_type()),
            Self::Global(global) => write!(f, "Global({})", global.borrow().global_type()),
            Self::Memory(memory) => write!(f, "Memory({})", memory.borrow().limits()),
            Self::Table(table) => write!(f, "Table({})", table.borrow().table_type()),
        }
    }
}

/// A bundle of named members that can satisfy imports
pub trait Module {
    /// Look up a member by name
    fn get_member(&self, name: &str) -> Option<Member>;

    /// Call the function member `name`
    fn invoke_func(&mut self, name: &str, args: &[Value]) -> Result<Vec<Value>>;

    /// Read the global member `name`
    fn get_global(&self, name: &str) -> Result<Value>;

    /// Write the global member `name`
    fn set_global(&mut self, name: &str, value: Value) -> Result<()>;
}

/// Modules available for import resolution, keyed by module name
pub type Externals = HashMap<String, Box<dyn Module>>;

/// Check call arguments against a signature
pub fn check_args(ty: &FuncType, args: &[Value]) -> Result<()> {
    if args.len() != ty.params.len() {
        return Err(kinds::runtime_error(
            codes::ARGUMENT_MISMATCH,
            format!("expected {} arguments for {ty}, got {}", ty.params.len(), args.len()),
        ));
    }
    for (i, (arg, expected)) in args.iter().zip(&ty.params).enumerate() {
        if arg.value_type() != *expected {
            return Err(kinds::runtime_error(
                codes::ARGUMENT_MISMATCH,
                format!("argument {i} has type {}, expected {expected}", arg.value_type()),
            ));
        }
    }
    Ok(())
}

/// Check host results against a signature
pub fn check_results(ty: &FuncType, results: &[Value]) -> Result<()> {
    let matches = results.len() == ty.results.len()
        && results.iter().zip(&ty.results).all(|(v, t)| v.value_type() == *t);
    if matches {
        Ok(())
    } else {
        let actual: Vec<String> = results.iter().map(|v| v.value_type().to_string()).collect();
        Err(kinds::runtime_error(
            codes::HOST_FUNCTION_FAILED,
            format!("host function returned ({}) for {ty}", actual.join(",")),
        ))
    }
}

/// Missing-export error shared by [`Module`] implementations
pub fn export_not_found(kind: &str, name: &str) -> wvm_error::Error {
    kinds::runtime_error(codes::EXPORT_NOT_FOUND, format!("{kind} export {name:?} not found"))
}
