// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Native module registry.
//!
//! Host functions are registered with a compact signature string such as
//! `"add(i32,i32)->(i32)"`. The name before the parenthesis becomes the
//! member name, the lists declare parameter and result types.

use core::{any::Any, cell::RefCell, fmt};
use std::{collections::BTreeMap, rc::Rc};

use log::{debug, trace};
use wvm_error::{Result, codes, kinds};
use wvm_format::types::{FuncType, GlobalType, Value, ValueType};

use crate::{
    function::HostFunctionHandler,
    linker::{self, Function, Global, GlobalRef, Member, Module},
};

/// Parse `"name(t,...)->(t,...)"` into a member name and signature
pub fn parse_signature(text: &str) -> Result<(String, FuncType)> {
    let bad = |why: String| kinds::runtime_error(codes::INVALID_SIGNATURE, format!("invalid signature {text:?}: {why}"));

    let (name, rest) = text.trim().split_once('(').ok_or_else(|| bad("missing parameter list".into()))?;
    let name = name.trim();
    if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c == ')' || c == '-') {
        return Err(bad(format!("bad function name {name:?}")));
    }
    let (params, rest) = rest.split_once(')').ok_or_else(|| bad("unterminated parameter list".into()))?;
    let results = rest
        .trim_start()
        .strip_prefix("->")
        .ok_or_else(|| bad("expected `->` after parameters".into()))?
        .trim()
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| bad("results must be a parenthesised list".into()))?;

    let params = parse_type_list(params).map_err(&bad)?;
    let results = parse_type_list(results).map_err(&bad)?;
    Ok((name.to_string(), FuncType::new(params, results)))
}

fn parse_type_list(list: &str) -> core::result::Result<Vec<ValueType>, String> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }
    list.split(',')
        .map(|name| {
            let name = name.trim();
            ValueType::from_name(name).ok_or_else(|| format!("unknown value type {name:?}"))
        })
        .collect()
}

/// A host function bound to its signature
pub struct NativeFunc {
    name: String,
    ty: FuncType,
    handler: HostFunctionHandler,
}

impl NativeFunc {
    /// Bind `handler` to the signature parsed from `signature`
    pub fn new(signature: &str, handler: HostFunctionHandler) -> Result<Self> {
        let (name, ty) = parse_signature(signature)?;
        Ok(Self { name, ty, handler })
    }

    /// Member name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Function for NativeFunc {
    fn func_type(&self) -> &FuncType {
        &self.ty
    }

    fn call(&self, caller: &mut dyn Module, args: &[Value]) -> Result<Vec<Value>> {
        linker::check_args(&self.ty, args)?;
        trace!("host call {}{}", self.name, self.ty);
        let results = self.handler.call(caller, args)?;
        linker::check_results(&self.ty, &results)?;
        Ok(results)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A typed value cell usable as a global import or instance global
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalCell {
    ty: GlobalType,
    value: Value,
}

impl GlobalCell {
    /// Create a global holding `value`
    #[must_use]
    pub fn new(value: Value, mutable: bool) -> Self {
        Self { ty: GlobalType { value_type: value.value_type(), mutable }, value }
    }

    /// Wrap as a shared handle
    #[must_use]
    pub fn into_ref(self) -> GlobalRef {
        Rc::new(RefCell::new(self))
    }
}

impl Global for GlobalCell {
    fn global_type(&self) -> GlobalType {
        self.ty
    }

    fn get(&self) -> Value {
        self.value
    }

    fn set(&mut self, value: Value) -> Result<()> {
        if !self.ty.mutable {
            return Err(kinds::trap(codes::INVALID_GLOBAL_ACCESS, "global is immutable"));
        }
        if value.value_type() != self.ty.value_type {
            return Err(kinds::trap(
                codes::INVALID_GLOBAL_ACCESS,
                format!("cannot store {} in global of type {}", value.value_type(), self.ty.value_type),
            ));
        }
        self.value = value;
        Ok(())
    }
}

/// A host-provided module: a named set of functions and other members
pub struct NativeModule {
    name: String,
    members: BTreeMap<String, Member>,
}

impl NativeModule {
    /// Create an empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), members: BTreeMap::new() }
    }

    /// Module name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a closure under a signature string like `"f(i32)->()"`
    pub fn register<F>(&mut self, signature: &str, f: F) -> Result<()>
    where
        F: Fn(&mut dyn Module, &[Value]) -> Result<Vec<Value>> + 'static,
    {
        self.register_handler(signature, HostFunctionHandler::new(f))
    }

    /// Register an existing handler under a signature string
    pub fn register_handler(&mut self, signature: &str, handler: HostFunctionHandler) -> Result<()> {
        let func = NativeFunc::new(signature, handler)?;
        debug!("registering host function {}.{}{}", self.name, func.name, func.ty);
        let name = func.name.clone();
        self.define(&name, Member::Func(Rc::new(func)))
    }

    /// Add a global holding `value`; returns the shared handle
    pub fn define_global(&mut self, name: &str, value: Value, mutable: bool) -> Result<GlobalRef> {
        let global = GlobalCell::new(value, mutable).into_ref();
        self.define(name, Member::Global(Rc::clone(&global)))?;
        Ok(global)
    }

    /// Add an arbitrary member
    pub fn define(&mut self, name: &str, member: Member) -> Result<()> {
        if self.members.contains_key(name) {
            return Err(kinds::runtime_error(
                codes::DUPLICATE_MEMBER,
                format!("{}.{name} is already defined", self.name),
            ));
        }
        self.members.insert(name.to_string(), member);
        Ok(())
    }

    /// Whether a member called `name` exists
    #[must_use]
    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Member names in sorted order
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }
}

impl Module for NativeModule {
    fn get_member(&self, name: &str) -> Option<Member> {
        self.members.get(name).cloned()
    }

    fn invoke_func(&mut self, name: &str, args: &[Value]) -> Result<Vec<Value>> {
        let Some(Member::Func(func)) = self.members.get(name) else {
            return Err(linker::export_not_found("function", &format!("{}.{name}", self.name)));
        };
        let func = Rc::clone(func);
        func.call(self, args)
    }

    fn get_global(&self, name: &str) -> Result<Value> {
        match self.members.get(name) {
            Some(Member::Global(global)) => Ok(global.borrow().get()),
            _ => Err(linker::export_not_found("global", &format!("{}.{name}", self.name))),
        }
    }

    fn set_global(&mut self, name: &str, value: Value) -> Result<()> {
        match self.members.get(name) {
            Some(Member::Global(global)) => global.borrow_mut().set(value),
            _ => Err(linker::export_not_found("global", &format!("{}.{name}", self.name))),
        }
    }
}

impl fmt::Debug for NativeModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeModule").field("name", &self.name).field("members", &self.members).finish()
    }
}
