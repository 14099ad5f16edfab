// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Builder for the set of modules offered to instantiation.

use std::collections::BTreeMap;

use wvm_error::{Result, codes, kinds};
use wvm_format::types::Value;

use crate::{
    linker::{Externals, Member, Module},
    native::NativeModule,
};

/// Collects native modules and other import providers into [`Externals`]
#[derive(Default)]
pub struct HostBuilder {
    natives: BTreeMap<String, NativeModule>,
    modules: BTreeMap<String, Box<dyn Module>>,
}

impl HostBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn native(&mut self, module: &str) -> Result<&mut NativeModule> {
        if self.modules.contains_key(module) {
            return Err(duplicate_module(module));
        }
        Ok(self.natives.entry(module.to_string()).or_insert_with(|| NativeModule::new(module)))
    }

    /// Register a host function
    ///
    /// # Arguments
    ///
    /// * `module` - Import module name the function is offered under
    /// * `signature` - Name and type, e.g. `"print_char(i32)->()"`
    /// * `f` - The callback
    pub fn with_function<F>(mut self, module: &str, signature: &str, f: F) -> Result<Self>
    where
        F: Fn(&mut dyn Module, &[Value]) -> Result<Vec<Value>> + 'static,
    {
        self.native(module)?.register(signature, f)?;
        Ok(self)
    }

    /// Register a host global
    pub fn with_global(mut self, module: &str, name: &str, value: Value, mutable: bool) -> Result<Self> {
        self.native(module)?.define_global(name, value, mutable)?;
        Ok(self)
    }

    /// Register an existing member handle, e.g. a memory shared with another instance
    pub fn with_member(mut self, module: &str, name: &str, member: Member) -> Result<Self> {
        self.native(module)?.define(name, member)?;
        Ok(self)
    }

    /// Offer a whole module, such as an instantiated wasm module
    pub fn with_module(mut self, name: &str, module: Box<dyn Module>) -> Result<Self> {
        if self.natives.contains_key(name) || self.modules.contains_key(name) {
            return Err(duplicate_module(name));
        }
        self.modules.insert(name.to_string(), module);
        Ok(self)
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> Externals {
        let mut externals: Externals = self.modules.into_iter().collect();
        for (name, native) in self.natives {
            externals.insert(name, Box::new(native));
        }
        externals
    }
}

fn duplicate_module(name: &str) -> wvm_error::Error {
    kinds::runtime_error(codes::DUPLICATE_MEMBER, format!("module {name:?} is already registered"))
}
