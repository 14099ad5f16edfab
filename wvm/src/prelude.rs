// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude module for wvm
//!
//! Brings the types an embedder needs into scope with a single glob import.

pub use wvm_error::{Error, ErrorCategory, Result, ResultExt, codes};
pub use wvm_format::{
    module::{ExternalKind, Module},
    types::{FuncType, GlobalType, Limits, Value, ValueType},
};
pub use wvm_host::{
    Externals, FuncRef, Function, Global, GlobalRef, HostBuilder, Member, Memory, MemoryRef,
    Module as HostModule, NativeModule, Table, TableRef,
};
pub use wvm_runtime::{RuntimeModule, VmConfig};
