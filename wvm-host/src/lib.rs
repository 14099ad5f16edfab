// WVM - wvm-host
// Module: Host Interface
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Linker contract and host function support for the wvm runtime.
//!
//! Imports are satisfied by any value implementing [`Module`]. This crate
//! provides the member traits, a [`NativeModule`] registry for host
//! functions declared with compact signature strings, and a
//! [`HostBuilder`] that assembles the [`Externals`] map passed to
//! instantiation.
//!
//! # Example
//!
//! ```
//! use wvm_format::types::Value;
//! use wvm_host::{HostBuilder, Module};
//!
//! let mut externals = HostBuilder::new()
//!     .with_function("env", "add(i32,i32)->(i32)", |_caller, args| {
//!         let a = args[0].as_i32().unwrap_or(0);
//!         let b = args[1].as_i32().unwrap_or(0);
//!         Ok(vec![Value::I32(a.wrapping_add(b))])
//!     })?
//!     .build();
//!
//! let env = externals.get_mut("env").unwrap();
//! assert_eq!(env.invoke_func("add", &[Value::I32(2), Value::I32(3)])?, vec![Value::I32(5)]);
//! # Ok::<(), wvm_error::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod function;
pub mod linker;
pub mod native;

pub use builder::HostBuilder;
pub use function::{HostFn, HostFunctionHandler};
pub use linker::{
    Externals, FuncRef, Function, Global, GlobalRef, Member, Memory, MemoryRef, Module, Table, TableRef, check_args,
};
pub use native::{GlobalCell, NativeFunc, NativeModule, parse_signature};
