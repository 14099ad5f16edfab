// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The `env` host module offered to programs started with `wvmd run`.

use std::{cell::RefCell, io::Write, rc::Rc};

use wvm::{
    Error, Externals, HostBuilder, Result, Value, codes,
    prelude::HostModule,
};

/// Import module name of the built-in host functions
pub const ENV_MODULE: &str = "env";

/// Build the externals for `run`; `print_char` writes to `out`
pub fn env_externals<W: Write + 'static>(out: Rc<RefCell<W>>) -> Result<Externals> {
    let externals = HostBuilder::new()
        .with_function(ENV_MODULE, "print_char(i32)->()", move |_, args| {
            if let [Value::I32(code)] = args {
                let ch = char::from_u32(*code as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
                write!(out.borrow_mut(), "{ch}").map_err(Error::from)?;
            }
            Ok(Vec::new())
        })?
        .with_function(ENV_MODULE, "assert_true(i32)->()", |_, args| expect(args, &Value::I32(1)))?
        .with_function(ENV_MODULE, "assert_false(i32)->()", |_, args| expect(args, &Value::I32(0)))?
        .with_function(ENV_MODULE, "assert_eq_i32(i32,i32)->()", assert_pair)?
        .with_function(ENV_MODULE, "assert_eq_i64(i64,i64)->()", assert_pair)?
        .with_function(ENV_MODULE, "assert_eq_f32(f32,f32)->()", assert_pair)?
        .with_function(ENV_MODULE, "assert_eq_f64(f64,f64)->()", assert_pair)?
        .build();
    Ok(externals)
}

fn check_eq(lhs: &Value, rhs: &Value) -> Result<Vec<Value>> {
    if lhs == rhs {
        Ok(Vec::new())
    } else {
        Err(Error::from_code(codes::HOST_FUNCTION_FAILED, format!("assertion failed: {lhs} != {rhs}")))
    }
}

fn expect(args: &[Value], expected: &Value) -> Result<Vec<Value>> {
    match args {
        [actual] => check_eq(actual, expected),
        _ => Err(Error::from_code(codes::ARGUMENT_MISMATCH, "expected one argument")),
    }
}

// Float operands compare with IEEE equality, so NaN never matches.
fn assert_pair(_: &mut dyn HostModule, args: &[Value]) -> Result<Vec<Value>> {
    match args {
        [lhs, rhs] => check_eq(lhs, rhs),
        _ => Err(Error::from_code(codes::ARGUMENT_MISMATCH, "expected two arguments")),
    }
}
