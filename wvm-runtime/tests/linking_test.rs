// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Import resolution against host modules and other instances.

use std::{cell::RefCell, rc::Rc};

use wvm_decoder::decode_module;
use wvm_error::{Result, codes, kinds};
use wvm_format::types::Value;
use wvm_host::{Externals, HostBuilder, Member, Memory as _, Module as _, Table as _};
use wvm_runtime::{RuntimeModule, VmConfig};

fn load(wat: &str, externals: &Externals) -> Result<RuntimeModule> {
    let bytes = wat::parse_str(wat).expect("valid wat");
    RuntimeModule::instantiate(decode_module(&bytes)?, externals, VmConfig::default())
}

fn env() -> Externals {
    HostBuilder::new()
        .with_function("env", "add(i32,i32)->(i32)", |_, args| match args {
            [Value::I32(a), Value::I32(b)] => Ok(vec![Value::I32(a.wrapping_add(*b))]),
            _ => Err(kinds::runtime_error(codes::ARGUMENT_MISMATCH, "add")),
        })
        .unwrap()
        .with_function("env", "square_in_caller(i32)->(i32)", |caller, args| caller.invoke_func("square", args))
        .unwrap()
        .with_function("env", "fail()->()", |_, _| Err(kinds::runtime_error(codes::HOST_FUNCTION_FAILED, "boom")))
        .unwrap()
        .with_function("env", "liar()->(i32)", |_, _| Ok(vec![Value::F32(1.0)]))
        .unwrap()
        .with_global("env", "offset", Value::I32(8), false)
        .unwrap()
        .with_global("env", "counter", Value::I64(0), true)
        .unwrap()
        .build()
}

const CLIENT: &str = r#"(module
    (import "env" "add" (func $add (param i32 i32) (result i32)))
    (import "env" "square_in_caller" (func $sq (param i32) (result i32)))
    (import "env" "fail" (func $fail))
    (import "env" "liar" (func $liar (result i32)))
    (import "env" "offset" (global $offset i32))
    (import "env" "counter" (global $counter (mut i64)))
    (memory 1)
    (data (global.get $offset) "\07")
    (func (export "square") (param i32) (result i32) (i32.mul (local.get 0) (local.get 0)))
    (func (export "add_then_square") (param i32 i32) (result i32)
      (call $sq (call $add (local.get 0) (local.get 1))))
    (func (export "fail") (call $fail))
    (func (export "liar") (result i32) (call $liar))
    (func (export "byte_at_offset") (result i32) (i32.load8_u (global.get $offset)))
    (func (export "tick") (result i64)
      (global.set $counter (i64.add (global.get $counter) (i64.const 1)))
      (global.get $counter)))"#;

#[test]
fn test_host_function_calls() {
    let client = load(CLIENT, &env()).unwrap();
    assert_eq!(client.invoke("add_then_square", &[Value::I32(2), Value::I32(3)]).unwrap(), vec![Value::I32(25)]);
}

#[test]
fn test_host_function_errors_propagate() {
    let client = load(CLIENT, &env()).unwrap();

    let err = client.invoke("fail", &[]).unwrap_err();
    assert_eq!(err.code, codes::HOST_FUNCTION_FAILED);
    assert!(err.message.contains("boom"), "{err}");

    let err = client.invoke("liar", &[]).unwrap_err();
    assert_eq!(err.code, codes::HOST_FUNCTION_FAILED);

    assert_eq!(client.invoke("square", &[Value::I32(-4)]).unwrap(), vec![Value::I32(16)]);
    assert_eq!(client.with_vm(|vm| vm.stack_height()).unwrap(), 0);
}

#[test]
fn test_imported_globals() {
    let externals = env();
    let client = load(CLIENT, &externals).unwrap();
    assert_eq!(client.invoke("byte_at_offset", &[]).unwrap(), vec![Value::I32(7)]);

    assert_eq!(client.invoke("tick", &[]).unwrap(), vec![Value::I64(1)]);
    assert_eq!(client.invoke("tick", &[]).unwrap(), vec![Value::I64(2)]);
    // the global cell is shared with the host module
    assert_eq!(externals["env"].get_global("counter").unwrap(), Value::I64(2));
}

#[test]
fn test_link_errors() {
    let externals = env();

    let err = load(r#"(module (import "nope" "f" (func)))"#, &externals).unwrap_err();
    assert!(err.is_link_error());
    assert_eq!(err.code, codes::UNKNOWN_IMPORT_MODULE);

    let err = load(r#"(module (import "env" "g" (func)))"#, &externals).unwrap_err();
    assert_eq!(err.code, codes::UNKNOWN_IMPORT);

    let err = load(r#"(module (import "env" "add" (func (param i64))))"#, &externals).unwrap_err();
    assert_eq!(err.code, codes::INCOMPATIBLE_IMPORT_TYPE);

    let err = load(r#"(module (import "env" "add" (global i32)))"#, &externals).unwrap_err();
    assert_eq!(err.code, codes::INCOMPATIBLE_IMPORT_TYPE);

    let err = load(r#"(module (import "env" "offset" (global (mut i32))))"#, &externals).unwrap_err();
    assert_eq!(err.code, codes::INCOMPATIBLE_IMPORT_TYPE);
}

const PROVIDER: &str = r#"(module
    (memory (export "mem") 1)
    (table (export "table") 2 funcref)
    (elem (i32.const 0) $triple)
    (func $triple (param i32) (result i32) (i32.mul (local.get 0) (i32.const 3)))
    (func (export "peek") (param i32) (result i32) (i32.load8_u (local.get 0))))"#;

#[test]
fn test_shared_memory_between_instances() {
    let provider = load(PROVIDER, &Externals::new()).unwrap();
    let externals = HostBuilder::new().with_module("lib", Box::new(provider.clone())).unwrap().build();
    let consumer = load(
        r#"(module
            (import "lib" "mem" (memory 1))
            (func (export "poke") (param i32 i32) (i32.store8 (local.get 0) (local.get 1))))"#,
        &externals,
    )
    .unwrap();

    consumer.invoke("poke", &[Value::I32(10), Value::I32(99)]).unwrap();
    assert_eq!(provider.invoke("peek", &[Value::I32(10)]).unwrap(), vec![Value::I32(99)]);

    let err = load(r#"(module (import "lib" "mem" (memory 2)))"#, &externals).unwrap_err();
    assert_eq!(err.code, codes::INCOMPATIBLE_IMPORT_TYPE);
}

#[test]
fn test_functions_and_tables_across_instances() {
    let provider = load(PROVIDER, &Externals::new()).unwrap();
    let mut externals = Externals::new();
    externals.insert("lib".to_string(), Box::new(provider.clone()));

    let consumer = load(
        r#"(module
            (import "lib" "peek" (func $peek (param i32) (result i32)))
            (import "lib" "table" (table 1 funcref))
            (func (export "peek_twice") (param i32) (result i32)
              (i32.add (call $peek (local.get 0)) (call $peek (local.get 0))))
            (func (export "via_table") (param i32) (result i32)
              (call_indirect (param i32) (result i32) (local.get 0) (i32.const 0))))"#,
        &externals,
    )
    .unwrap();

    let Some(Member::Memory(memory)) = provider.get_member("mem") else { panic!("memory export") };
    memory.borrow_mut().write(4, &[21]).unwrap();

    assert_eq!(consumer.invoke("peek_twice", &[Value::I32(4)]).unwrap(), vec![Value::I32(42)]);
    assert_eq!(consumer.invoke("via_table", &[Value::I32(5)]).unwrap(), vec![Value::I32(15)]);
}

#[test]
fn test_overrunning_segment_leaves_shared_table_untouched() {
    let provider = load(PROVIDER, &Externals::new()).unwrap();
    let externals = HostBuilder::new().with_module("lib", Box::new(provider.clone())).unwrap().build();

    let err = load(
        r#"(module
            (import "lib" "table" (table 1 funcref))
            (func $a) (func $b)
            (elem (i32.const 1) $a $b))"#,
        &externals,
    )
    .unwrap_err();
    assert_eq!(err.code, codes::TABLE_OUT_OF_BOUNDS);
    assert!(err.message.contains("element[0]"), "{err}");

    let Some(Member::Table(table)) = provider.get_member("table") else { panic!("table export") };
    let table = table.borrow();
    assert_eq!(table.size(), 2);
    assert!(table.get(0).unwrap().is_some());
    assert!(table.get(1).unwrap().is_none());
}

#[test]
fn test_host_callback_sees_each_argument() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    let externals = HostBuilder::new()
        .with_function("env", "record(i32)->()", move |_, args| {
            log.borrow_mut().extend_from_slice(args);
            Ok(Vec::new())
        })
        .unwrap()
        .build();
    let instance = load(
        r#"(module
            (import "env" "record" (func $record (param i32)))
            (func (export "count") (param i32)
              (block $done
                (loop $next
                  (br_if $done (i32.eqz (local.get 0)))
                  (call $record (local.get 0))
                  (local.set 0 (i32.sub (local.get 0) (i32.const 1)))
                  (br $next)))))"#,
        &externals,
    )
    .unwrap();
    instance.invoke("count", &[Value::I32(3)]).unwrap();
    assert_eq!(*seen.borrow(), [Value::I32(3), Value::I32(2), Value::I32(1)]);
}
