// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! End-to-end execution tests: modules are assembled from text with `wat`,
//! decoded, instantiated and invoked.

use wvm_decoder::decode_module;
use wvm_error::{Result, codes};
use wvm_format::types::Value;
use wvm_host::{Externals, Memory as _, Module as _};
use wvm_runtime::{RuntimeModule, VmConfig};

fn load_with(wat: &str, externals: &Externals, config: VmConfig) -> Result<RuntimeModule> {
    let bytes = wat::parse_str(wat).expect("valid wat");
    let module = decode_module(&bytes)?;
    RuntimeModule::instantiate(module, externals, config)
}

fn load(wat: &str) -> RuntimeModule {
    load_with(wat, &Externals::new(), VmConfig::default()).expect("instantiation succeeds")
}

fn call_i32(instance: &RuntimeModule, name: &str, args: &[i32]) -> Result<i32> {
    let args: Vec<Value> = args.iter().copied().map(Value::I32).collect();
    let results = instance.invoke(name, &args)?;
    match results.as_slice() {
        [Value::I32(v)] => Ok(*v),
        other => panic!("unexpected results {other:?}"),
    }
}

#[test]
fn test_recursive_fib() {
    let instance = load(
        r#"(module
            (func $fib (export "fib") (param i32) (result i32)
              (if (result i32) (i32.lt_s (local.get 0) (i32.const 2))
                (then (local.get 0))
                (else (i32.add
                  (call $fib (i32.sub (local.get 0) (i32.const 1)))
                  (call $fib (i32.sub (local.get 0) (i32.const 2))))))))"#,
    );
    assert_eq!(call_i32(&instance, "fib", &[0]).unwrap(), 0);
    assert_eq!(call_i32(&instance, "fib", &[10]).unwrap(), 55);
    assert_eq!(call_i32(&instance, "fib", &[20]).unwrap(), 6765);
}

#[test]
fn test_loop_factorial() {
    let instance = load(
        r#"(module
            (func (export "fact") (param i64) (result i64) (local i64)
              (local.set 1 (i64.const 1))
              (block $done
                (loop $top
                  (br_if $done (i64.eqz (local.get 0)))
                  (local.set 1 (i64.mul (local.get 1) (local.get 0)))
                  (local.set 0 (i64.sub (local.get 0) (i64.const 1)))
                  (br $top)))
              (local.get 1)))"#,
    );
    assert_eq!(instance.invoke("fact", &[Value::I64(0)]).unwrap(), vec![Value::I64(1)]);
    assert_eq!(instance.invoke("fact", &[Value::I64(20)]).unwrap(), vec![Value::I64(2_432_902_008_176_640_000)]);
}

#[test]
fn test_br_table_and_return() {
    let instance = load(
        r#"(module
            (func (export "classify") (param i32) (result i32)
              (block $default
                (block $two
                  (block $one
                    (block $zero
                      (br_table $zero $one $two $default (local.get 0)))
                    (return (i32.const 100)))
                  (return (i32.const 101)))
                (return (i32.const 102)))
              (i32.const 999)))"#,
    );
    assert_eq!(call_i32(&instance, "classify", &[0]).unwrap(), 100);
    assert_eq!(call_i32(&instance, "classify", &[1]).unwrap(), 101);
    assert_eq!(call_i32(&instance, "classify", &[2]).unwrap(), 102);
    assert_eq!(call_i32(&instance, "classify", &[3]).unwrap(), 999);
    assert_eq!(call_i32(&instance, "classify", &[-1]).unwrap(), 999);
}

#[test]
fn test_loop_with_block_params() {
    // The loop takes the running sum as a parameter, so its block type is
    // encoded as a type index.
    let instance = load(
        r#"(module
            (func (export "sum_to") (param $n i32) (result i32)
              (i32.const 0)
              (loop $l (param i32) (result i32)
                (i32.add (local.get $n))
                (local.set $n (i32.sub (local.get $n) (i32.const 1)))
                (br_if $l (local.get $n)))))"#,
    );
    assert_eq!(call_i32(&instance, "sum_to", &[4]).unwrap(), 10);
    assert_eq!(call_i32(&instance, "sum_to", &[100]).unwrap(), 5050);
}

#[test]
fn test_block_results_survive_branch() {
    let instance = load(
        r#"(module
            (func (export "pick") (param i32) (result i32)
              (block $out (result i32)
                (i32.const 1)
                (i32.const 2)
                (drop)
                (br_if $out (local.get 0))
                (drop)
                (i32.const 7))))"#,
    );
    assert_eq!(call_i32(&instance, "pick", &[1]).unwrap(), 1);
    assert_eq!(call_i32(&instance, "pick", &[0]).unwrap(), 7);
}

#[test]
fn test_select_and_tee() {
    let instance = load(
        r#"(module
            (func (export "max") (param i32 i32) (result i32)
              (select (local.get 0) (local.get 1) (i32.gt_s (local.get 0) (local.get 1))))
            (func (export "tee") (param i32) (result i32) (local i32)
              (i32.add (local.tee 1 (i32.mul (local.get 0) (i32.const 3))) (local.get 1))))"#,
    );
    assert_eq!(call_i32(&instance, "max", &[3, 9]).unwrap(), 9);
    assert_eq!(call_i32(&instance, "max", &[-3, -9]).unwrap(), -3);
    assert_eq!(call_i32(&instance, "tee", &[5]).unwrap(), 30);
}

#[test]
fn test_division_by_zero_traps_and_instance_recovers() {
    let instance = load(
        r#"(module
            (func (export "div") (param i32 i32) (result i32)
              (i32.div_s (local.get 0) (local.get 1))))"#,
    );
    let err = call_i32(&instance, "div", &[1, 0]).unwrap_err();
    assert!(err.is_trap());
    assert_eq!(err.code, codes::DIVISION_BY_ZERO);
    assert!(err.message.contains("i32.div_s"), "{err}");

    let err = call_i32(&instance, "div", &[i32::MIN, -1]).unwrap_err();
    assert_eq!(err.code, codes::INTEGER_OVERFLOW);

    assert_eq!(call_i32(&instance, "div", &[-7, 2]).unwrap(), -3);
    assert_eq!(instance.with_vm(|vm| (vm.stack_height(), vm.frame_depth())).unwrap(), (0, 0));
}

#[test]
fn test_unreachable_reports_instruction() {
    let instance = load(
        r#"(module
            (func $inner unreachable)
            (func (export "boom") (call $inner)))"#,
    );
    let err = instance.invoke("boom", &[]).unwrap_err();
    assert_eq!(err.code, codes::UNREACHABLE);
    assert!(err.message.contains("instruction 0 (unreachable)"), "{err}");
}

#[test]
fn test_invoke_checks_arguments() {
    let instance = load(r#"(module (func (export "id") (param i32) (result i32) (local.get 0)))"#);
    assert_eq!(instance.invoke("id", &[Value::I64(1)]).unwrap_err().code, codes::ARGUMENT_MISMATCH);
    assert_eq!(instance.invoke("id", &[]).unwrap_err().code, codes::ARGUMENT_MISMATCH);
    assert_eq!(instance.invoke("missing", &[]).unwrap_err().code, codes::EXPORT_NOT_FOUND);
    assert_eq!(call_i32(&instance, "id", &[-5]).unwrap(), -5);
}

#[test]
fn test_call_depth_is_bounded() {
    let wat = r#"(module
        (func $f (export "recurse") (call $f))
        (func (export "ok") (result i32) (i32.const 1)))"#;
    let instance = load_with(wat, &Externals::new(), VmConfig::default().with_max_call_depth(64)).unwrap();

    let err = instance.invoke("recurse", &[]).unwrap_err();
    assert!(err.is_trap());
    assert_eq!(err.code, codes::CALL_STACK_EXHAUSTED);
    assert_eq!(instance.with_vm(|vm| (vm.stack_height(), vm.frame_depth())).unwrap(), (0, 0));
    assert_eq!(call_i32(&instance, "ok", &[]).unwrap(), 1);
}

#[test]
fn test_operand_stack_is_bounded() {
    let wat = r#"(module
        (func (export "wide") (result i32) (local i64 i64 i64 i64 i64 i64 i64 i64 i64 i64) (i32.const 3)))"#;
    let small = load_with(wat, &Externals::new(), VmConfig::default().with_max_operand_stack(8)).unwrap();
    assert_eq!(small.invoke("wide", &[]).unwrap_err().code, codes::STACK_OVERFLOW);

    let roomy = load_with(wat, &Externals::new(), VmConfig::default()).unwrap();
    assert_eq!(call_i32(&roomy, "wide", &[]).unwrap(), 3);
}

#[test]
fn test_call_indirect() {
    let instance = load(
        r#"(module
            (type $i_i (func (param i32) (result i32)))
            (type $i_v (func (param i32)))
            (table 3 funcref)
            (elem (i32.const 0) $double $square)
            (func $double (type $i_i) (i32.add (local.get 0) (local.get 0)))
            (func $square (type $i_i) (i32.mul (local.get 0) (local.get 0)))
            (func (export "apply") (param i32 i32) (result i32)
              (call_indirect (type $i_i) (local.get 1) (local.get 0)))
            (func (export "wrong_type") (param i32)
              (call_indirect (type $i_v) (i32.const 1) (local.get 0))))"#,
    );
    assert_eq!(call_i32(&instance, "apply", &[0, 7]).unwrap(), 14);
    assert_eq!(call_i32(&instance, "apply", &[1, 7]).unwrap(), 49);
    assert_eq!(call_i32(&instance, "apply", &[2, 7]).unwrap_err().code, codes::UNINITIALIZED_ELEMENT);
    assert_eq!(call_i32(&instance, "apply", &[3, 7]).unwrap_err().code, codes::TABLE_OUT_OF_BOUNDS);

    let err = instance.invoke("wrong_type", &[Value::I32(0)]).unwrap_err();
    assert_eq!(err.code, codes::INDIRECT_CALL_TYPE_MISMATCH);
}

#[test]
fn test_memory_loads_and_stores() {
    let instance = load(
        r#"(module
            (memory (export "mem") 1 2)
            (data (i32.const 16) "\2a\00\00\00hello")
            (func (export "load") (param i32) (result i32) (i32.load (local.get 0)))
            (func (export "load8_s") (param i32) (result i32) (i32.load8_s (local.get 0)))
            (func (export "store") (param i32 i32) (i32.store (local.get 0) (local.get 1)))
            (func (export "store16") (param i32 i64) (i64.store16 offset=4 (local.get 0) (local.get 1)))
            (func (export "load16_u") (param i32) (result i32) (i32.load16_u offset=4 (local.get 0))))"#,
    );
    assert_eq!(call_i32(&instance, "load", &[16]).unwrap(), 42);
    assert_eq!(call_i32(&instance, "load", &[20]).unwrap(), i32::from_le_bytes(*b"hell"));
    assert_eq!(call_i32(&instance, "load8_s", &[20]).unwrap(), i32::from(b'h'));

    instance.invoke("store", &[Value::I32(0), Value::I32(-1)]).unwrap();
    assert_eq!(call_i32(&instance, "load8_s", &[0]).unwrap(), -1);

    instance.invoke("store16", &[Value::I32(100), Value::I64(0x1_2345)]).unwrap();
    assert_eq!(call_i32(&instance, "load16_u", &[100]).unwrap(), 0x2345);

    let memory = instance.memory().unwrap();
    let mut buf = [0u8; 5];
    memory.borrow().read(20, &mut buf).unwrap();
    assert_eq!(&buf, b"hello");
}

#[test]
fn test_memory_out_of_bounds() {
    let instance = load(
        r#"(module
            (memory 1)
            (func (export "load") (param i32) (result i32) (i32.load (local.get 0)))
            (func (export "load_far") (result i64) (i64.load offset=0xffffffff (i32.const 1))))"#,
    );
    assert_eq!(call_i32(&instance, "load", &[65532]).unwrap(), 0);
    let err = call_i32(&instance, "load", &[65533]).unwrap_err();
    assert!(err.is_trap());
    assert_eq!(err.code, codes::MEMORY_OUT_OF_BOUNDS);
    assert_eq!(call_i32(&instance, "load", &[-1]).unwrap_err().code, codes::MEMORY_OUT_OF_BOUNDS);
    assert_eq!(instance.invoke("load_far", &[]).unwrap_err().code, codes::MEMORY_OUT_OF_BOUNDS);
}

#[test]
fn test_memory_grow() {
    let instance = load(
        r#"(module
            (memory 1 2)
            (func (export "grow") (param i32) (result i32) (memory.grow (local.get 0)))
            (func (export "size") (result i32) (memory.size))
            (func (export "load") (param i32) (result i32) (i32.load (local.get 0))))"#,
    );
    assert_eq!(call_i32(&instance, "size", &[]).unwrap(), 1);
    assert_eq!(call_i32(&instance, "grow", &[1]).unwrap(), 1);
    assert_eq!(call_i32(&instance, "size", &[]).unwrap(), 2);
    assert_eq!(call_i32(&instance, "load", &[65536]).unwrap(), 0);
    assert_eq!(call_i32(&instance, "grow", &[1]).unwrap(), -1);
    assert_eq!(call_i32(&instance, "grow", &[0]).unwrap(), 2);
    assert_eq!(call_i32(&instance, "size", &[]).unwrap(), 2);
}

#[test]
fn test_memory_grow_respects_config() {
    let wat = r#"(module
        (memory 1)
        (func (export "grow") (param i32) (result i32) (memory.grow (local.get 0))))"#;
    let instance = load_with(wat, &Externals::new(), VmConfig::default().with_max_memory_pages(3)).unwrap();
    assert_eq!(call_i32(&instance, "grow", &[2]).unwrap(), 1);
    assert_eq!(call_i32(&instance, "grow", &[1]).unwrap(), -1);
}

#[test]
fn test_data_segment_out_of_bounds() {
    let err = load_with(
        r#"(module (memory 1) (data (i32.const 65535) "ab"))"#,
        &Externals::new(),
        VmConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.code, codes::MEMORY_OUT_OF_BOUNDS);
    assert!(err.message.contains("data[0]"), "{err}");
}

#[test]
fn test_element_segment_out_of_bounds() {
    let err = load_with(
        r#"(module (table 1 funcref) (func $f) (elem (i32.const 1) $f))"#,
        &Externals::new(),
        VmConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.code, codes::TABLE_OUT_OF_BOUNDS);
}

#[test]
fn test_globals() {
    let mut instance = load(
        r#"(module
            (global $counter (export "counter") (mut i32) (i32.const 0))
            (global $base (export "base") i64 (i64.const 40))
            (func (export "bump") (result i32)
              (global.set $counter (i32.add (global.get $counter) (i32.const 1)))
              (global.get $counter))
            (func (export "base_plus") (param i64) (result i64)
              (i64.add (global.get $base) (local.get 0))))"#,
    );
    assert_eq!(call_i32(&instance, "bump", &[]).unwrap(), 1);
    assert_eq!(call_i32(&instance, "bump", &[]).unwrap(), 2);
    assert_eq!(instance.get_global("counter").unwrap(), Value::I32(2));

    instance.set_global("counter", Value::I32(10)).unwrap();
    assert_eq!(call_i32(&instance, "bump", &[]).unwrap(), 11);

    assert_eq!(instance.set_global("base", Value::I64(0)).unwrap_err().code, codes::INVALID_GLOBAL_ACCESS);
    assert_eq!(instance.set_global("counter", Value::I64(0)).unwrap_err().code, codes::INVALID_GLOBAL_ACCESS);
    assert_eq!(instance.get_global("bump").unwrap_err().code, codes::EXPORT_NOT_FOUND);
    assert_eq!(instance.invoke("base_plus", &[Value::I64(2)]).unwrap(), vec![Value::I64(42)]);
}

#[test]
fn test_start_function_runs_at_instantiation() {
    let instance = load(
        r#"(module
            (global $g (export "g") (mut i32) (i32.const 1))
            (func $init (global.set $g (i32.const 7)))
            (start $init))"#,
    );
    assert_eq!(instance.get_global("g").unwrap(), Value::I32(7));
}

#[test]
fn test_trapping_start_function_fails_instantiation() {
    let err = load_with(
        r#"(module (func $init unreachable) (start $init))"#,
        &Externals::new(),
        VmConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.code, codes::UNREACHABLE);
    assert!(err.message.starts_with("start function"), "{err}");
}

#[test]
fn test_invalid_module_is_rejected() {
    let err = load_with(
        r#"(module (func (result i32) (i64.const 1)))"#,
        &Externals::new(),
        VmConfig::default(),
    )
    .unwrap_err();
    assert!(err.is_validation_error());
}

#[test]
fn test_exports_listing() {
    let instance = load(
        r#"(module
            (memory (export "mem") 1)
            (global (export "g") i32 (i32.const 0))
            (func (export "f")))"#,
    );
    let mut names: Vec<String> =
        instance.exports().into_iter().map(|(name, kind)| format!("{kind} {name}")).collect();
    names.sort();
    assert_eq!(names, ["func f", "global g", "memory mem"]);
}
