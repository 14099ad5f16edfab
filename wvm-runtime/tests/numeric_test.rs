// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Numeric instruction semantics observed through exported functions.

use wvm_decoder::decode_module;
use wvm_error::codes;
use wvm_format::types::Value;
use wvm_host::Externals;
use wvm_runtime::{RuntimeModule, VmConfig};

const NUMERIC: &str = r#"(module
    (func (export "shl") (param i32 i32) (result i32) (i32.shl (local.get 0) (local.get 1)))
    (func (export "shr_u") (param i32 i32) (result i32) (i32.shr_u (local.get 0) (local.get 1)))
    (func (export "rotl") (param i32 i32) (result i32) (i32.rotl (local.get 0) (local.get 1)))
    (func (export "rotr64") (param i64 i64) (result i64) (i64.rotr (local.get 0) (local.get 1)))
    (func (export "clz") (param i32) (result i32) (i32.clz (local.get 0)))
    (func (export "ctz64") (param i64) (result i64) (i64.ctz (local.get 0)))
    (func (export "popcnt") (param i32) (result i32) (i32.popcnt (local.get 0)))
    (func (export "rem_s") (param i32 i32) (result i32) (i32.rem_s (local.get 0) (local.get 1)))
    (func (export "div_u") (param i32 i32) (result i32) (i32.div_u (local.get 0) (local.get 1)))
    (func (export "lt_u") (param i32 i32) (result i32) (i32.lt_u (local.get 0) (local.get 1)))
    (func (export "extend8_s") (param i32) (result i32) (i32.extend8_s (local.get 0)))
    (func (export "extend32_s") (param i64) (result i64) (i64.extend32_s (local.get 0)))
    (func (export "extend_u") (param i32) (result i64) (i64.extend_i32_u (local.get 0)))
    (func (export "wrap") (param i64) (result i32) (i32.wrap_i64 (local.get 0)))
    (func (export "trunc_s") (param f32) (result i32) (i32.trunc_f32_s (local.get 0)))
    (func (export "trunc_u64") (param f64) (result i64) (i64.trunc_f64_u (local.get 0)))
    (func (export "trunc_sat_s") (param f32) (result i32) (i32.trunc_sat_f32_s (local.get 0)))
    (func (export "trunc_sat_u64") (param f64) (result i64) (i64.trunc_sat_f64_u (local.get 0)))
    (func (export "convert_u64") (param i64) (result f32) (f32.convert_i64_u (local.get 0)))
    (func (export "min") (param f32 f32) (result f32) (f32.min (local.get 0) (local.get 1)))
    (func (export "max64") (param f64 f64) (result f64) (f64.max (local.get 0) (local.get 1)))
    (func (export "nearest") (param f64) (result f64) (f64.nearest (local.get 0)))
    (func (export "copysign") (param f32 f32) (result f32) (f32.copysign (local.get 0) (local.get 1)))
    (func (export "neg") (param f64) (result f64) (f64.neg (local.get 0)))
    (func (export "bits") (param f32) (result i32) (i32.reinterpret_f32 (local.get 0)))
    (func (export "demote") (param f64) (result f32) (f32.demote_f64 (local.get 0)))
    (func (export "feq") (param f64 f64) (result i32) (f64.eq (local.get 0) (local.get 1))))"#;

fn instance() -> RuntimeModule {
    let bytes = wat::parse_str(NUMERIC).unwrap();
    RuntimeModule::instantiate(decode_module(&bytes).unwrap(), &Externals::new(), VmConfig::default()).unwrap()
}

fn one(instance: &RuntimeModule, name: &str, args: &[Value]) -> Value {
    let results = instance.invoke(name, args).unwrap();
    assert_eq!(results.len(), 1, "{name}");
    results[0]
}

#[test]
fn test_integer_bit_operations() {
    let m = instance();
    assert_eq!(one(&m, "shl", &[Value::I32(1), Value::I32(33)]), Value::I32(2));
    assert_eq!(one(&m, "shr_u", &[Value::I32(-1), Value::I32(28)]), Value::I32(0xF));
    assert_eq!(one(&m, "rotl", &[Value::I32(0x8000_0001_u32 as i32), Value::I32(1)]), Value::I32(3));
    assert_eq!(one(&m, "rotr64", &[Value::I64(1), Value::I64(65)]), Value::I64(i64::MIN));
    assert_eq!(one(&m, "clz", &[Value::I32(0)]), Value::I32(32));
    assert_eq!(one(&m, "clz", &[Value::I32(0x0001_0000)]), Value::I32(15));
    assert_eq!(one(&m, "ctz64", &[Value::I64(0)]), Value::I64(64));
    assert_eq!(one(&m, "popcnt", &[Value::I32(-1)]), Value::I32(32));
    assert_eq!(one(&m, "lt_u", &[Value::I32(1), Value::I32(-1)]), Value::I32(1));
}

#[test]
fn test_integer_division_edges() {
    let m = instance();
    assert_eq!(one(&m, "rem_s", &[Value::I32(i32::MIN), Value::I32(-1)]), Value::I32(0));
    assert_eq!(one(&m, "rem_s", &[Value::I32(-7), Value::I32(2)]), Value::I32(-1));
    assert_eq!(one(&m, "div_u", &[Value::I32(-1), Value::I32(2)]), Value::I32(i32::MAX));
    let err = m.invoke("div_u", &[Value::I32(1), Value::I32(0)]).unwrap_err();
    assert_eq!(err.code, codes::DIVISION_BY_ZERO);
}

#[test]
fn test_sign_extension_and_width_changes() {
    let m = instance();
    assert_eq!(one(&m, "extend8_s", &[Value::I32(0x80)]), Value::I32(-128));
    assert_eq!(one(&m, "extend8_s", &[Value::I32(0x17F)]), Value::I32(127));
    assert_eq!(one(&m, "extend32_s", &[Value::I64(0xFFFF_FFFF)]), Value::I64(-1));
    assert_eq!(one(&m, "extend_u", &[Value::I32(-1)]), Value::I64(0xFFFF_FFFF));
    assert_eq!(one(&m, "wrap", &[Value::I64(0x1_0000_0005)]), Value::I32(5));
}

#[test]
fn test_float_to_int_truncation() {
    let m = instance();
    assert_eq!(one(&m, "trunc_s", &[Value::F32(-3.9)]), Value::I32(-3));
    let err = m.invoke("trunc_s", &[Value::F32(f32::NAN)]).unwrap_err();
    assert!(err.is_trap());
    assert_eq!(err.code, codes::INVALID_CONVERSION_TO_INTEGER);
    assert_eq!(m.invoke("trunc_s", &[Value::F32(3e9)]).unwrap_err().code, codes::INTEGER_OVERFLOW);
    assert_eq!(m.invoke("trunc_u64", &[Value::F64(-1.0)]).unwrap_err().code, codes::INTEGER_OVERFLOW);
    assert_eq!(one(&m, "trunc_u64", &[Value::F64(-0.5)]), Value::I64(0));

    assert_eq!(one(&m, "trunc_sat_s", &[Value::F32(f32::NAN)]), Value::I32(0));
    assert_eq!(one(&m, "trunc_sat_s", &[Value::F32(f32::INFINITY)]), Value::I32(i32::MAX));
    assert_eq!(one(&m, "trunc_sat_s", &[Value::F32(-3e9)]), Value::I32(i32::MIN));
    assert_eq!(one(&m, "trunc_sat_u64", &[Value::F64(-7.0)]), Value::I64(0));
    assert_eq!(one(&m, "trunc_sat_u64", &[Value::F64(1e30)]), Value::I64(-1));
}

#[test]
fn test_float_semantics() {
    let m = instance();
    assert_eq!(one(&m, "convert_u64", &[Value::I64(-1)]), Value::F32(18_446_744_073_709_551_616.0));

    let Value::F32(min) = one(&m, "min", &[Value::F32(f32::NAN), Value::F32(1.0)]) else { panic!("f32") };
    assert!(min.is_nan());
    let Value::F32(min) = one(&m, "min", &[Value::F32(0.0), Value::F32(-0.0)]) else { panic!("f32") };
    assert_eq!(min.to_bits(), (-0.0f32).to_bits());
    let Value::F64(max) = one(&m, "max64", &[Value::F64(-0.0), Value::F64(0.0)]) else { panic!("f64") };
    assert_eq!(max.to_bits(), 0.0f64.to_bits());

    assert_eq!(one(&m, "nearest", &[Value::F64(2.5)]), Value::F64(2.0));
    assert_eq!(one(&m, "nearest", &[Value::F64(3.5)]), Value::F64(4.0));
    assert_eq!(one(&m, "nearest", &[Value::F64(-0.5)]).to_bits(), (-0.0f64).to_bits());

    assert_eq!(one(&m, "copysign", &[Value::F32(2.0), Value::F32(-0.0)]), Value::F32(-2.0));
    assert_eq!(one(&m, "neg", &[Value::F64(0.0)]).to_bits(), (-0.0f64).to_bits());
    assert_eq!(one(&m, "bits", &[Value::F32(1.0)]), Value::I32(0x3F80_0000));
    assert_eq!(one(&m, "demote", &[Value::F64(0.1)]), Value::F32(0.1));
    assert_eq!(one(&m, "feq", &[Value::F64(f64::NAN), Value::F64(f64::NAN)]), Value::I32(0));
}
