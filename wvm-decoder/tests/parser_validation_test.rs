// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Integration tests for module decoding and validation.

use wvm_decoder::{decode_and_validate, decode_module, validate_module};
use wvm_error::codes;
use wvm_format::{
    binary::{self, write_section},
    instructions::{Opcode, Operands},
    module::ExternalKind,
    types::ValueType,
};

// Type section `()->(i32)`, one function, body `i32.const 42 end`, exported as "main"
fn create_main_module() -> Vec<u8> {
    let mut module = binary::WASM_MAGIC.to_vec();
    module.extend_from_slice(&binary::WASM_VERSION);
    module.extend(write_section(binary::TYPE_SECTION_ID, &[0x01, 0x60, 0x00, 0x01, 0x7F]));
    module.extend(write_section(binary::FUNCTION_SECTION_ID, &[0x01, 0x00]));
    let mut export = vec![0x01];
    export.extend(binary::write_string("main"));
    export.extend([binary::EXTERNAL_FUNC, 0x00]);
    module.extend(write_section(binary::EXPORT_SECTION_ID, &export));
    module.extend(write_section(binary::CODE_SECTION_ID, &[0x01, 0x04, 0x00, 0x41, 0x2A, 0x0B]));
    module
}

#[test]
fn test_hand_built_main_module() {
    let bytes = create_main_module();
    assert_eq!(
        hex::encode(&bytes),
        "0061736d01000000010501600001 7f0302010007080104 6d61696e00000a06010400412a0b".replace(' ', "")
    );

    let module = decode_and_validate(&bytes).unwrap();
    assert_eq!(module.types[0].to_string(), "()->(i32)");
    assert_eq!(module.functions, vec![0]);
    let export = module.export("main").unwrap();
    assert_eq!(export.desc.kind, ExternalKind::Func);
    let body = &module.codes[0].body;
    assert_eq!(body.len(), 1);
    assert_eq!(body[0].opcode, Opcode::I32Const);
    assert_eq!(body[0].operands, Operands::I32(42));
}

#[test]
fn test_wat_module_with_every_section() {
    let bytes = wat::parse_str(
        r#"(module
            (type $binop (func (param i32 i32) (result i32)))
            (import "env" "print_char" (func $print (param i32)))
            (import "env" "base" (global $base i32))
            (table 2 funcref)
            (memory 1 4)
            (global $counter (mut i32) (global.get $base))
            (func $add (type $binop) local.get 0 local.get 1 i32.add)
            (func $start i32.const 65 call $print)
            (export "add" (func $add))
            (export "memory" (memory 0))
            (start $start)
            (elem (i32.const 0) $add $start)
            (data (i32.const 8) "hello"))"#,
    )
    .unwrap();

    let module = decode_module(&bytes).unwrap();
    validate_module(&module).unwrap();

    assert_eq!(module.imports.len(), 2);
    assert_eq!(module.func_count(), 3);
    assert_eq!(module.memories[0].max, Some(4));
    assert_eq!(module.tables[0].limits.min, 2);
    assert_eq!(module.start, Some(2));
    assert_eq!(module.elements[0].init, vec![1, 2]);
    assert_eq!(module.data[0].init, b"hello");
    assert_eq!(module.global_type(1).map(|g| g.value_type), Some(ValueType::I32));
}

#[test]
fn test_validation_rejects_module_level_errors() {
    let cases = [
        (r#"(module (func) (export "f" (func 0)) (export "f" (func 0)))"#, codes::DUPLICATE_EXPORT),
        (r#"(module (func (param i32)) (start 0))"#, codes::INVALID_START_FUNCTION),
        (r#"(module (memory 2 1))"#, codes::INVALID_LIMITS),
        (r#"(module (memory 65537))"#, codes::INVALID_LIMITS),
        (r#"(module (global i32 (i64.const 0)))"#, codes::TYPE_MISMATCH),
        (r#"(module (global (mut i32) (i32.const 0)) (global i32 (global.get 0)))"#, codes::CONSTANT_EXPRESSION_REQUIRED),
        (r#"(module (export "m" (memory 0)))"#, codes::INVALID_MEMORY_INDEX),
        (r#"(module (table 1 funcref) (elem (i32.const 0) 3))"#, codes::INVALID_FUNCTION_INDEX),
        (r#"(module (data (i32.const 0) "x"))"#, codes::INVALID_MEMORY_INDEX),
    ];

    for (text, code) in cases {
        let bytes = wat::parse_str(text).unwrap();
        let module = decode_module(&bytes).unwrap();
        let err = validate_module(&module).unwrap_err();
        assert_eq!(err.code, code, "{text}: {err}");
    }
}

#[test]
fn test_function_without_body() {
    // function section declares one function, no code section
    let mut bytes = binary::WASM_MAGIC.to_vec();
    bytes.extend_from_slice(&binary::WASM_VERSION);
    bytes.extend(write_section(binary::TYPE_SECTION_ID, &[0x01, 0x60, 0x00, 0x00]));
    bytes.extend(write_section(binary::FUNCTION_SECTION_ID, &[0x01, 0x00]));
    let err = decode_and_validate(&bytes).unwrap_err();
    assert_eq!(err.code, codes::FUNCTION_CODE_MISMATCH);
}

#[test]
fn test_decode_errors_name_the_section() {
    let mut bytes = binary::WASM_MAGIC.to_vec();
    bytes.extend_from_slice(&binary::WASM_VERSION);
    bytes.extend(write_section(binary::CODE_SECTION_ID, &[0x01, 0x02, 0x00, 0x06]));
    let err = decode_module(&bytes).unwrap_err();
    assert_eq!(err.code, codes::UNKNOWN_OPCODE);
    assert!(err.message.starts_with("code section"), "{}", err.message);
}
