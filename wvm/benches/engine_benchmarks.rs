// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use wvm::prelude::*;

const FIB: &str = r#"(module
    (func $fib (export "fib") (param i32) (result i32)
        local.get 0
        i32.const 2
        i32.lt_u
        if (result i32)
            local.get 0
        else
            local.get 0
            i32.const 1
            i32.sub
            call $fib
            local.get 0
            i32.const 2
            i32.sub
            call $fib
            i32.add
        end)
    (func (export "sum") (param i32) (result i64) (local i64)
        block $done
            loop $next
                local.get 0
                i32.eqz
                br_if $done
                local.get 1
                local.get 0
                i64.extend_i32_u
                i64.add
                local.set 1
                local.get 0
                i32.const 1
                i32.sub
                local.set 0
                br $next
            end
        end
        local.get 1))"#;

fn benchmark_module_loading(c: &mut Criterion) {
    let bytes = wat::parse_str(FIB).unwrap();
    let mut group = c.benchmark_group("module_loading");

    group.bench_function("decode", |b| b.iter(|| wvm::decode_module_from_bytes(black_box(&bytes)).unwrap()));

    let module = wvm::decode_module_from_bytes(&bytes).unwrap();
    group.bench_function("instantiate", |b| {
        b.iter(|| wvm::instantiate(black_box(module.clone()), &Externals::new()).unwrap());
    });

    group.finish();
}

fn benchmark_execution(c: &mut Criterion) {
    let bytes = wat::parse_str(FIB).unwrap();
    let module = wvm::decode_module_from_bytes(&bytes).unwrap();
    let instance = wvm::instantiate(module, &Externals::new()).unwrap();
    let mut group = c.benchmark_group("execution");

    group.bench_function("fib(20)", |b| b.iter(|| instance.invoke("fib", black_box(&[Value::I32(20)])).unwrap()));
    group.bench_function("sum(10000)", |b| {
        b.iter(|| instance.invoke("sum", black_box(&[Value::I32(10_000)])).unwrap());
    });

    group.finish();
}

criterion_group!(benches, benchmark_module_loading, benchmark_execution);
criterion_main!(benches);
