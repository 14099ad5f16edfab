// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! # WebAssembly Virtual Machine Daemon (wvmd)
//!
//! Command-line front end for the wvm interpreter.
//!
//! ## Usage
//!
//! ```bash
//! wvmd check <wasm-file>
//! wvmd dump <wasm-file>
//! wvmd run <wasm-file> [--invoke <function>] [--max-call-depth <n>] [args...]
//! ```
//!
//! `run` instantiates the module against a built-in `env` host module
//! (`print_char` and a family of `assert_*` functions), calls `main` or the
//! export named by `--invoke`, and prints the results one per line.
//!
//! Logging honours `RUST_LOG`; `--verbose` switches to debug output.

#![warn(missing_docs)]

mod dump;
mod env;

use std::{
    cell::RefCell,
    io::{self, Write},
    path::{Path, PathBuf},
    rc::Rc,
    time::Instant,
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wvm::{Module, Value, VmConfig, prelude::ExternalKind};

/// WebAssembly Virtual Machine Daemon CLI arguments
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode and validate a module
    Check {
        /// Path to the WebAssembly module
        wasm_file: PathBuf,
    },
    /// Print every section of a module
    Dump {
        /// Path to the WebAssembly module
        wasm_file: PathBuf,
    },
    /// Instantiate a module and call one of its exports
    Run {
        /// Path to the WebAssembly module
        wasm_file: PathBuf,

        /// Exported function to call
        #[arg(long, default_value = "main")]
        invoke: String,

        /// Maximum nesting of wasm calls before the call traps
        #[arg(long, env = "WVM_MAX_CALL_DEPTH")]
        max_call_depth: Option<usize>,

        /// Arguments, parsed according to the export's parameter types
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    initialize_tracing(args.verbose);

    match args.command {
        Command::Check { wasm_file } => check(&wasm_file),
        Command::Dump { wasm_file } => {
            let module = load_module(&wasm_file)?;
            print!("{}", dump::dump(&module));
            Ok(())
        }
        Command::Run { wasm_file, invoke, max_call_depth, args } => {
            run(&wasm_file, &invoke, max_call_depth, &args)
        }
    }
}

fn initialize_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(io::stderr).init();
}

fn load_module(path: &Path) -> Result<Module> {
    debug!("Loading WebAssembly file: {}", path.display());
    let start = Instant::now();
    let module = wvm::decode_module_from_file(path).context("Failed to decode WebAssembly file")?;
    info!("Decoded {} in {:?}", path.display(), start.elapsed());
    Ok(module)
}

fn check(path: &Path) -> Result<()> {
    let module = load_module(path)?;
    wvm::validate(&module).context("Validation failed")?;
    println!("{}: ok", path.display());
    Ok(())
}

fn run(path: &Path, export: &str, max_call_depth: Option<usize>, raw_args: &[String]) -> Result<()> {
    let module = load_module(path)?;

    let ty = module
        .export(export)
        .filter(|e| e.desc.kind == ExternalKind::Func)
        .and_then(|e| module.func_type(e.desc.index))
        .cloned()
        .with_context(|| format!("No exported function {export:?}"))?;
    if raw_args.len() != ty.params.len() {
        bail!("{export} has type {ty} but {} arguments were given", raw_args.len());
    }
    let args = ty
        .params
        .iter()
        .zip(raw_args)
        .map(|(ty, text)| Value::parse(*ty, text))
        .collect::<wvm::Result<Vec<_>>>()?;

    let mut config = VmConfig::default();
    if let Some(depth) = max_call_depth {
        config = config.with_max_call_depth(depth);
    }

    let stdout = Rc::new(RefCell::new(io::stdout()));
    let externals = env::env_externals(Rc::clone(&stdout))?;
    let instance = wvm::instantiate_with_config(module, &externals, config).context("Instantiation failed")?;

    info!("Invoking {export}{ty}");
    let start = Instant::now();
    let results = instance.invoke(export, &args);
    stdout.borrow_mut().flush()?;
    let results = results.with_context(|| format!("Invocation of {export:?} failed"))?;
    debug!("{export} returned after {:?}", start.elapsed());

    for value in results {
        println!("{value}");
    }
    Ok(())
}
