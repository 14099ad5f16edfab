// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Module validation.
//!
//! Validation runs in two parts: a module-level pass that cross-checks the
//! index spaces, limits, exports, start function and segment initializers,
//! and a per-function abstract interpreter over operand types and control
//! frames. A module that passes both is safe to instantiate.

mod function;
mod module;

pub use function::validate_function;
pub use module::validate_const_expr;

use log::debug;
use wvm_error::{Result, ResultExt};
use wvm_format::module::Module;

/// Validate a decoded module
pub fn validate_module(module: &Module) -> Result<()> {
    module::validate_structure(module)?;

    let imported = module.imported_func_count();
    for (i, (type_idx, code)) in module.functions.iter().zip(&module.codes).enumerate() {
        let func_idx = imported + i;
        validate_function(module, *type_idx, code).with_context(|| format!("func[{func_idx}]"))?;
    }

    debug!("validated {} function bodies", module.codes.len());
    Ok(())
}
