// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The stack machine.
//!
//! One [`Vm`] is one module instance. Execution is a flat loop over the top
//! control frame: when the frame's program counter reaches the end of its
//! body the frame exits, otherwise the next instruction is dispatched.
//! Calls between wasm functions push frames instead of recursing, so the
//! native stack only grows when a host function calls back in.

use core::cell::RefCell;
use std::rc::{Rc, Weak};

use log::trace;
use wvm_error::{Error, Result, codes, kinds};
use wvm_format::{
    instructions::Expr,
    module::{ExternalKind, Module},
    types::{FuncType, Value},
};
use wvm_host::{FuncRef, Function, Global, GlobalRef, Member, MemoryRef, TableRef, check_args, linker};

use crate::{
    config::VmConfig,
    frame::{ControlFrame, FrameKind},
    func::{Func, VmFunc},
    stack::OperandStack,
};

/// A module instance and its execution state
pub struct Vm {
    pub(crate) module:     Module,
    pub(crate) config:     VmConfig,
    pub(crate) stack:      OperandStack,
    pub(crate) frames:     Vec<ControlFrame>,
    pub(crate) call_depth: usize,
    /// Operand stack index of local 0 of the executing call
    pub(crate) local0:     usize,
    pub(crate) funcs:      Vec<Func>,
    pub(crate) globals:    Vec<GlobalRef>,
    pub(crate) memory:     Option<MemoryRef>,
    pub(crate) table:      Option<TableRef>,
    pub(crate) self_ref:   Weak<RefCell<Vm>>,
}

impl Vm {
    /// An instance with empty index spaces; [`Vm::instantiate`] fills them
    pub(crate) fn new(module: Module, config: VmConfig, self_ref: Weak<RefCell<Vm>>) -> Self {
        Self {
            module,
            config,
            stack: OperandStack::new(config.max_operand_stack),
            frames: Vec::new(),
            call_depth: 0,
            local0: 0,
            funcs: Vec::new(),
            globals: Vec::new(),
            memory: None,
            table: None,
            self_ref,
        }
    }

    /// The module this instance was created from
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Resource limits of this instance
    #[must_use]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Memory of the instance, imported or defined
    #[must_use]
    pub fn memory(&self) -> Option<MemoryRef> {
        self.memory.clone()
    }

    /// Number of slots on the operand stack
    #[must_use]
    pub fn stack_height(&self) -> usize {
        self.stack.len()
    }

    /// Number of active control frames
    #[must_use]
    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    /// Call the exported function `name`
    pub fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Vec<Value>> {
        let index = self.export_index(name, ExternalKind::Func)?;
        self.invoke_index(index, args)
    }

    /// Call a function by index with type-checked arguments.
    ///
    /// Stacks are restored to their entry state if the call fails, so the
    /// instance stays usable after a trap.
    pub fn invoke_index(&mut self, index: u32, args: &[Value]) -> Result<Vec<Value>> {
        let ty = self.func(index)?.func_type().clone();
        check_args(&ty, args)?;

        let (height, depth, local0, call_depth) = (self.stack.len(), self.frames.len(), self.local0, self.call_depth);
        let result = self.run_call(index, &ty, args);
        if result.is_err() {
            self.stack.truncate(height);
            self.frames.truncate(depth);
            self.local0 = local0;
            self.call_depth = call_depth;
        }
        result
    }

    fn run_call(&mut self, index: u32, ty: &FuncType, args: &[Value]) -> Result<Vec<Value>> {
        for arg in args {
            self.stack.push(arg.to_bits())?;
        }
        let entry = self.frames.len();
        self.call(index)?;
        self.run(entry)?;

        let bits = self.stack.pop_n(ty.results.len())?;
        Ok(ty.results.iter().zip(bits).map(|(ty, bits)| Value::from_bits(*ty, bits)).collect())
    }

    /// Execute until the control stack is back at `entry_depth`
    fn run(&mut self, entry_depth: usize) -> Result<()> {
        while self.frames.len() > entry_depth {
            let Some(frame) = self.frames.last_mut() else { break };
            if frame.is_finished() {
                self.exit_frame()?;
                continue;
            }
            let body = Expr::clone(&frame.body);
            let pc = frame.pc;
            frame.pc += 1;

            let instr = &body[pc];
            trace!("{pc:>4}: {}", instr.name());
            self.execute(instr).map_err(|e| e.context(format!("instruction {pc} ({})", instr.name())))?;
        }
        Ok(())
    }

    /// Entry of the function index space
    pub(crate) fn func(&self, index: u32) -> Result<&Func> {
        self.funcs
            .get(index as usize)
            .ok_or_else(|| kinds::trap(codes::UNDEFINED_FUNCTION, format!("undefined function {index}")))
    }

    /// Shareable handle to a function of this instance
    pub(crate) fn func_ref(&self, index: u32) -> Option<FuncRef> {
        match self.funcs.get(index as usize)? {
            Func::External(func) => Some(Rc::clone(func)),
            Func::Internal { ty, .. } => {
                Some(Rc::new(VmFunc { ty: ty.clone(), index, owner: Weak::clone(&self.self_ref) }))
            }
        }
    }

    /// Whether `func` is a handle to one of this instance's own functions;
    /// returns its index
    pub(crate) fn own_func_index(&self, func: &FuncRef) -> Option<u32> {
        let own = func.as_any().downcast_ref::<VmFunc>()?;
        Weak::ptr_eq(&own.owner, &self.self_ref).then_some(own.index)
    }

    fn export_index(&self, name: &str, kind: ExternalKind) -> Result<u32> {
        self.module
            .export(name)
            .filter(|export| export.desc.kind == kind)
            .map(|export| export.desc.index)
            .ok_or_else(|| linker::export_not_found(&kind.to_string(), name))
    }

    fn global(&self, name: &str) -> Result<&GlobalRef> {
        let index = self.export_index(name, ExternalKind::Global)?;
        self.globals.get(index as usize).ok_or_else(|| missing("global"))
    }

    /// Pop the top frame, leaving its results on the operand stack
    pub(crate) fn exit_frame(&mut self) -> Result<()> {
        let frame = self.frames.pop().ok_or_else(|| missing("control frame"))?;
        self.stack.unwind(frame.base, frame.results)?;
        if frame.kind == FrameKind::Call {
            self.local0 = frame.saved_local0;
            self.call_depth -= 1;
        }
        Ok(())
    }
}

/// Error for an index space entry the instance does not have
pub(crate) fn missing(what: &str) -> Error {
    kinds::trap(codes::MISSING_INSTANCE, format!("no {what} in this instance"))
}

impl wvm_host::Module for Vm {
    fn get_member(&self, name: &str) -> Option<Member> {
        let export = self.module.export(name)?;
        let index = export.desc.index;
        match export.desc.kind {
            ExternalKind::Func => self.func_ref(index).map(Member::Func),
            ExternalKind::Global => self.globals.get(index as usize).cloned().map(Member::Global),
            ExternalKind::Memory => self.memory.clone().map(Member::Memory),
            ExternalKind::Table => self.table.clone().map(Member::Table),
        }
    }

    fn invoke_func(&mut self, name: &str, args: &[Value]) -> Result<Vec<Value>> {
        self.invoke(name, args)
    }

    fn get_global(&self, name: &str) -> Result<Value> {
        Ok(self.global(name)?.borrow().get())
    }

    fn set_global(&mut self, name: &str, value: Value) -> Result<()> {
        self.global(name)?.borrow_mut().set(value)
    }
}
