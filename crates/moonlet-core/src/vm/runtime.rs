//! The runtime context threaded through every call

use super::errors::{LuaError, LuaResult, RuntimeError, TailCall};
use super::frames::Frame;
use super::metatable::MetatableRegistry;
use super::stack::CallStack;
use super::value::{Table, TableRef, Value};
use super::yields::YieldCollector;
use crate::source::ChunkSource;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

/// Signature of a library function registered by name
pub type LibraryFn = fn(&mut Runtime, Vec<Value>) -> LuaResult<Vec<Value>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Chunk path reported for frames that carry no path of their own
    pub script_path: Option<String>,
    /// Calls nested deeper than this fail with "stack overflow"
    pub max_call_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            script_path: None,
            max_call_depth: 200,
        }
    }
}

pub struct Runtime {
    pub globals: TableRef,
    pub registry: TableRef,
    call_stack: CallStack,
    metatables: MetatableRegistry,
    yields: YieldCollector,
    config: RuntimeConfig,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn new_with_file(file: Option<String>) -> Self {
        Self::with_config(RuntimeConfig {
            script_path: file,
            ..RuntimeConfig::default()
        })
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let globals = Rc::new(RefCell::new(Table::new()));
        globals
            .borrow_mut()
            .set("_G", Value::Table(Rc::clone(&globals)));

        Runtime {
            globals,
            registry: Rc::new(RefCell::new(Table::new())),
            call_stack: CallStack::new(config.script_path.clone()),
            metatables: MetatableRegistry::new(),
            yields: YieldCollector::new(),
            config,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    pub fn call_stack_mut(&mut self) -> &mut CallStack {
        &mut self.call_stack
    }

    pub fn metatables(&self) -> &MetatableRegistry {
        &self.metatables
    }

    pub fn metatables_mut(&mut self) -> &mut MetatableRegistry {
        &mut self.metatables
    }

    pub fn yields(&self) -> &YieldCollector {
        &self.yields
    }

    /// The interpreter's notion of the script currently being run
    pub fn script_path(&self) -> Option<&str> {
        self.call_stack.script_path.as_deref()
    }

    /// The global environment as a value (`_ENV`)
    pub fn globals_value(&self) -> Value {
        Value::Table(Rc::clone(&self.globals))
    }

    pub fn global(&self, name: &str) -> Value {
        self.globals.borrow().get(name)
    }

    pub fn set_global(&mut self, name: &str, value: Value) {
        self.globals.borrow_mut().set(name, value);
    }

    /// Build a library table from named functions and expose it as a global
    pub fn register_library(&mut self, name: &str, functions: &[(&str, LibraryFn)]) -> TableRef {
        let mut table = Table::new();
        for (fn_name, func) in functions {
            table.set(*fn_name, Value::native(*fn_name, *func));
        }
        let table = Rc::new(RefCell::new(table));
        self.set_global(name, Value::Table(Rc::clone(&table)));
        debug!(library = name, functions = functions.len(), "registered library");
        table
    }

    /// Perform exactly one call. A tail-call signal raised by the callee is
    /// returned to the caller untouched.
    pub fn invoke(&mut self, callee: &Value, args: Vec<Value>) -> LuaResult<Vec<Value>> {
        let function = match callee {
            Value::Function(f) => Rc::clone(f),
            other => {
                return Err(LuaError::runtime(format!(
                    "attempt to call a {} value",
                    other.type_name()
                )));
            }
        };

        let base = self.call_stack.depth();
        if base >= self.config.max_call_depth {
            return Err(LuaError::runtime("stack overflow"));
        }

        let body = function.body();
        self.call_stack.push(Frame::for_function(&function));
        let result = match body(self, args) {
            Err(LuaError::Runtime(err)) if !err.is_located() => {
                Err(LuaError::Runtime(self.locate(err)))
            }
            other => other,
        };
        self.call_stack.unwind_to(base);
        result
    }

    /// Tag an error with the chunk and line of the innermost guest frame.
    /// Errors raised while a native frame is on top stay bare so the guest
    /// frame that called it gets to claim them.
    fn locate(&self, err: RuntimeError) -> RuntimeError {
        let Some(frame) = self.call_stack.top() else {
            return err;
        };
        let chunk = ChunkSource::for_frame(frame, self.script_path());
        if chunk.is_native() {
            return err;
        }
        trace!(file = %chunk.short_src, line = ?frame.current_line(), "locating runtime error");
        err.located(chunk.short_src, frame.current_line())
    }

    /// The evaluator's call entry point: runs `callee` and follows tail calls
    /// until a result or a real error comes back.
    pub fn call_function(&mut self, callee: &Value, args: Vec<Value>) -> LuaResult<Vec<Value>> {
        let mut result = self.invoke(callee, args);
        loop {
            match result {
                Err(LuaError::TailCall(call)) => {
                    let TailCall { target, args } = *call;
                    trace!(callee = %target, "following tail call");
                    result = self.invoke(&target, args);
                }
                other => return other,
            }
        }
    }
}
