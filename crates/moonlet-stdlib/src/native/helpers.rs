//! Helper functions for native function implementations.

use moonlet_core::vm::value::{Function, TableRef};
use moonlet_core::{LuaError, LuaResult, Value};
use std::rc::Rc;

/// Argument at 0-based `index`, nil when absent
pub fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Nil)
}

/// Drop a leading thread argument (`debug.getinfo(co, ...)` and friends).
/// Only the main thread exists, so the argument selects nothing.
pub fn skip_thread(args: &[Value]) -> &[Value] {
    match args.first() {
        Some(Value::Thread(_)) => &args[1..],
        _ => args,
    }
}

/// Integer argument or nil, without raising
pub fn opt_integer(args: &[Value], index: usize) -> Option<i64> {
    args.get(index).and_then(Value::as_integer)
}

pub fn check_function(args: &[Value], index: usize, function: &str) -> LuaResult<Rc<Function>> {
    match args.get(index) {
        Some(Value::Function(f)) => Ok(Rc::clone(f)),
        other => Err(LuaError::bad_argument(
            index + 1,
            function,
            format!("function expected, got {}", type_name_of(other)),
        )),
    }
}

/// `nil` or a table, as accepted by `setmetatable`
pub fn check_table_or_nil(
    args: &[Value],
    index: usize,
    function: &str,
) -> LuaResult<Option<TableRef>> {
    match args.get(index) {
        Some(Value::Nil) => Ok(None),
        Some(Value::Table(t)) => Ok(Some(Rc::clone(t))),
        _ => Err(LuaError::bad_argument(index + 1, function, "nil or table expected")),
    }
}

/// Fail unless at least `count` arguments were passed, blaming the first
/// missing one
pub fn check_arity(args: &[Value], count: usize, function: &str) -> LuaResult<()> {
    if args.len() < count {
        return Err(LuaError::bad_argument(args.len() + 1, function, "value expected"));
    }
    Ok(())
}

/// Lua's name for a possibly missing argument
pub fn type_name_of(value: Option<&Value>) -> &'static str {
    match value {
        Some(v) => v.type_name(),
        None => "no value",
    }
}

/// The `(nil, nil)` pair enumeration functions return on a miss
pub fn nil_pair() -> Vec<Value> {
    vec![Value::Nil, Value::Nil]
}
