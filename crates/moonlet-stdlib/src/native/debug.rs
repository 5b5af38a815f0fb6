//! Debug library: debug.getinfo, getlocal, getupvalue, getmetatable,
//! setmetatable, traceback, getregistry and the hook/upvalue stubs.
//!
//! Levels count from the caller of the debug function. The debug function's
//! own native frame sits at the top of the stack, so a user level `n` is
//! looked up as stack level `n + 1`.

use super::helpers::*;
use super::info::{ALL_OPTIONS, DebugInfo, InfoOptions};
use moonlet_core::vm::value::Function;
use moonlet_core::{CallStack, Frame, LuaError, LuaResult, Runtime, Value};
use tracing::trace;

pub const TRACEBACK_HEADER: &str = "stack traceback:";
pub const TRACEBACK_NATIVE_FRAME: &str = "\t[C]: in ?";

/// Frame a user-supplied level refers to, if the stack is that deep
fn frame_for_level(stack: &CallStack, level: i64) -> Option<&Frame> {
    let level = usize::try_from(level.checked_add(1)?).ok()?;
    stack.frame_at_level(level)
}

/// Native function: debug.getinfo([thread,] f [, what]) -> table
pub fn native_debug_getinfo(rt: &mut Runtime, args: Vec<Value>) -> LuaResult<Vec<Value>> {
    let args = skip_thread(&args);
    let Some(target) = args.first() else {
        return Err(LuaError::bad_argument(1, "getinfo", "function or level expected"));
    };

    let what = match args.get(1) {
        None | Some(Value::Nil) => ALL_OPTIONS.to_string(),
        Some(Value::String(s)) => s.to_string(),
        Some(other) => {
            return Err(LuaError::bad_argument(
                2,
                "getinfo",
                format!("string expected, got {}", other.type_name()),
            ));
        }
    };
    let options = InfoOptions::parse(&what)
        .ok_or_else(|| LuaError::bad_argument(2, "getinfo", "invalid option"))?;

    let stack = rt.call_stack();
    let fallback = rt.script_path();
    let info = match target {
        Value::Function(function) => DebugInfo::for_function(function, fallback, options),
        level if level.as_integer().is_some() => {
            let level = level.as_integer().unwrap_or_default();
            let frame = frame_for_level(stack, level).or_else(|| {
                trace!(level, depth = stack.depth(), "getinfo level out of range, using top frame");
                stack.top()
            });
            match frame {
                Some(frame) => DebugInfo::for_frame(frame, fallback, options),
                None => DebugInfo::native_defaults(options),
            }
        }
        other => {
            trace!(kind = other.type_name(), "getinfo on unsupported target");
            DebugInfo::native_defaults(options)
        }
    };

    Ok(vec![info.into_value()])
}

/// Native function: debug.getlocal([thread,] level, index) -> name, value
pub fn native_debug_getlocal(rt: &mut Runtime, args: Vec<Value>) -> LuaResult<Vec<Value>> {
    let args = skip_thread(&args);

    // Parameter names of a function value are not tracked
    if let Some(Value::Function(_)) = args.first() {
        return Ok(vec![Value::Nil]);
    }

    let (Some(level), Some(index)) = (opt_integer(args, 0), opt_integer(args, 1)) else {
        return Ok(nil_pair());
    };

    let local = frame_for_level(rt.call_stack(), level).and_then(|frame| frame.local(index));
    match local {
        Some((name, value)) => Ok(vec![Value::string(name), value.clone()]),
        None => Ok(nil_pair()),
    }
}

/// Native function: debug.getupvalue(f, index) -> name, value
///
/// Functions without an explicit upvalue list report the global
/// environment as upvalue 2 (`_ENV`) and nothing else.
pub fn native_debug_getupvalue(rt: &mut Runtime, args: Vec<Value>) -> LuaResult<Vec<Value>> {
    let function = check_function(&args, 0, "getupvalue")?;
    let Some(index) = opt_integer(&args, 1) else {
        return Ok(nil_pair());
    };

    if let Function::Lua(lua) = function.as_ref()
        && let Some(upvalues) = &lua.upvalues
    {
        let upvalue = usize::try_from(index.saturating_sub(1)).ok().and_then(|i| upvalues.get(i));
        return Ok(match upvalue {
            Some(upvalue) => vec![Value::string(&upvalue.name), upvalue.get()],
            None => nil_pair(),
        });
    }

    match index {
        2 => Ok(vec![Value::string("_ENV"), rt.globals_value()]),
        _ => Ok(nil_pair()),
    }
}

/// Native function: debug.getmetatable(value) -> metatable or protection marker
pub fn native_debug_getmetatable(rt: &mut Runtime, args: Vec<Value>) -> LuaResult<Vec<Value>> {
    check_arity(&args, 1, "getmetatable")?;
    Ok(vec![rt.metatables().get(&args[0])])
}

/// Native function: debug.setmetatable(value, table|nil) -> value
pub fn native_debug_setmetatable(rt: &mut Runtime, args: Vec<Value>) -> LuaResult<Vec<Value>> {
    let metatable = check_table_or_nil(&args, 1, "setmetatable")?;
    let value = arg(&args, 0);
    rt.metatables_mut().set(&value, metatable);
    Ok(vec![value])
}

/// Native function: debug.traceback([thread,] [message [, level]]) -> string
///
/// Produces the header and a single native frame line; it does not unwind
/// the real stack.
pub fn native_debug_traceback(_rt: &mut Runtime, args: Vec<Value>) -> LuaResult<Vec<Value>> {
    let args = skip_thread(&args);
    let message = match args.first() {
        None | Some(Value::Nil) => None,
        Some(Value::String(s)) => Some(s.to_string()),
        Some(n @ (Value::Integer(_) | Value::Number(_))) => Some(n.to_string()),
        // Non-string messages (error objects) pass through untouched
        Some(other) => return Ok(vec![other.clone()]),
    };

    let trace = match message.filter(|m| !m.is_empty()) {
        Some(message) => format!("{message}\n{TRACEBACK_HEADER}\n{TRACEBACK_NATIVE_FRAME}"),
        None => format!("{TRACEBACK_HEADER}\n{TRACEBACK_NATIVE_FRAME}"),
    };
    Ok(vec![Value::string(trace)])
}

/// Native function: debug.getregistry() -> table
pub fn native_debug_getregistry(rt: &mut Runtime, _args: Vec<Value>) -> LuaResult<Vec<Value>> {
    Ok(vec![Value::Table(rt.registry.clone())])
}

/// Native function: debug.sethook([thread,] [hook, mask [, count]])
///
/// Clearing hooks is accepted; hooks never fire, so installing one fails.
pub fn native_debug_sethook(_rt: &mut Runtime, args: Vec<Value>) -> LuaResult<Vec<Value>> {
    let args = skip_thread(&args);
    if args.iter().all(Value::is_nil) {
        return Ok(vec![]);
    }
    Err(LuaError::not_implemented("debug.sethook"))
}

/// Native function: debug.gethook() -> nil
pub fn native_debug_gethook(_rt: &mut Runtime, _args: Vec<Value>) -> LuaResult<Vec<Value>> {
    Ok(vec![Value::Nil])
}

/// Native function: debug.setlocal(level, index, value) -> nil
pub fn native_debug_setlocal(_rt: &mut Runtime, args: Vec<Value>) -> LuaResult<Vec<Value>> {
    check_arity(skip_thread(&args), 3, "setlocal")?;
    Ok(vec![Value::Nil])
}

/// Native function: debug.setupvalue(f, index, value) -> nil
pub fn native_debug_setupvalue(_rt: &mut Runtime, args: Vec<Value>) -> LuaResult<Vec<Value>> {
    check_arity(&args, 3, "setupvalue")?;
    Ok(vec![Value::Nil])
}

/// Native function: debug.getuservalue(u [, n]) -> nil, false
pub fn native_debug_getuservalue(_rt: &mut Runtime, _args: Vec<Value>) -> LuaResult<Vec<Value>> {
    Ok(vec![Value::Nil, Value::Boolean(false)])
}

/// Native function: debug.setuservalue(u, value [, n]) -> u
pub fn native_debug_setuservalue(_rt: &mut Runtime, args: Vec<Value>) -> LuaResult<Vec<Value>> {
    check_arity(&args, 2, "setuservalue")?;
    Ok(vec![args[0].clone()])
}

/// Native function: debug.upvalueid(f, n)
pub fn native_debug_upvalueid(_rt: &mut Runtime, _args: Vec<Value>) -> LuaResult<Vec<Value>> {
    Err(LuaError::not_implemented("debug.upvalueid"))
}

/// Native function: debug.upvaluejoin(f1, n1, f2, n2)
pub fn native_debug_upvaluejoin(_rt: &mut Runtime, _args: Vec<Value>) -> LuaResult<Vec<Value>> {
    Err(LuaError::not_implemented("debug.upvaluejoin"))
}
