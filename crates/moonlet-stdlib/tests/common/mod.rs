// Common test utilities: a runtime with the libraries mounted and
// scripted guest functions standing in for evaluator-produced closures

#![allow(dead_code)]

use moonlet_core::vm::value::LuaFunction;
use moonlet_core::{LuaResult, Runtime, RuntimeConfig, Value};

pub fn runtime(script_path: &str) -> Runtime {
    moonlet_stdlib::new_runtime(RuntimeConfig {
        script_path: Some(script_path.to_string()),
        ..RuntimeConfig::default()
    })
}

/// Call `lib.name(args...)` the way guest code would
pub fn lib_call(
    rt: &mut Runtime,
    lib: &str,
    name: &str,
    args: Vec<Value>,
) -> LuaResult<Vec<Value>> {
    let f = rt.global(lib).get_field(name);
    rt.call_function(&f, args)
}

pub fn guest(
    name: &str,
    body: impl Fn(&mut Runtime, Vec<Value>) -> LuaResult<Vec<Value>> + 'static,
) -> Value {
    Value::lua_function(LuaFunction::new(body).named(name))
}

pub fn main_chunk(
    body: impl Fn(&mut Runtime, Vec<Value>) -> LuaResult<Vec<Value>> + 'static,
) -> Value {
    Value::lua_function(LuaFunction::new(body).main_chunk())
}

/// Simulate the evaluator advancing to `line` in the running function
pub fn step(rt: &mut Runtime, line: u32) {
    if let Some(frame) = rt.call_stack_mut().top_mut() {
        frame.set_line(line);
    }
}

pub fn local(rt: &mut Runtime, name: &str, value: Value) {
    if let Some(frame) = rt.call_stack_mut().top_mut() {
        frame.declare_local(name, value);
    }
}

pub fn yield_values(rt: &mut Runtime, values: Vec<Value>) -> LuaResult<()> {
    lib_call(rt, "coroutine", "yield", values).map(|_| ())
}
