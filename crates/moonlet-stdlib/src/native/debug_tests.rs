//! Tests for the debug library

use crate::init_runtime;
use moonlet_core::span::SourceSpan;
use moonlet_core::vm::value::{LuaFunction, ThreadId, Upvalue};
use moonlet_core::{LuaError, LuaResult, Runtime, Value};

fn runtime() -> Runtime {
    init_runtime(Runtime::new_with_file(Some("@main.lua".to_string())))
}

fn debug_call(rt: &mut Runtime, name: &str, args: Vec<Value>) -> LuaResult<Vec<Value>> {
    let f = rt.global("debug").get_field(name);
    rt.call_function(&f, args)
}

fn at_line(rt: &mut Runtime, line: u32) {
    rt.call_stack_mut().top_mut().expect("active frame").set_line(line);
}

fn lua(
    name: &str,
    body: impl Fn(&mut Runtime, Vec<Value>) -> LuaResult<Vec<Value>> + 'static,
) -> Value {
    Value::lua_function(LuaFunction::new(body).named(name))
}

#[test]
fn test_getinfo_currentline_per_level() {
    let mut rt = runtime();
    let inner = lua("inner", |rt, _| {
        at_line(rt, 7);
        let own = debug_call(rt, "getinfo", vec![Value::Integer(1), Value::string("l")])?;
        let caller = debug_call(rt, "getinfo", vec![Value::Integer(2), Value::string("l")])?;
        Ok(vec![own[0].get_field("currentline"), caller[0].get_field("currentline")])
    });
    let main = Value::lua_function(
        LuaFunction::new(move |rt, _| {
            at_line(rt, 3);
            rt.call_function(&inner, vec![])
        })
        .main_chunk(),
    );

    let lines = rt.call_function(&main, vec![]).unwrap();
    assert_eq!(lines, vec![Value::Integer(7), Value::Integer(3)]);
}

#[test]
fn test_getinfo_unknown_line_is_minus_one() {
    let mut rt = runtime();
    let f = lua("f", |rt, _| {
        debug_call(rt, "getinfo", vec![Value::Integer(1), Value::string("l")])
    });
    let info = rt.call_function(&f, vec![]).unwrap();
    assert_eq!(info[0].get_field("currentline"), Value::Integer(-1));
}

#[test]
fn test_getinfo_level_too_deep_falls_back_to_top() {
    let mut rt = runtime();
    let f = lua("f", |rt, _| {
        debug_call(rt, "getinfo", vec![Value::Integer(50), Value::string("nSl")])
    });
    let info = rt.call_function(&f, vec![]).unwrap();
    // The top frame is getinfo's own native frame
    assert_eq!(info[0].get_field("what"), Value::string("C"));
    assert_eq!(info[0].get_field("name"), Value::string("getinfo"));
    assert_eq!(info[0].get_field("currentline"), Value::Integer(-1));
}

#[test]
fn test_getinfo_only_requested_fields_present() {
    let mut rt = runtime();
    let f = lua("f", |rt, _| {
        debug_call(rt, "getinfo", vec![Value::Integer(1), Value::string("n")])
    });
    let info = rt.call_function(&f, vec![]).unwrap();
    let table = info[0].as_table().expect("table").borrow();
    assert_eq!(table.get("name"), Value::string("f"));
    assert_eq!(table.get("namewhat"), Value::string("global"));
    assert!(!table.contains("currentline"));
    assert!(!table.contains("source"));
    assert!(!table.contains("func"));
}

#[test]
fn test_getinfo_sentinel_name_reports_no_name() {
    let mut rt = runtime();
    let f = lua("unknown", |rt, _| {
        debug_call(rt, "getinfo", vec![Value::Integer(1), Value::string("n")])
    });
    let info = rt.call_function(&f, vec![]).unwrap();
    assert_eq!(info[0].get_field("name"), Value::Nil);
    assert_eq!(info[0].get_field("namewhat"), Value::string(""));
}

#[test]
fn test_getinfo_source_of_file_chunk() {
    let mut rt = runtime();
    let main = Value::lua_function(
        LuaFunction::new(|rt, _| {
            debug_call(rt, "getinfo", vec![Value::Integer(1), Value::string("S")])
        })
        .main_chunk(),
    );
    let info = rt.call_function(&main, vec![]).unwrap();
    assert_eq!(info[0].get_field("what"), Value::string("main"));
    assert_eq!(info[0].get_field("source"), Value::string("@main.lua"));
    assert_eq!(info[0].get_field("short_src"), Value::string("main.lua"));
    assert_eq!(info[0].get_field("linedefined"), Value::Integer(-1));
    assert_eq!(info[0].get_field("lastlinedefined"), Value::Integer(-1));
}

#[test]
fn test_getinfo_on_function_values() {
    let mut rt = init_runtime(Runtime::new());
    let span = SourceSpan::with_url(0, 4, "file:///src/util.lua");
    let from_file = Value::lua_function(LuaFunction::new(|_, _| Ok(vec![])).with_span(span));
    let info = native_getinfo(&mut rt, vec![from_file, Value::string("S")]);
    assert_eq!(info.get_field("what"), Value::string("Lua"));
    assert_eq!(info.get_field("source"), Value::string("@util.lua"));

    let builtin = rt.global("debug").get_field("traceback");
    let info = native_getinfo(&mut rt, vec![builtin, Value::string("Su")]);
    assert_eq!(info.get_field("what"), Value::string("C"));
    assert_eq!(info.get_field("source"), Value::string("=[C]"));
    assert_eq!(info.get_field("short_src"), Value::string("[C]"));
    assert_eq!(info.get_field("nups"), Value::Integer(0));
    assert_eq!(info.get_field("nparams"), Value::Integer(0));
    assert_eq!(info.get_field("isvararg"), Value::Boolean(true));
}

fn native_getinfo(rt: &mut Runtime, args: Vec<Value>) -> Value {
    super::native_debug_getinfo(rt, args).unwrap().remove(0)
}

#[test]
fn test_getinfo_unsupported_target_gets_native_defaults() {
    let mut rt = Runtime::new();
    let info = native_getinfo(&mut rt, vec![Value::string("nope"), Value::string("St")]);
    assert_eq!(info.get_field("what"), Value::string("C"));
    assert_eq!(info.get_field("istailcall"), Value::Boolean(false));
}

#[test]
fn test_getinfo_argument_errors() {
    let mut rt = Runtime::new();
    let err = super::native_debug_getinfo(&mut rt, vec![]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "bad argument #1 to 'getinfo' (function or level expected)"
    );

    let err = super::native_debug_getinfo(&mut rt, vec![Value::Integer(1), Value::string("x")])
        .unwrap_err();
    assert_eq!(err.to_string(), "bad argument #2 to 'getinfo' (invalid option)");

    let err = super::native_debug_getinfo(&mut rt, vec![Value::Integer(1), Value::Integer(5)])
        .unwrap_err();
    assert!(matches!(err, LuaError::BadArgument { position: 2, .. }));
}

#[test]
fn test_getinfo_skips_thread_argument() {
    let mut rt = runtime();
    let f = lua("f", |rt, _| {
        at_line(rt, 12);
        debug_call(
            rt,
            "getinfo",
            vec![Value::Thread(ThreadId::MAIN), Value::Integer(1), Value::string("l")],
        )
    });
    let info = rt.call_function(&f, vec![]).unwrap();
    assert_eq!(info[0].get_field("currentline"), Value::Integer(12));
}

#[test]
fn test_getlocal_enumerates_until_nil() {
    let mut rt = runtime();
    let f = lua("f", |rt, _| {
        let frame = rt.call_stack_mut().top_mut().expect("frame");
        frame.declare_local("a", Value::Integer(1));
        frame.declare_local("b", Value::string("two"));
        frame.declare_local("a", Value::Integer(3));

        let mut seen = Vec::new();
        for index in 0..=4 {
            let pair = debug_call(rt, "getlocal", vec![Value::Integer(1), Value::Integer(index)])?;
            seen.push(pair);
        }
        Ok(seen.into_iter().flatten().collect())
    });

    let seen = rt.call_function(&f, vec![]).unwrap();
    assert_eq!(
        seen,
        vec![
            Value::Nil,
            Value::Nil,
            Value::string("a"),
            Value::Integer(1),
            Value::string("b"),
            Value::string("two"),
            Value::string("a"),
            Value::Integer(3),
            Value::Nil,
            Value::Nil,
        ]
    );
}

#[test]
fn test_getlocal_soft_misses() {
    let mut rt = runtime();
    let pair =
        debug_call(&mut rt, "getlocal", vec![Value::string("x"), Value::Integer(1)]).unwrap();
    assert_eq!(pair, vec![Value::Nil, Value::Nil]);

    let pair =
        debug_call(&mut rt, "getlocal", vec![Value::Integer(40), Value::Integer(1)]).unwrap();
    assert_eq!(pair, vec![Value::Nil, Value::Nil]);

    let f = rt.global("debug").get_field("getinfo");
    let result = debug_call(&mut rt, "getlocal", vec![f, Value::Integer(1)]).unwrap();
    assert_eq!(result, vec![Value::Nil]);
}

#[test]
fn test_getupvalue_explicit_cells() {
    let mut rt = Runtime::new();
    let counter = Upvalue::new("counter", Value::Integer(4));
    let cell = counter.value.clone();
    let f = Value::lua_function(LuaFunction::new(|_, _| Ok(vec![])).with_upvalues(vec![counter]));

    let pair = super::native_debug_getupvalue(&mut rt, vec![f.clone(), Value::Integer(1)]).unwrap();
    assert_eq!(pair, vec![Value::string("counter"), Value::Integer(4)]);

    // Writes through the shared cell are visible
    *cell.borrow_mut() = Value::Integer(5);
    let pair = super::native_debug_getupvalue(&mut rt, vec![f.clone(), Value::Integer(1)]).unwrap();
    assert_eq!(pair[1], Value::Integer(5));

    for index in [0, 2] {
        let args = vec![f.clone(), Value::Integer(index)];
        let pair = super::native_debug_getupvalue(&mut rt, args).unwrap();
        assert_eq!(pair, vec![Value::Nil, Value::Nil]);
    }
}

#[test]
fn test_getupvalue_env_convention() {
    let mut rt = Runtime::new();
    let f = Value::native("print", |_, _| Ok(vec![]));

    let pair = super::native_debug_getupvalue(&mut rt, vec![f.clone(), Value::Integer(2)]).unwrap();
    assert_eq!(pair, vec![Value::string("_ENV"), rt.globals_value()]);

    for index in [1, 3] {
        let args = vec![f.clone(), Value::Integer(index)];
        let pair = super::native_debug_getupvalue(&mut rt, args).unwrap();
        assert_eq!(pair, vec![Value::Nil, Value::Nil]);
    }

    let err = super::native_debug_getupvalue(&mut rt, vec![Value::Integer(1)]).unwrap_err();
    assert!(err.to_string().contains("function expected"));
}

#[test]
fn test_metatable_round_trip() {
    let mut rt = runtime();
    let t = Value::new_table();
    let m = Value::new_table();

    debug_call(&mut rt, "setmetatable", vec![t.clone(), m.clone()]).unwrap();
    assert_eq!(debug_call(&mut rt, "getmetatable", vec![t.clone()]).unwrap(), vec![m]);

    let returned = debug_call(&mut rt, "setmetatable", vec![t.clone(), Value::Nil]).unwrap();
    assert_eq!(returned, vec![t.clone()]);
    assert_eq!(debug_call(&mut rt, "getmetatable", vec![t]).unwrap(), vec![Value::Nil]);
}

#[test]
fn test_getmetatable_returns_protection_marker() {
    let mut rt = runtime();
    let t = Value::new_table();
    let m = Value::table_from([("__metatable", Value::string("locked"))]);

    debug_call(&mut rt, "setmetatable", vec![t.clone(), m]).unwrap();
    assert_eq!(
        debug_call(&mut rt, "getmetatable", vec![t]).unwrap(),
        vec![Value::string("locked")]
    );
}

#[test]
fn test_metatable_per_type_default() {
    let mut rt = runtime();
    let m = Value::new_table();
    debug_call(&mut rt, "setmetatable", vec![Value::Integer(1), m.clone()]).unwrap();
    assert_eq!(debug_call(&mut rt, "getmetatable", vec![Value::Number(2.5)]).unwrap(), vec![m]);
    assert_eq!(
        debug_call(&mut rt, "getmetatable", vec![Value::string("s")]).unwrap(),
        vec![Value::Nil]
    );
}

#[test]
fn test_setmetatable_rejects_non_table() {
    let mut rt = runtime();
    let err = debug_call(&mut rt, "setmetatable", vec![Value::new_table(), Value::Integer(1)])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "bad argument #2 to 'setmetatable' (nil or table expected)"
    );
}

#[test]
fn test_traceback_forms() {
    let mut rt = runtime();
    let plain = debug_call(&mut rt, "traceback", vec![]).unwrap();
    assert_eq!(plain, vec![Value::string("stack traceback:\n\t[C]: in ?")]);

    let args = vec![Value::string("oops"), Value::Integer(2)];
    let with_message = debug_call(&mut rt, "traceback", args).unwrap();
    assert_eq!(
        with_message,
        vec![Value::string("oops\nstack traceback:\n\t[C]: in ?")]
    );

    let empty = debug_call(&mut rt, "traceback", vec![Value::string("")]).unwrap();
    assert_eq!(empty, plain);

    let error_object = Value::new_table();
    let passed = debug_call(&mut rt, "traceback", vec![error_object.clone()]).unwrap();
    assert_eq!(passed, vec![error_object]);
}

#[test]
fn test_stubs() {
    let mut rt = runtime();
    assert_eq!(debug_call(&mut rt, "gethook", vec![]).unwrap(), vec![Value::Nil]);
    assert!(debug_call(&mut rt, "sethook", vec![]).unwrap().is_empty());

    let hook = Value::native("hook", |_, _| Ok(vec![]));
    let err = debug_call(&mut rt, "sethook", vec![hook, Value::string("l")]).unwrap_err();
    assert!(matches!(err, LuaError::NotImplemented(_)));

    let err = debug_call(&mut rt, "setlocal", vec![Value::Integer(1)]).unwrap_err();
    assert!(matches!(err, LuaError::BadArgument { position: 2, .. }));
    assert_eq!(err.to_string(), "bad argument #2 to 'setlocal' (value expected)");
    let args = vec![Value::Integer(1), Value::Integer(1), Value::Nil];
    assert_eq!(debug_call(&mut rt, "setlocal", args).unwrap(), vec![Value::Nil]);

    assert_eq!(
        debug_call(&mut rt, "getuservalue", vec![Value::Nil]).unwrap(),
        vec![Value::Nil, Value::Boolean(false)]
    );

    for name in ["upvalueid", "upvaluejoin"] {
        let err = debug_call(&mut rt, name, vec![]).unwrap_err();
        assert_eq!(err.to_string(), format!("debug.{name} is not implemented"));
    }
}

#[test]
fn test_getregistry_is_stable() {
    let mut rt = runtime();
    let a = debug_call(&mut rt, "getregistry", vec![]).unwrap();
    let b = debug_call(&mut rt, "getregistry", vec![]).unwrap();
    assert_eq!(a, b);
    assert_eq!(a[0].type_name(), "table");
}
