mod common;

use common::*;
use moonlet_core::span::SourceSpan;
use moonlet_core::vm::value::LuaFunction;
use moonlet_core::{Runtime, Value};

fn getinfo(rt: &mut Runtime, level: i64, what: &str) -> Value {
    lib_call(rt, "debug", "getinfo", vec![Value::Integer(level), Value::string(what)])
        .expect("getinfo")
        .remove(0)
}

#[test]
fn test_caller_location_helper() {
    // function where()
    //     local i = debug.getinfo(2, "Sl")
    //     return i.short_src .. ":" .. i.currentline
    // end
    let mut rt = runtime("@scripts/app.lua");
    let where_fn = guest("where", |rt, _| {
        let info = getinfo(rt, 2, "Sl");
        Ok(vec![Value::string(format!(
            "{}:{}",
            info.get_field("short_src"),
            info.get_field("currentline")
        ))])
    });
    let program = main_chunk(move |rt, _| {
        step(rt, 14);
        rt.call_function(&where_fn, vec![])
    });

    let location = rt.call_function(&program, vec![]).unwrap();
    assert_eq!(location, vec![Value::string("scripts/app.lua:14")]);
}

#[test]
fn test_line_updates_are_observed() {
    let mut rt = runtime("@loop.lua");
    let program = main_chunk(|rt, _| {
        let mut lines = Vec::new();
        for line in [2, 3, 5] {
            step(rt, line);
            lines.push(getinfo(rt, 1, "l").get_field("currentline"));
        }
        Ok(lines)
    });

    let lines = rt.call_function(&program, vec![]).unwrap();
    assert_eq!(lines, vec![Value::Integer(2), Value::Integer(3), Value::Integer(5)]);
}

#[test]
fn test_locals_of_each_level() {
    let mut rt = runtime("@locals.lua");
    let inner = guest("inner", |rt, _| {
        local(rt, "x", Value::Integer(1));

        let mut found = Vec::new();
        for level in 1..=2 {
            let mut index = 1;
            loop {
                let pair = lib_call(
                    rt,
                    "debug",
                    "getlocal",
                    vec![Value::Integer(level), Value::Integer(index)],
                )?;
                if pair[0].is_nil() {
                    break;
                }
                found.push(Value::string(format!("{}:{}={}", level, pair[0], pair[1])));
                index += 1;
            }
        }
        Ok(found)
    });
    let outer = guest("outer", move |rt, _| {
        local(rt, "a", Value::string("alpha"));
        local(rt, "b", Value::Boolean(true));
        rt.call_function(&inner, vec![])
    });

    let found = rt.call_function(&outer, vec![]).unwrap();
    assert_eq!(
        found,
        vec![
            Value::string("1:x=1"),
            Value::string("2:a=alpha"),
            Value::string("2:b=true"),
        ]
    );
}

#[test]
fn test_source_forms_by_origin() {
    let mut rt = runtime("return 1");
    let string_chunk = guest("s", |rt, _| Ok(vec![getinfo(rt, 1, "S")]));
    let info = rt.call_function(&string_chunk, vec![]).unwrap().remove(0);
    assert_eq!(info.get_field("source"), Value::string("return 1"));
    assert_eq!(info.get_field("short_src"), Value::string("return 1"));

    let command_line = Value::lua_function(
        LuaFunction::new(|rt, _| Ok(vec![getinfo(rt, 1, "S")]))
            .with_span(SourceSpan::with_url(0, 8, "-e")),
    );
    let mut rt = moonlet_stdlib::init_runtime(Runtime::new());
    let info = rt.call_function(&command_line, vec![]).unwrap().remove(0);
    assert_eq!(info.get_field("source"), Value::string("=(command line)"));
    assert_eq!(info.get_field("short_src"), Value::string("(command line)"));

    let named = Value::lua_function(
        LuaFunction::new(|rt, _| Ok(vec![getinfo(rt, 1, "S")])).in_chunk("=stdin"),
    );
    let info = rt.call_function(&named, vec![]).unwrap().remove(0);
    assert_eq!(info.get_field("source"), Value::string("=stdin"));
    assert_eq!(info.get_field("short_src"), Value::string("=stdin"));
}

#[test]
fn test_long_file_name_is_shortened() {
    let path = format!("@{}/main.lua", "deeply/nested".repeat(8));
    let mut rt = runtime(&path);
    let program = main_chunk(|rt, _| Ok(vec![getinfo(rt, 1, "S")]));
    let info = rt.call_function(&program, vec![]).unwrap().remove(0);

    assert_eq!(info.get_field("source"), Value::string(&path));
    let short = info.get_field("short_src");
    let short = short.as_str().expect("string");
    assert!(short.starts_with("..."));
    assert!(short.ends_with("/main.lua"));
    assert!(short.len() < 60);
}

#[test]
fn test_native_frames_in_the_stack() {
    let mut rt = runtime("@main.lua");
    let program = main_chunk(|rt, _| {
        // A host function calling back into debug.getinfo sees itself at level 1
        let host = Value::native("pcall", |rt, _| {
            Ok(vec![getinfo(rt, 1, "nS"), getinfo(rt, 2, "S")])
        });
        rt.call_function(&host, vec![])
    });

    let infos = rt.call_function(&program, vec![]).unwrap();
    assert_eq!(infos[0].get_field("what"), Value::string("C"));
    assert_eq!(infos[0].get_field("name"), Value::string("pcall"));
    assert_eq!(infos[0].get_field("short_src"), Value::string("[C]"));
    assert_eq!(infos[1].get_field("what"), Value::string("main"));
}

#[test]
fn test_runtimes_do_not_share_state() {
    let mut a = runtime("@a.lua");
    let mut b = runtime("@b.lua");
    let t = Value::new_table();
    let m = Value::new_table();

    lib_call(&mut a, "debug", "setmetatable", vec![Value::string("s"), m.clone()]).unwrap();
    assert_eq!(
        lib_call(&mut a, "debug", "getmetatable", vec![Value::string("other")]).unwrap(),
        vec![m]
    );
    assert_eq!(
        lib_call(&mut b, "debug", "getmetatable", vec![Value::string("other")]).unwrap(),
        vec![Value::Nil]
    );
    assert_eq!(
        lib_call(&mut b, "debug", "getmetatable", vec![t]).unwrap(),
        vec![Value::Nil]
    );
}
