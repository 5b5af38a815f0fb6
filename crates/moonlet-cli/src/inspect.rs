//! Subcommands that query a loaded snapshot: `inspect`, `traceback`, `locals`

use crate::snapshot::StackSnapshot;
use crate::utils::{CliError, exit_with, load_config};
use moonlet_core::{Runtime, Value};
use moonlet_stdlib::{DebugInfo, InfoOptions};
use serde::Serialize;

/// One stack level and what `debug.getinfo` reports for it
#[derive(Debug, Serialize)]
pub struct LevelInfo {
    pub level: usize,
    #[serde(flatten)]
    pub info: DebugInfo,
}

/// Build a runtime with the libraries mounted and the snapshot's frames pushed
pub fn load_runtime(snapshot: &str, config: Option<&str>) -> Result<Runtime, CliError> {
    let config = load_config(config)?;
    let snapshot = StackSnapshot::load(snapshot)?;
    let mut rt = moonlet_stdlib::new_runtime(config);
    snapshot.install(&mut rt);
    Ok(rt)
}

/// Snapshots for every level, or for `level` alone
pub fn collect_levels(
    rt: &Runtime,
    what: &str,
    level: Option<usize>,
) -> Result<Vec<LevelInfo>, CliError> {
    let options =
        InfoOptions::parse(what).ok_or_else(|| CliError::InvalidOption(what.to_string()))?;
    let stack = rt.call_stack();

    let levels: Vec<usize> = match level {
        Some(level) if level == 0 || level > stack.depth() => {
            return Err(CliError::LevelOutOfRange {
                level,
                depth: stack.depth(),
            });
        }
        Some(level) => vec![level],
        None => (1..=stack.depth()).collect(),
    };

    Ok(levels
        .into_iter()
        .filter_map(|level| {
            let frame = stack.frame_at_level(level)?;
            Some(LevelInfo {
                level,
                info: DebugInfo::for_frame(frame, rt.script_path(), options),
            })
        })
        .collect())
}

/// Text `debug.traceback(message)` produces against the loaded runtime
pub fn traceback_text(rt: &mut Runtime, message: Option<&str>) -> Result<String, CliError> {
    let traceback = rt.global("debug").get_field("traceback");
    let args = message.map(|m| vec![Value::string(m)]).unwrap_or_default();
    let result = rt.call_function(&traceback, args)?;
    Ok(result.first().map(Value::to_string).unwrap_or_default())
}

/// `(name, value)` pairs from calling `debug.getlocal(level, i)` until it returns nil
pub fn enumerate_locals(rt: &mut Runtime, level: usize) -> Result<Vec<(String, String)>, CliError> {
    let getlocal = rt.global("debug").get_field("getlocal");
    let level = i64::try_from(level).unwrap_or(i64::MAX);

    let mut locals = Vec::new();
    for index in 1.. {
        let pair = rt.call_function(&getlocal, vec![Value::Integer(level), Value::Integer(index)])?;
        match pair.as_slice() {
            [Value::Nil, ..] | [] => break,
            [name, value, ..] => locals.push((name.to_string(), value.to_string())),
            [name] => locals.push((name.to_string(), Value::Nil.to_string())),
        }
    }
    Ok(locals)
}

pub fn handle_inspect(snapshot: &str, config: Option<&str>, what: &str, level: Option<usize>) {
    let result = load_runtime(snapshot, config)
        .and_then(|rt| collect_levels(&rt, what, level))
        .and_then(|levels| Ok(serde_json::to_string_pretty(&levels)?));
    match result {
        Ok(json) => println!("{json}"),
        Err(err) => exit_with(err),
    }
}

pub fn handle_traceback(snapshot: &str, config: Option<&str>, message: Option<&str>) {
    let result = load_runtime(snapshot, config).and_then(|mut rt| traceback_text(&mut rt, message));
    match result {
        Ok(text) => println!("{text}"),
        Err(err) => exit_with(err),
    }
}

pub fn handle_locals(snapshot: &str, config: Option<&str>, level: usize) {
    let result = load_runtime(snapshot, config).and_then(|mut rt| enumerate_locals(&mut rt, level));
    match result {
        Ok(locals) if locals.is_empty() => println!("(no locals at level {level})"),
        Ok(locals) => {
            for (index, (name, value)) in locals.iter().enumerate() {
                println!("{:>3}  {name} = {value}", index + 1);
            }
        }
        Err(err) => exit_with(err),
    }
}
