//! Snapshots returned by `debug.getinfo`.
//!
//! The evaluator does not track line ranges, arity or upvalue counts, so
//! `linedefined`/`lastlinedefined` are always -1, `nups` and `nparams` are 0
//! and every function is reported as vararg.

use moonlet_core::source::ChunkSource;
use moonlet_core::vm::value::Function;
use moonlet_core::{Frame, FrameKind, Value};
use serde::Serialize;

/// All options, used when `getinfo` is called without a `what` string
pub const ALL_OPTIONS: &str = "flnStu";

const UNTRACKED_LINE: i64 = -1;

/// Which groups of fields a `what` string asks for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InfoOptions {
    pub name: bool,
    pub source: bool,
    pub line: bool,
    pub tail_call: bool,
    pub upvalues: bool,
    /// Function handles are not materialized; `func` is always nil
    pub func: bool,
}

impl InfoOptions {
    /// Parse a `what` string; `None` when it contains an unknown option
    pub fn parse(what: &str) -> Option<InfoOptions> {
        let mut options = InfoOptions::default();
        for ch in what.chars() {
            match ch {
                'n' => options.name = true,
                'S' => options.source = true,
                'l' => options.line = true,
                't' => options.tail_call = true,
                'u' => options.upvalues = true,
                'f' => options.func = true,
                // Active lines and transfer info are accepted but not tracked
                'L' | 'r' => {}
                _ => return None,
            }
        }
        Some(options)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DebugInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namewhat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub what: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currentline: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linedefined: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastlinedefined: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nups: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nparams: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isvararg: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub istailcall: Option<bool>,
}

impl DebugInfo {
    /// Snapshot of an active frame
    pub fn for_frame(frame: &Frame, fallback_path: Option<&str>, options: InfoOptions) -> Self {
        let mut info = DebugInfo::default();
        if options.name {
            info.set_name(frame.name.clone());
        }
        if options.source {
            let what = match frame.kind {
                FrameKind::Lua => "Lua",
                FrameKind::Main => "main",
                FrameKind::Native => "C",
            };
            info.set_source(what, ChunkSource::for_frame(frame, fallback_path));
        }
        if options.line {
            info.currentline = Some(
                frame
                    .current_line()
                    .map(i64::from)
                    .unwrap_or(UNTRACKED_LINE),
            );
        }
        info.fill_constants(options);
        info
    }

    /// Snapshot of a function value that is not necessarily running
    pub fn for_function(
        function: &Function,
        fallback_path: Option<&str>,
        options: InfoOptions,
    ) -> Self {
        let mut info = DebugInfo::default();
        if options.name {
            info.set_name(None);
        }
        if options.source {
            let what = match function {
                Function::Native(_) => "C",
                Function::Lua(lua) if lua.is_main_chunk => "main",
                Function::Lua(_) => "Lua",
            };
            info.set_source(what, ChunkSource::for_function(function, fallback_path));
        }
        if options.line {
            info.currentline = Some(UNTRACKED_LINE);
        }
        info.fill_constants(options);
        info
    }

    /// Snapshot used when there is nothing to describe
    pub fn native_defaults(options: InfoOptions) -> Self {
        let mut info = DebugInfo::default();
        if options.name {
            info.set_name(None);
        }
        if options.source {
            info.set_source("C", ChunkSource::native());
        }
        if options.line {
            info.currentline = Some(UNTRACKED_LINE);
        }
        info.fill_constants(options);
        info
    }

    fn set_name(&mut self, name: Option<String>) {
        self.namewhat = Some(if name.is_some() { "global" } else { "" }.to_string());
        self.name = name;
    }

    fn set_source(&mut self, what: &str, chunk: ChunkSource) {
        self.what = Some(what.to_string());
        self.source = Some(chunk.source);
        self.short_src = Some(chunk.short_src);
        self.linedefined = Some(UNTRACKED_LINE);
        self.lastlinedefined = Some(UNTRACKED_LINE);
    }

    fn fill_constants(&mut self, options: InfoOptions) {
        if options.tail_call {
            self.istailcall = Some(false);
        }
        if options.upvalues {
            self.nups = Some(0);
            self.nparams = Some(0);
            self.isvararg = Some(true);
        }
    }

    /// The guest-visible table; absent fields are simply not set
    pub fn into_value(self) -> Value {
        let table = Value::new_table();
        if let Value::Table(t) = &table {
            let mut t = t.borrow_mut();
            let strings = [
                ("name", self.name),
                ("namewhat", self.namewhat),
                ("what", self.what),
                ("source", self.source),
                ("short_src", self.short_src),
            ];
            for (key, value) in strings {
                if let Some(s) = value {
                    t.set(key, Value::string(s));
                }
            }
            let integers = [
                ("currentline", self.currentline),
                ("linedefined", self.linedefined),
                ("lastlinedefined", self.lastlinedefined),
                ("nups", self.nups),
                ("nparams", self.nparams),
            ];
            for (key, value) in integers {
                if let Some(n) = value {
                    t.set(key, Value::Integer(n));
                }
            }
            for (key, value) in [("isvararg", self.isvararg), ("istailcall", self.istailcall)] {
                if let Some(b) = value {
                    t.set(key, Value::Boolean(b));
                }
            }
        }
        table
    }
}
