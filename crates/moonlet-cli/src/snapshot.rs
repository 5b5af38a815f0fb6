//! Serialized call stacks the inspector loads in place of a running program.
//!
//! ```ron
//! (
//!     script_path: Some("@game.lua"),
//!     frames: [
//!         (kind: Main, line: Some(40)),
//!         (name: Some("update"), line: Some(12), locals: [("dt", Number(0.016))]),
//!     ],
//! )
//! ```
//!
//! Frames are listed oldest first, so the last entry is level 1.

use crate::utils::{CliError, parse_ron, read_source};
use moonlet_core::vm::normalize_call_name;
use moonlet_core::vm::value::Upvalue;
use moonlet_core::{Frame, FrameKind, Runtime, SourceSpan, Value};
use serde::Deserialize;

/// Values that can be written literally in a snapshot
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum Literal {
    Nil,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Nil => Value::Nil,
            Literal::Boolean(b) => Value::Boolean(b),
            Literal::Integer(i) => Value::Integer(i),
            Literal::Number(n) => Value::Number(n),
            Literal::String(s) => Value::string(s),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FrameSnapshot {
    pub name: Option<String>,
    pub kind: FrameKind,
    pub line: Option<u32>,
    pub script_path: Option<String>,
    pub span: Option<SourceSpan>,
    pub locals: Vec<(String, Literal)>,
    pub upvalues: Option<Vec<(String, Literal)>>,
}

impl FrameSnapshot {
    fn into_frame(self) -> Frame {
        let name = self.name.as_deref().and_then(normalize_call_name);
        let mut frame = Frame::new(name, self.kind);
        frame.set_line(self.line.unwrap_or(0));
        frame.script_path = self.script_path;
        frame.span = self.span;
        for (name, value) in self.locals {
            frame.declare_local(name, value.into());
        }
        frame.upvalues = self.upvalues.map(|cells| {
            cells
                .into_iter()
                .map(|(name, value)| Upvalue::new(name, value.into()))
                .collect()
        });
        frame
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StackSnapshot {
    pub script_path: Option<String>,
    pub frames: Vec<FrameSnapshot>,
}

impl StackSnapshot {
    pub fn from_ron(text: &str, path: &str) -> Result<Self, CliError> {
        parse_ron(text, path)
    }

    pub fn load(path: &str) -> Result<Self, CliError> {
        Self::from_ron(&read_source(path)?, path)
    }

    /// Push the frames onto `rt`'s call stack. A snapshot-level script path
    /// replaces the configured one.
    pub fn install(self, rt: &mut Runtime) {
        let stack = rt.call_stack_mut();
        if self.script_path.is_some() {
            stack.script_path = self.script_path;
        }
        for frame in self.frames {
            stack.push(frame.into_frame());
        }
        tracing::debug!(depth = stack.depth(), "snapshot installed");
    }
}
