//! Activation records pushed by the evaluator for every call

use super::value::{Function, Upvalue, Value};
use crate::span::{LineIndex, SourceSpan};
use serde::{Deserialize, Serialize};

/// Names the evaluator uses when it could not attribute a call site.
const ANONYMOUS_CALL_NAMES: &[&str] = &["", "?", "unknown", "function", "anonymous"];

/// Map an evaluator-supplied call-site name to an optional name,
/// treating its placeholder names as "no name".
pub fn normalize_call_name(name: &str) -> Option<String> {
    if ANONYMOUS_CALL_NAMES.contains(&name) {
        None
    } else {
        Some(name.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameKind {
    /// An ordinary guest function
    #[default]
    Lua,
    /// A host-implemented function
    Native,
    /// The top-level chunk
    Main,
}

/// Represents a call frame in the call stack
#[derive(Debug, Clone)]
pub struct Frame {
    pub name: Option<String>,
    pub kind: FrameKind,
    current_line: Option<u32>,
    pub script_path: Option<String>,
    pub span: Option<SourceSpan>,
    /// Locals in declaration order; re-declared names appear twice
    pub locals: Vec<(String, Value)>,
    pub upvalues: Option<Vec<Upvalue>>,
}

impl Frame {
    pub fn new(name: Option<String>, kind: FrameKind) -> Self {
        Frame {
            name,
            kind,
            current_line: None,
            script_path: None,
            span: None,
            locals: Vec::new(),
            upvalues: None,
        }
    }

    /// Frame for a call to `function`
    pub fn for_function(function: &Function) -> Self {
        match function {
            Function::Native(native) => {
                Frame::new(normalize_call_name(&native.name), FrameKind::Native)
            }
            Function::Lua(lua) => {
                let kind = if lua.is_main_chunk {
                    FrameKind::Main
                } else {
                    FrameKind::Lua
                };
                let mut frame = Frame::new(lua.name.as_deref().and_then(normalize_call_name), kind);
                frame.script_path = lua.chunk_name.clone();
                frame.span = lua.span.clone();
                frame.upvalues = lua.upvalues.clone();
                frame
            }
        }
    }

    pub fn with_script_path(mut self, path: impl Into<String>) -> Self {
        self.script_path = Some(path.into());
        self
    }

    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn current_line(&self) -> Option<u32> {
        self.current_line
    }

    /// Record the line being executed; 0 means unknown
    pub fn set_line(&mut self, line: u32) {
        self.current_line = (line > 0).then_some(line);
    }

    /// Record the line containing byte `offset` of the frame's chunk
    pub fn set_position(&mut self, offset: usize, index: &LineIndex) {
        let (line, _) = index.line_col(offset);
        self.set_line(u32::try_from(line).unwrap_or(u32::MAX));
    }

    pub fn declare_local(&mut self, name: impl Into<String>, value: Value) {
        self.locals.push((name.into(), value));
    }

    /// 1-based lookup into the declared locals
    pub fn local(&self, index: i64) -> Option<&(String, Value)> {
        if index < 1 {
            return None;
        }
        self.locals.get((index - 1) as usize)
    }
}
