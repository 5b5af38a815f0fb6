//! Error types for guest-visible failures and evaluator control signals

use super::value::Value;
use thiserror::Error;

pub type LuaResult<T> = Result<T, LuaError>;

/// Everything a native library function or a guest call can fail with.
#[derive(Debug, Error)]
pub enum LuaError {
    /// Wrong arity or wrong type for a required argument
    #[error("bad argument #{position} to '{function}' ({message})")]
    BadArgument {
        position: usize,
        function: String,
        message: String,
    },
    /// A primitive the runtime deliberately does not provide
    #[error("{0} is not implemented")]
    NotImplemented(String),
    #[error("{0}")]
    Runtime(RuntimeError),
    /// The evaluator's tail-call signal. Only `Runtime::call_function` and the
    /// coroutine emulator are expected to observe it.
    #[error("tail call escaped its trampoline")]
    TailCall(Box<TailCall>),
}

impl LuaError {
    pub fn bad_argument(position: usize, function: &str, message: impl Into<String>) -> Self {
        LuaError::BadArgument {
            position,
            function: function.to_string(),
            message: message.into(),
        }
    }

    pub fn not_implemented(name: impl Into<String>) -> Self {
        LuaError::NotImplemented(name.into())
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        LuaError::Runtime(RuntimeError::runtime(message.into()))
    }

    pub fn tail_call(target: Value, args: Vec<Value>) -> Self {
        LuaError::TailCall(Box::new(TailCall { target, args }))
    }

    pub fn is_tail_call(&self) -> bool {
        matches!(self, LuaError::TailCall(_))
    }
}

/// A call in return position, handed back to the caller instead of being
/// executed on top of the current frame.
#[derive(Debug, Clone)]
pub struct TailCall {
    pub target: Value,
    pub args: Vec<Value>,
}

/// A runtime error with optional source location information
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub message: String,
    /// `short_src` of the chunk that raised the error
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format_display())
    }
}

impl RuntimeError {
    /// Create a simple runtime error without location info
    pub fn runtime(message: String) -> Self {
        RuntimeError {
            message,
            file: None,
            line: None,
        }
    }

    /// Attach the chunk and line the error was raised from
    pub fn located(self, file: String, line: Option<u32>) -> Self {
        RuntimeError {
            file: Some(file),
            line,
            ..self
        }
    }

    pub fn is_located(&self) -> bool {
        self.file.is_some()
    }

    /// Lua-style one-line form: `file:line: message`, `file: message` when the
    /// line is unknown, or just the message
    pub fn format_display(&self) -> String {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => format!("{}:{}: {}", file, line, self.message),
            (Some(file), None) => format!("{}: {}", file, self.message),
            (None, _) => self.message.clone(),
        }
    }
}
