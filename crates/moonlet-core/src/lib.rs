pub mod source;
pub mod span;
pub mod vm;

// Re-export commonly used types for convenience
pub use span::{LineIndex, SourceSpan};
pub use vm::{CallStack, Frame, FrameKind, LuaError, LuaResult, Runtime, RuntimeConfig, Value};
