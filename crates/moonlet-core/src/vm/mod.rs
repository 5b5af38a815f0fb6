mod errors;
mod frames;
mod runtime;
mod stack;

pub mod metatable;
pub mod value;
pub mod yields;

pub use errors::*;
pub use frames::*;
pub use runtime::*;
pub use stack::*;
pub use value::Value;
