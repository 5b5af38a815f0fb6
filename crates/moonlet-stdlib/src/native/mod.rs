//! Native implementations of the `debug` and `coroutine` libraries.
//!
//! Every function here has the [`LibraryFn`](moonlet_core::vm::LibraryFn)
//! shape so it can be mounted with `Runtime::register_library`.

pub mod coroutine;
pub mod debug;
pub mod helpers;
pub mod info;

pub use coroutine::*;
pub use debug::*;
pub use info::{DebugInfo, InfoOptions};

#[cfg(test)]
mod debug_tests;
