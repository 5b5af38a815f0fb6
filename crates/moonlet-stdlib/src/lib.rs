pub mod native;

use moonlet_core::vm::LibraryFn;
use moonlet_core::{Runtime, RuntimeConfig};

// Re-export native functions for convenience
pub use native::*;

/// Functions mounted under the `debug` global
pub const DEBUG_LIBRARY: &[(&str, LibraryFn)] = &[
    ("getinfo", native_debug_getinfo),
    ("getlocal", native_debug_getlocal),
    ("getupvalue", native_debug_getupvalue),
    ("getmetatable", native_debug_getmetatable),
    ("setmetatable", native_debug_setmetatable),
    ("traceback", native_debug_traceback),
    ("getregistry", native_debug_getregistry),
    ("sethook", native_debug_sethook),
    ("gethook", native_debug_gethook),
    ("setlocal", native_debug_setlocal),
    ("setupvalue", native_debug_setupvalue),
    ("getuservalue", native_debug_getuservalue),
    ("setuservalue", native_debug_setuservalue),
    ("upvalueid", native_debug_upvalueid),
    ("upvaluejoin", native_debug_upvaluejoin),
];

/// Functions mounted under the `coroutine` global
pub const COROUTINE_LIBRARY: &[(&str, LibraryFn)] = &[
    ("create", native_coroutine_create),
    ("resume", native_coroutine_resume),
    ("yield", native_coroutine_yield),
    ("wrap", native_coroutine_wrap),
    ("status", native_coroutine_status),
    ("close", native_coroutine_close),
    ("isyieldable", native_coroutine_isyieldable),
    ("running", native_coroutine_running),
];

/// Initialize a runtime with the `debug` and `coroutine` libraries.
pub fn init_runtime(mut rt: Runtime) -> Runtime {
    rt.register_library("debug", DEBUG_LIBRARY);
    rt.register_library("coroutine", COROUTINE_LIBRARY);
    rt
}

/// Create a runtime from `config` with the libraries already mounted.
pub fn new_runtime(config: RuntimeConfig) -> Runtime {
    init_runtime(Runtime::with_config(config))
}
