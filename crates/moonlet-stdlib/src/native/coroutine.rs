//! Coroutine library, emulated without suspension.
//!
//! The host cannot park a call halfway through and resume it later, so
//! `coroutine.wrap` runs its function eagerly: the first call executes the
//! function to completion with a private yield destination installed, and
//! every `coroutine.yield` inside it is recorded instead of suspending. The
//! first recorded value is returned right away and the rest are replayed,
//! one per call, followed by the function's own return values. Once the
//! recording is used up, each call invokes the function again and returns
//! whatever it returns, which keeps plain iterator functions (ones that
//! never yield) working.
//!
//! This differs from real coroutines for infinite producers, for producers
//! whose side effects must interleave with the consumer, and for callers
//! that pass values back in through `resume`. `create`, `resume` and
//! `close` are not provided.

use super::helpers::*;
use moonlet_core::vm::value::ThreadId;
use moonlet_core::vm::yields::{YieldSink, Yielded};
use moonlet_core::vm::{LuaError, LuaResult, Runtime, TailCall, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, trace};

/// State behind one closure returned by `coroutine.wrap`
struct WrappedCoroutine {
    target: Value,
    started: Cell<bool>,
    collected: RefCell<Vec<Yielded>>,
    idx: Cell<usize>,
}

impl WrappedCoroutine {
    fn new(target: Value) -> Self {
        WrappedCoroutine {
            target,
            started: Cell::new(false),
            collected: RefCell::new(Vec::new()),
            idx: Cell::new(0),
        }
    }

    fn call(&self, rt: &mut Runtime, args: Vec<Value>) -> LuaResult<Vec<Value>> {
        if !self.started.replace(true) {
            let (result, mut captured) = self.run_collecting(rt, args)?;
            let Some(first) = captured.first().cloned() else {
                debug!("wrapped function returned without yielding");
                return Ok(result);
            };

            debug!(yields = captured.len(), "wrapped function ran to completion");
            // The direct return is served after the last yield, before any re-invocation
            captured.push(Yielded::Multi(result));
            *self.collected.borrow_mut() = captured;
            self.idx.set(1);
            return Ok(first.into_values());
        }

        if let Some(record) = self.next_replay() {
            return Ok(record.into_values());
        }

        let (result, discarded) = self.run_collecting(rt, args)?;
        if !discarded.is_empty() {
            trace!(count = discarded.len(), "dropping yields from a re-invocation");
        }
        Ok(result)
    }

    fn next_replay(&self) -> Option<Yielded> {
        let idx = self.idx.get();
        let record = self.collected.borrow().get(idx).cloned()?;
        self.idx.set(idx + 1);
        trace!(cursor = idx + 1, "replaying yielded value");
        Some(record)
    }

    /// Run the target once with a fresh yield destination, following a
    /// tail call it hands back so yields in the callee are captured too.
    fn run_collecting(
        &self,
        rt: &mut Runtime,
        args: Vec<Value>,
    ) -> LuaResult<(Vec<Value>, Vec<Yielded>)> {
        let sink = YieldSink::new();
        let _guard = rt.yields().install(sink.clone());

        let result = match rt.invoke(&self.target, args) {
            Err(LuaError::TailCall(call)) => {
                let TailCall { target, args } = *call;
                debug!(callee = %target, "trampolining tail call from wrapped function");
                rt.call_function(&target, args)?
            }
            other => other?,
        };
        Ok((result, sink.take()))
    }
}

/// Native function: coroutine.wrap(f) -> function
pub fn native_coroutine_wrap(_rt: &mut Runtime, args: Vec<Value>) -> LuaResult<Vec<Value>> {
    check_function(&args, 0, "wrap")?;
    let state = Rc::new(WrappedCoroutine::new(args[0].clone()));
    let wrapped = Value::native("wrap", move |rt, args| state.call(rt, args));
    Ok(vec![wrapped])
}

/// Native function: coroutine.yield(...) -> (nothing)
pub fn native_coroutine_yield(rt: &mut Runtime, args: Vec<Value>) -> LuaResult<Vec<Value>> {
    rt.yields().divert(args)?;
    Ok(vec![])
}

/// Native function: coroutine.create(f)
pub fn native_coroutine_create(_rt: &mut Runtime, _args: Vec<Value>) -> LuaResult<Vec<Value>> {
    Err(LuaError::not_implemented("coroutine.create"))
}

/// Native function: coroutine.resume(co, ...)
pub fn native_coroutine_resume(_rt: &mut Runtime, _args: Vec<Value>) -> LuaResult<Vec<Value>> {
    Err(LuaError::not_implemented("coroutine.resume"))
}

/// Native function: coroutine.close(co)
pub fn native_coroutine_close(_rt: &mut Runtime, _args: Vec<Value>) -> LuaResult<Vec<Value>> {
    Err(LuaError::not_implemented("coroutine.close"))
}

/// Native function: coroutine.status([co]) -> "running"
///
/// There is never a second thread whose status could differ.
pub fn native_coroutine_status(_rt: &mut Runtime, _args: Vec<Value>) -> LuaResult<Vec<Value>> {
    Ok(vec![Value::string("running")])
}

/// Native function: coroutine.running() -> main thread, true
pub fn native_coroutine_running(_rt: &mut Runtime, _args: Vec<Value>) -> LuaResult<Vec<Value>> {
    Ok(vec![Value::Thread(ThreadId::MAIN), Value::Boolean(true)])
}

/// Native function: coroutine.isyieldable() -> false
pub fn native_coroutine_isyieldable(_rt: &mut Runtime, _args: Vec<Value>) -> LuaResult<Vec<Value>> {
    Ok(vec![Value::Boolean(false)])
}
