//! Yield collection for the eager coroutine emulation.
//!
//! `coroutine.yield` cannot suspend the host call it runs in. Instead, every
//! wrapped invocation installs a private [`YieldSink`] as the current yield
//! destination, and `yield` appends its arguments there. Installation returns
//! an [`OverrideGuard`]; dropping it restores whatever destination was active
//! before, so nested wrapped calls never see each other's values and the
//! enclosing destination comes back on every exit path, including errors.

use super::errors::{LuaError, LuaResult};
use super::value::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::trace;

/// One `yield` call's worth of values.
#[derive(Debug, Clone, PartialEq)]
pub enum Yielded {
    /// `yield()` with no arguments
    Nil,
    Single(Value),
    /// `yield(a, b, ...)` or a return list, order preserved
    Multi(Vec<Value>),
}

impl Yielded {
    pub fn from_args(mut args: Vec<Value>) -> Self {
        match args.len() {
            0 => Yielded::Nil,
            1 => Yielded::Single(args.remove(0)),
            _ => Yielded::Multi(args),
        }
    }

    /// The values a caller receives when this record is replayed
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Yielded::Nil => vec![Value::Nil],
            Yielded::Single(value) => vec![value],
            Yielded::Multi(values) => values,
        }
    }
}

/// Ordered buffer of yielded records owned by one wrapped invocation.
#[derive(Debug, Clone, Default)]
pub struct YieldSink(Rc<RefCell<Vec<Yielded>>>);

impl YieldSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: Yielded) {
        self.0.borrow_mut().push(record);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Drain everything collected so far
    pub fn take(&self) -> Vec<Yielded> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

/// The current yield destination of one runtime.
#[derive(Debug, Clone, Default)]
pub struct YieldCollector {
    current: Rc<RefCell<Option<YieldSink>>>,
    depth: Rc<Cell<usize>>,
}

impl YieldCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `sink` the active destination until the guard is dropped
    #[must_use = "the previous destination is restored when the guard drops"]
    pub fn install(&self, sink: YieldSink) -> OverrideGuard {
        let previous = self.current.replace(Some(sink));
        self.depth.set(self.depth.get() + 1);
        trace!(depth = self.depth.get(), "yield destination installed");
        OverrideGuard {
            slot: Rc::clone(&self.current),
            depth: Rc::clone(&self.depth),
            previous,
        }
    }

    /// Number of nested destinations currently installed
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Route a `yield` call's arguments into the active destination
    pub fn divert(&self, args: Vec<Value>) -> LuaResult<()> {
        match self.current.borrow().as_ref() {
            Some(sink) => {
                sink.push(Yielded::from_args(args));
                Ok(())
            }
            None => Err(LuaError::runtime("attempt to yield from outside a coroutine")),
        }
    }
}

/// Restores the previously active yield destination on drop.
#[derive(Debug)]
pub struct OverrideGuard {
    slot: Rc<RefCell<Option<YieldSink>>>,
    depth: Rc<Cell<usize>>,
    previous: Option<YieldSink>,
}

impl Drop for OverrideGuard {
    fn drop(&mut self) {
        *self.slot.borrow_mut() = self.previous.take();
        self.depth.set(self.depth.get().saturating_sub(1));
        trace!(depth = self.depth.get(), "yield destination restored");
    }
}
