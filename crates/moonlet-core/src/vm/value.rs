use super::errors::LuaResult;
use super::metatable::TypeTag;
use super::runtime::Runtime;
use crate::span::SourceSpan;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub type TableRef = Rc<RefCell<Table>>;

/// Host closure behind every callable value. Guest function bodies handed
/// over by the evaluator have the same shape as native library functions.
pub type NativeFn = Rc<dyn Fn(&mut Runtime, Vec<Value>) -> LuaResult<Vec<Value>>>;

/// A named variable captured by a closure.
/// The cell is shared so every closure capturing it observes writes.
#[derive(Debug, Clone)]
pub struct Upvalue {
    pub name: String,
    pub value: Rc<RefCell<Value>>,
}

impl Upvalue {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value: Rc::new(RefCell::new(value)),
        }
    }

    pub fn get(&self) -> Value {
        self.value.borrow().clone()
    }
}

/// Identity of a thread of control. Only the main thread ever exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(pub u32);

impl ThreadId {
    pub const MAIN: ThreadId = ThreadId(0);
}

#[derive(Debug)]
pub struct Userdata {
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableKey {
    Integer(i64),
    String(Rc<str>),
    Boolean(bool),
}

impl TableKey {
    /// Key for a value, or `None` for values that cannot index a table here
    pub fn from_value(value: &Value) -> Option<TableKey> {
        match value {
            Value::Integer(i) => Some(TableKey::Integer(*i)),
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                Some(TableKey::Integer(*n as i64))
            }
            Value::String(s) => Some(TableKey::String(s.clone())),
            Value::Boolean(b) => Some(TableKey::Boolean(*b)),
            _ => None,
        }
    }
}

impl From<&str> for TableKey {
    fn from(s: &str) -> Self {
        TableKey::String(Rc::from(s))
    }
}

impl From<i64> for TableKey {
    fn from(i: i64) -> Self {
        TableKey::Integer(i)
    }
}

#[derive(Debug, Default)]
pub struct Table {
    entries: HashMap<TableKey, Value>,
    pub metatable: Option<TableRef>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: impl Into<TableKey>) -> Value {
        self.entries.get(&key.into()).cloned().unwrap_or(Value::Nil)
    }

    /// Assigning nil removes the entry, as in Lua
    pub fn set(&mut self, key: impl Into<TableKey>, value: Value) {
        let key = key.into();
        if matches!(value, Value::Nil) {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, value);
        }
    }

    pub fn contains(&self, key: impl Into<TableKey>) -> bool {
        self.entries.contains_key(&key.into())
    }

    /// Border of the sequence part: the largest `n` with `t[1..=n]` all non-nil
    pub fn len(&self) -> usize {
        let mut n = 0;
        while self.entries.contains_key(&TableKey::Integer(n as i64 + 1)) {
            n += 1;
        }
        n
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A guest function whose body the evaluator executes.
#[derive(Clone)]
pub struct LuaFunction {
    pub name: Option<String>,
    pub chunk_name: Option<String>,
    pub span: Option<SourceSpan>,
    pub upvalues: Option<Vec<Upvalue>>,
    pub is_main_chunk: bool,
    pub(crate) body: NativeFn,
}

impl LuaFunction {
    pub fn new(body: impl Fn(&mut Runtime, Vec<Value>) -> LuaResult<Vec<Value>> + 'static) -> Self {
        LuaFunction {
            name: None,
            chunk_name: None,
            span: None,
            upvalues: None,
            is_main_chunk: false,
            body: Rc::new(body),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn in_chunk(mut self, chunk_name: impl Into<String>) -> Self {
        self.chunk_name = Some(chunk_name.into());
        self
    }

    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_upvalues(mut self, upvalues: Vec<Upvalue>) -> Self {
        self.upvalues = Some(upvalues);
        self
    }

    pub fn main_chunk(mut self) -> Self {
        self.is_main_chunk = true;
        self
    }
}

/// A function implemented by the host.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub(crate) func: NativeFn,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&mut Runtime, Vec<Value>) -> LuaResult<Vec<Value>> + 'static,
    ) -> Self {
        NativeFunction {
            name: name.into(),
            func: Rc::new(func),
        }
    }
}

#[derive(Clone)]
pub enum Function {
    Lua(LuaFunction),
    Native(NativeFunction),
}

impl Function {
    pub fn name(&self) -> Option<&str> {
        match self {
            Function::Lua(f) => f.name.as_deref(),
            Function::Native(f) => Some(&f.name),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Function::Native(_))
    }

    pub(crate) fn body(&self) -> NativeFn {
        match self {
            Function::Lua(f) => f.body.clone(),
            Function::Native(f) => f.func.clone(),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Lua(lua) => f
                .debug_struct("LuaFunction")
                .field("name", &lua.name)
                .field("chunk_name", &lua.chunk_name)
                .field("span", &lua.span)
                .finish_non_exhaustive(),
            Function::Native(native) => f
                .debug_struct("NativeFunction")
                .field("name", &native.name)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(Rc<str>),
    Table(TableRef),
    Function(Rc<Function>),
    Thread(ThreadId),
    Userdata(Rc<Userdata>),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn new_table() -> Self {
        Value::Table(Rc::new(RefCell::new(Table::new())))
    }

    pub fn table_from<K: Into<TableKey>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        let mut table = Table::new();
        for (key, value) in entries {
            table.set(key, value);
        }
        Value::Table(Rc::new(RefCell::new(table)))
    }

    pub fn function(function: Function) -> Self {
        Value::Function(Rc::new(function))
    }

    pub fn lua_function(function: LuaFunction) -> Self {
        Value::function(Function::Lua(function))
    }

    pub fn native(
        name: impl Into<String>,
        func: impl Fn(&mut Runtime, Vec<Value>) -> LuaResult<Vec<Value>> + 'static,
    ) -> Self {
        Value::function(Function::Native(NativeFunction::new(name, func)))
    }

    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Nil => TypeTag::Nil,
            Value::Boolean(_) => TypeTag::Boolean,
            Value::Integer(_) | Value::Number(_) => TypeTag::Number,
            Value::String(_) => TypeTag::String,
            Value::Table(_) => TypeTag::Table,
            Value::Function(_) => TypeTag::Function,
            Value::Thread(_) => TypeTag::Thread,
            Value::Userdata(_) => TypeTag::Userdata,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_tag().as_str()
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false) | Value::Nil)
    }

    /// Integer view of a number, accepting floats with an exact integer value
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Rc<Function>> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Read a string-keyed field; nil for non-tables
    pub fn get_field(&self, key: &str) -> Value {
        match self {
            Value::Table(t) => t.borrow().get(key),
            _ => Value::Nil,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Integer(a), Value::Number(b)) | (Value::Number(b), Value::Integer(a)) => {
                *a as f64 == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            // Reference types compare by identity
            (Value::Table(a), Value::Table(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Userdata(a), Value::Userdata(b)) => Rc::ptr_eq(a, b),
            (Value::Thread(a), Value::Thread(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(n) => {
                // Floats keep their ".0" so they stay distinguishable from integers
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Table(t) => write!(f, "table: {:p}", Rc::as_ptr(t)),
            Value::Function(func) => match func.as_ref() {
                Function::Native(_) => write!(f, "function: builtin: {:p}", Rc::as_ptr(func)),
                Function::Lua(_) => write!(f, "function: {:p}", Rc::as_ptr(func)),
            },
            Value::Thread(id) if *id == ThreadId::MAIN => write!(f, "thread: main"),
            Value::Thread(id) => write!(f, "thread: {}", id.0),
            Value::Userdata(u) => write!(f, "userdata: {:p}", Rc::as_ptr(u)),
        }
    }
}
