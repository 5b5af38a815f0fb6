//! Metatable storage: per-value slots for tables, per-type defaults for
//! everything else.

use super::value::{TableRef, Value};
use std::collections::HashMap;
use std::rc::Rc;

/// Field whose presence in a metatable hides the real metatable from
/// `getmetatable`; its value is returned instead.
pub const PROTECTION_FIELD: &str = "__metatable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Nil,
    String,
    Number,
    Boolean,
    Function,
    Table,
    Thread,
    Userdata,
}

impl TypeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Nil => "nil",
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
            TypeTag::Function => "function",
            TypeTag::Table => "table",
            TypeTag::Thread => "thread",
            TypeTag::Userdata => "userdata",
        }
    }
}

#[derive(Debug, Default)]
pub struct MetatableRegistry {
    defaults: HashMap<TypeTag, TableRef>,
}

impl MetatableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The metatable actually attached to `value`, ignoring protection
    pub fn raw_get(&self, value: &Value) -> Option<TableRef> {
        match value {
            Value::Table(t) => t.borrow().metatable.clone(),
            other => self.type_default(other.type_tag()),
        }
    }

    /// What guest code sees from `getmetatable`: the protection marker when
    /// the metatable carries one, else the metatable itself.
    pub fn get(&self, value: &Value) -> Value {
        match self.raw_get(value) {
            Some(mt) => {
                let marker = mt.borrow().get(PROTECTION_FIELD);
                if marker.is_nil() {
                    Value::Table(mt)
                } else {
                    marker
                }
            }
            None => Value::Nil,
        }
    }

    /// Attach (or with `None`, detach) a metatable
    pub fn set(&mut self, value: &Value, metatable: Option<TableRef>) {
        match value {
            Value::Table(t) => t.borrow_mut().metatable = metatable,
            other => {
                let tag = other.type_tag();
                match metatable {
                    Some(mt) => {
                        self.defaults.insert(tag, mt);
                    }
                    None => {
                        self.defaults.remove(&tag);
                    }
                }
            }
        }
    }

    /// Metatable shared by every value of type `tag`
    pub fn type_default(&self, tag: TypeTag) -> Option<TableRef> {
        self.defaults.get(&tag).map(Rc::clone)
    }
}
