//! The value and expression model: the closed set of runtime values, plus
//! the reference abstraction that lets some of them denote storage
//! locations.

pub mod containers;
pub mod debug;
mod identity;
pub mod intern;
pub mod native;
pub mod refs;

use std::fmt;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::expr::Expr;

pub use debug::DebugLoc;

use containers::{ArkList, ArkMap, ArkObject, ListHandle, MapHandle, ObjectHandle};
pub use native::{Closure, NativeFnEntry};
pub use refs::{new_cell, Cell, Ref, RefKind};

/// A host object handle. Property get/set delegates to whatever backs it —
/// concretely, the JSON-shaped host adapter in `crate::host`.
pub trait NativeObject {
    fn type_name(&self) -> &'static str;
    fn get_property(&self, name: &str) -> Value;
    fn set_property(&self, name: &str, value: Value) -> Result<(), RuntimeError>;
    fn debug_repr(&self) -> String {
        format!("<native {}>", self.type_name())
    }
}

#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Str(Rc<str>),
    /// Sentinel only; never returned to user code.
    Undefined,
    List(ListHandle),
    Map(MapHandle),
    Object(ObjectHandle),
    NativeObject(Rc<dyn NativeObject>),
    Closure(Rc<Closure>),
    NativeFn(Rc<NativeFnEntry>),
    Ref(Ref),
    /// Expressions are themselves values — this is what lets a `Ref`'s
    /// `"ref"` form box an arbitrary unevaluated expression.
    Expression(Rc<Expr>),
}

impl Value {
    pub fn str(raw: &str) -> Value {
        Value::Str(intern::intern_str(raw))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(std::cell::RefCell::new(ArkList::new(items))))
    }

    pub fn map() -> Value {
        Value::Map(Rc::new(std::cell::RefCell::new(ArkMap::new())))
    }

    pub fn object(fields: std::collections::HashMap<Rc<str>, Value>) -> Value {
        Value::Object(Rc::new(std::cell::RefCell::new(ArkObject { fields })))
    }

    pub fn native_fn(entry: Rc<NativeFnEntry>) -> Value {
        Value::NativeFn(entry)
    }

    /// Truthiness via the host-value adapter's boolean coercion, used by
    /// `If`/`And`/`Or`.
    pub fn truthy(&self) -> bool {
        crate::host::to_bool(self)
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, Value::Ref(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Num(_) => "num",
            Value::Str(_) => "str",
            Value::Undefined => "undefined",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::NativeObject(_) => "native",
            Value::Closure(_) => "closure",
            Value::NativeFn(_) => "native_fn",
            Value::Ref(_) => "ref",
            Value::Expression(_) => "expression",
        }
    }

    /// Property read. `Object` returns `Null` for an absent key; containers
    /// expose their method table this way too (`length` as a live
    /// property, `get`/`set` as bound natives).
    pub fn get_property(&self, name: &str) -> Value {
        match self {
            Value::Object(obj) => obj.borrow().get(name),
            Value::NativeObject(obj) => obj.get_property(name),
            Value::List(list) => list_property(list, name),
            Value::Map(map) => map_property(map, name),
            _ => Value::Null,
        }
    }

    pub fn set_property(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        match self {
            Value::Object(obj) => {
                obj.borrow_mut().set(intern::intern_str(name), value);
                Ok(())
            }
            Value::NativeObject(obj) => obj.set_property(name, value),
            _ => Err(RuntimeError::InvalidAssignment { loc: None }),
        }
    }
}

fn list_property(list: &ListHandle, name: &str) -> Value {
    match name {
        "length" => Value::Num(list.borrow().length() as f64),
        "get" => Value::native_fn(list_method_get(list.clone())),
        "set" => Value::native_fn(list_method_set(list.clone())),
        "push" => Value::native_fn(list_method_push(list.clone())),
        "pop" => Value::native_fn(list_method_pop(list.clone())),
        _ => Value::Null,
    }
}

fn map_property(map: &MapHandle, name: &str) -> Value {
    match name {
        "length" => Value::Num(map.borrow().len() as f64),
        "get" => Value::native_fn(map_method_get(map.clone())),
        "set" => Value::native_fn(map_method_set(map.clone())),
        _ => Value::Null,
    }
}

fn list_method_get(list: ListHandle) -> Rc<NativeFnEntry> {
    NativeFnEntry::new("list.get", move |_eval, args| {
        native::native_ok(list_get_impl(&list, args))
    })
}

fn list_get_impl(list: &ListHandle, args: &[Value]) -> Result<Value, RuntimeError> {
    let index = expect_index(args.first())?;
    let borrowed = list.borrow();
    borrowed
        .get(index)
        .ok_or(RuntimeError::IndexOutOfBounds {
            index,
            length: borrowed.length(),
        })
}

fn list_method_set(list: ListHandle) -> Rc<NativeFnEntry> {
    NativeFnEntry::new("list.set", move |_eval, args| {
        native::native_ok((|| {
            let index = expect_index(args.first())?;
            let value = args.get(1).cloned().unwrap_or(Value::Null);
            let mut borrowed = list.borrow_mut();
            let length = borrowed.length();
            borrowed
                .set(index, value)
                .ok_or(RuntimeError::IndexOutOfBounds { index, length })
        })())
    })
}

fn list_method_push(list: ListHandle) -> Rc<NativeFnEntry> {
    NativeFnEntry::new("list.push", move |_eval, args| {
        let value = args.first().cloned().unwrap_or(Value::Null);
        list.borrow_mut().items.push(value.clone());
        native::native_ok(Ok(value))
    })
}

fn list_method_pop(list: ListHandle) -> Rc<NativeFnEntry> {
    NativeFnEntry::new("list.pop", move |_eval, _args| {
        native::native_ok(Ok(list.borrow_mut().items.pop().unwrap_or(Value::Null)))
    })
}

fn map_method_get(map: MapHandle) -> Rc<NativeFnEntry> {
    NativeFnEntry::new("map.get", move |_eval, args| {
        let key = args.first().cloned().unwrap_or(Value::Null);
        native::native_ok(Ok(map.borrow().get(&key)))
    })
}

fn map_method_set(map: MapHandle) -> Rc<NativeFnEntry> {
    NativeFnEntry::new("map.set", move |_eval, args| {
        let key = args.first().cloned().unwrap_or(Value::Null);
        let value = args.get(1).cloned().unwrap_or(Value::Null);
        map.borrow_mut().set(key, value.clone());
        native::native_ok(Ok(value))
    })
}

fn expect_index(value: Option<&Value>) -> Result<usize, RuntimeError> {
    match value {
        Some(Value::Num(n)) if *n >= 0.0 => Ok(*n as usize),
        _ => Err(RuntimeError::HostConversion(
            "expected a non-negative index".to_string(),
        )),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::NativeObject(a), Value::NativeObject(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::NativeFn(a), Value::NativeFn(b)) => Rc::ptr_eq(a, b),
            (Value::Expression(a), Value::Expression(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Undefined => write!(f, "undefined"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(list) => {
                let items = &list.borrow().items;
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => write!(f, "<map: {} entries>", map.borrow().len()),
            Value::Object(obj) => {
                write!(f, "{{")?;
                for (i, (k, v)) in obj.borrow().fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::NativeObject(obj) => write!(f, "{}", obj.debug_repr()),
            Value::Closure(c) => {
                let name = c.debug.name();
                match name {
                    Some(n) => write!(f, "<fn {n}({} args)>", c.params.len()),
                    None => write!(f, "<fn({} args)>", c.params.len()),
                }
            }
            Value::NativeFn(nf) => write!(f, "<native {}>", nf.name),
            Value::Ref(_) => write!(f, "<ref>"),
            Value::Expression(_) => write!(f, "<expression>"),
        }
    }
}
