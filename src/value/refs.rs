//! References: first-class values that denote a storage location. A `Ref`
//! is itself a `Value` — evaluating one is the identity; `Get`/`Set` are
//! what dereference or write through it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::eval::Stack;
use crate::value::debug::DebugBag;
use crate::value::Value;

/// A mutable storage cell, the payload of a `ValueRef` and of every stack
/// local slot. Independently reference-counted so that a closure capturing
/// one keeps it alive after the frame that originally held it is popped.
pub type Cell = Rc<RefCell<Value>>;

pub fn new_cell(value: Value) -> Cell {
    Rc::new(RefCell::new(value))
}

#[derive(Clone)]
pub enum RefKind {
    /// Owns a mutable cell directly — globals, captures, boxed parameters.
    Value(Cell),
    /// Lexical address: `level` frames down from the top (0 = current),
    /// `index` into that frame's locals.
    Stack { level: usize, index: usize },
    /// Slot in the *current* frame's capture array, filled in by the
    /// enclosing closure at `Fn`-evaluation time.
    Capture { index: usize },
    /// A field of an `Object` or `NativeObject`.
    Property {
        object: Box<Value>,
        name: Rc<str>,
    },
}

#[derive(Clone)]
pub struct Ref {
    pub kind: RefKind,
    pub debug: Rc<DebugBag>,
}

impl Ref {
    pub fn new(kind: RefKind) -> Self {
        Ref {
            kind,
            debug: Rc::new(DebugBag::new()),
        }
    }

    pub fn value_ref(value: Value) -> Self {
        Ref::new(RefKind::Value(new_cell(value)))
    }

    pub fn from_cell(cell: Cell) -> Self {
        Ref::new(RefKind::Value(cell))
    }

    pub fn name(&self) -> Option<Rc<str>> {
        self.debug.name()
    }

    pub fn tag_name(&self, name: Rc<str>) {
        self.debug.set_name(name);
    }

    /// Dereferences this reference against the given runtime stack.
    /// Does *not* apply the `Undefined` -> `UninitializedSymbol` check —
    /// that is `Get`'s job, since a bare `Ref::get` is also used internally
    /// (e.g. resolving captures) where `Undefined` is a perfectly fine
    /// transient value.
    pub fn get(&self, stack: &Stack) -> Result<Value, RuntimeError> {
        match &self.kind {
            RefKind::Value(cell) => Ok(cell.borrow().clone()),
            RefKind::Stack { level, index } => {
                let frame = stack.frame_at(*level);
                Ok(frame.locals[*index].borrow().clone())
            }
            RefKind::Capture { index } => {
                let frame = stack.frame_at(0);
                frame.captures[*index].get(stack)
            }
            RefKind::Property { object, name } => Ok(object.get_property(name)),
        }
    }

    pub fn set(&self, stack: &Stack, value: Value) -> Result<Value, RuntimeError> {
        match &self.kind {
            RefKind::Value(cell) => {
                *cell.borrow_mut() = value.clone();
                Ok(value)
            }
            RefKind::Stack { level, index } => {
                let frame = stack.frame_at(*level);
                *frame.locals[*index].borrow_mut() = value.clone();
                Ok(value)
            }
            RefKind::Capture { index } => {
                let frame = stack.frame_at(0);
                frame.captures[*index].set(stack, value)
            }
            RefKind::Property { object, name } => {
                object.set_property(name, value.clone())?;
                Ok(value)
            }
        }
    }
}
