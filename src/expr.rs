//! The expression graph the compiler produces and the evaluator walks.

use std::rc::Rc;

use crate::value::debug::DebugBag;
use crate::value::Value;

/// An address a `Fn` node resolves into a concrete `Ref` at the moment it
/// runs, always relative to the single frame it runs *in* (its immediately
/// enclosing, currently-executing frame) — never more than one level up.
/// A reference to a name bound further out than that is threaded down to
/// this frame as a chain of one-level hops, one `Capture` entry per
/// intermediate `fn`, so every hop only ever reads a frame that is
/// guaranteed live: the frame a closure was *created* in, never a frame
/// that might already have been popped by the time the closure runs.
#[derive(Clone, Copy, Debug)]
pub enum CaptureAddr {
    /// A local slot of the enclosing frame itself.
    Local(usize),
    /// A slot already present in the enclosing frame's own capture array —
    /// i.e. the enclosing closure already carries this binding down from
    /// further out, and this frame just forwards it.
    Capture(usize),
}

pub enum Expr {
    Literal(Value),
    ListLit(Vec<Expr>),
    MapLit(Vec<(Expr, Expr)>),
    ObjectLit(Vec<(Rc<str>, Expr)>),
    Get(Box<Expr>),
    Set(Box<Expr>, Box<Expr>),
    /// Boxes the value of an arbitrary expression into a fresh mutable
    /// cell. Used by `"ref"` applied to a non-symbol expression, as opposed
    /// to a bare symbol, which resolves directly to the existing binding's
    /// `Ref` instead of allocating a new one.
    MakeRef(Box<Expr>),
    Property {
        name: Rc<str>,
        object: Box<Expr>,
    },
    Fn {
        params: Vec<Rc<str>>,
        captures: Vec<CaptureAddr>,
        body: Rc<Expr>,
        debug: Rc<DebugBag>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Let {
        names: Vec<Rc<str>>,
        body: Box<Expr>,
    },
    Sequence(Vec<Expr>),
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        or_else: Option<Box<Expr>>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Loop(Box<Expr>),
}
