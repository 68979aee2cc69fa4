//! `Closure` and `NativeFn`. A `NativeFn` is called directly without
//! pushing a stack frame; a `Closure` pushes one.

use std::rc::Rc;

use crate::error::RuntimeError;
use crate::eval::{Evaluator, Unwind};
use crate::expr::Expr;
use crate::value::debug::DebugBag;
use crate::value::refs::Ref;
use crate::value::Value;

pub type NativeFnBody = Rc<dyn Fn(&mut Evaluator, &[Value]) -> Result<Value, Unwind>>;

pub struct NativeFnEntry {
    pub name: &'static str,
    pub body: NativeFnBody,
    pub debug: Rc<DebugBag>,
}

impl NativeFnEntry {
    pub fn new(
        name: &'static str,
        body: impl Fn(&mut Evaluator, &[Value]) -> Result<Value, Unwind> + 'static,
    ) -> Rc<NativeFnEntry> {
        Rc::new(NativeFnEntry {
            name,
            body: Rc::new(body),
            debug: Rc::new(DebugBag::with_name(Rc::from(name))),
        })
    }

    pub fn call(&self, eval: &mut Evaluator, args: &[Value]) -> Result<Value, Unwind> {
        (self.body)(eval, args)
    }
}

/// Helper for building a `Result<Value, RuntimeError>`-returning native
/// into the `Result<Value, Unwind>` signature every `NativeFn` body needs.
pub fn native_ok(result: Result<Value, RuntimeError>) -> Result<Value, Unwind> {
    result.map_err(Unwind::Error)
}

pub struct Closure {
    pub params: Vec<Rc<str>>,
    pub captures: Vec<Ref>,
    pub body: Rc<Expr>,
    pub debug: Rc<DebugBag>,
}
