//! The evaluator: walks a compiled expression graph against a runtime
//! stack of frames.

mod stack;
mod unwind;

pub use stack::{Frame, Stack};
pub use unwind::{EvalResult, Unwind};

use std::rc::Rc;

use crate::error::RuntimeError;
use crate::expr::{CaptureAddr, Expr};
use crate::value::refs::new_cell;
use crate::value::{Closure, Ref, RefKind, Value};

/// Carries exactly one piece of state: the runtime stack.
pub struct Evaluator {
    pub stack: Stack,
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator {
            stack: Stack::new(),
        }
    }

    /// Top-level entry point. A bare `Unwind::Return` escaping to here is
    /// not a bug (the program itself behaves like an implicit function
    /// body) — but a `Break`/`Continue` escaping all the way out is.
    pub fn run(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match self.evaluate(expr) {
            Ok(v) => Ok(v),
            Err(Unwind::Return(v)) => Ok(v),
            Err(Unwind::Error(e)) => Err(e),
            Err(Unwind::Break(_)) | Err(Unwind::Continue) => Err(RuntimeError::UnhandledSignal),
        }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),

            Expr::ListLit(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.evaluate(item)?);
                }
                Ok(Value::list(values))
            }

            Expr::MapLit(pairs) => {
                let map = Value::map();
                if let Value::Map(handle) = &map {
                    for (k, v) in pairs {
                        let key = self.evaluate(k)?;
                        let value = self.evaluate(v)?;
                        handle.borrow_mut().set(key, value);
                    }
                }
                Ok(map)
            }

            Expr::ObjectLit(fields) => {
                let mut map = std::collections::HashMap::with_capacity(fields.len());
                for (name, exp) in fields {
                    let value = self.evaluate(exp)?;
                    map.insert(name.clone(), value);
                }
                Ok(Value::object(map))
            }

            Expr::Get(inner) => {
                let referee = self.evaluate(inner)?;
                let value = match &referee {
                    Value::Ref(r) => r.get(&self.stack)?,
                    other => other.clone(),
                };
                if let Value::Undefined = value {
                    return Err(Unwind::Error(RuntimeError::UninitializedSymbol {
                        name: ref_name(&referee),
                        loc: None,
                    }));
                }
                Ok(value)
            }

            Expr::Set(target, value_expr) => {
                let target_val = self.evaluate(target)?;
                let value = self.evaluate(value_expr)?;
                match target_val {
                    Value::Ref(r) => Ok(r.set(&self.stack, value)?),
                    _ => Err(Unwind::Error(RuntimeError::InvalidAssignment { loc: None })),
                }
            }

            Expr::MakeRef(inner) => {
                let value = self.evaluate(inner)?;
                Ok(Value::Ref(Ref::value_ref(value)))
            }

            Expr::Property { name, object } => {
                let obj = self.evaluate(object)?;
                Ok(Value::Ref(Ref::new(RefKind::Property {
                    object: Box::new(obj),
                    name: name.clone(),
                })))
            }

            Expr::Fn {
                params,
                captures,
                body,
                debug,
            } => {
                let enclosing = self.stack.current();
                let mut resolved = Vec::with_capacity(captures.len());
                for addr in captures {
                    let r = match addr {
                        CaptureAddr::Local(index) => enclosing
                            .locals
                            .get(*index)
                            .cloned()
                            .map(Ref::from_cell)
                            .ok_or(RuntimeError::InvalidCapture)?,
                        CaptureAddr::Capture(index) => enclosing
                            .captures
                            .get(*index)
                            .cloned()
                            .ok_or(RuntimeError::InvalidCapture)?,
                    };
                    resolved.push(r);
                }
                Ok(Value::Closure(Rc::new(Closure {
                    params: params.clone(),
                    captures: resolved,
                    body: body.clone(),
                    debug: debug.clone(),
                })))
            }

            Expr::Call { callee, args } => {
                let fn_val = self.evaluate(callee)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate(arg)?);
                }
                self.call(&fn_val, &values)
            }

            Expr::Let { names, body } => {
                let cells: Vec<_> = names.iter().map(|_| new_cell(Value::Undefined)).collect();
                let count = self.stack.push_let_locals(cells);
                let result = self.evaluate(body);
                self.stack.pop_let_locals(count);
                result
            }

            Expr::Sequence(items) => {
                let mut last = Value::Null;
                for item in items {
                    last = self.evaluate(item)?;
                }
                Ok(last)
            }

            Expr::If {
                cond,
                then,
                or_else,
            } => {
                let c = self.evaluate(cond)?;
                if c.truthy() {
                    self.evaluate(then)
                } else if let Some(or_else) = or_else {
                    self.evaluate(or_else)
                } else {
                    Ok(Value::Null)
                }
            }

            Expr::And(l, r) => {
                let left = self.evaluate(l)?;
                if !left.truthy() {
                    return Ok(left);
                }
                self.evaluate(r)
            }

            Expr::Or(l, r) => {
                let left = self.evaluate(l)?;
                if left.truthy() {
                    return Ok(left);
                }
                self.evaluate(r)
            }

            Expr::Loop(body) => loop {
                match self.evaluate(body) {
                    Ok(_) => continue,
                    Err(Unwind::Break(v)) => return Ok(v),
                    Err(Unwind::Continue) => continue,
                    other => return other,
                }
            },
        }
    }

    /// The critical operation. `NativeFn`s run without a new frame;
    /// `Closure`s push one and catch `Return` only — `Break`/`Continue` are
    /// not caught here, they escape to an enclosing `Loop`.
    fn call(&mut self, fn_val: &Value, args: &[Value]) -> EvalResult {
        match fn_val {
            Value::NativeFn(native) => native.call(self, args),
            Value::Closure(closure) => self.call_closure(closure, args),
            _ => Err(Unwind::Error(RuntimeError::InvalidCall { loc: None })),
        }
    }

    fn call_closure(&mut self, closure: &Rc<Closure>, args: &[Value]) -> EvalResult {
        let mut locals = Vec::with_capacity(closure.params.len() + 1);
        for i in 0..closure.params.len() {
            let v = args.get(i).cloned().unwrap_or(Value::Undefined);
            locals.push(new_cell(v));
        }
        if args.len() > closure.params.len() {
            let extra = args[closure.params.len()..].to_vec();
            locals.push(new_cell(Value::list(extra)));
        }

        self.stack.push_call_frame(locals, closure.captures.clone());
        let result = self.evaluate(&closure.body);
        self.stack.pop_call_frame();

        match result {
            Err(Unwind::Return(v)) => Ok(v),
            other => other,
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}

fn ref_name(value: &Value) -> Option<String> {
    match value {
        Value::Ref(r) => r.name().map(|n| n.to_string()),
        _ => None,
    }
}
