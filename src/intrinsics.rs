//! The intrinsic table: compile-time-only `NativeFn`s inlined as
//! `Literal(nativeFn)` at every reference site rather than stored as
//! `Ref`s. Arithmetic, comparison, bitwise and unary operators, plus the
//! three non-local-exit functions `break`/`continue`/`return`.
//!
//! A flat name→callable list assembled once into a map, with each entry
//! a `NativeFnEntry` rather than a bare function pointer, since
//! intrinsics here close over nothing but still need the uniform
//! `Rc<NativeFnEntry>` shape every other callable value has.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::eval::{Evaluator, Unwind};
use crate::host;
use crate::value::{native::native_ok, NativeFnEntry, Value};

/// `break`/`continue`/`return` unwind via `Unwind`'s non-error variants
/// instead of ever evaluating to a plain `Value` — calling one from inside
/// an expression is itself the entire non-local exit.
pub struct Intrinsics {
    entries: HashMap<&'static str, Value>,
}

impl Intrinsics {
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        for (name, entry) in build_table() {
            entries.insert(name, Value::native_fn(entry));
        }
        Intrinsics { entries }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.entries.get(name).cloned()
    }
}

impl Default for Intrinsics {
    fn default() -> Self {
        Intrinsics::new()
    }
}

fn build_table() -> Vec<(&'static str, Rc<NativeFnEntry>)> {
    vec![
        ("pos", NativeFnEntry::new("pos", |eval, args| unary_num(eval, args, |n| n))),
        ("neg", NativeFnEntry::new("neg", |eval, args| unary_num(eval, args, |n| -n))),
        ("not", NativeFnEntry::new("not", unary_not)),
        ("~", NativeFnEntry::new("~", |eval, args| unary_int(eval, args, |n| !n))),
        ("break", NativeFnEntry::new("break", intrinsic_break)),
        ("continue", NativeFnEntry::new("continue", intrinsic_continue)),
        ("return", NativeFnEntry::new("return", intrinsic_return)),
        ("=", NativeFnEntry::new("=", |eval, args| equality(eval, args, false))),
        ("!=", NativeFnEntry::new("!=", |eval, args| equality(eval, args, true))),
        ("<", NativeFnEntry::new("<", |eval, args| compare(eval, args, |a, b| a < b))),
        ("<=", NativeFnEntry::new("<=", |eval, args| compare(eval, args, |a, b| a <= b))),
        (">", NativeFnEntry::new(">", |eval, args| compare(eval, args, |a, b| a > b))),
        (">=", NativeFnEntry::new(">=", |eval, args| compare(eval, args, |a, b| a >= b))),
        ("+", NativeFnEntry::new("+", |eval, args| binary_num(eval, args, |a, b| a + b))),
        ("-", NativeFnEntry::new("-", |eval, args| binary_num(eval, args, |a, b| a - b))),
        ("*", NativeFnEntry::new("*", |eval, args| binary_num(eval, args, |a, b| a * b))),
        ("/", NativeFnEntry::new("/", |eval, args| binary_num(eval, args, |a, b| a / b))),
        ("%", NativeFnEntry::new("%", |eval, args| binary_num(eval, args, |a, b| a % b))),
        ("**", NativeFnEntry::new("**", |eval, args| binary_num(eval, args, f64::powf))),
        ("&", NativeFnEntry::new("&", |eval, args| binary_int(eval, args, |a, b| a & b))),
        ("|", NativeFnEntry::new("|", |eval, args| binary_int(eval, args, |a, b| a | b))),
        ("^", NativeFnEntry::new("^", |eval, args| binary_int(eval, args, |a, b| a ^ b))),
        ("<<", NativeFnEntry::new("<<", |eval, args| shift(eval, args, |a, b| a << b))),
        (">>", NativeFnEntry::new(">>", |eval, args| shift(eval, args, |a, b| a >> b))),
        (
            ">>>",
            NativeFnEntry::new(">>>", |eval, args| unsigned_shift(eval, args)),
        ),
    ]
}

fn arg(eval: &Evaluator, args: &[Value], i: usize) -> Result<Value, RuntimeError> {
    let raw = args.get(i).cloned().unwrap_or(Value::Null);
    host::deref(&eval.stack, &raw)
}

fn num(eval: &Evaluator, args: &[Value], i: usize) -> Result<f64, RuntimeError> {
    host::coerce_number(&arg(eval, args, i)?)
}

/// Host projection before 32-bit integer operators: bitwise operators
/// coerce through a host-native integer the way a JS host would
/// (`ToInt32`).
fn int(eval: &Evaluator, args: &[Value], i: usize) -> Result<i32, RuntimeError> {
    Ok(num(eval, args, i)? as i64 as i32)
}

fn unary_num(eval: &mut Evaluator, args: &[Value], f: impl Fn(f64) -> f64) -> Result<Value, Unwind> {
    native_ok((|| Ok(Value::Num(f(num(eval, args, 0)?))))())
}

fn unary_int(eval: &mut Evaluator, args: &[Value], f: impl Fn(i32) -> i32) -> Result<Value, Unwind> {
    native_ok((|| Ok(Value::Num(f(int(eval, args, 0)?) as f64)))())
}

fn unary_not(eval: &mut Evaluator, args: &[Value]) -> Result<Value, Unwind> {
    native_ok((|| Ok(Value::Bool(!arg(eval, args, 0)?.truthy())))())
}

fn binary_num(eval: &mut Evaluator, args: &[Value], f: impl Fn(f64, f64) -> f64) -> Result<Value, Unwind> {
    native_ok((|| Ok(Value::Num(f(num(eval, args, 0)?, num(eval, args, 1)?))))())
}

fn binary_int(eval: &mut Evaluator, args: &[Value], f: impl Fn(i32, i32) -> i32) -> Result<Value, Unwind> {
    native_ok((|| Ok(Value::Num(f(int(eval, args, 0)?, int(eval, args, 1)?) as f64)))())
}

fn shift(eval: &mut Evaluator, args: &[Value], f: impl Fn(i32, u32) -> i32) -> Result<Value, Unwind> {
    native_ok((|| {
        let a = int(eval, args, 0)?;
        let b = (int(eval, args, 1)? as u32) & 31;
        Ok(Value::Num(f(a, b) as f64))
    })())
}

/// `>>>` (unsigned right shift): the one bitwise operator whose JS
/// semantics are not a plain `i32` op — it projects through `u32` instead.
fn unsigned_shift(eval: &mut Evaluator, args: &[Value]) -> Result<Value, Unwind> {
    native_ok((|| {
        let a = num(eval, args, 0)? as i64 as u32;
        let b = (int(eval, args, 1)? as u32) & 31;
        Ok(Value::Num((a >> b) as f64))
    })())
}

fn equality(eval: &mut Evaluator, args: &[Value], negate: bool) -> Result<Value, Unwind> {
    native_ok((|| {
        let a = arg(eval, args, 0)?;
        let b = arg(eval, args, 1)?;
        Ok(Value::Bool((a == b) != negate))
    })())
}

fn compare(eval: &mut Evaluator, args: &[Value], f: impl Fn(f64, f64) -> bool) -> Result<Value, Unwind> {
    native_ok((|| Ok(Value::Bool(f(num(eval, args, 0)?, num(eval, args, 1)?))))())
}

/// `break`/`continue`/`return`: calling the intrinsic *is* the non-local
/// exit — it unwinds via `Unwind`'s control variants, never via
/// `Unwind::Error`.
fn intrinsic_break(_eval: &mut Evaluator, args: &[Value]) -> Result<Value, Unwind> {
    Err(Unwind::Break(args.first().cloned().unwrap_or(Value::Null)))
}

fn intrinsic_continue(_eval: &mut Evaluator, _args: &[Value]) -> Result<Value, Unwind> {
    Err(Unwind::Continue)
}

fn intrinsic_return(_eval: &mut Evaluator, args: &[Value]) -> Result<Value, Unwind> {
    Err(Unwind::Return(args.first().cloned().unwrap_or(Value::Null)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_covers_every_operator_symbol() {
        let table = Intrinsics::new();
        for name in [
            "pos", "neg", "not", "~", "break", "continue", "return", "=", "!=", "<", "<=", ">",
            ">=", "+", "-", "*", "/", "%", "**", "&", "|", "^", "<<", ">>", ">>>",
        ] {
            assert!(table.get(name).is_some(), "missing intrinsic {name}");
        }
        assert!(table.get("nonexistent").is_none());
    }
}
