//! The initial global bindings: a namespace mapping name→`ValueRef`,
//! looked up at compile time and produced as a `ValueRef` literal. Each
//! entry holds a `Ref` rather than a plain `Value`, since globals must be
//! independently mutable storage locations, not just constants — writes to
//! globals are allowed.

use std::collections::HashMap;
use std::rc::Rc;

use regex::Regex;

use crate::error::RuntimeError;
use crate::eval::{Evaluator, Unwind};
use crate::host;
use crate::value::native::native_ok;
use crate::value::{NativeFnEntry, NativeObject, Ref, Value};

/// A namespace mapping name→`ValueRef`. Each insertion tags the `Ref`'s
/// debug bag with `name`, so a namespace lookup also names the value it
/// hands back for diagnostics.
pub struct Globals {
    bindings: HashMap<Rc<str>, Ref>,
}

impl Globals {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();
        for (name, value) in builtin_bindings() {
            let name: Rc<str> = Rc::from(name);
            let r = Ref::value_ref(value);
            r.tag_name(name.clone());
            bindings.insert(name, r);
        }
        Globals { bindings }
    }

    /// Looked up at compile time; `None` falls through to
    /// `CompilerError::UndefinedSymbol`.
    pub fn lookup(&self, name: &str) -> Option<Ref> {
        self.bindings.get(name).cloned()
    }
}

impl Default for Globals {
    fn default() -> Self {
        Globals::new()
    }
}

fn builtin_bindings() -> Vec<(&'static str, Value)> {
    vec![
        ("pi", Value::Num(std::f64::consts::PI)),
        ("e", Value::Num(std::f64::consts::E)),
        ("print", Value::native_fn(NativeFnEntry::new("print", builtin_print))),
        ("debug", Value::native_fn(NativeFnEntry::new("debug", builtin_debug))),
        ("JSON", Value::NativeObject(Rc::new(JsonAdapter))),
        ("process", Value::NativeObject(Rc::new(ProcessAdapter))),
        ("fs", Value::NativeObject(Rc::new(FsAdapter))),
        ("RegExp", Value::native_fn(NativeFnEntry::new("RegExp", builtin_regexp))),
        // `document` would be bound here if the host supplied a DOM
        // global; this crate's host adapter has no DOM, so it's
        // intentionally absent.
    ]
}

/// `print(x)`: prints the host-projected value and returns `Null`.
fn builtin_print(eval: &mut Evaluator, args: &[Value]) -> Result<Value, Unwind> {
    native_ok((|| {
        let value = host::deref(&eval.stack, args.first().unwrap_or(&Value::Null))?;
        println!("{}", host::to_host(&value));
        Ok(Value::Null)
    })())
}

/// `debug(x)`: pretty-prints via `Value`'s own `Debug` impl, returns
/// `Null`. Routes through the value model's own formatting rather than a
/// side-channel logger.
fn builtin_debug(eval: &mut Evaluator, args: &[Value]) -> Result<Value, Unwind> {
    native_ok((|| {
        let value = host::deref(&eval.stack, args.first().unwrap_or(&Value::Null))?;
        eprintln!("{value:?}");
        Ok(Value::Null)
    })())
}

/// `RegExp(pattern, flags?)`: constructs a `NativeObject`. Only the `i`
/// (case-insensitive) flag is honored — the other JS `RegExp` flags have
/// no meaning for the `regex` crate's engine.
fn builtin_regexp(eval: &mut Evaluator, args: &[Value]) -> Result<Value, Unwind> {
    native_ok((|| {
        let pattern = host::deref(&eval.stack, args.first().unwrap_or(&Value::Null))?;
        let pattern = match pattern {
            Value::Str(s) => s.to_string(),
            other => return Err(RuntimeError::HostConversion(format!(
                "RegExp pattern must be a string, got {}",
                other.type_name()
            ))),
        };
        let flags = args
            .get(1)
            .map(|v| host::deref(&eval.stack, v))
            .transpose()?;
        let case_insensitive = matches!(&flags, Some(Value::Str(s)) if s.contains('i'));
        let source = if case_insensitive {
            format!("(?i){pattern}")
        } else {
            pattern.clone()
        };
        let regex = Regex::new(&source)
            .map_err(|e| RuntimeError::HostConversion(format!("invalid RegExp pattern: {e}")))?;
        Ok(Value::NativeObject(Rc::new(RegexObject { regex, source: pattern })))
    })())
}

struct RegexObject {
    regex: Regex,
    source: String,
}

impl NativeObject for RegexObject {
    fn type_name(&self) -> &'static str {
        "RegExp"
    }

    fn get_property(&self, name: &str) -> Value {
        match name {
            "source" => Value::str(&self.source),
            "test" => Value::native_fn(regex_test(self.regex.clone())),
            "match" => Value::native_fn(regex_match(self.regex.clone())),
            _ => Value::Null,
        }
    }

    fn set_property(&self, _name: &str, _value: Value) -> Result<(), RuntimeError> {
        Err(RuntimeError::InvalidAssignment { loc: None })
    }

    fn debug_repr(&self) -> String {
        format!("<RegExp /{}/>", self.source)
    }
}

fn regex_test(regex: Regex) -> Rc<NativeFnEntry> {
    NativeFnEntry::new("RegExp.test", move |eval, args| {
        native_ok((|| {
            let subject = expect_str(&host::deref(&eval.stack, args.first().unwrap_or(&Value::Null))?)?;
            Ok(Value::Bool(regex.is_match(&subject)))
        })())
    })
}

fn regex_match(regex: Regex) -> Rc<NativeFnEntry> {
    NativeFnEntry::new("RegExp.match", move |eval, args| {
        native_ok((|| {
            let subject = expect_str(&host::deref(&eval.stack, args.first().unwrap_or(&Value::Null))?)?;
            match regex.find(&subject) {
                Some(m) => Ok(Value::str(m.as_str())),
                None => Ok(Value::Null),
            }
        })())
    })
}

fn expect_str(value: &Value) -> Result<String, RuntimeError> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        other => Err(RuntimeError::HostConversion(format!(
            "expected a string, got {}",
            other.type_name()
        ))),
    }
}

/// A host-object adapter for `JSON.parse`/`JSON.stringify`, routed
/// through the same `serde_json::Value` representation `crate::host`
/// already uses as the host boundary type.
struct JsonAdapter;

impl NativeObject for JsonAdapter {
    fn type_name(&self) -> &'static str {
        "JSON"
    }

    fn get_property(&self, name: &str) -> Value {
        match name {
            "parse" => Value::native_fn(NativeFnEntry::new("JSON.parse", json_parse)),
            "stringify" => Value::native_fn(NativeFnEntry::new("JSON.stringify", json_stringify)),
            _ => Value::Null,
        }
    }

    fn set_property(&self, _name: &str, _value: Value) -> Result<(), RuntimeError> {
        Err(RuntimeError::InvalidAssignment { loc: None })
    }
}

fn json_parse(eval: &mut Evaluator, args: &[Value]) -> Result<Value, Unwind> {
    native_ok((|| {
        let text = expect_str(&host::deref(&eval.stack, args.first().unwrap_or(&Value::Null))?)?;
        let json: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| RuntimeError::HostConversion(format!("invalid JSON: {e}")))?;
        Ok(host::from_host(&json))
    })())
}

fn json_stringify(eval: &mut Evaluator, args: &[Value]) -> Result<Value, Unwind> {
    native_ok((|| {
        let value = host::deref(&eval.stack, args.first().unwrap_or(&Value::Null))?;
        let text = serde_json::to_string(&host::to_host(&value))
            .map_err(|e| RuntimeError::HostConversion(format!("cannot stringify: {e}")))?;
        Ok(Value::str(&text))
    })())
}

/// A minimal `process` adapter: `argv`, `env`, and `exit(code)`.
struct ProcessAdapter;

impl NativeObject for ProcessAdapter {
    fn type_name(&self) -> &'static str {
        "process"
    }

    fn get_property(&self, name: &str) -> Value {
        match name {
            "argv" => Value::list(std::env::args().map(|a| Value::str(&a)).collect()),
            "env" => {
                let mut fields = std::collections::HashMap::new();
                for (k, v) in std::env::vars() {
                    fields.insert(crate::value::intern::intern_str(&k), Value::str(&v));
                }
                Value::object(fields)
            }
            "exit" => Value::native_fn(NativeFnEntry::new("process.exit", process_exit)),
            _ => Value::Null,
        }
    }

    fn set_property(&self, _name: &str, _value: Value) -> Result<(), RuntimeError> {
        Err(RuntimeError::InvalidAssignment { loc: None })
    }
}

fn process_exit(eval: &mut Evaluator, args: &[Value]) -> Result<Value, Unwind> {
    let code = args
        .first()
        .and_then(|v| host::deref(&eval.stack, v).ok())
        .and_then(|v| host::coerce_number(&v).ok())
        .unwrap_or(0.0);
    std::process::exit(code as i32);
}

/// A minimal `fs` adapter: synchronous `readFile`/`writeFile`, matching
/// the evaluator's fully synchronous scheduling model.
struct FsAdapter;

impl NativeObject for FsAdapter {
    fn type_name(&self) -> &'static str {
        "fs"
    }

    fn get_property(&self, name: &str) -> Value {
        match name {
            "readFile" => Value::native_fn(NativeFnEntry::new("fs.readFile", fs_read_file)),
            "writeFile" => Value::native_fn(NativeFnEntry::new("fs.writeFile", fs_write_file)),
            _ => Value::Null,
        }
    }

    fn set_property(&self, _name: &str, _value: Value) -> Result<(), RuntimeError> {
        Err(RuntimeError::InvalidAssignment { loc: None })
    }
}

fn fs_read_file(eval: &mut Evaluator, args: &[Value]) -> Result<Value, Unwind> {
    native_ok((|| {
        let path = expect_str(&host::deref(&eval.stack, args.first().unwrap_or(&Value::Null))?)?;
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| RuntimeError::HostConversion(format!("cannot read {path:?}: {e}")))?;
        Ok(Value::str(&contents))
    })())
}

fn fs_write_file(eval: &mut Evaluator, args: &[Value]) -> Result<Value, Unwind> {
    native_ok((|| {
        let path = expect_str(&host::deref(&eval.stack, args.first().unwrap_or(&Value::Null))?)?;
        let contents = expect_str(&host::deref(&eval.stack, args.get(1).unwrap_or(&Value::Null))?)?;
        std::fs::write(&path, contents)
            .map_err(|e| RuntimeError::HostConversion(format!("cannot write {path:?}: {e}")))?;
        Ok(Value::Null)
    })())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn constants_are_bound() {
        let globals = Globals::new();
        assert!(globals.lookup("pi").is_some());
        assert!(globals.lookup("e").is_some());
        assert!(globals.lookup("nonexistent").is_none());
    }

    #[test]
    fn globals_are_tagged_with_their_name() {
        let globals = Globals::new();
        let r = globals.lookup("print").unwrap();
        assert_eq!(r.name().as_deref(), Some("print"));
    }
}
