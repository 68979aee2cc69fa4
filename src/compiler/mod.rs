//! The compiler: converts a decoded JSON tree into an expression graph,
//! resolving every identifier to a lexical stack address, a capture-frame
//! slot, an external global reference, or an intrinsic value.

mod scope;

pub use scope::StackAddr;
use scope::{Resolved, Scope};

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value as Json;

use crate::error::CompilerError;
use crate::expr::Expr;
use crate::globals::Globals;
use crate::intrinsics::Intrinsics;
use crate::value::debug::DebugBag;
use crate::value::{Ref, RefKind, Value};

/// The result of compiling a JSON program: the expression graph plus the
/// free-variable map. `free_vars` maps each name that resolved to a
/// lexical address (at any point during compilation) to every `StackAddr`
/// produced for it; `Let` and `Fn` strip their own bound names as they
/// close, so a self-contained program's top-level `free_vars` is empty.
/// The caller must check this before running — an unresolved name left
/// over here means the program references something nobody ever bound.
pub struct Compiled {
    pub expression: Expr,
    pub free_vars: HashMap<Rc<str>, Vec<StackAddr>>,
}

/// Tags recognized at the head of a JSON array. Anything else dispatches
/// as a `Call`.
const TAGS: &[&str] = &[
    "str", "let", "fn", "prop", "ref", "get", "set", "list", "map", "seq", "if", "and", "or",
    "loop",
];

pub fn compile(json: &Json, globals: &Globals) -> Result<Compiled, CompilerError> {
    let intrinsics = Intrinsics::new();
    let mut scope = Scope::new();
    let expression = compile_expr(json, &mut scope, globals, &intrinsics)?;
    Ok(Compiled {
        expression,
        free_vars: scope.free_vars,
    })
}

fn compile_expr(
    json: &Json,
    scope: &mut Scope,
    globals: &Globals,
    intrinsics: &Intrinsics,
) -> Result<Expr, CompilerError> {
    match json {
        Json::Null => Ok(Expr::Literal(Value::Null)),
        Json::Bool(b) => Ok(Expr::Literal(Value::Bool(*b))),
        Json::Number(n) => Ok(Expr::Literal(Value::Num(n.as_f64().unwrap_or(f64::NAN)))),
        Json::String(s) => {
            let resolved = resolve_symbol(s, scope, globals, intrinsics)?;
            // A bare symbol used as an ordinary expression derefs through
            // its resolved `Ref` — a bare string compiles to the value
            // currently bound to that name. The raw, un-dereferenced `Ref`
            // is only reachable via the `"ref"` tag (`resolve_symbol`
            // called directly, below) — e.g. `["set", ["ref","a"], 3]`
            // needs the storage location itself, not its current contents.
            Ok(Expr::Get(Box::new(resolved)))
        }
        Json::Object(fields) => {
            let mut compiled = Vec::with_capacity(fields.len());
            for (name, value) in fields {
                compiled.push((
                    Rc::from(name.as_str()),
                    compile_expr(value, scope, globals, intrinsics)?,
                ));
            }
            Ok(Expr::ObjectLit(compiled))
        }
        Json::Array(items) => compile_array(items, scope, globals, intrinsics),
    }
}

/// Resolution of a bare symbol: the same routine used for a bare JSON
/// string and for the inner string of `"ref"`/`"get"`.
fn resolve_symbol(
    name: &str,
    scope: &mut Scope,
    globals: &Globals,
    intrinsics: &Intrinsics,
) -> Result<Expr, CompilerError> {
    // The intrinsic table is checked first, so intrinsics shadow both
    // locals and globals of the same name rather than being shadowable by
    // them.
    if let Some(intrinsic) = intrinsics.get(name) {
        return Ok(Expr::Literal(intrinsic));
    }

    if let Some(resolved) = scope.resolve(name) {
        let r = match resolved {
            Resolved::Stack(addr) => Ref::new(RefKind::Stack {
                level: addr.level,
                index: addr.index,
            }),
            Resolved::Capture(index) => Ref::new(RefKind::Capture { index }),
        };
        r.tag_name(Rc::from(name));
        return Ok(Expr::Literal(Value::Ref(r)));
    }

    if let Some(r) = globals.lookup(name) {
        return Ok(Expr::Literal(Value::Ref(r)));
    }

    Err(CompilerError::UndefinedSymbol(name.to_string()))
}

fn compile_array(
    items: &[Json],
    scope: &mut Scope,
    globals: &Globals,
    intrinsics: &Intrinsics,
) -> Result<Expr, CompilerError> {
    let tag = items.first().and_then(Json::as_str).filter(|t| TAGS.contains(t));

    match tag {
        Some("str") => {
            let raw = expect_arity(items, 2, "str")?[1]
                .as_str()
                .ok_or_else(|| CompilerError::MalformedForm {
                    expected: "a raw string",
                    got: items[1].to_string(),
                })?;
            Ok(Expr::Literal(Value::str(raw)))
        }

        Some("let") => {
            let body_json = &expect_arity(items, 3, "let")?[2];
            let names = parse_params(&items[1])?;
            scope.push_names(&names);
            let body = compile_expr(body_json, scope, globals, intrinsics);
            scope.pop_names(&names);
            Ok(Expr::Let { names, body: Box::new(body?) })
        }

        Some("fn") => {
            let body_json = &expect_arity(items, 3, "fn")?[2];
            let params = parse_params(&items[1])?;
            scope.push_frame(&params);
            let body = compile_expr(body_json, scope, globals, intrinsics);
            let captures = scope.pop_frame(&params);
            Ok(Expr::Fn {
                params,
                captures,
                body: Rc::new(body?),
                debug: Rc::new(DebugBag::new()),
            })
        }

        Some("prop") => {
            let rest = expect_min_arity(items, 3, "prop")?;
            let name = rest[1]
                .as_str()
                .ok_or_else(|| CompilerError::MalformedForm {
                    expected: "a property name string",
                    got: rest[1].to_string(),
                })?;
            let object = compile_expr(&rest[2], scope, globals, intrinsics)?;
            let property = Expr::Property {
                name: Rc::from(name),
                object: Box::new(object),
            };
            // Trailing elements beyond nominal arity are call arguments,
            // so `["prop", "get", list, i]` reads as "call list's get
            // method with i" instead of needing a separate nested call.
            if rest.len() > 3 {
                let args = compile_each(&rest[3..], scope, globals, intrinsics)?;
                Ok(Expr::Call {
                    callee: Box::new(Expr::Get(Box::new(property))),
                    args,
                })
            } else {
                Ok(property)
            }
        }

        Some("ref") => {
            let rest = expect_arity(items, 2, "ref")?;
            // A bare-string inner expression resolves to the real Ref for
            // that name: `["ref","a"]` is `["set", ["ref","a"], ...]`'s
            // target, which must be the *existing* binding, not a fresh
            // disconnected box.
            if let Some(name) = rest[1].as_str() {
                resolve_symbol(name, scope, globals, intrinsics)
            } else {
                let inner = compile_expr(&rest[1], scope, globals, intrinsics)?;
                Ok(Expr::MakeRef(Box::new(inner)))
            }
        }

        Some("get") => {
            let rest = expect_min_arity(items, 2, "get")?;
            let inner = if let Some(name) = rest[1].as_str() {
                resolve_symbol(name, scope, globals, intrinsics)?
            } else {
                compile_expr(&rest[1], scope, globals, intrinsics)?
            };
            let get = Expr::Get(Box::new(inner));
            if rest.len() > 2 {
                let args = compile_each(&rest[2..], scope, globals, intrinsics)?;
                Ok(Expr::Call { callee: Box::new(get), args })
            } else {
                Ok(get)
            }
        }

        Some("set") => {
            let rest = expect_arity(items, 3, "set")?;
            let target = compile_expr(&rest[1], scope, globals, intrinsics)?;
            let value = compile_expr(&rest[2], scope, globals, intrinsics)?;
            Ok(Expr::Set(Box::new(target), Box::new(value)))
        }

        Some("list") => Ok(Expr::ListLit(compile_each(&items[1..], scope, globals, intrinsics)?)),

        Some("map") => {
            let mut pairs = Vec::with_capacity(items.len() - 1);
            for pair in &items[1..] {
                let pair = pair.as_array().ok_or_else(|| CompilerError::MalformedForm {
                    expected: "a [key, value] pair",
                    got: pair.to_string(),
                })?;
                if pair.len() != 2 {
                    return Err(CompilerError::ArityMismatch {
                        tag: "map pair".to_string(),
                        expected: "2",
                        got: pair.len(),
                    });
                }
                let key = compile_expr(&pair[0], scope, globals, intrinsics)?;
                let value = compile_expr(&pair[1], scope, globals, intrinsics)?;
                pairs.push((key, value));
            }
            Ok(Expr::MapLit(pairs))
        }

        Some("seq") => {
            let mut exprs = compile_each(&items[1..], scope, globals, intrinsics)?;
            // Single-element `seq` collapses to its element.
            if exprs.len() == 1 {
                Ok(exprs.pop().unwrap())
            } else {
                Ok(Expr::Sequence(exprs))
            }
        }

        Some("if") => {
            if items.len() != 3 && items.len() != 4 {
                return Err(CompilerError::ArityMismatch {
                    tag: "if".to_string(),
                    expected: "3 or 4",
                    got: items.len(),
                });
            }
            let cond = compile_expr(&items[1], scope, globals, intrinsics)?;
            let then = compile_expr(&items[2], scope, globals, intrinsics)?;
            let or_else = items
                .get(3)
                .map(|e| compile_expr(e, scope, globals, intrinsics))
                .transpose()?;
            Ok(Expr::If {
                cond: Box::new(cond),
                then: Box::new(then),
                or_else: or_else.map(Box::new),
            })
        }

        Some("and") => {
            let rest = expect_arity(items, 3, "and")?;
            let l = compile_expr(&rest[1], scope, globals, intrinsics)?;
            let r = compile_expr(&rest[2], scope, globals, intrinsics)?;
            Ok(Expr::And(Box::new(l), Box::new(r)))
        }

        Some("or") => {
            let rest = expect_arity(items, 3, "or")?;
            let l = compile_expr(&rest[1], scope, globals, intrinsics)?;
            let r = compile_expr(&rest[2], scope, globals, intrinsics)?;
            Ok(Expr::Or(Box::new(l), Box::new(r)))
        }

        Some("loop") => {
            let rest = expect_arity(items, 2, "loop")?;
            let body = compile_expr(&rest[1], scope, globals, intrinsics)?;
            Ok(Expr::Loop(Box::new(body)))
        }

        // Anything else is a call: first element is the callee, the rest
        // are arguments. An empty array has no callee, which is an error.
        _ => {
            let callee = items
                .first()
                .ok_or_else(|| CompilerError::MalformedForm {
                    expected: "a callee expression",
                    got: "[]".to_string(),
                })?;
            let callee = compile_expr(callee, scope, globals, intrinsics)?;
            let args = compile_each(&items[1..], scope, globals, intrinsics)?;
            Ok(Expr::Call { callee: Box::new(callee), args })
        }
    }
}

fn compile_each(
    items: &[Json],
    scope: &mut Scope,
    globals: &Globals,
    intrinsics: &Intrinsics,
) -> Result<Vec<Expr>, CompilerError> {
    items
        .iter()
        .map(|item| compile_expr(item, scope, globals, intrinsics))
        .collect()
}

/// Parses a `["params", n1, n2, ...]` form, used by both `let` and `fn`.
/// Malformed arity or non-string names are a `CompilerError`, as are
/// duplicate names within the same list.
fn parse_params(json: &Json) -> Result<Vec<Rc<str>>, CompilerError> {
    let items = json.as_array().ok_or_else(|| CompilerError::MalformedForm {
        expected: "[\"params\", ...]",
        got: json.to_string(),
    })?;
    match items.first().and_then(Json::as_str) {
        Some("params") => {}
        _ => {
            return Err(CompilerError::MalformedForm {
                expected: "[\"params\", ...]",
                got: json.to_string(),
            })
        }
    }

    let mut names = Vec::with_capacity(items.len() - 1);
    let mut seen = std::collections::HashSet::new();
    for item in &items[1..] {
        let name = item.as_str().ok_or_else(|| CompilerError::InvalidParameterName {
            got: item.to_string(),
        })?;
        if !seen.insert(name.to_string()) {
            return Err(CompilerError::DuplicateParameter(name.to_string()));
        }
        names.push(Rc::from(name));
    }
    Ok(names)
}

fn expect_arity<'a>(items: &'a [Json], expected: usize, tag: &str) -> Result<&'a [Json], CompilerError> {
    if items.len() != expected {
        return Err(CompilerError::ArityMismatch {
            tag: tag.to_string(),
            expected: arity_label(expected),
            got: items.len(),
        });
    }
    Ok(items)
}

fn expect_min_arity<'a>(items: &'a [Json], min: usize, tag: &str) -> Result<&'a [Json], CompilerError> {
    if items.len() < min {
        return Err(CompilerError::ArityMismatch {
            tag: tag.to_string(),
            expected: arity_label(min),
            got: items.len(),
        });
    }
    Ok(items)
}

fn arity_label(n: usize) -> &'static str {
    match n {
        1 => "1",
        2 => "2",
        3 => "3",
        4 => "4",
        _ => "N",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::eval::Evaluator;

    fn run(json: &str) -> Value {
        let parsed: Json = serde_json::from_str(json).unwrap();
        let globals = Globals::new();
        let compiled = compile(&parsed, &globals).unwrap();
        assert!(compiled.free_vars.is_empty(), "unexpected free vars: {:?}", compiled.free_vars.keys().collect::<Vec<_>>());
        Evaluator::new().run(&compiled.expression).unwrap()
    }

    #[test]
    fn addition() {
        assert_eq!(run(r#"["+", 3, 4]"#), Value::Num(7.0));
    }

    #[test]
    fn let_set_get() {
        let v = run(
            r#"["seq", ["let", ["params","a"], ["seq", ["set", ["ref","a"], 3], ["get","a"]]]]"#,
        );
        assert_eq!(v, Value::Num(3.0));
    }

    #[test]
    fn fn_application() {
        let v = run(r#"[["fn", ["params","x"], ["+", "x", 1]], 41]"#);
        assert_eq!(v, Value::Num(42.0));
    }

    #[test]
    fn loop_break() {
        assert_eq!(run(r#"["loop", ["break", 5]]"#), Value::Num(5.0));
    }

    #[test]
    fn factorial_via_capture_and_self_reference() {
        let json = r#"["seq", ["let", ["params","fac"], ["seq",
            ["set", ["ref","fac"], ["fn", ["params","n"],
                ["if", ["<=","n",1], 1, ["*", "n", ["get","fac", ["-","n",1]]]]]],
            ["get","fac", 5]]]]"#;
        assert_eq!(run(json), Value::Num(120.0));
    }

    #[test]
    fn list_length_via_prop() {
        assert_eq!(
            run(r#"["get", ["prop", "length", ["list", 1, 2, 3]]]"#),
            Value::Num(3.0)
        );
    }

    #[test]
    fn list_get_via_prop_sugar() {
        assert_eq!(run(r#"["prop", "get", ["list", 1, 2, 3], 1]"#), Value::Num(2.0));
    }

    #[test]
    fn undefined_symbol_is_a_compiler_error() {
        let parsed: Json = serde_json::from_str(r#"["+", "nope", 1]"#).unwrap();
        let globals = Globals::new();
        assert!(compile(&parsed, &globals).is_err());
    }

    #[test]
    fn duplicate_param_names_are_rejected() {
        let parsed: Json =
            serde_json::from_str(r#"["fn", ["params", "x", "x"], "x"]"#).unwrap();
        let globals = Globals::new();
        assert!(compile(&parsed, &globals).is_err());
    }
}
