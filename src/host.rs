//! The host-value adapter: the boundary between Ark values and whatever
//! embedding language is running the core. This crate has no embedding
//! language of its own to adapt to, so `serde_json::Value` stands in as
//! the host representation, since it is already this crate's JSON
//! boundary type and expressive enough to round-trip every primitive and
//! container Ark value.

use std::collections::HashMap;

use serde_json::{Number, Value as Json};

use crate::error::RuntimeError;
use crate::eval::Stack;
use crate::value::{intern, Value};

/// Truthiness coercion used by `If`/`And`/`Or`. Mirrors ordinary JS
/// truthiness: `Null`, `Undefined`, `false`, `0`, `NaN`, and `""` are
/// falsy; every other value, including empty containers, is truthy.
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Null | Value::Undefined => false,
        Value::Bool(b) => *b,
        Value::Num(n) => *n != 0.0 && !n.is_nan(),
        Value::Str(s) => !s.is_empty(),
        _ => true,
    }
}

/// Coerces a value to a number the way intrinsic arithmetic does:
/// projecting both operands through the host boundary before performing
/// host-native arithmetic. `toHost` on a `Num` is the identity; the other
/// cases mirror JS's `ToNumber` for the primitive types actually reachable
/// from an arithmetic call site.
pub fn coerce_number(value: &Value) -> Result<f64, RuntimeError> {
    match value {
        Value::Num(n) => Ok(*n),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Null => Ok(0.0),
        Value::Str(s) => s.trim().parse::<f64>().map_err(|_| {
            RuntimeError::HostConversion(format!("cannot coerce {s:?} to a number"))
        }),
        other => Err(RuntimeError::HostConversion(format!(
            "cannot coerce a {} to a number",
            other.type_name()
        ))),
    }
}

/// Dereferences `value` the way `Get` does, but as a bare function rather
/// than an `Expr` variant. The intrinsic operator table
/// (`crate::intrinsics`) uses this: a bare-symbol argument like `"x"` in
/// `["+", "x", 1]` compiles to a `Ref` value, and intrinsics must deref it
/// before projecting through `coerce_number`/`to_bool`. A plain, non-`Ref`
/// value passes through unchanged.
pub fn deref(stack: &Stack, value: &Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Ref(r) => {
            let inner = r.get(stack)?;
            if let Value::Undefined = inner {
                return Err(RuntimeError::UninitializedSymbol {
                    name: r.name().map(|n| n.to_string()),
                    loc: None,
                });
            }
            Ok(inner)
        }
        other => Ok(other.clone()),
    }
}

/// `fromHost`: maps a decoded JSON value into the Ark value model. Host
/// callables and arbitrary host objects have no JSON shape, so this
/// function only ever sees the wire format's own leaf types — the
/// compiler is the only caller, and it never needs to lift a native
/// callable across this boundary (intrinsics and globals are constructed
/// directly as `Value::NativeFn`/`Value::Ref`, never decoded).
pub fn from_host(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Num(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => Value::str(s),
        Json::Array(items) => Value::list(items.iter().map(from_host).collect()),
        Json::Object(fields) => {
            let mut map = HashMap::with_capacity(fields.len());
            for (k, v) in fields {
                map.insert(intern::intern_str(k), from_host(v));
            }
            Value::object(map)
        }
    }
}

/// `toHost`: the mirror image, collapsing `List`/`Map`/
/// `Object` into native JSON containers. `Map` has no homomorphic JSON
/// shape (its keys may be any Ark value, not just strings), so it renders
/// as an array of `[key, value]` pairs. A `Closure`/`NativeFn`/`Ref`
/// crossing the boundary has no JSON shape at all; it renders through its
/// `Display` impl as a best-effort string, matching what `print`/`debug`
/// already do for such values.
pub fn to_host(value: &Value) -> Json {
    match value {
        Value::Null | Value::Undefined => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Num(n) => Number::from_f64(*n).map(Json::Number).unwrap_or(Json::Null),
        Value::Str(s) => Json::String(s.to_string()),
        Value::List(list) => Json::Array(list.borrow().items.iter().map(to_host).collect()),
        Value::Map(map) => Json::Array(
            map.borrow()
                .iter()
                .map(|(k, v)| Json::Array(vec![to_host(k), to_host(v)]))
                .collect(),
        ),
        Value::Object(obj) => {
            let mut out = serde_json::Map::new();
            for (k, v) in &obj.borrow().fields {
                out.insert(k.to_string(), to_host(v));
            }
            Json::Object(out)
        }
        other => Json::String(other.to_string()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn truthiness_matches_js_semantics() {
        assert!(!to_bool(&Value::Null));
        assert!(!to_bool(&Value::Bool(false)));
        assert!(!to_bool(&Value::Num(0.0)));
        assert!(!to_bool(&Value::Num(f64::NAN)));
        assert!(!to_bool(&Value::str("")));
        assert!(to_bool(&Value::Num(-1.0)));
        assert!(to_bool(&Value::str("false")));
        assert!(to_bool(&Value::list(vec![])));
    }

    #[test]
    fn round_trips_json_leaves() {
        let json = serde_json::json!({"a": 1.0, "b": [true, null, "s"]});
        let value = from_host(&json);
        assert_eq!(to_host(&value), json);
    }
}
