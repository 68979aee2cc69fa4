//! Ark: a small dynamically-typed expression language shipped as a
//! JSON-serialized abstract syntax tree plus a tree-walking evaluator.
//! This crate is the core a surface language's toolchain would target:
//! its compiler turns decoded JSON into an expression graph with
//! lexical-address resolution and closure capture; its evaluator walks
//! that graph against a runtime stack, with non-local exits for
//! break/continue/return.

pub mod compiler;
pub mod error;
pub mod eval;
pub mod expr;
pub mod globals;
pub mod host;
pub mod intrinsics;
pub mod value;

use error::{ArkError, RuntimeError};
use eval::Evaluator;
use value::Value;

/// The compiler-plus-evaluator entry point: holds the global namespace
/// and runs compiled programs against fresh runtime stacks.
pub struct ArkState {
    globals: globals::Globals,
}

impl ArkState {
    pub fn new() -> Self {
        ArkState {
            globals: globals::Globals::new(),
        }
    }

    /// `compile(json, env?) → {expression, freeVars, boundVars?}`. `env`
    /// here is always this state's global namespace — this crate has no
    /// REPL layer that would need a caller-supplied partial environment.
    pub fn compile(&self, json: &serde_json::Value) -> Result<compiler::Compiled, ArkError> {
        compiler::compile(json, &self.globals).map_err(ArkError::from)
    }

    /// `ArkState.run(compiled) → Value`: evaluates against a fresh runtime
    /// stack seeded by this state's globals. Fails with
    /// `RuntimeError::UndefinedSymbols` if the caller skipped verifying
    /// `compiled.free_vars` is empty.
    pub fn run(&self, compiled: &compiler::Compiled) -> Result<Value, ArkError> {
        if !compiled.free_vars.is_empty() {
            let mut names: Vec<String> = compiled.free_vars.keys().map(|s| s.to_string()).collect();
            names.sort();
            return Err(ArkError::from(RuntimeError::UndefinedSymbols(names)));
        }
        Evaluator::new().run(&compiled.expression).map_err(ArkError::from)
    }

    /// Compiles and runs `json` in one step, the common case for a
    /// self-contained program.
    pub fn eval(&self, json: &serde_json::Value) -> Result<Value, ArkError> {
        let compiled = self.compile(json)?;
        self.run(&compiled)
    }
}

impl Default for ArkState {
    fn default() -> Self {
        ArkState::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn eval_runs_a_self_contained_program() {
        let state = ArkState::new();
        let json: serde_json::Value = serde_json::from_str(r#"["+", 3, 4]"#).unwrap();
        assert_eq!(state.eval(&json).unwrap(), Value::Num(7.0));
    }

    #[test]
    fn globals_are_visible_to_compiled_programs() {
        let state = ArkState::new();
        let json: serde_json::Value = serde_json::from_str("\"pi\"").unwrap();
        let result = state.eval(&json).unwrap();
        match result {
            Value::Num(n) => assert!((n - std::f64::consts::PI).abs() < 1e-12),
            other => panic!("expected a number, got {other:?}"),
        }
    }
}
