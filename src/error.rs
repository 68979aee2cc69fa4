//! Error kinds for the Ark core: compile-time failures, runtime failures,
//! and the top-level union the public API returns.
//!
//! Non-local exits (break/continue/return) are deliberately NOT part of
//! this module — they are not errors, they are control flow. See
//! `crate::eval::Unwind`.

use std::fmt;

use crate::value::DebugLoc;

/// Failures raised while compiling a decoded JSON tree into an expression
/// graph.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompilerError {
    #[error("malformed form: expected {expected}, got {got}")]
    MalformedForm { expected: &'static str, got: String },

    #[error("tag {tag:?} expects {expected} element(s), got {got}")]
    ArityMismatch {
        tag: String,
        expected: &'static str,
        got: usize,
    },

    #[error("parameter name must be a string, got {got}")]
    InvalidParameterName { got: String },

    #[error("duplicate parameter name {0:?} in params list")]
    DuplicateParameter(String),

    #[error("undefined symbol {0:?}")]
    UndefinedSymbol(String),

    #[error("invalid JSON value at this position: {0}")]
    InvalidJson(String),
}

/// Failures raised while evaluating a compiled expression graph.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    #[error("cannot call a non-function value{}", loc_suffix(.loc))]
    InvalidCall { loc: Option<DebugLoc> },

    #[error("cannot assign through a non-reference value{}", loc_suffix(.loc))]
    InvalidAssignment { loc: Option<DebugLoc> },

    #[error("read of uninitialized symbol {name}{}", loc_suffix(.loc))]
    UninitializedSymbol {
        name: Option<String>,
        loc: Option<DebugLoc>,
    },

    #[error("index {index} out of bounds (length {length})")]
    IndexOutOfBounds { index: usize, length: usize },

    #[error("closure capture address resolved to no live slot in its enclosing frame")]
    InvalidCapture,

    #[error("host conversion failed: {0}")]
    HostConversion(String),

    #[error("a break or continue signal escaped the top-level program")]
    UnhandledSignal,

    #[error("wrong number of arguments: expected {expected}, got {got}")]
    ArgMismatch { expected: usize, got: usize },

    #[error("undefined symbols remained after compilation: {0:?}")]
    UndefinedSymbols(Vec<String>),
}

fn loc_suffix(loc: &Option<DebugLoc>) -> String {
    match loc {
        Some(loc) => format!(" at {loc}"),
        None => String::new(),
    }
}

/// Top-level union returned by the public `compile`/`run` entry points.
#[derive(Debug, Clone)]
pub enum ArkError {
    Compile(CompilerError),
    Runtime(RuntimeError),
}

impl fmt::Display for ArkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArkError::Compile(e) => write!(f, "{e}"),
            ArkError::Runtime(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ArkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArkError::Compile(e) => Some(e),
            ArkError::Runtime(e) => Some(e),
        }
    }
}

impl From<CompilerError> for ArkError {
    fn from(e: CompilerError) -> Self {
        ArkError::Compile(e)
    }
}

impl From<RuntimeError> for ArkError {
    fn from(e: RuntimeError) -> Self {
        ArkError::Runtime(e)
    }
}
