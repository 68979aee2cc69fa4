//! Non-local exits, modeled as a control-flow type threaded through
//! `Result`'s error channel rather than as exceptions — an explicit
//! control-flow enum returned up the evaluation chain is both cheaper and
//! harder to misuse than throwing and catching.

use crate::error::RuntimeError;
use crate::value::Value;

pub enum Unwind {
    Error(RuntimeError),
    Break(Value),
    Continue,
    Return(Value),
}

impl From<RuntimeError> for Unwind {
    fn from(e: RuntimeError) -> Self {
        Unwind::Error(e)
    }
}

pub type EvalResult = Result<Value, Unwind>;
