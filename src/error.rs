// ABOUTME: Error types for reader and evaluation failures in the interpreter

use crate::eval::TailCall;
use crate::value::Value;
use thiserror::Error;

// ===== Arity constant strings (eliminates allocations in error paths) =====
pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_THREE: &str = "3";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";
pub const ARITY_ONE_OR_TWO: &str = "1-2";
pub const ARITY_TWO_OR_THREE: &str = "2-3";

#[derive(Error, Debug, Clone)]
pub enum PsilError {
    /// The reader could not tokenize or parse the input
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Symbol resolution fell off the scope chain and the globals fallback
    #[error("undefined symbol: {0}")]
    UndefinedSymbol(String),

    /// The target of `set!` was not a symbol
    #[error("set!: not a symbol: {0}")]
    SetNotSymbol(String),

    /// Head position evaluated to something that cannot be applied
    #[error("not callable: {0}")]
    NotCallable(String),

    /// `unquote`/`unquote-splicing` encountered outside any quasiquote
    #[error("invalid unquote depth")]
    UnquoteDepth,

    /// Type mismatch with function name, expected type, actual type, and position
    #[error("{function}: expected {expected}, got {actual} at argument {position}")]
    TypeMismatch {
        function: String,
        expected: String,
        actual: String,
        position: usize,
    },

    /// Arity error with function name, expected count/range, and actual count
    #[error("{function}: expected {expected} argument{}, got {actual}", if *.expected == "1" { "" } else { "s" })]
    Arity {
        function: String,
        expected: String, // "2", "1-3", "at least 1"
        actual: usize,
    },

    /// Runtime error with function context
    #[error("{function}: {message}")]
    Runtime { function: String, message: String },

    /// Internal sentinel for the tail-call trampoline. Raised when a
    /// callable is applied in tail position; consumed by the nearest
    /// non-tail frame. It is a bug for one to reach a user.
    #[error("uncollected tail call")]
    TailCall(Box<TailCall>),
}

impl PsilError {
    /// Create a type mismatch error with full context
    pub fn type_error(function: &str, expected: &str, actual: &Value, position: usize) -> Self {
        PsilError::TypeMismatch {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
            position,
        }
    }

    /// Create an arity error with expected and actual counts
    pub fn arity_error(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        PsilError::Arity {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    /// Create a runtime error with function context
    pub fn runtime_error(function: &str, message: impl Into<String>) -> Self {
        PsilError::Runtime {
            function: function.to_string(),
            message: message.into(),
        }
    }
}
