//! Crate-local error taxonomy.
//!
//! A `thiserror`-derived enum with the byte offset threaded through as a
//! field rather than returned as a signed sentinel integer — `Result<T, E>`
//! already gives us the success/failure split a positive/negative convention
//! exists to fake in a language without sum types.

use thiserror::Error;

/// Everything that can go wrong building, resolving, or expanding a [`crate::value::Tmpl`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TmplError {
    #[error("parse error at byte {offset}: {reason}")]
    Parse { offset: isize, reason: String },

    #[error("attribute name exceeds the {cap}-byte undefined-name buffer")]
    NameTooLong { cap: usize },

    #[error("unknown attribute '{name}'")]
    UnknownAttr { name: String },

    #[error("no context: {0}")]
    NoContext(&'static str),

    #[error("no list for this qualifier")]
    NoList,

    #[error("no matching attribute")]
    NoMatch,

    #[error("allocation failed")]
    AllocFailed,

    #[error("type mismatch redefining '{name}'")]
    TypeMismatch { name: String },

    #[error("external program execution failed: {0}")]
    ExecFailed(String),

    #[error("expression expansion failed: {0}")]
    XlatFailed(String),

    #[error("template invariant violated: {0}")]
    InvariantViolation(String),
}

pub type TmplResult<T> = Result<T, TmplError>;
