//! The crate's error hierarchy.
//!
//! Only genuinely recoverable conditions are `LtlError` variants. `Cancelled`
//! and `DepthExceeded` are not errors (they resolve to an ordinary
//! `SolverResult`); an invariant violation inside the engine is a bug and
//! panics rather than returning an `Err`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LtlError {
    #[error("syntax error at position {pos}: {message}")]
    ParseError { pos: usize, message: String },

    #[error("unsupported construct: {what}")]
    Unsupported { what: String },

    #[error("unable to open {path}: {message}")]
    Io { path: PathBuf, message: String },
}

pub type LtlResult<T> = Result<T, LtlError>;

impl LtlError {
    pub fn parse(pos: usize, message: impl Into<String>) -> Self {
        LtlError::ParseError {
            pos,
            message: message.into(),
        }
    }

    pub fn unsupported(what: impl Into<String>) -> Self {
        LtlError::Unsupported { what: what.into() }
    }

    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        LtlError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
