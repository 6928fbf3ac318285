//! Error types for the expression engine.
//!
//! Every variant is local to a single placeholder: the renderer turns it into
//! an inline error marker and carries on with the rest of the document.

use rhai::{EvalAltResult, ParseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    /// A range names a table that the current snapshot does not contain.
    #[error("ReferenceError: {0} is not defined")]
    MissingTable(String),

    #[error("Invalid cell reference: {0}")]
    InvalidCellRef(String),

    #[error("Malformed range: {0}")]
    MalformedRange(String),

    #[error("Result is not a finite number")]
    NonFinite,

    #[error("Rhai error: {0}")]
    Rhai(
        #[from]
        #[source]
        Box<EvalAltResult>,
    ),

    #[error("Rhai compile error: {0}")]
    RhaiCompile(#[from] ParseError),
}

impl EvalError {
    /// Parse failures come from the range syntax itself, evaluation failures
    /// from everything downstream of it.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            EvalError::InvalidCellRef(_) | EvalError::MalformedRange(_) | EvalError::RhaiCompile(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
