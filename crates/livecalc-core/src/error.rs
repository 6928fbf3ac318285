//! Error types for livecalc core.

use thiserror::Error;

use livecalc_engine::EvalError;

/// Errors raised while setting up a refresh controller. Nothing in a refresh
/// cycle itself can fail.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error in custom functions: {0}")]
    Functions(#[source] EvalError),

    #[error("Debounce interval must be greater than zero")]
    ZeroDebounce,
}

pub type Result<T> = std::result::Result<T, CoreError>;
