//! livecalc_engine - Inline expression engine + Rhai integration.

pub(crate) mod builtins;
pub mod engine;
pub mod error;

pub use error::{EvalError, Result};
