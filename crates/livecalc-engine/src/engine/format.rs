use super::Dynamic;
use crate::builtins::round_to;
use crate::error::{EvalError, Result};

/// Format an evaluation result for insertion into the document.
///
/// Floats are rounded to `decimals` places and printed without trailing
/// zeros; anything else is stringified as-is. The returned text is plain,
/// not yet escaped for markup.
pub fn format_dynamic(value: &Dynamic, decimals: u32) -> Result<String> {
    if value.is_unit() {
        Ok(String::new())
    } else if let Ok(n) = value.as_float() {
        format_number(n, decimals)
    } else if let Ok(n) = value.as_int() {
        Ok(n.to_string())
    } else if let Ok(s) = value.clone().into_string() {
        Ok(s)
    } else {
        Ok(value.to_string())
    }
}

/// Format a number rounded to `decimals` places.
pub fn format_number(n: f64, decimals: u32) -> Result<String> {
    if !n.is_finite() {
        return Err(EvalError::NonFinite);
    }
    let places = i32::try_from(decimals).unwrap_or(i32::MAX);
    let rounded = round_to(n, places);
    // Keep "-0" out of the document.
    if rounded == 0.0 {
        return Ok("0".to_string());
    }
    Ok(rounded.to_string())
}
