//! Built-in expression functions (Rust) and their metadata.
//!
//! Conventions:
//! - Every aggregate is registered in ALL CAPS and in lowercase, so both
//!   `SUM(table1[A1:A3])` and `sum(table1[A1:A3])` work.
//! - Aggregates take a Rhai array; table ranges rewrite to `TABLE_RANGE`,
//!   which returns exactly such an array.
//! - If you add a new aggregate, add it to `AGGREGATE_BUILTINS`; registration
//!   is driven from that table.

use crate::engine::{CellRef, RANGE_LOOKUP_FN, SharedIndex};
use rhai::{Array, Dynamic, Engine, EvalAltResult, Position};

pub struct AggregateBuiltin {
    pub names: &'static [&'static str],
    #[allow(dead_code)]
    pub description: &'static str,
    /// None when the aggregate is undefined for the given values.
    pub apply: fn(&[f64]) -> Option<f64>,
}

pub const AGGREGATE_BUILTINS: &[AggregateBuiltin] = &[
    AggregateBuiltin {
        names: &["SUM", "sum"],
        description: "Sum of the values (0 for an empty range)",
        apply: sum,
    },
    AggregateBuiltin {
        names: &["AVG", "avg", "AVERAGE", "average", "MEAN", "mean"],
        description: "Arithmetic mean of the values",
        apply: mean,
    },
    AggregateBuiltin {
        names: &["MIN", "min"],
        description: "Smallest value",
        apply: min,
    },
    AggregateBuiltin {
        names: &["MAX", "max"],
        description: "Largest value",
        apply: max,
    },
    AggregateBuiltin {
        names: &["COUNT", "count"],
        description: "Number of values",
        apply: count,
    },
    AggregateBuiltin {
        names: &["MEDIAN", "median"],
        description: "Middle value (mean of the two middle values for an even count)",
        apply: median,
    },
];

fn sum(values: &[f64]) -> Option<f64> {
    Some(values.iter().sum())
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

fn count(values: &[f64]) -> Option<f64> {
    Some(values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn invalid_arg(message: &str) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(message.into(), Position::NONE).into()
}

fn to_number(value: &Dynamic) -> Option<f64> {
    if let Ok(n) = value.as_float() {
        return Some(n);
    }
    if let Ok(n) = value.as_int() {
        return Some(n as f64);
    }
    None
}

fn array_numbers(name: &str, values: &Array) -> Result<Vec<f64>, Box<EvalAltResult>> {
    values
        .iter()
        .map(|v| {
            to_number(v).ok_or_else(|| {
                invalid_arg(&format!("{} expects numbers, got {}", name, v.type_name()))
            })
        })
        .collect()
}

fn parse_coord(text: &str) -> Result<CellRef, Box<EvalAltResult>> {
    CellRef::from_str(text).ok_or_else(|| invalid_arg(&format!("Invalid cell reference: {}", text)))
}

/// Register all built-in functions into the Rhai engine.
pub fn register_builtins(engine: &mut Engine, index: SharedIndex) {
    // Built-in integer operators are only overridable with fast operators off.
    engine.set_fast_operators(false);

    // TABLE_RANGE("table1", "A1", "B2"): numeric cell values, column-major.
    engine.register_fn(
        RANGE_LOOKUP_FN,
        move |table: &str, start: &str, end: &str| -> Result<Array, Box<EvalAltResult>> {
            let Some(cells) = index.get(table) else {
                return Err(invalid_arg(&format!("ReferenceError: {} is not defined", table)));
            };
            let start = parse_coord(start)?;
            let end = parse_coord(end)?;
            Ok(cells
                .range_values(&start, &end)
                .into_iter()
                .map(Dynamic::from_float)
                .collect())
        },
    );

    for builtin in AGGREGATE_BUILTINS {
        let apply = builtin.apply;
        let label = builtin.names[0];
        for name in builtin.names {
            engine.register_fn(
                *name,
                move |values: Array| -> Result<f64, Box<EvalAltResult>> {
                    let numbers = array_numbers(label, &values)?;
                    apply(&numbers)
                        .ok_or_else(|| invalid_arg(&format!("{} of an empty range", label)))
                },
            );
        }
    }

    // `/` always divides as floats: 10/3 is 3.333..., not 3.
    engine.register_fn("/", |a: i64, b: i64| -> f64 { a as f64 / b as f64 });

    // `^` is exponentiation rather than XOR.
    engine.register_fn("^", |base: i64, exp: i64| -> f64 {
        (base as f64).powf(exp as f64)
    });
    engine.register_fn("^", |base: f64, exp: f64| -> f64 { base.powf(exp) });
    engine.register_fn("^", |base: f64, exp: i64| -> f64 { base.powf(exp as f64) });
    engine.register_fn("^", |base: i64, exp: f64| -> f64 { (base as f64).powf(exp) });

    // POW(base, exp)
    engine.register_fn("POW", |base: f64, exp: f64| -> f64 { base.powf(exp) });
    engine.register_fn("POW", |base: f64, exp: i64| -> f64 {
        base.powf(exp as f64)
    });
    engine.register_fn("POW", |base: i64, exp: f64| -> f64 {
        (base as f64).powf(exp)
    });
    engine.register_fn("POW", |base: i64, exp: i64| -> f64 {
        (base as f64).powf(exp as f64)
    });

    engine.register_fn("SQRT", |x: f64| -> f64 { x.sqrt() });
    engine.register_fn("SQRT", |x: i64| -> f64 { (x as f64).sqrt() });

    engine.register_fn("ABS", |x: f64| -> f64 { x.abs() });
    engine.register_fn("ABS", |x: i64| -> Result<i64, Box<EvalAltResult>> {
        x.checked_abs().ok_or_else(|| invalid_arg("ABS overflow"))
    });

    // ROUND(x, places)
    engine.register_fn(
        "ROUND",
        |x: f64, places: i64| -> Result<f64, Box<EvalAltResult>> {
            Ok(round_to(x, round_places(places)?))
        },
    );
    engine.register_fn(
        "ROUND",
        |x: i64, places: i64| -> Result<f64, Box<EvalAltResult>> {
            round_places(places)?;
            Ok(x as f64)
        },
    );
}

/// Round half away from zero to `places` decimals.
/// Values too large to scale have no fractional digits and are returned as-is.
pub fn round_to(x: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = x * factor;
    if !scaled.is_finite() {
        return x;
    }
    scaled.round() / factor
}

fn round_places(places: i64) -> Result<i32, Box<EvalAltResult>> {
    i32::try_from(places)
        .ok()
        .filter(|p| (0..=12).contains(p))
        .ok_or_else(|| invalid_arg("places must be between 0 and 12"))
}
