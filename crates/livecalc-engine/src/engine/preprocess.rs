//! Expression classification and range rewriting.
//!
//! Before an expression reaches Rhai, table ranges such as `table1[A1:B2]`
//! are rewritten into range-lookup calls: `TABLE_RANGE("table1", "A1", "B2")`.
//! Text inside string literals is left untouched.

use regex::Regex;
use std::sync::OnceLock;

use super::cell_ref::CellRef;
use super::table_index::TABLE_ID_PREFIX;
use crate::error::{EvalError, Result};

/// Delimiter that marks a placeholder as LaTeX.
pub const LATEX_DELIMITER: &str = "$$";

/// Name of the range-lookup builtin that table ranges rewrite to.
pub const RANGE_LOOKUP_FN: &str = "TABLE_RANGE";

/// What kind of evaluation a placeholder needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpressionKind {
    /// `$$...$$`; holds the LaTeX with delimiters stripped and trimmed.
    Latex(String),
    /// Arithmetic that mentions a table.
    TableRange,
    Arithmetic,
}

/// Classify an expression. LaTeX wins over table ranges, which win over plain
/// arithmetic.
pub fn classify(source: &str) -> ExpressionKind {
    let trimmed = source.trim();
    if trimmed.len() >= 2 * LATEX_DELIMITER.len()
        && trimmed.starts_with(LATEX_DELIMITER)
        && trimmed.ends_with(LATEX_DELIMITER)
    {
        let inner = &trimmed[LATEX_DELIMITER.len()..trimmed.len() - LATEX_DELIMITER.len()];
        return ExpressionKind::Latex(inner.trim().to_string());
    }
    if source.contains(TABLE_ID_PREFIX) {
        return ExpressionKind::TableRange;
    }
    ExpressionKind::Arithmetic
}

/// Regex that matches table ranges like `table2[A1:C4]`.
///
/// Captures:
/// - group 1: table identifier (e.g. `table2`)
/// - group 2: start coordinate (e.g. `A1`)
/// - group 3: end coordinate (e.g. `C4`)
pub fn table_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(table[0-9]+)\[\s*([A-Za-z]+[0-9]+)\s*:\s*([A-Za-z]+[0-9]+)\s*\]")
            .expect("table range regex must compile")
    })
}

fn leftover_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\btable[0-9]+\s*\[").expect("leftover range regex must compile")
    })
}

/// An expression after range rewriting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewrittenExpression {
    pub script: String,
    /// Table identifiers referenced by ranges, in order of first use.
    pub tables: Vec<String>,
}

/// Rewrite every `table<N>[<Coord>:<Coord>]` outside string literals into a
/// range-lookup call.
///
/// Fails when a range names a coordinate that does not parse, or when
/// something that starts like a range (`table1[`) is left over.
pub fn rewrite_table_ranges(expression: &str) -> Result<RewrittenExpression> {
    let mut tables: Vec<String> = Vec::new();
    let mut failure: Option<EvalError> = None;

    let script = map_outside_strings(expression, |seg| {
        let rewritten = table_range_re()
            .replace_all(seg, |caps: &regex::Captures| {
                let id = &caps[1];
                for coord in [&caps[2], &caps[3]] {
                    if CellRef::from_str(coord).is_none() && failure.is_none() {
                        failure = Some(EvalError::InvalidCellRef(coord.to_string()));
                    }
                }
                if !tables.iter().any(|t| t == id) {
                    tables.push(id.to_string());
                }
                format!(
                    "{}(\"{}\", \"{}\", \"{}\")",
                    RANGE_LOOKUP_FN,
                    id,
                    caps[2].to_ascii_uppercase(),
                    caps[3].to_ascii_uppercase()
                )
            })
            .to_string();

        if failure.is_none()
            && let Some(m) = leftover_range_re().find(&rewritten)
        {
            failure = Some(EvalError::MalformedRange(
                rewritten[m.start()..].trim().to_string(),
            ));
        }
        rewritten
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(RewrittenExpression { script, tables }),
    }
}

/// Apply `f` to every segment of `script` that is not inside a `"..."`
/// literal, copying literals through unchanged.
fn map_outside_strings<F>(script: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let bytes = script.as_bytes();
    let mut out = String::with_capacity(script.len());
    let mut seg_start = 0;
    let mut in_string = false;
    let mut backslashes = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                backslashes += 1;
                i += 1;
                continue;
            }
            if b == b'"' && backslashes.is_multiple_of(2) {
                out.push_str(&script[seg_start..=i]);
                in_string = false;
                seg_start = i + 1;
            }
            backslashes = 0;
            i += 1;
            continue;
        }

        if b == b'"' {
            out.push_str(&f(&script[seg_start..i]));
            in_string = true;
            seg_start = i;
            backslashes = 0;
        }
        i += 1;
    }

    if seg_start < script.len() {
        if in_string {
            out.push_str(&script[seg_start..]);
        } else {
            out.push_str(&f(&script[seg_start..]));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_priority() {
        assert_eq!(classify("$$x^2$$"), ExpressionKind::Latex("x^2".to_string()));
        assert_eq!(
            classify("$$ table1 $$"),
            ExpressionKind::Latex("table1".to_string())
        );
        assert_eq!(classify("sum(table1[A1:B2])"), ExpressionKind::TableRange);
        assert_eq!(classify("2 + 2"), ExpressionKind::Arithmetic);
    }

    #[test]
    fn test_classify_lone_delimiter_is_not_latex() {
        assert_eq!(classify("$$"), ExpressionKind::Arithmetic);
        assert_eq!(classify("$$$"), ExpressionKind::Arithmetic);
    }

    #[test]
    fn test_rewrite_single_range() {
        let rewritten = rewrite_table_ranges("sum(table1[A1:B2]) * 2").unwrap();
        assert_eq!(
            rewritten.script,
            "sum(TABLE_RANGE(\"table1\", \"A1\", \"B2\")) * 2"
        );
        assert_eq!(rewritten.tables, vec!["table1".to_string()]);
    }

    #[test]
    fn test_rewrite_multiple_ranges_and_spacing() {
        let rewritten = rewrite_table_ranges("max(table2[ a1 : a3 ]) - min(table1[B1:B2]) + max(table2[C1:C1])").unwrap();
        assert_eq!(
            rewritten.script,
            "max(TABLE_RANGE(\"table2\", \"A1\", \"A3\")) - min(TABLE_RANGE(\"table1\", \"B1\", \"B2\")) + max(TABLE_RANGE(\"table2\", \"C1\", \"C1\"))"
        );
        assert_eq!(rewritten.tables, vec!["table2".to_string(), "table1".to_string()]);
    }

    #[test]
    fn test_rewrite_leaves_string_literals_alone() {
        let rewritten = rewrite_table_ranges("\"table1[A1:B2]\" + table1[A1:A1].len()").unwrap();
        assert_eq!(
            rewritten.script,
            "\"table1[A1:B2]\" + TABLE_RANGE(\"table1\", \"A1\", \"A1\").len()"
        );
    }

    #[test]
    fn test_rewrite_rejects_row_zero() {
        let err = rewrite_table_ranges("sum(table1[A0:B2])").unwrap_err();
        assert!(matches!(err, EvalError::InvalidCellRef(ref c) if c == "A0"));
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_rewrite_rejects_malformed_range() {
        let err = rewrite_table_ranges("sum(table1[A1:])").unwrap_err();
        assert!(matches!(err, EvalError::MalformedRange(_)));
    }

    #[test]
    fn test_rewrite_without_ranges_is_identity() {
        let rewritten = rewrite_table_ranges("tables + 1").unwrap();
        assert_eq!(rewritten.script, "tables + 1");
        assert!(rewritten.tables.is_empty());
    }
}
