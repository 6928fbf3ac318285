//! Placeholder detection.
//!
//! A placeholder runs from a `{` to the next `}`. Braces never nest, so an
//! expression can not itself contain a literal brace.

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// A `{...}` span found in a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placeholder {
    /// Text between the braces, exactly as it appears in the snapshot.
    pub source: String,
    /// Byte range of the whole placeholder, braces included.
    pub span: Range<usize>,
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]+)\}").expect("placeholder regex must compile"))
}

/// All placeholders of `snapshot` in source order.
pub fn scan_placeholders(snapshot: &str) -> Vec<Placeholder> {
    placeholder_re()
        .captures_iter(snapshot)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Placeholder {
                source: caps[1].to_string(),
                span: whole.range(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scan_in_source_order_with_spans() {
        let snapshot = "<p>a {1+1} b { x } c</p>";
        let found = scan_placeholders(snapshot);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].source, "1+1");
        assert_eq!(&snapshot[found[0].span.clone()], "{1+1}");
        assert_eq!(found[1].source, " x ");
    }

    #[test]
    fn test_first_closing_brace_wins() {
        let found = scan_placeholders("{$$\\frac{1}{2}$$}");
        assert_eq!(found[0].source, "1");
        assert_eq!(found[1].source, "2");
    }

    #[test]
    fn test_empty_and_unclosed_braces_are_not_placeholders() {
        assert!(scan_placeholders("{} and { open").is_empty());
        assert!(scan_placeholders("no braces here").is_empty());
    }
}
