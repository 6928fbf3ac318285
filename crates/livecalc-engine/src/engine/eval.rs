//! Rhai engine creation and placeholder evaluation.
//!
//! Creates the Rhai engine with the range lookup and aggregate builtins bound
//! to one cycle's [`TableIndex`](super::TableIndex), and evaluates placeholder
//! expressions through the document's [`EvalCache`].

use regex::Regex;
use rhai::{Engine, EvalAltResult};
use std::borrow::Cow;
use std::cell::OnceCell;
use std::sync::OnceLock;

use super::cache::{EvalCache, Rendered};
use super::format::format_dynamic;
use super::latex::MathRenderer;
use super::preprocess::{ExpressionKind, classify, rewrite_table_ranges};
use super::table_index::SharedIndex;
use super::{Dynamic, TableIndex};
use crate::error::{EvalError, Result};

/// CSS class carried by inline error markers.
pub const ERROR_CLASS: &str = "livecalc-error";

/// Rendering options shared by every placeholder of a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalOptions {
    /// Decimal places numeric results are rounded to.
    pub decimals: u32,
    /// CSS colour of error markers.
    pub error_color: String,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            decimals: 3,
            error_color: "red".to_string(),
        }
    }
}

/// Create a Rhai engine with built-ins bound to `index`.
pub fn create_engine(index: SharedIndex) -> Engine {
    let mut engine = Engine::new();
    crate::builtins::register_builtins(&mut engine, index);
    engine
}

/// Check that a custom functions script compiles against the built-ins.
pub fn check_functions(script: &str) -> Result<()> {
    create_engine(SharedIndex::default()).compile(script)?;
    Ok(())
}

/// Evaluate an expression with custom functions provided as script text.
/// The scripts are concatenated so the expression can call the functions.
pub fn eval_with_functions_script(
    engine: &Engine,
    expression: &str,
    custom_script: Option<&str>,
) -> std::result::Result<Dynamic, Box<EvalAltResult>> {
    if let Some(script) = custom_script {
        let combined = format!("{}\n{}", script, expression);
        engine.eval(&combined)
    } else {
        engine.eval(expression)
    }
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex must compile"))
}

/// The expression a placeholder's markup source stands for: inline tags
/// dropped, entities decoded.
pub fn expression_text(source: &str) -> String {
    let without_tags = tag_re().replace_all(source, "");
    html_escape::decode_html_entities(&without_tags).into_owned()
}

/// Evaluates the placeholders of one snapshot.
///
/// The Rhai engine is only built when a placeholder misses the cache.
pub struct ExpressionEvaluator<'a> {
    index: SharedIndex,
    renderer: &'a dyn MathRenderer,
    options: &'a EvalOptions,
    custom_functions: Option<&'a str>,
    engine: OnceCell<Engine>,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(index: SharedIndex, renderer: &'a dyn MathRenderer, options: &'a EvalOptions) -> Self {
        ExpressionEvaluator {
            index,
            renderer,
            options,
            custom_functions: None,
            engine: OnceCell::new(),
        }
    }

    pub fn with_functions(mut self, custom_functions: Option<&'a str>) -> Self {
        self.custom_functions = custom_functions;
        self
    }

    pub fn index(&self) -> &TableIndex {
        &self.index
    }

    fn engine(&self) -> &Engine {
        self.engine.get_or_init(|| create_engine(self.index.clone()))
    }

    /// Rendering for a placeholder's source text, from the cache when this
    /// exact text was seen before. Failures become error markers and are
    /// cached like any other rendering.
    pub fn evaluate(&self, source: &str, cache: &EvalCache) -> Rendered {
        if let Some(hit) = cache.get(source) {
            log::trace!("cache hit for {:?}", source);
            return hit;
        }

        let rendered = match self.evaluate_expression(source) {
            Ok(markup) => Rendered::ok(markup),
            Err(e) => {
                log::debug!("placeholder {:?} failed: {}", source, e);
                Rendered::error(self.error_marker(source, &e))
            }
        };
        cache.put(source, rendered.clone());
        rendered
    }

    /// Evaluate without the cache, returning markup on success.
    pub fn evaluate_expression(&self, source: &str) -> Result<String> {
        let expression = expression_text(source);
        match classify(&expression) {
            ExpressionKind::Latex(latex) => {
                Ok(escape_braces(&self.renderer.render(&latex)).into_owned())
            }
            ExpressionKind::TableRange => {
                let rewritten = rewrite_table_ranges(&expression)?;
                if let Some(missing) = rewritten.tables.iter().find(|id| !self.index.contains(id)) {
                    return Err(EvalError::MissingTable(missing.clone()));
                }
                self.eval_arithmetic(&rewritten.script)
            }
            ExpressionKind::Arithmetic => self.eval_arithmetic(&expression),
        }
    }

    fn eval_arithmetic(&self, script: &str) -> Result<String> {
        let value = eval_with_functions_script(self.engine(), script, self.custom_functions)?;
        let text = format_dynamic(&value, self.options.decimals)?;
        Ok(escape_text(&text).into_owned())
    }

    /// Inline marker for a failed placeholder: its source, flagged in the
    /// error colour, with the error message as a tooltip. The braces are
    /// dropped so the marker is not picked up again on the next scan.
    pub fn error_marker(&self, source: &str, error: &EvalError) -> String {
        format!(
            "<span class=\"{}\" style=\"color: {}\" title=\"{}\">{}</span>",
            ERROR_CLASS,
            escape_braces(&html_escape::encode_double_quoted_attribute(&self.options.error_color)),
            escape_braces(&html_escape::encode_double_quoted_attribute(&error.to_string())),
            source
        )
    }
}

fn escape_text(text: &str) -> Cow<'_, str> {
    match html_escape::encode_text(text) {
        Cow::Borrowed(s) => escape_braces(s),
        Cow::Owned(s) => Cow::Owned(escape_braces(&s).into_owned()),
    }
}

/// Encode `{` and `}` as character references. Rendered output must never
/// contain a brace, or the next scan would find a placeholder in it.
pub fn escape_braces(markup: &str) -> Cow<'_, str> {
    if !markup.contains(['{', '}']) {
        return Cow::Borrowed(markup);
    }
    let mut out = String::with_capacity(markup.len() + 8);
    for c in markup.chars() {
        match c {
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
