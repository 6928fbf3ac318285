//! Snapshot rewriting: every placeholder replaced by its rendering.

use std::sync::Arc;

use super::cache::EvalCache;
use super::eval::{EvalOptions, ExpressionEvaluator};
use super::latex::MathRenderer;
use super::scanner::scan_placeholders;
use super::table_index::TableIndex;

/// Result of rendering one snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedDocument {
    pub markup: String,
    pub placeholders: usize,
    pub failures: usize,
}

/// Everything one rendering pass needs besides the snapshot.
pub struct RenderContext<'a> {
    pub cache: &'a EvalCache,
    pub renderer: &'a dyn MathRenderer,
    pub options: &'a EvalOptions,
    pub custom_functions: Option<&'a str>,
}

/// Index the snapshot's tables, evaluate its placeholders and splice the
/// renderings in left to right.
pub fn render_document(snapshot: &str, ctx: &RenderContext<'_>) -> RenderedDocument {
    let placeholders = scan_placeholders(snapshot);
    if placeholders.is_empty() {
        return RenderedDocument {
            markup: snapshot.to_string(),
            placeholders: 0,
            failures: 0,
        };
    }

    let index = Arc::new(TableIndex::from_markup(snapshot));
    log::trace!(
        "rendering {} placeholders against {} tables",
        placeholders.len(),
        index.len()
    );
    let evaluator = ExpressionEvaluator::new(index, ctx.renderer, ctx.options)
        .with_functions(ctx.custom_functions);

    let mut markup = String::with_capacity(snapshot.len());
    let mut failures = 0;
    let mut last = 0;
    for placeholder in &placeholders {
        markup.push_str(&snapshot[last..placeholder.span.start]);
        let rendered = evaluator.evaluate(&placeholder.source, ctx.cache);
        if rendered.failed {
            failures += 1;
        }
        markup.push_str(&rendered.markup);
        last = placeholder.span.end;
    }
    markup.push_str(&snapshot[last..]);

    RenderedDocument {
        markup,
        placeholders: placeholders.len(),
        failures,
    }
}
