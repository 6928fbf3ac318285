//! Inline expression engine API.
//!
//! - [`DocumentTree`] - Tables, rows and cells of a document snapshot
//! - [`TableIndex`] - Coordinate-addressed cell texts per table (`table1`, ...)
//! - [`CellRef`] - Cell coordinates (A1 notation <-> col/row indices)
//! - [`scan_placeholders`] - Find `{...}` placeholders in a snapshot
//! - [`classify`] / [`rewrite_table_ranges`] - Prepare expressions for Rhai
//! - [`ExpressionEvaluator`] - Evaluate placeholders through an [`EvalCache`]
//! - [`render_document`] - Rewrite a whole snapshot

mod cache;
mod cell_ref;
mod document;
mod eval;
mod format;
mod latex;
mod preprocess;
mod render;
mod scanner;
mod table_index;

pub use cache::{EvalCache, Rendered};
pub use cell_ref::CellRef;
pub use document::{CellNode, DocumentTree, RowNode, TableNode};
pub use eval::{
    ERROR_CLASS, EvalOptions, ExpressionEvaluator, check_functions, create_engine, escape_braces,
    eval_with_functions_script, expression_text,
};
pub use format::{format_dynamic, format_number};
pub use latex::{MathRenderer, MathmlRenderer};
pub use preprocess::{
    ExpressionKind, LATEX_DELIMITER, RANGE_LOOKUP_FN, RewrittenExpression, classify,
    rewrite_table_ranges, table_range_re,
};
pub use render::{RenderContext, RenderedDocument, render_document};
pub use scanner::{Placeholder, scan_placeholders};
pub use table_index::{SharedIndex, TABLE_ID_PREFIX, Table, TableIndex, table_id};

pub use rhai::Dynamic;
