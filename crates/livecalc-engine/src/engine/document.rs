//! Structural view of a document snapshot.
//!
//! The table indexer only needs tables, their rows and their cells, so that is
//! all the tree keeps. Hosts that already hold a parsed document can build a
//! [`DocumentTree`] directly; [`DocumentTree::from_markup`] produces one from
//! serialized HTML-like markup.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// A single table cell. Header and data cells are kept uniformly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellNode {
    pub text: String,
}

impl CellNode {
    pub fn new(text: impl Into<String>) -> Self {
        CellNode { text: text.into() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowNode {
    pub cells: Vec<CellNode>,
}

impl RowNode {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RowNode {
            cells: texts.into_iter().map(CellNode::new).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableNode {
    pub rows: Vec<RowNode>,
}

/// Tables of a document in order of appearance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentTree {
    pub tables: Vec<TableNode>,
}

/// Which table-related element an open/close tag refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TableTag {
    Table,
    Row,
    Cell,
}

fn table_tag(local_name: &[u8]) -> Option<TableTag> {
    if local_name.eq_ignore_ascii_case(b"table") {
        Some(TableTag::Table)
    } else if local_name.eq_ignore_ascii_case(b"tr") {
        Some(TableTag::Row)
    } else if local_name.eq_ignore_ascii_case(b"td") || local_name.eq_ignore_ascii_case(b"th") {
        Some(TableTag::Cell)
    } else {
        None
    }
}

/// An open `<table>` while scanning.
struct OpenTable {
    index: usize,
    in_cell: bool,
}

#[derive(Default)]
struct TreeBuilder {
    tables: Vec<TableNode>,
    open: Vec<OpenTable>,
}

impl TreeBuilder {
    fn start(&mut self, tag: TableTag) {
        match tag {
            TableTag::Table => {
                // Numbered by where the table opens, so an outer table keeps
                // its place ahead of anything nested in it.
                self.open.push(OpenTable {
                    index: self.tables.len(),
                    in_cell: false,
                });
                self.tables.push(TableNode::default());
            }
            TableTag::Row => {
                if let Some(open) = self.open.last_mut() {
                    open.in_cell = false;
                    self.tables[open.index].rows.push(RowNode::default());
                }
            }
            TableTag::Cell => {
                if let Some(open) = self.open.last_mut() {
                    let table = &mut self.tables[open.index];
                    if table.rows.is_empty() {
                        table.rows.push(RowNode::default());
                    }
                    if let Some(row) = table.rows.last_mut() {
                        row.cells.push(CellNode::default());
                    }
                    open.in_cell = true;
                }
            }
        }
    }

    fn end(&mut self, tag: TableTag) {
        match tag {
            TableTag::Table => {
                self.open.pop();
            }
            TableTag::Row | TableTag::Cell => {
                if let Some(open) = self.open.last_mut() {
                    open.in_cell = false;
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        let Some(open) = self.open.last() else {
            return;
        };
        if !open.in_cell {
            return;
        }
        if let Some(cell) = self.tables[open.index]
            .rows
            .last_mut()
            .and_then(|row| row.cells.last_mut())
        {
            cell.text.push_str(text);
        }
    }

    fn finish(self) -> DocumentTree {
        DocumentTree {
            tables: self.tables,
        }
    }
}

impl DocumentTree {
    pub fn new(tables: Vec<TableNode>) -> Self {
        DocumentTree { tables }
    }

    /// Build the tree from serialized markup.
    ///
    /// Parsing is lenient: end tags are not matched against start tags (so
    /// HTML void elements such as `<br>` are fine) and entities are decoded
    /// with the HTML5 table. Markup that cannot be tokenized at all stops the
    /// scan; tables found up to that point are kept.
    pub fn from_markup(markup: &str) -> Self {
        let mut reader = Reader::from_str(markup);
        reader.config_mut().check_end_names = false;

        let mut builder = TreeBuilder::default();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    if let Some(tag) = table_tag(e.local_name().as_ref()) {
                        builder.start(tag);
                    }
                }
                Ok(Event::Empty(e)) => {
                    // `<td/>` opens and closes an empty cell.
                    if let Some(tag) = table_tag(e.local_name().as_ref()) {
                        builder.start(tag);
                        builder.end(tag);
                    }
                }
                Ok(Event::End(e)) => {
                    if let Some(tag) = table_tag(e.local_name().as_ref()) {
                        builder.end(tag);
                    }
                }
                Ok(Event::Text(t)) => {
                    let raw = String::from_utf8_lossy(&t);
                    builder.text(&html_escape::decode_html_entities(&raw));
                }
                Ok(Event::CData(t)) => {
                    builder.text(&String::from_utf8_lossy(&t));
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    log::warn!(
                        "markup parse stopped at byte {}: {}",
                        reader.buffer_position(),
                        e
                    );
                    break;
                }
            }
        }
        builder.finish()
    }
}
