// src/extractors/normalize.rs

// --- Imports ---
use once_cell::sync::Lazy;
use scraper::{node::Node, ElementRef, Html, Selector};

// --- CSS Selectors (Lazy Static) ---
static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table").expect("Failed to compile TABLE_SELECTOR")
});

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Failed to compile ROW_SELECTOR")
});

// Only data cells; header cells never carry the line-item labels we look for.
static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("td").expect("Failed to compile CELL_SELECTOR")
});

// Text under these elements is not part of the rendered document.
const NON_CONTENT_TAGS: [&str; 3] = ["script", "style", "template"];

// --- Data Structures ---

/// One `<tr>`: the trimmed text of each data cell, left to right.
pub type Row = Vec<String>;

/// One `<table>`: its rows in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

/// What the balance-sheet scanner needs from a parsed document.
///
/// Keeps the scanning logic independent of the HTML parser: anything that
/// can list its tables and render itself as line-separated text will do.
pub trait TableSource {
    /// All tables in document order, nested tables included as their own entries.
    fn tables(&self) -> Vec<Table>;

    /// The document's text fragments joined with newlines.
    fn flattened_text(&self) -> String;
}

/// `scraper`-backed [`TableSource`].
pub struct HtmlDocument {
    document: Html,
}

impl HtmlDocument {
    /// Parses arbitrary input. html5ever recovers from any malformed markup,
    /// so this never fails; empty input yields an empty document.
    pub fn parse(raw_html: &str) -> Self {
        Self { document: Html::parse_document(raw_html) }
    }
}

impl TableSource for HtmlDocument {
    fn tables(&self) -> Vec<Table> {
        self.document
            .select(&TABLE_SELECTOR)
            .map(table_from_element)
            .collect()
    }

    fn flattened_text(&self) -> String {
        self.document
            .tree
            .root()
            .descendants()
            .filter_map(|node| match node.value() {
                Node::Text(text) => {
                    let hidden = node.ancestors().any(|ancestor| is_non_content(ancestor.value()));
                    (!hidden).then_some(&**text)
                }
                _ => None,
            })
            .collect::<Vec<&str>>()
            .join("\n")
    }
}

fn is_non_content(node: &Node) -> bool {
    node.as_element()
        .map_or(false, |el| NON_CONTENT_TAGS.contains(&el.name()))
}

fn table_from_element(table: ElementRef) -> Table {
    let rows = table
        .select(&ROW_SELECTOR)
        .map(|tr| tr.select(&CELL_SELECTOR).map(cell_text).collect())
        .collect();
    Table::new(rows)
}

/// Each text fragment trimmed, blanks dropped, the rest concatenated.
fn cell_text(cell: ElementRef) -> String {
    cell.text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}
