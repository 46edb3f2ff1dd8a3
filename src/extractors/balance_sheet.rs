// src/extractors/balance_sheet.rs

// --- Imports ---
use crate::extractors::normalize::{HtmlDocument, Row, Table, TableSource};
use crate::extractors::patterns;
use crate::report::ExtractionResult;

// --- Data Structures ---

/// The tier that resolved a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Label row itself carried exactly two figures.
    SameRow,
    /// A later blank-label row in the same table carried them.
    SumRow,
    /// Regex over the flattened document text.
    Inline,
}

/// Resolution state of one start/end pair.
///
/// `Unresolved` moves to `Resolved` at most once; a resolved pair is never
/// overwritten by a later candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldState {
    #[default]
    Unresolved,
    Resolved {
        start: String,
        end: String,
        via: Resolution,
    },
}

impl FieldState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, FieldState::Resolved { .. })
    }

    /// Fires the transition. Returns `false` (and changes nothing) when the
    /// pair was already resolved.
    pub fn resolve(&mut self, (start, end): (String, String), via: Resolution) -> bool {
        if self.is_resolved() {
            return false;
        }
        *self = FieldState::Resolved { start, end, via };
        true
    }

    pub fn resolution(&self) -> Option<Resolution> {
        match self {
            FieldState::Resolved { via, .. } => Some(*via),
            FieldState::Unresolved => None,
        }
    }

    fn write_into(&self, start_slot: &mut String, end_slot: &mut String) {
        if let FieldState::Resolved { start, end, .. } = self {
            start_slot.clone_from(start);
            end_slot.clone_from(end);
        }
    }
}

/// The two line items tracked while scanning one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineItems {
    /// Technische Anlagen und Maschinen.
    pub tech: FieldState,
    /// Sachanlagen.
    pub sach: FieldState,
}

impl LineItems {
    pub fn all_resolved(&self) -> bool {
        self.tech.is_resolved() && self.sach.is_resolved()
    }
}

// --- Main Extractor Structure ---

/// Pulls period dates and the Technische Anlagen / Sachanlagen figures out
/// of a Jahresabschluss.
///
/// Tiers, in priority order: the label row itself, a sum row below it in
/// the same table (Sachanlagen only), then a regex over the whole text.
/// Malformed input is ordinary data; the result is always complete.
#[derive(Debug, Default)]
pub struct BalanceSheetExtractor;

impl BalanceSheetExtractor {
    pub fn new() -> Self { Self {} }

    /// Parses `raw_html` and extracts from it.
    pub fn extract(&self, raw_html: &str, company_name: Option<&str>) -> ExtractionResult {
        if raw_html.trim().is_empty() {
            tracing::debug!("No HTML provided, returning defaults");
            return assemble(company_name, None, &LineItems::default());
        }
        let document = HtmlDocument::parse(raw_html);
        self.extract_from(&document, company_name)
    }

    /// Extracts from any parsed document.
    pub fn extract_from<S: TableSource + ?Sized>(
        &self,
        source: &S,
        company_name: Option<&str>,
    ) -> ExtractionResult {
        let text = source.flattened_text();

        // 1. Period dates
        let dates = patterns::period_dates(&text);
        tracing::debug!("Period dates: {:?}", dates);

        // 2. Tables
        let tables = source.tables();
        tracing::debug!("Found {} table(s)", tables.len());
        let mut items = self.scan_tables(&tables);

        // 3. Inline fallback for whatever the tables left open
        self.apply_inline_fallback(&text, &mut items);
        tracing::debug!(
            "Resolved via: technische anlagen {:?}, sachanlagen {:?}",
            items.tech.resolution(),
            items.sach.resolution()
        );

        assemble(company_name, dates, &items)
    }

    /// Runs the table tiers over all tables in order, stopping as soon as
    /// both line items are resolved.
    pub fn scan_tables(&self, tables: &[Table]) -> LineItems {
        let mut items = LineItems::default();
        for (t_idx, table) in tables.iter().enumerate() {
            tracing::trace!("Checking table #{} ({} rows)", t_idx, table.rows.len());
            self.scan_table(table, &mut items);
            if items.all_resolved() {
                tracing::debug!("Both line items resolved after table #{}, skipping the rest", t_idx);
                break;
            }
        }
        items
    }

    fn scan_table(&self, table: &Table, items: &mut LineItems) {
        // First Technische Anlagen label in a table decides it, win or lose.
        let mut tech_label_seen = false;

        for (r_idx, cells) in table.rows.iter().enumerate() {
            let Some(first_cell) = cells.first() else {
                continue;
            };

            if !tech_label_seen && !items.tech.is_resolved() && patterns::is_tech_label(first_cell) {
                tech_label_seen = true;
                tracing::debug!("Row {} has 'technische anlagen': {:?}", r_idx, cells);
                match patterns::two_numeric_cells(cells) {
                    Some(pair) => {
                        tracing::debug!("Technische Anlagen pair on same row: {:?}", pair);
                        items.tech.resolve(pair, Resolution::SameRow);
                    }
                    None => tracing::debug!("No numeric pair on row {}, not searching this table further for Technische Anlagen", r_idx),
                }
            }

            if !items.sach.is_resolved() && patterns::is_sach_label(first_cell) {
                tracing::debug!("Row {} has 'sachanlagen': {:?}", r_idx, cells);
                if let Some(pair) = patterns::two_numeric_cells(cells) {
                    tracing::debug!("Sachanlagen pair on same row: {:?}", pair);
                    items.sach.resolve(pair, Resolution::SameRow);
                } else if let Some((offset, pair)) = find_sum_row(&table.rows[r_idx + 1..]) {
                    tracing::debug!("Sachanlagen pair on sum row {}: {:?}", r_idx + 1 + offset, pair);
                    items.sach.resolve(pair, Resolution::SumRow);
                } else {
                    tracing::trace!("No sum row below row {} for Sachanlagen", r_idx);
                }
            }
        }
    }

    fn apply_inline_fallback(&self, text: &str, items: &mut LineItems) {
        if items.all_resolved() {
            return;
        }
        tracing::debug!("Running inline fallback over {} bytes of text", text.len());

        if !items.sach.is_resolved() {
            if let Some(pair) = patterns::inline_sach_pair(text) {
                tracing::debug!("Inline fallback found Sachanlagen: {:?}", pair);
                items.sach.resolve(pair, Resolution::Inline);
            }
        }

        if !items.tech.is_resolved() {
            if let Some(pair) = patterns::inline_tech_pair(text) {
                tracing::debug!("Inline fallback found Technische Anlagen: {:?}", pair);
                items.tech.resolve(pair, Resolution::Inline);
            }
        }
    }
}

/// First row with a blank first cell and exactly two figures, as
/// (index into `rows`, pair).
fn find_sum_row(rows: &[Row]) -> Option<(usize, (String, String))> {
    rows.iter()
        .enumerate()
        .filter(|(_, cells)| cells.first().is_some_and(|c| patterns::is_blank_label(c)))
        .find_map(|(idx, cells)| patterns::two_numeric_cells(cells).map(|pair| (idx, pair)))
}

fn assemble(
    company_name: Option<&str>,
    dates: Option<(String, String)>,
    items: &LineItems,
) -> ExtractionResult {
    let mut result = ExtractionResult::default();

    if let Some(name) = company_name.map(str::trim).filter(|n| !n.is_empty()) {
        result.company_name = name.to_string();
    }
    if let Some((start, end)) = dates {
        result.start_date = start;
        result.end_date = end;
    }
    items.tech.write_into(&mut result.tech_start, &mut result.tech_end);
    items.sach.write_into(&mut result.sach_start, &mut result.sach_end);

    result
}
