// src/report/models.rs
use serde::{Deserialize, Serialize};

pub const UNKNOWN_COMPANY: &str = "Unknown";
pub const MISSING_DATE: &str = "-";
pub const MISSING_VALUE: &str = "NA";

/// The balance-sheet figures pulled out of one Jahresabschluss.
///
/// Every field is a raw string exactly as found in the document. Values that
/// could not be located keep their sentinel (`"Unknown"`, `"-"` or `"NA"`),
/// so a record is always complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Start Date")]
    pub start_date: String,
    #[serde(rename = "End Date")]
    pub end_date: String,
    #[serde(rename = "Technische Anlagen Start")]
    pub tech_start: String,
    #[serde(rename = "Technische Anlagen End")]
    pub tech_end: String,
    #[serde(rename = "Sachanlagen Start")]
    pub sach_start: String,
    #[serde(rename = "Sachanlagen End")]
    pub sach_end: String,
}

impl Default for ExtractionResult {
    fn default() -> Self {
        Self {
            company_name: UNKNOWN_COMPANY.to_string(),
            start_date: MISSING_DATE.to_string(),
            end_date: MISSING_DATE.to_string(),
            tech_start: MISSING_VALUE.to_string(),
            tech_end: MISSING_VALUE.to_string(),
            sach_start: MISSING_VALUE.to_string(),
            sach_end: MISSING_VALUE.to_string(),
        }
    }
}

impl ExtractionResult {
    /// True when nothing was found: dates and all four figures are sentinels.
    /// The company name is ignored since it is supplied by the caller.
    pub fn is_empty(&self) -> bool {
        self.start_date == MISSING_DATE
            && self.end_date == MISSING_DATE
            && [&self.tech_start, &self.tech_end, &self.sach_start, &self.sach_end]
                .iter()
                .all(|v| v.as_str() == MISSING_VALUE)
    }
}

/// Metadata stored next to each archived report (`<report>_metadata.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub name: String,
    pub date: String,
    pub company_name: String,
}
