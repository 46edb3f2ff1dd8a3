// src/extractors/patterns.rs
//! Shape and label predicates used by the balance-sheet scanner.

use once_cell::sync::Lazy;
use regex::Regex;

/// Digits and dot thousands separators ending in a digit, optionally
/// followed by a decimal-comma fraction: `61.511.716`, `89.634.071,56`.
const NUMBER_BODY: &str = r"[\d.]*\d(?:,\d+)?";

/// Day.month.year as written in German statements.
pub const DATE_PATTERN: &str = r"\d{2}\.\d{2}\.\d{4}";

/// Label text for technical equipment and machinery, matched as a substring.
pub const TECH_LABEL: &str = "technische anlagen";

// --- Regex Patterns (Lazy Static) ---
static NUMERIC_CELL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^{NUMBER_BODY}$")).expect("Failed to compile NUMERIC_CELL_RE")
});

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(DATE_PATTERN).expect("Failed to compile DATE_RE")
});

// Optional item number ("II." / "II" / "2.") in front of the label.
static SACH_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:ii\.?|2\.)?\s*sachanlagen").expect("Failed to compile SACH_LABEL_RE")
});

// DOTALL so the label and its figures may sit in different text fragments.
static INLINE_SACH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)\b(?:ii\.?|2\.)?\s*sachanlagen.*?\s+({NUMBER_BODY})\s+({NUMBER_BODY})\b"
    ))
    .expect("Failed to compile INLINE_SACH_RE")
});

static INLINE_TECH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)\btechnische anlagen.*?\s+({NUMBER_BODY})\s+({NUMBER_BODY})\b"
    ))
    .expect("Failed to compile INLINE_TECH_RE")
});

/// True if the (trimmed) cell text looks like a monetary figure.
pub fn is_numeric_shaped(cell: &str) -> bool {
    NUMERIC_CELL_RE.is_match(cell.trim())
}

/// Returns the row's numeric cells as a pair if there are exactly two of them.
/// The label cell is included in the scan.
pub fn two_numeric_cells(cells: &[String]) -> Option<(String, String)> {
    let mut numeric = cells
        .iter()
        .map(|c| c.trim())
        .filter(|c| is_numeric_shaped(c));

    match (numeric.next(), numeric.next(), numeric.next()) {
        (Some(first), Some(second), None) => Some((first.to_string(), second.to_string())),
        _ => None,
    }
}

/// All date-shaped tokens in document order, duplicates kept.
pub fn find_dates(text: &str) -> Vec<&str> {
    DATE_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// The first two date tokens, taken as (period start, period end) purely by position.
pub fn period_dates(text: &str) -> Option<(String, String)> {
    match find_dates(text).as_slice() {
        [start, end, ..] => Some((start.to_string(), end.to_string())),
        _ => None,
    }
}

pub fn is_tech_label(first_cell: &str) -> bool {
    first_cell.to_lowercase().contains(TECH_LABEL)
}

pub fn is_sach_label(first_cell: &str) -> bool {
    SACH_LABEL_RE.is_match(&first_cell.to_lowercase())
}

/// A sum row carries no label in its first cell.
pub fn is_blank_label(first_cell: &str) -> bool {
    first_cell.trim().is_empty()
}

/// Free-text fallback for Sachanlagen: the first two figures after the label.
pub fn inline_sach_pair(text: &str) -> Option<(String, String)> {
    capture_pair(&INLINE_SACH_RE, text)
}

/// Free-text fallback for Technische Anlagen: the first two figures after the label.
pub fn inline_tech_pair(text: &str) -> Option<(String, String)> {
    capture_pair(&INLINE_TECH_RE, text)
}

fn capture_pair(re: &Regex, text: &str) -> Option<(String, String)> {
    let caps = re.captures(text)?;
    Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string()))
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_numeric_shape() {
        for ok in ["61.511.716", "89.634.071,56", "2018", "0", "1,5", " 1.000 "] {
            assert!(is_numeric_shaped(ok), "{ok:?} should be numeric-shaped");
        }
        for bad in ["", "abc", "1.000.", "12,345,678", "-1.000", "1.000 EUR", "1.000,-", "T€"] {
            assert!(!is_numeric_shaped(bad), "{bad:?} should not be numeric-shaped");
        }
    }

    #[test]
    fn test_two_numeric_cells_requires_exactly_two() {
        assert_eq!(
            two_numeric_cells(&row(&["Sachanlagen", "86.978.383,16", "89.634.071,56"])),
            Some(("86.978.383,16".to_string(), "89.634.071,56".to_string()))
        );
        assert_eq!(two_numeric_cells(&row(&["Sachanlagen", "1.000"])), None);
        assert_eq!(two_numeric_cells(&row(&["Sachanlagen", "1", "2", "3"])), None);
        assert_eq!(two_numeric_cells(&row(&[])), None);
    }

    #[test]
    fn test_two_numeric_cells_skips_non_numeric_cells() {
        assert_eq!(
            two_numeric_cells(&row(&["", "EUR", "1.000", "", "Vorjahr", "2.000"])),
            Some(("1.000".to_string(), "2.000".to_string()))
        );
    }

    #[test]
    fn test_find_dates_keeps_order_and_duplicates() {
        let text = "vom 01.01.2018\nbis 31.12.2018, erstellt 01.01.2018 am 1.1.2019";
        assert_eq!(find_dates(text), vec!["01.01.2018", "31.12.2018", "01.01.2018"]);
    }

    #[test]
    fn test_period_dates_is_positional() {
        assert_eq!(
            period_dates("31.12.2018 und 01.01.2018"),
            Some(("31.12.2018".to_string(), "01.01.2018".to_string()))
        );
        assert_eq!(period_dates("nur 31.12.2018"), None);
        assert_eq!(period_dates(""), None);
    }

    #[test]
    fn test_tech_label_is_case_insensitive_substring() {
        assert!(is_tech_label("Technische Anlagen und Maschinen"));
        assert!(is_tech_label("2. TECHNISCHE ANLAGEN"));
        assert!(!is_tech_label("Technische Ausstattung"));
    }

    #[test]
    fn test_sach_label_allows_item_number_prefix() {
        for ok in ["Sachanlagen", "II. Sachanlagen", "ii sachanlagen", "2. Sachanlagen", "II.Sachanlagen"] {
            assert!(is_sach_label(ok), "{ok:?} should match the Sachanlagen label");
        }
        for bad in ["III. Sachanlagen", "Summe Sachanlagen", "1. Sachanlagen", "Immaterielle Vermögensgegenstände"] {
            assert!(!is_sach_label(bad), "{bad:?} should not match the Sachanlagen label");
        }
    }

    #[test]
    fn test_blank_label() {
        assert!(is_blank_label(""));
        assert!(is_blank_label("  \u{a0}"));
        assert!(!is_blank_label("Summe"));
    }

    #[test]
    fn test_inline_pairs_cross_line_breaks() {
        let text = "II. Sachanlagen\nDie Sachanlagen betragen zum Stichtag 300.000 400.000 Euro.\n\
                    Die Technische Anlagen wurden mit\n150.000 180.000 bewertet.";
        assert_eq!(inline_sach_pair(text), Some(("300.000".to_string(), "400.000".to_string())));
        assert_eq!(inline_tech_pair(text), Some(("150.000".to_string(), "180.000".to_string())));
    }

    #[test]
    fn test_inline_pair_skips_non_numeric_tokens() {
        let text = "technische anlagen ... 123.456 234.567";
        assert_eq!(inline_tech_pair(text), Some(("123.456".to_string(), "234.567".to_string())));
        assert_eq!(inline_sach_pair(text), None);
    }

    #[test]
    fn test_inline_pair_needs_two_adjacent_figures() {
        assert_eq!(inline_tech_pair("Technische Anlagen 1.000 EUR"), None);
    }
}
