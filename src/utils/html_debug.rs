// src/utils/html_debug.rs
use std::fs;
use std::path::Path;
use regex::Regex;
use crate::utils::error::AppError;

/// Wraps the given byte ranges of `html` in highlight spans.
/// Ranges overlapping an earlier one are dropped.
pub fn annotate_html(html: &str, highlights: &[(usize, usize, &str)]) -> String {
    // Add debug styling in head
    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<style>\n");

    // CSS for highlight colors
    debug_html.push_str(".highlight-date { background-color: #FFFF00; }\n");
    debug_html.push_str(".highlight-tech { background-color: #90EE90; }\n");
    debug_html.push_str(".highlight-sach { background-color: #ADD8E6; }\n");
    debug_html.push_str(".highlight-custom { background-color: #FFC0CB; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n");

    let mut last_pos = 0;
    let mut sorted_highlights = highlights.to_vec();
    sorted_highlights.sort_by_key(|h| (h.0, h.1));

    for (start, end, highlight_type) in sorted_highlights {
        if start < last_pos || end > html.len() {
            continue;
        }
        debug_html.push_str(&html[last_pos..start]);

        let css_class = match highlight_type {
            "date" => "highlight-date",
            "tech" => "highlight-tech",
            "sach" => "highlight-sach",
            _ => "highlight-custom",
        };

        debug_html.push_str(&format!("<span class=\"{}\" title=\"Position: {}-{}, Type: {}\">",
            css_class, start, end, highlight_type));
        debug_html.push_str(&html[start..end]);
        debug_html.push_str("</span>");

        last_pos = end;
    }

    debug_html.push_str(&html[last_pos..]);
    debug_html.push_str("\n</body>\n</html>");
    debug_html
}

/// Writes a copy of `html` with every match of the given patterns highlighted.
pub fn create_debug_html(html: &str, path: &Path, patterns: &[(&str, &str)]) -> Result<(), AppError> {
    let mut highlights = Vec::new();

    for (pattern, highlight_type) in patterns {
        let re = Regex::new(pattern).map_err(|e| {
            AppError::Config(format!("Invalid regex pattern '{}': {}", pattern, e))
        })?;

        for mat in re.find_iter(html) {
            highlights.push((mat.start(), mat.end(), *highlight_type));
        }
    }
    tracing::debug!("Highlighting {} match(es) in {}", highlights.len(), path.display());

    fs::write(path, annotate_html(html, &highlights))?;
    tracing::info!("Saved debug HTML to {}", path.display());
    Ok(())
}
