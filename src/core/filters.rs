use crate::config::analysis::RunningTextConfig;
use crate::domain::model::{ParsedDocument, Rect};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4}\b").expect("valid year regex"));
static PAGE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Page \d+\s*of\s*\d+$").expect("valid page marker regex"));

/// Finds repeated header and footer texts.
///
/// Only the middle half of the document is scanned so title pages and reference
/// sections do not skew the counts. A block qualifies when it starts in the top
/// band or ends in the bottom band of its page.
pub fn detect_running_text(doc: &ParsedDocument, config: &RunningTextConfig) -> HashSet<String> {
    let page_count = doc.pages.len();
    if page_count < config.min_pages {
        return HashSet::new();
    }

    let start = page_count / 4;
    let end = page_count - start;
    let mut counts: HashMap<String, usize> = HashMap::new();

    for page in &doc.pages[start..end] {
        for block in &page.blocks {
            let in_band = block.bbox.y0 < page.height * config.top_band
                || block.bbox.y1 > page.height * config.bottom_band;
            if !in_band {
                continue;
            }
            let text = block.text().trim().replace('\n', " ");
            let len = text.chars().count();
            if len > 5 && len < 100 && !text.ends_with('.') {
                *counts.entry(text).or_insert(0) += 1;
            }
        }
    }

    let min_occurrences = (end - start) as f32 * config.line_threshold;
    let ignored: HashSet<String> = counts
        .into_iter()
        .filter(|(_, count)| *count as f32 >= min_occurrences)
        .map(|(text, _)| text)
        .collect();

    tracing::info!(
        "Detected {} repeating lines to ignore as headers/footers.",
        ignored.len()
    );
    ignored
}

pub fn in_table(bbox: &Rect, tables: &[Rect]) -> bool {
    tables.iter().any(|t| t.contains(bbox))
}

/// Short lines such as "March 21, 2024" or "Version 2 - Jan 2023".
pub fn is_date_line(text: &str) -> bool {
    let lower = text.to_lowercase();
    YEAR.is_match(&lower)
        && MONTHS.iter().any(|m| lower.contains(m))
        && text.split_whitespace().count() <= 4
}

pub fn is_page_marker(text: &str) -> bool {
    PAGE_MARKER.is_match(text)
}

pub fn is_mostly_uppercase(text: &str) -> bool {
    let (letters, upper) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(l, u), c| (l + 1, u + usize::from(c.is_uppercase())));
    letters > 0 && upper as f32 / letters as f32 > 0.8
}
