use crate::core::filters::is_mostly_uppercase;
use crate::core::style::StyleCounter;
use crate::domain::model::{HeadingLevel, LineRecord, OutlineEntry, Style};
use regex::Regex;
use std::sync::LazyLock;

static NO_LETTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\W_]+$").expect("valid symbol regex"));

/// Most frequent regular-weight style, falling back to the most frequent style overall.
pub fn body_style(counter: &StyleCounter) -> Style {
    counter
        .most_common_where(|s| !s.bold)
        .or_else(|| counter.most_common())
        .unwrap_or_default()
}

/// A cover page without running prose is not searched for headings.
pub fn page_zero_has_paragraphs(lines: &[LineRecord], body: Style) -> bool {
    lines.iter().any(|l| {
        l.page == 0
            && l.style == body
            && l.word_count() >= 30
            && !is_mostly_uppercase(&l.text)
            && l.char_count() > 30
    })
}

pub fn is_heading_candidate(line: &LineRecord, body: Style) -> bool {
    let distinct = line.size() > body.size || (line.is_bold() && !body.bold);
    if !distinct {
        return false;
    }
    let chars = line.char_count();
    if chars <= 3 || chars >= 250 {
        return false;
    }
    let words = line.word_count();
    if words > 25 || NO_LETTERS.is_match(&line.text) {
        return false;
    }
    !(line.text.ends_with(&['.', ',', ';'][..]) && words > 15)
}

/// Ranks candidate styles largest first (bold before regular at equal size).
pub fn level_styles(candidates: &[&LineRecord], max_levels: usize) -> Vec<(Style, HeadingLevel)> {
    let mut styles: Vec<Style> = candidates.iter().map(|c| c.style).collect();
    styles.sort_by(|a, b| b.size.cmp(&a.size).then(b.bold.cmp(&a.bold)));
    styles.dedup();
    styles
        .into_iter()
        .take(max_levels)
        .enumerate()
        .filter_map(|(rank, style)| HeadingLevel::from_rank(rank).map(|level| (style, level)))
        .collect()
}

/// Joins vertically adjacent same-style heading lines into single entries.
///
/// Headings are ordered by page, column and position first, so a heading that
/// wraps onto several lines comes out as one entry.
pub fn merge_headings(mut headings: Vec<(&LineRecord, HeadingLevel)>) -> Vec<OutlineEntry> {
    headings.sort_by(|(a, _), (b, _)| {
        a.page
            .cmp(&b.page)
            .then(a.column.cmp(&b.column))
            .then(a.y0.total_cmp(&b.y0))
    });

    let mut outline = Vec::new();
    let mut i = 0;
    while i < headings.len() {
        let (current, level) = headings[i];
        let mut text = current.text.clone();
        let mut j = i + 1;
        while j < headings.len() {
            let (next, _) = headings[j];
            let (prev, _) = headings[j - 1];
            let adjacent = next.page == current.page
                && next.column == current.column
                && next.style == current.style
                && (next.y0 - prev.y1).abs() < current.size() as f32 * 0.5;
            if !adjacent {
                break;
            }
            text.push(' ');
            text.push_str(&next.text);
            j += 1;
        }
        outline.push(OutlineEntry {
            level,
            text: text.trim().to_string(),
            page: current.page,
        });
        i = j;
    }

    outline
}

pub fn detect_headings(lines: &[LineRecord], counter: &StyleCounter, max_levels: usize) -> Vec<OutlineEntry> {
    let body = body_style(counter);
    tracing::info!("Deduced body text style: {} (size, is_bold)", body);

    let use_page_zero = page_zero_has_paragraphs(lines, body);
    if !use_page_zero {
        tracing::info!("Page 0 has no paragraph text. It will be ignored for headings.");
    }

    let candidates: Vec<&LineRecord> = lines
        .iter()
        .filter(|l| use_page_zero || l.page != 0)
        .filter(|l| is_heading_candidate(l, body))
        .collect();
    if candidates.is_empty() {
        return Vec::new();
    }

    let levels = level_styles(&candidates, max_levels);
    tracing::info!("Detected heading style hierarchy:");
    for (style, level) in &levels {
        tracing::info!("  - {}: {}", level, style);
    }

    let headings: Vec<(&LineRecord, HeadingLevel)> = candidates
        .into_iter()
        .filter_map(|c| {
            levels
                .iter()
                .find(|(style, _)| *style == c.style)
                .map(|(_, level)| (c, *level))
        })
        .collect();

    merge_headings(headings)
}
