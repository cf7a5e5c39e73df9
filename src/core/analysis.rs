use crate::config::analysis::AnalysisConfig;
use crate::core::columns::{column_of, page_columns};
use crate::core::filters::{detect_running_text, in_table, is_date_line, is_page_marker};
use crate::core::headings::detect_headings;
use crate::core::style::{dominant_span, dominant_style, StyleCounter};
use crate::core::title::identify_title;
use crate::domain::model::{LineRecord, Outline, ParsedDocument, TransformResult};

/// Flattens the document into filtered line records and counts their styles.
pub fn collect_lines(doc: &ParsedDocument, config: &AnalysisConfig) -> (Vec<LineRecord>, StyleCounter) {
    let running_text = detect_running_text(doc, &config.running_text);

    let pages_with_tables = table_pages(doc);
    if !pages_with_tables.is_empty() {
        tracing::info!("Found tables on pages: {:?}", pages_with_tables);
    }

    let mut lines = Vec::new();
    let mut counter = StyleCounter::new();

    for page in &doc.pages {
        let columns = page_columns(page, config.column_threshold);
        for line in page.lines() {
            let text = line.text().trim().to_string();
            if text.is_empty() || in_table(&line.bbox, &page.tables) {
                continue;
            }
            if running_text.contains(&text) || is_date_line(&text) || is_page_marker(&text) {
                continue;
            }

            let style = dominant_style(line);
            counter.add(style, 1);

            let span = dominant_span(line);
            lines.push(LineRecord {
                page: page.index,
                style,
                font: span.map(|s| s.font.clone()).unwrap_or_default(),
                italic: span.is_some_and(|s| s.italic),
                color: span.map_or(0, |s| s.color),
                x0: line.bbox.x0,
                y0: line.bbox.y0,
                x1: line.bbox.x1,
                y1: line.bbox.y1,
                column: column_of(&line.bbox, page.width, columns),
                id: format!("{}-{}", page.index, line.bbox.y0),
                text,
            });
        }
    }

    (lines, counter)
}

/// Runs the outline heuristics over a parsed document. Pages in the result are 0-based.
pub fn analyze(doc: &ParsedDocument, config: &AnalysisConfig) -> TransformResult {
    let (lines, counter) = collect_lines(doc, config);
    if lines.is_empty() {
        tracing::warn!("No text lines found in {}", doc.name);
        return TransformResult {
            outline: Outline::default(),
            lines,
        };
    }

    let first_page = doc.pages.first().map(|p| (p.width, p.height));
    let title = identify_title(&lines, first_page);
    tracing::info!("Identified Title: '{}'", title.text);

    let remaining: Vec<LineRecord> = lines
        .iter()
        .filter(|l| !title.line_ids.contains(&l.id))
        .cloned()
        .collect();
    let outline = detect_headings(&remaining, &counter, config.effective_levels());
    tracing::info!("{}: {} outline entries", doc.name, outline.len());

    TransformResult {
        outline: Outline {
            title: title.text,
            outline,
        },
        lines,
    }
}

/// Page indices that carried at least one detected table.
pub fn table_pages(doc: &ParsedDocument) -> Vec<usize> {
    doc.pages
        .iter()
        .filter(|p| !p.tables.is_empty())
        .map(|p| p.index)
        .collect()
}
