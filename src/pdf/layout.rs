//! Groups positioned glyph runs into spans, lines and blocks.

use crate::domain::model::{Rect, TextBlock, TextLine, TextSpan};
use crate::pdf::content::GlyphRun;

const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

/// Baseline drift (in ems) tolerated within one line.
const BASELINE_TOLERANCE: f32 = 0.3;
/// Largest horizontal gap (in ems) bridged within one line.
const MAX_WORD_GAP: f32 = 2.5;
/// Gaps wider than this (in ems) between runs get a space.
const SPACE_GAP: f32 = 0.15;
/// Largest vertical gap (in ems) between lines of one block.
const BLOCK_GAP: f32 = 0.8;

struct LineBuilder {
    baseline: f32,
    size: f32,
    x1: f32,
    spans: Vec<TextSpan>,
}

impl LineBuilder {
    fn start(run: &GlyphRun) -> Self {
        Self {
            baseline: run.baseline,
            size: run.size,
            x1: run.x1,
            spans: vec![span_from_run(run, run.text.clone())],
        }
    }

    fn accepts(&self, run: &GlyphRun) -> bool {
        let size = run.size.max(self.size);
        (run.baseline - self.baseline).abs() <= BASELINE_TOLERANCE * size
            && run.x0 >= self.x1 - size
            && run.x0 - self.x1 <= MAX_WORD_GAP * size
    }

    fn push(&mut self, run: &GlyphRun) {
        let gap = run.x0 - self.x1;
        let needs_space = gap > SPACE_GAP * run.size.max(self.size)
            && !run.text.starts_with(char::is_whitespace)
            && !self
                .spans
                .last()
                .is_some_and(|s| s.text.ends_with(char::is_whitespace));

        let mut text = run.text.clone();
        if needs_space {
            text.insert(0, ' ');
        }

        match self.spans.last_mut() {
            Some(last) if same_style(last, run) => {
                last.text.push_str(&text);
                last.bbox = last.bbox.union(&run_bbox(run));
            }
            _ => self.spans.push(span_from_run(run, text)),
        }

        self.x1 = self.x1.max(run.x1);
        self.size = self.size.max(run.size);
    }

    fn finish(self) -> Option<TextLine> {
        let text: String = self.spans.iter().map(|s| s.text.as_str()).collect();
        if text.trim().is_empty() {
            return None;
        }
        let bbox = self
            .spans
            .iter()
            .skip(1)
            .fold(self.spans[0].bbox, |acc, s| acc.union(&s.bbox));
        Some(TextLine {
            bbox,
            spans: self.spans,
        })
    }
}

fn same_style(span: &TextSpan, run: &GlyphRun) -> bool {
    span.font == run.font
        && (span.size - run.size).abs() < 0.01
        && span.color == run.color
        && span.bold == run.bold
        && span.italic == run.italic
}

fn run_bbox(run: &GlyphRun) -> Rect {
    Rect::new(
        run.x0,
        run.baseline - ASCENT * run.size,
        run.x1,
        run.baseline + DESCENT * run.size,
    )
}

fn span_from_run(run: &GlyphRun, text: String) -> TextSpan {
    TextSpan {
        text,
        font: run.font.clone(),
        size: run.size,
        bold: run.bold,
        italic: run.italic,
        color: run.color,
        bbox: run_bbox(run),
    }
}

/// Runs must be in content-stream order; that order is kept for lines and blocks.
pub fn build_lines(runs: &[GlyphRun]) -> Vec<TextLine> {
    let mut lines = Vec::new();
    let mut current: Option<LineBuilder> = None;

    for run in runs {
        match current.as_mut() {
            Some(line) if line.accepts(run) => line.push(run),
            _ => {
                if let Some(line) = current.take().and_then(LineBuilder::finish) {
                    lines.push(line);
                }
                current = Some(LineBuilder::start(run));
            }
        }
    }
    if let Some(line) = current.and_then(LineBuilder::finish) {
        lines.push(line);
    }

    lines
}

pub fn build_blocks(lines: Vec<TextLine>) -> Vec<TextBlock> {
    let mut blocks: Vec<TextBlock> = Vec::new();

    for line in lines {
        let joins = blocks.last().is_some_and(|block| {
            let Some(prev) = block.lines.last() else {
                return false;
            };
            let size = line.bbox.height();
            let gap = line.bbox.y0 - prev.bbox.y1;
            let overlaps = line.bbox.x0 <= block.bbox.x1 && block.bbox.x0 <= line.bbox.x1;
            gap > -0.5 * size && gap < BLOCK_GAP * size && overlaps
        });

        match blocks.last_mut() {
            Some(block) if joins => {
                block.bbox = block.bbox.union(&line.bbox);
                block.lines.push(line);
            }
            _ => blocks.push(TextBlock {
                bbox: line.bbox,
                lines: vec![line],
            }),
        }
    }

    blocks
}
