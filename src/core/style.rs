use crate::domain::model::{Style, TextLine, TextSpan};

/// Counts in first-seen order so ties resolve to the earliest style.
#[derive(Debug, Clone, Default)]
pub struct StyleCounter {
    entries: Vec<(Style, usize)>,
}

impl StyleCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, style: Style, weight: usize) {
        match self.entries.iter_mut().find(|(s, _)| *s == style) {
            Some((_, count)) => *count += weight,
            None => self.entries.push((style, weight)),
        }
    }

    pub fn count(&self, style: &Style) -> usize {
        self.entries
            .iter()
            .find(|(s, _)| s == style)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn most_common(&self) -> Option<Style> {
        self.most_common_where(|_| true)
    }

    pub fn most_common_where(&self, keep: impl Fn(&Style) -> bool) -> Option<Style> {
        let mut best: Option<(Style, usize)> = None;
        for &(style, count) in self.entries.iter().filter(|(s, _)| keep(s)) {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((style, count));
            }
        }
        best.map(|(s, _)| s)
    }
}

pub fn span_style(span: &TextSpan) -> Style {
    Style::new(span.size.round_ties_even() as i32, span.bold)
}

/// Style covering most of the line's visible characters.
pub fn dominant_style(line: &TextLine) -> Style {
    dominant_span(line).map(span_style).unwrap_or_default()
}

/// First span carrying the dominant style; source of font, italic and colour features.
pub fn dominant_span(line: &TextLine) -> Option<&TextSpan> {
    let mut counter = StyleCounter::new();
    for span in &line.spans {
        counter.add(span_style(span), span.text.trim().chars().count());
    }
    let style = counter.most_common()?;
    line.spans.iter().find(|s| span_style(s) == style)
}
