use serde::{Deserialize, Serialize};

/// Axis-aligned box in page space: points, origin top-left, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// True when the boxes overlap or lie within `tolerance` of each other.
    pub fn touches(&self, other: &Rect, tolerance: f32) -> bool {
        self.x0 - tolerance <= other.x1
            && other.x0 - tolerance <= self.x1
            && self.y0 - tolerance <= other.y1
            && other.y0 - tolerance <= self.y1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub font: String,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    /// sRGB packed as 0xRRGGBB.
    pub color: u32,
    pub bbox: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub bbox: Rect,
    pub spans: Vec<TextSpan>,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub bbox: Rect,
    pub lines: Vec<TextLine>,
}

impl TextBlock {
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(TextLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Zero-based position in the document.
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<TextBlock>,
    /// Ruled table areas; text inside them is not outline material.
    pub tables: Vec<Rect>,
}

impl Page {
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.blocks.iter().flat_map(|b| b.lines.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub name: String,
    pub pages: Vec<Page>,
}

/// Rounded font size plus boldness; the unit of the heading hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Style {
    pub size: i32,
    pub bold: bool,
}

impl Style {
    pub fn new(size: i32, bold: bool) -> Self {
        Self { size, bold }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::new(10, false)
    }
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.size, if self.bold { "bold" } else { "regular" })
    }
}

/// A line of the document as seen by the outline heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub page: usize,
    pub text: String,
    pub style: Style,
    pub font: String,
    pub italic: bool,
    pub color: u32,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub column: u8,
    pub id: String,
}

impl LineRecord {
    pub fn size(&self) -> i32 {
        self.style.size
    }

    pub fn is_bold(&self) -> bool {
        self.style.bold
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Maps a zero-based style rank to a level; ranks past H3 have none.
    pub fn from_rank(rank: usize) -> Option<Self> {
        match rank {
            0 => Some(Self::H1),
            1 => Some(Self::H2),
            2 => Some(Self::H3),
            _ => None,
        }
    }
}

impl std::fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::H1 => "H1",
            Self::H2 => "H2",
            Self::H3 => "H3",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

/// A PDF picked up from the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// File name relative to the input directory.
    pub name: String,
    /// File name without extension; output files are named after it.
    pub stem: String,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let stem = std::path::Path::new(&name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        Self { name, stem }
    }

    pub fn json_name(&self) -> String {
        format!("{}.json", self.stem)
    }

    pub fn lines_csv_name(&self) -> String {
        format!("{}.lines.csv", self.stem)
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub outline: Outline,
    /// Lines that survived filtering; exported when line dumps are enabled.
    pub lines: Vec<LineRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_serializes_levels_as_labels() {
        let outline = Outline {
            title: "Annual Report".to_string(),
            outline: vec![OutlineEntry {
                level: HeadingLevel::H2,
                text: "Revenue".to_string(),
                page: 3,
            }],
        };
        let json = serde_json::to_value(&outline).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "title": "Annual Report",
                "outline": [{"level": "H2", "text": "Revenue", "page": 3}]
            })
        );
    }

    #[test]
    fn test_source_document_names() {
        let doc = SourceDocument::new("report.final.PDF");
        assert_eq!(doc.stem, "report.final");
        assert_eq!(doc.json_name(), "report.final.json");
        assert_eq!(doc.lines_csv_name(), "report.final.lines.csv");
    }

    #[test]
    fn test_rect_contains_and_touches() {
        let table = Rect::new(50.0, 100.0, 500.0, 300.0);
        assert!(table.contains(&Rect::new(60.0, 120.0, 200.0, 132.0)));
        assert!(!table.contains(&Rect::new(40.0, 120.0, 200.0, 132.0)));
        assert!(table.touches(&Rect::new(501.0, 100.0, 600.0, 110.0), 2.0));
        assert!(!table.touches(&Rect::new(510.0, 100.0, 600.0, 110.0), 2.0));
    }

    #[test]
    fn test_heading_level_ranks() {
        assert_eq!(HeadingLevel::from_rank(0), Some(HeadingLevel::H1));
        assert_eq!(HeadingLevel::from_rank(2), Some(HeadingLevel::H3));
        assert_eq!(HeadingLevel::from_rank(3), None);
    }
}
