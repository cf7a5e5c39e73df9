use crate::domain::model::LineRecord;
use std::collections::HashSet;

const FALLBACK_PAGE_HEIGHT: f32 = 1000.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Title {
    pub text: String,
    /// Ids of the lines that make up the title.
    pub line_ids: HashSet<String>,
}

/// Picks the document title from the top half of the first page.
///
/// Normally the title starts at the first line with the largest font and takes at
/// most one following line of similar size close below it. When every line shares
/// one size, the first (up to two) bold lines centred on the page are used.
pub fn identify_title(lines: &[LineRecord], first_page: Option<(f32, f32)>) -> Title {
    let (page_width, page_height) = first_page.unwrap_or((0.0, FALLBACK_PAGE_HEIGHT));

    let mut top_half: Vec<&LineRecord> = lines
        .iter()
        .filter(|l| l.page == 0 && l.y0 < page_height / 2.0)
        .collect();
    top_half.sort_by(|a, b| a.column.cmp(&b.column).then(a.y0.total_cmp(&b.y0)));

    let (Some(max_size), Some(min_size)) = (
        top_half.iter().map(|l| l.size()).max(),
        top_half.iter().map(|l| l.size()).min(),
    ) else {
        return Title::default();
    };

    let chosen: Vec<&LineRecord> = if max_size - min_size < 1 {
        let center_x = page_width / 2.0;
        top_half
            .iter()
            .copied()
            .filter(|l| l.is_bold() && (l.center_x() - center_x).abs() < page_width * 0.1)
            .take(2)
            .collect()
    } else {
        let Some(start) = top_half.iter().position(|l| l.size() == max_size) else {
            return Title::default();
        };
        let first_size = top_half[start].size() as f32;
        let mut chosen: Vec<&LineRecord> = Vec::new();
        for &line in &top_half[start..] {
            if chosen.len() >= 2 {
                break;
            }
            if let Some(last) = chosen.last() {
                if (line.y0 - last.y0).abs() > last.size() as f32 * 2.5 {
                    break;
                }
                if (line.size() as f32) < first_size * 0.7 {
                    break;
                }
            }
            chosen.push(line);
        }
        chosen
    };

    Title {
        text: chosen
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        line_ids: chosen.iter().map(|l| l.id.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Style;

    fn record(page: usize, text: &str, size: i32, bold: bool, x0: f32, y0: f32, x1: f32) -> LineRecord {
        LineRecord {
            page,
            text: text.to_string(),
            style: Style::new(size, bold),
            font: "Helvetica".to_string(),
            italic: false,
            color: 0,
            x0,
            y0,
            x1,
            y1: y0 + size as f32,
            column: 0,
            id: format!("{}-{}", page, y0),
        }
    }

    #[test]
    fn test_largest_line_starts_title_and_takes_next_line() {
        let lines = vec![
            record(0, "Company Annual", 24, true, 100.0, 80.0, 500.0),
            record(0, "Report 2024", 22, true, 100.0, 110.0, 500.0),
            record(0, "Prepared by Finance", 12, false, 100.0, 150.0, 500.0),
            record(0, "Body text", 10, false, 72.0, 500.0, 540.0),
        ];
        let title = identify_title(&lines, Some((612.0, 792.0)));

        assert_eq!(title.text, "Company Annual Report 2024");
        assert_eq!(title.line_ids.len(), 2);
        assert!(title.line_ids.contains("0-80"));
    }

    #[test]
    fn test_title_stops_at_small_or_distant_line() {
        let lines = vec![
            record(0, "Overview", 20, true, 100.0, 80.0, 300.0),
            record(0, "a small subtitle", 12, false, 100.0, 100.0, 300.0),
        ];
        assert_eq!(identify_title(&lines, Some((612.0, 792.0))).text, "Overview");

        let lines = vec![
            record(0, "Overview", 20, true, 100.0, 80.0, 300.0),
            record(0, "Far Away", 20, true, 100.0, 200.0, 300.0),
        ];
        assert_eq!(identify_title(&lines, Some((612.0, 792.0))).text, "Overview");
    }

    #[test]
    fn test_uniform_size_uses_centred_bold_lines() {
        let lines = vec![
            record(0, "left aligned", 12, true, 72.0, 60.0, 200.0),
            record(0, "Centred Title", 12, true, 256.0, 80.0, 356.0),
            record(0, "plain centred", 12, false, 256.0, 100.0, 356.0),
        ];
        let title = identify_title(&lines, Some((612.0, 792.0)));
        assert_eq!(title.text, "Centred Title");
        assert_eq!(title.line_ids, HashSet::from(["0-80".to_string()]));
    }

    #[test]
    fn test_no_first_page_lines() {
        let lines = vec![record(1, "Later page", 20, true, 100.0, 80.0, 300.0)];
        assert_eq!(identify_title(&lines, Some((612.0, 792.0))), Title::default());
    }
}
