use crate::domain::model::{Page, Rect};

/// Returns 2 when text blocks sit on both halves of the page in meaningful
/// proportion, otherwise 1. Blocks straddling the midpoint do not vote.
pub fn page_columns(page: &Page, threshold: f32) -> u8 {
    let midpoint = page.width / 2.0;
    let (mut left, mut right) = (0usize, 0usize);
    for block in &page.blocks {
        if block.bbox.x1 < midpoint {
            left += 1;
        } else if block.bbox.x0 > midpoint {
            right += 1;
        }
    }

    let sided = left + right;
    if left > 0 && right > 0 {
        let (l, r) = (left as f32 / sided as f32, right as f32 / sided as f32);
        if l > threshold && r > threshold {
            return 2;
        }
    }
    1
}

pub fn column_of(bbox: &Rect, page_width: f32, columns: u8) -> u8 {
    if columns == 2 && bbox.center_x() > page_width / 2.0 {
        1
    } else {
        0
    }
}
