//! Ruled-table detection from vector ruling lines.

use crate::config::analysis::TableConfig;
use crate::domain::model::Rect;

/// Clusters covering more than this share of the page are page frames, not tables.
const FRAME_AREA_SHARE: f32 = 0.9;

/// Positions closer than this (points) count as the same rule.
const POSITION_TOLERANCE: f32 = 1.5;

fn distinct_positions(mut values: Vec<f32>) -> usize {
    values.sort_by(|a, b| a.total_cmp(b));
    let mut count = 0;
    let mut last: Option<f32> = None;
    for v in values {
        if last.map_or(true, |l| v - l > POSITION_TOLERANCE) {
            count += 1;
            last = Some(v);
        }
    }
    count
}

fn find(parent: &mut [usize], i: usize) -> usize {
    let mut root = i;
    while parent[root] != root {
        root = parent[root];
    }
    let mut node = i;
    while parent[node] != root {
        let next = parent[node];
        parent[node] = root;
        node = next;
    }
    root
}

/// Returns the bounding boxes of ruled tables on a page of the given size.
///
/// Segments that touch (within `snap_tolerance`) are clustered. A cluster is a
/// table when it has at least two horizontal and two vertical rule positions and
/// at least three of one kind, so a lone box around a heading is not a table.
pub fn detect_tables(segments: &[Rect], page_width: f32, page_height: f32, config: &TableConfig) -> Vec<Rect> {
    if !config.enabled || segments.is_empty() {
        return Vec::new();
    }

    let mut parent: Vec<usize> = (0..segments.len()).collect();
    for i in 0..segments.len() {
        for j in (i + 1)..segments.len() {
            if segments[i].touches(&segments[j], config.snap_tolerance) {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                if a != b {
                    parent[b] = a;
                }
            }
        }
    }

    let mut clusters: Vec<(usize, Vec<usize>)> = Vec::new();
    for i in 0..segments.len() {
        let root = find(&mut parent, i);
        match clusters.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(i),
            None => clusters.push((root, vec![i])),
        }
    }

    let page_area = page_width * page_height;
    let mut tables = Vec::new();
    for (_, members) in clusters {
        let mut horizontal = Vec::new();
        let mut vertical = Vec::new();
        for &i in &members {
            let s = &segments[i];
            if s.width() >= s.height() {
                horizontal.push((s.y0 + s.y1) / 2.0);
            } else {
                vertical.push((s.x0 + s.x1) / 2.0);
            }
        }
        let rows = distinct_positions(horizontal);
        let cols = distinct_positions(vertical);
        if rows < 2 || cols < 2 || rows.max(cols) < 3 {
            continue;
        }

        let bbox = members
            .iter()
            .skip(1)
            .fold(segments[members[0]], |acc, &i| acc.union(&segments[i]));
        if page_area > 0.0 && bbox.width() * bbox.height() > FRAME_AREA_SHARE * page_area {
            continue;
        }
        tables.push(bbox);
    }

    tables
}
