//! Builds small PDFs on disk for end-to-end runs.

#[path = "../../src/pdf/testing.rs"]
mod builder;

pub use builder::{build_pdf, text};
use lopdf::content::Operation;

pub const BODY: &str = "The quick survey of documents shows how layout signals guide readers";

/// `count` lines of 10pt body text going down from `top`, 14pt apart.
pub fn body(top: i64, count: i64) -> Vec<Operation> {
    (0..count)
        .flat_map(|i| text("F1", 10, 72, top - i * 14, BODY))
        .collect()
}

/// A stroked straight rule.
pub fn rule(x0: i64, y0: i64, x1: i64, y1: i64) -> Vec<Operation> {
    vec![
        Operation::new("m", vec![x0.into(), y0.into()]),
        Operation::new("l", vec![x1.into(), y1.into()]),
        Operation::new("S", vec![]),
    ]
}

/// Six pages with a running header, page footers, a ruled table and a wrapped heading.
pub fn report_pdf() -> Vec<u8> {
    let header = |page: usize| {
        [
            text("F1", 9, 72, 770, "ACME Corp Annual Report"),
            text("F1", 9, 280, 30, &format!("Page {} of 6", page + 1)),
        ]
        .concat()
    };

    let mut table = Vec::new();
    for y in [300, 330, 360] {
        table.extend(rule(72, y, 400, y));
    }
    for x in [72, 236, 400] {
        table.extend(rule(x, 300, x, 360));
    }

    let pages = vec![
        [
            text("F2", 26, 100, 650, "Understanding Outline Extraction"),
            text("F1", 12, 100, 620, "A practical guide"),
        ]
        .concat(),
        [
            text("F2", 18, 72, 700, "1. Introduction"),
            body(670, 5),
            text("F2", 14, 72, 560, "1.1 Background"),
            body(530, 5),
        ]
        .concat(),
        [
            text("F2", 18, 72, 700, "2. Methods"),
            body(670, 4),
            table,
            text("F2", 14, 80, 340, "Quarterly Metrics"),
            text("F1", 10, 244, 340, "42"),
            text("F2", 14, 72, 250, "2.1 Sampling"),
            body(220, 3),
        ]
        .concat(),
        [
            text("F2", 12, 72, 720, "2.1.1 Fine Print Details"),
            body(700, 3),
            text("F2", 18, 72, 600, "A Heading That Wraps"),
            text("F2", 18, 72, 580, "Onto A Second Line"),
            body(550, 4),
        ]
        .concat(),
        [text("F2", 18, 72, 700, "3. Results"), body(670, 6)].concat(),
        [text("F2", 18, 72, 700, "4. Conclusion"), body(670, 6)].concat(),
    ];

    build_pdf(
        pages
            .into_iter()
            .enumerate()
            .map(|(i, ops)| [header(i), ops].concat())
            .collect(),
    )
}
