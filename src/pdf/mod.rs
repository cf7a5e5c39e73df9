//! PDF to positioned-text layout, built on lopdf.

pub mod cmap;
pub mod content;
pub mod encoding;
pub mod fonts;
pub mod layout;
pub mod tables;
#[cfg(test)]
pub(crate) mod testing;

use crate::config::analysis::TableConfig;
use crate::domain::model::{Page, ParsedDocument};
use crate::pdf::content::{ContentInterpreter, FontCache, PageGeometry};
use crate::utils::error::{OutlineError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

const DEFAULT_PAGE_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Limits `Parent` walks on malformed page trees.
const MAX_INHERITANCE_DEPTH: usize = 32;

pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

pub(crate) fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

pub(crate) fn stream_data(stream: &Stream) -> Vec<u8> {
    if stream.dict.has(b"Filter") {
        stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone())
    } else {
        stream.content.clone()
    }
}

/// Looks up `key` on the page or the nearest ancestor that defines it.
fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(resolve(doc, value));
        }
        node = resolve(doc, node.get(b"Parent").ok()?).as_dict().ok()?;
    }
    None
}

fn page_geometry(doc: &Document, page: &Dictionary) -> PageGeometry {
    let values = inherited(doc, page, b"CropBox")
        .or_else(|| inherited(doc, page, b"MediaBox"))
        .and_then(|o| o.as_array().ok())
        .map(|a| a.iter().filter_map(|v| as_number(resolve(doc, v))).collect::<Vec<_>>())
        .filter(|v| v.len() == 4)
        .unwrap_or_else(|| DEFAULT_PAGE_BOX.to_vec());
    PageGeometry::from_box(values[0], values[1], values[2], values[3])
}

fn page_content(doc: &Document, page: &Dictionary) -> Vec<u8> {
    let Some(contents) = page.get(b"Contents").ok().map(|o| resolve(doc, o)) else {
        return Vec::new();
    };
    match contents {
        Object::Stream(stream) => stream_data(stream),
        Object::Array(parts) => {
            let mut data = Vec::new();
            for part in parts {
                if let Ok(stream) = resolve(doc, part).as_stream() {
                    data.extend(stream_data(stream));
                    data.push(b'\n');
                }
            }
            data
        }
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct PdfLoader {
    tables: TableConfig,
}

impl PdfLoader {
    pub fn new(tables: TableConfig) -> Self {
        Self { tables }
    }

    pub fn load_bytes(&self, name: &str, bytes: &[u8]) -> Result<ParsedDocument> {
        let doc = Document::load_mem(bytes)?;
        if doc.is_encrypted() {
            return Err(OutlineError::processing(format!("{} is encrypted", name)));
        }
        Ok(self.load_document(name.to_string(), &doc))
    }

    fn load_document(&self, name: String, doc: &Document) -> ParsedDocument {
        let mut fonts = FontCache::new();
        let pages = doc
            .get_pages()
            .into_values()
            .enumerate()
            .map(|(index, page_id)| self.load_page(doc, index, page_id, &mut fonts))
            .collect();

        ParsedDocument { name, pages }
    }

    fn load_page(&self, doc: &Document, index: usize, page_id: ObjectId, fonts: &mut FontCache) -> Page {
        let empty = |geometry: PageGeometry| Page {
            index,
            width: geometry.width,
            height: geometry.height,
            blocks: Vec::new(),
            tables: Vec::new(),
        };

        let Ok(page_dict) = doc.get_dictionary(page_id) else {
            tracing::warn!("Page {} has no page dictionary", index);
            return empty(PageGeometry::from_box(0.0, 0.0, 612.0, 792.0));
        };
        let geometry = page_geometry(doc, page_dict);
        let resources = inherited(doc, page_dict, b"Resources").and_then(|o| o.as_dict().ok());
        let data = page_content(doc, page_dict);

        let content = match ContentInterpreter::new(doc, geometry, fonts).interpret(&data, resources) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Page {}: content stream could not be decoded: {}", index, e);
                return empty(geometry);
            }
        };

        let lines = layout::build_lines(&content.runs);
        let tables = tables::detect_tables(&content.segments, geometry.width, geometry.height, &self.tables);
        tracing::debug!(
            "Page {}: {} runs, {} lines, {} tables",
            index,
            content.runs.len(),
            lines.len(),
            tables.len()
        );

        Page {
            index,
            width: geometry.width,
            height: geometry.height,
            blocks: layout::build_blocks(lines),
            tables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{build_pdf, text};
    use super::*;

    #[test]
    fn test_load_bytes_builds_pages_and_lines() {
        let bytes = build_pdf(vec![
            [text("F2", 20, 100, 700, "Annual Report"), text("F1", 10, 72, 600, "Body copy here")].concat(),
            text("F1", 10, 72, 600, "Second page"),
        ]);
        let doc = PdfLoader::default().load_bytes("report.pdf", &bytes).unwrap();

        assert_eq!(doc.name, "report.pdf");
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].width, 612.0);
        assert_eq!(doc.pages[1].index, 1);

        let lines: Vec<String> = doc.pages[0].lines().map(|l| l.text()).collect();
        assert_eq!(lines, vec!["Annual Report".to_string(), "Body copy here".to_string()]);
        let title = doc.pages[0].lines().next().unwrap();
        assert!(title.spans[0].bold);
        assert_eq!(title.spans[0].font, "Helvetica-Bold");
    }

    #[test]
    fn test_garbage_bytes_fail() {
        assert!(PdfLoader::default().load_bytes("broken.pdf", b"not a pdf").is_err());
    }
}
