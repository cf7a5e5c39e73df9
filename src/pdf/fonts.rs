use crate::pdf::cmap::CMap;
use crate::pdf::encoding::{glyph_name_to_text, BaseEncoding, CodeTable};
use crate::pdf::{as_number, resolve, stream_data};
use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    /// Horizontal advance in glyph space (thousandths of an em).
    pub width: f32,
    /// Single-byte code 32, which receives word spacing.
    pub is_space: bool,
}

#[derive(Debug, Clone)]
pub struct FontInfo {
    pub name: String,
    pub bold: bool,
    pub italic: bool,
    composite: bool,
    table: CodeTable,
    to_unicode: Option<CMap>,
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: HashMap<u32, f32>,
    default_width: f32,
}

fn is_bold_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ["bold", "black", "heavy"].iter().any(|w| lower.contains(w))
}

fn is_italic_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("italic") || lower.contains("oblique")
}

/// Drops the six-letter subset tag (`ABCDEF+Name`).
pub fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

impl FontInfo {
    /// Font used when a content stream selects a resource that does not exist.
    pub fn fallback(name: &str) -> Self {
        Self::simple_named(name, BaseEncoding::Standard.table())
    }

    fn simple_named(name: &str, table: CodeTable) -> Self {
        let name = strip_subset_prefix(name).to_string();
        Self {
            bold: is_bold_name(&name),
            italic: is_italic_name(&name),
            default_width: if name.to_ascii_lowercase().contains("courier") {
                600.0
            } else {
                500.0
            },
            name,
            composite: false,
            table,
            to_unicode: None,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
        }
    }

    pub fn from_dict(doc: &Document, dict: &Dictionary) -> Self {
        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| resolve(doc, o).as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_else(|| "Unknown".to_string());
        let composite = matches!(
            dict.get(b"Subtype").ok().and_then(|o| o.as_name().ok()),
            Some(b"Type0")
        );

        let mut font = Self::simple_named(&base_font, BaseEncoding::Standard.table());
        font.composite = composite;

        font.to_unicode = dict
            .get(b"ToUnicode")
            .ok()
            .and_then(|o| resolve(doc, o).as_stream().ok())
            .map(|s| CMap::parse(&stream_data(s)))
            .filter(|cmap| !cmap.is_empty());

        if composite {
            if let Some(descendant) = descendant_font(doc, dict) {
                font.default_width = descendant
                    .get(b"DW")
                    .ok()
                    .and_then(|o| as_number(resolve(doc, o)))
                    .unwrap_or(1000.0);
                font.cid_widths = descendant
                    .get(b"W")
                    .ok()
                    .and_then(|o| resolve(doc, o).as_array().ok())
                    .map(|w| parse_cid_widths(doc, w))
                    .unwrap_or_default();
                font.italic |= italic_angle(doc, descendant);
            }
        } else {
            font.table = simple_encoding(doc, dict);
            font.first_char = dict
                .get(b"FirstChar")
                .ok()
                .and_then(|o| as_number(resolve(doc, o)))
                .map(|n| n.max(0.0) as u32)
                .unwrap_or(0);
            font.widths = dict
                .get(b"Widths")
                .ok()
                .and_then(|o| resolve(doc, o).as_array().ok())
                .map(|ws| {
                    ws.iter()
                        .map(|w| as_number(resolve(doc, w)).unwrap_or(0.0))
                        .collect()
                })
                .unwrap_or_default();
            font.italic |= italic_angle(doc, dict);
        }

        font
    }

    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        if self.composite {
            let codes = match &self.to_unicode {
                Some(cmap) => cmap.decode(bytes),
                None => bytes
                    .chunks(2)
                    .map(|c| (c.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b)), String::new()))
                    .collect(),
            };
            return codes
                .into_iter()
                .map(|(code, text)| Glyph {
                    text,
                    width: self.cid_widths.get(&code).copied().unwrap_or(self.default_width),
                    is_space: false,
                })
                .collect();
        }

        bytes
            .iter()
            .map(|&b| {
                let code = u32::from(b);
                let text = self
                    .to_unicode
                    .as_ref()
                    .and_then(|cmap| cmap.lookup(code))
                    .or_else(|| self.table[b as usize].clone())
                    .unwrap_or_else(|| if b == b' ' { " ".to_string() } else { String::new() });
                Glyph {
                    text,
                    width: self.simple_width(code),
                    is_space: b == b' ',
                }
            })
            .collect()
    }

    fn simple_width(&self, code: u32) -> f32 {
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width)
    }
}

fn descendant_font<'a>(doc: &'a Document, dict: &'a Dictionary) -> Option<&'a Dictionary> {
    let array = resolve(doc, dict.get(b"DescendantFonts").ok()?).as_array().ok()?;
    resolve(doc, array.first()?).as_dict().ok()
}

fn italic_angle(doc: &Document, font_dict: &Dictionary) -> bool {
    font_dict
        .get(b"FontDescriptor")
        .ok()
        .and_then(|o| resolve(doc, o).as_dict().ok())
        .and_then(|d| d.get(b"ItalicAngle").ok())
        .and_then(|o| as_number(resolve(doc, o)))
        .map(|angle| angle.abs() > 0.5)
        .unwrap_or(false)
}

fn simple_encoding(doc: &Document, dict: &Dictionary) -> CodeTable {
    let Some(encoding) = dict.get(b"Encoding").ok().map(|o| resolve(doc, o)) else {
        return BaseEncoding::Standard.table();
    };

    match encoding {
        Object::Name(name) => BaseEncoding::from_name(name)
            .unwrap_or(BaseEncoding::Standard)
            .table(),
        Object::Dictionary(enc) => {
            let mut table = enc
                .get(b"BaseEncoding")
                .ok()
                .and_then(|o| o.as_name().ok())
                .and_then(BaseEncoding::from_name)
                .unwrap_or(BaseEncoding::Standard)
                .table();
            if let Some(differences) = enc
                .get(b"Differences")
                .ok()
                .and_then(|o| resolve(doc, o).as_array().ok())
            {
                apply_differences(&mut table, differences);
            }
            table
        }
        _ => BaseEncoding::Standard.table(),
    }
}

fn apply_differences(table: &mut CodeTable, differences: &[Object]) {
    let mut code = 0usize;
    for item in differences {
        match item {
            Object::Integer(start) => code = (*start).max(0) as usize,
            Object::Name(name) => {
                if code < table.len() {
                    table[code] = glyph_name_to_text(&String::from_utf8_lossy(name));
                }
                code += 1;
            }
            _ => {}
        }
    }
}

/// Parses a CIDFont `W` array: `c [w1 w2 ...]` and `c_first c_last w` entries.
fn parse_cid_widths(doc: &Document, w: &[Object]) -> HashMap<u32, f32> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < w.len() {
        let Some(first) = as_number(resolve(doc, &w[i])) else {
            i += 1;
            continue;
        };
        let first = first.max(0.0) as u32;
        match w.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, width) in list.iter().enumerate() {
                    if let Some(width) = as_number(resolve(doc, width)) {
                        widths.insert(first + offset as u32, width);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let last = as_number(last).map(|n| n.max(0.0) as u32).unwrap_or(first);
                let width = w
                    .get(i + 2)
                    .and_then(|o| as_number(resolve(doc, o)))
                    .unwrap_or(1000.0);
                for cid in first..=last.min(first.saturating_add(0xffff)) {
                    widths.insert(cid, width);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    #[test]
    fn test_subset_prefix_removed() {
        assert_eq!(strip_subset_prefix("ABCDEF+Arial-BoldMT"), "Arial-BoldMT");
        assert_eq!(strip_subset_prefix("Arial+Extra"), "Arial+Extra");
    }

    #[test]
    fn test_style_flags_from_name() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "XYZABC+Helvetica-BoldOblique",
        };
        let font = FontInfo::from_dict(&doc, &dict);
        assert_eq!(font.name, "Helvetica-BoldOblique");
        assert!(font.bold);
        assert!(font.italic);

        let regular = FontInfo::fallback("Times-Roman");
        assert!(!regular.bold);
        assert!(!regular.italic);
    }

    #[test]
    fn test_simple_decode_with_widths_and_differences() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Custom",
            "FirstChar" => 65,
            "Widths" => vec![Object::Integer(700), Object::Integer(650)],
            "Encoding" => dictionary! {
                "BaseEncoding" => "WinAnsiEncoding",
                "Differences" => vec![Object::Integer(66), Object::Name(b"eacute".to_vec())],
            },
        };
        let font = FontInfo::from_dict(&doc, &dict);
        let glyphs = font.decode(b"AB C");

        assert_eq!(glyphs[0].text, "A");
        assert_eq!(glyphs[0].width, 700.0);
        assert_eq!(glyphs[1].text, "é");
        assert_eq!(glyphs[1].width, 650.0);
        assert!(glyphs[2].is_space);
        assert_eq!(glyphs[2].width, 500.0);
        assert_eq!(glyphs[3].text, "C");
    }

    #[test]
    fn test_differences_keep_ligatures_and_accents() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "ABCDEF+CMR10",
            "Encoding" => dictionary! {
                "Differences" => vec![
                    Object::Integer(12),
                    Object::Name(b"fi".to_vec()),
                    Object::Name(b"eacute".to_vec()),
                ],
            },
        };
        let font = FontInfo::from_dict(&doc, &dict);
        let text: String = font
            .decode(b"Speci\x0ccation R\x0dsum\x0d")
            .into_iter()
            .map(|g| g.text)
            .collect();
        assert_eq!(text, "Specification Résumé");
    }

    #[test]
    fn test_type0_font_with_to_unicode() {
        let mut doc = Document::with_version("1.5");
        let cmap = doc.add_object(Stream::new(
            dictionary! {},
            b"1 begincodespacerange <0000> <FFFF> endcodespacerange\n\
              2 beginbfchar <0011> <0041> <0003> <0020> endbfchar\n\
              1 beginbfrange <0044> <0046> <0061> endbfrange"
                .to_vec(),
        ));
        let descendant = dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "QWERTY+NotoSans-Bold",
            "DW" => 600,
            "W" => vec![Object::Integer(0x11), Object::Array(vec![Object::Integer(720)])],
        };
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "QWERTY+NotoSans-Bold",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Dictionary(descendant)],
            "ToUnicode" => cmap,
        };
        let font = FontInfo::from_dict(&doc, &dict);
        assert_eq!(font.name, "NotoSans-Bold");
        assert!(font.bold);

        let glyphs = font.decode(&[0x00, 0x11, 0x00, 0x99, 0x00, 0x11, 0x00, 0x03, 0x00, 0x45]);
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "A\u{FFFD}A b");
        assert_eq!(glyphs[0].width, 720.0);
        assert_eq!(glyphs[1].width, 600.0);
    }

    #[test]
    fn test_cid_widths() {
        let doc = Document::with_version("1.5");
        let w = vec![
            Object::Integer(1),
            Object::Array(vec![Object::Integer(250), Object::Integer(300)]),
            Object::Integer(10),
            Object::Integer(12),
            Object::Integer(400),
        ];
        let widths = parse_cid_widths(&doc, &w);
        assert_eq!(widths.get(&1), Some(&250.0));
        assert_eq!(widths.get(&2), Some(&300.0));
        assert_eq!(widths.get(&11), Some(&400.0));
        assert_eq!(widths.get(&13), None);
    }
}
