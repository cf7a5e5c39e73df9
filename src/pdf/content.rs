//! Page content stream interpretation.
//!
//! Walks the operators of a page (and the form XObjects it paints) keeping just
//! enough graphics and text state to place every string on the page. The output
//! is a list of positioned glyph runs plus the axis-aligned ruling segments used
//! for table detection.

use crate::domain::model::Rect;
use crate::pdf::fonts::FontInfo;
use crate::pdf::{as_number, resolve, stream_data};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::rc::Rc;

const MAX_FORM_DEPTH: usize = 8;

/// Kerning in a TJ array beyond this many ems is rendered as a space.
const TJ_SPACE_THRESHOLD: f32 = 0.25;

pub type Matrix = [f32; 6];
pub const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

pub type FontCache = HashMap<ObjectId, Rc<FontInfo>>;

/// `m1 × m2` in PDF's row-vector convention.
pub fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn translate(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

fn apply(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (x * m[0] + y * m[2] + m[4], x * m[1] + y * m[3] + m[5])
}

/// Maps PDF user space (origin bottom-left) onto top-down page space.
#[derive(Debug, Clone, Copy)]
pub struct PageGeometry {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl PageGeometry {
    pub fn from_box(llx: f32, lly: f32, urx: f32, ury: f32) -> Self {
        Self {
            left: llx.min(urx),
            top: lly.max(ury),
            width: (urx - llx).abs(),
            height: (ury - lly).abs(),
        }
    }

    fn to_page(self, (x, y): (f32, f32)) -> (f32, f32) {
        (x - self.left, self.top - y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub text: String,
    pub font: String,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: u32,
    pub x0: f32,
    pub x1: f32,
    /// Top-down y of the baseline.
    pub baseline: f32,
}

#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub runs: Vec<GlyphRun>,
    pub segments: Vec<Rect>,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill: u32,
    char_spacing: f32,
    word_spacing: f32,
    h_scale: f32,
    leading: f32,
    rise: f32,
    font: Option<Rc<FontInfo>>,
    font_size: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            fill: 0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
            font: None,
            font_size: 0.0,
        }
    }
}

struct RunBuilder {
    text: String,
    start: (f32, f32),
    size: f32,
}

pub struct ContentInterpreter<'a, 'c> {
    doc: &'a Document,
    geometry: PageGeometry,
    fonts: &'c mut FontCache,
    fallback_font: Rc<FontInfo>,
    output: PageContent,
    path: Vec<Rect>,
    current_point: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
}

impl<'a, 'c> ContentInterpreter<'a, 'c> {
    pub fn new(doc: &'a Document, geometry: PageGeometry, fonts: &'c mut FontCache) -> Self {
        Self {
            doc,
            geometry,
            fonts,
            fallback_font: Rc::new(FontInfo::fallback("Helvetica")),
            output: PageContent::default(),
            path: Vec::new(),
            current_point: None,
            subpath_start: None,
        }
    }

    pub fn interpret(mut self, content: &[u8], resources: Option<&'a Dictionary>) -> lopdf::Result<PageContent> {
        let content = Content::decode(&strip_inline_images(content))?;
        self.run(&content.operations, resources, GraphicsState::default(), 0);
        Ok(self.output)
    }

    fn run(
        &mut self,
        operations: &[Operation],
        resources: Option<&'a Dictionary>,
        initial: GraphicsState,
        depth: usize,
    ) {
        let mut gs = initial;
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut tm = IDENTITY;
        let mut tlm = IDENTITY;

        for op in operations {
            let operands = &op.operands;
            let nums = || numbers(operands);
            match op.operator.as_str() {
                "q" => stack.push(gs.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        gs = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix(&nums()) {
                        gs.ctm = multiply(&m, &gs.ctm);
                    }
                }
                "BT" => {
                    tm = IDENTITY;
                    tlm = IDENTITY;
                }
                "ET" => {}
                "Tf" => {
                    if let (Some(Object::Name(name)), Some(size)) =
                        (operands.first(), operands.get(1).and_then(as_number))
                    {
                        gs.font = Some(self.font(resources, name));
                        gs.font_size = size;
                    }
                }
                "Tc" => {
                    if let Some(v) = nums().first() {
                        gs.char_spacing = *v;
                    }
                }
                "Tw" => {
                    if let Some(v) = nums().first() {
                        gs.word_spacing = *v;
                    }
                }
                "Tz" => {
                    if let Some(v) = nums().first() {
                        gs.h_scale = *v / 100.0;
                    }
                }
                "TL" => {
                    if let Some(v) = nums().first() {
                        gs.leading = *v;
                    }
                }
                "Ts" => {
                    if let Some(v) = nums().first() {
                        gs.rise = *v;
                    }
                }
                "Td" | "TD" => {
                    if let [tx, ty] = nums()[..] {
                        if op.operator == "TD" {
                            gs.leading = -ty;
                        }
                        tlm = multiply(&translate(tx, ty), &tlm);
                        tm = tlm;
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix(&nums()) {
                        tlm = m;
                        tm = m;
                    }
                }
                "T*" => {
                    tlm = multiply(&translate(0.0, -gs.leading), &tlm);
                    tm = tlm;
                }
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        let mut run = self.begin_run(&gs, &tm);
                        self.show(&gs, &mut tm, bytes, &mut run);
                        self.finish_run(&gs, &tm, run);
                    }
                }
                "'" | "\"" => {
                    if op.operator == "\"" {
                        if let [aw, ac, ..] = nums()[..] {
                            gs.word_spacing = aw;
                            gs.char_spacing = ac;
                        }
                    }
                    tlm = multiply(&translate(0.0, -gs.leading), &tlm);
                    tm = tlm;
                    if let Some(Object::String(bytes, _)) = operands.last() {
                        let mut run = self.begin_run(&gs, &tm);
                        self.show(&gs, &mut tm, bytes, &mut run);
                        self.finish_run(&gs, &tm, run);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        let mut run = self.begin_run(&gs, &tm);
                        for item in items {
                            match item {
                                Object::String(bytes, _) => self.show(&gs, &mut tm, bytes, &mut run),
                                other => {
                                    if let Some(adjust) = as_number(other) {
                                        let em = -adjust / 1000.0;
                                        let tx = em * gs.font_size * gs.h_scale;
                                        tm = multiply(&translate(tx, 0.0), &tm);
                                        if em > TJ_SPACE_THRESHOLD
                                            && !run.text.is_empty()
                                            && !run.text.ends_with(char::is_whitespace)
                                        {
                                            run.text.push(' ');
                                        }
                                    }
                                }
                            }
                        }
                        self.finish_run(&gs, &tm, run);
                    }
                }
                "g" => {
                    if let [gray] = nums()[..] {
                        gs.fill = rgb(gray, gray, gray);
                    }
                }
                "rg" => {
                    if let [r, g, b] = nums()[..] {
                        gs.fill = rgb(r, g, b);
                    }
                }
                "k" => {
                    if let [c, m, y, k] = nums()[..] {
                        gs.fill = cmyk(c, m, y, k);
                    }
                }
                "sc" | "scn" => match nums()[..] {
                    [gray] => gs.fill = rgb(gray, gray, gray),
                    [r, g, b] => gs.fill = rgb(r, g, b),
                    [c, m, y, k] => gs.fill = cmyk(c, m, y, k),
                    _ => {}
                },
                "m" => {
                    if let [x, y] = nums()[..] {
                        let p = self.device_point(&gs, x, y);
                        self.current_point = Some(p);
                        self.subpath_start = Some(p);
                    }
                }
                "l" => {
                    if let [x, y] = nums()[..] {
                        let p = self.device_point(&gs, x, y);
                        if let Some(from) = self.current_point {
                            self.path.push(Rect::new(from.0, from.1, p.0, p.1));
                        }
                        self.current_point = Some(p);
                    }
                }
                "c" | "v" | "y" => {
                    let values = nums();
                    if let [.., x, y] = values[..] {
                        self.current_point = Some(self.device_point(&gs, x, y));
                    }
                }
                "re" => {
                    if let [x, y, w, h] = nums()[..] {
                        self.push_rectangle(&gs, x, y, w, h);
                    }
                }
                "h" => self.close_subpath(),
                "S" | "f" | "F" | "f*" | "B" | "B*" => self.paint_path(),
                "s" | "b" | "b*" => {
                    self.close_subpath();
                    self.paint_path();
                }
                "n" => self.clear_path(),
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.paint_xobject(resources, name, &gs, depth);
                    }
                }
                _ => {}
            }
        }
    }

    fn font(&mut self, resources: Option<&'a Dictionary>, name: &[u8]) -> Rc<FontInfo> {
        let doc = self.doc;
        let entry = resources
            .and_then(|r| r.get(b"Font").ok())
            .and_then(|fonts| resolve(doc, fonts).as_dict().ok())
            .and_then(|fonts| fonts.get(name).ok());

        match entry {
            Some(Object::Reference(id)) => {
                if let Some(font) = self.fonts.get(id) {
                    return Rc::clone(font);
                }
                let font = match doc.get_dictionary(*id) {
                    Ok(dict) => Rc::new(FontInfo::from_dict(doc, dict)),
                    Err(_) => Rc::new(FontInfo::fallback(&String::from_utf8_lossy(name))),
                };
                self.fonts.insert(*id, Rc::clone(&font));
                font
            }
            Some(Object::Dictionary(dict)) => Rc::new(FontInfo::from_dict(doc, dict)),
            _ => {
                tracing::debug!("Font resource /{} not found", String::from_utf8_lossy(name));
                Rc::new(FontInfo::fallback(&String::from_utf8_lossy(name)))
            }
        }
    }

    fn begin_run(&self, gs: &GraphicsState, tm: &Matrix) -> RunBuilder {
        let m = multiply(tm, &gs.ctm);
        RunBuilder {
            text: String::new(),
            start: self.text_origin(gs, tm),
            size: gs.font_size.abs() * (m[2] * m[2] + m[3] * m[3]).sqrt(),
        }
    }

    fn show(&self, gs: &GraphicsState, tm: &mut Matrix, bytes: &[u8], run: &mut RunBuilder) {
        let font = gs.font.as_ref().unwrap_or(&self.fallback_font);
        for glyph in font.decode(bytes) {
            run.text.push_str(&glyph.text);
            let spacing = gs.char_spacing + if glyph.is_space { gs.word_spacing } else { 0.0 };
            let tx = (glyph.width / 1000.0 * gs.font_size + spacing) * gs.h_scale;
            *tm = multiply(&translate(tx, 0.0), tm);
        }
    }

    fn finish_run(&mut self, gs: &GraphicsState, tm: &Matrix, run: RunBuilder) {
        if run.text.trim().is_empty() || run.size <= 0.0 {
            return;
        }
        let font = gs.font.as_ref().unwrap_or(&self.fallback_font);
        let end = self.text_origin(gs, tm);
        self.output.runs.push(GlyphRun {
            text: run.text,
            font: font.name.clone(),
            size: run.size,
            bold: font.bold,
            italic: font.italic,
            color: gs.fill,
            x0: run.start.0.min(end.0),
            x1: run.start.0.max(end.0),
            baseline: run.start.1,
        });
    }

    fn text_origin(&self, gs: &GraphicsState, tm: &Matrix) -> (f32, f32) {
        let trm = multiply(&multiply(&[1.0, 0.0, 0.0, 1.0, 0.0, gs.rise], tm), &gs.ctm);
        self.geometry.to_page((trm[4], trm[5]))
    }

    fn device_point(&self, gs: &GraphicsState, x: f32, y: f32) -> (f32, f32) {
        self.geometry.to_page(apply(&gs.ctm, x, y))
    }

    fn push_rectangle(&mut self, gs: &GraphicsState, x: f32, y: f32, w: f32, h: f32) {
        let corners = [
            self.device_point(gs, x, y),
            self.device_point(gs, x + w, y),
            self.device_point(gs, x + w, y + h),
            self.device_point(gs, x, y + h),
        ];
        let bounds = corners
            .iter()
            .skip(1)
            .fold(Rect::new(corners[0].0, corners[0].1, corners[0].0, corners[0].1), |acc, p| {
                acc.union(&Rect::new(p.0, p.1, p.0, p.1))
            });

        // Thin filled rectangles are how most producers draw table rules.
        if bounds.width() < 3.0 || bounds.height() < 3.0 {
            self.path.push(bounds);
        } else {
            for i in 0..4 {
                let (a, b) = (corners[i], corners[(i + 1) % 4]);
                self.path.push(Rect::new(a.0, a.1, b.0, b.1));
            }
        }
        self.current_point = Some(corners[0]);
        self.subpath_start = Some(corners[0]);
    }

    fn close_subpath(&mut self) {
        if let (Some(from), Some(to)) = (self.current_point, self.subpath_start) {
            if from != to {
                self.path.push(Rect::new(from.0, from.1, to.0, to.1));
            }
            self.current_point = Some(to);
        }
    }

    fn paint_path(&mut self) {
        let segments = std::mem::take(&mut self.path);
        self.output
            .segments
            .extend(segments.into_iter().filter(|s| s.width() < 1.0 || s.height() < 1.0));
        self.current_point = None;
        self.subpath_start = None;
    }

    fn clear_path(&mut self) {
        self.path.clear();
        self.current_point = None;
        self.subpath_start = None;
    }

    fn paint_xobject(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &[u8],
        gs: &GraphicsState,
        depth: usize,
    ) {
        if depth >= MAX_FORM_DEPTH {
            tracing::debug!("Form XObject nesting too deep, skipping /{}", String::from_utf8_lossy(name));
            return;
        }
        let doc = self.doc;
        let Some(stream) = resources
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|x| resolve(doc, x).as_dict().ok())
            .and_then(|x| x.get(name).ok())
            .and_then(|o| resolve(doc, o).as_stream().ok())
        else {
            return;
        };
        if !matches!(stream.dict.get(b"Subtype").ok().and_then(|o| o.as_name().ok()), Some(b"Form")) {
            return;
        }

        let operations = match Content::decode(&strip_inline_images(&stream_data(stream))) {
            Ok(content) => content.operations,
            Err(e) => {
                tracing::debug!("Skipping undecodable form /{}: {}", String::from_utf8_lossy(name), e);
                return;
            }
        };
        let form_matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .and_then(|a| matrix(&numbers(a)))
            .unwrap_or(IDENTITY);
        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| resolve(doc, o).as_dict().ok())
            .or(resources);

        let mut form_state = gs.clone();
        form_state.ctm = multiply(&form_matrix, &gs.ctm);

        // Paths do not leak across the form boundary.
        let outer_path = std::mem::take(&mut self.path);
        self.run(&operations, form_resources, form_state, depth + 1);
        self.path = outer_path;
    }
}

fn numbers(operands: &[Object]) -> Vec<f32> {
    operands.iter().filter_map(as_number).collect()
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// True when `data[at..]` starts with the operator `word` standing alone.
fn operator_at(data: &[u8], at: usize, word: &[u8]) -> bool {
    data[at..].starts_with(word)
        && (at == 0 || (is_delimiter(data[at - 1]) && data[at - 1] != b'/'))
        && data.get(at + word.len()).map_or(true, |&b| is_delimiter(b))
}

/// Cuts `BI … ID <data> EI` inline images out of a content stream.
///
/// lopdf stops parsing at the first inline image and silently drops every
/// operator after it, so the binary image data is removed before decoding.
/// The image data ends at the first `EI` surrounded by whitespace.
fn strip_inline_images(data: &[u8]) -> Cow<'_, [u8]> {
    let mut out: Option<Vec<u8>> = None;
    let mut copied = 0;
    let mut i = 0;

    while i < data.len() {
        match data[i] {
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'(' => {
                let mut depth = 0usize;
                while i < data.len() {
                    match data[i] {
                        b'\\' => i += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                i += 1;
            }
            b'B' if operator_at(data, i, b"BI") => {
                let Some(id) = (i + 2..data.len()).find(|&j| operator_at(data, j, b"ID")) else {
                    break;
                };
                let image_start = id + 3;
                let end = (image_start..data.len())
                    .find(|&j| {
                        data[j..].starts_with(b"EI")
                            && data[j - 1].is_ascii_whitespace()
                            && data.get(j + 2).map_or(true, |b| b.is_ascii_whitespace())
                    })
                    .map(|j| j + 2)
                    .unwrap_or(data.len());
                let buffer = out.get_or_insert_with(|| Vec::with_capacity(data.len()));
                buffer.extend_from_slice(&data[copied..i]);
                buffer.push(b' ');
                copied = end;
                i = end;
            }
            _ => i += 1,
        }
    }

    match out {
        Some(mut buffer) => {
            buffer.extend_from_slice(&data[copied.min(data.len())..]);
            Cow::Owned(buffer)
        }
        None => Cow::Borrowed(data),
    }
}

fn matrix(values: &[f32]) -> Option<Matrix> {
    match values {
        [a, b, c, d, e, f] => Some([*a, *b, *c, *d, *e, *f]),
        _ => None,
    }
}

fn channel(v: f32) -> u32 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u32
}

fn rgb(r: f32, g: f32, b: f32) -> u32 {
    (channel(r) << 16) | (channel(g) << 8) | channel(b)
}

fn cmyk(c: f32, m: f32, y: f32, k: f32) -> u32 {
    rgb((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn letter_geometry() -> PageGeometry {
        PageGeometry::from_box(0.0, 0.0, 612.0, 792.0)
    }

    fn interpret(doc: &Document, resources: Option<&Dictionary>, ops: Vec<Operation>) -> PageContent {
        let bytes = Content { operations: ops }.encode().unwrap();
        interpret_bytes(doc, resources, &bytes)
    }

    fn interpret_bytes(doc: &Document, resources: Option<&Dictionary>, bytes: &[u8]) -> PageContent {
        let mut cache = FontCache::new();
        ContentInterpreter::new(doc, letter_geometry(), &mut cache)
            .interpret(bytes, resources)
            .unwrap()
    }

    fn form(dict: Dictionary, content: &[u8]) -> Stream {
        let mut form_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        for (key, value) in dict.iter() {
            form_dict.set(key.clone(), value.clone());
        }
        Stream::new(form_dict, content.to_vec())
    }

    fn font_resources(doc: &mut Document) -> Dictionary {
        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        dictionary! {
            "Font" => dictionary! { "F1" => regular, "F2" => bold },
        }
    }

    #[test]
    fn test_matrix_multiply_translates() {
        let m = multiply(&translate(10.0, 5.0), &[2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        assert_eq!(apply(&m, 0.0, 0.0), (20.0, 10.0));
    }

    #[test]
    fn test_text_placement_and_advance() {
        let mut doc = Document::with_version("1.5");
        let resources = font_resources(&mut doc);
        let content = interpret(
            &doc,
            Some(&resources),
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F2".into(), 20.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal("Title")]),
                Operation::new("ET", vec![]),
            ],
        );

        assert_eq!(content.runs.len(), 1);
        let run = &content.runs[0];
        assert_eq!(run.text, "Title");
        assert_eq!(run.font, "Helvetica-Bold");
        assert!(run.bold);
        assert!((run.size - 20.0).abs() < 1e-3);
        assert!((run.x0 - 100.0).abs() < 1e-3);
        // Five glyphs at the 500/1000 default width.
        assert!((run.x1 - 150.0).abs() < 1e-3);
        assert!((run.baseline - 92.0).abs() < 1e-3);
    }

    #[test]
    fn test_tj_kerning_inserts_space_and_scaling_applies() {
        let mut doc = Document::with_version("1.5");
        let resources = font_resources(&mut doc);
        let content = interpret(
            &doc,
            Some(&resources),
            vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![2.into(), 0.into(), 0.into(), 2.into(), 0.into(), 0.into()],
                ),
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![10.into(), 10.into()]),
                Operation::new(
                    "TJ",
                    vec![Object::Array(vec![
                        Object::string_literal("Hello"),
                        Object::Integer(-400),
                        Object::string_literal("World"),
                    ])],
                ),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
            ],
        );

        let run = &content.runs[0];
        assert_eq!(run.text, "Hello World");
        assert!((run.size - 20.0).abs() < 1e-3);
        assert!((run.x0 - 20.0).abs() < 1e-3);
        assert!((run.baseline - (792.0 - 20.0)).abs() < 1e-3);
    }

    #[test]
    fn test_leading_and_fill_color() {
        let mut doc = Document::with_version("1.5");
        let resources = font_resources(&mut doc);
        let content = interpret(
            &doc,
            Some(&resources),
            vec![
                Operation::new("BT", vec![]),
                Operation::new("rg", vec![1.into(), 0.into(), 0.into()]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("TL", vec![14.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal("first")]),
                Operation::new("'", vec![Object::string_literal("second")]),
                Operation::new("ET", vec![]),
            ],
        );

        assert_eq!(content.runs.len(), 2);
        assert_eq!(content.runs[0].color, 0xff0000);
        assert!((content.runs[1].baseline - content.runs[0].baseline - 14.0).abs() < 1e-3);
        assert!((content.runs[1].x0 - 72.0).abs() < 1e-3);
    }

    #[test]
    fn test_rules_become_segments() {
        let doc = Document::with_version("1.5");
        let content = interpret(
            &doc,
            None,
            vec![
                Operation::new("re", vec![50.into(), 500.into(), 300.into(), 100.into()]),
                Operation::new("S", vec![]),
                Operation::new("m", vec![50.into(), 550.into()]),
                Operation::new("l", vec![350.into(), 550.into()]),
                Operation::new("S", vec![]),
                Operation::new("m", vec![0.into(), 0.into()]),
                Operation::new("l", vec![100.into(), 100.into()]),
                Operation::new("S", vec![]),
                Operation::new("re", vec![0.into(), 0.into(), 10.into(), 10.into()]),
                Operation::new("n", vec![]),
            ],
        );

        // Four box edges plus the horizontal rule; the diagonal and the clip are dropped.
        assert_eq!(content.segments.len(), 5);
        assert!(content
            .segments
            .iter()
            .any(|s| s.height() < 1e-3 && (s.y0 - 242.0).abs() < 1e-3));
    }

    #[test]
    fn test_text_after_inline_image_survives() {
        let mut doc = Document::with_version("1.5");
        let resources = font_resources(&mut doc);
        let bytes = b"BT /F1 12 Tf 72 700 Td (Heading Text) Tj ET\n\
            q 2 0 0 1 0 0 cm\n\
            BI /W 2 /H 1 /BPC 8 /CS /G ID \x00EI\xff EI\n\
            Q\n\
            BT /F1 12 Tf 72 650 Td (After BI Image) Tj ET\n";
        let content = interpret_bytes(&doc, Some(&resources), bytes);

        let texts: Vec<&str> = content.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Heading Text", "After BI Image"]);
        assert!((content.runs[1].baseline - 142.0).abs() < 1e-3);
    }

    #[test]
    fn test_strip_inline_images_leaves_plain_streams_alone() {
        let plain = b"BT /BI 12 Tf (BI ID EI) Tj ET";
        assert!(matches!(strip_inline_images(plain), Cow::Borrowed(_)));

        let stripped = strip_inline_images(b"q BI /W 1 /H 1 ID \xffEI EI Q");
        assert_eq!(&*stripped, b"q   Q");
    }

    #[test]
    fn test_form_xobject_applies_its_matrix() {
        let mut doc = Document::with_version("1.5");
        let fonts = font_resources(&mut doc);
        let form_id = doc.add_object(form(
            dictionary! { "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 100.into(), 200.into()] },
            b"BT /F2 10 Tf 10 0 Td (Inside Form) Tj ET 0 0 m 200 0 l S",
        ));
        let mut resources = fonts.clone();
        resources.set("XObject", dictionary! { "Fm" => form_id });

        let content = interpret(
            &doc,
            Some(&resources),
            vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![1.into(), 0.into(), 0.into(), 1.into(), 0.into(), 100.into()],
                ),
                Operation::new("Do", vec!["Fm".into()]),
                Operation::new("Q", vec![]),
            ],
        );

        assert_eq!(content.runs.len(), 1);
        let run = &content.runs[0];
        assert_eq!(run.text, "Inside Form");
        assert!(run.bold);
        assert!((run.x0 - 110.0).abs() < 1e-3);
        assert!((run.baseline - (792.0 - 300.0)).abs() < 1e-3);
        assert_eq!(content.segments.len(), 1);
        assert!((content.segments[0].x0 - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_self_referencing_form_stops_at_depth_limit() {
        let mut doc = Document::with_version("1.5");
        let fonts = font_resources(&mut doc);
        let form_id = doc.new_object_id();
        let mut form_resources = fonts.clone();
        form_resources.set("XObject", dictionary! { "Loop" => form_id });
        let looping = form(
            dictionary! { "Resources" => form_resources },
            b"BT /F1 10 Tf 72 700 Td (Again) Tj ET 1 0 0 1 0 -12 cm /Loop Do",
        );
        doc.objects.insert(form_id, Object::Stream(looping));

        let mut resources = fonts;
        resources.set("XObject", dictionary! { "Loop" => form_id });
        let content = interpret(
            &doc,
            Some(&resources),
            vec![Operation::new("Do", vec!["Loop".into()])],
        );

        assert_eq!(content.runs.len(), MAX_FORM_DEPTH);
        assert!(content.runs.iter().all(|r| r.text == "Again"));
        let last = &content.runs[MAX_FORM_DEPTH - 1];
        assert!((last.baseline - content.runs[0].baseline - 12.0 * (MAX_FORM_DEPTH - 1) as f32).abs() < 1e-3);
    }

    #[test]
    fn test_image_xobjects_are_ignored() {
        let mut doc = Document::with_version("1.5");
        let image_id = doc.add_object(Stream::new(
            dictionary! { "Type" => "XObject", "Subtype" => "Image", "Width" => 1, "Height" => 1 },
            vec![0xff],
        ));
        let resources = dictionary! { "XObject" => dictionary! { "Im1" => image_id } };
        let content = interpret(&doc, Some(&resources), vec![Operation::new("Do", vec!["Im1".into()])]);
        assert!(content.runs.is_empty());
        assert!(content.segments.is_empty());
    }
}
