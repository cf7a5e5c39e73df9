use crate::core::analysis::analyze;
use crate::core::{ConfigProvider, Pipeline, Storage, TransformResult};
use crate::domain::model::{LineRecord, Outline, ParsedDocument, SourceDocument};
use crate::pdf::PdfLoader;
use crate::utils::error::{OutlineError, Result};
use serde::Serialize;
use std::collections::BTreeSet;

/// Reads PDFs from one storage and writes outlines to another.
pub struct OutlinePipeline<S: Storage, C: ConfigProvider> {
    input: S,
    output: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> OutlinePipeline<S, C> {
    pub fn new(input: S, output: S, config: C) -> Self {
        Self {
            input,
            output,
            config,
        }
    }
}

/// Serializes with a four-space indent.
pub fn outline_json(outline: &Outline) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    outline.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

#[derive(Serialize)]
struct LineFeatures<'a> {
    page: usize,
    text: &'a str,
    font: &'a str,
    size: i32,
    is_bold: bool,
    is_italic: bool,
    color: u32,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    column: u8,
    font_encoded: usize,
    color_encoded: usize,
}

/// Per-line feature table. Font and colour codes index the sorted distinct values.
pub fn lines_csv(lines: &[LineRecord]) -> Result<Vec<u8>> {
    let fonts: Vec<&str> = lines
        .iter()
        .map(|l| l.font.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let colors: Vec<u32> = lines
        .iter()
        .map(|l| l.color)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    for line in lines {
        writer.serialize(LineFeatures {
            page: line.page,
            text: &line.text,
            font: &line.font,
            size: line.size(),
            is_bold: line.is_bold(),
            is_italic: line.italic,
            color: line.color,
            x0: line.x0,
            y0: line.y0,
            x1: line.x1,
            y1: line.y1,
            column: line.column,
            font_encoded: fonts.binary_search(&line.font.as_str()).unwrap_or_default(),
            color_encoded: colors.binary_search(&line.color).unwrap_or_default(),
        })?;
    }
    writer.into_inner().map_err(|e| OutlineError::from(e.into_error()))
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for OutlinePipeline<S, C> {
    async fn extract(&self, source: &SourceDocument) -> Result<ParsedDocument> {
        let bytes = self.input.read_file(&source.name).await?;
        tracing::debug!("Read {} ({} bytes)", source.name, bytes.len());

        let loader = PdfLoader::new(self.config.analysis().tables.clone());
        let name = source.name.clone();
        tokio::task::spawn_blocking(move || loader.load_bytes(&name, &bytes))
            .await
            .map_err(|e| OutlineError::TaskError {
                message: e.to_string(),
            })?
    }

    async fn transform(&self, document: ParsedDocument) -> Result<TransformResult> {
        let analysis = self.config.analysis().clone();
        let mut result = tokio::task::spawn_blocking(move || analyze(&document, &analysis))
            .await
            .map_err(|e| OutlineError::TaskError {
                message: e.to_string(),
            })?;

        let page_base = self.config.page_base();
        for entry in &mut result.outline.outline {
            entry.page += page_base;
        }
        Ok(result)
    }

    async fn load(&self, source: &SourceDocument, result: TransformResult) -> Result<String> {
        let json_name = source.json_name();
        self.output
            .write_file(&json_name, &outline_json(&result.outline)?)
            .await?;

        if self.config.dump_lines() {
            let csv_name = source.lines_csv_name();
            tracing::debug!("Writing {} line features to {}", result.lines.len(), csv_name);
            self.output.write_file(&csv_name, &lines_csv(&result.lines)?).await?;
        }

        Ok(self
            .config
            .output_dir()
            .join(json_name)
            .display()
            .to_string())
    }
}
