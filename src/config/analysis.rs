use crate::utils::error::Result;
use crate::utils::validation::{validate_fraction, validate_positive_number, validate_range, Validate};
use serde::{Deserialize, Serialize};

/// Tuning knobs for the outline heuristics. Defaults reproduce the stock behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of distinct heading styles turned into levels (H1..H3).
    pub max_levels: usize,
    /// Minimum share of sided blocks on each half for a page to count as two-column.
    pub column_threshold: f32,
    pub running_text: RunningTextConfig,
    pub tables: TableConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_levels: 3,
            column_threshold: 0.3,
            running_text: RunningTextConfig::default(),
            tables: TableConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunningTextConfig {
    /// Documents shorter than this are never scanned for headers and footers.
    pub min_pages: usize,
    /// Share of scanned pages a text must appear on to count as running text.
    pub line_threshold: f32,
    /// Blocks starting above this fraction of the page height are header material.
    pub top_band: f32,
    /// Blocks ending below this fraction of the page height are footer material.
    pub bottom_band: f32,
}

impl Default for RunningTextConfig {
    fn default() -> Self {
        Self {
            min_pages: 4,
            line_threshold: 0.4,
            top_band: 0.20,
            bottom_band: 0.85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub enabled: bool,
    /// Ruling lines closer than this (points) belong to the same table.
    pub snap_tolerance: f32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            snap_tolerance: 2.0,
        }
    }
}

impl AnalysisConfig {
    /// Levels actually emitted; only H1..H3 exist.
    pub fn effective_levels(&self) -> usize {
        self.max_levels.min(3)
    }
}

impl Validate for AnalysisConfig {
    fn validate(&self) -> Result<()> {
        validate_range("analysis.max_levels", self.max_levels, 1, 6)?;
        validate_fraction("analysis.column_threshold", self.column_threshold)?;
        validate_positive_number("analysis.running_text.min_pages", self.running_text.min_pages, 1)?;
        validate_fraction("analysis.running_text.line_threshold", self.running_text.line_threshold)?;
        validate_fraction("analysis.running_text.top_band", self.running_text.top_band)?;
        validate_fraction("analysis.running_text.bottom_band", self.running_text.bottom_band)?;
        validate_range("analysis.tables.snap_tolerance", self.tables.snap_tolerance, 0.0, 20.0)?;
        Ok(())
    }
}
