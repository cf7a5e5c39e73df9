pub mod analysis;
pub mod cli;
pub mod toml_config;

use crate::config::analysis::AnalysisConfig;
use crate::config::toml_config::TomlConfig;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::path::{Path, PathBuf};

/// Effective run configuration: TOML file values with command-line overrides applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub workers: usize,
    pub page_base: usize,
    pub dump_lines: bool,
    pub monitor: bool,
    pub analysis: AnalysisConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default())
    }
}

impl Settings {
    pub fn from_toml(config: TomlConfig) -> Self {
        Self {
            input_dir: config.input.dir,
            output_dir: config.output.dir,
            workers: config.processing.workers,
            page_base: config.output.page_base,
            dump_lines: config.output.dump_lines,
            monitor: config.monitoring.enabled,
            analysis: config.analysis,
        }
    }

    /// Builds settings for a pair of directories with stock analysis parameters.
    pub fn for_dirs(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    #[cfg(feature = "cli")]
    pub fn resolve(cli: &cli::CliConfig) -> Result<Self> {
        let file_config = match &cli.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };
        file_config.validate()?;

        let mut settings = Self::from_toml(file_config);
        if let Some(dir) = &cli.input_dir {
            settings.input_dir = dir.clone();
        }
        if let Some(dir) = &cli.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(workers) = cli.workers {
            settings.workers = workers;
        }
        settings.dump_lines |= cli.dump_lines;
        settings.monitor |= cli.monitor;

        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        crate::utils::validation::validate_path("input_dir", &self.input_dir)?;
        crate::utils::validation::validate_path("output_dir", &self.output_dir)?;
        crate::utils::validation::validate_range("workers", self.workers, 1, 64)?;
        crate::utils::validation::validate_one_of("page_base", self.page_base, &[0, 1])?;
        self.analysis.validate()
    }
}

impl ConfigProvider for Settings {
    fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn workers(&self) -> usize {
        self.workers
    }

    fn page_base(&self) -> usize {
        self.page_base
    }

    fn dump_lines(&self) -> bool {
        self.dump_lines
    }

    fn analysis(&self) -> &AnalysisConfig {
        &self.analysis
    }
}
