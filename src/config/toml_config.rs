use crate::config::analysis::AnalysisConfig;
use crate::utils::error::{OutlineError, Result};
use crate::utils::validation::{validate_one_of, validate_path, validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub processing: ProcessingConfig,
    pub monitoring: MonitoringConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub dir: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./input"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// 0 reports pages zero-based, 1 reports them as printed page numbers.
    pub page_base: usize,
    /// Also write `<stem>.lines.csv` with the per-line features.
    pub dump_lines: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./output"),
            page_base: 0,
            dump_lines: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| OutlineError::ConfigError {
            message: format!("cannot read '{}': {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| OutlineError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay verbatim.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| OutlineError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input.dir", &self.input.dir)?;
        validate_path("output.dir", &self.output.dir)?;
        validate_one_of("output.page_base", self.output.page_base, &[0, 1])?;
        validate_range("processing.workers", self.processing.workers, 1, 64)?;
        self.analysis.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config.input.dir, PathBuf::from("./input"));
        assert_eq!(config.output.dir, PathBuf::from("./output"));
        assert_eq!(config.output.page_base, 0);
        assert_eq!(config.processing.workers, 4);
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[input]
dir = "/app/input"

[output]
dir = "/app/output"
page_base = 1
dump_lines = true

[processing]
workers = 2

[monitoring]
enabled = true

[analysis]
max_levels = 2
column_threshold = 0.25

[analysis.running_text]
line_threshold = 0.5

[analysis.tables]
enabled = false
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.input.dir, PathBuf::from("/app/input"));
        assert_eq!(config.output.page_base, 1);
        assert!(config.output.dump_lines);
        assert_eq!(config.processing.workers, 2);
        assert!(config.monitoring.enabled);
        assert_eq!(config.analysis.max_levels, 2);
        assert_eq!(config.analysis.running_text.line_threshold, 0.5);
        assert_eq!(config.analysis.running_text.min_pages, 4);
        assert!(!config.analysis.tables.enabled);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PDF_OUTLINE_TEST_OUTPUT", "/tmp/outline-out");

        let toml_content = r#"
[output]
dir = "${PDF_OUTLINE_TEST_OUTPUT}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("/tmp/outline-out"));

        std::env::remove_var("PDF_OUTLINE_TEST_OUTPUT");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[output]
page_base = 2
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[processing]\nworkers = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = TomlConfig::from_toml_str("[output\ndir = 1").unwrap_err();
        assert!(matches!(err, OutlineError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[processing]\nworkers = 8\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.processing.workers, 8);
    }
}
