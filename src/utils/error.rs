use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutlineError {
    #[error("PDF parsing failed: {0}")]
    PdfError(#[from] lopdf::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Input directory not found: {path}")]
    InputNotFound { path: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Worker task failed: {message}")]
    TaskError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Document,
    Output,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl OutlineError {
    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::InputNotFound { .. } => ErrorCategory::Input,
            Self::PdfError(_) | Self::ProcessingError { .. } => ErrorCategory::Document,
            Self::IoError(_) | Self::CsvError(_) | Self::SerializationError(_) => {
                ErrorCategory::Output
            }
            Self::TaskError { .. } => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Document => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::Output => {
                ErrorSeverity::High
            }
            ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::PdfError(_) => "Check that the file is a valid, unencrypted PDF",
            Self::ProcessingError { .. } => "Inspect the document with --verbose to see which page failed",
            Self::IoError(_) => "Check that the output directory exists and is writable",
            Self::CsvError(_) | Self::SerializationError(_) => {
                "Check free disk space and permissions of the output directory"
            }
            Self::ConfigError { .. } | Self::ConfigValidationError { .. } => {
                "Make sure the config file exists and is valid TOML"
            }
            Self::InvalidConfigValueError { .. } => {
                "Fix the reported value in the config file or on the command line"
            }
            Self::InputNotFound { .. } => {
                "Mount the input directory (e.g. -v $(pwd)/input:/app/input:ro) before running"
            }
            Self::TaskError { .. } => "Re-run with --workers 1 and --verbose to isolate the failure",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::PdfError(e) => format!("Could not read PDF: {}", e),
            Self::InputNotFound { path } => format!("Input directory '{}' does not exist", path),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    /// Process exit code for a fatal error of this kind.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, OutlineError>;
