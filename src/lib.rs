pub mod config;
pub mod core;
pub mod domain;
pub mod pdf;
pub mod utils;

pub use config::{cli::LocalStorage, Settings};
#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use core::{engine::OutlineEngine, engine::RunSummary, pipeline::OutlinePipeline};
pub use domain::model::{HeadingLevel, Outline, OutlineEntry};
pub use utils::error::{OutlineError, Result};
