use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }

    async fn list_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            } else {
                tracing::warn!("Skipping non UTF-8 file name: {:?}", entry.file_name());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(feature = "cli")]
pub use args::CliConfig;

#[cfg(feature = "cli")]
mod args {
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "pdf-outline")]
    #[command(about = "Extracts the title and H1-H3 outline of every PDF in a directory")]
    pub struct CliConfig {
        /// Directory scanned (non-recursively) for *.pdf files
        #[arg(long, env = "PDF_OUTLINE_INPUT")]
        pub input_dir: Option<PathBuf>,

        /// Directory receiving one <name>.json per PDF
        #[arg(long, env = "PDF_OUTLINE_OUTPUT")]
        pub output_dir: Option<PathBuf>,

        /// Optional TOML configuration file
        #[arg(short, long, env = "PDF_OUTLINE_CONFIG")]
        pub config: Option<PathBuf>,

        /// Number of documents processed concurrently
        #[arg(long)]
        pub workers: Option<usize>,

        /// Also write <name>.lines.csv with per-line layout features
        #[arg(long)]
        pub dump_lines: bool,

        /// Log CPU and memory usage while processing
        #[arg(long)]
        pub monitor: bool,

        /// Emit logs as JSON lines
        #[arg(long)]
        pub json_logs: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,
    }
}
