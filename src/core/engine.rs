use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::SourceDocument;
use crate::utils::error::{OutlineError, Result};
use crate::utils::monitor::SystemMonitor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Outcome of one batch run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Paths of the outline files written.
    pub processed: Vec<String>,
    /// `(file name, error message)` for every document that failed.
    pub failed: Vec<(String, String)>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs the pipeline over every PDF in the input directory on a bounded pool.
pub struct OutlineEngine<P: Pipeline, S: Storage> {
    pipeline: Arc<P>,
    input: S,
    input_dir: PathBuf,
    output_dir: PathBuf,
    workers: usize,
    monitor: Arc<SystemMonitor>,
}

impl<P: Pipeline + 'static, S: Storage> OutlineEngine<P, S> {
    pub fn new(pipeline: P, input: S, config: &impl ConfigProvider) -> Self {
        Self::new_with_monitoring(pipeline, input, config, false)
    }

    pub fn new_with_monitoring(pipeline: P, input: S, config: &impl ConfigProvider, monitor: bool) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            input,
            input_dir: config.input_dir().to_path_buf(),
            output_dir: config.output_dir().to_path_buf(),
            workers: config.workers().max(1),
            monitor: Arc::new(SystemMonitor::new(monitor)),
        }
    }

    /// PDF files directly under the input directory, sorted by name.
    pub async fn discover(&self) -> Result<Vec<SourceDocument>> {
        let names = self.input.list_files().await.map_err(|e| match e {
            OutlineError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
                OutlineError::InputNotFound {
                    path: self.input_dir.display().to_string(),
                }
            }
            other => other,
        })?;

        let mut documents = Vec::new();
        for name in names {
            let is_pdf = Path::new(&name)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            if is_pdf {
                documents.push(SourceDocument::new(name));
            } else {
                tracing::debug!("Ignoring non-PDF file: {}", name);
            }
        }
        Ok(documents)
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        tracing::info!("Starting outline extraction...");
        if self.monitor.is_enabled() {
            tracing::info!("🔍 System monitoring enabled");
        }

        let documents = self.discover().await?;
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let mut summary = RunSummary::default();
        if documents.is_empty() {
            tracing::warn!("No PDF files found in {}", self.input_dir.display());
            summary.elapsed = started.elapsed();
            return Ok(summary);
        }
        tracing::info!(
            "Found {} PDF files, processing with {} workers",
            documents.len(),
            self.workers
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        for source in documents {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| OutlineError::TaskError {
                    message: e.to_string(),
                })?;
            let pipeline = Arc::clone(&self.pipeline);
            let monitor = Arc::clone(&self.monitor);

            tasks.spawn(async move {
                let _permit = permit;
                let outcome = process_document(pipeline.as_ref(), &source).await;
                if let Ok(done) = &outcome {
                    monitor.record_document(&source.name, done.pages, done.elapsed);
                }
                (source, outcome.map(|done| done.path))
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (source, outcome) = joined.map_err(|e| OutlineError::TaskError {
                message: e.to_string(),
            })?;
            match outcome {
                Ok(path) => summary.processed.push(path),
                Err(e) => {
                    tracing::error!(
                        "❌ Failed to process {}: {} (Category: {:?})",
                        source.name,
                        e,
                        e.category()
                    );
                    summary.failed.push((source.name, e.to_string()));
                }
            }
        }

        summary.processed.sort();
        summary.failed.sort();
        summary.elapsed = started.elapsed();

        tracing::info!(
            "Processed {} files, {} failed, in {:.2} seconds",
            summary.processed.len(),
            summary.failed.len(),
            summary.elapsed.as_secs_f64()
        );
        self.monitor.log_run_stats();
        Ok(summary)
    }
}

struct Processed {
    path: String,
    pages: usize,
    elapsed: Duration,
}

async fn process_document<P: Pipeline>(pipeline: &P, source: &SourceDocument) -> Result<Processed> {
    let started = Instant::now();
    tracing::info!("Processing {}...", source.name);

    let document = pipeline.extract(source).await?;
    let pages = document.pages.len();
    tracing::debug!("{}: {} pages", source.name, pages);
    let result = pipeline.transform(document).await?;
    let path = pipeline.load(source, result).await?;

    let elapsed = started.elapsed();
    tracing::info!(
        "Finished {} in {:.2} seconds -> {}",
        source.name,
        elapsed.as_secs_f64(),
        path
    );
    Ok(Processed { path, pages, elapsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use crate::config::Settings;
    use crate::core::pipeline::OutlinePipeline;
    use crate::pdf::testing::{build_pdf, text};
    use tempfile::TempDir;

    fn engine_for(settings: &Settings) -> OutlineEngine<OutlinePipeline<LocalStorage, Settings>, LocalStorage> {
        let pipeline = OutlinePipeline::new(
            LocalStorage::new(&settings.input_dir),
            LocalStorage::new(&settings.output_dir),
            settings.clone(),
        );
        OutlineEngine::new(pipeline, LocalStorage::new(&settings.input_dir), settings)
    }

    #[tokio::test]
    async fn test_discover_filters_and_sorts_pdfs() {
        let dir = TempDir::new().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "c.pdf.bak"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let settings = Settings::for_dirs(dir.path(), dir.path().join("out"));
        let names: Vec<String> = engine_for(&settings)
            .discover()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();

        assert_eq!(names, vec!["a.PDF".to_string(), "b.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_input_dir() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::for_dirs(dir.path().join("absent"), dir.path().join("out"));
        let err = engine_for(&settings).run().await.unwrap_err();
        assert!(matches!(err, OutlineError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_batch() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        std::fs::write(input.path().join("broken.pdf"), b"not a pdf").unwrap();
        std::fs::write(
            input.path().join("good.pdf"),
            build_pdf(vec![text("F2", 18, 200, 700, "Good Document")]),
        )
        .unwrap();

        let mut settings = Settings::for_dirs(input.path(), output.path().join("results"));
        settings.workers = 2;
        let summary = engine_for(&settings).run().await.unwrap();

        assert_eq!(summary.processed.len(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "broken.pdf");
        assert!(!summary.is_success());
        assert!(output.path().join("results").join("good.json").is_file());
        assert!(!output.path().join("results").join("broken.json").exists());
    }

    #[cfg(feature = "cli")]
    #[tokio::test]
    async fn test_monitoring_counts_processed_pages() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        std::fs::write(
            input.path().join("two.pdf"),
            build_pdf(vec![
                text("F2", 18, 200, 700, "First Page"),
                text("F1", 10, 72, 700, "Second page words"),
            ]),
        )
        .unwrap();
        std::fs::write(input.path().join("broken.pdf"), b"not a pdf").unwrap();

        let settings = Settings::for_dirs(input.path(), output.path());
        let pipeline = OutlinePipeline::new(
            LocalStorage::new(&settings.input_dir),
            LocalStorage::new(&settings.output_dir),
            settings.clone(),
        );
        let engine = OutlineEngine::new_with_monitoring(pipeline, LocalStorage::new(input.path()), &settings, true);
        engine.run().await.unwrap();

        let stats = engine.monitor.run_stats().unwrap();
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.pages, 2);
    }

    #[tokio::test]
    async fn test_empty_input_dir_succeeds() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let settings = Settings::for_dirs(input.path(), output.path().join("out"));

        let summary = engine_for(&settings).run().await.unwrap();

        assert!(summary.is_success());
        assert!(summary.processed.is_empty());
        assert!(output.path().join("out").is_dir());
    }
}
