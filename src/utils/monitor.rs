//! Per-document resource tracking for batch runs.
//!
//! When enabled, every finished document is sampled for process memory and CPU,
//! and the run keeps a tally of documents, pages and peak memory for the final
//! report. Pages per second is the figure to watch against the time limit.

use std::time::Duration;

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::Instant;
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

/// Resource usage observed right after one document finished.
#[derive(Debug, Clone)]
pub struct DocumentSample {
    pub name: String,
    pub pages: usize,
    pub elapsed: Duration,
    pub memory_mb: u64,
    pub cpu_usage: f32,
}

impl DocumentSample {
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.pages as f64 / secs
        } else {
            0.0
        }
    }
}

/// Totals for the whole batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub documents: usize,
    pub pages: usize,
    pub peak_memory_mb: u64,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
#[derive(Debug, Default)]
struct Tally {
    documents: usize,
    pages: usize,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    start_time: Instant,
    tally: Mutex<Tally>,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let mut system = System::new_with_specifics(RefreshKind::everything());

        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("System monitoring unavailable: {}", e);
                None
            }
        };

        if enabled {
            system.refresh_all();
        }

        Self {
            system: Mutex::new(system),
            pid,
            start_time: Instant::now(),
            tally: Mutex::new(Tally::default()),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current `(memory MB, CPU %)` of this process, if it can be read.
    fn process_usage(&self) -> Option<(u64, f32)> {
        let mut system = self.system.lock().ok()?;
        system.refresh_all();
        let process = system.process(self.pid?)?;
        Some((process.memory() / 1024 / 1024, process.cpu_usage()))
    }

    /// Adds a finished document to the tally and logs its throughput.
    pub fn record_document(&self, name: &str, pages: usize, elapsed: Duration) -> Option<DocumentSample> {
        if !self.enabled {
            return None;
        }

        let (memory_mb, cpu_usage) = self.process_usage().unwrap_or((0, 0.0));
        let peak = {
            let mut tally = self.tally.lock().ok()?;
            tally.documents += 1;
            tally.pages += pages;
            tally.peak_memory_mb = tally.peak_memory_mb.max(memory_mb);
            tally.peak_memory_mb
        };

        let sample = DocumentSample {
            name: name.to_string(),
            pages,
            elapsed,
            memory_mb,
            cpu_usage,
        };
        tracing::info!(
            "📊 {} - {} pages in {:.2}s ({:.1} pages/s), CPU: {:.1}%, Memory: {}MB, Peak: {}MB",
            sample.name,
            sample.pages,
            sample.elapsed.as_secs_f64(),
            sample.pages_per_second(),
            sample.cpu_usage,
            sample.memory_mb,
            peak
        );
        Some(sample)
    }

    pub fn run_stats(&self) -> Option<RunStats> {
        if !self.enabled {
            return None;
        }
        let tally = self.tally.lock().ok()?;
        Some(RunStats {
            documents: tally.documents,
            pages: tally.pages,
            peak_memory_mb: tally.peak_memory_mb,
            elapsed: self.start_time.elapsed(),
        })
    }

    pub fn log_run_stats(&self) {
        if let Some(stats) = self.run_stats() {
            tracing::info!(
                "📊 Final Stats - {} documents, {} pages, Total Time: {:?}, Peak Memory: {}MB",
                stats.documents,
                stats.pages,
                stats.elapsed,
                stats.peak_memory_mb
            );
        }
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// Library builds without the cli feature get a no-op monitor.
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn is_enabled(&self) -> bool {
        false
    }

    pub fn record_document(&self, _name: &str, _pages: usize, _elapsed: Duration) -> Option<DocumentSample> {
        None
    }

    pub fn run_stats(&self) -> Option<RunStats> {
        None
    }

    pub fn log_run_stats(&self) {}
}
