//! Latency sink adapters: a buffered log file and an in-memory log.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::domain::{LatencySample, RecordError};
use crate::ports::LatencySink;

/// Render the summary line written at the end of a bounded run.
#[must_use]
pub fn summary_line(elapsed: Duration) -> String {
    format!("Total Latency: {:.6}", elapsed.as_secs_f64())
}

/// Append-only text log, truncated when opened.
pub struct FileLatencyLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileLatencyLog {
    /// Create (or truncate) the log at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        debug!(path = %path.display(), "Latency log truncated");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Location of the log.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LatencySink for FileLatencyLog {
    fn append(&mut self, sample: &LatencySample) -> Result<(), RecordError> {
        writeln!(self.writer, "{sample}")?;
        Ok(())
    }

    fn append_summary(&mut self, elapsed: Duration) -> Result<(), RecordError> {
        writeln!(self.writer, "{}", summary_line(elapsed))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), RecordError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory log. Clones share the same lines.
#[derive(Debug, Clone, Default)]
pub struct MemoryLatencyLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryLatencyLog {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every line written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl LatencySink for MemoryLatencyLog {
    fn append(&mut self, sample: &LatencySample) -> Result<(), RecordError> {
        self.lines.lock().push(sample.to_string());
        Ok(())
    }

    fn append_summary(&mut self, elapsed: Duration) -> Result<(), RecordError> {
        self.lines.lock().push(summary_line(elapsed));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), RecordError> {
        Ok(())
    }
}
