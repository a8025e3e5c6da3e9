use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::record::EvalResult;

/// Append-only JSON Lines results log
pub struct EvalLog {
    path: PathBuf,
}

#[derive(Debug, Default)]
pub struct LoadedLog {
    pub records: Vec<EvalResult>,
    /// Lines that were not valid records and were skipped
    pub malformed: usize,
}

impl EvalLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line in a single write
    pub async fn append(&self, record: &EvalResult) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create log directory: {:?}", parent))?;
        }

        let mut line = serde_json::to_string(record).context("Failed to encode eval record")?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open results log: {:?}", self.path))?;

        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("Failed to append to results log: {:?}", self.path))?;
        file.flush().await?;

        Ok(())
    }

    /// Read every record back. Malformed lines (e.g. a torn final write) are
    /// skipped and counted.
    pub async fn load(&self) -> Result<LoadedLog> {
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read results log: {:?}", self.path))?;

        let mut loaded = LoadedLog::default();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<EvalResult>(line) {
                Ok(record) => loaded.records.push(record),
                Err(e) => {
                    warn!(line = idx + 1, error = %e, "Skipping malformed log line");
                    loaded.malformed += 1;
                }
            }
        }

        Ok(loaded)
    }
}
