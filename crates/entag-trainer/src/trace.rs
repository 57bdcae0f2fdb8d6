//! Append-only transcript log for the exact-match reward channel.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use entag_core::{ScoringTrace, TraceSink};
use tracing::warn;

/// Appends scoring transcripts to a file. Writes are serialized by a mutex.
#[derive(Debug)]
pub struct FileTraceSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileTraceSink {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening trace log {}", path.display()))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TraceSink for FileTraceSink {
    fn record(&self, trace: &ScoringTrace<'_>) {
        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = write!(file, "{trace}").and_then(|()| file.flush()) {
            warn!(path = %self.path.display(), error = %e, "failed to append scoring trace");
        }
    }
}
