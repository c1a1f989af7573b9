//! Operator run log.
//!
//! The journal is the text stream the host UI pulls from: every line is kept
//! in memory, optionally appended to a flat file, and mirrored as a
//! `tracing` event. Operator-facing lines go out at info level, detail lines
//! at debug level.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::LogConfig;

/// First line of every log file.
pub const HEADER: &str = "-- Seeder Controller --";

#[derive(Debug)]
struct Inner {
    text: String,
    file: Option<File>,
    path: Option<PathBuf>,
    file_failed: bool,
    echo: bool,
}

impl Inner {
    fn append(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');

        let Some(file) = self.file.as_mut() else {
            return;
        };
        if let Err(e) = writeln!(file, "{line}") {
            if !self.file_failed {
                tracing::warn!(
                    path = ?self.path,
                    error = %e,
                    "Failed to write run log file; continuing in memory"
                );
                self.file_failed = true;
            }
            self.file = None;
        }
    }
}

/// Shared handle to the run log. Clones append to the same log.
#[derive(Debug, Clone)]
pub struct Journal {
    inner: Arc<Mutex<Inner>>,
}

impl Default for Journal {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Journal {
    /// A journal that keeps text in memory only.
    pub fn in_memory() -> Self {
        Self::from_parts(None, None, true)
    }

    /// Open the journal described by `config` and write the header.
    ///
    /// The log file is truncated. If it cannot be created a warning is
    /// logged and the journal continues in memory.
    pub fn open(config: &LogConfig) -> Self {
        let file = config.path.as_deref().and_then(|path| match create(path) {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to create run log file");
                None
            }
        });
        let failed = config.path.is_some() && file.is_none();
        let journal = Self::from_parts(file, config.path.clone(), config.echo);
        journal.inner.lock().file_failed = failed;

        journal.log(HEADER);
        journal.log("Seeder Controller Startup...");
        journal
    }

    fn from_parts(file: Option<File>, path: Option<PathBuf>, echo: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                text: String::new(),
                file,
                path,
                file_failed: false,
                echo,
            })),
        }
    }

    /// Append an operator-facing line.
    pub fn log(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        let mut inner = self.inner.lock();
        if inner.echo {
            tracing::info!(target: "seeder_motion::journal", "{line}");
        } else {
            tracing::debug!(target: "seeder_motion::journal", "{line}");
        }
        inner.append(line);
    }

    /// Append a detail line that is not echoed to the operator.
    pub fn detail(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        tracing::debug!(target: "seeder_motion::journal", "{line}");
        self.inner.lock().append(line);
    }

    /// Full in-memory text.
    pub fn text(&self) -> String {
        self.inner.lock().text.clone()
    }

    /// Forget the in-memory text. The file is left untouched.
    pub fn clear(&self) {
        self.inner.lock().text.clear();
    }

    /// Path of the log file, if one is being written.
    pub fn path(&self) -> Option<PathBuf> {
        let inner = self.inner.lock();
        inner.file.as_ref().and(inner.path.clone())
    }
}

fn create(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}
