// # File Availability Log
//
// Append-only text file of identifiers observed becoming available.
//
// ## File Format
//
// One line per entry, the identifier and an RFC 3339 UTC timestamp
// separated by an em dash:
//
// ```text
// foo — 2025-01-09T12:00:00.123456+00:00
// bar — 2025-01-09T12:00:03.004512+00:00
// ```
//
// ## Durability
//
// - The file is opened in append mode; existing lines are never touched
// - Each append writes one complete line and flushes it
// - Parent directories are created on open

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;
use crate::traits::AvailabilityLog;

/// Separator between identifier and timestamp
const ENTRY_SEPARATOR: &str = " — ";

/// File-backed availability log
///
/// # Example
///
/// ```rust,no_run
/// use namewatch_core::FileAvailabilityLog;
/// use namewatch_core::traits::AvailabilityLog;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let log = FileAvailabilityLog::open("available_usernames.txt").await?;
///     log.append("foo", chrono::Utc::now()).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileAvailabilityLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileAvailabilityLog {
    /// Open (or create) the log file for appending
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::availability_log(format!(
                    "Failed to create log directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                Error::availability_log(format!(
                    "Failed to open log file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        tracing::debug!("Availability log opened: {}", path.display());

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render one log line (without trailing newline)
    pub fn format_entry(name: &str, at: DateTime<Utc>) -> String {
        format!(
            "{}{}{}",
            name,
            ENTRY_SEPARATOR,
            at.to_rfc3339_opts(SecondsFormat::Micros, false)
        )
    }
}

#[async_trait]
impl AvailabilityLog for FileAvailabilityLog {
    async fn append(&self, name: &str, at: DateTime<Utc>) -> Result<(), Error> {
        let mut line = Self::format_entry(name, at);
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await.map_err(|e| {
            Error::availability_log(format!(
                "Failed to append to {}: {}",
                self.path.display(),
                e
            ))
        })?;
        file.flush().await.map_err(|e| {
            Error::availability_log(format!("Failed to flush {}: {}", self.path.display(), e))
        })?;

        tracing::trace!("Recorded {} in {}", name, self.path.display());
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        let mut file = self.file.lock().await;
        file.sync_all().await.map_err(|e| {
            Error::availability_log(format!("Failed to sync {}: {}", self.path.display(), e))
        })
    }
}
