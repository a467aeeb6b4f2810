//! Submission guard: the durable at-most-once marker.
//!
//! The guard is a single existence-checked file. Its presence means "this
//! installation already submitted"; its absence means submission may be
//! offered. It is written only after a confirmed successful upload, so a
//! crash mid-transmission leaves the guard unmarked and the user is asked
//! again on the next run. The marker never transitions back.

use census_common::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Marker file name inside the state directory.
pub const MARKER_FILENAME: &str = "submitted";

/// Application directory name under the platform state root.
const APP_DIR: &str = "census";

/// Durable at-most-once submission marker.
#[derive(Debug, Clone)]
pub struct SubmissionGuard {
    path: PathBuf,
}

impl SubmissionGuard {
    /// Guard backed by a marker file inside `state_dir`.
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: state_dir.into().join(MARKER_FILENAME),
        }
    }

    /// Default state directory (`~/.local/share/census` on Linux).
    pub fn default_state_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| Error::Config("cannot determine the state directory".into()))
    }

    /// Whether this installation already submitted. Pure read.
    pub fn is_already_submitted(&self) -> bool {
        self.path.exists()
    }

    /// Persist the marker. Call only after a confirmed successful upload.
    ///
    /// The file body is the submission time as an RFC 3339 stamp, a courtesy
    /// for humans poking at the state directory; readers must only test for
    /// existence. An already-present marker is left untouched.
    pub fn mark_submitted(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Guard {
                path: self.path.clone(),
                source: e,
            })?;
        }
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(mut file) => {
                let stamp = chrono::Utc::now().to_rfc3339();
                writeln!(file, "{stamp}").map_err(|e| Error::Guard {
                    path: self.path.clone(),
                    source: e,
                })?;
                info!(path = %self.path.display(), "submission marker created");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(Error::Guard {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    /// Path of the marker file.
    pub fn marker_path(&self) -> &Path {
        &self.path
    }
}
