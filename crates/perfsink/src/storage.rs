//! Run file storage for perfsink.
//!
//! Accepted payloads are appended, byte for byte, to a file named after the
//! Unix second they arrived in. Writers to the same file are serialized with
//! an exclusive advisory lock, so concurrent submissions within one second
//! land one after another and never interleave.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::payload::{Payload, Rejection};

/// A run file: where it lives and which second it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFile {
    /// Full path of the file.
    pub path: PathBuf,
    /// Unix timestamp, in seconds, encoded in the file name.
    pub timestamp: i64,
}

/// What happened to a submitted body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The payload was appended to a run file.
    Stored {
        /// The file the payload went to.
        file: RunFile,
        /// Number of bytes appended.
        bytes: usize,
    },
    /// The payload was not accepted and nothing was written.
    Dropped(Rejection),
}

impl IngestOutcome {
    /// Whether the payload ended up on disk.
    #[must_use]
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }
}

/// Writes accepted payloads into timestamped run files.
#[derive(Debug, Clone)]
pub struct RunStore {
    dir: PathBuf,
    file_prefix: String,
    file_extension: String,
}

impl RunStore {
    /// Open a store for the configured run directory.
    ///
    /// Creates the directory when `create_dir` is set. Otherwise the directory
    /// is expected to exist; if it doesn't, appends fail with
    /// [`Error::RunFileOpen`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryCreate`] if the directory cannot be created.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let dir = config.dir.clone();

        if config.create_dir && !dir.is_dir() {
            std::fs::create_dir_all(&dir).map_err(|source| Error::DirectoryCreate {
                path: dir.clone(),
                source,
            })?;
            info!("Created run directory {}", dir.display());
        }

        debug!("Run store ready at {}", dir.display());
        Ok(Self {
            dir,
            file_prefix: config.file_prefix.clone(),
            file_extension: config.file_extension.clone(),
        })
    }

    /// Directory run files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The run file for a given second.
    #[must_use]
    pub fn file_for(&self, timestamp: i64) -> RunFile {
        let name = format!("{}{timestamp}{}", self.file_prefix, self.file_extension);
        RunFile {
            path: self.dir.join(name),
            timestamp,
        }
    }

    /// Check a raw body and append it to the current second's run file.
    ///
    /// Rejected bodies are dropped without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error only when an accepted payload could not be written.
    pub fn ingest(&self, body: &[u8]) -> Result<IngestOutcome> {
        self.ingest_at(body, Utc::now().timestamp())
    }

    /// Read a body to the end and ingest it, as the one-shot stdin mode does.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the reader fails, or an error when an accepted
    /// payload could not be written.
    pub fn ingest_reader(&self, mut reader: impl Read) -> Result<IngestOutcome> {
        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;
        self.ingest(&body)
    }

    /// Like [`ingest`](Self::ingest), with the timestamp supplied by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error only when an accepted payload could not be written.
    pub fn ingest_at(&self, body: &[u8], timestamp: i64) -> Result<IngestOutcome> {
        let payload = match Payload::parse(body) {
            Ok(payload) => payload,
            Err(rejection) => {
                debug!(reason = %rejection, bytes = body.len(), "Dropping payload");
                return Ok(IngestOutcome::Dropped(rejection));
            }
        };

        let file = self.append_at(payload.as_bytes(), timestamp)?;
        info!(path = %file.path.display(), bytes = payload.len(), "Stored performance run");
        Ok(IngestOutcome::Stored {
            file,
            bytes: payload.len(),
        })
    }

    /// Append bytes to the current second's run file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, locked or written.
    pub fn append(&self, bytes: &[u8]) -> Result<RunFile> {
        self.append_at(bytes, Utc::now().timestamp())
    }

    /// Append bytes to the run file for `timestamp` under an exclusive lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, locked or written.
    pub fn append_at(&self, bytes: &[u8], timestamp: i64) -> Result<RunFile> {
        let file = self.file_for(timestamp);
        let mut guard = LockedAppend::acquire(&file.path)?;
        guard.write_all(bytes)?;
        Ok(file)
    }
}

/// An open run file holding an exclusive lock until dropped.
///
/// The lock is released on every exit path, including early returns after a
/// failed write.
#[derive(Debug)]
pub struct LockedAppend {
    path: PathBuf,
    file: File,
}

impl LockedAppend {
    /// Open `path` for appending, creating it if absent, and block until the
    /// exclusive lock is held.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RunFileOpen`] or [`Error::RunFileLock`].
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| Error::RunFileOpen {
                path: path.to_path_buf(),
                source,
            })?;

        file.lock_exclusive().map_err(|source| Error::RunFileLock {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Append all of `bytes` and flush them to the file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RunFileWrite`] if the write or flush fails.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.file
            .write_all(bytes)
            .and_then(|()| self.file.flush())
            .map_err(|source| Error::RunFileWrite {
                path: self.path.clone(),
                source,
            })
    }
}

impl Drop for LockedAppend {
    fn drop(&mut self) {
        // Closing the descriptor releases it as well
        if let Err(err) = FileExt::unlock(&self.file) {
            debug!("Failed to unlock {}: {}", self.path.display(), err);
        }
    }
}
