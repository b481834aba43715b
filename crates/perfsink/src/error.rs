//! Error types for perfsink.
//!
//! Rejected payloads are not errors: they are dropped silently and show up as
//! [`IngestOutcome::Dropped`](crate::storage::IngestOutcome::Dropped). Everything
//! in this module is a failure the host has to deal with.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for perfsink operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to create the run directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to open a run file for appending.
    #[error("failed to open run file {path}: {source}")]
    RunFileOpen {
        /// Path to the run file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to take the exclusive lock on a run file.
    #[error("failed to lock run file {path}: {source}")]
    RunFileLock {
        /// Path to the run file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to append a payload to a run file.
    #[error("failed to write run file {path}: {source}")]
    RunFileWrite {
        /// Path to the run file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Server Errors ===
    /// The bind address could not be parsed.
    #[error("invalid bind address '{addr}'")]
    InvalidBindAddress {
        /// The address as configured.
        addr: String,
    },

    /// Failed to bind the HTTP listener.
    #[error("failed to bind HTTP server to {addr}: {source}")]
    ServerBind {
        /// Address we tried to bind.
        addr: SocketAddr,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === I/O Errors ===
    /// File system or stream operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for perfsink operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error happened while touching a run file or its directory.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::DirectoryCreate { .. }
                | Self::RunFileOpen { .. }
                | Self::RunFileLock { .. }
                | Self::RunFileWrite { .. }
        )
    }
}
