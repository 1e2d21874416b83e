//! Error types for known-canonical
//!
//! This module provides the error taxonomy for the pipeline:
//! - Stage-specific error types (fetch, malformed rows, filesystem)
//! - A top-level [`Error`] that every stage converts into
//! - Stage attribution and machine-readable error codes for reporting

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Stage;

/// Result type alias for known-canonical operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for known-canonical
///
/// Every variant is fatal: the pipeline stops at the first error and no
/// output file is left at the final location.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// Downloading one of the upstream tables failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// A table row had too few columns
    #[error("malformed row: {0}")]
    MalformedRow(#[from] MalformedRowError),

    /// gzip stream or text decoding failed
    #[error("failed to decompress {path}: {reason}")]
    Decompress {
        /// The compressed file being read
        path: PathBuf,
        /// The underlying decoder error
        reason: String,
    },

    /// Working directory or output file operation failed
    #[error("filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// A blocking pipeline task panicked or was cancelled
    #[error("pipeline task failed: {0}")]
    Task(String),
}

/// Download-related errors
#[derive(Debug, Error)]
pub enum FetchError {
    /// Server answered with a non-2xx status
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// The requested URL
        url: String,
        /// The HTTP status code returned
        status: u16,
    },

    /// Connection, TLS, timeout or body read failure
    #[error("failed to fetch {url}: {reason}")]
    Transport {
        /// The requested URL
        url: String,
        /// The reason the transfer failed
        reason: String,
    },

    /// Transfer succeeded but produced no bytes
    #[error("empty response body from {url}")]
    Empty {
        /// The requested URL
        url: String,
    },
}

/// A row with fewer columns than the projection needs
#[derive(Debug, Error)]
#[error("{table} line {line}: found {found} column(s), need at least {required}")]
pub struct MalformedRowError {
    /// Table name (e.g., "knownGene")
    pub table: &'static str,
    /// 1-based line number in the decompressed table
    pub line: usize,
    /// Number of tab-separated columns on the line
    pub found: usize,
    /// Minimum number of columns the projection requires
    pub required: usize,
}

/// Filesystem errors with the path and operation that failed
#[derive(Debug, Error)]
#[error("failed to {operation} {path}: {source}")]
pub struct FilesystemError {
    /// The path being operated on
    pub path: PathBuf,
    /// What was being done (e.g., "create working directory in")
    pub operation: &'static str,
    /// The underlying I/O error
    #[source]
    pub source: std::io::Error,
}

impl FilesystemError {
    /// Build an error for `operation` on `path`
    pub fn new(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            operation,
            source,
        }
    }
}

impl Error {
    /// Shorthand for a filesystem error
    pub fn filesystem(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Error::Filesystem(FilesystemError::new(operation, path, source))
    }

    /// Shorthand for a configuration error on a named key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// The pipeline stage this error belongs to
    ///
    /// Filesystem errors can happen while setting up, writing or cleaning up,
    /// so they are attributed by operation. A failed blocking task covers
    /// everything from decompress to write and is attributed to the stage it
    /// starts with.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Config { .. } => Stage::Setup,
            Error::Fetch(_) => Stage::Fetch,
            Error::MalformedRow(_) | Error::Decompress { .. } => Stage::Decompress,
            Error::Filesystem(e) => match e.operation {
                FS_CREATE_WORKDIR => Stage::Setup,
                FS_REMOVE_WORKDIR => Stage::Cleanup,
                FS_WRITE_DOWNLOAD => Stage::Fetch,
                FS_OPEN_TABLE => Stage::Decompress,
                _ => Stage::Write,
            },
            Error::Task(_) => Stage::Decompress,
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Fetch(e) => match e {
                FetchError::Status { .. } => "fetch_status",
                FetchError::Transport { .. } => "fetch_transport",
                FetchError::Empty { .. } => "fetch_empty",
            },
            Error::MalformedRow(_) => "malformed_row",
            Error::Decompress { .. } => "decompress_error",
            Error::Filesystem(_) => "filesystem_error",
            Error::Task(_) => "task_error",
        }
    }
}

/// Operation label: creating the working directory
pub const FS_CREATE_WORKDIR: &str = "create working directory in";
/// Operation label: removing the working directory
pub const FS_REMOVE_WORKDIR: &str = "remove working directory";
/// Operation label: writing a downloaded table to disk
pub const FS_WRITE_DOWNLOAD: &str = "write download to";
/// Operation label: opening a downloaded table for decoding
pub const FS_OPEN_TABLE: &str = "open table";
/// Operation label: writing the staged output
pub const FS_WRITE_OUTPUT: &str = "write output to";
/// Operation label: moving the staged output into place
pub const FS_PERSIST_OUTPUT: &str = "move output to";
/// Operation label: re-reading the written output for the summary
pub const FS_READ_OUTPUT: &str = "read back output";
