//! Scoped per-run working directory
//!
//! The directory is removed when the guard drops, so every exit path after
//! creation cleans up, including errors and panics. On the success path call
//! [`WorkDir::close`] to remove it explicitly and observe failures.

use crate::error::{Error, FS_CREATE_WORKDIR, FS_REMOVE_WORKDIR, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Name prefix of working directories
pub const WORKDIR_PREFIX: &str = "knownCanonical.";

/// A uniquely named scratch directory that removes itself on drop
#[derive(Debug)]
pub struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    /// Create a fresh working directory inside `parent`
    ///
    /// The name carries a random suffix, so concurrent runs sharing a parent
    /// never collide.
    pub fn create_in(parent: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| Error::filesystem(FS_CREATE_WORKDIR, parent, e))?;
        debug!(path = ?dir.path(), "created working directory");
        Ok(Self { dir })
    }

    /// Path of the working directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the working directory
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove the directory and everything in it
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|e| Error::filesystem(FS_REMOVE_WORKDIR, &path, e))?;
        debug!(?path, "removed working directory");
        Ok(())
    }

    /// Remove the directory, logging instead of failing
    ///
    /// Used once the output is already in place: a leftover scratch
    /// directory does not invalidate the result.
    pub fn close_or_warn(self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to remove working directory");
        }
    }
}
