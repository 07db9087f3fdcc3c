//! Local staging files for not-yet-uploaded partitions
//!
//! A staging file holds the bytes of the currently open partition until
//! the host signals completion and the file is uploaded. A session owns at
//! most one staging file at a time, and the file must disappear on every
//! exit path: successful upload, failed write, failed upload, abort.

use crate::error::{Result, SinkError};
use std::io::Write;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};
use tracing::debug;

/// A local temporary file backing one in-flight partition.
///
/// Created empty with a unique suffix under the configured directory (or
/// the platform temp dir). [`delete`](Self::delete) is the primary removal
/// path; dropping an undeleted staging file also removes it, so a
/// panicking task cannot leak temp files.
#[derive(Debug)]
pub struct StagingFile {
    file: NamedTempFile,
}

impl StagingFile {
    /// Create a new empty staging file.
    pub fn create(dir_override: Option<&Path>, name_prefix: &str) -> Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(name_prefix);
        let file = match dir_override {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(SinkError::Io)?;
        debug!(path = %file.path().display(), "Created staging file");
        Ok(Self { file })
    }

    /// Where the staged bytes live on disk.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Append bytes to the staging file.
    ///
    /// On failure the file still exists with partial content; the caller
    /// is responsible for deleting it before propagating the error.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.as_file_mut().write_all(bytes).map_err(SinkError::Io)
    }

    /// Close the handle, then remove the file.
    ///
    /// Removal of a file that is already gone counts as success, so this
    /// can sit on every failure and success path without extra guards.
    pub fn delete(self) -> Result<()> {
        let path = self.file.path().to_path_buf();
        match self.file.close() {
            Ok(()) => {
                debug!(path = %path.display(), "Removed staging file");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SinkError::Io(err)),
        }
    }
}
