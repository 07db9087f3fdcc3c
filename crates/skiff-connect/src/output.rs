//! Host-facing sink surface
//!
//! The host engine's transaction coordinator drives this surface: build
//! the sink once per job (all validation happens there), open one session
//! per task, push bytes through the session lifecycle, and hand the
//! collected reports back to [`OssFileOutput::cleanup`].

use crate::config::OssSinkConfig;
use crate::error::Result;
use crate::naming::KeyNamer;
use crate::session::{FileOutputSession, TaskReport};
use crate::staging::StagingFile;
use crate::store::{ObjectStoreBackend, ObjectStoreClient};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// File-output sink for OSS-compatible object storage.
#[derive(Debug)]
pub struct OssFileOutput {
    config: Arc<OssSinkConfig>,
}

impl OssFileOutput {
    /// Validate the configuration and build the sink.
    ///
    /// Runs every configuration check up front, so a malformed sequence
    /// format or missing credential is a startup failure and never a
    /// runtime upload error.
    pub fn new(config: OssSinkConfig) -> Result<Self> {
        config.validate()?;
        if !config.canned_acl.is_default() {
            warn!(
                acl = config.canned_acl.as_str(),
                "Explicit canned ACL configured; the built-in transport cannot apply it. \
                 Supply an ACL-capable client via open_with_client or uploads will fail."
            );
        }
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &OssSinkConfig {
        &self.config
    }

    /// Verify the staging directory is writable before any task starts.
    ///
    /// Creates and deletes a probe file. No network I/O.
    pub fn check(&self) -> Result<()> {
        let probe = StagingFile::create(
            self.config.staging_dir.as_deref(),
            &self.config.staging_prefix,
        )?;
        probe.delete()
    }

    /// Open the session for one task.
    ///
    /// Each session gets a freshly built transport client; sessions never
    /// share a client handle.
    pub fn open(&self, task_index: u32) -> Result<FileOutputSession> {
        let client = Arc::new(ObjectStoreBackend::from_config(&self.config)?);
        self.open_with_client(task_index, client)
    }

    /// Open a session over a caller-supplied transport client.
    ///
    /// This is the seam for tests and for hosts whose vendor SDK
    /// implements [`ObjectStoreClient`] directly.
    pub fn open_with_client(
        &self,
        task_index: u32,
        client: Arc<dyn ObjectStoreClient>,
    ) -> Result<FileOutputSession> {
        let namer = KeyNamer::from_config(&self.config)?;
        info!(
            task = task_index,
            bucket = %self.config.bucket,
            "Opening task output session"
        );
        Ok(FileOutputSession::new(
            &self.config,
            namer,
            client,
            task_index,
        ))
    }

    /// Job-level hook invoked after all tasks have reported.
    ///
    /// Nothing to do today; successful task reports carry no payload.
    pub fn cleanup(&self, reports: &[TaskReport]) {
        debug!(tasks = reports.len(), "Job cleanup complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> OssSinkConfig {
        serde_yaml::from_str(
            r#"
access_key_id: test-key
access_key_secret: test-secret
bucket: exports
file_ext: ".csv"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_new_accepts_valid_config() {
        OssFileOutput::new(valid_config()).unwrap();
    }

    #[test]
    fn test_new_rejects_bad_sequence_format() {
        let mut config = valid_config();
        config.sequence_format = "%s".to_string();
        let err = OssFileOutput::new(config).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_new_rejects_empty_bucket() {
        let mut config = valid_config();
        config.bucket = String::new();
        assert!(OssFileOutput::new(config).is_err());
    }

    #[test]
    fn test_check_probes_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = valid_config();
        config.staging_dir = Some(dir.path().to_path_buf());

        let sink = OssFileOutput::new(config).unwrap();
        sink.check().unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_check_fails_on_missing_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = valid_config();
        config.staging_dir = Some(dir.path().join("missing"));

        let sink = OssFileOutput::new(config).unwrap();
        assert!(sink.check().is_err());
    }

    #[test]
    fn test_cleanup_accepts_reports() {
        let sink = OssFileOutput::new(valid_config()).unwrap();
        sink.cleanup(&[TaskReport::empty(), TaskReport::empty()]);
    }
}
