//! Per-task partition output session
//!
//! One session exists per parallel task. The host pushes raw byte buffers
//! into the currently open partition; closing a partition uploads its
//! staging file under a deterministic key and advances the partition
//! counter. The session is an explicit state machine:
//!
//! ```text
//!          open_next_partition            close_partition (upload ok)
//!   Idle ───────────────────────▶ Open ───────────────────────────▶ Idle
//!     │                            │
//!     │ abort                      │ write/upload failure, abort
//!     ▼                            ▼
//!   Failed ◀──────────────────── Failed          (terminal)
//! ```
//!
//! Local cleanup is unconditional: whatever a close or abort decides, the
//! staging file is gone afterwards. A cleanup failure never masks an
//! upload error.

use crate::config::OssSinkConfig;
use crate::error::{Result, SinkError};
use crate::naming::KeyNamer;
use crate::staging::StagingFile;
use crate::store::ObjectStoreClient;
use crate::uploader::ObjectUploader;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Acknowledgment returned by a session on successful commit.
///
/// Carries no payload today; the metadata map is the slot future commit
/// metadata goes into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskReport {
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl TaskReport {
    /// The empty report.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
enum SessionState {
    /// No partition open
    Idle,
    /// A partition is staged and accepting writes
    Open(StagingFile),
    /// Terminal; entered on any fatal error or abort
    Failed,
}

/// State machine driving staging, upload and cleanup for one task.
///
/// All operations are strictly sequential; the async methods complete the
/// underlying write or network call before returning and never spawn
/// internal work. The transport client is owned exclusively by this
/// session.
pub struct FileOutputSession {
    task_index: u32,
    partition_index: u32,
    partitions_uploaded: u64,
    bytes_uploaded: u64,
    state: SessionState,
    namer: KeyNamer,
    staging_dir: Option<PathBuf>,
    staging_prefix: String,
    uploader: ObjectUploader,
}

impl FileOutputSession {
    pub(crate) fn new(
        config: &OssSinkConfig,
        namer: KeyNamer,
        client: Arc<dyn ObjectStoreClient>,
        task_index: u32,
    ) -> Self {
        Self {
            task_index,
            partition_index: 0,
            partitions_uploaded: 0,
            bytes_uploaded: 0,
            state: SessionState::Idle,
            namer,
            staging_dir: config.staging_dir.clone(),
            staging_prefix: config.staging_prefix.clone(),
            uploader: ObjectUploader::new(client, config.bucket.clone(), config.canned_acl),
        }
    }

    /// The fixed task index this session writes for.
    pub fn task_index(&self) -> u32 {
        self.task_index
    }

    /// Index the next opened partition will upload under.
    pub fn partition_index(&self) -> u32 {
        self.partition_index
    }

    /// Close the current partition, if any, and stage the next one.
    ///
    /// Doubles as the implicit close between partitions, so the host never
    /// needs a separate close call mid-task.
    pub async fn open_next_partition(&mut self) -> Result<()> {
        self.close_partition().await?;

        let key = self
            .namer
            .object_key(self.task_index, self.partition_index);
        info!(task = self.task_index, key = %key, "Staging OSS object");

        match StagingFile::create(self.staging_dir.as_deref(), &self.staging_prefix) {
            Ok(file) => {
                self.state = SessionState::Open(file);
                Ok(())
            }
            Err(err) => {
                self.state = SessionState::Failed;
                Err(err)
            }
        }
    }

    /// Append raw bytes to the currently open partition.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let file = match &mut self.state {
            SessionState::Open(file) => file,
            SessionState::Idle => {
                return Err(SinkError::state(
                    "append called before open_next_partition",
                ))
            }
            SessionState::Failed => {
                return Err(SinkError::state("append called on a failed session"))
            }
        };
        if let Err(err) = file.append(bytes) {
            self.discard_staged();
            return Err(err);
        }
        Ok(())
    }

    /// Upload and release the currently open partition.
    ///
    /// A no-op when no partition is open, so a redundant close never
    /// re-uploads. On upload failure the staging file is still deleted and
    /// the session fails; the remote side holds no partial object because
    /// the put is single shot.
    pub async fn close_partition(&mut self) -> Result<()> {
        let file = match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Idle => return Ok(()),
            SessionState::Failed => {
                self.state = SessionState::Failed;
                return Err(SinkError::state(
                    "close_partition called on a failed session",
                ));
            }
            SessionState::Open(file) => file,
        };

        let key = self
            .namer
            .object_key(self.task_index, self.partition_index);
        let uploaded = self.uploader.upload(file.path(), &key).await;
        let cleanup = file.delete();

        match uploaded {
            Ok(bytes) => {
                self.partition_index += 1;
                self.partitions_uploaded += 1;
                self.bytes_uploaded += bytes;
                info!(key = %key, bytes, "Uploaded OSS object");
                if let Err(err) = cleanup {
                    self.state = SessionState::Failed;
                    return Err(err);
                }
                Ok(())
            }
            Err(err) => {
                self.state = SessionState::Failed;
                if let Err(del) = cleanup {
                    warn!(key = %key, "Failed to remove staging file after upload error: {}", del);
                }
                Err(err)
            }
        }
    }

    /// Host-invoked at normal end of task. Equivalent to closing the
    /// current partition.
    pub async fn finish(&mut self) -> Result<()> {
        self.close_partition().await?;
        info!(
            task = self.task_index,
            partitions = self.partitions_uploaded,
            bytes = self.bytes_uploaded,
            "Task output finished"
        );
        Ok(())
    }

    /// Discard any staged data without uploading.
    ///
    /// Safe to call repeatedly and in any state. Delete problems are
    /// logged rather than raised; the task is already tearing down.
    pub fn abort(&mut self) {
        match std::mem::replace(&mut self.state, SessionState::Failed) {
            SessionState::Open(file) => {
                warn!(
                    task = self.task_index,
                    "Aborting task output, discarding staged partition"
                );
                if let Err(err) = file.delete() {
                    warn!("Failed to remove staging file during abort: {}", err);
                }
            }
            SessionState::Idle | SessionState::Failed => {}
        }
    }

    /// Acknowledge a finished task. Performs no I/O.
    pub fn commit(&self) -> Result<TaskReport> {
        match self.state {
            SessionState::Idle => Ok(TaskReport::empty()),
            SessionState::Open(_) => Err(SinkError::state(
                "commit called while a partition is still open",
            )),
            SessionState::Failed => Err(SinkError::state("commit called on a failed session")),
        }
    }

    fn discard_staged(&mut self) {
        if let SessionState::Open(file) = std::mem::replace(&mut self.state, SessionState::Failed)
        {
            if let Err(err) = file.delete() {
                warn!("Failed to remove staging file after write error: {}", err);
            }
        }
    }
}
