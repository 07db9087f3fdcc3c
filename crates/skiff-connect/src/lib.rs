//! skiff-connect - transactional file-output sink for OSS-compatible
//! object storage
//!
//! The sink turns a stream of raw byte buffers, pushed by a host
//! data-pipeline engine, into a sequence of discrete objects in a bucket.
//! Each logical output partition is staged in a local temporary file and
//! uploaded under a deterministic key when the host signals the partition
//! complete; the per-task session coordinates commit and abort with the
//! host's transaction protocol and guarantees that no partial or
//! duplicate object survives a failure.
//!
//! # Architecture
//!
//! ```text
//! host coordinator ──▶ OssFileOutput ──▶ FileOutputSession  (one per task)
//!                                          │  staging: StagingFile
//!                                          │  naming:  KeyNamer
//!                                          └─ upload:  ObjectUploader ──▶ ObjectStoreClient
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use skiff_connect::{OssFileOutput, OssSinkConfig};
//!
//! let config: OssSinkConfig = serde_yaml::from_str(yaml)?;
//! let sink = OssFileOutput::new(config)?;   // all validation happens here
//!
//! let mut session = sink.open(task_index)?;
//! session.open_next_partition().await?;
//! session.append(&bytes)?;
//! session.finish().await?;
//! let report = session.commit()?;
//! ```
//!
//! Tasks run concurrently, one session each; within a session every
//! operation is strictly sequential. The transport behind the sessions is
//! the [`store::ObjectStoreClient`] trait; the built-in implementation
//! adapts the `object_store` crate, and hosts with a vendor SDK plug in
//! their own.

pub mod config;
pub mod error;
pub mod naming;
pub mod output;
pub mod session;
pub mod staging;
pub mod store;
pub mod types;
pub mod uploader;

pub use config::{CannedAcl, OssSinkConfig};
pub use error::{Result, SinkError};
pub use naming::{KeyNamer, SequenceFormat};
pub use output::OssFileOutput;
pub use session::{FileOutputSession, TaskReport};
pub use staging::StagingFile;
pub use store::{MemoryStore, ObjectStoreBackend, ObjectStoreClient, StoreError, StoreResult};
pub use types::SensitiveString;
pub use uploader::ObjectUploader;

// Re-export commonly used dependencies for client implementations
pub use async_trait::async_trait;
pub use bytes::Bytes;
