//! Upload of completed staging files
//!
//! The put and the access-control call form one logical operation: if
//! either fails, the whole upload is reported as failed and the caller
//! must not advance partition state. No retry is attempted here; retry
//! policy, if any, belongs to the caller.

use crate::config::CannedAcl;
use crate::error::{Result, SinkError};
use crate::store::ObjectStoreClient;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error};

/// Uploads a completed staging file to its remote key.
pub struct ObjectUploader {
    client: Arc<dyn ObjectStoreClient>,
    bucket: String,
    acl: CannedAcl,
}

impl ObjectUploader {
    pub fn new(client: Arc<dyn ObjectStoreClient>, bucket: impl Into<String>, acl: CannedAcl) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            acl,
        }
    }

    /// Put the staged file's bytes under `key` and apply the configured
    /// access policy. Returns the number of bytes uploaded.
    pub async fn upload(&self, local: &Path, key: &str) -> Result<u64> {
        let data = tokio::fs::read(local).await.map_err(SinkError::Io)?;
        let len = data.len() as u64;
        debug!(key, bytes = len, bucket = %self.bucket, "Uploading staged object");

        self.client
            .put_object(key, Bytes::from(data))
            .await
            .map_err(|e| {
                error!(key, bucket = %self.bucket, "Failed to put object: {}", e);
                SinkError::upload(key, e.to_string())
            })?;

        self.client
            .set_object_acl(key, self.acl)
            .await
            .map_err(|e| {
                error!(key, bucket = %self.bucket, "Failed to apply object ACL: {}", e);
                SinkError::upload(key, format!("acl update failed: {e}"))
            })?;

        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError, StoreResult};
    use async_trait::async_trait;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn staged(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[tokio::test]
    async fn test_upload_puts_bytes_and_acl() {
        let store = Arc::new(MemoryStore::new());
        let uploader = ObjectUploader::new(store.clone(), "exports", CannedAcl::Private);
        let file = staged(b"payload");

        let bytes = uploader.upload(file.path(), "data/.000.00.csv").await.unwrap();
        assert_eq!(bytes, 7);

        let object = store.get("data/.000.00.csv").await.unwrap();
        assert_eq!(object.data.as_ref(), b"payload");
        assert_eq!(object.acl, CannedAcl::Private);
    }

    #[tokio::test]
    async fn test_missing_local_file_is_io_error() {
        let store = Arc::new(MemoryStore::new());
        let uploader = ObjectUploader::new(store, "exports", CannedAcl::Default);
        let err = uploader
            .upload(Path::new("/nonexistent/staging-file"), "k")
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
    }

    struct AclFailingStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl ObjectStoreClient for AclFailingStore {
        async fn put_object(&self, key: &str, data: Bytes) -> StoreResult<()> {
            self.inner.put_object(key, data).await
        }

        async fn set_object_acl(&self, _key: &str, _acl: CannedAcl) -> StoreResult<()> {
            Err(StoreError::Backend("acl endpoint unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_acl_failure_fails_the_whole_upload() {
        let store = Arc::new(AclFailingStore {
            inner: MemoryStore::new(),
        });
        let uploader = ObjectUploader::new(store, "exports", CannedAcl::Private);
        let file = staged(b"x");

        let err = uploader.upload(file.path(), "data/.000.00.csv").await.unwrap_err();
        match err {
            SinkError::Upload { key, message } => {
                assert_eq!(key, "data/.000.00.csv");
                assert!(message.contains("acl"));
            }
            other => panic!("expected upload error, got {other:?}"),
        }
    }
}
