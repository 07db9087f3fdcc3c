//! Object-storage transport seam
//!
//! [`ObjectStoreClient`] is the narrow interface the uploader drives: a
//! single-shot put plus an access-control call. The production
//! implementation adapts the `object_store` crate; hosts whose vendor SDK
//! exposes richer semantics (per-object ACL grants) implement the trait
//! directly and hand their client to the sink at session-open time.

use crate::config::{CannedAcl, OssSinkConfig};
use crate::error::SinkError;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Transport-level failure, independent of the session that triggered it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store rejected or failed the call
    #[error("{0}")]
    Backend(String),

    /// The transport has no way to express the requested policy
    #[error("access control '{0}' is not supported by this transport")]
    AclUnsupported(&'static str),
}

/// Result type alias for transport calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Client for a single bucket of an object store.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Store the full payload under `key` in a single shot. The object
    /// either exists completely afterwards or not at all.
    async fn put_object(&self, key: &str, data: Bytes) -> StoreResult<()>;

    /// Apply a canned access-control policy to an already-uploaded object.
    async fn set_object_acl(&self, key: &str, acl: CannedAcl) -> StoreResult<()>;
}

/// Production transport over the `object_store` crate.
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreBackend {
    /// Build a client for the configured S3-compatible OSS endpoint.
    pub fn from_config(config: &OssSinkConfig) -> crate::error::Result<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket)
            .with_region(region_from_endpoint(&config.endpoint))
            .with_endpoint(&config.endpoint)
            .with_access_key_id(config.access_key_id.expose_secret())
            .with_secret_access_key(config.access_key_secret.expose_secret())
            .with_virtual_hosted_style_request(true);

        if config.endpoint.starts_with("http://") {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| SinkError::Config(format!("failed to create OSS client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
        })
    }

    /// Wrap an already-built `object_store` instance.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ObjectStoreClient for ObjectStoreBackend {
    async fn put_object(&self, key: &str, data: Bytes) -> StoreResult<()> {
        let path = ObjectPath::from(key);
        self.store
            .put(&path, PutPayload::from(data))
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn set_object_acl(&self, _key: &str, acl: CannedAcl) -> StoreResult<()> {
        // `default` inherits the bucket ACL, which a plain put already
        // carries; there is nothing to apply. Explicit grants cannot be
        // expressed through `object_store` and must fail loudly rather
        // than be dropped.
        if acl.is_default() {
            Ok(())
        } else {
            Err(StoreError::AclUnsupported(acl.as_str()))
        }
    }
}

/// Region for request signing. OSS endpoints embed the region in the first
/// host label (`oss-ap-northeast-1.aliyuncs.com`).
fn region_from_endpoint(endpoint: &str) -> String {
    endpoint
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split(['/', ':'])
        .next()
        .unwrap_or("")
        .split('.')
        .next()
        .filter(|label| !label.is_empty())
        .unwrap_or("auto")
        .to_string()
}

/// An object held by [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// The uploaded payload
    pub data: Bytes,
    /// The access policy currently applied
    pub acl: CannedAcl,
}

/// In-memory bucket for tests and local development.
///
/// Records every put in arrival order so tests can assert on upload
/// ordering as well as content.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, StoredObject>>,
    put_log: RwLock<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch an object by key.
    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// All keys currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Keys in the order they were put.
    pub async fn puts(&self) -> Vec<String> {
        self.put_log.read().await.clone()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the bucket holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStoreClient for MemoryStore {
    async fn put_object(&self, key: &str, data: Bytes) -> StoreResult<()> {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data,
                acl: CannedAcl::Default,
            },
        );
        self.put_log.write().await.push(key.to_string());
        Ok(())
    }

    async fn set_object_acl(&self, key: &str, acl: CannedAcl) -> StoreResult<()> {
        match self.objects.write().await.get_mut(key) {
            Some(object) => {
                object.acl = acl;
                Ok(())
            }
            None => Err(StoreError::Backend(format!("no such object: {key}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_endpoint() {
        assert_eq!(
            region_from_endpoint("http://oss-ap-northeast-1.aliyuncs.com"),
            "oss-ap-northeast-1"
        );
        assert_eq!(
            region_from_endpoint("https://oss-eu-central-1.aliyuncs.com/"),
            "oss-eu-central-1"
        );
        assert_eq!(region_from_endpoint("http://localhost:9000"), "localhost");
        assert_eq!(region_from_endpoint(""), "auto");
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        store
            .put_object("data/.000.00.csv", Bytes::from_static(b"abc"))
            .await
            .unwrap();
        let object = store.get("data/.000.00.csv").await.unwrap();
        assert_eq!(object.data.as_ref(), b"abc");
        assert_eq!(object.acl, CannedAcl::Default);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_store_acl_update() {
        let store = MemoryStore::new();
        store
            .put_object("k", Bytes::from_static(b"x"))
            .await
            .unwrap();
        store.set_object_acl("k", CannedAcl::Private).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().acl, CannedAcl::Private);
    }

    #[tokio::test]
    async fn test_memory_store_acl_on_missing_object() {
        let store = MemoryStore::new();
        let err = store
            .set_object_acl("missing", CannedAcl::Private)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn test_memory_store_records_put_order() {
        let store = MemoryStore::new();
        store.put_object("b", Bytes::from_static(b"1")).await.unwrap();
        store.put_object("a", Bytes::from_static(b"2")).await.unwrap();
        assert_eq!(store.puts().await, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(store.keys().await, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_backend_put_over_in_memory_object_store() {
        let inner: Arc<dyn ObjectStore> = Arc::new(object_store::memory::InMemory::new());
        let backend = ObjectStoreBackend::new(inner.clone());
        backend
            .put_object("tmp.000.00.csv", Bytes::from_static(b"payload"))
            .await
            .unwrap();
        let fetched = inner
            .get(&ObjectPath::from("tmp.000.00.csv"))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(fetched.as_ref(), b"payload");
    }

    #[tokio::test]
    async fn test_backend_default_acl_is_noop() {
        let inner: Arc<dyn ObjectStore> = Arc::new(object_store::memory::InMemory::new());
        let backend = ObjectStoreBackend::new(inner);
        backend
            .set_object_acl("k", CannedAcl::Default)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_backend_explicit_acl_unsupported() {
        let inner: Arc<dyn ObjectStore> = Arc::new(object_store::memory::InMemory::new());
        let backend = ObjectStoreBackend::new(inner);
        let err = backend
            .set_object_acl("k", CannedAcl::PublicRead)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AclUnsupported("public-read")));
    }
}
