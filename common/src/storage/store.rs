use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::{path::Path as ObjPath, ObjectStore};

use crate::utils::config::{AppConfig, StorageKind};

pub type DynStore = Arc<dyn ObjectStore>;

/// Storage manager over the configured object-store backend. One blob per
/// uploaded file, keyed by its content id.
#[derive(Clone)]
pub struct StorageManager {
    store: DynStore,
    backend_kind: StorageKind,
}

impl StorageManager {
    /// Create a new StorageManager with the specified configuration.
    pub async fn new(cfg: &AppConfig) -> object_store::Result<Self> {
        let backend_kind = cfg.storage.clone();
        let store = create_storage_backend(cfg).await?;

        Ok(Self {
            store,
            backend_kind,
        })
    }

    /// Create a StorageManager with a custom storage backend.
    ///
    /// This method is useful for testing scenarios where you want to inject
    /// a specific storage backend.
    pub fn with_backend(store: DynStore, backend_kind: StorageKind) -> Self {
        Self {
            store,
            backend_kind,
        }
    }

    /// In-memory storage, isolated per manager. The default for tests.
    pub fn memory() -> Self {
        Self::with_backend(Arc::new(InMemory::new()), StorageKind::Memory)
    }

    /// Get the storage backend kind.
    pub fn backend_kind(&self) -> &StorageKind {
        &self.backend_kind
    }

    /// Store bytes at the specified location.
    pub async fn put(&self, location: &str, data: Bytes) -> object_store::Result<()> {
        let path = ObjPath::from(location);
        let payload = object_store::PutPayload::from_bytes(data);
        self.store.put(&path, payload).await.map(|_| ())
    }

    /// Retrieve bytes from the specified location, buffered in memory.
    pub async fn get(&self, location: &str) -> object_store::Result<Bytes> {
        let path = ObjPath::from(location);
        let result = self.store.get(&path).await?;
        result.bytes().await
    }

    /// Check if an object exists at the specified location.
    pub async fn exists(&self, location: &str) -> object_store::Result<bool> {
        let path = ObjPath::from(location);
        self.store
            .head(&path)
            .await
            .map(|_| true)
            .or_else(|e| match e {
                object_store::Error::NotFound { .. } => Ok(false),
                _ => Err(e),
            })
    }

    /// Delete all objects below the specified prefix.
    pub async fn delete_prefix(&self, prefix: &str) -> object_store::Result<()> {
        let prefix_path = ObjPath::from(prefix);
        let locations = self
            .store
            .list(Some(&prefix_path))
            .map_ok(|m| m.location)
            .boxed();
        self.store
            .delete_stream(locations)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(())
    }

    /// List all objects below the specified prefix.
    pub async fn list(
        &self,
        prefix: Option<&str>,
    ) -> object_store::Result<Vec<object_store::ObjectMeta>> {
        let prefix_path = prefix.map(ObjPath::from);
        self.store.list(prefix_path.as_ref()).try_collect().await
    }
}

/// Create a storage backend based on configuration.
async fn create_storage_backend(cfg: &AppConfig) -> object_store::Result<DynStore> {
    match cfg.storage {
        StorageKind::Local => {
            let base = resolve_base_dir(cfg);
            if !base.exists() {
                tokio::fs::create_dir_all(&base).await.map_err(|e| {
                    object_store::Error::Generic {
                        store: "LocalFileSystem",
                        source: e.into(),
                    }
                })?;
            }
            let store = LocalFileSystem::new_with_prefix(base)?;
            Ok(Arc::new(store))
        }
        StorageKind::Memory => Ok(Arc::new(InMemory::new())),
        StorageKind::S3 => {
            let bucket = cfg
                .s3_bucket
                .as_deref()
                .ok_or_else(|| object_store::Error::Generic {
                    store: "S3",
                    source: "s3_bucket must be set when storage = \"s3\"".into(),
                })?;
            let store = AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .build()?;
            Ok(Arc::new(store))
        }
    }
}

/// Resolve the absolute base directory used for local storage from config.
///
/// If `data_dir` is relative, it is resolved against the current working directory.
pub fn resolve_base_dir(cfg: &AppConfig) -> PathBuf {
    if cfg.data_dir.starts_with('/') {
        PathBuf::from(&cfg.data_dir)
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(&cfg.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_config_memory() -> AppConfig {
        AppConfig {
            storage: StorageKind::Memory,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_storage_manager_memory_basic_operations() {
        let cfg = test_config_memory();
        let storage = StorageManager::new(&cfg)
            .await
            .expect("create storage manager");

        let location = "11111111-2222-3333-4444-555555555555";
        let data = b"test data for storage manager";

        // Test put and get
        storage
            .put(location, Bytes::from(data.to_vec()))
            .await
            .expect("put");
        let retrieved = storage.get(location).await.expect("get");
        assert_eq!(retrieved.as_ref(), data);

        // Test exists
        assert!(storage.exists(location).await.expect("exists check"));

        // Test delete
        storage.delete_prefix(location).await.expect("delete");
        assert!(!storage
            .exists(location)
            .await
            .expect("exists check after delete"));
    }

    #[tokio::test]
    async fn test_storage_manager_local_basic_operations() {
        let base = format!("/tmp/willow_storage_test_{}", Uuid::new_v4());
        let cfg = AppConfig {
            storage: StorageKind::Local,
            data_dir: base.clone(),
            ..Default::default()
        };
        let storage = StorageManager::new(&cfg)
            .await
            .expect("create storage manager");

        let location = "local-test-object";
        let data = b"test data for local storage";

        storage
            .put(location, Bytes::from(data.to_vec()))
            .await
            .expect("put");
        let retrieved = storage.get(location).await.expect("get");
        assert_eq!(retrieved.as_ref(), data);

        assert!(storage.exists(location).await.expect("exists check"));

        storage.delete_prefix(location).await.expect("delete");
        assert!(!storage
            .exists(location)
            .await
            .expect("exists check after delete"));

        // Clean up
        let _ = tokio::fs::remove_dir_all(&base).await;
    }

    #[tokio::test]
    async fn test_storage_manager_overwrite_persists_latest() {
        let storage = StorageManager::memory();

        let location = "persistence-test";
        let data1 = b"first data";
        let data2 = b"second data";

        storage
            .put(location, Bytes::from(data1.to_vec()))
            .await
            .expect("put first");
        storage
            .put(location, Bytes::from(data2.to_vec()))
            .await
            .expect("put second");

        let retrieved = storage.get(location).await.expect("get");
        assert_eq!(retrieved.as_ref(), data2);
    }

    #[tokio::test]
    async fn test_storage_manager_list_operations() {
        let storage = StorageManager::memory();

        for (location, data) in [
            ("uploads/file1", b"content1".as_slice()),
            ("uploads/file2", b"content2".as_slice()),
            ("other/file3", b"content3".as_slice()),
        ] {
            storage
                .put(location, Bytes::from(data.to_vec()))
                .await
                .expect("put");
        }

        let all_files = storage.list(None).await.expect("list all");
        assert_eq!(all_files.len(), 3);

        let uploads = storage.list(Some("uploads/")).await.expect("list uploads");
        assert_eq!(uploads.len(), 2);

        let empty = storage
            .list(Some("nonexistent/"))
            .await
            .expect("list nonexistent");
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_s3_backend_requires_bucket() {
        let cfg = AppConfig {
            storage: StorageKind::S3,
            s3_bucket: None,
            ..Default::default()
        };

        assert!(StorageManager::new(&cfg).await.is_err());
    }

    #[tokio::test]
    async fn test_storage_manager_error_handling() {
        let storage = StorageManager::memory();

        // Getting a non-existent object errors; existence check does not.
        assert!(storage.get("nonexistent").await.is_err());
        assert!(!storage.exists("nonexistent").await.expect("exists check"));
    }
}
