//! In-memory storage implementation.

use super::{ArtifactRef, BoxFuture, DesignStore, StorageError, StorageResult, UploadService, artifact_key};
use crate::scene::SceneGraph;
use std::collections::HashMap;
use std::sync::RwLock;

/// Public URL prefix for uploads held in memory.
pub const MEMORY_UPLOAD_BASE: &str = "memory://uploads/";

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    designs: RwLock<HashMap<String, SceneGraph>>,
    artifacts: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_error(e: impl std::fmt::Display) -> StorageError {
        StorageError::Other(format!("Lock error: {e}"))
    }

    fn put_artifact(&self, name: &str, bytes: Vec<u8>, mime: &str) -> StorageResult<ArtifactRef> {
        let artifact = ArtifactRef {
            key: artifact_key(name),
            mime: mime.to_string(),
            size: bytes.len(),
        };
        self.artifacts
            .write()
            .map_err(Self::lock_error)?
            .insert(artifact.key.clone(), bytes);
        Ok(artifact)
    }
}

impl DesignStore for MemoryStorage {
    fn save(&self, id: &str, design: &SceneGraph) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let design = design.clone();
        Box::pin(async move {
            let mut designs = self.designs.write().map_err(Self::lock_error)?;
            designs.insert(id, design);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SceneGraph>> {
        let id = id.to_string();
        Box::pin(async move {
            let designs = self.designs.read().map_err(Self::lock_error)?;
            designs.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut designs = self.designs.write().map_err(Self::lock_error)?;
            designs.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let designs = self.designs.read().map_err(Self::lock_error)?;
            let mut ids: Vec<String> = designs.keys().cloned().collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let designs = self.designs.read().map_err(Self::lock_error)?;
            Ok(designs.contains_key(&id))
        })
    }

    fn save_artifact(&self, name: &str, bytes: Vec<u8>, mime: &str) -> BoxFuture<'_, StorageResult<ArtifactRef>> {
        let result = self.put_artifact(name, bytes, mime);
        Box::pin(async move { result })
    }

    fn load_artifact(&self, artifact: &ArtifactRef) -> BoxFuture<'_, StorageResult<Vec<u8>>> {
        let key = artifact.key.clone();
        Box::pin(async move {
            let artifacts = self.artifacts.read().map_err(Self::lock_error)?;
            artifacts.get(&key).cloned().ok_or(StorageError::NotFound(key))
        })
    }
}

impl UploadService for MemoryStorage {
    fn upload(&self, name: &str, bytes: Vec<u8>, mime: &str) -> BoxFuture<'_, StorageResult<String>> {
        let result = self
            .put_artifact(name, bytes, mime)
            .map(|artifact| format!("{MEMORY_UPLOAD_BASE}{}", artifact.key));
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementSpec, Transform};
    use crate::storage::block_on;

    fn design() -> SceneGraph {
        let mut graph = SceneGraph::new(400.0, 300.0);
        graph
            .add(ElementSpec::text(Transform::new(10.0, 10.0, 100.0, 30.0), "Organic Tea"))
            .unwrap();
        graph
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let graph = design();

        block_on(storage.save("test", &graph)).unwrap();
        let loaded = block_on(storage.load("test")).unwrap();

        assert_eq!(loaded, graph);
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load("nonexistent"));

        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let storage = MemoryStorage::new();

        assert!(!block_on(storage.exists("test")).unwrap());
        block_on(storage.save("test", &design())).unwrap();
        assert!(block_on(storage.exists("test")).unwrap());

        block_on(storage.delete("test")).unwrap();
        block_on(storage.delete("test")).unwrap();
        assert!(!block_on(storage.exists("test")).unwrap());
    }

    #[test]
    fn test_list_sorted() {
        let storage = MemoryStorage::new();
        block_on(storage.save("doc2", &design())).unwrap();
        block_on(storage.save("doc1", &design())).unwrap();

        assert_eq!(block_on(storage.list()).unwrap(), vec!["doc1", "doc2"]);
    }

    #[test]
    fn test_artifacts() {
        let storage = MemoryStorage::new();
        let artifact = block_on(storage.save_artifact("net.svg", b"<svg/>".to_vec(), "image/svg+xml")).unwrap();
        assert_eq!(artifact.size, 6);
        assert_eq!(artifact.mime, "image/svg+xml");
        assert_eq!(block_on(storage.load_artifact(&artifact)).unwrap(), b"<svg/>");

        let bogus = ArtifactRef {
            key: "missing".to_string(),
            ..artifact
        };
        assert!(matches!(block_on(storage.load_artifact(&bogus)), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_upload_returns_url() {
        let storage = MemoryStorage::new();
        let url = block_on(storage.upload("logo.png", vec![1, 2, 3], "image/png")).unwrap();
        assert!(url.starts_with(MEMORY_UPLOAD_BASE));
        assert!(url.ends_with("logo.png"));
    }
}
