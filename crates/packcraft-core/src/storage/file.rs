//! File-based storage implementation.

use super::{ArtifactRef, BoxFuture, DesignStore, StorageError, StorageResult, artifact_key, sanitize_key};
use crate::scene::SceneGraph;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use std::fs;
use std::path::{Path, PathBuf};

const ARTIFACT_DIR: &str = "artifacts";

/// File stem for a design id. URL-safe base64 keeps distinct ids distinct and
/// maps back to the original id in [`FileStorage`]'s listing.
fn encode_id(id: &str) -> String {
    URL_SAFE_NO_PAD.encode(id)
}

fn decode_id(stem: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(stem).ok()?;
    String::from_utf8(bytes).ok()
}

/// Stores designs as JSON files in a directory, artifacts in an `artifacts/`
/// subdirectory.
pub struct FileStorage {
    /// Base directory for design storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        fs::create_dir_all(base_path.join(ARTIFACT_DIR))
            .map_err(|e| StorageError::Io(format!("Failed to create storage directory: {e}")))?;
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/packcraft/designs/`
    /// On Windows: `%LOCALAPPDATA%\packcraft\designs\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("packcraft").join("designs"))
    }

    fn design_path(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", encode_id(id)))
    }

    fn artifact_path(&self, key: &str) -> PathBuf {
        self.base_path.join(ARTIFACT_DIR).join(sanitize_key(key))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl DesignStore for FileStorage {
    fn save(&self, id: &str, design: &SceneGraph) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.design_path(id);
        let json = design.to_json().map_err(|e| StorageError::Serialization(e.to_string()));

        Box::pin(async move {
            fs::write(&path, json?)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {e}", path.display())))?;
            log::debug!("Saved design to {}", path.display());
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SceneGraph>> {
        let path = self.design_path(id);
        let id = id.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id));
            }
            let json = fs::read_to_string(&path)
                .map_err(|e| StorageError::Io(format!("Failed to read {}: {e}", path.display())))?;
            SceneGraph::from_json(&json)
                .map_err(|e| StorageError::Serialization(format!("Failed to parse {}: {e}", path.display())))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.design_path(id);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path)
                    .map_err(|e| StorageError::Io(format!("Failed to delete {}: {e}", path.display())))?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            let entries =
                fs::read_dir(&base).map_err(|e| StorageError::Io(format!("Failed to read directory: {e}")))?;

            let mut ids: Vec<String> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| {
                    let stem = path.file_stem()?.to_str()?;
                    let id = decode_id(stem);
                    if id.is_none() {
                        log::warn!("Skipping unrecognized file {}", path.display());
                    }
                    id
                })
                .collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.design_path(id);
        Box::pin(async move { Ok(path.exists()) })
    }

    fn save_artifact(&self, name: &str, bytes: Vec<u8>, mime: &str) -> BoxFuture<'_, StorageResult<ArtifactRef>> {
        let artifact = ArtifactRef {
            key: artifact_key(name),
            mime: mime.to_string(),
            size: bytes.len(),
        };
        let path = self.artifact_path(&artifact.key);

        Box::pin(async move {
            fs::write(&path, &bytes)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {e}", path.display())))?;
            log::debug!("Stored {} byte artifact at {}", artifact.size, path.display());
            Ok(artifact)
        })
    }

    fn load_artifact(&self, artifact: &ArtifactRef) -> BoxFuture<'_, StorageResult<Vec<u8>>> {
        let path = self.artifact_path(&artifact.key);
        let key = artifact.key.clone();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(key));
            }
            fs::read(&path).map_err(|e| StorageError::Io(format!("Failed to read {}: {e}", path.display())))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementSpec, ShapePayload, Transform};
    use crate::storage::block_on;
    use tempfile::tempdir;

    fn design() -> SceneGraph {
        let mut graph = SceneGraph::new(500.0, 500.0);
        graph
            .add(ElementSpec::shape(Transform::new(0.0, 0.0, 50.0, 50.0), ShapePayload::ellipse()))
            .unwrap();
        graph
    }

    #[test]
    fn test_file_storage_save_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let graph = design();

        block_on(storage.save("test-doc", &graph)).unwrap();
        let loaded = block_on(storage.load("test-doc")).unwrap();

        assert_eq!(loaded, graph);
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_rejects_corrupt_design() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        fs::write(dir.path().join(format!("{}.json", encode_id("broken"))), "{\"width\": 10}").unwrap();

        let result = block_on(storage.load("broken"));
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_file_storage_list_skips_artifacts() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("doc2", &design())).unwrap();
        block_on(storage.save("doc1", &design())).unwrap();
        block_on(storage.save_artifact("preview.json", b"{}".to_vec(), "application/json")).unwrap();

        assert_eq!(block_on(storage.list()).unwrap(), vec!["doc1", "doc2"]);
    }

    #[test]
    fn test_file_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("test", &design())).unwrap();
        assert!(block_on(storage.exists("test")).unwrap());

        block_on(storage.delete("test")).unwrap();
        assert!(!block_on(storage.exists("test")).unwrap());
    }

    #[test]
    fn test_file_storage_sanitizes_id() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let graph = design();

        block_on(storage.save("tea/box:front*", &graph)).unwrap();
        let loaded = block_on(storage.load("tea/box:front*")).unwrap();
        assert_eq!(loaded, graph);
        assert_eq!(block_on(storage.list()).unwrap(), vec!["tea/box:front*"]);
    }

    #[test]
    fn test_file_storage_keeps_similar_ids_apart() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let (large, small) = (design(), SceneGraph::new(100.0, 100.0));

        block_on(storage.save("a/b", &large)).unwrap();
        block_on(storage.save("a_b", &small)).unwrap();

        assert_eq!(block_on(storage.load("a/b")).unwrap(), large);
        assert_eq!(block_on(storage.load("a_b")).unwrap(), small);
        assert_eq!(block_on(storage.list()).unwrap(), vec!["a/b", "a_b"]);

        block_on(storage.delete("a_b")).unwrap();
        assert!(block_on(storage.exists("a/b")).unwrap());
    }

    #[test]
    fn test_file_storage_list_skips_foreign_files() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        block_on(storage.save("doc", &design())).unwrap();
        fs::write(dir.path().join("notes!.json"), "{}").unwrap();

        assert_eq!(block_on(storage.list()).unwrap(), vec!["doc"]);
    }

    #[test]
    fn test_artifact_round_trip() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let artifact = block_on(storage.save_artifact("proof.pdf", vec![37, 80, 68, 70], "application/pdf")).unwrap();
        assert_eq!(block_on(storage.load_artifact(&artifact)).unwrap(), vec![37, 80, 68, 70]);
    }
}
