//! Persistence collaborators: design storage and image uploads.
//!
//! The editor core only talks to these traits. Designs travel as Scene Graph
//! JSON; exported artifacts and uploaded images are opaque byte blobs.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::scene::SceneGraph;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future returned by storage backends.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opaque handle to a stored artifact (export output, dieline, upload).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub key: String,
    pub mime: String,
    pub size: usize,
}

/// Backend that stores designs by id and artifacts by reference.
pub trait DesignStore: Send + Sync {
    fn save(&self, id: &str, design: &SceneGraph) -> BoxFuture<'_, StorageResult<()>>;

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SceneGraph>>;

    /// Deleting a missing design is not an error.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;

    fn save_artifact(&self, name: &str, bytes: Vec<u8>, mime: &str) -> BoxFuture<'_, StorageResult<ArtifactRef>>;

    fn load_artifact(&self, artifact: &ArtifactRef) -> BoxFuture<'_, StorageResult<Vec<u8>>>;
}

/// Service that publishes image bytes and returns a public URL for image payloads.
pub trait UploadService: Send + Sync {
    fn upload(&self, name: &str, bytes: Vec<u8>, mime: &str) -> BoxFuture<'_, StorageResult<String>>;
}

/// Make a display name safe for use inside an artifact key.
pub(crate) fn sanitize_key(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

/// Unique artifact key derived from a display name.
pub(crate) fn artifact_key(name: &str) -> String {
    format!("{}-{}", uuid::Uuid::new_v4().simple(), sanitize_key(name))
}

#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
