//! Export errors.

use packcraft_core::SceneError;
use thiserror::Error;

/// Export pipeline errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExportError {
    /// The request combines options the target format cannot honour.
    #[error("Unsupported export: {0}")]
    Unsupported(String),
    /// An element payload could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(String),
    /// Rasterization or encoding failed.
    #[error("Render failed: {0}")]
    Render(String),
    /// A newer export request replaced this one.
    #[error("Export superseded by a newer request")]
    Superseded,
}

impl From<SceneError> for ExportError {
    fn from(e: SceneError) -> Self {
        match e {
            SceneError::Serialization(msg) | SceneError::InvalidElement(msg) => ExportError::Serialization(msg),
            SceneError::NotFound(id) => ExportError::Serialization(format!("missing element {id}")),
        }
    }
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
