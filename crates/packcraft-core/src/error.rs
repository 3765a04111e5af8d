//! Error types for scene, dieline and pricing operations.

use crate::element::ElementId;
use thiserror::Error;

/// Errors raised by scene graph and editor session operations.
///
/// A failed operation never leaves a partial mutation behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    /// Geometry or payload rejected on creation or update.
    #[error("Invalid element: {0}")]
    InvalidElement(String),

    /// No element with this id exists in the graph.
    #[error("Element not found: {0}")]
    NotFound(ElementId),

    /// A document or payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SceneError {
    fn from(err: serde_json::Error) -> Self {
        SceneError::Serialization(err.to_string())
    }
}

/// Dieline input outside the supported domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DielineError {
    #[error("Invalid dimension {name}: {value}")]
    InvalidDimension { name: &'static str, value: f64 },

    #[error("Unsupported shape family: {0}")]
    UnsupportedShape(String),
}

/// Rejected pricing input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceError {
    #[error("Invalid price input: {0}")]
    InvalidInput(String),
}

/// Editor configuration that could not be read or is out of range.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;
