//! Packcraft Core Library
//!
//! Data structures and algorithms of the Packcraft packaging design editor:
//! scene graph, undo/redo history, snapping, dieline nets and pricing.

pub mod align;
pub mod config;
pub mod dieline;
pub mod element;
pub mod error;
pub mod geometry;
pub mod history;
pub mod price;
pub mod scene;
pub mod session;
pub mod storage;

pub use align::{Aligner, Alignment, SnapMode, SnapOutcome, align_rects, snap_angle, snap_to_grid};
pub use config::EditorConfig;
pub use dieline::{DielineLine, DielineNet, DielineSpec, LineKind, ShapeFamily, generate};
pub use element::{
    Element, ElementId, ElementKind, ElementPatch, ElementSpec, ElementStyle, ImagePayload, Payload, Rgba,
    ShapeGeometry, ShapePayload, TextPayload, Transform,
};
pub use error::{ConfigError, DielineError, PriceError, SceneError, SceneResult};
pub use history::{ActionKind, HistoryEntry, HistoryManager, MAX_HISTORY};
pub use price::{PriceQuote, PriceRequest, PricingRules, quote};
pub use scene::SceneGraph;
pub use session::{EditorSession, FrameThrottle};
pub use storage::{ArtifactRef, DesignStore, FileStorage, MemoryStorage, StorageError, UploadService};
