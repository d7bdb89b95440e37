//! Document engine boundary.
//!
//! The external document engine owns format parsing and native resources;
//! deckbridge consumes it as an opaque capability set: open/create documents,
//! enumerate slides and shapes by index, read document-level properties,
//! materialize slides and text shapes, save, dispose. No format knowledge
//! crosses this boundary in either direction.
//!
//! Engine calls are the pipeline's only suspension points, and a single open
//! document is never touched concurrently: per-slide and per-shape operations
//! run strictly sequentially within one conversion.

mod memory;

pub use memory::{MemoryDocument, MemoryEngine, MemorySlide};

use crate::types::Geometry;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Output formats the engine can persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Pptx,
    Ppt,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Pptx => "pptx",
            SaveFormat::Ppt => "ppt",
        }
    }
}

/// Document-level properties read during the extraction phase.
#[derive(Debug, Clone, Default)]
pub struct DocumentProperties {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub revision: Option<u32>,
    /// Slide size in points (width, height).
    pub slide_size: (f64, f64),
}

/// A slide as reported by the engine, with shapes in index order.
#[derive(Debug, Clone, Default)]
pub struct RawSlide {
    pub index: usize,
    pub title: Option<String>,
    pub layout: Option<String>,
    pub background: Option<String>,
    pub shapes: Vec<RawShape>,
}

/// A shape as reported by the engine.
///
/// `kind` is the engine's own discriminator string; it is what the registry
/// resolves extractors by. Generic properties (geometry, name) are always
/// present; kind-specific fields are populated only when the engine exposes
/// that content.
#[derive(Debug, Clone, Default)]
pub struct RawShape {
    pub index: usize,
    pub name: Option<String>,
    pub kind: String,
    pub geometry: Geometry,
    pub text: Option<RawTextFrame>,
    pub chart: Option<RawChart>,
    pub table: Option<RawTable>,
    pub media: Option<RawMedia>,
    pub children: Vec<RawShape>,
}

/// Engine-side text content: paragraphs of formatted runs.
#[derive(Debug, Clone, Default)]
pub struct RawTextFrame {
    pub paragraphs: Vec<RawParagraph>,
}

#[derive(Debug, Clone, Default)]
pub struct RawParagraph {
    pub runs: Vec<RawRun>,
    pub alignment: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RawRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub font: Option<String>,
    pub size: Option<f64>,
}

/// Engine-side chart content.
#[derive(Debug, Clone, Default)]
pub struct RawChart {
    pub chart_type: String,
    pub series: Vec<(String, Vec<f64>)>,
    pub categories: Vec<String>,
    pub has_legend: bool,
}

/// Engine-side table content, row-major.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

/// Engine-side media reference.
#[derive(Debug, Clone, Default)]
pub struct RawMedia {
    pub media_type: String,
    pub source: Option<String>,
    pub alt_text: Option<String>,
}

/// The capability set deckbridge requires from its document engine.
#[async_trait]
pub trait DocumentEngine: Send + Sync {
    /// Engine implementation name, recorded in conversion provenance.
    fn name(&self) -> &str;

    /// Engine version, recorded in conversion provenance.
    fn version(&self) -> String;

    /// Open an existing document from a path.
    async fn open(&self, path: &Path) -> Result<Box<dyn EngineDocument>>;

    /// Create a new empty document. Engines conventionally seed it with one
    /// starter slide, which the reverse pipeline removes.
    async fn create(&self) -> Result<Box<dyn EngineDocument>>;
}

/// An open document handle. Not safe for concurrent mutation; the pipeline
/// serializes all access within one conversion.
#[async_trait]
pub trait EngineDocument: Send {
    async fn properties(&self) -> Result<DocumentProperties>;

    async fn slide_count(&self) -> Result<usize>;

    /// Read one slide with all of its shapes.
    async fn slide(&self, index: usize) -> Result<RawSlide>;

    /// Append a slide; returns its index.
    async fn add_slide(&mut self, title: Option<&str>, layout: Option<&str>) -> Result<usize>;

    async fn remove_slide(&mut self, index: usize) -> Result<()>;

    /// Create a text shape on a slide; returns the shape's index.
    async fn add_text_shape(&mut self, slide_index: usize, geometry: &Geometry, text: &str) -> Result<usize>;

    /// Persist the document; returns bytes written.
    async fn save(&mut self, path: &Path, format: SaveFormat) -> Result<u64>;

    /// Release native resources. Idempotent; must be called on both success
    /// and failure paths.
    async fn dispose(&mut self) -> Result<()>;
}
