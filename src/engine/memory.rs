//! In-memory document engine.
//!
//! Reference implementation of the engine boundary, used throughout the test
//! suites and as a template for real engine integrations. Documents are
//! seeded by path; `save` writes a JSON snapshot so tests can assert on
//! persisted output without a native engine.

use super::{
    DocumentEngine, DocumentProperties, EngineDocument, RawSlide, SaveFormat,
};
use crate::types::Geometry;
use crate::{DeckbridgeError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A slide stored by the memory engine.
#[derive(Debug, Clone, Default)]
pub struct MemorySlide {
    pub title: Option<String>,
    pub layout: Option<String>,
    pub background: Option<String>,
    pub shapes: Vec<super::RawShape>,
    /// Simulate a corrupt slide: reads of this slide fail.
    pub fail_on_read: bool,
}

/// A document stored by the memory engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pub properties: DocumentProperties,
    pub slides: Vec<MemorySlide>,
}

impl MemoryDocument {
    pub fn new(title: &str) -> Self {
        Self {
            properties: DocumentProperties {
                title: Some(title.to_string()),
                slide_size: (960.0, 540.0),
                ..Default::default()
            },
            slides: Vec::new(),
        }
    }

    pub fn with_slide(mut self, slide: MemorySlide) -> Self {
        self.slides.push(slide);
        self
    }
}

/// In-memory [`DocumentEngine`]. Cloning shares the seeded document store.
#[derive(Clone, Default)]
pub struct MemoryEngine {
    store: Arc<RwLock<HashMap<PathBuf, MemoryDocument>>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document so a later `open(path)` finds it.
    pub fn seed(&self, path: impl Into<PathBuf>, doc: MemoryDocument) {
        self.store.write().insert(path.into(), doc);
    }
}

#[async_trait]
impl DocumentEngine for MemoryEngine {
    fn name(&self) -> &str {
        "memory-engine"
    }

    fn version(&self) -> String {
        "1.0.0".to_string()
    }

    async fn open(&self, path: &Path) -> Result<Box<dyn EngineDocument>> {
        let doc = self
            .store
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| DeckbridgeError::engine(format!("no document at {}", path.display())))?;
        Ok(Box::new(OpenMemoryDocument {
            doc,
            disposed: false,
        }))
    }

    async fn create(&self) -> Result<Box<dyn EngineDocument>> {
        // New documents carry the conventional starter slide.
        let doc = MemoryDocument::new("").with_slide(MemorySlide::default());
        Ok(Box::new(OpenMemoryDocument {
            doc,
            disposed: false,
        }))
    }
}

struct OpenMemoryDocument {
    doc: MemoryDocument,
    disposed: bool,
}

impl OpenMemoryDocument {
    fn check_open(&self) -> Result<()> {
        if self.disposed {
            return Err(DeckbridgeError::engine("document handle already disposed"));
        }
        Ok(())
    }
}

#[async_trait]
impl EngineDocument for OpenMemoryDocument {
    async fn properties(&self) -> Result<DocumentProperties> {
        self.check_open()?;
        Ok(self.doc.properties.clone())
    }

    async fn slide_count(&self) -> Result<usize> {
        self.check_open()?;
        Ok(self.doc.slides.len())
    }

    async fn slide(&self, index: usize) -> Result<RawSlide> {
        self.check_open()?;
        let slide = self
            .doc
            .slides
            .get(index)
            .ok_or_else(|| DeckbridgeError::engine(format!("slide index {} out of range", index)))?;

        if slide.fail_on_read {
            return Err(DeckbridgeError::engine(format!("slide {} data corrupted", index)));
        }

        Ok(RawSlide {
            index,
            title: slide.title.clone(),
            layout: slide.layout.clone(),
            background: slide.background.clone(),
            shapes: slide.shapes.clone(),
        })
    }

    async fn add_slide(&mut self, title: Option<&str>, layout: Option<&str>) -> Result<usize> {
        self.check_open()?;
        self.doc.slides.push(MemorySlide {
            title: title.map(str::to_string),
            layout: layout.map(str::to_string),
            ..Default::default()
        });
        Ok(self.doc.slides.len() - 1)
    }

    async fn remove_slide(&mut self, index: usize) -> Result<()> {
        self.check_open()?;
        if index >= self.doc.slides.len() {
            return Err(DeckbridgeError::engine(format!("slide index {} out of range", index)));
        }
        self.doc.slides.remove(index);
        Ok(())
    }

    async fn add_text_shape(&mut self, slide_index: usize, geometry: &Geometry, text: &str) -> Result<usize> {
        self.check_open()?;
        let slide = self
            .doc
            .slides
            .get_mut(slide_index)
            .ok_or_else(|| DeckbridgeError::engine(format!("slide index {} out of range", slide_index)))?;

        let index = slide.shapes.len();
        slide.shapes.push(super::RawShape {
            index,
            name: None,
            kind: "textbox".to_string(),
            geometry: *geometry,
            text: Some(super::RawTextFrame {
                paragraphs: vec![super::RawParagraph {
                    runs: vec![super::RawRun {
                        text: text.to_string(),
                        ..Default::default()
                    }],
                    alignment: None,
                }],
            }),
            ..Default::default()
        });
        Ok(index)
    }

    async fn save(&mut self, path: &Path, format: SaveFormat) -> Result<u64> {
        self.check_open()?;

        // JSON snapshot stands in for a native file; enough for callers to
        // assert on slide/shape counts and text content.
        let snapshot = serde_json::json!({
            "format": format.extension(),
            "title": self.doc.properties.title,
            "slides": self.doc.slides.iter().map(|s| {
                serde_json::json!({
                    "title": s.title,
                    "texts": s.shapes.iter().filter_map(|sh| {
                        sh.text.as_ref().map(|t| {
                            t.paragraphs.iter()
                                .flat_map(|p| p.runs.iter().map(|r| r.text.clone()))
                                .collect::<Vec<_>>()
                                .join("")
                        })
                    }).collect::<Vec<_>>(),
                })
            }).collect::<Vec<_>>(),
        });

        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        tokio::fs::write(path, &bytes).await?;
        Ok(bytes.len() as u64)
    }

    async fn dispose(&mut self) -> Result<()> {
        self.disposed = true;
        Ok(())
    }
}
