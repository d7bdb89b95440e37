//! Deckbridge - Presentation to Universal Schema Conversion
//!
//! Deckbridge converts presentation documents into a canonical, versioned,
//! engine-independent schema and back, tolerating partial failures along the
//! way. Format parsing stays with an external document engine; deckbridge
//! owns the pipeline, the extractor plugin system, and the schema contract.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use deckbridge::{Converter, MemoryEngine};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn run() -> deckbridge::Result<()> {
//! let converter = Converter::with_defaults(Arc::new(MemoryEngine::new()));
//! let output = converter.convert_to_schema(Path::new("deck.pptx")).await?;
//! println!("converted {} slides", output.schema.slides.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): forward/reverse conversion pipelines, batch
//!   processing, configuration loading
//! - **Plugin System** (`plugins`): extractor contract, the kind registry,
//!   and the security-gated extension loader
//! - **Extractors** (`extractors`): built-in per-kind shape extractors plus
//!   the always-available fallback
//! - **Validator** (`validator`): structural schema validation with
//!   deterministic auto-fix and compliance reporting
//! - **Engine Boundary** (`engine`): the async capability set required from
//!   the external document engine, with an in-memory reference engine
//!
//! # Failure Discipline
//!
//! A failing shape degrades to a generic payload; a failing slide becomes a
//! marked placeholder; a failing extension is rejected without touching the
//! others; a non-compliant document is repaired rather than refused. The
//! blast radius of any single bad item is that item.

#![deny(unsafe_code)]

pub mod core;
pub mod engine;
pub mod error;
pub mod extractors;
pub mod plugins;
pub mod types;
pub mod validator;

pub use crate::core::{convert_batch, BatchConfig, ConversionConfig, Converter, ExtensionPolicy};
pub use engine::{DocumentEngine, EngineDocument, MemoryDocument, MemoryEngine, MemorySlide, SaveFormat};
pub use error::{DeckbridgeError, Result};
pub use plugins::{
    ExtensionManager, ExtractorRegistry, LoadReport, Plugin, ShapeExtractor,
};
pub use types::{
    BatchItem, ConversionStats, ForwardOutput, Progress, ReverseOutput, SchemaDocument, Shape,
    ShapeKind, ShapePayload, Slide, SCHEMA_VERSION,
};
pub use validator::{ComplianceReport, SchemaValidator, ValidationOptions, ValidationOutcome};
