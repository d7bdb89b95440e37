//! Conversion orchestration.
//!
//! [`Converter`] runs the forward pipeline (presentation to schema document)
//! and the reverse pipeline (schema document to presentation) against an
//! engine and an extractor registry it does not own. Three forward phases
//! run in order:
//!
//! 1. extraction: open the document and read its properties (fail-fast);
//! 2. slide processing: convert each slide, substituting a placeholder for
//!    failed slides when fallback-on-error is enabled;
//! 3. assembly: build the schema document and stamp provenance.
//!
//! The whole forward run races a single deadline. The engine document is
//! disposed on success and failure alike; on timeout the in-flight engine
//! call is cancelled at its next suspension point and the handle drops.

use crate::core::config::ConversionConfig;
use crate::engine::{DocumentEngine, DocumentProperties, EngineDocument, RawSlide, SaveFormat};
use crate::plugins::extractor::ExtractionContext;
use crate::plugins::registry::ExtractorRegistry;
use crate::types::{
    Background, ConversionProvenance, ConversionStats, DocumentMetadata, ForwardOutput, Geometry,
    Paragraph, Progress, ProgressFn, ReverseOutput, SchemaDocument, Shape, ShapeKind, ShapePayload,
    Slide, TextRun, SCHEMA_VERSION,
};
use crate::{DeckbridgeError, Result};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Runs forward and reverse conversions.
pub struct Converter {
    engine: Arc<dyn DocumentEngine>,
    registry: Arc<ExtractorRegistry>,
    config: ConversionConfig,
}

impl Converter {
    pub fn new(
        engine: Arc<dyn DocumentEngine>,
        registry: Arc<ExtractorRegistry>,
        config: ConversionConfig,
    ) -> Self {
        Self {
            engine,
            registry,
            config,
        }
    }

    /// Converter with the built-in extractor set and default configuration.
    pub fn with_defaults(engine: Arc<dyn DocumentEngine>) -> Self {
        Self::new(engine, Arc::new(ExtractorRegistry::with_builtins()), ConversionConfig::default())
    }

    pub fn registry(&self) -> &Arc<ExtractorRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert a presentation to a schema document.
    ///
    /// # Errors
    ///
    /// - `Engine` if the source cannot be opened or read (fail-fast in the
    ///   extraction phase);
    /// - `Conversion` if a slide fails with fallback-on-error disabled;
    /// - `Timeout` if the configured deadline elapses.
    pub async fn convert_to_schema(&self, source: &Path) -> Result<ForwardOutput> {
        self.convert_to_schema_with_progress(source, None).await
    }

    /// Forward conversion with an optional progress callback.
    ///
    /// Progress is reported per slide, and only for documents with at least
    /// `progress_threshold` slides; short conversions finish before a
    /// listener could react.
    #[tracing::instrument(skip(self, progress))]
    pub async fn convert_to_schema_with_progress(
        &self,
        source: &Path,
        progress: Option<&ProgressFn>,
    ) -> Result<ForwardOutput> {
        let seconds = self.config.timeout_secs;
        tokio::time::timeout(Duration::from_secs(seconds), self.forward(source, progress))
            .await
            .map_err(|_| {
                warn!(source = %source.display(), seconds, "conversion deadline elapsed");
                DeckbridgeError::Timeout { seconds }
            })?
    }

    async fn forward(&self, source: &Path, progress: Option<&ProgressFn>) -> Result<ForwardOutput> {
        let total_start = Instant::now();

        // Extraction phase: any failure here aborts the conversion.
        let mut doc = self.engine.open(source).await?;
        let outcome = self.forward_phases(doc.as_mut(), source, progress, total_start).await;

        if let Err(e) = doc.dispose().await {
            warn!(error = %e, "engine document disposal failed");
        }
        outcome
    }

    async fn forward_phases(
        &self,
        doc: &mut dyn EngineDocument,
        source: &Path,
        progress: Option<&ProgressFn>,
        total_start: Instant,
    ) -> Result<ForwardOutput> {
        let extraction_start = Instant::now();
        let properties = doc.properties().await?;
        let slide_total = doc.slide_count().await?;
        let extraction_phase_ms = extraction_start.elapsed().as_millis() as u64;

        debug!(source = %source.display(), slides = slide_total, "extraction phase complete");

        // Slide processing phase.
        let slide_start = Instant::now();
        let report_progress = slide_total >= self.config.progress_threshold;
        let mut slides = Vec::with_capacity(slide_total);
        let mut stats = ConversionStats {
            slide_count: slide_total,
            extraction_phase_ms,
            ..Default::default()
        };

        for index in 0..slide_total {
            match doc.slide(index).await {
                Ok(raw) => {
                    let slide = self.convert_slide(raw, &mut stats)?;
                    slides.push(slide);
                }
                Err(e) => {
                    if !self.config.fallback_on_error {
                        return Err(DeckbridgeError::conversion(
                            format!("slide {} failed: {}", index, e),
                            "slide-processing",
                        ));
                    }
                    warn!(slide = index, error = %e, "slide failed; substituting placeholder");
                    slides.push(placeholder_slide(index, &e.to_string()));
                    stats.fallback_slides += 1;
                }
            }

            if report_progress {
                if let Some(callback) = progress {
                    callback(Progress {
                        current: index + 1,
                        total: slide_total,
                    });
                }
            }
        }
        stats.slide_phase_ms = slide_start.elapsed().as_millis() as u64;

        // Assembly phase.
        let assembly_start = Instant::now();
        let conversion_id = Uuid::new_v4().to_string();
        let schema = self.assemble(source, &properties, slides, &conversion_id, total_start);
        stats.assembly_phase_ms = assembly_start.elapsed().as_millis() as u64;
        stats.total_ms = total_start.elapsed().as_millis() as u64;

        info!(
            conversion_id = %conversion_id,
            slides = stats.slide_count,
            shapes = stats.shape_count,
            fallback_slides = stats.fallback_slides,
            degraded_shapes = stats.degraded_shapes,
            elapsed_ms = stats.total_ms,
            "forward conversion complete"
        );

        Ok(ForwardOutput {
            schema,
            conversion_id,
            stats,
        })
    }

    /// Convert one engine slide, degrading failed shapes to the fallback
    /// payload when fallback-on-error is enabled.
    fn convert_slide(&self, raw: RawSlide, stats: &mut ConversionStats) -> Result<Slide> {
        let ctx = ExtractionContext {
            slide_index: raw.index,
            ..Default::default()
        };

        let mut shapes = Vec::with_capacity(raw.shapes.len());
        for (position, raw_shape) in raw.shapes.iter().enumerate() {
            let extractor = self.registry.resolve(&raw_shape.kind);
            let mut result = extractor.extract(raw_shape, &ctx);

            if !result.success {
                if !self.config.fallback_on_error {
                    return Err(DeckbridgeError::extraction(format!(
                        "shape {} on slide {} failed: {}",
                        raw_shape.index,
                        raw.index,
                        result.error.as_deref().unwrap_or("unknown error")
                    )));
                }
                debug!(
                    slide = raw.index,
                    shape = raw_shape.index,
                    extractor = extractor.name(),
                    error = result.error.as_deref().unwrap_or(""),
                    "extraction failed; degrading shape"
                );
                result = self.registry.fallback().extract(raw_shape, &ctx);
                stats.degraded_shapes += 1;
            }

            let payload = result.payload.unwrap_or(ShapePayload::Generic {
                source_kind: raw_shape.kind.clone(),
                name: raw_shape.name.clone(),
            });

            shapes.push(Shape {
                id: format!("shape-{}-{}", raw.index, position),
                index: position,
                name: raw_shape.name.clone(),
                kind: ShapeKind::parse(&raw_shape.kind),
                geometry: raw_shape.geometry,
                payload,
            });
            stats.shape_count += 1;
        }

        Ok(Slide {
            id: format!("slide-{}", raw.index),
            index: raw.index,
            title: raw.title,
            layout: raw.layout,
            background: raw.background.as_deref().map(parse_background),
            transition: None,
            shapes,
        })
    }

    fn assemble(
        &self,
        source: &Path,
        properties: &DocumentProperties,
        slides: Vec<Slide>,
        conversion_id: &str,
        total_start: Instant,
    ) -> SchemaDocument {
        let title = properties
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| {
                source
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "Untitled".to_string());

        SchemaDocument {
            schema_version: SCHEMA_VERSION.to_string(),
            metadata: DocumentMetadata {
                title,
                author: properties.author.clone(),
                subject: properties.subject.clone(),
                created_at: properties.created_at,
                modified_at: properties.modified_at,
                revision: properties.revision,
                slide_count: slides.len(),
            },
            slides,
            provenance: Some(ConversionProvenance {
                conversion_id: conversion_id.to_string(),
                source: source.display().to_string(),
                engine: self.engine.name().to_string(),
                engine_version: self.engine.version(),
                converted_at: Utc::now(),
                elapsed_ms: total_start.elapsed().as_millis() as u64,
            }),
        }
    }

    /// Convert a schema document back to a presentation file.
    ///
    /// Only text-bearing shapes are materialized; other payloads are
    /// accepted and counted as skipped, so a document survives a partial
    /// round-trip without error. A shape the engine refuses is logged and
    /// counted as failed; a slide the engine refuses is skipped when
    /// fallback-on-error is enabled and aborts the conversion otherwise.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the document has no slides;
    /// - `Engine` if document creation fails, or a slide fails with
    ///   fallback-on-error disabled.
    pub async fn convert_from_schema(
        &self,
        schema: &SchemaDocument,
        output: &Path,
        format: SaveFormat,
    ) -> Result<ReverseOutput> {
        self.convert_from_schema_with_progress(schema, output, format, None).await
    }

    /// Reverse conversion with an optional progress callback.
    ///
    /// Progress is reported per schema slide under the same
    /// `progress_threshold` gate as the forward direction.
    #[tracing::instrument(skip(self, schema, progress))]
    pub async fn convert_from_schema_with_progress(
        &self,
        schema: &SchemaDocument,
        output: &Path,
        format: SaveFormat,
        progress: Option<&ProgressFn>,
    ) -> Result<ReverseOutput> {
        if schema.slides.is_empty() {
            return Err(DeckbridgeError::InvalidInput(
                "schema document has no slides".to_string(),
            ));
        }

        let mut doc = self.engine.create().await?;
        let outcome = self.reverse_phases(doc.as_mut(), schema, output, format, progress).await;

        if let Err(e) = doc.dispose().await {
            warn!(error = %e, "engine document disposal failed");
        }
        outcome
    }

    async fn reverse_phases(
        &self,
        doc: &mut dyn EngineDocument,
        schema: &SchemaDocument,
        output: &Path,
        format: SaveFormat,
        progress: Option<&ProgressFn>,
    ) -> Result<ReverseOutput> {
        // Drop the starter slide the engine seeded so the schema slides
        // land at indices 0..n.
        doc.remove_slide(0).await?;

        let slide_total = schema.slides.len();
        let report_progress = slide_total >= self.config.progress_threshold;

        let mut slides_created = 0;
        let mut shapes_created = 0;
        let mut shapes_skipped = 0;
        let mut shapes_failed = 0;

        for (position, slide) in schema.slides.iter().enumerate() {
            match doc.add_slide(slide.title.as_deref(), slide.layout.as_deref()).await {
                Ok(engine_index) => {
                    slides_created += 1;

                    for shape in &slide.shapes {
                        let mut texts = Vec::new();
                        let mut skipped = 0;
                        collect_text_shapes(shape, &mut texts, &mut skipped);
                        shapes_skipped += skipped;

                        for (geometry, text) in texts {
                            match doc.add_text_shape(engine_index, &geometry, &text).await {
                                Ok(_) => shapes_created += 1,
                                Err(e) => {
                                    warn!(
                                        slide = slide.index,
                                        shape = shape.index,
                                        error = %e,
                                        "shape creation failed; continuing"
                                    );
                                    shapes_failed += 1;
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    if !self.config.fallback_on_error {
                        return Err(e);
                    }
                    warn!(slide = slide.index, error = %e, "slide creation failed; skipping slide");
                }
            }

            if report_progress {
                if let Some(callback) = progress {
                    callback(Progress {
                        current: position + 1,
                        total: slide_total,
                    });
                }
            }
        }

        let bytes_written = doc.save(output, format).await?;

        info!(
            output = %output.display(),
            slides_created,
            shapes_created,
            shapes_skipped,
            shapes_failed,
            "reverse conversion complete"
        );

        Ok(ReverseOutput {
            output_path: output.to_path_buf(),
            bytes_written,
            slides_created,
            shapes_created,
            shapes_skipped,
            shapes_failed,
        })
    }
}

/// Walk a shape tree collecting materializable text, counting leaves that
/// carry none.
fn collect_text_shapes(shape: &Shape, texts: &mut Vec<(Geometry, String)>, skipped: &mut usize) {
    match &shape.payload {
        ShapePayload::Group { children } => {
            for child in children {
                collect_text_shapes(child, texts, skipped);
            }
        }
        payload => match payload.plain_text() {
            Some(text) => texts.push((shape.geometry, text)),
            None => *skipped += 1,
        },
    }
}

fn parse_background(descriptor: &str) -> Background {
    match descriptor.split_once(':') {
        Some((fill, value)) => Background {
            fill: fill.to_string(),
            value: Some(value.to_string()),
        },
        None => Background {
            fill: descriptor.to_string(),
            value: None,
        },
    }
}

/// The slide substituted when a source slide cannot be read.
fn placeholder_slide(index: usize, error: &str) -> Slide {
    Slide {
        id: format!("slide-{}", index),
        index,
        title: Some(format!("Slide {} (unavailable)", index + 1)),
        layout: None,
        background: None,
        transition: None,
        shapes: vec![Shape {
            id: format!("shape-{}-0", index),
            index: 0,
            name: None,
            kind: ShapeKind::Textbox,
            geometry: Geometry::default(),
            payload: ShapePayload::Text {
                paragraphs: vec![Paragraph {
                    runs: vec![TextRun::plain(format!("Slide content unavailable: {}", error))],
                    alignment: None,
                }],
            },
        }],
    }
}
