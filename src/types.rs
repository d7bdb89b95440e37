//! Core types for deckbridge.
//!
//! The Universal Schema document model lives here: a canonical, versioned,
//! engine-independent representation of a presentation. All wire names are
//! camelCase so serialized documents match the published schema contract.
//!
//! Two families of types coexist:
//! - the schema model ([`SchemaDocument`] and below), which is what the
//!   forward pipeline produces and the reverse pipeline consumes;
//! - transient pipeline values ([`ExtractionResult`], [`ConversionStats`],
//!   [`ForwardOutput`], ...), which are never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current Universal Schema version emitted by the forward pipeline.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// A canonical, engine-independent presentation document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    /// Schema contract version this document was written against.
    pub schema_version: String,
    pub metadata: DocumentMetadata,
    pub slides: Vec<Slide>,
    /// Conversion provenance; absent on hand-authored documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<ConversionProvenance>,
}

impl SchemaDocument {
    /// Serialize to a JSON value, e.g. for validation.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Document-level metadata.
///
/// `slide_count` is denormalized on purpose: the validator reconciles it
/// against the actual slide array length rather than rejecting mismatches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    pub slide_count: usize,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: None,
            subject: None,
            created_at: None,
            modified_at: None,
            revision: None,
            slide_count: 0,
        }
    }
}

/// A single slide. `index` always equals its position in the parent array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: String,
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
    pub shapes: Vec<Shape>,
}

/// Slide background descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    /// Fill family: "solid", "gradient", "image", "none".
    pub fill: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Slide transition descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub effect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// A shape on a slide. Geometry is always present, even when payload
/// extraction failed; the payload degrades to [`ShapePayload::Generic`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: String,
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: ShapeKind,
    pub geometry: Geometry,
    pub payload: ShapePayload,
}

/// Shape position and extent. Coordinates are points; rotation is degrees
/// in `[0, 360)`. Width and height must be strictly positive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            rotation: 0.0,
        }
    }
}

/// The discriminator tag identifying what a shape is.
///
/// Kinds outside this closed set (e.g. introduced by a dynamically loaded
/// extension) round-trip as [`ShapeKind::Other`]; the registry keys on the
/// string form so unknown kinds still resolve to an extractor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeKind {
    Textbox,
    Chart,
    Table,
    Image,
    Video,
    Audio,
    Group,
    SmartArt,
    EmbeddedObject,
    Other,
}

impl ShapeKind {
    /// All kinds handled by the built-in extractor set, in schema order.
    /// The first entry doubles as the deterministic enum auto-fix default.
    pub const ALL: &'static [ShapeKind] = &[
        ShapeKind::Textbox,
        ShapeKind::Chart,
        ShapeKind::Table,
        ShapeKind::Image,
        ShapeKind::Video,
        ShapeKind::Audio,
        ShapeKind::Group,
        ShapeKind::SmartArt,
        ShapeKind::EmbeddedObject,
        ShapeKind::Other,
    ];

    /// Canonical string identifier, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Textbox => "textbox",
            ShapeKind::Chart => "chart",
            ShapeKind::Table => "table",
            ShapeKind::Image => "image",
            ShapeKind::Video => "video",
            ShapeKind::Audio => "audio",
            ShapeKind::Group => "group",
            ShapeKind::SmartArt => "smart-art",
            ShapeKind::EmbeddedObject => "embedded-object",
            ShapeKind::Other => "other",
        }
    }

    /// Parse a kind identifier. Unknown identifiers map to `Other` so that
    /// extension-introduced kinds survive a schema round-trip.
    pub fn parse(s: &str) -> ShapeKind {
        match s {
            "textbox" => ShapeKind::Textbox,
            "chart" => ShapeKind::Chart,
            "table" => ShapeKind::Table,
            "image" => ShapeKind::Image,
            "video" => ShapeKind::Video,
            "audio" => ShapeKind::Audio,
            "group" => ShapeKind::Group,
            "smart-art" => ShapeKind::SmartArt,
            "embedded-object" => ShapeKind::EmbeddedObject,
            _ => ShapeKind::Other,
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific shape content as a closed tagged union.
///
/// The fallback extractor only ever produces `Generic`, which carries the
/// properties guaranteed to exist on any shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ShapePayload {
    Text {
        paragraphs: Vec<Paragraph>,
    },
    Chart {
        chart_type: String,
        series: Vec<ChartSeries>,
        categories: Vec<String>,
        #[serde(default)]
        legend: bool,
    },
    Table {
        rows: Vec<TableRow>,
    },
    Media {
        media_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt_text: Option<String>,
    },
    Group {
        children: Vec<Shape>,
    },
    Generic {
        /// The raw engine-reported kind, preserved for diagnostics.
        source_kind: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl ShapePayload {
    /// Concatenated plain text of this payload, if it carries any.
    ///
    /// Used by the reverse pipeline to decide whether a shape is
    /// text-bearing and therefore materializable.
    pub fn plain_text(&self) -> Option<String> {
        match self {
            ShapePayload::Text { paragraphs } => {
                let text = paragraphs
                    .iter()
                    .map(|p| p.runs.iter().map(|r| r.text.as_str()).collect::<String>())
                    .collect::<Vec<_>>()
                    .join("\n");
                if text.is_empty() { None } else { Some(text) }
            }
            _ => None,
        }
    }
}

/// A paragraph of formatted text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
}

/// A contiguous run of uniformly formatted text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

impl TextRun {
    /// Plain unformatted run.
    pub fn plain<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
            underline: false,
            font: None,
            size: None,
        }
    }
}

/// One data series of a chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// One row of a table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub cells: Vec<String>,
}

/// Where a converted document came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionProvenance {
    pub conversion_id: String,
    pub source: String,
    pub engine: String,
    pub engine_version: String,
    pub converted_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// Transient per-shape extraction outcome.
///
/// Owned solely by the pipeline invocation that created it; never persisted.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub success: bool,
    pub payload: Option<ShapePayload>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl ExtractionResult {
    pub fn ok(payload: ShapePayload, elapsed_ms: u64) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
            elapsed_ms,
        }
    }

    pub fn failed<S: Into<String>>(error: S, elapsed_ms: u64) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.into()),
            elapsed_ms,
        }
    }
}

/// Registration metadata for a dynamically loaded extension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionRecord {
    pub name: String,
    pub version: String,
    pub kinds: Vec<String>,
    pub loaded_at: DateTime<Utc>,
    pub source_path: PathBuf,
}

/// Phase-level timing and counters for a forward conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionStats {
    pub slide_count: usize,
    pub shape_count: usize,
    /// Slides replaced by an error placeholder under fallback-on-error.
    pub fallback_slides: usize,
    /// Shapes whose payload degraded to `Generic` after extraction failed.
    pub degraded_shapes: usize,
    pub extraction_phase_ms: u64,
    pub slide_phase_ms: u64,
    pub assembly_phase_ms: u64,
    pub total_ms: u64,
}

/// Successful forward conversion result.
#[derive(Debug, Clone)]
pub struct ForwardOutput {
    pub schema: SchemaDocument,
    pub conversion_id: String,
    pub stats: ConversionStats,
}

/// Successful reverse conversion result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReverseOutput {
    pub output_path: PathBuf,
    pub bytes_written: u64,
    pub slides_created: usize,
    pub shapes_created: usize,
    /// Non-text shapes accepted but not yet materialized.
    pub shapes_skipped: usize,
    /// Text shapes the engine refused; logged and left out of the output.
    pub shapes_failed: usize,
}

/// Coarse progress signal for long-running conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

/// Progress callback. Invoked at coarse intervals, never per shape.
pub type ProgressFn = dyn Fn(Progress) + Send + Sync;

/// Per-document outcome of a batch conversion.
#[derive(Debug)]
pub struct BatchItem {
    pub source: PathBuf,
    /// Number of attempts made, including the successful one.
    pub attempts: u32,
    pub outcome: crate::Result<ForwardOutput>,
}
