//! Group shape extractor.
//!
//! Groups nest arbitrarily; children are converted in place with the same
//! payload mapping the specialized extractors use, without going back
//! through the registry.

use crate::engine::RawShape;
use crate::plugins::extractor::{ExtractionContext, ShapeExtractor};
use crate::plugins::Plugin;
use crate::types::{ExtractionResult, Shape, ShapeKind, ShapePayload};
use std::time::Instant;

/// Extracts group shapes, recursively converting their children.
pub struct GroupExtractor;

impl GroupExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GroupExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert one nested child into a schema shape.
///
/// Children whose kind-specific content is missing degrade to `Generic`
/// rather than failing the whole group.
fn convert_child(shape: &RawShape, ctx: &ExtractionContext, parent_index: usize) -> Shape {
    let payload = if let Some(frame) = &shape.text {
        ShapePayload::Text {
            paragraphs: super::text::paragraphs_from_raw(frame, ctx.options.include_formatting),
        }
    } else if let Some(chart) = &shape.chart {
        super::chart::payload_from_raw(chart)
    } else if let Some(table) = &shape.table {
        super::table::payload_from_raw(table)
    } else if let Some(media) = &shape.media {
        super::media::payload_from_raw(media)
    } else if !shape.children.is_empty() {
        ShapePayload::Group {
            children: shape
                .children
                .iter()
                .enumerate()
                .map(|(i, child)| {
                    let mut converted = convert_child(child, ctx, shape.index);
                    converted.index = i;
                    converted
                })
                .collect(),
        }
    } else {
        ShapePayload::Generic {
            source_kind: shape.kind.clone(),
            name: shape.name.clone(),
        }
    };

    Shape {
        id: format!("shape-{}-{}-{}", ctx.slide_index, parent_index, shape.index),
        index: shape.index,
        name: shape.name.clone(),
        kind: ShapeKind::parse(&shape.kind),
        geometry: shape.geometry,
        payload,
    }
}

impl Plugin for GroupExtractor {
    fn name(&self) -> &str {
        "group-extractor"
    }

    fn version(&self) -> String {
        "1.0.0".to_string()
    }

    fn description(&self) -> &str {
        "Extracts group shapes and their nested children"
    }
}

impl ShapeExtractor for GroupExtractor {
    fn supported_kinds(&self) -> &[&str] {
        &["group"]
    }

    fn extract(&self, shape: &RawShape, ctx: &ExtractionContext) -> ExtractionResult {
        let started = Instant::now();

        let children = shape
            .children
            .iter()
            .enumerate()
            .map(|(i, child)| {
                let mut converted = convert_child(child, ctx, shape.index);
                converted.index = i;
                converted
            })
            .collect();

        ExtractionResult::ok(
            ShapePayload::Group { children },
            started.elapsed().as_millis() as u64,
        )
    }
}
