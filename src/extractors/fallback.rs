//! Last-resort extractor used when no registered extractor claims a kind.
//!
//! It only reads properties every shape carries, so it can never fail.

use crate::engine::RawShape;
use crate::plugins::extractor::{ExtractionContext, ShapeExtractor};
use crate::plugins::Plugin;
use crate::types::{ExtractionResult, ShapePayload};
use std::time::Instant;

pub struct FallbackExtractor;

impl FallbackExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FallbackExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for FallbackExtractor {
    fn name(&self) -> &str {
        "fallback-extractor"
    }

    fn version(&self) -> String {
        "1.0.0".to_string()
    }

    fn description(&self) -> &str {
        "Preserves identity and geometry of shapes no other extractor handles"
    }
}

impl ShapeExtractor for FallbackExtractor {
    fn supported_kinds(&self) -> &[&str] {
        &[]
    }

    fn extract(&self, shape: &RawShape, _ctx: &ExtractionContext) -> ExtractionResult {
        let started = Instant::now();
        ExtractionResult::ok(
            ShapePayload::Generic {
                source_kind: shape.kind.clone(),
                name: shape.name.clone(),
            },
            started.elapsed().as_millis() as u64,
        )
    }
}
