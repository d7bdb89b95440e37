//! Media extractor for image, video, and audio shapes.

use crate::engine::{RawMedia, RawShape};
use crate::plugins::extractor::{ExtractionContext, ShapeExtractor};
use crate::plugins::Plugin;
use crate::types::{ExtractionResult, ShapePayload};
use std::time::Instant;

/// Extracts media references (source, alt text) from media shapes.
pub struct MediaExtractor;

impl MediaExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MediaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn payload_from_raw(media: &RawMedia) -> ShapePayload {
    ShapePayload::Media {
        media_type: media.media_type.clone(),
        source: media.source.clone(),
        alt_text: media.alt_text.clone(),
    }
}

impl Plugin for MediaExtractor {
    fn name(&self) -> &str {
        "media-extractor"
    }

    fn version(&self) -> String {
        "1.0.0".to_string()
    }

    fn description(&self) -> &str {
        "Extracts media references from image, video, and audio shapes"
    }
}

impl ShapeExtractor for MediaExtractor {
    fn supported_kinds(&self) -> &[&str] {
        &["image", "video", "audio"]
    }

    fn extract(&self, shape: &RawShape, _ctx: &ExtractionContext) -> ExtractionResult {
        let started = Instant::now();

        match &shape.media {
            Some(media) => ExtractionResult::ok(payload_from_raw(media), started.elapsed().as_millis() as u64),
            // A media shape without a reference still yields a payload: the
            // shape kind alone tells us the media family.
            None => ExtractionResult::ok(
                ShapePayload::Media {
                    media_type: shape.kind.clone(),
                    source: None,
                    alt_text: None,
                },
                started.elapsed().as_millis() as u64,
            ),
        }
    }
}
