//! Text box extractor.

use crate::engine::{RawShape, RawTextFrame};
use crate::plugins::extractor::{ExtractionContext, ShapeExtractor};
use crate::plugins::Plugin;
use crate::types::{ExtractionResult, Paragraph, ShapePayload, TextRun};
use std::time::Instant;

/// Extracts formatted paragraphs from text-bearing shapes.
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Map an engine text frame to schema paragraphs.
///
/// With formatting disabled, runs collapse to plain text.
pub(crate) fn paragraphs_from_raw(frame: &RawTextFrame, include_formatting: bool) -> Vec<Paragraph> {
    frame
        .paragraphs
        .iter()
        .map(|p| Paragraph {
            runs: p
                .runs
                .iter()
                .map(|r| {
                    if include_formatting {
                        TextRun {
                            text: r.text.clone(),
                            bold: r.bold,
                            italic: r.italic,
                            underline: r.underline,
                            font: r.font.clone(),
                            size: r.size,
                        }
                    } else {
                        TextRun::plain(r.text.clone())
                    }
                })
                .collect(),
            alignment: if include_formatting { p.alignment.clone() } else { None },
        })
        .collect()
}

impl Plugin for TextExtractor {
    fn name(&self) -> &str {
        "text-extractor"
    }

    fn version(&self) -> String {
        "1.0.0".to_string()
    }

    fn description(&self) -> &str {
        "Extracts paragraphs and formatted runs from text boxes"
    }
}

impl ShapeExtractor for TextExtractor {
    fn supported_kinds(&self) -> &[&str] {
        &["textbox"]
    }

    fn extract(&self, shape: &RawShape, ctx: &ExtractionContext) -> ExtractionResult {
        let started = Instant::now();

        match &shape.text {
            Some(frame) => {
                let paragraphs = paragraphs_from_raw(frame, ctx.options.include_formatting);
                ExtractionResult::ok(
                    ShapePayload::Text { paragraphs },
                    started.elapsed().as_millis() as u64,
                )
            }
            None => ExtractionResult::failed(
                format!("textbox shape {} has no text frame", shape.index),
                started.elapsed().as_millis() as u64,
            ),
        }
    }
}
