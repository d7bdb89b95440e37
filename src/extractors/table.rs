//! Table extractor.

use crate::engine::{RawShape, RawTable};
use crate::plugins::extractor::{ExtractionContext, ShapeExtractor};
use crate::plugins::Plugin;
use crate::types::{ExtractionResult, ShapePayload, TableRow};
use std::time::Instant;

/// Extracts rows and cells from table shapes.
pub struct TableExtractor;

impl TableExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn payload_from_raw(table: &RawTable) -> ShapePayload {
    ShapePayload::Table {
        rows: table.rows.iter().map(|cells| TableRow { cells: cells.clone() }).collect(),
    }
}

impl Plugin for TableExtractor {
    fn name(&self) -> &str {
        "table-extractor"
    }

    fn version(&self) -> String {
        "1.0.0".to_string()
    }

    fn description(&self) -> &str {
        "Extracts rows and cells from tables"
    }
}

impl ShapeExtractor for TableExtractor {
    fn supported_kinds(&self) -> &[&str] {
        &["table"]
    }

    fn extract(&self, shape: &RawShape, _ctx: &ExtractionContext) -> ExtractionResult {
        let started = Instant::now();

        match &shape.table {
            Some(table) => ExtractionResult::ok(payload_from_raw(table), started.elapsed().as_millis() as u64),
            None => ExtractionResult::failed(
                format!("table shape {} has no table data", shape.index),
                started.elapsed().as_millis() as u64,
            ),
        }
    }
}
