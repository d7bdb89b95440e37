//! The shape extractor contract.
//!
//! This is the one interface third-party extension authors must satisfy:
//! identity (via [`Plugin`]), the set of shape kinds handled, and an
//! `extract` operation producing an [`ExtractionResult`].

use crate::engine::RawShape;
use crate::plugins::Plugin;
use crate::types::ExtractionResult;

/// Options threaded through every extraction call.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// When false, text extractors drop run-level formatting and emit plain
    /// runs only.
    pub include_formatting: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            include_formatting: true,
        }
    }
}

/// Per-invocation context handed to extractors.
///
/// Extractors receive only what is explicitly granted here; they have no
/// ambient access to the engine, storage, or the registry.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    pub slide_index: usize,
    pub options: ExtractOptions,
}

/// A kind-specific shape extractor.
///
/// Extraction is a CPU-bound walk over an already-materialized [`RawShape`];
/// it never suspends. Expected failures are reported through the returned
/// [`ExtractionResult`], not through panics or errors: `extract` is total.
pub trait ShapeExtractor: Plugin {
    /// Shape kind identifiers this extractor handles.
    fn supported_kinds(&self) -> &[&str];

    /// Produce a normalized payload for one shape.
    fn extract(&self, shape: &RawShape, ctx: &ExtractionContext) -> ExtractionResult;
}
