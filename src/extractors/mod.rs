//! Built-in shape extractors.
//!
//! One extractor per family of shape kinds, plus the capability-minimal
//! fallback. Each is a plain struct implementing [`ShapeExtractor`]; the
//! payload-mapping helpers are exposed within the crate so the group
//! extractor can convert nested children without going back through the
//! registry.

mod chart;
mod fallback;
mod group;
mod media;
mod table;
mod text;

pub use chart::ChartExtractor;
pub use fallback::FallbackExtractor;
pub use group::GroupExtractor;
pub use media::MediaExtractor;
pub use table::TableExtractor;
pub use text::TextExtractor;

use crate::plugins::extractor::ShapeExtractor;
use std::sync::Arc;

/// The built-in extractor set registered by
/// [`ExtractorRegistry::with_builtins`](crate::plugins::registry::ExtractorRegistry::with_builtins).
pub fn builtin_extractors() -> Vec<Arc<dyn ShapeExtractor>> {
    vec![
        Arc::new(TextExtractor::new()),
        Arc::new(ChartExtractor::new()),
        Arc::new(TableExtractor::new()),
        Arc::new(MediaExtractor::new()),
        Arc::new(GroupExtractor::new()),
    ]
}
