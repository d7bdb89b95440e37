//! Plugin system: extractor traits, the kind registry, and the
//! manifest-gated extension loader.

pub mod extractor;
pub mod loader;
pub mod manifest;
pub mod registry;
pub mod traits;

pub use extractor::{ExtractOptions, ExtractionContext, ShapeExtractor};
pub use loader::{ExtensionFactory, ExtensionManager, LoadAttempt, LoadReport, LoadState, LoadStats};
pub use manifest::ExtensionManifest;
pub use registry::{DisposalFailure, ExtractorRegistry};
pub use traits::Plugin;
