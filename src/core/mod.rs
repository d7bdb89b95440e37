//! Conversion pipeline: configuration, orchestration, and batch processing.

pub mod batch;
pub mod config;
pub mod orchestrator;

pub use batch::convert_batch;
pub use config::{BatchConfig, ConversionConfig, ExtensionPolicy};
pub use orchestrator::Converter;
