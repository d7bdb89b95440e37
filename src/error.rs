//! Error types for deckbridge.
//!
//! All fallible operations return [`Result`], and every error variant maps to
//! a stable machine-readable code via [`DeckbridgeError::code`]. Expected
//! failure modes inside the pipeline (a single shape or slide failing, an
//! extension candidate being rejected) are carried in result objects rather
//! than errors; only operation-level failures surface here.
//!
//! # Error Handling Philosophy
//!
//! **System errors always bubble up unchanged:**
//! - `DeckbridgeError::Io` (from `std::io::Error`) - file system errors,
//!   permission errors. Never wrapped or suppressed.
//!
//! **Application errors are wrapped with context:**
//! - `Engine` - the external document engine failed an operation
//! - `Conversion` - a pipeline phase failed and fallback was disabled
//! - `Validation` - invalid configuration or parameters
//! - `Extension` - an extension loader operation failed
//!
//! `InvalidInput` and `Timeout` are terminal by design: no retry, no
//! fallback, resources released by the caller's failure path.

use thiserror::Error;

/// Result type alias using `DeckbridgeError`.
pub type Result<T> = std::result::Result<T, DeckbridgeError>;

/// Main error type for all deckbridge operations.
#[derive(Debug, Error)]
pub enum DeckbridgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The external document engine failed an operation it advertises.
    #[error("Engine error: {message}")]
    Engine {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A conversion phase failed with fallback-on-error disabled.
    #[error("Conversion failed during {phase}: {message}")]
    Conversion { message: String, phase: String },

    /// Shape payload extraction failed outside the per-shape fallback scope.
    #[error("Extraction error: {message}")]
    Extraction {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid configuration, parameters, or schema contract violations.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A required input is missing or structurally unusable. Fatal, no retry.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The end-to-end conversion deadline elapsed. Partial work is abandoned.
    #[error("Conversion timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Extension error in '{extension}': {message}")]
    Extension { message: String, extension: String },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for DeckbridgeError {
    fn from(err: serde_json::Error) -> Self {
        DeckbridgeError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl DeckbridgeError {
    /// Create an Engine error.
    pub fn engine<S: Into<String>>(message: S) -> Self {
        Self::Engine {
            message: message.into(),
            source: None,
        }
    }

    /// Create an Engine error with source.
    pub fn engine_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Engine {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a Conversion error for a named pipeline phase.
    pub fn conversion<S: Into<String>, P: Into<String>>(message: S, phase: P) -> Self {
        Self::Conversion {
            message: message.into(),
            phase: phase.into(),
        }
    }

    /// Create an Extraction error.
    pub fn extraction<S: Into<String>>(message: S) -> Self {
        Self::Extraction {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Validation error with source.
    pub fn validation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an Extension error.
    pub fn extension<S: Into<String>, N: Into<String>>(message: S, extension: N) -> Self {
        Self::Extension {
            message: message.into(),
            extension: extension.into(),
        }
    }

    /// Stable machine-readable code for this error.
    ///
    /// Codes are part of the public contract: callers branch on them and they
    /// never change for a given failure mode.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO_ERROR",
            Self::Engine { .. } => "ENGINE_ERROR",
            Self::Conversion { .. } => "CONVERSION_FAILED",
            Self::Extraction { .. } => "EXTRACTION_FAILED",
            Self::Validation { .. } => "VALIDATION_FAILED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Timeout { .. } => "CONVERSION_TIMEOUT",
            Self::Extension { .. } => "EXTENSION_ERROR",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }
}
