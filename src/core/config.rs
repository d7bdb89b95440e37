//! Configuration loading and management.
//!
//! [`ConversionConfig`] covers the whole pipeline: fallback policy, the
//! end-to-end timeout, progress reporting, batch limits, and the extension
//! security policy. It can be loaded from a TOML file, discovered in parent
//! directories, or built programmatically.

use crate::{DeckbridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main conversion configuration.
///
/// # Example
///
/// ```rust
/// use deckbridge::ConversionConfig;
///
/// let config = ConversionConfig::default();
/// assert!(config.fallback_on_error);
/// assert_eq!(config.timeout_secs, 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Substitute a placeholder slide when a single slide fails, instead of
    /// aborting the whole conversion.
    #[serde(default = "default_true")]
    pub fallback_on_error: bool,

    /// End-to-end forward conversion deadline in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum slide count before progress signals are emitted.
    #[serde(default = "default_progress_threshold")]
    pub progress_threshold: usize,

    /// Batch processing limits.
    #[serde(default)]
    pub batch: BatchConfig,

    /// Extension loading security policy.
    #[serde(default)]
    pub extensions: ExtensionPolicy,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            fallback_on_error: true,
            timeout_secs: default_timeout_secs(),
            progress_threshold: default_progress_threshold(),
            batch: BatchConfig::default(),
            extensions: ExtensionPolicy::default(),
        }
    }
}

/// Limits for batch conversion of independent documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Concurrency window (None = min(4, num_cpus)).
    ///
    /// Documents are independent, but each holds an engine document open;
    /// the window bounds peak native resource usage.
    #[serde(default)]
    pub max_concurrent: Option<usize>,

    /// Retries per document after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff in milliseconds; attempt `n` waits `n * backoff`.
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: None,
            max_retries: default_max_retries(),
            retry_backoff_ms: default_backoff_ms(),
        }
    }
}

impl BatchConfig {
    /// Effective concurrency window.
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrent.unwrap_or_else(|| num_cpus::get().min(4)).max(1)
    }
}

/// Security policy applied to every extension load attempt.
///
/// Candidates failing any rule are rejected before instantiation; this is
/// the load-time security boundary for third-party extractors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionPolicy {
    /// Directory scanned for `*.extension.toml` manifests (None = loading
    /// disabled).
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Shape kind identifiers an extension may claim. Kinds outside this
    /// list reject the candidate.
    #[serde(default = "default_allowed_kinds")]
    pub allowed_kinds: Vec<String>,

    /// Upper bound on registered extensions.
    #[serde(default = "default_max_extensions")]
    pub max_extensions: usize,

    /// Upper bound on manifest file size in bytes.
    #[serde(default = "default_max_manifest_bytes")]
    pub max_manifest_bytes: u64,
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self {
            directory: None,
            allowed_kinds: default_allowed_kinds(),
            max_extensions: default_max_extensions(),
            max_manifest_bytes: default_max_manifest_bytes(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_progress_threshold() -> usize {
    25
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    250
}

fn default_max_extensions() -> usize {
    20
}

fn default_max_manifest_bytes() -> u64 {
    64 * 1024
}

fn default_allowed_kinds() -> Vec<String> {
    crate::types::ShapeKind::ALL.iter().map(|k| k.as_str().to_string()).collect()
}

impl ConversionConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `DeckbridgeError::Validation` if the file cannot be read or
    /// is not valid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DeckbridgeError::validation(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            DeckbridgeError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e))
        })
    }

    /// Discover `deckbridge.toml` in the current directory or any ancestor.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file exists on the ancestor chain
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(DeckbridgeError::Io)?;

        loop {
            let candidate = current.join("deckbridge.toml");
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ConversionConfig::default();
        assert!(config.fallback_on_error);
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.batch.max_retries, 2);
        assert_eq!(config.extensions.max_extensions, 20);
        assert!(config.extensions.directory.is_none());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("deckbridge.toml");

        fs::write(
            &config_path,
            r#"
fallback_on_error = false
timeout_secs = 60

[batch]
max_concurrent = 2
max_retries = 1

[extensions]
max_extensions = 5
"#,
        )
        .unwrap();

        let config = ConversionConfig::from_toml_file(&config_path).unwrap();
        assert!(!config.fallback_on_error);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.batch.max_concurrent, Some(2));
        assert_eq!(config.batch.max_retries, 1);
        assert_eq!(config.extensions.max_extensions, 5);
        // Unset fields keep their defaults.
        assert_eq!(config.extensions.max_manifest_bytes, 64 * 1024);
    }

    #[test]
    fn test_from_toml_file_invalid() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("deckbridge.toml");
        fs::write(&config_path, "timeout_secs = \"not a number\"").unwrap();

        let result = ConversionConfig::from_toml_file(&config_path);
        assert!(matches!(result, Err(DeckbridgeError::Validation { .. })));
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = ConversionConfig::from_toml_file("/nonexistent/deckbridge.toml");
        assert!(matches!(result, Err(DeckbridgeError::Validation { .. })));
    }

    #[test]
    fn test_effective_concurrency_bounds() {
        let batch = BatchConfig {
            max_concurrent: Some(0),
            ..Default::default()
        };
        assert_eq!(batch.effective_concurrency(), 1);

        let batch = BatchConfig {
            max_concurrent: Some(8),
            ..Default::default()
        };
        assert_eq!(batch.effective_concurrency(), 8);

        let batch = BatchConfig::default();
        assert!(batch.effective_concurrency() >= 1);
        assert!(batch.effective_concurrency() <= 4);
    }

    #[test]
    fn test_default_allowed_kinds_cover_builtin_set() {
        let policy = ExtensionPolicy::default();
        assert!(policy.allowed_kinds.contains(&"textbox".to_string()));
        assert!(policy.allowed_kinds.contains(&"smart-art".to_string()));
        assert_eq!(policy.allowed_kinds.len(), 10);
    }
}
