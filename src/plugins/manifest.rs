//! Extension manifest parsing and content validation.
//!
//! Extensions are described by `*.extension.toml` files. A manifest never
//! carries code; it names a factory that must already be registered in the
//! host process, so loading an extension can add behavior only from the set
//! the embedding application compiled in.

use crate::core::config::ExtensionPolicy;
use crate::plugins::traits::validate_plugin_name;
use crate::{DeckbridgeError, Result};
use serde::Deserialize;
use std::sync::LazyLock;

/// File name suffix identifying extension manifests.
pub const MANIFEST_SUFFIX: &str = ".extension.toml";

static VERSION_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    // Compiled from a literal, cannot fail.
    #[allow(clippy::unwrap_used)]
    regex::Regex::new(r"^\d+\.\d+\.\d+$").unwrap()
});

#[derive(Debug, Clone, Deserialize)]
struct ManifestFile {
    extension: ExtensionManifest,
}

/// Parsed contents of one `*.extension.toml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionManifest {
    /// Plugin name the extension registers under.
    pub name: String,
    /// Semantic version (`major.minor.patch`).
    pub version: String,
    /// Key of the compiled-in factory that builds the extractor.
    pub factory: String,
    /// Shape kinds the extension claims.
    pub kinds: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl ExtensionManifest {
    /// Parse a manifest from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `DeckbridgeError::Extension` when the text is not valid TOML
    /// or lacks the `[extension]` table.
    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        let file: ManifestFile = toml::from_str(text)
            .map_err(|e| DeckbridgeError::extension(format!("invalid manifest: {}", e), origin))?;
        Ok(file.extension)
    }

    /// Validate manifest content against the security policy.
    ///
    /// Checks run in a fixed order and the first violation is reported:
    /// plugin name, version format, non-empty factory, and every claimed
    /// kind against the policy allow-list.
    pub fn validate(&self, policy: &ExtensionPolicy) -> Result<()> {
        validate_plugin_name(&self.name)?;

        if !VERSION_RE.is_match(&self.version) {
            return Err(DeckbridgeError::extension(
                format!("version '{}' is not major.minor.patch", self.version),
                &self.name,
            ));
        }

        if self.factory.trim().is_empty() {
            return Err(DeckbridgeError::extension("factory key is empty", &self.name));
        }

        if self.kinds.is_empty() {
            return Err(DeckbridgeError::extension("no shape kinds claimed", &self.name));
        }

        for kind in &self.kinds {
            if !policy.allowed_kinds.iter().any(|allowed| allowed == kind) {
                return Err(DeckbridgeError::extension(
                    format!("kind '{}' is not in the allowed set", kind),
                    &self.name,
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
[extension]
name = "diagram-extractor"
version = "1.2.0"
factory = "diagram"
kinds = ["smart-art"]
description = "Extracts diagram node text"
"#;

    #[test]
    fn test_parse_valid_manifest() {
        let manifest = ExtensionManifest::parse(VALID, "test").unwrap();
        assert_eq!(manifest.name, "diagram-extractor");
        assert_eq!(manifest.version, "1.2.0");
        assert_eq!(manifest.factory, "diagram");
        assert_eq!(manifest.kinds, vec!["smart-art"]);
    }

    #[test]
    fn test_parse_rejects_missing_table() {
        let result = ExtensionManifest::parse("name = \"x\"", "test");
        assert!(matches!(result, Err(DeckbridgeError::Extension { .. })));
    }

    #[test]
    fn test_validate_accepts_valid_manifest() {
        let manifest = ExtensionManifest::parse(VALID, "test").unwrap();
        assert!(manifest.validate(&ExtensionPolicy::default()).is_ok());
    }

    #[test]
    fn test_validate_rejects_disallowed_kind() {
        let mut manifest = ExtensionManifest::parse(VALID, "test").unwrap();
        manifest.kinds = vec!["shader".to_string()];
        let err = manifest.validate(&ExtensionPolicy::default()).unwrap_err();
        assert!(err.to_string().contains("not in the allowed set"));
    }

    #[test]
    fn test_validate_rejects_bad_version() {
        let mut manifest = ExtensionManifest::parse(VALID, "test").unwrap();
        manifest.version = "1.2".to_string();
        assert!(manifest.validate(&ExtensionPolicy::default()).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_kinds() {
        let mut manifest = ExtensionManifest::parse(VALID, "test").unwrap();
        manifest.kinds.clear();
        assert!(manifest.validate(&ExtensionPolicy::default()).is_err());
    }

    #[test]
    fn test_validate_rejects_whitespace_name() {
        let mut manifest = ExtensionManifest::parse(VALID, "test").unwrap();
        manifest.name = "bad name".to_string();
        assert!(manifest.validate(&ExtensionPolicy::default()).is_err());
    }
}
