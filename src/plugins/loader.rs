//! Security-gated extension loading.
//!
//! [`ExtensionManager`] discovers `*.extension.toml` manifests in the
//! configured directory and walks each candidate through a fixed gate:
//!
//! ```text
//! Discovered -> PathValidated -> ContentValidated -> Instantiated
//!            -> Initialized -> Registered
//! ```
//!
//! A candidate failing a gate step lands in `Rejected` with a reason and
//! never touches the registry; the one exception is the optional
//! `initialize()` hook, whose failure is logged without blocking
//! registration. One bad extension cannot block the others: every candidate
//! is attempted and the per-candidate outcome is collected into a
//! [`LoadReport`].
//!
//! Manifests carry no code. They name a factory key, and the factory must
//! have been registered by the embedding application before loading, so the
//! set of loadable behaviors is fixed at compile time.

use crate::core::config::ExtensionPolicy;
use crate::plugins::extractor::ShapeExtractor;
use crate::plugins::manifest::{ExtensionManifest, MANIFEST_SUFFIX};
use crate::plugins::registry::ExtractorRegistry;
use crate::types::ExtensionRecord;
use crate::{DeckbridgeError, Result};
use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Builds an extractor instance for a manifest that names this factory.
pub type ExtensionFactory = Arc<dyn Fn() -> Arc<dyn ShapeExtractor> + Send + Sync>;

/// Terminal or intermediate state of one load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Discovered,
    PathValidated,
    ContentValidated,
    Instantiated,
    Initialized,
    Registered,
    Rejected { reason: String },
}

/// Outcome of one manifest candidate.
#[derive(Debug, Clone)]
pub struct LoadAttempt {
    pub manifest_path: PathBuf,
    /// Extension name, once the manifest parsed far enough to know it.
    pub extension: Option<String>,
    pub state: LoadState,
}

/// Aggregate outcome of a directory scan.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub attempts: Vec<LoadAttempt>,
    /// Wall time of the whole scan, discovery through registration.
    pub elapsed_ms: u64,
}

impl LoadReport {
    /// Candidates that reached `Registered`.
    pub fn loaded(&self) -> usize {
        self.attempts.iter().filter(|a| a.state == LoadState::Registered).count()
    }

    /// Candidates rejected by any gate step.
    pub fn rejected(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.state, LoadState::Rejected { .. }))
            .count()
    }

    /// Counter snapshot of this report.
    pub fn stats(&self) -> LoadStats {
        LoadStats {
            attempted: self.attempts.len(),
            loaded: self.loaded(),
            rejected: self.rejected(),
            elapsed_ms: self.elapsed_ms,
        }
    }
}

/// Health counters from the most recent load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub attempted: usize,
    pub loaded: usize,
    pub rejected: usize,
    pub elapsed_ms: u64,
}

struct LoadedExtension {
    record: ExtensionRecord,
    factory: ExtensionFactory,
    enabled: bool,
}

/// Manages the lifecycle of manifest-described extensions.
///
/// The manager owns no registry; callers pass the registry each operation
/// should act on, which keeps registry ownership with the conversion
/// pipeline that uses it.
pub struct ExtensionManager {
    policy: ExtensionPolicy,
    factories: RwLock<IndexMap<String, ExtensionFactory>>,
    loaded: RwLock<IndexMap<String, LoadedExtension>>,
    last_stats: RwLock<LoadStats>,
}

/// Result of the filesystem-only validation steps, produced concurrently.
enum Candidate {
    Validated { path: PathBuf, manifest: ExtensionManifest },
    Rejected { path: PathBuf, extension: Option<String>, reason: String },
}

impl ExtensionManager {
    pub fn new(policy: ExtensionPolicy) -> Self {
        Self {
            policy,
            factories: RwLock::new(IndexMap::new()),
            loaded: RwLock::new(IndexMap::new()),
            last_stats: RwLock::new(LoadStats::default()),
        }
    }

    /// Counters from the most recent `load_all` or `reload`.
    pub fn stats(&self) -> LoadStats {
        *self.last_stats.read()
    }

    /// Register a compiled-in factory under `key`.
    ///
    /// Re-registering a key replaces the previous factory.
    pub fn register_factory(&self, key: impl Into<String>, factory: ExtensionFactory) {
        let key = key.into();
        debug!(factory = %key, "registering extension factory");
        self.factories.write().insert(key, factory);
    }

    /// Keys of all registered factories, in registration order.
    pub fn factory_keys(&self) -> Vec<String> {
        self.factories.read().keys().cloned().collect()
    }

    /// Records of every loaded extension, enabled or not.
    pub fn records(&self) -> Vec<ExtensionRecord> {
        self.loaded.read().values().map(|ext| ext.record.clone()).collect()
    }

    /// Whether `name` is loaded and currently enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.loaded.read().get(name).map(|ext| ext.enabled).unwrap_or(false)
    }

    /// Discover and load every manifest in the policy directory.
    ///
    /// Filesystem validation of the candidates runs concurrently; the
    /// registration steps run sequentially in path order so capacity and
    /// duplicate checks are deterministic.
    ///
    /// # Errors
    ///
    /// Returns `DeckbridgeError::Extension` only when the directory itself
    /// is unusable. Per-candidate failures are reported, not raised.
    pub async fn load_all(&self, registry: &ExtractorRegistry) -> Result<LoadReport> {
        let scan_start = Instant::now();
        let Some(directory) = self.policy.directory.clone() else {
            debug!("no extension directory configured; skipping load");
            let report = LoadReport::default();
            *self.last_stats.write() = report.stats();
            return Ok(report);
        };

        let root = tokio::fs::canonicalize(&directory).await.map_err(|e| {
            DeckbridgeError::extension(
                format!("extension directory {} is unusable: {}", directory.display(), e),
                "loader",
            )
        })?;

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&root).await.map_err(|e| {
            DeckbridgeError::extension(
                format!("cannot read extension directory {}: {}", root.display(), e),
                "loader",
            )
        })?;
        while let Some(entry) = entries.next_entry().await.map_err(DeckbridgeError::Io)? {
            let path = entry.path();
            let is_manifest = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(MANIFEST_SUFFIX))
                .unwrap_or(false);
            if is_manifest {
                paths.push(path);
            }
        }
        paths.sort();

        let mut tasks = JoinSet::new();
        for path in paths {
            let root = root.clone();
            let policy = self.policy.clone();
            tasks.spawn(async move { validate_candidate(path, root, policy).await });
        }

        let mut candidates = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => warn!(error = %e, "extension validation task panicked"),
            }
        }
        candidates.sort_by(|a, b| {
            let path = |c: &Candidate| match c {
                Candidate::Validated { path, .. } | Candidate::Rejected { path, .. } => path.clone(),
            };
            path(a).cmp(&path(b))
        });

        let mut report = LoadReport::default();
        for candidate in candidates {
            let attempt = match candidate {
                Candidate::Rejected { path, extension, reason } => LoadAttempt {
                    manifest_path: path,
                    extension,
                    state: LoadState::Rejected { reason },
                },
                Candidate::Validated { path, manifest } => self.admit(path, manifest, registry),
            };
            if let LoadState::Rejected { reason } = &attempt.state {
                warn!(
                    manifest = %attempt.manifest_path.display(),
                    reason = %reason,
                    "extension rejected"
                );
            }
            report.attempts.push(attempt);
        }

        report.elapsed_ms = scan_start.elapsed().as_millis() as u64;
        *self.last_stats.write() = report.stats();

        info!(
            loaded = report.loaded(),
            rejected = report.rejected(),
            elapsed_ms = report.elapsed_ms,
            "extension load complete"
        );
        Ok(report)
    }

    /// Run the in-process steps of the gate for one validated candidate.
    fn admit(
        &self,
        path: PathBuf,
        manifest: ExtensionManifest,
        registry: &ExtractorRegistry,
    ) -> LoadAttempt {
        let name = manifest.name.clone();
        let rejected = |reason: String| LoadAttempt {
            manifest_path: path.clone(),
            extension: Some(name.clone()),
            state: LoadState::Rejected { reason },
        };

        if self.loaded.read().len() >= self.policy.max_extensions {
            return rejected(format!("extension limit {} reached", self.policy.max_extensions));
        }
        if self.loaded.read().contains_key(&name) {
            return rejected(format!("extension '{}' is already loaded", name));
        }

        let factory = match self.factories.read().get(&manifest.factory) {
            Some(factory) => Arc::clone(factory),
            None => return rejected(format!("unknown factory '{}'", manifest.factory)),
        };

        // Instantiated.
        let extractor = factory();
        if extractor.name() != name {
            return rejected(format!(
                "factory produced extractor '{}', manifest declares '{}'",
                extractor.name(),
                name
            ));
        }
        let claimed: Vec<&str> = manifest.kinds.iter().map(String::as_str).collect();
        let supported = extractor.supported_kinds();
        for kind in &claimed {
            if !supported.contains(kind) {
                return rejected(format!("extractor does not support claimed kind '{}'", kind));
            }
        }

        // Initialized. The hook is optional setup; its failure is logged
        // and the extractor is registered anyway.
        if let Err(e) = extractor.initialize() {
            warn!(extension = %name, error = %e, "extension initialization failed; registering anyway");
        }

        if let Err(e) = registry.register(Arc::clone(&extractor)) {
            return rejected(format!("registration failed: {}", e));
        }

        let record = ExtensionRecord {
            name: name.clone(),
            version: manifest.version.clone(),
            kinds: manifest.kinds.clone(),
            loaded_at: Utc::now(),
            source_path: path.clone(),
        };
        self.loaded.write().insert(
            name.clone(),
            LoadedExtension {
                record,
                factory,
                enabled: true,
            },
        );
        info!(extension = %name, "extension registered");

        LoadAttempt {
            manifest_path: path,
            extension: Some(name),
            state: LoadState::Registered,
        }
    }

    /// Disable a loaded extension, unmapping its kinds from the registry.
    ///
    /// Idempotent: disabling an already-disabled extension is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DeckbridgeError::Extension` if `name` was never loaded.
    pub fn disable(&self, name: &str, registry: &ExtractorRegistry) -> Result<()> {
        let mut loaded = self.loaded.write();
        let ext = loaded
            .get_mut(name)
            .ok_or_else(|| DeckbridgeError::extension("extension is not loaded", name))?;
        if !ext.enabled {
            return Ok(());
        }
        ext.enabled = false;
        drop(loaded);

        registry.remove(name);
        info!(extension = %name, "extension disabled");
        Ok(())
    }

    /// Re-enable a disabled extension, rebuilding it from its factory.
    ///
    /// Idempotent: enabling an already-enabled extension is a no-op.
    pub fn enable(&self, name: &str, registry: &ExtractorRegistry) -> Result<()> {
        let factory = {
            let mut loaded = self.loaded.write();
            let ext = loaded
                .get_mut(name)
                .ok_or_else(|| DeckbridgeError::extension("extension is not loaded", name))?;
            if ext.enabled {
                return Ok(());
            }
            ext.enabled = true;
            Arc::clone(&ext.factory)
        };

        registry.register(factory())?;
        info!(extension = %name, "extension enabled");
        Ok(())
    }

    /// Unload everything and re-run the full directory scan.
    pub async fn reload(&self, registry: &ExtractorRegistry) -> Result<LoadReport> {
        let names: Vec<String> = self.loaded.read().keys().cloned().collect();
        for name in names {
            registry.remove(&name);
        }
        self.loaded.write().clear();
        self.load_all(registry).await
    }

    /// Check that registry state still matches the loaded extension set.
    ///
    /// Pure read: reports inconsistencies (an enabled extension whose kind
    /// now resolves elsewhere, or a disabled one still mapped) without
    /// repairing them.
    pub fn validate_registry(&self, registry: &ExtractorRegistry) -> Vec<String> {
        let mut issues = Vec::new();
        for ext in self.loaded.read().values() {
            for kind in &ext.record.kinds {
                let resolved = registry.resolve(kind);
                let mapped_here = resolved.name() == ext.record.name;
                if ext.enabled && !mapped_here {
                    issues.push(format!(
                        "enabled extension '{}' no longer owns kind '{}' (now '{}')",
                        ext.record.name,
                        kind,
                        resolved.name()
                    ));
                } else if !ext.enabled && mapped_here {
                    issues.push(format!(
                        "disabled extension '{}' is still mapped for kind '{}'",
                        ext.record.name, kind
                    ));
                }
            }
        }
        issues
    }
}

/// Filesystem-facing gate steps: path containment, size limit, manifest
/// parse, and content validation.
async fn validate_candidate(path: PathBuf, root: PathBuf, policy: ExtensionPolicy) -> Candidate {
    let rejected = |path: PathBuf, extension: Option<String>, reason: String| Candidate::Rejected {
        path,
        extension,
        reason,
    };

    // PathValidated: the canonical manifest must live under the canonical
    // extension directory. This stops symlinks and `..` components from
    // pulling manifests in from outside the sandboxed directory.
    let canonical = match tokio::fs::canonicalize(&path).await {
        Ok(canonical) => canonical,
        Err(e) => return rejected(path, None, format!("cannot canonicalize path: {}", e)),
    };
    if !canonical.starts_with(&root) {
        return rejected(path, None, "manifest resolves outside the extension directory".to_string());
    }

    let metadata = match tokio::fs::metadata(&canonical).await {
        Ok(metadata) => metadata,
        Err(e) => return rejected(path, None, format!("cannot stat manifest: {}", e)),
    };
    if !metadata.is_file() {
        return rejected(path, None, "manifest is not a regular file".to_string());
    }
    if metadata.len() > policy.max_manifest_bytes {
        return rejected(
            path,
            None,
            format!(
                "manifest is {} bytes, limit is {}",
                metadata.len(),
                policy.max_manifest_bytes
            ),
        );
    }

    // ContentValidated.
    let text = match tokio::fs::read_to_string(&canonical).await {
        Ok(text) => text,
        Err(e) => return rejected(path, None, format!("cannot read manifest: {}", e)),
    };
    let manifest = match ExtensionManifest::parse(&text, &path.display().to_string()) {
        Ok(manifest) => manifest,
        Err(e) => return rejected(path, None, e.to_string()),
    };
    if let Err(e) = manifest.validate(&policy) {
        return rejected(path, Some(manifest.name.clone()), e.to_string());
    }

    Candidate::Validated { path, manifest }
}

impl std::fmt::Debug for ExtensionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionManager")
            .field("policy", &self.policy)
            .field("factories", &self.factory_keys())
            .field("loaded", &self.records().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RawShape;
    use crate::plugins::extractor::ExtractionContext;
    use crate::plugins::Plugin;
    use crate::types::{ExtractionResult, ShapePayload};
    use std::fs;
    use tempfile::tempdir;

    struct StubExtractor {
        name: &'static str,
        kinds: Vec<&'static str>,
        init_fails: bool,
    }

    impl Plugin for StubExtractor {
        fn name(&self) -> &str {
            self.name
        }

        fn version(&self) -> String {
            "1.0.0".to_string()
        }

        fn initialize(&self) -> crate::Result<()> {
            if self.init_fails {
                return Err(crate::DeckbridgeError::extension("init exploded", self.name));
            }
            Ok(())
        }
    }

    impl ShapeExtractor for StubExtractor {
        fn supported_kinds(&self) -> &[&str] {
            &self.kinds
        }

        fn extract(&self, shape: &RawShape, _ctx: &ExtractionContext) -> ExtractionResult {
            ExtractionResult::ok(
                ShapePayload::Generic {
                    source_kind: shape.kind.clone(),
                    name: shape.name.clone(),
                },
                0,
            )
        }
    }

    fn stub_factory(name: &'static str, kinds: Vec<&'static str>, init_fails: bool) -> ExtensionFactory {
        Arc::new(move || {
            Arc::new(StubExtractor {
                name,
                kinds: kinds.clone(),
                init_fails,
            })
        })
    }

    fn write_manifest(dir: &Path, file: &str, name: &str, factory: &str, kind: &str) {
        fs::write(
            dir.join(file),
            format!(
                "[extension]\nname = \"{}\"\nversion = \"1.0.0\"\nfactory = \"{}\"\nkinds = [\"{}\"]\n",
                name, factory, kind
            ),
        )
        .unwrap();
    }

    fn manager_for(dir: &Path) -> ExtensionManager {
        let policy = ExtensionPolicy {
            directory: Some(dir.to_path_buf()),
            ..Default::default()
        };
        ExtensionManager::new(policy)
    }

    #[tokio::test]
    async fn test_load_all_without_directory_is_noop() {
        let manager = ExtensionManager::new(ExtensionPolicy::default());
        let registry = ExtractorRegistry::new();
        let report = manager.load_all(&registry).await.unwrap();
        assert!(report.attempts.is_empty());
    }

    #[tokio::test]
    async fn test_load_registers_valid_extension() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "smart.extension.toml", "smart-art-ext", "smart", "smart-art");

        let manager = manager_for(dir.path());
        manager.register_factory("smart", stub_factory("smart-art-ext", vec!["smart-art"], false));

        let registry = ExtractorRegistry::new();
        let report = manager.load_all(&registry).await.unwrap();

        assert_eq!(report.loaded(), 1);
        assert_eq!(report.rejected(), 0);
        assert_eq!(registry.resolve("smart-art").name(), "smart-art-ext");
        assert_eq!(manager.records().len(), 1);
    }

    #[tokio::test]
    async fn test_one_bad_extension_does_not_block_others() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "a.extension.toml", "ext-a", "a", "smart-art");
        write_manifest(dir.path(), "b.extension.toml", "ext-b", "b", "embedded-object");
        // ext-c claims a kind outside the allow-list.
        write_manifest(dir.path(), "c.extension.toml", "ext-c", "c", "shader");

        let manager = manager_for(dir.path());
        manager.register_factory("a", stub_factory("ext-a", vec!["smart-art"], false));
        manager.register_factory("b", stub_factory("ext-b", vec!["embedded-object"], false));
        manager.register_factory("c", stub_factory("ext-c", vec!["shader"], false));

        let registry = ExtractorRegistry::new();
        let report = manager.load_all(&registry).await.unwrap();

        assert_eq!(report.loaded(), 2);
        assert_eq!(report.rejected(), 1);
        assert_eq!(registry.resolve("smart-art").name(), "ext-a");
        assert_eq!(registry.resolve("embedded-object").name(), "ext-b");
        assert_eq!(registry.resolve("shader").name(), "fallback-extractor");
    }

    #[tokio::test]
    async fn test_init_failure_does_not_abort_registration() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "x.extension.toml", "ext-x", "x", "smart-art");

        let manager = manager_for(dir.path());
        manager.register_factory("x", stub_factory("ext-x", vec!["smart-art"], true));

        let registry = ExtractorRegistry::new();
        let report = manager.load_all(&registry).await.unwrap();

        // Failed setup degrades the extension, it does not block it.
        assert_eq!(report.loaded(), 1);
        assert_eq!(report.rejected(), 0);
        assert_eq!(registry.resolve("smart-art").name(), "ext-x");
        assert!(manager.is_enabled("ext-x"));
    }

    #[tokio::test]
    async fn test_stats_reflect_last_load() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "a.extension.toml", "ext-a", "a", "smart-art");
        write_manifest(dir.path(), "b.extension.toml", "ext-b", "missing", "embedded-object");

        let manager = manager_for(dir.path());
        manager.register_factory("a", stub_factory("ext-a", vec!["smart-art"], false));
        assert_eq!(manager.stats(), LoadStats::default());

        let registry = ExtractorRegistry::new();
        let report = manager.load_all(&registry).await.unwrap();

        let stats = manager.stats();
        assert_eq!(stats.attempted, 2);
        assert_eq!(stats.loaded, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats, report.stats());
    }

    #[tokio::test]
    async fn test_rejects_unknown_factory() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "x.extension.toml", "ext-x", "missing", "smart-art");

        let manager = manager_for(dir.path());
        let registry = ExtractorRegistry::new();
        let report = manager.load_all(&registry).await.unwrap();

        assert_eq!(report.loaded(), 0);
        assert_eq!(report.rejected(), 1);
        match &report.attempts[0].state {
            LoadState::Rejected { reason } => assert!(reason.contains("unknown factory")),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejects_disallowed_kind() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "x.extension.toml", "ext-x", "x", "shader");

        let manager = manager_for(dir.path());
        manager.register_factory("x", stub_factory("ext-x", vec!["shader"], false));

        let registry = ExtractorRegistry::new();
        let report = manager.load_all(&registry).await.unwrap();
        assert_eq!(report.rejected(), 1);
        assert!(!registry.has_kind("shader"));
    }

    #[tokio::test]
    async fn test_rejects_oversized_manifest() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "x.extension.toml", "ext-x", "x", "smart-art");

        let policy = ExtensionPolicy {
            directory: Some(dir.path().to_path_buf()),
            max_manifest_bytes: 8,
            ..Default::default()
        };
        let manager = ExtensionManager::new(policy);
        manager.register_factory("x", stub_factory("ext-x", vec!["smart-art"], false));

        let registry = ExtractorRegistry::new();
        let report = manager.load_all(&registry).await.unwrap();
        assert_eq!(report.rejected(), 1);
    }

    #[tokio::test]
    async fn test_enforces_extension_limit() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "a.extension.toml", "ext-a", "a", "smart-art");
        write_manifest(dir.path(), "b.extension.toml", "ext-b", "b", "embedded-object");

        let policy = ExtensionPolicy {
            directory: Some(dir.path().to_path_buf()),
            max_extensions: 1,
            ..Default::default()
        };
        let manager = ExtensionManager::new(policy);
        manager.register_factory("a", stub_factory("ext-a", vec!["smart-art"], false));
        manager.register_factory("b", stub_factory("ext-b", vec!["embedded-object"], false));

        let registry = ExtractorRegistry::new();
        let report = manager.load_all(&registry).await.unwrap();
        assert_eq!(report.loaded(), 1);
        assert_eq!(report.rejected(), 1);
    }

    #[tokio::test]
    async fn test_rejects_factory_name_mismatch() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "x.extension.toml", "declared-name", "x", "smart-art");

        let manager = manager_for(dir.path());
        manager.register_factory("x", stub_factory("actual-name", vec!["smart-art"], false));

        let registry = ExtractorRegistry::new();
        let report = manager.load_all(&registry).await.unwrap();
        assert_eq!(report.rejected(), 1);
    }

    #[tokio::test]
    async fn test_disable_and_enable_round_trip() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "x.extension.toml", "ext-x", "x", "smart-art");

        let manager = manager_for(dir.path());
        manager.register_factory("x", stub_factory("ext-x", vec!["smart-art"], false));

        let registry = ExtractorRegistry::new();
        manager.load_all(&registry).await.unwrap();
        assert!(manager.is_enabled("ext-x"));

        manager.disable("ext-x", &registry).unwrap();
        manager.disable("ext-x", &registry).unwrap();
        assert!(!manager.is_enabled("ext-x"));
        assert_eq!(registry.resolve("smart-art").name(), "fallback-extractor");

        manager.enable("ext-x", &registry).unwrap();
        manager.enable("ext-x", &registry).unwrap();
        assert!(manager.is_enabled("ext-x"));
        assert_eq!(registry.resolve("smart-art").name(), "ext-x");
    }

    #[tokio::test]
    async fn test_disable_unknown_extension_fails() {
        let manager = ExtensionManager::new(ExtensionPolicy::default());
        let registry = ExtractorRegistry::new();
        assert!(manager.disable("ghost", &registry).is_err());
    }

    #[tokio::test]
    async fn test_validate_registry_detects_shadowing() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "x.extension.toml", "ext-x", "x", "smart-art");

        let manager = manager_for(dir.path());
        manager.register_factory("x", stub_factory("ext-x", vec!["smart-art"], false));

        let registry = ExtractorRegistry::new();
        manager.load_all(&registry).await.unwrap();
        assert!(manager.validate_registry(&registry).is_empty());

        // Another registration takes over the kind behind the manager's back.
        registry
            .register(Arc::new(StubExtractor {
                name: "usurper",
                kinds: vec!["smart-art"],
                init_fails: false,
            }))
            .unwrap();

        let issues = manager.validate_registry(&registry);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("no longer owns"));
    }

    #[tokio::test]
    async fn test_reload_rebuilds_state() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "x.extension.toml", "ext-x", "x", "smart-art");

        let manager = manager_for(dir.path());
        manager.register_factory("x", stub_factory("ext-x", vec!["smart-art"], false));

        let registry = ExtractorRegistry::new();
        manager.load_all(&registry).await.unwrap();

        fs::remove_file(dir.path().join("x.extension.toml")).unwrap();
        let report = manager.reload(&registry).await.unwrap();

        assert_eq!(report.loaded(), 0);
        assert!(manager.records().is_empty());
        assert_eq!(registry.resolve("smart-art").name(), "fallback-extractor");
    }
}
