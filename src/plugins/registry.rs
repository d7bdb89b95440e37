//! Extractor registration and resolution.
//!
//! [`ExtractorRegistry`] maps shape-kind identifiers to extractors and owns
//! the always-available fallback. Resolution is total: every kind string,
//! known or not, resolves to a non-null extractor, so the absence of a
//! specialized extractor can only ever degrade output, never abort it.
//!
//! The registry is an explicitly owned object passed by reference; there is
//! no global instance. Interior locking keeps each mutation a single
//! synchronous step, which is all the isolation concurrent extension loads
//! need.

use crate::extractors::FallbackExtractor;
use crate::plugins::extractor::ShapeExtractor;
use crate::plugins::traits::validate_plugin_name;
use crate::Result;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// A failure disposing one extractor during registry shutdown.
///
/// Disposal is best-effort, not transactional: one failing extractor never
/// prevents disposal of the rest, and callers receive the full list.
#[derive(Debug, Clone)]
pub struct DisposalFailure {
    pub name: String,
    pub message: String,
}

/// Registry mapping shape-kind identifiers to extractors.
pub struct ExtractorRegistry {
    by_kind: RwLock<IndexMap<String, Arc<dyn ShapeExtractor>>>,
    fallback: Arc<dyn ShapeExtractor>,
}

impl ExtractorRegistry {
    /// Create an empty registry holding only the fallback extractor.
    pub fn new() -> Self {
        Self {
            by_kind: RwLock::new(IndexMap::new()),
            fallback: Arc::new(FallbackExtractor::new()),
        }
    }

    /// Create a registry pre-populated with the built-in extractor set
    /// (text, chart, table, media, group).
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for extractor in crate::extractors::builtin_extractors() {
            // Built-in registration cannot fail name validation.
            if let Err(e) = registry.register(extractor) {
                warn!(error = %e, "failed to register built-in extractor");
            }
        }
        registry
    }

    /// Register an extractor for every kind it supports.
    ///
    /// `initialize()` failure is logged but does not block registration:
    /// the extractor may still work without its optional setup step.
    /// Registering a kind that is already mapped replaces the mapping.
    pub fn register(&self, extractor: Arc<dyn ShapeExtractor>) -> Result<()> {
        let name = extractor.name().to_string();
        validate_plugin_name(&name)?;

        if let Err(e) = extractor.initialize() {
            warn!(extractor = %name, error = %e, "extractor initialization failed; registering anyway");
        }

        let kinds: Vec<String> = extractor.supported_kinds().iter().map(|k| k.to_string()).collect();
        let mut map = self.by_kind.write();
        for kind in kinds {
            debug!(extractor = %name, kind = %kind, "registering extractor");
            map.insert(kind, Arc::clone(&extractor));
        }
        Ok(())
    }

    /// Resolve the extractor for a shape kind.
    ///
    /// Total: unknown or empty kinds resolve to the fallback extractor.
    pub fn resolve(&self, kind: &str) -> Arc<dyn ShapeExtractor> {
        self.by_kind
            .read()
            .get(kind)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    /// The fallback extractor itself.
    pub fn fallback(&self) -> Arc<dyn ShapeExtractor> {
        Arc::clone(&self.fallback)
    }

    /// All kinds with a specialized extractor, in registration order.
    pub fn supported_kinds(&self) -> Vec<String> {
        self.by_kind.read().keys().cloned().collect()
    }

    /// Whether `kind` has a specialized (non-fallback) extractor.
    pub fn has_kind(&self, kind: &str) -> bool {
        self.by_kind.read().contains_key(kind)
    }

    /// Remove every kind mapping owned by `name`, invoking `shutdown()` once.
    ///
    /// Returns the kinds that were unmapped; empty if the name was unknown
    /// (removal is idempotent).
    pub fn remove(&self, name: &str) -> Vec<String> {
        let removed_extractor;
        let removed_kinds: Vec<String>;
        {
            let mut map = self.by_kind.write();
            removed_kinds = map
                .iter()
                .filter(|(_, ext)| ext.name() == name)
                .map(|(kind, _)| kind.clone())
                .collect();
            removed_extractor = removed_kinds.first().and_then(|k| map.get(k).cloned());
            for kind in &removed_kinds {
                map.shift_remove(kind);
            }
        }

        if let Some(extractor) = removed_extractor {
            if let Err(e) = extractor.shutdown() {
                warn!(extractor = %name, error = %e, "extractor shutdown failed");
            }
        }

        removed_kinds
    }

    /// Dispose every registered extractor and clear the registry.
    ///
    /// Each `shutdown()` runs independently; failures are collected and
    /// returned as a non-fatal warning list.
    pub fn dispose(&self) -> Vec<DisposalFailure> {
        let drained: Vec<(String, Arc<dyn ShapeExtractor>)> = {
            let mut map = self.by_kind.write();
            map.drain(..).collect()
        };

        let mut failures = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for (_, extractor) in drained {
            // An extractor registered under several kinds shuts down once.
            if !seen.insert(extractor.name().to_string()) {
                continue;
            }
            if let Err(e) = extractor.shutdown() {
                warn!(extractor = extractor.name(), error = %e, "disposal failed");
                failures.push(DisposalFailure {
                    name: extractor.name().to_string(),
                    message: e.to_string(),
                });
            }
        }
        failures
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
