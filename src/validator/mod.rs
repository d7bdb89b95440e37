//! Schema validation with deterministic auto-fix.
//!
//! Validation is a pure structural check of a JSON document against the
//! Universal Schema contract; it operates on `serde_json::Value` so that
//! non-compliant documents can be inspected and repaired before typed
//! deserialization. Violations are findings, never errors: `validate`
//! cannot fail, it reports.
//!
//! With auto-fix enabled, repairs are applied to a private working copy and
//! the caller decides whether to accept it. Every repair strategy is
//! deterministic, so fixing is a fixed point: a second pass over a fixed
//! document applies zero fixes.

mod autofix;
mod rules;

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Validation error and warning codes carried by findings.
pub mod codes {
    pub const MISSING_FIELD: &str = "MISSING_FIELD";
    pub const WRONG_TYPE: &str = "WRONG_TYPE";
    pub const INVALID_ENUM: &str = "INVALID_ENUM";
    pub const OUT_OF_RANGE: &str = "OUT_OF_RANGE";
    pub const INVALID_FORMAT: &str = "INVALID_FORMAT";
    pub const COUNT_MISMATCH: &str = "COUNT_MISMATCH";
    pub const INDEX_MISMATCH: &str = "INDEX_MISMATCH";
    pub const MISSING_METADATA: &str = "MISSING_METADATA";
    pub const EMPTY_SLIDE: &str = "EMPTY_SLIDE";
    pub const TINY_SHAPE: &str = "TINY_SHAPE";
}

/// Options controlling a validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Repair violations on a working copy and re-validate.
    pub auto_fix: bool,
}

/// One structural violation (error) or best-practice issue (warning).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFinding {
    /// Structural path, e.g. `slides[2].shapes[0].geometry.rotation`.
    pub path: String,
    /// Machine-readable code from [`codes`].
    pub code: &'static str,
    pub message: String,
    /// Actionable remediation, when one exists.
    pub suggestion: Option<String>,
}

impl ValidationFinding {
    pub(crate) fn new(path: impl Into<String>, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code,
            message: message.into(),
            suggestion: None,
        }
    }

    pub(crate) fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Repair strategy applied by auto-fix, keyed by the violation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixStrategy {
    DefaultInjection,
    TypeCoercion,
    EnumReplacement,
    Clamp,
    TimestampRepair,
    CountReconciliation,
    IndexReconciliation,
    IdGeneration,
}

/// One repair applied to the working copy.
#[derive(Debug, Clone)]
pub struct AppliedFix {
    pub path: String,
    pub strategy: FixStrategy,
    pub description: String,
}

/// Result of a validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    /// No errors remain (warnings never block validity).
    pub is_valid: bool,
    pub errors: Vec<ValidationFinding>,
    pub warnings: Vec<ValidationFinding>,
    pub fixes_applied: Vec<AppliedFix>,
    /// The repaired working copy; present only when auto-fix ran. The
    /// caller's document is never mutated.
    pub fixed_document: Option<Value>,
}

/// Compliance summary: a 0-100 score per category plus deduplicated
/// recommendations.
#[derive(Debug, Clone)]
pub struct ComplianceReport {
    pub overall_score: u32,
    pub category_scores: BTreeMap<String, u32>,
    pub recommendations: Vec<String>,
}

/// Validates Universal Schema documents against the structural contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a document, optionally repairing it.
    ///
    /// Without auto-fix this is a pure check. With auto-fix, repairs are
    /// applied to a working copy, the whole-document consistency passes run,
    /// and the copy is re-validated; errors the repair could not address are
    /// reported against the fixed copy. The warnings pass always runs and is
    /// never auto-fixed.
    pub fn validate(&self, document: &Value, options: &ValidationOptions) -> ValidationOutcome {
        let errors = rules::collect_errors(document);

        if !options.auto_fix {
            let warnings = rules::collect_warnings(document);
            return ValidationOutcome {
                is_valid: errors.is_empty(),
                errors,
                warnings,
                fixes_applied: Vec::new(),
                fixed_document: None,
            };
        }

        let mut working = document.clone();
        let fixes_applied = autofix::repair(&mut working);
        let remaining = rules::collect_errors(&working);
        let warnings = rules::collect_warnings(&working);

        debug!(
            initial_errors = errors.len(),
            fixes = fixes_applied.len(),
            remaining_errors = remaining.len(),
            "auto-fix pass complete"
        );

        ValidationOutcome {
            is_valid: remaining.is_empty(),
            errors: remaining,
            warnings,
            fixes_applied,
            fixed_document: Some(working),
        }
    }

    /// Aggregate findings into a compliance score.
    ///
    /// Score is `100 - 5 x issues`, floored at 0, computed overall and per
    /// category; recommendations are the deduplicated suggestions of all
    /// findings.
    pub fn generate_compliance_report(&self, document: &Value) -> ComplianceReport {
        let errors = rules::collect_errors(document);
        let warnings = rules::collect_warnings(document);

        let mut per_category: BTreeMap<String, u32> = BTreeMap::new();
        for category in ["structure", "metadata", "slides", "geometry"] {
            per_category.insert(category.to_string(), 0);
        }
        let mut recommendations = Vec::new();

        for finding in errors.iter().chain(warnings.iter()) {
            *per_category.entry(categorize(&finding.path).to_string()).or_insert(0) += 1;
            if let Some(suggestion) = &finding.suggestion {
                if !recommendations.contains(suggestion) {
                    recommendations.push(suggestion.clone());
                }
            }
        }

        let total = (errors.len() + warnings.len()) as u32;
        let category_scores = per_category
            .into_iter()
            .map(|(category, issues)| (category, score(issues)))
            .collect();

        ComplianceReport {
            overall_score: score(total),
            category_scores,
            recommendations,
        }
    }
}

fn score(issues: u32) -> u32 {
    100u32.saturating_sub(5 * issues)
}

fn categorize(path: &str) -> &'static str {
    if path.contains(".geometry") {
        "geometry"
    } else if path.starts_with("metadata") {
        "metadata"
    } else if path.starts_with("slides") {
        "slides"
    } else {
        "structure"
    }
}
