//! Structural contract checks and the best-practice warnings pass.
//!
//! The contract covers required top-level sections, required per-slide and
//! per-shape fields, numeric ranges, the shape-kind enumeration, and
//! timestamp format. Checks only read; all repair lives in `autofix`.

use super::{codes, ValidationFinding};
use crate::types::ShapeKind;
use serde_json::Value;

/// Smallest width or height considered plausibly visible, in points.
pub(super) const MIN_VISIBLE_SIZE: f64 = 8.0;

/// Metadata timestamp fields that must parse as RFC 3339 when present.
pub(super) const TIMESTAMP_FIELDS: &[&str] = &["createdAt", "modifiedAt"];

pub(super) fn is_allowed_kind(kind: &str) -> bool {
    ShapeKind::ALL.iter().any(|k| k.as_str() == kind)
}

/// Collect every contract violation in the document.
pub(super) fn collect_errors(document: &Value) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();

    let Some(root) = document.as_object() else {
        findings.push(
            ValidationFinding::new("$", codes::WRONG_TYPE, "document is not an object")
                .suggest("Provide a JSON object with schemaVersion, metadata, and slides"),
        );
        return findings;
    };

    match root.get("schemaVersion") {
        None => findings.push(
            ValidationFinding::new("schemaVersion", codes::MISSING_FIELD, "schemaVersion is missing")
                .suggest("Declare the schema version the document was written against"),
        ),
        Some(v) if !v.is_string() => findings.push(ValidationFinding::new(
            "schemaVersion",
            codes::WRONG_TYPE,
            "schemaVersion must be a string",
        )),
        _ => {}
    }

    match root.get("metadata") {
        None => findings.push(
            ValidationFinding::new("metadata", codes::MISSING_FIELD, "metadata section is missing")
                .suggest("Add a metadata object with at least title and slideCount"),
        ),
        Some(Value::Object(metadata)) => check_metadata(metadata, &mut findings),
        Some(_) => findings.push(ValidationFinding::new(
            "metadata",
            codes::WRONG_TYPE,
            "metadata must be an object",
        )),
    }

    match root.get("slides") {
        None => findings.push(
            ValidationFinding::new("slides", codes::MISSING_FIELD, "slides array is missing")
                .suggest("Add a slides array, empty if the document has no content"),
        ),
        Some(Value::Array(slides)) => {
            check_slide_count(root, slides.len(), &mut findings);
            for (position, slide) in slides.iter().enumerate() {
                check_slide(slide, position, &mut findings);
            }
        }
        Some(_) => findings.push(ValidationFinding::new(
            "slides",
            codes::WRONG_TYPE,
            "slides must be an array",
        )),
    }

    findings
}

fn check_metadata(metadata: &serde_json::Map<String, Value>, findings: &mut Vec<ValidationFinding>) {
    match metadata.get("title") {
        None => findings.push(
            ValidationFinding::new("metadata.title", codes::MISSING_FIELD, "title is missing")
                .suggest("Give the presentation a title"),
        ),
        Some(Value::String(title)) if title.is_empty() => findings.push(
            ValidationFinding::new("metadata.title", codes::MISSING_FIELD, "title is empty")
                .suggest("Give the presentation a title"),
        ),
        Some(Value::String(_)) => {}
        Some(_) => findings.push(ValidationFinding::new(
            "metadata.title",
            codes::WRONG_TYPE,
            "title must be a string",
        )),
    }

    match metadata.get("slideCount") {
        None => findings.push(ValidationFinding::new(
            "metadata.slideCount",
            codes::MISSING_FIELD,
            "slideCount is missing",
        )),
        Some(v) if !v.is_number() => findings.push(ValidationFinding::new(
            "metadata.slideCount",
            codes::WRONG_TYPE,
            "slideCount must be a number",
        )),
        _ => {}
    }

    if let Some(revision) = metadata.get("revision") {
        if !revision.is_number() {
            findings.push(ValidationFinding::new(
                "metadata.revision",
                codes::WRONG_TYPE,
                "revision must be a number",
            ));
        }
    }

    for field in TIMESTAMP_FIELDS {
        if let Some(value) = metadata.get(*field) {
            let parses = value
                .as_str()
                .map(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok())
                .unwrap_or(false);
            if !parses {
                findings.push(
                    ValidationFinding::new(
                        format!("metadata.{}", field),
                        codes::INVALID_FORMAT,
                        format!("{} is not an RFC 3339 timestamp", field),
                    )
                    .suggest("Use RFC 3339 timestamps, e.g. 2026-01-15T09:30:00Z"),
                );
            }
        }
    }
}

fn check_slide_count(root: &serde_json::Map<String, Value>, actual: usize, findings: &mut Vec<ValidationFinding>) {
    let declared = root
        .get("metadata")
        .and_then(|m| m.get("slideCount"))
        .and_then(Value::as_u64);
    if let Some(declared) = declared {
        if declared != actual as u64 {
            findings.push(
                ValidationFinding::new(
                    "metadata.slideCount",
                    codes::COUNT_MISMATCH,
                    format!("slideCount is {} but the document has {} slides", declared, actual),
                )
                .suggest("Keep slideCount equal to the slide array length"),
            );
        }
    }
}

fn check_slide(slide: &Value, position: usize, findings: &mut Vec<ValidationFinding>) {
    let path = format!("slides[{}]", position);
    let Some(slide) = slide.as_object() else {
        findings.push(ValidationFinding::new(path, codes::WRONG_TYPE, "slide must be an object"));
        return;
    };

    check_identity(slide, &path, position, findings);

    match slide.get("shapes") {
        None => findings.push(ValidationFinding::new(
            format!("{}.shapes", path),
            codes::MISSING_FIELD,
            "shapes array is missing",
        )),
        Some(Value::Array(shapes)) => {
            for (shape_position, shape) in shapes.iter().enumerate() {
                check_shape(shape, &path, shape_position, findings);
            }
        }
        Some(_) => findings.push(ValidationFinding::new(
            format!("{}.shapes", path),
            codes::WRONG_TYPE,
            "shapes must be an array",
        )),
    }
}

fn check_shape(shape: &Value, slide_path: &str, position: usize, findings: &mut Vec<ValidationFinding>) {
    let path = format!("{}.shapes[{}]", slide_path, position);
    let Some(shape) = shape.as_object() else {
        findings.push(ValidationFinding::new(path, codes::WRONG_TYPE, "shape must be an object"));
        return;
    };

    check_identity(shape, &path, position, findings);

    match shape.get("kind") {
        None => findings.push(ValidationFinding::new(
            format!("{}.kind", path),
            codes::MISSING_FIELD,
            "kind is missing",
        )),
        Some(Value::String(kind)) if !is_allowed_kind(kind) => findings.push(
            ValidationFinding::new(
                format!("{}.kind", path),
                codes::INVALID_ENUM,
                format!("'{}' is not an allowed shape kind", kind),
            )
            .suggest("Use one of the declared shape kinds, or 'other' for unknown shapes"),
        ),
        Some(Value::String(_)) => {}
        Some(_) => findings.push(ValidationFinding::new(
            format!("{}.kind", path),
            codes::WRONG_TYPE,
            "kind must be a string",
        )),
    }

    match shape.get("geometry") {
        None => findings.push(
            ValidationFinding::new(format!("{}.geometry", path), codes::MISSING_FIELD, "geometry is missing")
                .suggest("Every shape needs a geometry, even when payload extraction failed"),
        ),
        Some(Value::Object(geometry)) => check_geometry(geometry, &path, findings),
        Some(_) => findings.push(ValidationFinding::new(
            format!("{}.geometry", path),
            codes::WRONG_TYPE,
            "geometry must be an object",
        )),
    }

    match shape.get("payload") {
        None => findings.push(ValidationFinding::new(
            format!("{}.payload", path),
            codes::MISSING_FIELD,
            "payload is missing",
        )),
        Some(Value::Object(payload)) => {
            if !payload.get("type").map(Value::is_string).unwrap_or(false) {
                findings.push(ValidationFinding::new(
                    format!("{}.payload.type", path),
                    codes::MISSING_FIELD,
                    "payload type tag is missing",
                ));
            }
        }
        Some(_) => findings.push(ValidationFinding::new(
            format!("{}.payload", path),
            codes::WRONG_TYPE,
            "payload must be an object",
        )),
    }
}

/// Shared id/index checks for slides and shapes.
fn check_identity(
    entry: &serde_json::Map<String, Value>,
    path: &str,
    position: usize,
    findings: &mut Vec<ValidationFinding>,
) {
    match entry.get("id") {
        None => findings.push(ValidationFinding::new(
            format!("{}.id", path),
            codes::MISSING_FIELD,
            "id is missing",
        )),
        Some(Value::String(id)) if id.is_empty() => findings.push(ValidationFinding::new(
            format!("{}.id", path),
            codes::MISSING_FIELD,
            "id is empty",
        )),
        Some(Value::String(_)) => {}
        Some(_) => findings.push(ValidationFinding::new(
            format!("{}.id", path),
            codes::WRONG_TYPE,
            "id must be a string",
        )),
    }

    match entry.get("index") {
        None => findings.push(ValidationFinding::new(
            format!("{}.index", path),
            codes::MISSING_FIELD,
            "index is missing",
        )),
        Some(v) => match v.as_u64() {
            Some(index) if index != position as u64 => findings.push(
                ValidationFinding::new(
                    format!("{}.index", path),
                    codes::INDEX_MISMATCH,
                    format!("index is {} but the entry is at position {}", index, position),
                )
                .suggest("Keep indices equal to array positions"),
            ),
            Some(_) => {}
            None => findings.push(ValidationFinding::new(
                format!("{}.index", path),
                codes::WRONG_TYPE,
                "index must be a non-negative number",
            )),
        },
    }
}

fn check_geometry(
    geometry: &serde_json::Map<String, Value>,
    shape_path: &str,
    findings: &mut Vec<ValidationFinding>,
) {
    for field in ["x", "y", "width", "height"] {
        let path = format!("{}.geometry.{}", shape_path, field);
        match geometry.get(field) {
            None => findings.push(ValidationFinding::new(
                path,
                codes::MISSING_FIELD,
                format!("{} is missing", field),
            )),
            Some(v) => match v.as_f64() {
                None => findings.push(ValidationFinding::new(
                    path,
                    codes::WRONG_TYPE,
                    format!("{} must be a number", field),
                )),
                Some(n) if (field == "width" || field == "height") && n <= 0.0 => findings.push(
                    ValidationFinding::new(path, codes::OUT_OF_RANGE, format!("{} must be > 0", field))
                        .suggest("Use a strictly positive extent; degenerate shapes are invalid"),
                ),
                Some(_) => {}
            },
        }
    }

    if let Some(rotation) = geometry.get("rotation") {
        let path = format!("{}.geometry.rotation", shape_path);
        match rotation.as_f64() {
            None => findings.push(ValidationFinding::new(
                path,
                codes::WRONG_TYPE,
                "rotation must be a number",
            )),
            Some(r) if !(0.0..360.0).contains(&r) => findings.push(
                ValidationFinding::new(
                    path,
                    codes::OUT_OF_RANGE,
                    format!("rotation {} is outside [0, 360)", r),
                )
                .suggest("Normalize rotation into [0, 360) degrees"),
            ),
            Some(_) => {}
        }
    }
}

/// Best-practice warnings. Always run, never auto-fixed: each of these is a
/// judgment call only the author can make.
pub(super) fn collect_warnings(document: &Value) -> Vec<ValidationFinding> {
    let mut warnings = Vec::new();
    let Some(root) = document.as_object() else {
        return warnings;
    };

    if let Some(metadata) = root.get("metadata").and_then(Value::as_object) {
        if metadata.get("author").and_then(Value::as_str).map(str::is_empty).unwrap_or(true) {
            warnings.push(
                ValidationFinding::new("metadata.author", codes::MISSING_METADATA, "author is not set")
                    .suggest("Record the presentation author in metadata"),
            );
        }
        if metadata.get("subject").and_then(Value::as_str).map(str::is_empty).unwrap_or(true) {
            warnings.push(
                ValidationFinding::new("metadata.subject", codes::MISSING_METADATA, "subject is not set")
                    .suggest("Record the presentation subject in metadata"),
            );
        }
    }

    let Some(slides) = root.get("slides").and_then(Value::as_array) else {
        return warnings;
    };
    for (i, slide) in slides.iter().enumerate() {
        let Some(shapes) = slide.get("shapes").and_then(Value::as_array) else {
            continue;
        };
        if shapes.is_empty() {
            warnings.push(
                ValidationFinding::new(
                    format!("slides[{}].shapes", i),
                    codes::EMPTY_SLIDE,
                    "slide has no shapes",
                )
                .suggest("Remove empty slides or add content to them"),
            );
        }
        for (j, shape) in shapes.iter().enumerate() {
            let Some(geometry) = shape.get("geometry").and_then(Value::as_object) else {
                continue;
            };
            let width = geometry.get("width").and_then(Value::as_f64);
            let height = geometry.get("height").and_then(Value::as_f64);
            let tiny = |v: Option<f64>| v.map(|n| n > 0.0 && n < MIN_VISIBLE_SIZE).unwrap_or(false);
            if tiny(width) || tiny(height) {
                warnings.push(
                    ValidationFinding::new(
                        format!("slides[{}].shapes[{}].geometry", i, j),
                        codes::TINY_SHAPE,
                        "shape is below the minimum visible size",
                    )
                    .suggest("Shapes smaller than 8 points are likely invisible"),
                );
            }
        }
    }

    warnings
}
