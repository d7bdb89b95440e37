//! Deterministic repair of contract violations.
//!
//! Each violation class has exactly one repair strategy:
//!
//! - missing required field: inject the documented default;
//! - wrong type: coerce via a fixed lossy-safe table, falling back to the
//!   target type's zero value;
//! - invalid enum: replace with the first allowed value;
//! - out-of-range numeric: clamp to the nearest bound (rotation wraps,
//!   because its upper bound is exclusive);
//! - invalid timestamp: reparse if plausible, otherwise substitute now.
//!
//! After the per-field repairs, two consistency passes run unconditionally:
//! slideCount and index reconciliation, then deterministic id generation.
//! Every strategy maps equal inputs to equal outputs, so repairing an
//! already-repaired document records nothing.

use super::rules::{is_allowed_kind, TIMESTAMP_FIELDS};
use super::{AppliedFix, FixStrategy};
use crate::types::{ShapeKind, SCHEMA_VERSION};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{json, Map, Value};

/// Title injected when a document has none.
const DEFAULT_TITLE: &str = "Untitled Presentation";

/// Smallest width/height a repaired shape may have, in points.
const MIN_DIMENSION: f64 = 1.0;

/// Repair `document` in place, returning the fixes applied.
pub(super) fn repair(document: &mut Value) -> Vec<AppliedFix> {
    let mut fixes = Vec::new();

    if !document.is_object() {
        *document = json!({});
        record(&mut fixes, "$", FixStrategy::TypeCoercion, "replaced non-object document with an empty one");
    }

    fix_schema_version(document, &mut fixes);
    fix_metadata(document, &mut fixes);
    fix_slides(document, &mut fixes);

    reconcile_counts_and_indices(document, &mut fixes);
    generate_missing_ids(document, &mut fixes);

    fixes
}

fn record(fixes: &mut Vec<AppliedFix>, path: impl Into<String>, strategy: FixStrategy, description: impl Into<String>) {
    fixes.push(AppliedFix {
        path: path.into(),
        strategy,
        description: description.into(),
    });
}

fn fix_schema_version(document: &mut Value, fixes: &mut Vec<AppliedFix>) {
    match document.get("schemaVersion").cloned() {
        None => {
            document["schemaVersion"] = json!(SCHEMA_VERSION);
            record(fixes, "schemaVersion", FixStrategy::DefaultInjection, format!("injected '{}'", SCHEMA_VERSION));
        }
        Some(v) if !v.is_string() => {
            let coerced = coerce_string(&v);
            document["schemaVersion"] = json!(coerced);
            record(fixes, "schemaVersion", FixStrategy::TypeCoercion, "coerced schemaVersion to a string");
        }
        _ => {}
    }
}

fn fix_metadata(document: &mut Value, fixes: &mut Vec<AppliedFix>) {
    let metadata_state = document.get("metadata").map(Value::is_object);
    match metadata_state {
        None => {
            document["metadata"] = json!({});
            record(fixes, "metadata", FixStrategy::DefaultInjection, "injected empty metadata section");
        }
        Some(false) => {
            document["metadata"] = json!({});
            record(fixes, "metadata", FixStrategy::TypeCoercion, "replaced non-object metadata");
        }
        Some(true) => {}
    }

    // The section is an object now.
    let Some(metadata) = document["metadata"].as_object_mut() else {
        return;
    };

    let title_ok = metadata
        .get("title")
        .and_then(Value::as_str)
        .map(|t| !t.is_empty())
        .unwrap_or(false);
    if !title_ok {
        let replacement = match metadata.get("title") {
            Some(v) if !v.is_string() => {
                let coerced = coerce_string(v);
                if coerced.is_empty() { DEFAULT_TITLE.to_string() } else { coerced }
            }
            _ => DEFAULT_TITLE.to_string(),
        };
        metadata.insert("title".to_string(), json!(replacement));
        record(fixes, "metadata.title", FixStrategy::DefaultInjection, format!("set title to '{}'", replacement));
    }

    if let Some(revision) = metadata.get("revision") {
        if !revision.is_number() {
            let coerced = coerce_number(revision);
            metadata.insert("revision".to_string(), json!(coerced));
            record(fixes, "metadata.revision", FixStrategy::TypeCoercion, "coerced revision to a number");
        }
    }

    for field in TIMESTAMP_FIELDS {
        let Some(value) = metadata.get(*field).cloned() else {
            continue;
        };
        let valid = value
            .as_str()
            .map(|s| DateTime::parse_from_rfc3339(s).is_ok())
            .unwrap_or(false);
        if !valid {
            let repaired = reparse_timestamp(&value);
            metadata.insert((*field).to_string(), json!(repaired));
            record(
                fixes,
                format!("metadata.{}", field),
                FixStrategy::TimestampRepair,
                format!("repaired {} to an RFC 3339 timestamp", field),
            );
        }
    }

    // slideCount is handled by the count reconciliation pass.
}

fn fix_slides(document: &mut Value, fixes: &mut Vec<AppliedFix>) {
    let slides_state = document.get("slides").map(Value::is_array);
    match slides_state {
        None => {
            document["slides"] = json!([]);
            record(fixes, "slides", FixStrategy::DefaultInjection, "injected empty slides array");
        }
        Some(false) => {
            document["slides"] = json!([]);
            record(fixes, "slides", FixStrategy::TypeCoercion, "replaced non-array slides");
        }
        Some(true) => {}
    }

    let Some(slides) = document["slides"].as_array_mut() else {
        return;
    };

    for (i, slide) in slides.iter_mut().enumerate() {
        let slide_path = format!("slides[{}]", i);
        if !slide.is_object() {
            *slide = json!({});
            record(fixes, &slide_path, FixStrategy::TypeCoercion, "replaced non-object slide");
        }

        let shapes_state = slide.get("shapes").map(Value::is_array);
        match shapes_state {
            None => {
                slide["shapes"] = json!([]);
                record(
                    fixes,
                    format!("{}.shapes", slide_path),
                    FixStrategy::DefaultInjection,
                    "injected empty shapes array",
                );
            }
            Some(false) => {
                slide["shapes"] = json!([]);
                record(
                    fixes,
                    format!("{}.shapes", slide_path),
                    FixStrategy::TypeCoercion,
                    "replaced non-array shapes",
                );
            }
            Some(true) => {}
        }

        let Some(shapes) = slide["shapes"].as_array_mut() else {
            continue;
        };
        for (j, shape) in shapes.iter_mut().enumerate() {
            fix_shape(shape, &format!("{}.shapes[{}]", slide_path, j), fixes);
        }
    }
}

fn fix_shape(shape: &mut Value, path: &str, fixes: &mut Vec<AppliedFix>) {
    if !shape.is_object() {
        *shape = json!({});
        record(fixes, path, FixStrategy::TypeCoercion, "replaced non-object shape");
    }

    // First allowed value of the kind enumeration.
    let default_kind = ShapeKind::ALL[0].as_str();
    let kind = match shape.get("kind").cloned() {
        None => {
            shape["kind"] = json!(default_kind);
            record(fixes, format!("{}.kind", path), FixStrategy::DefaultInjection, format!("injected kind '{}'", default_kind));
            default_kind.to_string()
        }
        Some(Value::String(kind)) if is_allowed_kind(&kind) => kind,
        Some(_) => {
            shape["kind"] = json!(default_kind);
            record(
                fixes,
                format!("{}.kind", path),
                FixStrategy::EnumReplacement,
                format!("replaced invalid kind with '{}'", default_kind),
            );
            default_kind.to_string()
        }
    };

    fix_geometry(shape, path, fixes);

    let payload_ok = shape
        .get("payload")
        .and_then(Value::as_object)
        .map(|p| p.get("type").map(Value::is_string).unwrap_or(false))
        .unwrap_or(false);
    if !payload_ok {
        let has_object_payload = shape.get("payload").map(Value::is_object).unwrap_or(false);
        if has_object_payload {
            // Object payload missing its tag: keep the fields, add the tag.
            if let Some(payload) = shape["payload"].as_object_mut() {
                payload.insert("type".to_string(), json!("generic"));
            }
            record(
                fixes,
                format!("{}.payload.type", path),
                FixStrategy::DefaultInjection,
                "injected generic payload type tag",
            );
        } else {
            shape["payload"] = json!({"type": "generic", "sourceKind": kind});
            record(
                fixes,
                format!("{}.payload", path),
                FixStrategy::DefaultInjection,
                "injected generic payload",
            );
        }
    }
}

fn fix_geometry(shape: &mut Value, shape_path: &str, fixes: &mut Vec<AppliedFix>) {
    let geometry_ok = shape.get("geometry").map(Value::is_object).unwrap_or(false);
    if !geometry_ok {
        let strategy = if shape.get("geometry").is_none() {
            FixStrategy::DefaultInjection
        } else {
            FixStrategy::TypeCoercion
        };
        shape["geometry"] = json!({"x": 0.0, "y": 0.0, "width": MIN_DIMENSION, "height": MIN_DIMENSION, "rotation": 0.0});
        record(fixes, format!("{}.geometry", shape_path), strategy, "injected default geometry");
        return;
    }

    let Some(geometry) = shape["geometry"].as_object_mut() else {
        return;
    };

    for field in ["x", "y", "width", "height"] {
        let path = format!("{}.geometry.{}", shape_path, field);
        let extent = field == "width" || field == "height";

        match geometry.get(field).cloned() {
            None => {
                let default = if extent { MIN_DIMENSION } else { 0.0 };
                geometry.insert(field.to_string(), json!(default));
                record(fixes, path, FixStrategy::DefaultInjection, format!("injected {} = {}", field, default));
            }
            Some(current) => {
                let mut n = match current.as_f64() {
                    Some(n) => n,
                    None => {
                        let coerced = coerce_number(&current);
                        record(fixes, path.clone(), FixStrategy::TypeCoercion, format!("coerced {} to a number", field));
                        coerced
                    }
                };
                if extent && n <= 0.0 {
                    n = MIN_DIMENSION;
                    record(fixes, path.clone(), FixStrategy::Clamp, format!("clamped {} to {}", field, MIN_DIMENSION));
                }
                if current.as_f64() != Some(n) {
                    geometry.insert(field.to_string(), json!(n));
                }
            }
        }
    }

    if let Some(current) = geometry.get("rotation").cloned() {
        let path = format!("{}.geometry.rotation", shape_path);
        let mut r = match current.as_f64() {
            Some(r) => r,
            None => {
                let coerced = coerce_number(&current);
                record(fixes, path.clone(), FixStrategy::TypeCoercion, "coerced rotation to a number");
                coerced
            }
        };
        if !(0.0..360.0).contains(&r) {
            // The upper bound is exclusive, so out-of-range values wrap
            // instead of clamping to an unreachable 360.
            r = r.rem_euclid(360.0);
            record(fixes, path.clone(), FixStrategy::Clamp, format!("normalized rotation to {}", r));
        }
        if current.as_f64() != Some(r) {
            geometry.insert("rotation".to_string(), json!(r));
        }
    }
}

/// Consistency pass 1: slideCount and stored indices follow array reality.
fn reconcile_counts_and_indices(document: &mut Value, fixes: &mut Vec<AppliedFix>) {
    let actual = document
        .get("slides")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0);

    let declared = document
        .get("metadata")
        .and_then(|m| m.get("slideCount"))
        .and_then(Value::as_u64);
    if declared != Some(actual as u64) {
        if let Some(metadata) = document["metadata"].as_object_mut() {
            metadata.insert("slideCount".to_string(), json!(actual));
            record(
                fixes,
                "metadata.slideCount",
                FixStrategy::CountReconciliation,
                format!("reconciled slideCount to {}", actual),
            );
        }
    }

    let Some(slides) = document["slides"].as_array_mut() else {
        return;
    };
    for (i, slide) in slides.iter_mut().enumerate() {
        reconcile_index(slide, &format!("slides[{}]", i), i, fixes);

        let Some(shapes) = slide.get_mut("shapes").and_then(Value::as_array_mut) else {
            continue;
        };
        for (j, shape) in shapes.iter_mut().enumerate() {
            reconcile_index(shape, &format!("slides[{}].shapes[{}]", i, j), j, fixes);
        }
    }
}

fn reconcile_index(entry: &mut Value, path: &str, position: usize, fixes: &mut Vec<AppliedFix>) {
    let Some(entry) = entry.as_object_mut() else {
        return;
    };
    if entry.get("index").and_then(Value::as_u64) != Some(position as u64) {
        entry.insert("index".to_string(), json!(position));
        record(
            fixes,
            format!("{}.index", path),
            FixStrategy::IndexReconciliation,
            format!("set index to array position {}", position),
        );
    }
}

/// Consistency pass 2: deterministic ids derived from position.
fn generate_missing_ids(document: &mut Value, fixes: &mut Vec<AppliedFix>) {
    let Some(slides) = document.get_mut("slides").and_then(Value::as_array_mut) else {
        return;
    };
    for (i, slide) in slides.iter_mut().enumerate() {
        if let Some(slide_obj) = slide.as_object_mut() {
            ensure_id(slide_obj, &format!("slides[{}]", i), format!("slide-{}", i), fixes);
        }

        let Some(shapes) = slide.get_mut("shapes").and_then(Value::as_array_mut) else {
            continue;
        };
        for (j, shape) in shapes.iter_mut().enumerate() {
            if let Some(shape_obj) = shape.as_object_mut() {
                ensure_id(
                    shape_obj,
                    &format!("slides[{}].shapes[{}]", i, j),
                    format!("shape-{}-{}", i, j),
                    fixes,
                );
            }
        }
    }
}

fn ensure_id(entry: &mut Map<String, Value>, path: &str, generated: String, fixes: &mut Vec<AppliedFix>) {
    let present = entry
        .get("id")
        .and_then(Value::as_str)
        .map(|id| !id.is_empty())
        .unwrap_or(false);
    if !present {
        entry.insert("id".to_string(), json!(generated));
        record(
            fixes,
            format!("{}.id", path),
            FixStrategy::IdGeneration,
            format!("generated id '{}'", generated),
        );
    }
}

/// Lossy-safe string coercion: scalars stringify, containers zero out.
fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Lossy-safe numeric coercion: never fails, unconvertible inputs become 0.
fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Reparse a plausible timestamp, otherwise substitute the current time.
fn reparse_timestamp(value: &Value) -> String {
    if let Some(s) = value.as_str() {
        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return dt.with_timezone(&Utc).to_rfc3339();
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return naive.and_utc().to_rfc3339();
        }
    }
    if let Some(epoch) = value.as_i64() {
        if let Some(dt) = DateTime::from_timestamp(epoch, 0) {
            return dt.to_rfc3339();
        }
    }
    Utc::now().to_rfc3339()
}
