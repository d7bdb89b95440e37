//! Validator and auto-fix behavior over realistic non-compliant documents.

use deckbridge::validator::{codes, FixStrategy, SchemaValidator, ValidationOptions};
use serde_json::{json, Value};

fn fix_options() -> ValidationOptions {
    ValidationOptions { auto_fix: true }
}

/// A document with an empty title, a stale slide count, a bad enum, a
/// degenerate geometry, and an out-of-range rotation all at once.
fn battered_document() -> Value {
    json!({
        "metadata": {"title": "", "slideCount": 5},
        "slides": [
            {"shapes": [{
                "kind": "hologram",
                "geometry": {"x": 10.0, "y": 10.0, "width": 0.0, "height": 50.0, "rotation": 360.0},
                "payload": {"type": "text", "paragraphs": []}
            }]},
            {"shapes": []},
            {"shapes": []}
        ]
    })
}

#[test]
fn battered_document_is_fully_repaired() {
    let outcome = SchemaValidator::new().validate(&battered_document(), &fix_options());
    assert!(outcome.is_valid, "errors remain: {:?}", outcome.errors);

    let fixed = outcome.fixed_document.unwrap();
    assert_eq!(fixed["schemaVersion"], deckbridge::SCHEMA_VERSION);
    assert_eq!(fixed["metadata"]["title"], "Untitled Presentation");
    assert_eq!(fixed["metadata"]["slideCount"], 3);

    let shape = &fixed["slides"][0]["shapes"][0];
    // Unknown enum values are replaced with the first allowed value.
    assert_eq!(shape["kind"], "textbox");
    assert_eq!(shape["geometry"]["width"], 1.0);
    assert_eq!(shape["geometry"]["rotation"], 0.0);

    // Every slide and shape ends up with a generated positional id.
    for (i, slide) in fixed["slides"].as_array().unwrap().iter().enumerate() {
        assert_eq!(slide["id"], format!("slide-{}", i));
        assert_eq!(slide["index"], i);
    }
}

#[test]
fn repair_reaches_a_fixed_point() {
    let validator = SchemaValidator::new();
    let first = validator.validate(&battered_document(), &fix_options());
    let fixed = first.fixed_document.unwrap();

    let second = validator.validate(&fixed, &fix_options());
    assert!(second.fixes_applied.is_empty(), "not idempotent: {:?}", second.fixes_applied);
    assert_eq!(second.fixed_document.unwrap(), fixed);
}

#[test]
fn rotation_at_upper_bound_is_rejected_then_wrapped() {
    let doc = json!({
        "schemaVersion": "1.0.0",
        "metadata": {"title": "Deck", "slideCount": 1},
        "slides": [{
            "id": "slide-0",
            "index": 0,
            "shapes": [{
                "id": "shape-0-0",
                "index": 0,
                "kind": "textbox",
                "geometry": {"x": 0.0, "y": 0.0, "width": 100.0, "height": 50.0, "rotation": 360.0},
                "payload": {"type": "text", "paragraphs": []}
            }]
        }]
    });

    let validator = SchemaValidator::new();
    let pure = validator.validate(&doc, &ValidationOptions::default());
    assert!(pure
        .errors
        .iter()
        .any(|e| e.code == codes::OUT_OF_RANGE && e.path.ends_with("rotation")));

    let fixed = validator.validate(&doc, &fix_options());
    assert!(fixed.is_valid);
    assert_eq!(
        fixed.fixed_document.unwrap()["slides"][0]["shapes"][0]["geometry"]["rotation"],
        0.0
    );
}

#[test]
fn string_numbers_are_coerced_not_dropped() {
    let doc = json!({
        "schemaVersion": "1.0.0",
        "metadata": {"title": "Deck", "slideCount": "2", "revision": "7"},
        "slides": [
            {"id": "slide-0", "index": 0, "shapes": []},
            {"id": "slide-1", "index": 1, "shapes": []}
        ]
    });

    let outcome = SchemaValidator::new().validate(&doc, &fix_options());
    assert!(outcome.is_valid, "errors remain: {:?}", outcome.errors);
    assert!(outcome
        .fixes_applied
        .iter()
        .any(|f| f.strategy == FixStrategy::TypeCoercion));

    let fixed = outcome.fixed_document.unwrap();
    assert_eq!(fixed["metadata"]["slideCount"], 2);
    assert_eq!(fixed["metadata"]["revision"].as_f64(), Some(7.0));
}

#[test]
fn unparseable_timestamp_is_replaced_with_valid_rfc3339() {
    let doc = json!({
        "schemaVersion": "1.0.0",
        "metadata": {
            "title": "Deck",
            "slideCount": 0,
            "createdAt": "sometime last tuesday"
        },
        "slides": []
    });

    let outcome = SchemaValidator::new().validate(&doc, &fix_options());
    assert!(outcome.is_valid, "errors remain: {:?}", outcome.errors);

    let fixed = outcome.fixed_document.unwrap();
    let repaired = fixed["metadata"]["createdAt"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(repaired).is_ok());
}

#[test]
fn warnings_survive_autofix_untouched() {
    // Empty slide and tiny shape are advisory only; auto-fix leaves them be.
    let doc = json!({
        "schemaVersion": "1.0.0",
        "metadata": {"title": "Deck", "author": "a", "subject": "s", "slideCount": 2},
        "slides": [
            {"id": "slide-0", "index": 0, "shapes": []},
            {"id": "slide-1", "index": 1, "shapes": [{
                "id": "shape-1-0",
                "index": 0,
                "kind": "textbox",
                "geometry": {"x": 0.0, "y": 0.0, "width": 4.0, "height": 4.0, "rotation": 0.0},
                "payload": {"type": "text", "paragraphs": []}
            }]}
        ]
    });

    let outcome = SchemaValidator::new().validate(&doc, &fix_options());
    assert!(outcome.is_valid);
    assert!(outcome.warnings.iter().any(|w| w.code == codes::EMPTY_SLIDE));
    assert!(outcome.warnings.iter().any(|w| w.code == codes::TINY_SHAPE));

    let fixed = outcome.fixed_document.unwrap();
    assert_eq!(fixed["slides"][1]["shapes"][0]["geometry"]["width"], 4.0);
}

#[test]
fn compliance_report_scores_battered_document_low() {
    let report = SchemaValidator::new().generate_compliance_report(&battered_document());
    assert!(report.overall_score < 100);
    assert!(report.category_scores["geometry"] < 100);
    assert!(!report.recommendations.is_empty());

    // After repair the same document scores clean on errors.
    let outcome = SchemaValidator::new().validate(&battered_document(), &fix_options());
    let fixed = outcome.fixed_document.unwrap();
    let after = SchemaValidator::new().generate_compliance_report(&fixed);
    assert!(after.overall_score > report.overall_score);
}
