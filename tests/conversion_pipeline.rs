//! End-to-end conversion pipeline tests against the in-memory engine.

use deckbridge::engine::{RawParagraph, RawRun, RawShape, RawTable, RawTextFrame};
use deckbridge::types::Geometry;
use deckbridge::validator::{SchemaValidator, ValidationOptions};
use deckbridge::{
    Converter, DeckbridgeError, MemoryDocument, MemoryEngine, MemorySlide, SaveFormat, ShapePayload,
};
use std::path::Path;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn text_shape(index: usize, text: &str) -> RawShape {
    RawShape {
        index,
        kind: "textbox".to_string(),
        geometry: Geometry {
            x: 20.0,
            y: 20.0,
            width: 400.0,
            height: 80.0,
            rotation: 0.0,
        },
        text: Some(RawTextFrame {
            paragraphs: vec![RawParagraph {
                runs: vec![RawRun {
                    text: text.to_string(),
                    ..Default::default()
                }],
                alignment: None,
            }],
        }),
        ..Default::default()
    }
}

fn content_slide(texts: &[&str]) -> MemorySlide {
    MemorySlide {
        title: Some("Content".to_string()),
        shapes: texts.iter().enumerate().map(|(i, t)| text_shape(i, t)).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn forward_output_upholds_index_and_count_invariants() {
    init_tracing();
    let engine = MemoryEngine::new();
    let mut doc = MemoryDocument::new("Invariants");
    doc.slides = vec![
        content_slide(&["a", "b"]),
        content_slide(&["c"]),
        MemorySlide {
            shapes: vec![
                text_shape(0, "x"),
                RawShape {
                    index: 1,
                    kind: "table".to_string(),
                    table: Some(RawTable {
                        rows: vec![vec!["h".to_string()]],
                    }),
                    ..Default::default()
                },
            ],
            ..Default::default()
        },
    ];
    engine.seed("/deck.pptx", doc);

    let converter = Converter::with_defaults(Arc::new(engine));
    let output = converter.convert_to_schema(Path::new("/deck.pptx")).await.unwrap();

    assert_eq!(output.schema.metadata.slide_count, output.schema.slides.len());
    for (i, slide) in output.schema.slides.iter().enumerate() {
        assert_eq!(slide.index, i);
        for (j, shape) in slide.shapes.iter().enumerate() {
            assert_eq!(shape.index, j);
        }
    }
    assert_eq!(output.stats.shape_count, 5);
}

#[tokio::test]
async fn forward_output_is_schema_valid() {
    let engine = MemoryEngine::new();
    engine.seed(
        "/deck.pptx",
        MemoryDocument::new("Valid").with_slide(content_slide(&["hello"])),
    );

    let converter = Converter::with_defaults(Arc::new(engine));
    let output = converter.convert_to_schema(Path::new("/deck.pptx")).await.unwrap();

    let outcome =
        SchemaValidator::new().validate(&output.schema.to_value(), &ValidationOptions::default());
    assert!(outcome.is_valid, "pipeline output failed validation: {:?}", outcome.errors);
}

#[tokio::test]
async fn fallback_isolates_one_bad_slide_out_of_ten() {
    init_tracing();
    let engine = MemoryEngine::new();
    let mut doc = MemoryDocument::new("Deck");
    doc.slides = (0..10)
        .map(|i| {
            if i == 4 {
                MemorySlide {
                    fail_on_read: true,
                    ..Default::default()
                }
            } else {
                content_slide(&[&format!("slide {}", i)])
            }
        })
        .collect();
    engine.seed("/deck.pptx", doc);

    let converter = Converter::with_defaults(Arc::new(engine));
    let output = converter.convert_to_schema(Path::new("/deck.pptx")).await.unwrap();

    assert_eq!(output.schema.slides.len(), 10);
    assert_eq!(output.stats.fallback_slides, 1);

    // The placeholder carries the original error message.
    let placeholder = &output.schema.slides[4];
    let text = placeholder.shapes[0].payload.plain_text().unwrap();
    assert!(text.contains("unavailable"));
    assert!(text.contains("corrupted"));

    for (i, slide) in output.schema.slides.iter().enumerate() {
        if i == 4 {
            continue;
        }
        assert_eq!(
            slide.shapes[0].payload.plain_text().as_deref(),
            Some(format!("slide {}", i).as_str())
        );
    }
}

#[tokio::test]
async fn partial_round_trip_preserves_text_and_slide_count() {
    let engine = MemoryEngine::new();
    engine.seed(
        "/deck.pptx",
        MemoryDocument::new("Round Trip").with_slide(content_slide(&["the only text"])),
    );
    let shared = Arc::new(engine);
    let converter = Converter::with_defaults(Arc::clone(&shared) as Arc<dyn deckbridge::DocumentEngine>);

    let forward = converter.convert_to_schema(Path::new("/deck.pptx")).await.unwrap();
    assert_eq!(forward.schema.slides.len(), 1);

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("rebuilt.pptx");
    let reverse = converter
        .convert_from_schema(&forward.schema, &out, SaveFormat::Pptx)
        .await
        .unwrap();

    assert_eq!(reverse.slides_created, forward.schema.slides.len());
    assert_eq!(reverse.shapes_created, 1);

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("the only text"));
}

#[tokio::test]
async fn reverse_with_zero_slides_is_fatal() {
    let converter = Converter::with_defaults(Arc::new(MemoryEngine::new()));
    let schema = deckbridge::SchemaDocument {
        schema_version: deckbridge::SCHEMA_VERSION.to_string(),
        metadata: Default::default(),
        slides: vec![],
        provenance: None,
    };

    let dir = tempfile::tempdir().unwrap();
    let result = converter
        .convert_from_schema(&schema, &dir.path().join("out.pptx"), SaveFormat::Pptx)
        .await;
    assert!(matches!(result, Err(DeckbridgeError::InvalidInput(_))));
}

#[tokio::test]
async fn unknown_shape_kind_survives_as_generic() {
    let engine = MemoryEngine::new();
    engine.seed(
        "/deck.pptx",
        MemoryDocument::new("Deck").with_slide(MemorySlide {
            shapes: vec![RawShape {
                index: 0,
                kind: "3d-model".to_string(),
                name: Some("Model 1".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }),
    );

    let converter = Converter::with_defaults(Arc::new(engine));
    let output = converter.convert_to_schema(Path::new("/deck.pptx")).await.unwrap();

    let shape = &output.schema.slides[0].shapes[0];
    assert_eq!(shape.kind, deckbridge::ShapeKind::Other);
    match &shape.payload {
        ShapePayload::Generic { source_kind, name } => {
            assert_eq!(source_kind, "3d-model");
            assert_eq!(name.as_deref(), Some("Model 1"));
        }
        other => panic!("expected generic payload, got {:?}", other),
    }
    // Unknown kinds are degraded output, not failures.
    assert_eq!(output.stats.degraded_shapes, 0);
}

#[tokio::test]
async fn batch_mixes_successes_and_failures() {
    let engine = MemoryEngine::new();
    engine.seed("/one.pptx", MemoryDocument::new("One").with_slide(content_slide(&["1"])));
    engine.seed("/two.pptx", MemoryDocument::new("Two").with_slide(content_slide(&["2"])));

    let converter = Arc::new(Converter::with_defaults(Arc::new(engine)));
    let sources = vec![
        std::path::PathBuf::from("/one.pptx"),
        std::path::PathBuf::from("/gone.pptx"),
        std::path::PathBuf::from("/two.pptx"),
    ];

    let items = deckbridge::convert_batch(&converter, &sources).await;
    assert_eq!(items.len(), 3);
    assert!(items[0].outcome.is_ok());
    assert!(items[1].outcome.is_err());
    assert!(items[2].outcome.is_ok());
    assert_eq!(items[1].source, Path::new("/gone.pptx"));
}
