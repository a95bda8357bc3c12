//! Worker-side job handler tests: validation envelopes, codec failures,
//! calling conventions, output-shape mirroring, and determinism

mod common;

use std::sync::Arc;

use serde_json::json;

use common::{png_b64, FailingEngine, MiscountingEngine, StubEngine};
use edit_serving::codec::raster;
use edit_serving::error::ErrorKind;
use edit_serving::job::JobOutput;
use edit_serving::worker::JobHandler;

fn handler_with(engine: Arc<StubEngine>) -> JobHandler {
    JobHandler::new(engine)
}

#[tokio::test]
async fn single_image_request_returns_scalar_shape() {
    let engine = Arc::new(StubEngine::default());
    let handler = handler_with(engine.clone());

    let output = handler
        .handle(&json!({"image": png_b64(), "prompt": "make the sky purple"}))
        .await;

    let JobOutput::Single { image } = output else {
        panic!("expected scalar-shaped output, got {output:?}");
    };
    // The result must be a decodable PNG
    raster::decode(&image).unwrap();

    let calls = engine.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].single_input);
    assert_eq!(calls[0].input_count, 1);
}

#[tokio::test]
async fn multi_image_request_returns_list_shape() {
    let engine = Arc::new(StubEngine::default());
    let handler = handler_with(engine.clone());

    let output = handler
        .handle(&json!({"images": [png_b64(), png_b64()], "prompt": "merge"}))
        .await;

    let JobOutput::Multiple { images } = output else {
        panic!("expected list-shaped output, got {output:?}");
    };
    assert_eq!(images.len(), 1);

    let calls = engine.calls.lock().unwrap();
    assert!(!calls[0].single_input);
    assert_eq!(calls[0].input_count, 2);
}

#[tokio::test]
async fn scalar_request_for_several_images_returns_list_shape() {
    let handler = handler_with(Arc::new(StubEngine::default()));

    let output = handler
        .handle(&json!({
            "image": png_b64(),
            "prompt": "variations",
            "num_images_per_prompt": 3,
        }))
        .await;

    let JobOutput::Multiple { images } = output else {
        panic!("expected list-shaped output, got {output:?}");
    };
    assert_eq!(images.len(), 3);
}

#[tokio::test]
async fn missing_image_fields_yield_missing_input_envelope() {
    let handler = handler_with(Arc::new(StubEngine::default()));

    let output = handler.handle(&json!({"prompt": "x"})).await;

    let JobOutput::Error(envelope) = output else {
        panic!("expected error output, got {output:?}");
    };
    assert_eq!(envelope.kind, ErrorKind::MissingInput);

    // Wire shape: the message lives under the "error" key
    let json = serde_json::to_value(JobOutput::Error(envelope)).unwrap();
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn undecodable_image_aborts_before_the_engine_runs() {
    let engine = Arc::new(StubEngine::default());
    let handler = handler_with(engine.clone());

    let output = handler
        .handle(&json!({"images": [png_b64(), "!!!"], "prompt": "x"}))
        .await;

    let JobOutput::Error(envelope) = output else {
        panic!("expected error output, got {output:?}");
    };
    assert_eq!(envelope.kind, ErrorKind::CodecError);
    assert!(engine.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn engine_fault_yields_engine_error_with_no_partial_result() {
    let handler = JobHandler::new(Arc::new(FailingEngine));

    let output = handler
        .handle(&json!({"image": png_b64(), "prompt": "x"}))
        .await;

    let JobOutput::Error(envelope) = output else {
        panic!("expected error output, got {output:?}");
    };
    assert_eq!(envelope.kind, ErrorKind::EngineError);
    assert!(envelope.message.contains("CUDA out of memory"));
}

#[tokio::test]
async fn short_engine_output_is_rejected_as_engine_error() {
    let handler = JobHandler::new(Arc::new(MiscountingEngine(1)));

    let output = handler
        .handle(&json!({
            "image": png_b64(),
            "prompt": "x",
            "num_images_per_prompt": 4,
        }))
        .await;

    let JobOutput::Error(envelope) = output else {
        panic!("expected error output, got {output:?}");
    };
    assert_eq!(envelope.kind, ErrorKind::EngineError);
}

#[tokio::test]
async fn fixed_seed_makes_output_reproducible() {
    let handler = handler_with(Arc::new(StubEngine::default()));
    let payload = json!({"image": png_b64(), "prompt": "x", "seed": 5});

    let first = handler.handle(&payload).await;
    let second = handler.handle(&payload).await;

    assert!(!first.is_error());
    assert_eq!(first, second);
}

#[tokio::test]
async fn negative_seed_requests_non_deterministic_generation() {
    let engine = Arc::new(StubEngine::default());
    let handler = handler_with(engine.clone());

    handler
        .handle(&json!({"image": png_b64(), "prompt": "x", "seed": -1}))
        .await;
    handler
        .handle(&json!({"image": png_b64(), "prompt": "x", "seed": 7}))
        .await;

    let calls = engine.calls.lock().unwrap();
    assert_eq!(calls[0].seed, None);
    assert_eq!(calls[1].seed, Some(7));
}

#[tokio::test]
async fn submission_wrapper_unwraps_the_input_object() {
    let handler = handler_with(Arc::new(StubEngine::default()));

    let output = handler
        .handle_submission(&json!({"input": {"image": png_b64(), "prompt": "x"}}))
        .await;
    assert!(!output.is_error());

    let output = handler.handle_submission(&json!({"payload": {}})).await;
    let JobOutput::Error(envelope) = output else {
        panic!("expected error output, got {output:?}");
    };
    assert_eq!(envelope.kind, ErrorKind::MalformedInput);
}
