// tests/error_handling_tests.rs
mod common;

use common::*;
use verdant_pipeline::{ContextData, Pipeline, PipelineControl, PipelineError, PipelineResult};

#[tokio::test]
async fn test_required_step_without_handlers_is_an_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("wired", false, None), ("unwired", false, None)]);
  pipeline.on_root("wired", create_simple_handler("wired", "W"));

  let result = pipeline.run(ContextData::new(TestContext::default())).await;

  match result {
    Err(TestError::Pipeline(msg)) => assert!(msg.contains("HandlerMissing"), "got {msg}"),
    other => panic!("Expected HandlerMissing, got {other:?}"),
  }
}

#[tokio::test]
async fn test_optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("wired", false, None), ("later", true, None)]);
  pipeline.on_root("wired", create_simple_handler("wired", "W"));

  let result = pipeline.run(ContextData::new(TestContext::default())).await.unwrap();
  assert_eq!(result, PipelineResult::Completed);
}

#[tokio::test]
async fn test_set_optional_toggles_missing_handler_behavior() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("empty", false, None)]);
  pipeline.set_optional("empty", true).unwrap();

  let result = pipeline.run(ContextData::new(TestContext::default())).await.unwrap();
  assert_eq!(result, PipelineResult::Completed);
}

#[tokio::test]
async fn test_handler_may_return_pipeline_error_directly() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("boom", false, None)]);
  pipeline.on_root("boom", |_ctx: ContextData<TestContext>| async {
    Err::<PipelineControl, PipelineError>(anyhow::anyhow!("store unavailable").into())
  });

  let result = pipeline.run(ContextData::new(TestContext::default())).await;
  match result {
    Err(TestError::Pipeline(msg)) => assert!(msg.contains("store unavailable"), "got {msg}"),
    other => panic!("Expected converted PipelineError, got {other:?}"),
  }
}

#[test]
#[should_panic(expected = "step 'nope' not found")]
fn test_registering_on_unknown_step_panics() {
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("real", false, None)]);
  pipeline.on_root("nope", create_simple_handler("nope", "N"));
}
