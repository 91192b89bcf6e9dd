// storefront/tests/payment_notification_tests.rs
mod common;

use common::{paid_event, product, session_completed_event, signature_for, test_app, TestApp};
use serde_json::json;
use storefront::errors::AppError;
use storefront::models::{Order, OrderStatus};
use storefront::pipelines::contexts::{IgnoreReason, NotificationOutcome};
use storefront::services::signature::sign;
use storefront::services::VerificationError;
use uuid::Uuid;
use verdant_pipeline::PipelineResult;

async fn two_line_order() -> (TestApp, Order) {
  let app = test_app(vec![product("A", 1000, 10), product("B", 500, 5)]).await;
  let order = app.checkout_order(&[("A", 2), ("B", 1)]).await;
  (app, order)
}

#[tokio::test]
async fn paid_notification_marks_order_paid_and_decrements_each_line() {
  let (app, order) = two_line_order().await;

  let (result, outcome) = app.notify_signed(&paid_event(order.id)).await;

  assert!(matches!(result, Ok(PipelineResult::Completed)));
  assert_eq!(outcome, Some(NotificationOutcome::Settled));
  assert_eq!(app.order(order.id).await.status, OrderStatus::Paid);
  assert_eq!(app.stock("A").await, 8);
  assert_eq!(app.stock("B").await, 4);
}

#[tokio::test]
async fn redelivered_notification_is_acknowledged_without_mutation() {
  let (app, order) = two_line_order().await;
  let body = paid_event(order.id);

  app.notify_signed(&body).await.0.expect("first delivery settles");
  let (result, outcome) = app.notify_signed(&body).await;

  assert!(matches!(result, Ok(PipelineResult::Completed)));
  assert_eq!(outcome, Some(NotificationOutcome::AlreadySettled));
  assert_eq!(app.order(order.id).await.status, OrderStatus::Paid);
  assert_eq!(app.stock("A").await, 8);
  assert_eq!(app.stock("B").await, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_deliveries_settle_exactly_once() {
  let (app, order) = two_line_order().await;
  let body = paid_event(order.id);

  let (first, second, third) = tokio::join!(
    app.notify_signed(&body),
    app.notify_signed(&body),
    app.notify_signed(&body)
  );

  let outcomes: Vec<_> = [first, second, third]
    .into_iter()
    .map(|(result, outcome)| {
      assert!(result.is_ok(), "every delivery is acknowledged: {result:?}");
      outcome
    })
    .collect();
  let settled = outcomes.iter().filter(|o| **o == Some(NotificationOutcome::Settled)).count();
  let duplicates = outcomes
    .iter()
    .filter(|o| **o == Some(NotificationOutcome::AlreadySettled))
    .count();
  assert_eq!((settled, duplicates), (1, 2));
  assert_eq!(app.stock("A").await, 8);
  assert_eq!(app.stock("B").await, 4);
}

#[tokio::test]
async fn failure_after_status_update_rolls_back_the_whole_settlement() {
  let (app, order) = two_line_order().await;
  app.store.inject_stock_failure("B");

  let (result, _) = app.notify_signed(&paid_event(order.id)).await;

  assert!(matches!(result, Err(AppError::Store(_))));
  assert_eq!(app.order(order.id).await.status, OrderStatus::Pending);
  assert_eq!(app.stock("A").await, 10);
  assert_eq!(app.stock("B").await, 5);

  // The gateway redelivers once the fault clears.
  app.store.clear_stock_failures();
  let (result, outcome) = app.notify_signed(&paid_event(order.id)).await;
  assert!(result.is_ok());
  assert_eq!(outcome, Some(NotificationOutcome::Settled));
  assert_eq!(app.stock("A").await, 8);
  assert_eq!(app.stock("B").await, 4);
}

#[tokio::test]
async fn stock_shortfall_never_oversells_and_keeps_order_pending() {
  let app = test_app(vec![product("A", 1000, 2)]).await;
  let first = app.checkout_order(&[("A", 2)]).await;
  let second = app.checkout_order(&[("A", 2)]).await;

  app.notify_signed(&paid_event(first.id)).await.0.expect("first order settles");
  let (result, _) = app.notify_signed(&paid_event(second.id)).await;

  match result {
    Err(AppError::StockShortfall { order_id, product_id }) => {
      assert_eq!(order_id, second.id);
      assert_eq!(product_id, "A");
    }
    other => panic!("expected StockShortfall, got {other:?}"),
  }
  assert_eq!(app.stock("A").await, 0);
  assert_eq!(app.order(second.id).await.status, OrderStatus::Pending);
}

#[tokio::test]
async fn unknown_order_is_a_server_error() {
  let app = test_app(vec![product("A", 1000, 2)]).await;
  let missing = Uuid::new_v4();

  let (result, _) = app.notify_signed(&paid_event(missing)).await;

  match result {
    Err(err @ AppError::UnknownOrder(_)) => {
      assert_eq!(actix_web::ResponseError::status_code(&err).as_u16(), 500);
    }
    other => panic!("expected UnknownOrder, got {other:?}"),
  }
}

#[tokio::test]
async fn paid_event_for_cancelled_order_is_flagged_not_applied() {
  let (app, order) = two_line_order().await;
  storefront::store::OrderLedger::cancel_pending_order(&app.store, order.id)
    .await
    .unwrap();

  let (result, outcome) = app.notify_signed(&paid_event(order.id)).await;

  assert!(result.is_ok());
  assert_eq!(outcome, Some(NotificationOutcome::NeedsReview));
  assert_eq!(app.order(order.id).await.status, OrderStatus::Cancelled);
  assert_eq!(app.stock("A").await, 10);
}

#[tokio::test]
async fn amount_mismatch_is_logged_but_still_settles() {
  let (app, order) = two_line_order().await;
  let body = session_completed_event(&order.id.to_string(), "paid", Some(1));

  let (result, outcome) = app.notify_signed(&body).await;

  assert!(result.is_ok());
  assert_eq!(outcome, Some(NotificationOutcome::Settled));
}

#[tokio::test]
async fn non_actionable_events_are_acknowledged_as_no_ops() {
  let (app, order) = two_line_order().await;
  let other_type = serde_json::to_vec(&json!({
    "id": "evt_other",
    "type": "payment_intent.created",
    "data": { "object": { "id": "pi_1" } }
  }))
  .unwrap();

  let cases = [
    (other_type, IgnoreReason::UnhandledEventType("payment_intent.created".to_string())),
    (
      session_completed_event(&order.id.to_string(), "unpaid", None),
      IgnoreReason::NotPaid(Some("unpaid".to_string())),
    ),
    (
      session_completed_event("not-a-uuid", "paid", None),
      IgnoreReason::InvalidOrderId("not-a-uuid".to_string()),
    ),
    (
      serde_json::to_vec(&json!({
        "id": "evt_nometa",
        "type": "checkout.session.completed",
        "data": { "object": { "id": "cs_1", "payment_status": "paid" } }
      }))
      .unwrap(),
      IgnoreReason::MissingOrderId,
    ),
  ];

  for (body, reason) in cases {
    let (result, outcome) = app.notify_signed(&body).await;
    assert!(matches!(result, Ok(PipelineResult::Stopped)), "{reason:?} gave {result:?}");
    assert_eq!(outcome, Some(NotificationOutcome::Ignored(reason)));
  }
  assert_eq!(app.order(order.id).await.status, OrderStatus::Pending);
  assert_eq!(app.stock("A").await, 10);
}

#[tokio::test]
async fn missing_or_invalid_signature_never_mutates_state() {
  let (app, order) = two_line_order().await;
  let body = paid_event(order.id);

  let (result, _) = app.notify(&body, None).await;
  assert!(matches!(result, Err(AppError::SignatureMissing)));

  let forged = sign("whsec_attacker", chrono::Utc::now().timestamp(), &body).unwrap();
  let (result, _) = app.notify(&body, Some(forged)).await;
  assert!(matches!(result, Err(AppError::Signature(VerificationError::Mismatch))));

  let stale = sign(common::WEBHOOK_SECRET, chrono::Utc::now().timestamp() - 3_600, &body).unwrap();
  let (result, _) = app.notify(&body, Some(stale)).await;
  assert!(matches!(
    result,
    Err(AppError::Signature(VerificationError::TimestampOutOfTolerance { .. }))
  ));

  let (result, _) = app.notify(b"{}", Some(signature_for(&body))).await;
  assert!(matches!(result, Err(AppError::Signature(VerificationError::Mismatch))));

  assert_eq!(app.order(order.id).await.status, OrderStatus::Pending);
  assert_eq!(app.stock("A").await, 10);
  assert_eq!(app.stock("B").await, 5);
}

#[tokio::test]
async fn verified_but_malformed_payload_is_a_client_error() {
  let app = test_app(vec![]).await;
  let body = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;

  let (result, _) = app.notify_signed(body).await;

  match result {
    Err(err @ AppError::Signature(VerificationError::InvalidPayload(_))) => {
      assert_eq!(err.public_message(), "Invalid webhook payload");
    }
    other => panic!("expected InvalidPayload, got {other:?}"),
  }
}
