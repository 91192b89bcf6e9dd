// storefront/src/pipelines/webhook_pipeline.rs

//! Reconciles a signed "checkout session completed" notification into the
//! order ledger and the inventory, once per order.

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::pipelines::contexts::{IgnoreReason, NotificationOutcome, PaymentNotificationCtxData};
use tracing::{error, info, warn};
use uuid::Uuid;
use verdant_pipeline::{ContextData, Pipeline, PipelineControl, Registry};

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const ORDER_ID_METADATA_KEY: &str = "orderId";

pub fn build_payment_notification_pipeline() -> Pipeline<PaymentNotificationCtxData, AppError> {
  let mut p = Pipeline::<PaymentNotificationCtxData, AppError>::new(&[
    ("verify_signature", false, None),
    ("classify_event", false, None),
    ("settle_order", false, None),
  ]);

  p.on_root("verify_signature", verify_signature);
  p.on_root("classify_event", classify_event);
  p.on_root("settle_order", settle_order);
  p
}

pub fn register_payment_notification_pipeline(registry: &Registry<AppError>) {
  registry.register_pipeline(build_payment_notification_pipeline());
  info!("Payment notification pipeline registered.");
}

async fn verify_signature(ctx_data: ContextData<PaymentNotificationCtxData>) -> Result<PipelineControl, AppError> {
  let mut guard = ctx_data.write();
  let header = guard.signature_header.clone().ok_or(AppError::SignatureMissing)?;
  let event = guard
    .app_state
    .verifier
    .verify(&guard.raw_body, &header, guard.received_at_unix)
    .map_err(|e| {
      warn!(error = %e, "Rejected payment notification.");
      AppError::Signature(e)
    })?;
  info!(event_id = %event.id, event_type = %event.event_type, "Payment notification verified.");
  guard.event = Some(event);
  Ok(PipelineControl::Continue)
}

fn ignore(ctx_data: &ContextData<PaymentNotificationCtxData>, reason: IgnoreReason) -> PipelineControl {
  let mut guard = ctx_data.write();
  info!(event_type = ?guard.event_type(), reason = ?reason, "Payment notification acknowledged without action.");
  guard.outcome = Some(NotificationOutcome::Ignored(reason));
  PipelineControl::Stop
}

async fn classify_event(ctx_data: ContextData<PaymentNotificationCtxData>) -> Result<PipelineControl, AppError> {
  let event = ctx_data
    .read()
    .event
    .clone()
    .ok_or_else(|| AppError::Internal("notification classified before verification".to_string()))?;

  if event.event_type != CHECKOUT_COMPLETED {
    return Ok(ignore(&ctx_data, IgnoreReason::UnhandledEventType(event.event_type)));
  }

  let session = event.checkout_session()?;
  if session.payment_status.as_deref() != Some("paid") {
    return Ok(ignore(&ctx_data, IgnoreReason::NotPaid(session.payment_status)));
  }

  let Some(raw_order_id) = session.metadata.get(ORDER_ID_METADATA_KEY) else {
    return Ok(ignore(&ctx_data, IgnoreReason::MissingOrderId));
  };
  let Ok(order_id) = Uuid::parse_str(raw_order_id) else {
    return Ok(ignore(&ctx_data, IgnoreReason::InvalidOrderId(raw_order_id.clone())));
  };

  let mut guard = ctx_data.write();
  guard.order_id = Some(order_id);
  guard.amount_total = session.amount_total;
  Ok(PipelineControl::Continue)
}

/// Lock, check, transition and decrement inside one settlement unit of work.
/// Any early return drops the unit of work uncommitted.
async fn settle_order(ctx_data: ContextData<PaymentNotificationCtxData>) -> Result<PipelineControl, AppError> {
  let (store, order_id, amount_total, event_type) = {
    let guard = ctx_data.read();
    let order_id = guard
      .order_id
      .ok_or_else(|| AppError::Internal("settlement reached without an order id".to_string()))?;
    (
      guard.app_state.store.clone(),
      order_id,
      guard.amount_total,
      guard.event_type().unwrap_or_default().to_string(),
    )
  };

  let mut tx = store.begin_settlement().await?;
  let Some(order) = tx.lock_order(order_id).await? else {
    error!(%order_id, %event_type, "Paid notification references an unknown order.");
    return Err(AppError::UnknownOrder(order_id));
  };

  let outcome = match order.status {
    status if status.is_settled() => {
      info!(%order_id, %event_type, ?status, "Order already settled; duplicate notification ignored.");
      NotificationOutcome::AlreadySettled
    }
    OrderStatus::Cancelled => {
      error!(%order_id, %event_type, "Paid notification for a cancelled order; needs manual review.");
      NotificationOutcome::NeedsReview
    }
    _ => {
      if let Some(paid) = amount_total {
        if paid != order.total_cents {
          warn!(%order_id, paid, expected = order.total_cents, "Paid amount differs from the order total.");
        }
      }

      tx.set_status(order_id, OrderStatus::Paid).await?;
      for item in &order.items {
        if !tx.decrement_stock(&item.product_id, item.quantity).await? {
          error!(
            %order_id,
            product_id = %item.product_id,
            quantity = item.quantity,
            "Stock cannot cover a paid order; settlement rolled back."
          );
          return Err(AppError::StockShortfall {
            order_id,
            product_id: item.product_id.clone(),
          });
        }
      }
      tx.commit().await?;
      info!(%order_id, %event_type, lines = order.items.len(), "Order marked paid and stock decremented.");
      NotificationOutcome::Settled
    }
  };

  ctx_data.write().outcome = Some(outcome);
  Ok(PipelineControl::Continue)
}
