// storefront/src/pipelines/contexts.rs

//! Data carried through each pipeline run. Handlers receive these wrapped in
//! `verdant_pipeline::ContextData`.

use std::collections::HashMap;

use actix_web::web::Bytes;
use uuid::Uuid;

use crate::models::{CartLine, Order, OrderDraft, Product};
use crate::pipelines::pricing::ValidatedLine;
use crate::services::{HostedSession, VerifiedEvent};
use crate::state::AppState;

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub user_id: String,
  pub cart: Vec<CartLine>,

  // Filled in step by step.
  pub lines: Vec<ValidatedLine>,
  pub products: HashMap<String, Product>,
  pub draft: Option<OrderDraft>,
  pub order: Option<Order>,
  pub session: Option<HostedSession>,
  pub compensated: bool,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, user_id: impl Into<String>, cart: Vec<CartLine>) -> Self {
    Self {
      app_state,
      user_id: user_id.into(),
      cart,
      lines: Vec::new(),
      products: HashMap::new(),
      draft: None,
      order: None,
      session: None,
      compensated: false,
    }
  }
}

/// Why a notification was acknowledged without touching any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
  UnhandledEventType(String),
  NotPaid(Option<String>),
  MissingOrderId,
  InvalidOrderId(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
  /// `PENDING → PAID` committed together with every stock decrement.
  Settled,
  /// The order was already at or past `PAID`.
  AlreadySettled,
  Ignored(IgnoreReason),
  /// Paid event for a cancelled order. Acknowledged, left for an operator.
  NeedsReview,
}

#[derive(Clone)]
pub struct PaymentNotificationCtxData {
  pub app_state: AppState,
  pub raw_body: Bytes,
  pub signature_header: Option<String>,
  pub received_at_unix: i64,

  pub event: Option<VerifiedEvent>,
  pub order_id: Option<Uuid>,
  pub amount_total: Option<i64>,
  pub outcome: Option<NotificationOutcome>,
}

impl PaymentNotificationCtxData {
  pub fn new(app_state: AppState, raw_body: Bytes, signature_header: Option<String>, received_at_unix: i64) -> Self {
    Self {
      app_state,
      raw_body,
      signature_header,
      received_at_unix,
      event: None,
      order_id: None,
      amount_total: None,
      outcome: None,
    }
  }

  pub fn event_type(&self) -> Option<&str> {
    self.event.as_ref().map(|e| e.event_type.as_str())
  }
}
