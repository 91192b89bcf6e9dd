// storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type as SqlxType;
use uuid::Uuid;

use super::order_item::{DraftLine, OrderItem};
use super::Cents;

/// `PENDING → PAID → SHIPPED → DELIVERED`, or `PENDING → CANCELLED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Pending,
  Paid,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  /// Statuses at or beyond payment. A paid notification for these is a no-op.
  pub fn is_settled(self) -> bool {
    matches!(self, OrderStatus::Paid | OrderStatus::Shipped | OrderStatus::Delivered)
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
  pub id: Uuid,
  pub user_id: String,
  /// Snapshot taken at creation; equals the sum of `unit_price_cents * quantity` over `items`.
  pub total_cents: Cents,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub items: Vec<OrderItem>,
}

impl Order {
  pub fn line_total(&self) -> Cents {
    self.items.iter().map(OrderItem::subtotal).sum()
  }
}

/// A priced, validated order ready to be written as `PENDING`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
  pub user_id: String,
  pub total_cents: Cents,
  pub items: Vec<DraftLine>,
}
