// storefront/src/models/order_item.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Cents;

/// Immutable once written. The price is the product's price at order creation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: String,
  pub quantity: i32,
  pub unit_price_cents: Cents,
}

impl OrderItem {
  pub fn subtotal(&self) -> Cents {
    self.unit_price_cents * Cents::from(self.quantity)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLine {
  pub product_id: String,
  pub quantity: i32,
  pub unit_price_cents: Cents,
}
