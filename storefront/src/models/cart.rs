// storefront/src/models/cart.rs

use serde::Deserialize;

/// Body of `POST /api/checkout`. The cart lives on the client and is sent whole.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
  pub cart_items: Vec<CartLine>,
}

/// Quantity is kept wide here so zero and negative values reach validation
/// instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub product_id: String,
  pub quantity: i64,
}

impl CartLine {
  pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
    Self {
      product_id: product_id.into(),
      quantity,
    }
  }
}
