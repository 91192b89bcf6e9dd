// storefront/src/pipelines/pricing.rs

//! Cart validation and order pricing shared by the checkout steps.
//!
//! All money is integer minor units; every multiplication and sum is checked.

use std::collections::HashMap;

use crate::errors::AppError;
use crate::models::{CartLine, Cents, DraftLine, OrderDraft, Product};

/// A cart line whose quantity has been checked and narrowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLine {
  pub product_id: String,
  pub quantity: i32,
}

pub fn validate_cart(lines: &[CartLine]) -> Result<Vec<ValidatedLine>, AppError> {
  if lines.is_empty() {
    return Err(AppError::Validation("Cart must contain at least one item".to_string()));
  }
  lines
    .iter()
    .map(|line| {
      if line.quantity <= 0 {
        return Err(AppError::Validation("Quantity must be positive".to_string()));
      }
      let quantity = i32::try_from(line.quantity)
        .map_err(|_| AppError::Validation(format!("Quantity for {} is too large", line.product_id)))?;
      if line.product_id.trim().is_empty() {
        return Err(AppError::Validation("Product id must not be empty".to_string()));
      }
      Ok(ValidatedLine {
        product_id: line.product_id.clone(),
        quantity,
      })
    })
    .collect()
}

/// Distinct product ids in cart order.
pub fn product_ids(lines: &[ValidatedLine]) -> Vec<String> {
  let mut ids: Vec<String> = Vec::with_capacity(lines.len());
  for line in lines {
    if !ids.contains(&line.product_id) {
      ids.push(line.product_id.clone());
    }
  }
  ids
}

/// Every cart product id absent from `products`, de-duplicated, in cart order.
pub fn find_missing(lines: &[ValidatedLine], products: &HashMap<String, Product>) -> Vec<String> {
  product_ids(lines)
    .into_iter()
    .filter(|id| !products.contains_key(id))
    .collect()
}

/// Advisory check: demand is summed per product across duplicate lines.
pub fn check_stock(lines: &[ValidatedLine], products: &HashMap<String, Product>) -> Result<(), AppError> {
  let mut demand: HashMap<&str, i64> = HashMap::new();
  for line in lines {
    *demand.entry(line.product_id.as_str()).or_default() += i64::from(line.quantity);
  }

  for id in product_ids(lines) {
    let Some(product) = products.get(&id) else {
      return Err(AppError::ProductsNotFound(vec![id]));
    };
    let requested = demand.get(id.as_str()).copied().unwrap_or_default();
    if requested > i64::from(product.stock) {
      return Err(AppError::InsufficientStock {
        product_name: product.name.clone(),
        available: product.stock,
        requested,
      });
    }
  }
  Ok(())
}

fn overflow() -> AppError {
  AppError::Validation("Order total exceeds the supported range".to_string())
}

/// One draft line per cart line, each carrying the product's current price.
pub fn price_cart(
  user_id: &str,
  lines: &[ValidatedLine],
  products: &HashMap<String, Product>,
) -> Result<OrderDraft, AppError> {
  let mut total: Cents = 0;
  let mut items = Vec::with_capacity(lines.len());

  for line in lines {
    let product = products
      .get(&line.product_id)
      .ok_or_else(|| AppError::ProductsNotFound(vec![line.product_id.clone()]))?;
    let subtotal = product
      .price_cents
      .checked_mul(Cents::from(line.quantity))
      .ok_or_else(overflow)?;
    total = total.checked_add(subtotal).ok_or_else(overflow)?;
    items.push(DraftLine {
      product_id: product.id.clone(),
      quantity: line.quantity,
      unit_price_cents: product.price_cents,
    });
  }

  Ok(OrderDraft {
    user_id: user_id.to_string(),
    total_cents: total,
    items,
  })
}

/// Display form such as `25.98 USD`. Presentation only.
pub fn format_minor_units(cents: Cents, currency: &str) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let abs = cents.unsigned_abs();
  format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, currency.to_ascii_uppercase())
}
