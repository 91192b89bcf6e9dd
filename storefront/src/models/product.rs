// storefront/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Cents;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
  pub id: String,
  pub name: String,
  pub description: String,
  pub price_cents: Cents,
  /// Never negative; enforced by a CHECK constraint and by conditional decrements.
  pub stock: i32,
  pub images: Vec<String>,
  pub category_id: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  pub fn new(id: impl Into<String>, name: impl Into<String>, price_cents: Cents, stock: i32) -> Self {
    let now = Utc::now();
    Self {
      id: id.into(),
      name: name.into(),
      description: String::new(),
      price_cents,
      stock,
      images: Vec::new(),
      category_id: None,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  pub fn with_images(mut self, images: Vec<String>) -> Self {
    self.images = images;
    self
  }
}
