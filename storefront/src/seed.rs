// storefront/src/seed.rs

use tracing::info;

use crate::models::Product;
use crate::store::{Inventory, StoreResult};

pub fn demo_products() -> Vec<Product> {
  vec![
    Product::new("bamboo-toothbrush", "Bamboo Toothbrush", 499, 120)
      .with_description("Compostable handle, plant-based bristles."),
    Product::new("beeswax-wraps", "Beeswax Food Wraps (3 pack)", 1299, 40)
      .with_description("Reusable alternative to cling film."),
    Product::new("steel-bottle", "Insulated Steel Bottle", 2899, 25)
      .with_description("Keeps drinks cold for 24 hours."),
    Product::new("shampoo-bar", "Solid Shampoo Bar", 950, 60).with_description("Plastic-free and travel friendly."),
    Product::new("linen-tote", "Organic Linen Tote", 1850, 30)
      .with_description("Sturdy everyday bag.")
      .with_images(vec!["https://images.verdant.example/linen-tote.jpg".to_string()]),
  ]
}

/// Inserts the demo catalog, leaving any product that already exists untouched.
pub async fn seed_products<I>(inventory: &I) -> StoreResult<usize>
where
  I: Inventory + ?Sized,
{
  let products = demo_products();
  let ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();
  let existing: Vec<String> = inventory.products_by_ids(&ids).await?.into_iter().map(|p| p.id).collect();

  let mut inserted = 0;
  for product in products.iter().filter(|p| !existing.contains(&p.id)) {
    inventory.upsert_product(product).await?;
    inserted += 1;
  }
  info!(inserted, skipped = existing.len(), "Demo catalog seeded.");
  Ok(inserted)
}
