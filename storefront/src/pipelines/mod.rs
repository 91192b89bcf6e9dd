// storefront/src/pipelines/mod.rs

//! Pipeline definitions for checkout and payment notifications, plus the
//! pricing rules and the stale-order sweeper they rely on.

use crate::errors::AppError;
use verdant_pipeline::Registry;

pub mod checkout_pipeline;
pub mod contexts;
pub mod pricing;
pub mod sweeper;
pub mod webhook_pipeline;

/// Registers every pipeline with `registry`. Called once at startup.
pub fn register_all_pipelines(registry: &Registry<AppError>) {
  checkout_pipeline::register_checkout_pipeline(registry);
  webhook_pipeline::register_payment_notification_pipeline(registry);
  tracing::info!("All application pipelines registered.");
}
