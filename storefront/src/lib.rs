// storefront/src/lib.rs

//! Checkout and payment reconciliation service for the Verdant storefront.
//!
//! `POST /api/checkout` prices a client cart against live inventory, records a
//! `PENDING` order and opens a hosted payment session. `POST /api/webhook/stripe`
//! receives the signed completion notification and marks the order paid while
//! decrementing stock, exactly once per order.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod seed;
pub mod services;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod web;

pub use crate::config::AppConfig;
pub use crate::errors::AppError;
pub use crate::state::AppState;
