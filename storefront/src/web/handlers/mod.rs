// storefront/src/web/handlers/mod.rs

pub mod checkout_handlers;
pub mod health;
pub mod order_handlers;
pub mod webhook_handlers;
