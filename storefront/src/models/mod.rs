// storefront/src/models/mod.rs

//! Persistent entities and the request-side cart shape.

pub mod cart;
pub mod order;
pub mod order_item;
pub mod product;

pub use cart::{CartLine, CheckoutRequest};
pub use order::{Order, OrderDraft, OrderStatus};
pub use order_item::{DraftLine, OrderItem};
pub use product::Product;

/// Money in the currency's minor unit (cents). Never a float.
pub type Cents = i64;
