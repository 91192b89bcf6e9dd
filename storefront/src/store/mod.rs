// storefront/src/store/mod.rs

//! Persistence seams: the inventory, the order ledger, and the settlement
//! unit of work used to mark an order paid.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Order, OrderDraft, OrderStatus, Product};

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Stock update rejected for product {product_id}")]
  StockUpdateRejected { product_id: String },

  #[error("Data integrity error: {0}")]
  Integrity(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait Inventory: Send + Sync {
  /// One batch read. Ids with no product are simply absent from the result.
  async fn products_by_ids(&self, ids: &[String]) -> StoreResult<Vec<Product>>;

  async fn upsert_product(&self, product: &Product) -> StoreResult<()>;
}

#[async_trait]
pub trait OrderLedger: Send + Sync {
  /// Writes the order row and every line item in one transaction, status `PENDING`.
  async fn create_pending_order(&self, draft: &OrderDraft) -> StoreResult<Order>;

  async fn find_order(&self, order_id: Uuid) -> StoreResult<Option<Order>>;

  /// Every order placed by `user_id`, newest first, each with its line items.
  async fn orders_for_user(&self, user_id: &str) -> StoreResult<Vec<Order>>;

  /// `PENDING → CANCELLED`. Returns false when the order is missing or no longer pending.
  async fn cancel_pending_order(&self, order_id: Uuid) -> StoreResult<bool>;

  /// Cancels every `PENDING` order created before `cutoff`; returns how many were cancelled.
  async fn cancel_stale_pending(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;

  async fn begin_settlement(&self) -> StoreResult<Box<dyn SettlementTx>>;
}

/// A unit of work over one order and the stock of its products.
///
/// Nothing is visible to other callers until [`commit`](SettlementTx::commit);
/// dropping the value without committing discards every change.
#[async_trait]
pub trait SettlementTx: Send {
  /// Reads the order and its items while holding a lock on the order row.
  async fn lock_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>>;

  async fn set_status(&mut self, order_id: Uuid, status: OrderStatus) -> StoreResult<()>;

  /// Decrements only when `stock >= quantity`. Returns false when the product
  /// is missing or its stock is short; stock never goes negative.
  async fn decrement_stock(&mut self, product_id: &str, quantity: i32) -> StoreResult<bool>;

  async fn commit(self: Box<Self>) -> StoreResult<()>;
}

pub trait Store: Inventory + OrderLedger {}

impl<T: Inventory + OrderLedger> Store for T {}
