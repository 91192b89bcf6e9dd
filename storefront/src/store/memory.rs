// storefront/src/store/memory.rs

//! In-process store for tests and local demo runs.
//!
//! A settlement holds the store's mutex for its whole lifetime and works on a
//! staged copy of the state, so concurrent settlements serialize the same way
//! row locks serialize them in Postgres.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{Inventory, OrderLedger, SettlementTx, StoreError, StoreResult};
use crate::models::{Order, OrderDraft, OrderItem, OrderStatus, Product};

#[derive(Debug, Clone, Default)]
struct MemoryState {
  products: HashMap<String, Product>,
  orders: HashMap<Uuid, Order>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  state: Arc<Mutex<MemoryState>>,
  failing_stock_updates: Arc<parking_lot::Mutex<HashSet<String>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
    let store = Self::new();
    {
      let mut state = store.state.lock().await;
      for product in products {
        state.products.insert(product.id.clone(), product);
      }
    }
    store
  }

  /// Makes every later stock decrement for `product_id` fail with a store error.
  pub fn inject_stock_failure(&self, product_id: impl Into<String>) {
    self.failing_stock_updates.lock().insert(product_id.into());
  }

  pub fn clear_stock_failures(&self) {
    self.failing_stock_updates.lock().clear();
  }

  pub async fn product(&self, product_id: &str) -> Option<Product> {
    self.state.lock().await.products.get(product_id).cloned()
  }

  pub async fn orders(&self) -> Vec<Order> {
    let mut orders: Vec<Order> = self.state.lock().await.orders.values().cloned().collect();
    orders.sort_by_key(|o| o.created_at);
    orders
  }

  /// Test hook for ageing an order past the sweeper's TTL.
  pub async fn backdate_order(&self, order_id: Uuid, created_at: DateTime<Utc>) -> bool {
    match self.state.lock().await.orders.get_mut(&order_id) {
      Some(order) => {
        order.created_at = created_at;
        true
      }
      None => false,
    }
  }
}

#[async_trait]
impl Inventory for MemoryStore {
  async fn products_by_ids(&self, ids: &[String]) -> StoreResult<Vec<Product>> {
    let state = self.state.lock().await;
    let mut seen = HashSet::new();
    Ok(
      ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .filter_map(|id| state.products.get(id).cloned())
        .collect(),
    )
  }

  async fn upsert_product(&self, product: &Product) -> StoreResult<()> {
    if product.stock < 0 {
      return Err(StoreError::Integrity(format!("negative stock for product {}", product.id)));
    }
    let mut product = product.clone();
    product.updated_at = Utc::now();
    self.state.lock().await.products.insert(product.id.clone(), product);
    Ok(())
  }
}

#[async_trait]
impl OrderLedger for MemoryStore {
  #[instrument(name = "MemoryStore::create_pending_order", skip_all, fields(user_id = %draft.user_id))]
  async fn create_pending_order(&self, draft: &OrderDraft) -> StoreResult<Order> {
    let mut state = self.state.lock().await;
    for line in &draft.items {
      if line.quantity < 1 {
        return Err(StoreError::Integrity(format!("quantity below one for product {}", line.product_id)));
      }
      if !state.products.contains_key(&line.product_id) {
        return Err(StoreError::Integrity(format!("unknown product {}", line.product_id)));
      }
    }

    let now = Utc::now();
    let order_id = Uuid::new_v4();
    let order = Order {
      id: order_id,
      user_id: draft.user_id.clone(),
      total_cents: draft.total_cents,
      status: OrderStatus::Pending,
      created_at: now,
      updated_at: now,
      items: draft
        .items
        .iter()
        .map(|line| OrderItem {
          id: Uuid::new_v4(),
          order_id,
          product_id: line.product_id.clone(),
          quantity: line.quantity,
          unit_price_cents: line.unit_price_cents,
        })
        .collect(),
    };
    state.orders.insert(order_id, order.clone());
    debug!(%order_id, "Pending order stored in memory.");
    Ok(order)
  }

  async fn find_order(&self, order_id: Uuid) -> StoreResult<Option<Order>> {
    Ok(self.state.lock().await.orders.get(&order_id).cloned())
  }

  async fn orders_for_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .state
      .lock()
      .await
      .orders
      .values()
      .filter(|o| o.user_id == user_id)
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn cancel_pending_order(&self, order_id: Uuid) -> StoreResult<bool> {
    let mut state = self.state.lock().await;
    match state.orders.get_mut(&order_id) {
      Some(order) if order.status == OrderStatus::Pending => {
        order.status = OrderStatus::Cancelled;
        order.updated_at = Utc::now();
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn cancel_stale_pending(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
    let mut state = self.state.lock().await;
    let now = Utc::now();
    let mut cancelled = 0;
    for order in state.orders.values_mut() {
      if order.status == OrderStatus::Pending && order.created_at < cutoff {
        order.status = OrderStatus::Cancelled;
        order.updated_at = now;
        cancelled += 1;
      }
    }
    Ok(cancelled)
  }

  async fn begin_settlement(&self) -> StoreResult<Box<dyn SettlementTx>> {
    let guard = Arc::clone(&self.state).lock_owned().await;
    let staged = (*guard).clone();
    Ok(Box::new(MemorySettlement {
      guard,
      staged,
      failing_stock_updates: Arc::clone(&self.failing_stock_updates),
    }))
  }
}

struct MemorySettlement {
  guard: OwnedMutexGuard<MemoryState>,
  staged: MemoryState,
  failing_stock_updates: Arc<parking_lot::Mutex<HashSet<String>>>,
}

#[async_trait]
impl SettlementTx for MemorySettlement {
  async fn lock_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>> {
    Ok(self.staged.orders.get(&order_id).cloned())
  }

  async fn set_status(&mut self, order_id: Uuid, status: OrderStatus) -> StoreResult<()> {
    let order = self
      .staged
      .orders
      .get_mut(&order_id)
      .ok_or_else(|| StoreError::Integrity(format!("order {order_id} vanished inside its settlement")))?;
    order.status = status;
    order.updated_at = Utc::now();
    Ok(())
  }

  async fn decrement_stock(&mut self, product_id: &str, quantity: i32) -> StoreResult<bool> {
    if self.failing_stock_updates.lock().contains(product_id) {
      warn!(product_id, "Injected stock update failure.");
      return Err(StoreError::StockUpdateRejected {
        product_id: product_id.to_string(),
      });
    }
    match self.staged.products.get_mut(product_id) {
      Some(product) if product.stock >= quantity => {
        product.stock -= quantity;
        product.updated_at = Utc::now();
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    let MemorySettlement { mut guard, staged, .. } = *self;
    *guard = staged;
    Ok(())
  }
}
