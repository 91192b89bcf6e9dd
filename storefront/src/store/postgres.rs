// storefront/src/store/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{Inventory, OrderLedger, SettlementTx, StoreResult};
use crate::models::{Order, OrderDraft, OrderItem, OrderStatus, Product};

#[derive(Debug, FromRow)]
struct OrderRow {
  id: Uuid,
  user_id: String,
  total_cents: i64,
  status: OrderStatus,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl OrderRow {
  fn into_order(self, items: Vec<OrderItem>) -> Order {
    Order {
      id: self.id,
      user_id: self.user_id,
      total_cents: self.total_cents,
      status: self.status,
      created_at: self.created_at,
      updated_at: self.updated_at,
      items,
    }
  }
}

const ORDER_COLUMNS: &str = "id, user_id, total_cents, status, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price_cents";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  pub async fn migrate(&self) -> StoreResult<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    info!("Database migrations applied.");
    Ok(())
  }
}

#[async_trait]
impl Inventory for PgStore {
  #[instrument(name = "PgStore::products_by_ids", skip_all, fields(requested = ids.len()))]
  async fn products_by_ids(&self, ids: &[String]) -> StoreResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
      "SELECT id, name, description, price_cents, stock, images, category_id, created_at, updated_at \
       FROM products WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(&self.pool)
    .await?;
    Ok(products)
  }

  async fn upsert_product(&self, product: &Product) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO products (id, name, description, price_cents, stock, images, category_id) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) \
       ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, description = EXCLUDED.description, \
       price_cents = EXCLUDED.price_cents, stock = EXCLUDED.stock, images = EXCLUDED.images, \
       category_id = EXCLUDED.category_id, updated_at = NOW()",
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(product.stock)
    .bind(&product.images)
    .bind(&product.category_id)
    .execute(&self.pool)
    .await?;
    Ok(())
  }
}

#[async_trait]
impl OrderLedger for PgStore {
  #[instrument(name = "PgStore::create_pending_order", skip_all, fields(user_id = %draft.user_id, lines = draft.items.len()))]
  async fn create_pending_order(&self, draft: &OrderDraft) -> StoreResult<Order> {
    let mut tx = self.pool.begin().await?;

    let row = sqlx::query_as::<_, OrderRow>(&format!(
      "INSERT INTO orders (id, user_id, total_cents, status) VALUES ($1, $2, $3, 'PENDING') RETURNING {ORDER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&draft.user_id)
    .bind(draft.total_cents)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(draft.items.len());
    for line in &draft.items {
      let item = sqlx::query_as::<_, OrderItem>(&format!(
        "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {ITEM_COLUMNS}"
      ))
      .bind(Uuid::new_v4())
      .bind(row.id)
      .bind(&line.product_id)
      .bind(line.quantity)
      .bind(line.unit_price_cents)
      .fetch_one(&mut *tx)
      .await?;
      items.push(item);
    }

    tx.commit().await?;
    debug!(order_id = %row.id, "Pending order committed.");
    Ok(row.into_order(items))
  }

  async fn find_order(&self, order_id: Uuid) -> StoreResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    let Some(row) = row else { return Ok(None) };

    let items = sqlx::query_as::<_, OrderItem>(&format!(
      "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY product_id"
    ))
    .bind(order_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(Some(row.into_order(items)))
  }

  #[instrument(name = "PgStore::orders_for_user", skip(self))]
  async fn orders_for_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    if rows.is_empty() {
      return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let items = sqlx::query_as::<_, OrderItem>(&format!(
      "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, product_id"
    ))
    .bind(&order_ids)
    .fetch_all(&self.pool)
    .await?;

    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in items {
      by_order.entry(item.order_id).or_default().push(item);
    }
    Ok(
      rows
        .into_iter()
        .map(|row| {
          let items = by_order.remove(&row.id).unwrap_or_default();
          row.into_order(items)
        })
        .collect(),
    )
  }

  async fn cancel_pending_order(&self, order_id: Uuid) -> StoreResult<bool> {
    let result =
      sqlx::query("UPDATE orders SET status = 'CANCELLED', updated_at = NOW() WHERE id = $1 AND status = 'PENDING'")
        .bind(order_id)
        .execute(&self.pool)
        .await?;
    Ok(result.rows_affected() == 1)
  }

  #[instrument(name = "PgStore::cancel_stale_pending", skip(self))]
  async fn cancel_stale_pending(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
    let result = sqlx::query(
      "UPDATE orders SET status = 'CANCELLED', updated_at = NOW() WHERE status = 'PENDING' AND created_at < $1",
    )
    .bind(cutoff)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected())
  }

  async fn begin_settlement(&self) -> StoreResult<Box<dyn SettlementTx>> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgSettlement { tx }))
  }
}

/// Rolled back by sqlx when dropped uncommitted.
struct PgSettlement {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SettlementTx for PgSettlement {
  async fn lock_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"))
      .bind(order_id)
      .fetch_optional(&mut *self.tx)
      .await?;
    let Some(row) = row else { return Ok(None) };

    let items = sqlx::query_as::<_, OrderItem>(&format!(
      "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY product_id"
    ))
    .bind(order_id)
    .fetch_all(&mut *self.tx)
    .await?;
    Ok(Some(row.into_order(items)))
  }

  async fn set_status(&mut self, order_id: Uuid, status: OrderStatus) -> StoreResult<()> {
    sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
      .bind(order_id)
      .bind(status)
      .execute(&mut *self.tx)
      .await?;
    Ok(())
  }

  async fn decrement_stock(&mut self, product_id: &str, quantity: i32) -> StoreResult<bool> {
    let result =
      sqlx::query("UPDATE products SET stock = stock - $2, updated_at = NOW() WHERE id = $1 AND stock >= $2")
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *self.tx)
        .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    self.tx.commit().await?;
    Ok(())
  }
}
