// storefront/src/web/handlers/order_handlers.rs

use std::collections::{BTreeSet, HashMap};

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Cents, Order, OrderStatus};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderView {
  id: Uuid,
  user_id: String,
  total_in_cents: Cents,
  status: OrderStatus,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
  order_items: Vec<OrderItemView>,
}

/// `price_in_cents` is the snapshot stored with the order, never the live price.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderItemView {
  id: Uuid,
  product_id: String,
  product_name: String,
  quantity: i32,
  price_in_cents: Cents,
}

fn order_view(order: Order, names: &HashMap<String, String>) -> OrderView {
  OrderView {
    id: order.id,
    user_id: order.user_id,
    total_in_cents: order.total_cents,
    status: order.status,
    created_at: order.created_at,
    updated_at: order.updated_at,
    order_items: order
      .items
      .into_iter()
      .map(|item| OrderItemView {
        id: item.id,
        product_name: names.get(&item.product_id).cloned().unwrap_or_else(|| item.product_id.clone()),
        product_id: item.product_id,
        quantity: item.quantity,
        price_in_cents: item.unit_price_cents,
      })
      .collect(),
  }
}

#[instrument(name = "handler::list_orders", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.store.orders_for_user(&auth_user.user_id).await?;

  let product_ids: Vec<String> = orders
    .iter()
    .flat_map(|o| o.items.iter().map(|i| i.product_id.clone()))
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect();
  let names: HashMap<String, String> = if product_ids.is_empty() {
    HashMap::new()
  } else {
    app_state
      .store
      .products_by_ids(&product_ids)
      .await?
      .into_iter()
      .map(|p| (p.id, p.name))
      .collect()
  };

  info!(orders = orders.len(), "Order history listed.");
  let views: Vec<OrderView> = orders.into_iter().map(|o| order_view(o, &names)).collect();
  Ok(HttpResponse::Ok().json(views))
}
