// storefront/tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::web::Bytes;
use chrono::Utc;
use once_cell::sync::Lazy;
use serde_json::json;
use tracing::Level;
use uuid::Uuid;

use storefront::config::AppConfig;
use storefront::errors::AppError;
use storefront::models::{CartLine, Order, Product};
use storefront::pipelines::contexts::{CheckoutCtxData, NotificationOutcome, PaymentNotificationCtxData};
use storefront::services::signature::sign;
use storefront::services::{MockGateway, StaticIdentity};
use storefront::state::AppState;
use storefront::store::MemoryStore;
use verdant_pipeline::{ContextData, PipelineResult};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const SESSION_TOKEN: &str = "session-token-1";
pub const USER_ID: &str = "user-1";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn config_from(overrides: &[(&str, &str)]) -> Result<AppConfig, storefront::config::ConfigError> {
  let mut vars: HashMap<String, String> = HashMap::from([
    ("STORE_BACKEND".to_string(), "memory".to_string()),
    ("PAYMENT_GATEWAY".to_string(), "mock".to_string()),
    ("STRIPE_WEBHOOK_SECRET".to_string(), WEBHOOK_SECRET.to_string()),
    ("APP_BASE_URL".to_string(), "https://shop.test".to_string()),
  ]);
  for (k, v) in overrides {
    vars.insert(k.to_string(), v.to_string());
  }
  AppConfig::from_lookup(|key| vars.get(key).cloned())
}

pub struct TestApp {
  pub state: AppState,
  pub store: MemoryStore,
  pub gateway: MockGateway,
}

pub async fn test_app(products: Vec<Product>) -> TestApp {
  test_app_with(products, &[]).await
}

pub async fn test_app_with(products: Vec<Product>, overrides: &[(&str, &str)]) -> TestApp {
  setup_tracing();
  let config = config_from(overrides).expect("test configuration is valid");
  let store = MemoryStore::with_products(products).await;
  let gateway = MockGateway::new();
  let identity = StaticIdentity::new().with_session(SESSION_TOKEN, USER_ID);
  let state = AppState::new(
    Arc::new(store.clone()),
    Arc::new(gateway.clone()),
    Arc::new(identity),
    Arc::new(config),
  );
  TestApp { state, store, gateway }
}

pub fn product(id: &str, price_cents: i64, stock: i32) -> Product {
  Product::new(id, format!("Product {id}"), price_cents, stock)
}

impl TestApp {
  pub async fn checkout(&self, cart: &[(&str, i64)]) -> (Result<PipelineResult, AppError>, CheckoutCtxData) {
    let lines = cart.iter().map(|(id, q)| CartLine::new(*id, *q)).collect();
    let ctx = ContextData::new(CheckoutCtxData::new(self.state.clone(), USER_ID, lines));
    let result = self.state.pipelines.run(ctx.clone()).await;
    let data = ctx.read().clone();
    (result, data)
  }

  pub async fn checkout_order(&self, cart: &[(&str, i64)]) -> Order {
    let (result, data) = self.checkout(cart).await;
    assert!(matches!(result, Ok(PipelineResult::Completed)), "checkout failed: {result:?}");
    data.order.expect("completed checkout records its order")
  }

  pub async fn notify(&self, body: &[u8], signature: Option<String>) -> (Result<PipelineResult, AppError>, Option<NotificationOutcome>) {
    let ctx = ContextData::new(PaymentNotificationCtxData::new(
      self.state.clone(),
      Bytes::copy_from_slice(body),
      signature,
      Utc::now().timestamp(),
    ));
    let result = self.state.pipelines.run(ctx.clone()).await;
    let outcome = ctx.read().outcome.clone();
    (result, outcome)
  }

  pub async fn notify_signed(&self, body: &[u8]) -> (Result<PipelineResult, AppError>, Option<NotificationOutcome>) {
    self.notify(body, Some(signature_for(body))).await
  }

  pub async fn stock(&self, product_id: &str) -> i32 {
    self.store.product(product_id).await.expect("product exists").stock
  }

  pub async fn order(&self, order_id: Uuid) -> Order {
    self
      .store
      .orders()
      .await
      .into_iter()
      .find(|o| o.id == order_id)
      .expect("order exists")
  }
}

pub fn signature_for(body: &[u8]) -> String {
  sign(WEBHOOK_SECRET, Utc::now().timestamp(), body).expect("signing succeeds")
}

pub fn session_completed_event(order_id: &str, payment_status: &str, amount_total: Option<i64>) -> Vec<u8> {
  let mut object = json!({
    "id": "cs_test_1",
    "object": "checkout.session",
    "payment_status": payment_status,
    "metadata": { "orderId": order_id, "userId": USER_ID },
  });
  if let Some(amount) = amount_total {
    object["amount_total"] = json!(amount);
  }
  serde_json::to_vec(&json!({
    "id": format!("evt_{}", Uuid::new_v4().simple()),
    "type": "checkout.session.completed",
    "data": { "object": object },
  }))
  .expect("event serializes")
}

pub fn paid_event(order_id: Uuid) -> Vec<u8> {
  session_completed_event(&order_id.to_string(), "paid", None)
}
