// storefront/src/main.rs

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use storefront::config::{AppConfig, GatewayKind, StoreBackend};
use storefront::pipelines::sweeper;
use storefront::services::{IdentityProvider, MockGateway, PaymentGateway, PgIdentity, StaticIdentity, StripeGateway};
use storefront::store::{MemoryStore, PgStore, Store};
use storefront::{seed, telemetry, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let config = Arc::new(AppConfig::from_env().context("failed to load application configuration")?);
  telemetry::init_tracing(config.log_format);
  tracing::info!(config = ?config, "Starting storefront server...");

  let (store, identity): (Arc<dyn Store>, Arc<dyn IdentityProvider>) = match config.store_backend {
    StoreBackend::Postgres => {
      let database_url = config.database_url.as_deref().context("DATABASE_URL is required for the postgres backend")?;
      let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("failed to connect to the database")?;
      tracing::info!("Successfully connected to the database.");
      let pg_store = PgStore::new(pool.clone());
      pg_store.migrate().await.context("failed to apply migrations")?;
      let store: Arc<dyn Store> = Arc::new(pg_store);
      let identity: Arc<dyn IdentityProvider> = Arc::new(PgIdentity::new(pool));
      (store, identity)
    }
    StoreBackend::Memory => {
      tracing::warn!("Using the in-memory store; data is lost on restart.");
      let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
      let identity: Arc<dyn IdentityProvider> =
        Arc::new(StaticIdentity::new().with_session("demo-session", "demo-user"));
      (store, identity)
    }
  };

  if config.seed_db {
    seed::seed_products(store.as_ref()).await.context("failed to seed the catalog")?;
  }

  let gateway: Arc<dyn PaymentGateway> = match config.payment_gateway {
    GatewayKind::Stripe => {
      let secret_key = config.stripe_secret_key.clone().context("STRIPE_SECRET_KEY is required")?;
      Arc::new(StripeGateway::new(secret_key, config.stripe_api_base.clone(), config.gateway_timeout)?)
    }
    GatewayKind::Mock => {
      tracing::warn!("Using the mock payment gateway.");
      Arc::new(MockGateway::new())
    }
  };

  let app_state = AppState::new(store.clone(), gateway, identity, config.clone());
  let _sweeper = sweeper::spawn_sweeper(store, config.pending_order_ttl, config.sweep_interval);

  let server_address = format!("{}:{}", config.server_host, config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(storefront::web::configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("failed to bind {}", server_address))?
  .run()
  .await?;
  Ok(())
}
