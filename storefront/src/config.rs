// storefront/src/config.rs

use crate::errors::AppError;
use dotenvy::dotenv;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("Missing environment variable '{0}'")]
  Missing(&'static str),

  #[error("Invalid value for {key}: '{value}'")]
  Invalid { key: &'static str, value: String },
}

impl From<ConfigError> for AppError {
  fn from(e: ConfigError) -> Self {
    AppError::Config(e.to_string())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "postgres" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      _ => Err(()),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayKind {
  Stripe,
  Mock,
}

impl FromStr for GatewayKind {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "stripe" => Ok(GatewayKind::Stripe),
      "mock" => Ok(GatewayKind::Mock),
      _ => Err(()),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "pretty" | "plain" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      _ => Err(()),
    }
  }
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  /// Required when `store_backend` is `Postgres`.
  pub database_url: Option<String>,
  pub app_base_url: String,

  pub payment_gateway: GatewayKind,
  /// Required when `payment_gateway` is `Stripe`.
  pub stripe_secret_key: Option<String>,
  pub stripe_webhook_secret: String,
  pub stripe_api_base: String,
  pub currency: String,
  pub webhook_tolerance_secs: i64,
  pub gateway_timeout: Duration,

  pub compensate_on_gateway_failure: bool,
  pub pending_order_ttl: Duration,
  pub sweep_interval: Duration,

  pub seed_db: bool,
  pub log_format: LogFormat,
}

// Secrets stay out of logs.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("store_backend", &self.store_backend)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("app_base_url", &self.app_base_url)
      .field("payment_gateway", &self.payment_gateway)
      .field("stripe_api_base", &self.stripe_api_base)
      .field("currency", &self.currency)
      .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
      .field("gateway_timeout", &self.gateway_timeout)
      .field("compensate_on_gateway_failure", &self.compensate_on_gateway_failure)
      .field("pending_order_ttl", &self.pending_order_ttl)
      .field("sweep_interval", &self.sweep_interval)
      .field("seed_db", &self.seed_db)
      .field("log_format", &self.log_format)
      .finish_non_exhaustive()
  }
}

fn parse_or<T: FromStr>(
  lookup: &impl Fn(&str) -> Option<String>,
  key: &'static str,
  default: T,
) -> Result<T, ConfigError> {
  match lookup(key) {
    None => Ok(default),
    Some(value) => value
      .trim()
      .parse::<T>()
      .map_err(|_| ConfigError::Invalid { key, value }),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    dotenv().ok();
    Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
  }

  /// Builds the configuration from any key lookup, so tests can feed a map.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_or(&lookup, "SERVER_PORT", 8080u16)?;

    let store_backend = parse_or(&lookup, "STORE_BACKEND", StoreBackend::Postgres)?;
    let database_url = lookup("DATABASE_URL");
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(ConfigError::Missing("DATABASE_URL"));
    }
    let app_base_url = lookup("APP_BASE_URL").unwrap_or_else(|| format!("http://{}:{}", server_host, server_port));

    let payment_gateway = parse_or(&lookup, "PAYMENT_GATEWAY", GatewayKind::Stripe)?;
    let stripe_secret_key = lookup("STRIPE_SECRET_KEY");
    if payment_gateway == GatewayKind::Stripe && stripe_secret_key.is_none() {
      return Err(ConfigError::Missing("STRIPE_SECRET_KEY"));
    }
    let stripe_webhook_secret = lookup("STRIPE_WEBHOOK_SECRET").ok_or(ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?;
    let stripe_api_base =
      lookup("STRIPE_API_BASE").unwrap_or_else(|| crate::services::payment_gateway::DEFAULT_API_BASE.to_string());
    let currency = lookup("CURRENCY").unwrap_or_else(|| "usd".to_string()).to_ascii_lowercase();

    let webhook_tolerance_secs = parse_or(
      &lookup,
      "WEBHOOK_TOLERANCE_SECS",
      crate::services::signature::DEFAULT_TOLERANCE_SECS,
    )?;
    let gateway_timeout = Duration::from_secs(parse_or(&lookup, "GATEWAY_TIMEOUT_SECS", 30u64)?);
    let compensate_on_gateway_failure = parse_or(&lookup, "COMPENSATE_ON_GATEWAY_FAILURE", true)?;
    let pending_order_ttl = Duration::from_secs(parse_or(&lookup, "PENDING_ORDER_TTL_SECS", 90_000u64)?);
    let sweep_interval = Duration::from_secs(parse_or(&lookup, "SWEEP_INTERVAL_SECS", 600u64)?);
    if sweep_interval.is_zero() {
      return Err(ConfigError::Invalid {
        key: "SWEEP_INTERVAL_SECS",
        value: "0".to_string(),
      });
    }

    let seed_db = parse_or(&lookup, "SEED_DB", false)?;
    let log_format = parse_or(&lookup, "LOG_FORMAT", LogFormat::Pretty)?;

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      app_base_url,
      payment_gateway,
      stripe_secret_key,
      stripe_webhook_secret,
      stripe_api_base,
      currency,
      webhook_tolerance_secs,
      gateway_timeout,
      compensate_on_gateway_failure,
      pending_order_ttl,
      sweep_interval,
      seed_db,
      log_format,
    })
  }
}
