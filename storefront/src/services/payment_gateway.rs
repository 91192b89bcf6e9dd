// storefront/src/services/payment_gateway.rs

//! Client side of the hosted checkout service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::models::Cents;

#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("gateway rejected the request with status {status}: {message}")]
  Rejected { status: u16, message: String },

  #[error("gateway transport failure: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("gateway response was malformed: {0}")]
  MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLine {
  pub product_id: String,
  pub name: String,
  pub description: String,
  pub images: Vec<String>,
  pub unit_amount: Cents,
  pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
  pub order_id: Uuid,
  pub user_id: String,
  pub currency: String,
  pub success_url: String,
  pub cancel_url: String,
  pub lines: Vec<SessionLine>,
}

impl SessionRequest {
  /// Key under which the gateway de-duplicates retried session requests.
  pub fn idempotency_key(&self) -> String {
    format!("checkout-{}", self.order_id)
  }

  pub fn success_url_for(base_url: &str, order_id: Uuid) -> String {
    format!(
      "{}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}&order_id={}",
      base_url.trim_end_matches('/'),
      order_id
    )
  }

  pub fn cancel_url_for(base_url: &str) -> String {
    format!("{}/checkout?canceled=true", base_url.trim_end_matches('/'))
  }

  /// Form fields in the gateway's bracketed-key encoding.
  pub fn form_fields(&self) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = vec![
      ("mode".into(), "payment".into()),
      ("payment_method_types[0]".into(), "card".into()),
      ("client_reference_id".into(), self.order_id.to_string()),
      ("success_url".into(), self.success_url.clone()),
      ("cancel_url".into(), self.cancel_url.clone()),
      ("metadata[orderId]".into(), self.order_id.to_string()),
      ("metadata[userId]".into(), self.user_id.clone()),
    ];

    for (i, line) in self.lines.iter().enumerate() {
      let prefix = format!("line_items[{i}]");
      fields.push((format!("{prefix}[price_data][currency]"), self.currency.clone()));
      fields.push((format!("{prefix}[price_data][unit_amount]"), line.unit_amount.to_string()));
      fields.push((format!("{prefix}[price_data][product_data][name]"), line.name.clone()));
      if !line.description.is_empty() {
        fields.push((format!("{prefix}[price_data][product_data][description]"), line.description.clone()));
      }
      for (j, image) in line.images.iter().enumerate() {
        fields.push((format!("{prefix}[price_data][product_data][images][{j}]"), image.clone()));
      }
      fields.push((
        format!("{prefix}[price_data][product_data][metadata][productId]"),
        line.product_id.clone(),
      ));
      fields.push((format!("{prefix}[quantity]"), line.quantity.to_string()));
    }
    fields
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedSession {
  pub id: String,
  pub url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn create_checkout_session(&self, request: &SessionRequest) -> Result<HostedSession, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
  id: Option<String>,
  url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  message: Option<String>,
}

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Clone)]
pub struct StripeGateway {
  http: reqwest::Client,
  api_base: String,
  secret_key: String,
}

impl std::fmt::Debug for StripeGateway {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StripeGateway")
      .field("api_base", &self.api_base)
      .field("secret_key", &"[REDACTED]")
      .finish()
  }
}

impl StripeGateway {
  pub fn new(secret_key: impl Into<String>, api_base: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
    let http = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      http,
      api_base: api_base.into().trim_end_matches('/').to_string(),
      secret_key: secret_key.into(),
    })
  }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
  #[instrument(
    name = "StripeGateway::create_checkout_session",
    skip_all,
    fields(order_id = %request.order_id, lines = request.lines.len()),
    err(Display)
  )]
  async fn create_checkout_session(&self, request: &SessionRequest) -> Result<HostedSession, GatewayError> {
    let response = self
      .http
      .post(format!("{}/v1/checkout/sessions", self.api_base))
      .bearer_auth(&self.secret_key)
      .header("Idempotency-Key", request.idempotency_key())
      .form(&request.form_fields())
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
      warn!(status = status.as_u16(), %message, "Checkout session request rejected.");
      return Err(GatewayError::Rejected {
        status: status.as_u16(),
        message,
      });
    }

    let body: SessionResponse = response
      .json()
      .await
      .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
    match (body.id, body.url) {
      (Some(id), Some(url)) => {
        debug!(session_id = %id, "Checkout session created.");
        Ok(HostedSession { id, url })
      }
      (_, None) => Err(GatewayError::MalformedResponse("session has no url".to_string())),
      (None, Some(_)) => Err(GatewayError::MalformedResponse("session has no id".to_string())),
    }
  }
}
