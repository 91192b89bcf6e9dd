// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;
use verdant_pipeline::PipelineError;

use crate::services::payment_gateway::GatewayError;
use crate::services::signature::VerificationError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  Validation(String),

  #[error("Products not found: {}", .0.join(", "))]
  ProductsNotFound(Vec<String>),

  #[error("Insufficient stock for {product_name}. Available: {available}, Requested: {requested}")]
  InsufficientStock {
    product_name: String,
    available: i32,
    requested: i64,
  },

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Webhook signature header missing")]
  SignatureMissing,

  #[error("Webhook signature verification failed: {0}")]
  Signature(#[from] VerificationError),

  #[error("Paid notification references unknown order {0}")]
  UnknownOrder(Uuid),

  #[error("Stock for product {product_id} cannot cover order {order_id}")]
  StockShortfall { order_id: Uuid, product_id: String },

  #[error("Payment gateway error: {0}")]
  Gateway(#[from] GatewayError),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Store Error: {0}")]
  Store(#[from] StoreError),

  #[error("Pipeline Error: {source}")]
  Workflow {
    #[from]
    source: PipelineError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Message safe to return to the caller. Server-side failures never expose
  /// their cause; it is logged instead.
  pub fn public_message(&self) -> String {
    match self {
      AppError::Validation(_) | AppError::ProductsNotFound(_) | AppError::InsufficientStock { .. } => {
        self.to_string()
      }
      AppError::Auth(_) => "Unauthorized".to_string(),
      AppError::SignatureMissing => "Missing signature".to_string(),
      AppError::Signature(VerificationError::InvalidPayload(_)) => "Invalid webhook payload".to_string(),
      AppError::Signature(_) => "Invalid signature".to_string(),
      AppError::Gateway(_) => "Failed to create checkout session".to_string(),
      AppError::UnknownOrder(_) | AppError::StockShortfall { .. } => "Webhook processing failed".to_string(),
      AppError::Config(_) | AppError::Store(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        "Internal server error".to_string()
      }
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_)
      | AppError::ProductsNotFound(_)
      | AppError::InsufficientStock { .. }
      | AppError::SignatureMissing
      | AppError::Signature(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::UnknownOrder(_)
      | AppError::StockShortfall { .. }
      | AppError::Gateway(_)
      | AppError::Config(_)
      | AppError::Store(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with server error");
    } else {
      tracing::warn!(application_error = %self, "Responding with client error");
    }
    HttpResponse::build(status).json(json!({ "error": self.public_message() }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
