// storefront/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};
use verdant_pipeline::ContextData;

use crate::errors::AppError;
use crate::pipelines::contexts::PaymentNotificationCtxData;
use crate::services::signature::SIGNATURE_HEADER;
use crate::state::AppState;

/// The body is taken raw; it is parsed only after its signature checks out.
#[instrument(name = "handler::payment_webhook", skip_all, fields(payload_bytes = body.len()))]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature_header = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(String::from);

  let ctx_data = ContextData::new(PaymentNotificationCtxData::new(
    app_state.get_ref().clone(),
    body,
    signature_header,
    Utc::now().timestamp(),
  ));

  let result = app_state.pipelines.run(ctx_data.clone()).await?;
  {
    let guard = ctx_data.read();
    info!(
      result = ?result,
      order_id = ?guard.order_id,
      event_type = ?guard.event_type(),
      outcome = ?guard.outcome,
      "Payment notification acknowledged."
    );
  }
  Ok(HttpResponse::Ok().json(json!({ "received": true })))
}
