// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument, warn};
use verdant_pipeline::{ContextData, PipelineResult};

use crate::errors::AppError;
use crate::models::CheckoutRequest;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(
  name = "handler::checkout",
  skip(app_state, auth_user, payload),
  fields(user_id = %auth_user.user_id, cart_lines = payload.cart_items.len())
)]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let CheckoutRequest { cart_items } = payload.into_inner();
  let ctx_data = ContextData::new(CheckoutCtxData::new(
    app_state.get_ref().clone(),
    auth_user.user_id.clone(),
    cart_items,
  ));

  match app_state.pipelines.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let guard = ctx_data.read();
      let (Some(order), Some(session)) = (guard.order.as_ref(), guard.session.as_ref()) else {
        warn!("Checkout pipeline completed without an order or session.");
        return Err(AppError::Internal("checkout finished without a payment session".to_string()));
      };
      info!(order_id = %order.id, session_id = %session.id, "Checkout ready for redirect.");
      Ok(HttpResponse::Ok().json(json!({
        "url": session.url,
        "sessionId": session.id,
        "orderId": order.id,
      })))
    }
    PipelineResult::Stopped => {
      warn!("Checkout pipeline stopped before opening a payment session.");
      Err(AppError::Internal("checkout halted unexpectedly".to_string()))
    }
  }
}
