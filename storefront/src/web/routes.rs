// storefront/src/web/routes.rs

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::errors::AppError;
use crate::web::handlers::{checkout_handlers, health, order_handlers, webhook_handlers};

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid request body: {}", err)).into()
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .route("/health", web::get().to(health::health_check_handler))
    .service(
      web::scope("/api")
        .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
        .route("/orders", web::get().to(order_handlers::list_orders_handler))
        .route("/webhook/stripe", web::post().to(webhook_handlers::payment_webhook_handler)),
    );
}
