// storefront/src/web/extractors.rs

use actix_web::http::header;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "auth_session";

/// The caller behind a valid session, taken from the `auth_session` cookie
/// or an `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: String,
}

fn session_token(req: &HttpRequest) -> Option<String> {
  if let Some(cookie) = req.cookie(SESSION_COOKIE) {
    if !cookie.value().is_empty() {
      return Some(cookie.value().to_string());
    }
  }
  req
    .headers()
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(String::from)
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let token = session_token(req);
    let identity = req.app_data::<web::Data<AppState>>().map(|s| s.identity.clone());

    Box::pin(async move {
      let identity = identity.ok_or_else(|| AppError::Internal("application state not configured".to_string()))?;
      let Some(token) = token else {
        warn!("Request without a session token.");
        return Err(AppError::Auth("missing session".to_string()));
      };
      match identity.resolve_session(&token).await? {
        Some(user_id) => Ok(AuthenticatedUser { user_id }),
        None => {
          warn!("Session token did not resolve to a user.");
          Err(AppError::Auth("invalid or expired session".to_string()))
        }
      }
    })
  }
}
