// storefront/src/services/identity.rs

//! Resolves an opaque session token to the user it belongs to.
//! Issuing sessions and credentials happens elsewhere.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use crate::store::StoreError;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
  async fn resolve_session(&self, token: &str) -> Result<Option<String>, StoreError>;
}

/// Reads non-expired rows of `user_sessions`.
#[derive(Clone)]
pub struct PgIdentity {
  pool: PgPool,
}

impl PgIdentity {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl IdentityProvider for PgIdentity {
  #[instrument(name = "PgIdentity::resolve_session", skip_all)]
  async fn resolve_session(&self, token: &str) -> Result<Option<String>, StoreError> {
    let user_id = sqlx::query_scalar::<_, String>(
      "SELECT user_id FROM user_sessions WHERE token = $1 AND expires_at > NOW()",
    )
    .bind(token)
    .fetch_optional(&self.pool)
    .await?;
    Ok(user_id)
  }
}

/// Fixed token table for tests and demo runs.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
  sessions: HashMap<String, String>,
}

impl StaticIdentity {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_session(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
    self.sessions.insert(token.into(), user_id.into());
    self
  }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
  async fn resolve_session(&self, token: &str) -> Result<Option<String>, StoreError> {
    Ok(self.sessions.get(token).cloned())
  }
}
