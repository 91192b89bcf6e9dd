// storefront/src/services/payment_mock.rs
use crate::services::payment_gateway::{GatewayError, HostedSession, PaymentGateway, SessionRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, instrument};

/// In-process stand-in for the hosted checkout service.
///
/// Sessions are deterministic per order (`cs_mock_<order id>`), and a repeated
/// idempotency key returns the session created the first time.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
  requests: Arc<Mutex<Vec<SessionRequest>>>,
  sessions: Arc<Mutex<HashMap<String, HostedSession>>>,
  fail_next: Arc<AtomicBool>,
  fail_always: Arc<AtomicBool>,
}

impl MockGateway {
  pub fn new() -> Self {
    Self::default()
  }

  /// Every later call fails with a `Rejected` error.
  pub fn fail_always(&self, fail: bool) {
    self.fail_always.store(fail, Ordering::SeqCst);
  }

  pub fn fail_next(&self) {
    self.fail_next.store(true, Ordering::SeqCst);
  }

  pub fn requests(&self) -> Vec<SessionRequest> {
    self.requests.lock().clone()
  }
}

#[async_trait]
impl PaymentGateway for MockGateway {
  #[instrument(name = "MockGateway::create_checkout_session", skip_all, fields(order_id = %request.order_id))]
  async fn create_checkout_session(&self, request: &SessionRequest) -> Result<HostedSession, GatewayError> {
    self.requests.lock().push(request.clone());

    if self.fail_always.load(Ordering::SeqCst) || self.fail_next.swap(false, Ordering::SeqCst) {
      info!("Mock gateway refusing session request.");
      return Err(GatewayError::Rejected {
        status: 503,
        message: "mock gateway unavailable".to_string(),
      });
    }

    let session = self
      .sessions
      .lock()
      .entry(request.idempotency_key())
      .or_insert_with(|| HostedSession {
        id: format!("cs_mock_{}", request.order_id.simple()),
        url: format!("https://checkout.mock.local/pay/cs_mock_{}", request.order_id.simple()),
      })
      .clone();
    info!(session_id = %session.id, "Mock checkout session issued.");
    Ok(session)
  }
}
