// storefront/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use crate::services::{IdentityProvider, PaymentGateway, SignatureVerifier};
use crate::store::Store;
use std::sync::Arc;
use verdant_pipeline::Registry;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub identity: Arc<dyn IdentityProvider>,
  pub verifier: Arc<SignatureVerifier>,
  pub pipelines: Arc<Registry<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the collaborators together and registers every pipeline.
  pub fn new(
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    identity: Arc<dyn IdentityProvider>,
    config: Arc<AppConfig>,
  ) -> Self {
    let verifier = Arc::new(SignatureVerifier::new(
      config.stripe_webhook_secret.clone(),
      config.webhook_tolerance_secs,
    ));
    let state = Self {
      store,
      gateway,
      identity,
      verifier,
      pipelines: Arc::new(Registry::new()),
      config,
    };
    pipelines::register_all_pipelines(&state.pipelines);
    state
  }
}
