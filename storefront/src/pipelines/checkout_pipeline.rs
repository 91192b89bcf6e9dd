// storefront/src/pipelines/checkout_pipeline.rs
use crate::errors::AppError;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::pipelines::pricing;
use crate::services::{SessionLine, SessionRequest};
use std::collections::HashMap;
use tracing::{error, info, warn};
use verdant_pipeline::{ContextData, Pipeline, PipelineControl, Registry};

pub fn build_checkout_pipeline() -> Pipeline<CheckoutCtxData, AppError> {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("validate_cart", false, None),
    ("load_inventory", false, None),
    ("check_stock", false, None),
    ("price_order", false, None),
    ("persist_pending_order", false, None),
    ("open_payment_session", false, None),
  ]);

  p.on_root("validate_cart", validate_cart);
  p.on_root("load_inventory", load_inventory);
  p.on_root("check_stock", check_stock);
  p.on_root("price_order", price_order);
  p.on_root("persist_pending_order", persist_pending_order);
  p.on_root("open_payment_session", open_payment_session);
  p
}

pub fn register_checkout_pipeline(registry: &Registry<AppError>) {
  registry.register_pipeline(build_checkout_pipeline());
  info!("Checkout pipeline registered.");
}

async fn validate_cart(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let lines = pricing::validate_cart(&ctx_data.read().cart)?;
  ctx_data.write().lines = lines;
  Ok(PipelineControl::Continue)
}

async fn load_inventory(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let (store, ids) = {
    let guard = ctx_data.read();
    (guard.app_state.store.clone(), pricing::product_ids(&guard.lines))
  };

  let products: HashMap<_, _> = store
    .products_by_ids(&ids)
    .await?
    .into_iter()
    .map(|p| (p.id.clone(), p))
    .collect();

  let mut guard = ctx_data.write();
  let missing = pricing::find_missing(&guard.lines, &products);
  if !missing.is_empty() {
    warn!(missing = ?missing, "Cart references unknown products.");
    return Err(AppError::ProductsNotFound(missing));
  }
  guard.products = products;
  Ok(PipelineControl::Continue)
}

async fn check_stock(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let guard = ctx_data.read();
  pricing::check_stock(&guard.lines, &guard.products)?;
  Ok(PipelineControl::Continue)
}

async fn price_order(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let mut guard = ctx_data.write();
  let draft = pricing::price_cart(&guard.user_id, &guard.lines, &guard.products)?;
  guard.draft = Some(draft);
  Ok(PipelineControl::Continue)
}

async fn persist_pending_order(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let (store, draft, currency) = {
    let guard = ctx_data.read();
    let draft = guard
      .draft
      .clone()
      .ok_or_else(|| AppError::Internal("order draft missing before persistence".to_string()))?;
    (guard.app_state.store.clone(), draft, guard.app_state.config.currency.clone())
  };

  let order = store.create_pending_order(&draft).await?;
  info!(
    order_id = %order.id,
    user_id = %order.user_id,
    total = %pricing::format_minor_units(order.total_cents, &currency),
    "Pending order created."
  );
  ctx_data.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn open_payment_session(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let (app_state, request) = {
    let guard = ctx_data.read();
    let order = guard
      .order
      .as_ref()
      .ok_or_else(|| AppError::Internal("order missing before payment session".to_string()))?;
    let config = &guard.app_state.config;

    let lines = order
      .items
      .iter()
      .map(|item| {
        let product = guard.products.get(&item.product_id);
        SessionLine {
          product_id: item.product_id.clone(),
          name: product.map(|p| p.name.clone()).unwrap_or_else(|| item.product_id.clone()),
          description: product.map(|p| p.description.clone()).unwrap_or_default(),
          images: product.map(|p| p.images.clone()).unwrap_or_default(),
          unit_amount: item.unit_price_cents,
          quantity: item.quantity,
        }
      })
      .collect();

    let request = SessionRequest {
      order_id: order.id,
      user_id: order.user_id.clone(),
      currency: config.currency.clone(),
      success_url: SessionRequest::success_url_for(&config.app_base_url, order.id),
      cancel_url: SessionRequest::cancel_url_for(&config.app_base_url),
      lines,
    };
    (guard.app_state.clone(), request)
  };

  match app_state.gateway.create_checkout_session(&request).await {
    Ok(session) => {
      info!(order_id = %request.order_id, session_id = %session.id, "Payment session opened.");
      ctx_data.write().session = Some(session);
      Ok(PipelineControl::Continue)
    }
    Err(gateway_err) => {
      error!(order_id = %request.order_id, error = %gateway_err, "Payment session request failed.");
      if app_state.config.compensate_on_gateway_failure {
        match app_state.store.cancel_pending_order(request.order_id).await {
          Ok(cancelled) => {
            info!(order_id = %request.order_id, cancelled, "Compensated orphaned pending order.");
            ctx_data.write().compensated = cancelled;
          }
          Err(store_err) => {
            error!(order_id = %request.order_id, error = %store_err, "Compensation failed; order left for the sweeper.");
          }
        }
      }
      Err(AppError::Gateway(gateway_err))
    }
  }
}
