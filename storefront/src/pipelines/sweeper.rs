// storefront/src/pipelines/sweeper.rs

//! Periodic cancellation of `PENDING` orders whose payment never arrived.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument};

use crate::store::{OrderLedger, Store, StoreError};

/// Cancels every `PENDING` order created more than `ttl` before `now`.
#[instrument(name = "sweep_stale_orders", skip(ledger), err(Display))]
pub async fn sweep_stale_orders<L>(ledger: &L, now: DateTime<Utc>, ttl: Duration) -> Result<u64, StoreError>
where
  L: OrderLedger + ?Sized,
{
  let cutoff = TimeDelta::from_std(ttl)
    .ok()
    .and_then(|ttl| now.checked_sub_signed(ttl))
    .unwrap_or(DateTime::<Utc>::MIN_UTC);
  let cancelled = ledger.cancel_stale_pending(cutoff).await?;
  if cancelled > 0 {
    info!(cancelled, %cutoff, "Cancelled stale pending orders.");
  }
  Ok(cancelled)
}

/// Runs [`sweep_stale_orders`] every `interval` until the runtime shuts down.
pub fn spawn_sweeper(store: Arc<dyn Store>, ttl: Duration, interval: Duration) -> tokio::task::JoinHandle<()> {
  actix_rt::spawn(async move {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
      ticker.tick().await;
      if let Err(e) = sweep_stale_orders(store.as_ref(), Utc::now(), ttl).await {
        error!(error = %e, "Stale order sweep failed; retrying next interval.");
      }
    }
  })
}
