// core/src/core/handler.rs

//! The boxed handler type stored per step phase.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// An async step handler.
///
/// Handlers receive a clone of the run's `ContextData<TData>`. A handler must
/// copy what it needs out of a guard and drop the guard before awaiting;
/// `parking_lot` guards are blocking and not `Send`.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;
