// core/src/lib.rs

//! A small asynchronous step-pipeline engine.
//!
//! A [`Pipeline`] is an ordered list of named steps. Each step can carry
//! `before`, `on` and `after` handlers that receive a shared [`ContextData`]
//! and decide whether the run continues or stops early. A [`Registry`] keeps
//! one pipeline per context type so callers can dispatch a context without
//! naming the pipeline that owns it.
//!
//!  - Steps may be optional or skipped by a predicate over the context.
//!  - Handlers are async; lock guards on the context must be dropped before `.await`.
//!  - Every step runs inside its own `tracing` span.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::handler::Handler;
pub use crate::core::step::{SkipCondition, StepDef};
pub use crate::error::PipelineError;
pub use crate::pipeline::definition::Pipeline;
pub use crate::registry::Registry;
