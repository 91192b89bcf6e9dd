// core/src/pipeline/mod.rs

//! The `Pipeline` type: step table, handler registration and the run loop.

pub mod definition;
pub mod execution;
pub mod hooks;
