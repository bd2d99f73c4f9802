//! Typed proxies over the wrapped runtime.
//!
//! Every type here is generic over a [`Backend`](crate::binding::Backend)
//! and forwards to its handle, converting between the runtime's
//! milliseconds and positional callbacks and Rust's `Duration`, `chrono`
//! timestamps and typed events.

mod charts;
mod context;
mod context_config;
mod cubism;
mod data_source;
mod json_contract;
mod metric;
mod request;

pub use charts::{Axis, Comparison, Horizon, Rule};
pub use context::Context;
pub use context_config::ContextConfig;
pub use cubism::Cubism;
pub use data_source::{Cube, Graphite, Librato};
pub use json_contract::{CONTEXT_CONFIG_JSON_SCHEMA_V1, ContextConfigJsonContractV1};
pub use metric::Metric;
pub use request::{Completion, Request, RequestFn};
