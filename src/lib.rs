//! cubism-rs: typed bindings for Cubism-style time-series dashboards.
//!
//! The crate mirrors every object of the wrapped visualization runtime
//! (context, metrics, data sources, axis, rule, horizon and comparison
//! charts) with a thin proxy generic over a [`binding::Backend`]. Two
//! backends exist: the browser backend (feature `browser`) forwarding to the
//! real library through `wasm-bindgen`, and the always-available
//! [`headless`] runtime used for tests and non-browser hosts.

pub mod api;
pub mod binding;
pub mod core;
pub mod error;
pub mod event;
pub mod headless;
pub mod telemetry;

#[cfg(feature = "browser")]
pub mod browser;

pub use api::{
    Axis, Comparison, Context, ContextConfig, Cube, Cubism, Graphite, Horizon, Librato, Metric,
    Request, RequestFn, Rule,
};
pub use error::{CubismError, CubismResult};
pub use event::{ContextEvent, EventKind, EventType};
pub use headless::HeadlessBackend;
