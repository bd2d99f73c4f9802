//! In-process implementation of the wrapped runtime.
//!
//! The headless backend reproduces the observable contract of the browser
//! library closely enough to exercise the binding without a browser:
//! configuration defaults, the prepare/beforechange/change refresh cycle
//! driven by an [`EventLoop`], metric window bookkeeping, data-source
//! request formats (through a pluggable [`Transport`]) and apply/remove of
//! chart nodes on a [`Surface`]. Rendering produces a [`NodeContent`]
//! summary per element rather than pixels.

mod axis;
mod comparison;
mod context;
mod element;
mod event_loop;
mod horizon;
mod metric;
mod rule;
mod sources;
mod surface;
mod transport;

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

use crate::binding::Backend;
use crate::error::CubismResult;

pub use axis::HeadlessAxis;
pub use comparison::HeadlessComparison;
pub use context::HeadlessContext;
pub use event_loop::{EventLoop, TimerId};
pub use horizon::HeadlessHorizon;
pub use metric::HeadlessMetric;
pub use rule::HeadlessRule;
pub use sources::{
    HeadlessCube, HeadlessGraphite, HeadlessLibrato, encode_component, parse_cube_json,
    parse_graphite_find, parse_graphite_raw,
};
pub use surface::{ElementId, NodeContent, Surface, SurfaceNode};
pub use transport::{CannedTransport, FetchCallback, HttpRequest, OfflineTransport, Transport};

/// Version reported by the headless runtime.
pub const VERSION: &str = "1.6.0";

/// Entry point of the headless runtime.
///
/// Clones share the same clock, transport and id sequence.
#[derive(Clone)]
pub struct HeadlessBackend {
    event_loop: EventLoop,
    transport: Rc<dyn Transport>,
    ids: Rc<Cell<u64>>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// Creates a runtime whose clock starts at the current wall time, truncated to milliseconds.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self::at(now.duration_trunc(TimeDelta::milliseconds(1)).unwrap_or(now))
    }

    /// Creates a runtime whose clock starts at `now`.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            event_loop: EventLoop::new(now),
            transport: Rc::new(OfflineTransport),
            ids: Rc::new(Cell::new(0)),
        }
    }

    /// Routes data-source requests through `transport`.
    #[must_use]
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Rc::new(transport);
        self
    }

    #[must_use]
    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    pub(crate) fn transport(&self) -> Rc<dyn Transport> {
        Rc::clone(&self.transport)
    }

    pub(crate) fn next_id(&self) -> u64 {
        let id = self.ids.get() + 1;
        self.ids.set(id);
        id
    }
}

impl Backend for HeadlessBackend {
    type Surface = Surface;
    type Context = HeadlessContext;
    type Metric = HeadlessMetric;
    type Graphite = HeadlessGraphite;
    type Cube = HeadlessCube;
    type Librato = HeadlessLibrato;
    type Axis = HeadlessAxis;
    type Rule = HeadlessRule;
    type Horizon = HeadlessHorizon;
    type Comparison = HeadlessComparison;

    fn version(&self) -> String {
        VERSION.to_owned()
    }

    fn context(&self) -> CubismResult<HeadlessContext> {
        Ok(HeadlessContext::new(self.clone()))
    }
}
