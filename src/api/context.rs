use std::rc::Rc;
use std::time::Duration;

use crate::binding::{Backend, ContextBinding};
use crate::core::types::{duration_to_millis, millis_to_duration};
use crate::core::{TimeRange, TimeScale};
use crate::error::{CubismError, CubismResult};
use crate::event::{ContextEvent, EventKind, EventType, raw_listener};

use super::request::{Request, into_raw};
use super::{Axis, Comparison, ContextConfig, Cube, Graphite, Horizon, Librato, Metric, Rule};

/// Parses a listener name for the string API; unknown kinds are programming errors.
fn parse_event_name(name: &str) -> EventType {
    EventType::parse(name).unwrap_or_else(|err| panic!("{err}"))
}

/// Shared timeline of a dashboard: step, window size, delays and focus.
///
/// Every metric and chart element is created through a context and stays
/// bound to it.
pub struct Context<B: Backend> {
    binding: B::Context,
}

impl<B: Backend> Clone for Context<B> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
        }
    }
}

impl<B: Backend> Context<B> {
    #[must_use]
    pub fn from_binding(binding: B::Context) -> Self {
        Self { binding }
    }

    #[must_use]
    pub fn binding(&self) -> &B::Context {
        &self.binding
    }

    #[must_use]
    pub fn into_binding(self) -> B::Context {
        self.binding
    }

    #[must_use]
    pub fn step(&self) -> Duration {
        millis_to_duration(self.binding.step_ms())
    }

    /// Sets the sampling interval. Sub-millisecond steps are rejected.
    pub fn set_step(&self, step: Duration) -> CubismResult<()> {
        if step < Duration::from_millis(1) {
            return Err(CubismError::InvalidConfig(format!(
                "step must be at least one millisecond, got {step:?}"
            )));
        }
        tracing::debug!(?step, "context step changed");
        self.binding.set_step_ms(duration_to_millis(step));
        Ok(())
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.binding.size()
    }

    /// Sets the number of samples in the window.
    pub fn set_size(&self, size: usize) -> CubismResult<()> {
        if size == 0 {
            return Err(CubismError::InvalidConfig("size must be > 0".to_owned()));
        }
        tracing::debug!(size, "context size changed");
        self.binding.set_size(size);
        Ok(())
    }

    #[must_use]
    pub fn server_delay(&self) -> Duration {
        millis_to_duration(self.binding.server_delay_ms())
    }

    pub fn set_server_delay(&self, delay: Duration) {
        tracing::debug!(?delay, "context server delay changed");
        self.binding.set_server_delay_ms(duration_to_millis(delay));
    }

    #[must_use]
    pub fn client_delay(&self) -> Duration {
        millis_to_duration(self.binding.client_delay_ms())
    }

    pub fn set_client_delay(&self, delay: Duration) {
        tracing::debug!(?delay, "context client delay changed");
        self.binding.set_client_delay_ms(duration_to_millis(delay));
    }

    /// Applies every field of `config` after validating it.
    pub fn configure(&self, config: &ContextConfig) -> CubismResult<()> {
        config.validate()?;
        self.set_step(config.step())?;
        self.set_size(config.size)?;
        self.set_server_delay(config.server_delay());
        self.set_client_delay(config.client_delay());
        Ok(())
    }

    /// Current configuration as a [`ContextConfig`].
    #[must_use]
    pub fn config(&self) -> ContextConfig {
        ContextConfig::default()
            .with_step(self.step())
            .with_size(self.size())
            .with_server_delay(self.server_delay())
            .with_client_delay(self.client_delay())
    }

    #[must_use]
    pub fn graphite(&self, host: &str) -> Graphite<B> {
        Graphite::from_binding(self.binding.graphite(host))
    }

    #[must_use]
    pub fn cube(&self, host: &str) -> Cube<B> {
        Cube::from_binding(self.binding.cube(host))
    }

    #[must_use]
    pub fn librato(&self, user: &str, token: &str) -> Librato<B> {
        Librato::from_binding(self.binding.librato(user, token))
    }

    /// A metric with the same value at every index.
    #[must_use]
    pub fn constant(&self, value: f64) -> Metric<B> {
        Metric::from_binding(self.binding.constant(value))
    }

    /// A metric whose samples come from `request`; `name` is its display name.
    #[must_use]
    pub fn new_metric(&self, request: impl Request, name: &str) -> Metric<B> {
        Metric::from_binding(self.binding.metric(into_raw(request), Some(name)))
    }

    #[must_use]
    pub fn new_axis(&self) -> Axis<B> {
        Axis::from_binding(self.binding.axis())
    }

    #[must_use]
    pub fn new_rule(&self) -> Rule<B> {
        Rule::from_binding(self.binding.rule())
    }

    #[must_use]
    pub fn new_horizon(&self) -> Horizon<B> {
        Horizon::from_binding(self.binding.horizon())
    }

    #[must_use]
    pub fn new_comparison(&self) -> Comparison<B> {
        Comparison::from_binding(self.binding.comparison())
    }

    /// Maps the displayed window onto `[0, size]`.
    pub fn scale(&self) -> CubismResult<TimeScale> {
        self.binding.scale()
    }

    pub fn start(&self) {
        self.binding.start();
    }

    pub fn stop(&self) {
        self.binding.stop();
    }

    /// Registers `handler` for `event`, replacing any listener with the same name.
    pub fn on(&self, event: &EventType, handler: impl Fn(ContextEvent) + 'static) {
        tracing::trace!(%event, "context listener registered");
        let listener = raw_listener(event.kind(), Rc::new(handler));
        self.binding.on(event, Some(listener));
    }

    pub fn on_change(&self, handler: impl Fn(TimeRange) + 'static) {
        self.on_range(EventKind::Change, handler);
    }

    pub fn on_before_change(&self, handler: impl Fn(TimeRange) + 'static) {
        self.on_range(EventKind::BeforeChange, handler);
    }

    pub fn on_prepare(&self, handler: impl Fn(TimeRange) + 'static) {
        self.on_range(EventKind::Prepare, handler);
    }

    pub fn on_focus(&self, handler: impl Fn(Option<usize>) + 'static) {
        self.on(&EventType::focus(), move |event| {
            if let ContextEvent::Focus(index) = event {
                handler(index);
            }
        });
    }

    fn on_range(&self, kind: EventKind, handler: impl Fn(TimeRange) + 'static) {
        self.on(&EventType::new(kind), move |event| {
            if let Some(range) = event.range() {
                handler(range);
            }
        });
    }

    /// String form of [`Context::on`], e.g. `"change.myChart"`.
    ///
    /// # Panics
    ///
    /// Panics if the event name is not one of `prepare`, `beforechange`,
    /// `change` or `focus`.
    pub fn add_listener(&self, name: &str, handler: impl Fn(ContextEvent) + 'static) {
        self.on(&parse_event_name(name), handler);
    }

    /// Removes the listener registered under `name`.
    ///
    /// # Panics
    ///
    /// Panics if the event name is not recognized.
    pub fn remove_listener(&self, name: &str) {
        self.remove(&parse_event_name(name));
    }

    pub fn remove(&self, event: &EventType) {
        tracing::trace!(%event, "context listener removed");
        self.binding.on(event, None);
    }

    #[must_use]
    pub fn has_listener(&self, event: &EventType) -> bool {
        self.binding.has_listener(event)
    }

    /// Moves the focus cursor to sample `index`.
    pub fn focus(&self, index: usize) {
        self.binding.focus(Some(index));
    }

    pub fn no_focus(&self) {
        self.binding.focus(None);
    }

    #[must_use]
    pub fn focus_index(&self) -> Option<usize> {
        self.binding.focus_index()
    }
}
