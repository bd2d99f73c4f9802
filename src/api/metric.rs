use std::fmt;
use std::rc::Rc;

use crate::binding::{Backend, ContextBinding, MetricBinding};
use crate::core::{Extent, TimeRange};
use crate::error::{CubismError, CubismResult};
use crate::event::{ContextEvent, EventKind, EventType, raw_listener};

use super::Context;

/// A time series bound to a context.
///
/// Samples are indexed from `0` (oldest) to `size - 1` (newest) within the
/// context's displayed window. Arithmetic builds derived metrics evaluated
/// pointwise on demand; operands are never modified.
pub struct Metric<B: Backend> {
    binding: B::Metric,
}

impl<B: Backend> Clone for Metric<B> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
        }
    }
}

impl<B: Backend> Metric<B> {
    #[must_use]
    pub fn from_binding(binding: B::Metric) -> Self {
        Self { binding }
    }

    #[must_use]
    pub fn binding(&self) -> &B::Metric {
        &self.binding
    }

    #[must_use]
    pub fn into_binding(self) -> B::Metric {
        self.binding
    }

    pub fn add(&self, other: &Self) -> CubismResult<Self> {
        self.binding.add(&other.binding).map(Self::from_binding)
    }

    pub fn subtract(&self, other: &Self) -> CubismResult<Self> {
        self.binding.subtract(&other.binding).map(Self::from_binding)
    }

    pub fn multiply(&self, other: &Self) -> CubismResult<Self> {
        self.binding.multiply(&other.binding).map(Self::from_binding)
    }

    pub fn divide(&self, other: &Self) -> CubismResult<Self> {
        self.binding.divide(&other.binding).map(Self::from_binding)
    }

    /// The same series offset by `samples` steps; negative values look into the past.
    #[must_use]
    pub fn shift(&self, samples: i64) -> Self {
        let offset_ms = samples as f64 * self.binding.context().step_ms();
        Self::from_binding(self.binding.shift(offset_ms))
    }

    /// Sample at `index`, or `None` where no value is known.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<f64> {
        let value = self.binding.value_at(index);
        (!value.is_nan()).then_some(value)
    }

    /// Smallest and largest known sample over the window.
    #[must_use]
    pub fn extent(&self) -> Option<Extent> {
        Extent::from_raw(self.binding.extent())
    }

    /// Registers `handler` for `event`, which must be a `change` event.
    pub fn on(&self, event: &EventType, handler: impl Fn(TimeRange) + 'static) -> CubismResult<()> {
        if event.kind() != EventKind::Change {
            return Err(CubismError::UnsupportedEventType(event.to_string()));
        }
        self.register(event, handler);
        Ok(())
    }

    pub fn on_change(&self, handler: impl Fn(TimeRange) + 'static) {
        self.register(&EventType::change(), handler);
    }

    fn register(&self, event: &EventType, handler: impl Fn(TimeRange) + 'static) {
        let listener = raw_listener(
            EventKind::Change,
            Rc::new(move |event: ContextEvent| {
                if let Some(range) = event.range() {
                    handler(range);
                }
            }),
        );
        self.binding.on(event, Some(listener));
    }

    /// String form of [`Metric::on`], e.g. `"change.myChart"`.
    ///
    /// # Panics
    ///
    /// Panics unless `name` is `change` with an optional namespace.
    pub fn add_listener(&self, name: &str, handler: impl Fn(TimeRange) + 'static) {
        self.register(&Self::parse_change(name), handler);
    }

    /// Removes the listener registered under `name`.
    ///
    /// # Panics
    ///
    /// Panics unless `name` is `change` with an optional namespace.
    pub fn remove_listener(&self, name: &str) {
        let event = Self::parse_change(name);
        self.binding.on(&event, None);
    }

    #[must_use]
    pub fn has_change_listener(&self) -> bool {
        self.binding.has_listener(&EventType::change())
    }

    #[must_use]
    pub fn has_listener(&self, event: &EventType) -> bool {
        self.binding.has_listener(event)
    }

    #[must_use]
    pub fn context(&self) -> Context<B> {
        Context::from_binding(self.binding.context())
    }

    fn parse_change(name: &str) -> EventType {
        match EventType::parse(name) {
            Ok(event) if event.kind() == EventKind::Change => event,
            _ => panic!("{}", CubismError::UnsupportedEventType(name.to_owned())),
        }
    }
}

impl<B: Backend> fmt::Display for Metric<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.binding.name())
    }
}

impl<B: Backend> fmt::Debug for Metric<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metric")
            .field("name", &self.binding.name())
            .finish_non_exhaustive()
    }
}
