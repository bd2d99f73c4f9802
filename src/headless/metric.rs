use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::binding::{Completion, ContextBinding, MetricBinding, RawRequest, RequestWindow};
use crate::core::Extent;
use crate::error::{CubismError, CubismResult};
use crate::event::{Dispatch, EventKind, EventType, ForeignEvent, RawListener};

use super::{HeadlessBackend, HeadlessContext};

/// Extra samples re-requested on every refresh so late-arriving points are picked up.
const METRIC_OVERLAP: usize = 6;

const METRIC_EVENTS: &[EventKind] = &[EventKind::Change];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }

    fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Self::Add => left + right,
            Self::Subtract => left - right,
            Self::Multiply => left * right,
            Self::Divide => left / right,
        }
    }
}

struct SampleWindow {
    /// Time of `values[0]`; negative infinity until the first window is adopted.
    start: f64,
    stop: f64,
    values: Vec<f64>,
    fetching: bool,
    listening: usize,
}

struct RequestedMetric {
    id: u64,
    name: Option<String>,
    request: RawRequest,
    step_ms: f64,
    size: usize,
    window: RefCell<SampleWindow>,
    events: RefCell<Dispatch<RawListener>>,
}

enum MetricNode {
    Constant(f64),
    Requested(Rc<RequestedMetric>),
    Derived {
        operator: Operator,
        left: HeadlessMetric,
        right: HeadlessMetric,
    },
}

/// Metric handle of the headless runtime.
#[derive(Clone)]
pub struct HeadlessMetric {
    context: HeadlessContext,
    node: Rc<MetricNode>,
}

impl HeadlessMetric {
    pub(crate) fn constant(context: HeadlessContext, value: f64) -> Self {
        Self {
            context,
            node: Rc::new(MetricNode::Constant(value)),
        }
    }

    pub(crate) fn requested(
        context: HeadlessContext,
        request: RawRequest,
        name: Option<String>,
    ) -> Self {
        let metric = RequestedMetric {
            id: context.backend().next_id(),
            name,
            request,
            // Step and size are fixed when the metric is defined.
            step_ms: context.step_ms(),
            size: context.size(),
            window: RefCell::new(SampleWindow {
                start: f64::NEG_INFINITY,
                stop: f64::NAN,
                values: Vec::new(),
                fetching: false,
                listening: 0,
            }),
            events: RefCell::new(Dispatch::new(METRIC_EVENTS)),
        };
        Self {
            context,
            node: Rc::new(MetricNode::Requested(Rc::new(metric))),
        }
    }

    fn derive(&self, operator: Operator, other: &Self) -> CubismResult<Self> {
        if !self.context.same_context(&other.context) {
            return Err(CubismError::ContextMismatch);
        }
        Ok(Self {
            context: self.context.clone(),
            node: Rc::new(MetricNode::Derived {
                operator,
                left: self.clone(),
                right: other.clone(),
            }),
        })
    }

    /// Number of samples currently held, for requested metrics.
    #[must_use]
    pub fn retained_samples(&self) -> Option<usize> {
        match self.node.as_ref() {
            MetricNode::Requested(metric) => Some(metric.window.borrow().values.len()),
            _ => None,
        }
    }
}

impl RequestedMetric {
    fn prepare(self: &Rc<Self>, start1: f64, stop: f64) {
        let window = {
            let mut window = self.window.borrow_mut();
            let steps = if window.start.is_finite() {
                ((start1 - window.start) / self.step_ms).round().max(0.0) as usize
            } else {
                self.size
            }
            .min(self.size);
            if steps == 0 || window.fetching {
                return;
            }
            window.fetching = true;
            let steps = (steps + METRIC_OVERLAP).min(self.size);
            RequestWindow {
                start_ms: stop - steps as f64 * self.step_ms,
                stop_ms: stop,
                step_ms: self.step_ms,
            }
        };

        tracing::trace!(metric = self.id, ?window, "requesting metric window");
        let weak = Rc::downgrade(self);
        let completion = Completion::new(move |result| {
            if let Some(metric) = weak.upgrade() {
                metric.receive(window.start_ms, result);
            }
        });
        (self.request)(window, completion);
    }

    fn receive(&self, start0: f64, result: CubismResult<Vec<f64>>) {
        let (start, stop) = {
            let mut window = self.window.borrow_mut();
            window.fetching = false;
            let data = match result {
                Ok(data) => data,
                Err(error) => {
                    tracing::warn!(metric = self.id, %error, "metric request failed");
                    return;
                }
            };
            let offset = if window.start.is_finite() {
                ((start0 - window.start) / self.step_ms).round() as i64
            } else {
                0
            };
            for (j, value) in data.into_iter().enumerate() {
                let Ok(index) = usize::try_from(offset + j as i64) else {
                    continue;
                };
                if index >= window.values.len() {
                    window.values.resize(index + 1, f64::NAN);
                }
                window.values[index] = value;
            }
            (window.start, window.stop)
        };
        self.emit_change(start, stop);
    }

    fn before_change(&self, start1: f64, stop1: f64) {
        let mut window = self.window.borrow_mut();
        if !window.start.is_finite() {
            window.start = start1;
        }
        let scrolled = ((start1 - window.start) / self.step_ms)
            .round()
            .clamp(0.0, self.size as f64) as usize;
        let scrolled = scrolled.min(window.values.len());
        window.values.drain(..scrolled);
        window.start = start1;
        window.stop = stop1;
    }

    fn emit_change(&self, start_ms: f64, stop_ms: f64) {
        let listeners = self.events.borrow().listeners(EventKind::Change);
        for listener in listeners {
            listener(ForeignEvent::Range { start_ms, stop_ms });
        }
    }

    fn value_at(&self, index: usize) -> f64 {
        self.window
            .borrow()
            .values
            .get(index)
            .copied()
            .unwrap_or(f64::NAN)
    }

    fn on(
        self: &Rc<Self>,
        context: &HeadlessContext,
        event: &EventType,
        listener: Option<RawListener>,
    ) {
        let registered = self.events.borrow().get(event).is_some();
        let transition = {
            let mut window = self.window.borrow_mut();
            match (&listener, registered) {
                (None, true) => {
                    window.listening -= 1;
                    window.listening == 0
                }
                (Some(_), false) => {
                    window.listening += 1;
                    window.listening == 1
                }
                _ => false,
            }
        };

        // Fetching is tied to the first listener and stops with the last one.
        if transition {
            let prepare = context_event(self.id, EventKind::Prepare);
            let before_change = context_event(self.id, EventKind::BeforeChange);
            if listener.is_some() {
                tracing::debug!(metric = self.id, "metric subscribed to context");
                context.on(&prepare, Some(self.prepare_listener()));
                context.on(&before_change, Some(self.before_change_listener()));
            } else {
                tracing::debug!(metric = self.id, "metric unsubscribed from context");
                context.on(&prepare, None);
                context.on(&before_change, None);
            }
        }

        self.events.borrow_mut().on(event, listener.clone());
        if let Some(listener) = listener {
            let (start_ms, stop_ms) = {
                let window = self.window.borrow();
                (window.start, window.stop)
            };
            listener(ForeignEvent::Range { start_ms, stop_ms });
        }
    }

    fn prepare_listener(self: &Rc<Self>) -> RawListener {
        let weak: Weak<Self> = Rc::downgrade(self);
        Rc::new(move |event| {
            if let (ForeignEvent::Range { start_ms, stop_ms }, Some(metric)) =
                (event, weak.upgrade())
            {
                metric.prepare(start_ms, stop_ms);
            }
        })
    }

    fn before_change_listener(self: &Rc<Self>) -> RawListener {
        let weak: Weak<Self> = Rc::downgrade(self);
        Rc::new(move |event| {
            if let (ForeignEvent::Range { start_ms, stop_ms }, Some(metric)) =
                (event, weak.upgrade())
            {
                metric.before_change(start_ms, stop_ms);
            }
        })
    }
}

fn context_event(id: u64, kind: EventKind) -> EventType {
    EventType::namespaced(kind, format!("metric-{id}"))
}

impl MetricBinding<HeadlessBackend> for HeadlessMetric {
    fn add(&self, other: &HeadlessMetric) -> CubismResult<HeadlessMetric> {
        self.derive(Operator::Add, other)
    }

    fn subtract(&self, other: &HeadlessMetric) -> CubismResult<HeadlessMetric> {
        self.derive(Operator::Subtract, other)
    }

    fn multiply(&self, other: &HeadlessMetric) -> CubismResult<HeadlessMetric> {
        self.derive(Operator::Multiply, other)
    }

    fn divide(&self, other: &HeadlessMetric) -> CubismResult<HeadlessMetric> {
        self.derive(Operator::Divide, other)
    }

    fn shift(&self, offset_ms: f64) -> HeadlessMetric {
        match self.node.as_ref() {
            MetricNode::Constant(_) => self.clone(),
            MetricNode::Requested(metric) => {
                let request = Rc::clone(&metric.request);
                let shifted: RawRequest = Rc::new(move |window: RequestWindow, completion| {
                    request(window.shifted(offset_ms), completion);
                });
                Self::requested(self.context.clone(), shifted, metric.name.clone())
            }
            MetricNode::Derived {
                operator,
                left,
                right,
            } => Self {
                context: self.context.clone(),
                node: Rc::new(MetricNode::Derived {
                    operator: *operator,
                    left: left.shift(offset_ms),
                    right: right.shift(offset_ms),
                }),
            },
        }
    }

    fn value_at(&self, index: usize) -> f64 {
        match self.node.as_ref() {
            MetricNode::Constant(value) => *value,
            MetricNode::Requested(metric) => metric.value_at(index),
            MetricNode::Derived {
                operator,
                left,
                right,
            } => operator.apply(left.value_at(index), right.value_at(index)),
        }
    }

    fn extent(&self) -> (f64, f64) {
        let extent = match self.node.as_ref() {
            MetricNode::Constant(value) => Extent::of_values([*value]),
            _ => Extent::of_values((0..self.context.size()).map(|index| self.value_at(index))),
        };
        extent.map_or((f64::INFINITY, f64::NEG_INFINITY), |extent| {
            (extent.min, extent.max)
        })
    }

    fn on(&self, event: &EventType, listener: Option<RawListener>) {
        if event.kind() != EventKind::Change {
            tracing::warn!(%event, "metrics only raise change events");
            return;
        }
        match self.node.as_ref() {
            MetricNode::Constant(_) => {}
            MetricNode::Requested(metric) => metric.on(&self.context, event, listener),
            MetricNode::Derived { left, right, .. } => {
                left.on(event, listener.clone());
                right.on(event, listener);
            }
        }
    }

    fn has_listener(&self, event: &EventType) -> bool {
        match self.node.as_ref() {
            MetricNode::Constant(_) => false,
            MetricNode::Requested(metric) => metric.events.borrow().get(event).is_some(),
            MetricNode::Derived { left, right, .. } => {
                left.has_listener(event) || right.has_listener(event)
            }
        }
    }

    fn context(&self) -> HeadlessContext {
        self.context.clone()
    }

    fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HeadlessMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node.as_ref() {
            MetricNode::Constant(value) => write!(f, "{value}"),
            MetricNode::Requested(metric) => match &metric.name {
                Some(name) => f.write_str(name),
                None => write!(f, "metric-{}", metric.id),
            },
            MetricNode::Derived {
                operator,
                left,
                right,
            } => write!(f, "{left} {} {right}", operator.symbol()),
        }
    }
}
