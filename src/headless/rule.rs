use std::rc::Rc;

use crate::binding::{ChartBinding, ContextBinding, MetricBinding, RuleBinding};
use crate::error::CubismResult;
use crate::event::EventType;

use super::element::{Element, ElementState, Subscription};
use super::surface::{ElementId, NodeContent, Surface};
use super::{HeadlessBackend, HeadlessContext, HeadlessMetric};

#[derive(Default)]
struct RuleState {
    metric: Option<HeadlessMetric>,
}

impl ElementState for RuleState {
    const CLASS: &'static str = "rule";

    fn render(&self, context: &HeadlessContext) -> NodeContent {
        // A mark for every sample that is present and non-zero.
        let marks = self
            .metric
            .as_ref()
            .map(|metric| {
                (0..context.size())
                    .filter(|&index| {
                        let value = metric.value_at(index);
                        !value.is_nan() && value != 0.0
                    })
                    .collect()
            })
            .unwrap_or_default();
        NodeContent::Rule {
            marks,
            focus: context.focus_index(),
        }
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        let mut subscriptions = vec![Subscription::Context(EventType::focus())];
        if let Some(metric) = &self.metric {
            subscriptions.push(Subscription::Metric(metric.clone(), EventType::change()));
        }
        subscriptions
    }
}

/// Vertical rule of the headless runtime.
#[derive(Clone)]
pub struct HeadlessRule {
    element: Rc<Element<RuleState>>,
}

impl HeadlessRule {
    pub(crate) fn new(context: HeadlessContext) -> Self {
        Self {
            element: Element::new(context, RuleState::default()),
        }
    }

    #[must_use]
    pub fn id(&self) -> ElementId {
        self.element.id()
    }
}

impl ChartBinding<HeadlessBackend> for HeadlessRule {
    fn apply(&self, surface: &Surface) -> CubismResult<()> {
        self.element.apply(surface)
    }

    fn remove(&self, surface: &Surface) -> CubismResult<()> {
        self.element.remove(surface)
    }
}

impl RuleBinding<HeadlessBackend> for HeadlessRule {
    fn metric(&self) -> Option<HeadlessMetric> {
        self.element.state().metric.clone()
    }

    fn set_metric(&self, metric: Option<&HeadlessMetric>) {
        self.element.update(|state| state.metric = metric.cloned());
    }
}
