use std::rc::Rc;

use crate::binding::{ChartBinding, ComparisonBinding, MetricBinding};
use crate::core::color::default_comparison_colors;
use crate::core::format::{percent_change, si};
use crate::core::{Color, Extent, ValueFormatter, ValueScale};
use crate::error::CubismResult;
use crate::event::EventType;

use super::element::{Element, ElementState, Subscription, displayed_value};
use super::surface::{ElementId, NodeContent, Surface};
use super::{HeadlessBackend, HeadlessContext, HeadlessMetric};

const DEFAULT_HEIGHT: u32 = 120;
const DEFAULT_STROKE_WIDTH: f64 = 1.5;

struct ComparisonState {
    height: u32,
    primary: Option<HeadlessMetric>,
    secondary: Option<HeadlessMetric>,
    scale: ValueScale,
    extent: Option<Extent>,
    title: Option<String>,
    primary_format: ValueFormatter,
    change_format: ValueFormatter,
    colors: Vec<Color>,
    stroke_width: f64,
}

impl ElementState for ComparisonState {
    const CLASS: &'static str = "comparison";

    fn render(&self, context: &HeadlessContext) -> NodeContent {
        let title = self
            .title
            .clone()
            .or_else(|| self.primary.as_ref().map(HeadlessMetric::name));
        let primary = self
            .primary
            .as_ref()
            .and_then(|metric| displayed_value(context, metric));
        let secondary = self
            .secondary
            .as_ref()
            .and_then(|metric| displayed_value(context, metric));
        let change = match (primary, secondary) {
            (Some(primary), Some(secondary)) if secondary != 0.0 => {
                Some((primary - secondary) / secondary)
            }
            _ => None,
        };
        NodeContent::Comparison {
            title,
            primary_label: primary.map(|value| (self.primary_format)(value)),
            change_label: change.map(|value| (self.change_format)(value)),
            height: self.height,
        }
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        let mut subscriptions = vec![Subscription::Context(EventType::focus())];
        for metric in [&self.primary, &self.secondary].into_iter().flatten() {
            subscriptions.push(Subscription::Metric(metric.clone(), EventType::change()));
        }
        subscriptions
    }
}

/// Comparison chart of the headless runtime.
#[derive(Clone)]
pub struct HeadlessComparison {
    element: Rc<Element<ComparisonState>>,
}

impl HeadlessComparison {
    pub(crate) fn new(context: HeadlessContext) -> Self {
        let state = ComparisonState {
            height: DEFAULT_HEIGHT,
            primary: None,
            secondary: None,
            scale: ValueScale::default(),
            extent: None,
            title: None,
            primary_format: si(2),
            change_format: percent_change(0),
            colors: default_comparison_colors(),
            stroke_width: DEFAULT_STROKE_WIDTH,
        };
        Self {
            element: Element::new(context, state),
        }
    }

    #[must_use]
    pub fn id(&self) -> ElementId {
        self.element.id()
    }
}

impl ChartBinding<HeadlessBackend> for HeadlessComparison {
    fn apply(&self, surface: &Surface) -> CubismResult<()> {
        self.element.apply(surface)
    }

    fn remove(&self, surface: &Surface) -> CubismResult<()> {
        self.element.remove(surface)
    }
}

impl ComparisonBinding<HeadlessBackend> for HeadlessComparison {
    fn height(&self) -> u32 {
        self.element.state().height
    }

    fn set_height(&self, height: u32) {
        self.element.update(|state| state.height = height);
    }

    fn primary(&self) -> Option<HeadlessMetric> {
        self.element.state().primary.clone()
    }

    fn set_primary(&self, metric: Option<&HeadlessMetric>) {
        self.element.update(|state| state.primary = metric.cloned());
    }

    fn secondary(&self) -> Option<HeadlessMetric> {
        self.element.state().secondary.clone()
    }

    fn set_secondary(&self, metric: Option<&HeadlessMetric>) {
        self.element.update(|state| state.secondary = metric.cloned());
    }

    fn scale(&self) -> ValueScale {
        self.element.state().scale
    }

    fn set_scale(&self, scale: ValueScale) {
        self.element.update(|state| state.scale = scale);
    }

    fn extent(&self) -> Option<Extent> {
        self.element.state().extent
    }

    fn set_extent(&self, extent: Option<Extent>) {
        self.element.update(|state| state.extent = extent);
    }

    fn title(&self) -> Option<String> {
        self.element.state().title.clone()
    }

    fn set_title(&self, title: Option<&str>) {
        self.element
            .update(|state| state.title = title.map(str::to_owned));
    }

    fn primary_format(&self) -> ValueFormatter {
        Rc::clone(&self.element.state().primary_format)
    }

    fn set_primary_format(&self, format: ValueFormatter) {
        self.element.update(|state| state.primary_format = format);
    }

    fn change_format(&self) -> ValueFormatter {
        Rc::clone(&self.element.state().change_format)
    }

    fn set_change_format(&self, format: ValueFormatter) {
        self.element.update(|state| state.change_format = format);
    }

    fn colors(&self) -> Vec<Color> {
        self.element.state().colors.clone()
    }

    fn set_colors(&self, colors: &[Color]) {
        self.element.update(|state| state.colors = colors.to_vec());
    }

    fn stroke_width(&self) -> f64 {
        self.element.state().stroke_width
    }

    fn set_stroke_width(&self, width: f64) {
        self.element.update(|state| state.stroke_width = width);
    }
}
