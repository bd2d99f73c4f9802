use std::rc::Rc;

use crate::binding::{ChartBinding, HorizonBinding, MetricBinding};
use crate::core::color::default_horizon_colors;
use crate::core::format::si;
use crate::core::{Color, Extent, HorizonMode, ValueFormatter, ValueScale};
use crate::error::CubismResult;
use crate::event::EventType;

use super::element::{Element, ElementState, Subscription, displayed_value};
use super::surface::{ElementId, NodeContent, Surface};
use super::{HeadlessBackend, HeadlessContext, HeadlessMetric};

const DEFAULT_HEIGHT: u32 = 30;

struct HorizonState {
    mode: HorizonMode,
    height: u32,
    metric: Option<HeadlessMetric>,
    scale: ValueScale,
    extent: Option<Extent>,
    title: Option<String>,
    format: ValueFormatter,
    colors: Vec<Color>,
}

impl ElementState for HorizonState {
    const CLASS: &'static str = "horizon";

    fn render(&self, context: &HeadlessContext) -> NodeContent {
        let title = self
            .title
            .clone()
            .or_else(|| self.metric.as_ref().map(HeadlessMetric::name));
        let value_label = self
            .metric
            .as_ref()
            .and_then(|metric| displayed_value(context, metric))
            .map(|value| (self.format)(value));
        NodeContent::Horizon {
            title,
            value_label,
            mode: self.mode,
            height: self.height,
            bands: self.colors.len() / 2,
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

/// Horizon chart of the headless runtime.
#[derive(Clone)]
pub struct HeadlessHorizon {
    element: Rc<Element<HorizonState>>,
}

impl HeadlessHorizon {
    pub(crate) fn new(context: HeadlessContext) -> Self {
        let state = HorizonState {
            mode: HorizonMode::default(),
            height: DEFAULT_HEIGHT,
            metric: None,
            scale: ValueScale::default(),
            extent: None,
            title: None,
            format: si(2),
            colors: default_horizon_colors(),
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

impl ChartBinding<HeadlessBackend> for HeadlessHorizon {
    fn apply(&self, surface: &Surface) -> CubismResult<()> {
        self.element.apply(surface)
    }

    fn remove(&self, surface: &Surface) -> CubismResult<()> {
        self.element.remove(surface)
    }
}

impl HorizonBinding<HeadlessBackend> for HeadlessHorizon {
    fn mode(&self) -> HorizonMode {
        self.element.state().mode
    }

    fn set_mode(&self, mode: HorizonMode) {
        self.element.update(|state| state.mode = mode);
    }

    fn height(&self) -> u32 {
        self.element.state().height
    }

    fn set_height(&self, height: u32) {
        self.element.update(|state| state.height = height);
    }

    fn metric(&self) -> Option<HeadlessMetric> {
        self.element.state().metric.clone()
    }

    fn set_metric(&self, metric: Option<&HeadlessMetric>) {
        self.element.update(|state| state.metric = metric.cloned());
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

    fn format(&self) -> ValueFormatter {
        Rc::clone(&self.element.state().format)
    }

    fn set_format(&self, format: ValueFormatter) {
        self.element.update(|state| state.format = format);
    }

    fn colors(&self) -> Vec<Color> {
        self.element.state().colors.clone()
    }

    fn set_colors(&self, colors: &[Color]) {
        self.element.update(|state| state.colors = colors.to_vec());
    }
}
