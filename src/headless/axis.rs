use std::rc::Rc;

use crate::binding::{AxisBinding, ChartBinding, ContextBinding};
use crate::core::format::time_for_step;
use crate::core::types::millis_to_duration;
use crate::core::{Orientation, TickSize, TickSpec, TimeFormatter};
use crate::error::CubismResult;
use crate::event::EventType;

use super::element::{Element, ElementState, Subscription};
use super::surface::{ElementId, NodeContent, Surface};
use super::{HeadlessBackend, HeadlessContext};

const DEFAULT_TICK_PADDING: u32 = 3;

struct AxisState {
    orientation: Orientation,
    ticks: TickSpec,
    tick_subdivide: u32,
    tick_size: TickSize,
    tick_padding: u32,
    /// `None` picks a format from the context step.
    tick_format: Option<TimeFormatter>,
    focus_format: Option<TimeFormatter>,
}

fn step_format(context: &HeadlessContext) -> TimeFormatter {
    time_for_step(millis_to_duration(context.step_ms()))
}

impl AxisState {
    fn tick_format(&self, context: &HeadlessContext) -> TimeFormatter {
        self.tick_format
            .clone()
            .unwrap_or_else(|| step_format(context))
    }

    fn focus_format(&self, context: &HeadlessContext) -> TimeFormatter {
        self.focus_format
            .clone()
            .unwrap_or_else(|| self.tick_format(context))
    }
}

impl ElementState for AxisState {
    const CLASS: &'static str = "axis";

    fn render(&self, context: &HeadlessContext) -> NodeContent {
        let scale = context.scale().ok();
        let tick_format = self.tick_format(context);
        let range_labels = scale
            .and_then(|scale| scale.domain())
            .map(|(start, stop)| (tick_format(start), tick_format(stop)));
        let focus_label = scale
            .zip(context.focus_index())
            .and_then(|(scale, index)| scale.invert(index as f64))
            .map(|time| self.focus_format(context)(time));
        NodeContent::Axis {
            orientation: self.orientation,
            ticks: self.ticks.clone(),
            range_labels,
            focus_label,
        }
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::Context(EventType::change()),
            Subscription::Context(EventType::focus()),
        ]
    }
}

/// Time axis of the headless runtime.
#[derive(Clone)]
pub struct HeadlessAxis {
    element: Rc<Element<AxisState>>,
}

impl HeadlessAxis {
    pub(crate) fn new(context: HeadlessContext) -> Self {
        let state = AxisState {
            orientation: Orientation::default(),
            ticks: TickSpec::default(),
            tick_subdivide: 0,
            tick_size: TickSize::default(),
            tick_padding: DEFAULT_TICK_PADDING,
            tick_format: None,
            focus_format: None,
        };
        Self {
            element: Element::new(context, state),
        }
    }

    #[must_use]
    pub fn id(&self) -> ElementId {
        self.element.id()
    }

    fn context(&self) -> HeadlessContext {
        self.element.context().clone()
    }
}

impl ChartBinding<HeadlessBackend> for HeadlessAxis {
    fn apply(&self, surface: &Surface) -> CubismResult<()> {
        self.element.apply(surface)
    }

    fn remove(&self, surface: &Surface) -> CubismResult<()> {
        self.element.remove(surface)
    }
}

impl AxisBinding<HeadlessBackend> for HeadlessAxis {
    fn orientation(&self) -> Orientation {
        self.element.state().orientation
    }

    fn set_orientation(&self, orientation: Orientation) {
        self.element.update(|state| state.orientation = orientation);
    }

    fn ticks(&self) -> TickSpec {
        self.element.state().ticks.clone()
    }

    fn set_ticks(&self, ticks: &TickSpec) {
        self.element.update(|state| state.ticks = ticks.clone());
    }

    fn tick_subdivide(&self) -> u32 {
        self.element.state().tick_subdivide
    }

    fn set_tick_subdivide(&self, count: u32) {
        self.element.update(|state| state.tick_subdivide = count);
    }

    fn tick_size(&self) -> TickSize {
        self.element.state().tick_size
    }

    fn set_tick_size(&self, size: TickSize) {
        self.element.update(|state| state.tick_size = size);
    }

    fn tick_padding(&self) -> u32 {
        self.element.state().tick_padding
    }

    fn set_tick_padding(&self, padding: u32) {
        self.element.update(|state| state.tick_padding = padding);
    }

    fn tick_format(&self) -> TimeFormatter {
        self.element.state().tick_format(&self.context())
    }

    fn set_tick_format(&self, format: TimeFormatter) {
        self.element.update(|state| state.tick_format = Some(format));
    }

    fn focus_format(&self) -> TimeFormatter {
        self.element.state().focus_format(&self.context())
    }

    fn set_focus_format(&self, format: TimeFormatter) {
        self.element.update(|state| state.focus_format = Some(format));
    }
}
