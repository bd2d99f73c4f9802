//! Typed proxies for the chart elements a context creates.
//!
//! Configuration takes effect on the next `apply` or redraw; `apply` can be
//! called again to update an existing rendering in place.

use crate::binding::{
    AxisBinding, Backend, ChartBinding, ComparisonBinding, HorizonBinding, RuleBinding,
};
use crate::core::{
    Color, Extent, HorizonMode, Orientation, TickSize, TickSpec, TimeFormatter, ValueFormatter,
    ValueScale,
};
use crate::error::CubismResult;

use super::Metric;

macro_rules! chart_proxy {
    ($(#[$doc:meta])* $name:ident, $assoc:ident, $class:literal) => {
        $(#[$doc])*
        pub struct $name<B: Backend> {
            binding: B::$assoc,
        }

        impl<B: Backend> Clone for $name<B> {
            fn clone(&self) -> Self {
                Self {
                    binding: self.binding.clone(),
                }
            }
        }

        impl<B: Backend> $name<B> {
            #[must_use]
            pub fn from_binding(binding: B::$assoc) -> Self {
                Self { binding }
            }

            #[must_use]
            pub fn binding(&self) -> &B::$assoc {
                &self.binding
            }

            /// Renders into `surface`, or refreshes an earlier rendering there.
            pub fn apply(&self, surface: &B::Surface) -> CubismResult<()> {
                tracing::debug!(element = $class, "apply");
                self.binding.apply(surface)
            }

            /// Removes the rendering and its listeners from `surface`.
            pub fn remove(&self, surface: &B::Surface) -> CubismResult<()> {
                tracing::debug!(element = $class, "remove");
                self.binding.remove(surface)
            }
        }
    };
}

chart_proxy!(
    /// Time axis labelling the context window.
    Axis,
    Axis,
    "axis"
);
chart_proxy!(
    /// Vertical marks where a metric is non-zero, plus the focus line.
    Rule,
    Rule,
    "rule"
);
chart_proxy!(
    /// Horizon chart of a single metric.
    Horizon,
    Horizon,
    "horizon"
);
chart_proxy!(
    /// Primary metric plotted against a secondary one, with relative change.
    Comparison,
    Comparison,
    "comparison"
);

impl<B: Backend> Axis<B> {
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.binding.orientation()
    }

    pub fn set_orientation(&self, orientation: Orientation) {
        self.binding.set_orientation(orientation);
    }

    #[must_use]
    pub fn ticks(&self) -> TickSpec {
        self.binding.ticks()
    }

    pub fn set_ticks(&self, ticks: TickSpec) {
        self.binding.set_ticks(&ticks);
    }

    #[must_use]
    pub fn tick_subdivide(&self) -> u32 {
        self.binding.tick_subdivide()
    }

    pub fn set_tick_subdivide(&self, count: u32) {
        self.binding.set_tick_subdivide(count);
    }

    #[must_use]
    pub fn tick_size(&self) -> TickSize {
        self.binding.tick_size()
    }

    pub fn set_tick_size(&self, size: TickSize) {
        self.binding.set_tick_size(size);
    }

    #[must_use]
    pub fn tick_padding(&self) -> u32 {
        self.binding.tick_padding()
    }

    pub fn set_tick_padding(&self, padding: u32) {
        self.binding.set_tick_padding(padding);
    }

    #[must_use]
    pub fn tick_format(&self) -> TimeFormatter {
        self.binding.tick_format()
    }

    pub fn set_tick_format(&self, format: TimeFormatter) {
        self.binding.set_tick_format(format);
    }

    /// Format of the label shown at the focus position.
    #[must_use]
    pub fn focus_format(&self) -> TimeFormatter {
        self.binding.focus_format()
    }

    pub fn set_focus_format(&self, format: TimeFormatter) {
        self.binding.set_focus_format(format);
    }
}

impl<B: Backend> Rule<B> {
    #[must_use]
    pub fn metric(&self) -> Option<Metric<B>> {
        self.binding.metric().map(Metric::from_binding)
    }

    pub fn set_metric(&self, metric: &Metric<B>) {
        self.binding.set_metric(Some(metric.binding()));
    }

    pub fn clear_metric(&self) {
        self.binding.set_metric(None);
    }
}

impl<B: Backend> Horizon<B> {
    #[must_use]
    pub fn mode(&self) -> HorizonMode {
        self.binding.mode()
    }

    pub fn set_mode(&self, mode: HorizonMode) {
        self.binding.set_mode(mode);
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.binding.height()
    }

    pub fn set_height(&self, height: u32) {
        self.binding.set_height(height);
    }

    #[must_use]
    pub fn metric(&self) -> Option<Metric<B>> {
        self.binding.metric().map(Metric::from_binding)
    }

    pub fn set_metric(&self, metric: &Metric<B>) {
        self.binding.set_metric(Some(metric.binding()));
    }

    pub fn clear_metric(&self) {
        self.binding.set_metric(None);
    }

    #[must_use]
    pub fn scale(&self) -> ValueScale {
        self.binding.scale()
    }

    pub fn set_scale(&self, scale: ValueScale) {
        self.binding.set_scale(scale);
    }

    /// Fixed value domain; `None` derives it from the data.
    #[must_use]
    pub fn extent(&self) -> Option<Extent> {
        self.binding.extent()
    }

    pub fn set_extent(&self, extent: Option<Extent>) {
        self.binding.set_extent(extent);
    }

    /// Explicit title; `None` shows the metric name.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.binding.title()
    }

    pub fn set_title(&self, title: Option<&str>) {
        self.binding.set_title(title);
    }

    #[must_use]
    pub fn format(&self) -> ValueFormatter {
        self.binding.format()
    }

    pub fn set_format(&self, format: ValueFormatter) {
        self.binding.set_format(format);
    }

    /// Band colors, negative bands first.
    #[must_use]
    pub fn colors(&self) -> Vec<Color> {
        self.binding.colors()
    }

    pub fn set_colors(&self, colors: Vec<Color>) {
        self.binding.set_colors(&colors);
    }
}

impl<B: Backend> Comparison<B> {
    #[must_use]
    pub fn height(&self) -> u32 {
        self.binding.height()
    }

    pub fn set_height(&self, height: u32) {
        self.binding.set_height(height);
    }

    #[must_use]
    pub fn primary(&self) -> Option<Metric<B>> {
        self.binding.primary().map(Metric::from_binding)
    }

    pub fn set_primary(&self, metric: &Metric<B>) {
        self.binding.set_primary(Some(metric.binding()));
    }

    #[must_use]
    pub fn secondary(&self) -> Option<Metric<B>> {
        self.binding.secondary().map(Metric::from_binding)
    }

    pub fn set_secondary(&self, metric: &Metric<B>) {
        self.binding.set_secondary(Some(metric.binding()));
    }

    #[must_use]
    pub fn scale(&self) -> ValueScale {
        self.binding.scale()
    }

    pub fn set_scale(&self, scale: ValueScale) {
        self.binding.set_scale(scale);
    }

    #[must_use]
    pub fn extent(&self) -> Option<Extent> {
        self.binding.extent()
    }

    pub fn set_extent(&self, extent: Option<Extent>) {
        self.binding.set_extent(extent);
    }

    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.binding.title()
    }

    pub fn set_title(&self, title: Option<&str>) {
        self.binding.set_title(title);
    }

    #[must_use]
    pub fn primary_format(&self) -> ValueFormatter {
        self.binding.primary_format()
    }

    pub fn set_primary_format(&self, format: ValueFormatter) {
        self.binding.set_primary_format(format);
    }

    /// Format of the relative change between primary and secondary.
    #[must_use]
    pub fn change_format(&self) -> ValueFormatter {
        self.binding.change_format()
    }

    pub fn set_change_format(&self, format: ValueFormatter) {
        self.binding.set_change_format(format);
    }

    #[must_use]
    pub fn colors(&self) -> Vec<Color> {
        self.binding.colors()
    }

    pub fn set_colors(&self, colors: Vec<Color>) {
        self.binding.set_colors(&colors);
    }

    #[must_use]
    pub fn stroke_width(&self) -> f64 {
        self.binding.stroke_width()
    }

    pub fn set_stroke_width(&self, width: f64) {
        self.binding.set_stroke_width(width);
    }
}
