//! Backend contract: one trait per wrapped entity.
//!
//! A backend supplies a handle type for every object of the wrapped
//! visualization runtime. Handles are cheap to clone (they alias the same
//! foreign object) and speak the runtime's own units: milliseconds as `f64`
//! and positional listener arguments. The typed proxies in [`crate::api`]
//! sit on top of these traits and are the surface applications use.

mod completion;

use crate::core::{
    Color, Extent, HorizonMode, Orientation, Summarize, TickSize, TickSpec, TimeFormatter,
    TimeScale, ValueFormatter, ValueScale,
};
use crate::error::CubismResult;
use crate::event::{EventType, RawListener};

pub use completion::{Completion, FindCallback, RawRequest, RequestWindow};

/// A concrete implementation of the wrapped runtime.
pub trait Backend: Clone + 'static {
    /// Rendering target chart elements are applied to.
    type Surface;
    type Context: ContextBinding<Self>;
    type Metric: MetricBinding<Self>;
    type Graphite: GraphiteBinding<Self>;
    type Cube: CubeBinding<Self>;
    type Librato: LibratoBinding<Self>;
    type Axis: AxisBinding<Self>;
    type Rule: RuleBinding<Self>;
    type Horizon: HorizonBinding<Self>;
    type Comparison: ComparisonBinding<Self>;

    /// Version string reported by the runtime.
    fn version(&self) -> String;

    /// Constructs a fresh context object.
    fn context(&self) -> CubismResult<Self::Context>;
}

pub trait ContextBinding<B: Backend>: Clone + 'static {
    fn step_ms(&self) -> f64;
    fn set_step_ms(&self, step_ms: f64);
    fn size(&self) -> usize;
    fn set_size(&self, size: usize);
    fn server_delay_ms(&self) -> f64;
    fn set_server_delay_ms(&self, delay_ms: f64);
    fn client_delay_ms(&self) -> f64;
    fn set_client_delay_ms(&self, delay_ms: f64);

    fn graphite(&self, host: &str) -> B::Graphite;
    fn cube(&self, host: &str) -> B::Cube;
    fn librato(&self, user: &str, token: &str) -> B::Librato;
    fn constant(&self, value: f64) -> B::Metric;
    /// Defines a metric backed by `request`; `name` becomes its string form.
    fn metric(&self, request: RawRequest, name: Option<&str>) -> B::Metric;

    fn axis(&self) -> B::Axis;
    fn rule(&self) -> B::Rule;
    fn horizon(&self) -> B::Horizon;
    fn comparison(&self) -> B::Comparison;

    fn scale(&self) -> CubismResult<TimeScale>;
    fn start(&self);
    fn stop(&self);

    /// Registers (`Some`) or removes (`None`) the listener for `event`.
    fn on(&self, event: &EventType, listener: Option<RawListener>);
    fn has_listener(&self, event: &EventType) -> bool;

    /// Moves the shared focus cursor; `None` clears it.
    fn focus(&self, index: Option<usize>);
    fn focus_index(&self) -> Option<usize>;
}

pub trait MetricBinding<B: Backend>: Clone + 'static {
    fn add(&self, other: &B::Metric) -> CubismResult<B::Metric>;
    fn subtract(&self, other: &B::Metric) -> CubismResult<B::Metric>;
    fn multiply(&self, other: &B::Metric) -> CubismResult<B::Metric>;
    fn divide(&self, other: &B::Metric) -> CubismResult<B::Metric>;
    /// Shifts the requested window by `offset_ms`.
    fn shift(&self, offset_ms: f64) -> B::Metric;
    /// Sample at `index`; NaN when the runtime has no value there.
    fn value_at(&self, index: usize) -> f64;
    /// `[min, max]` over the window; `[Infinity, -Infinity]` when empty.
    fn extent(&self) -> (f64, f64);
    /// Only `change` events are meaningful for metrics.
    fn on(&self, event: &EventType, listener: Option<RawListener>);
    fn has_listener(&self, event: &EventType) -> bool;
    fn context(&self) -> B::Context;
    fn name(&self) -> String;
}

pub trait GraphiteBinding<B: Backend>: Clone + 'static {
    fn metric(&self, expression: &str, summarize: Summarize) -> B::Metric;
    fn find(&self, pattern: &str, callback: FindCallback);
    fn host(&self) -> String;
}

pub trait CubeBinding<B: Backend>: Clone + 'static {
    fn metric(&self, expression: &str) -> B::Metric;
    fn host(&self) -> String;
}

pub trait LibratoBinding<B: Backend>: Clone + 'static {
    fn metric(&self, name: &str, source: &str) -> B::Metric;
}

/// Rendering lifecycle shared by every chart element.
pub trait ChartBinding<B: Backend>: Clone + 'static {
    /// Renders into `surface`, updating an existing rendering in place.
    fn apply(&self, surface: &B::Surface) -> CubismResult<()>;
    /// Removes this element's artifacts and listeners from `surface`.
    fn remove(&self, surface: &B::Surface) -> CubismResult<()>;
}

pub trait AxisBinding<B: Backend>: ChartBinding<B> {
    fn orientation(&self) -> Orientation;
    fn set_orientation(&self, orientation: Orientation);
    fn ticks(&self) -> TickSpec;
    fn set_ticks(&self, ticks: &TickSpec);
    fn tick_subdivide(&self) -> u32;
    fn set_tick_subdivide(&self, count: u32);
    fn tick_size(&self) -> TickSize;
    fn set_tick_size(&self, size: TickSize);
    fn tick_padding(&self) -> u32;
    fn set_tick_padding(&self, padding: u32);
    fn tick_format(&self) -> TimeFormatter;
    fn set_tick_format(&self, format: TimeFormatter);
    fn focus_format(&self) -> TimeFormatter;
    fn set_focus_format(&self, format: TimeFormatter);
}

pub trait RuleBinding<B: Backend>: ChartBinding<B> {
    fn metric(&self) -> Option<B::Metric>;
    fn set_metric(&self, metric: Option<&B::Metric>);
}

pub trait HorizonBinding<B: Backend>: ChartBinding<B> {
    fn mode(&self) -> HorizonMode;
    fn set_mode(&self, mode: HorizonMode);
    fn height(&self) -> u32;
    fn set_height(&self, height: u32);
    fn metric(&self) -> Option<B::Metric>;
    fn set_metric(&self, metric: Option<&B::Metric>);
    fn scale(&self) -> ValueScale;
    fn set_scale(&self, scale: ValueScale);
    fn extent(&self) -> Option<Extent>;
    fn set_extent(&self, extent: Option<Extent>);
    fn title(&self) -> Option<String>;
    fn set_title(&self, title: Option<&str>);
    fn format(&self) -> ValueFormatter;
    fn set_format(&self, format: ValueFormatter);
    fn colors(&self) -> Vec<Color>;
    fn set_colors(&self, colors: &[Color]);
}

pub trait ComparisonBinding<B: Backend>: ChartBinding<B> {
    fn height(&self) -> u32;
    fn set_height(&self, height: u32);
    fn primary(&self) -> Option<B::Metric>;
    fn set_primary(&self, metric: Option<&B::Metric>);
    fn secondary(&self) -> Option<B::Metric>;
    fn set_secondary(&self, metric: Option<&B::Metric>);
    fn scale(&self) -> ValueScale;
    fn set_scale(&self, scale: ValueScale);
    fn extent(&self) -> Option<Extent>;
    fn set_extent(&self, extent: Option<Extent>);
    fn title(&self) -> Option<String>;
    fn set_title(&self, title: Option<&str>);
    fn primary_format(&self) -> ValueFormatter;
    fn set_primary_format(&self, format: ValueFormatter);
    fn change_format(&self) -> ValueFormatter;
    fn set_change_format(&self, format: ValueFormatter);
    fn colors(&self) -> Vec<Color>;
    fn set_colors(&self, colors: &[Color]);
    fn stroke_width(&self) -> f64;
    fn set_stroke_width(&self, width: f64);
}
