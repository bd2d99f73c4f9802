use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;

use crate::binding::{
    AxisBinding, ChartBinding, ComparisonBinding, ContextBinding, HorizonBinding, RuleBinding,
};
use crate::core::color::{default_comparison_colors, default_horizon_colors};
use crate::core::format::{percent_change, si, time_for_step};
use crate::core::types::{millis_to_datetime, millis_to_duration};
use crate::core::{
    Color, Extent, HorizonMode, Orientation, ScaleKind, TickSize, TickSpec, TimeFormatter,
    ValueFormatter, ValueScale,
};
use crate::error::CubismResult;

use super::js;
use super::metric::BrowserMetric;
use super::{BrowserBackend, BrowserContext, Selection};

/// A chart component: a function applied to selections, with chained accessors.
#[derive(Clone)]
struct Component {
    context: BrowserContext,
    handle: JsValue,
}

impl Component {
    fn apply(&self, surface: &Selection) -> CubismResult<()> {
        js::call(surface.handle(), "call", &[self.handle.clone()]).map(|_| ())
    }

    fn remove(&self, surface: &Selection) -> CubismResult<()> {
        js::call(&self.handle, "remove", &[surface.handle().clone()]).map(|_| ())
    }

    fn read(&self, name: &str) -> JsValue {
        js::call_or_log(&self.handle, name, &[])
    }

    fn write(&self, name: &str, value: JsValue) {
        js::call_or_log(&self.handle, name, &[value]);
    }

    fn read_u32(&self, name: &str) -> u32 {
        let value = js::number(&self.read(name));
        if value.is_finite() && value >= 0.0 { value as u32 } else { 0 }
    }

    fn read_metric(&self, name: &str) -> Option<BrowserMetric> {
        let value = self.read(name);
        // Unset accessors hold a datum function rather than a metric object.
        let is_metric = js::get(&value, "valueAt").is_ok_and(|method| !js::is_absent(&method));
        is_metric.then(|| BrowserMetric::new(self.context.clone(), value))
    }

    fn write_metric(&self, name: &str, metric: Option<&BrowserMetric>) {
        self.write(name, metric.map_or(JsValue::NULL, |metric| metric.handle().clone()));
    }

    fn read_extent(&self) -> Option<Extent> {
        js::pair(&self.read("extent")).and_then(Extent::from_raw)
    }

    fn write_extent(&self, extent: Option<Extent>) {
        let value = extent.map_or(JsValue::NULL, |extent| {
            js::array_of([JsValue::from_f64(extent.min), JsValue::from_f64(extent.max)])
        });
        self.write("extent", value);
    }

    fn read_title(&self) -> Option<String> {
        self.read("title").as_string()
    }

    fn write_title(&self, title: Option<&str>) {
        self.write("title", title.map_or(JsValue::NULL, JsValue::from_str));
    }

    fn read_colors(&self) -> Vec<Color> {
        js::strings(&self.read("colors"))
            .iter()
            .filter_map(|hex| Color::from_hex(hex).ok())
            .collect()
    }

    fn write_colors(&self, colors: &[Color]) {
        let colors = colors.iter().map(|color| JsValue::from_str(&color.to_hex()));
        self.write("colors", js::array_of(colors));
    }

    fn write_scale(&self, scale: ValueScale) {
        match value_scale(self.context.backend(), scale) {
            Ok(handle) => self.write("scale", handle),
            Err(error) => tracing::warn!(%error, "failed to build value scale"),
        }
    }
}

/// Builds the d3 scale described by `scale`.
fn value_scale(backend: &BrowserBackend, scale: ValueScale) -> CubismResult<JsValue> {
    let factory = js::get(backend.d3(), "scale")?;
    let handle = match scale.kind() {
        ScaleKind::Linear => js::call(&factory, "linear", &[])?,
        ScaleKind::Sqrt => js::call(&factory, "sqrt", &[])?,
        ScaleKind::Pow { exponent } => {
            let handle = js::call(&factory, "pow", &[])?;
            js::call(&handle, "exponent", &[JsValue::from_f64(exponent)])?;
            handle
        }
        ScaleKind::Log => js::call(&factory, "log", &[])?,
    };
    let (d0, d1) = scale.domain();
    let (r0, r1) = scale.range();
    js::call(
        &handle,
        "domain",
        &[js::array_of([JsValue::from_f64(d0), JsValue::from_f64(d1)])],
    )?;
    js::call(
        &handle,
        "range",
        &[js::array_of([JsValue::from_f64(r0), JsValue::from_f64(r1)])],
    )?;
    if scale.is_rounded() {
        js::call(&handle, "interpolate", &[js::get(backend.d3(), "interpolateRound")?])?;
    }
    Ok(handle)
}

fn value_format_function(format: ValueFormatter) -> JsValue {
    let function = move |value: JsValue| JsValue::from_str(&format(js::number(&value)));
    Closure::wrap(Box::new(function) as Box<dyn Fn(JsValue) -> JsValue>).into_js_value()
}

fn time_format_function(format: TimeFormatter) -> JsValue {
    let function = move |value: JsValue| {
        millis_to_datetime(js::number(&value))
            .map_or(JsValue::from_str(""), |time| JsValue::from_str(&format(time)))
    };
    Closure::wrap(Box::new(function) as Box<dyn Fn(JsValue) -> JsValue>).into_js_value()
}

macro_rules! chart_lifecycle {
    ($name:ident) => {
        impl ChartBinding<BrowserBackend> for $name {
            fn apply(&self, surface: &Selection) -> CubismResult<()> {
                self.component.apply(surface)
            }

            fn remove(&self, surface: &Selection) -> CubismResult<()> {
                self.component.remove(surface)
            }
        }
    };
}

/// Settings the runtime cannot report back in typed form.
struct AxisMirror {
    ticks: TickSpec,
    tick_size: TickSize,
    tick_format: Option<TimeFormatter>,
    focus_format: Option<TimeFormatter>,
}

/// A `context.axis()` component.
#[derive(Clone)]
pub struct BrowserAxis {
    component: Component,
    mirror: Rc<RefCell<AxisMirror>>,
}

impl BrowserAxis {
    pub(crate) fn new(context: BrowserContext, handle: JsValue) -> Self {
        Self {
            component: Component { context, handle },
            mirror: Rc::new(RefCell::new(AxisMirror {
                ticks: TickSpec::default(),
                tick_size: TickSize::default(),
                tick_format: None,
                focus_format: None,
            })),
        }
    }

    fn step_format(&self) -> TimeFormatter {
        time_for_step(millis_to_duration(self.component.context.step_ms()))
    }
}

chart_lifecycle!(BrowserAxis);

impl AxisBinding<BrowserBackend> for BrowserAxis {
    fn orientation(&self) -> Orientation {
        self.component
            .read("orient")
            .as_string()
            .and_then(|orient| orient.parse().ok())
            .unwrap_or_default()
    }

    fn set_orientation(&self, orientation: Orientation) {
        self.component
            .write("orient", JsValue::from_str(orientation.as_str()));
    }

    fn ticks(&self) -> TickSpec {
        self.mirror.borrow().ticks.clone()
    }

    fn set_ticks(&self, ticks: &TickSpec) {
        let handle = &self.component.handle;
        match ticks {
            TickSpec::Count { count } => {
                js::call_or_log(handle, "ticks", &[JsValue::from(*count)]);
            }
            TickSpec::Interval { unit, every } => {
                let range = js::get(self.component.context.backend().d3(), "time")
                    .and_then(|time| js::get(&time, unit.range_function()));
                match range {
                    Ok(range) => {
                        js::call_or_log(handle, "ticks", &[range, JsValue::from(*every)]);
                    }
                    Err(error) => tracing::warn!(%error, "time interval unavailable"),
                }
            }
            TickSpec::Values { values } => {
                let dates = values
                    .iter()
                    .map(|time| js::date(time.timestamp_millis() as f64));
                js::call_or_log(handle, "tickValues", &[js::array_of(dates)]);
            }
        }
        self.mirror.borrow_mut().ticks = ticks.clone();
    }

    fn tick_subdivide(&self) -> u32 {
        self.component.read_u32("tickSubdivide")
    }

    fn set_tick_subdivide(&self, count: u32) {
        self.component.write("tickSubdivide", JsValue::from(count));
    }

    fn tick_size(&self) -> TickSize {
        self.mirror.borrow().tick_size
    }

    fn set_tick_size(&self, size: TickSize) {
        js::call_or_log(
            &self.component.handle,
            "tickSize",
            &[
                JsValue::from(size.major),
                JsValue::from(size.minor),
                JsValue::from(size.end),
            ],
        );
        self.mirror.borrow_mut().tick_size = size;
    }

    fn tick_padding(&self) -> u32 {
        self.component.read_u32("tickPadding")
    }

    fn set_tick_padding(&self, padding: u32) {
        self.component.write("tickPadding", JsValue::from(padding));
    }

    fn tick_format(&self) -> TimeFormatter {
        let format = self.mirror.borrow().tick_format.clone();
        format.unwrap_or_else(|| self.step_format())
    }

    fn set_tick_format(&self, format: TimeFormatter) {
        self.component
            .write("tickFormat", time_format_function(Rc::clone(&format)));
        self.mirror.borrow_mut().tick_format = Some(format);
    }

    fn focus_format(&self) -> TimeFormatter {
        let format = self.mirror.borrow().focus_format.clone();
        format.unwrap_or_else(|| self.tick_format())
    }

    fn set_focus_format(&self, format: TimeFormatter) {
        self.component
            .write("focusFormat", time_format_function(Rc::clone(&format)));
        self.mirror.borrow_mut().focus_format = Some(format);
    }
}

/// A `context.rule()` component.
#[derive(Clone)]
pub struct BrowserRule {
    component: Component,
}

impl BrowserRule {
    pub(crate) fn new(context: BrowserContext, handle: JsValue) -> Self {
        Self {
            component: Component { context, handle },
        }
    }
}

chart_lifecycle!(BrowserRule);

impl RuleBinding<BrowserBackend> for BrowserRule {
    fn metric(&self) -> Option<BrowserMetric> {
        self.component.read_metric("metric")
    }

    fn set_metric(&self, metric: Option<&BrowserMetric>) {
        self.component.write_metric("metric", metric);
    }
}

struct ValueMirror {
    scale: ValueScale,
    formats: [ValueFormatter; 2],
}

/// A `context.horizon()` component.
#[derive(Clone)]
pub struct BrowserHorizon {
    component: Component,
    mirror: Rc<RefCell<ValueMirror>>,
}

impl BrowserHorizon {
    pub(crate) fn new(context: BrowserContext, handle: JsValue) -> Self {
        Self {
            component: Component { context, handle },
            mirror: Rc::new(RefCell::new(ValueMirror {
                scale: ValueScale::default(),
                formats: [si(2), si(2)],
            })),
        }
    }
}

chart_lifecycle!(BrowserHorizon);

impl HorizonBinding<BrowserBackend> for BrowserHorizon {
    fn mode(&self) -> HorizonMode {
        self.component
            .read("mode")
            .as_string()
            .and_then(|mode| mode.parse().ok())
            .unwrap_or_default()
    }

    fn set_mode(&self, mode: HorizonMode) {
        self.component.write("mode", JsValue::from_str(mode.as_str()));
    }

    fn height(&self) -> u32 {
        self.component.read_u32("height")
    }

    fn set_height(&self, height: u32) {
        self.component.write("height", JsValue::from(height));
    }

    fn metric(&self) -> Option<BrowserMetric> {
        self.component.read_metric("metric")
    }

    fn set_metric(&self, metric: Option<&BrowserMetric>) {
        self.component.write_metric("metric", metric);
    }

    fn scale(&self) -> ValueScale {
        self.mirror.borrow().scale
    }

    fn set_scale(&self, scale: ValueScale) {
        self.component.write_scale(scale);
        self.mirror.borrow_mut().scale = scale;
    }

    fn extent(&self) -> Option<Extent> {
        self.component.read_extent()
    }

    fn set_extent(&self, extent: Option<Extent>) {
        self.component.write_extent(extent);
    }

    fn title(&self) -> Option<String> {
        self.component.read_title()
    }

    fn set_title(&self, title: Option<&str>) {
        self.component.write_title(title);
    }

    fn format(&self) -> ValueFormatter {
        Rc::clone(&self.mirror.borrow().formats[0])
    }

    fn set_format(&self, format: ValueFormatter) {
        self.component
            .write("format", value_format_function(Rc::clone(&format)));
        self.mirror.borrow_mut().formats[0] = format;
    }

    fn colors(&self) -> Vec<Color> {
        let colors = self.component.read_colors();
        if colors.is_empty() {
            default_horizon_colors()
        } else {
            colors
        }
    }

    fn set_colors(&self, colors: &[Color]) {
        self.component.write_colors(colors);
    }
}

/// A `context.comparison()` component.
#[derive(Clone)]
pub struct BrowserComparison {
    component: Component,
    mirror: Rc<RefCell<ValueMirror>>,
}

impl BrowserComparison {
    pub(crate) fn new(context: BrowserContext, handle: JsValue) -> Self {
        Self {
            component: Component { context, handle },
            mirror: Rc::new(RefCell::new(ValueMirror {
                scale: ValueScale::default(),
                formats: [si(2), percent_change(0)],
            })),
        }
    }
}

chart_lifecycle!(BrowserComparison);

impl ComparisonBinding<BrowserBackend> for BrowserComparison {
    fn height(&self) -> u32 {
        self.component.read_u32("height")
    }

    fn set_height(&self, height: u32) {
        self.component.write("height", JsValue::from(height));
    }

    fn primary(&self) -> Option<BrowserMetric> {
        self.component.read_metric("primary")
    }

    fn set_primary(&self, metric: Option<&BrowserMetric>) {
        self.component.write_metric("primary", metric);
    }

    fn secondary(&self) -> Option<BrowserMetric> {
        self.component.read_metric("secondary")
    }

    fn set_secondary(&self, metric: Option<&BrowserMetric>) {
        self.component.write_metric("secondary", metric);
    }

    fn scale(&self) -> ValueScale {
        self.mirror.borrow().scale
    }

    fn set_scale(&self, scale: ValueScale) {
        self.component.write_scale(scale);
        self.mirror.borrow_mut().scale = scale;
    }

    fn extent(&self) -> Option<Extent> {
        self.component.read_extent()
    }

    fn set_extent(&self, extent: Option<Extent>) {
        self.component.write_extent(extent);
    }

    fn title(&self) -> Option<String> {
        self.component.read_title()
    }

    fn set_title(&self, title: Option<&str>) {
        self.component.write_title(title);
    }

    fn primary_format(&self) -> ValueFormatter {
        Rc::clone(&self.mirror.borrow().formats[0])
    }

    fn set_primary_format(&self, format: ValueFormatter) {
        self.component
            .write("formatPrimary", value_format_function(Rc::clone(&format)));
        self.mirror.borrow_mut().formats[0] = format;
    }

    fn change_format(&self) -> ValueFormatter {
        Rc::clone(&self.mirror.borrow().formats[1])
    }

    fn set_change_format(&self, format: ValueFormatter) {
        self.component
            .write("formatChange", value_format_function(Rc::clone(&format)));
        self.mirror.borrow_mut().formats[1] = format;
    }

    fn colors(&self) -> Vec<Color> {
        let colors = self.component.read_colors();
        if colors.is_empty() {
            default_comparison_colors()
        } else {
            colors
        }
    }

    fn set_colors(&self, colors: &[Color]) {
        self.component.write_colors(colors);
    }

    fn stroke_width(&self) -> f64 {
        js::number(&self.component.read("strokeWidth"))
    }

    fn set_stroke_width(&self, width: f64) {
        self.component.write("strokeWidth", JsValue::from_f64(width));
    }
}
