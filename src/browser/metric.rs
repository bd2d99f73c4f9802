use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;

use crate::binding::{CubeBinding, FindCallback, GraphiteBinding, LibratoBinding, MetricBinding};
use crate::core::Summarize;
use crate::error::{CubismError, CubismResult};
use crate::event::{EventKind, EventType, RawListener};

use super::js;
use super::{BrowserBackend, BrowserContext};

/// A metric object of the wrapped runtime.
#[derive(Clone)]
pub struct BrowserMetric {
    context: BrowserContext,
    handle: JsValue,
}

impl BrowserMetric {
    pub(crate) fn new(context: BrowserContext, handle: JsValue) -> Self {
        Self { context, handle }
    }

    #[must_use]
    pub fn handle(&self) -> &JsValue {
        &self.handle
    }

    fn combine(&self, operator: &str, other: &BrowserMetric) -> CubismResult<BrowserMetric> {
        let same = js_sys::Object::is(self.context.handle(), other.context.handle());
        if !same {
            return Err(CubismError::ContextMismatch);
        }
        js::call(&self.handle, operator, &[other.handle.clone()])
            .map(|handle| BrowserMetric::new(self.context.clone(), handle))
    }
}

impl MetricBinding<BrowserBackend> for BrowserMetric {
    fn add(&self, other: &BrowserMetric) -> CubismResult<BrowserMetric> {
        self.combine("add", other)
    }

    fn subtract(&self, other: &BrowserMetric) -> CubismResult<BrowserMetric> {
        self.combine("subtract", other)
    }

    fn multiply(&self, other: &BrowserMetric) -> CubismResult<BrowserMetric> {
        self.combine("multiply", other)
    }

    fn divide(&self, other: &BrowserMetric) -> CubismResult<BrowserMetric> {
        self.combine("divide", other)
    }

    fn shift(&self, offset_ms: f64) -> BrowserMetric {
        let handle = js::call_or_log(&self.handle, "shift", &[JsValue::from_f64(offset_ms)]);
        BrowserMetric::new(self.context.clone(), handle)
    }

    fn value_at(&self, index: usize) -> f64 {
        js::number(&js::call_or_log(
            &self.handle,
            "valueAt",
            &[JsValue::from_f64(index as f64)],
        ))
    }

    fn extent(&self) -> (f64, f64) {
        js::pair(&js::call_or_log(&self.handle, "extent", &[]))
            .unwrap_or((f64::INFINITY, f64::NEG_INFINITY))
    }

    fn on(&self, event: &EventType, listener: Option<RawListener>) {
        let function = listener.map_or(JsValue::NULL, |listener| {
            js::listener_function(EventKind::Change, listener)
        });
        js::call_or_log(&self.handle, "on", &[JsValue::from_str(&event.to_string()), function]);
    }

    fn has_listener(&self, event: &EventType) -> bool {
        let listener = js::call_or_log(&self.handle, "on", &[JsValue::from_str(&event.to_string())]);
        !js::is_absent(&listener)
    }

    fn context(&self) -> BrowserContext {
        self.context.clone()
    }

    fn name(&self) -> String {
        js::call_or_log(&self.handle, "toString", &[])
            .as_string()
            .unwrap_or_default()
    }
}

/// A `context.graphite(host)` source.
#[derive(Clone)]
pub struct BrowserGraphite {
    context: BrowserContext,
    handle: JsValue,
}

impl BrowserGraphite {
    pub(crate) fn new(context: BrowserContext, handle: JsValue) -> Self {
        Self { context, handle }
    }
}

impl GraphiteBinding<BrowserBackend> for BrowserGraphite {
    fn metric(&self, expression: &str, summarize: Summarize) -> BrowserMetric {
        let metric = js::call_or_log(&self.handle, "metric", &[JsValue::from_str(expression)]);
        // `summarize` sets the function in place and returns the metric.
        js::call_or_log(&metric, "summarize", &[JsValue::from_str(summarize.as_str())]);
        BrowserMetric::new(self.context.clone(), metric)
    }

    fn find(&self, pattern: &str, callback: FindCallback) {
        let mut callback = Some(callback);
        let done = move |error: JsValue, results: JsValue| {
            let Some(callback) = callback.take() else {
                return;
            };
            if js::is_absent(&error) {
                callback(Ok(js::strings(&results)));
            } else {
                callback(Err(js::foreign(error)));
            }
        };
        let done = Closure::wrap(Box::new(done) as Box<dyn FnMut(JsValue, JsValue)>);
        if let Err(error) = js::call(
            &self.handle,
            "find",
            &[JsValue::from_str(pattern), done.into_js_value()],
        ) {
            tracing::warn!(%error, pattern, "graphite find failed");
        }
    }

    fn host(&self) -> String {
        js::call_or_log(&self.handle, "toString", &[])
            .as_string()
            .unwrap_or_default()
    }
}

/// A `context.cube(host)` source.
#[derive(Clone)]
pub struct BrowserCube {
    context: BrowserContext,
    handle: JsValue,
}

impl BrowserCube {
    pub(crate) fn new(context: BrowserContext, handle: JsValue) -> Self {
        Self { context, handle }
    }
}

impl CubeBinding<BrowserBackend> for BrowserCube {
    fn metric(&self, expression: &str) -> BrowserMetric {
        let handle = js::call_or_log(&self.handle, "metric", &[JsValue::from_str(expression)]);
        BrowserMetric::new(self.context.clone(), handle)
    }

    fn host(&self) -> String {
        js::call_or_log(&self.handle, "toString", &[])
            .as_string()
            .unwrap_or_default()
    }
}

/// A `context.librato(user, token)` source.
#[derive(Clone)]
pub struct BrowserLibrato {
    context: BrowserContext,
    handle: JsValue,
}

impl BrowserLibrato {
    pub(crate) fn new(context: BrowserContext, handle: JsValue) -> Self {
        Self { context, handle }
    }
}

impl LibratoBinding<BrowserBackend> for BrowserLibrato {
    fn metric(&self, name: &str, source: &str) -> BrowserMetric {
        let handle = js::call_or_log(
            &self.handle,
            "metric",
            &[JsValue::from_str(name), JsValue::from_str(source)],
        );
        BrowserMetric::new(self.context.clone(), handle)
    }
}
