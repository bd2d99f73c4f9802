use std::cell::Cell;
use std::rc::Rc;

use js_sys::Function;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use crate::binding::{Completion, ContextBinding, RawRequest, RequestWindow};
use crate::core::TimeScale;
use crate::error::{CubismError, CubismResult};
use crate::event::{self, ContextEvent, EventKind, EventType, RawListener};

use super::charts::{BrowserAxis, BrowserComparison, BrowserHorizon, BrowserRule};
use super::js;
use super::metric::{BrowserCube, BrowserGraphite, BrowserLibrato, BrowserMetric};
use super::BrowserBackend;

/// Namespace of the listener that mirrors the focus position.
const FOCUS_MIRROR: &str = "cubism-rs-focus";

/// A `cubism.context()` object.
#[derive(Clone)]
pub struct BrowserContext {
    backend: BrowserBackend,
    handle: JsValue,
    focus: Rc<Cell<Option<usize>>>,
}

impl BrowserContext {
    pub(crate) fn new(backend: BrowserBackend, handle: JsValue) -> Self {
        let context = Self {
            backend,
            handle,
            focus: Rc::new(Cell::new(None)),
        };
        let focus = Rc::clone(&context.focus);
        let mirror: RawListener = Rc::new(move |raw| {
            if let Some(ContextEvent::Focus(index)) = event::translate(EventKind::Focus, raw) {
                focus.set(index);
            }
        });
        context.on(
            &EventType::namespaced(EventKind::Focus, FOCUS_MIRROR),
            Some(mirror),
        );
        context
    }

    #[must_use]
    pub fn handle(&self) -> &JsValue {
        &self.handle
    }

    pub(crate) fn backend(&self) -> &BrowserBackend {
        &self.backend
    }

    fn number(&self, name: &str) -> f64 {
        js::number(&js::call_or_log(&self.handle, name, &[]))
    }

    fn set_number(&self, name: &str, value: f64) {
        js::call_or_log(&self.handle, name, &[JsValue::from_f64(value)]);
    }
}

/// Wraps a request in the runtime's `(start, stop, step, callback)` convention.
fn request_function(request: RawRequest) -> JsValue {
    let function = move |start: JsValue, stop: JsValue, step: JsValue, callback: JsValue| {
        let Ok(callback) = callback.dyn_into::<Function>() else {
            tracing::warn!("metric request invoked without a callback");
            return;
        };
        let window = RequestWindow {
            start_ms: js::number(&start),
            stop_ms: js::number(&stop),
            step_ms: js::number(&step),
        };
        let completion = Completion::new(move |result| {
            let delivered = match result {
                Ok(values) => callback.call2(
                    &JsValue::NULL,
                    &JsValue::NULL,
                    &js::array_of(values.into_iter().map(JsValue::from_f64)),
                ),
                Err(error) => callback.call1(
                    &JsValue::NULL,
                    &js_sys::Error::new(&error.to_string()).into(),
                ),
            };
            if let Err(error) = delivered {
                tracing::warn!(error = %js::foreign(error), "metric callback threw");
            }
        });
        request(window, completion);
    };
    Closure::wrap(Box::new(function) as Box<dyn Fn(JsValue, JsValue, JsValue, JsValue)>)
        .into_js_value()
}

impl ContextBinding<BrowserBackend> for BrowserContext {
    fn step_ms(&self) -> f64 {
        self.number("step")
    }

    fn set_step_ms(&self, step_ms: f64) {
        self.set_number("step", step_ms);
    }

    fn size(&self) -> usize {
        let size = self.number("size");
        if size.is_finite() && size > 0.0 { size as usize } else { 0 }
    }

    fn set_size(&self, size: usize) {
        self.set_number("size", size as f64);
    }

    fn server_delay_ms(&self) -> f64 {
        self.number("serverDelay")
    }

    fn set_server_delay_ms(&self, delay_ms: f64) {
        self.set_number("serverDelay", delay_ms);
    }

    fn client_delay_ms(&self) -> f64 {
        self.number("clientDelay")
    }

    fn set_client_delay_ms(&self, delay_ms: f64) {
        self.set_number("clientDelay", delay_ms);
    }

    fn graphite(&self, host: &str) -> BrowserGraphite {
        let handle = js::call_or_log(&self.handle, "graphite", &[JsValue::from_str(host)]);
        BrowserGraphite::new(self.clone(), handle)
    }

    fn cube(&self, host: &str) -> BrowserCube {
        let handle = js::call_or_log(&self.handle, "cube", &[JsValue::from_str(host)]);
        BrowserCube::new(self.clone(), handle)
    }

    fn librato(&self, user: &str, token: &str) -> BrowserLibrato {
        let handle = js::call_or_log(
            &self.handle,
            "librato",
            &[JsValue::from_str(user), JsValue::from_str(token)],
        );
        BrowserLibrato::new(self.clone(), handle)
    }

    fn constant(&self, value: f64) -> BrowserMetric {
        let handle = js::call_or_log(&self.handle, "constant", &[JsValue::from_f64(value)]);
        BrowserMetric::new(self.clone(), handle)
    }

    fn metric(&self, request: RawRequest, name: Option<&str>) -> BrowserMetric {
        let name = name.map_or(JsValue::UNDEFINED, JsValue::from_str);
        let handle = js::call_or_log(&self.handle, "metric", &[request_function(request), name]);
        BrowserMetric::new(self.clone(), handle)
    }

    fn axis(&self) -> BrowserAxis {
        BrowserAxis::new(self.clone(), js::call_or_log(&self.handle, "axis", &[]))
    }

    fn rule(&self) -> BrowserRule {
        BrowserRule::new(self.clone(), js::call_or_log(&self.handle, "rule", &[]))
    }

    fn horizon(&self) -> BrowserHorizon {
        BrowserHorizon::new(self.clone(), js::call_or_log(&self.handle, "horizon", &[]))
    }

    fn comparison(&self) -> BrowserComparison {
        BrowserComparison::new(self.clone(), js::call_or_log(&self.handle, "comparison", &[]))
    }

    fn scale(&self) -> CubismResult<TimeScale> {
        let scale = js::call(&self.handle, "scale", &[])?;
        let domain = js::pair(&js::call(&scale, "domain", &[])?)
            .ok_or_else(|| CubismError::Foreign("context scale has no domain".to_owned()))?;
        let range = js::pair(&js::call(&scale, "range", &[])?)
            .ok_or_else(|| CubismError::Foreign("context scale has no range".to_owned()))?;
        TimeScale::from_millis(domain, range)
    }

    fn start(&self) {
        js::call_or_log(&self.handle, "start", &[]);
    }

    fn stop(&self) {
        js::call_or_log(&self.handle, "stop", &[]);
    }

    fn on(&self, event: &EventType, listener: Option<RawListener>) {
        let function = listener.map_or(JsValue::NULL, |listener| {
            js::listener_function(event.kind(), listener)
        });
        js::call_or_log(&self.handle, "on", &[JsValue::from_str(&event.to_string()), function]);
    }

    fn has_listener(&self, event: &EventType) -> bool {
        let listener = js::call_or_log(&self.handle, "on", &[JsValue::from_str(&event.to_string())]);
        !js::is_absent(&listener)
    }

    fn focus(&self, index: Option<usize>) {
        let index = index.map_or(JsValue::NULL, |index| JsValue::from_f64(index as f64));
        js::call_or_log(&self.handle, "focus", &[index]);
    }

    fn focus_index(&self) -> Option<usize> {
        self.focus.get()
    }
}
