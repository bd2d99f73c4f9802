//! Backend forwarding to the JavaScript library through `wasm-bindgen`.
//!
//! Handles are `JsValue`s of the wrapped objects. Accessors that the
//! runtime cannot report back in typed form (formatters, value scales, tick
//! settings) are mirrored on the Rust side when set.

mod charts;
mod context;
mod js;
mod metric;

use wasm_bindgen::JsValue;

use crate::binding::Backend;
use crate::error::{CubismError, CubismResult};

pub use charts::{BrowserAxis, BrowserComparison, BrowserHorizon, BrowserRule};
pub use context::BrowserContext;
pub use metric::{BrowserCube, BrowserGraphite, BrowserLibrato, BrowserMetric};

/// Handles to the library's global objects.
#[derive(Clone, Debug)]
pub struct BrowserBackend {
    cubism: JsValue,
    d3: JsValue,
}

impl BrowserBackend {
    /// Wraps explicit handles to the `cubism` and `d3` namespaces.
    #[must_use]
    pub fn new(cubism: JsValue, d3: JsValue) -> Self {
        Self { cubism, d3 }
    }

    /// Looks both namespaces up on the global object.
    pub fn from_globals() -> CubismResult<Self> {
        let global: JsValue = js_sys::global().into();
        let lookup = |name: &str| {
            js::get(&global, name).and_then(|value| {
                if js::is_absent(&value) {
                    Err(CubismError::Foreign(format!("global `{name}` is not defined")))
                } else {
                    Ok(value)
                }
            })
        };
        Ok(Self::new(lookup("cubism")?, lookup("d3")?))
    }

    pub(crate) fn d3(&self) -> &JsValue {
        &self.d3
    }

    /// Selects the first element matching `selector` as a drawing surface.
    pub fn select(&self, selector: &str) -> CubismResult<Selection> {
        js::call(&self.d3, "select", &[JsValue::from_str(selector)]).map(Selection::new)
    }
}

/// A d3 selection charts are applied to.
#[derive(Clone, Debug)]
pub struct Selection {
    handle: JsValue,
}

impl Selection {
    #[must_use]
    pub fn new(handle: JsValue) -> Self {
        Self { handle }
    }

    #[must_use]
    pub fn handle(&self) -> &JsValue {
        &self.handle
    }
}

impl Backend for BrowserBackend {
    type Surface = Selection;
    type Context = BrowserContext;
    type Metric = BrowserMetric;
    type Graphite = BrowserGraphite;
    type Cube = BrowserCube;
    type Librato = BrowserLibrato;
    type Axis = BrowserAxis;
    type Rule = BrowserRule;
    type Horizon = BrowserHorizon;
    type Comparison = BrowserComparison;

    fn version(&self) -> String {
        js::get(&self.cubism, "version")
            .ok()
            .and_then(|version| version.as_string())
            .unwrap_or_default()
    }

    fn context(&self) -> CubismResult<BrowserContext> {
        let handle = js::call(&self.cubism, "context", &[])?;
        Ok(BrowserContext::new(self.clone(), handle))
    }
}
