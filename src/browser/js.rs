//! Reflective call helpers over `js-sys`.

use js_sys::{Array, Date, Function, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use crate::error::{CubismError, CubismResult};
use crate::event::{EventKind, ForeignEvent, RawListener};

/// Converts a thrown JavaScript value into an error.
pub(crate) fn foreign(error: JsValue) -> CubismError {
    let message = error
        .dyn_ref::<js_sys::Error>()
        .map(|error| String::from(error.message()))
        .or_else(|| error.as_string())
        .unwrap_or_else(|| format!("{error:?}"));
    CubismError::Foreign(message)
}

pub(crate) fn get(target: &JsValue, name: &str) -> CubismResult<JsValue> {
    Reflect::get(target, &JsValue::from_str(name)).map_err(foreign)
}

/// Calls `target[name](...args)` with `target` as `this`.
pub(crate) fn call(target: &JsValue, name: &str, args: &[JsValue]) -> CubismResult<JsValue> {
    let method: Function = get(target, name)?
        .dyn_into()
        .map_err(|_| CubismError::Foreign(format!("`{name}` is not a function")))?;
    let args: Array = args.iter().collect();
    method.apply(target, &args).map_err(foreign)
}

/// Like [`call`], for accessors the binding treats as infallible.
pub(crate) fn call_or_log(target: &JsValue, name: &str, args: &[JsValue]) -> JsValue {
    call(target, name, args).unwrap_or_else(|error| {
        tracing::warn!(method = name, %error, "foreign call failed");
        JsValue::UNDEFINED
    })
}

pub(crate) fn number(value: &JsValue) -> f64 {
    match value.dyn_ref::<Date>() {
        Some(date) => date.get_time(),
        None => value.as_f64().unwrap_or(f64::NAN),
    }
}

pub(crate) fn date(millis: f64) -> JsValue {
    Date::new(&JsValue::from_f64(millis)).into()
}

pub(crate) fn is_absent(value: &JsValue) -> bool {
    value.is_undefined() || value.is_null()
}

pub(crate) fn strings(value: &JsValue) -> Vec<String> {
    if !Array::is_array(value) {
        return Vec::new();
    }
    Array::from(value)
        .iter()
        .filter_map(|item| item.as_string())
        .collect()
}

pub(crate) fn pair(value: &JsValue) -> Option<(f64, f64)> {
    if !Array::is_array(value) {
        return None;
    }
    let array = Array::from(value);
    (array.length() >= 2).then(|| (number(&array.get(0)), number(&array.get(1))))
}

pub(crate) fn array_of(values: impl IntoIterator<Item = JsValue>) -> JsValue {
    values.into_iter().collect::<Array>().into()
}

/// Wraps a listener in a JavaScript function receiving the runtime's positional arguments.
pub(crate) fn listener_function(kind: EventKind, listener: RawListener) -> JsValue {
    let function = move |first: JsValue, second: JsValue| {
        let event = if kind.carries_range() {
            ForeignEvent::Range {
                start_ms: number(&first),
                stop_ms: number(&second),
            }
        } else {
            ForeignEvent::Focus {
                index: (!is_absent(&first)).then(|| number(&first)),
            }
        };
        listener(event);
    };
    Closure::wrap(Box::new(function) as Box<dyn Fn(JsValue, JsValue)>).into_js_value()
}
