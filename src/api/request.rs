use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::binding::{RawRequest, RequestWindow};
use crate::core::types::{millis_to_datetime, millis_to_duration};

pub use crate::binding::Completion;

/// Supplies samples for a custom metric.
///
/// Called by the runtime whenever the metric needs the window
/// `[start, stop)` at `step` resolution. Deliver one value per step through
/// `done`, either before returning or later; a failure is logged by the
/// runtime and leaves the metric's window unchanged.
pub trait Request: 'static {
    fn request(&self, start: DateTime<Utc>, stop: DateTime<Utc>, step: Duration, done: Completion);
}

/// Adapts a closure to [`Request`].
pub struct RequestFn<F>(pub F);

impl<F> RequestFn<F>
where
    F: Fn(DateTime<Utc>, DateTime<Utc>, Duration, Completion) + 'static,
{
    pub fn new(request: F) -> Self {
        Self(request)
    }
}

impl<F> Request for RequestFn<F>
where
    F: Fn(DateTime<Utc>, DateTime<Utc>, Duration, Completion) + 'static,
{
    fn request(&self, start: DateTime<Utc>, stop: DateTime<Utc>, step: Duration, done: Completion) {
        (self.0)(start, stop, step, done);
    }
}

pub(crate) fn into_raw(request: impl Request) -> RawRequest {
    Rc::new(move |window: RequestWindow, done: Completion| {
        match (
            millis_to_datetime(window.start_ms),
            millis_to_datetime(window.stop_ms),
        ) {
            (Some(start), Some(stop)) => {
                request.request(start, stop, millis_to_duration(window.step_ms), done);
            }
            _ => done.fail(format!("request window out of range: {window:?}")),
        }
    })
}
