use std::fmt;
use std::rc::Rc;

use crate::error::{CubismError, CubismResult};

/// Window the runtime asks a metric request to fill, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestWindow {
    pub start_ms: f64,
    pub stop_ms: f64,
    pub step_ms: f64,
}

impl RequestWindow {
    /// Number of samples the window spans.
    #[must_use]
    pub fn sample_count(self) -> usize {
        if self.step_ms <= 0.0 || self.stop_ms <= self.start_ms {
            return 0;
        }
        ((self.stop_ms - self.start_ms) / self.step_ms).round() as usize
    }

    #[must_use]
    pub fn shifted(self, offset_ms: f64) -> Self {
        Self {
            start_ms: self.start_ms + offset_ms,
            stop_ms: self.stop_ms + offset_ms,
            step_ms: self.step_ms,
        }
    }
}

/// Request function in the runtime's calling convention.
pub type RawRequest = Rc<dyn Fn(RequestWindow, Completion)>;

/// Receives the paths found by a Graphite pattern search.
pub type FindCallback = Box<dyn FnOnce(CubismResult<Vec<String>>)>;

/// Handle through which a metric request delivers its samples.
///
/// It may be consumed synchronously inside the request or kept and consumed
/// later, once data arrives. Dropping it without completing leaves the
/// request pending forever, and the metric will not fetch that window again.
pub struct Completion {
    deliver: Box<dyn FnOnce(CubismResult<Vec<f64>>)>,
}

impl Completion {
    pub fn new(deliver: impl FnOnce(CubismResult<Vec<f64>>) + 'static) -> Self {
        Self {
            deliver: Box::new(deliver),
        }
    }

    /// Delivers one value per step from the window start; NaN marks a missing sample.
    pub fn complete(self, values: Vec<f64>) {
        (self.deliver)(Ok(values));
    }

    pub fn fail(self, message: impl Into<String>) {
        (self.deliver)(Err(CubismError::Source(message.into())));
    }

    pub fn finish(self, result: CubismResult<Vec<f64>>) {
        (self.deliver)(result);
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}
