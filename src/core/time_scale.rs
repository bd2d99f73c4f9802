use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::{datetime_to_millis, millis_to_datetime};
use crate::error::{CubismError, CubismResult};

/// Snapshot of a context's time scale.
///
/// The domain is the currently displayed window `[start, stop]`; the range is
/// `[0, size]`, one pixel per sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeScale {
    domain_start_ms: f64,
    domain_end_ms: f64,
    range_start: f64,
    range_end: f64,
}

impl TimeScale {
    /// Creates a scale from foreign millisecond bounds.
    pub fn from_millis(domain: (f64, f64), range: (f64, f64)) -> CubismResult<Self> {
        if !domain.0.is_finite() || !domain.1.is_finite() {
            return Err(CubismError::InvalidConfig(
                "time scale domain must be finite".to_owned(),
            ));
        }
        if !range.0.is_finite() || !range.1.is_finite() {
            return Err(CubismError::InvalidConfig(
                "time scale range must be finite".to_owned(),
            ));
        }
        Ok(Self {
            domain_start_ms: domain.0,
            domain_end_ms: domain.1,
            range_start: range.0,
            range_end: range.1,
        })
    }

    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>, width: f64) -> CubismResult<Self> {
        Self::from_millis(
            (datetime_to_millis(start), datetime_to_millis(stop)),
            (0.0, width),
        )
    }

    #[must_use]
    pub fn domain_millis(self) -> (f64, f64) {
        (self.domain_start_ms, self.domain_end_ms)
    }

    /// Domain bounds as instants; `None` if the foreign side reported an unrepresentable bound.
    #[must_use]
    pub fn domain(self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((
            millis_to_datetime(self.domain_start_ms)?,
            millis_to_datetime(self.domain_end_ms)?,
        ))
    }

    #[must_use]
    pub fn range(self) -> (f64, f64) {
        (self.range_start, self.range_end)
    }

    /// Maps an instant to a pixel offset. A zero-width domain maps everything to the range start.
    #[must_use]
    pub fn map(self, time: DateTime<Utc>) -> f64 {
        let span = self.domain_end_ms - self.domain_start_ms;
        if span == 0.0 {
            return self.range_start;
        }
        let t = (datetime_to_millis(time) - self.domain_start_ms) / span;
        self.range_start + t * (self.range_end - self.range_start)
    }

    /// Maps a pixel offset back to an instant.
    #[must_use]
    pub fn invert(self, pixel: f64) -> Option<DateTime<Utc>> {
        let width = self.range_end - self.range_start;
        if width == 0.0 {
            return millis_to_datetime(self.domain_start_ms);
        }
        let t = (pixel - self.range_start) / width;
        millis_to_datetime(self.domain_start_ms + t * (self.domain_end_ms - self.domain_start_ms))
    }
}
