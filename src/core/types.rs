use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CubismError, CubismResult};

/// Visible time window carried by `prepare`, `beforechange` and `change` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
}

impl TimeRange {
    #[must_use]
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        Self { start, stop }
    }

    /// Builds a range from foreign millisecond timestamps.
    ///
    /// Returns `None` when either bound is not a representable instant, which
    /// is how the wrapped runtime reports a window that was never fetched.
    #[must_use]
    pub fn from_millis(start_ms: f64, stop_ms: f64) -> Option<Self> {
        Some(Self {
            start: millis_to_datetime(start_ms)?,
            stop: millis_to_datetime(stop_ms)?,
        })
    }

    #[must_use]
    pub fn span(self) -> chrono::TimeDelta {
        self.stop - self.start
    }
}

/// Minimum and maximum over a metric window or a chart's fixed value domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    /// Creates an extent, swapping the bounds if they arrive reversed.
    pub fn new(min: f64, max: f64) -> CubismResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(CubismError::InvalidConfig(
                "extent bounds must be finite".to_owned(),
            ));
        }
        if min <= max {
            Ok(Self { min, max })
        } else {
            Ok(Self { min: max, max: min })
        }
    }

    /// Folds finite values into an extent; `None` if no value is finite.
    #[must_use]
    pub fn of_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in values.into_iter().filter(|v| v.is_finite()) {
            min = min.min(value);
            max = max.max(value);
        }
        (min <= max).then_some(Self { min, max })
    }

    /// Reads a foreign `[min, max]` pair, where `[Infinity, -Infinity]` means empty.
    #[must_use]
    pub fn from_raw((min, max): (f64, f64)) -> Option<Self> {
        (min.is_finite() && max.is_finite() && min <= max).then_some(Self { min, max })
    }

    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Horizon band layout for negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizonMode {
    /// Negative bands are drawn from the top, offset into the chart.
    #[default]
    Offset,
    /// Negative bands are mirrored around the baseline.
    Mirror,
}

impl HorizonMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Offset => "offset",
            Self::Mirror => "mirror",
        }
    }
}

impl FromStr for HorizonMode {
    type Err = CubismError;

    fn from_str(input: &str) -> CubismResult<Self> {
        match input {
            "offset" => Ok(Self::Offset),
            "mirror" => Ok(Self::Mirror),
            other => Err(CubismError::InvalidConfig(format!(
                "unknown horizon mode `{other}`"
            ))),
        }
    }
}

impl fmt::Display for HorizonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of the chart an axis is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

impl Orientation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

impl FromStr for Orientation {
    type Err = CubismError;

    fn from_str(input: &str) -> CubismResult<Self> {
        match input {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(CubismError::InvalidConfig(format!(
                "unknown axis orientation `{other}`"
            ))),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation Graphite applies when a query is resampled to the context step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Summarize {
    #[default]
    Sum,
    Avg,
    Max,
    Min,
    Last,
}

impl Summarize {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Max => "max",
            Self::Min => "min",
            Self::Last => "last",
        }
    }
}

/// Context defaults of the wrapped runtime, in milliseconds.
pub const DEFAULT_STEP_MS: f64 = 1e4;
pub const DEFAULT_SIZE: usize = 1440;
pub const DEFAULT_SERVER_DELAY_MS: f64 = 5e3;
pub const DEFAULT_CLIENT_DELAY_MS: f64 = 5e3;

/// Converts a duration to the wrapped runtime's millisecond unit.
#[must_use]
pub fn duration_to_millis(duration: Duration) -> f64 {
    duration.as_millis() as f64
}

/// Converts foreign milliseconds back to a duration; negative or non-finite input clamps to zero.
#[must_use]
pub fn millis_to_duration(millis: f64) -> Duration {
    if millis.is_finite() && millis > 0.0 {
        Duration::from_millis(millis.round() as u64)
    } else {
        Duration::ZERO
    }
}

#[must_use]
pub fn millis_to_datetime(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis.round() as i64)
}

#[must_use]
pub fn datetime_to_millis(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_of_values_skips_missing_samples() {
        let extent = Extent::of_values([3.0, f64::NAN, -1.0, 7.5]).expect("non-empty");
        assert_eq!(extent, Extent { min: -1.0, max: 7.5 });
        assert!(Extent::of_values([f64::NAN, f64::NAN]).is_none());
    }

    #[test]
    fn extent_raw_infinity_pair_is_empty() {
        assert!(Extent::from_raw((f64::INFINITY, f64::NEG_INFINITY)).is_none());
        assert_eq!(
            Extent::from_raw((1.0, 2.0)),
            Some(Extent { min: 1.0, max: 2.0 })
        );
    }

    #[test]
    fn millisecond_conversions_round_trip() {
        let step = Duration::from_millis(5_000);
        assert_eq!(millis_to_duration(duration_to_millis(step)), step);
        assert_eq!(millis_to_duration(-3.0), Duration::ZERO);

        let time = millis_to_datetime(1_400_000_000_000.0).expect("valid instant");
        assert_eq!(datetime_to_millis(time), 1_400_000_000_000.0);
        assert!(millis_to_datetime(f64::NEG_INFINITY).is_none());
    }

    #[test]
    fn enum_names_match_foreign_strings() {
        assert_eq!("mirror".parse::<HorizonMode>(), Ok(HorizonMode::Mirror));
        assert_eq!(Orientation::Left.to_string(), "left");
        assert!("sideways".parse::<Orientation>().is_err());
    }
}
