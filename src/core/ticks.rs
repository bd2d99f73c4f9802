use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CubismError, CubismResult};

/// Calendar unit for interval-based tick generation on a time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInterval {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeInterval {
    /// Name of the plural range function in the wrapped runtime's time module.
    #[must_use]
    pub const fn range_function(self) -> &'static str {
        match self {
            Self::Second => "seconds",
            Self::Minute => "minutes",
            Self::Hour => "hours",
            Self::Day => "days",
            Self::Week => "weeks",
            Self::Month => "months",
            Self::Year => "years",
        }
    }
}

/// How an axis picks its tick positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TickSpec {
    /// Approximate number of ticks; the scale picks round instants.
    Count { count: u32 },
    /// Explicit tick instants.
    Values { values: Vec<DateTime<Utc>> },
    /// One tick every `every` units of `unit`.
    Interval { unit: TimeInterval, every: u32 },
}

impl Default for TickSpec {
    fn default() -> Self {
        Self::Count { count: 10 }
    }
}

impl TickSpec {
    pub fn count(count: u32) -> CubismResult<Self> {
        if count == 0 {
            return Err(CubismError::InvalidConfig(
                "tick count must be > 0".to_owned(),
            ));
        }
        Ok(Self::Count { count })
    }

    #[must_use]
    pub fn values(values: Vec<DateTime<Utc>>) -> Self {
        Self::Values { values }
    }

    pub fn interval(unit: TimeInterval, every: u32) -> CubismResult<Self> {
        if every == 0 {
            return Err(CubismError::InvalidConfig(
                "tick interval step must be > 0".to_owned(),
            ));
        }
        Ok(Self::Interval { unit, every })
    }
}

/// Tick lengths in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSize {
    pub major: u32,
    pub minor: u32,
    pub end: u32,
}

impl Default for TickSize {
    fn default() -> Self {
        Self::uniform(6)
    }
}

impl TickSize {
    #[must_use]
    pub const fn new(major: u32, minor: u32, end: u32) -> Self {
        Self { major, minor, end }
    }

    #[must_use]
    pub const fn uniform(size: u32) -> Self {
        Self::new(size, size, size)
    }
}
