use serde::{Deserialize, Serialize};

use crate::error::{CubismError, CubismResult};

/// Shape of the value-to-pixel mapping a chart uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScaleKind {
    Linear,
    Sqrt,
    Pow { exponent: f64 },
    Log,
}

/// Quantitative scale configuration handed to horizon and comparison charts.
///
/// The wrapped runtime owns the real scale object; this value describes one
/// so it can be built on the foreign side and read back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueScale {
    kind: ScaleKind,
    domain: (f64, f64),
    range: (f64, f64),
    round: bool,
}

impl Default for ValueScale {
    /// Linear identity scale with rounded output, the charts' default.
    fn default() -> Self {
        Self {
            kind: ScaleKind::Linear,
            domain: (0.0, 1.0),
            range: (0.0, 1.0),
            round: true,
        }
    }
}

impl ValueScale {
    pub fn new(kind: ScaleKind, domain: (f64, f64), range: (f64, f64)) -> CubismResult<Self> {
        validate_pair("domain", domain)?;
        validate_pair("range", range)?;
        if domain.0 == domain.1 {
            return Err(CubismError::InvalidConfig(
                "scale domain must be non-empty".to_owned(),
            ));
        }
        match kind {
            ScaleKind::Log if domain.0 <= 0.0 || domain.1 <= 0.0 => {
                return Err(CubismError::InvalidConfig(
                    "log scale domain must be strictly positive".to_owned(),
                ));
            }
            ScaleKind::Pow { exponent } if !exponent.is_finite() || exponent == 0.0 => {
                return Err(CubismError::InvalidConfig(
                    "pow scale exponent must be finite and non-zero".to_owned(),
                ));
            }
            _ => {}
        }
        Ok(Self {
            kind,
            domain,
            range,
            round: false,
        })
    }

    pub fn linear(domain: (f64, f64), range: (f64, f64)) -> CubismResult<Self> {
        Self::new(ScaleKind::Linear, domain, range)
    }

    /// Rounds mapped output to whole pixels.
    #[must_use]
    pub fn rounded(mut self, round: bool) -> Self {
        self.round = round;
        self
    }

    #[must_use]
    pub fn kind(self) -> ScaleKind {
        self.kind
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        self.domain
    }

    #[must_use]
    pub fn range(self) -> (f64, f64) {
        self.range
    }

    #[must_use]
    pub fn is_rounded(self) -> bool {
        self.round
    }

    /// Maps a domain value into the range.
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        let (d0, d1) = (self.transform(self.domain.0), self.transform(self.domain.1));
        let t = (self.transform(value) - d0) / (d1 - d0);
        let mapped = self.range.0 + t * (self.range.1 - self.range.0);
        if self.round { mapped.round() } else { mapped }
    }

    fn transform(self, value: f64) -> f64 {
        match self.kind {
            ScaleKind::Linear => value,
            ScaleKind::Sqrt => value.signum() * value.abs().sqrt(),
            ScaleKind::Pow { exponent } => value.signum() * value.abs().powf(exponent),
            ScaleKind::Log => value.ln(),
        }
    }
}

fn validate_pair(label: &str, (a, b): (f64, f64)) -> CubismResult<()> {
    if !a.is_finite() || !b.is_finite() {
        return Err(CubismError::InvalidConfig(format!(
            "scale {label} must be finite"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_scale_maps_endpoints() {
        let scale = ValueScale::linear((10.0, 110.0), (0.0, 30.0)).expect("valid scale");
        assert_relative_eq!(scale.apply(10.0), 0.0);
        assert_relative_eq!(scale.apply(110.0), 30.0);
        assert_relative_eq!(scale.apply(60.0), 15.0);
    }

    #[test]
    fn rounded_scale_snaps_to_pixels() {
        let scale = ValueScale::linear((0.0, 3.0), (0.0, 10.0))
            .expect("valid scale")
            .rounded(true);
        assert_eq!(scale.apply(1.0), 3.0);
    }

    #[test]
    fn log_scale_requires_positive_domain() {
        assert!(ValueScale::new(ScaleKind::Log, (0.0, 10.0), (0.0, 1.0)).is_err());
        let scale = ValueScale::new(ScaleKind::Log, (1.0, 100.0), (0.0, 2.0)).expect("log");
        assert_relative_eq!(scale.apply(10.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_domain_is_rejected() {
        assert!(ValueScale::linear((4.0, 4.0), (0.0, 1.0)).is_err());
    }
}
