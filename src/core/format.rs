//! Caller-supplied formatting functions and the defaults charts start with.
//!
//! Formatters are opaque to the binding: they are forwarded to the wrapped
//! runtime as-is and invoked there whenever a label is drawn.

use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Formats a metric value for a chart label.
pub type ValueFormatter = Rc<dyn Fn(f64) -> String>;

/// Formats an instant for an axis tick or focus label.
pub type TimeFormatter = Rc<dyn Fn(DateTime<Utc>) -> String>;

const SI_SYMBOLS: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "µ", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// SI-prefixed formatting with `precision` significant digits (`1234.0` -> `"1.2k"`).
#[must_use]
pub fn format_si(value: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_owned();
    }
    if value == 0.0 {
        return format!("{:.*}", precision - 1, 0.0);
    }

    let rounded = round_significant(value, precision);
    let exponent = rounded.abs().log10().floor() as i32;
    let prefix_exponent = (exponent.div_euclid(3) * 3).clamp(-24, 24);
    let scaled = if prefix_exponent >= 0 {
        rounded / 10f64.powi(prefix_exponent)
    } else {
        rounded * 10f64.powi(-prefix_exponent)
    };
    let integer_digits = scaled.abs().log10().floor() as i32 + 1;
    let decimals = (precision as i32 - integer_digits).max(0) as usize;
    let symbol = SI_SYMBOLS[((prefix_exponent + 24) / 3) as usize];

    format!("{scaled:.decimals$}{symbol}")
}

/// Signed percentage with `precision` decimals (`0.123` -> `"+12%"`).
#[must_use]
pub fn format_percent_change(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    let percent = value * 100.0;
    // -0 would otherwise print as "-0%".
    let percent = if percent == 0.0 { 0.0 } else { percent };
    format!("{percent:+.precision$}%")
}

fn round_significant(value: f64, digits: usize) -> f64 {
    let magnitude = value.abs().log10().floor() as i32;
    let shift = digits as i32 - 1 - magnitude;
    if shift >= 0 {
        let factor = 10f64.powi(shift);
        (value * factor).round() / factor
    } else {
        let factor = 10f64.powi(-shift);
        (value / factor).round() * factor
    }
}

/// Default horizon value format (two significant digits, SI prefix).
#[must_use]
pub fn si(precision: usize) -> ValueFormatter {
    Rc::new(move |value| format_si(value, precision))
}

/// Default comparison change format (signed whole percent).
#[must_use]
pub fn percent_change(precision: usize) -> ValueFormatter {
    Rc::new(move |value| format_percent_change(value, precision))
}

/// `strftime` pattern the axis uses for a given context step.
#[must_use]
pub fn time_pattern_for_step(step: Duration) -> &'static str {
    if step >= Duration::from_secs(86_400) {
        "%B %d"
    } else if step >= Duration::from_secs(60) {
        "%I:%M %p"
    } else {
        "%I:%M:%S %p"
    }
}

/// Default axis tick format: coarser for longer steps.
#[must_use]
pub fn time_for_step(step: Duration) -> TimeFormatter {
    let pattern = time_pattern_for_step(step);
    Rc::new(move |time: DateTime<Utc>| time.format(pattern).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn si_uses_prefixes_and_significant_digits() {
        assert_eq!(format_si(1234.0, 2), "1.2k");
        assert_eq!(format_si(12_345.0, 2), "12k");
        assert_eq!(format_si(123_456.0, 2), "120k");
        assert_eq!(format_si(0.5, 2), "500m");
        assert_eq!(format_si(1.0, 2), "1.0");
        assert_eq!(format_si(0.0, 2), "0.0");
        assert_eq!(format_si(-2_500_000.0, 2), "-2.5M");
    }

    #[test]
    fn si_rounding_can_bump_prefix() {
        assert_eq!(format_si(999_700.0, 2), "1.0M");
    }

    #[test]
    fn percent_change_is_signed() {
        assert_eq!(format_percent_change(0.123, 0), "+12%");
        assert_eq!(format_percent_change(-0.05, 0), "-5%");
        assert_eq!(format_percent_change(0.0, 0), "+0%");
    }

    #[test]
    fn time_pattern_depends_on_step() {
        assert_eq!(time_pattern_for_step(Duration::from_secs(10)), "%I:%M:%S %p");
        assert_eq!(time_pattern_for_step(Duration::from_secs(60)), "%I:%M %p");
        assert_eq!(time_pattern_for_step(Duration::from_secs(86_400)), "%B %d");
    }

    #[test]
    fn time_formatter_renders_utc() {
        let format = time_for_step(Duration::from_secs(10));
        let time = DateTime::from_timestamp(13 * 3600 + 5 * 60 + 7, 0).unwrap();
        assert_eq!(format(time), "01:05:07 PM");
    }
}
