//! Precision & Rounding
//!
//! One rounding convention for geometry, export and display: half away from zero.

use serde::{Deserialize, Serialize};

/// Significant digits used when rendering ratios and measurements.
pub const DISPLAY_SIGNIFICANT_DIGITS: usize = 6;

const MAX_SIGNIFICANT_DIGITS: usize = 17;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoundingEven {
    #[default]
    Whole,
    Even,
}

impl RoundingEven {
    pub const ALL: [&'static str; 2] = ["whole", "even"];
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    Up,
    Down,
    #[default]
    Round,
}

impl RoundingMode {
    pub const ALL: [&'static str; 3] = ["up", "down", "round"];
}

/// FDL rounding policy: snap to whole or even numbers, rounding up, down or to nearest.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundingPolicy {
    pub even: RoundingEven,
    pub mode: RoundingMode,
}

impl RoundingPolicy {
    /// Nearest whole pixel, half away from zero. Used for all derived geometry.
    pub const NEAREST_WHOLE: RoundingPolicy = RoundingPolicy {
        even: RoundingEven::Whole,
        mode: RoundingMode::Round,
    };

    pub fn new(even: RoundingEven, mode: RoundingMode) -> Self {
        Self { even, mode }
    }

    pub fn apply(&self, value: f64) -> i64 {
        let step = match self.even {
            RoundingEven::Whole => 1.0,
            RoundingEven::Even => 2.0,
        };
        let scaled = value / step;
        let snapped = match self.mode {
            RoundingMode::Up => scaled.ceil(),
            RoundingMode::Down => scaled.floor(),
            RoundingMode::Round => scaled.round(),
        };
        (snapped * step) as i64
    }
}

/// Round half away from zero (`2.5 -> 3`, `-2.5 -> -3`).
pub fn round_half_away(value: f64) -> i64 {
    RoundingPolicy::NEAREST_WHOLE.apply(value)
}

/// `width / height` as a real number, or `None` for a non-positive height.
pub fn precise_aspect_ratio(width: f64, height: f64) -> Option<f64> {
    if height > 0.0 && width > 0.0 && width.is_finite() && height.is_finite() {
        Some(width / height)
    } else {
        None
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Reduce `width:height` by their greatest common divisor.
pub fn reduced_aspect_ratio(width: u32, height: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let g = gcd(width as u64, height as u64) as u32;
    Some((width / g, height / g))
}

/// Render `value` with `digits` significant digits, trimming trailing zeros.
///
/// Rounds half away from zero at the last kept digit, matching geometry.
/// `digits` is clamped to `1..=17`; an f64 carries no more than that.
pub fn format_significant(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let digits = digits.clamp(1, MAX_SIGNIFICANT_DIGITS) as i32;
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = digits - 1 - magnitude;
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value.to_string();
    }
    let rounded = scaled.round() / factor;

    let text = if decimals > 0 {
        format!("{:.*}", decimals as usize, rounded)
    } else {
        format!("{:.0}", rounded)
    };
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// Decimal ratio for display, e.g. `1.77778:1`.
pub fn format_aspect_ratio(width: u32, height: u32) -> Option<String> {
    let ratio = precise_aspect_ratio(width as f64, height as f64)?;
    Some(format!("{}:1", format_significant(ratio, DISPLAY_SIGNIFICANT_DIGITS)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away() {
        assert_eq!(round_half_away(2.5), 3);
        assert_eq!(round_half_away(-2.5), -3);
        assert_eq!(round_half_away(822.857), 823);
        assert_eq!(round_half_away(128.49), 128);
    }

    #[test]
    fn test_policy_even() {
        let up = RoundingPolicy::new(RoundingEven::Even, RoundingMode::Up);
        let down = RoundingPolicy::new(RoundingEven::Even, RoundingMode::Down);
        let round = RoundingPolicy::new(RoundingEven::Even, RoundingMode::Round);
        assert_eq!(up.apply(821.0), 822);
        assert_eq!(down.apply(823.0), 822);
        assert_eq!(round.apply(822.9), 822);
        assert_eq!(round.apply(823.1), 824);
    }

    #[test]
    fn test_policy_whole() {
        let up = RoundingPolicy::new(RoundingEven::Whole, RoundingMode::Up);
        let down = RoundingPolicy::new(RoundingEven::Whole, RoundingMode::Down);
        assert_eq!(up.apply(10.01), 11);
        assert_eq!(down.apply(10.99), 10);
        assert_eq!(RoundingPolicy::default(), RoundingPolicy::NEAREST_WHOLE);
    }

    #[test]
    fn test_reduced_aspect_ratio() {
        assert_eq!(reduced_aspect_ratio(1920, 1080), Some((16, 9)));
        assert_eq!(reduced_aspect_ratio(4096, 2160), Some((256, 135)));
        assert_eq!(reduced_aspect_ratio(0, 1080), None);
    }

    #[test]
    fn test_format_significant() {
        assert_eq!(format_significant(1920.0 / 1080.0, 6), "1.77778");
        assert_eq!(format_significant(4.0 / 3.0, 6), "1.33333");
        assert_eq!(format_significant(2.39, 6), "2.39");
        assert_eq!(format_significant(2.0, 6), "2");
        assert_eq!(format_significant(24.892, 3), "24.9");
        assert_eq!(format_significant(12345.6, 3), "12300");
        assert_eq!(format_significant(0.0, 6), "0");
    }

    #[test]
    fn test_format_significant_many_digits() {
        assert_eq!(format_significant(1.5, 20), "1.5");
        assert_eq!(format_significant(123456789.0, 25), "123456789");
        assert_eq!(
            format_significant(1920.0 / 1080.0, 40),
            format_significant(1920.0 / 1080.0, 17)
        );
        assert_eq!(format_significant(-2.5, 1), "-3");
    }

    #[test]
    fn test_format_aspect_ratio() {
        assert_eq!(format_aspect_ratio(21, 9).as_deref(), Some("2.33333:1"));
        assert_eq!(format_aspect_ratio(1, 0), None);
    }
}
