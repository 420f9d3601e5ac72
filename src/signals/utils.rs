//! Shared utility functions for signal generation
//!
//! Small numeric helpers used by the indicator library and the coordinator so
//! every module averages, ranks and clamps values the same way.

use crate::market_data::Bar;
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Shared signal calculation utilities
pub struct SignalUtils;

impl SignalUtils {
    /// Arithmetic mean, `None` for an empty slice
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.mean())
    }

    /// Percentile (0-100) of a set of values, `None` for an empty slice
    ///
    /// # Arguments
    /// * `values` - Sample to rank against
    /// * `percentile` - Requested percentile, clamped to 100
    pub fn percentile(values: &[f64], percentile: usize) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut data = Data::new(values.to_vec());
        Some(data.percentile(percentile.min(100)))
    }

    /// Mean volume of the `window` bars preceding the latest bar
    ///
    /// The caller guarantees `bars.len() > window`.
    pub fn trailing_volume_mean(bars: &[Bar], window: usize) -> Option<f64> {
        let end = bars.len().checked_sub(1)?;
        let start = end.checked_sub(window)?;
        let volumes: Vec<f64> = bars[start..end].iter().map(|b| b.volume).collect();
        Self::mean(&volumes)
    }

    /// True when `volume` exceeds `average * multiplier`; a zero average never confirms
    pub fn volume_confirms(volume: f64, average: f64, multiplier: f64) -> bool {
        average > 0.0 && volume > average * multiplier
    }

    /// Body-to-range ratio of a candle, `None` when the candle has no range
    pub fn body_ratio(bar: &Bar) -> Option<f64> {
        let range = bar.range();
        if range <= 0.0 {
            return None;
        }
        Some(bar.body() / range)
    }

    /// Clamp a score into the configured band
    pub fn clamp_score(score: f64, min: f64, max: f64) -> f64 {
        score.clamp(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bar, flat_bar_with_volume};

    #[test]
    fn test_mean() {
        assert_eq!(SignalUtils::mean(&[]), None);
        assert!((SignalUtils::mean(&[1.0, 2.0, 3.0]).unwrap() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_percentile_bounds() {
        let values: Vec<f64> = (1..=20).map(|v| v as f64).collect();
        let p25 = SignalUtils::percentile(&values, 25).unwrap();
        assert!(p25 > 4.0 && p25 < 7.0, "25th percentile was {}", p25);

        let same = vec![2.0; 10];
        assert!((SignalUtils::percentile(&same, 25).unwrap() - 2.0).abs() < 1e-10);
        assert_eq!(SignalUtils::percentile(&[], 25), None);
    }

    #[test]
    fn test_trailing_volume_excludes_latest() {
        let bars = vec![
            flat_bar_with_volume(100.0, 10.0),
            flat_bar_with_volume(100.0, 20.0),
            flat_bar_with_volume(100.0, 1000.0),
        ];
        let avg = SignalUtils::trailing_volume_mean(&bars, 2).unwrap();
        assert!((avg - 15.0).abs() < 1e-10);

        // Window larger than the available history
        assert_eq!(SignalUtils::trailing_volume_mean(&bars, 3), None);
    }

    #[test]
    fn test_volume_confirmation() {
        assert!(SignalUtils::volume_confirms(16.0, 10.0, 1.5));
        assert!(!SignalUtils::volume_confirms(15.0, 10.0, 1.5));
        assert!(!SignalUtils::volume_confirms(100.0, 0.0, 1.5));
    }

    #[test]
    fn test_body_ratio_zero_range() {
        let point = bar(100.0, 100.0, 100.0, 100.0);
        assert_eq!(SignalUtils::body_ratio(&point), None);

        let candle = bar(100.0, 110.0, 100.0, 105.0);
        assert!((SignalUtils::body_ratio(&candle).unwrap() - 0.5).abs() < 1e-10);
    }
}
