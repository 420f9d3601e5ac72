//! Per-Timeframe Evaluator
//!
//! Runs the indicator library over one bar series and assembles a
//! `TimeframeSignals` record. Indicators lacking history are recorded as not
//! computed instead of failing the whole evaluation.

use super::core::TimeframeSignals;
use crate::breakout::{detect_breakout, support_resistance};
use crate::candles::{count_opposite_candles, detect_impulse, has_low_spread, has_volume_spike, is_doji, is_narrow_range};
use crate::config::{EvaluationConfig, IndicatorConfig};
use crate::elliott::detect_wave;
use crate::error::SignalError;
use crate::market_data::{BarSeries, Resolution};
use crate::retracement::retracement;
use crate::trend::{moving_average, moving_average_direction, near_moving_average, trend_direction};
use log::debug;

#[derive(Debug, Clone)]
pub struct TimeframeEvaluator {
    indicators: IndicatorConfig,
    evaluation: EvaluationConfig,
}

impl TimeframeEvaluator {
    pub fn new(indicators: IndicatorConfig, evaluation: EvaluationConfig) -> Self {
        Self {
            indicators,
            evaluation,
        }
    }

    pub fn evaluate(&self, series: &BarSeries) -> TimeframeSignals {
        let cfg = &self.indicators;
        let bars = series.bars();
        let resolution = series.resolution;
        let mut signals = TimeframeSignals::new(resolution);

        signals.trend = computed(series, trend_direction(bars, cfg.trend_lookback));
        signals.moving_average = computed(series, moving_average(bars, cfg.ma_window));
        signals.ma_direction = computed(series, moving_average_direction(bars, cfg.ma_window));
        signals.near_moving_average = computed(
            series,
            near_moving_average(bars, cfg.ma_window, cfg.ma_proximity_threshold),
        );
        signals.narrow_range = computed(
            series,
            is_narrow_range(bars, cfg.narrow_range_lookback, cfg.narrow_range_percentile),
        );

        if let Some(latest) = series.latest() {
            signals.doji = Some(is_doji(latest, cfg.doji_body_ratio));
            if self.enabled(&self.evaluation.low_spread_resolutions, resolution) {
                signals.low_spread = Some(has_low_spread(latest, cfg.low_spread_threshold));
            }
        }

        if self.enabled(&self.evaluation.volume_spike_resolutions, resolution) {
            signals.volume_spike = computed(
                series,
                has_volume_spike(bars, cfg.volume_window, cfg.volume_spike_multiplier),
            );
        }
        if self.enabled(&self.evaluation.support_resistance_resolutions, resolution) {
            signals.support_resistance =
                computed(series, support_resistance(bars, cfg.support_resistance_window));
        }

        // Everything below is measured relative to a non-flat trend
        let Some(direction) = signals.direction() else {
            return signals;
        };

        signals.breakout = computed(
            series,
            detect_breakout(
                bars,
                cfg.support_resistance_window,
                cfg.volume_window,
                cfg.breakout_volume_multiplier,
                direction,
            ),
        )
        .flatten();
        signals.impulse = computed(
            series,
            detect_impulse(
                bars,
                cfg.impulse_body_ratio,
                cfg.volume_window,
                cfg.impulse_volume_multiplier,
                direction,
            ),
        )
        .flatten();
        signals.opposite_candles = computed(
            series,
            count_opposite_candles(bars, cfg.opposite_candle_window, direction),
        );

        if self.enabled(&self.evaluation.retracement_resolutions, resolution) {
            signals.retracement = computed(
                series,
                retracement(bars, cfg.retracement_lookback, direction, cfg.retracement_band),
            )
            .flatten();
        }
        if self.enabled(&self.evaluation.wave_resolutions, resolution) {
            signals.wave = computed(
                series,
                detect_wave(bars, cfg.fib_window, cfg.fib_tolerance, &cfg.fib_ratios, direction),
            );
        }

        signals
    }

    /// Whether the "3+ opposite candles" condition holds for a record
    pub fn opposite_candles_fired(&self, signals: &TimeframeSignals) -> bool {
        signals
            .opposite_candles
            .is_some_and(|count| count >= self.indicators.opposite_candle_min)
    }

    fn enabled(&self, resolutions: &[Resolution], resolution: Resolution) -> bool {
        resolutions.contains(&resolution)
    }
}

/// Degrade an indicator failure to "not computed"
fn computed<T>(series: &BarSeries, result: Result<T, SignalError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("{} {}: {}", series.symbol, series.resolution, e);
            None
        }
    }
}
