//! Candle-shape and volume classifiers

use crate::error::{SignalError, require_bars};
use crate::market_data::{Bar, CandleColor};
use crate::signals::utils::SignalUtils;
use crate::trend::Direction;
use serde::{Deserialize, Serialize};

/// Strong body in the trend direction backed by volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impulse {
    pub direction: Direction,
    pub body_ratio: f64,
}

/// Body smaller than `max_body_ratio` of the range; a zero-range bar is not a doji
pub fn is_doji(bar: &Bar, max_body_ratio: f64) -> bool {
    match SignalUtils::body_ratio(bar) {
        Some(ratio) => ratio < max_body_ratio,
        None => false,
    }
}

/// Latest range strictly below the given percentile of the previous `lookback` ranges
pub fn is_narrow_range(bars: &[Bar], lookback: usize, percentile: usize) -> Result<bool, SignalError> {
    require_bars("narrow_range", lookback.max(1).saturating_add(1), bars.len())?;

    let latest = bars[bars.len() - 1].range();
    let previous: Vec<f64> = bars[bars.len() - 1 - lookback..bars.len() - 1]
        .iter()
        .map(|b| b.range())
        .collect();

    match SignalUtils::percentile(&previous, percentile) {
        Some(cutoff) => Ok(latest < cutoff),
        None => Ok(false),
    }
}

/// Latest volume above the trailing mean times `multiplier`
pub fn has_volume_spike(bars: &[Bar], window: usize, multiplier: f64) -> Result<bool, SignalError> {
    require_bars("volume_spike", window.max(1).saturating_add(1), bars.len())?;

    let latest = bars[bars.len() - 1].volume;
    let average = SignalUtils::trailing_volume_mean(bars, window.max(1)).unwrap_or(0.0);
    Ok(SignalUtils::volume_confirms(latest, average, multiplier))
}

/// `(high - low) / close < threshold`
pub fn has_low_spread(bar: &Bar, threshold: f64) -> bool {
    if bar.close <= 0.0 {
        return false;
    }
    bar.range() / bar.close < threshold
}

/// Detect an impulse candle agreeing with `trend`
pub fn detect_impulse(
    bars: &[Bar],
    min_body_ratio: f64,
    volume_window: usize,
    volume_multiplier: f64,
    trend: Direction,
) -> Result<Option<Impulse>, SignalError> {
    require_bars("impulse", volume_window.max(1).saturating_add(1), bars.len())?;

    let latest = &bars[bars.len() - 1];
    let Some(body_ratio) = SignalUtils::body_ratio(latest) else {
        return Ok(None);
    };

    let color_agrees = match trend {
        Direction::Up => latest.is_green(),
        Direction::Down => latest.is_red(),
    };
    let average = SignalUtils::trailing_volume_mean(bars, volume_window.max(1)).unwrap_or(0.0);

    if body_ratio >= min_body_ratio
        && color_agrees
        && SignalUtils::volume_confirms(latest.volume, average, volume_multiplier)
    {
        return Ok(Some(Impulse {
            direction: trend,
            body_ratio,
        }));
    }
    Ok(None)
}

/// Number of the last `window` candles coloured against `trend`
pub fn count_opposite_candles(bars: &[Bar], window: usize, trend: Direction) -> Result<usize, SignalError> {
    require_bars("opposite_candles", window, bars.len())?;

    let opposite = match trend {
        Direction::Up => CandleColor::Red,
        Direction::Down => CandleColor::Green,
    };
    Ok(bars[bars.len() - window..]
        .iter()
        .filter(|b| b.color() == opposite)
        .count())
}
