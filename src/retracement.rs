//! Pullback measurement against the recent swing range

use crate::error::{SignalError, require_bars};
use crate::market_data::Bar;
use crate::trend::Direction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Retracement {
    /// Fraction of the swing range given back, always within `[0, 1]`
    pub ratio: f64,
    /// Whether `ratio` falls inside the configured band
    pub valid: bool,
}

/// Inclusive retracement band, e.g. 0.40..=0.60
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetracementBand {
    pub min: f64,
    pub max: f64,
}

impl RetracementBand {
    pub fn contains(&self, ratio: f64) -> bool {
        ratio >= self.min && ratio <= self.max
    }
}

impl Default for RetracementBand {
    fn default() -> Self {
        Self { min: 0.40, max: 0.60 }
    }
}

/// Ratio of the pullback from the swing extreme over the last `lookback` bars
///
/// Up trend: `(peak - close) / (peak - trough)`; down trend mirrors it.
/// Returns `None` when the window has no range.
pub fn retracement_ratio(bars: &[Bar], lookback: usize, trend: Direction) -> Result<Option<f64>, SignalError> {
    require_bars("retracement", lookback.max(1), bars.len())?;

    let window = &bars[bars.len() - lookback.max(1)..];
    let peak = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let trough = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let swing = peak - trough;
    if swing <= 0.0 {
        return Ok(None);
    }

    let close = bars[bars.len() - 1].close;
    let ratio = match trend {
        Direction::Up => (peak - close) / swing,
        Direction::Down => (close - trough) / swing,
    };
    Ok(Some(ratio))
}

/// Whether a ratio falls inside the band; a missing ratio is never valid
pub fn is_valid_retracement(ratio: Option<f64>, band: RetracementBand) -> bool {
    ratio.is_some_and(|r| band.contains(r))
}

pub fn retracement(
    bars: &[Bar],
    lookback: usize,
    trend: Direction,
    band: RetracementBand,
) -> Result<Option<Retracement>, SignalError> {
    Ok(retracement_ratio(bars, lookback, trend)?.map(|ratio| Retracement {
        ratio,
        valid: is_valid_retracement(Some(ratio), band),
    }))
}
