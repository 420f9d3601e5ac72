//! Trend and moving-average indicators

use crate::error::{SignalError, require_bars};
use crate::market_data::Bar;
use crate::signals::utils::SignalUtils;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-timeframe trend vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl TrendDirection {
    /// Non-flat projection of the vote
    pub fn direction(&self) -> Option<Direction> {
        match self {
            TrendDirection::Up => Some(Direction::Up),
            TrendDirection::Down => Some(Direction::Down),
            TrendDirection::Flat => None,
        }
    }
}

/// A directional side: the aligned trend, or the side a signal supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

impl From<Direction> for TrendDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => TrendDirection::Up,
            Direction::Down => TrendDirection::Down,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaDirection {
    Rising,
    Falling,
    Flat,
}

/// `sign(close[-1] - close[-1 - lookback])`, ties are flat
pub fn trend_direction(bars: &[Bar], lookback: usize) -> Result<TrendDirection, SignalError> {
    require_bars("trend_direction", lookback.saturating_add(1), bars.len())?;

    let latest = bars[bars.len() - 1].close;
    let reference = bars[bars.len() - 1 - lookback].close;

    Ok(if latest > reference {
        TrendDirection::Up
    } else if latest < reference {
        TrendDirection::Down
    } else {
        TrendDirection::Flat
    })
}

/// Simple moving average of the last `window` closes
pub fn moving_average(bars: &[Bar], window: usize) -> Result<f64, SignalError> {
    require_bars("moving_average", window.max(1), bars.len())?;
    let closes: Vec<f64> = bars[bars.len() - window..].iter().map(|b| b.close).collect();
    SignalUtils::mean(&closes).ok_or_else(|| SignalError::insufficient("moving_average", 1, 0))
}

/// Compare the latest `window` MA to the MA of the `window` bars before it
pub fn moving_average_direction(bars: &[Bar], window: usize) -> Result<MaDirection, SignalError> {
    require_bars("moving_average_direction", window.max(1).saturating_mul(2), bars.len())?;

    let current = moving_average(bars, window)?;
    let previous = moving_average(&bars[..bars.len() - window], window)?;

    Ok(if current > previous {
        MaDirection::Rising
    } else if current < previous {
        MaDirection::Falling
    } else {
        MaDirection::Flat
    })
}

/// `|close - MA| / MA < threshold`; a zero MA is never "near"
pub fn near_moving_average(bars: &[Bar], window: usize, threshold: f64) -> Result<bool, SignalError> {
    let ma = moving_average(bars, window)?;
    if ma == 0.0 {
        return Ok(false);
    }
    let close = bars[bars.len() - 1].close;
    Ok((close - ma).abs() / ma < threshold)
}
