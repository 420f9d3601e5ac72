//! Elliott-wave and Fibonacci retracement heuristics
//!
//! Both checks are shape heuristics over a handful of closes, not a wave count.
//! They are independent and may fire together.

use crate::error::{SignalError, require_bars};
use crate::market_data::Bar;
use crate::trend::Direction;
use serde::{Deserialize, Serialize};

pub const FIBONACCI_RATIOS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];

const WAVE_POINTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveSignal {
    /// Five-point impulse shape ending in a possible third wave; `None` when
    /// there were too few closes to check
    pub wave_three: Option<bool>,
    /// Fibonacci ratio the latest close sits on after an ABC pullback. `None`
    /// covers both "no level matched" and a window too short to check.
    pub fib_level: Option<f64>,
}

impl WaveSignal {
    pub fn matched(&self) -> bool {
        self.wave_three == Some(true) || self.fib_level.is_some()
    }
}

/// Five-close impulse: endpoints and midpoint advance, points 2 and 4 are local extremes
pub fn detect_wave_three(bars: &[Bar], trend: Direction) -> Result<bool, SignalError> {
    require_bars("wave_three", WAVE_POINTS, bars.len())?;

    let c: Vec<f64> = bars[bars.len() - WAVE_POINTS..].iter().map(|b| b.close).collect();
    let matched = match trend {
        Direction::Up => {
            c[0] < c[2] && c[2] < c[4] && c[1] > c[0].max(c[2]) && c[3] > c[2].max(c[4])
        }
        Direction::Down => {
            c[0] > c[2] && c[2] > c[4] && c[1] < c[0].min(c[2]) && c[3] < c[2].min(c[4])
        }
    };
    Ok(matched)
}

/// Price levels for each ratio, measured back from the swing extreme in the trend direction
pub fn fibonacci_levels(high: f64, low: f64, ratios: &[f64], trend: Direction) -> Vec<(f64, f64)> {
    let swing = high - low;
    ratios
        .iter()
        .map(|&ratio| {
            let level = match trend {
                Direction::Up => high - swing * ratio,
                Direction::Down => low + swing * ratio,
            };
            (ratio, level)
        })
        .collect()
}

/// Match the latest close to a Fibonacci level after a dip-then-recover ("ABC") shape
pub fn match_fibonacci_level(
    bars: &[Bar],
    window: usize,
    tolerance: f64,
    ratios: &[f64],
    trend: Direction,
) -> Result<Option<f64>, SignalError> {
    let window = window.max(3);
    require_bars("fibonacci", window, bars.len())?;

    let recent = &bars[bars.len() - window..];
    let n = recent.len();
    let (a, b, c) = (recent[n - 3].close, recent[n - 2].close, recent[n - 1].close);
    let abc = match trend {
        Direction::Up => b < a && c > b,
        Direction::Down => b > a && c < b,
    };
    if !abc {
        return Ok(None);
    }

    let high = recent.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = recent.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    if high <= low {
        return Ok(None);
    }

    Ok(fibonacci_levels(high, low, ratios, trend)
        .into_iter()
        .find(|&(_, level)| level > 0.0 && (c - level).abs() / level <= tolerance)
        .map(|(ratio, _)| ratio))
}

pub fn detect_wave(
    bars: &[Bar],
    fib_window: usize,
    tolerance: f64,
    ratios: &[f64],
    trend: Direction,
) -> Result<WaveSignal, SignalError> {
    // Both checks degrade independently; only fail when neither can run
    let wave_three = detect_wave_three(bars, trend);
    let fib_level = match_fibonacci_level(bars, fib_window, tolerance, ratios, trend);

    match (wave_three, fib_level) {
        (Err(e), Err(_)) => Err(e),
        (wave_three, fib_level) => Ok(WaveSignal {
            wave_three: wave_three.ok(),
            fib_level: fib_level.unwrap_or(None),
        }),
    }
}
