use crate::error::{SignalError, require_bars};
use crate::market_data::Bar;
use crate::signals::utils::SignalUtils;
use crate::trend::Direction;
use serde::{Deserialize, Serialize};

/// Closing-price bounds over a trailing window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: f64,
    pub resistance: f64,
}

/// Which bound a breakout went through, with its price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "bound", content = "level", rename_all = "lowercase")]
pub enum BrokenLevel {
    Resistance(f64), // Close above the recent high close
    Support(f64),    // Close below the recent low close
}

impl BrokenLevel {
    pub fn price(&self) -> f64 {
        match self {
            BrokenLevel::Resistance(level) | BrokenLevel::Support(level) => *level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakout {
    pub direction: Direction,
    pub level: BrokenLevel,
}

/// Min and max close over the last `window` bars, latest included
pub fn support_resistance(bars: &[Bar], window: usize) -> Result<SupportResistance, SignalError> {
    require_bars("support_resistance", window.max(1), bars.len())?;
    Ok(bounds(&bars[bars.len() - window.max(1)..]))
}

fn bounds(bars: &[Bar]) -> SupportResistance {
    let support = bars.iter().map(|b| b.close).fold(f64::INFINITY, f64::min);
    let resistance = bars.iter().map(|b| b.close).fold(f64::NEG_INFINITY, f64::max);
    SupportResistance {
        support,
        resistance,
    }
}

/// Detect a volume-confirmed close through the trailing bound in the trend direction
///
/// The bound is computed over the `window` bars preceding the latest one, so the
/// latest close can actually exceed it.
pub fn detect_breakout(
    bars: &[Bar],
    window: usize,
    volume_window: usize,
    volume_multiplier: f64,
    trend: Direction,
) -> Result<Option<Breakout>, SignalError> {
    let window = window.max(1);
    let volume_window = volume_window.max(1);
    require_bars("breakout", window.max(volume_window).saturating_add(1), bars.len())?;

    let latest = &bars[bars.len() - 1];
    let prior = bounds(&bars[bars.len() - 1 - window..bars.len() - 1]);

    let level = match trend {
        Direction::Up if latest.close > prior.resistance => BrokenLevel::Resistance(prior.resistance),
        Direction::Down if latest.close < prior.support => BrokenLevel::Support(prior.support),
        _ => return Ok(None),
    };

    let average = SignalUtils::trailing_volume_mean(bars, volume_window).unwrap_or(0.0);
    if !SignalUtils::volume_confirms(latest.volume, average, volume_multiplier) {
        return Ok(None);
    }

    Ok(Some(Breakout {
        direction: trend,
        level,
    }))
}
