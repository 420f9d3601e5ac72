//! Error taxonomy for the signal engine
//!
//! Degenerate numeric inputs (zero range, zero moving average, flat windows)
//! are not errors: the affected condition simply evaluates to false.

use crate::market_data::Resolution;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    /// Series too short for the requested indicator
    #[error("insufficient data for {indicator}: need {required} bars, got {available}")]
    InsufficientData {
        indicator: &'static str,
        required: usize,
        available: usize,
    },

    #[error("invalid bar: {0}")]
    InvalidBar(String),

    /// The provider could not supply a required resolution
    #[error("failed to fetch {symbol} {resolution}: {reason}")]
    FetchFailure {
        symbol: String,
        resolution: Resolution,
        reason: String,
    },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SignalError {
    pub(crate) fn insufficient(indicator: &'static str, required: usize, available: usize) -> Self {
        Self::InsufficientData {
            indicator,
            required,
            available,
        }
    }

    /// Whether the error only degrades a single indicator
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

/// Guard used by every indicator before touching the tail of a series
pub(crate) fn require_bars(
    indicator: &'static str,
    required: usize,
    available: usize,
) -> Result<(), SignalError> {
    if available < required {
        return Err(SignalError::insufficient(indicator, required, available));
    }
    Ok(())
}
