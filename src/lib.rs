//! Multi-timeframe trend alignment and scoring
//!
//! Bars for several resolutions of one instrument go in; an
//! `AggregationResult` comes out, saying whether the trends agree, which
//! corroborating signals fired and which side (if any) scores strongly
//! enough to suggest.

pub mod breakout;
pub mod candles;
pub mod config;
pub mod elliott;
pub mod engine;
pub mod error;
pub mod market_data;
pub mod notify;
pub mod provider;
pub mod retracement;
pub mod scheduler;
pub mod signals;
pub mod trend;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::TrendEngine;
pub use error::SignalError;
