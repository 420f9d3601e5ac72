use crate::error::SignalError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sampling interval of a bar series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minutes5,
    #[serde(rename = "15m")]
    Minutes15,
    #[serde(rename = "30m")]
    Minutes30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "2h")]
    Hours2,
    #[serde(rename = "4h")]
    Hours4,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "1w")]
    Week1,
}

impl Resolution {
    pub const ALL: [Resolution; 9] = [
        Resolution::Minute1,
        Resolution::Minutes5,
        Resolution::Minutes15,
        Resolution::Minutes30,
        Resolution::Hour1,
        Resolution::Hours2,
        Resolution::Hours4,
        Resolution::Day1,
        Resolution::Week1,
    ];

    /// Interval string understood by the market-data provider
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Minute1 => "1m",
            Resolution::Minutes5 => "5m",
            Resolution::Minutes15 => "15m",
            Resolution::Minutes30 => "30m",
            Resolution::Hour1 => "1h",
            Resolution::Hours2 => "2h",
            Resolution::Hours4 => "4h",
            Resolution::Day1 => "1d",
            Resolution::Week1 => "1w",
        }
    }

    pub fn minutes(&self) -> u32 {
        match self {
            Resolution::Minute1 => 1,
            Resolution::Minutes5 => 5,
            Resolution::Minutes15 => 15,
            Resolution::Minutes30 => 30,
            Resolution::Hour1 => 60,
            Resolution::Hours2 => 120,
            Resolution::Hours4 => 240,
            Resolution::Day1 => 1_440,
            Resolution::Week1 => 10_080,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resolution::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| SignalError::Configuration(format!("unknown resolution '{}'", s)))
    }
}

/// Candle color relative to its open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleColor {
    Green,
    Red,
    Neutral, // close == open
}

/// One OHLCV sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Create a bar, rejecting samples that violate the OHLC invariants
    pub fn new(
        open_time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, SignalError> {
        for (name, price) in [("open", open), ("high", high), ("low", low), ("close", close)] {
            if !price.is_finite() || price <= 0.0 {
                return Err(SignalError::InvalidBar(format!(
                    "{} must be a positive number, got {}",
                    name, price
                )));
            }
        }
        if !volume.is_finite() || volume < 0.0 {
            return Err(SignalError::InvalidBar(format!(
                "volume must be non-negative, got {}",
                volume
            )));
        }
        if low > open.min(close) || high < open.max(close) || low > high {
            return Err(SignalError::InvalidBar(format!(
                "OHLC out of order: o={} h={} l={} c={}",
                open, high, low, close
            )));
        }

        Ok(Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// Absolute candle body `|close - open|`
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Full candle range `high - low`
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn color(&self) -> CandleColor {
        if self.close > self.open {
            CandleColor::Green
        } else if self.close < self.open {
            CandleColor::Red
        } else {
            CandleColor::Neutral
        }
    }

    pub fn is_green(&self) -> bool {
        self.color() == CandleColor::Green
    }

    pub fn is_red(&self) -> bool {
        self.color() == CandleColor::Red
    }
}

/// Time-ordered bars for one (instrument, resolution) pair, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub symbol: String,
    pub resolution: Resolution,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, resolution: Resolution, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            resolution,
            bars,
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Last `n` bars (or the whole series when shorter)
    pub fn tail(&self, n: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }
}
