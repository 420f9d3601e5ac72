//! Bar builders shared by the unit tests

use crate::market_data::{Bar, BarSeries, Resolution};
use chrono::{DateTime, Duration, Utc};

pub fn bar_v(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Bar {
    Bar::new(DateTime::<Utc>::default(), open, high, low, close, volume)
        .expect("test bar must satisfy OHLC invariants")
}

pub fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
    bar_v(open, high, low, close, 100.0)
}

pub fn flat_bar_with_volume(price: f64, volume: f64) -> Bar {
    bar_v(price, price, price, price, volume)
}

/// Neutral candles (open == close) with a 1% range around each close
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .map(|&c| bar(c, c * 1.01, c * 0.99, c))
        .collect()
}

/// Stamp consecutive open times onto `bars` and wrap them in a series
pub fn series(resolution: Resolution, bars: Vec<Bar>) -> BarSeries {
    let step = Duration::minutes(resolution.minutes() as i64);
    let start = DateTime::<Utc>::default();
    let bars = bars
        .into_iter()
        .enumerate()
        .map(|(i, mut b)| {
            b.open_time = start + step * i as i32;
            b
        })
        .collect();
    BarSeries::new("TEST", resolution, bars)
}

/// Linear ramp of `len` closes from `start` moving `step` per bar
pub fn ramp(start: f64, step: f64, len: usize) -> Vec<f64> {
    (0..len).map(|i| start + step * i as f64).collect()
}
