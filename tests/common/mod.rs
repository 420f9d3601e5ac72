#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use trendwatch::market_data::{Bar, BarSeries, Resolution};

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Neutral candles (open == close) with a 1% range and steady volume
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .map(|&c| Bar::new(start_time(), c, c * 1.01, c * 0.99, c, 100.0).unwrap())
        .collect()
}

pub fn ramp(start: f64, step: f64, len: usize) -> Vec<f64> {
    (0..len).map(|i| start + step * i as f64).collect()
}

pub fn series(symbol: &str, resolution: Resolution, bars: Vec<Bar>) -> BarSeries {
    let step = Duration::minutes(resolution.minutes() as i64);
    let bars = bars
        .into_iter()
        .enumerate()
        .map(|(i, mut b)| {
            b.open_time = start_time() + step * i as i32;
            b
        })
        .collect();
    BarSeries::new(symbol, resolution, bars)
}

pub fn uptrend(symbol: &str, resolution: Resolution) -> BarSeries {
    series(symbol, resolution, bars_from_closes(&ramp(100.0, 1.0, 50)))
}

pub fn downtrend(symbol: &str, resolution: Resolution) -> BarSeries {
    series(symbol, resolution, bars_from_closes(&ramp(150.0, -1.0, 50)))
}

pub fn flat(symbol: &str, resolution: Resolution) -> BarSeries {
    series(symbol, resolution, bars_from_closes(&[100.0; 50]))
}

/// Slow uptrend ending in a wide green candle on four times the usual volume
///
/// Breaks the 10-bar resistance with volume confirmation and qualifies as an
/// impulse candle; nothing else weighted fires.
pub fn breakout_uptrend(symbol: &str, resolution: Resolution) -> BarSeries {
    let mut bars: Vec<Bar> = ramp(100.0, 0.1, 49)
        .into_iter()
        .map(|c| Bar::new(start_time(), c, c + 0.2, c - 0.2, c, 10.0).unwrap())
        .collect();
    bars.push(Bar::new(start_time(), 104.8, 107.0, 104.7, 106.9, 40.0).unwrap());
    series(symbol, resolution, bars)
}
