//! Market data providers
//!
//! The engine only sees the `MarketDataProvider` trait; `BinanceProvider`
//! pulls OHLCV candles from the public klines endpoint.

use crate::config::ProviderConfig;
use crate::market_data::{Bar, BarSeries, Resolution};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Source of recent bars for an (instrument, resolution) pair
///
/// Implementations return bars oldest first. A response with fewer bars than
/// requested is not an error; indicators that need more history simply
/// report insufficient data.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_bars(&self, symbol: &str, resolution: Resolution, limit: usize) -> Result<BarSeries>;
}

#[derive(Debug, Clone)]
pub struct BinanceProvider {
    http: Client,
    base_url: String,
}

impl BinanceProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn klines_url(&self) -> String {
        format!("{}/api/v3/klines", self.base_url)
    }
}

#[async_trait]
impl MarketDataProvider for BinanceProvider {
    async fn fetch_bars(&self, symbol: &str, resolution: Resolution, limit: usize) -> Result<BarSeries> {
        let limit = limit.to_string();
        let response = self
            .http
            .get(self.klines_url())
            .query(&[
                ("symbol", symbol),
                ("interval", resolution.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("request for {} {} failed", symbol, resolution))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("klines API error {}: {}", status, body);
        }

        let rows: Vec<Vec<Value>> = response
            .json()
            .await
            .context("klines response is not an array of rows")?;
        let bars = parse_klines(&rows)?;
        debug!("{} {}: fetched {} bars", symbol, resolution, bars.len());

        Ok(BarSeries::new(symbol, resolution, bars))
    }
}

/// Convert raw kline rows into bars
///
/// Each row is `[open_time_ms, open, high, low, close, volume, ...]` with
/// prices and volume encoded as decimal strings.
pub fn parse_klines(rows: &[Vec<Value>]) -> Result<Vec<Bar>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| parse_kline(row).with_context(|| format!("malformed kline row {}", i)))
        .collect()
}

fn parse_kline(row: &[Value]) -> Result<Bar> {
    if row.len() < 6 {
        bail!("expected at least 6 fields, got {}", row.len());
    }

    let millis = row[0]
        .as_i64()
        .ok_or_else(|| anyhow!("open time is not an integer: {}", row[0]))?;
    let open_time: DateTime<Utc> = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| anyhow!("open time out of range: {}", millis))?;

    let bar = Bar::new(
        open_time,
        decimal(&row[1])?,
        decimal(&row[2])?,
        decimal(&row[3])?,
        decimal(&row[4])?,
        decimal(&row[5])?,
    )?;
    Ok(bar)
}

fn decimal(value: &Value) -> Result<f64> {
    match value {
        Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("not a decimal: {:?}", s)),
        Value::Number(n) => n.as_f64().ok_or_else(|| anyhow!("not a finite number: {}", n)),
        other => bail!("unexpected field type: {}", other),
    }
}
