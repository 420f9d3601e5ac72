//! Alert rendering and delivery
//!
//! `AlertFormatter` turns an aligned `AggregationResult` into a short
//! plain-text alert; a `NotificationSink` delivers it. `NtfySink` posts to an
//! ntfy topic, carrying title, priority and tags as headers.

use crate::config::{MonitorConfig, NotifierConfig};
use crate::retracement::RetracementBand;
use crate::signals::{AggregationResult, ConfidenceTier, Signal};
use crate::trend::Direction;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

/// Delivery priority, mapped from the suggestion tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Low,
    Default,
    High,
    Urgent,
}

impl AlertPriority {
    pub fn from_tier(tier: Option<ConfidenceTier>) -> Self {
        match tier {
            None => AlertPriority::Low,
            Some(ConfidenceTier::Low) => AlertPriority::Default,
            Some(ConfidenceTier::Medium) => AlertPriority::High,
            Some(ConfidenceTier::High) => AlertPriority::Urgent,
        }
    }

    /// ntfy header value
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertPriority::Low => "low",
            AlertPriority::Default => "default",
            AlertPriority::High => "high",
            AlertPriority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub body: String,
    pub priority: AlertPriority,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AlertFormatter {
    notify_without_suggestion: bool,
    /// Band the retracement signals were checked against, shown in the alert
    retracement_band: RetracementBand,
}

impl AlertFormatter {
    pub fn new(notify_without_suggestion: bool, retracement_band: RetracementBand) -> Self {
        Self {
            notify_without_suggestion,
            retracement_band,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            config.notifier.notify_without_suggestion,
            config.indicators.retracement_band,
        )
    }

    /// Render an alert for an aligned result
    ///
    /// Returns `None` when the instrument is not aligned, or when it produced
    /// no suggestion and such results are not being reported.
    pub fn render(&self, result: &AggregationResult) -> Option<Alert> {
        let direction = result.trend.filter(|_| result.aligned)?;
        let suggestion = result.suggestion();
        if suggestion.is_none() && !self.notify_without_suggestion {
            return None;
        }

        let trend_word = match direction {
            Direction::Up => "uptrend",
            Direction::Down => "downtrend",
        };
        let title = format!("{} {}", result.symbol, trend_word);

        let mut lines = vec!["Trend aligned across timeframes".to_string()];
        self.push_listed(&mut lines, result, "Near MA on", |s| {
            matches!(s, Signal::NearMovingAverage)
        });

        let retracements: Vec<String> = result
            .signals
            .iter()
            .filter_map(|s| match s.signal {
                Signal::Retracement { ratio } => {
                    Some(format!("{} ({:.0}%)", s.resolution, ratio * 100.0))
                }
                _ => None,
            })
            .collect();
        if !retracements.is_empty() {
            lines.push(format!(
                "Retracement {:.0}-{:.0}% on: {}",
                self.retracement_band.min * 100.0,
                self.retracement_band.max * 100.0,
                retracements.join(", ")
            ));
        }

        let opposite_color = match direction {
            Direction::Up => "red",
            Direction::Down => "green",
        };
        self.push_listed(
            &mut lines,
            result,
            &format!("3+ {} candles (pullback) on", opposite_color),
            |s| matches!(s, Signal::OppositeCandles { .. }),
        );
        self.push_listed(&mut lines, result, "Doji on", |s| matches!(s, Signal::Doji));
        self.push_listed(&mut lines, result, "Narrow range on", |s| {
            matches!(s, Signal::NarrowRange)
        });
        self.push_listed(&mut lines, result, "High volume on", |s| {
            matches!(s, Signal::VolumeSpike)
        });
        self.push_listed(&mut lines, result, "Low spread on", |s| matches!(s, Signal::LowSpread));

        for s in &result.signals {
            match &s.signal {
                Signal::Breakout(breakout) => {
                    let side = match breakout.direction {
                        Direction::Up => "above resistance",
                        Direction::Down => "below support",
                    };
                    lines.push(format!(
                        "Breakout {} {} ({})",
                        side,
                        price(breakout.level.price()),
                        s.resolution
                    ));
                }
                Signal::Impulse(impulse) => lines.push(format!(
                    "Impulse candle on {} (body {:.0}%)",
                    s.resolution,
                    impulse.body_ratio * 100.0
                )),
                Signal::FibonacciLevel { level } => {
                    lines.push(format!("Fibonacci {} level holding ({})", level, s.resolution))
                }
                _ => {}
            }
        }
        self.push_listed(&mut lines, result, "Wave 3 structure on", |s| {
            matches!(s, Signal::WaveThree)
        });

        if let Some(score) = &result.score {
            let mut line = format!(
                "Score: long {:.1} / short {:.1}",
                score.long_score, score.short_score
            );
            match &score.suggestion {
                Some(suggestion) => {
                    let side = match suggestion.direction {
                        Direction::Up => "LONG",
                        Direction::Down => "SHORT",
                    };
                    let _ = write!(
                        line,
                        " -> {} {:.1} ({:?} confidence, {:.0}%)",
                        side,
                        suggestion.score,
                        suggestion.tier,
                        suggestion.confidence * 100.0
                    );
                }
                None => line.push_str(" -> no suggestion"),
            }
            lines.push(line);
        }

        if !result.levels.is_empty() {
            lines.push(String::new());
            lines.push("Support/Resistance".to_string());
            for (resolution, sr) in &result.levels {
                lines.push(format!(
                    "{}: S={} R={}",
                    resolution,
                    price(sr.support),
                    price(sr.resistance)
                ));
            }
        }

        let tier = suggestion.map(|s| s.tier);
        let mut tags = vec![
            match direction {
                Direction::Up => "chart_with_upwards_trend".to_string(),
                Direction::Down => "chart_with_downwards_trend".to_string(),
            },
        ];
        if let Some(tier) = tier {
            tags.push(format!("{:?}", tier).to_lowercase());
        }

        Some(Alert {
            title,
            body: lines.join("\n"),
            priority: AlertPriority::from_tier(tier),
            tags,
        })
    }

    fn push_listed<F>(&self, lines: &mut Vec<String>, result: &AggregationResult, label: &str, predicate: F)
    where
        F: Fn(&Signal) -> bool,
    {
        let resolutions = result.resolutions_with(predicate);
        if resolutions.is_empty() {
            return;
        }
        let names: Vec<&str> = resolutions.iter().map(|r| r.as_str()).collect();
        lines.push(format!("{}: {}", label, names.join(", ")));
    }
}

impl Default for AlertFormatter {
    fn default() -> Self {
        Self::new(true, RetracementBand::default())
    }
}

fn price(value: f64) -> String {
    if value >= 1.0 {
        format!("{:.2}", value)
    } else {
        format!("{:.6}", value)
    }
}

/// Destination for rendered alerts
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, alert: &Alert) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct NtfySink {
    http: Client,
    url: String,
}

impl NtfySink {
    pub fn new(config: &NotifierConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl NotificationSink for NtfySink {
    async fn deliver(&self, alert: &Alert) -> Result<()> {
        let response = self
            .http
            .post(&self.url)
            .header("Title", alert.title.as_str())
            .header("Priority", alert.priority.as_str())
            .header("Tags", alert.tags.join(","))
            .body(alert.body.clone())
            .send()
            .await
            .with_context(|| format!("failed to post alert to {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("ntfy rejected alert with status {}", status);
        }
        debug!("delivered alert '{}'", alert.title);
        Ok(())
    }
}
