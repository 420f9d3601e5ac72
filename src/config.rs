use crate::error::SignalError;
use crate::market_data::Resolution;
use crate::retracement::RetracementBand;
use crate::signals::alignment::AlignmentPolicy;
use crate::signals::coordinator::CoordinatorConfig;
use crate::elliott::FIBONACCI_RATIOS;
use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_instruments")]
    pub instruments: Vec<String>,
    #[serde(default = "default_resolutions")]
    pub resolutions: Vec<Resolution>,
    /// Bars requested per (instrument, resolution)
    #[serde(default = "default_bar_count")]
    pub bar_count: usize,
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    /// Instruments evaluated in parallel, bounded to respect provider rate limits
    #[serde(default = "default_max_concurrent_instruments")]
    pub max_concurrent_instruments: usize,
    #[serde(default)]
    pub alignment_policy: AlignmentPolicy,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub scoring: CoordinatorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_notify_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Also alert on aligned instruments whose score produced no suggestion
    #[serde(default = "default_true")]
    pub notify_without_suggestion: bool,
}

/// Thresholds, windows and multipliers for the indicator library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    /// `N` in `sign(close[-1] - close[-1 - N])`
    #[serde(default = "default_trend_lookback")]
    pub trend_lookback: usize,
    #[serde(default = "default_ma_window")]
    pub ma_window: usize,
    #[serde(default = "default_ma_proximity")]
    pub ma_proximity_threshold: f64,
    #[serde(default = "default_retracement_lookback")]
    pub retracement_lookback: usize,
    #[serde(default)]
    pub retracement_band: RetracementBand,
    #[serde(default = "default_doji_body_ratio")]
    pub doji_body_ratio: f64,
    #[serde(default = "default_narrow_range_lookback")]
    pub narrow_range_lookback: usize,
    #[serde(default = "default_narrow_range_percentile")]
    pub narrow_range_percentile: usize,
    #[serde(default = "default_volume_window")]
    pub volume_window: usize,
    #[serde(default = "default_volume_multiplier")]
    pub volume_spike_multiplier: f64,
    #[serde(default = "default_low_spread")]
    pub low_spread_threshold: f64,
    #[serde(default = "default_support_resistance_window")]
    pub support_resistance_window: usize,
    #[serde(default = "default_volume_multiplier")]
    pub breakout_volume_multiplier: f64,
    #[serde(default = "default_impulse_body_ratio")]
    pub impulse_body_ratio: f64,
    #[serde(default = "default_volume_multiplier")]
    pub impulse_volume_multiplier: f64,
    #[serde(default = "default_opposite_candle_window")]
    pub opposite_candle_window: usize,
    #[serde(default = "default_opposite_candle_min")]
    pub opposite_candle_min: usize,
    #[serde(default = "default_fib_window")]
    pub fib_window: usize,
    #[serde(default = "default_fib_tolerance")]
    pub fib_tolerance: f64,
    #[serde(default = "default_fib_ratios")]
    pub fib_ratios: Vec<f64>,
}

/// Which resolutions run the resolution-restricted indicators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_short_resolutions")]
    pub volume_spike_resolutions: Vec<Resolution>,
    #[serde(default = "default_low_spread_resolutions")]
    pub low_spread_resolutions: Vec<Resolution>,
    #[serde(default = "default_long_resolutions")]
    pub support_resistance_resolutions: Vec<Resolution>,
    #[serde(default = "default_long_resolutions")]
    pub retracement_resolutions: Vec<Resolution>,
    #[serde(default = "default_long_resolutions")]
    pub wave_resolutions: Vec<Resolution>,
}

fn default_instruments() -> Vec<String> {
    [
        "BTCUSDT", "ETHUSDT", "SOLUSDT", "LTCUSDT", "BCHUSDT", "XRPUSDT", "BNBUSDT", "HBARUSDT",
        "ADAUSDT",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_resolutions() -> Vec<Resolution> {
    vec![
        Resolution::Minutes5,
        Resolution::Minutes15,
        Resolution::Minutes30,
        Resolution::Hour1,
        Resolution::Hours4,
        Resolution::Day1,
    ]
}

fn default_short_resolutions() -> Vec<Resolution> {
    vec![Resolution::Minutes5, Resolution::Minutes15, Resolution::Minutes30]
}

fn default_low_spread_resolutions() -> Vec<Resolution> {
    vec![Resolution::Minutes5]
}

fn default_long_resolutions() -> Vec<Resolution> {
    vec![Resolution::Hour1, Resolution::Hours4, Resolution::Day1]
}

fn default_bar_count() -> usize {
    50 // enough for two MA-20 windows plus lookback
}

fn default_cycle_interval_secs() -> u64 {
    60
}

fn default_max_concurrent_instruments() -> usize {
    4
}

fn default_provider_base_url() -> String {
    "https://api.binance.com".to_string()
}

fn default_notify_url() -> String {
    "https://ntfy.sh/tendencial".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_trend_lookback() -> usize {
    20
}
fn default_ma_window() -> usize {
    20
}
fn default_ma_proximity() -> f64 {
    0.005 // 0.5% from the MA
}
fn default_retracement_lookback() -> usize {
    5
}
fn default_doji_body_ratio() -> f64 {
    0.1
}
fn default_narrow_range_lookback() -> usize {
    20
}
fn default_narrow_range_percentile() -> usize {
    25
}
fn default_volume_window() -> usize {
    20
}
fn default_volume_multiplier() -> f64 {
    1.5
}
fn default_low_spread() -> f64 {
    0.001 // 0.1% of price
}
fn default_support_resistance_window() -> usize {
    10
}
fn default_impulse_body_ratio() -> f64 {
    0.7
}
fn default_opposite_candle_window() -> usize {
    3
}
fn default_opposite_candle_min() -> usize {
    3
}
fn default_fib_window() -> usize {
    3
}
fn default_fib_tolerance() -> f64 {
    0.01
}
fn default_fib_ratios() -> Vec<f64> {
    FIBONACCI_RATIOS.to_vec()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_notify_url(),
            timeout_secs: default_timeout_secs(),
            notify_without_suggestion: true,
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            trend_lookback: default_trend_lookback(),
            ma_window: default_ma_window(),
            ma_proximity_threshold: default_ma_proximity(),
            retracement_lookback: default_retracement_lookback(),
            retracement_band: RetracementBand::default(),
            doji_body_ratio: default_doji_body_ratio(),
            narrow_range_lookback: default_narrow_range_lookback(),
            narrow_range_percentile: default_narrow_range_percentile(),
            volume_window: default_volume_window(),
            volume_spike_multiplier: default_volume_multiplier(),
            low_spread_threshold: default_low_spread(),
            support_resistance_window: default_support_resistance_window(),
            breakout_volume_multiplier: default_volume_multiplier(),
            impulse_body_ratio: default_impulse_body_ratio(),
            impulse_volume_multiplier: default_volume_multiplier(),
            opposite_candle_window: default_opposite_candle_window(),
            opposite_candle_min: default_opposite_candle_min(),
            fib_window: default_fib_window(),
            fib_tolerance: default_fib_tolerance(),
            fib_ratios: default_fib_ratios(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            volume_spike_resolutions: default_short_resolutions(),
            low_spread_resolutions: default_low_spread_resolutions(),
            support_resistance_resolutions: default_long_resolutions(),
            retracement_resolutions: default_long_resolutions(),
            wave_resolutions: default_long_resolutions(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            instruments: default_instruments(),
            resolutions: default_resolutions(),
            bar_count: default_bar_count(),
            cycle_interval_secs: default_cycle_interval_secs(),
            max_concurrent_instruments: default_max_concurrent_instruments(),
            alignment_policy: AlignmentPolicy::default(),
            provider: ProviderConfig::default(),
            notifier: NotifierConfig::default(),
            indicators: IndicatorConfig::default(),
            evaluation: EvaluationConfig::default(),
            scoring: CoordinatorConfig::default(),
        }
    }
}

impl IndicatorConfig {
    /// Bars each indicator needs, `None` when the window arithmetic overflows
    pub fn history_requirements(&self) -> [(&'static str, Option<usize>); 8] {
        [
            ("trend_lookback", self.trend_lookback.checked_add(1)),
            ("ma_window", self.ma_window.checked_mul(2)),
            ("narrow_range_lookback", self.narrow_range_lookback.checked_add(1)),
            ("volume_window", self.volume_window.checked_add(1)),
            (
                "support_resistance_window",
                self.support_resistance_window.max(self.volume_window).checked_add(1),
            ),
            ("retracement_lookback", Some(self.retracement_lookback)),
            ("opposite_candle_window", Some(self.opposite_candle_window)),
            ("fib_window", Some(self.fib_window)),
        ]
    }

    pub fn validate(&self) -> Result<(), SignalError> {
        let windows = [
            ("trend_lookback", self.trend_lookback),
            ("ma_window", self.ma_window),
            ("retracement_lookback", self.retracement_lookback),
            ("narrow_range_lookback", self.narrow_range_lookback),
            ("volume_window", self.volume_window),
            ("support_resistance_window", self.support_resistance_window),
            ("opposite_candle_window", self.opposite_candle_window),
        ];
        for (name, window) in windows {
            if window == 0 {
                return Err(SignalError::Configuration(format!("{} must be at least 1", name)));
            }
        }
        if self.fib_window < 3 {
            return Err(SignalError::Configuration(format!(
                "fib_window must be at least 3, got {}",
                self.fib_window
            )));
        }
        if self.narrow_range_percentile > 100 {
            return Err(SignalError::Configuration(format!(
                "narrow_range_percentile must be within 0..=100, got {}",
                self.narrow_range_percentile
            )));
        }
        if self.opposite_candle_min == 0 || self.opposite_candle_min > self.opposite_candle_window {
            return Err(SignalError::Configuration(format!(
                "opposite_candle_min must be within 1..={}, got {}",
                self.opposite_candle_window, self.opposite_candle_min
            )));
        }

        let positives = [
            ("ma_proximity_threshold", self.ma_proximity_threshold),
            ("doji_body_ratio", self.doji_body_ratio),
            ("volume_spike_multiplier", self.volume_spike_multiplier),
            ("low_spread_threshold", self.low_spread_threshold),
            ("breakout_volume_multiplier", self.breakout_volume_multiplier),
            ("impulse_body_ratio", self.impulse_body_ratio),
            ("impulse_volume_multiplier", self.impulse_volume_multiplier),
            ("fib_tolerance", self.fib_tolerance),
        ];
        for (name, value) in positives {
            if !value.is_finite() || value <= 0.0 {
                return Err(SignalError::Configuration(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        for (name, ratio) in [("doji_body_ratio", self.doji_body_ratio), ("impulse_body_ratio", self.impulse_body_ratio)] {
            if ratio > 1.0 {
                return Err(SignalError::Configuration(format!(
                    "{} is a body/range ratio and must not exceed 1, got {}",
                    name, ratio
                )));
            }
        }

        let band = self.retracement_band;
        if !(0.0..=1.0).contains(&band.min) || !(0.0..=1.0).contains(&band.max) || band.min > band.max {
            return Err(SignalError::Configuration(format!(
                "retracement band must satisfy 0 <= min <= max <= 1, got [{}, {}]",
                band.min, band.max
            )));
        }
        if self.fib_ratios.is_empty() || self.fib_ratios.iter().any(|r| !(0.0..=1.0).contains(r)) {
            return Err(SignalError::Configuration(
                "fib_ratios must be a non-empty list of ratios within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

impl MonitorConfig {
    /// Load from a JSON file, falling back to defaults when the file does not exist
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let config_str = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            Self::from_json(&config_str)
                .with_context(|| format!("invalid config file {}", path.display()))?
        } else {
            warn!("Config file {} not found, using defaults", path.display());
            Self::default()
        };

        config.validate()?;
        info!(
            "Loaded config: {} instruments, resolutions [{}], alignment {:?}",
            config.instruments.len(),
            config
                .resolutions
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            config.alignment_policy
        );
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.instruments.is_empty() {
            return Err(SignalError::Configuration("instrument list is empty".to_string()));
        }
        if self.resolutions.is_empty() {
            return Err(SignalError::Configuration("resolution list is empty".to_string()));
        }
        let mut seen = Vec::with_capacity(self.resolutions.len());
        for resolution in &self.resolutions {
            if seen.contains(resolution) {
                return Err(SignalError::Configuration(format!(
                    "resolution {} listed twice",
                    resolution
                )));
            }
            seen.push(*resolution);
        }
        if self.bar_count == 0 {
            return Err(SignalError::Configuration("bar_count must be at least 1".to_string()));
        }
        if self.cycle_interval_secs == 0 {
            return Err(SignalError::Configuration(
                "cycle_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_instruments == 0 {
            return Err(SignalError::Configuration(
                "max_concurrent_instruments must be at least 1".to_string(),
            ));
        }
        if self.provider.timeout_secs == 0 || self.notifier.timeout_secs == 0 {
            return Err(SignalError::Configuration("HTTP timeouts must be at least 1s".to_string()));
        }

        self.indicators.validate()?;
        for (name, required) in self.indicators.history_requirements() {
            match required {
                Some(required) if required <= self.bar_count => {}
                Some(required) => {
                    return Err(SignalError::Configuration(format!(
                        "{} needs {} bars but bar_count is {}",
                        name, required, self.bar_count
                    )));
                }
                None => {
                    return Err(SignalError::Configuration(format!("{} is too large", name)));
                }
            }
        }
        self.scoring.validate()?;
        Ok(())
    }
}
