//! Core signal data structures shared by the evaluator, alignment checker and coordinator

use crate::breakout::{Breakout, SupportResistance};
use crate::candles::Impulse;
use crate::elliott::WaveSignal;
use crate::error::SignalError;
use crate::market_data::Resolution;
use crate::retracement::Retracement;
use crate::trend::{Direction, MaDirection, TrendDirection};
use serde::{Deserialize, Serialize};

/// Discrete confidence bucket for a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

/// Everything the indicator library produced for one resolution
///
/// `None` means the indicator was not computed (too little history, not
/// enabled for this resolution, or not applicable without a trend).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeSignals {
    pub resolution: Resolution,
    pub trend: Option<TrendDirection>,
    pub moving_average: Option<f64>,
    pub ma_direction: Option<MaDirection>,
    pub near_moving_average: Option<bool>,
    pub retracement: Option<Retracement>,
    pub opposite_candles: Option<usize>,
    pub doji: Option<bool>,
    pub narrow_range: Option<bool>,
    pub volume_spike: Option<bool>,
    pub low_spread: Option<bool>,
    pub support_resistance: Option<SupportResistance>,
    pub breakout: Option<Breakout>,
    pub impulse: Option<Impulse>,
    pub wave: Option<WaveSignal>,
}

impl TimeframeSignals {
    /// Empty record: nothing computed yet
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            trend: None,
            moving_average: None,
            ma_direction: None,
            near_moving_average: None,
            retracement: None,
            opposite_candles: None,
            doji: None,
            narrow_range: None,
            volume_spike: None,
            low_spread: None,
            support_resistance: None,
            breakout: None,
            impulse: None,
            wave: None,
        }
    }

    /// Non-flat trend of this resolution, if any
    pub fn direction(&self) -> Option<Direction> {
        self.trend.and_then(|t| t.direction())
    }

    /// Whether this resolution takes part in the alignment vote
    pub fn votes(&self) -> bool {
        self.trend.is_some()
    }
}

/// A corroborating observation that can be rendered in an alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    NearMovingAverage,
    Retracement { ratio: f64 },
    OppositeCandles { count: usize },
    Doji,
    NarrowRange,
    VolumeSpike,
    LowSpread,
    Breakout(Breakout),
    Impulse(Impulse),
    WaveThree,
    FibonacciLevel { level: f64 },
}

impl Signal {
    pub fn label(&self) -> &'static str {
        match self {
            Signal::NearMovingAverage => "near MA",
            Signal::Retracement { .. } => "retracement",
            Signal::OppositeCandles { .. } => "opposite candles",
            Signal::Doji => "doji",
            Signal::NarrowRange => "narrow range",
            Signal::VolumeSpike => "volume spike",
            Signal::LowSpread => "low spread",
            Signal::Breakout(_) => "breakout",
            Signal::Impulse(_) => "impulse",
            Signal::WaveThree => "wave 3",
            Signal::FibonacciLevel { .. } => "fibonacci",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorroboratingSignal {
    pub resolution: Resolution,
    pub direction: Direction,
    pub signal: Signal,
}

/// Per-signal-type weights for the directional score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub breakout: f64,
    pub impulse: f64,
    pub elliott_fibonacci: f64,
    pub retracement: f64,
    pub ma_proximity: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            breakout: 3.0,
            impulse: 2.5,
            elliott_fibonacci: 3.5,
            retracement: 1.8,   // per timeframe showing a valid retracement
            ma_proximity: 0.8,  // per timeframe trading near its MA
        }
    }
}

impl SignalWeights {
    /// Weights must be finite and non-negative
    pub fn validate(&self) -> Result<(), SignalError> {
        let weights = [
            ("breakout", self.breakout),
            ("impulse", self.impulse),
            ("elliott_fibonacci", self.elliott_fibonacci),
            ("retracement", self.retracement),
            ("ma_proximity", self.ma_proximity),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(SignalError::Configuration(format!(
                    "weight '{}' must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub direction: Direction,
    /// Winning score clamped into the configured band
    pub score: f64,
    /// `score / max_score`, within `(0, 1]`
    pub confidence: f64,
    pub tier: ConfidenceTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub long_score: f64,
    pub short_score: f64,
    pub suggestion: Option<Suggestion>,
}

/// Terminal state of one instrument's evaluation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    NotAligned,
    NoSuggestion,
    Suggested(ConfidenceTier),
}

/// Final per-instrument output of one evaluation cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub symbol: String,
    pub aligned: bool,
    /// Agreed direction, `None` when not aligned
    pub trend: Option<Direction>,
    pub signals: Vec<CorroboratingSignal>,
    /// Support/resistance bounds from the aligned resolutions
    pub levels: Vec<(Resolution, SupportResistance)>,
    pub score: Option<ScoreCard>,
}

impl AggregationResult {
    pub fn not_aligned(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            aligned: false,
            trend: None,
            signals: Vec::new(),
            levels: Vec::new(),
            score: None,
        }
    }

    pub fn outcome(&self) -> CycleOutcome {
        if !self.aligned {
            return CycleOutcome::NotAligned;
        }
        match self.suggestion() {
            Some(suggestion) => CycleOutcome::Suggested(suggestion.tier),
            None => CycleOutcome::NoSuggestion,
        }
    }

    pub fn suggestion(&self) -> Option<&Suggestion> {
        self.score.as_ref().and_then(|s| s.suggestion.as_ref())
    }

    /// Resolutions on which a given kind of signal fired, in result order
    pub fn resolutions_with<F>(&self, predicate: F) -> Vec<Resolution>
    where
        F: Fn(&Signal) -> bool,
    {
        let mut resolutions: Vec<Resolution> = Vec::new();
        for s in self.signals.iter().filter(|s| predicate(&s.signal)) {
            if !resolutions.contains(&s.resolution) {
                resolutions.push(s.resolution);
            }
        }
        resolutions
    }
}
