//! Signal Coordinator
//!
//! Scoring engine for aligned instruments: combines the corroborating signals of
//! the agreeing timeframes into weighted long/short scores and, when one side
//! clearly wins, a clamped confidence score with a discrete tier.

use super::core::{ConfidenceTier, ScoreCard, SignalWeights, Suggestion, TimeframeSignals};
use super::utils::SignalUtils;
use crate::error::SignalError;
use crate::trend::Direction;
use serde::{Deserialize, Serialize};

/// Configuration for signal scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    #[serde(default)]
    pub signal_weights: SignalWeights,
    /// Winning score must strictly exceed this to produce a suggestion
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    #[serde(default = "default_score_floor")]
    pub score_floor: f64,
    #[serde(default = "default_score_ceiling")]
    pub score_ceiling: f64,
    /// Lower bound (inclusive) of the high tier
    #[serde(default = "default_high_tier")]
    pub high_tier: f64,
    /// Lower bound (inclusive) of the medium tier
    #[serde(default = "default_medium_tier")]
    pub medium_tier: f64,
}

fn default_min_score() -> f64 {
    3.5
}
fn default_score_floor() -> f64 {
    1.0
}
fn default_score_ceiling() -> f64 {
    10.0
}
fn default_high_tier() -> f64 {
    8.0
}
fn default_medium_tier() -> f64 {
    6.0
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            signal_weights: SignalWeights::default(),
            min_score: default_min_score(),
            score_floor: default_score_floor(),
            score_ceiling: default_score_ceiling(),
            high_tier: default_high_tier(),
            medium_tier: default_medium_tier(),
        }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        self.signal_weights.validate()?;

        let bounds = [
            ("min_score", self.min_score),
            ("score_floor", self.score_floor),
            ("score_ceiling", self.score_ceiling),
            ("high_tier", self.high_tier),
            ("medium_tier", self.medium_tier),
        ];
        for (name, value) in bounds {
            if !value.is_finite() || value < 0.0 {
                return Err(SignalError::Configuration(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.score_floor <= 0.0 || self.score_floor >= self.score_ceiling {
            return Err(SignalError::Configuration(format!(
                "score band must satisfy 0 < floor < ceiling, got [{}, {}]",
                self.score_floor, self.score_ceiling
            )));
        }
        if self.medium_tier > self.high_tier {
            return Err(SignalError::Configuration(format!(
                "medium tier ({}) must not exceed high tier ({})",
                self.medium_tier, self.high_tier
            )));
        }
        Ok(())
    }
}

/// Scoring engine
#[derive(Debug, Clone)]
pub struct SignalCoordinator {
    config: CoordinatorConfig,
}

impl SignalCoordinator {
    /// Create new signal coordinator with default configuration
    pub fn new() -> Self {
        Self {
            config: CoordinatorConfig::default(),
        }
    }

    /// Create signal coordinator with custom configuration
    pub fn with_config(config: CoordinatorConfig) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Score the timeframes of an aligned instrument
    ///
    /// Only timeframes trending in `direction` contribute, and each contributes
    /// to the side of its own trend.
    pub fn score(&self, direction: Direction, timeframes: &[TimeframeSignals]) -> ScoreCard {
        let mut long_score = 0.0;
        let mut short_score = 0.0;

        for tf in timeframes {
            let Some(side) = tf.direction() else {
                continue;
            };
            if side != direction {
                continue;
            }
            let contribution = self.timeframe_score(tf, side);
            match side {
                Direction::Up => long_score += contribution,
                Direction::Down => short_score += contribution,
            }
        }

        ScoreCard {
            long_score,
            short_score,
            suggestion: self.suggest(long_score, short_score),
        }
    }

    /// Weighted contribution of a single timeframe to `side`
    pub fn timeframe_score(&self, tf: &TimeframeSignals, side: Direction) -> f64 {
        let weights = &self.config.signal_weights;
        let mut score = 0.0;

        if tf.breakout.is_some_and(|b| b.direction == side) {
            score += weights.breakout;
        }
        if tf.impulse.is_some_and(|i| i.direction == side) {
            score += weights.impulse;
        }
        if tf.wave.is_some_and(|w| w.matched()) {
            score += weights.elliott_fibonacci;
        }
        if tf.retracement.is_some_and(|r| r.valid) {
            score += weights.retracement;
        }
        if tf.near_moving_average == Some(true) {
            score += weights.ma_proximity;
        }

        score
    }

    /// Pick the winning side; ties and sub-threshold scores yield no suggestion
    pub fn suggest(&self, long_score: f64, short_score: f64) -> Option<Suggestion> {
        let (direction, winning) = if long_score > short_score {
            (Direction::Up, long_score)
        } else if short_score > long_score {
            (Direction::Down, short_score)
        } else {
            return None;
        };

        if winning <= self.config.min_score {
            return None;
        }

        let score = SignalUtils::clamp_score(winning, self.config.score_floor, self.config.score_ceiling);
        Some(Suggestion {
            direction,
            score,
            confidence: score / self.config.score_ceiling,
            tier: self.tier_for(score),
        })
    }

    /// Map a clamped score to its tier; lower bounds are inclusive
    pub fn tier_for(&self, score: f64) -> ConfidenceTier {
        if score >= self.config.high_tier {
            ConfidenceTier::High
        } else if score >= self.config.medium_tier {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

impl Default for SignalCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder pattern for signal coordinator configuration
pub struct CoordinatorBuilder {
    config: CoordinatorConfig,
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            config: CoordinatorConfig::default(),
        }
    }

    pub fn with_weights(mut self, weights: SignalWeights) -> Self {
        self.config.signal_weights = weights;
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.config.min_score = min_score;
        self
    }

    pub fn with_score_band(mut self, floor: f64, ceiling: f64) -> Self {
        self.config.score_floor = floor;
        self.config.score_ceiling = ceiling;
        self
    }

    pub fn with_tiers(mut self, medium: f64, high: f64) -> Self {
        self.config.medium_tier = medium;
        self.config.high_tier = high;
        self
    }

    /// Build the signal coordinator
    pub fn build(self) -> Result<SignalCoordinator, SignalError> {
        SignalCoordinator::with_config(self.config)
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
