//! Per-instrument evaluation pipeline
//!
//! `Fetching -> Evaluating -> {Aligned, NotAligned} -> Scoring -> {Suggested, NoSuggestion}`.
//! The engine holds only immutable configuration; every call builds a fresh
//! result from the series it is given.

use crate::config::MonitorConfig;
use crate::error::SignalError;
use crate::market_data::{BarSeries, Resolution};
use crate::provider::MarketDataProvider;
use crate::signals::{
    AggregationResult, AlignmentChecker, CorroboratingSignal, Signal, SignalCoordinator,
    TimeframeEvaluator, TimeframeSignals,
};
use crate::trend::Direction;
use futures::future::try_join_all;
use log::debug;

#[derive(Debug, Clone)]
pub struct TrendEngine {
    resolutions: Vec<Resolution>,
    bar_count: usize,
    evaluator: TimeframeEvaluator,
    alignment: AlignmentChecker,
    coordinator: SignalCoordinator,
}

impl TrendEngine {
    /// Build an engine from a validated configuration
    pub fn new(config: &MonitorConfig) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self {
            resolutions: config.resolutions.clone(),
            bar_count: config.bar_count,
            evaluator: TimeframeEvaluator::new(config.indicators.clone(), config.evaluation.clone()),
            alignment: AlignmentChecker::new(config.alignment_policy),
            coordinator: SignalCoordinator::with_config(config.scoring.clone())?,
        })
    }

    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    /// Fetch every configured resolution, then evaluate
    ///
    /// A failed fetch for any resolution aborts this instrument's cycle.
    pub async fn analyze<P>(&self, symbol: &str, provider: &P) -> Result<AggregationResult, SignalError>
    where
        P: MarketDataProvider + ?Sized,
    {
        let fetches = self.resolutions.iter().map(|&resolution| async move {
            provider
                .fetch_bars(symbol, resolution, self.bar_count)
                .await
                .map_err(|e| SignalError::FetchFailure {
                    symbol: symbol.to_string(),
                    resolution,
                    reason: format!("{:#}", e),
                })
        });
        let series = try_join_all(fetches).await?;
        Ok(self.evaluate(symbol, &series))
    }

    /// Evaluate already-fetched series; configured resolutions without a series do not vote
    pub fn evaluate(&self, symbol: &str, series: &[BarSeries]) -> AggregationResult {
        let timeframes: Vec<TimeframeSignals> = self
            .resolutions
            .iter()
            .map(|&resolution| match series.iter().find(|s| s.resolution == resolution) {
                Some(s) => self.evaluator.evaluate(s),
                None => {
                    debug!("{} {}: no series supplied", symbol, resolution);
                    TimeframeSignals::new(resolution)
                }
            })
            .collect();

        self.aggregate(symbol, &timeframes)
    }

    /// Alignment, signal inventory and scoring over evaluated timeframes
    pub fn aggregate(&self, symbol: &str, timeframes: &[TimeframeSignals]) -> AggregationResult {
        let verdict = self.alignment.check(timeframes);
        let Some(direction) = verdict.direction.filter(|_| verdict.aligned) else {
            debug!("{}: trends not aligned", symbol);
            return AggregationResult::not_aligned(symbol);
        };

        let agreeing: Vec<&TimeframeSignals> = timeframes
            .iter()
            .filter(|tf| verdict.agreeing.contains(&tf.resolution))
            .collect();

        let signals = agreeing
            .iter()
            .flat_map(|tf| self.corroborating_signals(tf, direction))
            .collect();
        let levels = agreeing
            .iter()
            .filter_map(|tf| tf.support_resistance.map(|sr| (tf.resolution, sr)))
            .collect();
        let score = self.coordinator.score(direction, timeframes);

        AggregationResult {
            symbol: symbol.to_string(),
            aligned: true,
            trend: Some(direction),
            signals,
            levels,
            score: Some(score),
        }
    }

    fn corroborating_signals(&self, tf: &TimeframeSignals, direction: Direction) -> Vec<CorroboratingSignal> {
        let mut found = Vec::new();

        if tf.near_moving_average == Some(true) {
            found.push(Signal::NearMovingAverage);
        }
        if let Some(r) = tf.retracement.filter(|r| r.valid) {
            found.push(Signal::Retracement { ratio: r.ratio });
        }
        if self.evaluator.opposite_candles_fired(tf) {
            found.push(Signal::OppositeCandles {
                count: tf.opposite_candles.unwrap_or_default(),
            });
        }
        if tf.doji == Some(true) {
            found.push(Signal::Doji);
        }
        if tf.narrow_range == Some(true) {
            found.push(Signal::NarrowRange);
        }
        if tf.volume_spike == Some(true) {
            found.push(Signal::VolumeSpike);
        }
        if tf.low_spread == Some(true) {
            found.push(Signal::LowSpread);
        }
        if let Some(breakout) = tf.breakout {
            found.push(Signal::Breakout(breakout));
        }
        if let Some(impulse) = tf.impulse {
            found.push(Signal::Impulse(impulse));
        }
        if let Some(wave) = tf.wave {
            if wave.wave_three == Some(true) {
                found.push(Signal::WaveThree);
            }
            if let Some(level) = wave.fib_level {
                found.push(Signal::FibonacciLevel { level });
            }
        }

        found
            .into_iter()
            .map(|signal| CorroboratingSignal {
                resolution: tf.resolution,
                direction,
                signal,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakout::{Breakout, BrokenLevel, SupportResistance};
    use crate::signals::{AlignmentPolicy, ConfidenceTier, CycleOutcome};
    use crate::test_support::{bars_from_closes, ramp, series};
    use crate::trend::TrendDirection;

    fn engine() -> TrendEngine {
        TrendEngine::new(&MonitorConfig::default()).unwrap()
    }

    fn voted(resolution: Resolution, trend: TrendDirection) -> TimeframeSignals {
        let mut tf = TimeframeSignals::new(resolution);
        tf.trend = Some(trend);
        tf.near_moving_average = Some(false);
        tf
    }

    #[test]
    fn test_aggregate_breakout_and_ma_proximity() {
        let engine = engine();
        let mut timeframes: Vec<TimeframeSignals> = engine
            .resolutions()
            .iter()
            .map(|&r| voted(r, TrendDirection::Up))
            .collect();
        timeframes[2].near_moving_average = Some(true);
        timeframes[2].breakout = Some(Breakout {
            direction: Direction::Up,
            level: BrokenLevel::Resistance(42_000.0),
        });
        timeframes[4].support_resistance = Some(SupportResistance {
            support: 40_000.0,
            resistance: 42_000.0,
        });

        let result = engine.aggregate("BTCUSDT", &timeframes);
        assert!(result.aligned);
        assert_eq!(result.trend, Some(Direction::Up));
        assert_eq!(result.signals.len(), 2);
        assert!(result.signals.iter().all(|s| s.resolution == Resolution::Minutes30));
        assert_eq!(result.levels, vec![(Resolution::Hours4, timeframes[4].support_resistance.unwrap())]);

        let score = result.score.as_ref().unwrap();
        assert!((score.long_score - 3.8).abs() < 1e-10);
        assert_eq!(result.outcome(), CycleOutcome::Suggested(ConfidenceTier::Low));
    }

    #[test]
    fn test_aggregate_not_aligned_skips_scoring() {
        let engine = engine();
        let timeframes = vec![
            voted(Resolution::Minutes5, TrendDirection::Up),
            voted(Resolution::Minutes15, TrendDirection::Up),
            voted(Resolution::Minutes30, TrendDirection::Down),
            voted(Resolution::Hour1, TrendDirection::Up),
        ];
        let result = engine.aggregate("ETHUSDT", &timeframes);
        assert!(!result.aligned);
        assert!(result.score.is_none());
        assert!(result.signals.is_empty());
        assert_eq!(result.outcome(), CycleOutcome::NotAligned);
    }

    #[test]
    fn test_flat_timeframes_contribute_nothing() {
        let engine = engine();
        let mut flat = voted(Resolution::Minutes5, TrendDirection::Flat);
        flat.doji = Some(true);
        flat.near_moving_average = Some(true);
        let mut up = voted(Resolution::Hour1, TrendDirection::Up);
        up.doji = Some(true);

        let result = engine.aggregate("SOLUSDT", &[flat, up]);
        assert!(result.aligned);
        assert_eq!(result.signals.len(), 1);
        assert_eq!(result.signals[0].resolution, Resolution::Hour1);
        assert_eq!(result.outcome(), CycleOutcome::NoSuggestion);
    }

    #[test]
    fn test_signals_come_from_the_agreeing_resolutions() {
        let engine = engine();
        let mut timeframes = vec![
            voted(Resolution::Minutes5, TrendDirection::Up),
            voted(Resolution::Minutes15, TrendDirection::Flat),
            voted(Resolution::Hour1, TrendDirection::Up),
            TimeframeSignals::new(Resolution::Day1),
        ];
        for tf in timeframes.iter_mut() {
            tf.near_moving_average = Some(true);
        }

        let verdict = AlignmentChecker::default().check(&timeframes);
        assert_eq!(verdict.agreeing, vec![Resolution::Minutes5, Resolution::Hour1]);

        let result = engine.aggregate("LTCUSDT", &timeframes);
        let resolutions: Vec<Resolution> = result.signals.iter().map(|s| s.resolution).collect();
        assert_eq!(resolutions, verdict.agreeing);
    }

    #[test]
    fn test_evaluate_missing_resolutions_do_not_vote() {
        let engine = engine();
        let up = series(Resolution::Hour1, bars_from_closes(&ramp(100.0, 1.0, 50)));
        let result = engine.evaluate("ADAUSDT", &[up]);
        assert!(result.aligned);
        assert_eq!(result.trend, Some(Direction::Up));

        let mut strict = MonitorConfig::default();
        strict.alignment_policy = AlignmentPolicy::Strict;
        let strict_engine = TrendEngine::new(&strict).unwrap();
        let up = series(Resolution::Hour1, bars_from_closes(&ramp(100.0, 1.0, 50)));
        assert!(!strict_engine.evaluate("ADAUSDT", &[up]).aligned);
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut config = MonitorConfig::default();
        config.scoring.score_ceiling = 0.5;
        assert!(matches!(
            TrendEngine::new(&config),
            Err(SignalError::Configuration(_))
        ));
    }
}
