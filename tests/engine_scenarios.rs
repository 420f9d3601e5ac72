mod common;

use anyhow::anyhow;
use async_trait::async_trait;
use common::{breakout_uptrend, downtrend, flat, series, uptrend};
use mockall::mock;
use trendwatch::breakout::{Breakout, BrokenLevel};
use trendwatch::candles::is_doji;
use trendwatch::config::MonitorConfig;
use trendwatch::engine::TrendEngine;
use trendwatch::market_data::{Bar, BarSeries, Resolution};
use trendwatch::notify::{Alert, AlertFormatter, AlertPriority, NotificationSink};
use trendwatch::provider::MarketDataProvider;
use trendwatch::scheduler::run_cycle;
use trendwatch::signals::{ConfidenceTier, CycleOutcome, Signal, TimeframeSignals};
use trendwatch::trend::{Direction, TrendDirection};
use trendwatch::SignalError;

mock! {
    pub Provider {}

    #[async_trait]
    impl MarketDataProvider for Provider {
        async fn fetch_bars(
            &self,
            symbol: &str,
            resolution: Resolution,
            limit: usize,
        ) -> anyhow::Result<BarSeries>;
    }
}

mock! {
    pub Sink {}

    #[async_trait]
    impl NotificationSink for Sink {
        async fn deliver(&self, alert: &Alert) -> anyhow::Result<()>;
    }
}

#[cfg(test)]
mod engine_scenario_tests {
    use super::*;

    fn engine_for(resolutions: &[Resolution]) -> TrendEngine {
        let mut config = MonitorConfig::default();
        config.resolutions = resolutions.to_vec();
        TrendEngine::new(&config).unwrap()
    }

    fn default_engine() -> TrendEngine {
        TrendEngine::new(&MonitorConfig::default()).unwrap()
    }

    #[test]
    fn scenario_a_breakout_and_ma_proximity_score_low() {
        let engine = default_engine();
        let mut timeframes: Vec<TimeframeSignals> = engine
            .resolutions()
            .iter()
            .map(|&resolution| {
                let mut tf = TimeframeSignals::new(resolution);
                tf.trend = Some(TrendDirection::Up);
                tf
            })
            .collect();
        timeframes[0].near_moving_average = Some(true);
        timeframes[0].breakout = Some(Breakout {
            direction: Direction::Up,
            level: BrokenLevel::Resistance(101.0),
        });

        let result = engine.aggregate("BTCUSDT", &timeframes);

        assert!(result.aligned);
        assert_eq!(result.trend, Some(Direction::Up));
        let score = result.score.as_ref().unwrap();
        assert!((score.long_score - 3.8).abs() < 1e-10);
        assert_eq!(score.short_score, 0.0);

        let suggestion = result.suggestion().unwrap();
        assert_eq!(suggestion.direction, Direction::Up);
        assert_eq!(suggestion.tier, ConfidenceTier::Low);
        assert!((suggestion.confidence - 0.38).abs() < 1e-10);
        assert_eq!(result.outcome(), CycleOutcome::Suggested(ConfidenceTier::Low));
    }

    #[test]
    fn scenario_b_mixed_trends_are_not_aligned() {
        let resolutions = [
            Resolution::Minutes5,
            Resolution::Minutes15,
            Resolution::Minutes30,
            Resolution::Hour1,
        ];
        let engine = engine_for(&resolutions);
        let data = vec![
            uptrend("ETHUSDT", Resolution::Minutes5),
            uptrend("ETHUSDT", Resolution::Minutes15),
            downtrend("ETHUSDT", Resolution::Minutes30),
            uptrend("ETHUSDT", Resolution::Hour1),
        ];

        let result = engine.evaluate("ETHUSDT", &data);
        assert!(!result.aligned);
        assert!(result.trend.is_none());
        assert!(result.score.is_none());
        assert_eq!(result.outcome(), CycleOutcome::NotAligned);
    }

    #[test]
    fn scenario_c_all_flat_is_not_aligned() {
        let engine = default_engine();
        let data: Vec<BarSeries> = engine
            .resolutions()
            .iter()
            .map(|&r| flat("SOLUSDT", r))
            .collect();

        let result = engine.evaluate("SOLUSDT", &data);
        assert!(!result.aligned);
        assert_eq!(result.outcome(), CycleOutcome::NotAligned);
    }

    #[test]
    fn scenario_d_zero_range_bar_is_not_a_doji() {
        let bar = Bar::new(common::start_time(), 100.0, 100.0, 100.0, 100.0, 5.0).unwrap();
        assert!(!is_doji(&bar, 0.1));
    }

    #[test]
    fn downtrend_everywhere_aligns_down() {
        let engine = default_engine();
        let data: Vec<BarSeries> = engine
            .resolutions()
            .iter()
            .map(|&r| downtrend("XRPUSDT", r))
            .collect();

        let result = engine.evaluate("XRPUSDT", &data);
        assert!(result.aligned);
        assert_eq!(result.trend, Some(Direction::Down));
        assert!(result.signals.iter().all(|s| s.direction == Direction::Down));
        assert_eq!(result.score.as_ref().unwrap().long_score, 0.0);
    }

    #[tokio::test]
    async fn analyze_scores_breakout_and_impulse() {
        let engine = default_engine();
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_bars()
            .times(6)
            .returning(|symbol, resolution, _| {
                Ok(if resolution == Resolution::Hours4 {
                    breakout_uptrend(symbol, resolution)
                } else {
                    uptrend(symbol, resolution)
                })
            });

        let result = engine.analyze("BNBUSDT", &provider).await.unwrap();

        assert!(result.aligned);
        assert_eq!(result.trend, Some(Direction::Up));
        assert_eq!(
            result.resolutions_with(|s| matches!(s, Signal::Breakout(_))),
            vec![Resolution::Hours4]
        );
        assert_eq!(
            result.resolutions_with(|s| matches!(s, Signal::Impulse(_))),
            vec![Resolution::Hours4]
        );

        let score = result.score.as_ref().unwrap();
        assert!((score.long_score - 5.5).abs() < 1e-10);
        assert_eq!(result.outcome(), CycleOutcome::Suggested(ConfidenceTier::Low));
        assert!(result.levels.iter().any(|(r, _)| *r == Resolution::Hours4));
    }

    #[tokio::test]
    async fn analyze_requests_configured_bar_count() {
        let engine = engine_for(&[Resolution::Hour1]);
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_bars()
            .withf(|symbol, resolution, limit| {
                symbol == "LTCUSDT" && *resolution == Resolution::Hour1 && *limit == 50
            })
            .times(1)
            .returning(|symbol, resolution, _| Ok(uptrend(symbol, resolution)));

        let result = engine.analyze("LTCUSDT", &provider).await.unwrap();
        assert!(result.aligned);
    }

    #[tokio::test]
    async fn analyze_fetch_failure_aborts_instrument() {
        let engine = default_engine();
        let mut provider = MockProvider::new();
        provider.expect_fetch_bars().returning(|symbol, resolution, _| {
            if resolution == Resolution::Hour1 {
                Err(anyhow!("connection reset"))
            } else {
                Ok(uptrend(symbol, resolution))
            }
        });

        let err = engine.analyze("BCHUSDT", &provider).await.unwrap_err();
        assert!(!err.is_recoverable());
        match err {
            SignalError::FetchFailure {
                symbol,
                resolution,
                reason,
            } => {
                assert_eq!(symbol, "BCHUSDT");
                assert_eq!(resolution, Resolution::Hour1);
                assert!(reason.contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn analyze_short_response_only_drops_that_vote() {
        let engine = default_engine();
        let mut provider = MockProvider::new();
        provider.expect_fetch_bars().returning(|symbol, resolution, _| {
            if resolution == Resolution::Day1 {
                Ok(series(symbol, resolution, Vec::new()))
            } else {
                Ok(uptrend(symbol, resolution))
            }
        });

        let result = engine.analyze("HBARUSDT", &provider).await.unwrap();
        assert!(result.aligned);
        assert!(result.levels.iter().all(|(r, _)| *r != Resolution::Day1));
    }

    #[tokio::test]
    async fn suggested_result_is_delivered_once() {
        let engine = default_engine();
        let mut provider = MockProvider::new();
        provider.expect_fetch_bars().returning(|symbol, resolution, _| {
            Ok(if resolution == Resolution::Hours4 {
                breakout_uptrend(symbol, resolution)
            } else {
                uptrend(symbol, resolution)
            })
        });

        let mut sink = MockSink::new();
        sink.expect_deliver()
            .withf(|alert: &Alert| {
                alert.title == "ADAUSDT uptrend" && alert.priority == AlertPriority::Default
            })
            .times(1)
            .returning(|_| Ok(()));

        let result = engine.analyze("ADAUSDT", &provider).await.unwrap();
        let alert = AlertFormatter::default().render(&result).unwrap();
        assert!(alert.body.contains("Breakout above resistance"));
        assert!(alert.body.contains("Impulse candle on 4h"));
        sink.deliver(&alert).await.unwrap();
    }

    fn cycle_config(instruments: &[&str]) -> MonitorConfig {
        let mut config = MonitorConfig::default();
        config.instruments = instruments.iter().map(|s| s.to_string()).collect();
        config.max_concurrent_instruments = 2;
        config
    }

    #[tokio::test]
    async fn run_cycle_isolates_fetch_and_delivery_failures() {
        let config = cycle_config(&["BTCUSDT", "BCHUSDT", "ETHUSDT", "SOLUSDT"]);
        let engine = TrendEngine::new(&config).unwrap();

        let mut provider = MockProvider::new();
        provider.expect_fetch_bars().returning(|symbol, resolution, _| {
            if symbol == "BCHUSDT" {
                Err(anyhow!("503 service unavailable"))
            } else {
                Ok(uptrend(symbol, resolution))
            }
        });

        let mut sink = MockSink::new();
        sink.expect_deliver()
            .withf(|alert: &Alert| !alert.title.starts_with("BCHUSDT"))
            .times(3)
            .returning(|alert| {
                if alert.title.starts_with("ETHUSDT") {
                    Err(anyhow!("topic unreachable"))
                } else {
                    Ok(())
                }
            });

        let report = run_cycle(
            &config,
            &engine,
            &provider,
            &sink,
            &AlertFormatter::from_config(&config),
        )
        .await;

        assert_eq!(report.results.len(), 4);
        assert!(matches!(
            report.result_for("BCHUSDT"),
            Some(Err(SignalError::FetchFailure { .. }))
        ));
        for symbol in ["BTCUSDT", "ETHUSDT", "SOLUSDT"] {
            let result = report.result_for(symbol).unwrap().as_ref().unwrap();
            assert!(result.aligned, "{symbol} should be aligned");
            assert_eq!(result.trend, Some(Direction::Up));
        }
        assert_eq!(report.aligned, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.delivery_failures, 1);
    }

    #[tokio::test]
    async fn run_cycle_with_notifier_disabled_sends_nothing() {
        let mut config = cycle_config(&["BTCUSDT", "XRPUSDT"]);
        config.notifier.enabled = false;
        let engine = TrendEngine::new(&config).unwrap();

        let mut provider = MockProvider::new();
        provider.expect_fetch_bars().returning(|symbol, resolution, _| {
            Ok(if symbol == "XRPUSDT" {
                downtrend(symbol, resolution)
            } else {
                uptrend(symbol, resolution)
            })
        });
        let mut sink = MockSink::new();
        sink.expect_deliver().times(0);

        let report = run_cycle(
            &config,
            &engine,
            &provider,
            &sink,
            &AlertFormatter::from_config(&config),
        )
        .await;

        assert_eq!(report.aligned, 2);
        assert_eq!(report.delivered, 0);
        assert!(report.results.iter().all(|(_, r)| r.is_ok()));
    }
}
