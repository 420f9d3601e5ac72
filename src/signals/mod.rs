//! Signal Generation Module
//!
//! Multi-timeframe aggregation: per-resolution evaluation, cross-resolution
//! alignment and directional scoring.

pub mod alignment;
pub mod coordinator;
pub mod core;
pub mod evaluator;
pub mod utils;

// Re-export core types for easy access
pub use alignment::{AlignmentChecker, AlignmentPolicy, AlignmentVerdict};
pub use coordinator::{CoordinatorBuilder, CoordinatorConfig, SignalCoordinator};
pub use core::{
    AggregationResult, ConfidenceTier, CorroboratingSignal, CycleOutcome, ScoreCard, Signal,
    SignalWeights, Suggestion, TimeframeSignals,
};
pub use evaluator::TimeframeEvaluator;
