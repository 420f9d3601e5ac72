//! Alignment Checker
//!
//! Decides whether one directional trend holds across every evaluated resolution.

use super::core::TimeframeSignals;
use crate::market_data::Resolution;
use crate::trend::{Direction, TrendDirection};
use serde::{Deserialize, Serialize};

/// How flat or missing votes are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentPolicy {
    /// Flat votes neither break nor count toward alignment
    #[default]
    IgnoreFlat,
    /// Every configured resolution must vote, non-flat, in the same direction
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentVerdict {
    pub aligned: bool,
    pub direction: Option<Direction>,
    /// Resolutions whose vote matches the agreed direction
    pub agreeing: Vec<Resolution>,
}

impl AlignmentVerdict {
    fn rejected() -> Self {
        Self {
            aligned: false,
            direction: None,
            agreeing: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlignmentChecker {
    policy: AlignmentPolicy,
}

impl AlignmentChecker {
    pub fn new(policy: AlignmentPolicy) -> Self {
        Self { policy }
    }

    /// Check alignment over raw votes; `None` entries did not vote
    pub fn check_votes(&self, votes: &[(Resolution, Option<TrendDirection>)]) -> AlignmentVerdict {
        if self.policy == AlignmentPolicy::Strict
            && votes
                .iter()
                .any(|(_, vote)| !matches!(vote, Some(TrendDirection::Up | TrendDirection::Down)))
        {
            return AlignmentVerdict::rejected();
        }

        let mut direction: Option<Direction> = None;
        for (_, vote) in votes {
            let Some(vote) = vote.and_then(|v| v.direction()) else {
                continue;
            };
            match direction {
                None => direction = Some(vote),
                Some(agreed) if agreed != vote => return AlignmentVerdict::rejected(),
                Some(_) => {}
            }
        }

        let Some(direction) = direction else {
            return AlignmentVerdict::rejected();
        };

        let agreeing = votes
            .iter()
            .filter(|(_, vote)| vote.and_then(|v| v.direction()) == Some(direction))
            .map(|(resolution, _)| *resolution)
            .collect();

        AlignmentVerdict {
            aligned: true,
            direction: Some(direction),
            agreeing,
        }
    }

    /// Check alignment across evaluated timeframes
    ///
    /// Under `Strict`, a resolution whose trend could not be computed voids
    /// alignment; under `IgnoreFlat` it is simply left out of the vote.
    pub fn check(&self, timeframes: &[TimeframeSignals]) -> AlignmentVerdict {
        let votes: Vec<(Resolution, Option<TrendDirection>)> =
            timeframes.iter().map(|tf| (tf.resolution, tf.trend)).collect();
        self.check_votes(&votes)
    }
}

impl Default for AlignmentChecker {
    fn default() -> Self {
        Self::new(AlignmentPolicy::default())
    }
}
