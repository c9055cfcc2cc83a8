//! Cycle outcomes: what one controller invocation ended up doing.

use serde::{Deserialize, Serialize};

use crate::adjustment::PendingAdjustment;

/// Why a cycle made no adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A temperature was unknown or unavailable.
    Unavailable,
    /// The state source itself failed.
    SourceError,
    /// The configured window contact reported open.
    WindowOpen,
    /// Neither branch matched the reading.
    NotNeeded,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => f.write_str("unavailable"),
            Self::SourceError => f.write_str("source error"),
            Self::WindowOpen => f.write_str("window open"),
            Self::NotNeeded => f.write_str("not needed"),
        }
    }
}

/// Why the wait for the hvac flip ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeReason {
    /// The hvac action flipped.
    ConditionMet,
    /// The timeout elapsed first.
    TimedOut,
    /// Shutdown abandoned the wait.
    Cancelled,
}

impl std::fmt::Display for WakeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConditionMet => f.write_str("condition met"),
            Self::TimedOut => f.write_str("timed out"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Result of a controller cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    Skipped {
        reason: SkipReason,
    },
    Completed {
        adjustment: PendingAdjustment,
        wake: WakeReason,
    },
}

impl CycleOutcome {
    /// The adjustment made, if any.
    #[must_use]
    pub fn adjustment(&self) -> Option<&PendingAdjustment> {
        match self {
            Self::Skipped { .. } => None,
            Self::Completed { adjustment, .. } => Some(adjustment),
        }
    }
}
