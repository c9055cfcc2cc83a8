//! Pending adjustments: the per-cycle record of a nudged setpoint.
//!
//! [`plan`] holds the branch decision: over target while heating lowers the
//! setpoint, under target while idle raises it. The resulting
//! [`PendingAdjustment`] carries the original target so restoration never
//! depends on device state.

use serde::{Deserialize, Serialize};

use crate::differential::SwitchingDifferential;
use crate::event::{Event, EventKind};
use crate::id::{CycleId, DeviceId};
use crate::thermostat::{HvacAction, ValidReading};
use crate::time::{Timestamp, now};

/// Which way the setpoint was moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Lower,
    Raise,
}

impl Direction {
    /// The hvac action the device was in when this adjustment started.
    #[must_use]
    pub fn starting_action(self) -> HvacAction {
        match self {
            Self::Lower => HvacAction::Heating,
            Self::Raise => HvacAction::Idle,
        }
    }

    /// The hvac action that ends the wait.
    #[must_use]
    pub fn awaited_action(self) -> HvacAction {
        match self {
            Self::Lower => HvacAction::Idle,
            Self::Raise => HvacAction::Heating,
        }
    }

    /// Move `target` by `differential` in this direction.
    #[must_use]
    pub fn apply(self, target: f64, differential: SwitchingDifferential) -> f64 {
        let adjusted = match self {
            Self::Lower => target - differential.degrees(),
            Self::Raise => target + differential.degrees(),
        };
        round_setpoint(adjusted)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lower => f.write_str("lower"),
            Self::Raise => f.write_str("raise"),
        }
    }
}

/// Setpoints closer than this are the same value.
const SETPOINT_TOLERANCE: f64 = 0.005;

/// Round a setpoint to hundredths of a degree.
#[must_use]
pub fn round_setpoint(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A setpoint adjustment in flight, restored exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAdjustment {
    pub cycle: CycleId,
    pub device: DeviceId,
    pub original_target: f64,
    pub adjusted_target: f64,
    pub direction: Direction,
    pub started_at: Timestamp,
}

impl PendingAdjustment {
    /// Whether `action` is the flip this adjustment is waiting for.
    #[must_use]
    pub fn is_flip(&self, action: HvacAction) -> bool {
        action == self.direction.awaited_action()
    }

    /// Whether `event` is the device reporting a target this adjustment commanded.
    #[must_use]
    pub fn is_echo(&self, event: &Event) -> bool {
        if !event.is_about(&self.device) {
            return false;
        }
        match event.kind {
            EventKind::TargetTemperatureChanged { to: Some(to), .. } => {
                (to - self.adjusted_target).abs() < SETPOINT_TOLERANCE
                    || (to - self.original_target).abs() < SETPOINT_TOLERANCE
            }
            _ => false,
        }
    }
}

/// Decide whether a reading calls for an adjustment.
///
/// Returns `None` when neither branch applies, including whenever the
/// hvac action is [`HvacAction::Unknown`].
#[must_use]
pub fn plan(
    device: &DeviceId,
    reading: &ValidReading,
    differential: SwitchingDifferential,
) -> Option<PendingAdjustment> {
    let direction = match reading.hvac_action {
        HvacAction::Heating if reading.current >= reading.target => Direction::Lower,
        HvacAction::Idle if reading.current < reading.target => Direction::Raise,
        _ => return None,
    };
    Some(PendingAdjustment {
        cycle: CycleId::new(),
        device: device.clone(),
        original_target: reading.target,
        adjusted_target: direction.apply(reading.target, differential),
        direction,
        started_at: now(),
    })
}
