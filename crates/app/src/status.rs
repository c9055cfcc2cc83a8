//! Status registry: an observable copy of what each controller is doing.
//!
//! The registry only mirrors state; the authoritative [`PendingAdjustment`]
//! stays with the running cycle.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use serde::Serialize;

use thermodiff_domain::adjustment::PendingAdjustment;
use thermodiff_domain::cycle::CycleOutcome;
use thermodiff_domain::differential::DifferentialConfig;
use thermodiff_domain::id::DeviceId;
use thermodiff_domain::time::{Timestamp, now};

use crate::controller::CycleReport;

/// Snapshot of one controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerStatus {
    pub device: DeviceId,
    pub switching_differential: f64,
    pub delay_secs: u64,
    pub timeout_secs: u64,
    pub cooldown_secs: u64,
    pub stable_for_secs: u64,
    pub window: Option<DeviceId>,
    /// Adjustment currently waiting for restoration.
    pub pending: Option<PendingAdjustment>,
    pub last_outcome: Option<CycleOutcome>,
    pub last_error: Option<String>,
    pub last_run: Option<Timestamp>,
    pub cycles: u64,
    pub adjustments: u64,
    pub failures: u64,
    pub ignored_triggers: u64,
    /// Triggers dropped during the cooldown after a cycle.
    pub suppressed_triggers: u64,
}

impl ControllerStatus {
    fn new(config: &DifferentialConfig) -> Self {
        Self {
            device: config.device().clone(),
            switching_differential: config.differential().degrees(),
            delay_secs: config.delay().as_secs(),
            timeout_secs: config.timeout().as_secs(),
            cooldown_secs: config.cooldown().as_secs(),
            stable_for_secs: config.stable_for().as_secs(),
            window: config.window().cloned(),
            pending: None,
            last_outcome: None,
            last_error: None,
            last_run: None,
            cycles: 0,
            adjustments: 0,
            failures: 0,
            ignored_triggers: 0,
            suppressed_triggers: 0,
        }
    }
}

/// Shared, thread-safe map of controller statuses keyed by device.
#[derive(Debug, Default)]
pub struct StatusRegistry {
    devices: RwLock<BTreeMap<DeviceId, ControllerStatus>>,
}

impl StatusRegistry {
    /// Create a registry with one idle entry per configuration.
    #[must_use]
    pub fn new(configs: &[DifferentialConfig]) -> Self {
        let devices = configs
            .iter()
            .map(|config| (config.device().clone(), ControllerStatus::new(config)))
            .collect();
        Self {
            devices: RwLock::new(devices),
        }
    }

    #[must_use]
    pub fn get(&self, device: &DeviceId) -> Option<ControllerStatus> {
        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        devices.get(device).cloned()
    }

    /// All statuses, ordered by device name.
    #[must_use]
    pub fn list(&self) -> Vec<ControllerStatus> {
        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        devices.values().cloned().collect()
    }

    pub(crate) fn begin(&self, adjustment: &PendingAdjustment) {
        self.update(&adjustment.device, |status| {
            status.pending = Some(adjustment.clone());
        });
    }

    pub(crate) fn finish(&self, device: &DeviceId, report: &CycleReport) {
        self.update(device, |status| {
            status.pending = None;
            status.cycles += 1;
            if report.outcome.adjustment().is_some() {
                status.adjustments += 1;
            }
            if let Some(failure) = report.failures.first() {
                status.failures += report.failures.len() as u64;
                status.last_error = Some(failure.to_string());
            }
            status.last_outcome = Some(report.outcome.clone());
            status.last_run = Some(now());
        });
    }

    pub(crate) fn record_ignored(&self, device: &DeviceId, count: u64) {
        self.update(device, |status| status.ignored_triggers += count);
    }

    pub(crate) fn record_suppressed(&self, device: &DeviceId) {
        self.update(device, |status| status.suppressed_triggers += 1);
    }

    fn update(&self, device: &DeviceId, apply: impl FnOnce(&mut ControllerStatus)) {
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(status) = devices.get_mut(device) {
            apply(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermodiff_domain::adjustment::plan;
    use thermodiff_domain::cycle::{SkipReason, WakeReason};
    use thermodiff_domain::error::CommandFailure;
    use thermodiff_domain::thermostat::{HvacAction, ThermostatReading};

    fn device() -> DeviceId {
        "climate.nursery".parse().unwrap()
    }

    fn registry() -> StatusRegistry {
        let config = DifferentialConfig::builder(device()).build().unwrap();
        StatusRegistry::new(&[config])
    }

    fn adjustment() -> PendingAdjustment {
        let reading = ThermostatReading::new(21.2, 21.0, HvacAction::Heating)
            .validate(&device())
            .unwrap();
        let config = DifferentialConfig::builder(device()).build().unwrap();
        plan(&device(), &reading, config.differential()).unwrap()
    }

    #[test]
    fn should_start_idle_with_configuration() {
        let status = registry().get(&device()).unwrap();
        assert_eq!(status.timeout_secs, 120);
        assert!(status.pending.is_none());
        assert_eq!(status.cycles, 0);
    }

    #[test]
    fn should_expose_pending_adjustment_while_running() {
        let registry = registry();
        let adj = adjustment();
        registry.begin(&adj);
        assert_eq!(registry.get(&device()).unwrap().pending, Some(adj));
    }

    #[test]
    fn should_clear_pending_and_count_when_finished() {
        let registry = registry();
        let adj = adjustment();
        registry.begin(&adj);
        let report = CycleReport {
            outcome: CycleOutcome::Completed {
                adjustment: adj,
                wake: WakeReason::TimedOut,
            },
            failures: vec![CommandFailure::new(
                device(),
                20.5,
                std::io::Error::other("offline"),
            )],
        };

        registry.finish(&device(), &report);

        let status = registry.get(&device()).unwrap();
        assert!(status.pending.is_none());
        assert_eq!(status.cycles, 1);
        assert_eq!(status.adjustments, 1);
        assert_eq!(status.failures, 1);
        assert_eq!(
            status.last_error.as_deref(),
            Some("setting target of climate.nursery to 20.5 failed")
        );
        assert!(status.last_run.is_some());
    }

    #[test]
    fn should_count_skipped_cycles_without_adjustments() {
        let registry = registry();
        registry.finish(&device(), &CycleReport::skipped(SkipReason::NotNeeded));
        let status = registry.get(&device()).unwrap();
        assert_eq!(status.cycles, 1);
        assert_eq!(status.adjustments, 0);
    }

    #[test]
    fn should_accumulate_ignored_triggers() {
        let registry = registry();
        registry.record_ignored(&device(), 2);
        registry.record_ignored(&device(), 3);
        assert_eq!(registry.get(&device()).unwrap().ignored_triggers, 5);
    }

    #[test]
    fn should_count_suppressed_triggers_separately() {
        let registry = registry();
        registry.record_suppressed(&device());
        let status = registry.get(&device()).unwrap();
        assert_eq!(status.suppressed_triggers, 1);
        assert_eq!(status.ignored_triggers, 0);
        assert_eq!(status.cooldown_secs, 60);
        assert_eq!(status.stable_for_secs, 15);
    }

    #[test]
    fn should_return_none_for_unknown_device() {
        let other: DeviceId = "climate.cellar".parse().unwrap();
        assert!(registry().get(&other).is_none());
    }
}
