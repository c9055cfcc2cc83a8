//! Virtual thermostat: a radiator valve with its own internal hysteresis.
//!
//! The device heats until the room reaches `target + hysteresis` and stays
//! idle until it drops below `target - hysteresis`. Every mutation returns
//! the changes it caused so the hub can publish them.

use thermodiff_domain::adjustment::round_setpoint;
use thermodiff_domain::event::EventKind;
use thermodiff_domain::thermostat::{HvacAction, ThermostatReading};

/// Internal band of a typical radiator valve, in degrees.
pub const DEFAULT_HYSTERESIS: f64 = 0.3;

/// A simulated climate device.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualThermostat {
    current: Option<f64>,
    target: Option<f64>,
    action: HvacAction,
    available: bool,
    hysteresis: f64,
}

impl VirtualThermostat {
    /// A thermostat at `current`, aiming for `target`.
    ///
    /// Starts heating when below target, idle otherwise.
    #[must_use]
    pub fn new(current: f64, target: f64) -> Self {
        let action = if current < target {
            HvacAction::Heating
        } else {
            HvacAction::Idle
        };
        Self {
            current: Some(current),
            target: Some(target),
            action,
            available: true,
            hysteresis: DEFAULT_HYSTERESIS,
        }
    }

    #[must_use]
    pub fn with_hysteresis(mut self, hysteresis: f64) -> Self {
        self.hysteresis = hysteresis.max(0.0);
        self
    }

    /// Force the reported action, bypassing regulation.
    #[must_use]
    pub fn with_action(mut self, action: HvacAction) -> Self {
        self.action = action;
        self
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available
    }

    #[must_use]
    pub fn action(&self) -> HvacAction {
        self.action
    }

    #[must_use]
    pub fn target(&self) -> Option<f64> {
        self.target
    }

    #[must_use]
    pub fn current(&self) -> Option<f64> {
        self.current
    }

    /// What a state source reports for this device.
    #[must_use]
    pub fn reading(&self) -> ThermostatReading {
        if !self.available {
            return ThermostatReading::unavailable();
        }
        ThermostatReading {
            current_temperature: self.current,
            target_temperature: self.target,
            hvac_action: self.action,
        }
    }

    pub fn set_target(&mut self, target: f64) -> Vec<EventKind> {
        let target = round_setpoint(target);
        let mut changes = Vec::new();
        if self.target != Some(target) {
            changes.push(EventKind::TargetTemperatureChanged {
                from: self.target,
                to: Some(target),
            });
            self.target = Some(target);
        }
        changes.extend(self.regulate());
        changes
    }

    pub fn set_current(&mut self, current: Option<f64>) -> Vec<EventKind> {
        let current = current.map(round_setpoint);
        let mut changes = Vec::new();
        if self.current != current {
            changes.push(EventKind::CurrentTemperatureChanged {
                from: self.current,
                to: current,
            });
            self.current = current;
        }
        changes.extend(self.regulate());
        changes
    }

    pub fn set_available(&mut self, available: bool) -> Vec<EventKind> {
        if self.available == available {
            return Vec::new();
        }
        self.available = available;
        vec![EventKind::AvailabilityChanged { available }]
    }

    /// Move the room temperature by `rate` degrees: up while heating, down
    /// while idle.
    pub fn drift(&mut self, rate: f64) -> Vec<EventKind> {
        let Some(current) = self.current else {
            return Vec::new();
        };
        match self.action {
            HvacAction::Heating => self.set_current(Some(current + rate)),
            HvacAction::Idle => self.set_current(Some(current - rate)),
            HvacAction::Unknown => Vec::new(),
        }
    }

    fn regulate(&mut self) -> Option<EventKind> {
        let (Some(current), Some(target)) = (self.current, self.target) else {
            return self.switch_to(HvacAction::Unknown);
        };
        match self.action {
            HvacAction::Heating if current >= target + self.hysteresis => {
                self.switch_to(HvacAction::Idle)
            }
            HvacAction::Idle if current < target - self.hysteresis => {
                self.switch_to(HvacAction::Heating)
            }
            HvacAction::Unknown if current < target => self.switch_to(HvacAction::Heating),
            HvacAction::Unknown => self.switch_to(HvacAction::Idle),
            _ => None,
        }
    }

    fn switch_to(&mut self, action: HvacAction) -> Option<EventKind> {
        if self.action == action {
            return None;
        }
        let from = std::mem::replace(&mut self.action, action);
        Some(EventKind::HvacActionChanged { from, to: action })
    }
}
