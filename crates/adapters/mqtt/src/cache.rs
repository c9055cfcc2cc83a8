//! Latest known state per device, and the events a new message implies.

use std::collections::BTreeMap;

use thermodiff_domain::event::EventKind;
use thermodiff_domain::id::DeviceId;
use thermodiff_domain::thermostat::{HvacAction, ThermostatReading};

use crate::payload::StatePayload;

#[derive(Debug, Clone, PartialEq)]
struct CachedDevice {
    current: Option<f64>,
    target: Option<f64>,
    action: HvacAction,
    available: bool,
    window_open: Option<bool>,
}

impl Default for CachedDevice {
    fn default() -> Self {
        Self {
            current: None,
            target: None,
            action: HvacAction::Unknown,
            available: true,
            window_open: None,
        }
    }
}

/// State cache fed by incoming MQTT messages.
#[derive(Debug, Default)]
pub struct DeviceCache {
    devices: BTreeMap<DeviceId, CachedDevice>,
}

impl DeviceCache {
    /// Merge a state message, returning one event per field that changed.
    ///
    /// Fields absent from the message keep their cached value; an explicit
    /// `null` temperature clears it.
    pub fn apply_state(&mut self, device: &DeviceId, state: &StatePayload) -> Vec<EventKind> {
        let cached = self.devices.entry(device.clone()).or_default();
        let mut changes = Vec::new();

        if let Some(to) = state.local_temperature
            && cached.current != to
        {
            changes.push(EventKind::CurrentTemperatureChanged {
                from: std::mem::replace(&mut cached.current, to),
                to,
            });
        }
        if let Some(to) = state.occupied_heating_setpoint
            && cached.target != to
        {
            changes.push(EventKind::TargetTemperatureChanged {
                from: std::mem::replace(&mut cached.target, to),
                to,
            });
        }
        if let Some(to) = state.hvac_action()
            && cached.action != to
        {
            let from = std::mem::replace(&mut cached.action, to);
            changes.push(EventKind::HvacActionChanged { from, to });
        }
        if let Some(open) = state.window_open()
            && cached.window_open != Some(open)
        {
            cached.window_open = Some(open);
            changes.push(EventKind::WindowChanged { open });
        }
        changes
    }

    pub fn apply_availability(&mut self, device: &DeviceId, available: bool) -> Vec<EventKind> {
        let cached = self.devices.entry(device.clone()).or_default();
        if cached.available == available {
            return Vec::new();
        }
        cached.available = available;
        vec![EventKind::AvailabilityChanged { available }]
    }

    /// The reading of a thermostat seen at least once.
    #[must_use]
    pub fn reading(&self, device: &DeviceId) -> Option<ThermostatReading> {
        let cached = self.devices.get(device)?;
        if !cached.available {
            return Some(ThermostatReading::unavailable());
        }
        Some(ThermostatReading {
            current_temperature: cached.current,
            target_temperature: cached.target,
            hvac_action: cached.action,
        })
    }

    /// The contact state of a window sensor seen at least once.
    #[must_use]
    pub fn window_open(&self, device: &DeviceId) -> Option<bool> {
        self.devices.get(device)?.window_open
    }
}
