//! Event: an immutable record of an observed change.
//!
//! Adapters publish events when a device's temperatures, hvac action,
//! availability or window contact change, and once when the system starts.
//! Some kinds wake the controller ([`EventKind::is_trigger`]); hvac action
//! changes only end the wait of a running cycle.

use serde::{Deserialize, Serialize};

use crate::id::{DeviceId, EventId};
use crate::thermostat::HvacAction;
use crate::time::{Timestamp, now};

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    CurrentTemperatureChanged {
        from: Option<f64>,
        to: Option<f64>,
    },
    TargetTemperatureChanged {
        from: Option<f64>,
        to: Option<f64>,
    },
    HvacActionChanged {
        from: HvacAction,
        to: HvacAction,
    },
    AvailabilityChanged {
        available: bool,
    },
    WindowChanged {
        open: bool,
    },
    /// The host (or this daemon) started; every device is re-evaluated.
    Started,
}

impl EventKind {
    /// Whether this kind starts a controller evaluation.
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        matches!(
            self,
            Self::CurrentTemperatureChanged { .. }
                | Self::TargetTemperatureChanged { .. }
                | Self::Started
        )
    }
}

/// A timestamped event, optionally about one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub device: Option<DeviceId>,
    pub kind: EventKind,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create an event about `device`, stamped with the current time.
    #[must_use]
    pub fn new(device: DeviceId, kind: EventKind) -> Self {
        Self {
            id: EventId::new(),
            device: Some(device),
            kind,
            timestamp: now(),
        }
    }

    /// The system-wide start event.
    #[must_use]
    pub fn started() -> Self {
        Self {
            id: EventId::new(),
            device: None,
            kind: EventKind::Started,
            timestamp: now(),
        }
    }

    /// Whether this event concerns `device`.
    #[must_use]
    pub fn is_about(&self, device: &DeviceId) -> bool {
        self.device.as_ref() == Some(device)
    }

    /// The new hvac action if this event reports one for `device`.
    #[must_use]
    pub fn hvac_action_of(&self, device: &DeviceId) -> Option<HvacAction> {
        match self.kind {
            EventKind::HvacActionChanged { to, .. } if self.is_about(device) => Some(to),
            _ => None,
        }
    }
}
