//! Thermostat readings: what the controller observes at decision time.

use serde::{Deserialize, Serialize};

use crate::error::{MissingField, UnavailableReadingError};
use crate::id::DeviceId;

/// Current operating mode of a climate device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacAction {
    Heating,
    Idle,
    #[default]
    Unknown,
}

impl HvacAction {
    /// The mode a device flips to from this one, if any.
    #[must_use]
    pub fn opposite(self) -> Option<Self> {
        match self {
            Self::Heating => Some(Self::Idle),
            Self::Idle => Some(Self::Heating),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for HvacAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Heating => f.write_str("heating"),
            Self::Idle => f.write_str("idle"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Observed thermostat state. Temperatures are `None` while the device
/// reports them as unknown or unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThermostatReading {
    pub current_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    pub hvac_action: HvacAction,
}

impl ThermostatReading {
    /// A reading with both temperatures present.
    #[must_use]
    pub fn new(current: f64, target: f64, hvac_action: HvacAction) -> Self {
        Self {
            current_temperature: Some(current),
            target_temperature: Some(target),
            hvac_action,
        }
    }

    /// The reading of a device that is unreachable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Require both temperatures to be present and finite.
    ///
    /// # Errors
    ///
    /// Returns [`UnavailableReadingError`] naming the first missing field.
    pub fn validate(&self, device: &DeviceId) -> Result<ValidReading, UnavailableReadingError> {
        let missing = |field| UnavailableReadingError {
            device: device.clone(),
            field,
        };
        let current = self
            .current_temperature
            .filter(|t| t.is_finite())
            .ok_or_else(|| missing(MissingField::CurrentTemperature))?;
        let target = self
            .target_temperature
            .filter(|t| t.is_finite())
            .ok_or_else(|| missing(MissingField::TargetTemperature))?;
        Ok(ValidReading {
            current,
            target,
            hvac_action: self.hvac_action,
        })
    }
}

/// A reading whose temperatures are known to be usable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidReading {
    pub current: f64,
    pub target: f64,
    pub hvac_action: HvacAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> DeviceId {
        "climate.hall".parse().unwrap()
    }

    #[test]
    fn should_flip_between_heating_and_idle() {
        assert_eq!(HvacAction::Heating.opposite(), Some(HvacAction::Idle));
        assert_eq!(HvacAction::Idle.opposite(), Some(HvacAction::Heating));
        assert_eq!(HvacAction::Unknown.opposite(), None);
    }

    #[test]
    fn should_deserialize_lowercase_action() {
        let action: HvacAction = serde_json::from_str("\"heating\"").unwrap();
        assert_eq!(action, HvacAction::Heating);
    }

    #[test]
    fn should_validate_complete_reading() {
        let reading = ThermostatReading::new(21.2, 21.0, HvacAction::Heating);
        let valid = reading.validate(&device()).unwrap();
        assert_eq!(valid.current, 21.2);
        assert_eq!(valid.target, 21.0);
        assert_eq!(valid.hvac_action, HvacAction::Heating);
    }

    #[test]
    fn should_reject_reading_without_current_temperature() {
        let reading = ThermostatReading {
            current_temperature: None,
            target_temperature: Some(21.0),
            hvac_action: HvacAction::Heating,
        };
        let err = reading.validate(&device()).unwrap_err();
        assert_eq!(err.field, MissingField::CurrentTemperature);
    }

    #[test]
    fn should_reject_reading_without_target_temperature() {
        let reading = ThermostatReading {
            current_temperature: Some(20.0),
            target_temperature: None,
            hvac_action: HvacAction::Idle,
        };
        let err = reading.validate(&device()).unwrap_err();
        assert_eq!(err.field, MissingField::TargetTemperature);
    }

    #[test]
    fn should_treat_nan_as_unavailable() {
        let reading = ThermostatReading::new(f64::NAN, 21.0, HvacAction::Idle);
        assert!(reading.validate(&device()).is_err());
    }

    #[test]
    fn should_report_unavailable_reading_as_unknown_action() {
        let reading = ThermostatReading::unavailable();
        assert_eq!(reading.hvac_action, HvacAction::Unknown);
        assert!(reading.validate(&device()).is_err());
    }
}
