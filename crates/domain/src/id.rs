//! Identifiers: UUID-backed newtypes for generated ids, and [`DeviceId`]
//! for externally named thermostats and sensors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier for an [`Event`](crate::event::Event).
    EventId
);

define_id!(
    /// Correlates everything a single controller cycle does.
    CycleId
);

/// Name of a climate device or sensor as known to the outside world
/// (e.g. `climate.living_room`, or a Zigbee2MQTT friendly name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Borrow the device name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ConfigurationError::EmptyDeviceId);
        }
        if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

impl FromStr for DeviceId {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_generate_unique_ids_when_called_twice() {
        let a = CycleId::new();
        let b = CycleId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn should_roundtrip_event_id_through_display_and_from_str() {
        let id = EventId::new();
        let parsed: EventId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_return_error_when_parsing_invalid_uuid() {
        assert!(CycleId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn should_trim_device_id() {
        let id: DeviceId = "  climate.office ".parse().unwrap();
        assert_eq!(id.as_str(), "climate.office");
    }

    #[test]
    fn should_reject_blank_device_id() {
        assert_eq!(
            DeviceId::from_str("   "),
            Err(ConfigurationError::EmptyDeviceId)
        );
    }

    #[test]
    fn should_serialize_device_id_as_plain_string() {
        let id: DeviceId = "climate.office".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"climate.office\"");
    }

    #[test]
    fn should_reject_empty_device_id_when_deserializing() {
        let result: Result<DeviceId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
