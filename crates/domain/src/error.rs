//! Common error types used across the workspace.
//!
//! Each failure class has its own typed error; [`ThermodiffError`] wraps
//! them via `#[from]` so ports and services can propagate with `?`.

use crate::id::DeviceId;

/// Top-level error crossing port boundaries.
#[derive(Debug, thiserror::Error)]
pub enum ThermodiffError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("reading unavailable: {0}")]
    Unavailable(#[from] UnavailableReadingError),

    #[error("command failed: {0}")]
    Command(#[from] CommandFailure),

    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("adapter error")]
    Adapter(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Invalid controller configuration, detected when the configuration is built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("switching differential {value} is outside [{min}, {max}]")]
    DifferentialOutOfRange { value: f64, min: f64, max: f64 },

    #[error("delay of {secs}s is outside [0, {max_secs}]s")]
    DelayOutOfRange { secs: u64, max_secs: u64 },

    #[error("timeout of {secs}s is outside (0, {max_secs}]s")]
    TimeoutOutOfRange { secs: u64, max_secs: u64 },

    #[error("cooldown of {secs}s is outside [0, {max_secs}]s")]
    CooldownOutOfRange { secs: u64, max_secs: u64 },

    #[error("trigger stability window of {secs}s is outside [0, {max_secs}]s")]
    StabilityOutOfRange { secs: u64, max_secs: u64 },

    #[error("device {0} is configured more than once")]
    DuplicateDevice(DeviceId),
}

/// Which part of a reading could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    CurrentTemperature,
    TargetTemperature,
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CurrentTemperature => f.write_str("current temperature"),
            Self::TargetTemperature => f.write_str("target temperature"),
        }
    }
}

/// A thermostat reading lacks a usable temperature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} of {device} is unavailable")]
pub struct UnavailableReadingError {
    pub device: DeviceId,
    pub field: MissingField,
}

/// The command sink rejected a set-target call.
#[derive(Debug, thiserror::Error)]
#[error("setting target of {device} to {temperature} failed")]
pub struct CommandFailure {
    pub device: DeviceId,
    pub temperature: f64,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl CommandFailure {
    /// Wrap an adapter error for the given command.
    pub fn new(
        device: DeviceId,
        temperature: f64,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            device,
            temperature,
            source: source.into(),
        }
    }
}

/// A requested item does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
