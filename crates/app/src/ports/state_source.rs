//! State source port: where thermostat readings come from.

use std::future::Future;

use thermodiff_domain::error::ThermodiffError;
use thermodiff_domain::id::DeviceId;
use thermodiff_domain::thermostat::ThermostatReading;

/// Supplies the observed state of climate devices and window contacts.
pub trait StateSource: Send + Sync {
    /// Read the current state of a thermostat.
    ///
    /// An unreachable device is reported as a reading with missing
    /// temperatures, not as an error. Errors mean the source itself failed
    /// (e.g. the device is unknown to the adapter).
    fn read(
        &self,
        device: &DeviceId,
    ) -> impl Future<Output = Result<ThermostatReading, ThermodiffError>> + Send;

    /// Whether a window contact currently reports open.
    fn window_open(
        &self,
        sensor: &DeviceId,
    ) -> impl Future<Output = Result<bool, ThermodiffError>> + Send;
}

impl<T: StateSource> StateSource for std::sync::Arc<T> {
    fn read(
        &self,
        device: &DeviceId,
    ) -> impl Future<Output = Result<ThermostatReading, ThermodiffError>> + Send {
        (**self).read(device)
    }

    fn window_open(
        &self,
        sensor: &DeviceId,
    ) -> impl Future<Output = Result<bool, ThermodiffError>> + Send {
        (**self).window_open(sensor)
    }
}
