//! Command sink port: where set-target commands go.

use std::future::Future;

use thermodiff_domain::error::CommandFailure;
use thermodiff_domain::id::DeviceId;

/// Accepts target temperature commands for climate devices.
pub trait CommandSink: Send + Sync {
    /// Ask the device to use `temperature` as its new target.
    fn set_target(
        &self,
        device: &DeviceId,
        temperature: f64,
    ) -> impl Future<Output = Result<(), CommandFailure>> + Send;
}

impl<T: CommandSink> CommandSink for std::sync::Arc<T> {
    fn set_target(
        &self,
        device: &DeviceId,
        temperature: f64,
    ) -> impl Future<Output = Result<(), CommandFailure>> + Send {
        (**self).set_target(device, temperature)
    }
}
