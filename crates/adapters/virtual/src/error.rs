//! Virtual adapter error types.

use thermodiff_domain::error::ThermodiffError;
use thermodiff_domain::id::DeviceId;

/// Why a virtual device refused a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VirtualError {
    /// Failure injection is switched on.
    #[error("commands are being rejected")]
    Rejected,

    #[error("no virtual thermostat named {0}")]
    UnknownDevice(DeviceId),

    #[error("{0} is unavailable")]
    Unavailable(DeviceId),
}

impl From<VirtualError> for ThermodiffError {
    fn from(err: VirtualError) -> Self {
        ThermodiffError::Adapter(Box::new(err))
    }
}
