//! Virtual device implementations: thermostat and window contact.

mod thermostat;
mod window;

pub use thermostat::{DEFAULT_HYSTERESIS, VirtualThermostat};
pub use window::VirtualWindow;
