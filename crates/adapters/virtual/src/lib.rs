//! # thermodiff-adapter-virtual
//!
//! Simulated thermostats and window contacts for testing and demonstration.
//!
//! ## Provided devices
//!
//! | Device | Behaviour |
//! |--------|-----------|
//! | [`VirtualThermostat`] | Radiator valve with internal hysteresis; reacts to set-target commands |
//! | [`VirtualWindow`] | Open/closed contact |
//!
//! [`VirtualHub`] serves both as a [`StateSource`] and a [`CommandSink`] and
//! publishes an event for every observable change.
//!
//! ## Dependency rule
//!
//! Depends on `thermodiff-app` (port traits) and `thermodiff-domain` only.

mod devices;
mod error;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use thermodiff_app::ports::{CommandSink, EventPublisher, StateSource};
use thermodiff_app::shutdown::ShutdownSignal;
use thermodiff_domain::error::{CommandFailure, NotFoundError, ThermodiffError};
use thermodiff_domain::event::{Event, EventKind};
use thermodiff_domain::id::DeviceId;
use thermodiff_domain::thermostat::ThermostatReading;

pub use devices::{DEFAULT_HYSTERESIS, VirtualThermostat, VirtualWindow};
pub use error::VirtualError;

#[derive(Debug, Default)]
struct Devices {
    thermostats: BTreeMap<DeviceId, VirtualThermostat>,
    windows: BTreeMap<DeviceId, VirtualWindow>,
}

/// A set of virtual devices sharing one event publisher. Clones share state.
#[derive(Clone)]
pub struct VirtualHub<P> {
    devices: Arc<Mutex<Devices>>,
    reject_commands: Arc<AtomicBool>,
    publisher: P,
}

impl<P: EventPublisher> VirtualHub<P> {
    #[must_use]
    pub fn new(publisher: P) -> Self {
        Self {
            devices: Arc::default(),
            reject_commands: Arc::default(),
            publisher,
        }
    }

    /// Register a thermostat. Replaces any previous device with that id.
    pub fn add_thermostat(&self, device: DeviceId, thermostat: VirtualThermostat) {
        self.lock().thermostats.insert(device, thermostat);
    }

    pub fn add_window(&self, device: DeviceId, window: VirtualWindow) {
        self.lock().windows.insert(device, window);
    }

    /// Snapshot of one thermostat.
    #[must_use]
    pub fn thermostat(&self, device: &DeviceId) -> Option<VirtualThermostat> {
        self.lock().thermostats.get(device).cloned()
    }

    /// Ids of every registered thermostat.
    #[must_use]
    pub fn thermostats(&self) -> Vec<DeviceId> {
        self.lock().thermostats.keys().cloned().collect()
    }

    /// Make every subsequent set-target command fail (or stop failing).
    pub fn reject_commands(&self, reject: bool) {
        self.reject_commands.store(reject, Ordering::Relaxed);
    }

    /// Set the room temperature seen by a thermostat.
    ///
    /// # Errors
    ///
    /// Returns [`ThermodiffError::NotFound`] for an unknown thermostat, or
    /// the publisher's error.
    pub async fn set_current_temperature(
        &self,
        device: &DeviceId,
        current: Option<f64>,
    ) -> Result<(), ThermodiffError> {
        let changes = self.update_thermostat(device, |t| t.set_current(current))?;
        self.publish_all(device, changes).await
    }

    /// Take a thermostat offline or bring it back.
    ///
    /// # Errors
    ///
    /// Returns [`ThermodiffError::NotFound`] for an unknown thermostat, or
    /// the publisher's error.
    pub async fn set_available(
        &self,
        device: &DeviceId,
        available: bool,
    ) -> Result<(), ThermodiffError> {
        let changes = self.update_thermostat(device, |t| t.set_available(available))?;
        self.publish_all(device, changes).await
    }

    /// Open or close a window contact.
    ///
    /// # Errors
    ///
    /// Returns [`ThermodiffError::NotFound`] for an unknown window, or the
    /// publisher's error.
    pub async fn set_window(&self, device: &DeviceId, open: bool) -> Result<(), ThermodiffError> {
        let change = {
            let mut devices = self.lock();
            let window = devices
                .windows
                .get_mut(device)
                .ok_or_else(|| not_found("Window", device))?;
            window.set_open(open)
        };
        self.publish_all(device, change.into_iter().collect()).await
    }

    /// Advance the simulation one step: heating rooms warm by `rate`
    /// degrees, idle rooms cool by `rate`.
    ///
    /// # Errors
    ///
    /// Returns the publisher's error.
    pub async fn tick(&self, rate: f64) -> Result<(), ThermodiffError> {
        let changes: Vec<(DeviceId, Vec<EventKind>)> = {
            let mut devices = self.lock();
            devices
                .thermostats
                .iter_mut()
                .filter(|(_, t)| t.is_available())
                .map(|(device, t)| (device.clone(), t.drift(rate)))
                .collect()
        };
        for (device, kinds) in changes {
            self.publish_all(&device, kinds).await?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Devices> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_thermostat<F>(&self, device: &DeviceId, apply: F) -> Result<Vec<EventKind>, NotFoundError>
    where
        F: FnOnce(&mut VirtualThermostat) -> Vec<EventKind>,
    {
        let mut devices = self.lock();
        let thermostat = devices
            .thermostats
            .get_mut(device)
            .ok_or_else(|| not_found("Thermostat", device))?;
        Ok(apply(thermostat))
    }

    fn command(&self, device: &DeviceId, temperature: f64) -> Result<Vec<EventKind>, VirtualError> {
        if self.reject_commands.load(Ordering::Relaxed) {
            return Err(VirtualError::Rejected);
        }
        let mut devices = self.lock();
        let thermostat = devices
            .thermostats
            .get_mut(device)
            .ok_or_else(|| VirtualError::UnknownDevice(device.clone()))?;
        if !thermostat.is_available() {
            return Err(VirtualError::Unavailable(device.clone()));
        }
        Ok(thermostat.set_target(temperature))
    }

    async fn publish_all(
        &self,
        device: &DeviceId,
        changes: Vec<EventKind>,
    ) -> Result<(), ThermodiffError> {
        for kind in changes {
            debug!(device = %device, ?kind, "virtual device changed");
            self.publisher.publish(Event::new(device.clone(), kind)).await?;
        }
        Ok(())
    }
}

impl<P> VirtualHub<P>
where
    P: EventPublisher + Clone + 'static,
{
    /// Run [`tick`](Self::tick) every `period` until shutdown.
    pub fn spawn_simulation(
        &self,
        period: Duration,
        rate: f64,
        mut shutdown: ShutdownSignal,
    ) -> JoinHandle<()> {
        let hub = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                tokio::select! {
                    () = shutdown.triggered() => break,
                    _ = interval.tick() => {
                        if let Err(err) = hub.tick(rate).await {
                            warn!(error = %err, "virtual simulation step failed");
                        }
                    }
                }
            }
            debug!("virtual simulation stopped");
        })
    }
}

impl<P: EventPublisher> StateSource for VirtualHub<P> {
    async fn read(&self, device: &DeviceId) -> Result<ThermostatReading, ThermodiffError> {
        self.thermostat(device)
            .map(|t| t.reading())
            .ok_or_else(|| not_found("Thermostat", device).into())
    }

    async fn window_open(&self, sensor: &DeviceId) -> Result<bool, ThermodiffError> {
        let devices = self.lock();
        devices
            .windows
            .get(sensor)
            .map(VirtualWindow::is_open)
            .ok_or_else(|| not_found("Window", sensor).into())
    }
}

impl<P: EventPublisher> CommandSink for VirtualHub<P> {
    async fn set_target(&self, device: &DeviceId, temperature: f64) -> Result<(), CommandFailure> {
        let changes = self
            .command(device, temperature)
            .map_err(|err| CommandFailure::new(device.clone(), temperature, err))?;
        if let Err(err) = self.publish_all(device, changes).await {
            warn!(device = %device, error = %err, "failed to publish virtual device changes");
        }
        Ok(())
    }
}

fn not_found(entity: &'static str, device: &DeviceId) -> NotFoundError {
    NotFoundError {
        entity,
        id: device.to_string(),
    }
}
