//! # thermodiff-app
//!
//! Application layer: the differential controller and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `StateSource`: thermostat readings and window contacts
//!   - `CommandSink`: set-target commands
//!   - `EventPublisher` / `EventSubscriber`: state-change events
//! - Provide the **controller** (one cycle: read, adjust, wait, restore)
//! - Provide the **supervisor** (one serialized worker per device, trigger routing,
//!   overlap policy, status registry)
//! - Provide **in-process infrastructure** (event bus, shutdown signal, waits)
//!   that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `thermodiff-domain` only (plus `tokio` for tasks, channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod controller;
pub mod event_bus;
pub mod ports;
pub mod shutdown;
pub mod status;
pub mod supervisor;
pub mod wait;
