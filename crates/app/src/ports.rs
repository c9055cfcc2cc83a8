//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the controller and the outside world.
//! They are defined here (in `app`) so that both the controller and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod command_sink;
pub mod event_bus;
pub mod state_source;

pub use command_sink::CommandSink;
pub use event_bus::{EventPublisher, EventSubscriber};
pub use state_source::StateSource;
