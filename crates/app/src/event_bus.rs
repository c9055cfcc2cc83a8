//! In-process event bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use thermodiff_domain::error::ThermodiffError;
use thermodiff_domain::event::Event;

use crate::ports::{EventPublisher, EventSubscriber};

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped). Clones share the same channel.
#[derive(Clone)]
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), ThermodiffError>> + Send {
        tracing::trace!(kind = ?event.kind, device = ?event.device, "publishing event");
        // broadcast::send fails only when there are zero receivers.
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}

impl EventSubscriber for InProcessEventBus {
    fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}
