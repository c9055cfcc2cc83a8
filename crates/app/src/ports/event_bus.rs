//! Event bus ports: publish/subscribe for state-change events.

use std::future::Future;

use tokio::sync::broadcast;

use thermodiff_domain::error::ThermodiffError;
use thermodiff_domain::event::Event;

/// Publishes events to interested subscribers.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), ThermodiffError>> + Send;
}

/// Hands out receivers for events published from now on.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe to events published *after* this call.
    fn subscribe(&self) -> broadcast::Receiver<Event>;
}

impl<T: EventPublisher> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), ThermodiffError>> + Send {
        (**self).publish(event)
    }
}

impl<T: EventSubscriber> EventSubscriber for std::sync::Arc<T> {
    fn subscribe(&self) -> broadcast::Receiver<Event> {
        (**self).subscribe()
    }
}
