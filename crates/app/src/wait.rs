//! Suspend points of a controller cycle: holding a setpoint and waiting for
//! a condition on the event stream.

use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};

use thermodiff_domain::cycle::WakeReason;
use thermodiff_domain::event::Event;

use crate::shutdown::ShutdownSignal;

/// Sleep for `delay`. Returns `false` if shutdown interrupted the hold.
pub async fn hold(delay: Duration, shutdown: &mut ShutdownSignal) -> bool {
    if delay.is_zero() {
        return !shutdown.is_triggered();
    }
    tokio::select! {
        () = tokio::time::sleep(delay) => true,
        () = shutdown.triggered() => false,
    }
}

/// Wait until an event satisfies `predicate`, `timeout` elapses, or shutdown
/// is triggered, whichever comes first.
///
/// Events already queued in `events` are examined first, so subscribing
/// before issuing a command guarantees its effect is seen. A closed bus
/// degrades to a plain timeout.
pub async fn wait_for_condition<P>(
    events: &mut broadcast::Receiver<Event>,
    mut predicate: P,
    timeout: Duration,
    shutdown: &mut ShutdownSignal,
) -> WakeReason
where
    P: FnMut(&Event) -> bool,
{
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);
    let mut bus_open = true;

    loop {
        tokio::select! {
            biased;

            () = shutdown.triggered() => return WakeReason::Cancelled,
            received = events.recv(), if bus_open => match received {
                Ok(event) => {
                    if predicate(&event) {
                        return WakeReason::ConditionMet;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "wait fell behind the event bus");
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("event bus closed while waiting");
                    bus_open = false;
                }
            },
            () = &mut deadline => return WakeReason::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::InProcessEventBus;
    use crate::ports::{EventPublisher, EventSubscriber};
    use crate::shutdown::Shutdown;
    use thermodiff_domain::event::EventKind;
    use thermodiff_domain::id::DeviceId;
    use thermodiff_domain::thermostat::HvacAction;

    fn device() -> DeviceId {
        "climate.porch".parse().unwrap()
    }

    fn flip(to: HvacAction) -> Event {
        Event::new(
            device(),
            EventKind::HvacActionChanged {
                from: HvacAction::Heating,
                to,
            },
        )
    }

    fn is_idle(event: &Event) -> bool {
        event.hvac_action_of(&device()) == Some(HvacAction::Idle)
    }

    #[tokio::test(start_paused = true)]
    async fn should_meet_condition_from_queued_event() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();
        bus.publish(flip(HvacAction::Idle)).await.unwrap();

        let start = tokio::time::Instant::now();
        let wake = wait_for_condition(
            &mut rx,
            is_idle,
            Duration::from_secs(120),
            &mut ShutdownSignal::never(),
        )
        .await;

        assert_eq!(wake, WakeReason::ConditionMet);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn should_time_out_when_no_event_matches() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();
        bus.publish(flip(HvacAction::Unknown)).await.unwrap();

        let start = tokio::time::Instant::now();
        let wake = wait_for_condition(
            &mut rx,
            is_idle,
            Duration::from_secs(120),
            &mut ShutdownSignal::never(),
        )
        .await;

        assert_eq!(wake, WakeReason::TimedOut);
        assert!(start.elapsed() >= Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_events_for_other_devices() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();
        let other: DeviceId = "climate.garage".parse().unwrap();
        bus.publish(Event::new(
            other,
            EventKind::HvacActionChanged {
                from: HvacAction::Heating,
                to: HvacAction::Idle,
            },
        ))
        .await
        .unwrap();

        let wake = wait_for_condition(
            &mut rx,
            is_idle,
            Duration::from_secs(30),
            &mut ShutdownSignal::never(),
        )
        .await;

        assert_eq!(wake, WakeReason::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn should_time_out_when_bus_is_closed() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();
        drop(bus);

        let wake = wait_for_condition(
            &mut rx,
            is_idle,
            Duration::from_secs(30),
            &mut ShutdownSignal::never(),
        )
        .await;

        assert_eq!(wake, WakeReason::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn should_cancel_on_shutdown() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();
        let shutdown = Shutdown::new();
        let mut signal = shutdown.signal();
        shutdown.trigger();

        let wake =
            wait_for_condition(&mut rx, is_idle, Duration::from_secs(120), &mut signal).await;

        assert_eq!(wake, WakeReason::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn should_hold_for_delay() {
        let start = tokio::time::Instant::now();
        assert!(hold(Duration::from_secs(10), &mut ShutdownSignal::never()).await);
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_holding_on_shutdown() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.signal();
        shutdown.trigger();
        assert!(!hold(Duration::from_secs(10), &mut signal).await);
    }
}
