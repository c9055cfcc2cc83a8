//! Supervisor: one serialized worker per thermostat.
//!
//! A router task subscribes to the event bus and forwards trigger events
//! (temperature changes, start) to the worker owning the device; `Started`
//! goes to every worker. Each worker runs at most one cycle at a time.
//!
//! A device trigger only starts a cycle once the device has gone quiet for
//! the configured stability window. Triggers that arrive while a cycle runs
//! are dropped or collapsed into a single re-evaluation, depending on the
//! [`OverlapPolicy`]; the device reporting targets the cycle itself set is
//! never counted. After a cycle that issued commands, device triggers are
//! suppressed for the cooldown.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use thermodiff_domain::adjustment::PendingAdjustment;
use thermodiff_domain::differential::{DifferentialConfig, OverlapPolicy};
use thermodiff_domain::error::ConfigurationError;
use thermodiff_domain::event::Event;
use thermodiff_domain::id::DeviceId;

use crate::controller::{CycleReport, DifferentialController};
use crate::ports::{CommandSink, EventSubscriber, StateSource};
use crate::shutdown::{Shutdown, ShutdownSignal};
use crate::status::StatusRegistry;

const TRIGGER_QUEUE: usize = 16;

/// Running set of controller workers.
pub struct Supervisor {
    shutdown: Shutdown,
    status: Arc<StatusRegistry>,
    tasks: Vec<JoinHandle<()>>,
}

impl Supervisor {
    /// Spawn one worker per configuration plus the trigger router.
    ///
    /// The router subscribes before this returns, so any event published
    /// afterwards (including the initial `Started`) is routed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateDevice`] if two configurations
    /// name the same thermostat.
    pub fn spawn<S, C, B>(
        configs: Vec<DifferentialConfig>,
        policy: OverlapPolicy,
        source: S,
        sink: C,
        bus: B,
    ) -> Result<Self, ConfigurationError>
    where
        S: StateSource + Clone + 'static,
        C: CommandSink + Clone + 'static,
        B: EventSubscriber + Clone + 'static,
    {
        let mut seen = HashSet::new();
        for config in &configs {
            if !seen.insert(config.device()) {
                return Err(ConfigurationError::DuplicateDevice(config.device().clone()));
            }
        }

        let shutdown = Shutdown::new();
        let status = Arc::new(StatusRegistry::new(&configs));
        let events = bus.subscribe();
        let mut routes = HashMap::with_capacity(configs.len());
        let mut tasks = Vec::with_capacity(configs.len() + 1);

        for config in configs {
            let (sender, triggers) = mpsc::channel(TRIGGER_QUEUE);
            routes.insert(config.device().clone(), sender);
            info!(
                device = %config.device(),
                differential = config.differential().degrees(),
                ?policy,
                "starting controller"
            );
            let worker = Worker {
                controller: DifferentialController::new(
                    config,
                    source.clone(),
                    sink.clone(),
                    bus.clone(),
                ),
                triggers,
                policy,
                status: Arc::clone(&status),
                shutdown: shutdown.signal(),
            };
            tasks.push(tokio::spawn(worker.run()));
        }
        tasks.push(tokio::spawn(route(events, routes, shutdown.signal())));

        Ok(Self {
            shutdown,
            status,
            tasks,
        })
    }

    /// Shared view of every controller's status.
    #[must_use]
    pub fn status(&self) -> Arc<StatusRegistry> {
        Arc::clone(&self.status)
    }

    /// Stop routing, cancel in-flight waits (restoring their targets), and
    /// wait for every task to finish.
    pub async fn shutdown(self) {
        self.shutdown.trigger();
        for task in self.tasks {
            if let Err(err) = task.await {
                error!(error = %err, "controller task failed");
            }
        }
        info!("all controllers stopped");
    }
}

async fn route(
    mut events: broadcast::Receiver<Event>,
    routes: HashMap<DeviceId, mpsc::Sender<Event>>,
    mut shutdown: ShutdownSignal,
) {
    loop {
        let event = tokio::select! {
            () = shutdown.triggered() => break,
            received = events.recv() => match received {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "router fell behind, re-evaluating every device");
                    Event::started()
                }
                Err(RecvError::Closed) => {
                    debug!("event bus closed, router stopping");
                    break;
                }
            },
        };
        if !event.kind.is_trigger() {
            continue;
        }
        match &event.device {
            Some(device) => {
                if let Some(sender) = routes.get(device) {
                    forward(device, sender, event.clone());
                }
            }
            None => {
                for (device, sender) in &routes {
                    forward(device, sender, event.clone());
                }
            }
        }
    }
}

fn forward(device: &DeviceId, sender: &mpsc::Sender<Event>, event: Event) {
    match sender.try_send(event) {
        // A full queue already guarantees another evaluation.
        Ok(()) | Err(TrySendError::Full(_)) => {}
        Err(TrySendError::Closed(_)) => {
            debug!(device = %device, "worker gone, dropping trigger");
        }
    }
}

struct Worker<S, C, B> {
    controller: DifferentialController<S, C, B>,
    triggers: mpsc::Receiver<Event>,
    policy: OverlapPolicy,
    status: Arc<StatusRegistry>,
    shutdown: ShutdownSignal,
}

impl<S, C, B> Worker<S, C, B>
where
    S: StateSource,
    C: CommandSink,
    B: EventSubscriber,
{
    async fn run(mut self) {
        let device = self.controller.config().device().clone();
        let cooldown = self.controller.config().cooldown();
        let mut quiet_until: Option<Instant> = None;
        let mut rerun = false;

        loop {
            if !rerun {
                let Some(trigger) = self.next_trigger().await else {
                    break;
                };
                debug!(device = %device, kind = ?trigger.kind, "trigger received");
                if trigger.device.is_some() {
                    if quiet_until.is_some_and(|until| Instant::now() < until) {
                        debug!(device = %device, "cooling down, trigger suppressed");
                        self.status.record_suppressed(&device);
                        continue;
                    }
                    if !self.settle().await {
                        break;
                    }
                }
            }
            rerun = false;

            let report = self.run_once(&device).await;
            let commanded = report.outcome.adjustment();
            if commanded.is_some() {
                quiet_until = Some(Instant::now() + cooldown);
            }

            let missed = self.drain(commanded);
            if missed > 0 {
                match self.policy {
                    OverlapPolicy::Ignore => {
                        debug!(device = %device, missed, "ignored triggers received while busy");
                        self.status.record_ignored(&device, missed);
                    }
                    OverlapPolicy::Coalesce => {
                        debug!(device = %device, missed, "coalescing triggers into one re-evaluation");
                        rerun = true;
                    }
                }
            }
            if self.shutdown.is_triggered() {
                break;
            }
        }
        debug!(device = %device, "controller stopped");
    }

    async fn next_trigger(&mut self) -> Option<Event> {
        tokio::select! {
            () = self.shutdown.triggered() => None,
            trigger = self.triggers.recv() => trigger,
        }
    }

    /// Wait until device triggers stop arriving for the stability window.
    ///
    /// `Started` cuts the wait short. Returns `false` on shutdown.
    async fn settle(&mut self) -> bool {
        let stable_for = self.controller.config().stable_for();
        if stable_for.is_zero() {
            return true;
        }
        let deadline = tokio::time::sleep(stable_for);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                () = self.shutdown.triggered() => return false,
                () = &mut deadline => return true,
                trigger = self.triggers.recv() => match trigger {
                    Some(event) if event.device.is_none() => return true,
                    Some(_) => deadline.as_mut().reset(Instant::now() + stable_for),
                    None => return false,
                },
            }
        }
    }

    async fn run_once(&mut self, device: &DeviceId) -> CycleReport {
        let report = match self.controller.evaluate().await {
            Ok(adjustment) => {
                self.status.begin(&adjustment);
                self.controller
                    .execute(adjustment, &mut self.shutdown)
                    .await
            }
            Err(reason) => CycleReport::skipped(reason),
        };
        self.status.finish(device, &report);
        report
    }

    /// Empty the queue, counting triggers other than reports of the
    /// targets `commanded` just set.
    fn drain(&mut self, commanded: Option<&PendingAdjustment>) -> u64 {
        let mut count = 0;
        while let Ok(event) = self.triggers.try_recv() {
            if commanded.is_some_and(|adjustment| adjustment.is_echo(&event)) {
                continue;
            }
            count += 1;
        }
        count
    }
}
