//! Differential controller: one adjust-wait-restore cycle for one thermostat.
//!
//! A cycle reads the thermostat, decides whether to nudge its target
//! ([`plan`]), issues the adjusted target, waits for the hvac action to flip
//! (or for the timeout), then restores the original target. The original
//! target travels in the cycle's own [`PendingAdjustment`], so restoration
//! happens even if the device drops off in between.

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use thermodiff_domain::adjustment::{PendingAdjustment, plan};
use thermodiff_domain::cycle::{CycleOutcome, SkipReason, WakeReason};
use thermodiff_domain::differential::DifferentialConfig;
use thermodiff_domain::error::CommandFailure;
use thermodiff_domain::event::Event;

use crate::ports::{CommandSink, EventSubscriber, StateSource};
use crate::shutdown::ShutdownSignal;
use crate::wait::{hold, wait_for_condition};

/// What a cycle did, plus every command that failed along the way.
#[derive(Debug)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub failures: Vec<CommandFailure>,
}

impl CycleReport {
    #[must_use]
    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            outcome: CycleOutcome::Skipped { reason },
            failures: Vec::new(),
        }
    }

    /// Collapse into the outcome, or the first command failure.
    ///
    /// # Errors
    ///
    /// Returns the first [`CommandFailure`] recorded during the cycle.
    pub fn into_result(self) -> Result<CycleOutcome, CommandFailure> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure),
            None => Ok(self.outcome),
        }
    }
}

/// Controller for a single thermostat.
pub struct DifferentialController<S, C, B> {
    config: DifferentialConfig,
    source: S,
    sink: C,
    bus: B,
}

impl<S, C, B> DifferentialController<S, C, B>
where
    S: StateSource,
    C: CommandSink,
    B: EventSubscriber,
{
    /// Create a controller for the device named in `config`.
    pub fn new(config: DifferentialConfig, source: S, sink: C, bus: B) -> Self {
        Self {
            config,
            source,
            sink,
            bus,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DifferentialConfig {
        &self.config
    }

    /// Run a full cycle: evaluate, and execute if an adjustment is due.
    pub async fn run_cycle(&self, shutdown: &mut ShutdownSignal) -> CycleReport {
        match self.evaluate().await {
            Ok(adjustment) => self.execute(adjustment, shutdown).await,
            Err(reason) => CycleReport::skipped(reason),
        }
    }

    /// Read the thermostat and decide whether an adjustment is due.
    ///
    /// Has no side effects on the device.
    ///
    /// # Errors
    ///
    /// Returns the [`SkipReason`] when no adjustment should start.
    #[tracing::instrument(skip(self), fields(device = %self.config.device()))]
    pub async fn evaluate(&self) -> Result<PendingAdjustment, SkipReason> {
        let device = self.config.device();

        let reading = match self.source.read(device).await {
            Ok(reading) => reading,
            Err(err) => {
                warn!(error = %err, "failed to read thermostat");
                return Err(SkipReason::SourceError);
            }
        };
        let reading = match reading.validate(device) {
            Ok(reading) => reading,
            Err(err) => {
                debug!(error = %err, "skipping cycle");
                return Err(SkipReason::Unavailable);
            }
        };

        if let Some(window) = self.config.window() {
            match self.source.window_open(window).await {
                Ok(true) => {
                    debug!(window = %window, "window open, skipping cycle");
                    return Err(SkipReason::WindowOpen);
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(window = %window, error = %err, "window state unknown, not blocking");
                }
            }
        }

        plan(device, &reading, self.config.differential()).ok_or_else(|| {
            debug!(
                current = reading.current,
                target = reading.target,
                action = %reading.hvac_action,
                "no adjustment needed"
            );
            SkipReason::NotNeeded
        })
    }

    /// Apply `adjustment`, wait for the flip or timeout, and restore.
    ///
    /// Restoration is attempted exactly once regardless of how the wait
    /// ended or whether the adjustment command itself succeeded.
    #[tracing::instrument(
        skip(self, adjustment, shutdown),
        fields(device = %adjustment.device, cycle = %adjustment.cycle)
    )]
    pub async fn execute(
        &self,
        adjustment: PendingAdjustment,
        shutdown: &mut ShutdownSignal,
    ) -> CycleReport {
        let mut failures = Vec::new();
        // Subscribe before commanding so the flip cannot slip past us.
        let mut events = self.bus.subscribe();

        info!(
            direction = %adjustment.direction,
            from = adjustment.original_target,
            to = adjustment.adjusted_target,
            "adjusting target"
        );
        if let Err(failure) = self
            .sink
            .set_target(&adjustment.device, adjustment.adjusted_target)
            .await
        {
            error!(error = %failure, "adjustment command failed, restoring after timeout");
            failures.push(failure);
        }

        let wake = self.await_flip(&adjustment, &mut events, shutdown).await;

        info!(wake = %wake, target = adjustment.original_target, "restoring target");
        if let Err(failure) = self
            .sink
            .set_target(&adjustment.device, adjustment.original_target)
            .await
        {
            error!(error = %failure, "restoration command failed");
            failures.push(failure);
        }

        CycleReport {
            outcome: CycleOutcome::Completed { adjustment, wake },
            failures,
        }
    }

    async fn await_flip(
        &self,
        adjustment: &PendingAdjustment,
        events: &mut broadcast::Receiver<Event>,
        shutdown: &mut ShutdownSignal,
    ) -> WakeReason {
        if !hold(self.config.delay(), shutdown).await {
            return WakeReason::Cancelled;
        }

        // Catches a flip the event stream never reported.
        if let Ok(reading) = self.source.read(&adjustment.device).await
            && adjustment.is_flip(reading.hvac_action)
        {
            return WakeReason::ConditionMet;
        }

        wait_for_condition(
            events,
            |event| {
                event
                    .hvac_action_of(&adjustment.device)
                    .is_some_and(|action| adjustment.is_flip(action))
            },
            self.config.timeout(),
            shutdown,
        )
        .await
    }
}
