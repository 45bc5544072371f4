//! The monitoring loop and its handle.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::AmpgateError;
use crate::source::{ActivitySource, SourceRole};
use crate::switch::SwitchChain;

use super::state::ActivationState;
use super::timer::ShutoffTimer;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_RECOVERY_INTERVAL: Duration = Duration::from_secs(5);

/// Activity-driven power control loop.
///
/// Each tick polls trigger sources first (they may power the rig on),
/// then keep-alive sources (they only hold it on), re-arms the idle
/// timer on any activity, and shuts the rig off once the timer
/// expires. A state snapshot is published after every tick.
pub struct ActivationLoop {
    sources: Vec<Arc<dyn ActivitySource>>,
    chain: Arc<SwitchChain>,
    timer: ShutoffTimer,
    tick_interval: Duration,
    recovery_interval: Duration,
}

impl ActivationLoop {
    pub fn new(chain: Arc<SwitchChain>, timer: ShutoffTimer) -> Self {
        Self {
            sources: Vec::new(),
            chain,
            timer,
            tick_interval: DEFAULT_TICK_INTERVAL,
            recovery_interval: DEFAULT_RECOVERY_INTERVAL,
        }
    }

    /// Add a source. Polling order within a role follows insertion
    /// order; the first active source wins the tick.
    pub fn with_source(mut self, source: Arc<dyn ActivitySource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Sleep used after a failed tick instead of the full interval, so
    /// a transient outage is re-checked sooner.
    pub fn with_recovery_interval(mut self, interval: Duration) -> Self {
        self.recovery_interval = interval;
        self
    }

    /// Run the readiness checks and spawn the monitoring task.
    ///
    /// Every source must pass `check_ready` before the first tick; a
    /// missing credential refuses startup here instead of failing on
    /// every poll.
    pub async fn start(mut self) -> Result<LoopHandle, AmpgateError> {
        for source in &self.sources {
            if let Err(err) = source.check_ready().await {
                tracing::error!(
                    source = source.name(),
                    error = %err,
                    "Source failed readiness check; refusing to start"
                );
                return Err(err);
            }
        }

        // A rig left powered with nothing playing still shuts off one
        // full idle window after startup.
        self.timer.reset();

        let (state_tx, state_rx) = watch::channel(ActivationState::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(self.run(state_tx, shutdown_rx));

        Ok(LoopHandle {
            shutdown_tx: Some(shutdown_tx),
            state_rx,
            task,
        })
    }

    async fn run(
        mut self,
        state_tx: watch::Sender<ActivationState>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<(), AmpgateError> {
        tracing::info!(
            tick_secs = self.tick_interval.as_secs(),
            idle_minutes = self.timer.threshold().num_minutes(),
            sources = self.sources.len(),
            "Monitoring started"
        );

        loop {
            let sleep_for = match self.tick(&state_tx).await {
                Ok(()) => self.tick_interval,
                Err(err) if err.is_fatal() => {
                    tracing::error!(error = %err, "Monitoring halted by fatal error");
                    let _ = state_tx.send(ActivationState::default());
                    return Err(err);
                }
                Err(err) => {
                    tracing::error!(
                        category = ?err.category(),
                        error = %err,
                        "Tick failed; backing off"
                    );
                    self.recovery_interval
                }
            };

            tokio::select! {
                _ = &mut shutdown_rx => {
                    tracing::info!("Monitoring stopped");
                    let _ = state_tx.send(ActivationState::default());
                    return Ok(());
                }
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }
    }

    async fn tick(&mut self, state_tx: &watch::Sender<ActivationState>) -> Result<(), AmpgateError> {
        let mut active: Option<String> = None;

        for source in &self.sources {
            if source.role() != SourceRole::Trigger {
                continue;
            }
            if self.observe(source.as_ref()).await? {
                active = Some(source.name().to_string());
                if !self.chain.is_on().await? {
                    if let Err(err) = self.chain.power_on().await {
                        tracing::warn!(
                            source = source.name(),
                            error = %err,
                            "Power-on failed; will retry next tick"
                        );
                    }
                }
                break;
            }
        }

        if active.is_none() {
            for source in &self.sources {
                if source.role() != SourceRole::KeepAlive {
                    continue;
                }
                if self.observe(source.as_ref()).await? {
                    active = Some(source.name().to_string());
                    break;
                }
            }
        }

        let now = Utc::now();
        if active.is_some() {
            self.timer.reset_at(now);
        } else if self.timer.is_expired_at(now) {
            tracing::info!("Idle window elapsed; shutting the rig off");
            match self.chain.power_off().await {
                Ok(()) => self.timer.reset(),
                Err(err) => {
                    tracing::warn!(error = %err, "Shutoff failed; will retry next tick");
                }
            }
        }

        let powered = self.chain.is_on().await?;
        let _ = state_tx.send(ActivationState {
            running: true,
            powered,
            active_source: active.clone(),
            shutoff_deadline: self.timer.deadline(),
        });

        tracing::debug!(
            active_source = active.as_deref().unwrap_or("none"),
            powered,
            minutes_remaining = self.timer.minutes_remaining(),
            "Tick complete"
        );

        Ok(())
    }

    /// Poll one source, degrading non-fatal failures to "inactive".
    ///
    /// A source that cannot be read contributes no observation this
    /// tick; the next tick polls it again. Authentication failures
    /// propagate and halt the loop.
    async fn observe(&self, source: &dyn ActivitySource) -> Result<bool, AmpgateError> {
        match source.is_active().await {
            Ok(active) => Ok(active),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                tracing::warn!(
                    source = source.name(),
                    category = ?err.category(),
                    error = %err,
                    "Activity poll failed; counting source as inactive"
                );
                Ok(false)
            }
        }
    }
}

/// Handle for a running monitoring loop.
///
/// Dropping the handle stops the loop; keep it alive for as long as
/// monitoring should run.
pub struct LoopHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    state_rx: watch::Receiver<ActivationState>,
    task: JoinHandle<Result<(), AmpgateError>>,
}

impl LoopHandle {
    /// Subscribe to state snapshots.
    pub fn watch_state(&self) -> watch::Receiver<ActivationState> {
        self.state_rx.clone()
    }

    /// Latest published state.
    pub fn state(&self) -> ActivationState {
        self.state_rx.borrow().clone()
    }

    /// Wait for the loop to stop on its own; a fatal error surfaces
    /// here.
    pub async fn wait(&mut self) -> Result<(), AmpgateError> {
        join_result(&mut self.task).await
    }

    /// Signal shutdown, let the in-flight tick finish, and wait for
    /// the task to exit.
    pub async fn shutdown(mut self) -> Result<(), AmpgateError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        join_result(&mut self.task).await
    }
}

async fn join_result(
    task: &mut JoinHandle<Result<(), AmpgateError>>,
) -> Result<(), AmpgateError> {
    match task.await {
        Ok(result) => result,
        Err(err) => Err(AmpgateError::InvalidState(format!(
            "monitor task failed: {err}"
        ))),
    }
}
