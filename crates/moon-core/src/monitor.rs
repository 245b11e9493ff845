use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    config::MonitorConfig,
    heart_rate::HeartRateSource,
    motion::{MotionSource, OrientationSample},
    status::{MonitorStatus, SleepDecision},
};

/// Whether the monitor keeps scheduling rounds.
///
/// Moves from `Active` to `Stopped` once, on the first "sleeping"
/// decision, and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    Active,
    Stopped,
}

/// Why [`SleepMonitor::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Asleep,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorOutcome {
    pub reason: StopReason,
    pub final_decision: SleepDecision,
    pub rounds_completed: u64,
    pub ticks_fired: u64,
    /// Ticks dropped because the previous round's fetch was still pending
    pub ticks_skipped: u64,
}

/// Periodically samples motion and heart rate and publishes a sleep decision.
///
/// Each tick starts one round: make sure motion is reporting, fetch the
/// day's average heart rate in a background task, then classify against
/// whatever orientation is latest when the fetch resolves. Fetches are
/// serialized: a tick that fires while a fetch is still pending is
/// skipped, so at most one round is in flight and decisions publish in
/// tick order.
pub struct SleepMonitor {
    config: MonitorConfig,
    motion: MotionSource,
    heart_rate: Arc<HeartRateSource>,
    status_tx: watch::Sender<MonitorStatus>,
    poll_state: PollState,
}

impl SleepMonitor {
    #[must_use]
    pub fn new(config: MonitorConfig, motion: MotionSource, heart_rate: HeartRateSource) -> Self {
        let (status_tx, _rx) = watch::channel(MonitorStatus {
            polling: true,
            ..MonitorStatus::default()
        });
        Self {
            config,
            motion,
            heart_rate: Arc::new(heart_rate),
            status_tx,
            poll_state: PollState::Active,
        }
    }

    /// Receive every published status
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MonitorStatus> {
        self.status_tx.subscribe()
    }

    /// Live roll/pitch, updated on every motion sensor tick
    #[must_use]
    pub fn orientation(&self) -> watch::Receiver<Option<OrientationSample>> {
        self.motion.register().subscribe()
    }

    #[must_use]
    pub fn status(&self) -> MonitorStatus {
        self.status_tx.borrow().clone()
    }

    #[must_use]
    pub const fn poll_state(&self) -> PollState {
        self.poll_state
    }

    /// Run rounds every tick until a round decides "sleeping" or `cancel` fires.
    ///
    /// Motion updates are stopped before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if polling already stopped on an earlier run.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<MonitorOutcome> {
        if self.poll_state == PollState::Stopped {
            anyhow::bail!("Sleep was already detected; polling does not restart");
        }
        self.status_tx.send_modify(|status| status.polling = true);

        let mut ticker = interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let (round_tx, mut round_rx) = mpsc::channel::<Option<f64>>(1);
        let mut fetch_pending = false;
        let mut ticks_fired = 0u64;
        let mut ticks_skipped = 0u64;

        log::info!(
            "Sleep monitor started (tick every {:.1}s)",
            self.config.tick_interval_secs
        );

        let reason = loop {
            // A finished round is handled before a tick that is ready in the same poll
            tokio::select! {
                biased;

                Some(heart_rate) = round_rx.recv() => {
                    fetch_pending = false;
                    if self.complete_round(heart_rate).is_sleeping() {
                        self.poll_state = PollState::Stopped;
                        break StopReason::Asleep;
                    }
                }
                () = cancel.cancelled() => {
                    log::info!("Sleep monitor cancelled");
                    break StopReason::Cancelled;
                }
                _ = ticker.tick() => {
                    ticks_fired += 1;
                    if fetch_pending {
                        ticks_skipped += 1;
                        log::debug!("Tick {ticks_fired}: previous heart rate fetch still pending, skipping");
                    } else {
                        log::debug!("Tick {ticks_fired}: starting round");
                        self.motion.start(self.config.motion_update_interval());
                        self.spawn_fetch(round_tx.clone(), cancel.child_token());
                        fetch_pending = true;
                    }
                }
            }
        };

        self.motion.stop();
        self.status_tx.send_modify(|status| status.polling = false);

        let status = self.status();
        log::info!(
            "Sleep monitor stopped after {} rounds: {}",
            status.rounds_completed,
            status.decision
        );

        Ok(MonitorOutcome {
            reason,
            final_decision: status.decision,
            rounds_completed: status.rounds_completed,
            ticks_fired,
            ticks_skipped,
        })
    }

    fn spawn_fetch(&self, round_tx: mpsc::Sender<Option<f64>>, cancel: CancellationToken) {
        let heart_rate = Arc::clone(&self.heart_rate);
        tokio::spawn(async move {
            let reading = tokio::select! {
                reading = heart_rate.fetch_reading() => reading,
                () = cancel.cancelled() => return,
            };
            // Receiver is gone once the monitor has stopped
            let _ = round_tx.send(reading).await;
        });
    }

    /// Classify against the latest orientation and publish the decision
    fn complete_round(&self, heart_rate: Option<f64>) -> SleepDecision {
        let orientation = self.motion.latest();
        let decision = SleepDecision::from_classification(
            self.config.thresholds.classify_round(orientation, heart_rate),
        );

        self.status_tx.send_modify(|status| {
            status.decision = decision;
            status.roll = orientation.map(|o| o.roll);
            status.pitch = orientation.map(|o| o.pitch);
            status.heart_rate = heart_rate;
            status.rounds_completed += 1;
        });

        log::info!(
            "{decision} (roll: {}, pitch: {}, heart rate: {})",
            fmt_scalar(orientation.map(|o| o.roll), 5),
            fmt_scalar(orientation.map(|o| o.pitch), 5),
            fmt_scalar(heart_rate, 1),
        );
        decision
    }
}

fn fmt_scalar(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| String::from("-"), |v| format!("{v:.precision$}"))
}
