use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{AttitudeSensor, OrientationRegister, OrientationSample};
use crate::error::MotionError;

enum ReportingState {
    Idle,
    Reporting(CancellationToken),
    /// Sensor missing; stays here for the rest of the session
    Unavailable,
}

/// Continuously copies the sensor's attitude into an [`OrientationRegister`].
pub struct MotionSource {
    sensor: Arc<dyn AttitudeSensor>,
    register: OrientationRegister,
    state: Mutex<ReportingState>,
}

impl MotionSource {
    #[must_use]
    pub fn new(sensor: Arc<dyn AttitudeSensor>) -> Self {
        Self {
            sensor,
            register: OrientationRegister::new(),
            state: Mutex::new(ReportingState::Idle),
        }
    }

    /// Begin reporting every `update_interval`. Idempotent.
    ///
    /// The register is primed with one immediate reading so a round that
    /// completes right after the first start has data to classify. An
    /// unavailable sensor is logged and leaves [`Self::latest`] at `None`
    /// for the session; it never fails the caller.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, update_interval: Duration) {
        let mut state = self.lock_state();
        match *state {
            ReportingState::Reporting(_) | ReportingState::Unavailable => return,
            ReportingState::Idle => {}
        }

        if !self.sensor.is_available() {
            log::warn!("{}", MotionError::SensorUnavailable);
            *state = ReportingState::Unavailable;
            return;
        }

        read_into(self.sensor.as_ref(), &self.register);

        let token = CancellationToken::new();
        let task_token = token.clone();
        let sensor = Arc::clone(&self.sensor);
        let register = self.register.clone();

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + update_interval, update_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => read_into(sensor.as_ref(), &register),
                    () = task_token.cancelled() => break,
                }
            }
            log::debug!("Motion updates stopped");
        });

        log::info!(
            "Started motion updates every {:.1}s",
            update_interval.as_secs_f64()
        );
        *state = ReportingState::Reporting(token);
    }

    /// Halt reporting. The last sample stays in the register.
    pub fn stop(&self) {
        let mut state = self.lock_state();
        if let ReportingState::Reporting(token) = &*state {
            token.cancel();
            *state = ReportingState::Idle;
        }
    }

    #[must_use]
    pub fn latest(&self) -> Option<OrientationSample> {
        self.register.latest()
    }

    #[must_use]
    pub fn register(&self) -> &OrientationRegister {
        &self.register
    }

    #[must_use]
    pub fn is_reporting(&self) -> bool {
        matches!(*self.lock_state(), ReportingState::Reporting(_))
    }

    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(*self.lock_state(), ReportingState::Unavailable)
    }

    fn lock_state(&self) -> MutexGuard<'_, ReportingState> {
        // The state is a plain enum; a poisoned lock still holds a valid value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MotionSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_into(sensor: &dyn AttitudeSensor, register: &OrientationRegister) {
    match sensor.read_attitude() {
        Ok(Some(sample)) => register.write(sample),
        Ok(None) => {}
        Err(e) => log::warn!("{e}"),
    }
}
