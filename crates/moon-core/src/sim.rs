//! Scripted stand-ins for the motion sensor and the health store.
//!
//! These let the monitor run end to end on machines without the real
//! hardware, and give tests full control over what each collaborator
//! reports and when.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{HeartRateError, MotionError};
use crate::heart_rate::{HealthStore, HeartRateSample};
use crate::motion::{AttitudeSensor, OrientationSample};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct AttitudeScript {
    readings: Vec<OrientationSample>,
    cursor: usize,
    failure: Option<String>,
}

/// Attitude sensor that replays a fixed list of readings.
///
/// Once the list is exhausted the last reading repeats. An empty list
/// reports nothing.
pub struct ScriptedAttitudeSensor {
    available: bool,
    script: Mutex<AttitudeScript>,
    reads: AtomicUsize,
}

impl ScriptedAttitudeSensor {
    #[must_use]
    pub fn new(readings: Vec<OrientationSample>) -> Self {
        Self {
            available: true,
            script: Mutex::new(AttitudeScript {
                readings,
                cursor: 0,
                failure: None,
            }),
            reads: AtomicUsize::new(0),
        }
    }

    /// A device without a motion sensor
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(Vec::new())
        }
    }

    /// Make every subsequent read fail with `message`
    pub fn fail_reads(&self, message: &str) {
        lock(&self.script).failure = Some(message.to_string());
    }

    /// Number of reads attempted so far
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl AttitudeSensor for ScriptedAttitudeSensor {
    fn is_available(&self) -> bool {
        self.available
    }

    fn read_attitude(&self) -> Result<Option<OrientationSample>, MotionError> {
        if !self.available {
            return Err(MotionError::SensorUnavailable);
        }
        self.reads.fetch_add(1, Ordering::SeqCst);

        let mut script = lock(&self.script);
        if let Some(message) = &script.failure {
            return Err(MotionError::ReadFailed(message.clone()));
        }
        let Some(last) = script.readings.len().checked_sub(1) else {
            return Ok(None);
        };
        let sample = script.readings[script.cursor.min(last)];
        script.cursor += 1;
        Ok(Some(sample))
    }
}

/// How a scripted health store answers the authorization request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationOutcome {
    #[default]
    Granted,
    Denied,
    Error,
}

/// Health store that answers each query with the next scripted batch.
///
/// Batch values are stamped with the query's end time, so they always
/// fall inside the requested range. The last batch repeats once the
/// queue runs dry. Samples added with [`Self::with_history`] are
/// filtered by range like a real store would.
pub struct ScriptedHealthStore {
    authorization: AuthorizationOutcome,
    batches: Mutex<VecDeque<Vec<f64>>>,
    history: Vec<HeartRateSample>,
    latency: Duration,
    query_failure: Mutex<Option<String>>,
    authorization_requests: AtomicUsize,
    queries: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedHealthStore {
    #[must_use]
    pub fn new(batches: Vec<Vec<f64>>) -> Self {
        Self {
            authorization: AuthorizationOutcome::Granted,
            batches: Mutex::new(batches.into()),
            history: Vec::new(),
            latency: Duration::ZERO,
            query_failure: Mutex::new(None),
            authorization_requests: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_authorization(mut self, outcome: AuthorizationOutcome) -> Self {
        self.authorization = outcome;
        self
    }

    /// Delay every query by `latency`
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<HeartRateSample>) -> Self {
        self.history = history;
        self
    }

    /// Make every subsequent query fail with `message`
    pub fn fail_queries(&self, message: &str) {
        *lock(&self.query_failure) = Some(message.to_string());
    }

    #[must_use]
    pub fn authorization_requests(&self) -> usize {
        self.authorization_requests.load(Ordering::SeqCst)
    }

    /// Number of queries started so far
    #[must_use]
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Most queries that were ever pending at the same time
    #[must_use]
    pub fn max_concurrent_queries(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_batch(&self) -> Vec<f64> {
        let mut batches = lock(&self.batches);
        if batches.len() > 1 {
            batches.pop_front().unwrap_or_default()
        } else {
            batches.front().cloned().unwrap_or_default()
        }
    }
}

#[async_trait]
impl HealthStore for ScriptedHealthStore {
    async fn request_authorization(&self) -> Result<bool, HeartRateError> {
        self.authorization_requests.fetch_add(1, Ordering::SeqCst);
        match self.authorization {
            AuthorizationOutcome::Granted => Ok(true),
            AuthorizationOutcome::Denied => Ok(false),
            AuthorizationOutcome::Error => Err(HeartRateError::Authorization(String::from(
                "health data is not available on this device",
            ))),
        }
    }

    async fn heart_rate_samples(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HeartRateSample>, HeartRateError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let pending = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(pending, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failure = lock(&self.query_failure).clone();
        if let Some(message) = failure {
            return Err(HeartRateError::Query(message));
        }

        let mut samples: Vec<HeartRateSample> = self
            .history
            .iter()
            .filter(|s| s.collected_at >= start && s.collected_at <= end)
            .copied()
            .collect();
        samples.extend(
            self.next_batch()
                .into_iter()
                .map(|bpm| HeartRateSample::new(bpm, end)),
        );
        Ok(samples)
    }
}

/// Motion half of a [`Scenario`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionScript {
    pub available: bool,
    /// `[roll, pitch]` pairs in radians, one per sensor update
    pub readings: Vec<[f64; 2]>,
}

impl Default for MotionScript {
    fn default() -> Self {
        Self {
            available: true,
            readings: vec![[0.82, 0.41], [0.47, 0.22], [0.18, 0.09], [0.04, -0.02]],
        }
    }
}

/// Heart rate half of a [`Scenario`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartRateScript {
    pub authorization: AuthorizationOutcome,
    /// Samples returned per query, in beats/min
    pub batches: Vec<Vec<f64>>,
    pub latency_ms: u64,
}

impl Default for HeartRateScript {
    fn default() -> Self {
        Self {
            authorization: AuthorizationOutcome::Granted,
            batches: vec![vec![112.0, 108.0], vec![104.0, 101.0], vec![68.0, 64.0]],
            latency_ms: 250,
        }
    }
}

/// Scripted collaborators for a whole run, loadable from TOML.
///
/// ```toml
/// [motion]
/// available = true
/// readings = [[0.6, 0.2], [0.1, 0.05]]
///
/// [heart_rate]
/// authorization = "granted"
/// batches = [[110.0, 104.0], [72.0, 68.0]]
/// latency_ms = 200
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub motion: MotionScript,
    pub heart_rate: HeartRateScript,
}

impl Scenario {
    /// Load a scenario from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse scenario {}", path.display()))
    }

    #[must_use]
    pub fn attitude_sensor(&self) -> Arc<ScriptedAttitudeSensor> {
        if !self.motion.available {
            return Arc::new(ScriptedAttitudeSensor::unavailable());
        }
        let readings = self
            .motion
            .readings
            .iter()
            .map(|[roll, pitch]| OrientationSample::new(*roll, *pitch))
            .collect();
        Arc::new(ScriptedAttitudeSensor::new(readings))
    }

    #[must_use]
    pub fn health_store(&self) -> Arc<ScriptedHealthStore> {
        Arc::new(
            ScriptedHealthStore::new(self.heart_rate.batches.clone())
                .with_authorization(self.heart_rate.authorization)
                .with_latency(Duration::from_millis(self.heart_rate.latency_ms)),
        )
    }
}
