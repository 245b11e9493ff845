use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::HeartRateError;

/// One heart rate measurement from the health store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSample {
    /// Beats per minute
    pub bpm: f64,
    pub collected_at: DateTime<Utc>,
}

impl HeartRateSample {
    #[must_use]
    pub const fn new(bpm: f64, collected_at: DateTime<Utc>) -> Self {
        Self { bpm, collected_at }
    }
}

/// Health data store boundary for platform-specific implementations
#[async_trait]
pub trait HealthStore: Send + Sync {
    /// Ask for read access to heart rate data. `Ok(false)` means denied.
    async fn request_authorization(&self) -> Result<bool, HeartRateError>;

    /// All samples collected within `[start, end]`
    async fn heart_rate_samples(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HeartRateSample>, HeartRateError>;
}

/// Arithmetic mean of the samples, or `None` for an empty set.
#[must_use]
pub fn average_bpm(samples: &[HeartRateSample]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let total: f64 = samples.iter().map(|s| s.bpm).sum();
    #[allow(clippy::cast_precision_loss)]
    let count = samples.len() as f64;
    Some(total / count)
}

/// Midnight at the start of `now`'s calendar day, in `now`'s time zone.
///
/// Falls back to `now` itself when local midnight does not exist
/// (a DST gap at 00:00).
#[must_use]
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    now.timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| now.clone())
}

/// Averages today's heart rate samples from a [`HealthStore`].
///
/// Authorization is requested lazily on the first fetch and the outcome
/// is cached for the lifetime of the source, so the store is asked at
/// most once even when fetches overlap.
pub struct HeartRateSource {
    store: Arc<dyn HealthStore>,
    authorized: OnceCell<bool>,
}

impl HeartRateSource {
    #[must_use]
    pub fn new(store: Arc<dyn HealthStore>) -> Self {
        Self {
            store,
            authorized: OnceCell::new(),
        }
    }

    /// Cached authorization outcome, `None` until first requested
    #[must_use]
    pub fn authorization(&self) -> Option<bool> {
        self.authorized.get().copied()
    }

    async fn ensure_authorized(&self) -> bool {
        *self
            .authorized
            .get_or_init(|| async {
                match self.store.request_authorization().await {
                    Ok(true) => {
                        log::info!("Heart rate read access granted");
                        true
                    }
                    Ok(false) => {
                        log::warn!("{}", HeartRateError::AuthorizationDenied);
                        false
                    }
                    Err(e) => {
                        log::warn!("{e}");
                        false
                    }
                }
            })
            .await
    }

    /// Mean heart rate over `[start, end]`
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationDenied` if read access was not granted,
    /// `EmptySampleSet` if no samples fall in the range, or the store's
    /// query error.
    pub async fn query_average_heart_rate(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64, HeartRateError> {
        if !self.ensure_authorized().await {
            return Err(HeartRateError::AuthorizationDenied);
        }

        let samples = self.store.heart_rate_samples(start, end).await?;
        log::debug!("Fetched {} heart rate samples", samples.len());
        average_bpm(&samples).ok_or(HeartRateError::EmptySampleSet)
    }

    /// Mean heart rate since local midnight
    ///
    /// # Errors
    ///
    /// See [`Self::query_average_heart_rate`].
    pub async fn fetch_average(&self) -> Result<f64, HeartRateError> {
        let now = Local::now();
        let start = start_of_day(&now);
        self.query_average_heart_rate(start.with_timezone(&Utc), now.with_timezone(&Utc))
            .await
    }

    /// [`Self::fetch_average`] with every failure logged and mapped to `None`
    pub async fn fetch_reading(&self) -> Option<f64> {
        match self.fetch_average().await {
            Ok(bpm) => Some(bpm),
            Err(HeartRateError::EmptySampleSet) => {
                log::info!("No heart rate samples recorded today");
                None
            }
            Err(HeartRateError::AuthorizationDenied) => None,
            Err(e) => {
                log::warn!("{e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests;
