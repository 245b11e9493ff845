//! Error types for the two sensor collaborators.
//!
//! None of these are fatal: the monitor turns every one of them into
//! "no data" for the round and keeps polling.

use thiserror::Error;

/// Failures reported by the motion sensor driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MotionError {
    #[error("device motion is not available")]
    SensorUnavailable,

    #[error("error fetching device motion data: {0}")]
    ReadFailed(String),
}

/// Failures reported while authorizing or querying heart-rate data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeartRateError {
    #[error("heart rate read authorization was denied")]
    AuthorizationDenied,

    #[error("error requesting heart rate authorization: {0}")]
    Authorization(String),

    #[error("error fetching heart rate samples: {0}")]
    Query(String),

    #[error("no heart rate samples in the requested range")]
    EmptySampleSet,
}
