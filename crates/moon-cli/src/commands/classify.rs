//! One-shot classification command

use moon_core::{MonitorConfig, OrientationSample, SleepDecision};

/// Classify a single set of readings; a missing heart rate is "not sleeping"
#[must_use]
pub fn classify_command(
    config: &MonitorConfig,
    roll: f64,
    pitch: f64,
    heart_rate: Option<f64>,
) -> SleepDecision {
    let sleeping = config
        .thresholds
        .classify_round(Some(OrientationSample::new(roll, pitch)), heart_rate);
    SleepDecision::from_classification(sleeping)
}
