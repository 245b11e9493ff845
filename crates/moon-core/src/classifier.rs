use serde::{Deserialize, Serialize};

use crate::motion::OrientationSample;

/// Maximum absolute roll and pitch (radians) consistent with lying still.
pub const ROLL_PITCH_THRESHOLD: f64 = 0.3;
/// Lower bound of the resting heart rate window (beats/min, inclusive).
pub const MIN_RESTING_HR: f64 = 50.0;
/// Upper bound of the resting heart rate window (beats/min, inclusive).
pub const MAX_RESTING_HR: f64 = 100.0;

/// Thresholds for the sleep heuristic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepThresholds {
    pub roll_pitch_threshold: f64,
    pub min_resting_hr: f64,
    pub max_resting_hr: f64,
}

impl Default for SleepThresholds {
    fn default() -> Self {
        Self {
            roll_pitch_threshold: ROLL_PITCH_THRESHOLD,
            min_resting_hr: MIN_RESTING_HR,
            max_resting_hr: MAX_RESTING_HR,
        }
    }
}

impl SleepThresholds {
    /// Classify one set of readings against these thresholds.
    ///
    /// NaN in any input fails its comparison, so the result is `false`.
    #[must_use]
    pub fn classify(&self, roll: f64, pitch: f64, heart_rate: f64) -> bool {
        roll.abs() < self.roll_pitch_threshold
            && pitch.abs() < self.roll_pitch_threshold
            && heart_rate >= self.min_resting_hr
            && heart_rate <= self.max_resting_hr
    }

    /// Classify a completed round where either signal may be missing.
    ///
    /// A missing orientation or heart rate means "not sleeping"; the
    /// threshold rule only runs when both are present.
    #[must_use]
    pub fn classify_round(
        &self,
        orientation: Option<OrientationSample>,
        heart_rate: Option<f64>,
    ) -> bool {
        match (orientation, heart_rate) {
            (Some(o), Some(hr)) => self.classify(o.roll, o.pitch, hr),
            (None, _) => {
                log::debug!("No orientation data yet, classifying as not sleeping");
                false
            }
            (_, None) => {
                log::debug!("No heart rate reading, classifying as not sleeping");
                false
            }
        }
    }
}

/// Classify with the default thresholds
#[must_use]
pub fn classify(roll: f64, pitch: f64, heart_rate: f64) -> bool {
    SleepThresholds::default().classify(roll, pitch, heart_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still(roll: f64, pitch: f64) -> Option<OrientationSample> {
        Some(OrientationSample::new(roll, pitch))
    }

    #[test]
    fn test_still_and_resting_is_sleeping() {
        assert!(classify(0.1, -0.1, 70.0));
        assert!(classify(0.0, 0.0, 50.0));
        assert!(classify(-0.29, 0.29, 100.0));
    }

    #[test]
    fn test_heart_rate_outside_window_is_not_sleeping() {
        for hr in [0.0, 30.0, 49.99, 100.01, 140.0, -5.0] {
            assert!(!classify(0.0, 0.0, hr), "hr {hr} should not classify as sleeping");
        }
    }

    #[test]
    fn test_tilted_is_not_sleeping() {
        for (roll, pitch) in [(0.3, 0.0), (0.0, 0.3), (-0.3, 0.0), (0.0, -0.3), (0.5, 0.0), (1.2, -2.0)] {
            for hr in [50.0, 70.0, 100.0] {
                assert!(!classify(roll, pitch, hr), "({roll}, {pitch}, {hr}) should not classify as sleeping");
            }
        }
    }

    #[test]
    fn test_nan_inputs_are_not_sleeping() {
        assert!(!classify(f64::NAN, 0.0, 70.0));
        assert!(!classify(0.0, f64::NAN, 70.0));
        assert!(!classify(0.0, 0.0, f64::NAN));
    }

    #[test]
    fn test_classify_is_deterministic() {
        let first = classify(0.12, -0.05, 64.0);
        for _ in 0..100 {
            assert_eq!(classify(0.12, -0.05, 64.0), first);
        }
    }

    #[test]
    fn test_scenarios() {
        let thresholds = SleepThresholds::default();
        // A
        assert!(thresholds.classify_round(still(0.1, -0.1), Some(70.0)));
        // B
        assert!(!thresholds.classify_round(still(0.5, 0.0), Some(70.0)));
        // C
        assert!(!thresholds.classify_round(still(0.0, 0.0), None));
    }

    #[test]
    fn test_missing_orientation_is_not_sleeping() {
        let thresholds = SleepThresholds::default();
        assert!(!thresholds.classify_round(None, Some(70.0)));
        assert!(!thresholds.classify_round(None, None));
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = SleepThresholds {
            roll_pitch_threshold: 0.5,
            min_resting_hr: 40.0,
            max_resting_hr: 60.0,
        };
        assert!(thresholds.classify(0.4, 0.0, 45.0));
        assert!(!thresholds.classify(0.4, 0.0, 70.0));
        assert!(!classify(0.4, 0.0, 45.0));
    }
}
