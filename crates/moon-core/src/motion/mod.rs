use serde::{Deserialize, Serialize};

use crate::error::MotionError;

mod register;
mod source;

pub use register::OrientationRegister;
pub use source::MotionSource;

/// Latest device attitude, in radians
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    pub roll: f64,
    pub pitch: f64,
}

impl OrientationSample {
    #[must_use]
    pub const fn new(roll: f64, pitch: f64) -> Self {
        Self { roll, pitch }
    }
}

/// Motion sensor driver boundary.
///
/// Implementations wrap the platform's attitude sensor. `read_attitude`
/// returns `Ok(None)` when the driver has nothing new to report.
pub trait AttitudeSensor: Send + Sync {
    /// Whether the device has a usable attitude sensor
    fn is_available(&self) -> bool;

    /// Read the current attitude
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to produce a reading.
    fn read_attitude(&self) -> Result<Option<OrientationSample>, MotionError>;
}
