pub mod classifier;
pub mod config;
pub mod error;
pub mod heart_rate;
pub mod monitor;
pub mod motion;
pub mod sim;
pub mod status;

pub use classifier::{classify, SleepThresholds};
pub use config::MonitorConfig;
pub use error::{HeartRateError, MotionError};
pub use heart_rate::{HealthStore, HeartRateSample, HeartRateSource};
pub use monitor::{MonitorOutcome, PollState, SleepMonitor, StopReason};
pub use motion::{AttitudeSensor, MotionSource, OrientationSample};
pub use status::{MonitorStatus, SleepDecision};
