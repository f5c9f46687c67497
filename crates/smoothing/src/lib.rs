//! # smoothing
//!
//! The temporal layers wrapped around the geometry kernel: exponential angle
//! smoothing with outlier rejection, depth-based perspective correction, and
//! angular-velocity prediction with look-ahead threshold crossing.
//!
//! Every type here is explicit state threaded by the caller — nothing reads
//! an ambient clock, and a call with an out-of-order or duplicate timestamp
//! degrades to zero elapsed time rather than erroring.

pub mod angle_smoother;
pub mod depth;
pub mod error;
pub mod prediction;
pub mod velocity;

pub use angle_smoother::{AngleSmoother, AngleSmootherSet, SmoothedSample, SmoothingConfig};
pub use depth::{
    apply_perspective_correction, calculate_depth_confidence, calculate_perspective_factor,
    is_t_pose, perform_calibration, AngleType, CalibrationState, DepthConfidence, DepthConfig,
    DepthHistory, DepthSmoother, FallbackMode, PerspectiveFactor,
};
pub use error::ConfigError;
pub use prediction::{
    AnglePredictionEngine, ChannelPrediction, CriticalBand, PredictionConfig, PredictionResult,
    RiskLevel,
};
pub use velocity::{calculate_angular_velocity, VelocitySmoother};
