//! # fitform
//!
//! The single crate the rest of the system depends on. It re-exports the
//! geometry kernel, the smoothing/prediction layer, the five per-exercise
//! analyzers, and the video-level rep analyzer behind one surface so a
//! caller never needs to depend on `geometry`, `smoothing`, `analyzers`, or
//! `rep_analysis` directly.
//!
//! Everything here is synchronous and pure: `analyze(frame, state)` takes
//! and returns state by value, touches no clock beyond the timestamp the
//! caller passes in, and never panics on a malformed frame.

pub use geometry::{
    angle3, angle_between, angle_between_segments, angle_with_horizontal, angle_with_vertical,
    calculate_torso_rotation, centroid, distance2, distance3, is_valid_keypoint, midpoint,
    point_to_line_distance, project_xy, project_xz, project_yz, symmetry_score, Landmark,
    LandmarkFrame, LandmarkIndex, DEFAULT_MIN_SCORE, NUM_LANDMARKS,
};

pub use smoothing::{
    apply_perspective_correction, calculate_angular_velocity, calculate_depth_confidence,
    calculate_perspective_factor, is_t_pose, perform_calibration, AngleSmoother,
    AngleSmootherSet, AnglePredictionEngine, AngleType, CalibrationState, ChannelPrediction,
    ConfigError, CriticalBand, DepthConfidence, DepthConfig, DepthHistory, DepthSmoother,
    FallbackMode, PerspectiveFactor, PredictionConfig, PredictionResult, RiskLevel,
    SmoothedSample, SmoothingConfig, VelocitySmoother,
};

pub use analyzers::{
    apply_tempo_multiplier, classify_level, classify_movement_quality, classify_velocity_category,
    composite_score, item_score, mean_abs_velocity, risk_correlation, round_composite,
    tempo_multiplier, Band, Correction, FeedbackItem, GenericPhase, Level, MovementPhase,
    MovementQuality, RawAngleSample, RawAngles, RiskCorrelation, VelocityCategory,
};
pub use analyzers::subanalyzers;

pub use rep_analysis::{
    aggregate_rep, analyze_frame, analyze_video_reps, compute_consistency, default_phase_weights,
    detect_exercise_type, segment_reps, AnalyzerState, ConsistencyMetrics, Direction, ExerciseType,
    FrameOutcome, PhaseWeights, RepAnalysisConfig, RepAnalysisResult, RepDeviation,
    SegmentationReport, TimedOutcome, Trend, VideoFrameInput, VideoRepAnalysisResult, WorstMoment,
};

/// The five per-exercise analyzers, one module each: `analyze(frame, state)
/// -> (result, state)` plus `create_initial_state(smoothing_config,
/// depth_config)`.
pub mod exercises {
    pub use analyzers::exercises::deadlift;
    pub use analyzers::exercises::lunge;
    pub use analyzers::exercises::plank;
    pub use analyzers::exercises::pushup;
    pub use analyzers::exercises::squat;
}
