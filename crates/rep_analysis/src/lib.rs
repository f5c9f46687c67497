//! # rep_analysis
//!
//! Exercise-type detection, per-frame dispatch across the five exercise
//! analyzers, rep-boundary segmentation, per-rep scoring, and cross-rep
//! consistency metrics (L5) — the layer that turns a stream of posed
//! video frames into a structured set of completed reps.

pub mod consistency;
pub mod exercise_type;
pub mod frame_analysis;
pub mod phase_weights;
pub mod rep_result;
pub mod segmentation;
pub mod video;

pub use consistency::{compute_consistency, ConsistencyMetrics, Direction, RepDeviation, Trend};
pub use exercise_type::{detect_exercise_type, ExerciseType};
pub use frame_analysis::{analyze_frame, AnalyzerState, FrameOutcome};
pub use phase_weights::{default_phase_weights, PhaseWeights};
pub use rep_result::{aggregate_rep, RepAnalysisResult, TimedOutcome, WorstMoment};
pub use segmentation::{segment_reps, SegmentationReport};
pub use video::{analyze_video_reps, RepAnalysisConfig, VideoFrameInput, VideoRepAnalysisResult};
