//! Top-level video-level orchestration: detect the exercise, run
//! every frame through the matching analyzer, segment the result into
//! reps, score each rep, and summarize consistency across the session.

use geometry::{Landmark, LandmarkFrame, NUM_LANDMARKS};
use smoothing::{DepthConfig, SmoothingConfig};

use crate::consistency::{compute_consistency, ConsistencyMetrics};
use crate::exercise_type::{detect_exercise_type, ExerciseType};
use crate::frame_analysis::{analyze_frame, AnalyzerState};
use crate::phase_weights::{default_phase_weights, PhaseWeights};
use crate::rep_result::{aggregate_rep, RepAnalysisResult, TimedOutcome};
use crate::segmentation::segment_reps;

/// Default minimum rep duration: fast but still-human reps rarely complete
/// faster than this.
const DEFAULT_MIN_REP_DURATION_MS: f64 = 400.0;
/// Default maximum rep duration: beyond this the "rep" more likely reflects
/// a paused or stalled set than a single controlled repetition.
const DEFAULT_MAX_REP_DURATION_MS: f64 = 15_000.0;

/// One input frame: a timestamped pose, or `None` when pose detection
/// failed on that frame (dropped or interpolated per `skip_failed_frames`).
#[derive(Debug, Clone)]
pub struct VideoFrameInput {
    pub frame_index: usize,
    pub timestamp_ms: f64,
    pub pose: Option<LandmarkFrame>,
}

#[derive(Debug, Clone)]
pub struct RepAnalysisConfig {
    pub exercise_type: Option<ExerciseType>,
    pub phase_weights: Option<PhaseWeights>,
    pub min_rep_duration_ms: f64,
    pub max_rep_duration_ms: f64,
    pub smoothing_config: SmoothingConfig,
    pub depth_config: DepthConfig,
    /// Frames with no detected pose are skipped rather than fed to the
    /// analyzer as an invalid-pose frame.
    pub skip_failed_frames: bool,
}

impl Default for RepAnalysisConfig {
    fn default() -> Self {
        Self {
            exercise_type: None,
            phase_weights: None,
            min_rep_duration_ms: DEFAULT_MIN_REP_DURATION_MS,
            max_rep_duration_ms: DEFAULT_MAX_REP_DURATION_MS,
            smoothing_config: SmoothingConfig::default(),
            depth_config: DepthConfig::default(),
            skip_failed_frames: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VideoRepAnalysisResult {
    pub exercise_type: ExerciseType,
    pub exercise_type_confidence: f32,
    pub reps: Vec<RepAnalysisResult>,
    pub dropped_rep_count: usize,
    pub consistency: Option<ConsistencyMetrics>,
}

/// Runs the full per-video pipeline: detect (or accept a configured)
/// exercise type, analyze every frame, segment into reps, score each rep,
/// and compute cross-rep consistency.
#[must_use]
pub fn analyze_video_reps(frames: &[VideoFrameInput], config: &RepAnalysisConfig) -> VideoRepAnalysisResult {
    let poses: Vec<LandmarkFrame> = frames.iter().filter_map(|f| f.pose.clone()).collect();
    let (detected_type, detected_confidence) = detect_exercise_type(&poses);
    let (exercise_type, exercise_type_confidence) = match config.exercise_type {
        Some(t) => (t, 1.0),
        None => (detected_type, detected_confidence),
    };

    tracing::debug!(
        ?exercise_type,
        confidence = exercise_type_confidence,
        frame_count = frames.len(),
        "detected exercise type for video"
    );

    let weights = config.phase_weights.unwrap_or_else(|| default_phase_weights(exercise_type));

    let mut state = AnalyzerState::new(exercise_type, config.smoothing_config, config.depth_config);
    let mut timed_outcomes = Vec::with_capacity(frames.len());

    let invalid_frame = LandmarkFrame::new([Landmark::invalid(); NUM_LANDMARKS]);
    for input in frames {
        let pose = match &input.pose {
            Some(pose) => pose,
            None if config.skip_failed_frames => continue,
            // Feed the analyzer an all-invalid frame so it still emits a
            // (zero-score) outcome rather than silently dropping the gap.
            None => &invalid_frame,
        };
        let (outcome, next_state) = analyze_frame(pose, input.timestamp_ms, state);
        state = next_state;
        timed_outcomes.push(TimedOutcome { timestamp_ms: input.timestamp_ms, outcome });
    }

    let (rep_frame_groups, dropped_rep_count) = if exercise_type == ExerciseType::Plank {
        // Plank never leaves `Standing`, so there's no descending/bottom
        // transition to segment on; the whole valid-frame range is one rep.
        if timed_outcomes.is_empty() {
            (Vec::new(), 0)
        } else {
            (vec![timed_outcomes], 0)
        }
    } else {
        let report = segment_reps(&timed_outcomes, config.min_rep_duration_ms, config.max_rep_duration_ms);
        (report.reps, report.dropped_rep_count)
    };

    let reps: Vec<RepAnalysisResult> = rep_frame_groups
        .iter()
        .enumerate()
        .map(|(i, group)| aggregate_rep(i as u32 + 1, group, weights))
        .collect();

    let consistency = if reps.is_empty() { None } else { Some(compute_consistency(&reps)) };

    tracing::info!(rep_count = reps.len(), dropped_rep_count, "segmented video into reps");

    VideoRepAnalysisResult {
        exercise_type,
        exercise_type_confidence,
        reps,
        dropped_rep_count,
        consistency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::{Landmark, LandmarkIndex, NUM_LANDMARKS};

    fn squat_frame(knee_angle_deg: f32) -> LandmarkFrame {
        let mut points = [Landmark::invalid(); NUM_LANDMARKS];
        points[LandmarkIndex::LeftShoulder.idx()] = Landmark::new(0.4, 0.2, 0.0, 0.9);
        points[LandmarkIndex::RightShoulder.idx()] = Landmark::new(0.6, 0.2, 0.0, 0.9);
        points[LandmarkIndex::LeftHip.idx()] = Landmark::new(0.42, 0.5, 0.0, 0.9);
        points[LandmarkIndex::RightHip.idx()] = Landmark::new(0.58, 0.5, 0.0, 0.9);
        // Sweeps the knee between roughly upright (170deg) and a deep bend
        // by moving the knee forward of the hip-ankle line.
        let bend = (180.0 - knee_angle_deg).to_radians();
        let offset = bend.sin() * 0.15;
        points[LandmarkIndex::LeftKnee.idx()] = Landmark::new(0.42 + offset, 0.7, 0.0, 0.9);
        points[LandmarkIndex::RightKnee.idx()] = Landmark::new(0.58 + offset, 0.7, 0.0, 0.9);
        points[LandmarkIndex::LeftAnkle.idx()] = Landmark::new(0.42, 0.95, 0.0, 0.9);
        points[LandmarkIndex::RightAnkle.idx()] = Landmark::new(0.58, 0.95, 0.0, 0.9);
        points[LandmarkIndex::LeftHeel.idx()] = Landmark::new(0.42, 0.97, -0.02, 0.9);
        points[LandmarkIndex::RightHeel.idx()] = Landmark::new(0.58, 0.97, -0.02, 0.9);
        LandmarkFrame::new(points)
    }

    #[test]
    fn empty_video_produces_no_reps() {
        let config = RepAnalysisConfig { exercise_type: Some(ExerciseType::Squat), ..RepAnalysisConfig::default() };
        let result = analyze_video_reps(&[], &config);
        assert!(result.reps.is_empty());
        assert!(result.consistency.is_none());
    }

    #[test]
    fn forced_exercise_type_is_used_verbatim() {
        let frames = vec![VideoFrameInput { frame_index: 0, timestamp_ms: 0.0, pose: Some(squat_frame(170.0)) }];
        let config = RepAnalysisConfig { exercise_type: Some(ExerciseType::Squat), ..RepAnalysisConfig::default() };
        let result = analyze_video_reps(&frames, &config);
        assert_eq!(result.exercise_type, ExerciseType::Squat);
        assert_eq!(result.exercise_type_confidence, 1.0);
    }
}
