//! Per-frame dispatch across the five exercise analyzers: a
//! single `AnalyzerState`/`analyze_frame` pair that hides which concrete
//! exercise module is behind it, so the segmentation and scoring stages
//! below don't need to match on exercise type themselves.

use geometry::LandmarkFrame;
use smoothing::{CalibrationState, DepthConfig, SmoothingConfig};

use analyzers::exercises::{deadlift, lunge, plank, pushup, squat};
use analyzers::subanalyzers::{
    analyze_coordination, CoordinationState, DEADLIFT_OPTIMAL_RATIO, LUNGE_OPTIMAL_RATIO, SQUAT_OPTIMAL_RATIO,
};
use analyzers::{FeedbackItem, GenericPhase, Level};

use crate::exercise_type::ExerciseType;

/// Holds exactly one exercise's analyzer state, keyed by [`ExerciseType`].
/// Squat, lunge, and deadlift additionally carry a [`CoordinationState`]:
/// those three are the ones with a meaningful knee/hip timing relationship
/// to track across frames.
pub enum AnalyzerState {
    Squat(squat::SquatState, CoordinationState),
    Lunge(lunge::LungeState, CoordinationState),
    Deadlift(deadlift::DeadliftState, CoordinationState),
    Pushup(pushup::PushupState),
    Plank(plank::PlankState),
}

impl AnalyzerState {
    #[must_use]
    pub fn new(exercise_type: ExerciseType, smoothing_config: SmoothingConfig, depth_config: DepthConfig) -> Self {
        match exercise_type {
            ExerciseType::Squat => {
                Self::Squat(squat::create_initial_state(smoothing_config, depth_config), CoordinationState::default())
            }
            ExerciseType::Lunge => {
                Self::Lunge(lunge::create_initial_state(smoothing_config, depth_config), CoordinationState::default())
            }
            ExerciseType::Deadlift => Self::Deadlift(
                deadlift::create_initial_state(smoothing_config, depth_config),
                CoordinationState::default(),
            ),
            ExerciseType::Pushup => Self::Pushup(pushup::create_initial_state(smoothing_config, depth_config)),
            ExerciseType::Plank => Self::Plank(plank::create_initial_state(smoothing_config, depth_config)),
        }
    }
}

/// Exercise-agnostic summary of one frame's analysis, enough for
/// segmentation and per-rep scoring without re-matching on exercise type.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub score: u8,
    pub phase: GenericPhase,
    pub rep_completed: bool,
    pub issues: Vec<&'static str>,
    /// Bilateral knee/hip coordination score, `None` for exercises
    /// without a meaningful left/right or front/back timing relationship.
    pub coordination_score: Option<f32>,
}

fn push_issue(issues: &mut Vec<&'static str>, item: &FeedbackItem) {
    if item.level != Level::Good {
        issues.push(item.message_id);
    }
}

/// Runs the frame through whichever exercise analyzer `state` belongs to,
/// returning an exercise-agnostic outcome alongside the updated state.
/// `timestamp_ms` is only consumed by plank; the other four ignore it.
#[must_use]
pub fn analyze_frame(frame: &LandmarkFrame, timestamp_ms: f64, state: AnalyzerState) -> (FrameOutcome, AnalyzerState) {
    let timestamp = timestamp_ms.max(0.0) as u64;

    match state {
        AnalyzerState::Squat(s, mut coordination) => {
            let (result, next) = squat::analyze(frame, s);
            let mut issues = Vec::new();
            push_issue(&mut issues, &result.feedback.left_knee);
            push_issue(&mut issues, &result.feedback.right_knee);
            push_issue(&mut issues, &result.feedback.left_hip);
            push_issue(&mut issues, &result.feedback.right_hip);
            push_issue(&mut issues, &result.feedback.torso);
            push_issue(&mut issues, &result.feedback.knee_valgus_percent);
            let coordination_score = coordination_score_for(
                &result.raw_angles,
                squat::SquatChannel::LeftKnee,
                squat::SquatChannel::RightKnee,
                squat::SquatChannel::LeftHip,
                squat::SquatChannel::RightHip,
                squat::SquatChannel::Torso,
                timestamp,
                SQUAT_OPTIMAL_RATIO,
                &mut coordination,
            );
            let outcome = FrameOutcome {
                score: result.score,
                phase: result.phase,
                rep_completed: result.rep_completed,
                issues,
                coordination_score,
            };
            (outcome, AnalyzerState::Squat(next, coordination))
        }
        AnalyzerState::Lunge(s, mut coordination) => {
            let (result, next) = lunge::analyze(frame, s);
            let mut issues = Vec::new();
            push_issue(&mut issues, &result.feedback.front_knee);
            push_issue(&mut issues, &result.feedback.back_knee);
            push_issue(&mut issues, &result.feedback.front_hip);
            push_issue(&mut issues, &result.feedback.back_hip);
            push_issue(&mut issues, &result.feedback.torso);
            push_issue(&mut issues, &result.feedback.knee_over_toe_percent);
            push_issue(&mut issues, &result.feedback.hip_flexor_tightness);
            // Front/back stands in for left/right: lunges don't move
            // bilaterally, but the same "which leg initiates" relationship
            // holds between the front and back leg.
            let coordination_score = coordination_score_for(
                &result.raw_angles,
                lunge::LungeChannel::FrontKnee,
                lunge::LungeChannel::BackKnee,
                lunge::LungeChannel::FrontHip,
                lunge::LungeChannel::BackHip,
                lunge::LungeChannel::Torso,
                timestamp,
                LUNGE_OPTIMAL_RATIO,
                &mut coordination,
            );
            let outcome = FrameOutcome {
                score: result.score,
                phase: result.phase,
                rep_completed: result.rep_completed,
                issues,
                coordination_score,
            };
            (outcome, AnalyzerState::Lunge(next, coordination))
        }
        AnalyzerState::Deadlift(s, mut coordination) => {
            let (result, next) = deadlift::analyze(frame, s);
            let mut issues = Vec::new();
            push_issue(&mut issues, &result.feedback.left_hip_hinge);
            push_issue(&mut issues, &result.feedback.right_hip_hinge);
            push_issue(&mut issues, &result.feedback.left_knee);
            push_issue(&mut issues, &result.feedback.right_knee);
            push_issue(&mut issues, &result.feedback.spine);
            push_issue(&mut issues, &result.feedback.upper_spine);
            push_issue(&mut issues, &result.feedback.lower_spine);
            push_issue(&mut issues, &result.feedback.bar_path_percent);
            push_issue(&mut issues, &result.feedback.neck);
            push_issue(&mut issues, &result.feedback.pelvic_anterior);
            push_issue(&mut issues, &result.feedback.pelvic_lateral);
            let coordination_score = coordination_score_for(
                &result.raw_angles,
                deadlift::DeadliftChannel::LeftKnee,
                deadlift::DeadliftChannel::RightKnee,
                deadlift::DeadliftChannel::LeftHipHinge,
                deadlift::DeadliftChannel::RightHipHinge,
                deadlift::DeadliftChannel::Spine,
                timestamp,
                DEADLIFT_OPTIMAL_RATIO,
                &mut coordination,
            );
            let outcome = FrameOutcome {
                score: result.score,
                phase: result.phase.to_generic(),
                rep_completed: result.rep_completed,
                issues,
                coordination_score,
            };
            (outcome, AnalyzerState::Deadlift(next, coordination))
        }
        AnalyzerState::Pushup(s) => {
            let (result, next) = pushup::analyze(frame, s);
            let mut issues = Vec::new();
            push_issue(&mut issues, &result.feedback.left_elbow);
            push_issue(&mut issues, &result.feedback.right_elbow);
            push_issue(&mut issues, &result.feedback.body_alignment);
            push_issue(&mut issues, &result.feedback.hip_position);
            push_issue(&mut issues, &result.feedback.depth_percent);
            push_issue(&mut issues, &result.feedback.elbow_valgus);
            push_issue(&mut issues, &result.feedback.arm_symmetry);
            let outcome = FrameOutcome {
                score: result.score,
                phase: result.phase,
                rep_completed: result.rep_completed,
                issues,
                coordination_score: None,
            };
            (outcome, AnalyzerState::Pushup(next))
        }
        AnalyzerState::Plank(s) => {
            let (result, next) = plank::analyze(frame, timestamp_ms, s);
            let mut issues = Vec::new();
            push_issue(&mut issues, &result.feedback.body_alignment);
            push_issue(&mut issues, &result.feedback.hip_position);
            push_issue(&mut issues, &result.feedback.shoulder_alignment);
            push_issue(&mut issues, &result.feedback.neck);
            // Plank has no phase machine; it holds at `Standing` the whole
            // time and "completes" are synthesized at the segmentation
            // layer rather than signalled frame-by-frame.
            let outcome = FrameOutcome {
                score: result.score,
                phase: GenericPhase::Standing,
                rep_completed: false,
                issues,
                coordination_score: None,
            };
            (outcome, AnalyzerState::Plank(next))
        }
    }
}

/// Pulls the four channel angles a coordination measurement needs out of a
/// result's smoothed `raw_angles` and runs one [`analyze_coordination`]
/// step. Returns `None` only if a channel is unexpectedly absent (never
/// happens for a validly analyzed frame; only the invalid-pose path skips
/// inserting into `raw_angles`).
#[allow(clippy::too_many_arguments)]
fn coordination_score_for<C: Copy + Eq + std::hash::Hash>(
    raw_angles: &analyzers::RawAngles<C>,
    left_knee: C,
    right_knee: C,
    left_hip: C,
    right_hip: C,
    torso: C,
    timestamp_ms: u64,
    optimal_ratio: analyzers::subanalyzers::OptimalRatioBand,
    state: &mut CoordinationState,
) -> Option<f32> {
    let left_knee = raw_angles.get(&left_knee)?.smoothed;
    let right_knee = raw_angles.get(&right_knee)?.smoothed;
    let left_hip = raw_angles.get(&left_hip)?.smoothed;
    let right_hip = raw_angles.get(&right_hip)?.smoothed;
    let torso = raw_angles.get(&torso)?.smoothed;
    let measurement =
        analyze_coordination(timestamp_ms, left_knee, right_knee, left_hip, right_hip, torso, optimal_ratio, state);
    Some(measurement.coordination_score)
}

/// Unused by any exercise today, kept so callers can build a neutral
/// state before the exercise type is known without reaching into a
/// specific module's calibration type.
#[must_use]
pub fn default_calibration() -> CalibrationState {
    CalibrationState::default()
}
