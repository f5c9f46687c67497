//! Squat analyzer: bilateral knee/hip/torso tracking, a four-phase
//! state machine with hysteresis, and a composite score.

use geometry::{angle3, symmetry_score, LandmarkFrame, LandmarkIndex};
use smoothing::{AngleSmootherSet, CalibrationState, DepthConfig, SmoothingConfig};

use crate::feedback::{composite_score, Band, Correction, FeedbackItem, Level};
use crate::phase::GenericPhase;
use crate::raw_angles::RawAngles;
use crate::subanalyzers::{
    analyze_knee_alignment, KneeAlignmentState,
};

/// Average-knee-angle threshold above which the lifter is standing.
const STANDING_THRESHOLD_DEG: f32 = 160.0;
/// Average-knee-angle threshold below which the lifter is at the bottom.
const BOTTOM_THRESHOLD_DEG: f32 = 110.0;
const HYSTERESIS_DEG: f32 = 5.0;
/// Deviation angle (degrees) mapped to 100% knee-valgus severity.
const KNEE_VALGUS_FULL_SCALE_DEG: f32 = 20.0;

const KNEE_IDEAL: Band = Band::new(80.0, 100.0);
const KNEE_ACCEPTABLE: Band = Band::new(70.0, 110.0);
const HIP_IDEAL: Band = Band::new(70.0, 110.0);
const HIP_ACCEPTABLE: Band = Band::new(55.0, 130.0);
const TORSO_IDEAL: Band = Band::new(0.0, 35.0);
const TORSO_ACCEPTABLE: Band = Band::new(0.0, 45.0);
const KNEE_VALGUS_IDEAL: Band = Band::new(0.0, 10.0);
const KNEE_VALGUS_ACCEPTABLE: Band = Band::new(0.0, 20.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SquatChannel {
    LeftKnee,
    RightKnee,
    LeftHip,
    RightHip,
    Torso,
    LeftAnkle,
    RightAnkle,
}

#[derive(Debug, Clone)]
pub struct SquatState {
    pub phase: GenericPhase,
    pub rep_count: u32,
    pub bottom_reached: bool,
    pub last_avg_knee_angle: f32,
    pub smoothers: AngleSmootherSet<SquatChannel>,
    pub depth_config: DepthConfig,
    pub calibration: CalibrationState,
    pub left_knee_alignment: KneeAlignmentState,
    pub right_knee_alignment: KneeAlignmentState,
}

#[must_use]
pub fn create_initial_state(smoothing_config: SmoothingConfig, depth_config: DepthConfig) -> SquatState {
    SquatState {
        phase: GenericPhase::Standing,
        rep_count: 0,
        bottom_reached: false,
        last_avg_knee_angle: 180.0,
        smoothers: AngleSmootherSet::new(smoothing_config),
        depth_config,
        calibration: CalibrationState::default(),
        left_knee_alignment: KneeAlignmentState::default(),
        right_knee_alignment: KneeAlignmentState::default(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquatFeedback {
    pub left_knee: FeedbackItem,
    pub right_knee: FeedbackItem,
    pub left_hip: FeedbackItem,
    pub right_hip: FeedbackItem,
    pub torso: FeedbackItem,
    pub knee_valgus_percent: FeedbackItem,
}

#[derive(Debug, Clone)]
pub struct SquatAnalysisResult {
    pub score: u8,
    pub feedback: SquatFeedback,
    pub phase: GenericPhase,
    pub rep_completed: bool,
    pub heel_rise: bool,
    pub raw_angles: RawAngles<SquatChannel>,
}

const REQUIRED_LANDMARKS: [LandmarkIndex; 10] = [
    LandmarkIndex::LeftShoulder,
    LandmarkIndex::RightShoulder,
    LandmarkIndex::LeftHip,
    LandmarkIndex::RightHip,
    LandmarkIndex::LeftKnee,
    LandmarkIndex::RightKnee,
    LandmarkIndex::LeftAnkle,
    LandmarkIndex::RightAnkle,
    LandmarkIndex::LeftHeel,
    LandmarkIndex::RightHeel,
];

fn next_phase(
    prev_phase: GenericPhase,
    prev_angle: f32,
    curr_angle: f32,
    bottom_reached: &mut bool,
) -> (GenericPhase, bool) {
    let rising = curr_angle > prev_angle;
    let falling = curr_angle < prev_angle;
    let mut rep_completed = false;

    let new_phase = match prev_phase {
        GenericPhase::Standing => {
            if curr_angle < STANDING_THRESHOLD_DEG - HYSTERESIS_DEG {
                GenericPhase::Descending
            } else {
                GenericPhase::Standing
            }
        }
        GenericPhase::Descending => {
            if curr_angle < BOTTOM_THRESHOLD_DEG + HYSTERESIS_DEG {
                *bottom_reached = true;
                GenericPhase::Bottom
            } else if rising {
                GenericPhase::Ascending
            } else {
                GenericPhase::Descending
            }
        }
        GenericPhase::Bottom => {
            if rising {
                GenericPhase::Ascending
            } else {
                GenericPhase::Bottom
            }
        }
        GenericPhase::Ascending => {
            if curr_angle > STANDING_THRESHOLD_DEG + HYSTERESIS_DEG {
                if *bottom_reached {
                    rep_completed = true;
                    *bottom_reached = false;
                }
                GenericPhase::Standing
            } else if falling {
                if curr_angle < BOTTOM_THRESHOLD_DEG + HYSTERESIS_DEG {
                    GenericPhase::Bottom
                } else {
                    GenericPhase::Descending
                }
            } else {
                GenericPhase::Ascending
            }
        }
    };
    (new_phase, rep_completed)
}

/// Analyzes one frame of the squat. Consumes and returns `SquatState` by
/// value, per the core's pure `(frame, state) -> (result, new_state)` shape.
#[must_use]
pub fn analyze(frame: &LandmarkFrame, mut state: SquatState) -> (SquatAnalysisResult, SquatState) {
    if !frame.all_valid(
        &REQUIRED_LANDMARKS.iter().map(|i| i.idx()).collect::<Vec<_>>(),
        geometry::DEFAULT_MIN_SCORE,
    ) {
        return invalid_result(state);
    }

    let l_shoulder = frame.get(LandmarkIndex::LeftShoulder.idx());
    let r_shoulder = frame.get(LandmarkIndex::RightShoulder.idx());
    let l_hip = frame.get(LandmarkIndex::LeftHip.idx());
    let r_hip = frame.get(LandmarkIndex::RightHip.idx());
    let l_knee = frame.get(LandmarkIndex::LeftKnee.idx());
    let r_knee = frame.get(LandmarkIndex::RightKnee.idx());
    let l_ankle = frame.get(LandmarkIndex::LeftAnkle.idx());
    let r_ankle = frame.get(LandmarkIndex::RightAnkle.idx());
    let l_heel = frame.get(LandmarkIndex::LeftHeel.idx());
    let r_heel = frame.get(LandmarkIndex::RightHeel.idx());
    let l_foot_index = frame.get(LandmarkIndex::LeftFootIndex.idx());
    let r_foot_index = frame.get(LandmarkIndex::RightFootIndex.idx());

    let raw_left_knee = angle3(l_hip.point(), l_knee.point(), l_ankle.point());
    let raw_right_knee = angle3(r_hip.point(), r_knee.point(), r_ankle.point());
    let raw_left_hip = angle3(l_shoulder.point(), l_hip.point(), l_knee.point());
    let raw_right_hip = angle3(r_shoulder.point(), r_hip.point(), r_knee.point());

    let hip_center = geometry::midpoint(l_hip.point(), r_hip.point());
    let shoulder_center = geometry::midpoint(l_shoulder.point(), r_shoulder.point());
    let raw_torso = geometry::angle_with_vertical(hip_center, shoulder_center);

    let raw_left_ankle = angle3(l_knee.point(), l_ankle.point(), l_foot_index.point());
    let raw_right_ankle = angle3(r_knee.point(), r_ankle.point(), r_foot_index.point());

    let smoothed = state.smoothers.smooth_all(&[
        (SquatChannel::LeftKnee, raw_left_knee),
        (SquatChannel::RightKnee, raw_right_knee),
        (SquatChannel::LeftHip, raw_left_hip),
        (SquatChannel::RightHip, raw_right_hip),
        (SquatChannel::Torso, raw_torso),
        (SquatChannel::LeftAnkle, raw_left_ankle),
        (SquatChannel::RightAnkle, raw_right_ankle),
    ]);

    let left_knee = smoothed[&SquatChannel::LeftKnee].smoothed_value;
    let right_knee = smoothed[&SquatChannel::RightKnee].smoothed_value;
    let left_hip = smoothed[&SquatChannel::LeftHip].smoothed_value;
    let right_hip = smoothed[&SquatChannel::RightHip].smoothed_value;
    let torso = smoothed[&SquatChannel::Torso].smoothed_value;

    let avg_knee = (left_knee + right_knee) / 2.0;
    let avg_hip = (left_hip + right_hip) / 2.0;

    let is_standing_phase = matches!(state.phase, GenericPhase::Standing);
    let left_alignment = analyze_knee_alignment(
        l_hip,
        l_knee,
        l_ankle,
        is_standing_phase,
        &mut state.left_knee_alignment,
    );
    let right_alignment = analyze_knee_alignment(
        r_hip,
        r_knee,
        r_ankle,
        is_standing_phase,
        &mut state.right_knee_alignment,
    );
    let knee_valgus_percent = (left_alignment.deviation_angle.max(right_alignment.deviation_angle)
        / KNEE_VALGUS_FULL_SCALE_DEG
        * 100.0)
        .clamp(0.0, 100.0);

    let (new_phase, rep_completed) =
        next_phase(state.phase, state.last_avg_knee_angle, avg_knee, &mut state.bottom_reached);
    if rep_completed {
        state.rep_count += 1;
    }
    state.phase = new_phase;
    state.last_avg_knee_angle = avg_knee;

    let heel_rise = (l_foot_index.y - l_heel.y).abs() > 0.04 || (r_foot_index.y - r_heel.y).abs() > 0.04;

    let feedback = SquatFeedback {
        left_knee: FeedbackItem::new(left_knee, KNEE_IDEAL, KNEE_ACCEPTABLE, Correction::None, "squat.knee.left"),
        right_knee: FeedbackItem::new(right_knee, KNEE_IDEAL, KNEE_ACCEPTABLE, Correction::None, "squat.knee.right"),
        left_hip: FeedbackItem::new(left_hip, HIP_IDEAL, HIP_ACCEPTABLE, Correction::None, "squat.hip.left"),
        right_hip: FeedbackItem::new(right_hip, HIP_IDEAL, HIP_ACCEPTABLE, Correction::None, "squat.hip.right"),
        torso: FeedbackItem::new(torso, TORSO_IDEAL, TORSO_ACCEPTABLE, Correction::Forward, "squat.torso"),
        knee_valgus_percent: FeedbackItem::new(
            knee_valgus_percent,
            KNEE_VALGUS_IDEAL,
            KNEE_VALGUS_ACCEPTABLE,
            Correction::Outward,
            "squat.knee_valgus",
        ),
    };

    let knee_symmetry = symmetry_score(left_knee, right_knee);
    let hip_symmetry = symmetry_score(left_hip, right_hip);

    let score = composite_score(&[
        (0.25, (feedback.left_knee.item_score() + feedback.right_knee.item_score()) / 2.0),
        (0.20, (feedback.left_hip.item_score() + feedback.right_hip.item_score()) / 2.0),
        (0.15, feedback.torso.item_score()),
        (0.15, feedback.knee_valgus_percent.item_score()),
        (0.125, knee_symmetry),
        (0.125, hip_symmetry),
    ]);

    let mut raw_angles = RawAngles::new();
    raw_angles.insert(SquatChannel::LeftKnee, raw_left_knee, left_knee);
    raw_angles.insert(SquatChannel::RightKnee, raw_right_knee, right_knee);
    raw_angles.insert(SquatChannel::LeftHip, raw_left_hip, left_hip);
    raw_angles.insert(SquatChannel::RightHip, raw_right_hip, right_hip);
    raw_angles.insert(SquatChannel::Torso, raw_torso, torso);
    raw_angles.insert(
        SquatChannel::LeftAnkle,
        raw_left_ankle,
        smoothed[&SquatChannel::LeftAnkle].smoothed_value,
    );
    raw_angles.insert(
        SquatChannel::RightAnkle,
        raw_right_ankle,
        smoothed[&SquatChannel::RightAnkle].smoothed_value,
    );

    (
        SquatAnalysisResult {
            score,
            feedback,
            phase: new_phase,
            rep_completed,
            heel_rise,
            raw_angles,
        },
        state,
    )
}

fn invalid_result(state: SquatState) -> (SquatAnalysisResult, SquatState) {
    let warning = |id: &'static str| FeedbackItem::invalid(id);
    let result = SquatAnalysisResult {
        score: 0,
        feedback: SquatFeedback {
            left_knee: warning("squat.knee.left"),
            right_knee: warning("squat.knee.right"),
            left_hip: warning("squat.hip.left"),
            right_hip: warning("squat.hip.right"),
            torso: warning("squat.torso"),
            knee_valgus_percent: warning("squat.knee_valgus"),
        },
        phase: state.phase,
        rep_completed: false,
        heel_rise: false,
        raw_angles: RawAngles::new(),
    };
    debug_assert!(matches!(result.feedback.torso.level, Level::Warning));
    (result, state)
}
