//! Lunge analyzer: front/back leg detection, a squat-like phase
//! machine keyed on the front knee, and a composite score.

use geometry::{angle3, distance3, Landmark, LandmarkFrame, LandmarkIndex};
use smoothing::{AngleSmootherSet, CalibrationState, DepthConfig, SmoothingConfig};

use crate::feedback::{composite_score, Band, Correction, FeedbackItem, Level};
use crate::phase::GenericPhase;
use crate::raw_angles::RawAngles;

const STANDING_THRESHOLD_DEG: f32 = 160.0;
const BOTTOM_THRESHOLD_DEG: f32 = 100.0;
const HYSTERESIS_DEG: f32 = 5.0;

/// Tie-break tolerance on ankle `z` before falling back to horizontal
/// separation when classifying the front leg.
const FRONT_LEG_Z_TOLERANCE: f32 = 0.03;

const FRONT_KNEE_IDEAL: Band = Band::new(85.0, 100.0);
const FRONT_KNEE_ACCEPTABLE: Band = Band::new(75.0, 110.0);
const BACK_KNEE_IDEAL: Band = Band::new(85.0, 105.0);
const BACK_KNEE_ACCEPTABLE: Band = Band::new(70.0, 120.0);
const HIP_IDEAL: Band = Band::new(70.0, 110.0);
const HIP_ACCEPTABLE: Band = Band::new(55.0, 130.0);
const TORSO_IDEAL: Band = Band::new(0.0, 15.0);
const TORSO_ACCEPTABLE: Band = Band::new(0.0, 25.0);
/// Ideal within +/-10% of foot length, acceptable within +/-20%.
const KNEE_OVER_TOE_IDEAL: Band = Band::new(-10.0, 10.0);
const KNEE_OVER_TOE_ACCEPTABLE: Band = Band::new(-20.0, 20.0);
/// A large, open back-hip angle reads as a fully extended hip flexor;
/// small angles read as tightness.
const HIP_FLEXOR_IDEAL: Band = Band::new(160.0, 185.0);
const HIP_FLEXOR_ACCEPTABLE: Band = Band::new(140.0, 190.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontLeg {
    Left,
    Right,
    Unknown,
}

#[must_use]
pub fn detect_front_leg(l_ankle: Landmark, r_ankle: Landmark, l_hip: Landmark, r_hip: Landmark) -> FrontLeg {
    let z_diff = l_ankle.z - r_ankle.z;
    if z_diff.abs() > FRONT_LEG_Z_TOLERANCE {
        return if z_diff < 0.0 { FrontLeg::Left } else { FrontLeg::Right };
    }
    let hip_center_x = (l_hip.x + r_hip.x) / 2.0;
    let left_separation = (l_ankle.x - hip_center_x).abs();
    let right_separation = (r_ankle.x - hip_center_x).abs();
    if (left_separation - right_separation).abs() < 1e-3 {
        FrontLeg::Unknown
    } else if left_separation > right_separation {
        FrontLeg::Left
    } else {
        FrontLeg::Right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LungeChannel {
    FrontKnee,
    BackKnee,
    FrontHip,
    BackHip,
    Torso,
    KneeOverToePercent,
}

#[derive(Debug, Clone)]
pub struct LungeState {
    pub phase: GenericPhase,
    pub rep_count: u32,
    pub bottom_reached: bool,
    pub last_front_knee_angle: f32,
    pub smoothers: AngleSmootherSet<LungeChannel>,
    pub depth_config: DepthConfig,
    pub calibration: CalibrationState,
}

#[must_use]
pub fn create_initial_state(smoothing_config: SmoothingConfig, depth_config: DepthConfig) -> LungeState {
    LungeState {
        phase: GenericPhase::Standing,
        rep_count: 0,
        bottom_reached: false,
        last_front_knee_angle: 180.0,
        smoothers: AngleSmootherSet::new(smoothing_config),
        depth_config,
        calibration: CalibrationState::default(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LungeFeedback {
    pub front_knee: FeedbackItem,
    pub back_knee: FeedbackItem,
    pub front_hip: FeedbackItem,
    pub back_hip: FeedbackItem,
    pub torso: FeedbackItem,
    pub knee_over_toe_percent: FeedbackItem,
    pub hip_flexor_tightness: FeedbackItem,
}

#[derive(Debug, Clone)]
pub struct LungeAnalysisResult {
    pub score: u8,
    pub feedback: LungeFeedback,
    pub phase: GenericPhase,
    pub rep_completed: bool,
    pub front_leg: FrontLeg,
    pub raw_angles: RawAngles<LungeChannel>,
}

const REQUIRED_LANDMARKS: [LandmarkIndex; 8] = [
    LandmarkIndex::LeftShoulder,
    LandmarkIndex::RightShoulder,
    LandmarkIndex::LeftHip,
    LandmarkIndex::RightHip,
    LandmarkIndex::LeftKnee,
    LandmarkIndex::RightKnee,
    LandmarkIndex::LeftAnkle,
    LandmarkIndex::RightAnkle,
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

#[must_use]
pub fn analyze(frame: &LandmarkFrame, mut state: LungeState) -> (LungeAnalysisResult, LungeState) {
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

    let front_leg = detect_front_leg(l_ankle, r_ankle, l_hip, r_hip);
    let (front_hip_pt, front_knee_pt, front_ankle_pt, back_hip_pt, back_knee_pt, back_ankle_pt, front_shoulder) =
        match front_leg {
            FrontLeg::Left | FrontLeg::Unknown => (
                l_hip, l_knee, l_ankle, r_hip, r_knee, r_ankle, l_shoulder,
            ),
            FrontLeg::Right => (
                r_hip, r_knee, r_ankle, l_hip, l_knee, l_ankle, r_shoulder,
            ),
        };

    let raw_front_knee = angle3(front_hip_pt.point(), front_knee_pt.point(), front_ankle_pt.point());
    let raw_back_knee = angle3(back_hip_pt.point(), back_knee_pt.point(), back_ankle_pt.point());
    let raw_front_hip = angle3(front_shoulder.point(), front_hip_pt.point(), front_knee_pt.point());
    let raw_back_hip = angle3(front_shoulder.point(), back_hip_pt.point(), back_knee_pt.point());

    let hip_center = geometry::midpoint(l_hip.point(), r_hip.point());
    let shoulder_center = geometry::midpoint(l_shoulder.point(), r_shoulder.point());
    let raw_torso = geometry::angle_with_vertical(hip_center, shoulder_center);

    // Foot-index landmarks aren't among this analyzer's required set, so the
    // shin length (knee-to-ankle distance) stands in as the normalization
    // base for the knee-over-toe percentage.
    let normalization_base = distance3(front_ankle_pt.point(), front_knee_pt.point()).max(1e-4) * 0.4;
    let raw_knee_over_toe = ((front_knee_pt.x - front_ankle_pt.x) / normalization_base) * 100.0;

    let smoothed = state.smoothers.smooth_all(&[
        (LungeChannel::FrontKnee, raw_front_knee),
        (LungeChannel::BackKnee, raw_back_knee),
        (LungeChannel::FrontHip, raw_front_hip),
        (LungeChannel::BackHip, raw_back_hip),
        (LungeChannel::Torso, raw_torso),
        (LungeChannel::KneeOverToePercent, raw_knee_over_toe),
    ]);

    let front_knee = smoothed[&LungeChannel::FrontKnee].smoothed_value;
    let back_knee = smoothed[&LungeChannel::BackKnee].smoothed_value;
    let front_hip = smoothed[&LungeChannel::FrontHip].smoothed_value;
    let back_hip = smoothed[&LungeChannel::BackHip].smoothed_value;
    let torso = smoothed[&LungeChannel::Torso].smoothed_value;
    let knee_over_toe_percent = smoothed[&LungeChannel::KneeOverToePercent].smoothed_value;

    let (new_phase, rep_completed) = next_phase(
        state.phase,
        state.last_front_knee_angle,
        front_knee,
        &mut state.bottom_reached,
    );
    if rep_completed {
        state.rep_count += 1;
    }
    state.phase = new_phase;
    state.last_front_knee_angle = front_knee;

    let hip_flexor_active = matches!(new_phase, GenericPhase::Bottom | GenericPhase::Ascending);
    let hip_flexor_tightness = if hip_flexor_active {
        FeedbackItem::new(back_hip, HIP_FLEXOR_IDEAL, HIP_FLEXOR_ACCEPTABLE, Correction::Straighten, "lunge.hip_flexor")
    } else {
        FeedbackItem {
            level: Level::Good,
            value: back_hip,
            ideal: HIP_FLEXOR_IDEAL,
            acceptable: HIP_FLEXOR_ACCEPTABLE,
            correction: Correction::None,
            message_id: "lunge.hip_flexor.inactive",
        }
    };

    let feedback = LungeFeedback {
        front_knee: FeedbackItem::new(front_knee, FRONT_KNEE_IDEAL, FRONT_KNEE_ACCEPTABLE, Correction::None, "lunge.front_knee"),
        back_knee: FeedbackItem::new(back_knee, BACK_KNEE_IDEAL, BACK_KNEE_ACCEPTABLE, Correction::None, "lunge.back_knee"),
        front_hip: FeedbackItem::new(front_hip, HIP_IDEAL, HIP_ACCEPTABLE, Correction::None, "lunge.front_hip"),
        back_hip: FeedbackItem::new(back_hip, HIP_IDEAL, HIP_ACCEPTABLE, Correction::None, "lunge.back_hip"),
        torso: FeedbackItem::new(torso, TORSO_IDEAL, TORSO_ACCEPTABLE, Correction::Forward, "lunge.torso"),
        knee_over_toe_percent: FeedbackItem::new(
            knee_over_toe_percent,
            KNEE_OVER_TOE_IDEAL,
            KNEE_OVER_TOE_ACCEPTABLE,
            Correction::Backward,
            "lunge.knee_over_toe",
        ),
        hip_flexor_tightness,
    };

    // An item with insufficient evidence (here, phase-gated) contributes
    // 100 rather than penalizing the score.
    let hip_flexor_item_score = if hip_flexor_active {
        feedback.hip_flexor_tightness.item_score()
    } else {
        100.0
    };

    let score = composite_score(&[
        (0.25, feedback.front_knee.item_score()),
        (0.15, feedback.back_knee.item_score()),
        (0.10, feedback.front_hip.item_score()),
        (0.10, feedback.back_hip.item_score()),
        (0.15, feedback.torso.item_score()),
        (0.15, feedback.knee_over_toe_percent.item_score()),
        (0.10, hip_flexor_item_score),
    ]);

    let mut raw_angles = RawAngles::new();
    raw_angles.insert(LungeChannel::FrontKnee, raw_front_knee, front_knee);
    raw_angles.insert(LungeChannel::BackKnee, raw_back_knee, back_knee);
    raw_angles.insert(LungeChannel::FrontHip, raw_front_hip, front_hip);
    raw_angles.insert(LungeChannel::BackHip, raw_back_hip, back_hip);
    raw_angles.insert(LungeChannel::Torso, raw_torso, torso);
    raw_angles.insert(LungeChannel::KneeOverToePercent, raw_knee_over_toe, knee_over_toe_percent);

    (
        LungeAnalysisResult {
            score,
            feedback,
            phase: new_phase,
            rep_completed,
            front_leg,
            raw_angles,
        },
        state,
    )
}

fn invalid_result(state: LungeState) -> (LungeAnalysisResult, LungeState) {
    let warning = |id: &'static str| FeedbackItem::invalid(id);
    let result = LungeAnalysisResult {
        score: 0,
        feedback: LungeFeedback {
            front_knee: warning("lunge.front_knee"),
            back_knee: warning("lunge.back_knee"),
            front_hip: warning("lunge.front_hip"),
            back_hip: warning("lunge.back_hip"),
            torso: warning("lunge.torso"),
            knee_over_toe_percent: warning("lunge.knee_over_toe"),
            hip_flexor_tightness: warning("lunge.hip_flexor"),
        },
        phase: state.phase,
        rep_completed: false,
        front_leg: FrontLeg::Unknown,
        raw_angles: RawAngles::new(),
    };
    (result, state)
}
