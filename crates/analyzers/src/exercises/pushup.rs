//! Push-up analyzer: bilateral elbow tracking, body-line sag/pike,
//! and a session-local range-of-motion depth percentage.

use geometry::{angle3, angle_with_horizontal, distance2, midpoint, point_to_line_distance, symmetry_score};
use geometry::{LandmarkFrame, LandmarkIndex};
use smoothing::{AngleSmootherSet, CalibrationState, DepthConfig, SmoothingConfig};

use crate::feedback::{composite_score, Band, Correction, FeedbackItem};
use crate::phase::GenericPhase;
use crate::raw_angles::RawAngles;

const UP_THRESHOLD_DEG: f32 = 150.0;
const BOTTOM_THRESHOLD_DEG: f32 = 100.0;
const HYSTERESIS_DEG: f32 = 5.0;

const ELBOW_IDEAL: Band = Band::new(80.0, 100.0);
const ELBOW_ACCEPTABLE: Band = Band::new(70.0, 110.0);
const BODY_ALIGNMENT_IDEAL: Band = Band::new(0.0, 10.0);
const BODY_ALIGNMENT_ACCEPTABLE: Band = Band::new(0.0, 20.0);
const HIP_POSITION_IDEAL: Band = Band::new(-8.0, 8.0);
const HIP_POSITION_ACCEPTABLE: Band = Band::new(-15.0, 15.0);
const DEPTH_IDEAL: Band = Band::new(80.0, 100.0);
const DEPTH_ACCEPTABLE: Band = Band::new(60.0, 100.0);
const ELBOW_VALGUS_IDEAL: Band = Band::new(0.0, 8.0);
const ELBOW_VALGUS_ACCEPTABLE: Band = Band::new(0.0, 15.0);
/// Arm symmetry uses a single open-ended band: `>= 90` ideal, `>= 70`
/// acceptable, expressed as `[min, 100]` bands so `item_score` applies
/// unchanged.
const ARM_SYMMETRY_IDEAL: Band = Band::new(90.0, 100.0);
const ARM_SYMMETRY_ACCEPTABLE: Band = Band::new(70.0, 100.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushupChannel {
    LeftElbow,
    RightElbow,
    BodyAlignment,
    HipPosition,
    ElbowValgus,
}

#[derive(Debug, Clone)]
pub struct PushupState {
    pub phase: GenericPhase,
    pub rep_count: u32,
    pub bottom_reached: bool,
    pub last_avg_elbow_angle: f32,
    pub smoothers: AngleSmootherSet<PushupChannel>,
    pub depth_config: DepthConfig,
    pub calibration: CalibrationState,
    /// Smallest average elbow angle observed so far this session, the
    /// empirical "full depth" reference the depth percentage is measured
    /// against (session-local ROM rather than a fixed
    /// anatomical target, since no per-user calibration exists).
    pub rom_min_elbow_angle: f32,
    pub rom_max_elbow_angle: f32,
}

#[must_use]
pub fn create_initial_state(smoothing_config: SmoothingConfig, depth_config: DepthConfig) -> PushupState {
    PushupState {
        phase: GenericPhase::Standing,
        rep_count: 0,
        bottom_reached: false,
        last_avg_elbow_angle: 180.0,
        smoothers: AngleSmootherSet::new(smoothing_config),
        depth_config,
        calibration: CalibrationState::default(),
        rom_min_elbow_angle: 180.0,
        rom_max_elbow_angle: 180.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PushupFeedback {
    pub left_elbow: FeedbackItem,
    pub right_elbow: FeedbackItem,
    pub body_alignment: FeedbackItem,
    pub hip_position: FeedbackItem,
    pub depth_percent: FeedbackItem,
    pub elbow_valgus: FeedbackItem,
    pub arm_symmetry: FeedbackItem,
}

#[derive(Debug, Clone)]
pub struct PushupAnalysisResult {
    pub score: u8,
    pub feedback: PushupFeedback,
    pub phase: GenericPhase,
    pub rep_completed: bool,
    pub raw_angles: RawAngles<PushupChannel>,
}

const REQUIRED_LANDMARKS: [LandmarkIndex; 8] = [
    LandmarkIndex::LeftShoulder,
    LandmarkIndex::RightShoulder,
    LandmarkIndex::LeftElbow,
    LandmarkIndex::RightElbow,
    LandmarkIndex::LeftWrist,
    LandmarkIndex::RightWrist,
    LandmarkIndex::LeftHip,
    LandmarkIndex::RightHip,
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
            if curr_angle < UP_THRESHOLD_DEG - HYSTERESIS_DEG {
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
            if curr_angle > UP_THRESHOLD_DEG + HYSTERESIS_DEG {
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
pub fn analyze(frame: &LandmarkFrame, mut state: PushupState) -> (PushupAnalysisResult, PushupState) {
    if !frame.all_valid(
        &REQUIRED_LANDMARKS.iter().map(|i| i.idx()).collect::<Vec<_>>(),
        geometry::DEFAULT_MIN_SCORE,
    ) {
        return invalid_result(state);
    }

    let l_shoulder = frame.get(LandmarkIndex::LeftShoulder.idx());
    let r_shoulder = frame.get(LandmarkIndex::RightShoulder.idx());
    let l_elbow = frame.get(LandmarkIndex::LeftElbow.idx());
    let r_elbow = frame.get(LandmarkIndex::RightElbow.idx());
    let l_wrist = frame.get(LandmarkIndex::LeftWrist.idx());
    let r_wrist = frame.get(LandmarkIndex::RightWrist.idx());
    let l_hip = frame.get(LandmarkIndex::LeftHip.idx());
    let r_hip = frame.get(LandmarkIndex::RightHip.idx());
    let l_ankle = frame.get(LandmarkIndex::LeftAnkle.idx());
    let r_ankle = frame.get(LandmarkIndex::RightAnkle.idx());

    let raw_left_elbow = angle3(l_shoulder.point(), l_elbow.point(), l_wrist.point());
    let raw_right_elbow = angle3(r_shoulder.point(), r_elbow.point(), r_wrist.point());

    let shoulder_center = midpoint(l_shoulder.point(), r_shoulder.point());
    let hip_center = midpoint(l_hip.point(), r_hip.point());
    let ankle_valid = l_ankle.is_valid(geometry::DEFAULT_MIN_SCORE) && r_ankle.is_valid(geometry::DEFAULT_MIN_SCORE);
    let ankle_center = midpoint(l_ankle.point(), r_ankle.point());

    // Body-line deviation from straight (shoulder -> ankle, or shoulder ->
    // hip extended, when ankles aren't tracked) measured at the hip.
    let raw_body_alignment = if ankle_valid {
        point_to_line_distance(hip_center, shoulder_center, ankle_center) / distance2(shoulder_center, ankle_center).max(1e-4)
            * 100.0
    } else {
        0.0
    };

    // Signed hip deviation: positive is a pike (hips above the line),
    // negative is a sag (hips below it).
    let raw_hip_position = if ankle_valid {
        let line_y_at_hip = shoulder_center.y
            + (hip_center.x - shoulder_center.x) / (ankle_center.x - shoulder_center.x).max(1e-4)
                * (ankle_center.y - shoulder_center.y);
        (line_y_at_hip - hip_center.y) / distance2(shoulder_center, ankle_center).max(1e-4) * 100.0
    } else {
        0.0
    };

    // Elbows flaring unevenly tilt the elbow-to-elbow line away from
    // horizontal; its magnitude stands in for elbow-valgus severity.
    let raw_elbow_valgus = angle_with_horizontal(l_elbow.point(), r_elbow.point()).abs();

    let smoothed = state.smoothers.smooth_all(&[
        (PushupChannel::LeftElbow, raw_left_elbow),
        (PushupChannel::RightElbow, raw_right_elbow),
        (PushupChannel::BodyAlignment, raw_body_alignment),
        (PushupChannel::HipPosition, raw_hip_position),
        (PushupChannel::ElbowValgus, raw_elbow_valgus),
    ]);

    let left_elbow = smoothed[&PushupChannel::LeftElbow].smoothed_value;
    let right_elbow = smoothed[&PushupChannel::RightElbow].smoothed_value;
    let body_alignment = smoothed[&PushupChannel::BodyAlignment].smoothed_value;
    let hip_position = smoothed[&PushupChannel::HipPosition].smoothed_value;
    let elbow_valgus = smoothed[&PushupChannel::ElbowValgus].smoothed_value;

    let avg_elbow = (left_elbow + right_elbow) / 2.0;

    state.rom_min_elbow_angle = state.rom_min_elbow_angle.min(avg_elbow);
    state.rom_max_elbow_angle = state.rom_max_elbow_angle.max(avg_elbow);
    let rom_span = (state.rom_max_elbow_angle - state.rom_min_elbow_angle).max(1e-4);
    let depth_percent = ((state.rom_max_elbow_angle - avg_elbow) / rom_span * 100.0).clamp(0.0, 100.0);

    let (new_phase, rep_completed) =
        next_phase(state.phase, state.last_avg_elbow_angle, avg_elbow, &mut state.bottom_reached);
    if rep_completed {
        state.rep_count += 1;
    }
    state.phase = new_phase;
    state.last_avg_elbow_angle = avg_elbow;

    let arm_symmetry = symmetry_score(left_elbow, right_elbow);

    let feedback = PushupFeedback {
        left_elbow: FeedbackItem::new(left_elbow, ELBOW_IDEAL, ELBOW_ACCEPTABLE, Correction::None, "pushup.elbow.left"),
        right_elbow: FeedbackItem::new(right_elbow, ELBOW_IDEAL, ELBOW_ACCEPTABLE, Correction::None, "pushup.elbow.right"),
        body_alignment: FeedbackItem::new(
            body_alignment,
            BODY_ALIGNMENT_IDEAL,
            BODY_ALIGNMENT_ACCEPTABLE,
            Correction::Straighten,
            "pushup.body_alignment",
        ),
        hip_position: FeedbackItem::new(
            hip_position,
            HIP_POSITION_IDEAL,
            HIP_POSITION_ACCEPTABLE,
            Correction::None,
            "pushup.hip_position",
        ),
        depth_percent: FeedbackItem::new(depth_percent, DEPTH_IDEAL, DEPTH_ACCEPTABLE, Correction::Down, "pushup.depth"),
        elbow_valgus: FeedbackItem::new(
            elbow_valgus,
            ELBOW_VALGUS_IDEAL,
            ELBOW_VALGUS_ACCEPTABLE,
            Correction::Outward,
            "pushup.elbow_valgus",
        ),
        arm_symmetry: FeedbackItem::new(arm_symmetry, ARM_SYMMETRY_IDEAL, ARM_SYMMETRY_ACCEPTABLE, Correction::None, "pushup.arm_symmetry"),
    };

    let score = composite_score(&[
        (0.30, (feedback.left_elbow.item_score() + feedback.right_elbow.item_score()) / 2.0),
        (0.20, feedback.body_alignment.item_score()),
        (0.15, feedback.hip_position.item_score()),
        (0.15, feedback.depth_percent.item_score()),
        (0.10, feedback.elbow_valgus.item_score()),
        (0.10, feedback.arm_symmetry.item_score()),
    ]);

    let mut raw_angles = RawAngles::new();
    raw_angles.insert(PushupChannel::LeftElbow, raw_left_elbow, left_elbow);
    raw_angles.insert(PushupChannel::RightElbow, raw_right_elbow, right_elbow);
    raw_angles.insert(PushupChannel::BodyAlignment, raw_body_alignment, body_alignment);
    raw_angles.insert(PushupChannel::HipPosition, raw_hip_position, hip_position);
    raw_angles.insert(PushupChannel::ElbowValgus, raw_elbow_valgus, elbow_valgus);

    (
        PushupAnalysisResult {
            score,
            feedback,
            phase: new_phase,
            rep_completed,
            raw_angles,
        },
        state,
    )
}

fn invalid_result(state: PushupState) -> (PushupAnalysisResult, PushupState) {
    let warning = |id: &'static str| FeedbackItem::invalid(id);
    let result = PushupAnalysisResult {
        score: 0,
        feedback: PushupFeedback {
            left_elbow: warning("pushup.elbow.left"),
            right_elbow: warning("pushup.elbow.right"),
            body_alignment: warning("pushup.body_alignment"),
            hip_position: warning("pushup.hip_position"),
            depth_percent: warning("pushup.depth"),
            elbow_valgus: warning("pushup.elbow_valgus"),
            arm_symmetry: warning("pushup.arm_symmetry"),
        },
        phase: state.phase,
        rep_completed: false,
        raw_angles: RawAngles::new(),
    };
    (result, state)
}
