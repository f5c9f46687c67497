//! Deadlift analyzer: the densest of the five — spine curvature,
//! neck, torso rotation, hip-hinge quality, pelvic tilt, and bilateral
//! symmetry all feed one composite score.

use nalgebra::Point3;

use geometry::{angle3, angle_with_vertical, distance3, midpoint, point_to_line_distance, symmetry_score};
use geometry::{LandmarkFrame, LandmarkIndex};
use smoothing::{AngleSmootherSet, CalibrationState, DepthConfig, SmoothingConfig};

use crate::feedback::{composite_score, Band, Correction, FeedbackItem};
use crate::phase::GenericPhase;
use crate::raw_angles::RawAngles;
use crate::subanalyzers::{
    analyze_hip_hinge, analyze_pelvic_tilt, calculate_neck_alignment, calculate_torso_rotation_measurement,
    classify_rotation_level, HipHingeState, PelvicTiltState,
};

const LOCKOUT_THRESHOLD_DEG: f32 = 155.0;
const SETUP_THRESHOLD_DEG: f32 = 120.0;

const HIP_HINGE_IDEAL: Band = Band::new(75.0, 100.0);
const HIP_HINGE_ACCEPTABLE: Band = Band::new(65.0, 115.0);
const KNEE_IDEAL: Band = Band::new(140.0, 165.0);
const KNEE_ACCEPTABLE: Band = Band::new(125.0, 175.0);
const SPINE_IDEAL: Band = Band::new(0.0, 25.0);
const SPINE_ACCEPTABLE: Band = Band::new(0.0, 40.0);
/// During the lift phase, spine thresholds tighten by 20%.
const LIFT_PHASE_SPINE_STRICTNESS: f32 = 0.8;
const BAR_PATH_IDEAL: Band = Band::new(0.0, 5.0);
const BAR_PATH_ACCEPTABLE: Band = Band::new(0.0, 12.0);
const NECK_IDEAL: Band = Band::new(0.0, 20.0);
const NECK_ACCEPTABLE: Band = Band::new(0.0, 35.0);
const PELVIC_ANTERIOR_IDEAL: Band = Band::new(-10.0, 10.0);
const PELVIC_ANTERIOR_ACCEPTABLE: Band = Band::new(-20.0, 20.0);
const PELVIC_LATERAL_IDEAL: Band = Band::new(-5.0, 5.0);
const PELVIC_LATERAL_ACCEPTABLE: Band = Band::new(-10.0, 10.0);
const HIP_HINGE_RATIO_IDEAL: Band = Band::new(1.5, 3.0);
const HIP_HINGE_RATIO_ACCEPTABLE: Band = Band::new(1.0, 4.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeadliftChannel {
    LeftHipHinge,
    RightHipHinge,
    LeftKnee,
    RightKnee,
    Spine,
    UpperSpine,
    LowerSpine,
    BarPathPercent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeadliftPhase {
    Setup,
    Lift,
    Lockout,
    Descent,
}

impl DeadliftPhase {
    #[must_use]
    pub fn to_generic(self) -> GenericPhase {
        match self {
            Self::Setup | Self::Lockout => GenericPhase::Standing,
            Self::Lift => GenericPhase::Ascending,
            Self::Descent => GenericPhase::Descending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeadliftState {
    pub phase: DeadliftPhase,
    pub rep_count: u32,
    pub lockout_reached: bool,
    pub last_hip_hinge_angle: f32,
    pub smoothers: AngleSmootherSet<DeadliftChannel>,
    pub depth_config: DepthConfig,
    pub calibration: CalibrationState,
    pub hip_hinge_quality: HipHingeState,
    pub pelvic_tilt: PelvicTiltState,
}

#[must_use]
pub fn create_initial_state(smoothing_config: SmoothingConfig, depth_config: DepthConfig) -> DeadliftState {
    DeadliftState {
        phase: DeadliftPhase::Lockout,
        rep_count: 0,
        lockout_reached: true,
        last_hip_hinge_angle: 170.0,
        smoothers: AngleSmootherSet::new(smoothing_config),
        depth_config,
        calibration: CalibrationState::default(),
        hip_hinge_quality: HipHingeState::default(),
        pelvic_tilt: PelvicTiltState::default(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadliftFeedback {
    pub left_hip_hinge: FeedbackItem,
    pub right_hip_hinge: FeedbackItem,
    pub left_knee: FeedbackItem,
    pub right_knee: FeedbackItem,
    pub spine: FeedbackItem,
    pub upper_spine: FeedbackItem,
    pub lower_spine: FeedbackItem,
    pub bar_path_percent: FeedbackItem,
    pub neck: FeedbackItem,
    pub pelvic_anterior: FeedbackItem,
    pub pelvic_lateral: FeedbackItem,
}

#[derive(Debug, Clone)]
pub struct DeadliftAnalysisResult {
    pub score: u8,
    pub feedback: DeadliftFeedback,
    pub phase: DeadliftPhase,
    pub rep_completed: bool,
    pub raw_angles: RawAngles<DeadliftChannel>,
}

const REQUIRED_LANDMARKS: [LandmarkIndex; 11] = [
    LandmarkIndex::LeftShoulder,
    LandmarkIndex::RightShoulder,
    LandmarkIndex::LeftHip,
    LandmarkIndex::RightHip,
    LandmarkIndex::LeftKnee,
    LandmarkIndex::RightKnee,
    LandmarkIndex::LeftAnkle,
    LandmarkIndex::RightAnkle,
    LandmarkIndex::LeftWrist,
    LandmarkIndex::RightWrist,
    LandmarkIndex::Nose,
];

fn mid_spine(hip_center: Point3<f32>, shoulder_center: Point3<f32>) -> Point3<f32> {
    Point3::new(
        0.4 * hip_center.x + 0.6 * shoulder_center.x,
        0.4 * hip_center.y + 0.6 * shoulder_center.y,
        0.4 * hip_center.z + 0.6 * shoulder_center.z,
    )
}

fn next_phase(
    prev_phase: DeadliftPhase,
    prev_angle: f32,
    curr_angle: f32,
    lockout_reached: &mut bool,
) -> (DeadliftPhase, bool) {
    let mut rep_completed = false;

    let new_phase = if curr_angle > LOCKOUT_THRESHOLD_DEG {
        if matches!(prev_phase, DeadliftPhase::Lift) && !*lockout_reached {
            rep_completed = true;
        }
        *lockout_reached = true;
        DeadliftPhase::Lockout
    } else if curr_angle < SETUP_THRESHOLD_DEG {
        *lockout_reached = false;
        DeadliftPhase::Setup
    } else if curr_angle > prev_angle {
        DeadliftPhase::Lift
    } else if curr_angle < prev_angle {
        DeadliftPhase::Descent
    } else {
        prev_phase
    };

    (new_phase, rep_completed)
}

#[must_use]
pub fn analyze(frame: &LandmarkFrame, mut state: DeadliftState) -> (DeadliftAnalysisResult, DeadliftState) {
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
    let l_wrist = frame.get(LandmarkIndex::LeftWrist.idx());
    let r_wrist = frame.get(LandmarkIndex::RightWrist.idx());

    let raw_left_hinge = angle3(l_shoulder.point(), l_hip.point(), l_knee.point());
    let raw_right_hinge = angle3(r_shoulder.point(), r_hip.point(), r_knee.point());
    let raw_left_knee = angle3(l_hip.point(), l_knee.point(), l_ankle.point());
    let raw_right_knee = angle3(r_hip.point(), r_knee.point(), r_ankle.point());

    let hip_center = midpoint(l_hip.point(), r_hip.point());
    let shoulder_center = midpoint(l_shoulder.point(), r_shoulder.point());
    let mid = mid_spine(hip_center, shoulder_center);

    let raw_spine = angle_with_vertical(hip_center, shoulder_center);
    let raw_upper_spine = angle_with_vertical(mid, shoulder_center);
    let raw_lower_spine = angle_with_vertical(hip_center, mid);

    let torso_length = distance3(hip_center, shoulder_center).max(1e-4);
    let wrist_mid = midpoint(l_wrist.point(), r_wrist.point());
    let bar_path_deviation = point_to_line_distance(wrist_mid, hip_center, shoulder_center);
    let raw_bar_path_percent = bar_path_deviation / torso_length * 100.0;

    let smoothed = state.smoothers.smooth_all(&[
        (DeadliftChannel::LeftHipHinge, raw_left_hinge),
        (DeadliftChannel::RightHipHinge, raw_right_hinge),
        (DeadliftChannel::LeftKnee, raw_left_knee),
        (DeadliftChannel::RightKnee, raw_right_knee),
        (DeadliftChannel::Spine, raw_spine),
        (DeadliftChannel::UpperSpine, raw_upper_spine),
        (DeadliftChannel::LowerSpine, raw_lower_spine),
        (DeadliftChannel::BarPathPercent, raw_bar_path_percent),
    ]);

    let left_hinge = smoothed[&DeadliftChannel::LeftHipHinge].smoothed_value;
    let right_hinge = smoothed[&DeadliftChannel::RightHipHinge].smoothed_value;
    let left_knee = smoothed[&DeadliftChannel::LeftKnee].smoothed_value;
    let right_knee = smoothed[&DeadliftChannel::RightKnee].smoothed_value;
    let spine = smoothed[&DeadliftChannel::Spine].smoothed_value;
    let upper_spine = smoothed[&DeadliftChannel::UpperSpine].smoothed_value;
    let lower_spine = smoothed[&DeadliftChannel::LowerSpine].smoothed_value;
    let bar_path_percent = smoothed[&DeadliftChannel::BarPathPercent].smoothed_value;

    let avg_hinge = (left_hinge + right_hinge) / 2.0;
    let avg_knee = (left_knee + right_knee) / 2.0;

    let (new_phase, rep_completed) =
        next_phase(state.phase, state.last_hip_hinge_angle, avg_hinge, &mut state.lockout_reached);
    if rep_completed {
        state.rep_count += 1;
    }
    state.phase = new_phase;
    state.last_hip_hinge_angle = avg_hinge;

    let lift_active = matches!(new_phase, DeadliftPhase::Lift);
    let spine_ideal = if lift_active { SPINE_IDEAL.scaled(LIFT_PHASE_SPINE_STRICTNESS) } else { SPINE_IDEAL };
    let spine_acceptable = if lift_active {
        SPINE_ACCEPTABLE.scaled(LIFT_PHASE_SPINE_STRICTNESS)
    } else {
        SPINE_ACCEPTABLE
    };

    let neck_measurement = calculate_neck_alignment(frame);
    let rotation_measurement = calculate_torso_rotation_measurement(frame);
    let rotation_level = classify_rotation_level(rotation_measurement.compound_score, lift_active);

    let hip_hinge_quality =
        analyze_hip_hinge(avg_hinge, avg_knee, lift_active, &mut state.hip_hinge_quality);
    let pelvic_measurement = analyze_pelvic_tilt(frame, &mut state.pelvic_tilt);

    let feedback = DeadliftFeedback {
        left_hip_hinge: FeedbackItem::new(left_hinge, HIP_HINGE_IDEAL, HIP_HINGE_ACCEPTABLE, Correction::None, "deadlift.hinge.left"),
        right_hip_hinge: FeedbackItem::new(right_hinge, HIP_HINGE_IDEAL, HIP_HINGE_ACCEPTABLE, Correction::None, "deadlift.hinge.right"),
        left_knee: FeedbackItem::new(left_knee, KNEE_IDEAL, KNEE_ACCEPTABLE, Correction::None, "deadlift.knee.left"),
        right_knee: FeedbackItem::new(right_knee, KNEE_IDEAL, KNEE_ACCEPTABLE, Correction::None, "deadlift.knee.right"),
        spine: FeedbackItem::new(spine, spine_ideal, spine_acceptable, Correction::Straighten, "deadlift.spine"),
        upper_spine: FeedbackItem::new(upper_spine, spine_ideal, spine_acceptable, Correction::Straighten, "deadlift.spine.upper"),
        lower_spine: FeedbackItem::new(lower_spine, spine_ideal, spine_acceptable, Correction::Straighten, "deadlift.spine.lower"),
        bar_path_percent: FeedbackItem::new(bar_path_percent, BAR_PATH_IDEAL, BAR_PATH_ACCEPTABLE, Correction::Backward, "deadlift.bar_path"),
        neck: FeedbackItem::new(neck_measurement.neck_angle, NECK_IDEAL, NECK_ACCEPTABLE, Correction::Straighten, "deadlift.neck"),
        pelvic_anterior: FeedbackItem::new(
            pelvic_measurement.anterior_tilt,
            PELVIC_ANTERIOR_IDEAL,
            PELVIC_ANTERIOR_ACCEPTABLE,
            Correction::None,
            "deadlift.pelvic.anterior",
        ),
        pelvic_lateral: FeedbackItem::new(
            pelvic_measurement.lateral_tilt,
            PELVIC_LATERAL_IDEAL,
            PELVIC_LATERAL_ACCEPTABLE,
            Correction::None,
            "deadlift.pelvic.lateral",
        ),
    };

    let spine_curvature_score = 0.6 * feedback.lower_spine.item_score() + 0.4 * feedback.upper_spine.item_score();
    let knee_symmetry = symmetry_score(left_knee, right_knee);
    let hinge_symmetry = symmetry_score(left_hinge, right_hinge);
    let symmetry_term = (knee_symmetry + hinge_symmetry) / 2.0;

    let mut hip_hinge_ratio_score = crate::feedback::item_score(
        hip_hinge_quality.hip_dominant_ratio,
        HIP_HINGE_RATIO_IDEAL,
        HIP_HINGE_RATIO_ACCEPTABLE,
    );
    if hip_hinge_quality.is_squat_style {
        hip_hinge_ratio_score = hip_hinge_ratio_score.min(50.0);
    }

    let pelvic_tilt_score = (feedback.pelvic_anterior.item_score()
        + feedback.pelvic_lateral.item_score()
        + pelvic_measurement.stability_score)
        / 3.0;

    let hip_hinge_score = (feedback.left_hip_hinge.item_score() + feedback.right_hip_hinge.item_score()) / 2.0;
    let knee_score = (feedback.left_knee.item_score() + feedback.right_knee.item_score()) / 2.0;

    let score = composite_score(&[
        (0.20, hip_hinge_score),
        (0.08, feedback.spine.item_score()),
        (0.10, spine_curvature_score),
        (0.13, knee_score),
        (0.09, feedback.bar_path_percent.item_score()),
        (0.13, symmetry_term),
        (0.06, feedback.neck.item_score()),
        (0.07, rotation_measurement.compound_score),
        (0.07, hip_hinge_ratio_score),
        (0.07, pelvic_tilt_score),
    ]);

    let _ = rotation_level;

    let mut raw_angles = RawAngles::new();
    raw_angles.insert(DeadliftChannel::LeftHipHinge, raw_left_hinge, left_hinge);
    raw_angles.insert(DeadliftChannel::RightHipHinge, raw_right_hinge, right_hinge);
    raw_angles.insert(DeadliftChannel::LeftKnee, raw_left_knee, left_knee);
    raw_angles.insert(DeadliftChannel::RightKnee, raw_right_knee, right_knee);
    raw_angles.insert(DeadliftChannel::Spine, raw_spine, spine);
    raw_angles.insert(DeadliftChannel::UpperSpine, raw_upper_spine, upper_spine);
    raw_angles.insert(DeadliftChannel::LowerSpine, raw_lower_spine, lower_spine);
    raw_angles.insert(DeadliftChannel::BarPathPercent, raw_bar_path_percent, bar_path_percent);

    (
        DeadliftAnalysisResult {
            score,
            feedback,
            phase: new_phase,
            rep_completed,
            raw_angles,
        },
        state,
    )
}

fn invalid_result(state: DeadliftState) -> (DeadliftAnalysisResult, DeadliftState) {
    let warning = |id: &'static str| FeedbackItem::invalid(id);
    let result = DeadliftAnalysisResult {
        score: 0,
        feedback: DeadliftFeedback {
            left_hip_hinge: warning("deadlift.hinge.left"),
            right_hip_hinge: warning("deadlift.hinge.right"),
            left_knee: warning("deadlift.knee.left"),
            right_knee: warning("deadlift.knee.right"),
            spine: warning("deadlift.spine"),
            upper_spine: warning("deadlift.spine.upper"),
            lower_spine: warning("deadlift.spine.lower"),
            bar_path_percent: warning("deadlift.bar_path"),
            neck: warning("deadlift.neck"),
            pelvic_anterior: warning("deadlift.pelvic.anterior"),
            pelvic_lateral: warning("deadlift.pelvic.lateral"),
        },
        phase: state.phase,
        rep_completed: false,
        raw_angles: RawAngles::new(),
    };
    (result, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::{Landmark, NUM_LANDMARKS};

    fn lockout_frame() -> LandmarkFrame {
        let mut points = [Landmark::invalid(); NUM_LANDMARKS];
        points[LandmarkIndex::Nose.idx()] = Landmark::new(0.5, 0.15, 0.0, 0.9);
        points[LandmarkIndex::LeftShoulder.idx()] = Landmark::new(0.45, 0.25, 0.0, 0.9);
        points[LandmarkIndex::RightShoulder.idx()] = Landmark::new(0.55, 0.25, 0.0, 0.9);
        points[LandmarkIndex::LeftHip.idx()] = Landmark::new(0.45, 0.55, 0.0, 0.9);
        points[LandmarkIndex::RightHip.idx()] = Landmark::new(0.55, 0.55, 0.0, 0.9);
        points[LandmarkIndex::LeftKnee.idx()] = Landmark::new(0.45, 0.78, 0.0, 0.9);
        points[LandmarkIndex::RightKnee.idx()] = Landmark::new(0.55, 0.78, 0.0, 0.9);
        points[LandmarkIndex::LeftAnkle.idx()] = Landmark::new(0.45, 0.97, 0.0, 0.9);
        points[LandmarkIndex::RightAnkle.idx()] = Landmark::new(0.55, 0.97, 0.0, 0.9);
        points[LandmarkIndex::LeftWrist.idx()] = Landmark::new(0.46, 0.5, 0.0, 0.9);
        points[LandmarkIndex::RightWrist.idx()] = Landmark::new(0.54, 0.5, 0.0, 0.9);
        LandmarkFrame::new(points)
    }

    #[test]
    fn lockout_from_lift_completes_rep() {
        let mut state = create_initial_state(SmoothingConfig::default(), DepthConfig::default());
        state.phase = DeadliftPhase::Lift;
        state.lockout_reached = false;
        state.last_hip_hinge_angle = 130.0;

        let (result, new_state) = analyze(&lockout_frame(), state);
        assert_eq!(result.phase, DeadliftPhase::Lockout);
        assert!(result.rep_completed);
        assert!(new_state.lockout_reached);
        assert_eq!(new_state.rep_count, 1);
    }

    #[test]
    fn invalid_pose_scores_zero() {
        let state = create_initial_state(SmoothingConfig::default(), DepthConfig::default());
        let (result, _) = analyze(&LandmarkFrame::default(), state);
        assert_eq!(result.score, 0);
    }
}
