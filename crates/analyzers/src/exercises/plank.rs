//! Plank analyzer: an isometric hold, scored every frame with no
//! phase machine, but accumulating hold time as long as the pose stays
//! valid and scores well enough to count.

use geometry::{angle_between_segments, distance2, midpoint, point_to_line_distance};
use geometry::{LandmarkFrame, LandmarkIndex};
use smoothing::{AngleSmootherSet, CalibrationState, DepthConfig, SmoothingConfig};

use crate::feedback::{composite_score, Band, Correction, FeedbackItem};
use crate::raw_angles::RawAngles;

/// A frame counts toward hold time only when the composite score reaches
/// this floor and every required keypoint is valid.
const VALID_PLANK_SCORE_THRESHOLD: u8 = 60;

const BODY_ALIGNMENT_IDEAL: Band = Band::new(0.0, 8.0);
const BODY_ALIGNMENT_ACCEPTABLE: Band = Band::new(0.0, 15.0);
const HIP_POSITION_IDEAL: Band = Band::new(-5.0, 5.0);
const HIP_POSITION_ACCEPTABLE: Band = Band::new(-12.0, 12.0);
const SHOULDER_ALIGNMENT_IDEAL: Band = Band::new(0.0, 10.0);
const SHOULDER_ALIGNMENT_ACCEPTABLE: Band = Band::new(0.0, 20.0);
const NECK_IDEAL: Band = Band::new(0.0, 15.0);
const NECK_ACCEPTABLE: Band = Band::new(0.0, 25.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlankChannel {
    BodyAlignment,
    HipPosition,
    ShoulderAlignment,
    Neck,
}

#[derive(Debug, Clone)]
pub struct PlankState {
    pub smoothers: AngleSmootherSet<PlankChannel>,
    pub depth_config: DepthConfig,
    pub calibration: CalibrationState,
    pub total_hold_time_ms: f32,
    pub current_hold_time_ms: f32,
    pub last_timestamp_ms: Option<f64>,
}

#[must_use]
pub fn create_initial_state(smoothing_config: SmoothingConfig, depth_config: DepthConfig) -> PlankState {
    PlankState {
        smoothers: AngleSmootherSet::new(smoothing_config),
        depth_config,
        calibration: CalibrationState::default(),
        total_hold_time_ms: 0.0,
        current_hold_time_ms: 0.0,
        last_timestamp_ms: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlankFeedback {
    pub body_alignment: FeedbackItem,
    pub hip_position: FeedbackItem,
    pub shoulder_alignment: FeedbackItem,
    pub neck: FeedbackItem,
}

#[derive(Debug, Clone)]
pub struct PlankAnalysisResult {
    pub score: u8,
    pub feedback: PlankFeedback,
    pub is_valid_plank: bool,
    pub current_hold_time_ms: f32,
    pub total_hold_time_ms: f32,
    pub raw_angles: RawAngles<PlankChannel>,
}

const REQUIRED_LANDMARKS: [LandmarkIndex; 7] = [
    LandmarkIndex::Nose,
    LandmarkIndex::LeftShoulder,
    LandmarkIndex::RightShoulder,
    LandmarkIndex::LeftWrist,
    LandmarkIndex::RightWrist,
    LandmarkIndex::LeftHip,
    LandmarkIndex::RightHip,
];

/// Analyzes one frame of a plank hold. Unlike the other four exercises,
/// plank has no phase machine and needs the frame's wall-clock timestamp to
/// accumulate hold duration.
#[must_use]
pub fn analyze(frame: &LandmarkFrame, timestamp_ms: f64, mut state: PlankState) -> (PlankAnalysisResult, PlankState) {
    if !frame.all_valid(
        &REQUIRED_LANDMARKS.iter().map(|i| i.idx()).collect::<Vec<_>>(),
        geometry::DEFAULT_MIN_SCORE,
    ) {
        state.current_hold_time_ms = 0.0;
        state.last_timestamp_ms = Some(timestamp_ms);
        return invalid_result(state);
    }

    let nose = frame.get(LandmarkIndex::Nose.idx()).point();
    let l_shoulder = frame.get(LandmarkIndex::LeftShoulder.idx()).point();
    let r_shoulder = frame.get(LandmarkIndex::RightShoulder.idx()).point();
    let l_wrist = frame.get(LandmarkIndex::LeftWrist.idx()).point();
    let r_wrist = frame.get(LandmarkIndex::RightWrist.idx()).point();
    let l_hip = frame.get(LandmarkIndex::LeftHip.idx()).point();
    let r_hip = frame.get(LandmarkIndex::RightHip.idx()).point();
    let l_ankle = frame.get(LandmarkIndex::LeftAnkle.idx());
    let r_ankle = frame.get(LandmarkIndex::RightAnkle.idx());

    let shoulder_center = midpoint(l_shoulder, r_shoulder);
    let wrist_center = midpoint(l_wrist, r_wrist);
    let hip_center = midpoint(l_hip, r_hip);
    let ankle_valid = l_ankle.is_valid(geometry::DEFAULT_MIN_SCORE) && r_ankle.is_valid(geometry::DEFAULT_MIN_SCORE);
    let ankle_center = midpoint(l_ankle.point(), r_ankle.point());
    let far_end = if ankle_valid { ankle_center } else { wrist_center };

    let raw_body_alignment =
        point_to_line_distance(hip_center, shoulder_center, far_end) / distance2(shoulder_center, far_end).max(1e-4) * 100.0;

    let raw_hip_position = if ankle_valid {
        let line_y_at_hip = shoulder_center.y
            + (hip_center.x - shoulder_center.x) / (ankle_center.x - shoulder_center.x).max(1e-4)
                * (ankle_center.y - shoulder_center.y);
        (line_y_at_hip - hip_center.y) / distance2(shoulder_center, ankle_center).max(1e-4) * 100.0
    } else {
        0.0
    };

    let shoulder_width = distance2(l_shoulder, r_shoulder).max(1e-4);
    let raw_shoulder_alignment = ((wrist_center.x - shoulder_center.x).abs() / shoulder_width * 100.0).abs();

    let raw_neck = angle_between_segments(shoulder_center, nose, hip_center, shoulder_center);

    let smoothed = state.smoothers.smooth_all(&[
        (PlankChannel::BodyAlignment, raw_body_alignment),
        (PlankChannel::HipPosition, raw_hip_position),
        (PlankChannel::ShoulderAlignment, raw_shoulder_alignment),
        (PlankChannel::Neck, raw_neck),
    ]);

    let body_alignment = smoothed[&PlankChannel::BodyAlignment].smoothed_value;
    let hip_position = smoothed[&PlankChannel::HipPosition].smoothed_value;
    let shoulder_alignment = smoothed[&PlankChannel::ShoulderAlignment].smoothed_value;
    let neck = smoothed[&PlankChannel::Neck].smoothed_value;

    let feedback = PlankFeedback {
        body_alignment: FeedbackItem::new(
            body_alignment,
            BODY_ALIGNMENT_IDEAL,
            BODY_ALIGNMENT_ACCEPTABLE,
            Correction::Straighten,
            "plank.body_alignment",
        ),
        hip_position: FeedbackItem::new(hip_position, HIP_POSITION_IDEAL, HIP_POSITION_ACCEPTABLE, Correction::None, "plank.hip_position"),
        shoulder_alignment: FeedbackItem::new(
            shoulder_alignment,
            SHOULDER_ALIGNMENT_IDEAL,
            SHOULDER_ALIGNMENT_ACCEPTABLE,
            Correction::None,
            "plank.shoulder_alignment",
        ),
        neck: FeedbackItem::new(neck, NECK_IDEAL, NECK_ACCEPTABLE, Correction::Straighten, "plank.neck"),
    };

    let score = composite_score(&[
        (0.40, feedback.body_alignment.item_score()),
        (0.25, feedback.hip_position.item_score()),
        (0.20, feedback.shoulder_alignment.item_score()),
        (0.15, feedback.neck.item_score()),
    ]);

    let is_valid_plank = score >= VALID_PLANK_SCORE_THRESHOLD;

    let elapsed_ms = state
        .last_timestamp_ms
        .map_or(0.0, |prev| (timestamp_ms - prev).max(0.0) as f32);
    state.last_timestamp_ms = Some(timestamp_ms);

    if is_valid_plank {
        state.current_hold_time_ms += elapsed_ms;
        state.total_hold_time_ms += elapsed_ms;
    } else {
        state.current_hold_time_ms = 0.0;
    }

    let mut raw_angles = RawAngles::new();
    raw_angles.insert(PlankChannel::BodyAlignment, raw_body_alignment, body_alignment);
    raw_angles.insert(PlankChannel::HipPosition, raw_hip_position, hip_position);
    raw_angles.insert(PlankChannel::ShoulderAlignment, raw_shoulder_alignment, shoulder_alignment);
    raw_angles.insert(PlankChannel::Neck, raw_neck, neck);

    (
        PlankAnalysisResult {
            score,
            feedback,
            is_valid_plank,
            current_hold_time_ms: state.current_hold_time_ms,
            total_hold_time_ms: state.total_hold_time_ms,
            raw_angles,
        },
        state,
    )
}

fn invalid_result(state: PlankState) -> (PlankAnalysisResult, PlankState) {
    let warning = |id: &'static str| FeedbackItem::invalid(id);
    let result = PlankAnalysisResult {
        score: 0,
        feedback: PlankFeedback {
            body_alignment: warning("plank.body_alignment"),
            hip_position: warning("plank.hip_position"),
            shoulder_alignment: warning("plank.shoulder_alignment"),
            neck: warning("plank.neck"),
        },
        is_valid_plank: false,
        current_hold_time_ms: state.current_hold_time_ms,
        total_hold_time_ms: state.total_hold_time_ms,
        raw_angles: RawAngles::new(),
    };
    (result, state)
}
