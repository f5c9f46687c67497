//! Exercise-type detection heuristic: a decision cascade over
//! body orientation and joint-angle range, run when the caller hasn't
//! configured an exercise type up front.

use geometry::{angle3, distance2, midpoint, LandmarkFrame, LandmarkIndex};

/// Vertical-vs-horizontal orientation beyond this separates squat/lunge/
/// deadlift (vertical torso) from pushup/plank (horizontal torso).
const ORIENTATION_THRESHOLD: f32 = 0.15;
/// A knee-angle range beyond this over the clip marks a squat/lunge/deadlift
/// rather than a static hold.
const KNEE_RANGE_THRESHOLD_DEG: f32 = 30.0;
/// An elbow-angle range beyond this separates push-ups (repeated elbow
/// flexion) from planks (held, near-constant elbow angle).
const ELBOW_RANGE_THRESHOLD_DEG: f32 = 40.0;
/// Forward lean beyond this, averaged over the clip, reads as a deadlift's
/// hinge posture.
const FORWARD_LEAN_THRESHOLD: f32 = 0.1;
/// Hip-to-ankle horizontal ratio outside this range marks a staggered
/// (lunge) stance rather than a symmetric one.
const HIP_ANKLE_RATIO_RANGE: (f32, f32) = (0.7, 1.4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExerciseType {
    Squat,
    Lunge,
    Deadlift,
    Pushup,
    Plank,
}

struct FrameMetrics {
    vertical_diff: f32,
    knee_angle: f32,
    elbow_angle: f32,
    forward_lean: f32,
    hip_ankle_ratio: f32,
}

fn frame_metrics(frame: &LandmarkFrame) -> Option<FrameMetrics> {
    let required = [
        LandmarkIndex::LeftShoulder.idx(),
        LandmarkIndex::RightShoulder.idx(),
        LandmarkIndex::LeftHip.idx(),
        LandmarkIndex::RightHip.idx(),
        LandmarkIndex::LeftKnee.idx(),
        LandmarkIndex::RightKnee.idx(),
        LandmarkIndex::LeftAnkle.idx(),
        LandmarkIndex::RightAnkle.idx(),
        LandmarkIndex::LeftElbow.idx(),
        LandmarkIndex::RightElbow.idx(),
        LandmarkIndex::LeftWrist.idx(),
        LandmarkIndex::RightWrist.idx(),
    ];
    if !frame.all_valid(&required, geometry::DEFAULT_MIN_SCORE) {
        return None;
    }

    let l_shoulder = frame.get(LandmarkIndex::LeftShoulder.idx()).point();
    let r_shoulder = frame.get(LandmarkIndex::RightShoulder.idx()).point();
    let l_hip = frame.get(LandmarkIndex::LeftHip.idx()).point();
    let r_hip = frame.get(LandmarkIndex::RightHip.idx()).point();
    let l_knee = frame.get(LandmarkIndex::LeftKnee.idx()).point();
    let r_knee = frame.get(LandmarkIndex::RightKnee.idx()).point();
    let l_ankle = frame.get(LandmarkIndex::LeftAnkle.idx()).point();
    let r_ankle = frame.get(LandmarkIndex::RightAnkle.idx()).point();
    let l_elbow = frame.get(LandmarkIndex::LeftElbow.idx()).point();
    let r_elbow = frame.get(LandmarkIndex::RightElbow.idx()).point();
    let l_wrist = frame.get(LandmarkIndex::LeftWrist.idx()).point();
    let r_wrist = frame.get(LandmarkIndex::RightWrist.idx()).point();

    let shoulder_center = midpoint(l_shoulder, r_shoulder);
    let hip_center = midpoint(l_hip, r_hip);
    let ankle_center = midpoint(l_ankle, r_ankle);

    let vertical_diff = (shoulder_center.y - hip_center.y).abs();
    let forward_lean = shoulder_center.y - hip_center.y;

    let knee_angle = (angle3(l_hip, l_knee, l_ankle) + angle3(r_hip, r_knee, r_ankle)) / 2.0;
    let elbow_angle = (angle3(l_shoulder, l_elbow, l_wrist) + angle3(r_shoulder, r_elbow, r_wrist)) / 2.0;

    let hip_width = distance2(l_hip, r_hip).max(1e-4);
    let hip_ankle_ratio = distance2(hip_center, ankle_center) / hip_width;

    Some(FrameMetrics {
        vertical_diff,
        knee_angle,
        elbow_angle,
        forward_lean,
        hip_ankle_ratio,
    })
}

fn range(values: &[f32]) -> f32 {
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if min.is_finite() && max.is_finite() {
        max - min
    } else {
        0.0
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

/// Runs the heuristic classifier over every frame with a valid pose,
/// returning `(type, confidence)`. Falls back to `(Squat, 0.0)` when no
/// frame carries enough landmarks to classify.
#[must_use]
pub fn detect_exercise_type(frames: &[LandmarkFrame]) -> (ExerciseType, f32) {
    let metrics: Vec<FrameMetrics> = frames.iter().filter_map(frame_metrics).collect();
    if metrics.is_empty() {
        return (ExerciseType::Squat, 0.0);
    }

    let vertical_diff = mean(&metrics.iter().map(|m| m.vertical_diff).collect::<Vec<_>>());
    let knee_angles: Vec<f32> = metrics.iter().map(|m| m.knee_angle).collect();
    let elbow_angles: Vec<f32> = metrics.iter().map(|m| m.elbow_angle).collect();
    let knee_range = range(&knee_angles);
    let elbow_range = range(&elbow_angles);
    let forward_lean = mean(&metrics.iter().map(|m| m.forward_lean).collect::<Vec<_>>());
    let hip_ankle_ratio = mean(&metrics.iter().map(|m| m.hip_ankle_ratio).collect::<Vec<_>>());

    let is_vertical = vertical_diff > ORIENTATION_THRESHOLD;

    let (exercise_type, margin) = if !is_vertical {
        if elbow_range > ELBOW_RANGE_THRESHOLD_DEG {
            (ExerciseType::Pushup, elbow_range - ELBOW_RANGE_THRESHOLD_DEG)
        } else {
            (ExerciseType::Plank, ELBOW_RANGE_THRESHOLD_DEG - elbow_range)
        }
    } else if forward_lean > FORWARD_LEAN_THRESHOLD {
        (ExerciseType::Deadlift, forward_lean - FORWARD_LEAN_THRESHOLD)
    } else if hip_ankle_ratio < HIP_ANKLE_RATIO_RANGE.0 || hip_ankle_ratio > HIP_ANKLE_RATIO_RANGE.1 {
        let distance = if hip_ankle_ratio < HIP_ANKLE_RATIO_RANGE.0 {
            HIP_ANKLE_RATIO_RANGE.0 - hip_ankle_ratio
        } else {
            hip_ankle_ratio - HIP_ANKLE_RATIO_RANGE.1
        };
        (ExerciseType::Lunge, distance)
    } else {
        (ExerciseType::Squat, knee_range.min(1.0))
    };

    // Confidence rises with how far the decisive metric cleared its
    // threshold and with how much of the clip had a usable pose.
    let pose_coverage = metrics.len() as f32 / frames.len().max(1) as f32;
    let margin_confidence = (0.55 + margin / 40.0).clamp(0.5, 0.95);
    let confidence = (margin_confidence * 0.7 + pose_coverage * 0.3).clamp(0.0, 0.95);

    (exercise_type, confidence)
}
