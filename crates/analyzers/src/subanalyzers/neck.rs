//! Neck alignment relative to the spine axis.

use geometry::{angle_between_segments, distance2, midpoint, LandmarkFrame, LandmarkIndex};

/// Nose, both shoulders, both hips.
pub const NECK_REQUIRED_LANDMARKS: [LandmarkIndex; 5] = [
    LandmarkIndex::Nose,
    LandmarkIndex::LeftShoulder,
    LandmarkIndex::RightShoulder,
    LandmarkIndex::LeftHip,
    LandmarkIndex::RightHip,
];

/// Raw neck-posture measurement for one frame. Exercise analyzers classify
/// this against their own ideal/acceptable bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeckMeasurement {
    /// Angle in degrees between the neck segment (shoulder-center -> nose)
    /// and the spine segment (hip-center -> shoulder-center). `0` means the
    /// head continues the spine's line; larger values mean flexion or
    /// extension away from it.
    pub neck_angle: f32,
    /// Horizontal displacement of the nose from the shoulder center,
    /// normalized by shoulder width. Positive values read as forward-head
    /// posture.
    pub forward_displacement: f32,
}

#[must_use]
pub fn calculate_neck_alignment(frame: &LandmarkFrame) -> NeckMeasurement {
    let nose = frame.get(LandmarkIndex::Nose.idx()).point();
    let l_shoulder = frame.get(LandmarkIndex::LeftShoulder.idx()).point();
    let r_shoulder = frame.get(LandmarkIndex::RightShoulder.idx()).point();
    let l_hip = frame.get(LandmarkIndex::LeftHip.idx()).point();
    let r_hip = frame.get(LandmarkIndex::RightHip.idx()).point();

    let shoulder_center = midpoint(l_shoulder, r_shoulder);
    let hip_center = midpoint(l_hip, r_hip);

    let neck_angle = angle_between_segments(shoulder_center, nose, hip_center, shoulder_center);

    let shoulder_width = distance2(l_shoulder, r_shoulder);
    let forward_displacement = if shoulder_width == 0.0 {
        0.0
    } else {
        (nose.x - shoulder_center.x) / shoulder_width
    };

    NeckMeasurement {
        neck_angle,
        forward_displacement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::{Landmark, NUM_LANDMARKS};

    fn frame(nose_x: f32) -> LandmarkFrame {
        let mut points = [Landmark::invalid(); NUM_LANDMARKS];
        points[LandmarkIndex::Nose.idx()] = Landmark::new(nose_x, 0.1, 0.0, 0.9);
        points[LandmarkIndex::LeftShoulder.idx()] = Landmark::new(0.4, 0.3, 0.0, 0.9);
        points[LandmarkIndex::RightShoulder.idx()] = Landmark::new(0.6, 0.3, 0.0, 0.9);
        points[LandmarkIndex::LeftHip.idx()] = Landmark::new(0.42, 0.6, 0.0, 0.9);
        points[LandmarkIndex::RightHip.idx()] = Landmark::new(0.58, 0.6, 0.0, 0.9);
        LandmarkFrame::new(points)
    }

    #[test]
    fn neck_centered_over_spine_has_small_angle() {
        let measurement = calculate_neck_alignment(&frame(0.5));
        assert!(measurement.neck_angle < 30.0);
        assert!(measurement.forward_displacement.abs() < 1e-3);
    }

    #[test]
    fn forward_head_posture_is_positive_displacement() {
        let measurement = calculate_neck_alignment(&frame(0.8));
        assert!(measurement.forward_displacement > 0.0);
    }
}
