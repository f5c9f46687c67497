//! Torso rotation: transverse twist, frontal-plane shoulder tilt, and their
//! compound score.

use geometry::{calculate_torso_rotation, distance2, LandmarkFrame, LandmarkIndex};

use crate::feedback::Level;

/// Excess transverse rotation beyond this is penalized in the compound
/// score.
pub const TRANSVERSE_IDEAL_MAX_DEG: f32 = 10.0;
/// Excess frontal tilt beyond this is penalized in the compound score.
pub const FRONTAL_IDEAL_MAX_DEG: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontalDirection {
    Left,
    Right,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorsoRotationMeasurement {
    pub transverse_rotation: f32,
    pub frontal_tilt: f32,
    pub frontal_direction: FrontalDirection,
    /// `100 - (0.6*transverseExcess + 0.4*frontalExcess)`, clamped to `[0,100]`.
    pub compound_score: f32,
}

#[must_use]
pub fn calculate_torso_rotation_measurement(frame: &LandmarkFrame) -> TorsoRotationMeasurement {
    let l_shoulder = frame.get(LandmarkIndex::LeftShoulder.idx()).point();
    let r_shoulder = frame.get(LandmarkIndex::RightShoulder.idx()).point();
    let l_hip = frame.get(LandmarkIndex::LeftHip.idx()).point();
    let r_hip = frame.get(LandmarkIndex::RightHip.idx()).point();

    let transverse_rotation = calculate_torso_rotation(l_shoulder, r_shoulder, l_hip, r_hip);

    let shoulder_width = distance2(l_shoulder, r_shoulder);
    let vertical_offset = r_shoulder.y - l_shoulder.y;
    let frontal_tilt = if shoulder_width == 0.0 {
        0.0
    } else {
        vertical_offset.atan2(shoulder_width).to_degrees()
    };
    let frontal_direction = if frontal_tilt.abs() < 1e-3 {
        FrontalDirection::None
    } else if vertical_offset > 0.0 {
        // the right shoulder sits lower in image-y => the torso tips right.
        FrontalDirection::Right
    } else {
        FrontalDirection::Left
    };

    let transverse_excess = (transverse_rotation - TRANSVERSE_IDEAL_MAX_DEG).max(0.0);
    let frontal_excess = (frontal_tilt.abs() - FRONTAL_IDEAL_MAX_DEG).max(0.0);
    let compound_score = (100.0 - (0.6 * transverse_excess + 0.4 * frontal_excess)).clamp(0.0, 100.0);

    TorsoRotationMeasurement {
        transverse_rotation,
        frontal_tilt,
        frontal_direction,
        compound_score,
    }
}

/// Derives a feedback level from the compound score, escalating a warning
/// to an error when the caller indicates the lift phase is active.
#[must_use]
pub fn classify_rotation_level(compound_score: f32, lift_phase_active: bool) -> Level {
    let level = if compound_score >= 85.0 {
        Level::Good
    } else if compound_score >= 60.0 {
        Level::Warning
    } else {
        Level::Error
    };
    if lift_phase_active && level == Level::Warning {
        Level::Error
    } else {
        level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::{Landmark, NUM_LANDMARKS};

    fn frame(shoulder_y_offset: f32) -> LandmarkFrame {
        let mut points = [Landmark::invalid(); NUM_LANDMARKS];
        points[LandmarkIndex::LeftShoulder.idx()] = Landmark::new(0.4, 0.3, 0.0, 0.9);
        points[LandmarkIndex::RightShoulder.idx()] =
            Landmark::new(0.6, 0.3 + shoulder_y_offset, 0.0, 0.9);
        points[LandmarkIndex::LeftHip.idx()] = Landmark::new(0.42, 0.6, 0.0, 0.9);
        points[LandmarkIndex::RightHip.idx()] = Landmark::new(0.58, 0.6, 0.0, 0.9);
        LandmarkFrame::new(points)
    }

    #[test]
    fn level_torso_yields_high_compound_score() {
        let measurement = calculate_torso_rotation_measurement(&frame(0.0));
        assert!(measurement.compound_score >= 85.0);
        assert_eq!(measurement.frontal_direction, FrontalDirection::None);
    }

    #[test]
    fn tilted_shoulders_lower_compound_score() {
        let measurement = calculate_torso_rotation_measurement(&frame(0.2));
        assert!(measurement.compound_score < 100.0);
        assert_eq!(measurement.frontal_direction, FrontalDirection::Right);
    }

    #[test]
    fn lift_phase_escalates_warning_to_error() {
        assert_eq!(classify_rotation_level(70.0, false), Level::Warning);
        assert_eq!(classify_rotation_level(70.0, true), Level::Error);
        assert_eq!(classify_rotation_level(95.0, true), Level::Good);
    }
}
