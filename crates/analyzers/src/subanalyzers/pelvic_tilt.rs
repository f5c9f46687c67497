//! Pelvic tilt: anterior lean, lateral hip-height asymmetry, and the
//! stability of anterior tilt over a rolling window.

use std::collections::VecDeque;

use geometry::{angle_with_vertical, midpoint, project_yz, LandmarkFrame, LandmarkIndex};

/// Rolling window over which anterior-tilt stability is measured.
const STABILITY_WINDOW: usize = 30;

#[derive(Debug, Clone)]
pub struct PelvicTiltState {
    anterior_history: VecDeque<f32>,
}

impl Default for PelvicTiltState {
    fn default() -> Self {
        Self {
            anterior_history: VecDeque::with_capacity(STABILITY_WINDOW),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PelvicTiltMeasurement {
    /// Forward/backward pelvic tilt, from the hip-to-shoulder line projected
    /// into the sagittal (yz) plane, as a deviation from vertical.
    pub anterior_tilt: f32,
    /// Signed hip-height asymmetry converted to an angle.
    pub lateral_tilt: f32,
    /// `max(0, 100 - 2*stddev(anterior_tilt))` over the rolling window.
    pub stability_score: f32,
}

#[must_use]
pub fn analyze_pelvic_tilt(frame: &LandmarkFrame, state: &mut PelvicTiltState) -> PelvicTiltMeasurement {
    let l_shoulder = frame.get(LandmarkIndex::LeftShoulder.idx()).point();
    let r_shoulder = frame.get(LandmarkIndex::RightShoulder.idx()).point();
    let l_hip = frame.get(LandmarkIndex::LeftHip.idx()).point();
    let r_hip = frame.get(LandmarkIndex::RightHip.idx()).point();

    let shoulder_center = midpoint(l_shoulder, r_shoulder);
    let hip_center = midpoint(l_hip, r_hip);

    let sagittal_hip = project_yz(hip_center);
    let sagittal_shoulder = project_yz(shoulder_center);
    let raw_spine_angle = angle_with_vertical(sagittal_hip, sagittal_shoulder);
    // `angle_with_vertical` is 0 when perfectly upright; report the signed
    // deviation so forward lean and backward lean are distinguishable.
    let anterior_tilt = if sagittal_shoulder.z >= sagittal_hip.z {
        raw_spine_angle
    } else {
        -raw_spine_angle
    };

    let hip_width = (l_hip.x - r_hip.x).abs().max(1e-4);
    let lateral_tilt = ((r_hip.y - l_hip.y) / hip_width).atan().to_degrees();

    if state.anterior_history.len() >= STABILITY_WINDOW {
        state.anterior_history.pop_front();
    }
    state.anterior_history.push_back(anterior_tilt);

    let stability_score = if state.anterior_history.len() < 2 {
        100.0
    } else {
        let mean = state.anterior_history.iter().sum::<f32>() / state.anterior_history.len() as f32;
        let variance = state
            .anterior_history
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f32>()
            / state.anterior_history.len() as f32;
        (100.0 - 2.0 * variance.sqrt()).max(0.0)
    };

    PelvicTiltMeasurement {
        anterior_tilt,
        lateral_tilt,
        stability_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::{Landmark, NUM_LANDMARKS};

    fn frame(hip_y_offset: f32) -> LandmarkFrame {
        let mut points = [Landmark::invalid(); NUM_LANDMARKS];
        points[LandmarkIndex::LeftShoulder.idx()] = Landmark::new(0.4, 0.3, 0.0, 0.9);
        points[LandmarkIndex::RightShoulder.idx()] = Landmark::new(0.6, 0.3, 0.0, 0.9);
        points[LandmarkIndex::LeftHip.idx()] = Landmark::new(0.42, 0.6 + hip_y_offset, 0.0, 0.9);
        points[LandmarkIndex::RightHip.idx()] = Landmark::new(0.58, 0.6, 0.0, 0.9);
        LandmarkFrame::new(points)
    }

    #[test]
    fn level_hips_have_no_lateral_tilt() {
        let mut state = PelvicTiltState::default();
        let measurement = analyze_pelvic_tilt(&frame(0.0), &mut state);
        assert!(measurement.lateral_tilt.abs() < 1e-3);
    }

    #[test]
    fn asymmetric_hips_produce_lateral_tilt() {
        let mut state = PelvicTiltState::default();
        let measurement = analyze_pelvic_tilt(&frame(0.1), &mut state);
        assert!(measurement.lateral_tilt.abs() > 1.0);
    }

    #[test]
    fn stable_signal_keeps_high_stability_score() {
        let mut state = PelvicTiltState::default();
        let mut last = None;
        for _ in 0..10 {
            last = Some(analyze_pelvic_tilt(&frame(0.0), &mut state));
        }
        assert!(last.unwrap().stability_score > 90.0);
    }
}
