//! Hip-hinge quality: bounded hip/knee delta histories, the hip-dominant
//! ratio, squat-style compensation flagging, and lift-initiation
//! classification (deadlift).

use std::collections::VecDeque;

const HISTORY_CAPACITY: usize = 30;
const EPSILON: f32 = 1e-3;
/// A per-frame delta beyond this magnitude counts as "movement has begun"
/// for initiation classification.
const INITIATION_DELTA_THRESHOLD: f32 = 3.0;
/// `knee < 140°` while bending strongly is read as a squat-style compensation.
const SQUAT_STYLE_KNEE_ANGLE_MAX: f32 = 140.0;
const SQUAT_STYLE_RATIO_MIN: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitiationPattern {
    HipFirst,
    KneeFirst,
    Simultaneous,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct HipHingeState {
    prev_hip_angle: Option<f32>,
    prev_knee_angle: Option<f32>,
    hip_delta_history: VecDeque<f32>,
    knee_delta_history: VecDeque<f32>,
}

impl Default for HipHingeState {
    fn default() -> Self {
        Self {
            prev_hip_angle: None,
            prev_knee_angle: None,
            hip_delta_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            knee_delta_history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HipHingeMeasurement {
    /// `|delta_hip| / max(|delta_knee|, epsilon)`. Ideal 1.5-3.0, acceptable
    /// 1.0-4.0.
    pub hip_dominant_ratio: f32,
    pub is_squat_style: bool,
    pub initiation: InitiationPattern,
}

fn push_bounded(history: &mut VecDeque<f32>, value: f32) {
    if history.len() >= HISTORY_CAPACITY {
        history.pop_front();
    }
    history.push_back(value);
}

/// First index within the last `window` entries of `history` whose
/// magnitude crosses `INITIATION_DELTA_THRESHOLD`, counting from the oldest
/// of those entries (so `0` means "led" within the window).
fn first_crossing_index(history: &VecDeque<f32>, window: usize) -> Option<usize> {
    let len = history.len();
    let start = len.saturating_sub(window);
    history
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, v)| v.abs() > INITIATION_DELTA_THRESHOLD)
        .map(|(i, _)| i - start)
}

#[must_use]
pub fn analyze_hip_hinge(
    avg_hip_angle: f32,
    avg_knee_angle: f32,
    lift_phase_active: bool,
    state: &mut HipHingeState,
) -> HipHingeMeasurement {
    let delta_hip = avg_hip_angle - state.prev_hip_angle.unwrap_or(avg_hip_angle);
    let delta_knee = avg_knee_angle - state.prev_knee_angle.unwrap_or(avg_knee_angle);
    state.prev_hip_angle = Some(avg_hip_angle);
    state.prev_knee_angle = Some(avg_knee_angle);

    push_bounded(&mut state.hip_delta_history, delta_hip);
    push_bounded(&mut state.knee_delta_history, delta_knee);

    let hip_dominant_ratio = delta_hip.abs() / delta_knee.abs().max(EPSILON);

    let is_squat_style = avg_knee_angle < SQUAT_STYLE_KNEE_ANGLE_MAX
        && (delta_knee.abs() / delta_hip.abs().max(EPSILON)) > SQUAT_STYLE_RATIO_MIN;

    let initiation = if !lift_phase_active {
        InitiationPattern::Unknown
    } else {
        let hip_cross = first_crossing_index(&state.hip_delta_history, 3);
        let knee_cross = first_crossing_index(&state.knee_delta_history, 3);
        match (hip_cross, knee_cross) {
            (Some(h), Some(k)) if h < k => InitiationPattern::HipFirst,
            (Some(h), Some(k)) if k < h => InitiationPattern::KneeFirst,
            (Some(_), Some(_)) => InitiationPattern::Simultaneous,
            _ => InitiationPattern::Unknown,
        }
    };

    HipHingeMeasurement {
        hip_dominant_ratio,
        is_squat_style,
        initiation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hip_dominant_ratio_reflects_larger_hip_movement() {
        let mut state = HipHingeState::default();
        analyze_hip_hinge(150.0, 160.0, false, &mut state);
        let measurement = analyze_hip_hinge(130.0, 155.0, false, &mut state);
        assert!(measurement.hip_dominant_ratio > 1.0);
    }

    #[test]
    fn strong_knee_bend_with_little_hip_motion_is_squat_style() {
        let mut state = HipHingeState::default();
        analyze_hip_hinge(160.0, 170.0, false, &mut state);
        let measurement = analyze_hip_hinge(158.0, 120.0, false, &mut state);
        assert!(measurement.is_squat_style);
    }

    #[test]
    fn initiation_is_unknown_outside_lift_phase() {
        let mut state = HipHingeState::default();
        let measurement = analyze_hip_hinge(150.0, 160.0, false, &mut state);
        assert_eq!(measurement.initiation, InitiationPattern::Unknown);
    }

    #[test]
    fn hip_first_initiation_detected_within_window() {
        let mut state = HipHingeState::default();
        analyze_hip_hinge(150.0, 160.0, true, &mut state);
        // large hip delta, tiny knee delta
        let measurement = analyze_hip_hinge(130.0, 159.0, true, &mut state);
        assert_eq!(measurement.initiation, InitiationPattern::HipFirst);
    }
}
