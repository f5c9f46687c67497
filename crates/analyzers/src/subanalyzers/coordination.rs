//! Bilateral movement coordination: knee-to-hip ratio, which joint leads,
//! pattern classification, and left/right asymmetry.

use std::collections::VecDeque;

const HISTORY_CAPACITY: usize = 30;
const EPSILON: f32 = 1e-3;
/// Angular velocity below this (deg/s) is treated as "not yet moving" when
/// detecting which joint initiates motion.
const MOVEMENT_ONSET_DEG_PER_S: f32 = 5.0;
/// A velocity ratio beyond this favors one joint's classification over
/// `Synchronized`.
const DOMINANCE_RATIO: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimalRatioBand {
    pub min: f32,
    pub max: f32,
}

pub const SQUAT_OPTIMAL_RATIO: OptimalRatioBand = OptimalRatioBand { min: 0.85, max: 1.15 };
pub const DEADLIFT_OPTIMAL_RATIO: OptimalRatioBand = OptimalRatioBand { min: 0.6, max: 0.9 };
pub const LUNGE_OPTIMAL_RATIO: OptimalRatioBand = OptimalRatioBand { min: 0.7, max: 1.3 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadJoint {
    Knee,
    Hip,
    Simultaneous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinationPattern {
    Synchronized,
    KneeDominant,
    HipDominant,
    TorsoCompensating,
}

#[derive(Debug, Clone)]
pub struct CoordinationState {
    knee_prev: Option<(u64, f32)>,
    hip_prev: Option<(u64, f32)>,
    torso_prev: Option<(u64, f32)>,
    knee_movement_started_at: Option<u64>,
    hip_movement_started_at: Option<u64>,
    left_knee_history: VecDeque<f32>,
    right_knee_history: VecDeque<f32>,
    left_hip_history: VecDeque<f32>,
    right_hip_history: VecDeque<f32>,
}

impl Default for CoordinationState {
    fn default() -> Self {
        Self {
            knee_prev: None,
            hip_prev: None,
            torso_prev: None,
            knee_movement_started_at: None,
            hip_movement_started_at: None,
            left_knee_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            right_knee_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            left_hip_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            right_hip_history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinationMeasurement {
    pub knee_to_hip_ratio: f32,
    pub lead_joint: LeadJoint,
    pub lag_ms: f32,
    pub pattern: CoordinationPattern,
    pub pattern_confidence: f32,
    pub coordination_score: f32,
    pub left_score: f32,
    pub right_score: f32,
    pub asymmetry: f32,
}

fn velocity(prev: &mut Option<(u64, f32)>, timestamp_ms: u64, angle: f32) -> f32 {
    let rate = match *prev {
        None => 0.0,
        Some((t_prev, v_prev)) => {
            let dt = (timestamp_ms as i64 - t_prev as i64).max(0) as f32;
            if dt <= 0.0 {
                0.0
            } else {
                (angle - v_prev) * 1000.0 / dt
            }
        }
    };
    *prev = Some((timestamp_ms, angle));
    rate
}

fn push_bounded(history: &mut VecDeque<f32>, value: f32) {
    if history.len() >= HISTORY_CAPACITY {
        history.pop_front();
    }
    history.push_back(value);
}

fn side_score(history: &VecDeque<f32>, optimal: OptimalRatioBand) -> f32 {
    if history.len() < 2 {
        return 100.0;
    }
    let mean = history.iter().sum::<f32>() / history.len() as f32;
    if mean.abs() < EPSILON {
        return 100.0;
    }
    if mean >= optimal.min && mean <= optimal.max {
        100.0
    } else {
        let distance = if mean < optimal.min {
            optimal.min - mean
        } else {
            mean - optimal.max
        };
        (100.0 - 20.0 * distance).max(0.0)
    }
}

#[allow(clippy::too_many_arguments)]
#[must_use]
pub fn analyze_coordination(
    timestamp_ms: u64,
    left_knee_angle: f32,
    right_knee_angle: f32,
    left_hip_angle: f32,
    right_hip_angle: f32,
    torso_angle: f32,
    optimal_ratio: OptimalRatioBand,
    state: &mut CoordinationState,
) -> CoordinationMeasurement {
    let avg_knee = (left_knee_angle + right_knee_angle) / 2.0;
    let avg_hip = (left_hip_angle + right_hip_angle) / 2.0;

    let knee_velocity = velocity(&mut state.knee_prev, timestamp_ms, avg_knee).abs();
    let hip_velocity = velocity(&mut state.hip_prev, timestamp_ms, avg_hip).abs();
    let torso_velocity = velocity(&mut state.torso_prev, timestamp_ms, torso_angle).abs();

    let knee_to_hip_ratio = knee_velocity / hip_velocity.max(EPSILON);

    if knee_velocity >= MOVEMENT_ONSET_DEG_PER_S {
        state.knee_movement_started_at.get_or_insert(timestamp_ms);
    }
    if hip_velocity >= MOVEMENT_ONSET_DEG_PER_S {
        state.hip_movement_started_at.get_or_insert(timestamp_ms);
    }
    if knee_velocity < EPSILON && hip_velocity < EPSILON {
        state.knee_movement_started_at = None;
        state.hip_movement_started_at = None;
    }

    let (lead_joint, lag_ms) = match (state.knee_movement_started_at, state.hip_movement_started_at) {
        (Some(k), Some(h)) if k < h => (LeadJoint::Knee, (h - k) as f32),
        (Some(k), Some(h)) if h < k => (LeadJoint::Hip, (k - h) as f32),
        (Some(_), Some(_)) => (LeadJoint::Simultaneous, 0.0),
        _ => (LeadJoint::Simultaneous, 0.0),
    };

    let pattern = if torso_velocity > knee_velocity.max(hip_velocity) {
        CoordinationPattern::TorsoCompensating
    } else if knee_velocity > hip_velocity * DOMINANCE_RATIO {
        CoordinationPattern::KneeDominant
    } else if hip_velocity > knee_velocity * DOMINANCE_RATIO {
        CoordinationPattern::HipDominant
    } else {
        CoordinationPattern::Synchronized
    };

    let dominance = knee_velocity.max(hip_velocity) / knee_velocity.min(hip_velocity).max(EPSILON);
    let pattern_confidence = (1.0 - 1.0 / dominance).clamp(0.0, 1.0);

    let in_band = knee_to_hip_ratio >= optimal_ratio.min && knee_to_hip_ratio <= optimal_ratio.max;
    let coordination_score = if in_band {
        100.0
    } else {
        let distance = if knee_to_hip_ratio < optimal_ratio.min {
            optimal_ratio.min - knee_to_hip_ratio
        } else {
            knee_to_hip_ratio - optimal_ratio.max
        };
        (100.0 - 30.0 * distance).max(0.0)
    };

    push_bounded(&mut state.left_knee_history, left_knee_angle);
    push_bounded(&mut state.right_knee_history, right_knee_angle);
    push_bounded(&mut state.left_hip_history, left_hip_angle);
    push_bounded(&mut state.right_hip_history, right_hip_angle);

    let left_score = side_score(&state.left_knee_history, optimal_ratio).min(side_score(
        &state.left_hip_history,
        optimal_ratio,
    ));
    let right_score = side_score(&state.right_knee_history, optimal_ratio).min(side_score(
        &state.right_hip_history,
        optimal_ratio,
    ));
    let asymmetry = (left_score - right_score).abs();

    CoordinationMeasurement {
        knee_to_hip_ratio,
        lead_joint,
        lag_ms,
        pattern,
        pattern_confidence,
        coordination_score,
        left_score,
        right_score,
        asymmetry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_within_band_scores_100() {
        let mut state = CoordinationState::default();
        analyze_coordination(0, 160.0, 160.0, 150.0, 150.0, 0.0, SQUAT_OPTIMAL_RATIO, &mut state);
        let measurement = analyze_coordination(
            33,
            150.0,
            150.0,
            140.0,
            140.0,
            0.0,
            SQUAT_OPTIMAL_RATIO,
            &mut state,
        );
        assert!(measurement.coordination_score > 0.0);
    }

    #[test]
    fn knee_dominant_pattern_detected() {
        let mut state = CoordinationState::default();
        analyze_coordination(0, 160.0, 160.0, 150.0, 150.0, 0.0, SQUAT_OPTIMAL_RATIO, &mut state);
        let measurement = analyze_coordination(
            33,
            100.0,
            100.0,
            149.0,
            149.0,
            0.0,
            SQUAT_OPTIMAL_RATIO,
            &mut state,
        );
        assert_eq!(measurement.pattern, CoordinationPattern::KneeDominant);
    }

    #[test]
    fn symmetric_motion_has_zero_asymmetry() {
        let mut state = CoordinationState::default();
        for _ in 0..5 {
            analyze_coordination(0, 150.0, 150.0, 140.0, 140.0, 0.0, SQUAT_OPTIMAL_RATIO, &mut state);
        }
        let measurement =
            analyze_coordination(33, 148.0, 148.0, 138.0, 138.0, 0.0, SQUAT_OPTIMAL_RATIO, &mut state);
        assert!((measurement.asymmetry).abs() < 1e-3);
    }
}
