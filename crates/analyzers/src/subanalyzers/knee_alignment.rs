//! 3D knee alignment: valgus/varus classification, rolling per-rep peak
//! deviation, and dynamic-valgus change from a standing baseline.

use geometry::{distance3, Landmark};

use crate::feedback::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KneeAlignmentClass {
    Neutral,
    Valgus,
    Varus,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KneeAlignmentState {
    peak_deviation: f32,
    standing_baseline: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KneeAlignmentMeasurement {
    pub deviation_angle: f32,
    pub classification: KneeAlignmentClass,
    pub level: Level,
    pub peak_deviation: f32,
    pub dynamic_valgus_change: f32,
}

/// Classifies one leg's knee position relative to the straight hip-ankle
/// line and updates the per-leg rolling peak/baseline state.
///
/// `is_standing_phase` resets the per-rep peak and, the first time it is
/// observed, captures `standing_baseline` for the session.
#[must_use]
pub fn analyze_knee_alignment(
    hip: Landmark,
    knee: Landmark,
    ankle: Landmark,
    is_standing_phase: bool,
    state: &mut KneeAlignmentState,
) -> KneeAlignmentMeasurement {
    let leg_length = distance3(hip.point(), ankle.point()).max(1e-4);
    let mid_x = (hip.x + ankle.x) / 2.0;

    let deviation_angle = ((knee.x - hip.x).abs() / leg_length).atan().to_degrees();

    let toward_center = if mid_x >= hip.x {
        knee.x > hip.x && knee.x < mid_x
    } else {
        knee.x < hip.x && knee.x > mid_x
    };

    let classification = if deviation_angle < 1e-3 {
        KneeAlignmentClass::Neutral
    } else if toward_center {
        KneeAlignmentClass::Valgus
    } else {
        KneeAlignmentClass::Varus
    };

    let level = if deviation_angle <= 5.0 {
        Level::Good
    } else if deviation_angle <= 10.0 {
        Level::Warning
    } else {
        Level::Error
    };

    if is_standing_phase {
        state.peak_deviation = 0.0;
        if state.standing_baseline.is_none() {
            state.standing_baseline = Some(deviation_angle);
        }
    } else {
        state.peak_deviation = state.peak_deviation.max(deviation_angle);
    }

    let dynamic_valgus_change = deviation_angle - state.standing_baseline.unwrap_or(0.0);

    KneeAlignmentMeasurement {
        deviation_angle,
        classification,
        level,
        peak_deviation: state.peak_deviation,
        dynamic_valgus_change,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lm(x: f32, y: f32) -> Landmark {
        Landmark::new(x, y, 0.0, 0.9)
    }

    #[test]
    fn straight_knee_is_neutral() {
        let mut state = KneeAlignmentState::default();
        let measurement =
            analyze_knee_alignment(lm(0.4, 0.6), lm(0.4, 0.75), lm(0.4, 0.9), true, &mut state);
        assert_eq!(measurement.classification, KneeAlignmentClass::Neutral);
        assert_eq!(measurement.level, Level::Good);
    }

    #[test]
    fn knee_pulled_toward_centerline_is_valgus() {
        let mut state = KneeAlignmentState::default();
        // hip at x=0.3, ankle at x=0.5 -> midpoint 0.4 is "inward"; knee at 0.38
        // sits between hip and midpoint.
        let measurement =
            analyze_knee_alignment(lm(0.3, 0.6), lm(0.38, 0.75), lm(0.5, 0.9), false, &mut state);
        assert_eq!(measurement.classification, KneeAlignmentClass::Valgus);
    }

    #[test]
    fn peak_resets_on_standing_phase() {
        let mut state = KneeAlignmentState::default();
        analyze_knee_alignment(lm(0.3, 0.6), lm(0.45, 0.75), lm(0.5, 0.9), false, &mut state);
        let bottom = analyze_knee_alignment(lm(0.3, 0.6), lm(0.5, 0.75), lm(0.5, 0.9), false, &mut state);
        assert!(bottom.peak_deviation > 0.0);
        let standing = analyze_knee_alignment(lm(0.4, 0.6), lm(0.4, 0.75), lm(0.4, 0.9), true, &mut state);
        assert_eq!(standing.peak_deviation, 0.0);
    }
}
