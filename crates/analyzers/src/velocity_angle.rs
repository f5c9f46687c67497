//! Integrated velocity-angle analyzer (L4): movement-quality
//! classification, tempo-aware threshold multipliers, and risk correlation
//! between a baseline feedback level and instantaneous angular velocity.

use crate::feedback::{Band, Level};

/// Instantaneous velocity above this (deg/s) is a hard escalation trigger
/// regardless of velocity category.
const HARD_VELOCITY_THRESHOLD_DEG_PER_S: f32 = 120.0;
const CONTROLLED_MAX_DEG_PER_S: f32 = 60.0;
const MODERATE_MAX_DEG_PER_S: f32 = 120.0;

const TEMPO_STRICT_MULTIPLIER: f32 = 0.8;
const TEMPO_LENIENT_MULTIPLIER: f32 = 1.2;
const TEMPO_NEUTRAL_MULTIPLIER: f32 = 1.0;

const NOMINAL_CONFIDENCE: f32 = 0.8;
const HARD_RULE_CONFIDENCE: f32 = 0.95;

/// Overall pace of the tracked movement, from the mean absolute angular
/// velocity across all tracked joint angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementQuality {
    Controlled,
    Moderate,
    Rushed,
}

#[must_use]
pub fn classify_movement_quality(mean_abs_velocity_deg_per_s: f32) -> MovementQuality {
    if mean_abs_velocity_deg_per_s <= CONTROLLED_MAX_DEG_PER_S {
        MovementQuality::Controlled
    } else if mean_abs_velocity_deg_per_s <= MODERATE_MAX_DEG_PER_S {
        MovementQuality::Moderate
    } else {
        MovementQuality::Rushed
    }
}

/// Where one joint's instantaneous velocity sits relative to the
/// exercise-specific optimal band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityCategory {
    Low,
    Optimal,
    High,
}

#[must_use]
pub fn classify_velocity_category(velocity_deg_per_s: f32, optimal: Band) -> VelocityCategory {
    if velocity_deg_per_s < optimal.min {
        VelocityCategory::Low
    } else if velocity_deg_per_s <= optimal.max {
        VelocityCategory::Optimal
    } else {
        VelocityCategory::High
    }
}

/// The contraction phase a rep is currently in, distinct from an exercise's
/// own standing/descending/bottom/ascending phase machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementPhase {
    Eccentric,
    Concentric,
    Isometric,
}

/// `(controlled, eccentric) -> 0.8` strict, `(rushed, concentric) -> 1.2`
/// lenient, everything else neutral.
#[must_use]
pub fn tempo_multiplier(quality: MovementQuality, phase: MovementPhase) -> f32 {
    match (quality, phase) {
        (MovementQuality::Controlled, MovementPhase::Eccentric) => TEMPO_STRICT_MULTIPLIER,
        (MovementQuality::Rushed, MovementPhase::Concentric) => TEMPO_LENIENT_MULTIPLIER,
        _ => TEMPO_NEUTRAL_MULTIPLIER,
    }
}

/// Widens or tightens a band by the tempo multiplier, for the caller to
/// apply to a feedback item's ideal/acceptable bands before classification.
#[must_use]
pub fn apply_tempo_multiplier(band: Band, multiplier: f32) -> Band {
    band.scaled(multiplier)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskCorrelation {
    pub level: Level,
    pub confidence: f32,
}

/// Escalates `warning -> error` when the velocity category is `High` or the
/// instantaneous velocity exceeds the hard rule threshold; never escalates
/// `good`, never de-escalates `error`.
#[must_use]
pub fn risk_correlation(
    baseline: Level,
    velocity_category: VelocityCategory,
    instantaneous_velocity_deg_per_s: f32,
) -> RiskCorrelation {
    let hard_rule_triggered = instantaneous_velocity_deg_per_s > HARD_VELOCITY_THRESHOLD_DEG_PER_S;
    let context_triggered = matches!(velocity_category, VelocityCategory::High);

    let level = if baseline == Level::Warning && (hard_rule_triggered || context_triggered) {
        Level::Error
    } else {
        baseline
    };

    let confidence = if hard_rule_triggered { HARD_RULE_CONFIDENCE } else { NOMINAL_CONFIDENCE };

    RiskCorrelation { level, confidence }
}

/// Mean of absolute values; `0.0` for an empty slice.
#[must_use]
pub fn mean_abs_velocity(velocities: &[f32]) -> f32 {
    if velocities.is_empty() {
        return 0.0;
    }
    velocities.iter().map(|v| v.abs()).sum::<f32>() / velocities.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_quality_bands() {
        assert_eq!(classify_movement_quality(10.0), MovementQuality::Controlled);
        assert_eq!(classify_movement_quality(60.0), MovementQuality::Controlled);
        assert_eq!(classify_movement_quality(90.0), MovementQuality::Moderate);
        assert_eq!(classify_movement_quality(200.0), MovementQuality::Rushed);
    }

    #[test]
    fn velocity_category_bands() {
        let optimal = Band::new(20.0, 80.0);
        assert_eq!(classify_velocity_category(5.0, optimal), VelocityCategory::Low);
        assert_eq!(classify_velocity_category(50.0, optimal), VelocityCategory::Optimal);
        assert_eq!(classify_velocity_category(150.0, optimal), VelocityCategory::High);
    }

    #[test]
    fn tempo_multiplier_table() {
        assert_eq!(tempo_multiplier(MovementQuality::Controlled, MovementPhase::Eccentric), 0.8);
        assert_eq!(tempo_multiplier(MovementQuality::Rushed, MovementPhase::Concentric), 1.2);
        assert_eq!(tempo_multiplier(MovementQuality::Moderate, MovementPhase::Isometric), 1.0);
        assert_eq!(tempo_multiplier(MovementQuality::Controlled, MovementPhase::Concentric), 1.0);
    }

    #[test]
    fn risk_correlation_escalates_on_high_velocity_context() {
        let result = risk_correlation(Level::Warning, VelocityCategory::High, 50.0);
        assert_eq!(result.level, Level::Error);
        assert!((result.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn risk_correlation_escalates_on_hard_velocity_rule() {
        let result = risk_correlation(Level::Warning, VelocityCategory::Optimal, 150.0);
        assert_eq!(result.level, Level::Error);
        assert!((result.confidence - 0.95).abs() < 1e-6);
    }

    #[test]
    fn risk_correlation_never_escalates_good() {
        let result = risk_correlation(Level::Good, VelocityCategory::High, 200.0);
        assert_eq!(result.level, Level::Good);
    }

    #[test]
    fn risk_correlation_leaves_calm_warning_alone() {
        let result = risk_correlation(Level::Warning, VelocityCategory::Optimal, 30.0);
        assert_eq!(result.level, Level::Warning);
    }
}
