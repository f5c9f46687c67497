//! Ideal/acceptable band classification and score aggregation,
//! shared by every exercise analyzer.

use std::fmt;

/// Severity of one measurement's deviation from its ideal band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    Good,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// The corrective cue associated with a [`FeedbackItem`]. The message text
/// itself is localized elsewhere; this is the structured part of the cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Correction {
    None,
    Up,
    Down,
    Forward,
    Backward,
    Inward,
    Outward,
    Raise,
    Lower,
    Straighten,
}

/// A closed numeric interval.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Band {
    pub min: f32,
    pub max: f32,
}

impl Band {
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Scales both bounds by `factor` around the origin (used for the
    /// deadlift's lift-phase spine tightening and the L4 tempo multiplier).
    #[must_use]
    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }
}

/// One measurement's classification, value, and corrective cue.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeedbackItem {
    pub level: Level,
    pub value: f32,
    pub ideal: Band,
    pub acceptable: Band,
    pub correction: Correction,
    pub message_id: &'static str,
}

impl FeedbackItem {
    #[must_use]
    pub fn new(
        value: f32,
        ideal: Band,
        acceptable: Band,
        correction: Correction,
        message_id: &'static str,
    ) -> Self {
        Self {
            level: classify_level(value, ideal, acceptable),
            value,
            ideal,
            acceptable,
            correction,
            message_id,
        }
    }

    /// A warning-level item with no numeric basis, for invalid-pose frames
    /// (the PoseUnrecognized case).
    #[must_use]
    pub fn invalid(message_id: &'static str) -> Self {
        Self {
            level: Level::Warning,
            value: 0.0,
            ideal: Band::new(0.0, 0.0),
            acceptable: Band::new(0.0, 0.0),
            correction: Correction::None,
            message_id,
        }
    }

    #[must_use]
    pub fn item_score(&self) -> f32 {
        item_score(self.value, self.ideal, self.acceptable)
    }
}

/// `Good` within the ideal band, `Warning` within the acceptable band,
/// `Error` outside both. Monotone: moving `value` toward the ideal band's
/// center never worsens the level.
#[must_use]
pub fn classify_level(value: f32, ideal: Band, acceptable: Band) -> Level {
    if ideal.contains(value) {
        Level::Good
    } else if acceptable.contains(value) {
        Level::Warning
    } else {
        Level::Error
    }
}

/// Per-item score from value `v` against nested ideal/acceptable bands:
///
/// - `v` in `[i1, i2]` -> `100`.
/// - `v` in `[a1, i1)` -> `90 - 30*(i1-v)/(i1-a1)`.
/// - `v` in `(i2, a2]` -> `90 - 30*(v-i2)/(a2-i2)`.
/// - `v < a1` -> `max(0, 60 - 2*(a1-v))`.
/// - `v > a2` -> `max(0, 60 - 2*(v-a2))`.
#[must_use]
pub fn item_score(value: f32, ideal: Band, acceptable: Band) -> f32 {
    if ideal.contains(value) {
        return 100.0;
    }
    if value >= acceptable.min && value < ideal.min {
        let span = ideal.min - acceptable.min;
        if span <= 0.0 {
            return 90.0;
        }
        return 90.0 - 30.0 * (ideal.min - value) / span;
    }
    if value > ideal.max && value <= acceptable.max {
        let span = acceptable.max - ideal.max;
        if span <= 0.0 {
            return 90.0;
        }
        return 90.0 - 30.0 * (value - ideal.max) / span;
    }
    if value < acceptable.min {
        return (60.0 - 2.0 * (acceptable.min - value)).max(0.0);
    }
    (60.0 - 2.0 * (value - acceptable.max)).max(0.0)
}

/// Rounds a raw weighted-sum composite score to an integer in `[0, 100]`,
/// half-away-from-zero (matching the source's `Math.round`, since composite
/// scores are never negative this coincides with half-to-positive-infinity).
#[must_use]
pub fn round_composite(raw: f32) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

/// Weighted sum of `(weight, item_score)` pairs, rounded to `[0, 100]`.
/// Weights are expected to sum to `1.0`; this function does not itself
/// enforce that (each exercise module documents and tests its own weights).
#[must_use]
pub fn composite_score(weighted_items: &[(f32, f32)]) -> u8 {
    let raw = weighted_items.iter().map(|(w, s)| w * s).sum::<f32>();
    round_composite(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDEAL: Band = Band::new(80.0, 100.0);
    const ACCEPTABLE: Band = Band::new(70.0, 110.0);

    #[test]
    fn ideal_scores_100() {
        assert_eq!(item_score(90.0, IDEAL, ACCEPTABLE), 100.0);
        assert_eq!(item_score(80.0, IDEAL, ACCEPTABLE), 100.0);
        assert_eq!(item_score(100.0, IDEAL, ACCEPTABLE), 100.0);
    }

    #[test]
    fn below_ideal_within_acceptable_is_linear() {
        // midpoint of [70, 80) -> 90 - 30*0.5 = 75
        assert!((item_score(75.0, IDEAL, ACCEPTABLE) - 75.0).abs() < 1e-4);
    }

    #[test]
    fn below_acceptable_degrades_further() {
        let score = item_score(60.0, IDEAL, ACCEPTABLE);
        assert!(score < 60.0);
        assert!(score >= 0.0);
    }

    #[test]
    fn far_outside_acceptable_floors_at_zero() {
        assert_eq!(item_score(-1000.0, IDEAL, ACCEPTABLE), 0.0);
    }

    #[test]
    fn classify_level_matches_bands() {
        assert_eq!(classify_level(90.0, IDEAL, ACCEPTABLE), Level::Good);
        assert_eq!(classify_level(75.0, IDEAL, ACCEPTABLE), Level::Warning);
        assert_eq!(classify_level(10.0, IDEAL, ACCEPTABLE), Level::Error);
    }

    #[test]
    fn classify_level_is_monotone_toward_center() {
        let center = (IDEAL.min + IDEAL.max) / 2.0;
        let levels: Vec<Level> = [40.0, 65.0, 75.0, 85.0]
            .iter()
            .map(|&v| classify_level(v, IDEAL, ACCEPTABLE))
            .collect();
        // each step moves v closer to `center`; rank should never decrease.
        let rank = |l: &Level| match l {
            Level::Error => 0,
            Level::Warning => 1,
            Level::Good => 2,
        };
        for pair in levels.windows(2) {
            assert!(rank(&pair[1]) >= rank(&pair[0]));
        }
        let _ = center;
    }

    #[test]
    fn composite_rounds_half_up() {
        assert_eq!(composite_score(&[(1.0, 99.5)]), 100);
        assert_eq!(composite_score(&[(0.5, 100.0), (0.5, 0.0)]), 50);
    }

    #[test]
    fn composite_clamped_to_0_100() {
        assert_eq!(round_composite(150.0), 100);
        assert_eq!(round_composite(-10.0), 0);
    }
}
