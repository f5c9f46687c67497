//! Depth-based perspective correction.
//!
//! Derives a scalar "perspective factor" from the average z of the torso/leg
//! joints and uses it, weighted per angle type, to correct 2D-projection bias
//! in angles measured from a frame whose subject is closer to or farther
//! from the camera than the baseline.

use std::collections::VecDeque;

use geometry::{Landmark, LandmarkFrame, LandmarkIndex};

use crate::error::{ConfigError, Result};

/// The six torso/leg joints whose average z anchors the perspective
/// estimate.
const KEY_JOINTS: [LandmarkIndex; 6] = [
    LandmarkIndex::LeftShoulder,
    LandmarkIndex::RightShoulder,
    LandmarkIndex::LeftHip,
    LandmarkIndex::RightHip,
    LandmarkIndex::LeftKnee,
    LandmarkIndex::RightKnee,
];

/// Minimum number of valid key joints required to compute a non-zero depth
/// confidence.
const MIN_VALID_KEY_JOINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthConfig {
    pub min_confidence_threshold: f32,
    pub min_correction_factor: f32,
    pub max_correction_factor: f32,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            min_confidence_threshold: 0.5,
            min_correction_factor: 0.8,
            max_correction_factor: 1.2,
        }
    }
}

impl DepthConfig {
    pub fn new(
        min_confidence_threshold: f32,
        min_correction_factor: f32,
        max_correction_factor: f32,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&min_confidence_threshold) {
            return Err(ConfigError::InvalidConfidenceThreshold(
                min_confidence_threshold,
            ));
        }
        if min_correction_factor > max_correction_factor {
            return Err(ConfigError::InvalidCorrectionBounds {
                min: min_correction_factor,
                max: max_correction_factor,
            });
        }
        Ok(Self {
            min_confidence_threshold,
            min_correction_factor,
            max_correction_factor,
        })
    }
}

/// `2d` when depth could not be trusted for this frame, `3d` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackMode {
    ThreeD,
    TwoD,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthConfidence {
    pub score: f32,
    pub is_reliable: bool,
    pub fallback_mode: FallbackMode,
    pub variance: f32,
    pub average_keypoint_score: f32,
}

/// Computes the depth confidence of a frame from the z-spread and detector
/// confidence of the torso/leg joints.
#[must_use]
pub fn calculate_depth_confidence(frame: &LandmarkFrame, config: &DepthConfig) -> DepthConfidence {
    let joints: Vec<Landmark> = KEY_JOINTS.iter().map(|&i| frame.get(i.idx())).collect();
    let valid: Vec<Landmark> = joints
        .iter()
        .copied()
        .filter(|l| l.is_valid(geometry::DEFAULT_MIN_SCORE))
        .collect();

    if valid.len() < MIN_VALID_KEY_JOINTS {
        return DepthConfidence {
            score: 0.0,
            is_reliable: false,
            fallback_mode: FallbackMode::TwoD,
            variance: 0.0,
            average_keypoint_score: 0.0,
        };
    }

    let average_keypoint_score =
        valid.iter().map(|l| l.score).sum::<f32>() / valid.len() as f32;

    let mean_z = valid.iter().map(|l| l.z).sum::<f32>() / valid.len() as f32;
    let variance = valid
        .iter()
        .map(|l| (l.z - mean_z).powi(2))
        .sum::<f32>()
        / valid.len() as f32;

    let score = average_keypoint_score * (1.0 - (variance / 0.05).min(1.0));

    // All key joints sitting exactly at z=0 means the detector gave us no
    // usable depth signal at all (rather than a genuinely flat pose), so
    // this never counts as reliable even though its variance-derived score
    // would otherwise be high.
    let all_zero_z = valid.iter().all(|l| l.z == 0.0);
    let is_reliable = !all_zero_z && score >= config.min_confidence_threshold;

    DepthConfidence {
        score,
        is_reliable,
        fallback_mode: if is_reliable {
            FallbackMode::ThreeD
        } else {
            FallbackMode::TwoD
        },
        variance,
        average_keypoint_score,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveFactor {
    pub factor: f32,
    pub baseline_depth: f32,
    pub average_depth: f32,
    pub depth_confidence: DepthConfidence,
}

/// Computes the scalar perspective correction factor for a frame relative to
/// `baseline_depth`.
///
/// When depth is unreliable the factor is exactly `1.0` (no correction).
/// Otherwise `raw_factor = baseline_depth / average_depth`, clamped into
/// `[min_correction_factor, max_correction_factor]`.
#[must_use]
pub fn calculate_perspective_factor(
    frame: &LandmarkFrame,
    baseline_depth: f32,
    config: &DepthConfig,
) -> PerspectiveFactor {
    let depth_confidence = calculate_depth_confidence(frame, config);

    let average_depth = KEY_JOINTS
        .iter()
        .map(|&i| frame.get(i.idx()).z)
        .sum::<f32>()
        / KEY_JOINTS.len() as f32;

    let factor = if !depth_confidence.is_reliable || average_depth == 0.0 {
        1.0
    } else {
        let raw_factor = baseline_depth / average_depth;
        raw_factor.clamp(config.min_correction_factor, config.max_correction_factor)
    };

    PerspectiveFactor {
        factor,
        baseline_depth,
        average_depth,
        depth_confidence,
    }
}

/// Angle categories with distinct sensitivity to perspective distortion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleType {
    KneeFlexion,
    HipFlexion,
    TorsoInclination,
    AnkleAngle,
}

impl AngleType {
    const fn weight(self) -> f32 {
        match self {
            Self::KneeFlexion => 0.85,
            Self::HipFlexion => 0.80,
            Self::TorsoInclination => 0.60,
            Self::AnkleAngle => 0.70,
        }
    }
}

/// Applies the perspective `factor` to `raw_angle`, weighted by `angle_type`'s
/// sensitivity. `factor == 1.0` is always a no-op.
#[must_use]
pub fn apply_perspective_correction(raw_angle: f32, factor: f32, angle_type: AngleType) -> f32 {
    raw_angle * (1.0 + (factor - 1.0) * angle_type.weight())
}

/// EMA smoother for a single z-channel, used to stabilize the average-depth
/// estimate across frames.
#[derive(Debug, Clone, Copy)]
pub struct DepthSmoother {
    alpha: f32,
    prev: Option<f32>,
}

impl DepthSmoother {
    #[must_use]
    pub fn new(alpha: f32) -> Self {
        Self { alpha, prev: None }
    }

    pub fn smooth(&mut self, raw: f32) -> f32 {
        let value = match self.prev {
            None => raw,
            Some(prev) => self.alpha * raw + (1.0 - self.alpha) * prev,
        };
        self.prev = Some(value);
        value
    }
}

/// State carried across calls for T-pose calibration.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalibrationState {
    pub baseline_depth: Option<f32>,
}

const T_POSE_ARM_TOLERANCE_DEG: f32 = 20.0;
const T_POSE_SPINE_TOLERANCE_DEG: f32 = 15.0;

/// Whether `frame` shows a T-pose: both arms within 20 degrees of
/// horizontal, the shoulder-to-ankle axis within 15 degrees of vertical, and
/// every joint involved passing the score threshold.
#[must_use]
pub fn is_t_pose(frame: &LandmarkFrame) -> bool {
    use geometry::{angle_with_horizontal, angle_with_vertical, DEFAULT_MIN_SCORE};

    let required = [
        LandmarkIndex::LeftShoulder,
        LandmarkIndex::RightShoulder,
        LandmarkIndex::LeftWrist,
        LandmarkIndex::RightWrist,
        LandmarkIndex::LeftAnkle,
        LandmarkIndex::RightAnkle,
        LandmarkIndex::LeftHip,
        LandmarkIndex::RightHip,
    ];
    if !frame.all_valid(
        &required.iter().map(|i| i.idx()).collect::<Vec<_>>(),
        DEFAULT_MIN_SCORE,
    ) {
        return false;
    }

    let l_shoulder = frame.get(LandmarkIndex::LeftShoulder.idx()).point();
    let r_shoulder = frame.get(LandmarkIndex::RightShoulder.idx()).point();
    let l_wrist = frame.get(LandmarkIndex::LeftWrist.idx()).point();
    let r_wrist = frame.get(LandmarkIndex::RightWrist.idx()).point();
    let l_ankle = frame.get(LandmarkIndex::LeftAnkle.idx()).point();
    let r_ankle = frame.get(LandmarkIndex::RightAnkle.idx()).point();
    let l_hip = frame.get(LandmarkIndex::LeftHip.idx()).point();
    let r_hip = frame.get(LandmarkIndex::RightHip.idx()).point();

    let left_arm_horizontal = (angle_with_horizontal(l_shoulder, l_wrist)).abs();
    let right_arm_horizontal = (angle_with_horizontal(r_shoulder, r_wrist)).abs();
    let arms_level = left_arm_horizontal <= T_POSE_ARM_TOLERANCE_DEG
        && right_arm_horizontal <= T_POSE_ARM_TOLERANCE_DEG;

    let shoulder_mid = geometry::midpoint(l_shoulder, r_shoulder);
    let ankle_mid = geometry::midpoint(l_ankle, r_ankle);
    let spine_vertical = angle_with_vertical(shoulder_mid, ankle_mid);
    let spine_upright = spine_vertical <= T_POSE_SPINE_TOLERANCE_DEG
        || (180.0 - spine_vertical) <= T_POSE_SPINE_TOLERANCE_DEG;

    let _ = (l_hip, r_hip);
    arms_level && spine_upright
}

/// Records the current average z of the key joints as the new baseline
/// depth, if `frame` is a valid T-pose.
pub fn perform_calibration(frame: &LandmarkFrame, state: &mut CalibrationState) -> bool {
    if !is_t_pose(frame) {
        return false;
    }
    let average_z =
        KEY_JOINTS.iter().map(|&i| frame.get(i.idx()).z).sum::<f32>() / KEY_JOINTS.len() as f32;
    state.baseline_depth = Some(average_z);
    true
}

/// Bounded ring buffer of recent z samples, usable for ad-hoc depth history
/// beyond the single-channel [`DepthSmoother`].
#[derive(Debug, Clone)]
pub struct DepthHistory {
    capacity: usize,
    samples: VecDeque<f32>,
}

impl DepthHistory {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, z: f32) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(z);
    }

    #[must_use]
    pub fn average(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f32>() / self.samples.len() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::Landmark;

    fn frame_with_key_joints(z: f32, score: f32) -> LandmarkFrame {
        let mut points = [Landmark::invalid(); geometry::NUM_LANDMARKS];
        for idx in KEY_JOINTS {
            points[idx.idx()] = Landmark::new(0.5, 0.5, z, score);
        }
        LandmarkFrame::new(points)
    }

    #[test]
    fn too_few_valid_joints_gives_zero_confidence() {
        let mut points = [Landmark::invalid(); geometry::NUM_LANDMARKS];
        points[LandmarkIndex::LeftShoulder.idx()] = Landmark::new(0.5, 0.5, 0.0, 0.9);
        let frame = LandmarkFrame::new(points);
        let conf = calculate_depth_confidence(&frame, &DepthConfig::default());
        assert_eq!(conf.score, 0.0);
        assert!(!conf.is_reliable);
    }

    #[test]
    fn zero_variance_all_z_gives_reliable_high_score() {
        let frame = frame_with_key_joints(0.1, 0.9);
        let conf = calculate_depth_confidence(&frame, &DepthConfig::default());
        assert!(conf.is_reliable);
        assert!((conf.score - 0.9).abs() < 1e-4);
    }

    #[test]
    fn perspective_factor_is_one_when_unreliable() {
        let mut points = [Landmark::invalid(); geometry::NUM_LANDMARKS];
        for (i, idx) in KEY_JOINTS.iter().enumerate() {
            // spread the z values wildly to blow out variance
            let z = if i % 2 == 0 { -1.0 } else { 1.0 };
            points[idx.idx()] = Landmark::new(0.5, 0.5, z, 0.9);
        }
        let frame = LandmarkFrame::new(points);
        let result = calculate_perspective_factor(&frame, 0.0, &DepthConfig::default());
        assert!(!result.depth_confidence.is_reliable);
        assert_eq!(result.factor, 1.0);
    }

    #[test]
    fn perspective_factor_is_clamped() {
        let frame = frame_with_key_joints(0.01, 0.95);
        let config = DepthConfig::default();
        let result = calculate_perspective_factor(&frame, 10.0, &config);
        assert!(result.factor >= config.min_correction_factor);
        assert!(result.factor <= config.max_correction_factor);
    }

    #[test]
    fn correction_is_identity_at_factor_one() {
        for angle_type in [
            AngleType::KneeFlexion,
            AngleType::HipFlexion,
            AngleType::TorsoInclination,
            AngleType::AnkleAngle,
        ] {
            assert_eq!(apply_perspective_correction(90.0, 1.0, angle_type), 90.0);
        }
    }

    #[test]
    fn all_zero_z_is_unreliable_depth() {
        let frame = frame_with_key_joints(0.0, 0.9);
        let conf = calculate_depth_confidence(&frame, &DepthConfig::default());
        assert!(!conf.is_reliable);
    }

    #[test]
    fn all_zero_z_forces_identity_perspective_factor() {
        let frame = frame_with_key_joints(0.0, 0.9);
        let result = calculate_perspective_factor(&frame, 10.0, &DepthConfig::default());
        assert!(!result.depth_confidence.is_reliable);
        assert_eq!(result.factor, 1.0);
    }

    #[test]
    fn t_pose_requires_level_arms_and_upright_spine() {
        let mut points = [Landmark::invalid(); geometry::NUM_LANDMARKS];
        points[LandmarkIndex::LeftShoulder.idx()] = Landmark::new(0.3, 0.3, 0.0, 0.9);
        points[LandmarkIndex::RightShoulder.idx()] = Landmark::new(0.7, 0.3, 0.0, 0.9);
        points[LandmarkIndex::LeftWrist.idx()] = Landmark::new(0.0, 0.3, 0.0, 0.9);
        points[LandmarkIndex::RightWrist.idx()] = Landmark::new(1.0, 0.3, 0.0, 0.9);
        points[LandmarkIndex::LeftHip.idx()] = Landmark::new(0.4, 0.6, 0.0, 0.9);
        points[LandmarkIndex::RightHip.idx()] = Landmark::new(0.6, 0.6, 0.0, 0.9);
        points[LandmarkIndex::LeftAnkle.idx()] = Landmark::new(0.4, 0.95, 0.0, 0.9);
        points[LandmarkIndex::RightAnkle.idx()] = Landmark::new(0.6, 0.95, 0.0, 0.9);
        let frame = LandmarkFrame::new(points);
        assert!(is_t_pose(&frame));
    }
}
