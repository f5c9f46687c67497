//! The landmark data model: a single detected body point and the fixed-size
//! frame of 33 points produced by the inference layer each sample.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use nalgebra::Point3;

use crate::topology::NUM_LANDMARKS;

/// Detector confidence below this is treated as "not reliably detected".
pub const DEFAULT_MIN_SCORE: f32 = 0.5;

/// A single normalized 3D body point with detector confidence.
///
/// `x`/`y` lie in `[0, 1]` in image coordinates, `y` growing downward. `z` is
/// a model-local depth roughly on the same scale, more negative meaning
/// closer to the camera. `score` is the detector's per-point confidence in
/// `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub score: f32,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, score: f32) -> Self {
        Self { x, y, z, score }
    }

    /// A landmark at the origin with zero confidence.
    #[must_use]
    pub const fn invalid() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// View this landmark as a 3D point for use in the geometry kernel.
    #[must_use]
    pub fn point(&self) -> Point3<f32> {
        Point3::new(self.x, self.y, self.z)
    }

    /// Whether this point's detector confidence clears `min_score`.
    #[must_use]
    pub fn is_valid(&self, min_score: f32) -> bool {
        self.score >= min_score
    }
}

impl Default for Landmark {
    fn default() -> Self {
        Self::invalid()
    }
}

/// A fixed-length ordered sequence of 33 landmarks, indexed by
/// [`crate::topology::LandmarkIndex`].
///
/// The length is a structural invariant of the body topology, not a runtime
/// condition: frames are always exactly 33 points, even when several of them
/// carry a below-threshold score.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LandmarkFrame {
    points: [Landmark; NUM_LANDMARKS],
}

impl LandmarkFrame {
    #[must_use]
    pub const fn new(points: [Landmark; NUM_LANDMARKS]) -> Self {
        Self { points }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Landmark {
        self.points[index]
    }

    #[must_use]
    pub fn points(&self) -> &[Landmark; NUM_LANDMARKS] {
        &self.points
    }

    /// Whether every landmark in `indices` clears `min_score`.
    #[must_use]
    pub fn all_valid(&self, indices: &[usize], min_score: f32) -> bool {
        indices
            .iter()
            .all(|&i| self.points[i].is_valid(min_score))
    }

    /// Number of landmarks in `indices` that clear `min_score`.
    #[must_use]
    pub fn valid_count(&self, indices: &[usize], min_score: f32) -> usize {
        indices
            .iter()
            .filter(|&&i| self.points[i].is_valid(min_score))
            .count()
    }
}

impl Default for LandmarkFrame {
    fn default() -> Self {
        Self::new([Landmark::invalid(); NUM_LANDMARKS])
    }
}
