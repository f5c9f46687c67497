//! # geometry
//!
//! The landmark-to-angle geometry kernel: the 3D vector math, the fixed
//! 33-point body topology, and the symmetry scoring used by every analyzer
//! built on top of this crate.
//!
//! Every function here is pure and total: degenerate inputs (coincident
//! points, zero-length segments, zero-width stances) return a documented
//! default instead of `NaN` or a panic. Nothing in this crate reads a clock,
//! touches a file, or holds state across calls.

pub mod landmark;
pub mod symmetry;
pub mod topology;
pub mod vector;

pub use landmark::{Landmark, LandmarkFrame, DEFAULT_MIN_SCORE};
pub use symmetry::symmetry_score;
pub use topology::{LandmarkIndex, NUM_LANDMARKS};
pub use vector::{
    angle3, angle_between, angle_between_segments, angle_with_horizontal, angle_with_vertical,
    calculate_torso_rotation, centroid, distance2, distance3, is_valid_keypoint, midpoint,
    point_to_line_distance, project_xy, project_xz, project_yz,
};
