//! Pure 3D vector-math primitives shared by every analyzer.
//!
//! Every `acos` input is clamped to `[-1, 1]` and every division guards its
//! denominator; degenerate geometry (coincident points, zero-width segments)
//! returns a documented default rather than `NaN` or a panic.

use nalgebra::{Point3, Vector3};

/// Angle at `b`, in degrees, formed by the rays `b -> a` and `b -> c`.
///
/// Returns `0` when either ray has zero length (the degenerate case where `b`
/// coincides with `a` or `c`).
#[must_use]
pub fn angle3(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> f32 {
    let u = a - b;
    let v = c - b;
    angle_between(u, v)
}

/// Angle between two free vectors, in degrees, in `[0, 180]`.
///
/// Returns `0` when either vector has zero magnitude.
#[must_use]
pub fn angle_between(u: Vector3<f32>, v: Vector3<f32>) -> f32 {
    let (norm_u, norm_v) = (u.norm(), v.norm());
    if norm_u == 0.0 || norm_v == 0.0 {
        return 0.0;
    }
    let cos_theta = (u.dot(&v) / (norm_u * norm_v)).clamp(-1.0, 1.0);
    cos_theta.acos().to_degrees()
}

/// Angle in degrees between the vector `from -> to` and the "up" direction
/// (the negative-y axis, since image `y` grows downward).
///
/// A point directly above `from` returns `0`; a horizontal displacement
/// returns `90`; a point directly below returns `180`. Returns `0` when
/// `from == to`.
#[must_use]
pub fn angle_with_vertical(from: Point3<f32>, to: Point3<f32>) -> f32 {
    let v = to - from;
    angle_between(v, Vector3::new(0.0, -1.0, 0.0))
}

/// Signed angle in degrees between `p1 -> p2` and the horizontal (xz) plane.
///
/// Positive when `p2` rises relative to `p1` (`y` decreases), negative when
/// it falls. Returns `0` when `p1 == p2`.
#[must_use]
pub fn angle_with_horizontal(p1: Point3<f32>, p2: Point3<f32>) -> f32 {
    let v = p2 - p1;
    let horizontal_len = (v.x * v.x + v.z * v.z).sqrt();
    if v.norm() == 0.0 {
        return 0.0;
    }
    // y decreasing (rising in image convention) -> positive angle.
    (-v.y).atan2(horizontal_len).to_degrees()
}

/// Euclidean distance between two points, including `z`.
#[must_use]
pub fn distance3(a: Point3<f32>, b: Point3<f32>) -> f32 {
    (a - b).norm()
}

/// Euclidean distance between two points, ignoring `z`.
#[must_use]
pub fn distance2(a: Point3<f32>, b: Point3<f32>) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Midpoint of two points.
#[must_use]
pub fn midpoint(a: Point3<f32>, b: Point3<f32>) -> Point3<f32> {
    Point3::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0, (a.z + b.z) / 2.0)
}

/// Centroid (arithmetic mean) of a set of points. Returns the origin for an
/// empty slice.
#[must_use]
pub fn centroid(points: &[Point3<f32>]) -> Point3<f32> {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f32)
}

/// Projection of `p` onto the xy plane (drop `z`).
#[must_use]
pub fn project_xy(p: Point3<f32>) -> Point3<f32> {
    Point3::new(p.x, p.y, 0.0)
}

/// Projection of `p` onto the xz plane (drop `y`).
#[must_use]
pub fn project_xz(p: Point3<f32>) -> Point3<f32> {
    Point3::new(p.x, 0.0, p.z)
}

/// Projection of `p` onto the yz plane (drop `x`).
#[must_use]
pub fn project_yz(p: Point3<f32>) -> Point3<f32> {
    Point3::new(0.0, p.y, p.z)
}

/// Acute-or-obtuse angle in degrees between two free segments, treated as
/// free vectors (`a2 - a1` and `b2 - b1`).
#[must_use]
pub fn angle_between_segments(
    a1: Point3<f32>,
    a2: Point3<f32>,
    b1: Point3<f32>,
    b2: Point3<f32>,
) -> f32 {
    angle_between(a2 - a1, b2 - b1)
}

/// 3D distance from `point` to the infinite line through `line_a`/`line_b`.
///
/// Degenerates to [`distance3`] between `point` and `line_a` when the line
/// collapses to a single point.
#[must_use]
pub fn point_to_line_distance(point: Point3<f32>, line_a: Point3<f32>, line_b: Point3<f32>) -> f32 {
    let line_vec = line_b - line_a;
    let len = line_vec.norm();
    if len == 0.0 {
        return distance3(point, line_a);
    }
    let to_point = point - line_a;
    to_point.cross(&line_vec).norm() / len
}

/// Angle in degrees between the XZ projections of the shoulder line
/// (`l_shoulder -> r_shoulder`) and the hip line (`l_hip -> r_hip`).
///
/// Returns `0` when either pair has zero width (a degenerate, perfectly
/// narrow stance or coincident shoulder/hip points).
#[must_use]
pub fn calculate_torso_rotation(
    l_shoulder: Point3<f32>,
    r_shoulder: Point3<f32>,
    l_hip: Point3<f32>,
    r_hip: Point3<f32>,
) -> f32 {
    let shoulder_line = project_xz(r_shoulder) - project_xz(l_shoulder);
    let hip_line = project_xz(r_hip) - project_xz(l_hip);
    angle_between(shoulder_line, hip_line)
}

/// Whether a keypoint's detector confidence clears `min_score`.
#[must_use]
pub fn is_valid_keypoint(score: f32, min_score: f32) -> bool {
    score >= min_score
}
