#![warn(missing_docs)]

//! Math types for the tessera assembly engine.
//!
//! Thin wrappers around nalgebra providing domain-specific types
//! for 2D puzzle geometry: points, vectors, rigid poses, angle
//! arithmetic in degrees, and tolerance constants.

use nalgebra::{Isometry2, Translation2, UnitComplex, Vector2};

/// A point in 2D world or local space.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// A rigid 2D transform (translation + rotation, no scale).
///
/// Pieces, attach points and frames all carry a `Pose2`. Composition
/// follows nalgebra: `parent * local` maps local coordinates into the
/// parent's space.
pub type Pose2 = Isometry2<f64>;

/// Build a pose from a position and a heading in degrees.
pub fn pose(x: f64, y: f64, degrees: f64) -> Pose2 {
    Isometry2::new(Vector2::new(x, y), degrees.to_radians())
}

/// The origin of `pose` as a point.
pub fn origin(pose: &Pose2) -> Point2 {
    Point2::from(pose.translation.vector)
}

/// The outward-facing ("up") unit direction of `pose`: its local +Y axis.
pub fn up(pose: &Pose2) -> Vec2 {
    pose.rotation * Vector2::y()
}

/// Heading of `pose` in degrees, in `(-180, 180]`.
pub fn heading_degrees(pose: &Pose2) -> f64 {
    pose.rotation.angle().to_degrees()
}

/// Same position as `pose`, rotated by `degrees` about its own origin.
pub fn rotated_in_place(pose: &Pose2, degrees: f64) -> Pose2 {
    Isometry2::from_parts(
        pose.translation,
        UnitComplex::new(degrees.to_radians()) * pose.rotation,
    )
}

/// `pose` moved by a world-space offset, orientation untouched.
pub fn translated(pose: &Pose2, delta: &Vec2) -> Pose2 {
    Isometry2::from_parts(Translation2::from(pose.translation.vector + delta), pose.rotation)
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle % 360.0;
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation from `current` to `target`, in `(-180, 180]` degrees.
pub fn angle_delta(target: f64, current: f64) -> f64 {
    let diff = normalize_degrees(target - current);
    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}

/// Nearest multiple of `step` to `angle` (degrees).
///
/// A non-positive `step` leaves the angle untouched.
pub fn nearest_multiple(angle: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return angle;
    }
    (angle / step).round() * step
}

/// Snap `angle` to the nearest multiple of `step` if it lies within
/// `tolerance` degrees of it.
///
/// Returns `None` when the angle is too far from every multiple.
pub fn snap_to_step(angle: f64, step: f64, tolerance: f64) -> Option<f64> {
    let target = nearest_multiple(angle, step);
    if (angle - target).abs() <= tolerance {
        Some(target)
    } else {
        None
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in world units.
    pub linear: f64,
    /// Angular tolerance in degrees.
    pub angular: f64,
}

impl Tolerance {
    /// Default tolerances (1e-9 world units, 1e-6 degrees).
    pub const DEFAULT: Self = Self {
        linear: 1e-9,
        angular: 1e-6,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point2, b: &Point2) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if two headings (degrees) are equal modulo a full turn.
    pub fn angles_equal(&self, a: f64, b: f64) -> bool {
        angle_delta(a, b).abs() < self.angular
    }

    /// Check if two poses have the same origin and heading.
    pub fn poses_equal(&self, a: &Pose2, b: &Pose2) -> bool {
        self.points_equal(&origin(a), &origin(b))
            && self.angles_equal(heading_degrees(a), heading_degrees(b))
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
