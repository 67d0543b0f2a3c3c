//! Rigid pose utilities

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Scalar type used for every pose, camera and plane quantity
pub type Real = f64;

/// A rigid pose: position plus orientation.
///
/// The local +Z axis of the orientation is the pose's "normal"; for a clipping
/// plane this is the side that gets clipped away.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point3<Real>,
    pub orientation: UnitQuaternion<Real>,
}

impl Pose {
    /// Create a pose from its parts
    pub fn new(position: Point3<Real>, orientation: UnitQuaternion<Real>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// The identity pose (origin, no rotation)
    pub fn identity() -> Self {
        Self::new(Point3::origin(), UnitQuaternion::identity())
    }

    /// A pose at `position` with identity orientation
    pub fn from_position(position: Point3<Real>) -> Self {
        Self::new(position, UnitQuaternion::identity())
    }

    /// Convert to an isometry
    pub fn to_isometry(&self) -> Isometry3<Real> {
        Isometry3::from_parts(Translation3::from(self.position.coords), self.orientation)
    }

    /// World-space direction of the local +Z axis
    pub fn normal(&self) -> Vector3<Real> {
        self.orientation * Vector3::z()
    }

    /// Apply the pose to a point given in local coordinates
    pub fn transform_point(&self, point: &Point3<Real>) -> Point3<Real> {
        self.position + self.orientation * point.coords
    }

    /// Compose with an incremental transform expressed in this pose's local
    /// frame (`self * delta`).
    pub fn compose(&self, delta: &Isometry3<Real>) -> Self {
        Self::from(self.to_isometry() * delta)
    }

    /// Express a local incremental transform in world coordinates
    /// (`self * delta * self⁻¹`).
    pub fn world_delta(&self, delta: &Isometry3<Real>) -> Isometry3<Real> {
        let iso = self.to_isometry();
        iso * delta * iso.inverse()
    }

    /// The local incremental transform that takes `self` to `target`
    pub fn delta_to(&self, target: &Pose) -> Isometry3<Real> {
        self.to_isometry().inverse() * target.to_isometry()
    }

    /// Same pose with a different orientation
    pub fn with_orientation(&self, orientation: UnitQuaternion<Real>) -> Self {
        Self::new(self.position, orientation)
    }

    /// Approximate comparison; orientations are compared as rotations
    pub fn approx_eq(&self, other: &Pose, epsilon: Real) -> bool {
        (self.position - other.position).norm() <= epsilon
            && self.orientation.angle_to(&other.orientation) <= epsilon
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Positions compare exactly; a quaternion and its negation describe the same
/// rotation and therefore the same pose.
impl PartialEq for Pose {
    fn eq(&self, other: &Self) -> bool {
        let a = self.orientation.coords;
        let b = other.orientation.coords;
        self.position == other.position && (a == b || a == -b)
    }
}

impl std::ops::Mul<Isometry3<Real>> for Pose {
    type Output = Pose;

    fn mul(self, rhs: Isometry3<Real>) -> Self::Output {
        self.compose(&rhs)
    }
}

impl From<Isometry3<Real>> for Pose {
    fn from(isometry: Isometry3<Real>) -> Self {
        Self::new(Point3::from(isometry.translation.vector), isometry.rotation)
    }
}

impl From<Pose> for Isometry3<Real> {
    fn from(pose: Pose) -> Self {
        pose.to_isometry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_normal_of_identity_is_z() {
        let pose = Pose::identity();
        assert_eq!(pose.normal(), Vector3::z());
    }

    #[test]
    fn test_compose_translation_is_local() {
        // Rotated 90 degrees about Y: local +Z points along world +X.
        let pose = Pose::new(
            Point3::new(1.0, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2),
        );
        let moved = pose.compose(&Isometry3::translation(0.0, 0.0, 2.0));
        assert_relative_eq!(moved.position, Point3::new(3.0, 0.0, 0.0), epsilon = 1e-12);
        assert_eq!(moved.orientation, pose.orientation);
    }

    #[test]
    fn test_world_delta_matches_compose() {
        let pose = Pose::new(
            Point3::new(0.5, -1.0, 2.0),
            UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1),
        );
        let delta = Isometry3::new(Vector3::new(0.1, 0.2, 0.3), Vector3::new(0.0, 0.4, 0.0));
        let via_local = pose.compose(&delta);
        let via_world = Pose::from(pose.world_delta(&delta) * pose.to_isometry());
        assert!(via_local.approx_eq(&via_world, 1e-12));
    }

    #[test]
    fn test_delta_to_round_trip() {
        let a = Pose::new(Point3::new(1.0, 2.0, 3.0), UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3));
        let b = Pose::new(Point3::new(-1.0, 0.0, 4.0), UnitQuaternion::from_euler_angles(-0.5, 0.0, 0.7));
        let delta = a.delta_to(&b);
        assert!(a.compose(&delta).approx_eq(&b, 1e-12));
    }

    #[test]
    fn test_equality_ignores_quaternion_sign() {
        let q = UnitQuaternion::from_euler_angles(0.2, 0.4, 0.6);
        let negated = UnitQuaternion::new_unchecked(-q.into_inner());
        let a = Pose::new(Point3::new(1.0, 1.0, 1.0), q);
        let b = Pose::new(Point3::new(1.0, 1.0, 1.0), negated);
        assert_eq!(a, b);
        assert_ne!(a, Pose::identity());
    }
}
