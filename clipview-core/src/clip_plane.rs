//! Clipping-plane registry
//!
//! A fixed set of clipping planes lives for as long as the viewer. Planes are
//! identified by their index; there is no dynamic creation or removal.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::orientation;
use crate::pose::{Pose, Real};

/// Number of clipping planes every viewer carries
pub const NUM_CLIP_PLANES: usize = 3;

/// A single clipping plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClipPlane {
    /// Plane origin and orientation; local +Z is the normal
    pub pose: Pose,
    /// Whether the plane clips rendering. Has no effect on manipulation.
    pub active: bool,
}

impl ClipPlane {
    /// World-space normal
    pub fn normal(&self) -> Vector3<Real> {
        self.pose.normal()
    }

    /// Plane equation `[a, b, c, d]` with `a*x + b*y + c*z + d = 0`
    pub fn equation(&self) -> [Real; 4] {
        let n = self.normal();
        [n.x, n.y, n.z, -n.dot(&self.pose.position.coords)]
    }
}

/// Fixed-size collection of clipping planes.
///
/// Every accessor asserts the index is in `0..NUM_CLIP_PLANES`; an invalid
/// index is a programming error and panics in all build profiles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClipPlaneRegistry {
    planes: [ClipPlane; NUM_CLIP_PLANES],
}

impl ClipPlaneRegistry {
    /// Create a registry with every plane at the identity pose and inactive
    pub fn new() -> Self {
        Self::default()
    }

    fn check(index: usize) {
        assert!(
            index < NUM_CLIP_PLANES,
            "clip plane index {} out of range 0..{}",
            index,
            NUM_CLIP_PLANES
        );
    }

    /// Number of planes
    pub fn len(&self) -> usize {
        NUM_CLIP_PLANES
    }

    /// Always false; kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Get a plane
    pub fn plane(&self, index: usize) -> &ClipPlane {
        Self::check(index);
        &self.planes[index]
    }

    /// Get a plane's pose
    pub fn pose(&self, index: usize) -> Pose {
        self.plane(index).pose
    }

    /// Whether a plane is active
    pub fn is_active(&self, index: usize) -> bool {
        self.plane(index).active
    }

    /// Replace a plane's pose
    pub fn set_pose(&mut self, index: usize, pose: Pose) {
        Self::check(index);
        self.planes[index].pose = pose;
    }

    /// Replace a plane's orientation, keeping its position
    pub fn set_orientation(&mut self, index: usize, orientation: UnitQuaternion<Real>) {
        Self::check(index);
        let plane = &mut self.planes[index];
        plane.pose = plane.pose.with_orientation(orientation);
    }

    /// Set a plane's active flag
    pub fn set_active(&mut self, index: usize, active: bool) {
        Self::check(index);
        self.planes[index].active = active;
    }

    /// Flip a plane's active flag, returning the new value
    pub fn toggle_active(&mut self, index: usize) -> bool {
        Self::check(index);
        let plane = &mut self.planes[index];
        plane.active = !plane.active;
        plane.active
    }

    /// Compose a plane's pose with a local incremental transform
    pub fn apply_delta(&mut self, index: usize, delta: &Isometry3<Real>) {
        Self::check(index);
        let plane = &mut self.planes[index];
        plane.pose = plane.pose.compose(delta);
    }

    /// Local transform that reverses a plane's normal in place
    pub fn reversal_delta() -> Isometry3<Real> {
        Isometry3::from_parts(Translation3::identity(), orientation::reversal())
    }

    /// Reverse a plane's normal without moving its origin.
    ///
    /// Implemented as a half-turn about the local X axis; applying it twice
    /// gives back the original pose.
    pub fn reverse_normal(&mut self, index: usize) {
        self.apply_delta(index, &Self::reversal_delta());
    }

    /// Iterate over planes in index order
    pub fn iter(&self) -> impl Iterator<Item = &ClipPlane> {
        self.planes.iter()
    }

    /// Plane equations of the active planes, in index order
    pub fn active_equations(&self) -> Vec<(usize, [Real; 4])> {
        self.planes
            .iter()
            .enumerate()
            .filter(|(_, plane)| plane.active)
            .map(|(index, plane)| (index, plane.equation()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_new_registry_defaults() {
        let registry = ClipPlaneRegistry::new();
        assert_eq!(registry.len(), NUM_CLIP_PLANES);
        for plane in registry.iter() {
            assert!(!plane.active);
            assert_eq!(plane.pose, Pose::identity());
        }
    }

    #[test]
    fn test_set_and_toggle_active() {
        let mut registry = ClipPlaneRegistry::new();
        registry.set_active(1, true);
        assert!(registry.is_active(1));
        assert!(!registry.toggle_active(1));
        assert!(!registry.is_active(1));
        assert!(!registry.is_active(0));
    }

    #[test]
    fn test_double_reversal_is_identity() {
        let mut registry = ClipPlaneRegistry::new();
        let pose = Pose::new(
            Point3::new(0.3, -2.0, 1.5),
            UnitQuaternion::from_euler_angles(0.7, -0.4, 2.1),
        );
        registry.set_pose(2, pose);
        for index in 0..NUM_CLIP_PLANES {
            let before = registry.pose(index);
            registry.reverse_normal(index);
            registry.reverse_normal(index);
            assert_eq!(registry.pose(index), before);
        }
    }

    #[test]
    fn test_reverse_keeps_position_and_flips_normal() {
        let mut registry = ClipPlaneRegistry::new();
        registry.set_pose(0, Pose::from_position(Point3::new(1.0, 2.0, 3.0)));
        registry.reverse_normal(0);
        assert_eq!(registry.pose(0).position, Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(registry.plane(0).normal(), -Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_equation() {
        let plane = ClipPlane {
            pose: Pose::from_position(Point3::new(0.0, 0.0, 2.0)),
            active: true,
        };
        assert_eq!(plane.equation(), [0.0, 0.0, 1.0, -2.0]);
    }

    #[test]
    fn test_active_equations_only_lists_active() {
        let mut registry = ClipPlaneRegistry::new();
        registry.set_active(2, true);
        let equations = registry.active_equations();
        assert_eq!(equations.len(), 1);
        assert_eq!(equations[0].0, 2);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_invalid_index_panics() {
        let registry = ClipPlaneRegistry::new();
        let _ = registry.plane(NUM_CLIP_PLANES);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_invalid_index_panics_on_mutation() {
        let mut registry = ClipPlaneRegistry::new();
        registry.set_active(7, true);
    }
}
