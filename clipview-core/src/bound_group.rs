//! Bound group of clipping planes
//!
//! Planes in the bound group keep their mutual positions and orientations
//! when any one of them is manipulated: every incremental transform applied to
//! the manipulated member is replayed on the others as a rigid motion of the
//! whole formation.

use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::clip_plane::{ClipPlaneRegistry, NUM_CLIP_PLANES};
use crate::pose::{Pose, Real};

/// Set of plane indices bound together
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundGroup {
    members: BTreeSet<usize>,
}

impl BoundGroup {
    /// Create an empty group
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

    /// Create a group from a list of members
    pub fn from_members<I: IntoIterator<Item = usize>>(members: I) -> Self {
        let mut group = Self::new();
        for index in members {
            Self::check(index);
            group.members.insert(index);
        }
        group
    }

    /// Add or remove a plane, returning whether it is now a member
    pub fn toggle(&mut self, index: usize) -> bool {
        Self::check(index);
        if self.members.remove(&index) {
            false
        } else {
            self.members.insert(index);
            true
        }
    }

    /// Set membership explicitly
    pub fn set_member(&mut self, index: usize, member: bool) {
        Self::check(index);
        if member {
            self.members.insert(index);
        } else {
            self.members.remove(&index);
        }
    }

    /// Whether a plane is in the group
    pub fn contains(&self, index: usize) -> bool {
        Self::check(index);
        self.members.contains(&index)
    }

    /// Members in ascending order
    pub fn members(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// One-based member list as shown to the user, e.g. `" 1 3"`
    pub fn label(&self) -> String {
        self.members.iter().map(|i| format!(" {}", i + 1)).collect()
    }

    /// Replay a local incremental transform of `source` on every other member.
    ///
    /// `delta` is the transform composed onto the source pose (`P * delta`).
    /// It is converted to the world motion `P * delta * P⁻¹`, which is the
    /// same whether `P` is taken before or after the source moved, and applied
    /// on the left of each other member's pose. Nothing happens when `source`
    /// is not a member. Returns the number of planes moved.
    pub fn propagate(&self, registry: &mut ClipPlaneRegistry, source: usize, delta: &Isometry3<Real>) -> usize {
        if !self.contains(source) {
            return 0;
        }
        let world = registry.pose(source).world_delta(delta);
        let mut moved = 0;
        for index in self.members().filter(|&i| i != source) {
            let pose = registry.pose(index);
            registry.set_pose(index, Pose::from(world * pose.to_isometry()));
            moved += 1;
        }
        if moved > 0 {
            log::trace!("propagated motion of plane {} to {} bound planes", source + 1, moved);
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Translation3, UnitQuaternion, Vector3};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_toggle_membership() {
        let mut group = BoundGroup::new();
        assert!(group.toggle(0));
        assert!(group.toggle(2));
        assert_eq!(group.label(), " 1 3");
        assert!(!group.toggle(0));
        assert!(!group.contains(0));
        assert!(group.contains(2));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_translation_moves_members_by_same_vector() {
        let mut registry = ClipPlaneRegistry::new();
        registry.set_pose(1, Pose::new(
            Point3::new(2.0, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.3),
        ));
        let group = BoundGroup::from_members([0, 1]);

        let delta = Isometry3::translation(0.0, 0.0, 0.5);
        let before = registry.pose(1);
        registry.apply_delta(0, &delta);
        assert_eq!(group.propagate(&mut registry, 0, &delta), 1);

        let moved = registry.pose(1).position - before.position;
        assert_relative_eq!(moved, Vector3::new(0.0, 0.0, 0.5), epsilon = 1e-12);
        assert_eq!(registry.pose(1).orientation, before.orientation);
    }

    #[test]
    fn test_rotation_preserves_relative_pose() {
        let mut registry = ClipPlaneRegistry::new();
        registry.set_pose(0, Pose::from_position(Point3::new(1.0, 0.0, 0.0)));
        registry.set_pose(2, Pose::from_position(Point3::new(1.0, 0.0, 3.0)));
        let group = BoundGroup::from_members([0, 2]);
        let relative_before = registry.pose(0).delta_to(&registry.pose(2));

        let delta = Isometry3::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2),
        );
        registry.apply_delta(0, &delta);
        group.propagate(&mut registry, 0, &delta);

        // The partner swung around plane 0 as a rigid formation.
        assert_relative_eq!(registry.pose(2).position, Point3::new(4.0, 0.0, 0.0), epsilon = 1e-12);
        let relative_after = registry.pose(0).delta_to(&registry.pose(2));
        assert!(Pose::from(relative_before).approx_eq(&Pose::from(relative_after), 1e-12));
    }

    #[test]
    fn test_non_member_source_does_not_propagate() {
        let mut registry = ClipPlaneRegistry::new();
        let group = BoundGroup::from_members([1, 2]);
        let delta = Isometry3::translation(1.0, 0.0, 0.0);
        registry.apply_delta(0, &delta);
        assert_eq!(group.propagate(&mut registry, 0, &delta), 0);
        assert_eq!(registry.pose(1), Pose::identity());
        assert_eq!(registry.pose(2), Pose::identity());
    }

    #[test]
    fn test_removed_member_is_left_alone() {
        let mut registry = ClipPlaneRegistry::new();
        let mut group = BoundGroup::from_members([0, 1]);
        group.toggle(1);
        let delta = Isometry3::translation(0.0, 0.0, 1.0);
        registry.apply_delta(0, &delta);
        group.propagate(&mut registry, 0, &delta);
        assert_eq!(registry.pose(1), Pose::identity());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_toggle_invalid_index_panics() {
        BoundGroup::new().toggle(NUM_CLIP_PLANES);
    }
}
