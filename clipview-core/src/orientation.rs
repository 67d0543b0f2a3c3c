//! Orientation snapping for manipulated frames
//!
//! Clipping planes can be snapped either to one of the three canonical world
//! planes or to the nearest member of a lattice of reference directions built
//! from the principal axes and their 45° interpositions.

use nalgebra::{Matrix3, Quaternion, Rotation3, UnitQuaternion, Vector3};
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

use crate::pose::Real;

/// Scores closer than this are treated as ties and keep the earlier candidate
const TIE_EPSILON: Real = 1e-12;

/// Principal world axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Unit vector along the axis
    pub fn unit(self) -> Vector3<Real> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }

    /// Parse the axis keys `x`, `y`, `z` (either case)
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'x' => Some(Axis::X),
            'y' => Some(Axis::Y),
            'z' => Some(Axis::Z),
            _ => None,
        }
    }
}

/// Orientation whose local +Z points along the given world axis, i.e. the
/// plane spanned by the two other axes.
pub fn axis_aligned(axis: Axis) -> UnitQuaternion<Real> {
    match axis {
        Axis::X => UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2),
        Axis::Y => UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2),
        Axis::Z => UnitQuaternion::identity(),
    }
}

/// Half-turn about the local X axis.
///
/// The quaternion components are exactly (0, 1, 0, 0), so applying it twice
/// only flips the sign of every component and reproduces the same rotation
/// without rounding drift.
pub fn reversal() -> UnitQuaternion<Real> {
    UnitQuaternion::new_unchecked(Quaternion::new(0.0, 1.0, 0.0, 0.0))
}

/// Reference directions: the six axis directions first, then the twelve
/// face diagonals at 45° between pairs of axes.
pub fn reference_directions() -> Vec<Vector3<Real>> {
    let mut directions = Vec::with_capacity(18);
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        directions.push(axis.unit());
        directions.push(-axis.unit());
    }
    let axes = [Vector3::x(), Vector3::y(), Vector3::z()];
    for i in 0..3 {
        for j in (i + 1)..3 {
            for (si, sj) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
                directions.push((axes[i] * si + axes[j] * sj) * FRAC_1_SQRT_2);
            }
        }
    }
    directions
}

/// Candidate with the largest dot product against `target`. Ties go to the
/// earliest candidate, so axis directions win over diagonals.
fn nearest<F>(candidates: &[Vector3<Real>], target: &Vector3<Real>, accept: F) -> Option<Vector3<Real>>
where
    F: Fn(&Vector3<Real>) -> bool,
{
    let mut best: Option<(Real, Vector3<Real>)> = None;
    for candidate in candidates.iter().filter(|c| accept(*c)) {
        let score = candidate.dot(target);
        match best {
            Some((best_score, _)) if score <= best_score + TIE_EPSILON => {}
            _ => best = Some((score, *candidate)),
        }
    }
    best.map(|(_, direction)| direction)
}

/// Quantize an orientation to the reference lattice.
///
/// The normal (local +Z) snaps to the nearest reference direction; the local
/// X axis then snaps to the nearest reference direction perpendicular to the
/// new normal, which for an axis-aligned normal is one of eight in-plane
/// directions 45° apart.
pub fn snap_to_lattice(orientation: &UnitQuaternion<Real>) -> UnitQuaternion<Real> {
    let directions = reference_directions();
    let normal = orientation * Vector3::z();
    let x_axis = orientation * Vector3::x();

    let Some(snapped_normal) = nearest(&directions, &normal, |_| true) else {
        return *orientation;
    };
    let Some(snapped_x) = nearest(&directions, &x_axis, |d| d.dot(&snapped_normal).abs() < 1e-9) else {
        return *orientation;
    };
    let snapped_y = snapped_normal.cross(&snapped_x);

    let basis = Matrix3::from_columns(&[snapped_x, snapped_y, snapped_normal]);
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_axis_aligned_normals() {
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let normal = axis_aligned(axis) * Vector3::z();
            assert_relative_eq!(normal, axis.unit(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_reversal_flips_normal() {
        let q = UnitQuaternion::from_euler_angles(0.3, 0.1, -0.8);
        let reversed = q * reversal();
        assert_relative_eq!(reversed * Vector3::z(), -(q * Vector3::z()), epsilon = 1e-12);
        assert_relative_eq!(reversed * Vector3::x(), q * Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_reference_directions_are_unit() {
        let directions = reference_directions();
        assert_eq!(directions.len(), 18);
        for d in &directions {
            assert_relative_eq!(d.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_snap_ten_degrees_off_x_plane() {
        // Normal along +X, then tilted 10 degrees towards -Z.
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 100f64.to_radians());
        let snapped = snap_to_lattice(&q);
        assert_relative_eq!(snapped * Vector3::z(), Vector3::x(), epsilon = 1e-9);
    }

    #[test]
    fn test_snap_to_diagonal() {
        // 40 degrees from Z towards X is closer to the 45 degree diagonal.
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 40f64.to_radians());
        let snapped = snap_to_lattice(&q);
        let expected = Vector3::new(1.0, 0.0, 1.0).normalize();
        assert_relative_eq!(snapped * Vector3::z(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_tie_prefers_axis() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 22.5f64.to_radians());
        let snapped = snap_to_lattice(&q);
        assert_relative_eq!(snapped * Vector3::z(), Vector3::z(), epsilon = 1e-9);
    }

    #[test]
    fn test_snap_quantizes_in_plane_axis() {
        // Normal along Z, in-plane rotation of 50 degrees snaps to 45.
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 50f64.to_radians());
        let snapped = snap_to_lattice(&q);
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 45f64.to_radians());
        assert!(snapped.angle_to(&expected) < 1e-9);
    }

    #[test]
    fn test_axis_from_char() {
        assert_eq!(Axis::from_char('X'), Some(Axis::X));
        assert_eq!(Axis::from_char('y'), Some(Axis::Y));
        assert_eq!(Axis::from_char('q'), None);
    }
}
