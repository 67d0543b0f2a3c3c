//! Camera utilities for 3D visualization

use clipview_core::{Pose, Real};
use clipview_io::CameraState;
use nalgebra::{Matrix4, Perspective3, Point3, Unit, UnitQuaternion, Vector3};

/// Closest the camera may get to its target
const MIN_DISTANCE: Real = 1e-6;

/// A look-at camera orbiting a target point
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<Real>,
    pub target: Point3<Real>,
    pub up: Vector3<Real>,
    pub fov: Real,
    pub aspect_ratio: Real,
    pub near: Real,
    pub far: Real,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3<Real>,
        target: Point3<Real>,
        up: Vector3<Real>,
        fov: Real,
        aspect_ratio: Real,
        near: Real,
        far: Real,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<Real> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<Real> {
        let perspective = Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far);
        perspective.into_inner()
    }

    /// Unit viewing direction
    pub fn forward(&self) -> Vector3<Real> {
        (self.target - self.position).normalize()
    }

    /// Unit screen-right direction
    pub fn right(&self) -> Vector3<Real> {
        self.forward().cross(&self.up).normalize()
    }

    /// Unit screen-up direction, orthogonal to the viewing direction
    pub fn screen_up(&self) -> Vector3<Real> {
        self.right().cross(&self.forward())
    }

    /// Distance from the camera to its target
    pub fn distance(&self) -> Real {
        (self.target - self.position).norm()
    }

    /// Camera frame as a pose; local -Z looks at the target
    pub fn pose(&self) -> Pose {
        Pose::new(
            self.position,
            UnitQuaternion::face_towards(&(self.position - self.target), &self.up),
        )
    }

    /// Move the camera forward
    pub fn move_forward(&mut self, distance: Real) {
        let direction = self.forward();
        self.position += direction * distance;
        self.target += direction * distance;
    }

    /// Rotate the camera around the target
    pub fn orbit(&mut self, horizontal: Real, vertical: Real) {
        let offset = self.position - self.target;
        let yaw = UnitQuaternion::from_axis_angle(&Unit::new_normalize(self.up), -horizontal);
        let mut rotation = yaw;

        let right = self.forward().cross(&self.up);
        if right.norm() > 1e-12 {
            let pitch = UnitQuaternion::from_axis_angle(&Unit::new_normalize(right), -vertical);
            rotation = pitch * yaw;
        }

        self.position = self.target + rotation * offset;
        self.up = rotation * self.up;
    }

    /// Translate camera and target together in the screen plane
    pub fn pan(&mut self, dx: Real, dy: Real) {
        let shift = self.right() * -dx + self.screen_up() * dy;
        self.position += shift;
        self.target += shift;
    }

    /// Move towards the target by a fraction of the current distance;
    /// negative amounts move away.
    pub fn zoom(&mut self, amount: Real) {
        let direction = self.forward();
        let distance = (self.distance() * (1.0 - amount)).max(MIN_DISTANCE);
        self.position = self.target - direction * distance;
    }

    /// Restore the default view, keeping the aspect ratio
    pub fn reset(&mut self) {
        let aspect_ratio = self.aspect_ratio;
        *self = Self::default();
        self.aspect_ratio = aspect_ratio;
    }

    /// Snap the viewing direction and up vector to the nearest world axes,
    /// keeping the target and distance.
    pub fn align_with_world(&mut self) {
        let back = self.position - self.target;
        let distance = back.norm();
        let axes = [
            Vector3::x(),
            -Vector3::x(),
            Vector3::y(),
            -Vector3::y(),
            Vector3::z(),
            -Vector3::z(),
        ];
        let nearest = |v: &Vector3<Real>, exclude: Option<&Vector3<Real>>| {
            axes.iter()
                .filter(|a| exclude.map_or(true, |e| a.dot(e).abs() < 0.5))
                .copied()
                .fold(None, |best: Option<Vector3<Real>>, a| match best {
                    Some(b) if b.dot(v) >= a.dot(v) => Some(b),
                    _ => Some(a),
                })
        };
        if let Some(back_axis) = nearest(&back, None) {
            if let Some(up_axis) = nearest(&self.up, Some(&back_axis)) {
                self.position = self.target + back_axis * distance;
                self.up = up_axis;
            }
        }
    }

    /// Persistable part of the camera
    pub fn state(&self) -> CameraState {
        CameraState {
            position: self.position,
            target: self.target,
            up: self.up,
            fov: self.fov,
            near: self.near,
            far: self.far,
        }
    }

    /// Overwrite the persistable part of the camera
    pub fn apply_state(&mut self, state: &CameraState) {
        self.position = state.position;
        self.target = state.target;
        self.up = state.up;
        self.fov = state.fov;
        self.near = state.near;
        self.far = state.far;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            std::f64::consts::FRAC_PI_4,
            16.0 / 9.0,
            0.1,
            100.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = Camera::default();
        camera.orbit(0.4, -0.3);
        assert_relative_eq!(camera.distance(), 5.0, epsilon = 1e-12);
        assert_eq!(camera.target, Point3::origin());
    }

    #[test]
    fn test_orbit_quarter_turn() {
        let mut camera = Camera::default();
        camera.orbit(FRAC_PI_2, 0.0);
        // Rotating the eye by -90 degrees about +Y takes +Z to -X.
        assert_relative_eq!(camera.position, Point3::new(-5.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_pan_moves_target_with_camera() {
        let mut camera = Camera::default();
        camera.pan(1.0, 2.0);
        assert_relative_eq!(camera.target - camera.position, Vector3::new(0.0, 0.0, -5.0), epsilon = 1e-12);
        assert_relative_eq!(camera.target, Point3::new(-1.0, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_zoom_never_passes_target() {
        let mut camera = Camera::default();
        camera.zoom(0.5);
        assert_relative_eq!(camera.distance(), 2.5, epsilon = 1e-12);
        camera.zoom(2.0);
        assert!(camera.distance() > 0.0);
    }

    #[test]
    fn test_align_with_world() {
        let mut camera = Camera::default();
        camera.orbit(0.3, 0.2);
        camera.align_with_world();
        assert_relative_eq!(camera.position, Point3::new(0.0, 0.0, 5.0), epsilon = 1e-9);
        assert_relative_eq!(camera.up, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_state_round_trip_keeps_aspect() {
        let mut camera = Camera::default();
        camera.aspect_ratio = 1.25;
        let mut other = Camera::default();
        other.orbit(1.0, 0.5);
        camera.apply_state(&other.state());
        assert_eq!(camera.position, other.position);
        assert_eq!(camera.aspect_ratio, 1.25);
    }

    #[test]
    fn test_pose_looks_at_target() {
        let camera = Camera::default();
        let pose = camera.pose();
        assert_relative_eq!(pose.orientation * -Vector3::z(), camera.forward(), epsilon = 1e-12);
    }
}
