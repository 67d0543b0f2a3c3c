//! Mouse and wheel bindings
//!
//! Two binding tables decide what mouse drags and wheel turns do: either they
//! move the camera, or they move the frame currently being manipulated.
//! Switching mode always rebuilds both tables from scratch.

use clipview_core::Real;
use nalgebra::Vector3;
use std::collections::HashMap;

use crate::input::{Modifiers, MouseButton};

/// What a binding moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingTarget {
    Camera,
    Frame,
}

/// How a binding moves its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseAction {
    Rotate,
    Translate,
    Zoom,
}

/// A bound action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binding {
    pub target: BindingTarget,
    pub action: MouseAction,
}

impl Binding {
    pub const fn new(target: BindingTarget, action: MouseAction) -> Self {
        Self { target, action }
    }
}

/// Restriction on a motion, in the manipulated frame's local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisPlane {
    Free,
    /// Only along this direction
    Axis(Vector3<Real>),
    /// Only within the plane with this normal
    Plane(Vector3<Real>),
    Forbidden,
}

impl AxisPlane {
    /// Project a local motion vector onto the allowed subspace
    pub fn constrain(&self, v: &Vector3<Real>) -> Vector3<Real> {
        match self {
            AxisPlane::Free => *v,
            AxisPlane::Axis(direction) => match direction.try_normalize(Real::EPSILON) {
                Some(d) => d * d.dot(v),
                None => Vector3::zeros(),
            },
            AxisPlane::Plane(normal) => match normal.try_normalize(Real::EPSILON) {
                Some(n) => v - n * n.dot(v),
                None => *v,
            },
            AxisPlane::Forbidden => Vector3::zeros(),
        }
    }
}

/// Constraint on a manipulated frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameConstraint {
    pub translation: AxisPlane,
    pub rotation: AxisPlane,
}

impl FrameConstraint {
    /// Translation along the local normal only, free rotation.
    /// This is what clipping-plane manipulation uses.
    pub fn normal_axis() -> Self {
        Self {
            translation: AxisPlane::Axis(Vector3::z()),
            rotation: AxisPlane::Free,
        }
    }
}

impl Default for FrameConstraint {
    fn default() -> Self {
        Self {
            translation: AxisPlane::Free,
            rotation: AxisPlane::Free,
        }
    }
}

/// Which binding set is installed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraBindingMode {
    CameraControl,
    FrameControl(Option<FrameConstraint>),
}

/// Mouse and wheel binding tables
#[derive(Debug, Clone)]
pub struct InputBindings {
    mode: CameraBindingMode,
    mouse: HashMap<(Modifiers, MouseButton), Binding>,
    wheel: HashMap<Modifiers, Binding>,
}

impl InputBindings {
    /// Bindings with camera control installed
    pub fn new() -> Self {
        let mut bindings = Self {
            mode: CameraBindingMode::CameraControl,
            mouse: HashMap::new(),
            wheel: HashMap::new(),
        };
        bindings.bind_camera_control();
        bindings
    }

    /// Install the camera-control tables
    pub fn bind_camera_control(&mut self) {
        use BindingTarget::*;
        use MouseAction::*;

        self.mouse.clear();
        self.wheel.clear();

        self.wheel.insert(Modifiers::NONE, Binding::new(Camera, Zoom));
        self.wheel.insert(Modifiers::SHIFT, Binding::new(Frame, Zoom));

        self.mouse.insert((Modifiers::NONE, MouseButton::Left), Binding::new(Camera, Rotate));
        self.mouse.insert((Modifiers::NONE, MouseButton::Right), Binding::new(Camera, Translate));
        self.mouse.insert((Modifiers::NONE, MouseButton::Middle), Binding::new(Camera, Zoom));
        self.mouse.insert((Modifiers::SHIFT, MouseButton::Right), Binding::new(Frame, Rotate));
        self.mouse.insert((Modifiers::SHIFT, MouseButton::Middle), Binding::new(Frame, Translate));

        self.mode = CameraBindingMode::CameraControl;
        log::debug!("camera control bindings installed");
    }

    /// Install the frame-control tables
    pub fn bind_frame_control(&mut self, constraint: Option<FrameConstraint>) {
        use BindingTarget::*;
        use MouseAction::*;

        self.mouse.clear();
        self.wheel.clear();

        self.mouse.insert((Modifiers::NONE, MouseButton::Left), Binding::new(Frame, Rotate));
        self.mouse.insert((Modifiers::NONE, MouseButton::Right), Binding::new(Frame, Translate));
        self.mouse.insert((Modifiers::NONE, MouseButton::Middle), Binding::new(Frame, Zoom));
        self.wheel.insert(Modifiers::NONE, Binding::new(Frame, Zoom));

        self.mode = CameraBindingMode::FrameControl(constraint);
        log::debug!("frame control bindings installed");
    }

    pub fn mode(&self) -> CameraBindingMode {
        self.mode
    }

    /// Constraint of the installed frame-control bindings, if any
    pub fn constraint(&self) -> Option<FrameConstraint> {
        match self.mode {
            CameraBindingMode::FrameControl(constraint) => constraint,
            CameraBindingMode::CameraControl => None,
        }
    }

    pub fn mouse_binding(&self, modifiers: Modifiers, button: MouseButton) -> Option<Binding> {
        self.mouse.get(&(modifiers, button)).copied()
    }

    pub fn wheel_binding(&self, modifiers: Modifiers) -> Option<Binding> {
        self.wheel.get(&modifiers).copied()
    }

    /// Number of installed mouse bindings
    pub fn mouse_binding_count(&self) -> usize {
        self.mouse.len()
    }

    /// Number of installed wheel bindings
    pub fn wheel_binding_count(&self) -> usize {
        self.wheel.len()
    }
}

impl Default for InputBindings {
    fn default() -> Self {
        Self::new()
    }
}
