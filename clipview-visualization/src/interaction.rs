//! Clipping-plane interaction state machine
//!
//! The [`Viewport`] owns everything the render thread reads each frame: the
//! camera, the clipping planes and their bound group, the installed input
//! bindings and the display options. Input events are dispatched by
//! [`Viewport::handle`], one event at a time, while the caller holds the
//! shared viewport lock.
//!
//! Every change to a plane's pose goes through a single path that also
//! replays the change on the rest of the bound group, so grouped planes always
//! move as one rigid formation.

use clipview_core::orientation::{self, Axis};
use clipview_core::{BoundGroup, ClipPlaneRegistry, DisplayOptions, Pose, Real, NUM_CLIP_PLANES};
use clipview_io::{PlaneState, ViewerState};
use nalgebra::{Isometry3, Point2, Translation3, UnitQuaternion, Vector3};

use crate::bindings::{Binding, BindingTarget, CameraBindingMode, FrameConstraint, InputBindings, MouseAction};
use crate::camera::Camera;
use crate::input::{InputEvent, Key, Modifiers, MouseButton};
use crate::renderer::{FrameState, SnapshotState};

/// Wheel translation is `delta * wheel_sensitivity * WHEEL_STEP * scene_radius`
pub const WHEEL_STEP: Real = 1e-3;

/// Interaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    ManipulatingPlane(usize),
}

impl InteractionState {
    /// Index of the plane being manipulated, if any
    pub fn manipulated_plane(&self) -> Option<usize> {
        match self {
            InteractionState::Idle => None,
            InteractionState::ManipulatingPlane(index) => Some(*index),
        }
    }

    /// Manipulated plane index, or `-1` when idle
    pub fn sentinel(&self) -> i32 {
        self.manipulated_plane().map_or(-1, |index| index as i32)
    }
}

/// Result of handling one input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Nothing changed
    Ignored,
    /// Displayed state changed; a redraw is needed
    Redraw,
    /// Save the viewer state to this slot
    SaveSlot(usize),
    /// Restore the viewer state from this slot
    LoadSlot(usize),
}

/// Interaction tuning
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionConfig {
    /// Multiplier on wheel translation of a manipulated plane
    pub wheel_sensitivity: Real,
    /// Radians per pixel of mouse motion
    pub rotation_sensitivity: Real,
    /// Fraction of the scene radius (frames) or camera distance (camera)
    /// per pixel of mouse motion
    pub translation_sensitivity: Real,
    /// Camera zoom fraction per wheel unit or pixel
    pub zoom_step: Real,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            wheel_sensitivity: 1.0,
            rotation_sensitivity: 0.01,
            translation_sensitivity: 0.002,
            zoom_step: 0.001,
        }
    }
}

impl InteractionConfig {
    pub fn with_wheel_sensitivity(mut self, sensitivity: Real) -> Self {
        self.wheel_sensitivity = sensitivity;
        self
    }

    pub fn with_rotation_sensitivity(mut self, sensitivity: Real) -> Self {
        self.rotation_sensitivity = sensitivity;
        self
    }

    pub fn with_translation_sensitivity(mut self, sensitivity: Real) -> Self {
        self.translation_sensitivity = sensitivity;
        self
    }

    pub fn with_zoom_step(mut self, step: Real) -> Self {
        self.zoom_step = step;
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    button: MouseButton,
    binding: Binding,
    last: Point2<Real>,
}

/// Viewer state shared between the UI thread and the render thread
#[derive(Debug)]
pub struct Viewport {
    pub camera: Camera,
    pub display: DisplayOptions,
    planes: ClipPlaneRegistry,
    bound_group: BoundGroup,
    bindings: InputBindings,
    config: InteractionConfig,
    state: InteractionState,
    drag: Option<Drag>,
    size: (u32, u32),
    pub(crate) snapshot: SnapshotState,
}

impl Viewport {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            camera: Camera::default(),
            display: DisplayOptions::default(),
            planes: ClipPlaneRegistry::new(),
            bound_group: BoundGroup::new(),
            bindings: InputBindings::new(),
            config,
            state: InteractionState::Idle,
            drag: None,
            size: (1280, 720),
            snapshot: SnapshotState::default(),
        }
    }

    pub fn planes(&self) -> &ClipPlaneRegistry {
        &self.planes
    }

    pub fn bound_group(&self) -> &BoundGroup {
        &self.bound_group
    }

    pub fn bindings(&self) -> &InputBindings {
        &self.bindings
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Manipulated plane index, or `-1` when idle
    pub fn manipulated_clip_plane(&self) -> i32 {
        self.state.sentinel()
    }

    pub fn is_manipulating(&self) -> bool {
        self.state != InteractionState::Idle
    }

    /// Framebuffer size in pixels
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
        self.camera.aspect_ratio = self.size.0 as Real / self.size.1 as Real;
    }

    /// Start manipulating a plane; mouse and wheel now drive that plane
    pub fn start_clip_plane_manipulation(&mut self, index: usize) {
        assert!(index < NUM_CLIP_PLANES, "clip plane index {} out of range", index);
        self.state = InteractionState::ManipulatingPlane(index);
        self.bindings.bind_frame_control(Some(FrameConstraint::normal_axis()));
        self.drag = None;
        log::info!("manipulating clip plane {}", index + 1);
    }

    /// Back to idle; mouse and wheel drive the camera again
    pub fn reset_manipulation(&mut self) {
        self.state = InteractionState::Idle;
        self.bindings.bind_camera_control();
        self.drag = None;
        log::info!("clip plane manipulation finished");
    }

    /// Compose a local incremental transform onto a plane and replay it on
    /// the rest of its bound group
    pub fn apply_plane_delta(&mut self, index: usize, delta: &Isometry3<Real>) {
        self.planes.apply_delta(index, delta);
        self.bound_group.propagate(&mut self.planes, index, delta);
    }

    /// Move a plane to an absolute pose, carrying its bound group along
    fn move_plane(&mut self, index: usize, target: Pose) {
        let delta = self.planes.pose(index).delta_to(&target);
        self.planes.set_pose(index, target);
        self.bound_group.propagate(&mut self.planes, index, &delta);
    }

    fn set_plane_orientation(&mut self, index: usize, orientation: UnitQuaternion<Real>) {
        let target = self.planes.pose(index).with_orientation(orientation);
        self.move_plane(index, target);
    }

    /// Toggle whether a plane clips; never affects other planes
    pub fn toggle_plane_active(&mut self, index: usize) -> bool {
        let active = self.planes.toggle_active(index);
        log::debug!("clip plane {} active: {}", index + 1, active);
        active
    }

    /// Orient a plane so its normal points along a world axis
    pub fn align_plane_with_axis(&mut self, index: usize, axis: Axis) {
        self.set_plane_orientation(index, orientation::axis_aligned(axis));
        log::debug!("clip plane {} aligned with {:?}", index + 1, axis);
    }

    /// Snap a plane's orientation to the 45° reference lattice
    pub fn snap_plane_to_lattice(&mut self, index: usize) {
        let snapped = orientation::snap_to_lattice(&self.planes.pose(index).orientation);
        self.set_plane_orientation(index, snapped);
        log::debug!("clip plane {} snapped to lattice", index + 1);
    }

    /// Give plane `index` the orientation of plane `source`. Returns false
    /// when both are the same plane.
    pub fn copy_plane_orientation(&mut self, index: usize, source: usize) -> bool {
        let orientation = self.planes.pose(source).orientation;
        if index == source {
            return false;
        }
        self.set_plane_orientation(index, orientation);
        log::debug!("clip plane {} takes orientation of plane {}", index + 1, source + 1);
        true
    }

    /// Reverse a plane's normal in place
    pub fn reverse_plane_normal(&mut self, index: usize) {
        self.apply_plane_delta(index, &ClipPlaneRegistry::reversal_delta());
    }

    /// Translate a plane along its own normal
    pub fn translate_plane_along_normal(&mut self, index: usize, distance: Real) {
        let delta = Isometry3::from_parts(Translation3::new(0.0, 0.0, distance), UnitQuaternion::identity());
        self.apply_plane_delta(index, &delta);
    }

    /// Add or remove a plane from the bound group
    pub fn toggle_bound(&mut self, index: usize) -> bool {
        let bound = self.bound_group.toggle(index);
        log::info!("bound clip planes:{}", self.bound_group.label());
        bound
    }

    /// Handle one input event
    pub fn handle(&mut self, event: &InputEvent, scene_radius: Real) -> Response {
        match *event {
            InputEvent::KeyPress { key, modifiers } => self.handle_key(key, modifiers),
            InputEvent::MousePress {
                button,
                position,
                modifiers,
            } => self.begin_drag(button, position, modifiers),
            InputEvent::MouseRelease { button } => {
                if self.drag.map_or(false, |drag| drag.button == button) {
                    self.drag = None;
                }
                Response::Ignored
            }
            InputEvent::MouseMove { position } => self.continue_drag(position, scene_radius),
            InputEvent::MouseDoubleClick { button, modifiers } => self.handle_double_click(button, modifiers),
            InputEvent::Wheel { delta, modifiers } => self.handle_wheel(delta, modifiers, scene_radius),
        }
    }

    fn handle_key(&mut self, key: Key, modifiers: Modifiers) -> Response {
        match (key, self.state) {
            (Key::Function(f), _) if (1..=NUM_CLIP_PLANES).contains(&(f as usize)) => {
                self.start_clip_plane_manipulation(f as usize - 1);
                Response::Redraw
            }
            (Key::Digit(d), _) if modifiers.alt => {
                if (1..=NUM_CLIP_PLANES).contains(&(d as usize)) {
                    self.toggle_bound(d as usize - 1);
                    Response::Redraw
                } else {
                    Response::Ignored
                }
            }
            (Key::Escape, InteractionState::ManipulatingPlane(_)) => {
                self.reset_manipulation();
                Response::Redraw
            }
            (key, InteractionState::ManipulatingPlane(index)) => self.handle_plane_key(index, key, modifiers),
            (key, InteractionState::Idle) => self.handle_idle_key(key, modifiers),
        }
    }

    fn handle_plane_key(&mut self, index: usize, key: Key, modifiers: Modifiers) -> Response {
        if !modifiers.is_empty() && key != Key::Space {
            return Response::Ignored;
        }
        match key {
            Key::Space => {
                self.toggle_plane_active(index);
            }
            Key::Char('r') => self.reverse_plane_normal(index),
            Key::Char(c) => match Axis::from_char(c) {
                Some(axis) => self.align_plane_with_axis(index, axis),
                None => return Response::Ignored,
            },
            Key::Digit(d) if (1..=NUM_CLIP_PLANES).contains(&(d as usize)) => {
                if !self.copy_plane_orientation(index, d as usize - 1) {
                    return Response::Ignored;
                }
            }
            _ => return Response::Ignored,
        }
        Response::Redraw
    }

    fn handle_idle_key(&mut self, key: Key, modifiers: Modifiers) -> Response {
        match key {
            Key::Digit(d) if modifiers == Modifiers::CTRL => Response::SaveSlot(d as usize),
            Key::Digit(d) if modifiers.is_empty() => Response::LoadSlot(d as usize),
            Key::Char('g') if modifiers.is_empty() => {
                self.display.grid = self.display.grid.cycle();
                log::debug!("grid normals: {:?}", self.display.grid.normals());
                Response::Redraw
            }
            Key::Char('t') if modifiers.is_empty() => {
                self.display.time_display = self.display.time_display.cycle();
                Response::Redraw
            }
            _ => Response::Ignored,
        }
    }

    fn handle_double_click(&mut self, button: MouseButton, modifiers: Modifiers) -> Response {
        if button != MouseButton::Left || !modifiers.is_empty() {
            return Response::Ignored;
        }
        match self.state {
            InteractionState::ManipulatingPlane(index) => self.snap_plane_to_lattice(index),
            InteractionState::Idle => self.camera.align_with_world(),
        }
        Response::Redraw
    }

    fn handle_wheel(&mut self, delta: Real, modifiers: Modifiers, scene_radius: Real) -> Response {
        let Some(binding) = self.bindings.wheel_binding(modifiers) else {
            return Response::Ignored;
        };
        match (binding.target, self.state) {
            (BindingTarget::Camera, _) => {
                self.camera.zoom(delta * self.config.zoom_step);
                Response::Redraw
            }
            (BindingTarget::Frame, InteractionState::ManipulatingPlane(index)) => {
                let distance = delta * self.config.wheel_sensitivity * WHEEL_STEP * scene_radius;
                self.translate_plane_along_normal(index, distance);
                Response::Redraw
            }
            (BindingTarget::Frame, InteractionState::Idle) => Response::Ignored,
        }
    }

    fn begin_drag(&mut self, button: MouseButton, position: Point2<Real>, modifiers: Modifiers) -> Response {
        self.drag = self
            .bindings
            .mouse_binding(modifiers, button)
            .map(|binding| Drag {
                button,
                binding,
                last: position,
            });
        Response::Ignored
    }

    fn continue_drag(&mut self, position: Point2<Real>, scene_radius: Real) -> Response {
        let Some(drag) = self.drag.as_mut() else {
            return Response::Ignored;
        };
        let motion = position - drag.last;
        drag.last = position;
        let binding = drag.binding;
        if motion.x == 0.0 && motion.y == 0.0 {
            return Response::Ignored;
        }

        match (binding.target, self.state) {
            (BindingTarget::Camera, _) => {
                self.drag_camera(binding.action, motion.x, motion.y);
                Response::Redraw
            }
            (BindingTarget::Frame, InteractionState::ManipulatingPlane(index)) => {
                self.drag_plane(index, binding.action, motion.x, motion.y, scene_radius);
                Response::Redraw
            }
            (BindingTarget::Frame, InteractionState::Idle) => Response::Ignored,
        }
    }

    fn drag_camera(&mut self, action: MouseAction, dx: Real, dy: Real) {
        match action {
            MouseAction::Rotate => self
                .camera
                .orbit(dx * self.config.rotation_sensitivity, dy * self.config.rotation_sensitivity),
            MouseAction::Translate => {
                let scale = self.config.translation_sensitivity * self.camera.distance();
                self.camera.pan(dx * scale, dy * scale);
            }
            MouseAction::Zoom => self.camera.zoom(-dy * self.config.zoom_step),
        }
    }

    /// Turn screen-space mouse motion into a local incremental transform of
    /// the plane, restricted by the installed frame constraint
    fn drag_plane(&mut self, index: usize, action: MouseAction, dx: Real, dy: Real, scene_radius: Real) {
        let constraint = self.bindings.constraint().unwrap_or_default();
        let inverse = self.planes.pose(index).orientation.inverse();
        let right = self.camera.right();
        let up = self.camera.screen_up();
        if !right.iter().chain(up.iter()).all(|c| c.is_finite()) {
            log::warn!("camera has no screen basis; plane drag ignored");
            return;
        }
        let step = self.config.translation_sensitivity * scene_radius;

        let delta = match action {
            MouseAction::Rotate => {
                let world_axis = up * dx + right * dy;
                let local = constraint.rotation.constrain(&(inverse * world_axis));
                let angle = (dx * dx + dy * dy).sqrt() * self.config.rotation_sensitivity;
                let rotation = match local.try_normalize(Real::EPSILON) {
                    Some(axis) => UnitQuaternion::new(axis * angle),
                    None => return,
                };
                Isometry3::from_parts(Translation3::identity(), rotation)
            }
            MouseAction::Translate => {
                let world = (right * dx - up * dy) * step;
                let local = constraint.translation.constrain(&(inverse * world));
                Isometry3::from_parts(Translation3::from(local), UnitQuaternion::identity())
            }
            MouseAction::Zoom => {
                let local = constraint.translation.constrain(&(Vector3::z() * (-dy * step)));
                Isometry3::from_parts(Translation3::from(local), UnitQuaternion::identity())
            }
        };
        self.apply_plane_delta(index, &delta);
    }

    /// Capture the persistable state
    pub fn viewer_state(&self) -> ViewerState {
        ViewerState {
            camera: self.camera.state(),
            planes: (0..NUM_CLIP_PLANES)
                .map(|index| PlaneState {
                    pose: self.planes.pose(index),
                    active: self.planes.is_active(index),
                    bound: self.bound_group.contains(index),
                })
                .collect(),
            display: self.display.clone(),
        }
    }

    /// Apply a validated state. Planes missing from `state` keep their values.
    pub fn apply_viewer_state(&mut self, state: &ViewerState) {
        self.camera.apply_state(&state.camera);
        for (index, plane) in state.planes.iter().enumerate().take(NUM_CLIP_PLANES) {
            self.planes.set_pose(index, plane.pose);
            self.planes.set_active(index, plane.active);
            self.bound_group.set_member(index, plane.bound);
        }
        self.display = state.display.clone();
    }

    /// Read-only copy of what the render thread draws
    pub fn frame_state(&self) -> FrameState {
        FrameState {
            camera: self.camera.clone(),
            planes: self.planes.clone(),
            bound_group: self.bound_group.clone(),
            manipulated: self.state.manipulated_plane(),
            frame_control: matches!(self.bindings.mode(), CameraBindingMode::FrameControl(_)),
            display: self.display.clone(),
            size: self.size,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}
