//! Integration tests for clipview-visualization
//!
//! These tests drive a `Viewer` end to end: input events, viewer-state
//! slots on the scene document, and snapshots written by the render loop.

use approx::assert_relative_eq;
use clipview_core::{Error, Pose, SceneDocument};
use clipview_io::InMemoryScene;
use clipview_visualization::*;
use nalgebra::{Point3, UnitQuaternion, Vector3};

fn create_viewer(radius: f64) -> Viewer<InMemoryScene> {
    let (viewer, _requests) = Viewer::new(InMemoryScene::with_radius(radius), ViewerConfig::default());
    viewer
}

fn key(key: Key) -> InputEvent {
    InputEvent::key(key)
}

fn alt(digit: u8) -> InputEvent {
    InputEvent::key_with(Key::Digit(digit), Modifiers::ALT)
}

#[test]
fn test_wheel_scenario_moves_group_by_two_thousandths() {
    let mut viewer = create_viewer(1.0);
    viewer.handle_event(&alt(1)).unwrap();
    viewer.handle_event(&alt(2)).unwrap();
    assert_eq!(viewer.bound_group_label(), " 1 2");

    viewer.handle_event(&key(Key::Function(1))).unwrap();
    assert!(viewer.is_manipulating());
    assert_eq!(viewer.manipulated_clip_plane(), 0);

    viewer.handle_event(&InputEvent::wheel(2.0)).unwrap();

    let frame = viewer.shared().frame_state();
    let normal = frame.planes.plane(0).normal();
    assert_relative_eq!(frame.planes.pose(0).position.coords, normal * 0.002, epsilon = 1e-15);
    assert_relative_eq!(frame.planes.pose(1).position.coords, normal * 0.002, epsilon = 1e-15);
    assert_eq!(frame.planes.pose(2), Pose::identity());
}

#[test]
fn test_save_and_load_slot_round_trip() {
    let mut viewer = create_viewer(1.0);
    viewer.handle_event(&alt(3)).unwrap();
    viewer.handle_event(&key(Key::Function(3))).unwrap();
    viewer.handle_event(&key(Key::Char('y'))).unwrap();
    viewer.handle_event(&key(Key::Space)).unwrap();
    viewer.handle_event(&InputEvent::wheel(120.0)).unwrap();
    viewer.handle_event(&key(Key::Escape)).unwrap();
    viewer.handle_event(&key(Key::Char('g'))).unwrap();

    let saved = viewer.viewer_state();
    assert_eq!(
        viewer.handle_event(&InputEvent::key_with(Key::Digit(5), Modifiers::CTRL)).unwrap(),
        Response::SaveSlot(5)
    );
    assert!(viewer.document().slot(5).is_some());

    // Disturb everything that was saved.
    viewer.handle_event(&alt(3)).unwrap();
    viewer.handle_event(&key(Key::Char('g'))).unwrap();
    viewer.handle_event(&key(Key::Function(3))).unwrap();
    viewer.handle_event(&key(Key::Char('r'))).unwrap();
    viewer.handle_event(&key(Key::Escape)).unwrap();
    assert_ne!(viewer.viewer_state(), saved);

    assert_eq!(viewer.handle_event(&key(Key::Digit(5))).unwrap(), Response::LoadSlot(5));
    let restored = viewer.viewer_state();
    assert_eq!(restored.display, saved.display);
    assert_eq!(restored.camera, saved.camera);
    for (a, b) in restored.planes.iter().zip(&saved.planes) {
        assert_eq!(a.pose.position, b.pose.position);
        assert_eq!(a.pose.orientation.coords, b.pose.orientation.coords);
        assert_eq!(a.active, b.active);
        assert_eq!(a.bound, b.bound);
    }
    assert_eq!(viewer.bound_group_label(), " 3");
}

#[test]
fn test_failed_load_leaves_state_unchanged() {
    let mut viewer = create_viewer(1.0);
    viewer.handle_event(&alt(2)).unwrap();
    let before = viewer.viewer_state();

    assert!(matches!(viewer.handle_event(&key(Key::Digit(7))), Err(Error::EmptySlot(7))));

    // A slot whose last plane has a corrupted orientation.
    let mut element = ViewerStateFixture::rotated().to_element("viewer_state");
    let planes = element.children.iter_mut().find(|c| c.name == "clip_planes").unwrap();
    let orientation = planes.children[2]
        .children
        .iter_mut()
        .find(|c| c.name == "orientation")
        .unwrap();
    orientation.set_field("x", 0.9);
    viewer
        .document_mut()
        .store_slot(4, element.to_json().unwrap())
        .unwrap();

    assert!(matches!(
        viewer.use_display_parameters(4),
        Err(Error::Deserialization { .. })
    ));
    assert_eq!(viewer.viewer_state(), before);
}

#[test]
fn test_state_element_round_trip() {
    let source = create_viewer(1.0);
    source.apply_viewer_state(&ViewerStateFixture::rotated());
    let element = source.state_element("view");

    let target = create_viewer(1.0);
    target.apply_state_element(&element).unwrap();
    assert_eq!(target.viewer_state(), ViewerStateFixture::rotated());
}

#[test]
fn test_idle_edits_are_noops_and_escape_is_idempotent() {
    let mut viewer = create_viewer(1.0);
    let before = viewer.viewer_state();
    for event in [key(Key::Space), key(Key::Char('r')), key(Key::Char('x')), key(Key::Escape)] {
        assert_eq!(viewer.handle_event(&event).unwrap(), Response::Ignored);
    }
    assert_eq!(viewer.viewer_state(), before);
    assert_eq!(viewer.manipulated_clip_plane(), -1);
}

#[test]
fn test_last_user_event_advances() {
    let mut viewer = create_viewer(1.0);
    let start = viewer.last_user_event();
    std::thread::sleep(std::time::Duration::from_millis(5));
    viewer.handle_event(&key(Key::Char('q'))).unwrap();
    assert!(viewer.last_user_event() > start);
}

#[test]
fn test_snapshot_written_by_render_thread() {
    let dir = tempfile::tempdir().unwrap();
    let (viewer, requests) = Viewer::new(InMemoryScene::default(), ViewerConfig::default());
    let pipeline = FramebufferPipeline::new(FramebufferConfig::default().with_size(32, 24));
    let thread = RenderLoop::new(viewer.shared(), requests, pipeline).spawn().unwrap();

    let first = viewer.request_snapshot(dir.path().join("a.png"));
    let ticket = viewer.request_snapshot(dir.path().join("b.png"));
    let written = viewer.wait_for_snapshot(&ticket).unwrap();
    assert_eq!(written, dir.path().join("b.png"));
    assert!(written.exists());
    // The first request was either merged into b.png or written on its own.
    let first_written = viewer.wait_for_snapshot(&first).unwrap();
    assert!(first_written.exists());
    assert!(!viewer.is_snapshot_pending());

    let failed = viewer.request_snapshot(dir.path().join("missing").join("c.png"));
    assert!(matches!(viewer.wait_for_snapshot(&failed), Err(Error::Snapshot { .. })));
    assert!(!viewer.is_snapshot_pending());

    drop(viewer);
    thread.join().unwrap();
}

/// Viewer state with every plane moved off its default pose
struct ViewerStateFixture;

impl ViewerStateFixture {
    fn rotated() -> clipview_io::ViewerState {
        let mut state = clipview_io::ViewerState::default();
        for (index, plane) in state.planes.iter_mut().enumerate() {
            let angle = 0.3 * (index as f64 + 1.0);
            plane.pose = Pose::new(
                Point3::new(0.1 * index as f64, -0.2, 0.5),
                UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle),
            );
            plane.active = index != 1;
            plane.bound = index == 0;
        }
        state.camera.position = Point3::new(1.0, 2.0, 3.0);
        state
    }
}
