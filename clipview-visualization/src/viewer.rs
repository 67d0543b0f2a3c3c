//! Viewer controller
//!
//! [`Viewer`] is the UI-thread entry point. It owns the scene document and a
//! [`RenderHandle`], and shares the [`Viewport`] with the render thread through
//! [`SharedViewport`]. Every input event is handled under one lock
//! acquisition, so the render thread never sees a bound group half moved.

use clipview_core::{Result, SceneDocument};
use clipview_io::{load_from_slot, save_to_slot, Element, ViewerState};
use crossbeam_channel::Receiver;
use instant::Instant;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use winit::event::WindowEvent;

use crate::input::{InputEvent, WinitInputTranslator};
use crate::interaction::{InteractionConfig, Response, Viewport};
use crate::renderer::{FrameState, RenderHandle, RenderRequest, SnapshotTicket};

/// The viewport plus the signals the render thread raises
#[derive(Debug)]
pub struct SharedViewport {
    viewport: Mutex<Viewport>,
    snapshot_done: Condvar,
    shut_down: AtomicBool,
}

impl SharedViewport {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport: Mutex::new(viewport),
            snapshot_done: Condvar::new(),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Viewport> {
        self.viewport.lock()
    }

    /// Consistent copy of the drawable state
    pub fn frame_state(&self) -> FrameState {
        self.lock().frame_state()
    }

    pub(crate) fn wait_for_snapshot(&self, guard: &mut MutexGuard<'_, Viewport>) {
        self.snapshot_done.wait(guard);
    }

    pub(crate) fn notify_snapshot(&self) {
        let _guard = self.lock();
        self.snapshot_done.notify_all();
    }

    pub(crate) fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        self.notify_snapshot();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

/// Viewer settings
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub interaction: InteractionConfig,
    /// Longest gap between two presses that still counts as a double click
    pub double_click_interval: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            interaction: InteractionConfig::default(),
            double_click_interval: Duration::from_millis(400),
        }
    }
}

impl ViewerConfig {
    pub fn with_interaction(mut self, interaction: InteractionConfig) -> Self {
        self.interaction = interaction;
        self
    }

    pub fn with_double_click_interval(mut self, interval: Duration) -> Self {
        self.double_click_interval = interval;
        self
    }
}

/// Interactive clipping-plane viewer attached to a scene document
pub struct Viewer<D: SceneDocument> {
    document: D,
    shared: Arc<SharedViewport>,
    render: RenderHandle,
    translator: WinitInputTranslator,
    last_user_event: Instant,
}

impl<D: SceneDocument> Viewer<D> {
    /// Create a viewer and the request queue for its render loop
    pub fn new(document: D, config: ViewerConfig) -> (Self, Receiver<RenderRequest>) {
        let shared = Arc::new(SharedViewport::new(Viewport::new(config.interaction)));
        let (render, requests) = RenderHandle::new(shared.clone());
        let viewer = Self {
            document,
            shared,
            render,
            translator: WinitInputTranslator::new(config.double_click_interval),
            last_user_event: Instant::now(),
        };
        (viewer, requests)
    }

    /// Viewport shared with the render loop
    pub fn shared(&self) -> Arc<SharedViewport> {
        self.shared.clone()
    }

    pub fn render_handle(&self) -> &RenderHandle {
        &self.render
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    /// Time of the most recent input event
    pub fn last_user_event(&self) -> Instant {
        self.last_user_event
    }

    /// Handle one input event and act on the result. Slot failures are
    /// returned and leave the viewer unchanged.
    pub fn handle_event(&mut self, event: &InputEvent) -> Result<Response> {
        self.last_user_event = Instant::now();
        let radius = self.document.scene_radius();
        let response = self.shared.lock().handle(event, radius);
        match response {
            Response::Ignored => {}
            Response::Redraw => self.render.request_redraw(),
            Response::SaveSlot(index) => self.save_display_parameters(index)?,
            Response::LoadSlot(index) => self.use_display_parameters(index)?,
        }
        Ok(response)
    }

    /// Translate and handle a winit window event. Resizes go straight to the
    /// render handle; events the viewport does not use yield `None`.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> Result<Option<Response>> {
        if let WindowEvent::Resized(size) = event {
            self.render.resize(size.width, size.height);
            return Ok(None);
        }
        match self.translator.translate(event) {
            Some(input) => self.handle_event(&input).map(Some),
            None => Ok(None),
        }
    }

    /// Save the current viewer state into a document slot
    pub fn save_display_parameters(&mut self, index: usize) -> Result<()> {
        let state = self.shared.lock().viewer_state();
        save_to_slot(&mut self.document, index, &state)
    }

    /// Restore the viewer state from a document slot. Nothing changes unless
    /// the whole slot parses and validates.
    pub fn use_display_parameters(&mut self, index: usize) -> Result<()> {
        let state = load_from_slot(&self.document, index)?;
        self.apply_viewer_state(&state);
        Ok(())
    }

    pub fn viewer_state(&self) -> ViewerState {
        self.shared.lock().viewer_state()
    }

    pub fn apply_viewer_state(&self, state: &ViewerState) {
        self.shared.lock().apply_viewer_state(state);
        self.render.request_redraw();
    }

    /// Export the viewer state as a document element
    pub fn state_element(&self, name: &str) -> Element {
        self.viewer_state().to_element(name)
    }

    /// Import the viewer state from a document element
    pub fn apply_state_element(&self, element: &Element) -> Result<()> {
        let state = ViewerState::from_element(element)?;
        self.apply_viewer_state(&state);
        Ok(())
    }

    pub fn request_snapshot<P: Into<PathBuf>>(&self, path: P) -> SnapshotTicket {
        self.render.request_snapshot(path)
    }

    pub fn is_snapshot_pending(&self) -> bool {
        self.render.is_snapshot_pending()
    }

    pub fn wait_for_snapshot(&self, ticket: &SnapshotTicket) -> Result<PathBuf> {
        self.render.wait_for_snapshot(ticket)
    }

    /// One-based list of bound planes, e.g. `" 1 3"`
    pub fn bound_group_label(&self) -> String {
        self.shared.lock().bound_group().label()
    }

    pub fn is_manipulating(&self) -> bool {
        self.shared.lock().is_manipulating()
    }

    /// Manipulated plane index, or `-1` when idle
    pub fn manipulated_clip_plane(&self) -> i32 {
        self.shared.lock().manipulated_clip_plane()
    }
}

impl<D: SceneDocument> Drop for Viewer<D> {
    fn drop(&mut self) {
        self.render.shutdown();
    }
}
