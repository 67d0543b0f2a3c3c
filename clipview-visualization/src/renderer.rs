//! Render thread coordination
//!
//! The render thread owns the drawing pipeline. It never touches viewer state
//! except through two narrow paths: a read-only [`FrameState`] copied out
//! under the shared lock once per frame, and the snapshot bookkeeping that
//! tells requesters their frame was written.
//!
//! The UI side talks to the render thread through a [`RenderHandle`]: redraw
//! requests go over a capacity-one channel and never block, snapshot requests
//! store a filename in the shared viewport. A newer snapshot request replaces
//! an unfulfilled one, so several requests made between two draws produce a
//! single file.

use clipview_core::{BoundGroup, ClipPlaneRegistry, DisplayOptions, Error, Real, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use image::ColorType;
use nalgebra::{Point3, Vector4};
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::camera::Camera;
use crate::viewer::SharedViewport;

/// Completed snapshots remembered for late waiters
const OUTCOME_HISTORY: usize = 16;

/// Markers whose normalised device coordinates exceed this are not drawn
const MAX_MARKER_NDC: Real = 2.0;

/// Everything the render pipeline needs to draw one frame
#[derive(Debug, Clone)]
pub struct FrameState {
    pub camera: Camera,
    pub planes: ClipPlaneRegistry,
    pub bound_group: BoundGroup,
    /// Plane being manipulated, drawn highlighted
    pub manipulated: Option<usize>,
    /// Whether mouse input currently drives a frame instead of the camera
    pub frame_control: bool,
    pub display: DisplayOptions,
    /// Framebuffer size in pixels
    pub size: (u32, u32),
}

impl FrameState {
    /// Equations of the planes that clip, in index order
    pub fn clip_equations(&self) -> Vec<(usize, [Real; 4])> {
        self.planes.active_equations()
    }
}

/// Drawing backend driven by the render thread
pub trait RenderPipeline: Send {
    /// Draw one frame
    fn draw(&mut self, frame: &FrameState) -> Result<()>;

    /// Write the last drawn frame to an image file
    fn capture_frame(&mut self, path: &Path) -> io::Result<()>;

    /// Framebuffer size changed
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Message from the UI thread to the render thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderRequest {
    Redraw,
    Shutdown,
}

/// Identifies one snapshot request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnapshotTicket(u64);

#[derive(Debug)]
struct SnapshotOutcome {
    /// Highest request generation this capture covered
    generation: u64,
    path: PathBuf,
    error: Option<(io::ErrorKind, String)>,
}

impl SnapshotOutcome {
    fn to_result(&self) -> Result<PathBuf> {
        match &self.error {
            None => Ok(self.path.clone()),
            Some((kind, message)) => Err(Error::Snapshot {
                path: self.path.clone(),
                source: io::Error::new(*kind, message.clone()),
            }),
        }
    }
}

/// Snapshot bookkeeping kept inside the shared viewport
#[derive(Debug, Default)]
pub(crate) struct SnapshotState {
    pending: Option<PathBuf>,
    requested: u64,
    fulfilled: u64,
    in_flight: bool,
    outcomes: VecDeque<SnapshotOutcome>,
}

impl SnapshotState {
    fn request(&mut self, path: PathBuf) -> SnapshotTicket {
        if let Some(previous) = self.pending.replace(path) {
            log::debug!("snapshot request {} superseded", previous.display());
        }
        self.requested += 1;
        SnapshotTicket(self.requested)
    }

    fn take(&mut self) -> Option<(u64, PathBuf)> {
        let path = self.pending.take()?;
        self.in_flight = true;
        Some((self.requested, path))
    }

    fn complete(&mut self, generation: u64, path: PathBuf, result: io::Result<()>) {
        let error = result.err().map(|e| (e.kind(), e.to_string()));
        self.outcomes.push_back(SnapshotOutcome { generation, path, error });
        while self.outcomes.len() > OUTCOME_HISTORY {
            self.outcomes.pop_front();
        }
        self.fulfilled = generation;
        self.in_flight = false;
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some() || self.in_flight
    }

    fn outcome(&self, ticket: SnapshotTicket) -> Option<Result<PathBuf>> {
        if ticket.0 > self.fulfilled {
            return None;
        }
        let result = self
            .outcomes
            .iter()
            .find(|outcome| outcome.generation >= ticket.0)
            .map(SnapshotOutcome::to_result)
            .unwrap_or_else(|| {
                Err(Error::Visualization(format!(
                    "snapshot request {} completed too long ago to report",
                    ticket.0
                )))
            });
        Some(result)
    }
}

/// UI-side handle to the render thread
#[derive(Debug, Clone)]
pub struct RenderHandle {
    shared: Arc<SharedViewport>,
    requests: Sender<RenderRequest>,
}

impl RenderHandle {
    /// Create a handle and the request queue the render loop drains
    pub fn new(shared: Arc<SharedViewport>) -> (Self, Receiver<RenderRequest>) {
        let (requests, receiver) = bounded(1);
        (Self { shared, requests }, receiver)
    }

    /// Wake the render thread. Never blocks; a full queue already holds a
    /// redraw that will pick up the latest state.
    pub fn request_redraw(&self) {
        match self.requests.try_send(RenderRequest::Redraw) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => log::warn!("redraw requested after the render loop stopped"),
        }
    }

    /// Ask for the next drawn frame to be written to `path`
    pub fn request_snapshot<P: Into<PathBuf>>(&self, path: P) -> SnapshotTicket {
        let ticket = self.shared.lock().snapshot.request(path.into());
        self.request_redraw();
        ticket
    }

    /// Whether a snapshot is requested or being written
    pub fn is_snapshot_pending(&self) -> bool {
        self.shared.lock().snapshot.is_pending()
    }

    /// Block until the capture covering `ticket` is done. Returns the path
    /// actually written, which is the newest filename requested before that
    /// capture started.
    pub fn wait_for_snapshot(&self, ticket: &SnapshotTicket) -> Result<PathBuf> {
        let mut viewport = self.shared.lock();
        loop {
            if let Some(result) = viewport.snapshot.outcome(*ticket) {
                return result;
            }
            if self.shared.is_shut_down() {
                return Err(Error::Visualization("render loop stopped before the snapshot was taken".to_string()));
            }
            self.shared.wait_for_snapshot(&mut viewport);
        }
    }

    /// Resize the framebuffer and redraw
    pub fn resize(&self, width: u32, height: u32) {
        self.shared.lock().set_size(width, height);
        self.request_redraw();
    }

    /// Stop the render loop after its current frame
    pub fn shutdown(&self) {
        self.shared.shutdown();
        // A full queue already wakes the loop.
        let _ = self.requests.try_send(RenderRequest::Shutdown);
    }
}

/// Render-thread side: drains requests and draws frames
pub struct RenderLoop<P: RenderPipeline> {
    shared: Arc<SharedViewport>,
    requests: Receiver<RenderRequest>,
    pipeline: P,
    size: Option<(u32, u32)>,
    frames: u64,
}

impl<P: RenderPipeline> RenderLoop<P> {
    pub fn new(shared: Arc<SharedViewport>, requests: Receiver<RenderRequest>, pipeline: P) -> Self {
        Self {
            shared,
            requests,
            pipeline,
            size: None,
            frames: 0,
        }
    }

    /// Frames drawn so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Draw one frame and fulfil a pending snapshot request
    pub fn render_frame(&mut self) {
        let frame = self.shared.frame_state();

        if self.size != Some(frame.size) {
            self.pipeline.resize(frame.size.0, frame.size.1);
            self.size = Some(frame.size);
        }
        if let Err(e) = self.pipeline.draw(&frame) {
            log::error!("draw failed: {}", e);
        }
        self.frames += 1;

        let Some((generation, path)) = self.shared.lock().snapshot.take() else {
            return;
        };
        let result = self.pipeline.capture_frame(&path);
        match &result {
            Ok(()) => log::info!("snapshot written to {}", path.display()),
            Err(e) => log::error!("snapshot to {} failed: {}", path.display(), e),
        }
        self.shared.lock().snapshot.complete(generation, path, result);
        self.shared.notify_snapshot();
    }

    /// Draw whenever asked until shut down or every handle is dropped
    pub fn run(mut self) {
        log::debug!("render loop started");
        while let Ok(request) = self.requests.recv() {
            if request == RenderRequest::Shutdown || self.shared.is_shut_down() {
                break;
            }
            self.render_frame();
        }
        self.shared.shutdown();
        log::debug!("render loop stopped after {} frames", self.frames);
    }
}

impl<P: RenderPipeline + 'static> RenderLoop<P> {
    /// Run the loop on its own thread
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("clipview-render".to_string())
            .spawn(move || self.run())?;
        Ok(handle)
    }
}

/// Headless framebuffer settings
#[derive(Debug, Clone, PartialEq)]
pub struct FramebufferConfig {
    pub width: u32,
    pub height: u32,
    /// Side of the square marking each plane origin, in pixels
    pub marker_size: u32,
}

impl Default for FramebufferConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            marker_size: 5,
        }
    }
}

impl FramebufferConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_marker_size(mut self, marker_size: u32) -> Self {
        self.marker_size = marker_size;
        self
    }
}

/// Software RGBA framebuffer: clears to the background colour and marks the
/// projected origin of every plane.
#[derive(Debug, Clone)]
pub struct FramebufferPipeline {
    config: FramebufferConfig,
    pixels: Vec<u8>,
}

impl FramebufferPipeline {
    pub fn new(config: FramebufferConfig) -> Self {
        let pixels = vec![0; config.width as usize * config.height as usize * 4];
        Self { config, pixels }
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// RGBA pixel at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.config.width || y >= self.config.height {
            return None;
        }
        let i = (y as usize * self.config.width as usize + x as usize) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    fn fill_rect(&mut self, cx: i64, cy: i64, half: i64, color: [u8; 4]) {
        let (w, h) = (self.config.width as i64, self.config.height as i64);
        for y in (cy - half).max(0)..(cy + half + 1).min(h) {
            for x in (cx - half).max(0)..(cx + half + 1).min(w) {
                let i = ((y * w + x) * 4) as usize;
                self.pixels[i..i + 4].copy_from_slice(&color);
            }
        }
    }

    fn project(frame: &FrameState, point: &Point3<Real>, width: u32, height: u32) -> Option<(i64, i64)> {
        let clip = frame.camera.projection_matrix()
            * frame.camera.view_matrix()
            * Vector4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        // Far off screen, or too close to the eye plane to place a marker.
        if !(ndc_x.abs() <= MAX_MARKER_NDC && ndc_y.abs() <= MAX_MARKER_NDC) {
            return None;
        }
        let x = (ndc_x + 1.0) * 0.5 * width as Real;
        let y = (1.0 - ndc_y) * 0.5 * height as Real;
        Some((x.floor() as i64, y.floor() as i64))
    }
}

impl Default for FramebufferPipeline {
    fn default() -> Self {
        Self::new(FramebufferConfig::default())
    }
}

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl RenderPipeline for FramebufferPipeline {
    fn draw(&mut self, frame: &FrameState) -> Result<()> {
        let [r, g, b] = frame.display.background;
        let background = [to_byte(r), to_byte(g), to_byte(b), 255];
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&background);
        }

        let (width, height) = (self.config.width, self.config.height);
        let half = (self.config.marker_size / 2) as i64;
        for (index, plane) in frame.planes.iter().enumerate() {
            let color = if frame.manipulated == Some(index) {
                [255, 255, 0, 255]
            } else if plane.active {
                [255, 255, 255, 255]
            } else {
                [128, 128, 128, 255]
            };
            if let Some((x, y)) = Self::project(frame, &plane.pose.position, width, height) {
                self.fill_rect(x, y, half, color);
            }
        }
        Ok(())
    }

    fn capture_frame(&mut self, path: &Path) -> io::Result<()> {
        image::save_buffer(path, &self.pixels, self.config.width, self.config.height, ColorType::Rgba8).map_err(
            |e| match e {
                image::ImageError::IoError(e) => e,
                other => io::Error::new(io::ErrorKind::Other, other.to_string()),
            },
        )
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
        self.pixels = vec![0; width as usize * height as usize * 4];
    }
}
