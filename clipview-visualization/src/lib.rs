//! Interactive viewport control for clipview
//!
//! This crate turns input events into camera and clipping-plane motion and
//! coordinates the render thread:
//! - Camera with orbit, pan and zoom
//! - Input events and winit translation
//! - Camera and frame binding tables
//! - Clipping-plane interaction state machine
//! - Viewer controller with viewer-state slots
//! - Render loop with snapshot requests and a headless framebuffer

pub mod camera;
pub mod input;
pub mod bindings;
pub mod interaction;
pub mod renderer;
pub mod viewer;

pub use camera::*;
pub use input::*;
pub use bindings::*;
pub use interaction::*;
pub use renderer::*;
pub use viewer::*;
