//! Clip Plane Session Example
//!
//! Runs a scripted viewer session without a window. It shows how to:
//! - Start the render loop on its own thread
//! - Drive clipping planes and the bound group with input events
//! - Save and restore viewer state through document slots
//! - Take snapshots and wait for them to be written

use anyhow::Result;
use clap::Parser;
use clipview_io::InMemoryScene;
use clipview_visualization::{
    FramebufferConfig, FramebufferPipeline, InputEvent, InteractionConfig, Key, Modifiers, MouseButton, RenderLoop,
    Viewer, ViewerConfig,
};
use nalgebra::Point2;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "clip_plane_session", about = "Scripted clipping-plane session with snapshots")]
struct Args {
    /// Directory the snapshots are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Framebuffer width in pixels
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Framebuffer height in pixels
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Scene radius used to scale plane motion
    #[arg(long, default_value_t = 2.0)]
    radius: f64,

    /// Wheel sensitivity for plane translation
    #[arg(long, default_value_t = 1.0)]
    wheel_sensitivity: f64,
}

fn key(key: Key) -> InputEvent {
    InputEvent::key(key)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("clipview Clip Plane Session");
    println!("===========================");

    let config = ViewerConfig::default()
        .with_interaction(InteractionConfig::default().with_wheel_sensitivity(args.wheel_sensitivity));
    let (mut viewer, requests) = Viewer::new(InMemoryScene::with_radius(args.radius), config);
    let pipeline = FramebufferPipeline::new(FramebufferConfig::default().with_size(args.width, args.height));
    let render_thread = RenderLoop::new(viewer.shared(), requests, pipeline).spawn()?;
    viewer.render_handle().resize(args.width, args.height);

    // Bind planes 1 and 2, then move plane 1; plane 2 follows.
    viewer.handle_event(&InputEvent::key_with(Key::Digit(1), Modifiers::ALT))?;
    viewer.handle_event(&InputEvent::key_with(Key::Digit(2), Modifiers::ALT))?;
    println!("Bound planes:{}", viewer.bound_group_label());

    viewer.handle_event(&key(Key::Function(1)))?;
    viewer.handle_event(&key(Key::Space))?;
    viewer.handle_event(&key(Key::Char('x')))?;
    viewer.handle_event(&InputEvent::wheel(240.0))?;
    viewer.handle_event(&InputEvent::MousePress {
        button: MouseButton::Left,
        position: Point2::new(100.0, 100.0),
        modifiers: Modifiers::NONE,
    })?;
    viewer.handle_event(&InputEvent::MouseMove {
        position: Point2::new(130.0, 90.0),
    })?;
    viewer.handle_event(&InputEvent::MouseRelease { button: MouseButton::Left })?;
    viewer.handle_event(&InputEvent::MouseDoubleClick {
        button: MouseButton::Left,
        modifiers: Modifiers::NONE,
    })?;
    println!("Manipulating plane index {}", viewer.manipulated_clip_plane());
    viewer.handle_event(&key(Key::Escape))?;

    let ticket = viewer.request_snapshot(args.output_dir.join("clip_planes.png"));
    let written = viewer.wait_for_snapshot(&ticket)?;
    println!("Snapshot written to {}", written.display());

    // Save to slot 1, disturb the view, restore it.
    viewer.handle_event(&InputEvent::key_with(Key::Digit(1), Modifiers::CTRL))?;
    viewer.handle_event(&key(Key::Function(1)))?;
    viewer.handle_event(&key(Key::Char('r')))?;
    viewer.handle_event(&key(Key::Escape))?;
    viewer.handle_event(&key(Key::Char('g')))?;
    viewer.handle_event(&key(Key::Digit(1)))?;

    let ticket = viewer.request_snapshot(args.output_dir.join("restored.png"));
    let written = viewer.wait_for_snapshot(&ticket)?;
    println!("Snapshot written to {}", written.display());

    let state = viewer.state_element("viewer_state");
    println!("Viewer state:\n{}", state.to_json()?);

    drop(viewer);
    if render_thread.join().is_err() {
        anyhow::bail!("render thread panicked");
    }

    println!("Session complete.");
    Ok(())
}
