//! Viewer-state persistence
//!
//! This crate saves and restores the viewer configuration (camera, clipping
//! planes, bound group, display options) in two equivalent forms:
//! - a structured [`Element`] tree for embedding in an external document
//! - a JSON string stored in one of the scene document's viewer-state slots

pub mod element;
pub mod viewer_state;
pub mod slots;

pub use element::{Element, Value};
pub use viewer_state::*;
pub use slots::*;

#[cfg(test)]
mod tests;
