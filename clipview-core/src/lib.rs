//! Core data structures and traits for clipview
//!
//! This crate provides the value types shared by the viewer: rigid poses,
//! orientation snapping, the clipping-plane registry with its bound group,
//! renderer display options and the scene-document collaborator trait.

pub mod pose;
pub mod orientation;
pub mod clip_plane;
pub mod bound_group;
pub mod display;
pub mod traits;
pub mod error;

pub use pose::*;
pub use clip_plane::*;
pub use bound_group::*;
pub use display::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Isometry3, UnitQuaternion};
