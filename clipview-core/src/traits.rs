//! Core traits for clipview

use crate::error::Result;
use crate::pose::Real;

/// The scene/document object the viewer is attached to.
///
/// The document owns the viewer-state slots (so saved views live as long as
/// the document, not the viewer) and knows the scene's characteristic size.
pub trait SceneDocument: Send {
    /// Number of viewer-state slots
    fn slot_count(&self) -> usize;

    /// Serialized viewer state in a slot, if one was stored
    fn slot(&self, index: usize) -> Option<&str>;

    /// Store serialized viewer state in a slot
    fn store_slot(&mut self, index: usize, data: String) -> Result<()>;

    /// Radius of the scene, used to scale wheel and drag distances
    fn scene_radius(&self) -> Real;
}
