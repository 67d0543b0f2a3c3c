//! Viewer-state slots on a scene document

use clipview_core::{Error, Real, Result, SceneDocument};

use crate::viewer_state::ViewerState;

/// Slot count of a freshly created in-memory scene (digit keys 0-9)
pub const DEFAULT_SLOT_COUNT: usize = 10;

/// Scene document that keeps its slots in memory
#[derive(Debug, Clone)]
pub struct InMemoryScene {
    radius: Real,
    slots: Vec<Option<String>>,
}

impl InMemoryScene {
    /// Create a scene with `slot_count` empty slots
    pub fn new(radius: Real, slot_count: usize) -> Self {
        Self {
            radius,
            slots: vec![None; slot_count],
        }
    }

    /// Create a scene with the default number of slots
    pub fn with_radius(radius: Real) -> Self {
        Self::new(radius, DEFAULT_SLOT_COUNT)
    }

    /// Change the scene radius, e.g. after the simulation grew
    pub fn set_radius(&mut self, radius: Real) {
        self.radius = radius;
    }
}

impl Default for InMemoryScene {
    fn default() -> Self {
        Self::with_radius(1.0)
    }
}

impl SceneDocument for InMemoryScene {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, index: usize) -> Option<&str> {
        self.slots.get(index).and_then(|s| s.as_deref())
    }

    fn store_slot(&mut self, index: usize, data: String) -> Result<()> {
        let count = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(Error::SlotOutOfRange { index, count })?;
        *slot = Some(data);
        Ok(())
    }

    fn scene_radius(&self) -> Real {
        self.radius
    }
}

/// Serialize `state` into slot `index` of the document
pub fn save_to_slot<D: SceneDocument + ?Sized>(document: &mut D, index: usize, state: &ViewerState) -> Result<()> {
    let count = document.slot_count();
    if index >= count {
        return Err(Error::SlotOutOfRange { index, count });
    }
    document.store_slot(index, state.to_slot_string()?)?;
    log::info!("Saved viewer state to slot {}", index);
    Ok(())
}

/// Read and fully validate the state stored in slot `index`
pub fn load_from_slot<D: SceneDocument + ?Sized>(document: &D, index: usize) -> Result<ViewerState> {
    let count = document.slot_count();
    if index >= count {
        return Err(Error::SlotOutOfRange { index, count });
    }
    let data = document.slot(index).ok_or(Error::EmptySlot(index))?;
    let state = ViewerState::from_slot_string(data)?;
    log::info!("Loaded viewer state from slot {}", index);
    Ok(state)
}
