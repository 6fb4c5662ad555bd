use super::inputs::{ControllerInputs, ControllerSlot, InvalidSlot, CONTROLLER_SLOTS};
use tracing::debug;

/// Current state of all four controller ports
///
/// Owned by the frame applier. Network handlers never touch it directly; their
/// updates arrive through the pending action queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerStateStore {
    slots: [ControllerInputs; CONTROLLER_SLOTS],
}

impl Default for ControllerStateStore {
    fn default() -> Self {
        Self {
            slots: ControllerSlot::ALL.map(ControllerInputs::neutral),
        }
    }
}

impl ControllerStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole state of the port named by `inputs.id`
    pub fn replace(&mut self, inputs: ControllerInputs) -> Result<ControllerSlot, InvalidSlot> {
        let slot = inputs.slot()?;
        debug!("Replacing state of controller {}", slot);
        self.slots[slot.index()] = inputs;
        Ok(slot)
    }

    pub fn get(&self, slot: ControllerSlot) -> &ControllerInputs {
        &self.slots[slot.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ControllerSlot, &ControllerInputs)> {
        ControllerSlot::ALL.into_iter().zip(self.slots.iter())
    }

    pub fn slots(&self) -> &[ControllerInputs; CONTROLLER_SLOTS] {
        &self.slots
    }
}

/// Read-only view of the store published after every frame
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSnapshot {
    /// Frame number the state was pushed on (0 before the first frame)
    pub frame: u64,
    pub slots: [ControllerInputs; CONTROLLER_SLOTS],
    /// Updates still waiting in the queue after this frame
    pub backlog: usize,
}

impl Default for ControllerSnapshot {
    fn default() -> Self {
        Self {
            frame: 0,
            slots: *ControllerStateStore::default().slots(),
            backlog: 0,
        }
    }
}

impl ControllerSnapshot {
    pub fn slot(&self, slot: ControllerSlot) -> &ControllerInputs {
        &self.slots[slot.index()]
    }
}
