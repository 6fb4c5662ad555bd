use super::{EmulatorHost, HostError};
use crate::controller::{ControllerInputs, ControllerSlot, CONTROLLER_SLOTS};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info};

/// Start of main RAM on a GameCube
pub const DEFAULT_BASE_ADDRESS: u32 = 0x8000_0000;

/// 24 MiB of main RAM
pub const DEFAULT_MEMORY_SIZE: usize = 24 * 1024 * 1024;

struct SimulatedState {
    memory: Vec<u8>,
    controllers: [ControllerInputs; CONTROLLER_SLOTS],
    save_slots: HashMap<u8, Vec<u8>>,
    controller_pushes: u64,
}

/// In-process emulator stand-in
///
/// Big-endian memory window starting at `base`, save-state slots holding
/// memory copies, and a record of the last state pushed to each port.
pub struct SimulatedHost {
    base: u32,
    state: Mutex<SimulatedState>,
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_ADDRESS, DEFAULT_MEMORY_SIZE)
    }
}

impl SimulatedHost {
    pub fn new(base: u32, memory_size: usize) -> Self {
        info!(
            "Creating simulated host with {} bytes at {:#010x}",
            memory_size, base
        );
        Self {
            base,
            state: Mutex::new(SimulatedState {
                memory: vec![0; memory_size],
                controllers: ControllerSlot::ALL.map(ControllerInputs::neutral),
                save_slots: HashMap::new(),
                controller_pushes: 0,
            }),
        }
    }

    fn offset(&self, address: u32, len: usize, memory_len: usize) -> Result<usize, HostError> {
        let offset = address
            .checked_sub(self.base)
            .map(|o| o as usize)
            .ok_or(HostError::UnmappedAddress { address })?;
        match offset.checked_add(len) {
            Some(end) if end <= memory_len => Ok(offset),
            _ => Err(HostError::UnmappedAddress { address }),
        }
    }

    fn read_bytes<const N: usize>(&self, address: u32) -> Result<[u8; N], HostError> {
        let state = self.state.lock();
        let offset = self.offset(address, N, state.memory.len())?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&state.memory[offset..offset + N]);
        Ok(bytes)
    }

    fn write_bytes(&self, address: u32, bytes: &[u8]) -> Result<(), HostError> {
        let mut state = self.state.lock();
        let offset = self.offset(address, bytes.len(), state.memory.len())?;
        state.memory[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    pub fn write_u8(&self, address: u32, value: u8) -> Result<(), HostError> {
        self.write_bytes(address, &[value])
    }

    pub fn write_u16(&self, address: u32, value: u16) -> Result<(), HostError> {
        self.write_bytes(address, &value.to_be_bytes())
    }

    pub fn write_u32(&self, address: u32, value: u32) -> Result<(), HostError> {
        self.write_bytes(address, &value.to_be_bytes())
    }

    pub fn write_f32(&self, address: u32, value: f32) -> Result<(), HostError> {
        self.write_bytes(address, &value.to_be_bytes())
    }

    /// Stores a copy of current memory in a save-state slot
    pub fn save_to_slot(&self, slot: u8) {
        let mut state = self.state.lock();
        let copy = state.memory.clone();
        state.save_slots.insert(slot, copy);
        debug!("Saved simulated memory to slot {}", slot);
    }

    /// Last state pushed to a port
    pub fn controller(&self, slot: ControllerSlot) -> ControllerInputs {
        self.state.lock().controllers[slot.index()]
    }

    /// Total number of per-port pushes received so far
    pub fn controller_pushes(&self) -> u64 {
        self.state.lock().controller_pushes
    }
}

impl EmulatorHost for SimulatedHost {
    fn read_u8(&self, address: u32) -> Result<u8, HostError> {
        self.read_bytes::<1>(address).map(|[b]| b)
    }

    fn read_u16(&self, address: u32) -> Result<u16, HostError> {
        self.read_bytes(address).map(u16::from_be_bytes)
    }

    fn read_u32(&self, address: u32) -> Result<u32, HostError> {
        self.read_bytes(address).map(u32::from_be_bytes)
    }

    fn read_f32(&self, address: u32) -> Result<f32, HostError> {
        self.read_bytes(address).map(f32::from_be_bytes)
    }

    fn set_controller(
        &self,
        slot: ControllerSlot,
        inputs: &ControllerInputs,
    ) -> Result<(), HostError> {
        let mut state = self.state.lock();
        state.controllers[slot.index()] = *inputs;
        state.controller_pushes += 1;
        Ok(())
    }

    fn load_save_state(&self, slot: u8) -> Result<(), HostError> {
        let mut state = self.state.lock();
        let saved = state
            .save_slots
            .get(&slot)
            .cloned()
            .ok_or(HostError::EmptySaveSlot(slot))?;
        state.memory = saved;
        info!("Loaded simulated save state from slot {}", slot);
        Ok(())
    }

    fn reset(&self) -> Result<(), HostError> {
        let mut state = self.state.lock();
        state.memory.fill(0);
        state.controllers = ControllerSlot::ALL.map(ControllerInputs::neutral);
        info!("Simulated host reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u32 = 0x8000_0000;

    #[test]
    fn reads_are_big_endian() {
        let host = SimulatedHost::new(BASE, 64);
        host.write_u32(BASE + 4, 0x1234_5678).unwrap();
        assert_eq!(host.read_u8(BASE + 4).unwrap(), 0x12);
        assert_eq!(host.read_u16(BASE + 4).unwrap(), 0x1234);
        assert_eq!(host.read_u32(BASE + 4).unwrap(), 0x1234_5678);

        host.write_f32(BASE + 8, 1.5).unwrap();
        assert_eq!(host.read_f32(BASE + 8).unwrap(), 1.5);
    }

    #[test]
    fn reads_outside_the_window_fault() {
        let host = SimulatedHost::new(BASE, 16);
        assert_eq!(
            host.read_u8(BASE - 1),
            Err(HostError::UnmappedAddress { address: BASE - 1 })
        );
        // last two bytes are mapped, a 4 byte read starting there is not
        assert!(host.read_u16(BASE + 14).is_ok());
        assert!(host.read_u32(BASE + 14).is_err());
        assert!(host.read_u32(u32::MAX).is_err());
    }

    #[test]
    fn save_states_restore_memory() {
        let host = SimulatedHost::new(BASE, 16);
        host.write_u8(BASE, 7).unwrap();
        host.save_to_slot(1);
        host.write_u8(BASE, 9).unwrap();

        assert_eq!(host.load_save_state(2), Err(HostError::EmptySaveSlot(2)));
        host.load_save_state(1).unwrap();
        assert_eq!(host.read_u8(BASE).unwrap(), 7);
    }

    #[test]
    fn reset_clears_memory_and_controllers() {
        let host = SimulatedHost::new(BASE, 16);
        let slot = ControllerSlot::ALL[1];
        let pressed = ControllerInputs {
            id: 1,
            start: true,
            ..Default::default()
        };
        host.write_u8(BASE, 3).unwrap();
        host.set_controller(slot, &pressed).unwrap();
        assert_eq!(host.controller(slot), pressed);

        host.reset().unwrap();
        assert_eq!(host.read_u8(BASE).unwrap(), 0);
        assert_eq!(host.controller(slot), ControllerInputs::neutral(slot));
    }
}
