//! Boundary to the emulator
//!
//! The server never owns the emulator; it only calls the primitives the host
//! exposes from inside its scripting hook. [`EmulatorHost`] is that surface.
//! Frame boundaries are delivered separately through
//! [`FrameClock`](crate::frame::FrameClock).
//!
//! [`simulated::SimulatedHost`] is an in-process stand-in used by the binary
//! and the tests.

pub mod simulated;

pub use simulated::SimulatedHost;

use crate::controller::{ControllerInputs, ControllerSlot};

/// Errors raised by emulator primitives
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// Read or write outside of emulated memory
    #[error("address {address:#010x} is not mapped")]
    UnmappedAddress { address: u32 },

    /// Save-state load from a slot that holds nothing
    #[error("save state slot {0} is empty")]
    EmptySaveSlot(u8),

    /// Emulator refused the call (not booted, shutting down, ...)
    #[error("emulator unavailable: {0}")]
    Unavailable(String),
}

/// Primitives provided by the emulator's scripting environment
///
/// Implementations must be callable from both the frame task and connection
/// tasks; reads happen on connection tasks while controller pushes happen on
/// the frame task.
pub trait EmulatorHost: Send + Sync {
    fn read_u8(&self, address: u32) -> Result<u8, HostError>;

    fn read_u16(&self, address: u32) -> Result<u16, HostError>;

    fn read_u32(&self, address: u32) -> Result<u32, HostError>;

    fn read_f32(&self, address: u32) -> Result<f32, HostError>;

    /// Pushes the full state of one controller port for the current frame
    fn set_controller(
        &self,
        slot: ControllerSlot,
        inputs: &ControllerInputs,
    ) -> Result<(), HostError>;

    /// Loads a save state synchronously; returns once the load finished
    fn load_save_state(&self, slot: u8) -> Result<(), HostError>;

    fn reset(&self) -> Result<(), HostError>;
}
