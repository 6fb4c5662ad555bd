//! Controller state for the four emulated ports
//!
//! - [`inputs`] - the wire-level [`ControllerInputs`] structure and port index
//! - [`store`] - the frame-domain store and the snapshot it publishes
//!
//! # Ownership
//!
//! ```text
//! Connection ──[ControllerInputs]──► Pending queue ──► Frame applier ──► Store
//!                                                           │
//!                                                           ▼
//!                                               watch::Receiver<ControllerSnapshot>
//! ```

pub mod inputs;
pub mod store;

pub use inputs::{
    ControllerInputs, ControllerSlot, InvalidSlot, CONTROLLER_SLOTS, STICK_CENTER, TRIGGER_REST,
};
pub use store::{ControllerSnapshot, ControllerStateStore};
