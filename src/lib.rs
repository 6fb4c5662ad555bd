//! Frame-synchronized control of emulator instances over TCP
//!
//! A server runs beside each emulator instance. Clients send JSON requests
//! to sample watched memory, load save states, reset, or queue controller
//! state. Queued controller state is applied one update per frame by the
//! frame applier, the only writer of the controller store.

pub mod client;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod frame;
pub mod host;
pub mod memory;
pub mod server;

pub use client::{ClientError, InstanceClient};
pub use config::ServerConfig;
pub use controller::{ControllerInputs, ControllerSlot, ControllerSnapshot};
pub use host::{EmulatorHost, HostError, SimulatedHost};
pub use server::{Instance, ServerError};
