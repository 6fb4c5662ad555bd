//! Per-instance server
//!
//! - [`protocol`] - JSON request/response types
//! - [`router`] - dispatch of decoded requests
//! - [`connection`] - per-connection read/respond loop
//! - [`instance`] - listener, frame task and their shared state

pub mod connection;
pub mod instance;
pub mod protocol;
pub mod router;

pub use connection::{serve_connection, ConnectionError};
pub use instance::Instance;
pub use protocol::{ProtocolError, Request, Response, Status};
pub use router::RequestRouter;

use crate::discovery::DiscoveryError;
use crate::frame::FrameError;

/// Faults that stop an instance
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind listener on {host}: {source}")]
    Bind {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to publish server address: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("frame loop failed: {0}")]
    Frame(#[from] FrameError),

    #[error("frame task aborted: {0}")]
    FrameTask(#[from] tokio::task::JoinError),
}
