//! Client side of the control protocol
//!
//! [`InstanceClient`] addresses one running instance. Every call opens a
//! fresh connection, sends one request, reads one response and closes the
//! connection again. There is no retry and no timeout.

use crate::config::DEFAULT_READ_CHUNK_SIZE;
use crate::controller::ControllerInputs;
use crate::discovery::{self, DiscoveryError, ServerAddressRecord};
use crate::memory::MemorySample;
use crate::server::{Request, Response};
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("connection closed before a response arrived")]
    ConnectionClosed,

    #[error("server answered with an error: {0}")]
    Server(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceClient {
    host: String,
    port: u16,
}

impl InstanceClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn from_record(record: &ServerAddressRecord) -> Self {
        Self::new(record.host.clone(), record.port)
    }

    /// Points later calls at another instance
    pub fn set_target(&mut self, host: impl Into<String>, port: u16) {
        self.host = host.into();
        self.port = port;
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub async fn say_hello(&self) -> Result<String, ClientError> {
        let response = self.send_request(&Request::SayHello).await?;
        Ok(response.message.unwrap_or_default())
    }

    pub async fn reset(&self) -> Result<(), ClientError> {
        self.send_request(&Request::Reset).await?;
        Ok(())
    }

    pub async fn get_watch_list_values(&self) -> Result<MemorySample, ClientError> {
        let response = self.send_request(&Request::GetWatchListValues).await?;
        Ok(response.values.unwrap_or_default())
    }

    pub async fn load_save_state_from_slot(&self, slot_number: u8) -> Result<(), ClientError> {
        self.send_request(&Request::LoadSaveStateFromSlot { slot_number })
            .await?;
        Ok(())
    }

    /// Sends the full controller state; it takes effect at a later frame
    pub async fn send_inputs(&self, inputs: &ControllerInputs) -> Result<(), ClientError> {
        self.send_request(&Request::SetInputs { inputs: *inputs })
            .await?;
        Ok(())
    }

    /// One request/response round trip on a fresh connection
    ///
    /// Error envelopes come back as [`ClientError::Server`].
    pub async fn send_request(&self, request: &Request) -> Result<Response, ClientError> {
        let addr = self.addr();
        let mut stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| ClientError::Connect {
                addr: addr.clone(),
                source,
            })?;
        debug!("Sending {} to {}", request.action(), addr);

        let payload = serde_json::to_vec(request).map_err(ClientError::Encode)?;
        stream.write_all(&payload).await?;
        stream.flush().await?;

        let response = read_response(&mut stream).await?;
        response.into_result().map_err(ClientError::Server)
    }
}

/// Reads until the buffered bytes form one complete JSON value
async fn read_response(stream: &mut TcpStream) -> Result<Response, ClientError> {
    let mut received = Vec::new();
    let mut chunk = vec![0u8; DEFAULT_READ_CHUNK_SIZE];
    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Err(ClientError::ConnectionClosed);
        }
        received.extend_from_slice(&chunk[..read]);

        match serde_json::from_slice::<Response>(&received) {
            Ok(response) => return Ok(response),
            Err(e) if e.is_eof() => continue,
            Err(e) => return Err(ClientError::Decode(e)),
        }
    }
}

/// Clients for every instance listed in a discovery file, in file order
pub async fn discover(path: &Path) -> Result<Vec<InstanceClient>, DiscoveryError> {
    let records = discovery::read_records(path).await?;
    info!("Discovered {} instance(s) in {}", records.len(), path.display());
    Ok(records.iter().map(InstanceClient::from_record).collect())
}
