//! Discovery file shared with the launcher
//!
//! Every instance appends one `host,port` line once its listener is bound.
//! The launcher clears the file before spawning a batch and reads it back
//! after a settle period.
//!
//! Line order follows the order in which instances reached the bind step,
//! which is not necessarily the order in which they were spawned.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Published address of one instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerAddressRecord {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("discovery file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed discovery line {line_number}: '{line}'")]
    MalformedLine { line_number: usize, line: String },
}

impl From<SocketAddr> for ServerAddressRecord {
    fn from(addr: SocketAddr) -> Self {
        Self {
            host: addr.ip().to_string(),
            port: addr.port(),
        }
    }
}

impl fmt::Display for ServerAddressRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.host, self.port)
    }
}

impl ServerAddressRecord {
    /// Parses a `host,port` line
    pub fn parse_line(line: &str) -> Option<Self> {
        let (host, port) = line.trim().rsplit_once(',')?;
        let host = host.trim();
        if host.is_empty() {
            return None;
        }
        Some(Self {
            host: host.to_string(),
            port: port.trim().parse().ok()?,
        })
    }
}

/// Appends the record as one line
pub async fn publish(path: &Path, record: &ServerAddressRecord) -> Result<(), DiscoveryError> {
    let io_err = |source| DiscoveryError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(io_err)?;
    file.write_all(format!("{record}\n").as_bytes())
        .await
        .map_err(io_err)?;
    file.flush().await.map_err(io_err)?;
    info!("Published {} to {}", record, path.display());
    Ok(())
}

/// Truncates the file before a new launch batch
pub async fn clear(path: &Path) -> Result<(), DiscoveryError> {
    tokio::fs::write(path, b"")
        .await
        .map_err(|source| DiscoveryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Cleared discovery file {}", path.display());
    Ok(())
}

/// Reads every published record in file order, skipping blank lines
pub async fn read_records(path: &Path) -> Result<Vec<ServerAddressRecord>, DiscoveryError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DiscoveryError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            ServerAddressRecord::parse_line(line).ok_or_else(|| DiscoveryError::MalformedLine {
                line_number: index + 1,
                line: line.to_string(),
            })
        })
        .collect()
}
