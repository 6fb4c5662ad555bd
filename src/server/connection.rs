use super::router::RequestRouter;
use crate::host::HostError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Faults that end one connection handler; other connections are unaffected
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to load save state from slot {slot}: {source}")]
    SaveState {
        slot: u8,
        #[source]
        source: HostError,
    },
}

/// Serves one connection until the peer closes it
///
/// Each request must arrive in a single read of at most `chunk_size` bytes.
/// Exactly one response is written per request before the next read.
pub async fn serve_connection<S>(
    mut stream: S,
    router: &RequestRouter,
    chunk_size: usize,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; chunk_size.max(1)];
    loop {
        let read = stream.read(&mut buffer).await?;
        if read == 0 {
            debug!("Peer closed the connection");
            return Ok(());
        }

        let response = router.handle_message(&buffer[..read])?;
        stream.write_all(&response.to_bytes()?).await?;
        stream.flush().await?;
    }
}
