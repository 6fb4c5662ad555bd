//! One emulator instance's server
//!
//! [`Instance`] owns everything that lives for the whole process: the watch
//! list, the pending action queue, the controller store (inside the frame
//! applier) and the listening socket. Nothing is global, so several instances
//! can run side by side in one process.
//!
//! # Tasks
//!
//! ```text
//!             ┌──────────────► connection task ─┐
//! listener ───┼──────────────► connection task ─┼──[ControllerInputs]──► queue
//!             └──────────────► connection task ─┘                          │
//!                                                                          ▼
//! FrameClock ─────────────────────────────────────────────────────► frame task ──► EmulatorHost
//! ```

use super::connection::serve_connection;
use super::router::RequestRouter;
use super::ServerError;
use crate::config::ServerConfig;
use crate::controller::ControllerSnapshot;
use crate::discovery::{self, ServerAddressRecord};
use crate::frame::applier::AwaitFrame;
use crate::frame::{pending_action_queue, run_frame_loop, FrameApplier, FrameClock};
use crate::host::EmulatorHost;
use crate::memory::{MemorySampler, WatchList};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub struct Instance {
    config: ServerConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Arc<RequestRouter>,
    applier: FrameApplier<AwaitFrame>,
    watch_list: Arc<WatchList>,
}

impl Instance {
    /// Loads the watch list, binds the listener and wires up the queue
    ///
    /// A missing or empty watch list is not an error; the instance then
    /// answers every sample request with an empty map.
    pub async fn bind(
        config: ServerConfig,
        host: Arc<dyn EmulatorHost>,
    ) -> Result<Self, ServerError> {
        info!("Initializing instance with config: {:?}", config);

        let watch_list = Arc::new(WatchList::load_or_empty(&config.watch_list_path).await);

        let listener = bind_listener(&config.host, &config.candidate_ports).await?;
        let local_addr = listener.local_addr()?;
        info!("Listening on {}", local_addr);

        let (producer, consumer) = pending_action_queue();
        let applier = FrameApplier::create(consumer, host.clone());
        let sampler = MemorySampler::new(watch_list.clone(), host.clone());
        let router = Arc::new(RequestRouter::new(producer, sampler, host));

        Ok(Self {
            config,
            listener,
            local_addr,
            router,
            applier,
            watch_list,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn address_record(&self) -> ServerAddressRecord {
        ServerAddressRecord::from(self.local_addr)
    }

    /// Controller state as applied by the frame task, updated every frame
    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.applier.subscribe()
    }

    pub fn watch_list(&self) -> &WatchList {
        &self.watch_list
    }

    /// Publishes the address, then serves connections and frames
    ///
    /// Returns when the frame clock ends, or with the error that stopped the
    /// frame task. Connection failures are logged and never end the instance.
    pub async fn run<C>(self, clock: C) -> Result<(), ServerError>
    where
        C: FrameClock + 'static,
    {
        if let Some(path) = &self.config.discovery_file {
            discovery::publish(path, &self.address_record()).await?;
        }

        let mut frame_task = tokio::spawn(run_frame_loop(self.applier, clock));
        let chunk_size = self.config.read_chunk_size;
        info!("Serving on {}", self.local_addr);

        loop {
            tokio::select! {
                joined = &mut frame_task => {
                    return match joined {
                        Ok(Ok(())) => {
                            info!("Frame task finished, shutting down instance");
                            Ok(())
                        }
                        Ok(Err(e)) => {
                            error!("Frame task failed: {}", e);
                            Err(e.into())
                        }
                        Err(e) => Err(ServerError::FrameTask(e)),
                    };
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!("Accepted connection from {}", peer);
                        let router = self.router.clone();
                        tokio::spawn(async move {
                            match serve_connection(stream, &router, chunk_size).await {
                                Ok(()) => debug!("Connection from {} closed", peer),
                                Err(e) => warn!("Connection from {} aborted: {}", peer, e),
                            }
                        });
                    }
                    Err(e) => warn!("Failed to accept connection: {}", e),
                },
            }
        }
    }
}

/// Binds the first free candidate port, or an ephemeral one
async fn bind_listener(host: &str, candidate_ports: &[u16]) -> Result<TcpListener, ServerError> {
    for port in candidate_ports {
        match TcpListener::bind((host, *port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => debug!("Port {} unavailable: {}", port, e),
        }
    }
    if !candidate_ports.is_empty() {
        warn!("No candidate port is free, falling back to an ephemeral port");
    }

    TcpListener::bind((host, 0))
        .await
        .map_err(|source| ServerError::Bind {
            host: host.to_string(),
            source,
        })
}
