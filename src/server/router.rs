use super::connection::ConnectionError;
use super::protocol::{Request, Response};
use crate::frame::ActionProducer;
use crate::host::EmulatorHost;
use crate::memory::MemorySampler;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maps decoded requests onto the queue, the sampler and the host
///
/// Shared by all connection handlers of an instance. It holds only the
/// producing half of the pending action queue, so controller state can be
/// changed from here exclusively by enqueuing.
pub struct RequestRouter {
    producer: ActionProducer,
    sampler: MemorySampler,
    host: Arc<dyn EmulatorHost>,
}

impl RequestRouter {
    pub fn new(producer: ActionProducer, sampler: MemorySampler, host: Arc<dyn EmulatorHost>) -> Self {
        Self {
            producer,
            sampler,
            host,
        }
    }

    /// Decodes and dispatches one raw message
    ///
    /// Protocol faults become error envelopes; only handler-fatal faults are
    /// returned as errors.
    pub fn handle_message(&self, bytes: &[u8]) -> Result<Response, ConnectionError> {
        match Request::from_slice(bytes) {
            Ok(request) => self.dispatch(request),
            Err(e) => {
                warn!("Rejecting request: {}", e);
                Ok(Response::error(e.to_string()))
            }
        }
    }

    pub fn dispatch(&self, request: Request) -> Result<Response, ConnectionError> {
        info!("Action received : {}", request.action());

        match request {
            Request::SayHello => Ok(Response::hello()),

            Request::SetInputs { inputs } => match self.producer.enqueue(inputs) {
                Ok(depth) => {
                    debug!(
                        "Queued inputs for controller {} (queue depth {})",
                        inputs.id, depth
                    );
                    Ok(Response::ok())
                }
                Err(e) => Ok(Response::error(e.to_string())),
            },

            Request::LoadSaveStateFromSlot { slot_number } => {
                self.host
                    .load_save_state(slot_number)
                    .map_err(|source| ConnectionError::SaveState {
                        slot: slot_number,
                        source,
                    })?;
                info!("Loaded save state from slot {}", slot_number);
                Ok(Response::ok())
            }

            Request::GetWatchListValues => Ok(Response::values(self.sampler.sample())),

            Request::Reset => match self.host.reset() {
                Ok(()) => Ok(Response::ok()),
                Err(e) => {
                    warn!("Reset failed: {}", e);
                    Ok(Response::error(format!("Reset failed : {e}")))
                }
            },
        }
    }

    /// Depth of the pending action queue
    pub fn backlog(&self) -> usize {
        self.producer.depth()
    }
}
