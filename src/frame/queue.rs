//! Pending action queue
//!
//! Unbounded FIFO between connection handlers (any number of producers) and
//! the frame applier (single consumer). Depth is tracked so the applier can
//! report how far behind submission it is running.

use crate::controller::ControllerInputs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("pending action queue is closed")]
    Closed,
}

pub fn pending_action_queue() -> (ActionProducer, ActionConsumer) {
    let (tx, rx) = mpsc::unbounded_channel();
    let depth = Arc::new(AtomicUsize::new(0));
    (
        ActionProducer {
            tx,
            depth: depth.clone(),
        },
        ActionConsumer { rx, depth },
    )
}

/// Enqueuing side, cloned into every connection handler
#[derive(Clone, Debug)]
pub struct ActionProducer {
    tx: mpsc::UnboundedSender<ControllerInputs>,
    depth: Arc<AtomicUsize>,
}

impl ActionProducer {
    /// Appends a full controller update; returns the queue depth including it
    pub fn enqueue(&self, inputs: ControllerInputs) -> Result<usize, QueueError> {
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        if self.tx.send(inputs).is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            warn!("Dropping controller update, frame applier is gone");
            return Err(QueueError::Closed);
        }
        Ok(depth)
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

/// Dequeuing side, owned by the frame applier
#[derive(Debug)]
pub struct ActionConsumer {
    rx: mpsc::UnboundedReceiver<ControllerInputs>,
    depth: Arc<AtomicUsize>,
}

impl ActionConsumer {
    /// Pops the oldest update without waiting
    pub fn try_dequeue(&mut self) -> Option<ControllerInputs> {
        match self.rx.try_recv() {
            Ok(inputs) => {
                self.depth.fetch_sub(1, Ordering::SeqCst);
                Some(inputs)
            }
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => None,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}
