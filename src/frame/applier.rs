//! Frame-synchronized applier with statum state machine
//!
//! Runs inside the frame domain and is the only writer of the controller
//! store. One cycle per emulator frame:
//!
//! ```text
//! AwaitFrame ──► DequeueOrHold ──► Apply ──► AwaitFrame
//!  (clock)        (pop ≤ 1)      (push 4 ports)
//! ```
//!
//! At most one queued update is consumed per frame. When producers outrun the
//! frame rate the backlog grows; updates are delayed, never reordered or
//! dropped. All four ports are pushed every frame whether or not an update was
//! popped.

use crate::controller::{ControllerInputs, ControllerSlot, ControllerSnapshot, ControllerStateStore};
use crate::frame::clock::FrameClock;
use crate::frame::queue::ActionConsumer;
use crate::host::{EmulatorHost, HostError};
use statum::{machine, state};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Errors in the frame domain; all of them are fatal to the instance
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("failed to push controller {slot} state on frame {frame}: {source}")]
    PushFailed {
        slot: ControllerSlot,
        frame: u64,
        #[source]
        source: HostError,
    },
}

/// Frame boundary signalled by the clock
#[derive(Debug, Clone, Copy)]
pub struct FrameTick {
    pub frame: u64,
}

/// Work decided for the current frame
#[derive(Debug, Clone)]
pub struct FramePlan {
    pub frame: u64,
    pub update: Option<ControllerInputs>,
}

#[state]
#[derive(Debug, Clone)]
pub enum ApplierState {
    AwaitFrame,
    DequeueOrHold(FrameTick),
    Apply(FramePlan),
}

#[machine]
pub struct FrameApplier<S: ApplierState> {
    // Updates from connection handlers
    consumer: ActionConsumer,

    // Current state of the four ports, frame domain only
    store: ControllerStateStore,

    host: Arc<dyn EmulatorHost>,

    // Snapshot published after every applied frame
    snapshot_sender: watch::Sender<ControllerSnapshot>,
}

impl<S: ApplierState> FrameApplier<S> {
    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.snapshot_sender.subscribe()
    }

    pub fn store(&self) -> &ControllerStateStore {
        &self.store
    }
}

impl FrameApplier<AwaitFrame> {
    pub fn create(consumer: ActionConsumer, host: Arc<dyn EmulatorHost>) -> Self {
        let (snapshot_sender, _) = watch::channel(ControllerSnapshot::default());
        debug!("Created frame applier with neutral controller state");
        Self::new(consumer, ControllerStateStore::new(), host, snapshot_sender)
    }

    /// Suspends until the next frame boundary; `None` when the clock ended
    pub async fn await_frame<C: FrameClock>(
        self,
        clock: &mut C,
    ) -> Option<FrameApplier<DequeueOrHold>> {
        let frame = clock.next_frame().await?;
        Some(self.on_frame(frame))
    }

    /// Enters the frame cycle for a boundary signalled by the host
    pub fn on_frame(self, frame: u64) -> FrameApplier<DequeueOrHold> {
        self.transition_with(FrameTick { frame })
    }

    /// Whole frame body: pop at most one update, then push all ports
    pub fn tick(self, frame: u64) -> Result<FrameApplier<AwaitFrame>, FrameError> {
        self.on_frame(frame).dequeue_or_hold().apply()
    }
}

impl FrameApplier<DequeueOrHold> {
    pub fn dequeue_or_hold(mut self) -> FrameApplier<Apply> {
        let frame = self.get_state_data().map(|tick| tick.frame).unwrap_or_default();
        let update = self.consumer.try_dequeue();
        match &update {
            Some(inputs) => debug!(
                "Frame {}: dequeued update for controller {} ({} left)",
                frame,
                inputs.id,
                self.consumer.depth()
            ),
            None => debug!("Frame {}: no update, holding current state", frame),
        }
        self.transition_with(FramePlan { frame, update })
    }
}

impl FrameApplier<Apply> {
    pub fn apply(mut self) -> Result<FrameApplier<AwaitFrame>, FrameError> {
        let plan = match self.get_state_data() {
            Some(plan) => plan.clone(),
            None => {
                warn!("Apply state without a frame plan, holding current state");
                FramePlan {
                    frame: 0,
                    update: None,
                }
            }
        };

        if let Some(update) = plan.update {
            // Requests are validated before they are queued
            if let Err(e) = self.store.replace(update) {
                warn!("Frame {}: discarding update: {}", plan.frame, e);
            }
        }

        for (slot, inputs) in self.store.iter() {
            self.host
                .set_controller(slot, inputs)
                .map_err(|source| FrameError::PushFailed {
                    slot,
                    frame: plan.frame,
                    source,
                })?;
        }

        self.snapshot_sender.send_replace(ControllerSnapshot {
            frame: plan.frame,
            slots: *self.store.slots(),
            backlog: self.consumer.depth(),
        });

        Ok(self.transition())
    }
}

/// Drives the applier from a frame clock until the clock ends
///
/// Returns the first push failure; there is no retry.
pub async fn run_frame_loop<C: FrameClock>(
    mut applier: FrameApplier<AwaitFrame>,
    mut clock: C,
) -> Result<(), FrameError> {
    info!("Frame loop started");
    loop {
        let Some(ready) = applier.await_frame(&mut clock).await else {
            info!("Frame clock ended, stopping frame loop");
            return Ok(());
        };
        applier = ready.dequeue_or_hold().apply().inspect_err(|e| {
            error!("Frame loop failed: {}", e);
        })?;
    }
}
