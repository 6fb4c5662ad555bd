//! Frame domain
//!
//! - [`clock`] - frame-boundary signal ([`FrameClock`])
//! - [`queue`] - pending action queue between connections and the applier
//! - [`applier`] - the once-per-frame state machine that pushes controller state
//!
//! The frame domain is a single tokio task. It suspends only while waiting for
//! the next frame and otherwise runs pop, apply and push to completion.

pub mod applier;
pub mod clock;
pub mod queue;

pub use applier::{run_frame_loop, FrameApplier, FrameError};
pub use clock::{manual_clock, FrameClock, FrameTrigger, IntervalClock, ManualClock};
pub use queue::{pending_action_queue, ActionConsumer, ActionProducer, QueueError};
