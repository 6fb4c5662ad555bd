use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::debug;

/// Source of frame-boundary signals
///
/// `next_frame` suspends until the emulator finished a frame and returns its
/// number, or `None` once the host stopped producing frames.
pub trait FrameClock: Send {
    fn next_frame(&mut self) -> impl Future<Output = Option<u64>> + Send;
}

/// Fixed-rate clock for hosts without their own frame signal
pub struct IntervalClock {
    interval: Interval,
    frame: u64,
}

impl IntervalClock {
    /// Must be called from within a tokio runtime
    pub fn new(frame_rate_hz: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / f64::from(frame_rate_hz.max(1)));
        debug!("Frame interval set to {:?}", period);
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval, frame: 0 }
    }
}

impl FrameClock for IntervalClock {
    async fn next_frame(&mut self) -> Option<u64> {
        self.interval.tick().await;
        self.frame += 1;
        Some(self.frame)
    }
}

/// Clock advanced explicitly through a [`FrameTrigger`]
///
/// Ends when every trigger has been dropped.
pub struct ManualClock {
    ticks: mpsc::UnboundedReceiver<()>,
    frame: u64,
}

/// Sending half of a [`ManualClock`]
#[derive(Clone, Debug)]
pub struct FrameTrigger {
    ticks: mpsc::UnboundedSender<()>,
}

impl FrameTrigger {
    /// Signals one frame boundary; false once the clock is gone
    pub fn tick(&self) -> bool {
        self.ticks.send(()).is_ok()
    }
}

pub fn manual_clock() -> (FrameTrigger, ManualClock) {
    let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();
    (
        FrameTrigger { ticks: ticks_tx },
        ManualClock {
            ticks: ticks_rx,
            frame: 0,
        },
    )
}

impl FrameClock for ManualClock {
    async fn next_frame(&mut self) -> Option<u64> {
        self.ticks.recv().await?;
        self.frame += 1;
        Some(self.frame)
    }
}
