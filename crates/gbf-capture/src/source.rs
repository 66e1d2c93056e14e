use anyhow::anyhow;
use gbf_state::{BotError, StopSignal};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::debug;

use crate::{Frame, Grabber};

const WATCH_POLL: Duration = Duration::from_millis(20);

/// Where the control path gets its screenshots from.
pub trait FrameSource: Send {
    /// Latest frame captured at or after `not_before`, waiting for one if
    /// needed. Waiting honours `stop`.
    fn frame_since(&mut self, not_before: Instant, stop: &StopSignal) -> Result<Arc<Frame>, BotError>;
}

/// Reads the single-slot channel fed by [`capture_loop`](crate::capture_loop)
pub struct WatchFrameSource {
    rx: watch::Receiver<Option<Arc<Frame>>>,
    stale_after: Duration,
}

impl WatchFrameSource {
    pub fn new(rx: watch::Receiver<Option<Arc<Frame>>>) -> Self {
        Self {
            rx,
            stale_after: Duration::from_secs(15),
        }
    }

    /// Give up when no fresh frame arrives within `timeout`
    pub fn with_stale_after(mut self, timeout: Duration) -> Self {
        self.stale_after = timeout;
        self
    }
}

impl FrameSource for WatchFrameSource {
    fn frame_since(&mut self, not_before: Instant, stop: &StopSignal) -> Result<Arc<Frame>, BotError> {
        let waiting_since = Instant::now();
        loop {
            stop.check()?;
            let fresh = self
                .rx
                .borrow()
                .as_ref()
                .filter(|f| f.captured_at >= not_before)
                .cloned();
            if let Some(frame) = fresh {
                return Ok(frame);
            }
            if self.rx.has_changed().is_err() {
                return Err(anyhow!("Capture loop is no longer running").into());
            }
            if waiting_since.elapsed() > self.stale_after {
                return Err(anyhow!("No new frame within {:?}", self.stale_after).into());
            }
            stop.sleep(WATCH_POLL)?;
        }
    }
}

/// Grabs a screenshot synchronously on every request
pub struct OnDemandSource<G> {
    grabber: G,
    seq: u64,
}

impl<G: Grabber> OnDemandSource<G> {
    pub fn new(grabber: G) -> Self {
        Self { grabber, seq: 0 }
    }
}

impl<G: Grabber> FrameSource for OnDemandSource<G> {
    fn frame_since(&mut self, not_before: Instant, stop: &StopSignal) -> Result<Arc<Frame>, BotError> {
        stop.sleep_until(not_before)?;
        let started = Instant::now();
        let image = self.grabber.grab()?;
        self.seq += 1;
        debug!("Grabbed frame #{} from {}", self.seq, self.grabber.describe());
        Ok(Arc::new(Frame::new(image, started, self.seq)))
    }
}
