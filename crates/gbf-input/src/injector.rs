use anyhow::Result;
use gbf_capture::Adb;
use gbf_state::Point;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::paste::FocusEvent;

/// Channel into the device's touch input
pub trait InputInjector: Send {
    /// Touch and release at `p`, holding for `hold` when given
    fn tap(&mut self, p: Point, hold: Option<Duration>) -> Result<()>;

    /// Straight stroke from `from` to `to` over `duration`
    fn stroke(&mut self, from: Point, to: Point, duration: Duration) -> Result<()>;
}

/// `adb shell input ...`
pub struct AdbInjector {
    adb: Adb,
    focus_tx: Option<UnboundedSender<FocusEvent>>,
}

impl AdbInjector {
    pub fn new(adb: Adb) -> Self {
        Self { adb, focus_tx: None }
    }

    /// Report long-presses to the paste listener
    pub fn with_focus_events(mut self, tx: UnboundedSender<FocusEvent>) -> Self {
        self.focus_tx = Some(tx);
        self
    }
}

impl InputInjector for AdbInjector {
    fn tap(&mut self, p: Point, hold: Option<Duration>) -> Result<()> {
        let (x, y) = (p.x.to_string(), p.y.to_string());
        match hold {
            None => {
                self.adb.shell(&["input", "tap", &x, &y])?;
            }
            Some(hold) => {
                // A swipe that does not move is a long-press
                let ms = hold.as_millis().to_string();
                self.adb.shell(&["input", "swipe", &x, &y, &x, &y, &ms])?;
                if let Some(tx) = &self.focus_tx {
                    if tx.send(FocusEvent::LongPress(p)).is_err() {
                        debug!("Paste listener is gone, long-press at {} not reported", p);
                    }
                }
            }
        }
        Ok(())
    }

    fn stroke(&mut self, from: Point, to: Point, duration: Duration) -> Result<()> {
        self.adb.shell(&[
            "input",
            "swipe",
            &from.x.to_string(),
            &from.y.to_string(),
            &to.x.to_string(),
            &to.y.to_string(),
            &duration.as_millis().to_string(),
        ])?;
        Ok(())
    }
}
