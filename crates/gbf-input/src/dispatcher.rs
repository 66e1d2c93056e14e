use gbf_state::{BotError, Point, RunContext};
use gbf_vision::TemplateStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::injector::InputInjector;

/// Pause after every gesture before the screen is trusted again
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

pub const LONG_PRESS: Duration = Duration::from_millis(1000);

pub const SCROLL_DURATION: Duration = Duration::from_millis(500);

/// How long a pasted code may sit in the mailbox before it is withdrawn
pub const PASTE_TIMEOUT: Duration = Duration::from_secs(3);

const MULTI_TAP_GAP: Duration = Duration::from_millis(150);

/// Slice used when waiting on the mailbox so a stop is noticed promptly
const PASTE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapOptions {
    pub long_press: bool,
    pub taps: u32,
    /// Skip the settle sleep. Frames are still gated on the settle deadline.
    pub ignore_wait: bool,
}

impl Default for TapOptions {
    fn default() -> Self {
        Self {
            long_press: false,
            taps: 1,
            ignore_wait: false,
        }
    }
}

impl TapOptions {
    pub fn taps(n: u32) -> Self {
        Self {
            taps: n.max(1),
            ..Self::default()
        }
    }

    pub fn long_press() -> Self {
        Self {
            long_press: true,
            ..Self::default()
        }
    }

    pub fn no_wait(mut self) -> Self {
        self.ignore_wait = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Reveal content further down the page
    Down,
    Up,
}

/// Turns "tap the OK button at p" into jittered device input, then holds
/// the settle contract.
pub struct GestureDispatcher {
    injector: Box<dyn InputInjector>,
    store: Arc<TemplateStore>,
    ctx: RunContext,
    rng: StdRng,
    settle: Duration,
}

impl GestureDispatcher {
    pub fn new(injector: Box<dyn InputInjector>, store: Arc<TemplateStore>, ctx: RunContext) -> Self {
        Self {
            injector,
            store,
            ctx,
            rng: StdRng::from_entropy(),
            settle: SETTLE_DELAY,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Random point in the central 20%-80% of a `size` box centered on `p`
    pub fn aim(&mut self, p: Point, size: (u32, u32)) -> Point {
        let (w, h) = (size.0 as f64, size.1 as f64);
        let left = p.x as f64 - w / 2.0;
        let top = p.y as f64 - h / 2.0;
        let x = left + self.rng.gen_range(0.2 * w..=0.8 * w);
        let y = top + self.rng.gen_range(0.2 * h..=0.8 * h);
        Point::new(x.round() as i32, y.round() as i32)
    }

    /// Tap the element `template` whose center was located at `p`.
    pub fn tap(&mut self, p: Point, template: &str, opts: TapOptions) -> Result<bool, BotError> {
        let size = self.store.dimensions(template);
        if size.is_none() {
            warn!("Size of {} unknown, tapping its center exactly", template);
        }

        for i in 0..opts.taps.max(1) {
            self.ctx.stop.check()?;
            if i > 0 {
                self.ctx.stop.sleep(MULTI_TAP_GAP)?;
            }
            let aim = match size {
                Some(size) => self.aim(p, size),
                None => p,
            };
            let hold = opts.long_press.then_some(LONG_PRESS);
            debug!("Tapping {} at {} (located at {}, hold {:?})", template, aim, p, hold);
            self.injector.tap(aim, hold)?;
        }
        self.settle_after(opts.ignore_wait)?;
        Ok(true)
    }

    /// Tap a position derived from an anchor offset. No template, no jitter.
    pub fn tap_point(&mut self, p: Point, ignore_wait: bool) -> Result<bool, BotError> {
        self.ctx.stop.check()?;
        debug!("Tapping point {}", p);
        self.injector.tap(p, None)?;
        self.settle_after(ignore_wait)?;
        Ok(true)
    }

    pub fn swipe(&mut self, from: Point, to: Point, duration: Duration) -> Result<bool, BotError> {
        self.ctx.stop.check()?;
        debug!("Swiping {} -> {} over {:?}", from, to, duration);
        self.injector.stroke(from, to, duration)?;
        self.settle_after(false)?;
        Ok(true)
    }

    /// Vertical swipe between 75% and 25% of the screen height, mid-width
    pub fn scroll(&mut self, direction: ScrollDirection) -> Result<bool, BotError> {
        let (w, h) = (self.ctx.profile.width as i32, self.ctx.profile.height as i32);
        let low = Point::new(w / 2, h * 3 / 4);
        let high = Point::new(w / 2, h / 4);
        match direction {
            ScrollDirection::Down => self.swipe(low, high, SCROLL_DURATION),
            ScrollDirection::Up => self.swipe(high, low, SCROLL_DURATION),
        }
    }

    /// Deliver `code` into the text field at `p` through the paste mailbox.
    ///
    /// The code is posted right before the long-press. If the listener has not
    /// taken it within [`PASTE_TIMEOUT`] it is withdrawn so a later focus
    /// event cannot paste it. A code read just as the wait ran out still
    /// counts as pasted.
    pub fn paste_code(&mut self, p: Point, code: &str) -> Result<bool, BotError> {
        let mailbox = Arc::clone(&self.ctx.mailbox);
        let ticket = mailbox.post(code);

        let pressed = self.ctx.stop.check().and_then(|()| {
            debug!("Long-pressing text field at {} to paste {}", p, code);
            self.injector.tap(p, Some(LONG_PRESS)).map_err(BotError::from)
        });
        if let Err(e) = pressed {
            mailbox.withdraw(ticket);
            return Err(e);
        }

        let deadline = Instant::now() + PASTE_TIMEOUT;
        let consumed = loop {
            if mailbox.wait_consumed(ticket, PASTE_POLL) {
                break true;
            }
            if self.ctx.stop.is_stopped() {
                mailbox.withdraw(ticket);
                return Err(BotError::Cancelled);
            }
            if Instant::now() >= deadline {
                break false;
            }
        };

        let consumed = consumed || mailbox.expire(ticket);
        if !consumed {
            warn!("Room code {} was not pasted within {:?}", code, PASTE_TIMEOUT);
        }
        self.settle_after(false)?;
        Ok(consumed)
    }

    fn settle_after(&mut self, ignore_wait: bool) -> Result<(), BotError> {
        self.ctx.settle.extend(self.settle);
        if ignore_wait {
            Ok(())
        } else {
            self.ctx.stop.sleep(self.settle)
        }
    }
}
