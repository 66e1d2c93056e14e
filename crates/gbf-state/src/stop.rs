use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::BotError;

/// Process-wide stop request. Cloning shares the flag.
///
/// Every wait in the control path goes through [`StopSignal::sleep`], so a
/// stop request wakes it immediately instead of after the full duration.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(|e| e.into_inner()) = true;
        cvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// `Err(Cancelled)` once a stop was requested
    pub fn check(&self) -> Result<(), BotError> {
        if self.is_stopped() {
            Err(BotError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep for `duration` unless stopped first.
    pub fn sleep(&self, duration: Duration) -> Result<(), BotError> {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let (stopped, _) = cvar
            .wait_timeout_while(guard, duration, |stopped| !*stopped)
            .unwrap_or_else(|e| e.into_inner());
        if *stopped {
            Err(BotError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep until `deadline`, a no-op if it already passed.
    pub fn sleep_until(&self, deadline: Instant) -> Result<(), BotError> {
        let now = Instant::now();
        if deadline <= now {
            return self.check();
        }
        self.sleep(deadline - now)
    }
}

/// Bounded retry schedule for [`poll_until`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poll {
    pub interval: Duration,
    /// `None` polls until the check succeeds or the run is stopped
    pub max_attempts: Option<u32>,
    /// Wait one interval before the first check
    pub delay_first: bool,
}

impl Poll {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            delay_first: false,
        }
    }

    pub fn attempts(mut self, n: u32) -> Self {
        self.max_attempts = Some(n);
        self
    }

    pub fn delay_first(mut self) -> Self {
        self.delay_first = true;
        self
    }
}

impl Default for Poll {
    fn default() -> Self {
        Self::every(Duration::from_secs(1)).attempts(5)
    }
}

/// Run `check` on the schedule until it yields a value.
///
/// The check gets the 0-based attempt number. `Ok(None)` means every attempt
/// missed; errors from the check or a stop request end the loop early.
pub fn poll_until<T, F>(stop: &StopSignal, poll: Poll, mut check: F) -> Result<Option<T>, BotError>
where
    F: FnMut(u32) -> Result<Option<T>, BotError>,
{
    let mut attempt = 0u32;
    loop {
        if poll.max_attempts.is_some_and(|max| attempt >= max) {
            return Ok(None);
        }
        if attempt > 0 || poll.delay_first {
            stop.sleep(poll.interval)?;
        } else {
            stop.check()?;
        }
        if let Some(value) = check(attempt)? {
            return Ok(Some(value));
        }
        attempt += 1;
    }
}
