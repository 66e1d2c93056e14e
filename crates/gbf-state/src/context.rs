use gbf_data::ScreenProfile;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::mailbox::PasteMailbox;
use crate::sink::MessageSink;
use crate::stop::StopSignal;

/// Earliest moment a screenshot reflects the last gesture.
///
/// The gesture side pushes the deadline forward after every input; the
/// locator refuses frames captured before it.
#[derive(Debug)]
pub struct SettleClock {
    deadline: Mutex<Instant>,
}

impl Default for SettleClock {
    fn default() -> Self {
        Self {
            deadline: Mutex::new(Instant::now()),
        }
    }
}

impl SettleClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the deadline to `now + settle`. Never moves it backwards.
    pub fn extend(&self, settle: Duration) -> Instant {
        let until = Instant::now() + settle;
        let mut deadline = self.deadline.lock().unwrap_or_else(|e| e.into_inner());
        if until > *deadline {
            *deadline = until;
        }
        *deadline
    }

    pub fn deadline(&self) -> Instant {
        *self.deadline.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Shared handles for one bot run, cloned into every component that needs them
#[derive(Clone)]
pub struct RunContext {
    pub stop: StopSignal,
    pub settle: Arc<SettleClock>,
    pub mailbox: Arc<PasteMailbox>,
    pub sink: Arc<dyn MessageSink>,
    pub profile: ScreenProfile,
    pub debug_mode: bool,
}

impl RunContext {
    pub fn new(profile: ScreenProfile, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            stop: StopSignal::new(),
            settle: Arc::new(SettleClock::new()),
            mailbox: Arc::new(PasteMailbox::new()),
            sink,
            profile,
            debug_mode: false,
        }
    }

    pub fn with_debug(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// Send a message to the user-facing log
    pub fn say(&self, message: impl AsRef<str>) {
        self.sink.post(message.as_ref());
    }

    pub fn notify(&self, message: impl AsRef<str>) {
        self.sink.notify(message.as_ref());
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("stopped", &self.stop.is_stopped())
            .field("profile", &self.profile)
            .field("debug_mode", &self.debug_mode)
            .finish()
    }
}
