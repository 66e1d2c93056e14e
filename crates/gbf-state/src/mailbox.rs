use std::sync::{Condvar, Mutex};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default)]
struct Slot {
    code: Option<String>,
    /// Generation of the last posted code
    posted: u64,
    /// Generation of the last code handed to a reader
    consumed: u64,
}

/// Single-slot handoff of a room code from the control path to the paste
/// listener. A new post replaces an unread code; a read empties the slot.
#[derive(Debug, Default)]
pub struct PasteMailbox {
    slot: Mutex<Slot>,
    taken: Condvar,
}

/// Receipt for a posted code, used to wait for that exact code to be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostTicket(u64);

impl PasteMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, code: impl Into<String>) -> PostTicket {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.code.is_some() {
            debug!("Replacing unread room code in paste mailbox");
        }
        slot.posted += 1;
        slot.code = Some(code.into());
        PostTicket(slot.posted)
    }

    /// Take the pending code, if any. At most one reader gets each code.
    pub fn take(&self) -> Option<String> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        let code = slot.code.take();
        if code.is_some() {
            slot.consumed = slot.posted;
            self.taken.notify_all();
        }
        code
    }

    /// Block until the code behind `ticket` was read, up to `timeout`.
    pub fn wait_consumed(&self, ticket: PostTicket, timeout: Duration) -> bool {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        let (slot, _) = self
            .taken
            .wait_timeout_while(slot, timeout, |s| s.consumed < ticket.0)
            .unwrap_or_else(|e| e.into_inner());
        slot.consumed >= ticket.0
    }

    /// Drop the code behind `ticket` if nobody read it. A newer post is kept.
    pub fn withdraw(&self, ticket: PostTicket) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.posted == ticket.0 && slot.code.is_some() {
            slot.code = None;
            return true;
        }
        false
    }

    /// Give up on the code behind `ticket`: drop it if still unread.
    /// Returns true when a reader took it first.
    pub fn expire(&self, ticket: PostTicket) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.consumed >= ticket.0 {
            return true;
        }
        if slot.posted == ticket.0 {
            slot.code = None;
        }
        false
    }

    pub fn clear(&self) {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).code = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).code.is_none()
    }
}
