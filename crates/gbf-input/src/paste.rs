use anyhow::Result;
use gbf_capture::Adb;
use gbf_state::{PasteMailbox, Point};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Input events the paste listener reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEvent {
    /// A long-press landed; it may have focused a text field
    LongPress(Point),
    /// The device reported a focus change
    Focus { text_field: bool },
}

/// The device's text input
pub trait TextTarget: Send {
    /// Whether a text field currently has input focus
    fn text_field_focused(&mut self) -> Result<bool>;

    fn type_text(&mut self, text: &str) -> Result<()>;
}

/// Text input through adb. Focus is read from the input method service.
pub struct AdbTextTarget {
    adb: Adb,
}

impl AdbTextTarget {
    pub fn new(adb: Adb) -> Self {
        Self { adb }
    }
}

impl TextTarget for AdbTextTarget {
    fn text_field_focused(&mut self) -> Result<bool> {
        let dump = self.adb.shell(&["dumpsys", "input_method"])?;
        Ok(dump.contains("mInputShown=true"))
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        self.adb.shell(&["input", "text", text])?;
        Ok(())
    }
}

/// Handle one event: paste the pending code if a text field has focus.
/// Returns the code that was typed.
pub fn handle_focus_event<T: TextTarget>(
    target: &mut T,
    mailbox: &PasteMailbox,
    event: FocusEvent,
) -> Result<Option<String>> {
    let text_field = match event {
        FocusEvent::LongPress(p) => {
            let focused = target.text_field_focused()?;
            debug!("Long-press at {} focused a text field: {}", p, focused);
            focused
        }
        FocusEvent::Focus { text_field } => text_field,
    };
    if !text_field {
        return Ok(None);
    }

    match mailbox.take() {
        Some(code) => {
            target.type_text(&code)?;
            info!("Pasted room code {}", code);
            Ok(Some(code))
        }
        None => {
            debug!("Text field focused with nothing to paste");
            Ok(None)
        }
    }
}

/// Blocking task that consumes the mailbox on focus events until every
/// sender of `events` is dropped. Must be called inside a tokio runtime.
pub fn spawn_paste_listener<T: TextTarget + 'static>(
    mut target: T,
    mailbox: Arc<PasteMailbox>,
    mut events: UnboundedReceiver<FocusEvent>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        info!("Paste listener started");
        while let Some(event) = events.blocking_recv() {
            if let Err(e) = handle_focus_event(&mut target, &mailbox, event) {
                warn!("Paste failed: {:#}", e);
            }
        }
        info!("Paste listener stopped");
    })
}
