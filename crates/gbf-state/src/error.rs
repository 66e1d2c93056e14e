use gbf_data::FarmingMode;
use thiserror::Error;

use crate::session::NavState;

/// Failures that end (or interrupt) a run.
///
/// Soft misses are not errors: a template that is not on screen comes back as
/// `None`/`false` and the caller branches on it.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("run cancelled")]
    Cancelled,

    #[error("[{mode}] expected the `{screen}` screen but could not confirm it (last state: {state})")]
    ScreenMismatch {
        mode: FarmingMode,
        screen: String,
        state: NavState,
    },

    #[error("[{mode}] {reason} (last state: {state})")]
    Navigation {
        mode: FarmingMode,
        state: NavState,
        reason: String,
    },

    /// Navigation failure raised below the mode controllers, before the
    /// mode and state are known. Controllers upgrade it with
    /// [`GameModeSession::attach`](crate::GameModeSession::attach).
    #[error("{0}")]
    Unreached(String),

    #[error("no raid could be joined after {cycles} cycles of {codes_per_cycle} room codes")]
    ResourceExhausted { cycles: u32, codes_per_cycle: u32 },

    #[error("CAPTCHA detected, stopping the bot")]
    Captcha,

    #[error(transparent)]
    Device(#[from] anyhow::Error),
}

impl BotError {
    pub fn unreached(reason: impl Into<String>) -> Self {
        Self::Unreached(reason.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type BotResult<T> = std::result::Result<T, BotError>;
