//! Collaborators the navigation layer hands control to. Implementations live
//! outside this crate; the farming loop only sees these traits.

use gbf_state::BotError;
use serde::{Deserialize, Serialize};

use crate::game::Automation;

/// Why loot is being collected, which decides whether drops are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LootKind {
    /// A normal run that ended on the results screen
    Completed,
    /// A backlog entry cleared from the pending battles list
    PendingBattle,
    /// A side-event fight; drops do not count toward the target
    SideEvent,
    /// An Arcarum fight inside an expedition
    Expedition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LootOptions {
    pub item_name: String,
    pub kind: LootKind,
}

impl LootOptions {
    pub fn new(item_name: impl Into<String>, kind: LootKind) -> Self {
        Self {
            item_name: item_name.into(),
            kind,
        }
    }

    /// Whether the collected amount counts toward the farming target
    pub fn counts(&self) -> bool {
        matches!(self.kind, LootKind::Completed | LootKind::PendingBattle)
    }
}

/// Runs one battle to completion.
pub trait CombatEngine: Send {
    /// False when the battle ended early (retreat, raid already over).
    fn start_combat_mode(&mut self, io: &mut Automation, script: &[String]) -> Result<bool, BotError>;
}

/// Walks the results screens and reports how many target items dropped.
pub trait LootCollector: Send {
    fn collect_loot(&mut self, io: &mut Automation, options: &LootOptions) -> Result<u32, BotError>;
}

/// Source of raid room codes. `None` when nothing new is available.
pub trait RoomCodeFeed: Send {
    fn next_code(&mut self) -> Option<String>;
}
