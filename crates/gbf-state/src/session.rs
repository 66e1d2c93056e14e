use gbf_data::config::SideEventSettings;
use gbf_data::{FarmingMode, Settings};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::BotError;

/// Where a mode controller is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NavState {
    #[default]
    Idle,
    Navigating,
    AwaitingSummonSelection,
    AwaitingPartySelection,
    InCombat,
    CollectingLoot,
    Terminal,
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Navigating => "navigating",
            Self::AwaitingSummonSelection => "awaiting summon selection",
            Self::AwaitingPartySelection => "awaiting party selection",
            Self::InCombat => "in combat",
            Self::CollectingLoot => "collecting loot",
            Self::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

/// Settings and progress for one mode controller. Owned and mutated only by
/// that controller.
#[derive(Debug, Clone)]
pub struct GameModeSession {
    pub mode: FarmingMode,
    pub map: String,
    pub mission: String,
    pub item_name: String,
    pub group_number: u32,
    pub party_number: u32,
    pub combat_script: Vec<String>,
    pub summon_list: Vec<String>,
    /// The mode's side event with overrides already resolved, if it has one
    pub side_event: Option<SideEventSettings>,
    pub state: NavState,
}

impl GameModeSession {
    pub fn from_settings(settings: &Settings, combat_script: Vec<String>) -> Self {
        let side = match settings.farming_mode {
            FarmingMode::Special if settings.mission == "VH Angel Halo" => {
                Some(&settings.dimensional_halo)
            }
            FarmingMode::Event | FarmingMode::EventTokenDrawboxes => Some(&settings.event_nightmare),
            FarmingMode::RiseOfTheBeasts => Some(&settings.rotb_extreme_plus),
            FarmingMode::XenoClash => Some(&settings.xeno_clash_nightmare),
            _ => None,
        };

        Self {
            mode: settings.farming_mode,
            map: settings.map.clone(),
            mission: settings.mission.clone(),
            item_name: settings.item_name.clone(),
            group_number: settings.group_number,
            party_number: settings.party_number,
            combat_script,
            summon_list: settings.summons.clone(),
            side_event: side.map(|s| settings.resolve_side_event(s)),
            state: NavState::Idle,
        }
    }

    pub fn transition(&mut self, next: NavState) {
        if self.state != next {
            debug!("[{}] {} -> {}", self.mode, self.state, next);
            self.state = next;
        }
    }

    pub fn side_event_enabled(&self) -> bool {
        self.side_event.as_ref().is_some_and(|s| s.enabled)
    }

    pub fn screen_mismatch(&self, screen: &str) -> BotError {
        BotError::ScreenMismatch {
            mode: self.mode,
            screen: screen.to_string(),
            state: self.state,
        }
    }

    pub fn fail(&self, reason: impl Into<String>) -> BotError {
        BotError::Navigation {
            mode: self.mode,
            state: self.state,
            reason: reason.into(),
        }
    }

    /// Give a context-free navigation failure this session's mode and state.
    pub fn attach(&self, err: BotError) -> BotError {
        match err {
            BotError::Unreached(reason) => self.fail(reason),
            other => other,
        }
    }
}

/// How a single raid join attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinOutcome {
    Joined,
    /// Room already ended or the code was invalid
    Expired,
    /// The game refused until the pending-battle backlog is cleared
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinAttempt {
    pub room_code: String,
    pub outcome: JoinOutcome,
}
