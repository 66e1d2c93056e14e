use gbf_data::config::SideEventSettings;
use gbf_data::FarmingMode;
use gbf_state::{BotResult, GameModeSession};
use tracing::{debug, info};

use crate::external::LootKind;
use crate::game::Game;

/// Hook run on every popup sweep. True means the run was diverted.
pub trait SideEventCheck {
    fn check(&mut self, game: &mut Game) -> BotResult<bool>;
}

/// Modes without a side event
pub struct NoSideEvent;

impl SideEventCheck for NoSideEvent {
    fn check(&mut self, _game: &mut Game) -> BotResult<bool> {
        Ok(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEventKind {
    DimensionalHalo,
    EventNightmare,
    RotbExtremePlus,
    XenoClashNightmare,
}

impl SideEventKind {
    pub fn for_mode(mode: FarmingMode) -> Option<Self> {
        match mode {
            FarmingMode::Special => Some(Self::DimensionalHalo),
            FarmingMode::Event | FarmingMode::EventTokenDrawboxes => Some(Self::EventNightmare),
            FarmingMode::RiseOfTheBeasts => Some(Self::RotbExtremePlus),
            FarmingMode::XenoClash => Some(Self::XenoClashNightmare),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::DimensionalHalo => "Dimensional Halo",
            Self::EventNightmare => "Event Nightmare",
            Self::RotbExtremePlus => "Rise of the Beasts Extreme+",
            Self::XenoClashNightmare => "Xeno Clash Nightmare",
        }
    }

    /// Header announcing the encounter
    pub fn popup(self) -> &'static str {
        match self {
            Self::RotbExtremePlus => "rotb_extreme_plus",
            _ => "limited_time_quests",
        }
    }

    /// Event and Xeno Clash Nightmares can be skipped straight to their loot.
    fn claims_skippable(self) -> bool {
        matches!(self, Self::EventNightmare | Self::XenoClashNightmare)
    }
}

/// A mode's side event with its resolved summons, group and party.
pub struct SideEvent {
    pub kind: SideEventKind,
    settings: SideEventSettings,
    script: Vec<String>,
    encounters: u32,
}

impl SideEvent {
    pub fn new(kind: SideEventKind, settings: SideEventSettings, script: Vec<String>) -> Self {
        Self {
            kind,
            settings,
            script,
            encounters: 0,
        }
    }

    /// The session's side event, if its mode has one
    pub fn from_session(session: &GameModeSession) -> Option<Self> {
        let kind = SideEventKind::for_mode(session.mode)?;
        let settings = session.side_event.clone()?;
        Some(Self::new(kind, settings, session.combat_script.clone()))
    }

    pub fn encounters(&self) -> u32 {
        self.encounters
    }

    fn run(&mut self, game: &mut Game) -> BotResult<()> {
        if self.kind.claims_skippable() && game.io.find_and_click("event_claim_loot", 1)? {
            game.io.say(format!("Skippable {} detected. Claiming it now...", self.kind.name()));
            game.collect_loot(LootKind::SideEvent)?;
            return Ok(());
        }

        self.encounters += 1;
        game.io.say(format!(
            "Detected {} (#{}). Starting it with summons {:?}, Group {}, Party {}",
            self.kind.name(),
            self.encounters,
            self.settings.summons,
            self.settings.group_number,
            self.settings.party_number
        ));

        game.io.find_and_click("play_next", gbf_vision::DEFAULT_TRIES)?;
        game.io.wait(1.0)?;
        // Xeno Clash lists its Nightmares; only the first one is run.
        if self.kind == SideEventKind::XenoClashNightmare {
            if !game.io.tap_nth("play_round_button", 0)? {
                info!("{} list was empty", self.kind.name());
                return Ok(());
            }
            game.io.wait(1.0)?;
        }
        if !game.io.confirm("select_a_summon", gbf_vision::DEFAULT_TRIES)? {
            info!("{} did not reach the summon screen", self.kind.name());
            return Ok(());
        }
        if !game.select_summon(&self.settings.summons)? {
            return Ok(());
        }
        let (group, party) = (self.settings.group_number, self.settings.party_number);
        if game.select_party_and_start(group, party)? && game.start_combat(&self.script)? {
            game.collect_loot(LootKind::SideEvent)?;
        }
        Ok(())
    }
}

impl SideEventCheck for SideEvent {
    fn check(&mut self, game: &mut Game) -> BotResult<bool> {
        if !game.io.confirm(self.kind.popup(), 1)? {
            debug!("No {} detected", self.kind.name());
            return Ok(false);
        }
        if !self.settings.enabled {
            game.io.say(format!("{} detected but it is disabled. Moving on...", self.kind.name()));
            game.io.find_and_click("close", gbf_vision::DEFAULT_TRIES)?;
            return Ok(false);
        }
        // Whatever happens inside, the regular run was abandoned.
        self.run(game)?;
        Ok(true)
    }
}

/// Popup sweep with the mode's side event, if any
pub fn sweep(game: &mut Game, side: Option<&mut SideEvent>) -> BotResult<bool> {
    match side {
        Some(side) => game.check_for_popups(side),
        None => game.check_for_popups(&mut NoSideEvent),
    }
}
