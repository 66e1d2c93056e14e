use std::fmt;

use gbf_data::missions::template_name;
use gbf_input::ScrollDirection;
use gbf_state::{BotResult, GameModeSession, NavState};
use gbf_vision::DEFAULT_TRIES;
use tracing::info;

use crate::external::LootKind;
use crate::farm::GameModeController;
use crate::game::Game;

const BANNER_SEARCH_TRIES: u32 = 5;

/// Rounds of looking for something to do before moving on to the next area
const ACTION_TRIES: u32 = 3;

/// Upper bound on actions in one expedition; an expedition that never
/// reaches a checkpoint is stuck.
const MAX_ACTIONS: u32 = 500;

/// What the expedition map offers next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcarumAction {
    Combat,
    /// A chest or keythorn was opened
    ClaimedTreasure,
    ClaimedSpirethorn,
    Navigating,
    NextArea,
    BossDetected,
}

impl fmt::Display for ArcarumAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Combat => "Combat",
            Self::ClaimedTreasure => "Claimed Treasure",
            Self::ClaimedSpirethorn => "Claimed Spirethorn",
            Self::Navigating => "Navigating",
            Self::NextArea => "Next Area",
            Self::BossDetected => "Boss Detected",
        };
        f.write_str(name)
    }
}

/// Arcarum expeditions. Each run is one expedition; a boss node ends the
/// session so the user can fight it.
pub struct ArcarumController {
    session: GameModeSession,
    entered: bool,
    boss_found: bool,
}

impl ArcarumController {
    pub fn new(session: GameModeSession) -> Self {
        Self {
            session,
            entered: false,
            boss_found: false,
        }
    }

    /// Find the Arcarum banner on the home screen, scrolling for it.
    fn open_from_home(&self, game: &mut Game) -> BotResult<()> {
        game.go_back_home(false)?;
        game.io.wait(2.0)?;

        // Without the menu button the home page is already scrolled down.
        let direction = if game.io.find_button("home_menu", 1)?.is_none() {
            ScrollDirection::Up
        } else {
            ScrollDirection::Down
        };
        for _ in 0..BANNER_SEARCH_TRIES {
            if game.io.find_and_click("arcarum_banner", 1)? {
                return Ok(());
            }
            game.io.scroll(direction)?;
            game.io.wait(1.0)?;
        }
        Err(self.session.fail("Failed to navigate to Arcarum from the Home screen"))
    }

    fn choose_action(&self, game: &mut Game) -> BotResult<ArcarumAction> {
        game.io.wait(1.0)?;
        for _ in 0..ACTION_TRIES {
            if game.io.find("arcarum_boss", 1)?.is_some() || game.io.find("arcarum_boss2", 1)?.is_some() {
                return Ok(ArcarumAction::BossDetected);
            }

            if game.io.find_and_click("arcarum_action", 1)? {
                game.io.wait(2.0)?;
                game.check_for_captcha()?;
                if game.io.confirm("arcarum_party_selection", 1)? {
                    return Ok(ArcarumAction::Combat);
                }
                if game.io.find_and_click("ok", 1)? {
                    return Ok(ArcarumAction::ClaimedTreasure);
                }
                return Ok(ArcarumAction::ClaimedSpirethorn);
            }

            if game.io.confirm("arcarum_treasure", 1)? {
                game.io.find_and_click("ok", DEFAULT_TRIES)?;
                return Ok(ArcarumAction::ClaimedTreasure);
            }

            for target in ["arcarum_node", "arcarum_mob", "arcarum_red_mob"] {
                if game.io.find_and_click(target, 1)? {
                    game.io.wait(1.0)?;
                    return Ok(ArcarumAction::Navigating);
                }
            }
        }
        Ok(ArcarumAction::NextArea)
    }

    fn fight(&mut self, game: &mut Game) -> BotResult<()> {
        self.session.transition(NavState::AwaitingPartySelection);
        let (group, party) = (self.session.group_number, self.session.party_number);
        if !game.select_party_and_start(group, party)? {
            return Ok(());
        }
        if game.io.confirm("elemental_damage", 1)? {
            return Err(self.session.fail(
                "The party does not match this enemy's weakness. This battle has to be done by hand",
            ));
        }
        if game.io.confirm("arcarum_restriction", 1)? {
            return Err(self.session.fail("This battle has a party restriction. It has to be done by hand"));
        }
        game.io.wait(3.0)?;

        self.session.transition(NavState::InCombat);
        let script = self.session.combat_script.clone();
        if game.start_combat(&script)? {
            self.session.transition(NavState::CollectingLoot);
            game.collect_loot(LootKind::Expedition)?;
            game.io.find_and_click("expedition", DEFAULT_TRIES)?;
        }
        self.session.transition(NavState::Navigating);
        Ok(())
    }
}

impl GameModeController for ArcarumController {
    fn session(&self) -> &GameModeSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut GameModeSession {
        &mut self.session
    }

    /// Start the expedition, or resume the one already underway.
    fn navigate(&mut self, game: &mut Game) -> BotResult<()> {
        let map = self.session.mission.clone();
        if self.entered {
            game.io.wait(4.0)?;
        } else {
            game.io.say(format!("Now beginning navigation to {}...", map));
            self.open_from_home(game)?;
            self.entered = true;
        }
        game.io.wait(1.0)?;
        if game.io.confirm("arcarum_expedition", 1)? {
            game.io.find_and_click("ok", DEFAULT_TRIES)?;
        }
        game.io.find_and_click("arcarum_extreme", DEFAULT_TRIES)?;

        let button = format!("arcarum_{}", template_name(&map));
        if !game.io.find_and_click(&button, 5)? {
            info!("{} is not offered, resuming the current expedition", map);
            game.io.find_and_click("arcarum_exploring", DEFAULT_TRIES)?;
            return Ok(());
        }
        if game.io.confirm("arcarum_departure_check", DEFAULT_TRIES)? {
            game.io.say("Using 1 Arcarum ticket to start this expedition...");
            game.io.find_and_click("start_expedition", DEFAULT_TRIES)?;
            game.io.wait(6.0)?;
            return Ok(());
        }
        if game.io.find_and_click("resume", DEFAULT_TRIES)? {
            game.io.wait(3.0)?;
            return Ok(());
        }
        Err(self.session.screen_mismatch("arcarum_departure_check"))
    }

    /// One expedition from start to checkpoint. Reports 1 when it was
    /// completed, 0 when a boss ended it.
    fn start(&mut self, game: &mut Game, _first_run: bool) -> BotResult<u32> {
        self.session.transition(NavState::Navigating);
        self.navigate(game)?;

        for _ in 0..MAX_ACTIONS {
            let action = self.choose_action(game)?;
            game.io.say(format!("Action to take will be: {}", action));
            match action {
                ArcarumAction::Combat => self.fight(game)?,
                ArcarumAction::Navigating => {
                    game.io.find_and_click("move", DEFAULT_TRIES)?;
                }
                ArcarumAction::NextArea => {
                    if game.io.find_and_click("arcarum_next_stage", DEFAULT_TRIES)? {
                        game.io.find_and_click("ok", DEFAULT_TRIES)?;
                        game.io.say("Moving to the next area...");
                    } else if game.io.find_and_click("arcarum_checkpoint", DEFAULT_TRIES)? {
                        game.io.find_and_click("arcarum", DEFAULT_TRIES)?;
                        game.io.say("Expedition is complete");
                        self.session.transition(NavState::Idle);
                        return Ok(1);
                    }
                }
                ArcarumAction::BossDetected => {
                    game.io.ctx.notify("Arcarum boss detected. Stopping the bot.");
                    self.boss_found = true;
                    self.session.transition(NavState::Idle);
                    return Ok(0);
                }
                ArcarumAction::ClaimedTreasure | ArcarumAction::ClaimedSpirethorn => {}
            }
            game.io.wait(1.0)?;
        }
        Err(self.session.fail(format!("The expedition did not finish within {} actions", MAX_ACTIONS)))
    }

    fn finished(&self) -> bool {
        self.boss_found
    }
}
