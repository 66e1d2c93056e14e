use std::time::Duration;

use gbf_data::missions::{split_difficulty, template_name, Difficulty, ROTB_BEASTS, ROTB_SHENXIAN};
use gbf_input::ScrollDirection;
use gbf_state::{BotResult, GameModeSession};
use gbf_vision::DEFAULT_TRIES;

use crate::farm::GameModeController;
use crate::game::Game;
use crate::side_event::SideEvent;

/// Time the Shenxian host button gets to disappear once tapped
const SHENXIAN_VANISH: Duration = Duration::from_secs(10);

/// Showdown quests are only farmed on Very Hard.
const SHOWDOWN_DIFFICULTY: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
enum RotbMission {
    /// Extreme raid against one beast
    Raid(&'static str),
    Shenxian,
    /// Rising Beasts Showdown quest, by beast index
    Showdown(usize),
}

fn parse_mission(mission: &str) -> Option<RotbMission> {
    if mission == ROTB_SHENXIAN {
        return Some(RotbMission::Shenxian);
    }
    let (difficulty, name) = split_difficulty(mission);
    let index = ROTB_BEASTS.iter().position(|b| *b == name)?;
    match difficulty? {
        Difficulty::Extreme => Some(RotbMission::Raid(ROTB_BEASTS[index])),
        _ => Some(RotbMission::Showdown(index)),
    }
}

/// Rise of the Beasts: beast raids, Shenxian and the showdown quests.
pub struct RotbController {
    session: GameModeSession,
    side: Option<SideEvent>,
}

impl RotbController {
    pub fn new(session: GameModeSession) -> Self {
        let side = SideEvent::from_session(&session);
        Self { session, side }
    }
}

impl GameModeController for RotbController {
    fn session(&self) -> &GameModeSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut GameModeSession {
        &mut self.session
    }

    fn navigate(&mut self, game: &mut Game) -> BotResult<()> {
        let mission = parse_mission(&self.session.mission)
            .ok_or_else(|| self.session.fail(format!("Unknown Rise of the Beasts mission {}", self.session.mission)))?;

        game.go_back_home(true)?;
        game.io.say("Now navigating to Rise of the Beasts...");
        game.io.find_and_click("home_menu", DEFAULT_TRIES)?;
        game.open_event_banner(0)?;
        game.io.wait(3.0)?;
        if !game.io.confirm("rotb", DEFAULT_TRIES)? {
            return Err(self.session.screen_mismatch("rotb"));
        }

        match mission {
            RotbMission::Raid(beast) => {
                game.io.say(format!("Now hosting EX {} Raid...", beast));
                game.io.find_and_click("rotb_extreme", DEFAULT_TRIES)?;
                if !game.io.confirm("rotb_battle_the_beasts", DEFAULT_TRIES)? {
                    return Err(self.session.screen_mismatch("rotb_battle_the_beasts"));
                }
                let button = format!("rotb_raid_{}", template_name(beast));
                if !game.io.find_and_click(&button, DEFAULT_TRIES)? {
                    return Err(self.session.fail(format!("{} raid is not listed", beast)));
                }
            }
            RotbMission::Shenxian => {
                game.io.say("Now hosting Shenxian Raid...");
                game.io.find_and_click("rotb_shenxian_host", DEFAULT_TRIES)?;
                let timeout = game.io.scaled(SHENXIAN_VANISH);
                if !game.io.locator.wait_vanish("rotb_shenxian_host", timeout)? {
                    game.io.ctx.notify("There are no more Shenxian hosts left");
                    return Err(self.session.fail("There are no more Shenxian hosts left"));
                }
            }
            RotbMission::Showdown(index) => {
                game.io.say(format!("Now hosting {} Quest...", ROTB_BEASTS[index]));
                game.io.scroll(ScrollDirection::Down)?;
                game.io.wait(1.0)?;
                if !game.io.tap_nth("select", 0)? {
                    return Err(self.session.fail("Showdown quest list not found"));
                }
                if !game.io.confirm("rotb_rising_beasts_showdown", DEFAULT_TRIES)? {
                    return Err(self.session.screen_mismatch("rotb_rising_beasts_showdown"));
                }
                if !game.io.tap_nth("play_round_button", index)? {
                    return Err(self.session.fail("Showdown quest buttons not found"));
                }
                game.io.wait(3.0)?;
                if !game.io.tap_nth("play_round_button", SHOWDOWN_DIFFICULTY)? {
                    return Err(self.session.fail("Showdown difficulty buttons not found"));
                }
            }
        }
        Ok(())
    }

    fn sweep_popups(&mut self, game: &mut Game) -> BotResult<bool> {
        crate::side_event::sweep(game, self.side.as_mut())
    }
}
