use gbf_state::{BotResult, GameModeSession};
use gbf_vision::DEFAULT_TRIES;

use crate::farm::GameModeController;
use crate::game::Game;
use crate::side_event::SideEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum XenoMission {
    Extreme,
    Raid,
}

fn parse_mission(mission: &str) -> Option<XenoMission> {
    match mission {
        "Xeno Clash Extreme" => Some(XenoMission::Extreme),
        "Xeno Clash Raid" => Some(XenoMission::Raid),
        _ => None,
    }
}

/// Xeno Clash, reached like any other event through the home menu banner,
/// with the Xeno Clash Nightmare as its side event.
pub struct XenoClashController {
    session: GameModeSession,
    side: Option<SideEvent>,
}

impl XenoClashController {
    pub fn new(session: GameModeSession) -> Self {
        let side = SideEvent::from_session(&session);
        Self { session, side }
    }
}

impl GameModeController for XenoClashController {
    fn session(&self) -> &GameModeSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut GameModeSession {
        &mut self.session
    }

    fn navigate(&mut self, game: &mut Game) -> BotResult<()> {
        let mission = parse_mission(&self.session.mission)
            .ok_or_else(|| self.session.fail(format!("Unknown Xeno Clash mission {}", self.session.mission)))?;

        game.go_back_home(true)?;
        game.io.say("Now navigating to Xeno Clash...");
        game.io.find_and_click("home_menu", DEFAULT_TRIES)?;
        game.open_event_banner(0)?;
        game.io.wait(3.0)?;
        if !game.io.find_and_click("xeno_special", DEFAULT_TRIES)? {
            return Err(self.session.fail("Xeno Clash special quests not found. Is Xeno Clash running?"));
        }
        game.io.wait(1.0)?;

        // A listed Nightmare pushes the other "select" buttons down by one.
        let nightmare = usize::from(game.io.find_button("event_nightmare", 1)?.is_some());
        let select = match mission {
            XenoMission::Extreme => 1 + nightmare,
            XenoMission::Raid => 2 + nightmare,
        };
        game.io.say(format!("Now hosting {}...", self.session.mission));
        if !game.io.tap_nth("select", select)? {
            return Err(self.session.fail("Xeno Clash mission list not found"));
        }
        game.io.wait(1.0)?;

        let started = match mission {
            XenoMission::Extreme => game.io.tap_nth("play_round_button", 0)?,
            XenoMission::Raid => game.io.find_and_click("play", DEFAULT_TRIES)?,
        };
        if !started {
            return Err(self.session.fail(format!("{} could not be started", self.session.mission)));
        }
        Ok(())
    }

    fn sweep_popups(&mut self, game: &mut Game) -> BotResult<bool> {
        crate::side_event::sweep(game, self.side.as_mut())
    }
}
