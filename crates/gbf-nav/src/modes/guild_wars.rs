use std::time::Duration;

use gbf_data::missions::{GUILD_WARS_MEAT, GUILD_WARS_NIGHTMARES};
use gbf_data::offsets::GUILD_WARS_EXTREME_PLUS;
use gbf_state::{BotResult, GameModeSession};
use gbf_vision::DEFAULT_TRIES;

use crate::farm::GameModeController;
use crate::game::{Game, DRAG_NUDGE};

/// Taps on a meat mission before giving up on the page reacting
const MEAT_TAP_TRIES: u32 = 10;

const AP_BUTTON_VANISH: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuildWarsMission {
    /// Index into the `ap_30` buttons
    Meat(usize),
    Nightmare { button: &'static str, nm150: bool },
}

fn parse_mission(mission: &str) -> Option<GuildWarsMission> {
    if let Some(index) = GUILD_WARS_MEAT.iter().position(|m| *m == mission) {
        return Some(GuildWarsMission::Meat(index));
    }
    GUILD_WARS_NIGHTMARES
        .iter()
        .find(|(name, _)| *name == mission)
        .map(|&(name, button)| GuildWarsMission::Nightmare {
            button,
            nm150: name == "NM150",
        })
}

/// Guild Wars: meat missions and the Nightmares they pay for.
pub struct GuildWarsController {
    session: GameModeSession,
}

impl GuildWarsController {
    pub fn new(session: GameModeSession) -> Self {
        Self { session }
    }

    fn host_meat(&self, game: &mut Game, index: usize) -> BotResult<()> {
        game.io.find_and_click("guild_wars_meat", DEFAULT_TRIES)?;
        game.io.wait(1.0)?;
        if !game.io.confirm("guild_wars_meat", DEFAULT_TRIES)? {
            return Err(self.session.screen_mismatch("guild_wars_meat"));
        }
        game.io.say(format!("Now hosting {}...", GUILD_WARS_MEAT[index]));

        let buttons = game.io.find_all("ap_30")?;
        let target = *buttons
            .get(index)
            .ok_or_else(|| self.session.fail(format!("{} is not listed", GUILD_WARS_MEAT[index])))?;

        let timeout = game.io.scaled(AP_BUTTON_VANISH);
        let mut tries = MEAT_TAP_TRIES;
        while !game.io.locator.wait_vanish("ap_30", timeout)? {
            if tries == 0 {
                let reason = if index == GUILD_WARS_MEAT.len() - 1 {
                    "Extreme+ is not unlocked yet"
                } else {
                    "The mission did not react to 10 taps. Refresh the page and try again"
                };
                return Err(self.session.fail(reason));
            }
            game.io.tap(target, "ap_30")?;
            game.io.wait(3.0)?;
            tries -= 1;
        }
        Ok(())
    }

    /// Not enough meat for the Nightmare: farm Extreme+ instead.
    fn host_extreme_plus(&self, game: &mut Game) -> BotResult<()> {
        game.io.say("Not enough meat to host the Nightmare. Farming Extreme+ instead...");
        game.io.find_and_click("guild_wars_meat", DEFAULT_TRIES)?;
        if !game.io.confirm("guild_wars_meat", DEFAULT_TRIES)? {
            return Err(self.session.screen_mismatch("guild_wars_meat"));
        }
        let very_hard = game
            .io
            .find("guild_wars_meat_very_hard", DEFAULT_TRIES)?
            .ok_or_else(|| self.session.fail("Meat missions are not listed"))?;
        game.io.tap_offset(very_hard, GUILD_WARS_EXTREME_PLUS)?;
        Ok(())
    }

    fn host_nightmare(&self, game: &mut Game, button: &str, nm150: bool) -> BotResult<()> {
        if nm150 {
            game.io.say("Now hosting NM150...");
            game.io.find_and_click(button, DEFAULT_TRIES)?;
            if game.io.confirm("guild_wars_nightmare", DEFAULT_TRIES)? && game.io.find_and_click("start", DEFAULT_TRIES)? {
                return Ok(());
            }
            game.io.find_and_click("cancel", DEFAULT_TRIES)?;
            return self.host_extreme_plus(game);
        }

        game.io.find_and_click("guild_wars_nightmare", DEFAULT_TRIES)?;
        if !game.io.confirm("guild_wars_nightmare", DEFAULT_TRIES)? {
            game.io.find_and_click("close", DEFAULT_TRIES)?;
            return self.host_extreme_plus(game);
        }
        if game.io.confirm("guild_wars_nightmare_first_day", 1)? {
            game.io.say("Only NM90 is open on the first day. Hosting it...");
            game.io.find_and_click("ok", DEFAULT_TRIES)?;
        } else {
            game.io.say(format!("Now hosting {}...", self.session.mission));
            game.io.find_and_click(button, DEFAULT_TRIES)?;
        }
        Ok(())
    }
}

impl GameModeController for GuildWarsController {
    fn session(&self) -> &GameModeSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut GameModeSession {
        &mut self.session
    }

    fn navigate(&mut self, game: &mut Game) -> BotResult<()> {
        let mission = parse_mission(&self.session.mission)
            .ok_or_else(|| self.session.fail(format!("Unknown Guild Wars mission {}", self.session.mission)))?;

        game.go_back_home(true)?;
        game.io.find_and_click("home_menu", DEFAULT_TRIES)?;
        game.open_event_banner(0)?;
        game.io.wait(3.0)?;
        if !game.io.confirm("guild_wars", DEFAULT_TRIES)? {
            return Err(self.session.screen_mismatch("guild_wars"));
        }
        game.io.drag(DRAG_NUDGE.0, DRAG_NUDGE.1)?;
        game.io.wait(2.0)?;

        match mission {
            GuildWarsMission::Meat(index) => self.host_meat(game, index),
            GuildWarsMission::Nightmare { button, nm150 } => self.host_nightmare(game, button, nm150),
        }
    }
}
