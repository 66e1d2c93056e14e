use std::time::Duration;

use gbf_data::missions::{split_difficulty, Difficulty};
use gbf_state::{BotResult, GameModeSession};
use gbf_vision::DEFAULT_TRIES;

use crate::farm::GameModeController;
use crate::game::{Game, DRAG_NUDGE};
use crate::side_event::SideEvent;

/// How long an Extreme/Impossible raid button gets to react before the
/// host falls back to Very Hard
const RAID_BUTTON_VANISH: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventMission {
    Quest,
    Raid,
}

fn parse_mission(mission: &str) -> Option<(Difficulty, EventMission)> {
    let (difficulty, name) = split_difficulty(mission);
    let kind = match name {
        "Event Quest" => EventMission::Quest,
        "Event Raid" => EventMission::Raid,
        _ => return None,
    };
    Some((difficulty?, kind))
}

/// The current event, reached through the first banner of the home menu.
/// `drawboxes` selects the Token Drawboxes page layout.
pub struct EventController {
    session: GameModeSession,
    side: Option<SideEvent>,
    drawboxes: bool,
}

impl EventController {
    pub fn new(session: GameModeSession) -> Self {
        let side = SideEvent::from_session(&session);
        Self {
            session,
            side,
            drawboxes: false,
        }
    }

    pub fn token_drawboxes(session: GameModeSession) -> Self {
        Self {
            drawboxes: true,
            ..Self::new(session)
        }
    }

    fn open_event_page(&self, game: &mut Game) -> BotResult<()> {
        game.go_back_home(true)?;
        game.io.wait(0.5)?;
        game.io.find_and_click("home_menu", DEFAULT_TRIES)?;
        game.open_event_banner(0)?;
        game.io.wait(3.0)?;
        if game.io.confirm("event_daily_missions", 1)? {
            game.io.say("Closing the Daily Missions popup...");
            game.io.find_and_click("cancel", DEFAULT_TRIES)?;
        }
        Ok(())
    }

    fn navigate_regular(&self, game: &mut Game, difficulty: Difficulty, kind: EventMission) -> BotResult<()> {
        if !game.io.find_and_click("event_special_quest", DEFAULT_TRIES)? {
            return Err(self.session.fail(
                "Failed to detect the layout of this Event. If it has Token Drawboxes, use the Event (Token Drawboxes) mode",
            ));
        }
        if !game.io.confirm("special", DEFAULT_TRIES)? {
            return Err(self.session.screen_mismatch("special"));
        }

        // A listed Nightmare takes the first "select" slot.
        let nightmare = usize::from(game.io.find("event_nightmare", 1)?.is_some());
        let select = match kind {
            EventMission::Quest => nightmare,
            EventMission::Raid => 1 + nightmare,
        };
        if !game.io.tap_nth("select", select)? {
            return Err(self.session.fail("Event mission list not found"));
        }
        game.io.wait(3.0)?;

        let round = match difficulty {
            Difficulty::VeryHard => 0,
            Difficulty::Extreme => 1,
            other => return Err(self.session.fail(format!("{:?} is not offered by this Event", other))),
        };
        if !game.io.tap_nth("play_round_button", round)? {
            return Err(self.session.fail("Difficulty buttons not found"));
        }
        Ok(())
    }

    fn navigate_drawboxes(&self, game: &mut Game, difficulty: Difficulty, kind: EventMission) -> BotResult<()> {
        game.io.drag(DRAG_NUDGE.0, DRAG_NUDGE.1)?;
        game.io.wait(1.0)?;

        match kind {
            EventMission::Quest => {
                game.io.find_and_click("event_quests", DEFAULT_TRIES)?;
                game.io.wait(3.0)?;
                let round = match difficulty {
                    Difficulty::Normal => 0,
                    Difficulty::Hard => 1,
                    Difficulty::VeryHard => 2,
                    Difficulty::Extreme => 3,
                    Difficulty::Impossible => {
                        return Err(self.session.fail("Event Quests have no Impossible difficulty"))
                    }
                };
                if !game.io.tap_nth("play_round_button", round)? {
                    return Err(self.session.fail("Difficulty buttons not found"));
                }
            }
            EventMission::Raid => {
                game.io.find_and_click("event_raid_battle", DEFAULT_TRIES)?;
                game.io.drag(DRAG_NUDGE.0, DRAG_NUDGE.1)?;
                game.io.wait(0.5)?;
                let button = match difficulty {
                    Difficulty::VeryHard => "event_raid_very_hard",
                    Difficulty::Extreme => "event_raid_extreme",
                    Difficulty::Impossible => "event_raid_impossible",
                    other => return Err(self.session.fail(format!("Event Raids have no {:?} difficulty", other))),
                };
                game.io.find_and_click(button, DEFAULT_TRIES)?;
                let timeout = game.io.scaled(RAID_BUTTON_VANISH);
                if difficulty != Difficulty::VeryHard && !game.io.locator.wait_vanish(button, timeout)? {
                    game.io.say("Not enough treasures to host this raid. Hosting Very Hard instead...");
                    game.io.find_and_click("event_raid_very_hard", DEFAULT_TRIES)?;
                }
            }
        }
        Ok(())
    }
}

impl GameModeController for EventController {
    fn session(&self) -> &GameModeSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut GameModeSession {
        &mut self.session
    }

    fn navigate(&mut self, game: &mut Game) -> BotResult<()> {
        let (difficulty, kind) = parse_mission(&self.session.mission)
            .ok_or_else(|| self.session.fail(format!("Unknown Event mission {}", self.session.mission)))?;
        game.io.say(format!("Now hosting {}...", self.session.mission));
        self.open_event_page(game)?;
        if self.drawboxes {
            self.navigate_drawboxes(game, difficulty, kind)
        } else {
            self.navigate_regular(game, difficulty, kind)
        }
    }

    fn sweep_popups(&mut self, game: &mut Game) -> BotResult<bool> {
        crate::side_event::sweep(game, self.side.as_mut())
    }
}
