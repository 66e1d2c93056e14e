use gbf_data::missions::dread_barrage_star;
use gbf_state::{BotResult, GameModeSession};
use gbf_vision::DEFAULT_TRIES;
use tracing::info;

use crate::farm::GameModeController;
use crate::game::{Game, DRAG_NUDGE};

/// Seconds between reloads while an earlier raid is still hosted
const RESUME_RELOAD_SECS: f64 = 30.0;

/// Reloads before giving up on the hosted raid: its 90 minute expiry
const RESUME_RELOADS: u32 = 180;

/// Dread Barrage raids, picked by star rating from the banner below the home
/// screen.
pub struct DreadBarrageController {
    session: GameModeSession,
}

impl DreadBarrageController {
    pub fn new(session: GameModeSession) -> Self {
        Self { session }
    }

    /// Only one Dread Barrage raid can be hosted at a time. Wait for the
    /// previous one to expire or be cleared by the room.
    fn wait_for_hosted_raid(&self, game: &mut Game) -> BotResult<()> {
        if !game.io.confirm("resume_quests", 1)? {
            return Ok(());
        }
        game.io.say(
            "A Dread Barrage raid is already hosted. Waiting for it to expire or be cleared, reloading every 30 seconds...",
        );
        for reload in 1..=RESUME_RELOADS {
            game.io.wait(RESUME_RELOAD_SECS)?;
            game.io.find_and_click("reload", DEFAULT_TRIES)?;
            game.io.wait(2.0)?;
            if !game.io.confirm("resume_quests", 1)? {
                info!("Hosted raid gone after {} reloads", reload);
                game.io.say("The hosted Dread Barrage raid is gone. Moving on...");
                return Ok(());
            }
        }
        game.io.say("Stopped waiting for the hosted Dread Barrage raid to expire");
        Ok(())
    }
}

impl GameModeController for DreadBarrageController {
    fn session(&self) -> &GameModeSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut GameModeSession {
        &mut self.session
    }

    fn navigate(&mut self, game: &mut Game) -> BotResult<()> {
        let star = dread_barrage_star(&self.session.mission)
            .ok_or_else(|| self.session.fail(format!("Unknown Dread Barrage mission {}", self.session.mission)))?;

        game.go_back_home(true)?;
        game.io.say("Now navigating to Dread Barrage...");
        game.io.drag(DRAG_NUDGE.0, DRAG_NUDGE.1)?;
        game.io.find_and_click("dread_barrage", DEFAULT_TRIES)?;
        game.io.wait(3.0)?;
        if !game.io.confirm("dread_barrage", DEFAULT_TRIES)? {
            return Err(self.session.screen_mismatch("dread_barrage"));
        }

        self.wait_for_hosted_raid(game)?;

        game.io.say(format!("Now starting {} Star Dread Barrage Raid...", star));
        if !game.io.tap_nth("dread_barrage_play", star - 1)? {
            return Err(self.session.fail(format!("{} Star Dread Barrage Raid is not listed", star)));
        }
        game.io.wait(2.0)?;
        Ok(())
    }
}
