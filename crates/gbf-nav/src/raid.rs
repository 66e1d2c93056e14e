use gbf_data::config::RaidSettings;
use gbf_data::offsets::ROOM_CODE_TEXTBOX;
use gbf_state::{poll_until, BotError, BotResult, GameModeSession, JoinAttempt, JoinOutcome, NavState, Point, Poll};
use gbf_vision::DEFAULT_TRIES;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::external::RoomCodeFeed;
use crate::farm::{fight_from_summon_selection, GameModeController, SUMMON_SCREEN_TRIES};
use crate::game::Game;

/// The game allows at most this many raids joined at once
pub const MAX_JOINED: usize = 3;

pub const CODES_PER_CYCLE: u32 = 10;

pub const JOIN_CYCLES: u32 = 10;

/// Pause after a cycle in which no code worked
pub const RECOVERY: Duration = Duration::from_secs(15);

/// Joins raids from a room code feed while respecting the joined-raid cap.
///
/// The joined count is never trusted across screens: it is re-derived from
/// the `joined` markers on the Backup Requests list whenever that list is
/// (re)opened.
pub struct RaidJoinCoordinator {
    feed: Box<dyn RoomCodeFeed>,
    joined: usize,
    attempts: Vec<JoinAttempt>,
    slot_poll: Duration,
    max_slot_polls: Option<u32>,
}

impl RaidJoinCoordinator {
    pub fn new(feed: Box<dyn RoomCodeFeed>, settings: &RaidSettings) -> Self {
        Self {
            feed,
            joined: 0,
            attempts: Vec::new(),
            slot_poll: Duration::from_secs(settings.slot_poll_seconds),
            max_slot_polls: settings.max_slot_polls,
        }
    }

    pub fn joined(&self) -> usize {
        self.joined
    }

    pub fn attempts(&self) -> &[JoinAttempt] {
        &self.attempts
    }

    /// Count the `joined` markers on the Backup Requests list.
    pub fn refresh_joined(&mut self, game: &mut Game) -> BotResult<usize> {
        game.io.wait(1.0)?;
        self.joined = game.io.find_all("joined")?.len();
        game.io.say(format!("There are currently {} raids joined", self.joined));
        Ok(self.joined)
    }

    /// Block until fewer than [`MAX_JOINED`] raids are joined, reopening the
    /// Backup Requests list on every poll.
    pub fn wait_for_slot(&mut self, game: &mut Game) -> BotResult<()> {
        if self.joined < MAX_JOINED {
            return Ok(());
        }
        game.io.say(format!(
            "Maximum of {} raids joined. Waiting {:?} between checks for one to finish...",
            MAX_JOINED, self.slot_poll
        ));

        let mut poll = Poll::every(game.io.scaled(self.slot_poll)).delay_first();
        if let Some(max) = self.max_slot_polls {
            poll = poll.attempts(max);
        }
        let stop = game.io.ctx.stop.clone();
        let freed = poll_until(&stop, poll, |attempt| {
            debug!("Raid slot check #{}", attempt + 1);
            open_backup_requests(game)?;
            let joined = self.refresh_joined(game)?;
            Ok((joined < MAX_JOINED).then_some(joined))
        })?;

        match freed {
            Some(joined) => {
                info!("A raid slot freed up ({} joined)", joined);
                Ok(())
            }
            None => Err(BotError::unreached("No joined raid finished while waiting for a free slot")),
        }
    }

    /// Join one raid from the Enter ID tab. Gives up with
    /// `ResourceExhausted` after [`JOIN_CYCLES`] cycles without success.
    pub fn join(&mut self, game: &mut Game) -> BotResult<()> {
        let join_button = game
            .io
            .find("join_a_room", DEFAULT_TRIES)?
            .ok_or_else(|| BotError::unreached("Join a Room button not found on the Enter ID tab"))?;
        let text_box = join_button.offset(ROOM_CODE_TEXTBOX.for_class(game.io.ctx.profile.class()));

        for cycle in 1..=JOIN_CYCLES {
            for _ in 0..CODES_PER_CYCLE {
                if self.joined >= MAX_JOINED {
                    self.wait_for_slot(game)?;
                    game.io.find_and_click("enter_id", DEFAULT_TRIES)?;
                }

                if let Some(code) = self.feed.next_code() {
                    if let Some(outcome) = self.try_code(game, &code, join_button, text_box)? {
                        self.attempts.push(JoinAttempt {
                            room_code: code,
                            outcome,
                        });
                        if outcome == JoinOutcome::Joined {
                            return Ok(());
                        }
                    }
                }
                game.io.wait(1.0)?;
            }

            let left = JOIN_CYCLES - cycle;
            if left > 0 {
                warn!("No valid room codes this cycle, {} cycles left", left);
                game.io.say(format!(
                    "Could not find any valid room codes. Waiting {} seconds and trying again with {} tries left",
                    RECOVERY.as_secs(),
                    left
                ));
                game.io.ctx.stop.sleep(game.io.scaled(RECOVERY))?;
            }
        }

        Err(BotError::ResourceExhausted {
            cycles: JOIN_CYCLES,
            codes_per_cycle: CODES_PER_CYCLE,
        })
    }

    /// Paste `code`, tap join and classify what the game answered. `None`
    /// when the code never reached the text box.
    fn try_code(
        &mut self,
        game: &mut Game,
        code: &str,
        join_button: Point,
        text_box: Point,
    ) -> BotResult<Option<JoinOutcome>> {
        debug!("Trying room code {}", code);
        if !game.io.gestures.paste_code(text_box, code)? {
            return Ok(None);
        }
        game.io.tap(join_button, "join_a_room")?;

        if !game.io.find_and_click("ok", DEFAULT_TRIES)? {
            game.check_ep()?;
            self.joined += 1;
            game.io.say(format!("Joining {} was successful", code));
            return Ok(Some(JoinOutcome::Joined));
        }

        if !game.check_pending_battles()? {
            game.io.say(format!("{} already ended or is invalid", code));
            game.io.find_and_click("reload", DEFAULT_TRIES)?;
            return Ok(Some(JoinOutcome::Expired));
        }

        // Backlog cleared on the way; back to the Enter ID tab.
        game.io.find_and_click("quest", DEFAULT_TRIES)?;
        game.io.find_and_click("raid", DEFAULT_TRIES)?;
        game.io.wait(2.0)?;
        self.refresh_joined(game)?;
        game.io.find_and_click("enter_id", DEFAULT_TRIES)?;
        Ok(Some(JoinOutcome::Blocked))
    }
}

/// Home, Quest, then the Backup Requests list, clearing pending battles on the way.
fn open_backup_requests(game: &mut Game) -> BotResult<()> {
    game.go_back_home(true)?;
    game.io.find_and_click("quest", DEFAULT_TRIES)?;
    game.io.wait(1.0)?;
    if game.check_pending_battles()? {
        game.io.find_and_click("quest", DEFAULT_TRIES)?;
        game.io.wait(1.0)?;
    }
    game.io.find_and_click("raid", DEFAULT_TRIES)?;
    Ok(())
}

/// Raid mode: every run joins a fresh raid through its room code.
pub struct RaidController {
    session: GameModeSession,
    coordinator: RaidJoinCoordinator,
}

impl RaidController {
    pub fn new(session: GameModeSession, coordinator: RaidJoinCoordinator) -> Self {
        Self { session, coordinator }
    }

    pub fn coordinator(&self) -> &RaidJoinCoordinator {
        &self.coordinator
    }
}

impl GameModeController for RaidController {
    fn session(&self) -> &GameModeSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut GameModeSession {
        &mut self.session
    }

    fn navigate(&mut self, game: &mut Game) -> BotResult<()> {
        game.io.say(format!("Now navigating to join {}...", self.session.mission));
        game.go_back_home(true)?;
        game.io.find_and_click("quest", DEFAULT_TRIES)?;
        game.dismiss_retreat_notice(1)?;
        if game.check_pending_battles()? {
            game.io.find_and_click("quest", DEFAULT_TRIES)?;
            game.io.wait(1.0)?;
        }

        game.io.find_and_click("raid", DEFAULT_TRIES)?;
        game.io.wait(2.0)?;
        if !game.io.confirm("raid", DEFAULT_TRIES)? {
            return Err(self.session.screen_mismatch("raid"));
        }

        self.coordinator.refresh_joined(game)?;
        self.coordinator.wait_for_slot(game)?;

        game.io.say("Moving to the Enter ID tab of the Backup Requests screen...");
        if !game.io.find_and_click("enter_id", DEFAULT_TRIES)? {
            return Err(self.session.fail("Enter ID tab not found"));
        }
        self.coordinator.join(game)
    }

    /// Raids cannot be repeated; every run joins a new one.
    fn start(&mut self, game: &mut Game, _first_run: bool) -> BotResult<u32> {
        self.session.transition(NavState::Navigating);
        self.navigate(game)?;
        game.check_ep()?;
        fight_from_summon_selection(self, game, SUMMON_SCREEN_TRIES)
    }

    fn after_party(&mut self, game: &mut Game) -> BotResult<bool> {
        game.io.wait(1.0)?;
        if game.io.confirm("no_loot", 1)? {
            game.io.say("Seems that the raid just ended. Joining another one...");
            return Ok(false);
        }
        Ok(true)
    }
}
