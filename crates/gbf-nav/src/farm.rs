use gbf_state::{BotResult, GameModeSession, NavState};
use tracing::{info, warn};

use crate::external::LootKind;
use crate::game::Game;
use crate::side_event::NoSideEvent;

/// Attempts at confirming the summon screen after navigation
pub const SUMMON_SCREEN_TRIES: u32 = 30;

/// One farming mode: how to reach its mission and how to run it once.
pub trait GameModeController {
    fn session(&self) -> &GameModeSession;

    fn session_mut(&mut self) -> &mut GameModeSession;

    /// Walk the menus from wherever the game is to the mission's summon
    /// selection screen.
    fn navigate(&mut self, game: &mut Game) -> BotResult<()>;

    /// Run the mission once and report how many target items dropped.
    fn start(&mut self, game: &mut Game, first_run: bool) -> BotResult<u32> {
        summon_run(self, game, first_run)
    }

    /// Popup sweep after "play again". True when the run was diverted and
    /// navigation has to start over.
    fn sweep_popups(&mut self, game: &mut Game) -> BotResult<bool> {
        game.check_for_popups(&mut NoSideEvent)
    }

    /// Mode checks between starting the mission and combat. False skips
    /// combat for this run.
    fn after_party(&mut self, _game: &mut Game) -> BotResult<bool> {
        Ok(true)
    }

    /// True once the mode has nothing left to run, target or not.
    fn finished(&self) -> bool {
        false
    }
}

/// Get to the summon screen: navigate on the first run, otherwise repeat
/// through "play again" when the results screen offers it, or clear the
/// pending battle backlog and navigate.
pub fn resume_or_navigate<C>(ctrl: &mut C, game: &mut Game, first_run: bool) -> BotResult<()>
where
    C: GameModeController + ?Sized,
{
    ctrl.session_mut().transition(NavState::Navigating);
    if first_run {
        return ctrl.navigate(game);
    }

    if game.io.find_and_click("play_again", 1)? {
        if ctrl.sweep_popups(game)? {
            info!("Run was diverted, navigating back to the mission");
            ctrl.navigate(game)?;
        }
        return Ok(());
    }

    game.check_pending_battles()?;
    ctrl.navigate(game)
}

/// Summon, party, combat and loot, starting from the summon screen.
pub fn fight_from_summon_selection<C>(ctrl: &mut C, game: &mut Game, summon_tries: u32) -> BotResult<u32>
where
    C: GameModeController + ?Sized,
{
    if !game.io.confirm("select_a_summon", summon_tries)? {
        return Err(ctrl.session().screen_mismatch("select_a_summon"));
    }
    ctrl.session_mut().transition(NavState::AwaitingSummonSelection);

    let summons = ctrl.session().summon_list.clone();
    if !game.select_summon(&summons)? {
        return Ok(0);
    }
    fight_from_party_selection(ctrl, game)
}

/// Party, combat and loot, for modes that skip the summon screen.
pub fn fight_from_party_selection<C>(ctrl: &mut C, game: &mut Game) -> BotResult<u32>
where
    C: GameModeController + ?Sized,
{
    ctrl.session_mut().transition(NavState::AwaitingPartySelection);
    let (group, party) = (ctrl.session().group_number, ctrl.session().party_number);
    if !game.select_party_and_start(group, party)? || !ctrl.after_party(game)? {
        ctrl.session_mut().transition(NavState::Idle);
        return Ok(0);
    }

    ctrl.session_mut().transition(NavState::InCombat);
    let script = ctrl.session().combat_script.clone();
    if !game.start_combat(&script)? {
        ctrl.session_mut().transition(NavState::Idle);
        return Ok(0);
    }

    ctrl.session_mut().transition(NavState::CollectingLoot);
    let dropped = game.collect_loot(LootKind::Completed)?;
    ctrl.session_mut().transition(NavState::Idle);
    Ok(dropped)
}

/// The usual run: reach the summon screen, make sure there is AP, fight.
pub fn summon_run<C>(ctrl: &mut C, game: &mut Game, first_run: bool) -> BotResult<u32>
where
    C: GameModeController + ?Sized,
{
    resume_or_navigate(ctrl, game, first_run)?;
    game.check_ap()?;
    fight_from_summon_selection(ctrl, game, SUMMON_SCREEN_TRIES)
}

/// Run `ctrl` until `target` items are farmed. Returns the amount farmed.
pub fn farm(game: &mut Game, ctrl: &mut dyn GameModeController, target: u32) -> BotResult<u32> {
    let mode = ctrl.session().mode;
    if mode.needs_summons() && ctrl.session().summon_list.is_empty() {
        return Err(ctrl.session().fail("No summons were selected"));
    }

    game.io.say(format!(
        "Farming {} {} from {} ({})",
        target,
        ctrl.session().item_name,
        ctrl.session().mission,
        mode
    ));

    let mut total = 0u32;
    let mut runs = 0u32;
    let mut first_run = true;
    while total < target {
        let dropped = match ctrl.start(game, first_run) {
            Ok(n) => n,
            Err(e) => {
                let err = ctrl.session().attach(e);
                if !err.is_cancelled() {
                    warn!("Run {} failed: {}", runs + 1, err);
                }
                return Err(err);
            }
        };
        first_run = false;
        runs += 1;
        total = total.saturating_add(dropped).saturating_add(game.take_backlog_items());
        game.io.say(format!(
            "Run #{} complete: {} / {} {}",
            runs,
            total.min(target),
            target,
            ctrl.session().item_name
        ));

        if ctrl.finished() {
            info!("{} has nothing left to run", mode);
            break;
        }
        if total < target {
            game.delay_between_runs()?;
        }
    }

    ctrl.session_mut().transition(NavState::Terminal);
    game.io.ctx.notify(format!(
        "Farming complete: {} {} in {} runs",
        total,
        ctrl.session().item_name,
        runs
    ));
    Ok(total)
}
