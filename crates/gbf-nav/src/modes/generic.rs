use gbf_state::{BotResult, GameModeSession, NavState};

use crate::external::LootKind;
use crate::farm::GameModeController;
use crate::game::Game;

/// How long the combat screen gets to show its attack button
const ATTACK_TRIES: u32 = 5;

/// How long the summon screen's OK button gets before party selection counts as missed
const SKIP_PARTY_TRIES: u32 = 10;

/// Repeats whatever mission the game is showing. There is no navigation:
/// every run starts either in combat or on a results screen that offers
/// "play again", and the party already set on the mission is kept.
pub struct GenericController {
    session: GameModeSession,
}

impl GenericController {
    pub fn new(session: GameModeSession) -> Self {
        Self { session }
    }

    fn fight(&mut self, game: &mut Game) -> BotResult<u32> {
        self.session.transition(NavState::InCombat);
        let script = self.session.combat_script.clone();
        if !game.start_combat(&script)? {
            self.session.transition(NavState::Idle);
            return Ok(0);
        }
        self.session.transition(NavState::CollectingLoot);
        let dropped = game.collect_loot(LootKind::Completed)?;
        self.session.transition(NavState::Idle);
        Ok(dropped)
    }
}

impl GameModeController for GenericController {
    fn session(&self) -> &GameModeSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut GameModeSession {
        &mut self.session
    }

    fn navigate(&mut self, _game: &mut Game) -> BotResult<()> {
        Err(self
            .session
            .fail("Generic farming cannot navigate, it only repeats the mission on screen"))
    }

    fn start(&mut self, game: &mut Game, _first_run: bool) -> BotResult<u32> {
        if game.io.find_button("attack", ATTACK_TRIES)?.is_some() {
            game.io.say("Already in combat. Starting Combat Mode now...");
            return self.fight(game);
        }

        self.session.transition(NavState::Navigating);
        if !game.io.find_and_click("play_again", 1)? {
            return Err(self.session.fail(
                "Failed to detect the Play Again button. Start in combat with the Attack button visible \
                 or on the results screen with the Play Again button visible",
            ));
        }
        if self.sweep_popups(game)? {
            return Err(self.session.fail("The mission was interrupted and Generic farming cannot navigate back"));
        }
        game.check_ap()?;

        if !game.io.confirm("select_a_summon", 1)? {
            return Err(self.session.screen_mismatch("select_a_summon"));
        }
        self.session.transition(NavState::AwaitingSummonSelection);
        let summons = self.session.summon_list.clone();
        if !game.select_summon(&summons)? {
            return Ok(0);
        }

        // The mission's own party is kept.
        if !game.io.find_and_click("ok", SKIP_PARTY_TRIES)? {
            return Err(self.session.fail("Failed to skip party selection"));
        }
        game.io.wait(1.0)?;
        self.fight(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCombat, FakeLoot, Stage};
    use gbf_data::{FarmingMode, Settings};
    use gbf_state::BotError;

    fn settings() -> Settings {
        Settings {
            farming_mode: FarmingMode::Generic,
            summons: vec!["Shiva".into()],
            ..Settings::default()
        }
    }

    fn controller(s: &Settings) -> GenericController {
        GenericController::new(GameModeSession::from_settings(s, vec!["enableFullAuto".into()]))
    }

    #[test]
    fn test_starts_in_combat() {
        let stage = Stage::new();
        stage.show("attack");
        let combat = FakeCombat::winning();
        let s = settings();
        let mut game = stage.game(s.clone(), combat.clone(), FakeLoot::fixed(4));

        assert_eq!(controller(&s).start(&mut game, true).unwrap(), 4);
        assert_eq!(combat.scripts().len(), 1);
        assert!(stage.tapped().is_empty());
    }

    #[test]
    fn test_play_again_skips_party_selection() {
        let stage = Stage::new();
        stage.show("play_again");
        stage.on_tap("play_again", |screen| {
            screen.clear();
            screen.show_header("select_a_summon");
            screen.show("summon_fire");
            screen.show_summon("shiva");
            screen.show("ok");
        });
        let s = settings();
        let loot = FakeLoot::fixed(1);
        let mut game = stage.game(s.clone(), FakeCombat::winning(), loot.clone());
        let mut ctrl = controller(&s);

        assert_eq!(ctrl.start(&mut game, false).unwrap(), 1);
        assert_eq!(stage.tapped(), vec!["play_again", "summon_fire", "shiva", "ok"]);
        assert!(stage.point_taps().is_empty());
        assert_eq!(loot.kinds(), vec![LootKind::Completed]);
        assert_eq!(ctrl.session.state, NavState::Idle);
    }

    #[test]
    fn test_unknown_screen_is_reported() {
        let stage = Stage::new();
        let s = settings();
        let mut game = stage.game(s.clone(), FakeCombat::winning(), FakeLoot::fixed(0));
        let err = controller(&s).start(&mut game, true).unwrap_err();
        assert!(matches!(err, BotError::Navigation { .. }), "{:?}", err);
        assert!(err.to_string().contains("Play Again"), "{}", err);
    }
}
