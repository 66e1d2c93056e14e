use gbf_data::missions::{self, template_name};
use gbf_data::offsets::SPECIAL_MAP_SELECT;
use gbf_input::ScrollDirection;
use gbf_state::{BotResult, GameModeSession};
use gbf_vision::DEFAULT_TRIES;

use crate::farm::GameModeController;
use crate::game::Game;
use crate::side_event::SideEvent;

const MAP_SEARCH_TRIES: u32 = 2;

/// Special quests. Angel Halo runs may be interrupted by Dimensional Halo.
pub struct SpecialController {
    session: GameModeSession,
    side: Option<SideEvent>,
}

impl SpecialController {
    pub fn new(session: GameModeSession) -> Self {
        let side = SideEvent::from_session(&session);
        Self { session, side }
    }
}

impl GameModeController for SpecialController {
    fn session(&self) -> &GameModeSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut GameModeSession {
        &mut self.session
    }

    fn navigate(&mut self, game: &mut Game) -> BotResult<()> {
        let map = missions::special_map(&self.session.map)
            .ok_or_else(|| self.session.fail(format!("Unknown Special map {}", self.session.map)))?;
        let steps = map
            .round_steps(&self.session.mission)
            .ok_or_else(|| self.session.fail(format!("{} is not on {}", self.session.mission, map.name)))?;
        game.io.say(format!("Now navigating to {} on {}...", self.session.mission, map.name));

        game.go_back_home(true)?;
        game.io.find_and_click("quest", DEFAULT_TRIES)?;
        game.io.wait(3.0)?;
        game.dismiss_retreat_notice(1)?;
        if !game.io.confirm("quest", DEFAULT_TRIES)? {
            return Err(self.session.screen_mismatch("quest"));
        }

        game.io.find_and_click("special", DEFAULT_TRIES)?;
        game.io.wait(3.0)?;
        if !game.io.confirm("special", DEFAULT_TRIES)? {
            return Err(self.session.screen_mismatch("special"));
        }

        let banner = template_name(map.name);
        let mut found = None;
        for _ in 0..MAP_SEARCH_TRIES {
            if map.scroll_first {
                game.io.scroll(ScrollDirection::Down)?;
                game.io.wait(1.0)?;
            }
            found = game.io.find(&banner, DEFAULT_TRIES)?;
            if found.is_some() {
                break;
            }
        }
        let banner_at = found.ok_or_else(|| self.session.fail(format!("{} not found on the Special screen", map.name)))?;
        game.io.tap_offset(banner_at, SPECIAL_MAP_SELECT.for_class(game.io.ctx.profile.class()))?;
        game.io.wait(3.0)?;

        // A single-quest map has just the one round button
        let steps = if steps.is_empty() { vec![0] } else { steps };
        for index in steps {
            if !game.io.tap_nth("play_round_button", index)? {
                return Err(self.session.fail(format!("Round button #{} for {} not found", index + 1, self.session.mission)));
            }
            game.io.wait(1.0)?;
        }
        Ok(())
    }

    fn sweep_popups(&mut self, game: &mut Game) -> BotResult<bool> {
        crate::side_event::sweep(game, self.side.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCombat, FakeLoot, Stage};
    use gbf_data::{FarmingMode, Settings};

    fn settings(map: &str, mission: &str) -> Settings {
        Settings {
            farming_mode: FarmingMode::Special,
            map: map.into(),
            mission: mission.into(),
            summons: vec!["Shiva".into()],
            ..Settings::default()
        }
    }

    fn special_screen(stage: &Stage) {
        stage.with_screen(|screen| {
            screen.show_header("home");
            screen.show("quest_blue");
        });
        stage.on_tap("quest_blue", |screen| {
            screen.clear();
            screen.show_header("quest");
            screen.show("special");
        });
        stage.on_tap("special", |screen| {
            screen.clear();
            screen.show_header("special");
            screen.show("basic_treasure_quests");
            screen.show_many("play_round_button", 3);
        });
    }

    #[test]
    fn test_quest_then_difficulty_round_buttons() {
        let stage = Stage::new();
        special_screen(&stage);
        let s = settings("Basic Treasure Quests", "H Cerulean Trial");
        let mut game = stage.game(s.clone(), FakeCombat::winning(), FakeLoot::fixed(0));

        SpecialController::new(GameModeSession::from_settings(&s, vec![]))
            .navigate(&mut game)
            .unwrap();

        assert_eq!(stage.tapped(), vec!["quest_blue", "special", "play_round_button", "play_round_button"]);
        // Cerulean is the second quest row, Hard the second difficulty.
        let hits = stage.hits();
        assert_eq!(&hits[2..], &[("play_round_button".to_string(), 1), ("play_round_button".to_string(), 1)]);
    }

    #[test]
    fn test_missing_round_button_fails_navigation() {
        let stage = Stage::new();
        special_screen(&stage);
        stage.on_tap("special", |screen| {
            screen.clear();
            screen.show_header("special");
            screen.show("basic_treasure_quests");
        });
        let s = settings("Basic Treasure Quests", "H Cerulean Trial");
        let mut game = stage.game(s.clone(), FakeCombat::winning(), FakeLoot::fixed(0));

        let err = SpecialController::new(GameModeSession::from_settings(&s, vec![]))
            .navigate(&mut game)
            .unwrap_err();
        assert!(matches!(err, gbf_state::BotError::Navigation { .. }), "{:?}", err);
        assert!(!stage.tapped().contains(&"play_round_button".to_string()));
    }

    #[test]
    fn test_unknown_map_fails_before_moving() {
        let stage = Stage::new();
        special_screen(&stage);
        let s = settings("Nowhere", "H Cerulean Trial");
        let mut game = stage.game(s.clone(), FakeCombat::winning(), FakeLoot::fixed(0));
        let err = SpecialController::new(GameModeSession::from_settings(&s, vec![]))
            .navigate(&mut game)
            .unwrap_err();
        assert!(matches!(err, gbf_state::BotError::Navigation { .. }));
        assert!(stage.tapped().is_empty());
    }
}
