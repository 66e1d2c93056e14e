use gbf_data::missions::{self, CoopSlot};
use gbf_state::{BotResult, GameModeSession, NavState};
use gbf_vision::DEFAULT_TRIES;

use crate::external::LootKind;
use crate::farm::GameModeController;
use crate::game::{Game, DRAG_NUDGE, DRAG_PAGE};

/// Co-op rooms: host once, then repeat from inside the room.
pub struct CoopController {
    session: GameModeSession,
    /// Whether the bot is sitting in a room it hosted
    room_open: bool,
}

impl CoopController {
    pub fn new(session: GameModeSession) -> Self {
        Self {
            session,
            room_open: false,
        }
    }

    fn slot(&self) -> BotResult<CoopSlot> {
        missions::coop_slot(&self.session.mission)
            .ok_or_else(|| self.session.fail(format!("Unknown Coop mission {}", self.session.mission)))
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

impl GameModeController for CoopController {
    fn session(&self) -> &GameModeSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut GameModeSession {
        &mut self.session
    }

    fn navigate(&mut self, game: &mut Game) -> BotResult<()> {
        let slot = self.slot()?;
        game.io.say(format!("Now hosting {}...", self.session.mission));
        game.go_back_home(true)?;
        game.io.find_and_click("home_menu", DEFAULT_TRIES)?;
        game.io.find_and_click("coop", DEFAULT_TRIES)?;
        game.io.wait(3.0)?;
        if !game.io.confirm("coop", DEFAULT_TRIES)? {
            return Err(self.session.screen_mismatch("coop"));
        }

        game.io.drag(DRAG_PAGE.0, DRAG_PAGE.1)?;
        game.io.wait(2.0)?;
        let (selected, unselected) = slot.tab.buttons();
        if !game.io.find_and_click(selected, 1)? {
            game.io.find_and_click(unselected, DEFAULT_TRIES)?;
        }
        game.io.wait(3.0)?;

        if !game.io.tap_nth("coop_host_quest", slot.host_index)? {
            return Err(self.session.fail("Host quest button not found"));
        }
        if !game.io.confirm(slot.header, DEFAULT_TRIES)? {
            return Err(self.session.screen_mismatch(slot.header));
        }
        if !game.io.tap_nth("coop_host_quest_circle", slot.circle_index)? {
            return Err(self.session.fail(format!("Quest circle for {} not found", self.session.mission)));
        }
        game.io.wait(3.0)?;

        game.io.find_and_click("coop_post_to_crew_chat", DEFAULT_TRIES)?;
        game.io.find_and_click("coop_ok", DEFAULT_TRIES)?;
        game.io.wait(3.0)?;
        game.dismiss_retreat_notice(1)?;
        game.io.drag(DRAG_NUDGE.0, DRAG_NUDGE.1)?;
        game.io.find_and_click("coop_select_party", DEFAULT_TRIES)?;
        Ok(())
    }

    fn start(&mut self, game: &mut Game, first_run: bool) -> BotResult<u32> {
        self.session.transition(NavState::Navigating);
        if first_run || !self.room_open {
            self.navigate(game)?;
            game.check_ap()?;
            game.io.wait(3.0)?;
            if !game.io.confirm("coop_without_support_summon", 10)? {
                return Err(self.session.screen_mismatch("coop_without_support_summon"));
            }
            self.session.transition(NavState::AwaitingPartySelection);
            let (group, party) = (self.session.group_number, self.session.party_number);
            game.select_party_and_start(group, party)?;
            self.room_open = true;
            game.io.find_and_click("coop_start", DEFAULT_TRIES)?;
            game.io.wait(1.0)?;
            return self.fight(game);
        }

        game.io.find_and_click("coop_room", DEFAULT_TRIES)?;
        game.io.wait(1.0)?;
        if game.io.confirm("coop_daily_missions", 1)? {
            game.io.say("The co-op room has closed. Hosting a new one...");
            self.room_open = false;
            return Ok(0);
        }
        game.check_ap()?;
        game.io.wait(3.0)?;
        self.fight(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCombat, FakeLoot, Stage};
    use gbf_data::{FarmingMode, Settings};

    fn settings() -> Settings {
        Settings {
            farming_mode: FarmingMode::Coop,
            mission: "EX2-3 Time of Revelation".into(),
            ..Settings::default()
        }
    }

    fn coop_lobby(stage: &Stage) {
        stage.with_screen(|screen| {
            screen.show_header("home");
            screen.show("home_menu");
            screen.show("coop");
        });
        stage.on_tap("coop", |screen| {
            screen.clear();
            screen.show_header("coop");
            screen.show("coop_extra");
            screen.show_many("coop_host_quest", 4);
        });
        stage.on_tap("coop_host_quest", |screen| {
            screen.clear();
            screen.show_header("coop_ex2");
            screen.show_many("coop_host_quest_circle", 4);
        });
        stage.on_tap("coop_host_quest_circle", |screen| {
            screen.clear();
            screen.show("coop_post_to_crew_chat");
            screen.show("coop_ok");
            screen.show("coop_select_party");
        });
        stage.on_tap("coop_select_party", |screen| {
            screen.clear();
            screen.show_header("coop_without_support_summon");
            screen.show("party_set_a");
            screen.show("ok");
            screen.show("coop_start_faded");
        });
    }

    #[test]
    fn test_hosts_the_right_quest_circle() {
        let stage = Stage::new();
        coop_lobby(&stage);
        let s = settings();
        let mut game = stage.game(s.clone(), FakeCombat::winning(), FakeLoot::fixed(1));
        let mut ctrl = CoopController::new(GameModeSession::from_settings(&s, vec![]));

        assert_eq!(ctrl.start(&mut game, true).unwrap(), 1);
        let hits = stage.hits();
        assert!(hits.contains(&("coop_host_quest".to_string(), 1)));
        assert!(hits.contains(&("coop_host_quest_circle".to_string(), 2)));
        assert!(stage.tapped().contains(&"coop_start_faded".to_string()));
    }

    #[test]
    fn test_closed_room_returns_nothing_and_hosts_again() {
        let stage = Stage::new();
        coop_lobby(&stage);
        stage.on_tap("coop_room", |screen| {
            screen.show_header("coop_daily_missions");
        });
        let s = settings();
        let combat = FakeCombat::winning();
        let mut game = stage.game(s.clone(), combat.clone(), FakeLoot::fixed(1));
        let mut ctrl = CoopController::new(GameModeSession::from_settings(&s, vec![]));

        ctrl.start(&mut game, true).unwrap();
        stage.with_screen(|screen| {
            screen.clear();
            screen.show("coop_room");
        });
        assert_eq!(ctrl.start(&mut game, false).unwrap(), 0);
        assert!(!ctrl.room_open);
        assert_eq!(combat.scripts().len(), 1);
    }

    #[test]
    fn test_open_room_repeats_without_navigation() {
        let stage = Stage::new();
        coop_lobby(&stage);
        let s = settings();
        let combat = FakeCombat::winning();
        let mut game = stage.game(s.clone(), combat.clone(), FakeLoot::fixed(1));
        let mut ctrl = CoopController::new(GameModeSession::from_settings(&s, vec![]));

        ctrl.start(&mut game, true).unwrap();
        stage.with_screen(|screen| {
            screen.clear();
            screen.show("coop_room");
        });
        assert_eq!(ctrl.start(&mut game, false).unwrap(), 1);
        assert_eq!(combat.scripts().len(), 2);
        assert_eq!(stage.tapped().iter().filter(|t| *t == "coop").count(), 1);
    }
}
