use gbf_data::missions::{self, template_name, Island, CHAPTER_ANCHOR, ISLANDS};
use gbf_input::ScrollDirection;
use gbf_state::{BotResult, GameModeSession};
use gbf_vision::DEFAULT_TRIES;
use tracing::debug;

use crate::farm::GameModeController;
use crate::game::Game;

/// Story quests on the world map islands.
pub struct QuestController {
    session: GameModeSession,
}

impl QuestController {
    pub fn new(session: GameModeSession) -> Self {
        Self { session }
    }

    /// Island the quest screen currently shows, from its `map_` header.
    fn current_island(&self, game: &mut Game) -> BotResult<Option<&'static Island>> {
        for island in ISLANDS {
            if game.io.confirm(&map_header(island.name), 1)? {
                return Ok(Some(island));
            }
        }
        Ok(None)
    }

    /// Travel to `target` from the world map.
    fn travel(&self, game: &mut Game, target: &Island, current: Option<&Island>) -> BotResult<()> {
        game.io.find_and_click("world", DEFAULT_TRIES)?;
        if current.is_some_and(|c| c.page != target.page) {
            game.io.find_and_click(target.page.switch_button(), DEFAULT_TRIES)?;
        }

        let label = template_name(target.name);
        if !game.io.find_and_click(&label, DEFAULT_TRIES)? {
            let offset = target
                .offset
                .ok_or_else(|| self.session.fail(format!("No way to tap {} on the world map", target.name)))?;
            let anchor = target.page.anchor();
            let arrow = game
                .io
                .find(anchor, DEFAULT_TRIES)?
                .ok_or_else(|| self.session.fail(format!("Unable to find the {} of the world map", anchor)))?;
            game.io.tap_offset(arrow, offset.for_class(game.io.ctx.profile.class()))?;
        }
        game.io.find_and_click("go", DEFAULT_TRIES)?;
        Ok(())
    }
}

fn map_header(island: &str) -> String {
    format!("map_{}", template_name(island))
}

impl GameModeController for QuestController {
    fn session(&self) -> &GameModeSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut GameModeSession {
        &mut self.session
    }

    fn navigate(&mut self, game: &mut Game) -> BotResult<()> {
        let target = missions::island(&self.session.map)
            .ok_or_else(|| self.session.fail(format!("Unknown map {}", self.session.map)))?;
        game.io.say(format!("Now navigating to {} on {}...", self.session.mission, target.name));
        game.go_back_home(true)?;

        let here = game.io.confirm(&map_header(target.name), 1)?;
        let current = if here { Some(target) } else { self.current_island(game)? };
        debug!("Current island: {:?}", current.map(|i| i.name));

        game.io.find_and_click("quest", DEFAULT_TRIES)?;
        game.io.wait(3.0)?;
        game.dismiss_retreat_notice(1)?;
        if !game.io.confirm("quest", DEFAULT_TRIES)? {
            return Err(self.session.screen_mismatch("quest"));
        }

        if !here {
            self.travel(game, target, current)?;
        }

        let chapter = missions::chapter_for(&self.session.mission)
            .ok_or_else(|| self.session.fail(format!("No chapter node for {}", self.session.mission)))?;
        let (world, _) = game
            .io
            .find_button(CHAPTER_ANCHOR, 2)?
            .ok_or_else(|| self.session.fail("Unable to find the World button"))?;
        game.io.tap_offset(world, chapter.offset.for_class(game.io.ctx.profile.class()))?;

        game.io.scroll(ScrollDirection::Down)?;
        game.io.wait(2.0)?;
        let node = template_name(&self.session.mission);
        if !game.io.find_and_click(&node, DEFAULT_TRIES)? {
            game.io.scroll(ScrollDirection::Down)?;
            game.io.wait(2.0)?;
            if !game.io.find_and_click(&node, DEFAULT_TRIES)? {
                return Err(self.session.fail(format!("Mission node for {} not found", self.session.mission)));
            }
        }
        for button in chapter.follow_up {
            game.io.find_and_click(button, DEFAULT_TRIES)?;
        }
        Ok(())
    }

    fn after_party(&mut self, game: &mut Game) -> BotResult<bool> {
        game.io.wait(1.0)?;
        if game.io.confirm("items_picked_up", 1)? {
            game.io.find_and_click("ok", DEFAULT_TRIES)?;
        }
        Ok(true)
    }
}
