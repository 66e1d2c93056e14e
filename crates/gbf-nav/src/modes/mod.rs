pub mod arcarum;
pub mod coop;
pub mod dread_barrage;
pub mod event;
pub mod generic;
pub mod guild_wars;
pub mod quest;
pub mod rotb;
pub mod special;
pub mod xeno_clash;

pub use arcarum::{ArcarumAction, ArcarumController};
pub use coop::CoopController;
pub use dread_barrage::DreadBarrageController;
pub use event::EventController;
pub use generic::GenericController;
pub use guild_wars::GuildWarsController;
pub use quest::QuestController;
pub use rotb::RotbController;
pub use special::SpecialController;
pub use xeno_clash::XenoClashController;

use gbf_data::{FarmingMode, Settings};
use gbf_state::{BotResult, GameModeSession};

use crate::external::RoomCodeFeed;
use crate::farm::GameModeController;
use crate::raid::{RaidController, RaidJoinCoordinator};

/// The controller for the configured farming mode. Raid needs a room code
/// feed; the other modes ignore it.
pub fn controller_for(
    settings: &Settings,
    combat_script: Vec<String>,
    feed: Option<Box<dyn RoomCodeFeed>>,
) -> BotResult<Box<dyn GameModeController>> {
    let session = GameModeSession::from_settings(settings, combat_script);
    let controller: Box<dyn GameModeController> = match settings.farming_mode {
        FarmingMode::Quest => Box::new(QuestController::new(session)),
        FarmingMode::Special => Box::new(SpecialController::new(session)),
        FarmingMode::Coop => Box::new(CoopController::new(session)),
        FarmingMode::Raid => {
            let feed = feed.ok_or_else(|| session.fail("Raid farming needs a room code feed"))?;
            let coordinator = RaidJoinCoordinator::new(feed, &settings.raid);
            Box::new(RaidController::new(session, coordinator))
        }
        FarmingMode::Event => Box::new(EventController::new(session)),
        FarmingMode::EventTokenDrawboxes => Box::new(EventController::token_drawboxes(session)),
        FarmingMode::RiseOfTheBeasts => Box::new(RotbController::new(session)),
        FarmingMode::GuildWars => Box::new(GuildWarsController::new(session)),
        FarmingMode::Arcarum => Box::new(ArcarumController::new(session)),
        FarmingMode::DreadBarrage => Box::new(DreadBarrageController::new(session)),
        FarmingMode::XenoClash => Box::new(XenoClashController::new(session)),
        FarmingMode::Generic => Box::new(GenericController::new(session)),
    };
    Ok(controller)
}
