pub mod external;
pub mod farm;
pub mod game;
pub mod modes;
pub mod raid;
pub mod side_event;

#[cfg(test)]
mod testing;

pub use external::{CombatEngine, LootCollector, LootKind, LootOptions, RoomCodeFeed};
pub use farm::{farm, GameModeController};
pub use game::{Automation, Game};
pub use modes::controller_for;
pub use raid::{RaidController, RaidJoinCoordinator};
pub use side_event::{SideEvent, SideEventKind};
