//! Default combat, loot and room code implementations used by the binary.

use gbf_data::missions::template_name;
use gbf_nav::{Automation, CombatEngine, LootCollector, LootKind, LootOptions, RoomCodeFeed};
use gbf_state::BotError;
use gbf_vision::{Category, DEFAULT_TRIES};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Item names that count runs rather than drops
const RUN_COUNTERS: &[&str] = &["Repeated Runs", "Expeditions"];

/// Seconds between checks on a running battle
const BATTLE_POLL_SECONDS: f64 = 5.0;

/// Battles taking longer than this many polls are given up on
const BATTLE_POLLS: u32 = 240;

/// Turns on the game's Full Auto and waits for the battle to end. Script
/// lines other than `enableFullAuto` are ignored.
#[derive(Debug, Default)]
pub struct FullAutoCombat;

impl CombatEngine for FullAutoCombat {
    fn start_combat_mode(&mut self, io: &mut Automation, script: &[String]) -> Result<bool, BotError> {
        let ignored = script
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && !l.starts_with("Turn") && *l != "enableFullAuto" && *l != "end")
            .count();
        if ignored > 0 {
            warn!("Only Full Auto is supported, ignoring {} script lines", ignored);
        }

        io.say("Starting combat in Full Auto...");
        if io.find("attack", 10)?.is_none() {
            io.say("The battle has already ended");
            return Ok(false);
        }
        io.find_and_click("full_auto", DEFAULT_TRIES)?;

        for _ in 0..BATTLE_POLLS {
            if io.confirm("exp_gained", 1)? {
                io.say("Battle won");
                return Ok(true);
            }
            if io.confirm("battle_concluded", 1)? {
                io.say("The raid ended before the battle was won");
                io.find_and_click("reload", 1)?;
                return Ok(false);
            }
            if io.find_and_click("ok", 1)? {
                debug!("Closed a popup during battle");
            }
            io.wait(BATTLE_POLL_SECONDS)?;
        }
        warn!("Battle did not end after {} checks", BATTLE_POLLS);
        Ok(false)
    }
}

/// Counts the target item on the results screen. Run counters count one
/// per completed run.
#[derive(Debug, Default)]
pub struct ResultsScreenLoot;

impl LootCollector for ResultsScreenLoot {
    fn collect_loot(&mut self, io: &mut Automation, options: &LootOptions) -> Result<u32, BotError> {
        if !io.confirm("exp_gained", 5)? {
            debug!("Results screen not confirmed for {:?} loot", options.kind);
        }

        let amount = if RUN_COUNTERS.contains(&options.item_name.as_str()) {
            u32::from(options.kind != LootKind::SideEvent)
        } else {
            let item = template_name(&options.item_name);
            io.locator.find_all(&item, Category::Item)?.len() as u32
        };

        io.find_and_click("close", 1)?;
        io.find_and_click("ok", 1)?;

        if options.counts() && amount > 0 && !RUN_COUNTERS.contains(&options.item_name.as_str()) {
            io.ctx.notify(format!("{} x{} dropped", options.item_name, amount));
        }
        Ok(amount)
    }
}

/// The code in a backup-request post: the token right before `:Battle` or `:参戦ID`.
pub fn parse_room_code(line: &str) -> Option<&str> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens
        .windows(2)
        .find(|pair| pair[1].starts_with(":Battle") || pair[1].starts_with(":参戦ID"))
        .map(|pair| pair[0])
}

/// Room codes from a text file of backup-request posts, newest line last.
/// The file is re-read on every request and each code is handed out once.
pub struct TweetRoomCodeFeed {
    path: PathBuf,
    visited: HashSet<String>,
}

impl TweetRoomCodeFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            visited: HashSet::new(),
        }
    }
}

impl RoomCodeFeed for TweetRoomCodeFeed {
    fn next_code(&mut self) -> Option<String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to read room codes from {}: {}", self.path.display(), e);
                return None;
            }
        };
        for code in content.lines().rev().filter_map(parse_room_code) {
            if self.visited.insert(code.to_string()) {
                info!("Found room code {}", code);
                return Some(code.to_string());
            }
            debug!("Already visited {} this session", code);
        }
        None
    }
}
