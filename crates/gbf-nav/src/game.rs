use gbf_data::missions::template_name;
use gbf_data::offsets::{self, RESET_SUMMON_CHOICE};
use gbf_data::summons::element_of;
use gbf_data::{FarmingMode, Offset, Settings, SummonElement};
use gbf_input::{GestureDispatcher, ScrollDirection, TapOptions};
use gbf_state::{BotError, BotResult, Point, RunContext};
use gbf_vision::{Category, Locator, DEFAULT_TRIES};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::external::{CombatEngine, LootCollector, LootKind, LootOptions};
use crate::side_event::SideEventCheck;

const SWIPE_DURATION: Duration = Duration::from_millis(500);

/// Scroll pages searched per summon before moving to the next one
const SUMMON_PAGES: u32 = 8;

/// Pending battles the game keeps at most; bounds the clearing loop
const MAX_PENDING_BATTLES: u32 = 6;

const POPUP_SWEEPS: u32 = 5;

const REFILL_TRIES: u32 = 3;

const PARTY_SET_TRIES: u32 = 3;

/// Randomized delay bounds used when the configured ones make no sense
const FALLBACK_DELAY: (i64, i64) = (15, 60);

/// Buttons drawn in more than one style, tried in order.
fn button_variants(name: &str) -> Vec<&str> {
    match name {
        "quest" => vec!["quest_blue", "quest_red"],
        "raid" => vec!["raid_flat", "raid_bouncing"],
        "coop_start" => vec!["coop_start_flat", "coop_start_faded"],
        "event_special_quest" => vec!["event_special_quest_flat", "event_special_quest_bouncing"],
        "world" => vec!["world", "world2"],
        _ => vec![name],
    }
}

/// Screen access for one run: looking, tapping and waiting.
pub struct Automation {
    pub locator: Locator,
    pub gestures: GestureDispatcher,
    pub ctx: RunContext,
    time_scale: f64,
}

impl Automation {
    pub fn new(locator: Locator, gestures: GestureDispatcher, ctx: RunContext) -> Self {
        Self {
            locator,
            gestures,
            ctx,
            time_scale: 1.0,
        }
    }

    /// Multiply every explicit wait. Zero turns waits into stop checks.
    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.time_scale = scale.max(0.0);
        self
    }

    pub fn scaled(&self, duration: Duration) -> Duration {
        duration.mul_f64(self.time_scale)
    }

    /// Interruptible pause
    pub fn wait(&self, seconds: f64) -> BotResult<()> {
        self.ctx.stop.sleep(self.scaled(Duration::from_secs_f64(seconds)))
    }

    pub fn say(&self, message: impl AsRef<str>) {
        self.ctx.say(message);
    }

    pub fn find(&mut self, name: &str, tries: u32) -> BotResult<Option<Point>> {
        self.locator.find(name, tries)
    }

    /// Find a button under any of its known styles.
    pub fn find_button(&mut self, name: &str, tries: u32) -> BotResult<Option<(Point, String)>> {
        for variant in button_variants(name) {
            if let Some(p) = self.locator.find(variant, tries)? {
                return Ok(Some((p, variant.to_string())));
            }
        }
        Ok(None)
    }

    pub fn confirm(&mut self, name: &str, tries: u32) -> BotResult<bool> {
        self.locator.confirm_location(name, tries)
    }

    pub fn find_all(&mut self, name: &str) -> BotResult<Vec<Point>> {
        self.locator.find_all(name, Category::Button)
    }

    pub fn tap(&mut self, p: Point, template: &str) -> BotResult<bool> {
        self.gestures.tap(p, template, TapOptions::default())
    }

    /// Tap a spot that has no template of its own, relative to one that does.
    pub fn tap_offset(&mut self, anchor: Point, by: Offset) -> BotResult<bool> {
        self.gestures.tap_point(anchor.offset(by), false)
    }

    pub fn find_and_click(&mut self, name: &str, tries: u32) -> BotResult<bool> {
        match self.find_button(name, tries)? {
            Some((p, variant)) => self.tap(p, &variant),
            None => {
                debug!("Could not find and click {}", name);
                Ok(false)
            }
        }
    }

    /// Tap the `index`-th instance (reading order) of a repeated button.
    pub fn tap_nth(&mut self, name: &str, index: usize) -> BotResult<bool> {
        let found = self.find_all(name)?;
        match found.get(index) {
            Some(&p) => self.tap(p, name),
            None => {
                warn!("Wanted {} #{} but only {} are on screen", name, index + 1, found.len());
                Ok(false)
            }
        }
    }

    pub fn scroll(&mut self, direction: ScrollDirection) -> BotResult<bool> {
        self.gestures.scroll(direction)
    }

    /// Swipe between two points given as fractions of the screen size.
    pub fn drag(&mut self, from: (f64, f64), to: (f64, f64)) -> BotResult<bool> {
        let (w, h) = (self.ctx.profile.width as f64, self.ctx.profile.height as f64);
        let at = |(fx, fy): (f64, f64)| Point::new((fx * w).round() as i32, (fy * h).round() as i32);
        self.gestures.swipe(at(from), at(to), SWIPE_DURATION)
    }
}

/// Scroll most of a screen's height down
pub const DRAG_PAGE: ((f64, f64), (f64, f64)) = ((0.46, 0.52), (0.46, 0.21));

/// Nudge the screen down a little
pub const DRAG_NUDGE: ((f64, f64), (f64, f64)) = ((0.46, 0.52), (0.46, 0.36));

/// Navigation primitives shared by every farming mode.
pub struct Game {
    pub io: Automation,
    pub settings: Settings,
    combat: Box<dyn CombatEngine>,
    loot: Box<dyn LootCollector>,
    rng: StdRng,
    /// Group and party last picked on the party screen
    party: Option<(u32, u32)>,
    /// Items counted while clearing pending battles, not yet reported
    backlog_items: u32,
}

impl Game {
    pub fn new(
        io: Automation,
        settings: Settings,
        combat: Box<dyn CombatEngine>,
        loot: Box<dyn LootCollector>,
    ) -> Self {
        Self {
            io,
            settings,
            combat,
            loot,
            rng: StdRng::from_entropy(),
            party: None,
            backlog_items: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn mode(&self) -> FarmingMode {
        self.settings.farming_mode
    }

    /// Items gathered from the pending battle backlog since the last call
    pub fn take_backlog_items(&mut self) -> u32 {
        std::mem::take(&mut self.backlog_items)
    }

    pub fn go_back_home(&mut self, confirm: bool) -> BotResult<()> {
        if self.io.confirm("home", 1)? {
            info!("Bot is already at the Home screen");
        } else {
            self.io.say("Moving back to the Home screen...");
            if !self.io.find_and_click("home", DEFAULT_TRIES)? {
                return Err(BotError::unreached("HOME button is not found"));
            }
            self.io.wait(4.0)?;
            self.io.find_and_click("close", 1)?;
        }

        if confirm {
            self.io.wait(2.0)?;
            if !self.io.confirm("home", DEFAULT_TRIES)? {
                warn!("Home screen not confirmed, reloading the page");
                self.io.find_and_click("reload", 1)?;
                self.io.wait(4.0)?;
                if !self.io.confirm("home", DEFAULT_TRIES)? {
                    return Err(BotError::unreached("Failed to head back to the Home screen"));
                }
            }
        }
        Ok(())
    }

    pub fn check_for_captcha(&mut self) -> BotResult<()> {
        if self.io.confirm("captcha", 1)? {
            self.io.ctx.notify("CAPTCHA detected! Stopping the bot.");
            return Err(BotError::Captcha);
        }
        Ok(())
    }

    pub fn check_skyscope(&mut self) -> BotResult<()> {
        if self.io.confirm("skyscope", 1)? {
            self.io.find_and_click("close", DEFAULT_TRIES)?;
            self.io.wait(1.0)?;
        }
        Ok(())
    }

    pub fn check_friend_request(&mut self) -> BotResult<()> {
        if self.io.confirm("friend_request", 1)? {
            self.io.find_and_click("cancel", DEFAULT_TRIES)?;
            self.io.wait(2.0)?;
        }
        Ok(())
    }

    /// Rest between runs: a fixed delay, or a random one in `[lower, upper)`.
    pub fn delay_between_runs(&mut self) -> BotResult<()> {
        let delay = &self.settings.delay;
        let seconds = if delay.enabled {
            delay.seconds.max(0)
        } else if delay.randomized {
            let (lower, upper) = if delay.seconds < 0 || delay.upper_seconds <= delay.seconds {
                warn!(
                    "Invalid random delay bounds {}..{}, using {}..{}",
                    delay.seconds, delay.upper_seconds, FALLBACK_DELAY.0, FALLBACK_DELAY.1
                );
                FALLBACK_DELAY
            } else {
                (delay.seconds, delay.upper_seconds)
            };
            self.rng.gen_range(lower..upper)
        } else {
            return Ok(());
        };

        self.io.say(format!("Waiting {} seconds before the next run...", seconds));
        self.io.wait(seconds as f64)
    }

    pub fn check_ap(&mut self) -> BotResult<()> {
        let full = self.settings.refill.full_elixir;
        self.check_refill("ap", full)
    }

    pub fn check_ep(&mut self) -> BotResult<()> {
        let full = self.settings.refill.soul_balm;
        self.check_refill("ep", full)
    }

    /// Refill AP or EP when the game did not restore it on its own. `use`
    /// buttons are listed half elixir/soul berry first, then the full item.
    fn check_refill(&mut self, stat: &str, full: bool) -> BotResult<()> {
        if self.settings.refill.skip_auto_restore {
            debug!("Trusting auto-restore for {}", stat.to_uppercase());
            return Ok(());
        }
        self.io.wait(2.0)?;

        let recovered = format!("auto_{}_recovered", stat);
        let recovered_alt = format!("auto_{}_recovered2", stat);
        if self.io.confirm(&recovered, 1)? || self.io.confirm(&recovered_alt, 1)? {
            self.io.find_and_click("ok", DEFAULT_TRIES)?;
            return Ok(());
        }

        let summon_screen = match self.mode() {
            FarmingMode::Coop => "coop_without_support_summon",
            _ => "select_a_summon",
        };
        let not_enough = format!("not_enough_{}", stat);
        for _ in 0..REFILL_TRIES {
            if self.io.confirm(summon_screen, 1)? {
                break;
            }
            if self.io.confirm(&not_enough, 1)? {
                let item = if full { "full" } else { "half" };
                self.io.say(format!("{} ran out! Using the {} refill item...", stat.to_uppercase(), item));
                self.io.tap_nth("use", usize::from(full))?;
                self.io.wait(1.0)?;
                self.io.find_and_click("ok", DEFAULT_TRIES)?;
            }
        }
        info!("{} is available", stat.to_uppercase());
        Ok(())
    }

    /// Tap the first summon from `summons` found on the selection screen.
    /// When none is listed, refresh the supporters and report false.
    pub fn select_summon(&mut self, summons: &[String]) -> BotResult<bool> {
        for summon in summons {
            let element = element_of(summon).unwrap_or(SummonElement::Misc);
            self.io.say(format!("Looking for {} under the {:?} tab...", summon, element));
            self.io.find_and_click(element.tab_template(), 1)?;

            let name = template_name(summon);
            for _ in 0..SUMMON_PAGES {
                if let Some(found) = self.io.locator.locate(&name, Category::Summon, 1, false)? {
                    self.io.tap(found.location, &name)?;
                    self.io.say(format!("Selected {}", summon));
                    self.check_for_captcha()?;
                    return Ok(true);
                }
                if self.io.find("bottom_of_summon_selection", 1)?.is_some() {
                    for _ in 0..3 {
                        self.io.scroll(ScrollDirection::Up)?;
                    }
                    break;
                }
                self.io.scroll(ScrollDirection::Down)?;
            }
            warn!("Could not locate {}", summon);
        }

        self.io.say("None of the chosen summons are available. Resetting the support summon list...");
        self.reset_summons()?;
        Ok(false)
    }

    /// Start and retreat from a trial battle, which makes the game refresh
    /// the support summon list.
    pub fn reset_summons(&mut self) -> BotResult<()> {
        self.go_back_home(true)?;
        self.io.drag(DRAG_PAGE.0, DRAG_PAGE.1)?;

        if !self.io.find_and_click("gameplay_extras", DEFAULT_TRIES)? {
            warn!("Gameplay Extras not found, summons were not reset");
            return Ok(());
        }
        let mut found = false;
        for _ in 0..3 {
            if self.io.find_and_click("trial_battles", DEFAULT_TRIES)? {
                found = true;
                break;
            }
            self.io.drag(DRAG_PAGE.0, DRAG_PAGE.1)?;
        }
        if !found || !self.io.confirm("trial_battles", DEFAULT_TRIES)? {
            return Err(BotError::unreached("Failed to reach the Trial Battles screen"));
        }

        self.io.find_and_click("trial_battles_old_lignoid", DEFAULT_TRIES)?;
        self.io.find_and_click("play_round_button", DEFAULT_TRIES)?;
        let anchor = self
            .io
            .find("choose_a_summon", DEFAULT_TRIES)?
            .ok_or_else(|| BotError::unreached("Summon list of the trial battle not found"))?;
        self.io.tap_offset(anchor, RESET_SUMMON_CHOICE)?;
        self.io.wait(3.0)?;

        self.io.find_and_click("menu", 30)?;
        self.io.find_and_click("retreat", 30)?;
        self.io.find_and_click("retreat_confirmation", 30)?;
        self.go_back_home(false)?;
        self.io.say("Summons have been reset");
        Ok(())
    }

    /// Pick group and party (unless they are already the selected ones) and
    /// start the mission. False means there is nothing to fight: the raid
    /// ended while the party screen was up.
    pub fn select_party_and_start(&mut self, group: u32, party: u32) -> BotResult<bool> {
        if self.party != Some((group, party)) {
            self.io.wait(1.0)?;
            let (preferred, _) = offsets::group_set(group);
            let other = if preferred == "party_set_a" { "party_set_b" } else { "party_set_a" };

            let mut anchor = None;
            for _ in 0..PARTY_SET_TRIES {
                if let Some(p) = self.io.find(preferred, DEFAULT_TRIES)? {
                    anchor = Some(p);
                    break;
                }
                if let Some(p) = self.io.find(other, DEFAULT_TRIES)? {
                    // Switch tabs; the other set button sits at the same spot.
                    self.io.tap(p, other)?;
                    anchor = Some(p);
                    break;
                }
            }
            let anchor = anchor.ok_or_else(|| {
                BotError::unreached(format!("Could not find the {} button", preferred))
            })?;

            let class = self.io.ctx.profile.class();
            self.io.say(format!("Selecting Group {}, Party {}", group, party));
            self.io.tap_offset(anchor, offsets::group_offset(class, group))?;
            self.io.wait(1.0)?;
            self.io.tap_offset(anchor, offsets::party_offset(class, party))?;
            self.io.wait(1.0)?;
            self.party = Some((group, party));
        }

        if !self.io.find_and_click("ok", DEFAULT_TRIES)? {
            warn!("OK button on the party screen was not found");
        }
        self.io.wait(1.0)?;

        if self.mode() == FarmingMode::Raid && self.io.find_and_click("ok", 1)? {
            self.io.say("The raid has already ended or is full");
            self.io.wait(3.0)?;
            return Ok(false);
        }
        Ok(true)
    }

    pub fn start_combat(&mut self, script: &[String]) -> BotResult<bool> {
        self.combat.start_combat_mode(&mut self.io, script)
    }

    pub fn collect_loot(&mut self, kind: LootKind) -> BotResult<u32> {
        let options = LootOptions::new(self.settings.item_name.clone(), kind);
        let amount = self.loot.collect_loot(&mut self.io, &options)?;
        Ok(if options.counts() { amount } else { 0 })
    }

    /// Dismiss whatever popped up after "play again" until the summon screen
    /// shows. True means the run was diverted (side event, not enough
    /// treasure) and the caller has to navigate again.
    pub fn check_for_popups(&mut self, side: &mut dyn SideEventCheck) -> BotResult<bool> {
        let mode = self.mode();
        let refill = !self.settings.refill.skip_auto_restore;

        for _ in 0..POPUP_SWEEPS {
            if self.io.confirm("select_a_summon", 1)? {
                return Ok(false);
            }
            if refill
                && (self.io.confirm("auto_ap_recovered", 1)?
                    || self.io.confirm("auto_ap_recovered2", 1)?
                    || self.io.confirm("not_enough_ap", 1)?)
            {
                break;
            }
            if mode == FarmingMode::RiseOfTheBeasts && self.io.confirm("rotb_proud_solo_quest", 1)? {
                self.io.scroll(ScrollDirection::Down)?;
            }
            if side.check(self)? {
                return Ok(true);
            }
            if matches!(mode, FarmingMode::EventTokenDrawboxes | FarmingMode::GuildWars)
                && self.io.confirm("not_enough_treasure", 1)?
            {
                self.io.find_and_click("ok", DEFAULT_TRIES)?;
                return Ok(true);
            }
            if !self.io.find_and_click("close", 1)? {
                self.io.find_and_click("cancel", 1)?;
            }
        }
        Ok(false)
    }

    /// Clear the pending battle backlog if the game is asking for it.
    /// True when a backlog was found.
    pub fn check_pending_battles(&mut self) -> BotResult<bool> {
        self.io.wait(1.0)?;
        let found = self.io.confirm("check_your_pending_battles", 2)?
            || self.io.confirm("pending_battles", 2)?
            || self.io.find_and_click("quest_results_pending_battles", 2)?;
        if !found {
            return Ok(false);
        }

        self.io.say("Found Pending Battles that need collecting from");
        self.io.find_and_click("ok", DEFAULT_TRIES)?;
        self.io.wait(3.0)?;

        if self.io.confirm("pending_battles", DEFAULT_TRIES)? {
            for _ in 0..MAX_PENDING_BATTLES {
                if !self.clear_pending_battle()? {
                    break;
                }
                if self.io.find_and_click("quest_results_pending_battles", DEFAULT_TRIES)? {
                    self.io.wait(1.0)?;
                    self.check_skyscope()?;
                } else {
                    self.io.find_and_click("home", DEFAULT_TRIES)?;
                    self.io.wait(1.0)?;
                    self.check_skyscope()?;
                    break;
                }
            }
        }
        Ok(true)
    }

    fn clear_pending_battle(&mut self) -> BotResult<bool> {
        if !self.io.find_and_click("tap_here_to_see_rewards", 10)? {
            return Ok(false);
        }
        self.io.wait(2.0)?;

        if self.io.confirm("no_loot", DEFAULT_TRIES)? {
            self.io.say("No loot can be collected from this Pending Battle");
            self.io.find_and_click("quests", DEFAULT_TRIES)?;
            return Ok(true);
        }

        let kind = match self.mode() {
            FarmingMode::Raid => LootKind::Completed,
            _ => LootKind::PendingBattle,
        };
        let amount = self.collect_loot(kind)?;
        self.backlog_items += amount;
        self.io.find_and_click("close", 1)?;
        self.io.find_and_click("ok", 1)?;
        Ok(true)
    }

    /// Open the `index`-th event banner from the home menu.
    pub fn open_event_banner(&mut self, index: usize) -> BotResult<()> {
        let mut banners = self.io.find_all("event_banner")?;
        if banners.is_empty() {
            banners = self.io.find_all("event_banner_blue")?;
        }
        let banner = banners.get(index).copied().ok_or_else(|| {
            BotError::unreached(format!("Event banner #{} not found in the home menu", index + 1))
        })?;
        self.io.tap(banner, "event_banner")?;
        Ok(())
    }

    /// Close the "retreated from the raid battle" notice if it is up.
    pub fn dismiss_retreat_notice(&mut self, tries: u32) -> BotResult<()> {
        if self.io.confirm("you_retreated_from_the_raid_battle", tries)? {
            self.io.find_and_click("ok", DEFAULT_TRIES)?;
        }
        Ok(())
    }
}
