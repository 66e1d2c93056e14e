//! A scripted game screen for driving navigation code in tests.
//!
//! Elements are drawn as small noise glyphs on a flat background, one per
//! grid slot, so the real template matcher finds them. Taps are hit-tested
//! against the glyphs and can trigger reactions that change the screen.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use gbf_capture::{Frame, FrameSource};
use gbf_data::missions::{
    template_name, ARCARUM_MAPS, CHAPTERS, GUILD_WARS_NIGHTMARES, ISLANDS, ROTB_BEASTS, SPECIAL_MAPS,
};
use gbf_data::{DeviceHints, ScreenProfile, Settings, SummonElement};
use gbf_input::{GestureDispatcher, InputInjector};
use gbf_state::{BotError, MessageSink, Point, RunContext, StopSignal};
use gbf_vision::{Category, Locator, Template, TemplateStore};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::external::{CombatEngine, LootCollector, LootKind, LootOptions, RoomCodeFeed};
use crate::game::{Automation, Game};

const WIDTH: u32 = 200;
const HEIGHT: u32 = 120;
const BACKGROUND: u8 = 128;

const GLYPH_W: u32 = 12;
const GLYPH_H: u32 = 8;
const COLUMNS: usize = 8;
const ROWS: usize = 6;
const SLOTS: usize = COLUMNS * ROWS;

/// Sources scanned for the asset names navigation can ask for.
const SOURCES: &[&str] = &[
    include_str!("game.rs"),
    include_str!("farm.rs"),
    include_str!("raid.rs"),
    include_str!("side_event.rs"),
    include_str!("external.rs"),
    include_str!("modes/arcarum.rs"),
    include_str!("modes/coop.rs"),
    include_str!("modes/dread_barrage.rs"),
    include_str!("modes/event.rs"),
    include_str!("modes/generic.rs"),
    include_str!("modes/guild_wars.rs"),
    include_str!("modes/quest.rs"),
    include_str!("modes/rotb.rs"),
    include_str!("modes/special.rs"),
    include_str!("modes/xeno_clash.rs"),
    include_str!("../../gbf-data/src/missions.rs"),
    include_str!("../../gbf-data/src/summons.rs"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    Button,
    Header,
    Summon,
}

impl Kind {
    const ALL: [Kind; 3] = [Kind::Button, Kind::Header, Kind::Summon];

    fn category(self) -> Category {
        match self {
            Self::Button => Category::Button,
            Self::Header => Category::Header,
            Self::Summon => Category::Summon,
        }
    }
}

/// Deterministic noise per (kind, name), so the button and the header of
/// the same name never match each other.
fn glyph(kind: Kind, name: &str) -> GrayImage {
    let mut hasher = DefaultHasher::new();
    (kind, name).hash(&mut hasher);
    let mut rng = StdRng::seed_from_u64(hasher.finish());
    GrayImage::from_fn(GLYPH_W, GLYPH_H, |_, _| Luma([rng.gen_range(0..=255u8)]))
}

fn slot_origin(slot: usize) -> (u32, u32) {
    let (col, row) = ((slot % COLUMNS) as u32, (slot / COLUMNS) as u32);
    (4 + 24 * col, 4 + 19 * row)
}

struct Element {
    kind: Kind,
    name: String,
    slot: usize,
}

impl Element {
    fn contains(&self, p: Point) -> bool {
        let (x, y) = slot_origin(self.slot);
        let (x, y) = (x as i32, y as i32);
        (x..x + GLYPH_W as i32).contains(&p.x) && (y..y + GLYPH_H as i32).contains(&p.y)
    }

    fn center(&self) -> Point {
        let (x, y) = slot_origin(self.slot);
        Point::new((x + GLYPH_W / 2) as i32, (y + GLYPH_H / 2) as i32)
    }
}

/// What is currently on screen. Elements take the first free grid slot, so
/// reading order follows slot order.
#[derive(Default)]
pub struct Screen {
    elements: Vec<Element>,
    last_paste: Option<String>,
}

impl Screen {
    pub fn show(&mut self, name: &str) {
        self.place(Kind::Button, name);
    }

    pub fn show_header(&mut self, name: &str) {
        self.place(Kind::Header, name);
    }

    pub fn show_summon(&mut self, name: &str) {
        self.place(Kind::Summon, name);
    }

    pub fn show_many(&mut self, name: &str, n: usize) {
        for _ in 0..n {
            self.show(name);
        }
    }

    /// Remove every element with this name, whatever its kind
    pub fn hide(&mut self, name: &str) {
        self.elements.retain(|e| e.name != name);
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn is_shown(&self, name: &str) -> bool {
        self.elements.iter().any(|e| e.name == name)
    }

    /// Buttons with this name
    pub fn count(&self, name: &str) -> usize {
        self.elements
            .iter()
            .filter(|e| e.kind == Kind::Button && e.name == name)
            .count()
    }

    /// Text most recently pasted into a field
    pub fn last_paste(&self) -> Option<String> {
        self.last_paste.clone()
    }

    fn place(&mut self, kind: Kind, name: &str) {
        let slot = (0..SLOTS)
            .find(|s| self.elements.iter().all(|e| e.slot != *s))
            .expect("screen is full");
        self.elements.push(Element {
            kind,
            name: name.to_string(),
            slot,
        });
    }

    fn sorted(&self) -> Vec<&Element> {
        let mut sorted: Vec<&Element> = self.elements.iter().collect();
        sorted.sort_by_key(|e| e.slot);
        sorted
    }

    /// The element under `p` and its index among same-named elements of its kind
    fn element_at(&self, p: Point) -> Option<(String, usize)> {
        let hit = self.elements.iter().find(|e| e.contains(p))?;
        let index = self
            .sorted()
            .iter()
            .filter(|e| e.kind == hit.kind && e.name == hit.name)
            .position(|e| e.slot == hit.slot)?;
        Some((hit.name.clone(), index))
    }

    fn centers_of(&self, name: &str) -> Vec<Point> {
        self.sorted()
            .iter()
            .filter(|e| e.name == name)
            .map(|e| e.center())
            .collect()
    }

    fn render(&self) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(WIDTH, HEIGHT, Rgba([BACKGROUND, BACKGROUND, BACKGROUND, 255]));
        for e in &self.elements {
            let (ox, oy) = slot_origin(e.slot);
            for (x, y, px) in glyph(e.kind, &e.name).enumerate_pixels() {
                let v = px[0];
                img.put_pixel(ox + x, oy + y, Rgba([v, v, v, 255]));
            }
        }
        img
    }
}

type Reaction = Box<dyn FnMut(&mut Screen) + Send>;

enum Entry {
    Tap { target: Option<(String, usize)>, at: Point },
    Note(String),
    Paste(String),
}

#[derive(Default)]
struct StageState {
    screen: Screen,
    reactions: HashMap<String, Reaction>,
    swipe: Option<Reaction>,
    journal: Vec<Entry>,
    said: Vec<String>,
    notified: Vec<String>,
}

/// Shared handle on the scripted screen and everything that happened to it.
#[derive(Clone, Default)]
pub struct Stage {
    state: Arc<Mutex<StageState>>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StageState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn show(&self, name: &str) {
        self.lock().screen.show(name);
    }

    pub fn show_header(&self, name: &str) {
        self.lock().screen.show_header(name);
    }

    pub fn show_summon(&self, name: &str) {
        self.lock().screen.show_summon(name);
    }

    pub fn show_many(&self, name: &str, n: usize) {
        self.lock().screen.show_many(name, n);
    }

    pub fn with_screen(&self, f: impl FnOnce(&mut Screen)) {
        f(&mut self.lock().screen);
    }

    /// Run `reaction` whenever an element named `name` is tapped. Replaces
    /// any earlier reaction for that name.
    pub fn on_tap(&self, name: &str, reaction: impl FnMut(&mut Screen) + Send + 'static) {
        self.lock().reactions.insert(name.to_string(), Box::new(reaction));
    }

    pub fn on_swipe(&self, reaction: impl FnMut(&mut Screen) + Send + 'static) {
        self.lock().swipe = Some(Box::new(reaction));
    }

    /// Mark a point in the journal
    pub fn note(&self, text: &str) {
        self.lock().journal.push(Entry::Note(text.to_string()));
    }

    /// Names of the elements tapped, in order
    pub fn tapped(&self) -> Vec<String> {
        self.hits().into_iter().map(|(name, _)| name).collect()
    }

    /// Tapped elements with their index among same-named elements
    pub fn hits(&self) -> Vec<(String, usize)> {
        self.lock()
            .journal
            .iter()
            .filter_map(|e| match e {
                Entry::Tap { target, .. } => target.clone(),
                _ => None,
            })
            .collect()
    }

    /// Taps that landed on no element
    pub fn point_taps(&self) -> Vec<Point> {
        self.lock()
            .journal
            .iter()
            .filter_map(|e| match e {
                Entry::Tap { target: None, at } => Some(*at),
                _ => None,
            })
            .collect()
    }

    /// Taps by element name, notes and pasted codes in the order they happened
    pub fn journal(&self) -> Vec<String> {
        self.lock()
            .journal
            .iter()
            .filter_map(|e| match e {
                Entry::Tap { target, .. } => target.as_ref().map(|(name, _)| name.clone()),
                Entry::Note(text) | Entry::Paste(text) => Some(text.clone()),
            })
            .collect()
    }

    pub fn pasted(&self) -> Vec<String> {
        self.lock()
            .journal
            .iter()
            .filter_map(|e| match e {
                Entry::Paste(code) => Some(code.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn said(&self) -> Vec<String> {
        self.lock().said.clone()
    }

    pub fn notified(&self) -> Vec<String> {
        self.lock().notified.clone()
    }

    /// Center of the first element with this name
    pub fn center_of(&self, name: &str) -> Point {
        self.centers_of(name)
            .first()
            .copied()
            .unwrap_or_else(|| panic!("{} is not on screen", name))
    }

    pub fn centers_of(&self, name: &str) -> Vec<Point> {
        self.lock().screen.centers_of(name)
    }

    /// A game wired to this screen. Waits are scaled to nothing.
    pub fn game(&self, settings: Settings, combat: FakeCombat, loot: FakeLoot) -> Game {
        let profile = ScreenProfile::detect(WIDTH, HEIGHT, 0, &DeviceHints::default());
        let ctx = RunContext::new(profile, Arc::new(StageSink(self.clone())));

        let store = Arc::new(TemplateStore::new("/nonexistent", 1.0));
        for name in self.asset_names(&settings) {
            for kind in Kind::ALL {
                store.insert(kind.category(), Template::new(name.clone(), glyph(kind, &name)));
            }
        }

        let frames = StageFrames {
            stage: self.clone(),
            seq: 0,
        };
        let locator = Locator::new(Box::new(frames), Arc::clone(&store), settings.confidence.clone(), ctx.clone())
            .with_retry_interval(Duration::from_millis(1));
        let injector = StageInjector {
            stage: self.clone(),
            ctx: ctx.clone(),
        };
        let gestures = GestureDispatcher::new(Box::new(injector), store, ctx.clone())
            .with_seed(7)
            .with_settle(Duration::from_millis(1));
        let io = Automation::new(locator, gestures, ctx).with_time_scale(0.0);
        Game::new(io, settings, Box::new(combat), Box::new(loot)).with_seed(7)
    }

    /// Every asset name navigation may look up: string literals of the
    /// navigation sources, names derived from the mission tables, and
    /// whatever is on screen right now.
    fn asset_names(&self, settings: &Settings) -> HashSet<String> {
        let mut names = HashSet::new();
        let mut add = |name: String| {
            if !name.is_empty() {
                names.insert(name);
            }
        };

        for literal in SOURCES.iter().flat_map(|src| string_literals(src)) {
            if literal.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
                add(literal.clone());
            }
            add(template_name(&literal));
        }
        for stat in ["ap", "ep"] {
            add(format!("auto_{}_recovered", stat));
            add(format!("auto_{}_recovered2", stat));
            add(format!("not_enough_{}", stat));
        }
        for island in ISLANDS {
            add(template_name(island.name));
            add(format!("map_{}", template_name(island.name)));
            add(island.page.anchor().to_string());
            add(island.page.switch_button().to_string());
            for mission in island.missions {
                add(template_name(mission));
            }
        }
        for chapter in CHAPTERS {
            for button in chapter.follow_up {
                add(button.to_string());
            }
        }
        for map in SPECIAL_MAPS {
            add(template_name(map.name));
        }
        for element in [
            SummonElement::Fire,
            SummonElement::Water,
            SummonElement::Earth,
            SummonElement::Wind,
            SummonElement::Light,
            SummonElement::Dark,
            SummonElement::Misc,
        ] {
            add(element.tab_template().to_string());
        }
        for beast in ROTB_BEASTS {
            add(format!("rotb_raid_{}", template_name(beast)));
        }
        for map in ARCARUM_MAPS {
            add(format!("arcarum_{}", template_name(map)));
        }
        for (_, button) in GUILD_WARS_NIGHTMARES {
            add(button.to_string());
        }
        for summon in &settings.summons {
            add(template_name(summon));
        }
        for e in &self.lock().screen.elements {
            add(e.name.clone());
        }
        names
    }
}

/// Contents of the string literals in Rust source, skipping comments and
/// char literals.
fn string_literals(src: &str) -> Vec<String> {
    let chars: Vec<char> = src.chars().collect();
    let mut literals = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '\'' if chars.get(i + 2) == Some(&'\'') => i += 3,
            '\'' if chars.get(i + 1) == Some(&'\\') && chars.get(i + 3) == Some(&'\'') => i += 4,
            '"' => {
                let mut literal = String::new();
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    if let Some(&c) = chars.get(i) {
                        literal.push(c);
                    }
                    i += 1;
                }
                literals.push(literal);
            }
            _ => {}
        }
        i += 1;
    }
    literals
}

struct StageSink(Stage);

impl MessageSink for StageSink {
    fn post(&self, message: &str) {
        self.0.lock().said.push(message.to_string());
    }

    fn notify(&self, message: &str) {
        self.0.lock().notified.push(message.to_string());
    }
}

struct StageFrames {
    stage: Stage,
    seq: u64,
}

impl FrameSource for StageFrames {
    fn frame_since(&mut self, not_before: Instant, stop: &StopSignal) -> Result<Arc<Frame>, BotError> {
        stop.sleep_until(not_before)?;
        let image = self.stage.lock().screen.render();
        self.seq += 1;
        Ok(Arc::new(Frame::new(image, Instant::now(), self.seq)))
    }
}

struct StageInjector {
    stage: Stage,
    ctx: RunContext,
}

impl InputInjector for StageInjector {
    fn tap(&mut self, p: Point, hold: Option<Duration>) -> anyhow::Result<()> {
        let mut state = self.stage.lock();
        let state = &mut *state;

        // A long press on a text field pastes whatever is waiting to be pasted.
        if hold.is_some() {
            if let Some(code) = self.ctx.mailbox.take() {
                state.screen.last_paste = Some(code.clone());
                state.journal.push(Entry::Paste(code));
            }
            return Ok(());
        }

        let target = state.screen.element_at(p);
        state.journal.push(Entry::Tap {
            target: target.clone(),
            at: p,
        });
        if let Some((name, _)) = target {
            if let Some(reaction) = state.reactions.get_mut(&name) {
                reaction(&mut state.screen);
            }
        }
        Ok(())
    }

    fn stroke(&mut self, _from: Point, _to: Point, _duration: Duration) -> anyhow::Result<()> {
        let mut state = self.stage.lock();
        let state = &mut *state;
        if let Some(reaction) = state.swipe.as_mut() {
            reaction(&mut state.screen);
        }
        Ok(())
    }
}

/// Combat that ends at once, won or lost, recording the scripts it was given.
#[derive(Clone)]
pub struct FakeCombat {
    wins: bool,
    scripts: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeCombat {
    pub fn winning() -> Self {
        Self {
            wins: true,
            scripts: Arc::default(),
        }
    }

    pub fn losing() -> Self {
        Self {
            wins: false,
            ..Self::winning()
        }
    }

    pub fn scripts(&self) -> Vec<Vec<String>> {
        self.scripts.lock().unwrap().clone()
    }
}

impl CombatEngine for FakeCombat {
    fn start_combat_mode(&mut self, _io: &mut Automation, script: &[String]) -> Result<bool, BotError> {
        self.scripts.lock().unwrap().push(script.to_vec());
        Ok(self.wins)
    }
}

/// Loot screens that always yield the same amount
#[derive(Clone)]
pub struct FakeLoot {
    amount: u32,
    kinds: Arc<Mutex<Vec<LootKind>>>,
}

impl FakeLoot {
    pub fn fixed(amount: u32) -> Self {
        Self {
            amount,
            kinds: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.kinds.lock().unwrap().len()
    }

    pub fn kinds(&self) -> Vec<LootKind> {
        self.kinds.lock().unwrap().clone()
    }
}

impl LootCollector for FakeLoot {
    fn collect_loot(&mut self, _io: &mut Automation, options: &LootOptions) -> Result<u32, BotError> {
        self.kinds.lock().unwrap().push(options.kind);
        Ok(self.amount)
    }
}

pub struct FakeFeed {
    codes: VecDeque<String>,
}

impl FakeFeed {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            codes: codes.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl RoomCodeFeed for FakeFeed {
    fn next_code(&mut self) -> Option<String> {
        self.codes.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_literals_skip_comments_and_chars() {
        let src = "let a = \"ok\"; // \"not this\"\nlet q = '\"'; f(\"a\\\"b\");";
        assert_eq!(string_literals(src), vec!["ok", "a\"b"]);
    }

    #[test]
    fn test_taps_hit_the_element_under_them() {
        let stage = Stage::new();
        stage.show_many("select", 2);
        let second = stage.centers_of("select")[1];
        let screen = stage.lock();
        assert_eq!(screen.screen.element_at(second), Some(("select".to_string(), 1)));
        assert_eq!(screen.screen.element_at(Point::new(-50, -50)), None);
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let mut screen = Screen::default();
        screen.show("a");
        screen.show("b");
        screen.hide("a");
        screen.show("c");
        assert_eq!(screen.centers_of("c"), vec![Point::new(10, 8)]);
    }
}
