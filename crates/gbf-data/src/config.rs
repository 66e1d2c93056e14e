use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::device::DeviceHints;
use crate::missions;

/// Combat script used when the user does not provide one
pub const DEFAULT_COMBAT_SCRIPT: &[&str] = &["Turn 1:", "enableFullAuto", "end"];

/// Farming modes the bot can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FarmingMode {
    #[default]
    Quest,
    Special,
    Coop,
    Raid,
    Event,
    #[serde(rename = "Event (Token Drawboxes)")]
    EventTokenDrawboxes,
    #[serde(rename = "Rise of the Beasts")]
    RiseOfTheBeasts,
    #[serde(rename = "Guild Wars")]
    GuildWars,
    Arcarum,
    #[serde(rename = "Dread Barrage")]
    DreadBarrage,
    #[serde(rename = "Xeno Clash")]
    XenoClash,
    /// Repeat whatever mission is on screen
    Generic,
}

impl FarmingMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Quest => "Quest",
            Self::Special => "Special",
            Self::Coop => "Coop",
            Self::Raid => "Raid",
            Self::Event => "Event",
            Self::EventTokenDrawboxes => "Event (Token Drawboxes)",
            Self::RiseOfTheBeasts => "Rise of the Beasts",
            Self::GuildWars => "Guild Wars",
            Self::Arcarum => "Arcarum",
            Self::DreadBarrage => "Dread Barrage",
            Self::XenoClash => "Xeno Clash",
            Self::Generic => "Generic",
        }
    }

    /// Modes that pick their own support summon (or none).
    pub fn needs_summons(self) -> bool {
        !matches!(self, Self::Coop | Self::Arcarum)
    }
}

impl fmt::Display for FarmingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Recurring special encounter (Dimensional Halo, Event Nightmare, ROTB Extreme+,
/// Xeno Clash Nightmare).
/// Zero group/party and an empty summon list reuse the main farming settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SideEventSettings {
    pub enabled: bool,
    pub summons: Vec<String>,
    pub group_number: u32,
    pub party_number: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelaySettings {
    /// Fixed resting period between runs
    pub enabled: bool,
    pub seconds: i64,
    /// Random resting period in `[seconds, upper_seconds)`, used when `enabled` is false
    pub randomized: bool,
    pub upper_seconds: i64,
}

impl Default for DelaySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            seconds: 15,
            randomized: false,
            upper_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefillSettings {
    /// Trust the game's auto-restore and never tap refill items
    pub skip_auto_restore: bool,
    pub full_elixir: bool,
    pub soul_balm: bool,
}

impl Default for RefillSettings {
    fn default() -> Self {
        Self {
            skip_auto_restore: true,
            full_elixir: false,
            soul_balm: false,
        }
    }
}

/// Minimum similarity per template category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceSettings {
    pub buttons: f64,
    pub headers: f64,
    pub summons: f64,
    pub items: f64,
    pub dialogs: f64,
    /// Threshold for multi-instance searches
    pub find_all: f64,
}

impl Default for ConfidenceSettings {
    fn default() -> Self {
        Self {
            buttons: 0.8,
            headers: 0.8,
            summons: 0.8,
            items: 0.8,
            dialogs: 0.8,
            find_all: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureBackend {
    /// `adb exec-out screencap -p`
    #[default]
    Adb,
    /// Emulator window capture on the host
    Window,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub adb_path: String,
    pub serial: Option<String>,
    pub capture: CaptureBackend,
    /// Substrings matched against window titles for `CaptureBackend::Window`
    pub window_titles: Vec<String>,
    pub capture_interval_ms: u64,
    pub hints: DeviceHints,
    /// Applied once to every template at load
    pub template_scale: f64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            adb_path: "adb".to_string(),
            serial: None,
            capture: CaptureBackend::Adb,
            window_titles: vec!["bluestacks".to_string(), "granblue".to_string()],
            capture_interval_ms: 250,
            hints: DeviceHints::default(),
            template_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaidSettings {
    /// Text file of backup-request posts, re-read whenever a room code is needed
    pub room_code_file: Option<PathBuf>,
    pub slot_poll_seconds: u64,
    /// None polls for a free slot until cancelled
    pub max_slot_polls: Option<u32>,
}

impl Default for RaidSettings {
    fn default() -> Self {
        Self {
            room_code_file: None,
            slot_poll_seconds: 30,
            max_slot_polls: None,
        }
    }
}

/// Everything the bot reads at session start
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub farming_mode: FarmingMode,
    pub map: String,
    pub mission: String,
    pub item_name: String,
    pub item_amount: u32,
    pub combat_script: Option<PathBuf>,
    pub summons: Vec<String>,
    pub group_number: u32,
    pub party_number: u32,
    pub dimensional_halo: SideEventSettings,
    pub event_nightmare: SideEventSettings,
    pub rotb_extreme_plus: SideEventSettings,
    pub xeno_clash_nightmare: SideEventSettings,
    pub delay: DelaySettings,
    pub refill: RefillSettings,
    pub confidence: ConfidenceSettings,
    pub device: DeviceSettings,
    pub raid: RaidSettings,
    pub webhook_url: Option<String>,
    pub assets_dir: PathBuf,
    pub log_dir: PathBuf,
    pub debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            farming_mode: FarmingMode::Quest,
            map: String::new(),
            mission: String::new(),
            item_name: "Repeated Runs".to_string(),
            item_amount: 1,
            combat_script: None,
            summons: Vec::new(),
            group_number: 1,
            party_number: 1,
            dimensional_halo: SideEventSettings::default(),
            event_nightmare: SideEventSettings::default(),
            rotb_extreme_plus: SideEventSettings::default(),
            xeno_clash_nightmare: SideEventSettings::default(),
            delay: DelaySettings::default(),
            refill: RefillSettings::default(),
            confidence: ConfidenceSettings::default(),
            device: DeviceSettings::default(),
            raid: RaidSettings::default(),
            webhook_url: None,
            assets_dir: PathBuf::from("assets"),
            log_dir: PathBuf::from("logs"),
            debug_mode: false,
        }
    }
}

impl Settings {
    /// Load and validate settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        settings.validate()?;

        tracing::info!(
            "Loaded settings: {} / {} / {}x {}",
            settings.farming_mode,
            settings.mission,
            settings.item_amount,
            settings.item_name
        );
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=14).contains(&self.group_number) {
            bail!("Group number must be between 1 and 14, got {}", self.group_number);
        }
        if !(1..=6).contains(&self.party_number) {
            bail!("Party number must be between 1 and 6, got {}", self.party_number);
        }
        if self.item_amount == 0 {
            bail!("Item amount must be at least 1");
        }
        if self.farming_mode.needs_summons() && self.summons.is_empty() {
            bail!("No summons selected for {}", self.farming_mode);
        }
        if self.device.template_scale <= 0.0 {
            bail!("Template scale must be positive");
        }
        match self.farming_mode {
            FarmingMode::Quest => {
                let island = missions::island(&self.map)
                    .with_context(|| format!("Unknown Quest map: {}", self.map))?;
                if !island.missions.contains(&self.mission.as_str()) {
                    bail!("{} is not a mission on {}", self.mission, self.map);
                }
            }
            FarmingMode::Special => {
                let map = missions::special_map(&self.map)
                    .with_context(|| format!("Unknown Special map: {}", self.map))?;
                if map.round_steps(&self.mission).is_none() {
                    bail!("{} is not a mission on {}", self.mission, self.map);
                }
            }
            FarmingMode::Raid if !missions::is_known_raid(&self.mission) => {
                bail!("Unknown raid: {}", self.mission);
            }
            FarmingMode::Coop if missions::coop_slot(&self.mission).is_none() => {
                bail!("Unknown Coop mission: {}", self.mission);
            }
            FarmingMode::Event if !missions::EVENT_MISSIONS.contains(&self.mission.as_str()) => {
                bail!("Unknown Event mission: {}", self.mission);
            }
            FarmingMode::EventTokenDrawboxes
                if !missions::EVENT_TOKEN_DRAWBOXES_MISSIONS.contains(&self.mission.as_str()) =>
            {
                bail!("Unknown Event (Token Drawboxes) mission: {}", self.mission);
            }
            FarmingMode::GuildWars
                if !missions::GUILD_WARS_MEAT.contains(&self.mission.as_str())
                    && !missions::GUILD_WARS_NIGHTMARES.iter().any(|(m, _)| *m == self.mission) =>
            {
                bail!("Unknown Guild Wars mission: {}", self.mission);
            }
            FarmingMode::Arcarum if !missions::ARCARUM_MAPS.contains(&self.mission.as_str()) => {
                bail!("Unknown Arcarum expedition: {}", self.mission);
            }
            FarmingMode::DreadBarrage if missions::dread_barrage_star(&self.mission).is_none() => {
                bail!("Unknown Dread Barrage mission: {}", self.mission);
            }
            FarmingMode::XenoClash if !missions::XENO_CLASH_MISSIONS.contains(&self.mission.as_str()) => {
                bail!("Unknown Xeno Clash mission: {}", self.mission);
            }
            _ => {}
        }
        Ok(())
    }

    /// Combat script lines, falling back to full auto.
    pub fn load_combat_script(&self) -> Result<Vec<String>> {
        let lines = match &self.combat_script {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read combat script {}", path.display()))?
                .lines()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
            None => Vec::new(),
        };

        if lines.is_empty() {
            tracing::info!("No combat script provided, defaulting to full auto");
            return Ok(DEFAULT_COMBAT_SCRIPT.iter().map(|s| s.to_string()).collect());
        }
        Ok(lines)
    }

    /// Side-event settings with zero/empty fields replaced by the main ones.
    pub fn resolve_side_event(&self, side: &SideEventSettings) -> SideEventSettings {
        SideEventSettings {
            enabled: side.enabled,
            summons: if side.summons.is_empty() {
                self.summons.clone()
            } else {
                side.summons.clone()
            },
            group_number: if side.group_number == 0 {
                self.group_number
            } else {
                side.group_number
            },
            party_number: if side.party_number == 0 {
                self.party_number
            } else {
                side.party_number
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_settings(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_quest_settings() {
        let file = write_settings(
            r#"{
                "farming_mode": "Quest",
                "map": "Port Breeze Archipelago",
                "mission": "Scattered Cargo",
                "item_name": "Satin Feather",
                "item_amount": 10,
                "summons": ["Shiva"],
                "group_number": 8,
                "party_number": 2,
                "event_nightmare": { "enabled": true, "group_number": 3 }
            }"#,
        );
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.farming_mode, FarmingMode::Quest);
        assert_eq!(settings.group_number, 8);
        assert!(settings.refill.skip_auto_restore);
        assert_eq!(settings.confidence.headers, 0.8);

        let nightmare = settings.resolve_side_event(&settings.event_nightmare);
        assert_eq!(nightmare.group_number, 3);
        assert_eq!(nightmare.party_number, 2);
        assert_eq!(nightmare.summons, vec!["Shiva".to_string()]);
    }

    #[test]
    fn test_mode_names_round_trip_through_serde() {
        let mode: FarmingMode = serde_json::from_str("\"Event (Token Drawboxes)\"").unwrap();
        assert_eq!(mode, FarmingMode::EventTokenDrawboxes);
        assert_eq!(mode.to_string(), "Event (Token Drawboxes)");
        let mode: FarmingMode = serde_json::from_str("\"Dread Barrage\"").unwrap();
        assert_eq!(mode, FarmingMode::DreadBarrage);
    }

    #[test]
    fn test_validation_rejects_bad_settings() {
        let mut settings = Settings {
            summons: vec!["Shiva".into()],
            map: "Valtz Duchy".into(),
            mission: "Scattered Cargo".into(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        settings.mission = "Lucky Charm Hunt".into();
        assert!(settings.validate().is_ok());

        settings.party_number = 7;
        assert!(settings.validate().is_err());

        let coop = Settings {
            farming_mode: FarmingMode::Coop,
            mission: "EX2-3 Time of Revelation".into(),
            ..Settings::default()
        };
        assert!(coop.validate().is_ok());

        let mut arcarum = Settings {
            farming_mode: FarmingMode::Arcarum,
            mission: "Point Beta".into(),
            ..Settings::default()
        };
        assert!(arcarum.validate().is_ok());
        arcarum.mission = "Point Omega".into();
        assert!(arcarum.validate().is_err());

        let guild_wars = Settings {
            farming_mode: FarmingMode::GuildWars,
            mission: "NM95".into(),
            summons: vec!["Shiva".into()],
            ..Settings::default()
        };
        assert!(guild_wars.validate().is_ok());

        let mut dread = Settings {
            farming_mode: FarmingMode::DreadBarrage,
            mission: "3 Star".into(),
            summons: vec!["Shiva".into()],
            ..Settings::default()
        };
        assert!(dread.validate().is_ok());
        dread.mission = "6 Star".into();
        assert!(dread.validate().is_err());

        let xeno = Settings {
            farming_mode: FarmingMode::XenoClash,
            mission: "Xeno Clash Nightmare".into(),
            summons: vec!["Shiva".into()],
            ..Settings::default()
        };
        assert!(xeno.validate().is_err());

        // Generic repeats whatever is on screen, so any mission name goes.
        let generic = Settings {
            farming_mode: FarmingMode::Generic,
            mission: "Anything".into(),
            summons: vec!["Shiva".into()],
            ..Settings::default()
        };
        assert!(generic.validate().is_ok());
    }

    #[test]
    fn test_missing_combat_script_defaults_to_full_auto() {
        let settings = Settings::default();
        let script = settings.load_combat_script().unwrap();
        assert_eq!(script, vec!["Turn 1:", "enableFullAuto", "end"]);
    }

    #[test]
    fn test_load_nonexistent() {
        assert!(Settings::load(Path::new("/nonexistent/settings.json")).is_err());
    }
}
