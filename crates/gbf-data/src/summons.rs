use serde::{Deserialize, Serialize};

/// Element tabs on the summon selection screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummonElement {
    Fire,
    Water,
    Earth,
    Wind,
    Light,
    Dark,
    Misc,
}

impl SummonElement {
    /// Button template for the element tab.
    pub fn tab_template(self) -> &'static str {
        match self {
            Self::Fire => "summon_fire",
            Self::Water => "summon_water",
            Self::Earth => "summon_earth",
            Self::Wind => "summon_wind",
            Self::Light => "summon_light",
            Self::Dark => "summon_dark",
            Self::Misc => "summon_misc",
        }
    }
}

const SUMMONS: &[(SummonElement, &[&str])] = &[
    (SummonElement::Fire, &["Colossus Omega", "Shiva", "Agni"]),
    (
        SummonElement::Water,
        &["Leviathan Omega", "Europa", "Varuna", "Bonito"],
    ),
    (
        SummonElement::Earth,
        &["Yggdrasil Omega", "Godsworn Alexiel", "Titan"],
    ),
    (SummonElement::Wind, &["Tiamat Omega", "Grimnir", "Zephyrus"]),
    (SummonElement::Light, &["Luminiera Omega", "Lucifer", "Zeus"]),
    (SummonElement::Dark, &["Celeste Omega", "Bahamut", "Hades"]),
    (
        SummonElement::Misc,
        &["Huanglong", "Qilin", "Kaguya", "Nobiyo", "White Rabbit", "Black Rabbit"],
    ),
];

/// Element tab a summon is listed under, if it is a known summon.
pub fn element_of(summon: &str) -> Option<SummonElement> {
    SUMMONS
        .iter()
        .find(|(_, names)| names.iter().any(|n| n.eq_ignore_ascii_case(summon)))
        .map(|(element, _)| *element)
}
