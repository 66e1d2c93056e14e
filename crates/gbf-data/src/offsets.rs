//! Anchor-relative offsets for screens that are tapped by position rather
//! than by template.

use crate::device::{Corrected, DeviceClass, Offset};

/// Row of evenly spaced buttons to the left of an anchor.
/// Slot `n` (1-based) sits at `anchor.x - (base - step * (n - 1))`, `anchor.y + dy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonRow {
    pub base: i32,
    pub step: i32,
    pub dy: i32,
}

impl ButtonRow {
    const fn new(base: i32, step: i32, dy: i32) -> Self {
        Self { base, step, dy }
    }

    pub fn slot(&self, n: u32) -> Offset {
        let index = n.saturating_sub(1) as i32;
        Offset::new(-(self.base - self.step * index), self.dy)
    }
}

/// Group tabs, anchored on the `party_set_a` / `party_set_b` button.
pub const GROUP_ROW: Corrected<ButtonRow> = Corrected::new(
    ButtonRow::new(787, 140, 140),
    ButtonRow::new(537, 93, 80),
    ButtonRow::new(588, 100, 90),
    ButtonRow::new(467, 80, 70),
);

/// Party dots under the group tabs, same anchor.
pub const PARTY_ROW: Corrected<ButtonRow> = Corrected::new(
    ButtonRow::new(690, 130, 740),
    ButtonRow::new(468, 85, 490),
    ButtonRow::new(516, 100, 540),
    ButtonRow::new(408, 75, 425),
);

/// Groups per party set; groups 8 to 14 live on set B.
pub const GROUPS_PER_SET: u32 = 7;

/// Which party set button anchors a group, and the group's slot within that set.
pub fn group_set(group: u32) -> (&'static str, u32) {
    if group <= GROUPS_PER_SET {
        ("party_set_a", group)
    } else {
        ("party_set_b", group - GROUPS_PER_SET)
    }
}

pub fn group_offset(class: DeviceClass, group: u32) -> Offset {
    GROUP_ROW.for_class(class).slot(group_set(group).1)
}

pub fn party_offset(class: DeviceClass, party: u32) -> Offset {
    PARTY_ROW.for_class(class).slot(party)
}

/// Room code text box, left of the `join_a_room` button.
pub const ROOM_CODE_TEXTBOX: Corrected<Offset> = Corrected::new(
    Offset::new(-400, 0),
    Offset::new(-200, 0),
    Offset::new(-300, 0),
    Offset::new(-250, 0),
);

/// Special map "select" button, relative to the map banner.
pub const SPECIAL_MAP_SELECT: Corrected<Offset> = Corrected::new(
    Offset::new(400, 175),
    Offset::new(200, 110),
    Offset::new(290, 120),
    Offset::new(210, 95),
);

/// Fallback Extreme+ meat button, right of the Very Hard one.
pub const GUILD_WARS_EXTREME_PLUS: Offset = Offset::new(300, 0);

/// The summon list under "choose a summon" during the reset procedure.
pub const RESET_SUMMON_CHOICE: Offset = Offset::new(0, 400);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_offsets_per_class() {
        assert_eq!(group_offset(DeviceClass::Phone, 1), Offset::new(-787, 140));
        assert_eq!(group_offset(DeviceClass::Phone, 3), Offset::new(-507, 140));
        assert_eq!(group_offset(DeviceClass::LowEndPhone, 2), Offset::new(-444, 80));
        assert_eq!(group_offset(DeviceClass::TabletPortrait, 4), Offset::new(-288, 90));
        assert_eq!(group_offset(DeviceClass::TabletLandscape, 1), Offset::new(-467, 70));
    }

    #[test]
    fn test_set_b_groups_wrap() {
        assert_eq!(group_set(7), ("party_set_a", 7));
        assert_eq!(group_set(8), ("party_set_b", 1));
        assert_eq!(group_offset(DeviceClass::Phone, 9), group_offset(DeviceClass::Phone, 2));
    }

    #[test]
    fn test_party_offsets_per_class() {
        assert_eq!(party_offset(DeviceClass::Phone, 6), Offset::new(-40, 740));
        assert_eq!(party_offset(DeviceClass::LowEndPhone, 1), Offset::new(-468, 490));
        assert_eq!(party_offset(DeviceClass::TabletLandscape, 3), Offset::new(-258, 425));
    }
}
