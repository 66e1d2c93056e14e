use serde::{Deserialize, Serialize};

/// Width of the lower-end phone class (720p portrait).
const LOW_END_WIDTH: u32 = 720;

/// Tablet resolution in either orientation.
const TABLET_SHORT_SIDE: u32 = 1600;
const TABLET_LONG_SIDE: u32 = 2560;

/// Device classes that need their own hand-tuned pixel offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    Phone,
    LowEndPhone,
    TabletPortrait,
    TabletLandscape,
}

/// Pixel offset relative to a located anchor element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// One value per device class. Offset tables are expressed with this so that
/// navigation code never branches on the device itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corrected<T> {
    pub phone: T,
    pub low_end: T,
    pub tablet_portrait: T,
    pub tablet_landscape: T,
}

impl<T: Copy> Corrected<T> {
    pub const fn new(phone: T, low_end: T, tablet_portrait: T, tablet_landscape: T) -> Self {
        Self {
            phone,
            low_end,
            tablet_portrait,
            tablet_landscape,
        }
    }

    /// Same value for both phone classes.
    pub const fn phone_tablet(phone: T, tablet_portrait: T, tablet_landscape: T) -> Self {
        Self::new(phone, phone, tablet_portrait, tablet_landscape)
    }

    pub fn for_class(&self, class: DeviceClass) -> T {
        match class {
            DeviceClass::Phone => self.phone,
            DeviceClass::LowEndPhone => self.low_end,
            DeviceClass::TabletPortrait => self.tablet_portrait,
            DeviceClass::TabletLandscape => self.tablet_landscape,
        }
    }
}

/// Overrides for what the frame size suggests about the device
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceHints {
    pub is_tablet: Option<bool>,
    pub is_landscape: Option<bool>,
    pub is_low_end: Option<bool>,
    pub dpi: Option<u32>,
}

/// Per-device constants derived once at run start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenProfile {
    pub width: u32,
    pub height: u32,
    /// 0 when the density could not be queried
    pub dpi: u32,
    pub is_tablet: bool,
    pub is_landscape: bool,
    pub is_low_end: bool,
}

impl ScreenProfile {
    /// Classify a device from its screen size, letting explicit hints win.
    pub fn detect(width: u32, height: u32, dpi: u32, hints: &DeviceHints) -> Self {
        let tablet_size = (width == TABLET_SHORT_SIDE && height == TABLET_LONG_SIDE)
            || (width == TABLET_LONG_SIDE && height == TABLET_SHORT_SIDE);
        let is_tablet = hints.is_tablet.unwrap_or(tablet_size);
        let is_landscape = hints
            .is_landscape
            .unwrap_or(is_tablet && width == TABLET_LONG_SIDE && height == TABLET_SHORT_SIDE);
        let is_low_end = hints
            .is_low_end
            .unwrap_or(!is_tablet && width == LOW_END_WIDTH);

        Self {
            width,
            height,
            dpi: hints.dpi.unwrap_or(dpi),
            is_tablet,
            is_landscape,
            is_low_end,
        }
    }

    pub fn class(&self) -> DeviceClass {
        match (self.is_tablet, self.is_landscape, self.is_low_end) {
            (true, true, _) => DeviceClass::TabletLandscape,
            (true, false, _) => DeviceClass::TabletPortrait,
            (false, _, true) => DeviceClass::LowEndPhone,
            (false, _, false) => DeviceClass::Phone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_device_classes() {
        let hints = DeviceHints::default();
        assert_eq!(
            ScreenProfile::detect(1080, 1920, 420, &hints).class(),
            DeviceClass::Phone
        );
        assert_eq!(
            ScreenProfile::detect(720, 1280, 320, &hints).class(),
            DeviceClass::LowEndPhone
        );
        assert_eq!(
            ScreenProfile::detect(1600, 2560, 320, &hints).class(),
            DeviceClass::TabletPortrait
        );
        assert_eq!(
            ScreenProfile::detect(2560, 1600, 320, &hints).class(),
            DeviceClass::TabletLandscape
        );
    }

    #[test]
    fn test_hints_override_detection() {
        let hints = DeviceHints {
            is_tablet: Some(true),
            is_landscape: Some(false),
            is_low_end: None,
            dpi: Some(240),
        };
        let profile = ScreenProfile::detect(1200, 1920, 0, &hints);
        assert_eq!(profile.class(), DeviceClass::TabletPortrait);
        assert_eq!(profile.dpi, 240);
    }

    #[test]
    fn test_corrected_lookup() {
        let table = Corrected::new(
            Offset::new(400, 175),
            Offset::new(200, 110),
            Offset::new(290, 120),
            Offset::new(210, 95),
        );
        assert_eq!(table.for_class(DeviceClass::LowEndPhone), Offset::new(200, 110));
        assert_eq!(table.for_class(DeviceClass::TabletLandscape), Offset::new(210, 95));
    }
}
