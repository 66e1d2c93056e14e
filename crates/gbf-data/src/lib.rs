pub mod config;
pub mod device;
pub mod missions;
pub mod offsets;
pub mod summons;

pub use config::{
    CaptureBackend, ConfidenceSettings, FarmingMode, Settings, SideEventSettings,
    DEFAULT_COMBAT_SCRIPT,
};
pub use device::{Corrected, DeviceClass, DeviceHints, Offset, ScreenProfile};
pub use summons::SummonElement;
