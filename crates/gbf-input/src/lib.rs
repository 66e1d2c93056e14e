pub mod dispatcher;
pub mod injector;
pub mod paste;

pub use dispatcher::{GestureDispatcher, ScrollDirection, TapOptions, LONG_PRESS, SETTLE_DELAY};
pub use injector::{AdbInjector, InputInjector};
pub use paste::{handle_focus_event, spawn_paste_listener, AdbTextTarget, FocusEvent, TextTarget};
