pub mod context;
pub mod error;
pub mod geometry;
pub mod mailbox;
pub mod session;
pub mod sink;
pub mod stop;

pub use context::{RunContext, SettleClock};
pub use error::{BotError, BotResult};
pub use geometry::Point;
pub use mailbox::{PasteMailbox, PostTicket};
pub use session::{GameModeSession, JoinAttempt, JoinOutcome, NavState};
pub use sink::{MessageSink, TracingSink};
pub use stop::{poll_until, Poll, StopSignal};
