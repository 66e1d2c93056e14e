use tracing::info;

/// Destination for user-facing progress messages.
///
/// Implementations must not block the control path; slow work (files,
/// webhooks) belongs on their own task.
pub trait MessageSink: Send + Sync {
    fn post(&self, message: &str);

    /// Message that should also reach the user outside the log, e.g. a
    /// drop or a stop reason. Plain sinks treat it like `post`.
    fn notify(&self, message: &str) {
        self.post(message);
    }
}

/// Sink that only writes to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn post(&self, message: &str) {
        info!("{}", message);
    }
}
