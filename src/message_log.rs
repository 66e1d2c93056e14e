use anyhow::{Context, Result};
use chrono::Local;
use gbf_state::MessageSink;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Progress log shown to the user. Every line is stamped with the time
/// since the run started and kept for saving at teardown; `notify` lines
/// are also handed to the webhook notifier.
pub struct MessageLog {
    started: Instant,
    lines: Mutex<Vec<String>>,
    notifier: Option<UnboundedSender<String>>,
}

impl MessageLog {
    pub fn new(notifier: Option<UnboundedSender<String>>) -> Self {
        Self {
            started: Instant::now(),
            lines: Mutex::new(Vec::new()),
            notifier,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Write the log to `dir/log @ <timestamp>.txt`
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(format!("log @ {}.txt", Local::now().format("%Y-%m-%d %H-%M-%S")));
        let mut content = self.lock().join("\n");
        content.push('\n');
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Saved message log to {}", path.display());
        Ok(path)
    }

    fn stamp(&self, message: &str) -> String {
        let secs = self.started.elapsed().as_secs();
        format!("{:02}:{:02}:{:02} {}", secs / 3600, (secs / 60) % 60, secs % 60, message)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MessageSink for MessageLog {
    fn post(&self, message: &str) {
        info!("{}", message);
        let line = self.stamp(message);
        self.lock().push(line);
    }

    fn notify(&self, message: &str) {
        self.post(message);
        if let Some(tx) = &self.notifier {
            if tx.send(message.to_string()).is_err() {
                debug!("Notifier is gone, dropping: {}", message);
            }
        }
    }
}

/// Deliver notifications to a webhook until every sender is dropped.
/// Each POST runs on a blocking thread so a slow endpoint only delays
/// later notifications.
pub fn spawn_notifier(url: String, mut rx: UnboundedReceiver<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Webhook notifier started");
        while let Some(message) = rx.recv().await {
            let url = url.clone();
            match tokio::task::spawn_blocking(move || post_webhook(&url, &message)).await {
                Ok(Ok(())) => debug!("Webhook notification delivered"),
                Ok(Err(e)) => warn!("Webhook notification failed: {:#}", e),
                Err(e) => warn!("Webhook task panicked: {}", e),
            }
        }
        info!("Webhook notifier stopped");
    })
}

fn post_webhook(url: &str, message: &str) -> Result<()> {
    ureq::post(url)
        .timeout(WEBHOOK_TIMEOUT)
        .send_json(serde_json::json!({ "content": message }))
        .with_context(|| format!("POST {}", url))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_lines_are_stamped_and_kept() {
        let log = MessageLog::new(None);
        log.post("Farming 5 Repeated Runs");
        log.notify("Farming complete");
        let lines = log.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00:00:0"), "{}", lines[0]);
        assert!(lines[1].ends_with(" Farming complete"));
    }

    #[test]
    fn test_only_notifications_reach_the_notifier() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let log = MessageLog::new(Some(tx));
        log.post("Run #1 complete");
        log.notify("CAPTCHA detected! Stopping the bot.");
        assert_eq!(rx.try_recv().unwrap(), "CAPTCHA detected! Stopping the bot.");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_notify_without_notifier_still_logs() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let log = MessageLog::new(Some(tx));
        log.notify("Farming complete");
        assert_eq!(log.lines().len(), 1);
    }

    #[test]
    fn test_save_writes_every_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = MessageLog::new(None);
        log.post("first");
        log.post("second");
        let path = log.save(&dir.path().join("logs")).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("log @ ") && name.ends_with(".txt"), "{}", name);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("second"));
    }
}
