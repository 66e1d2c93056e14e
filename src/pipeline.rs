use anyhow::{anyhow, Context, Result};
use gbf_capture::{capture_loop, Adb, AdbGrabber, CaptureStatus, Frame, WatchFrameSource, WindowGrabber};
use gbf_data::{CaptureBackend, ScreenProfile, Settings};
use gbf_input::{spawn_paste_listener, AdbInjector, AdbTextTarget, GestureDispatcher};
use gbf_nav::{controller_for, farm, Automation, Game, RoomCodeFeed};
use gbf_state::{BotError, BotResult, RunContext, StopSignal};
use gbf_vision::{Locator, TemplateStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::collaborators::{FullAutoCombat, ResultsScreenLoot, TweetRoomCodeFeed};
use crate::message_log::{spawn_notifier, MessageLog};

/// How long teardown waits for queued webhook notifications
const NOTIFIER_DRAIN: Duration = Duration::from_secs(15);

/// Owns the background capture task feeding the control path
pub struct Pipeline {
    stop: StopSignal,
    frame_rx: watch::Receiver<Option<Arc<Frame>>>,
    status_rx: watch::Receiver<CaptureStatus>,
}

impl Pipeline {
    /// Start capturing with the configured backend. Must be called inside a
    /// tokio runtime.
    pub fn start(settings: &Settings, adb: Adb, stop: StopSignal) -> Self {
        let (frame_tx, frame_rx) = watch::channel::<Option<Arc<Frame>>>(None);
        let (status_tx, status_rx) = watch::channel(CaptureStatus::default());
        let interval = Duration::from_millis(settings.device.capture_interval_ms);

        match settings.device.capture {
            CaptureBackend::Adb => {
                tokio::spawn(capture_loop(AdbGrabber::new(adb), frame_tx, status_tx, interval, stop.clone()));
            }
            CaptureBackend::Window => {
                let grabber = WindowGrabber::new(&settings.device.window_titles);
                tokio::spawn(capture_loop(grabber, frame_tx, status_tx, interval, stop.clone()));
            }
        }
        info!("Pipeline started ({:?} capture)", settings.device.capture);

        Self {
            stop,
            frame_rx,
            status_rx,
        }
    }

    pub fn stop(&self) {
        self.stop.stop();
        info!("Pipeline stop requested");
    }

    pub fn capture_status(&self) -> CaptureStatus {
        self.status_rx.borrow().clone()
    }

    pub fn latest_frame(&self) -> Option<Arc<Frame>> {
        self.frame_rx.borrow().clone()
    }

    /// Frame source for the control thread
    pub fn frame_source(&self) -> WatchFrameSource {
        WatchFrameSource::new(self.frame_rx.clone())
    }

    /// Save the latest frame for diagnosis. Returns the debug directory.
    pub fn save_debug_frame(&self) -> Option<PathBuf> {
        let frame = self.latest_frame()?;
        let dir = std::env::temp_dir().join("gbf_autopilot_debug");
        match write_debug_frame(&frame, &self.capture_status(), &dir) {
            Ok(()) => {
                info!("Debug frame saved to {}", dir.display());
                Some(dir)
            }
            Err(e) => {
                warn!("Failed to save debug frame: {:#}", e);
                None
            }
        }
    }
}

fn write_debug_frame(frame: &Frame, status: &CaptureStatus, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    frame
        .image
        .save(dir.join("frame_full.png"))
        .context("Failed to write frame_full.png")?;

    let (w, h) = frame.dimensions();
    let info = format!(
        "Frame #{}: {}x{}\nSource: {}\nCapture: {:.1} fps, {} frames\n",
        frame.seq,
        w,
        h,
        status.source.as_deref().unwrap_or("unknown"),
        status.fps,
        status.frames,
    );
    std::fs::write(dir.join("frame_info.txt"), info).context("Failed to write frame_info.txt")?;
    Ok(())
}

/// One farming session from device query to teardown. Returns the amount
/// farmed; errors are reported to the message log before they are returned.
pub async fn run_session(settings: Settings) -> Result<u32> {
    let adb = Adb::from_settings(&settings.device);
    let query = adb.clone();
    let (width, height, dpi) = tokio::task::spawn_blocking(move || -> Result<(u32, u32, u32)> {
        let (w, h) = query.screen_size()?;
        let dpi = query.density().unwrap_or_else(|e| {
            warn!("Failed to read screen density: {:#}", e);
            0
        });
        Ok((w, h, dpi))
    })
    .await
    .context("Device query task failed")??;
    let profile = ScreenProfile::detect(width, height, dpi, &settings.device.hints);
    info!("Device {}x{} at {} dpi, class {:?}", width, height, dpi, profile.class());

    let (notify_tx, notifier) = match &settings.webhook_url {
        Some(url) => {
            let (tx, rx) = mpsc::unbounded_channel();
            (Some(tx), Some(spawn_notifier(url.clone(), rx)))
        }
        None => (None, None),
    };
    let log = Arc::new(MessageLog::new(notify_tx));
    let ctx = RunContext::new(profile, log.clone()).with_debug(settings.debug_mode);

    let interrupt = ctx.stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping the bot");
            interrupt.stop();
        }
    });

    let pipeline = Pipeline::start(&settings, adb.clone(), ctx.stop.clone());

    let (focus_tx, focus_rx) = mpsc::unbounded_channel();
    let listener = spawn_paste_listener(AdbTextTarget::new(adb.clone()), Arc::clone(&ctx.mailbox), focus_rx);
    let injector = AdbInjector::new(adb).with_focus_events(focus_tx);

    let source = pipeline.frame_source();
    let control_settings = settings.clone();
    let control_ctx = ctx.clone();
    let result = tokio::task::spawn_blocking(move || control(control_settings, control_ctx, source, injector))
        .await
        .unwrap_or_else(|e| Err(BotError::Device(anyhow!("Control thread panicked: {}", e))));

    match &result {
        Ok(total) => info!("Session finished with {} {}", total, settings.item_name),
        Err(e) if e.is_cancelled() => ctx.say("The bot was stopped"),
        Err(e) => {
            ctx.notify(format!("Bot stopped: {}", e));
            pipeline.save_debug_frame();
        }
    }

    pipeline.stop();
    // The injector, and with it the listener's only sender, went away with the control thread.
    if let Err(e) = listener.await {
        warn!("Paste listener did not shut down cleanly: {}", e);
    }
    if let Err(e) = log.save(&settings.log_dir) {
        warn!("{:#}", e);
    }

    drop(ctx);
    drop(log);
    if let Some(handle) = notifier {
        if tokio::time::timeout(NOTIFIER_DRAIN, handle).await.is_err() {
            warn!("Pending notifications dropped after {:?}", NOTIFIER_DRAIN);
        }
    }

    result.map_err(anyhow::Error::from)
}

/// The blocking control path: wire up vision and input, then farm.
fn control(settings: Settings, ctx: RunContext, source: WatchFrameSource, injector: AdbInjector) -> BotResult<u32> {
    let store = Arc::new(TemplateStore::new(
        settings.assets_dir.clone(),
        settings.device.template_scale,
    ));
    let locator = Locator::new(Box::new(source), Arc::clone(&store), settings.confidence.clone(), ctx.clone());
    let gestures = GestureDispatcher::new(Box::new(injector), store, ctx.clone());
    let io = Automation::new(locator, gestures, ctx);

    let script = settings.load_combat_script()?;
    let feed = settings
        .raid
        .room_code_file
        .as_ref()
        .map(|path| Box::new(TweetRoomCodeFeed::new(path)) as Box<dyn RoomCodeFeed>);
    let mut ctrl = controller_for(&settings, script, feed)?;

    let target = settings.item_amount;
    let mut game = Game::new(io, settings, Box::new(FullAutoCombat), Box::new(ResultsScreenLoot));
    farm(&mut game, ctrl.as_mut(), target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::time::Instant;

    #[test]
    fn test_debug_frame_written_with_info() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::new(RgbaImage::new(32, 24), Instant::now(), 7);
        let status = CaptureStatus {
            source: Some("adb screencap".into()),
            fps: 3.5,
            frames: 42,
            ..CaptureStatus::default()
        };

        write_debug_frame(&frame, &status, dir.path()).unwrap();

        let saved = image::open(dir.path().join("frame_full.png")).unwrap();
        assert_eq!((saved.width(), saved.height()), (32, 24));
        let info = std::fs::read_to_string(dir.path().join("frame_info.txt")).unwrap();
        assert!(info.starts_with("Frame #7: 32x24"), "{}", info);
        assert!(info.contains("adb screencap"));
    }

    #[tokio::test]
    async fn test_pipeline_stop_sets_the_shared_signal() {
        let stop = StopSignal::new();
        let settings = Settings {
            device: gbf_data::config::DeviceSettings {
                adb_path: "/nonexistent/adb".into(),
                capture_interval_ms: 10,
                ..Default::default()
            },
            ..Settings::default()
        };
        let pipeline = Pipeline::start(&settings, Adb::from_settings(&settings.device), stop.clone());
        assert!(pipeline.latest_frame().is_none());
        pipeline.stop();
        assert!(stop.is_stopped());
        assert!(pipeline.save_debug_frame().is_none());
    }
}
