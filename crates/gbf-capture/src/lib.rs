pub mod adb;
pub mod source;

use anyhow::{Context, Result};
use gbf_state::StopSignal;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use xcap::Window;

pub use adb::Adb;
pub use source::{FrameSource, OnDemandSource, WatchFrameSource};

/// One screenshot of the device
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbaImage,
    /// When the grab started; the screen is at least this fresh
    pub captured_at: Instant,
    pub seq: u64,
}

impl Frame {
    pub fn new(image: RgbaImage, captured_at: Instant, seq: u64) -> Self {
        Self {
            image,
            captured_at,
            seq,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Something that can produce a screenshot on demand. Blocking.
pub trait Grabber: Send {
    fn grab(&mut self) -> Result<RgbaImage>;

    fn describe(&self) -> String;
}

/// `adb exec-out screencap -p`
#[derive(Debug, Clone)]
pub struct AdbGrabber {
    adb: Adb,
}

impl AdbGrabber {
    pub fn new(adb: Adb) -> Self {
        Self { adb }
    }
}

impl Grabber for AdbGrabber {
    fn grab(&mut self) -> Result<RgbaImage> {
        self.adb.screencap()
    }

    fn describe(&self) -> String {
        "adb screencap".to_string()
    }
}

/// Capture of an emulator window on the host, found by title
#[derive(Debug, Clone)]
pub struct WindowGrabber {
    titles: Vec<String>,
    last_title: Option<String>,
}

impl WindowGrabber {
    pub fn new(titles: &[String]) -> Self {
        Self {
            titles: titles.iter().map(|t| t.to_lowercase()).collect(),
            last_title: None,
        }
    }

    fn find_window(&self) -> Option<Window> {
        let windows = match Window::all() {
            Ok(w) => w,
            Err(e) => {
                warn!("Failed to enumerate windows: {}", e);
                return None;
            }
        };

        for window in windows {
            let title = match window.title() {
                Ok(t) => t.to_lowercase(),
                Err(_) => continue,
            };
            if self.titles.iter().any(|t| title.contains(t.as_str())) {
                debug!("Found emulator window: {}", title);
                return Some(window);
            }
        }
        None
    }
}

impl Grabber for WindowGrabber {
    fn grab(&mut self) -> Result<RgbaImage> {
        let window = self
            .find_window()
            .with_context(|| format!("No window matching {:?}", self.titles))?;
        self.last_title = window.title().ok();
        window
            .capture_image()
            .context("Failed to capture window image")
    }

    fn describe(&self) -> String {
        match &self.last_title {
            Some(title) => format!("window \"{}\"", title),
            None => "window capture".to_string(),
        }
    }
}

/// Pixel rectangle within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// `width` x `height` box centered on (`cx`, `cy`)
    pub fn centered(cx: i32, cy: i32, width: u32, height: u32) -> Self {
        Self {
            x: cx - (width / 2) as i32,
            y: cy - (height / 2) as i32,
            width,
            height,
        }
    }
}

/// Crop a region from a captured frame, clamped to the frame bounds
pub fn crop_region(frame: &RgbaImage, region: &Region) -> RgbaImage {
    let (w, h) = (frame.width(), frame.height());
    let x = (region.x.max(0) as u32).min(w.saturating_sub(1));
    let y = (region.y.max(0) as u32).min(h.saturating_sub(1));
    let right = (region.x + region.width as i32).clamp(0, w as i32) as u32;
    let bottom = (region.y + region.height as i32).clamp(0, h as i32) as u32;
    let rw = right.saturating_sub(x);
    let rh = bottom.saturating_sub(y);

    image::imageops::crop_imm(frame, x, y, rw, rh).to_image()
}

/// Status of the capture pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureStatus {
    pub is_capturing: bool,
    pub source: Option<String>,
    pub fps: f64,
    pub frames: u64,
    pub last_capture_time: Option<u64>,
    pub resolution: Option<(u32, u32)>,
}

/// Background capture task. Publishes every frame into the single-slot
/// watch channel, so readers only ever see the latest one.
pub async fn capture_loop<G: Grabber + 'static>(
    mut grabber: G,
    frame_tx: watch::Sender<Option<Arc<Frame>>>,
    status_tx: watch::Sender<CaptureStatus>,
    capture_interval: Duration,
    stop: StopSignal,
) {
    info!("Capture loop started ({}), interval: {:?}", grabber.describe(), capture_interval);

    let mut seq = 0u64;
    let mut frame_count = 0u64;
    let mut fps_timer = Instant::now();

    loop {
        if stop.is_stopped() {
            info!("Capture loop stopping (stop signal received)");
            break;
        }

        let started = Instant::now();

        // Grab on a blocking thread (adb and xcap are sync)
        let joined = tokio::task::spawn_blocking(move || {
            let result = grabber.grab();
            (grabber, result)
        })
        .await;

        let (returned, result) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Capture task panicked: {}", e);
                break;
            }
        };
        grabber = returned;

        match result {
            Ok(image) => {
                seq += 1;
                frame_count += 1;
                let resolution = image.dimensions();

                let elapsed = fps_timer.elapsed().as_secs_f64();
                let fps = if elapsed > 0.0 {
                    frame_count as f64 / elapsed
                } else {
                    0.0
                };
                if elapsed > 5.0 {
                    frame_count = 0;
                    fps_timer = Instant::now();
                }

                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64;

                let _ = status_tx.send(CaptureStatus {
                    is_capturing: true,
                    source: Some(grabber.describe()),
                    fps,
                    frames: seq,
                    last_capture_time: Some(now),
                    resolution: Some(resolution),
                });
                let _ = frame_tx.send(Some(Arc::new(Frame::new(image, started, seq))));
            }
            Err(e) => {
                warn!("Capture failed: {:#}", e);
                let _ = status_tx.send(CaptureStatus {
                    source: Some(grabber.describe()),
                    frames: seq,
                    ..CaptureStatus::default()
                });
            }
        }

        let elapsed = started.elapsed();
        if elapsed < capture_interval {
            tokio::time::sleep(capture_interval - elapsed).await;
        } else {
            // Yield to prevent busy loop
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    let _ = status_tx.send(CaptureStatus::default());
    info!("Capture loop stopped");
}
