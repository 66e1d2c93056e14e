use gbf_capture::{Frame, FrameSource};
use gbf_data::ConfidenceSettings;
use gbf_state::{poll_until, BotError, Point, Poll, RunContext};
use image::GrayImage;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::matcher::{MatchResult, TemplateMatcher};
use crate::templates::{Category, TemplateStore};

/// Default attempts for `find` / `confirm_location`
pub const DEFAULT_TRIES: u32 = 3;

/// Answers "is X on screen, and where" against fresh frames.
///
/// Only frames captured after the last gesture settled are used, and every
/// retry waits for a frame newer than the one it just rejected.
pub struct Locator {
    source: Box<dyn FrameSource>,
    store: Arc<TemplateStore>,
    matcher: TemplateMatcher,
    confidence: ConfidenceSettings,
    ctx: RunContext,
    retry_interval: Duration,
    last_frame: Option<Arc<Frame>>,
    gray: Option<(u64, Arc<GrayImage>)>,
}

impl Locator {
    pub fn new(
        source: Box<dyn FrameSource>,
        store: Arc<TemplateStore>,
        confidence: ConfidenceSettings,
        ctx: RunContext,
    ) -> Self {
        Self {
            source,
            store,
            matcher: TemplateMatcher::default(),
            confidence,
            ctx,
            retry_interval: Duration::from_secs(1),
            last_frame: None,
            gray: None,
        }
    }

    pub fn with_matcher(mut self, matcher: TemplateMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn store(&self) -> &Arc<TemplateStore> {
        &self.store
    }

    /// Most recent frame any query looked at
    pub fn last_frame(&self) -> Option<Arc<Frame>> {
        self.last_frame.clone()
    }

    /// Button center, or None after `tries` fresh frames
    pub fn find(&mut self, name: &str, tries: u32) -> Result<Option<Point>, BotError> {
        Ok(self.locate(name, Category::Button, tries, false)?.map(|m| m.location))
    }

    /// Full match result for any category
    pub fn locate(
        &mut self,
        name: &str,
        category: Category,
        tries: u32,
        use_edge_filter: bool,
    ) -> Result<Option<MatchResult>, BotError> {
        let template = self.store.get(name, category)?;
        let threshold = category.threshold(&self.confidence);
        let poll = Poll::every(self.retry_interval).attempts(tries.max(1));

        let stop = self.ctx.stop.clone();
        let found = poll_until(&stop, poll, |attempt| {
            let gray = self.fresh_gray(attempt > 0)?;
            let result = self
                .matcher
                .match_template(&gray, &template, threshold, use_edge_filter);
            if result.matched {
                debug!("Found {} at {} (score {:.3})", name, result.location, result.score);
                Ok(Some(result))
            } else {
                debug!("{} not found on attempt {} (best {:.3})", name, attempt + 1, result.score);
                Ok(None)
            }
        })?;
        Ok(found)
    }

    /// Whether the current screen shows the `name` header
    pub fn confirm_location(&mut self, name: &str, tries: u32) -> Result<bool, BotError> {
        let found = self.locate(name, Category::Header, tries, false)?.is_some();
        if found {
            debug!("Current location confirmed to be at {}", name);
        }
        Ok(found)
    }

    /// Every instance of a repeated element in one fresh frame, in reading
    /// order (rows top to bottom, left to right within a row).
    pub fn find_all(&mut self, name: &str, category: Category) -> Result<Vec<Point>, BotError> {
        let template = self.store.get(name, category)?;
        let gray = self.fresh_gray(false)?;
        let hits = self
            .matcher
            .match_all(&gray, &template, self.confidence.find_all, false);
        let points: Vec<Point> = hits.into_iter().map(|h| h.location).collect();
        debug!("Found {} instances of {}: {:?}", points.len(), name, points);
        Ok(points)
    }

    /// Poll until the button disappears. False if it is still there after `timeout`.
    pub fn wait_vanish(&mut self, name: &str, timeout: Duration) -> Result<bool, BotError> {
        let attempts = (timeout.as_millis() / self.retry_interval.as_millis().max(1)) as u32 + 1;
        let poll = Poll::every(self.retry_interval).attempts(attempts);
        let stop = self.ctx.stop.clone();
        let gone = poll_until(&stop, poll, |_| {
            Ok(self.locate(name, Category::Button, 1, false)?.is_none().then_some(()))
        })?;
        debug!("{} vanished: {}", name, gone.is_some());
        Ok(gone.is_some())
    }

    /// Grayscale of a frame taken after the settle deadline. `newer` also
    /// requires it to be newer than the last frame used.
    fn fresh_gray(&mut self, newer: bool) -> Result<Arc<GrayImage>, BotError> {
        let mut not_before = self.ctx.settle.deadline();
        if newer {
            if let Some(last) = &self.last_frame {
                not_before = not_before.max(last.captured_at + Duration::from_nanos(1));
            }
        }
        let frame = self.source.frame_since(not_before, &self.ctx.stop)?;

        if let Some((seq, gray)) = &self.gray {
            if *seq == frame.seq && self.last_frame.as_ref().is_some_and(|f| Arc::ptr_eq(f, &frame)) {
                return Ok(Arc::clone(gray));
            }
        }
        let gray = Arc::new(image::imageops::grayscale(&frame.image));
        self.gray = Some((frame.seq, Arc::clone(&gray)));
        self.last_frame = Some(frame);
        Ok(gray)
    }

    /// Deadline before which frames are not trusted
    pub fn settle_deadline(&self) -> Instant {
        self.ctx.settle.deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::tests::{noise, paste};
    use crate::matcher::Template;
    use gbf_data::{DeviceHints, ScreenProfile};
    use gbf_state::{StopSignal, TracingSink};
    use image::{Luma, RgbaImage};
    use std::sync::Mutex;

    /// Frames built from a shared list of screens; each request returns the
    /// next screen in the list (holding on the last) stamped with the time of
    /// the request.
    struct Screens {
        frames: Arc<Mutex<Vec<GrayImage>>>,
        served: Arc<Mutex<Vec<Instant>>>,
        seq: u64,
    }

    impl FrameSource for Screens {
        fn frame_since(&mut self, not_before: Instant, stop: &StopSignal) -> Result<Arc<Frame>, BotError> {
            stop.sleep_until(not_before)?;
            let mut frames = self.frames.lock().unwrap();
            let gray = if frames.len() > 1 { frames.remove(0) } else { frames[0].clone() };
            let rgba = RgbaImage::from_fn(gray.width(), gray.height(), |x, y| {
                let v = gray.get_pixel(x, y)[0];
                image::Rgba([v, v, v, 255])
            });
            self.seq += 1;
            let now = Instant::now();
            self.served.lock().unwrap().push(now);
            Ok(Arc::new(Frame::new(rgba, now, self.seq)))
        }
    }

    fn build(screens: Vec<GrayImage>, templates: Vec<(Category, Template)>) -> (Locator, Arc<Mutex<Vec<Instant>>>, RunContext) {
        let store = Arc::new(TemplateStore::new("/nonexistent", 1.0));
        for (category, t) in templates {
            store.insert(category, t);
        }
        let served = Arc::new(Mutex::new(Vec::new()));
        let source = Screens {
            frames: Arc::new(Mutex::new(screens)),
            served: Arc::clone(&served),
            seq: 0,
        };
        let profile = ScreenProfile::detect(400, 300, 0, &DeviceHints::default());
        let ctx = RunContext::new(profile, Arc::new(TracingSink));
        let locator = Locator::new(Box::new(source), store, ConfidenceSettings::default(), ctx.clone())
            .with_retry_interval(Duration::from_millis(5));
        (locator, served, ctx)
    }

    #[test]
    fn test_find_embedded_template_center() {
        let tmpl = noise(40, 20, 77);
        let mut frame = noise(400, 300, 1);
        paste(&mut frame, &tmpl, 120, 80);

        let (mut locator, _, _) = build(vec![frame], vec![(Category::Button, Template::new("attack", tmpl))]);
        assert_eq!(locator.find("attack", 1).unwrap(), Some(Point::new(140, 90)));
    }

    #[test]
    fn test_find_retries_on_fresh_frames() {
        let tmpl = noise(30, 30, 5);
        let blank = noise(200, 200, 6);
        let mut with = blank.clone();
        paste(&mut with, &tmpl, 10, 10);

        let (mut locator, served, _) = build(
            vec![blank.clone(), blank, with],
            vec![(Category::Button, Template::new("ok", tmpl))],
        );
        assert_eq!(locator.find("ok", 3).unwrap(), Some(Point::new(25, 25)));
        let served = served.lock().unwrap();
        assert_eq!(served.len(), 3);
        assert!(served.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_miss_after_tries_is_none() {
        let (mut locator, served, _) = build(
            vec![noise(120, 120, 2)],
            vec![(Category::Header, Template::new("home", noise(40, 10, 3)))],
        );
        assert!(!locator.confirm_location("home", 2).unwrap());
        assert_eq!(served.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_frames_wait_for_settle_deadline() {
        let tmpl = noise(20, 20, 8);
        let mut frame = noise(100, 100, 9);
        paste(&mut frame, &tmpl, 0, 0);
        let (mut locator, served, ctx) = build(vec![frame], vec![(Category::Button, Template::new("close", tmpl))]);

        let deadline = ctx.settle.extend(Duration::from_millis(40));
        assert!(locator.find("close", 1).unwrap().is_some());
        assert!(served.lock().unwrap()[0] >= deadline);
    }

    #[test]
    fn test_find_all_reading_order() {
        let tmpl = noise(30, 16, 12);
        let mut frame = noise(400, 300, 13);
        for (x, y) in [(300, 200), (40, 50), (200, 52), (40, 200)] {
            paste(&mut frame, &tmpl, x, y);
        }
        let (mut locator, _, _) = build(vec![frame], vec![(Category::Button, Template::new("joined", tmpl))]);
        assert_eq!(
            locator.find_all("joined", Category::Button).unwrap(),
            vec![
                Point::new(55, 58),
                Point::new(215, 60),
                Point::new(55, 208),
                Point::new(315, 208),
            ]
        );
    }

    #[test]
    fn test_wait_vanish() {
        let tmpl = noise(20, 20, 4);
        let blank = GrayImage::from_pixel(100, 100, Luma([0]));
        let mut with = noise(100, 100, 5);
        paste(&mut with, &tmpl, 30, 30);

        let (mut locator, _, _) = build(
            vec![with.clone(), with.clone(), blank],
            vec![(Category::Button, Template::new("loading", tmpl.clone()))],
        );
        assert!(locator.wait_vanish("loading", Duration::from_millis(50)).unwrap());

        let (mut stuck, _, _) = build(vec![with], vec![(Category::Button, Template::new("loading", tmpl))]);
        assert!(!stuck.wait_vanish("loading", Duration::from_millis(20)).unwrap());
    }

    #[test]
    fn test_stop_cancels_lookup() {
        let (mut locator, _, ctx) = build(
            vec![noise(50, 50, 1)],
            vec![(Category::Button, Template::new("ok", noise(10, 10, 2)))],
        );
        ctx.stop.stop();
        assert!(matches!(locator.find("ok", 3), Err(BotError::Cancelled)));
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let (mut locator, _, _) = build(vec![noise(50, 50, 1)], vec![]);
        assert!(matches!(locator.find("nope", 1), Err(BotError::Device(_))));
    }
}
