use gbf_state::Point;
use image::imageops::FilterType;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Frames larger than this many pixels are searched coarse-to-fine
const COARSE_AREA: u64 = 640 * 640;

/// Smallest template side still usable at the coarse level
const MIN_COARSE_SIDE: u32 = 8;

/// Coarse peaks `find` always refines, even below the relaxed threshold
const COARSE_PEAKS: usize = 5;

/// Threshold relaxation for coarse candidates. Downscaling blurs away the
/// detail that tells lookalike elements apart, so every coarse peak within
/// this margin of the threshold is refined at full resolution.
const COARSE_SLACK: f64 = 0.4;

/// Correlation score family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchMethod {
    /// Zero-mean normalized cross-correlation, similarity in [-1, 1]
    #[default]
    CorrelationCoefficientNormed,
    /// Normalized cross-correlation without mean removal, similarity in [0, 1]
    CrossCorrelationNormed,
    /// Normalized squared difference, distance (0 is a perfect match)
    SquaredDifferenceNormed,
}

impl MatchMethod {
    pub fn is_distance(self) -> bool {
        matches!(self, Self::SquaredDifferenceNormed)
    }

    /// Higher is always better
    fn goodness(self, score: f64) -> f64 {
        if self.is_distance() {
            -score
        } else {
            score
        }
    }

    /// Similarity threshold `t` accepts `score >= t`; distance metrics
    /// accept `score <= 1 - t`.
    pub fn accepts(self, score: f64, threshold: f64) -> bool {
        if self.is_distance() {
            score <= 1.0 - threshold
        } else {
            score >= threshold
        }
    }

    fn goodness_threshold(self, threshold: f64) -> f64 {
        if self.is_distance() {
            threshold - 1.0
        } else {
            threshold
        }
    }
}

/// Outcome of matching one template against one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Center of the matched region
    pub location: Point,
    pub score: f64,
    pub matched: bool,
}

/// Grayscale reference image with its correlation kernel precomputed
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    gray: GrayImage,
    edges: GrayImage,
}

impl Template {
    pub fn new(name: impl Into<String>, gray: GrayImage) -> Self {
        let name = name.into();
        let edges = edge_filter(&gray);
        let (_, std_dev) = compute_stats(&gray);
        if std_dev < 1.0 {
            warn!("Template {} is nearly uniform, correlation scores will be unreliable", name);
        }
        Self { name, gray, edges }
    }

    pub fn width(&self) -> u32 {
        self.gray.width()
    }

    pub fn height(&self) -> u32 {
        self.gray.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.gray.dimensions()
    }

    pub fn diagonal(&self) -> f64 {
        (self.width() as f64).hypot(self.height() as f64)
    }

    fn image(&self, edges: bool) -> &GrayImage {
        if edges {
            &self.edges
        } else {
            &self.gray
        }
    }
}

/// 3x3 blur then Canny, for templates whose flat colours match too many places.
pub fn edge_filter(gray: &GrayImage) -> GrayImage {
    let blurred = imageproc::filter::box_filter(gray, 1, 1);
    imageproc::edges::canny(&blurred, 100.0, 300.0)
}

/// Mean and standard deviation of pixel values
pub fn compute_stats(img: &GrayImage) -> (f64, f64) {
    let n = (img.width() * img.height()) as f64;
    if n == 0.0 {
        return (0.0, 0.0);
    }
    let mean = img.pixels().map(|p| p[0] as f64).sum::<f64>() / n;
    let variance = img
        .pixels()
        .map(|p| (p[0] as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}

/// Pixel plane with summed-area tables for O(1) window sums
struct Plane {
    width: usize,
    height: usize,
    px: Vec<f64>,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl Plane {
    fn new(img: &GrayImage) -> Self {
        let (width, height) = (img.width() as usize, img.height() as usize);
        let px: Vec<f64> = img.pixels().map(|p| p[0] as f64).collect();
        let stride = width + 1;
        let mut sum = vec![0.0; stride * (height + 1)];
        let mut sum_sq = vec![0.0; stride * (height + 1)];
        for y in 0..height {
            let mut row = 0.0;
            let mut row_sq = 0.0;
            for x in 0..width {
                let v = px[y * width + x];
                row += v;
                row_sq += v * v;
                sum[(y + 1) * stride + x + 1] = sum[y * stride + x + 1] + row;
                sum_sq[(y + 1) * stride + x + 1] = sum_sq[y * stride + x + 1] + row_sq;
            }
        }
        Self {
            width,
            height,
            px,
            sum,
            sum_sq,
        }
    }

    fn window(&self, table: &[f64], x: usize, y: usize, w: usize, h: usize) -> f64 {
        let stride = self.width + 1;
        table[(y + h) * stride + x + w] - table[y * stride + x + w] - table[(y + h) * stride + x]
            + table[y * stride + x]
    }
}

/// Template pixels prepared for one method
struct Kernel {
    width: usize,
    height: usize,
    values: Vec<f64>,
    energy: f64,
}

impl Kernel {
    fn new(img: &GrayImage, method: MatchMethod) -> Self {
        let (mean, _) = compute_stats(img);
        let shift = match method {
            MatchMethod::CorrelationCoefficientNormed => mean,
            _ => 0.0,
        };
        let values: Vec<f64> = img.pixels().map(|p| p[0] as f64 - shift).collect();
        let energy = values.iter().map(|v| v * v).sum();
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            values,
            energy,
        }
    }
}

/// Scores for every placement of a template's top-left corner
struct ScoreMap {
    width: usize,
    height: usize,
    scores: Vec<f64>,
}

impl ScoreMap {
    fn at(&self, x: usize, y: usize) -> f64 {
        self.scores[y * self.width + x]
    }
}

fn score_at(plane: &Plane, kernel: &Kernel, method: MatchMethod, x: usize, y: usize) -> f64 {
    let mut cross = 0.0;
    for j in 0..kernel.height {
        let row = &plane.px[(y + j) * plane.width + x..][..kernel.width];
        let krow = &kernel.values[j * kernel.width..][..kernel.width];
        cross += row.iter().zip(krow).map(|(a, b)| a * b).sum::<f64>();
    }

    let n = (kernel.width * kernel.height) as f64;
    let sum = plane.window(&plane.sum, x, y, kernel.width, kernel.height);
    let sum_sq = plane.window(&plane.sum_sq, x, y, kernel.width, kernel.height);

    match method {
        MatchMethod::CorrelationCoefficientNormed => {
            let variance = (sum_sq - sum * sum / n).max(0.0);
            let denom = (variance * kernel.energy).sqrt();
            if denom < 1e-6 {
                0.0
            } else {
                (cross / denom).clamp(-1.0, 1.0)
            }
        }
        MatchMethod::CrossCorrelationNormed => {
            let denom = (sum_sq * kernel.energy).sqrt();
            if denom < 1e-6 {
                0.0
            } else {
                (cross / denom).clamp(0.0, 1.0)
            }
        }
        MatchMethod::SquaredDifferenceNormed => {
            let denom = (sum_sq * kernel.energy).sqrt();
            if denom < 1e-6 {
                if sum_sq + kernel.energy < 1e-6 {
                    0.0
                } else {
                    1.0
                }
            } else {
                ((sum_sq - 2.0 * cross + kernel.energy) / denom).max(0.0)
            }
        }
    }
}

fn score_map(plane: &Plane, kernel: &Kernel, method: MatchMethod) -> Option<ScoreMap> {
    if kernel.width == 0 || kernel.height == 0 || kernel.width > plane.width || kernel.height > plane.height {
        return None;
    }
    let width = plane.width - kernel.width + 1;
    let height = plane.height - kernel.height + 1;
    let mut scores = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            scores.push(score_at(plane, kernel, method, x, y));
        }
    }
    Some(ScoreMap {
        width,
        height,
        scores,
    })
}

/// Placement of a template's top-left corner with its score
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    x: usize,
    y: usize,
    score: f64,
}

/// Local maxima of goodness at or above `min_goodness`, best first
fn peaks(map: &ScoreMap, method: MatchMethod, min_goodness: f64) -> Vec<Placement> {
    let mut found = Vec::new();
    for y in 0..map.height {
        for x in 0..map.width {
            let g = method.goodness(map.at(x, y));
            if g < min_goodness {
                continue;
            }
            let is_peak = (y.saturating_sub(1)..=(y + 1).min(map.height - 1)).all(|ny| {
                (x.saturating_sub(1)..=(x + 1).min(map.width - 1))
                    .all(|nx| method.goodness(map.at(nx, ny)) <= g)
            });
            if is_peak {
                found.push(Placement {
                    x,
                    y,
                    score: map.at(x, y),
                });
            }
        }
    }
    sort_best_first(&mut found, method);
    found
}

fn sort_best_first(placements: &mut [Placement], method: MatchMethod) {
    placements.sort_by(|a, b| method.goodness(b.score).total_cmp(&method.goodness(a.score)));
}

/// Greedy non-maximum suppression: keep the best placement, drop everything
/// closer than `min_distance` to a kept one, repeat.
fn suppress(candidates: &[Placement], min_distance: f64) -> Vec<Placement> {
    let mut kept: Vec<Placement> = Vec::new();
    for c in candidates {
        let clear = kept.iter().all(|k| {
            let dx = c.x as f64 - k.x as f64;
            let dy = c.y as f64 - k.y as f64;
            dx.hypot(dy) >= min_distance
        });
        if clear {
            kept.push(*c);
        }
    }
    kept
}

/// Row-major order: rows top to bottom, left to right within a row. Hits
/// whose y is within half a template height of the row's first hit share
/// that row.
pub fn reading_order(hits: &mut Vec<MatchResult>, template_height: u32) {
    let tolerance = (template_height / 2) as i32;
    hits.sort_by_key(|h| (h.location.y, h.location.x));

    let mut ordered = Vec::with_capacity(hits.len());
    let mut row: Vec<MatchResult> = Vec::new();
    for hit in hits.drain(..) {
        if let Some(first) = row.first() {
            if hit.location.y - first.location.y > tolerance {
                row.sort_by_key(|h| h.location.x);
                ordered.append(&mut row);
            }
        }
        row.push(hit);
    }
    row.sort_by_key(|h| h.location.x);
    ordered.append(&mut row);
    *hits = ordered;
}

/// Single-scale template matcher over grayscale frames
#[derive(Debug, Clone, Copy)]
pub struct TemplateMatcher {
    pub method: MatchMethod,
}

impl Default for TemplateMatcher {
    fn default() -> Self {
        Self::new(MatchMethod::default())
    }
}

impl TemplateMatcher {
    pub fn new(method: MatchMethod) -> Self {
        Self { method }
    }

    /// Best placement of `template` in `frame`.
    ///
    /// `threshold` is the similarity floor (0.8 by default); distance
    /// methods use `1 - threshold` as their ceiling.
    pub fn match_template(
        &self,
        frame: &GrayImage,
        template: &Template,
        threshold: f64,
        use_edge_filter: bool,
    ) -> MatchResult {
        let (frame_img, tmpl_img) = prepare(frame, template, use_edge_filter);
        let best = self.best_placement(&frame_img, tmpl_img, self.method.goodness_threshold(threshold));

        match best {
            Some(p) => {
                let matched = self.method.accepts(p.score, threshold);
                debug!(
                    "{}: best score {:.3} at ({}, {}), matched={}",
                    template.name, p.score, p.x, p.y, matched
                );
                MatchResult {
                    location: center(p, template),
                    score: p.score,
                    matched,
                }
            }
            None => MatchResult {
                location: Point::default(),
                score: if self.method.is_distance() { 1.0 } else { 0.0 },
                matched: false,
            },
        }
    }

    /// Centers of every instance scoring past `threshold`, in reading order,
    /// no two closer than the template's diagonal.
    pub fn match_all(
        &self,
        frame: &GrayImage,
        template: &Template,
        threshold: f64,
        use_edge_filter: bool,
    ) -> Vec<MatchResult> {
        let (frame_img, tmpl_img) = prepare(frame, template, use_edge_filter);
        let min_goodness = self.method.goodness_threshold(threshold);

        let candidates = match coarse_factor(&frame_img, tmpl_img) {
            None => {
                let plane = Plane::new(&frame_img);
                let kernel = Kernel::new(tmpl_img, self.method);
                match score_map(&plane, &kernel, self.method) {
                    Some(map) => peaks(&map, self.method, min_goodness),
                    None => Vec::new(),
                }
            }
            Some(factor) => {
                let coarse = self.coarse_peaks(&frame_img, tmpl_img, factor, min_goodness - COARSE_SLACK);
                let plane = Plane::new(&frame_img);
                let kernel = Kernel::new(tmpl_img, self.method);
                let mut refined: Vec<Placement> = coarse
                    .iter()
                    .filter_map(|c| self.refine(&plane, &kernel, c, factor))
                    .filter(|p| self.method.goodness(p.score) >= min_goodness)
                    .collect();
                sort_best_first(&mut refined, self.method);
                refined
            }
        };

        let mut hits: Vec<MatchResult> = suppress(&candidates, template.diagonal())
            .into_iter()
            .map(|p| MatchResult {
                location: center(p, template),
                score: p.score,
                matched: true,
            })
            .collect();
        reading_order(&mut hits, template.height());
        debug!("{}: {} instances", template.name, hits.len());
        hits
    }

    fn best_placement(&self, frame: &GrayImage, tmpl: &GrayImage, min_goodness: f64) -> Option<Placement> {
        let plane = Plane::new(frame);
        let kernel = Kernel::new(tmpl, self.method);

        match coarse_factor(frame, tmpl) {
            None => {
                let map = score_map(&plane, &kernel, self.method)?;
                let mut best: Option<Placement> = None;
                for y in 0..map.height {
                    for x in 0..map.width {
                        let score = map.at(x, y);
                        if best.map_or(true, |b| self.method.goodness(score) > self.method.goodness(b.score)) {
                            best = Some(Placement { x, y, score });
                        }
                    }
                }
                best
            }
            Some(factor) => {
                let relaxed = min_goodness - COARSE_SLACK;
                let coarse = self.coarse_peaks(frame, tmpl, factor, f64::NEG_INFINITY);
                coarse
                    .iter()
                    .enumerate()
                    .take_while(|(i, c)| *i < COARSE_PEAKS || self.method.goodness(c.score) >= relaxed)
                    .filter_map(|(_, c)| self.refine(&plane, &kernel, c, factor))
                    .max_by(|a, b| self.method.goodness(a.score).total_cmp(&self.method.goodness(b.score)))
            }
        }
    }

    fn coarse_peaks(&self, frame: &GrayImage, tmpl: &GrayImage, factor: u32, min_goodness: f64) -> Vec<Placement> {
        let small_frame = downscale(frame, factor);
        let small_tmpl = downscale(tmpl, factor);
        let plane = Plane::new(&small_frame);
        let kernel = Kernel::new(&small_tmpl, self.method);
        match score_map(&plane, &kernel, self.method) {
            Some(map) => {
                let found = peaks(&map, self.method, min_goodness);
                suppress(&found, (kernel.width as f64).hypot(kernel.height as f64) / 2.0)
            }
            None => Vec::new(),
        }
    }

    /// Exhaustive search at full resolution around a coarse placement
    fn refine(&self, plane: &Plane, kernel: &Kernel, coarse: &Placement, factor: u32) -> Option<Placement> {
        if kernel.width > plane.width || kernel.height > plane.height {
            return None;
        }
        let f = factor as usize;
        let max_x = plane.width - kernel.width;
        let max_y = plane.height - kernel.height;
        let cx = (coarse.x * f).min(max_x);
        let cy = (coarse.y * f).min(max_y);

        let mut best: Option<Placement> = None;
        for y in cy.saturating_sub(f)..=(cy + f).min(max_y) {
            for x in cx.saturating_sub(f)..=(cx + f).min(max_x) {
                let score = score_at(plane, kernel, self.method, x, y);
                if best.map_or(true, |b| self.method.goodness(score) > self.method.goodness(b.score)) {
                    best = Some(Placement { x, y, score });
                }
            }
        }
        best
    }
}

fn prepare<'a>(frame: &GrayImage, template: &'a Template, use_edge_filter: bool) -> (GrayImage, &'a GrayImage) {
    let frame_img = if use_edge_filter {
        edge_filter(frame)
    } else {
        frame.clone()
    };
    (frame_img, template.image(use_edge_filter))
}

fn center(p: Placement, template: &Template) -> Point {
    Point::new(
        (p.x as u32 + template.width() / 2) as i32,
        (p.y as u32 + template.height() / 2) as i32,
    )
}

/// Downscale factor for the coarse pass, or None for an exhaustive search
fn coarse_factor(frame: &GrayImage, tmpl: &GrayImage) -> Option<u32> {
    let area = frame.width() as u64 * frame.height() as u64;
    if area <= COARSE_AREA {
        return None;
    }
    let factor = ((area as f64 / COARSE_AREA as f64).sqrt().ceil() as u32).max(2);
    let small_side = tmpl.width().min(tmpl.height()) / factor;
    if small_side < MIN_COARSE_SIDE {
        return None;
    }
    Some(factor)
}

fn downscale(img: &GrayImage, factor: u32) -> GrayImage {
    let w = (img.width() / factor).max(1);
    let h = (img.height() / factor).max(1);
    image::imageops::resize(img, w, h, FilterType::Triangle)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Luma;

    /// Deterministic noise so no region of the background correlates well
    pub fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let mut h = x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263) ^ seed.wrapping_mul(2_246_822_519);
            h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
            Luma([(h >> 24) as u8])
        })
    }

    pub fn paste(frame: &mut GrayImage, tmpl: &GrayImage, x: u32, y: u32) {
        image::imageops::replace(frame, tmpl, x as i64, y as i64);
    }

    #[test]
    fn test_ncc_identical() {
        let img = GrayImage::from_fn(48, 48, |x, y| {
            Luma([(x.wrapping_mul(7).wrapping_add(y.wrapping_mul(13)) % 256) as u8])
        });
        let template = Template::new("pattern", img.clone());
        let result = TemplateMatcher::default().match_template(&img, &template, 0.8, false);
        assert!((result.score - 1.0).abs() < 1e-6, "got {}", result.score);
        assert!(result.matched);
    }

    #[test]
    fn test_find_returns_center_of_embedded_template() {
        let tmpl = noise(40, 20, 7);
        let mut frame = noise(400, 300, 1);
        paste(&mut frame, &tmpl, 120, 80);

        let template = Template::new("button", tmpl);
        let result = TemplateMatcher::default().match_template(&frame, &template, 0.8, false);
        assert!(result.matched);
        assert_eq!(result.location, Point::new(140, 90));
    }

    #[test]
    fn test_center_holds_for_odd_sizes() {
        for (w, h) in [(17u32, 9u32), (33, 40), (12, 12)] {
            let tmpl = noise(w, h, w * h);
            let mut frame = noise(200, 150, 3);
            paste(&mut frame, &tmpl, 50, 60);
            let template = Template::new("odd", tmpl);
            let result = TemplateMatcher::default().match_template(&frame, &template, 0.8, false);
            assert_eq!(result.location, Point::new((50 + w / 2) as i32, (60 + h / 2) as i32));
        }
    }

    #[test]
    fn test_threshold_decides_matched_for_each_method() {
        let tmpl = noise(30, 30, 11);
        let frame = noise(120, 120, 12);
        let template = Template::new("absent", tmpl.clone());

        for method in [
            MatchMethod::CorrelationCoefficientNormed,
            MatchMethod::CrossCorrelationNormed,
            MatchMethod::SquaredDifferenceNormed,
        ] {
            let matcher = TemplateMatcher::new(method);
            let result = matcher.match_template(&frame, &template, 0.8, false);
            assert_eq!(result.matched, method.accepts(result.score, 0.8), "{:?}", method);

            let mut with = frame.clone();
            paste(&mut with, &tmpl, 40, 40);
            let hit = matcher.match_template(&with, &template, 0.8, false);
            assert!(hit.matched, "{:?} score {}", method, hit.score);
        }
    }

    #[test]
    fn test_absent_template_is_soft_miss() {
        let template = Template::new("absent", noise(30, 30, 5));
        let frame = noise(160, 120, 6);
        let result = TemplateMatcher::default().match_template(&frame, &template, 0.8, false);
        assert!(!result.matched);
        assert!(result.score < 0.8);
    }

    #[test]
    fn test_template_larger_than_frame() {
        let template = Template::new("huge", noise(50, 50, 1));
        let frame = noise(20, 20, 2);
        let result = TemplateMatcher::default().match_template(&frame, &template, 0.8, false);
        assert!(!result.matched);
        assert!(TemplateMatcher::default().match_all(&frame, &template, 0.8, false).is_empty());
    }

    #[test]
    fn test_distance_accepts_at_or_below_point_two() {
        let method = MatchMethod::SquaredDifferenceNormed;
        assert!(method.accepts(0.2, 0.8));
        assert!(method.accepts(0.05, 0.8));
        assert!(!method.accepts(0.21, 0.8));
        assert!(MatchMethod::CorrelationCoefficientNormed.accepts(0.8, 0.8));
        assert!(!MatchMethod::CorrelationCoefficientNormed.accepts(0.79, 0.8));
    }

    #[test]
    fn test_match_all_suppresses_and_orders() {
        let tmpl = noise(24, 16, 42);
        let mut frame = noise(300, 200, 9);
        // Two rows, inserted out of order; second row slightly uneven
        let origins = [(200u32, 30u32), (20, 32), (110, 28), (60, 120), (20, 124)];
        for (x, y) in origins {
            paste(&mut frame, &tmpl, x, y);
        }

        let template = Template::new("use", tmpl);
        let hits = TemplateMatcher::default().match_all(&frame, &template, 0.8, false);
        let points: Vec<Point> = hits.iter().map(|h| h.location).collect();
        assert_eq!(
            points,
            vec![
                Point::new(32, 40),
                Point::new(122, 36),
                Point::new(212, 38),
                Point::new(32, 132),
                Point::new(72, 128),
            ]
        );

        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                assert!(a.distance(*b) >= template.diagonal());
            }
        }
    }

    #[test]
    fn test_coarse_search_on_large_frame() {
        let tmpl = noise(96, 48, 21);
        let mut frame = noise(820, 520, 22);
        paste(&mut frame, &tmpl, 601, 203);
        paste(&mut frame, &tmpl, 101, 403);
        assert!(coarse_factor(&frame, &tmpl).is_some());

        let template = Template::new("large", tmpl);
        let matcher = TemplateMatcher::default();
        let result = matcher.match_template(&frame, &template, 0.8, false);
        assert!(result.matched);
        assert_eq!(result.location, Point::new(601 + 48, 203 + 24));

        let all = matcher.match_all(&frame, &template, 0.8, false);
        let points: Vec<Point> = all.iter().map(|h| h.location).collect();
        assert_eq!(points, vec![Point::new(649, 227), Point::new(149, 427)]);
    }

    /// 72x36 button: dark border, flat face, optional noisy caption strip
    fn button(caption: Option<u32>) -> GrayImage {
        let text = caption.map(|seed| noise(32, 12, seed));
        GrayImage::from_fn(72, 36, |x, y| {
            if x < 4 || y < 4 || x >= 68 || y >= 32 {
                Luma([30])
            } else if let (Some(text), true) = (&text, (20..52).contains(&x) && (12..24).contains(&y)) {
                *text.get_pixel(x - 20, y - 12)
            } else {
                Luma([128])
            }
        })
    }

    #[test]
    fn test_coarse_search_prefers_exact_over_lookalikes() {
        for seed in 0..3 {
            let real = button(Some(seed + 100));
            let blank = button(None);
            let mut frame = noise(1080, 1920, seed);
            for i in 0..6 {
                paste(&mut frame, &blank, 90 + 150 * i, 300);
            }
            paste(&mut frame, &real, 415, 1183);
            assert!(coarse_factor(&frame, &real).is_some());

            let template = Template::new("ok", real);
            let result = TemplateMatcher::default().match_template(&frame, &template, 0.8, false);
            assert_eq!(result.location, Point::new(451, 1201), "seed {}", seed);
            assert!(result.matched);
            assert!(result.score > 0.99, "seed {} score {}", seed, result.score);
        }
    }

    #[test]
    fn test_edge_filter_keeps_location() {
        let mut tmpl = GrayImage::from_pixel(30, 30, Luma([20]));
        for y in 8..22 {
            for x in 8..22 {
                tmpl.put_pixel(x, y, Luma([230]));
            }
        }
        let mut frame = GrayImage::from_pixel(150, 100, Luma([20]));
        for y in 60..75 {
            for x in 10..18 {
                frame.put_pixel(x, y, Luma([230]));
            }
        }
        paste(&mut frame, &tmpl, 90, 40);

        let template = Template::new("square", tmpl);
        let result = TemplateMatcher::default().match_template(&frame, &template, 0.5, true);
        assert!(result.matched);
        assert_eq!(result.location, Point::new(105, 55));
    }

    #[test]
    fn test_reading_order_groups_rows() {
        let mut hits: Vec<MatchResult> = [(300, 102), (10, 98), (150, 250), (160, 100)]
            .into_iter()
            .map(|(x, y)| MatchResult {
                location: Point::new(x, y),
                score: 0.9,
                matched: true,
            })
            .collect();
        reading_order(&mut hits, 20);
        let points: Vec<Point> = hits.iter().map(|h| h.location).collect();
        assert_eq!(
            points,
            vec![
                Point::new(10, 98),
                Point::new(160, 100),
                Point::new(300, 102),
                Point::new(150, 250),
            ]
        );
    }
}
