//! $1 unistroke recognizer.
//!
//! Classifies a raw single-stroke point path against named templates after
//! normalizing away sampling density, rotation, scale, and position. Two
//! scoring backends: a golden-section search over candidate rotations
//! (default), and the closed-form "protractor" cosine distance over
//! vectorized strokes.
//!
//! Recognition never mutates templates; registering a new template is the
//! only write path.

use std::time::Instant;

use log::debug;

use crate::geom::{self, Point};

/// Points per normalized stroke.
pub const NUM_POINTS: usize = 64;
/// Side of the canonical scaling square.
pub const SQUARE_SIZE: f32 = 250.0;

const HALF_DIAGONAL: f32 = 176.776_7; // 0.5 * sqrt(250^2 + 250^2)
const ANGLE_RANGE: f32 = 45.0 * std::f32::consts::PI / 180.0;
const ANGLE_PRECISION: f32 = 2.0 * std::f32::consts::PI / 180.0;
const PHI: f32 = 0.618_034; // 0.5 * (sqrt(5) - 1)

/// Scoring backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionMode {
    /// Golden-section search over rotations, mean path distance.
    #[default]
    Geometric,
    /// Closed-form optimal cosine distance over normalized vectors.
    Protractor,
}

/// A normalized named template. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct Unistroke {
    pub name: String,
    points: Vec<Point>,
    vector: Vec<f32>,
}

impl Unistroke {
    /// Run the full normalization pipeline over a raw stroke. `None` when
    /// the stroke is degenerate (fewer than two points, zero-length path,
    /// or a bounding box with no extent in one dimension).
    pub fn new(name: &str, raw: &[Point]) -> Option<Self> {
        let resampled = resample(raw, NUM_POINTS)?;
        let angle = indicative_angle(&resampled);
        let rotated = geom::rotate_by(&resampled, -angle);
        let scaled = geom::scale_to_square(&rotated, SQUARE_SIZE)?;
        let translated = geom::translate_to_origin(&scaled);
        let vector = vectorize(&translated);
        Some(Self {
            name: name.to_string(),
            points: translated,
            vector,
        })
    }
}

/// Recognition outcome. `millis` is wall-clock time spent matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub name: String,
    pub score: f32,
    pub millis: u64,
}

/// Template store + matcher.
#[derive(Debug, Clone)]
pub struct Recognizer {
    templates: Vec<Unistroke>,
    mode: RecognitionMode,
}

impl Recognizer {
    /// A recognizer preloaded with the built-in template set.
    pub fn new(mode: RecognitionMode) -> Self {
        Self {
            templates: builtin_templates(),
            mode,
        }
    }

    /// A recognizer with no templates (enrollment-only setups).
    pub fn empty(mode: RecognitionMode) -> Self {
        Self {
            templates: Vec::new(),
            mode,
        }
    }

    pub fn mode(&self) -> RecognitionMode {
        self.mode
    }

    pub fn template_names(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Register a user stroke as a new template. Returns how many templates
    /// now share `name`; `None` when the stroke is degenerate.
    pub fn add_template(&mut self, name: &str, raw: &[Point]) -> Option<usize> {
        let stroke = Unistroke::new(name, raw)?;
        self.templates.push(stroke);
        Some(self.templates.iter().filter(|t| t.name == name).count())
    }

    /// Match a raw stroke against every template. `None` when there are no
    /// templates or the stroke is degenerate.
    pub fn recognize(&self, raw: &[Point]) -> Option<Match> {
        if self.templates.is_empty() {
            return None;
        }
        let started = Instant::now();
        let query = Unistroke::new("", raw)?;

        let mut best: Option<(&Unistroke, f32)> = None;
        for template in &self.templates {
            let d = match self.mode {
                RecognitionMode::Geometric => distance_at_best_angle(
                    &query.points,
                    &template.points,
                    -ANGLE_RANGE,
                    ANGLE_RANGE,
                    ANGLE_PRECISION,
                ),
                RecognitionMode::Protractor => {
                    optimal_cosine_distance(&template.vector, &query.vector)
                }
            };
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((template, d));
            }
        }

        let (template, d) = best?;
        let score = match self.mode {
            RecognitionMode::Geometric => 1.0 - d / HALF_DIAGONAL,
            RecognitionMode::Protractor => (1.0 / d.max(f32::EPSILON)).min(1.0),
        };
        let m = Match {
            name: template.name.clone(),
            score,
            millis: started.elapsed().as_millis() as u64,
        };
        debug!("recognize: {} score={:.3} ({}ms)", m.name, m.score, m.millis);
        Some(m)
    }
}

/// Resample a path to exactly `n` evenly spaced points. `None` when the
/// path is degenerate (under two points or near-zero length).
pub fn resample(points: &[Point], n: usize) -> Option<Vec<Point>> {
    if points.len() < 2 || n < 2 {
        return None;
    }
    let total = geom::path_length(points);
    if total < f32::EPSILON {
        return None;
    }
    let interval = total / (n - 1) as f32;

    let mut out = Vec::with_capacity(n);
    out.push(points[0]);
    let mut carried = 0.0f32;

    for i in 1..points.len() {
        let mut seg = geom::distance(points[i - 1], points[i]);
        if carried + seg >= interval {
            let mut prev = points[i - 1];
            while carried + seg >= interval {
                let t = if seg > 0.0 {
                    ((interval - carried) / seg).clamp(0.0, 1.0)
                } else {
                    0.5
                };
                let q = Point::new(
                    prev.x + t * (points[i].x - prev.x),
                    prev.y + t * (points[i].y - prev.y),
                );
                out.push(q);
                seg = carried + seg - interval;
                carried = 0.0;
                prev = q;
            }
            carried = seg;
        } else {
            carried += seg;
        }
    }
    // rounding can leave us one short of n
    while out.len() < n {
        out.push(*points.last().expect("non-empty input"));
    }
    out.truncate(n);
    Some(out)
}

/// Angle from the first point to the centroid; the canonical reference used
/// to undo rotation before comparison.
fn indicative_angle(points: &[Point]) -> f32 {
    let c = geom::centroid(points).expect("resampled stroke is non-empty");
    (c.y - points[0].y).atan2(c.x - points[0].x)
}

/// Flatten to a magnitude-normalized coordinate vector (protractor mode).
fn vectorize(points: &[Point]) -> Vec<f32> {
    let mut vector = Vec::with_capacity(points.len() * 2);
    let mut sum = 0.0f32;
    for p in points {
        vector.push(p.x);
        vector.push(p.y);
        sum += p.x * p.x + p.y * p.y;
    }
    let magnitude = sum.sqrt();
    if magnitude > f32::EPSILON {
        for v in &mut vector {
            *v /= magnitude;
        }
    }
    vector
}

/// Closed-form minimum angular distance between two stroke vectors.
fn optimal_cosine_distance(v1: &[f32], v2: &[f32]) -> f32 {
    let mut a = 0.0f32;
    let mut b = 0.0f32;
    for i in (0..v1.len().min(v2.len())).step_by(2) {
        a += v1[i] * v2[i] + v1[i + 1] * v2[i + 1];
        b += v1[i] * v2[i + 1] - v1[i + 1] * v2[i];
    }
    let angle = (b / a).atan();
    (a * angle.cos() + b * angle.sin()).clamp(-1.0, 1.0).acos()
}

/// Golden-section search for the rotation of `points` that minimizes the
/// mean path distance to `template`.
fn distance_at_best_angle(
    points: &[Point],
    template: &[Point],
    mut from: f32,
    mut to: f32,
    threshold: f32,
) -> f32 {
    let mut x1 = PHI * from + (1.0 - PHI) * to;
    let mut f1 = distance_at_angle(points, template, x1);
    let mut x2 = (1.0 - PHI) * from + PHI * to;
    let mut f2 = distance_at_angle(points, template, x2);
    while (to - from).abs() > threshold {
        if f1 < f2 {
            to = x2;
            x2 = x1;
            f2 = f1;
            x1 = PHI * from + (1.0 - PHI) * to;
            f1 = distance_at_angle(points, template, x1);
        } else {
            from = x1;
            x1 = x2;
            f1 = f2;
            x2 = (1.0 - PHI) * from + PHI * to;
            f2 = distance_at_angle(points, template, x2);
        }
    }
    f1.min(f2)
}

fn distance_at_angle(points: &[Point], template: &[Point], radians: f32) -> f32 {
    let rotated = geom::rotate_by(points, radians);
    path_distance(&rotated, template)
}

/// Mean point-to-point distance between two equal-length paths.
fn path_distance(a: &[Point], b: &[Point]) -> f32 {
    let n = a.len().min(b.len());
    if n == 0 {
        return f32::MAX;
    }
    let sum: f32 = a.iter().zip(b.iter()).map(|(p, q)| geom::distance(*p, *q)).sum();
    sum / n as f32
}

// ── Built-in templates ─────────────────────────────────────

/// Densify a corner sequence into a drawable polyline.
fn polyline(corners: &[(f32, f32)], steps_per_edge: usize) -> Vec<Point> {
    let mut out = Vec::new();
    for w in corners.windows(2) {
        let (ax, ay) = w[0];
        let (bx, by) = w[1];
        for s in 0..steps_per_edge {
            let t = s as f32 / steps_per_edge as f32;
            out.push(Point::new(ax + t * (bx - ax), ay + t * (by - ay)));
        }
    }
    if let Some(&(x, y)) = corners.last() {
        out.push(Point::new(x, y));
    }
    out
}

fn circle_stroke() -> Vec<Point> {
    (0..=48)
        .map(|i| {
            let a = std::f32::consts::TAU * i as f32 / 48.0;
            Point::new(100.0 * a.cos(), 100.0 * a.sin())
        })
        .collect()
}

fn builtin_templates() -> Vec<Unistroke> {
    let shapes: Vec<(&str, Vec<Point>)> = vec![
        ("circle", circle_stroke()),
        (
            "rectangle",
            polyline(
                &[
                    (0.0, 0.0),
                    (200.0, 0.0),
                    (200.0, 140.0),
                    (0.0, 140.0),
                    (0.0, 0.0),
                ],
                12,
            ),
        ),
        (
            "triangle",
            polyline(
                &[(0.0, 120.0), (80.0, 0.0), (160.0, 120.0), (0.0, 120.0)],
                12,
            ),
        ),
        (
            "check",
            polyline(&[(0.0, 40.0), (35.0, 80.0), (120.0, -40.0)], 16),
        ),
        (
            "x",
            polyline(
                &[(0.0, 0.0), (100.0, 100.0), (100.0, 0.0), (0.0, 100.0)],
                12,
            ),
        ),
    ];
    shapes
        .into_iter()
        .filter_map(|(name, pts)| Unistroke::new(name, &pts))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle_query(cx: f32, cy: f32, r: f32, n: usize) -> Vec<Point> {
        (0..=n)
            .map(|i| {
                let a = std::f32::consts::TAU * i as f32 / n as f32;
                Point::new(cx + r * a.cos(), cy + r * a.sin())
            })
            .collect()
    }

    #[test]
    fn test_resample_exact_count_and_length() {
        let raw = polyline(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)], 7);
        let resampled = resample(&raw, NUM_POINTS).unwrap();
        assert_eq!(resampled.len(), NUM_POINTS);
        let original = geom::path_length(&raw);
        let after = geom::path_length(&resampled);
        assert!(
            (original - after).abs() < original * 0.02,
            "length {} -> {}",
            original,
            after
        );
    }

    #[test]
    fn test_resample_degenerate() {
        assert!(resample(&[], NUM_POINTS).is_none());
        assert!(resample(&[Point::new(1.0, 1.0)], NUM_POINTS).is_none());
        // zero-length path
        let stuck = vec![Point::new(5.0, 5.0); 10];
        assert!(resample(&stuck, NUM_POINTS).is_none());
    }

    #[test]
    fn test_recognize_builtin_circle() {
        let rec = Recognizer::new(RecognitionMode::Geometric);
        let m = rec.recognize(&circle_query(300.0, 200.0, 80.0, 64)).unwrap();
        assert_eq!(m.name, "circle");
        assert!(m.score > 0.8, "score = {}", m.score);
    }

    #[test]
    fn test_recognition_is_invariant() {
        let rec = Recognizer::new(RecognitionMode::Geometric);
        // triangle drawn at 2x scale, rotated 30 degrees, translated
        let base = polyline(&[(0.0, 120.0), (80.0, 0.0), (160.0, 120.0), (0.0, 120.0)], 12);
        let rot = 30.0f32.to_radians();
        let (sin, cos) = rot.sin_cos();
        let moved: Vec<Point> = base
            .iter()
            .map(|p| {
                let x = p.x * 2.0;
                let y = p.y * 2.0;
                Point::new(x * cos - y * sin + 500.0, x * sin + y * cos - 90.0)
            })
            .collect();
        let m = rec.recognize(&moved).unwrap();
        assert_eq!(m.name, "triangle");
    }

    #[test]
    fn test_protractor_mode_agrees_on_identity() {
        let rec = Recognizer::new(RecognitionMode::Protractor);
        let m = rec.recognize(&circle_query(0.0, 0.0, 120.0, 48)).unwrap();
        assert_eq!(m.name, "circle");
        assert!(m.score > 0.5, "score = {}", m.score);
    }

    #[test]
    fn test_empty_template_set() {
        let rec = Recognizer::empty(RecognitionMode::Geometric);
        assert!(rec.recognize(&circle_query(0.0, 0.0, 50.0, 32)).is_none());
    }

    #[test]
    fn test_degenerate_query() {
        let rec = Recognizer::new(RecognitionMode::Geometric);
        assert!(rec.recognize(&[]).is_none());
        assert!(rec.recognize(&[Point::new(1.0, 1.0)]).is_none());
        // straight horizontal stroke has a degenerate bounding box
        let line: Vec<Point> = (0..20).map(|i| Point::new(i as f32 * 10.0, 50.0)).collect();
        assert!(rec.recognize(&line).is_none());
    }

    #[test]
    fn test_add_template_at_runtime() {
        let mut rec = Recognizer::empty(RecognitionMode::Geometric);
        let zigzag = polyline(
            &[(0.0, 0.0), (40.0, 80.0), (80.0, 0.0), (120.0, 80.0)],
            10,
        );
        assert_eq!(rec.add_template("zigzag", &zigzag), Some(1));
        assert_eq!(rec.add_template("zigzag", &zigzag), Some(2));
        let m = rec.recognize(&zigzag).unwrap();
        assert_eq!(m.name, "zigzag");
        assert!(m.score > 0.9);
    }

    #[test]
    fn test_add_template_rejects_degenerate() {
        let mut rec = Recognizer::empty(RecognitionMode::Geometric);
        assert_eq!(rec.add_template("dot", &[Point::new(1.0, 1.0)]), None);
        assert!(rec.is_empty());
    }

    #[test]
    fn test_builtins_present() {
        let rec = Recognizer::new(RecognitionMode::Geometric);
        let names = rec.template_names();
        for expected in ["circle", "rectangle", "triangle", "check", "x"] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
    }
}
