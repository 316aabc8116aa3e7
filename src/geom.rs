//! Geometry primitives shared by the recognizers and listeners.
//!
//! Everything here is a pure function over fully-defined points. Partially
//! tracked coordinates ([`TrackedPoint`]) must be resolved first; no function
//! in this module substitutes a default for a missing coordinate.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A per-frame landmark coordinate where either component may be missing.
///
/// Absence means "not visible this frame" and is a normal state, not an
/// error. The only way to obtain a usable [`Point`] is [`resolved`], which
/// refuses rather than defaulting to zero.
///
/// [`resolved`]: TrackedPoint::resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackedPoint {
    pub x: Option<f32>,
    pub y: Option<f32>,
}

impl TrackedPoint {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }

    pub fn missing() -> Self {
        Self::default()
    }

    pub fn resolved(&self) -> Option<Point> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point { x, y }),
            _ => None,
        }
    }
}

impl From<Point> for TrackedPoint {
    fn from(p: Point) -> Self {
        Self::at(p.x, p.y)
    }
}

/// Axis-aligned rectangle, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    /// Smallest rectangle covering both corner points.
    pub fn spanning(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self {
            x,
            y,
            w: (a.x - b.x).abs(),
            h: (a.y - b.y).abs(),
        }
    }
}

/// A listener's sensitive area: a position plus either rectangular extents
/// or a radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Region {
    Rect { x: f32, y: f32, w: f32, h: f32 },
    Circle { x: f32, y: f32, radius: f32 },
}

impl Region {
    pub fn contains(&self, p: Point) -> bool {
        match *self {
            Region::Rect { x, y, w, h } => Rect { x, y, w, h }.contains(p),
            Region::Circle { x, y, radius } => distance(Point::new(x, y), p) <= radius,
        }
    }

    /// Containment for a possibly-invisible point. `None` means the point is
    /// not visible this frame; callers treat that as out-of-bounds.
    pub fn contains_tracked(&self, tp: &TrackedPoint) -> Option<bool> {
        tp.resolved().map(|p| self.contains(p))
    }

    pub fn center(&self) -> Point {
        match *self {
            Region::Rect { x, y, w, h } => Point::new(x + w / 2.0, y + h / 2.0),
            Region::Circle { x, y, .. } => Point::new(x, y),
        }
    }
}

pub fn distance(a: Point, b: Point) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// `None` on an empty set.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f32;
    let sx: f32 = points.iter().map(|p| p.x).sum();
    let sy: f32 = points.iter().map(|p| p.y).sum();
    Some(Point::new(sx / n, sy / n))
}

/// `None` on an empty set.
pub fn bounding_box(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let (mut minx, mut miny, mut maxx, mut maxy) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        minx = minx.min(p.x);
        miny = miny.min(p.y);
        maxx = maxx.max(p.x);
        maxy = maxy.max(p.y);
    }
    Some(Rect {
        x: minx,
        y: miny,
        w: maxx - minx,
        h: maxy - miny,
    })
}

pub fn path_length(points: &[Point]) -> f32 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Rotate every point by `radians` about the set's centroid.
pub fn rotate_by(points: &[Point], radians: f32) -> Vec<Point> {
    let c = match centroid(points) {
        Some(c) => c,
        None => return Vec::new(),
    };
    let (sin, cos) = radians.sin_cos();
    points
        .iter()
        .map(|p| {
            let dx = p.x - c.x;
            let dy = p.y - c.y;
            Point::new(dx * cos - dy * sin + c.x, dx * sin + dy * cos + c.y)
        })
        .collect()
}

/// Non-uniform scale onto a `size`×`size` box. `None` when the bounding box
/// is degenerate in either dimension (a straight horizontal or vertical
/// stroke cannot be scaled without dividing by zero).
pub fn scale_to_square(points: &[Point], size: f32) -> Option<Vec<Point>> {
    let bb = bounding_box(points)?;
    if bb.w < f32::EPSILON || bb.h < f32::EPSILON {
        return None;
    }
    Some(
        points
            .iter()
            .map(|p| Point::new(p.x * size / bb.w, p.y * size / bb.h))
            .collect(),
    )
}

/// Translate the set so its centroid lands on the origin.
pub fn translate_to_origin(points: &[Point]) -> Vec<Point> {
    let c = match centroid(points) {
        Some(c) => c,
        None => return Vec::new(),
    };
    points
        .iter()
        .map(|p| Point::new(p.x - c.x, p.y - c.y))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn test_tracked_point_resolution() {
        assert_eq!(
            TrackedPoint::at(1.0, 2.0).resolved(),
            Some(Point::new(1.0, 2.0))
        );
        assert_eq!(TrackedPoint::missing().resolved(), None);
        // one missing component is still unusable
        let half = TrackedPoint {
            x: Some(1.0),
            y: None,
        };
        assert_eq!(half.resolved(), None);
    }

    #[test]
    fn test_centroid_and_bbox() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        assert_eq!(centroid(&pts), Some(Point::new(1.0, 1.0)));
        let bb = bounding_box(&pts).unwrap();
        assert_eq!((bb.x, bb.y, bb.w, bb.h), (0.0, 0.0, 2.0, 2.0));
        assert_eq!(centroid(&[]), None);
        assert_eq!(bounding_box(&[]), None);
    }

    #[test]
    fn test_region_containment() {
        let r = Region::Rect {
            x: 10.0,
            y: 10.0,
            w: 100.0,
            h: 50.0,
        };
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(110.0, 60.0)));
        assert!(!r.contains(Point::new(111.0, 30.0)));

        let c = Region::Circle {
            x: 0.0,
            y: 0.0,
            radius: 5.0,
        };
        assert!(c.contains(Point::new(3.0, 4.0)));
        assert!(!c.contains(Point::new(4.0, 4.0)));
    }

    #[test]
    fn test_contains_tracked_missing_is_none() {
        let r = Region::Circle {
            x: 0.0,
            y: 0.0,
            radius: 5.0,
        };
        assert_eq!(r.contains_tracked(&TrackedPoint::missing()), None);
        assert_eq!(r.contains_tracked(&TrackedPoint::at(1.0, 1.0)), Some(true));
    }

    #[test]
    fn test_rotate_preserves_centroid() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
        ];
        let rotated = rotate_by(&pts, std::f32::consts::FRAC_PI_3);
        let before = centroid(&pts).unwrap();
        let after = centroid(&rotated).unwrap();
        assert!((before.x - after.x).abs() < 1e-4);
        assert!((before.y - after.y).abs() < 1e-4);
        // pairwise distances unchanged
        assert!((distance(pts[0], pts[1]) - distance(rotated[0], rotated[1])).abs() < 1e-4);
    }

    #[test]
    fn test_scale_to_square_degenerate() {
        // horizontal line has zero height
        let line = [Point::new(0.0, 1.0), Point::new(9.0, 1.0)];
        assert!(scale_to_square(&line, 250.0).is_none());

        let pts = [Point::new(0.0, 0.0), Point::new(2.0, 1.0)];
        let scaled = scale_to_square(&pts, 250.0).unwrap();
        let bb = bounding_box(&scaled).unwrap();
        assert!((bb.w - 250.0).abs() < 1e-3);
        assert!((bb.h - 250.0).abs() < 1e-3);
    }

    #[test]
    fn test_translate_to_origin() {
        let pts = [Point::new(10.0, 10.0), Point::new(12.0, 14.0)];
        let moved = translate_to_origin(&pts);
        let c = centroid(&moved).unwrap();
        assert!(c.x.abs() < 1e-5);
        assert!(c.y.abs() < 1e-5);
    }

    #[test]
    fn test_rect_spanning() {
        let r = Rect::spanning(Point::new(5.0, 1.0), Point::new(1.0, 7.0));
        assert_eq!((r.x, r.y, r.w, r.h), (1.0, 1.0, 4.0, 6.0));
    }
}
