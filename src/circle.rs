//! Algebraic (Kasa) least-squares circle fit.
//!
//! Used by the stroke listener to turn a recognized circular stroke into a
//! continuous intensity value (the fitted radius). Stateless: every call
//! computes from scratch over the points it is given.

use crate::geom::Point;

const SINGULAR_EPS: f64 = 1e-8;

/// Result of a circle fit. Check `success` before trusting anything else;
/// degenerate input (fewer than 3 points, colinear points) yields a default
/// center/radius with `success = false`.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleFit {
    pub success: bool,
    pub center: Point,
    pub radius: f32,
    /// Signed distance of each input point from the fitted circle
    /// (positive = outside).
    pub distances: Vec<f32>,
    /// Sum of squared signed distances.
    pub residue: f32,
}

impl CircleFit {
    fn failure() -> Self {
        Self {
            success: false,
            center: Point::new(0.0, 0.0),
            radius: 0.0,
            distances: Vec::new(),
            residue: 0.0,
        }
    }
}

/// Fit a circle through `points` by solving the 2×2 normal system built from
/// the centered second and third moments.
pub fn fit(points: &[Point]) -> CircleFit {
    if points.len() < 3 {
        return CircleFit::failure();
    }

    let n = points.len() as f64;
    let mx = points.iter().map(|p| p.x as f64).sum::<f64>() / n;
    let my = points.iter().map(|p| p.y as f64).sum::<f64>() / n;

    let (mut suu, mut suv, mut svv) = (0.0f64, 0.0f64, 0.0f64);
    let (mut suuu, mut svvv, mut suvv, mut svuu) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    for p in points {
        let u = p.x as f64 - mx;
        let v = p.y as f64 - my;
        suu += u * u;
        suv += u * v;
        svv += v * v;
        suuu += u * u * u;
        svvv += v * v * v;
        suvv += u * v * v;
        svuu += v * u * u;
    }

    // | suu suv | |uc|   | (suuu + suvv)/2 |
    // | suv svv | |vc| = | (svvv + svuu)/2 |
    let det = suu * svv - suv * suv;
    if det.abs() < SINGULAR_EPS {
        return CircleFit::failure();
    }
    let rhs_u = (suuu + suvv) / 2.0;
    let rhs_v = (svvv + svuu) / 2.0;
    let uc = (rhs_u * svv - rhs_v * suv) / det;
    let vc = (rhs_v * suu - rhs_u * suv) / det;

    let center = Point::new((mx + uc) as f32, (my + vc) as f32);
    let radius = (uc * uc + vc * vc + (suu + svv) / n).sqrt() as f32;

    let distances: Vec<f32> = points
        .iter()
        .map(|p| crate::geom::distance(*p, center) - radius)
        .collect();
    let residue = distances.iter().map(|d| d * d).sum();

    CircleFit {
        success: true,
        center,
        radius,
        distances,
        residue,
    }
}
