//! 2-D geometry for zone polygons.
//!
//! Coordinates are meters in the sensor frame: `x` is lateral (0 = boresight),
//! `y` is the distance away from the sensor.

use thiserror::Error;

/// Tolerance applied on top of a zone margin when testing containment.
///
/// A point whose distance to the polygon is `<= margin + BOUNDARY_EPSILON_M` is
/// inside; anything further away is outside. 0.1 mm is well below the sensor's
/// resolution, so it only absorbs float rounding on the margin line.
pub const BOUNDARY_EPSILON_M: f32 = 1e-4;

/// Relative tolerance under which two consecutive edges count as collinear.
///
/// The cross product is compared against `COLLINEAR_TOLERANCE * |e1| * |e2|`, i.e.
/// the sine of the turn angle. Decimal coordinates on a diagonal edge are not
/// exactly collinear in `f32`.
pub const COLLINEAR_TOLERANCE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Why a polygon was refused at configuration time.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolygonError {
    #[error("polygon needs at least 3 points, got {0}")]
    TooFewPoints(usize),
    #[error("point {index} is not a finite coordinate")]
    NonFinite { index: usize },
    #[error("points {first} and {second} are duplicates")]
    DuplicatePoint { first: usize, second: usize },
    #[error("polygon is not convex")]
    NotConvex,
    #[error("polygon edges intersect")]
    SelfIntersecting,
}

#[inline]
fn sign(v: f32) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Consecutive edge cross products keep a single sign around the full cycle.
///
/// Collinear edges (cross product within `COLLINEAR_TOLERANCE` of zero, relative
/// to the edge lengths) are tolerated; a sign flip, a repeated
/// consecutive point, fewer than 3 points, or a fully degenerate (all collinear)
/// sequence are not.
pub fn is_convex(points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }

    let mut last_sign = 0i8;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let (dx1, dy1) = (b.x - a.x, b.y - a.y);
        let (dx2, dy2) = (c.x - b.x, c.y - b.y);

        if (dx1 == 0.0 && dy1 == 0.0) || (dx2 == 0.0 && dy2 == 0.0) {
            return false;
        }

        let cross = dx1 * dy2 - dy1 * dx2;
        if cross.abs() <= COLLINEAR_TOLERANCE * dx1.hypot(dy1) * dx2.hypot(dy2) {
            continue;
        }
        let s = sign(cross);
        if last_sign != 0 && s != last_sign {
            return false;
        }
        last_sign = s;
    }
    last_sign != 0
}

/// Total signed turning of the closed polyline, in turns (1.0 = one full revolution).
///
/// A simple convex polygon turns exactly once; a star-shaped sequence whose turns
/// all share a sign (e.g. a pentagram) turns twice or more.
fn winding_turns(points: &[Point]) -> f32 {
    let n = points.len();
    let mut total = 0.0f32;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let (dx1, dy1) = (b.x - a.x, b.y - a.y);
        let (dx2, dy2) = (c.x - b.x, c.y - b.y);
        let cross = dx1 * dy2 - dy1 * dx2;
        let dot = dx1 * dx2 + dy1 * dy2;
        total += cross.atan2(dot);
    }
    total / std::f32::consts::TAU
}

/// Full configuration-time check for a static zone polygon.
pub fn validate_polygon(points: &[Point]) -> Result<(), PolygonError> {
    if points.len() < 3 {
        return Err(PolygonError::TooFewPoints(points.len()));
    }
    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(PolygonError::NonFinite { index });
    }
    for (first, a) in points.iter().enumerate() {
        if let Some(offset) = points[first + 1..].iter().position(|b| b == a) {
            return Err(PolygonError::DuplicatePoint {
                first,
                second: first + 1 + offset,
            });
        }
    }
    if !is_convex(points) {
        return Err(PolygonError::NotConvex);
    }
    if (winding_turns(points).abs() - 1.0).abs() > 0.01 {
        return Err(PolygonError::SelfIntersecting);
    }
    Ok(())
}

/// Shortest distance from `p` to the segment `a..b`.
fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (ex, ey) = (b.x - a.x, b.y - a.y);
    let (px, py) = (p.x - a.x, p.y - a.y);
    let len2 = ex * ex + ey * ey;
    if len2 == 0.0 {
        return px.hypot(py);
    }
    let r = ((px * ex + py * ey) / len2).clamp(0.0, 1.0);
    (px - r * ex).hypot(py - r * ey)
}

/// Shortest distance from `p` to any edge of the closed polygon.
pub fn distance_to_boundary(p: Point, polygon: &[Point]) -> f32 {
    let n = polygon.len();
    (0..n)
        .map(|i| distance_to_segment(p, polygon[i], polygon[(i + 1) % n]))
        .fold(f32::INFINITY, f32::min)
}

/// Point lies on the same side of (or on) every edge. Orientation independent.
fn contains_closed(p: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    let mut last_sign = 0i8;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let s = sign((b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x));
        if s == 0 {
            continue;
        }
        if last_sign != 0 && s != last_sign {
            return false;
        }
        last_sign = s;
    }
    true
}

/// Containment against `polygon` grown outward by `margin` meters.
///
/// The region is closed: boundary points are inside, and so is everything within
/// `margin + BOUNDARY_EPSILON_M` of an edge. Polygons with fewer than 3 points
/// contain nothing.
pub fn point_in_polygon(point: Point, polygon: &[Point], margin: f32) -> bool {
    if polygon.len() < 3 || !point.is_finite() {
        return false;
    }
    if contains_closed(point, polygon) {
        return true;
    }
    distance_to_boundary(point, polygon) <= margin.max(0.0) + BOUNDARY_EPSILON_M
}
