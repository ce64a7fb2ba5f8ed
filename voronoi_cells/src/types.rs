// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers: polygons and weighted sites.

use kurbo::{PathEl, Point, Rect, Shape, Vec2};

/// Number of halving steps [`Polygon::relative_point`] takes toward the centroid
/// before giving up and returning the centroid itself.
const PULL_IN_STEPS: usize = 48;

/// A closed simple polygon.
///
/// Vertices are stored in order; the closing edge from the last vertex back to the
/// first is implicit. Either orientation is accepted. [`Shape::area`] is signed
/// (positive for the vertex order used by [`Polygon::from_rect`]), while
/// [`Polygon::area_abs`] is not.
///
/// A polygon with fewer than three vertices is considered empty. Empty polygons are
/// produced when a clip removes everything, for example a cell that lost all of its
/// area to its neighbors.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Create a polygon from its vertices.
    ///
    /// A trailing vertex equal to the first one is dropped, so both open and
    /// explicitly closed rings are accepted.
    pub fn new(points: impl Into<Vec<Point>>) -> Self {
        let mut points = points.into();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Self { points }
    }

    /// Four-point polygon covering `rect`, in the same order as the rectangle's path.
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self {
            points: vec![
                Point::new(rect.x0, rect.y0),
                Point::new(rect.x1, rect.y0),
                Point::new(rect.x1, rect.y1),
                Point::new(rect.x0, rect.y1),
            ],
        }
    }

    /// Four-point polygon from an origin and a size.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_rect(Rect::new(x, y, x + width, y + height))
    }

    /// The polygon's vertices, without the closing vertex.
    pub fn vertices(&self) -> &[Point] {
        &self.points
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the polygon has fewer than three vertices.
    pub fn is_empty(&self) -> bool {
        self.points.len() < 3
    }

    /// Unsigned area.
    pub fn area_abs(&self) -> f64 {
        signed_area(&self.points).abs()
    }

    /// Area centroid, or `None` if the polygon has no area.
    pub fn centroid(&self) -> Option<Point> {
        let area = signed_area(&self.points);
        if self.is_empty() || area == 0.0 || !area.is_finite() {
            return None;
        }
        let mut cx = 0.0;
        let mut cy = 0.0;
        for (a, b) in self.edges() {
            let cross = a.to_vec2().cross(b.to_vec2());
            cx += (a.x + b.x) * cross;
            cy += (a.y + b.y) * cross;
        }
        let scale = 1.0 / (6.0 * area);
        Some(Point::new(cx * scale, cy * scale))
    }

    /// Keep the part of the polygon where `normal · p <= offset`.
    ///
    /// This is a single Sutherland–Hodgman pass. The result is exact for convex
    /// polygons; for concave ones it may contain zero-width bridges but still has
    /// the correct area.
    pub fn clip_half_plane(&self, normal: Vec2, offset: f64) -> Self {
        if self.is_empty() {
            return Self::default();
        }
        let mut out = Vec::with_capacity(self.points.len() + 2);
        for (cur, next) in self.edges() {
            let dc = normal.dot(cur.to_vec2()) - offset;
            let dn = normal.dot(next.to_vec2()) - offset;
            if dc <= 0.0 {
                out.push(cur);
            }
            if (dc < 0.0 && dn > 0.0) || (dc > 0.0 && dn < 0.0) {
                out.push(cur.lerp(next, dc / (dc - dn)));
            }
        }
        if out.len() < 3 {
            return Self::default();
        }
        Self { points: out }
    }

    /// Intersection with a convex polygon.
    ///
    /// `convex` may have either orientation. `self` may be concave, with the same
    /// caveat as [`Polygon::clip_half_plane`].
    pub fn intersect_convex(&self, convex: &Self) -> Self {
        if convex.is_empty() {
            return Self::default();
        }
        let sign = if signed_area(&convex.points) >= 0.0 {
            1.0
        } else {
            -1.0
        };
        let mut out = self.clone();
        for (a, b) in convex.edges() {
            let d = b - a;
            let normal = Vec2::new(d.y, -d.x) * sign;
            out = out.clip_half_plane(normal, normal.dot(a.to_vec2()));
            if out.is_empty() {
                break;
            }
        }
        out
    }

    /// Scale toward the centroid so the area becomes `area_ratio` times the original.
    ///
    /// A convex polygon stays inside itself. Ratios outside `(0, 1]` and polygons
    /// without area are returned unchanged.
    pub fn shrunk(&self, area_ratio: f64) -> Self {
        let Some(center) = self.centroid() else {
            return self.clone();
        };
        if area_ratio.is_nan() || area_ratio <= 0.0 || area_ratio >= 1.0 {
            return self.clone();
        }
        let k = area_ratio.sqrt();
        Self {
            points: self.points.iter().map(|&p| center.lerp(p, k)).collect(),
        }
    }

    /// Map a normalized coordinate into the polygon.
    ///
    /// `rel` is interpreted relative to the bounding box (`(0, 0)` is the box's
    /// minimum corner, `(1, 1)` its maximum). Points falling outside the polygon are
    /// pulled toward the centroid until they are inside. The mapping is
    /// deterministic.
    pub fn relative_point(&self, rel: Point) -> Point {
        let bbox = self.bounding_box();
        let mut p = Point::new(
            bbox.x0 + rel.x * bbox.width(),
            bbox.y0 + rel.y * bbox.height(),
        );
        if self.contains(p) {
            return p;
        }
        let center = self.centroid().unwrap_or_else(|| bbox.center());
        for _ in 0..PULL_IN_STEPS {
            p = center.lerp(p, 0.5);
            if self.contains(p) {
                return p;
            }
        }
        center
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }
}

impl From<Rect> for Polygon {
    fn from(rect: Rect) -> Self {
        Self::from_rect(rect)
    }
}

fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        acc += points[i].to_vec2().cross(points[(i + 1) % n].to_vec2());
    }
    acc * 0.5
}

/// Path iterator for [`Polygon`]: one `MoveTo`, a `LineTo` per remaining vertex, then `ClosePath`.
#[derive(Clone, Debug)]
pub struct PolygonPathIter<'a> {
    points: &'a [Point],
    ix: usize,
}

impl Iterator for PolygonPathIter<'_> {
    type Item = PathEl;

    fn next(&mut self) -> Option<PathEl> {
        if self.points.is_empty() {
            return None;
        }
        let ix = self.ix;
        self.ix += 1;
        match ix {
            0 => Some(PathEl::MoveTo(self.points[0])),
            i if i < self.points.len() => Some(PathEl::LineTo(self.points[i])),
            i if i == self.points.len() => Some(PathEl::ClosePath),
            _ => None,
        }
    }
}

impl Shape for Polygon {
    type PathElementsIter<'iter> = PolygonPathIter<'iter>;

    fn path_elements(&self, _tolerance: f64) -> PolygonPathIter<'_> {
        PolygonPathIter {
            points: &self.points,
            ix: 0,
        }
    }

    fn area(&self) -> f64 {
        signed_area(&self.points)
    }

    fn perimeter(&self, _accuracy: f64) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.edges().map(|(a, b)| (b - a).hypot()).sum()
    }

    fn winding(&self, pt: Point) -> i32 {
        if self.is_empty() {
            return 0;
        }
        let mut winding = 0;
        for (a, b) in self.edges() {
            let side = (b - a).cross(pt - a);
            if a.y <= pt.y {
                if b.y > pt.y && side > 0.0 {
                    winding += 1;
                }
            } else if b.y <= pt.y && side < 0.0 {
                winding -= 1;
            }
        }
        winding
    }

    fn bounding_box(&self) -> Rect {
        let Some(&first) = self.points.first() else {
            return Rect::ZERO;
        };
        self.points
            .iter()
            .fold(Rect::from_points(first, first), |acc, &p| acc.union_pt(p))
    }
}

/// A weighted seed for one cell of a power diagram.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Site {
    /// Seed position, in the clip polygon's coordinate space.
    pub position: Point,
    /// Power weight. A cell is the set of points minimizing `distance² - weight`.
    pub weight: f64,
    /// Wanted share of the clip polygon's area, in `[0, 1]`.
    ///
    /// Solvers do not need this to build a partition; it travels with the site so
    /// callers can compare results against it.
    pub target: f64,
}

impl Site {
    /// Create a new site.
    pub const fn new(position: Point, weight: f64, target: f64) -> Self {
        Self {
            position,
            weight,
            target,
        }
    }

    /// True if position and weight are finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.weight.is_finite()
    }
}
