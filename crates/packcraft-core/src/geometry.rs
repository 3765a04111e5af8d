//! Geometry kernel: bounds, tolerance tests and polygon offsetting.
//!
//! Everything here is pure math over kurbo primitives. Angles passed in are
//! degrees; the scene graph stores rotation in degrees to match the wire format.

use cavalier_contours::polyline::{PlineSource, PlineSourceMut, PlineVertex, Polyline};
use kurbo::{Affine, Point, Rect, Size, SvgArc, Vec2};
use std::f64::consts::PI;
use std::panic;

/// Numerical slack used when comparing derived coordinates.
pub const EPSILON: f64 = 1e-9;

/// Vertices closer than this are merged before offsetting.
const OFFSET_EPSILON: f64 = 1e-5;

/// Largest angle covered by one chord when flattening rounded joins.
const ARC_STEP: f64 = PI / 32.0;

/// Check whether two scalar values are strictly closer than `tolerance`.
pub fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

/// Axis-aligned bounds of `rect` after rotating it about its center.
pub fn rotated_bounds(rect: Rect, degrees: f64) -> Rect {
    if degrees.abs() < 0.001 {
        return rect;
    }

    let center = rect.center();
    let rot = Affine::rotate_about(degrees.to_radians(), center);
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    let rotated: Vec<Point> = corners.iter().map(|&p| rot * p).collect();
    polygon_bounds(&rotated).unwrap_or(rect)
}

/// Union of all rectangles, or `None` for an empty iterator.
pub fn union_all<I>(rects: I) -> Option<Rect>
where
    I: IntoIterator<Item = Rect>,
{
    rects.into_iter().fold(None, |acc, r| {
        Some(match acc {
            Some(u) => u.union(r),
            None => r,
        })
    })
}

/// Bounding box of a point set.
pub fn polygon_bounds(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let mut bounds = Rect::from_points(*first, *first);
    for p in &points[1..] {
        bounds = bounds.union_pt(*p);
    }
    Some(bounds)
}

/// Shoelace signed area. Positive for clockwise winding in a y-down space.
pub fn signed_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Offset a simple closed polygon by `distance`.
///
/// Positive distances grow the polygon outward, negative ones shrink it,
/// independent of the winding of `points`. Convex corners of a grown polygon
/// are rounded and flattened back into points. Returns an empty list when an
/// inward offset collapses the polygon; when it splits, the largest part wins.
pub fn offset_polygon(points: &[Point], distance: f64) -> Vec<Point> {
    if points.len() < 3 || distance == 0.0 {
        return points.to_vec();
    }

    let pline = to_polyline(points);
    // cavalier_contours offsets to the left of travel: outward for clockwise
    // (negative signed area in y-up terms) polylines.
    let result = panic::catch_unwind(panic::AssertUnwindSafe(|| pline.parallel_offset(distance)));
    let offsets = match result {
        Ok(offsets) => offsets,
        Err(_) => {
            log::warn!("Polygon offset by {distance} failed on {} points", points.len());
            return Vec::new();
        }
    };

    offsets
        .iter()
        .map(from_polyline)
        .max_by(|a, b| signed_area(a).abs().total_cmp(&signed_area(b).abs()))
        .unwrap_or_default()
}

/// Closed clockwise polyline over `points` with repeated positions removed.
fn to_polyline(points: &[Point]) -> Polyline<f64> {
    let mut ordered: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if ordered.last().is_none_or(|last| last.distance(*p) > OFFSET_EPSILON) {
            ordered.push(*p);
        }
    }
    if ordered.len() > 1 && ordered[0].distance(ordered[ordered.len() - 1]) <= OFFSET_EPSILON {
        ordered.pop();
    }
    if signed_area(&ordered) > 0.0 {
        ordered.reverse();
    }

    let mut pline = Polyline::new();
    for p in ordered {
        pline.add_vertex(PlineVertex::new(p.x, p.y, 0.0));
    }
    pline.set_is_closed(true);
    pline
}

/// Flatten a closed polyline, expanding bulge arcs into short chords.
fn from_polyline(pline: &Polyline<f64>) -> Vec<Point> {
    let count = pline.vertex_count();
    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        let v1 = pline.at(i);
        let v2 = pline.at((i + 1) % count);
        let from = Point::new(v1.x, v1.y);
        points.push(from);

        if v1.bulge.abs() > OFFSET_EPSILON {
            let to = Point::new(v2.x, v2.y);
            let chord = from.distance(to);
            let radius = chord * (1.0 + v1.bulge * v1.bulge) / (4.0 * v1.bulge.abs());
            let svg_arc = SvgArc {
                from,
                to,
                radii: Vec2::new(radius, radius),
                x_rotation: 0.0,
                large_arc: v1.bulge.abs() > 1.0,
                sweep: v1.bulge > 0.0,
            };
            if let Some(arc) = kurbo::Arc::from_svg_arc(&svg_arc) {
                let steps = (arc.sweep_angle.abs() / ARC_STEP).ceil().max(1.0) as usize;
                for step in 1..steps {
                    let angle = arc.start_angle + arc.sweep_angle * step as f64 / steps as f64;
                    points.push(arc.center + Vec2::from_angle(angle) * arc.radii.x);
                }
            }
        }
    }
    points
}

/// Transform that uniformly scales `content` (anchored at the origin) to fit
/// inside `area` and centers it there.
pub fn fit_within(content: Size, area: Rect) -> Affine {
    if content.width <= 0.0 || content.height <= 0.0 {
        return Affine::translate(area.origin().to_vec2());
    }

    let scale = (area.width() / content.width).min(area.height() / content.height);
    let offset = Vec2::new(
        area.x0 + (area.width() - content.width * scale) / 2.0,
        area.y0 + (area.height() - content.height * scale) / 2.0,
    );
    Affine::translate(offset) * Affine::scale(scale)
}
