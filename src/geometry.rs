//! Rectangle algebra used by the clip stack.
//!
//! Device and local space rectangles are `lyon` boxes (`euclid::default::Box2D<f32>`). Integer
//! pixel rectangles, used for device bounds and conservative clip bounds, are
//! `euclid::default::Box2D<i32>`. Any rectangle whose max edge is not strictly greater than its
//! min edge (including NaN coordinates) is treated as empty.

use lyon::math::point;

pub use lyon::math::{Point, Vector};

/// Floating point rectangle in local or device space.
pub type Rect = lyon::math::Box2D;

/// Integer pixel rectangle.
pub type IRect = euclid::default::Box2D<i32>;

/// How far a coordinate may stray from a pixel edge and still be considered on it.
pub(crate) const BOUNDS_TOLERANCE: f32 = 1e-3;

/// Creates a rectangle from its left, top, right and bottom edges.
#[inline]
pub fn rect(left: f32, top: f32, right: f32, bottom: f32) -> Rect {
    Rect::new(point(left, top), point(right, bottom))
}

/// Creates an integer rectangle from its left, top, right and bottom edges.
#[inline]
pub fn irect(left: i32, top: i32, right: i32, bottom: i32) -> IRect {
    IRect::new(euclid::point2(left, top), euclid::point2(right, bottom))
}

#[inline]
pub fn irect_to_rect(r: &IRect) -> Rect {
    rect(r.min.x as f32, r.min.y as f32, r.max.x as f32, r.max.y as f32)
}

#[inline]
pub(crate) fn empty_rect() -> Rect {
    Rect::zero()
}

/// True for zero-area, inverted, or NaN rectangles.
#[inline]
pub(crate) fn is_empty(r: &Rect) -> bool {
    !(r.max.x > r.min.x && r.max.y > r.min.y)
}

#[inline]
pub(crate) fn is_finite(r: &Rect) -> bool {
    r.min.x.is_finite() && r.min.y.is_finite() && r.max.x.is_finite() && r.max.y.is_finite()
}

/// Returns true if `a` contains `b`. An empty rectangle never contains, nor is contained.
#[inline]
pub(crate) fn contains(a: &Rect, b: &Rect) -> bool {
    !is_empty(a)
        && !is_empty(b)
        && a.min.x <= b.min.x
        && a.min.y <= b.min.y
        && a.max.x >= b.max.x
        && a.max.y >= b.max.y
}

#[inline]
pub(crate) fn contains_point(r: &Rect, p: Point) -> bool {
    p.x >= r.min.x && p.x <= r.max.x && p.y >= r.min.y && p.y <= r.max.y
}

/// Rectangles that merely share an edge do not intersect.
#[inline]
pub(crate) fn intersects(a: &Rect, b: &Rect) -> bool {
    !is_empty(a)
        && !is_empty(b)
        && a.min.x < b.max.x
        && b.min.x < a.max.x
        && a.min.y < b.max.y
        && b.min.y < a.max.y
}

/// Intersection of two rectangles, or the empty rectangle when they are disjoint.
pub(crate) fn intersect(a: &Rect, b: &Rect) -> Rect {
    let r = rect(
        a.min.x.max(b.min.x),
        a.min.y.max(b.min.y),
        a.max.x.min(b.max.x),
        a.max.y.min(b.max.y),
    );
    if is_empty(&r) {
        empty_rect()
    } else {
        r
    }
}

/// Smallest rectangle containing both, ignoring empty inputs.
pub(crate) fn join(a: &Rect, b: &Rect) -> Rect {
    if is_empty(a) {
        *b
    } else if is_empty(b) {
        *a
    } else {
        a.union(b)
    }
}

#[inline]
pub(crate) fn area(r: &Rect) -> f32 {
    if is_empty(r) {
        0.0
    } else {
        r.width() * r.height()
    }
}

#[inline]
pub(crate) fn outset(r: &Rect, d: f32) -> Rect {
    rect(r.min.x - d, r.min.y - d, r.max.x + d, r.max.y + d)
}

/// Computes `a - b`.
///
/// The second value is true when the difference is exactly the returned rectangle, which is the
/// case when `b` misses `a`, covers it, or cuts one full side off of it. Otherwise the returned
/// rectangle is the largest of the four sub-rectangles of `a` that are disjoint from `b`.
pub(crate) fn subtract_rect(a: &Rect, b: &Rect) -> (Rect, bool) {
    if is_empty(a) || is_empty(b) || !intersects(a, b) {
        return (*a, true);
    }

    // Each candidate shares a full dimension with `a`, so comparing the other dimension
    // relative to `a` is enough to pick the largest one.
    let width = a.width();
    let height = a.height();
    let mut left_area = 0.0;
    let mut right_area = 0.0;
    let mut top_area = 0.0;
    let mut bottom_area = 0.0;
    let mut positive = 0;
    if b.min.x > a.min.x {
        left_area = (b.min.x - a.min.x) / width;
        positive += 1;
    }
    if a.max.x > b.max.x {
        right_area = (a.max.x - b.max.x) / width;
        positive += 1;
    }
    if b.min.y > a.min.y {
        top_area = (b.min.y - a.min.y) / height;
        positive += 1;
    }
    if a.max.y > b.max.y {
        bottom_area = (a.max.y - b.max.y) / height;
        positive += 1;
    }

    if positive == 0 {
        // b covers a
        return (empty_rect(), true);
    }

    let mut out = *a;
    if left_area > right_area && left_area > top_area && left_area > bottom_area {
        out.max.x = b.min.x;
    } else if right_area > top_area && right_area > bottom_area {
        out.min.x = b.max.x;
    } else if top_area > bottom_area {
        out.max.y = b.min.y;
    } else {
        out.min.y = b.max.y;
    }
    (out, positive == 1)
}

/// `a - b`, falling back to `a` itself when `exact` is requested and the difference is not a
/// rectangle.
pub(crate) fn subtract(a: &Rect, b: &Rect, exact: bool) -> Rect {
    let (diff, is_exact) = subtract_rect(a, b);
    if is_exact || !exact {
        diff
    } else {
        *a
    }
}

pub(crate) fn is_pixel_aligned(r: &Rect) -> bool {
    let aligned = |v: f32| (v.round() - v).abs() <= BOUNDS_TOLERANCE;
    aligned(r.min.x) && aligned(r.min.y) && aligned(r.max.x) && aligned(r.max.y)
}

/// Which pixels of a fractional rectangle are wanted when snapping to integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsType {
    /// Every pixel the rectangle touches.
    Exterior,
    /// Only pixels the rectangle fully covers.
    Interior,
}

/// Snaps `bounds` to pixels. Non-AA edges round to the nearest pixel edge, AA edges round out
/// (exterior) or in (interior).
pub fn pixel_bounds(bounds: &Rect, aa: bool, mode: BoundsType) -> IRect {
    if is_empty(bounds) {
        return IRect::zero();
    }
    let round_low = |v: f32| {
        let v = v + BOUNDS_TOLERANCE;
        if aa {
            v.floor() as i32
        } else {
            v.round() as i32
        }
    };
    let round_high = |v: f32| {
        let v = v - BOUNDS_TOLERANCE;
        if aa {
            v.ceil() as i32
        } else {
            v.round() as i32
        }
    };
    match mode {
        BoundsType::Exterior => irect(
            round_low(bounds.min.x),
            round_low(bounds.min.y),
            round_high(bounds.max.x),
            round_high(bounds.max.y),
        ),
        BoundsType::Interior => irect(
            round_high(bounds.min.x),
            round_high(bounds.min.y),
            round_low(bounds.max.x),
            round_low(bounds.max.y),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(10.0, 0.0, 20.0, 10.0);
        assert!(!intersects(&a, &b));
        assert!(is_empty(&intersect(&a, &b)));
    }

    #[test]
    fn empty_rects_are_never_contained() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        assert!(!contains(&a, &empty_rect()));
        assert!(!contains(&empty_rect(), &a));
        assert!(contains(&a, &rect(2.0, 2.0, 10.0, 5.0)));
    }

    #[test]
    fn nan_rect_is_empty() {
        assert!(is_empty(&rect(f32::NAN, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn subtract_cutting_one_side_is_exact() {
        let a = rect(0.0, 0.0, 100.0, 100.0);
        let b = rect(-10.0, -10.0, 110.0, 30.0);
        let (diff, exact) = subtract_rect(&a, &b);
        assert!(exact);
        assert_eq!(diff, rect(0.0, 30.0, 100.0, 100.0));
    }

    #[test]
    fn subtract_hole_keeps_largest_piece() {
        let a = rect(0.0, 0.0, 100.0, 100.0);
        let b = rect(10.0, 20.0, 50.0, 60.0);
        let (diff, exact) = subtract_rect(&a, &b);
        assert!(!exact);
        // The right piece (50..100) is the largest disjoint sub-rectangle.
        assert_eq!(diff, rect(50.0, 0.0, 100.0, 100.0));
        assert!(!intersects(&diff, &b));

        assert_eq!(subtract(&a, &b, true), a);
        assert_eq!(subtract(&a, &b, false), diff);
    }

    #[test]
    fn subtract_covering_rect_is_empty() {
        let a = rect(10.0, 10.0, 20.0, 20.0);
        let (diff, exact) = subtract_rect(&a, &rect(0.0, 0.0, 30.0, 30.0));
        assert!(exact);
        assert!(is_empty(&diff));
    }

    #[test]
    fn pixel_bounds_round_by_aa() {
        let r = rect(5.3, 3.7, 15.3, 13.7);
        assert_eq!(pixel_bounds(&r, true, BoundsType::Exterior), irect(5, 3, 16, 14));
        assert_eq!(pixel_bounds(&r, false, BoundsType::Exterior), irect(5, 4, 15, 14));
        assert_eq!(pixel_bounds(&r, true, BoundsType::Interior), irect(6, 4, 15, 13));
        // Within tolerance of a pixel edge does not grow the bounds.
        let nearly = rect(10.0005, 10.0, 19.9995, 20.0);
        assert_eq!(pixel_bounds(&nearly, true, BoundsType::Exterior), irect(10, 10, 20, 20));
    }

    #[test]
    fn join_ignores_empty() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(join(&a, &empty_rect()), a);
        assert_eq!(join(&a, &rect(5.0, 5.0, 20.0, 12.0)), rect(0.0, 0.0, 20.0, 12.0));
        assert_eq!(area(&empty_rect()), 0.0);
    }
}
