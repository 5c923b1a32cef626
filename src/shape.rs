//! Geometry that can be used as a clip.
//!
//! A [`Shape`] is one of a small closed set of kinds: nothing, an axis-aligned rectangle, a
//! rounded rectangle, or an arbitrary [`lyon`] path. Constructors normalize their input so that
//! equivalent geometry always ends up as the simplest kind.
//!
//! # Examples
//!
//! ```rust
//! use grafo_clip::{rect, PathShape, Shape};
//!
//! // A closed axis-aligned path is recognized as a rectangle
//! let square = PathShape::builder()
//!     .begin((0.0, 0.0))
//!     .line_to((10.0, 0.0))
//!     .line_to((10.0, 10.0))
//!     .line_to((0.0, 10.0))
//!     .close()
//!     .build();
//! assert_eq!(Shape::path(square), Shape::rect(rect(0.0, 0.0, 10.0, 10.0)));
//! ```

use std::sync::Arc;

use crate::geometry::{self, rect, Point, Rect, Vector};
use crate::rrect::RRect;
use lyon::path::{Path, PathEvent};
use smallvec::SmallVec;

/// The geometric kind of a [`Shape`].
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    Empty,
    Rect(Rect),
    RRect(RRect),
    Path(PathShape),
}

/// A fillable clip shape with an optional inverse fill.
///
/// An inverted shape covers everything outside of its geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    kind: ShapeKind,
    inverted: bool,
}

impl Default for Shape {
    fn default() -> Self {
        Self::empty()
    }
}

impl Shape {
    pub fn empty() -> Self {
        Self {
            kind: ShapeKind::Empty,
            inverted: false,
        }
    }

    /// Creates a rectangle shape. Edges are sorted, and a zero-area rectangle is empty.
    pub fn rect(r: Rect) -> Self {
        let r = rect(
            r.min.x.min(r.max.x),
            r.min.y.min(r.max.y),
            r.min.x.max(r.max.x),
            r.min.y.max(r.max.y),
        );
        let kind = if geometry::is_empty(&r) {
            ShapeKind::Empty
        } else {
            ShapeKind::Rect(r)
        };
        Self {
            kind,
            inverted: false,
        }
    }

    /// Creates a rounded rectangle shape, reduced to a rectangle when every corner is square.
    pub fn rrect(rr: RRect) -> Self {
        if rr.is_empty() {
            Self::empty()
        } else if rr.is_rect() {
            Self::rect(*rr.rect())
        } else {
            Self {
                kind: ShapeKind::RRect(rr),
                inverted: false,
            }
        }
    }

    /// Creates a path shape. Paths without area are empty and closed axis-aligned rectangles
    /// become [`ShapeKind::Rect`].
    pub fn path(path: PathShape) -> Self {
        let kind = if path.point_count == 0 || geometry::is_empty(&path.bounds) {
            ShapeKind::Empty
        } else if path.is_rect {
            ShapeKind::Rect(path.bounds)
        } else {
            ShapeKind::Path(path)
        };
        Self {
            kind,
            inverted: false,
        }
    }

    /// Returns the shape with its fill inverted or not.
    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    #[inline]
    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    #[inline]
    pub fn inverted(&self) -> bool {
        self.inverted
    }

    pub(crate) fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    /// Replaces the geometry with a rectangle, keeping the fill rule.
    pub(crate) fn set_rect(&mut self, r: Rect) {
        self.kind = ShapeKind::Rect(r);
    }

    pub(crate) fn set_rrect(&mut self, rr: RRect) {
        self.kind = ShapeKind::RRect(rr);
    }

    /// Drops the geometry but keeps the fill rule, so an inverse fill of nothing still covers
    /// everything.
    pub(crate) fn clear_geometry(&mut self) {
        self.kind = ShapeKind::Empty;
    }

    /// Turns the shape into a non-inverted empty shape.
    pub fn reset(&mut self) {
        self.kind = ShapeKind::Empty;
        self.inverted = false;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, ShapeKind::Empty)
    }

    #[inline]
    pub fn is_rect(&self) -> bool {
        matches!(self.kind, ShapeKind::Rect(_))
    }

    #[inline]
    pub fn is_rrect(&self) -> bool {
        matches!(self.kind, ShapeKind::RRect(_))
    }

    #[inline]
    pub fn is_path(&self) -> bool {
        matches!(self.kind, ShapeKind::Path(_))
    }

    pub fn as_rect(&self) -> Option<&Rect> {
        match &self.kind {
            ShapeKind::Rect(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_rrect(&self) -> Option<&RRect> {
        match &self.kind {
            ShapeKind::RRect(rr) => Some(rr),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathShape> {
        match &self.kind {
            ShapeKind::Path(p) => Some(p),
            _ => None,
        }
    }

    /// Bounds of the geometry in local space, ignoring the fill rule.
    pub fn bounds(&self) -> Rect {
        match &self.kind {
            ShapeKind::Empty => geometry::empty_rect(),
            ShapeKind::Rect(r) => *r,
            ShapeKind::RRect(rr) => rr.bounds(),
            ShapeKind::Path(p) => p.bounds,
        }
    }

    /// True if the covered area is convex. Inverse fills never are.
    pub fn convex(&self) -> bool {
        if self.inverted {
            return false;
        }
        match &self.kind {
            ShapeKind::Empty => false,
            ShapeKind::Rect(_) | ShapeKind::RRect(_) => true,
            ShapeKind::Path(p) => p.convex,
        }
    }

    /// Returns true only if `r` is certainly covered by the shape. False negatives are allowed.
    pub fn conservative_contains(&self, r: &Rect) -> bool {
        if self.inverted {
            return false;
        }
        match &self.kind {
            ShapeKind::Empty => false,
            ShapeKind::Rect(bounds) => geometry::contains(bounds, r),
            ShapeKind::RRect(rr) => rr.contains_rect(r),
            ShapeKind::Path(p) => {
                geometry::contains(&p.bounds, r)
                    && [
                        r.min,
                        Point::new(r.max.x, r.min.y),
                        r.max,
                        Point::new(r.min.x, r.max.y),
                    ]
                    .into_iter()
                    .all(|corner| p.contains_point(corner))
            }
        }
    }

    /// Point variant of [`Shape::conservative_contains`]. Points on the edge are contained.
    pub fn conservative_contains_point(&self, p: Point) -> bool {
        if self.inverted {
            return false;
        }
        match &self.kind {
            ShapeKind::Empty => false,
            ShapeKind::Rect(r) => geometry::contains_point(r, p),
            ShapeKind::RRect(rr) => rr.contains_point(p),
            ShapeKind::Path(path) => path.contains_point(p),
        }
    }
}

impl From<Rect> for Shape {
    fn from(value: Rect) -> Self {
        Shape::rect(value)
    }
}

impl From<RRect> for Shape {
    fn from(value: RRect) -> Self {
        Shape::rrect(value)
    }
}

impl From<PathShape> for Shape {
    fn from(value: PathShape) -> Self {
        Shape::path(value)
    }
}

/// A shared, immutable [`lyon`] path with the properties the clip stack needs precomputed.
///
/// Clones share the underlying path, which lets two clips that came from the same path be
/// recognized without comparing their geometry.
#[derive(Debug, Clone)]
pub struct PathShape {
    path: Arc<Path>,
    bounds: Rect,
    point_count: usize,
    convex: bool,
    line_only: bool,
    is_rect: bool,
}

impl PathShape {
    pub fn builder() -> PathShapeBuilder {
        PathShapeBuilder::new()
    }

    pub fn new(path: Path) -> Self {
        Self::from_shared(Arc::new(path))
    }

    pub fn from_shared(path: Arc<Path>) -> Self {
        let mut bounds = rect(f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        let mut point_count = 0;
        let mut line_only = true;
        let mut contours = 0;
        let mut include = |p: Point, count: &mut usize| {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
            *count += 1;
        };
        for event in path.iter() {
            match event {
                PathEvent::Begin { at } => {
                    contours += 1;
                    include(at, &mut point_count);
                }
                PathEvent::Line { to, .. } => include(to, &mut point_count),
                PathEvent::Quadratic { ctrl, to, .. } => {
                    line_only = false;
                    include(ctrl, &mut point_count);
                    include(to, &mut point_count);
                }
                PathEvent::Cubic {
                    ctrl1, ctrl2, to, ..
                } => {
                    line_only = false;
                    include(ctrl1, &mut point_count);
                    include(ctrl2, &mut point_count);
                    include(to, &mut point_count);
                }
                PathEvent::End { .. } => {}
            }
        }
        if point_count == 0 {
            bounds = geometry::empty_rect();
        }

        let outline = if contours == 1 {
            outline(&path)
        } else {
            SmallVec::new()
        };
        let orientation = convex_orientation(&outline);
        let is_rect = line_only && is_axis_aligned_quad(&outline);
        if contours == 1 && is_collinear(&outline) {
            // a line or a point
            bounds = geometry::empty_rect();
        }

        Self {
            path,
            bounds,
            point_count,
            convex: orientation != 0.0,
            line_only,
            is_rect,
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bounds of every on-curve and control point.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    #[inline]
    pub fn is_convex(&self) -> bool {
        self.convex
    }

    #[inline]
    pub fn is_line_only(&self) -> bool {
        self.line_only
    }

    /// True if both shapes were cloned from the same path.
    #[inline]
    pub fn same_generation(&self, other: &PathShape) -> bool {
        Arc::ptr_eq(&self.path, &other.path)
    }

    /// Point containment for convex polygons. Paths with curves or more than one contour never
    /// report containment.
    pub fn contains_point(&self, p: Point) -> bool {
        if !self.convex || !self.line_only || !geometry::contains_point(&self.bounds, p) {
            return false;
        }
        let outline = outline(&self.path);
        let orientation = convex_orientation(&outline);
        let n = outline.len();
        (0..n).all(|i| {
            let a = outline[i];
            let b = outline[(i + 1) % n];
            (b - a).cross(p - a) * orientation >= 0.0
        })
    }
}

impl PartialEq for PathShape {
    fn eq(&self, other: &Self) -> bool {
        self.same_generation(other)
            || (self.point_count == other.point_count && self.path.iter().eq(other.path.iter()))
    }
}

/// Points of a single-contour path with curves replaced by their control polygon. Repeated
/// points, including a closing point equal to the first, are dropped.
fn outline(path: &Path) -> SmallVec<[Point; 16]> {
    let mut points: SmallVec<[Point; 16]> = SmallVec::new();
    let mut push = |p: Point| {
        if points.last() != Some(&p) {
            points.push(p);
        }
    };
    for event in path.iter() {
        match event {
            PathEvent::Begin { at } => push(at),
            PathEvent::Line { to, .. } => push(to),
            PathEvent::Quadratic { ctrl, to, .. } => {
                push(ctrl);
                push(to);
            }
            PathEvent::Cubic {
                ctrl1, ctrl2, to, ..
            } => {
                push(ctrl1);
                push(ctrl2);
                push(to);
            }
            PathEvent::End { .. } => {}
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// Returns the sign of the polygon's turns (1 or -1) if it is convex, or 0 otherwise.
fn convex_orientation(points: &[Point]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut orientation = 0.0;
    for i in 0..n {
        let e1 = points[(i + 1) % n] - points[i];
        let e2 = points[(i + 2) % n] - points[(i + 1) % n];
        let cross = e1.cross(e2);
        if cross != 0.0 {
            if orientation == 0.0 {
                orientation = cross.signum();
            } else if cross.signum() != orientation {
                return 0.0;
            }
        } else if e1.dot(e2) < 0.0 {
            // doubles back on itself
            return 0.0;
        }
    }

    // Consistent turns alone accept polygons that wind around more than once.
    let edges = || (0..n).map(|i| points[(i + 1) % n] - points[i]);
    let changes = |signs: SmallVec<[f32; 16]>| {
        let m = signs.len();
        (0..m).filter(|&i| signs[i] != signs[(i + 1) % m]).count()
    };
    let dx: SmallVec<[f32; 16]> = edges().filter(|e| e.x != 0.0).map(|e| e.x.signum()).collect();
    let dy: SmallVec<[f32; 16]> = edges().filter(|e| e.y != 0.0).map(|e| e.y.signum()).collect();
    if changes(dx) > 2 || changes(dy) > 2 {
        return 0.0;
    }
    orientation
}

fn is_collinear(points: &[Point]) -> bool {
    let Some(&origin) = points.first() else {
        return true;
    };
    let Some(direction) = points.iter().map(|p| *p - origin).find(|d| *d != Vector::zero()) else {
        return true;
    };
    points.iter().all(|p| (*p - origin).cross(direction) == 0.0)
}

/// True for four points whose edges alternate between horizontal and vertical.
fn is_axis_aligned_quad(points: &[Point]) -> bool {
    if points.len() != 4 {
        return false;
    }
    let horizontal = |i: usize| points[i].y == points[(i + 1) % 4].y;
    let vertical = |i: usize| points[i].x == points[(i + 1) % 4].x;
    (horizontal(0) && vertical(1) && horizontal(2) && vertical(3))
        || (vertical(0) && horizontal(1) && vertical(2) && horizontal(3))
}

/// A builder for [`PathShape`]s.
///
/// # Examples
///
/// ```rust
/// use grafo_clip::PathShape;
///
/// let triangle = PathShape::builder()
///     .begin((0.0, 0.0))
///     .line_to((50.0, 10.0))
///     .line_to((50.0, 50.0))
///     .close()
///     .build();
/// assert!(triangle.is_convex());
/// ```
pub struct PathShapeBuilder {
    path_builder: lyon::path::Builder,
    in_subpath: bool,
}

impl Default for PathShapeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathShapeBuilder {
    pub fn new() -> Self {
        Self {
            path_builder: Path::builder(),
            in_subpath: false,
        }
    }

    /// Starts a new contour at `point`, leaving any open contour unclosed.
    pub fn begin(mut self, point: (f32, f32)) -> Self {
        if self.in_subpath {
            self.path_builder.end(false);
        }
        self.path_builder.begin(point.into());
        self.in_subpath = true;
        self
    }

    pub fn line_to(mut self, point: (f32, f32)) -> Self {
        self.path_builder.line_to(point.into());
        self
    }

    pub fn quadratic_bezier_to(mut self, ctrl: (f32, f32), to: (f32, f32)) -> Self {
        self.path_builder
            .quadratic_bezier_to(ctrl.into(), to.into());
        self
    }

    pub fn cubic_bezier_to(mut self, ctrl: (f32, f32), ctrl2: (f32, f32), to: (f32, f32)) -> Self {
        self.path_builder
            .cubic_bezier_to(ctrl.into(), ctrl2.into(), to.into());
        self
    }

    /// Closes the current contour.
    pub fn close(mut self) -> Self {
        if self.in_subpath {
            self.path_builder.close();
            self.in_subpath = false;
        }
        self
    }

    pub fn build(mut self) -> PathShape {
        if self.in_subpath {
            self.path_builder.end(false);
        }
        PathShape::new(self.path_builder.build())
    }
}

impl From<PathShapeBuilder> for PathShape {
    fn from(value: PathShapeBuilder) -> Self {
        value.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rect;

    fn polygon(points: &[(f32, f32)]) -> PathShape {
        let mut builder = PathShape::builder().begin(points[0]);
        for p in &points[1..] {
            builder = builder.line_to(*p);
        }
        builder.close().build()
    }

    #[test]
    fn unsorted_rect_is_sorted() {
        let shape = Shape::rect(rect(10.0, 20.0, 0.0, 5.0));
        assert_eq!(shape.as_rect(), Some(&rect(0.0, 5.0, 10.0, 20.0)));
    }

    #[test]
    fn zero_area_shapes_are_empty() {
        assert!(Shape::rect(rect(0.0, 0.0, 0.0, 10.0)).is_empty());
        let line = PathShape::builder()
            .begin((0.0, 0.0))
            .line_to((10.0, 10.0))
            .build();
        assert!(Shape::path(line).is_empty());
        assert!(Shape::path(PathShape::builder().build()).is_empty());
    }

    #[test]
    fn square_rrect_becomes_rect() {
        let rr = RRect::from_rect(rect(0.0, 0.0, 10.0, 10.0));
        assert!(Shape::rrect(rr).is_rect());
        let rounded = RRect::from_rect_xy(rect(0.0, 0.0, 10.0, 10.0), 2.0, 2.0).unwrap();
        assert!(Shape::rrect(rounded).is_rrect());
    }

    #[test]
    fn rect_path_keeps_inverse_fill() {
        let path = polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let shape = Shape::path(path).with_inverted(true);
        assert!(shape.is_rect());
        assert!(shape.inverted());
        assert!(!shape.convex());
    }

    #[test]
    fn reset_clears_inverse_fill() {
        let mut shape = Shape::rect(rect(0.0, 0.0, 1.0, 1.0)).with_inverted(true);
        shape.reset();
        assert!(shape.is_empty());
        assert!(!shape.inverted());
    }

    #[test]
    fn rotated_square_is_convex_path() {
        let diamond = polygon(&[(5.0, 0.0), (10.0, 5.0), (5.0, 10.0), (0.0, 5.0)]);
        assert!(diamond.is_convex());
        let shape = Shape::path(diamond);
        assert!(shape.is_path());
        assert!(shape.conservative_contains_point(Point::new(5.0, 5.0)));
        assert!(shape.conservative_contains_point(Point::new(5.0, 0.0)));
        assert!(!shape.conservative_contains_point(Point::new(1.0, 1.0)));
        assert!(shape.conservative_contains(&rect(4.0, 4.0, 6.0, 6.0)));
        assert!(!shape.conservative_contains(&rect(0.0, 0.0, 6.0, 6.0)));
    }

    #[test]
    fn concave_and_self_intersecting_paths_are_not_convex() {
        let arrow = polygon(&[(0.0, 0.0), (10.0, 5.0), (0.0, 10.0), (3.0, 5.0)]);
        assert!(!arrow.is_convex());

        let bowtie = polygon(&[(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0)]);
        assert!(!bowtie.is_convex());

        let two_squares = PathShape::builder()
            .begin((0.0, 0.0))
            .line_to((1.0, 0.0))
            .line_to((1.0, 1.0))
            .close()
            .begin((5.0, 5.0))
            .line_to((6.0, 5.0))
            .line_to((6.0, 6.0))
            .close()
            .build();
        assert!(!two_squares.is_convex());
    }

    #[test]
    fn star_winding_twice_is_not_convex() {
        let star = polygon(&[
            (5.0, 0.0),
            (8.0, 10.0),
            (0.0, 4.0),
            (10.0, 4.0),
            (2.0, 10.0),
        ]);
        assert!(!star.is_convex());
    }

    #[test]
    fn curved_path_does_not_claim_containment() {
        let blob = PathShape::builder()
            .begin((0.0, 0.0))
            .quadratic_bezier_to((10.0, 0.0), (10.0, 10.0))
            .line_to((0.0, 10.0))
            .close()
            .build();
        assert!(blob.is_convex());
        assert!(!blob.is_line_only());
        assert_eq!(blob.point_count(), 4);
        assert!(!Shape::path(blob).conservative_contains_point(Point::new(1.0, 9.0)));
    }

    #[test]
    fn path_equality_uses_identity_then_geometry() {
        let a = polygon(&[(0.0, 0.0), (10.0, 5.0), (0.0, 10.0)]);
        let b = a.clone();
        let c = polygon(&[(0.0, 0.0), (10.0, 5.0), (0.0, 10.0)]);
        let d = polygon(&[(0.0, 0.0), (10.0, 6.0), (0.0, 10.0)]);
        assert!(a.same_generation(&b));
        assert!(!a.same_generation(&c));
        assert_eq!(a, c);
        assert_ne!(a, d);
    }
}
