//! Rounded rectangles with independent elliptical corners.

use crate::error::GeometryError;
use crate::geometry::{self, rect, Point, Rect, Vector};
use crate::transform::Transform;
use lyon::math::{point, vector};

/// Corner of a rounded rectangle, in clockwise order starting at the top left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    UpperLeft = 0,
    UpperRight = 1,
    LowerRight = 2,
    LowerLeft = 3,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::UpperLeft,
        Corner::UpperRight,
        Corner::LowerRight,
        Corner::LowerLeft,
    ];

    fn of(self, r: &Rect) -> Point {
        match self {
            Corner::UpperLeft => point(r.min.x, r.min.y),
            Corner::UpperRight => point(r.max.x, r.min.y),
            Corner::LowerRight => point(r.max.x, r.max.y),
            Corner::LowerLeft => point(r.min.x, r.max.y),
        }
    }

    /// True if `a` lies on the inside of `b` as seen from this corner.
    fn is_inside(self, a: Point, b: Point) -> bool {
        match self {
            Corner::UpperLeft => a.x >= b.x && a.y >= b.y,
            Corner::UpperRight => a.x <= b.x && a.y >= b.y,
            Corner::LowerRight => a.x <= b.x && a.y <= b.y,
            Corner::LowerLeft => a.x >= b.x && a.y <= b.y,
        }
    }
}

/// A rectangle whose corners are quarter ellipses.
///
/// Radii are always finite, non-negative, and fit within the rectangle: adjacent radii along
/// an edge never sum to more than that edge's length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RRect {
    rect: Rect,
    radii: [Vector; 4],
}

impl RRect {
    /// Creates a rounded rectangle with zero radii.
    pub fn from_rect(r: Rect) -> Self {
        Self {
            rect: sorted(&r),
            radii: [Vector::zero(); 4],
        }
    }

    /// Creates a rounded rectangle with the same elliptical radii on every corner.
    pub fn from_rect_xy(r: Rect, rx: f32, ry: f32) -> Result<Self, GeometryError> {
        Self::new(r, [vector(rx, ry); 4])
    }

    /// Creates a rounded rectangle from per-corner radii, ordered as in [`Corner::ALL`].
    ///
    /// A corner with one zero component becomes square. Radii that overlap along an edge are
    /// scaled down uniformly until they fit.
    pub fn new(r: Rect, radii: [Vector; 4]) -> Result<Self, GeometryError> {
        if !geometry::is_finite(&r) {
            return Err(GeometryError::NonFiniteRect);
        }
        if radii
            .iter()
            .any(|v| !v.x.is_finite() || !v.y.is_finite() || v.x < 0.0 || v.y < 0.0)
        {
            return Err(GeometryError::InvalidRadii);
        }

        let rect = sorted(&r);
        if geometry::is_empty(&rect) {
            return Ok(Self {
                rect,
                radii: [Vector::zero(); 4],
            });
        }

        let mut radii = radii;
        for radius in radii.iter_mut() {
            if radius.x == 0.0 || radius.y == 0.0 {
                *radius = Vector::zero();
            }
        }

        let scale = fit_scale(&rect, &radii);
        if scale < 1.0 {
            for radius in radii.iter_mut() {
                *radius = *radius * scale;
            }
        }
        Ok(Self { rect, radii })
    }

    #[inline]
    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        self.rect
    }

    #[inline]
    pub fn radii(&self, corner: Corner) -> Vector {
        self.radii[corner as usize]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        geometry::is_empty(&self.rect)
    }

    /// True when the rectangle is non-empty and every corner is square.
    pub fn is_rect(&self) -> bool {
        !self.is_empty() && self.radii.iter().all(|r| *r == Vector::zero())
    }

    /// Tests whether `(x, y)` lies inside the elliptical corner region it falls into. Points
    /// outside every corner region are reported as contained; callers check the rectangle.
    fn check_corner_containment(&self, x: f32, y: f32) -> bool {
        let r = &self.rect;
        let ul = self.radii(Corner::UpperLeft);
        let ur = self.radii(Corner::UpperRight);
        let lr = self.radii(Corner::LowerRight);
        let ll = self.radii(Corner::LowerLeft);

        let (canonical, radii) = if x < r.min.x + ul.x && y < r.min.y + ul.y {
            (vector(x - (r.min.x + ul.x), y - (r.min.y + ul.y)), ul)
        } else if x < r.min.x + ll.x && y > r.max.y - ll.y {
            (vector(x - (r.min.x + ll.x), y - (r.max.y - ll.y)), ll)
        } else if x > r.max.x - ur.x && y < r.min.y + ur.y {
            (vector(x - (r.max.x - ur.x), y - (r.min.y + ur.y)), ur)
        } else if x > r.max.x - lr.x && y > r.max.y - lr.y {
            (vector(x - (r.max.x - lr.x), y - (r.max.y - lr.y)), lr)
        } else {
            return true;
        };

        // b^2*x^2 + a^2*y^2 <= (ab)^2 for an axis-aligned ellipse with radii (a, b)
        let dist = canonical.x * canonical.x * radii.y * radii.y
            + canonical.y * canonical.y * radii.x * radii.x;
        dist <= (radii.x * radii.y) * (radii.x * radii.y)
    }

    pub fn contains_point(&self, p: Point) -> bool {
        geometry::contains_point(&self.rect, p) && self.check_corner_containment(p.x, p.y)
    }

    /// True if `r` lies entirely within this rounded rectangle.
    pub fn contains_rect(&self, r: &Rect) -> bool {
        if !geometry::contains(&self.rect, r) {
            return false;
        }
        if self.is_rect() {
            return true;
        }
        Corner::ALL.iter().all(|corner| {
            let p = corner.of(r);
            self.check_corner_containment(p.x, p.y)
        })
    }

    /// Largest axis-aligned rectangle known to be inside the rounded rectangle.
    ///
    /// Exact when all four corners share the same radii; otherwise a safe inset. Returns the
    /// empty rectangle if the corners leave no room.
    pub fn inner_bounds(&self) -> Rect {
        if self.is_empty() || self.is_rect() {
            return self.rect;
        }

        // Inset by (1 - sqrt(2)/2) of the radii reaches the maximal inscribed point of each
        // corner ellipse; nudged inward so the corners stay inside under float error.
        const INSCRIBED_SCALE: f32 = (1.0 - std::f32::consts::FRAC_1_SQRT_2) + 1e-5;

        let tl = self.radii(Corner::UpperLeft);
        let tr = self.radii(Corner::UpperRight);
        let br = self.radii(Corner::LowerRight);
        let bl = self.radii(Corner::LowerLeft);

        let left = tl.x.max(bl.x);
        let top = tl.y.max(tr.y);
        let right = tr.x.max(br.x);
        let bottom = bl.y.max(br.y);

        let dw = left + right;
        let dh = top + bottom;
        let width = self.rect.width();
        let height = self.rect.height();

        let horiz_area = (width - dw) * height;
        let vert_area = (height - dh) * width;
        let inner_area = (width - INSCRIBED_SCALE * dw) * (height - INSCRIBED_SCALE * dh);

        let mut inner = self.rect;
        if horiz_area > vert_area && horiz_area > inner_area {
            inner.min.x += left;
            inner.max.x -= right;
        } else if vert_area > inner_area {
            inner.min.y += top;
            inner.max.y -= bottom;
        } else if inner_area > 0.0 {
            inner.min.x += INSCRIBED_SCALE * left;
            inner.max.x -= INSCRIBED_SCALE * right;
            inner.min.y += INSCRIBED_SCALE * top;
            inner.max.y -= INSCRIBED_SCALE * bottom;
        } else {
            return geometry::empty_rect();
        }
        inner
    }

    /// Intersection of two rounded rectangles, if it is itself exactly a rounded rectangle.
    ///
    /// Returns `None` when the rectangles are disjoint or when the intersection's corners cannot
    /// be proven to be one of the inputs' corners (or square corners inside both).
    pub fn conservative_intersect(a: &RRect, b: &RRect) -> Option<RRect> {
        let bounds = geometry::intersect(&a.rect, &b.rect);
        if geometry::is_empty(&bounds) {
            return None;
        }

        let mut radii = [Vector::zero(); 4];
        for corner in Corner::ALL {
            radii[corner as usize] = intersection_radii(a, b, &bounds, corner)?;
        }

        // Adjacent corners picked from different inputs may overlap along an edge, in which
        // case the intersection is not a rounded rectangle.
        if fit_scale(&bounds, &radii) < 1.0 {
            return None;
        }

        Some(RRect {
            rect: bounds,
            radii,
        })
    }

    /// Maps the rounded rectangle through a rect-preserving transform.
    ///
    /// Returns `None` for transforms that would turn it into something other than a rounded
    /// rectangle, or when the result is not finite.
    pub fn transform(&self, t: &Transform) -> Option<RRect> {
        if !t.rect_stays_rect() {
            return None;
        }
        let m = t.matrix();
        let mapped = t.map_rect(&self.rect);
        if !geometry::is_finite(&mapped) {
            return None;
        }
        let center = mapped.center();

        // Scale+translate keeps each radius on its own axis; a 90 degree rotation swaps them.
        let swaps_axes = m.m11 == 0.0;
        let mut radii = [Vector::zero(); 4];
        for corner in Corner::ALL {
            let src = self.radii(corner);
            let radius = if swaps_axes {
                vector(src.y * m.m21.abs(), src.x * m.m12.abs())
            } else {
                vector(src.x * m.m11.abs(), src.y * m.m22.abs())
            };
            let p = t.map_point(corner.of(&self.rect))?;
            let dst = match (p.x < center.x, p.y < center.y) {
                (true, true) => Corner::UpperLeft,
                (false, true) => Corner::UpperRight,
                (false, false) => Corner::LowerRight,
                (true, false) => Corner::LowerLeft,
            };
            radii[dst as usize] = radius;
        }

        RRect::new(mapped, radii).ok()
    }
}

fn sorted(r: &Rect) -> Rect {
    rect(
        r.min.x.min(r.max.x),
        r.min.y.min(r.max.y),
        r.min.x.max(r.max.x),
        r.min.y.max(r.max.y),
    )
}

/// Uniform scale that makes adjacent radii fit along every edge; 1.0 when they already do.
fn fit_scale(r: &Rect, radii: &[Vector; 4]) -> f32 {
    let width = r.width();
    let height = r.height();
    let ul = radii[Corner::UpperLeft as usize];
    let ur = radii[Corner::UpperRight as usize];
    let lr = radii[Corner::LowerRight as usize];
    let ll = radii[Corner::LowerLeft as usize];

    let mut scale = 1.0_f32;
    let mut limit = |sum: f32, length: f32| {
        if sum > length {
            scale = scale.min(length / sum);
        }
    };
    limit(ul.x + ur.x, width);
    limit(ur.y + lr.y, height);
    limit(lr.x + ll.x, width);
    limit(ll.y + ul.y, height);
    scale
}

fn intersection_radii(a: &RRect, b: &RRect, bounds: &Rect, corner: Corner) -> Option<Vector> {
    let test = corner.of(bounds);
    let a_corner = corner.of(&a.rect);
    let b_corner = corner.of(&b.rect);

    if test == a_corner && test == b_corner {
        // Shared anchor: take whichever corner curve is larger on both axes.
        let ar = a.radii(corner);
        let br = b.radii(corner);
        if ar.x >= br.x && ar.y >= br.y {
            Some(ar)
        } else if br.x >= ar.x && br.y >= ar.y {
            Some(br)
        } else {
            None
        }
    } else if test == a_corner {
        let radii = a.radii(corner);
        let contained = if radii == b.radii(corner) {
            corner.is_inside(a_corner, b_corner)
        } else {
            b.check_corner_containment(a_corner.x, a_corner.y)
        };
        contained.then_some(radii)
    } else if test == b_corner {
        let radii = b.radii(corner);
        let contained = if radii == a.radii(corner) {
            corner.is_inside(b_corner, a_corner)
        } else {
            a.check_corner_containment(b_corner.x, b_corner.y)
        };
        contained.then_some(radii)
    } else {
        // Formed by straight edges of both inputs, so it must be square and inside both.
        let inside = a.check_corner_containment(test.x, test.y)
            && b.check_corner_containment(test.x, test.y);
        inside.then_some(Vector::zero())
    }
}
