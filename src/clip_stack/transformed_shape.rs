use crate::geometry::{self, Point, Rect};
use crate::rrect::RRect;
use crate::shape::Shape;
use crate::transform::{HomogeneousPoint, Transform, TransformType};
use lyon::math::{point, vector};

use super::types::ClipOp;

/// Paths with more points than this are only compared by identity.
const MAX_PATH_COMPARE_POINTS: usize = 16;

/// A borrowed view of geometry under a local-to-device transform.
///
/// Elements, save records and draws are all compared through this view, so the combination rules
/// are written once.
#[derive(Clone, Copy)]
pub(crate) struct TransformedShape<'a> {
    pub local_to_device: &'a Transform,
    pub device_to_local: &'a Transform,
    pub shape: &'a Shape,
    pub outer: &'a Rect,
    pub inner: &'a Rect,
    pub op: ClipOp,
    pub aa: bool,
    /// Skip shape-level containment when the shape only approximates the real coverage, as for
    /// a save record standing in for all of its elements.
    pub contains_checks_only_bounds: bool,
}

/// Which operands of `A op B` still matter after combining them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SimplifyResult {
    Empty,
    AOnly,
    BOnly,
    Both,
}

impl TransformedShape<'_> {
    pub fn intersects(&self, o: &TransformedShape<'_>) -> bool {
        if !geometry::intersects(self.outer, o.outer) {
            return false;
        }

        if self.local_to_device.rect_stays_rect() && o.local_to_device.rect_stays_rect() {
            // Outer bounds are tight for these, and they already overlap.
            true
        } else if self.local_to_device == o.local_to_device {
            geometry::intersects(&self.shape.bounds(), &o.shape.bounds())
        } else if !self.local_to_device.has_perspective() && !o.local_to_device.has_perspective() {
            oriented_bbox_intersection(
                &self.shape.bounds(),
                self.local_to_device,
                &o.shape.bounds(),
                o.local_to_device,
            )
        } else {
            // Points behind the w = 0 plane can't prove the shapes apart.
            true
        }
    }

    pub fn contains(&self, o: &TransformedShape<'_>) -> bool {
        if geometry::contains(self.inner, o.outer) {
            return true;
        }
        if self.contains_checks_only_bounds || !geometry::contains(self.outer, o.outer) {
            return false;
        }

        // With mismatched AA one of the two may snap outward by up to half a pixel.
        let mixed_aa = self.aa != o.aa;

        if !mixed_aa && self.local_to_device == o.local_to_device {
            match (self.shape.as_rrect(), o.shape.as_rrect()) {
                (Some(a), Some(b)) => RRect::conservative_intersect(a, b).as_ref() == Some(b),
                _ => match (self.shape.as_path(), o.shape.as_path()) {
                    (Some(a), Some(b)) => {
                        a.same_generation(b)
                            || (a.point_count() <= MAX_PATH_COMPARE_POINTS && a == b)
                    }
                    _ => self.shape.conservative_contains(&o.shape.bounds()),
                },
            }
        } else if self.local_to_device.kind() <= TransformType::RectStaysRect
            && o.local_to_device.kind() <= TransformType::RectStaysRect
        {
            let mut device = o.local_to_device.map_rect(&o.shape.bounds());
            if mixed_aa {
                device = geometry::outset(&device, 0.5);
            }
            let local = self.device_to_local.map_rect(&device);
            self.shape.conservative_contains(&local)
        } else if self.shape.convex() {
            // For a convex shape, containing the four corners of o's bounding box means
            // containing all of o.
            let mut quad = o.local_to_device.map_quad(&o.shape.bounds());
            if quad.iter().any(|p| !p.is_projectable()) {
                return false;
            }
            if mixed_aa {
                quad = outset_quad(&quad);
            }
            quad.iter().all(|device| {
                let local = self.device_to_local.map_homogeneous_point(device);
                local.is_projectable() && self.shape.conservative_contains_point(local.project())
            })
        } else {
            false
        }
    }
}

/// Decides how `A op B` simplifies, where A is the older operand.
pub(crate) fn simplify(a: &TransformedShape<'_>, b: &TransformedShape<'_>) -> SimplifyResult {
    match (a.op, b.op) {
        (ClipOp::Intersect, ClipOp::Intersect) => {
            if !a.intersects(b) {
                SimplifyResult::Empty
            } else if b.contains(a) {
                SimplifyResult::AOnly
            } else if a.contains(b) {
                SimplifyResult::BOnly
            } else {
                SimplifyResult::Both
            }
        }
        (ClipOp::Intersect, ClipOp::Difference) => {
            if !a.intersects(b) {
                // b only removes coverage that a already removed
                SimplifyResult::AOnly
            } else if b.contains(a) {
                SimplifyResult::Empty
            } else {
                SimplifyResult::Both
            }
        }
        (ClipOp::Difference, ClipOp::Intersect) => {
            if !b.intersects(a) {
                SimplifyResult::BOnly
            } else if a.contains(b) {
                SimplifyResult::Empty
            } else {
                SimplifyResult::Both
            }
        }
        (ClipOp::Difference, ClipOp::Difference) => {
            if a.contains(b) {
                SimplifyResult::AOnly
            } else if b.contains(a) {
                SimplifyResult::BOnly
            } else {
                SimplifyResult::Both
            }
        }
    }
}

/// Separating axis test between two rectangles under affine transforms. The candidate axes are
/// the edge normals of each transformed rectangle.
fn oriented_bbox_intersection(a: &Rect, a_xform: &Transform, b: &Rect, b_xform: &Transform) -> bool {
    let am = a_xform.matrix();
    let bm = b_xform.matrix();
    let axes = [
        (-am.m12, am.m11),
        (-am.m22, am.m21),
        (-bm.m12, bm.m11),
        (-bm.m22, bm.m21),
    ];
    let quad_a = a_xform.map_quad(a);
    let quad_b = b_xform.map_quad(b);

    let project = |quad: &[HomogeneousPoint; 4], (ax, ay): (f32, f32)| {
        quad.iter()
            .map(|p| p.x * ax + p.y * ay)
            .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
    };

    axes.into_iter().all(|axis| {
        let (min_a, max_a) = project(&quad_a, axis);
        let (min_b, max_b) = project(&quad_b, axis);
        min_b <= max_a && min_a <= max_b
    })
}

/// Moves every edge of a projected convex quad half a pixel outward.
fn outset_quad(quad: &[HomogeneousPoint; 4]) -> [HomogeneousPoint; 4] {
    const OUTSET: f32 = 0.5;

    let points = quad.map(|p| p.project());
    let center = points
        .iter()
        .fold(point(0.0, 0.0), |sum, p| sum + p.to_vector() * 0.25);

    // Outward unit normal of the edge starting at each corner.
    let mut normals = [vector(0.0, 0.0); 4];
    for i in 0..4 {
        let edge = points[(i + 1) % 4] - points[i];
        let length = edge.length();
        if length <= 0.0 || !length.is_finite() {
            return outset_bounds(&points, OUTSET);
        }
        let mut normal = vector(edge.y, -edge.x) / length;
        if normal.dot(center - points[i]) > 0.0 {
            normal = -normal;
        }
        normals[i] = normal;
    }

    let mut outset = *quad;
    for i in 0..4 {
        // Offset of corner i keeps both adjacent edges OUTSET away from their old position.
        let a = normals[(i + 3) % 4];
        let b = normals[i];
        let det = a.cross(b);
        let offset = if det.abs() <= f32::EPSILON {
            a * OUTSET
        } else {
            vector(b.y - a.y, a.x - b.x) * (OUTSET / det)
        };
        let p = points[i] + offset;
        outset[i] = HomogeneousPoint {
            x: p.x,
            y: p.y,
            w: 1.0,
        };
    }
    outset
}

/// Corners of the points' bounding box, grown by `outset`.
fn outset_bounds(points: &[Point; 4], outset: f32) -> [HomogeneousPoint; 4] {
    let mut bounds = Rect::new(point(f32::MAX, f32::MAX), point(f32::MIN, f32::MIN));
    for p in points {
        bounds.min.x = bounds.min.x.min(p.x);
        bounds.min.y = bounds.min.y.min(p.y);
        bounds.max.x = bounds.max.x.max(p.x);
        bounds.max.y = bounds.max.y.max(p.y);
    }
    Transform::identity().map_quad(&geometry::outset(&bounds, outset))
}
