use tracing::trace;

use crate::geometry::{self, pixel_bounds, BoundsType, Rect};
use crate::rrect::RRect;
use crate::shape::{Shape, ShapeKind};
use crate::transform::Transform;

use super::save_record::SaveRecord;
use super::transformed_shape::{simplify, SimplifyResult, TransformedShape};
use super::types::{ClipOp, ClipState, Element};

/// An [`Element`] together with the bookkeeping the stack needs to combine and retire it.
#[derive(Debug, Clone)]
pub(crate) struct RawElement {
    element: Element,
    device_to_local: Transform,
    outer: Rect,
    /// Empty when no interior rectangle is known.
    inner: Rect,
    /// Index of the first element owned by the save record that made this element redundant.
    invalidated_by: Option<usize>,
}

impl RawElement {
    /// Canonicalizes a clip against the device bounds.
    pub fn new(
        device_bounds: &Rect,
        local_to_device: Transform,
        shape: Shape,
        aa: bool,
        op: ClipOp,
        force_aa: bool,
    ) -> Self {
        let mut element = Element {
            shape,
            local_to_device,
            op,
            aa,
        };

        // A transform without an inverse collapses the shape to a line or a point. The fill rule
        // is resolved afterwards, against the empty geometry.
        let device_to_local = match local_to_device.inverse() {
            Some(inverse) => inverse,
            None => {
                element.shape.clear_geometry();
                Transform::identity()
            }
        };

        if element.shape.inverted() {
            element.op = element.op.inverse();
            element.shape.set_inverted(false);
        }

        let mut raw = Self {
            element,
            device_to_local,
            outer: geometry::empty_rect(),
            inner: geometry::empty_rect(),
            invalidated_by: None,
        };
        raw.canonicalize(device_bounds, force_aa);
        raw
    }

    fn canonicalize(&mut self, device_bounds: &Rect, force_aa: bool) {
        let local_to_device = self.element.local_to_device;
        let rect_stays_rect = local_to_device.rect_stays_rect();

        // Axis-aligned clip rects can always become a scissor, so they keep their AA setting.
        if force_aa && !(self.element.shape.is_rect() && rect_stays_rect) {
            self.element.aa = true;
        }

        let device = if self.element.shape.is_empty() {
            geometry::empty_rect()
        } else {
            let mapped = local_to_device.map_rect(&self.element.shape.bounds());
            geometry::intersect(&mapped, device_bounds)
        };
        if !geometry::is_empty(&device) {
            self.outer = snap_outer(&device, self.element.aa);
        }

        // Moving rect-preserving transforms into the geometry puts more elements in the same
        // (identity) space, where they can be combined.
        if !geometry::is_empty(&self.outer) && rect_stays_rect {
            if self.element.shape.is_rect() {
                self.set_device_rect(device);
            } else if let Some(rrect) = self.element.shape.as_rrect().copied() {
                // Badly scaled transforms can produce invalid radii, in which case the round
                // rect stays in local space.
                if let Some(transformed) = rrect.transform(&local_to_device) {
                    if transformed.is_rect() {
                        let clipped = geometry::intersect(transformed.rect(), device_bounds);
                        self.set_device_rect(clipped);
                    } else {
                        self.element.shape.set_rrect(transformed);
                        let inner = geometry::intersect(&transformed.inner_bounds(), device_bounds);
                        self.inner = snap_inner(&inner, self.element.aa);
                        self.to_device_space();
                    }
                }
            }
        }

        if geometry::is_empty(&self.outer) {
            // Either empty to begin with, entirely off the device, or a non-AA sliver that
            // covers no pixel.
            self.element.shape.reset();
            self.outer = geometry::empty_rect();
            self.inner = geometry::empty_rect();
        }

        debug_assert!(
            self.element.shape.is_empty() || geometry::contains(device_bounds, &self.outer)
        );
        self.validate();
    }

    /// Stores a device-space rect, clipped to the device, as the shape.
    fn set_device_rect(&mut self, device: Rect) {
        self.element.shape.set_rect(device);
        if !self.element.aa && device.width() >= 1.0 && device.height() >= 1.0 {
            // Non-AA rects are applied as a scissor, which rounds each edge.
            let rounded = geometry::rect(
                device.min.x.round(),
                device.min.y.round(),
                device.max.x.round(),
                device.max.y.round(),
            );
            self.outer = rounded;
            self.inner = rounded;
        } else {
            self.outer = snap_outer(&device, self.element.aa);
            self.inner = snap_inner(&device, self.element.aa);
        }
        self.to_device_space();
    }

    fn to_device_space(&mut self) {
        self.element.local_to_device = Transform::identity();
        self.device_to_local = Transform::identity();
    }

    fn validate(&self) {
        debug_assert!(
            self.element.shape.is_empty() || !geometry::is_empty(&self.outer),
            "non-empty element with empty outer bounds"
        );
        debug_assert!(
            geometry::is_empty(&self.inner) || geometry::contains(&self.outer, &self.inner),
            "inner bounds escape outer bounds"
        );
        debug_assert!(!self.element.shape.inverted());
    }

    #[inline]
    pub fn element(&self) -> &Element {
        &self.element
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.element.shape
    }

    #[inline]
    pub fn op(&self) -> ClipOp {
        self.element.op
    }

    #[inline]
    pub fn aa(&self) -> bool {
        self.element.aa
    }

    #[inline]
    pub fn outer_bounds(&self) -> &Rect {
        &self.outer
    }

    #[inline]
    pub fn inner_bounds(&self) -> &Rect {
        &self.inner
    }

    #[inline]
    pub fn is_invalid(&self) -> bool {
        self.invalidated_by.is_some()
    }

    pub fn as_shape(&self) -> TransformedShape<'_> {
        TransformedShape {
            local_to_device: &self.element.local_to_device,
            device_to_local: &self.device_to_local,
            shape: &self.element.shape,
            outer: &self.outer,
            inner: &self.inner,
            op: self.element.op,
            aa: self.element.aa,
            contains_checks_only_bounds: false,
        }
    }

    pub fn mark_invalid(&mut self, current: &SaveRecord) {
        debug_assert!(!self.is_invalid());
        self.invalidated_by = Some(current.first_active_element_index());
    }

    /// Revives the element if the record that invalidated it has been popped.
    pub fn restore_valid(&mut self, current: &SaveRecord) {
        if let Some(index) = self.invalidated_by {
            if current.first_active_element_index() < index {
                self.invalidated_by = None;
            }
        }
    }

    /// Merges `other` into this element when the intersection of the two is exactly
    /// representable as one rect or round rect. Returns true if `other` is no longer needed;
    /// when the merged shape turns out to be empty this element is also marked invalid.
    pub fn combine(&mut self, other: &RawElement, current: &SaveRecord) -> bool {
        if self.op() != ClipOp::Intersect || other.op() != ClipOp::Intersect {
            return false;
        }

        let same_space = self.element.local_to_device == other.element.local_to_device;
        let mut shape_updated = false;
        let rects = (
            self.shape().as_rect().copied(),
            other.shape().as_rect().copied(),
        );
        if let (Some(a), Some(b)) = rects {
            let mut aa_match = self.aa() == other.aa();
            if !aa_match
                && self.element.local_to_device.is_identity()
                && other.element.local_to_device.is_identity()
            {
                if geometry::is_pixel_aligned(&a) {
                    // This rect's AA doesn't matter, but other's edges may need it.
                    self.element.aa = other.aa();
                } else if !geometry::is_pixel_aligned(&b) {
                    return false;
                }
                aa_match = true;
            }

            if aa_match && same_space {
                let intersection = geometry::intersect(&a, &b);
                if geometry::is_empty(&intersection) {
                    trace!("rect intersection is empty, clip collapses");
                    self.element.shape.reset();
                    self.mark_invalid(current);
                    return true;
                }
                self.element.shape.set_rect(intersection);
                shape_updated = true;
            }
        } else if let (Some(a), Some(b)) = (as_rrect(self.shape()), as_rrect(other.shape())) {
            // No pixel-alignment leniency for round rects.
            if self.aa() == other.aa() && same_space {
                match RRect::conservative_intersect(&a, &b) {
                    Some(joined) if joined.is_rect() => {
                        self.element.shape.set_rect(*joined.rect());
                        shape_updated = true;
                    }
                    Some(joined) => {
                        self.element.shape.set_rrect(joined);
                        shape_updated = true;
                    }
                    None if !geometry::intersects(&a.bounds(), &b.bounds()) => {
                        trace!("round rect intersection is empty, clip collapses");
                        self.element.shape.reset();
                        self.mark_invalid(current);
                        return true;
                    }
                    // Not representable as a single round rect.
                    None => {}
                }
            }
        }

        if !shape_updated {
            return false;
        }

        self.outer = geometry::intersect(&self.outer, &other.outer);
        self.inner = geometry::intersect(&self.inner, &other.inner);
        debug_assert!(!geometry::is_empty(&self.outer));
        trace!(shape = ?self.element.shape, "combined two clip elements");
        self.validate();
        true
    }

    /// Reconciles this (older) element with a newly added one, invalidating whichever of the
    /// two no longer affects the clip.
    pub fn update_for_element(&mut self, added: &mut RawElement, current: &SaveRecord) {
        if self.is_invalid() {
            return;
        }

        match simplify(&self.as_shape(), &added.as_shape()) {
            SimplifyResult::Empty => {
                self.mark_invalid(current);
                added.mark_invalid(current);
            }
            SimplifyResult::AOnly => added.mark_invalid(current),
            SimplifyResult::BOnly => self.mark_invalid(current),
            SimplifyResult::Both => {
                if added.combine(self, current) {
                    self.mark_invalid(current);
                }
            }
        }
    }

    /// The clip state this element would produce on its own.
    pub fn clip_type(&self) -> ClipState {
        let device_space =
            self.element.op == ClipOp::Intersect && self.element.local_to_device.is_identity();
        match self.element.shape.kind() {
            ShapeKind::Empty => ClipState::Empty,
            ShapeKind::Rect(_) if device_space => ClipState::DeviceRect,
            ShapeKind::RRect(_) if device_space => ClipState::DeviceRRect,
            _ => ClipState::Complex,
        }
    }
}

/// Pixels touched by `r`, as a device rect.
fn snap_outer(r: &Rect, aa: bool) -> Rect {
    geometry::irect_to_rect(&pixel_bounds(r, aa, BoundsType::Exterior))
}

/// Pixels entirely covered by `r`, as a device rect. Empty if there are none.
fn snap_inner(r: &Rect, aa: bool) -> Rect {
    let inner = geometry::irect_to_rect(&pixel_bounds(r, aa, BoundsType::Interior));
    if geometry::is_empty(&inner) {
        geometry::empty_rect()
    } else {
        inner
    }
}

fn as_rrect(shape: &Shape) -> Option<RRect> {
    match shape.kind() {
        ShapeKind::Rect(r) => Some(RRect::from_rect(*r)),
        ShapeKind::RRect(rr) => Some(*rr),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{rect, Point};
    use crate::shape::PathShape;

    fn device() -> Rect {
        rect(0.0, 0.0, 100.0, 100.0)
    }

    fn element(transform: Transform, shape: Shape, op: ClipOp) -> RawElement {
        RawElement::new(&device(), transform, shape, true, op, false)
    }

    #[test]
    fn inverted_shape_flips_op() {
        let shape = Shape::rect(rect(10.0, 10.0, 20.0, 20.0)).with_inverted(true);
        let e = element(Transform::identity(), shape, ClipOp::Intersect);
        assert_eq!(e.op(), ClipOp::Difference);
        assert!(!e.shape().inverted());
        assert_eq!(e.shape().as_rect(), Some(&rect(10.0, 10.0, 20.0, 20.0)));
    }

    #[test]
    fn singular_transform_empties_shape() {
        let e = element(
            Transform::scale(0.0, 2.0),
            Shape::rect(rect(10.0, 10.0, 20.0, 20.0)),
            ClipOp::Intersect,
        );
        assert!(e.shape().is_empty());
        assert_eq!(e.clip_type(), ClipState::Empty);
    }

    #[test]
    fn singular_transform_keeps_inverse_fill() {
        let shape = Shape::rect(rect(10.0, 10.0, 50.0, 50.0)).with_inverted(true);
        let e = element(Transform::scale(0.0, 1.0), shape.clone(), ClipOp::Intersect);
        assert!(e.shape().is_empty());
        assert!(!e.shape().inverted());
        assert_eq!(e.op(), ClipOp::Difference);

        let e = element(Transform::scale(0.0, 1.0), shape, ClipOp::Difference);
        assert!(e.shape().is_empty());
        assert_eq!(e.op(), ClipOp::Intersect);
        assert_eq!(e.clip_type(), ClipState::Empty);
    }

    #[test]
    fn scale_translate_is_applied_to_rects() {
        let e = element(
            Transform::scale(2.0, 3.0).then_translate(4.0, 5.0),
            Shape::rect(rect(1.0, 1.0, 5.0, 5.0)),
            ClipOp::Intersect,
        );
        assert!(e.element().local_to_device.is_identity());
        assert_eq!(e.shape().as_rect(), Some(&rect(6.0, 8.0, 14.0, 20.0)));
        assert_eq!(e.inner_bounds(), e.outer_bounds());
        assert_eq!(e.clip_type(), ClipState::DeviceRect);
    }

    #[test]
    fn rect_is_clamped_to_device() {
        let e = element(
            Transform::identity(),
            Shape::rect(rect(80.0, 10.0, 150.0, 20.0)),
            ClipOp::Intersect,
        );
        assert_eq!(e.shape().as_rect(), Some(&rect(80.0, 10.0, 100.0, 20.0)));
    }

    #[test]
    fn offscreen_shape_is_empty() {
        let e = element(
            Transform::identity(),
            Shape::rect(rect(150.0, 150.0, 160.0, 160.0)),
            ClipOp::Difference,
        );
        assert!(e.shape().is_empty());
        assert!(geometry::is_empty(e.outer_bounds()));
    }

    #[test]
    fn rrect_is_moved_to_device_space() {
        let rr = RRect::from_rect_xy(rect(0.0, 0.0, 10.0, 10.0), 2.0, 2.0).unwrap();
        let e = element(Transform::translation(20.0, 30.0), Shape::rrect(rr), ClipOp::Intersect);
        assert_eq!(e.clip_type(), ClipState::DeviceRRect);
        assert_eq!(e.shape().bounds(), rect(20.0, 30.0, 30.0, 40.0));
        assert!(geometry::contains(e.outer_bounds(), e.inner_bounds()));
    }

    #[test]
    fn rotated_and_path_elements_are_complex() {
        let rotated = element(
            Transform::rotation_degrees(30.0).then_translate(50.0, 0.0),
            Shape::rect(rect(0.0, 0.0, 20.0, 20.0)),
            ClipOp::Intersect,
        );
        assert_eq!(rotated.clip_type(), ClipState::Complex);
        assert!(geometry::is_empty(rotated.inner_bounds()));

        let triangle = PathShape::builder()
            .begin((10.0, 10.0))
            .line_to((50.0, 10.0))
            .line_to((30.0, 40.0))
            .close()
            .build();
        let path = element(Transform::identity(), Shape::path(triangle), ClipOp::Intersect);
        assert_eq!(path.clip_type(), ClipState::Complex);
        assert!(path.shape().conservative_contains_point(Point::new(30.0, 20.0)));
    }

    #[test]
    fn force_aa_skips_axis_aligned_rects() {
        let r = RawElement::new(
            &device(),
            Transform::identity(),
            Shape::rect(rect(1.0, 1.0, 5.0, 5.0)),
            false,
            ClipOp::Intersect,
            true,
        );
        assert!(!r.aa());

        let rr = RRect::from_rect_xy(rect(1.0, 1.0, 9.0, 9.0), 2.0, 2.0).unwrap();
        let rounded = RawElement::new(
            &device(),
            Transform::identity(),
            Shape::rrect(rr),
            false,
            ClipOp::Intersect,
            true,
        );
        assert!(rounded.aa());
    }
}
