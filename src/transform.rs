use crate::error::GeometryError;
use crate::geometry::{self, rect, Point, Rect};
use euclid::default::Transform3D;
use euclid::Angle;
use lyon::math::point;

/// Homogeneous coordinates closer than this to the W = 0 plane are treated as projecting to
/// infinity.
pub const W0_PLANE_DISTANCE: f32 = 1.0 / 16384.0;

/// Sines and cosines this close to zero are snapped, so quarter turns stay axis aligned.
const TRIG_SNAP_TOLERANCE: f32 = 1.0 / 65536.0;

/// Determinants this close to zero make a transform non-invertible.
const NEARLY_ZERO_DETERMINANT: f32 = (1.0 / 4096.0) * (1.0 / 4096.0) * (1.0 / 4096.0);

/// How cheaply shapes under a transform can be compared with other shapes.
///
/// The ordering is meaningful: `Identity < RectStaysRect < General`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransformType {
    Identity,
    /// Scale and translate, optionally swapping axes. Axis-aligned rectangles stay axis
    /// aligned.
    RectStaysRect,
    /// Rotation, skew, or perspective.
    General,
}

/// A point mapped by a projective transform, before the divide by `w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomogeneousPoint {
    pub x: f32,
    pub y: f32,
    pub w: f32,
}

impl HomogeneousPoint {
    /// True if the point lies in front of the W = 0 plane and can be projected.
    #[inline]
    pub fn is_projectable(&self) -> bool {
        self.w >= W0_PLANE_DISTANCE
    }

    #[inline]
    pub fn project(&self) -> Point {
        point(self.x / self.w, self.y / self.w)
    }
}

/// A 2D projective transform from a shape's local space to device space.
///
/// The matrix is stored as a `Transform3D` whose z row and column are identity, so it composes
/// with the 3D transforms used by the renderer while only acting on the xy plane. Transforms
/// compare equal by value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Transform3D<f32>,
    kind: TransformType,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: Transform3D::identity(),
            kind: TransformType::Identity,
        }
    }

    /// The plain constructors take their arguments unchecked. A non-finite argument gives a
    /// transform that is not invertible, so shapes clipped with it collapse to empty. Use
    /// [`Transform::from_row_major`] to reject such input instead.
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::from_flat(Transform3D::translation(tx, ty, 0.0))
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self::from_flat(Transform3D::scale(sx, sy, 1.0))
    }

    /// Rotation about the origin. Multiples of 90 degrees produce exact axis swaps.
    pub fn rotation_degrees(degrees: f32) -> Self {
        let radians = Angle::degrees(degrees).radians;
        let snap = |v: f32| if v.abs() <= TRIG_SNAP_TOLERANCE { 0.0 } else { v };
        let (sin, cos) = (snap(radians.sin()), snap(radians.cos()));
        Self::from_flat(Transform3D::new(
            cos, sin, 0.0, 0.0, //
            -sin, cos, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    /// Creates a transform from the nine entries of a 3x3 projective matrix, in row-major order
    /// for column vectors:
    ///
    /// ```text
    /// | scale_x  skew_x   trans_x |
    /// | skew_y   scale_y  trans_y |
    /// | persp_0  persp_1  persp_2 |
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn from_row_major(
        scale_x: f32,
        skew_x: f32,
        trans_x: f32,
        skew_y: f32,
        scale_y: f32,
        trans_y: f32,
        persp_0: f32,
        persp_1: f32,
        persp_2: f32,
    ) -> Result<Self, GeometryError> {
        let values = [
            scale_x, skew_x, trans_x, skew_y, scale_y, trans_y, persp_0, persp_1, persp_2,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFiniteMatrix);
        }
        Ok(Self::from_flat(Transform3D::new(
            scale_x, skew_y, 0.0, persp_0, //
            skew_x, scale_y, 0.0, persp_1, //
            0.0, 0.0, 1.0, 0.0, //
            trans_x, trans_y, 0.0, persp_2,
        )))
    }

    /// Flattens a 3D transform onto the xy plane, dropping everything that reads or writes z.
    pub fn from_matrix(m: &Transform3D<f32>) -> Result<Self, GeometryError> {
        Self::from_row_major(
            m.m11, m.m21, m.m41, m.m12, m.m22, m.m42, m.m14, m.m24, m.m44,
        )
    }

    fn from_flat(matrix: Transform3D<f32>) -> Self {
        Self {
            kind: classify(&matrix),
            matrix,
        }
    }

    #[inline]
    pub fn matrix(&self) -> &Transform3D<f32> {
        &self.matrix
    }

    #[inline]
    pub fn kind(&self) -> TransformType {
        self.kind
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.kind == TransformType::Identity
    }

    #[inline]
    pub fn rect_stays_rect(&self) -> bool {
        self.kind <= TransformType::RectStaysRect
    }

    #[inline]
    pub fn has_perspective(&self) -> bool {
        let m = &self.matrix;
        m.m14 != 0.0 || m.m24 != 0.0 || m.m44 != 1.0
    }

    /// Applies `self`, then `other`.
    pub fn then(&self, other: &Transform) -> Transform {
        Self::from_flat(self.matrix.then(&other.matrix))
    }

    pub fn then_translate(&self, tx: f32, ty: f32) -> Transform {
        self.then(&Transform::translation(tx, ty))
    }

    pub fn then_scale(&self, sx: f32, sy: f32) -> Transform {
        self.then(&Transform::scale(sx, sy))
    }

    pub fn then_rotate_degrees(&self, degrees: f32) -> Transform {
        self.then(&Transform::rotation_degrees(degrees))
    }

    fn determinant_2d(&self) -> f32 {
        let m = &self.matrix;
        m.m11 * (m.m22 * m.m44 - m.m24 * m.m42) - m.m21 * (m.m12 * m.m44 - m.m14 * m.m42)
            + m.m41 * (m.m12 * m.m24 - m.m14 * m.m22)
    }

    /// False when the transform collapses the plane onto a line or a point, or has a
    /// non-finite entry.
    pub fn is_invertible(&self) -> bool {
        let det = self.determinant_2d();
        det.is_finite() && det.abs() > NEARLY_ZERO_DETERMINANT && self.is_finite()
    }

    fn is_finite(&self) -> bool {
        self.matrix.to_array().iter().all(|v| v.is_finite())
    }

    pub fn inverse(&self) -> Option<Transform> {
        if self.is_invertible() {
            self.matrix.inverse().map(Self::from_flat)
        } else {
            None
        }
    }

    #[inline]
    pub fn map_homogeneous(&self, p: Point) -> HomogeneousPoint {
        let m = &self.matrix;
        HomogeneousPoint {
            x: p.x * m.m11 + p.y * m.m21 + m.m41,
            y: p.x * m.m12 + p.y * m.m22 + m.m42,
            w: p.x * m.m14 + p.y * m.m24 + m.m44,
        }
    }

    /// Maps a point that has already been through another projective transform.
    pub fn map_homogeneous_point(&self, p: &HomogeneousPoint) -> HomogeneousPoint {
        let m = &self.matrix;
        HomogeneousPoint {
            x: p.x * m.m11 + p.y * m.m21 + p.w * m.m41,
            y: p.x * m.m12 + p.y * m.m22 + p.w * m.m42,
            w: p.x * m.m14 + p.y * m.m24 + p.w * m.m44,
        }
    }

    /// Maps a point, or returns `None` if it lands behind the W = 0 plane.
    pub fn map_point(&self, p: Point) -> Option<Point> {
        let mapped = self.map_homogeneous(p);
        mapped.is_projectable().then(|| mapped.project())
    }

    /// The four corners of `r` in device space, clockwise from the top left.
    pub fn map_quad(&self, r: &Rect) -> [HomogeneousPoint; 4] {
        [
            self.map_homogeneous(point(r.min.x, r.min.y)),
            self.map_homogeneous(point(r.max.x, r.min.y)),
            self.map_homogeneous(point(r.max.x, r.max.y)),
            self.map_homogeneous(point(r.min.x, r.max.y)),
        ]
    }

    /// Bounds of the mapped rectangle. If part of it projects behind the viewer the result is
    /// unbounded, since it cannot be bounded in device space.
    pub fn map_rect(&self, r: &Rect) -> Rect {
        if self.is_identity() {
            return *r;
        }
        let quad = self.map_quad(r);
        if quad.iter().any(|p| !p.is_projectable()) {
            return rect(f32::MIN, f32::MIN, f32::MAX, f32::MAX);
        }
        let mut bounds = rect(f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for p in quad.iter().map(HomogeneousPoint::project) {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        bounds
    }

    /// Maps a device-space rectangle back into local space. Empty when not invertible.
    pub fn inverse_map_rect(&self, r: &Rect) -> Rect {
        match self.inverse() {
            Some(inverse) => inverse.map_rect(r),
            None => geometry::empty_rect(),
        }
    }
}

fn classify(m: &Transform3D<f32>) -> TransformType {
    if m.m14 != 0.0 || m.m24 != 0.0 || m.m44 != 1.0 {
        return TransformType::General;
    }
    if m.m12 == 0.0 && m.m21 == 0.0 {
        if m.m11 == 1.0 && m.m22 == 1.0 && m.m41 == 0.0 && m.m42 == 0.0 {
            TransformType::Identity
        } else if m.m11 != 0.0 && m.m22 != 0.0 {
            TransformType::RectStaysRect
        } else {
            TransformType::General
        }
    } else if m.m11 == 0.0 && m.m22 == 0.0 && m.m12 != 0.0 && m.m21 != 0.0 {
        TransformType::RectStaysRect
    } else {
        TransformType::General
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_ranked() {
        assert_eq!(Transform::identity().kind(), TransformType::Identity);
        assert_eq!(
            Transform::translation(3.0, 4.0).kind(),
            TransformType::RectStaysRect
        );
        assert_eq!(
            Transform::scale(2.0, -1.0).kind(),
            TransformType::RectStaysRect
        );
        assert_eq!(
            Transform::rotation_degrees(90.0).kind(),
            TransformType::RectStaysRect
        );
        assert_eq!(
            Transform::rotation_degrees(45.0).kind(),
            TransformType::General
        );
        assert!(TransformType::Identity < TransformType::RectStaysRect);
        assert!(TransformType::RectStaysRect < TransformType::General);
    }

    #[test]
    fn perspective_is_general() {
        let t = Transform::from_row_major(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.001, 0.0, 1.0).unwrap();
        assert!(t.has_perspective());
        assert_eq!(t.kind(), TransformType::General);
    }

    #[test]
    fn scale_then_translate_maps_rect() {
        let t = Transform::scale(2.0, 4.0).then_translate(15.5, 14.25);
        let mapped = t.map_rect(&rect(1.0, 2.0, 3.0, 4.0));
        assert_eq!(mapped, rect(17.5, 22.25, 21.5, 30.25));
        let back = t.inverse_map_rect(&mapped);
        assert!((back.min.x - 1.0).abs() < 1e-4);
        assert!((back.max.y - 4.0).abs() < 1e-4);
    }

    #[test]
    fn zero_scale_is_not_invertible() {
        let t = Transform::scale(0.0, 1.0);
        assert!(!t.is_invertible());
        assert!(t.inverse().is_none());
    }

    #[test]
    fn non_finite_arguments_are_not_invertible() {
        assert!(!Transform::translation(f32::NAN, 0.0).is_invertible());
        assert!(!Transform::translation(0.0, f32::INFINITY).is_invertible());
        assert!(!Transform::scale(f32::INFINITY, 1.0).is_invertible());
        assert!(!Transform::rotation_degrees(f32::NAN).is_invertible());
        assert!(Transform::translation(1.0e6, 0.0).inverse().is_some());
    }

    #[test]
    fn from_matrix_drops_z() {
        let m = Transform3D::<f32>::translation(5.0, 6.0, 7.0).then(&Transform3D::scale(1.0, 1.0, 3.0));
        let t = Transform::from_matrix(&m).unwrap();
        assert_eq!(t, Transform::translation(5.0, 6.0));
    }

    #[test]
    fn non_finite_matrix_is_rejected() {
        assert_eq!(
            Transform::from_row_major(f32::NAN, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0),
            Err(GeometryError::NonFiniteMatrix)
        );
    }

    #[test]
    fn points_behind_viewer_are_not_projectable() {
        // w = 1 - x / 10, which reaches zero at x = 10.
        let t = Transform::from_row_major(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, -0.1, 0.0, 1.0).unwrap();
        assert!(t.map_point(point(5.0, 0.0)).is_some());
        assert!(t.map_point(point(20.0, 0.0)).is_none());
        let unbounded = t.map_rect(&rect(0.0, 0.0, 20.0, 1.0));
        assert_eq!(unbounded.min.x, f32::MIN);
    }
}
