//! The shared catalogue of clip cases.
//!
//! Each function builds one family of cases around a single behaviour of the stack: how
//! elements combine, how transforms are folded into geometry, and when shapes contain or
//! exclude each other.

use grafo_clip::{
    irect, irect_to_rect, rect, ClipOp, ClipState, IRect, PathShape, RRect, Rect, Shape,
    Transform, Vector,
};

use crate::case::ClipCase;
use crate::shapes::{make_octagon, make_octagon_with};

/// The device every case clips against.
pub fn device_bounds() -> IRect {
    irect(0, 0, 100, 100)
}

fn offset(r: &Rect, dx: f32, dy: f32) -> Rect {
    r.translate(Vector::new(dx, dy))
}

fn outset(r: &Rect, d: f32) -> Rect {
    r.inflate(d, d)
}

fn rounded(r: Rect, rx: f32, ry: f32) -> RRect {
    RRect::from_rect_xy(r, rx, ry).unwrap_or_else(|_| RRect::from_rect(r))
}

fn rounded_corners(r: Rect, radii: [Vector; 4]) -> RRect {
    RRect::new(r, radii).unwrap_or_else(|_| RRect::from_rect(r))
}

fn oval(r: Rect) -> RRect {
    rounded(r, r.width() / 2.0, r.height() / 2.0)
}

fn intersection(a: &Rect, b: &Rect) -> Rect {
    a.intersection_unchecked(b)
}

/// Every case in the catalogue.
pub fn build_scenarios() -> Vec<ClipCase> {
    let groups: [fn() -> Vec<ClipCase>; 26] = [
        initial_state,
        rect_rect_aa_combine,
        difference_no_combine,
        rect_rect_non_axis_aligned,
        rrect_rrect_aa_combine,
        rect_rrect_combine,
        rect_device_clip,
        shape_device_bounds_clip,
        path_simplify,
        repeat_element,
        inverse_filled_path,
        offscreen,
        empty_shape,
        difference_bounds,
        no_difference_interference,
        multiple_paths,
        device_rect,
        device_rrect,
        scale_translate,
        preserve_axis_alignment,
        convex_path_contains,
        non_axis_aligned_contains,
        mixed_aa_contains,
        shape_contains_device,
        disjoint_shapes,
        complex_clip,
    ];
    groups.iter().flat_map(|group| group()).collect()
}

pub fn initial_state() -> Vec<ClipCase> {
    vec![ClipCase::build("initial-state", device_bounds()).finish()]
}

fn fractional_rects() -> (Rect, Rect, Rect) {
    let pixel_aligned = rect(0.0, 0.0, 10.0, 10.0);
    let frac1 = offset(&pixel_aligned, 5.3, 3.7);
    let frac2 = rect(
        frac1.min.x + 0.75 * frac1.width(),
        frac1.min.y + 0.75 * frac1.height(),
        frac1.max.x,
        frac1.max.y,
    );
    (pixel_aligned, frac1, frac2)
}

/// Rect intersections collapse to one element when the AA matches or one side is pixel aligned.
pub fn rect_rect_aa_combine() -> Vec<ClipCase> {
    let (pixel_aligned, frac1, frac2) = fractional_rects();
    let frac_intersect = intersection(&frac1, &frac2);
    let aligned_intersect = intersection(&pixel_aligned, &frac1);

    vec![
        ClipCase::build("aa", device_bounds())
            .actual().aa().intersect().rect(frac1).rect(frac2).finish_elements()
            .expect().aa().intersect().rect(frac_intersect).finish_elements()
            .state(ClipState::DeviceRect)
            .finish(),
        ClipCase::build("nonaa", device_bounds())
            .actual().non_aa().intersect().rect(frac1).rect(frac2).finish_elements()
            .expect().non_aa().intersect().rect(frac_intersect).finish_elements()
            .state(ClipState::DeviceRect)
            .finish(),
        ClipCase::build("aligned-aa+nonaa", device_bounds())
            .actual().intersect().aa().rect(pixel_aligned).non_aa().rect(frac1).finish_elements()
            .expect().non_aa().intersect().rect(aligned_intersect).finish_elements()
            .state(ClipState::DeviceRect)
            .finish(),
        ClipCase::build("aa+aligned-nonaa", device_bounds())
            .actual().intersect().aa().rect(frac1).non_aa().rect(pixel_aligned).finish_elements()
            .expect().aa().intersect().rect(aligned_intersect).finish_elements()
            .state(ClipState::DeviceRect)
            .finish(),
        ClipCase::build("aa+nonaa", device_bounds())
            .actual().intersect().aa().rect(frac1).non_aa().rect(frac2).finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
    ]
}

/// An intersect and a difference never merge, even when two intersects would have.
pub fn difference_no_combine() -> Vec<ClipCase> {
    let r1 = rect(15.0, 14.0, 23.22, 58.2);
    let r2 = offset(&r1, 5.0, 8.0);

    vec![ClipCase::build("no-combine", device_bounds())
        .actual().aa().intersect().rect(r1).difference().rect(r2).finish_elements()
        .expect_actual()
        .state(ClipState::Complex)
        .finish()]
}

/// Rects sharing a non-axis-aligned space still merge, unless their AA differs.
pub fn rect_rect_non_axis_aligned() -> Vec<ClipCase> {
    let (pixel_aligned, frac1, frac2) = fractional_rects();
    let frac_intersect = intersection(&frac1, &frac2);
    let lm = Transform::rotation_degrees(45.0);

    vec![
        ClipCase::build("rotated-aa", device_bounds())
            .actual().aa().intersect().local_to_device(lm).rect(frac1).rect(frac2).finish_elements()
            .expect().aa().intersect().local_to_device(lm).rect(frac_intersect).finish_elements()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("rotated-nonaa", device_bounds())
            .actual().non_aa().intersect().local_to_device(lm).rect(frac1).rect(frac2).finish_elements()
            .expect().non_aa().intersect().local_to_device(lm).rect(frac_intersect).finish_elements()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("local-aa", device_bounds())
            .actual().intersect().local_to_device(lm)
                .aa().rect(pixel_aligned).non_aa().rect(frac1)
                .finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
    ]
}

/// Two rounded rects with the same AA merge into their conservative intersection.
pub fn rrect_rrect_aa_combine() -> Vec<ClipCase> {
    let r1 = rounded(rect(0.0, 0.0, 12.0, 12.0), 2.0, 2.0);
    let r2 = rounded(rect(6.0, 6.0, 18.0, 18.0), 2.0, 2.0);
    let Some(combined) = RRect::conservative_intersect(&r1, &r2) else {
        return Vec::new();
    };
    let lm = Transform::rotation_degrees(45.0);

    vec![
        ClipCase::build("rrect-aa", device_bounds())
            .actual().aa().intersect().rrect(r1).rrect(r2).finish_elements()
            .expect().aa().intersect().rrect(combined).finish_elements()
            .state(ClipState::DeviceRRect)
            .finish(),
        ClipCase::build("rrect-nonaa", device_bounds())
            .actual().non_aa().intersect().rrect(r1).rrect(r2).finish_elements()
            .expect().non_aa().intersect().rrect(combined).finish_elements()
            .state(ClipState::DeviceRRect)
            .finish(),
        ClipCase::build("rrect-aa+nonaa", device_bounds())
            .actual().intersect().aa().rrect(r1).non_aa().rrect(r2).finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("rrect-local-aa", device_bounds())
            .actual().aa().intersect().local_to_device(lm).rrect(r1).rrect(r2).finish_elements()
            .expect().aa().intersect().local_to_device(lm).rrect(combined).finish_elements()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("rrect-local-nonaa", device_bounds())
            .actual().non_aa().intersect().local_to_device(lm).rrect(r1).rrect(r2).finish_elements()
            .expect().non_aa().intersect().local_to_device(lm).rrect(combined).finish_elements()
            .state(ClipState::Complex)
            .finish(),
    ]
}

/// A rect cutting a rounded rect leaves a rounded rect, or a plain rect when every rounded
/// corner is cut away.
pub fn rect_rrect_combine() -> Vec<ClipCase> {
    let rr = rounded(rect(0.0, 0.0, 10.0, 10.0), 2.0, 2.0);
    let cut_top = rect(-10.0, -10.0, 10.0, 4.0);
    let cut_mid = rect(-10.0, 3.0, 10.0, 7.0);
    let two = Vector::new(2.0, 2.0);
    let cut_rrect = rounded_corners(
        rect(0.0, 0.0, 10.0, 4.0),
        [two, two, Vector::zero(), Vector::zero()],
    );

    vec![
        ClipCase::build("still-rrect", device_bounds())
            .actual().intersect().aa().rrect(rr).rect(cut_top).finish_elements()
            .expect().intersect().aa().rrect(cut_rrect).finish_elements()
            .state(ClipState::DeviceRRect)
            .finish(),
        ClipCase::build("to-rect", device_bounds())
            .actual().intersect().aa().rrect(rr).rect(cut_mid).finish_elements()
            .expect().intersect().aa().rect(rect(0.0, 3.0, 10.0, 7.0)).finish_elements()
            .state(ClipState::DeviceRect)
            .finish(),
        ClipCase::build("rrect-no-combine", device_bounds())
            .actual().intersect().aa().rrect(rr).rect(rect(0.0, 0.0, 1.5, 5.0)).finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
    ]
}

fn crosses_device_edge() -> Rect {
    let device = device_bounds();
    rect(
        20.0,
        device.min.y as f32 - 13.2,
        device.max.x as f32 + 15.5,
        30.0,
    )
}

/// Device-space rects are stored clipped to the device.
pub fn rect_device_clip() -> Vec<ClipCase> {
    let device = device_bounds();
    let crossing = crosses_device_edge();
    let inside = rect(20.0, device.min.y as f32, device.max.x as f32, 30.0);

    vec![
        ClipCase::build("device-aa-rect", device)
            .actual().intersect().aa().rect(crossing).finish_elements()
            .expect().intersect().aa().rect(inside).finish_elements()
            .state(ClipState::DeviceRect)
            .finish(),
        ClipCase::build("device-nonaa-rect", device)
            .actual().intersect().non_aa().rect(crossing).finish_elements()
            .expect().intersect().non_aa().rect(inside).finish_elements()
            .state(ClipState::DeviceRect)
            .finish(),
    ]
}

/// Other shapes keep their geometry, only their bounds are clipped to the device.
pub fn shape_device_bounds_clip() -> Vec<ClipCase> {
    let crossing = crosses_device_edge();

    vec![
        ClipCase::build("device-crossing-rrect", device_bounds())
            .actual().intersect().aa().rrect(rounded(crossing, 4.0, 4.0)).finish_elements()
            .expect_actual()
            .state(ClipState::DeviceRRect)
            .finish(),
        ClipCase::build("device-crossing-path", device_bounds())
            .actual().intersect().aa().path(make_octagon(&crossing)).finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
    ]
}

/// Degenerate paths clip everything away and rectangular paths become rects.
pub fn path_simplify() -> Vec<ClipCase> {
    let r = rect(0.0, 2.0, 10.0, 15.4);
    let empty = PathShape::builder().build();
    let point = PathShape::builder().begin((0.0, 0.0)).build();
    let line = PathShape::builder()
        .begin((0.0, 0.0))
        .line_to((10.0, 5.0))
        .build();
    let rect_path = PathShape::builder()
        .begin((r.min.x, r.min.y))
        .line_to((r.max.x, r.min.y))
        .line_to((r.max.x, r.max.y))
        .line_to((r.min.x, r.max.y))
        .close()
        .build();

    vec![
        ClipCase::build("empty-path", device_bounds())
            .actual().path(empty).finish_elements()
            .state(ClipState::Empty)
            .finish(),
        ClipCase::build("point-path", device_bounds())
            .actual().path(point).finish_elements()
            .state(ClipState::Empty)
            .finish(),
        ClipCase::build("line-path", device_bounds())
            .actual().path(line).finish_elements()
            .state(ClipState::Empty)
            .finish(),
        ClipCase::build("rect-path", device_bounds())
            .actual().path(rect_path).finish_elements()
            .expect().rect(r).finish_elements()
            .state(ClipState::DeviceRect)
            .finish(),
    ]
}

/// Repeating a clip leaves a single element.
pub fn repeat_element() -> Vec<ClipCase> {
    let r = rect(5.3, 62.0, 20.0, 85.0);
    let center = r.center();
    let lm = Transform::translation(-center.x, -center.y)
        .then_rotate_degrees(30.0)
        .then_translate(center.x, center.y);
    let rr = rounded(r, 5.0, 2.5);
    let convex = make_octagon(&r);

    // An hourglass: not convex, and only equal to itself.
    let hourglass = PathShape::builder()
        .begin((0.0, 0.0))
        .line_to((20.0, 20.0))
        .line_to((0.0, 20.0))
        .line_to((20.0, 0.0))
        .close()
        .build();

    vec![
        ClipCase::build("same-rects", device_bounds())
            .actual().rect(r).rect(r).rect(r).finish_elements()
            .expect().rect(r).finish_elements()
            .state(ClipState::DeviceRect)
            .finish(),
        ClipCase::build("same-local-rects", device_bounds())
            .actual().local_to_device(lm).rect(r).rect(r).rect(r).finish_elements()
            .expect().local_to_device(lm).rect(r).finish_elements()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("same-rrects", device_bounds())
            .actual().rrect(rr).rrect(rr).rrect(rr).finish_elements()
            .expect().rrect(rr).finish_elements()
            .state(ClipState::DeviceRRect)
            .finish(),
        ClipCase::build("same-local-rrects", device_bounds())
            .actual().local_to_device(lm)
                .rrect(rr).rrect(rr).rrect(rr)
                .finish_elements()
            .expect().local_to_device(lm).rrect(rr).finish_elements()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("same-convex", device_bounds())
            .actual().path(convex.clone()).path(convex.clone()).finish_elements()
            .expect().path(convex.clone()).finish_elements()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("same-local-convex", device_bounds())
            .actual().local_to_device(lm).path(convex.clone()).path(convex.clone()).finish_elements()
            .expect().local_to_device(lm).path(convex).finish_elements()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("same-path", device_bounds())
            .actual()
                .path(hourglass.clone()).path(hourglass.clone()).path(hourglass.clone())
                .finish_elements()
            .expect().path(hourglass.clone()).finish_elements()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("same-local-path", device_bounds())
            .actual().local_to_device(lm)
                .path(hourglass.clone()).path(hourglass.clone()).path(hourglass.clone())
                .finish_elements()
            .expect().local_to_device(lm).path(hourglass).finish_elements()
            .state(ClipState::Complex)
            .finish(),
    ]
}

/// Inverse fills are stored as regular fills with the opposite op.
pub fn inverse_filled_path() -> Vec<ClipCase> {
    let r = rect(0.0, 0.0, 16.0, 17.0);
    let rect_path = PathShape::builder()
        .begin((r.min.x, r.min.y))
        .line_to((r.max.x, r.min.y))
        .line_to((r.max.x, r.max.y))
        .line_to((r.min.x, r.max.y))
        .close()
        .build();
    let inverse_rect = Shape::path(rect_path).with_inverted(true);
    let complex = make_octagon(&r);
    let inverse_complex = Shape::path(complex.clone()).with_inverted(true);

    vec![
        ClipCase::build("inverse-rect-intersect", device_bounds())
            .actual().aa().intersect().shape(inverse_rect.clone()).finish_elements()
            .expect().aa().difference().rect(r).finish_elements()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("inverse-rect-difference", device_bounds())
            .actual().aa().difference().shape(inverse_rect).finish_elements()
            .expect().aa().intersect().rect(r).finish_elements()
            .state(ClipState::DeviceRect)
            .finish(),
        ClipCase::build("inverse-path-intersect", device_bounds())
            .actual().aa().intersect().shape(inverse_complex.clone()).finish_elements()
            .expect().aa().difference().path(complex.clone()).finish_elements()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("inverse-path-difference", device_bounds())
            .actual().aa().difference().shape(inverse_complex).finish_elements()
            .expect().aa().intersect().path(complex).finish_elements()
            .state(ClipState::Complex)
            .finish(),
    ]
}

/// Offscreen intersects empty the clip and offscreen differences do nothing.
pub fn offscreen() -> Vec<ClipCase> {
    let device = device_bounds();
    let r = rect(
        device.max.x as f32 + 10.0,
        device.min.y as f32 + 20.0,
        device.max.x as f32 + 40.0,
        device.min.y as f32 + 60.0,
    );
    let rr = rounded(r, 5.0, 5.0);
    let path = make_octagon(&r);

    let mut cases = Vec::new();
    for (op, state, prefix) in [
        (ClipOp::Intersect, ClipState::Empty, "intersect"),
        (ClipOp::Difference, ClipState::WideOpen, "difference"),
    ] {
        let shapes = [
            ("rect", Shape::rect(r)),
            ("rrect", Shape::rrect(rr)),
            ("path", Shape::path(path.clone())),
        ];

        let mut combo = ClipCase::build(&format!("{prefix}-combo"), device).actual();
        for (_, shape) in &shapes {
            combo = combo.push(shape.clone(), Transform::identity(), true, op);
        }
        cases.push(combo.finish_elements().state(state).finish());

        for (name, shape) in shapes {
            cases.push(
                ClipCase::build(&format!("{prefix}-{name}"), device)
                    .actual()
                    .push(shape, Transform::identity(), true, op)
                    .finish_elements()
                    .state(state)
                    .finish(),
            );
        }
    }
    cases
}

/// Empty shapes change the state without adding an element.
pub fn empty_shape() -> Vec<ClipCase> {
    let rr = rounded(rect(4.0, 10.0, 16.0, 32.0), 2.0, 2.0);

    vec![
        ClipCase::build("empty-intersect", device_bounds())
            .actual().intersect().rect(Rect::zero()).finish_elements()
            .state(ClipState::Empty)
            .finish(),
        ClipCase::build("empty-difference", device_bounds())
            .actual().difference().rect(Rect::zero()).finish_elements()
            .state(ClipState::WideOpen)
            .finish(),
        ClipCase::build("noop-difference", device_bounds())
            .actual().difference().rrect(rr).rect(Rect::zero()).finish_elements()
            .expect().difference().rrect(rr).finish_elements()
            .state(ClipState::Complex)
            .finish(),
    ]
}

/// A difference that cuts a whole side of the device shrinks the bounds.
pub fn difference_bounds() -> Vec<ClipCase> {
    let device = device_bounds();
    let right_side = rect(
        50.0,
        -10.0,
        2.0 * device.max.x as f32,
        device.max.y as f32 + 10.0,
    );
    let clipped = intersection(&right_side, &irect_to_rect(&device));

    vec![ClipCase::build("difference-cut", device)
        .actual().non_aa().difference().rect(right_side).finish_elements()
        .expect().non_aa().difference().rect(clipped).finish_elements()
        .state(ClipState::Complex)
        .finish()]
}

/// Intersects merge across a difference recorded between them.
pub fn no_difference_interference() -> Vec<ClipCase> {
    let int_r1 = rect(0.0, 0.0, 30.0, 30.0);
    let int_r2 = rect(15.0, 15.0, 45.0, 45.0);
    let int_combo = rect(15.0, 15.0, 30.0, 30.0);
    let diff = rect(20.0, 6.0, 50.0, 50.0);
    let id = Transform::identity();

    vec![ClipCase::build("cross-diff-combine", device_bounds())
        .actual()
            .push(Shape::rect(int_r1), id, true, ClipOp::Intersect)
            .push(Shape::rect(diff), id, true, ClipOp::Difference)
            .push(Shape::rect(int_r2), id, true, ClipOp::Intersect)
            .finish_elements()
        .expect()
            .push(Shape::rect(int_combo), id, true, ClipOp::Intersect)
            .push(Shape::rect(diff), id, true, ClipOp::Difference)
            .finish_elements()
        .state(ClipState::Complex)
        .finish()]
}

/// Paths are all recorded, enough of them to outgrow any inline storage.
pub fn multiple_paths() -> Vec<ClipCase> {
    const NUM_OPS: usize = 16;
    let device = device_bounds();
    let id = Transform::identity();

    let mut difference = ClipCase::build("many-paths-difference", device).actual();
    let mut d = rect(0.0, 0.0, 12.0, 12.0);
    for _ in 0..NUM_OPS {
        difference = difference.push(
            Shape::path(make_octagon(&d)),
            id,
            false,
            ClipOp::Difference,
        );
        d = offset(&d, 15.0, 0.0);
        if d.max.x > device.max.x as f32 {
            d = offset(&rect(0.0, d.min.y, 12.0, d.max.y), 0.0, 15.0);
        }
    }

    let mut intersect = ClipCase::build("many-paths-intersect", device).actual();
    let mut d = rect(0.0, 0.0, 12.0, 12.0);
    for _ in 0..NUM_OPS {
        intersect = intersect.push(Shape::path(make_octagon(&d)), id, true, ClipOp::Intersect);
        d = offset(&d, 0.01, 0.01);
    }

    vec![
        difference
            .finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
        intersect
            .finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
    ]
}

/// A lone axis-aligned intersect rect is a device rect, anything else is complex.
pub fn device_rect() -> Vec<ClipCase> {
    let r = rect(0.0, 0.0, 20.0, 20.0);
    let lm = Transform::rotation_degrees(15.0);

    vec![
        ClipCase::build("device-rect", device_bounds())
            .actual().intersect().aa().rect(r).finish_elements()
            .expect_actual()
            .state(ClipState::DeviceRect)
            .finish(),
        ClipCase::build("unaligned-rect", device_bounds())
            .actual().local_to_device(lm).intersect().aa().rect(r).finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("diff-rect", device_bounds())
            .actual().difference().aa().rect(r).finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
    ]
}

/// A lone axis-aligned intersect rounded rect is a device rrect, anything else is complex.
pub fn device_rrect() -> Vec<ClipCase> {
    let rr = rounded(rect(0.0, 0.0, 20.0, 20.0), 5.0, 5.0);
    let lm = Transform::rotation_degrees(15.0);

    vec![
        ClipCase::build("device-rrect", device_bounds())
            .actual().intersect().aa().rrect(rr).finish_elements()
            .expect_actual()
            .state(ClipState::DeviceRRect)
            .finish(),
        ClipCase::build("unaligned-rrect", device_bounds())
            .actual().local_to_device(lm).intersect().aa().rrect(rr).finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("diff-rrect", device_bounds())
            .actual().difference().aa().rrect(rr).finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
    ]
}

fn folded_transform_cases(prefix: &str, lm: Transform) -> Vec<ClipCase> {
    let r = rect(0.0, 0.0, 10.0, 10.0);
    let local_rrect = rounded(r, 2.0, 2.0);
    let id = Transform::identity();
    let mut cases = vec![ClipCase::build(&format!("{prefix}+rect"), device_bounds())
        .actual().push(Shape::rect(r), lm, true, ClipOp::Intersect).finish_elements()
        .expect().push(Shape::rect(lm.map_rect(&r)), id, true, ClipOp::Intersect).finish_elements()
        .state(ClipState::DeviceRect)
        .finish()];

    if let Some(device_rrect) = local_rrect.transform(&lm) {
        cases.push(
            ClipCase::build(&format!("{prefix}+rrect"), device_bounds())
                .actual().push(Shape::rrect(local_rrect), lm, true, ClipOp::Intersect).finish_elements()
                .expect().push(Shape::rrect(device_rrect), id, true, ClipOp::Intersect).finish_elements()
                .state(ClipState::DeviceRRect)
                .finish(),
        );
    }

    cases.push(
        ClipCase::build(&format!("{prefix}+path"), device_bounds())
            .actual().intersect().local_to_device(lm).path(make_octagon(&r)).finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
    );
    cases
}

/// Scale+translate transforms are folded into rect and rrect geometry, never into paths.
pub fn scale_translate() -> Vec<ClipCase> {
    folded_transform_cases("st", Transform::scale(2.0, 4.0).then_translate(15.5, 14.3))
}

/// Quarter turns keep rects axis aligned, so they are folded too.
pub fn preserve_axis_alignment() -> Vec<ClipCase> {
    folded_transform_cases(
        "r90",
        Transform::rotation_degrees(90.0).then_translate(15.5, 14.3),
    )
}

/// A convex path can contain a rect or rounded rect.
pub fn convex_path_contains() -> Vec<ClipCase> {
    let r = rect(15.0, 15.0, 30.0, 30.0);
    let rr = rounded(r, 5.0, 5.0);
    let big = make_octagon_with(&outset(&r, 10.0), 5.0, 5.0);

    vec![
        ClipCase::build("convex+rect-intersect", device_bounds())
            .actual().aa().intersect().rect(r).path(big.clone()).finish_elements()
            .expect().aa().intersect().rect(r).finish_elements()
            .state(ClipState::DeviceRect)
            .finish(),
        ClipCase::build("convex+rrect-intersect", device_bounds())
            .actual().aa().intersect().rrect(rr).path(big.clone()).finish_elements()
            .expect().aa().intersect().rrect(rr).finish_elements()
            .state(ClipState::DeviceRRect)
            .finish(),
        ClipCase::build("convex+rect-difference", device_bounds())
            .actual().aa().difference().rect(r).path(big.clone()).finish_elements()
            .expect().aa().difference().path(big.clone()).finish_elements()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("convex+rrect-difference", device_bounds())
            .actual().aa().difference().rrect(rr).path(big.clone()).finish_elements()
            .expect().aa().difference().path(big.clone()).finish_elements()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("convex-diff+rect-int", device_bounds())
            .actual().aa().intersect().rect(r).difference().path(big.clone()).finish_elements()
            .state(ClipState::Empty)
            .finish(),
        ClipCase::build("convex-diff+rrect-int", device_bounds())
            .actual().aa().intersect().rrect(rr).difference().path(big.clone()).finish_elements()
            .state(ClipState::Empty)
            .finish(),
        ClipCase::build("convex-int+rect-diff", device_bounds())
            .actual().aa().intersect().path(big.clone()).difference().rect(r).finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("convex-int+rrect-diff", device_bounds())
            .actual().aa().intersect().path(big).difference().rrect(rr).finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
    ]
}

/// Rects and rrects in different rotated spaces merge when one contains the other.
pub fn non_axis_aligned_contains() -> Vec<ClipCase> {
    let lm1 = Transform::rotation_degrees(45.0);
    let big_r = rect(-20.0, -20.0, 20.0, 20.0);
    let big = [
        ("rect", Shape::rect(big_r)),
        ("rrect", Shape::rrect(rounded(big_r, 1.0, 1.0))),
    ];
    let lm2 = Transform::rotation_degrees(-45.0);
    let small_r = rect(-10.0, -10.0, 10.0, 10.0);
    let small = [
        ("rect", Shape::rect(small_r)),
        ("rrect", Shape::rrect(rounded(small_r, 1.0, 1.0))),
    ];

    let (i, d) = (ClipOp::Intersect, ClipOp::Difference);
    let mut cases = Vec::new();
    for (big_name, big_shape) in &big {
        for (small_name, small_shape) in &small {
            let build = |suffix: &str| {
                ClipCase::build(&format!("{big_name}-{small_name}-{suffix}"), device_bounds())
            };

            // Two intersects keep the smaller shape.
            cases.push(
                build("ii")
                    .actual()
                        .push(big_shape.clone(), lm1, true, i)
                        .push(small_shape.clone(), lm2, true, i)
                        .finish_elements()
                    .expect().push(small_shape.clone(), lm2, true, i).finish_elements()
                    .state(ClipState::Complex)
                    .finish(),
            );
            // Two differences keep the larger.
            cases.push(
                build("dd")
                    .actual()
                        .push(big_shape.clone(), lm1, true, d)
                        .push(small_shape.clone(), lm2, true, d)
                        .finish_elements()
                    .expect().push(big_shape.clone(), lm1, true, d).finish_elements()
                    .state(ClipState::Complex)
                    .finish(),
            );
            cases.push(
                build("di")
                    .actual()
                        .push(big_shape.clone(), lm1, true, d)
                        .push(small_shape.clone(), lm2, true, i)
                        .finish_elements()
                    .state(ClipState::Empty)
                    .finish(),
            );
            cases.push(
                build("id")
                    .actual()
                        .push(big_shape.clone(), lm1, true, i)
                        .push(small_shape.clone(), lm2, true, d)
                        .finish_elements()
                    .expect_actual()
                    .state(ClipState::Complex)
                    .finish(),
            );
        }
    }
    cases
}

/// A non-AA shape well inside an AA one (or the reverse) replaces it.
pub fn mixed_aa_contains() -> Vec<ClipCase> {
    let lm1 = Transform::rotation_degrees(45.0);
    let r1 = Shape::rect(rect(-20.0, -20.0, 20.0, 20.0));
    let lm2 = Transform::rotation_degrees(-45.0);
    let r2 = Shape::rect(rect(-10.0, -10.0, 10.0, 10.0));
    let i = ClipOp::Intersect;

    vec![
        ClipCase::build("mixed-outeraa-combine", device_bounds())
            .actual().push(r1.clone(), lm1, true, i).push(r2.clone(), lm2, false, i).finish_elements()
            .expect().push(r2.clone(), lm2, false, i).finish_elements()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("mixed-inneraa-combine", device_bounds())
            .actual().push(r1, lm1, false, i).push(r2.clone(), lm2, true, i).finish_elements()
            .expect().push(r2, lm2, true, i).finish_elements()
            .state(ClipState::Complex)
            .finish(),
    ]
}

/// Shapes covering the whole device leave the clip wide open, or empty it when subtracted.
pub fn shape_contains_device() -> Vec<ClipCase> {
    let r = outset(&irect_to_rect(&device_bounds()), 10.0);
    let shapes = [
        ("rect", Shape::rect(r)),
        ("rrect", Shape::rrect(rounded(r, 10.0, 10.0))),
        ("convex", Shape::path(make_octagon_with(&r, 10.0, 10.0))),
    ];

    let mut cases = Vec::new();
    for (op, state, suffix) in [
        (ClipOp::Intersect, ClipState::WideOpen, "intersect"),
        (ClipOp::Difference, ClipState::Empty, "difference"),
    ] {
        for (name, shape) in &shapes {
            cases.push(
                ClipCase::build(&format!("{name}-{suffix}"), device_bounds())
                    .actual()
                    .push(shape.clone(), Transform::identity(), false, op)
                    .finish_elements()
                    .state(state)
                    .finish(),
            );
        }
    }
    cases
}

/// Disjoint intersects empty the clip, disjoint differences are all kept, and a difference
/// outside the intersected area is dropped.
pub fn disjoint_shapes() -> Vec<ClipCase> {
    let rt = rect(10.0, 10.0, 20.0, 20.0);
    let rr = oval(offset(&rt, 20.0, 0.0));
    let p = make_octagon(&offset(&rt, 0.0, 20.0));

    vec![
        ClipCase::build("iii", device_bounds())
            .actual().aa().intersect().rect(rt).rrect(rr).path(p.clone()).finish_elements()
            .state(ClipState::Empty)
            .finish(),
        ClipCase::build("ddd", device_bounds())
            .actual().non_aa().difference().rect(rt).rrect(rr).path(p.clone()).finish_elements()
            .expect_actual()
            .state(ClipState::Complex)
            .finish(),
        ClipCase::build("idd", device_bounds())
            .actual()
                .aa().intersect().rect(rt)
                .non_aa().difference().rrect(rr).path(p.clone())
                .finish_elements()
            .expect().aa().intersect().rect(rt).finish_elements()
            .state(ClipState::DeviceRect)
            .finish(),
        ClipCase::build("did", device_bounds())
            .actual()
                .aa().intersect().rrect(rr)
                .non_aa().difference().rect(rt).path(p.clone())
                .finish_elements()
            .expect().aa().intersect().rrect(rr).finish_elements()
            .state(ClipState::DeviceRRect)
            .finish(),
        ClipCase::build("ddi", device_bounds())
            .actual()
                .aa().intersect().path(p.clone())
                .non_aa().difference().rect(rt).rrect(rr)
                .finish_elements()
            .expect().aa().intersect().path(p).finish_elements()
            .state(ClipState::Complex)
            .finish(),
    ]
}

/// Four overlapping quadrants, each intersected or subtracted, as rects or convex paths.
pub fn complex_clip() -> Vec<ClipCase> {
    const N: f32 = 10.0;
    const R: f32 = N / 3.0;
    let quadrants = [
        rect(0.0, 0.0, 2.0 * N, 2.0 * N),
        rect(N, 0.0, 3.0 * N, 2.0 * N),
        rect(0.0, N, 2.0 * N, 3.0 * N),
        rect(N, N, 3.0 * N, 3.0 * N),
    ];
    let id = Transform::identity();

    let mut cases = Vec::new();
    for op_bits in 6..16 {
        let op_for = |i: usize| {
            if op_bits & (1 << i) != 0 {
                ClipOp::Intersect
            } else {
                ClipOp::Difference
            }
        };

        // Differences are shrunk so they never remove the whole intersection.
        let mut rects = ClipCase::build(&format!("complex-rect-{op_bits}"), device_bounds());
        let mut expected_intersection = irect_to_rect(&device_bounds());
        let mut differences = Vec::new();
        let mut actual = rects.actual();
        for (i, quadrant) in quadrants.iter().enumerate() {
            let op = op_for(i);
            let r = match op {
                ClipOp::Intersect => *quadrant,
                ClipOp::Difference => quadrant.inflate(-R, -R),
            };
            actual = actual.push(Shape::rect(r), id, true, op);
            match op {
                ClipOp::Intersect => expected_intersection = intersection(&expected_intersection, &r),
                ClipOp::Difference => differences.push(r),
            }
        }
        rects = actual.finish_elements();
        let mut expect = rects.expect();
        for r in differences {
            expect = expect.push(Shape::rect(r), id, true, ClipOp::Difference);
        }
        expect = expect.push(Shape::rect(expected_intersection), id, true, ClipOp::Intersect);
        let state = if op_bits == 0xf {
            ClipState::DeviceRect
        } else {
            ClipState::Complex
        };
        cases.push(expect.finish_elements().state(state).finish());

        let mut convex = ClipCase::build(&format!("complex-convex-{op_bits}"), device_bounds()).actual();
        for (i, quadrant) in quadrants.iter().enumerate() {
            convex = convex.push(
                Shape::path(make_octagon_with(quadrant, R, R)),
                id,
                true,
                op_for(i),
            );
        }
        cases.push(
            convex
                .finish_elements()
                .expect_actual()
                .state(ClipState::Complex)
                .finish(),
        );
    }
    cases
}
