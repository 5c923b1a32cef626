use grafo_clip::{PathShape, Rect};

/// A convex octagon inscribed in `r`, with the corners cut `lr` in from the left and right
/// edges and `tb` in from the top and bottom edges.
pub fn make_octagon_with(r: &Rect, lr: f32, tb: f32) -> PathShape {
    PathShape::builder()
        .begin((r.min.x + lr, r.min.y))
        .line_to((r.max.x - lr, r.min.y))
        .line_to((r.max.x, r.min.y + tb))
        .line_to((r.max.x, r.max.y - tb))
        .line_to((r.max.x - lr, r.max.y))
        .line_to((r.min.x + lr, r.max.y))
        .line_to((r.min.x, r.max.y - tb))
        .line_to((r.min.x, r.min.y + tb))
        .close()
        .build()
}

/// An octagon with its corners cut at 30% of the width and height.
pub fn make_octagon(r: &Rect) -> PathShape {
    make_octagon_with(r, 0.3 * r.width(), 0.3 * r.height())
}
