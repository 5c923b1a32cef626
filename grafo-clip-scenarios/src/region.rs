use grafo_clip::{irect, IRect};

/// A set of pixels inside fixed device bounds, used to compute the tightest bounds a clip can
/// have.
pub struct PixelRegion {
    device: IRect,
    covered: Vec<bool>,
}

impl PixelRegion {
    /// A region covering every pixel of `device`.
    pub fn new(device: IRect) -> Self {
        let count = (device.width().max(0) * device.height().max(0)) as usize;
        Self {
            device,
            covered: vec![true; count],
        }
    }

    /// Keeps only the pixels inside `r`.
    pub fn intersect(&mut self, r: &IRect) {
        self.apply(r, |inside, covered| inside && covered);
    }

    /// Removes the pixels inside `r`.
    pub fn difference(&mut self, r: &IRect) {
        self.apply(r, |inside, covered| !inside && covered);
    }

    /// Bounds of the covered pixels, or the zero rect when nothing is covered.
    pub fn bounds(&self) -> IRect {
        let mut bounds: Option<IRect> = None;
        for (x, y) in self.pixels().filter(|&(x, y)| self.covered[self.index(x, y)]) {
            let pixel = irect(x, y, x + 1, y + 1);
            bounds = Some(match bounds {
                Some(b) => b.union(&pixel),
                None => pixel,
            });
        }
        bounds.unwrap_or_else(IRect::zero)
    }

    fn apply(&mut self, r: &IRect, op: impl Fn(bool, bool) -> bool) {
        let pixels: Vec<(i32, i32)> = self.pixels().collect();
        for (x, y) in pixels {
            let inside = x >= r.min.x && x < r.max.x && y >= r.min.y && y < r.max.y;
            let index = self.index(x, y);
            self.covered[index] = op(inside, self.covered[index]);
        }
    }

    fn pixels(&self) -> impl Iterator<Item = (i32, i32)> {
        let device = self.device;
        (device.min.y..device.max.y).flat_map(move |y| (device.min.x..device.max.x).map(move |x| (x, y)))
    }

    fn index(&self, x: i32, y: i32) -> usize {
        let width = self.device.width();
        ((y - self.device.min.y) * width + (x - self.device.min.x)) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difference_that_cuts_a_side_shrinks_bounds() {
        let mut region = PixelRegion::new(irect(0, 0, 10, 10));
        region.difference(&irect(5, -2, 12, 12));
        assert_eq!(region.bounds(), irect(0, 0, 5, 10));

        region.difference(&irect(2, 2, 3, 3));
        assert_eq!(region.bounds(), irect(0, 0, 5, 10));

        region.intersect(&irect(20, 20, 30, 30));
        assert_eq!(region.bounds(), IRect::zero());
    }
}
