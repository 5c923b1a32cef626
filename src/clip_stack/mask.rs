use crate::geometry::IRect;

/// Identifies a coverage mask rendered for one version of the clip.
///
/// A mask is only valid while the save record that produced it keeps the same gen ID. Keys are
/// handed back through [`ClipStack::take_invalidated_masks`](crate::ClipStack::take_invalidated_masks)
/// once that stops being true, so the renderer can drop whatever it cached under them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaskKey {
    gen_id: u32,
    bounds: IRect,
}

impl MaskKey {
    pub(crate) fn new(gen_id: u32, bounds: IRect) -> Self {
        Self { gen_id, bounds }
    }

    #[inline]
    pub fn gen_id(&self) -> u32 {
        self.gen_id
    }

    /// Device-space pixel bounds the mask was rendered for.
    #[inline]
    pub fn bounds(&self) -> &IRect {
        &self.bounds
    }

    /// A mask covering a larger area holds the same clip for any draw inside it.
    pub fn applies_to(&self, gen_id: u32, draw_bounds: &IRect) -> bool {
        self.gen_id == gen_id && self.bounds.contains_box(draw_bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::irect;

    #[test]
    fn larger_mask_serves_smaller_draws() {
        let key = MaskKey::new(7, irect(0, 0, 50, 50));
        assert!(key.applies_to(7, &irect(10, 10, 20, 20)));
        assert!(key.applies_to(7, &irect(0, 0, 50, 50)));
        assert!(!key.applies_to(7, &irect(40, 40, 60, 60)));
        assert!(!key.applies_to(8, &irect(10, 10, 20, 20)));
    }
}
