//! The clip stack.
//!
//! [`ClipStack`] tracks the clip produced by nested `save`/`clip_*`/`restore` calls as a list of
//! canonical [`Element`]s plus a per-save summary (bounds, op and a [`ClipState`]). Every new clip
//! is first compared against that summary and then against each active element, so redundant
//! clips are dropped, clips made redundant are retired, and compatible rects and round rects are
//! merged into one element.
//!
//! Saves are deferred: a save only materializes a record once something inside it actually
//! changes the clip.

mod element;
mod mask;
mod save_record;
mod transformed_shape;
mod types;

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

pub use mask::MaskKey;
pub use types::{ClipOp, ClipStackOptions, ClipState, Element, PreClipResult};

use crate::geometry::{self, pixel_bounds, BoundsType, IRect, Rect};
#[cfg(feature = "clip_metrics")]
use crate::metrics::ClipStackMetrics;
use crate::rrect::RRect;
use crate::shader::ClipShader;
use crate::shape::{PathShape, Shape};
use crate::transform::Transform;

use element::RawElement;
use save_record::{ElementStack, MaskStack, SaveRecord, WIDE_OPEN_GEN_ID};
use transformed_shape::{SimplifyResult, TransformedShape};

/// First gen ID handed out; lower values are reserved for invalid, empty and wide-open clips.
const FIRST_GEN_ID: u32 = WIDE_OPEN_GEN_ID + 1;

/// Nested clip state for one render target.
///
/// # Examples
///
/// ```rust
/// use grafo_clip::{irect, rect, ClipOp, ClipStack, ClipState, Transform};
///
/// let mut stack = ClipStack::new(irect(0, 0, 100, 100));
/// stack.save();
/// stack.clip_rect(&Transform::identity(), rect(10.0, 10.0, 50.0, 50.0), true, ClipOp::Intersect);
/// assert_eq!(stack.state(), ClipState::DeviceRect);
/// assert_eq!(stack.conservative_bounds(), irect(10, 10, 50, 50));
///
/// stack.restore();
/// assert_eq!(stack.state(), ClipState::WideOpen);
/// ```
#[derive(Debug)]
pub struct ClipStack {
    device: IRect,
    device_rect: Rect,
    options: ClipStackOptions,
    /// The top of the save stack. Always present, so the stack is never empty.
    current: SaveRecord,
    /// Records below `current`, oldest first.
    saves: SmallVec<[SaveRecord; 1]>,
    elements: ElementStack,
    masks: MaskStack,
    next_gen_id: u32,
    invalidated_masks: Vec<MaskKey>,
    #[cfg(feature = "clip_metrics")]
    metrics: ClipStackMetrics,
}

impl ClipStack {
    /// Creates a wide-open stack for a device with the given pixel bounds.
    pub fn new(device_bounds: IRect) -> Self {
        Self::with_options(device_bounds, ClipStackOptions::default())
    }

    pub fn with_options(device_bounds: IRect, options: ClipStackOptions) -> Self {
        let device_rect = geometry::irect_to_rect(&device_bounds);
        Self {
            device: device_bounds,
            device_rect,
            options,
            current: SaveRecord::new(&device_rect),
            saves: SmallVec::new(),
            elements: ElementStack::new(),
            masks: MaskStack::new(),
            next_gen_id: FIRST_GEN_ID,
            invalidated_masks: Vec::new(),
            #[cfg(feature = "clip_metrics")]
            metrics: ClipStackMetrics::default(),
        }
    }

    pub fn options(&self) -> &ClipStackOptions {
        &self.options
    }

    pub fn save(&mut self) {
        self.current.push_save();
    }

    /// Undoes everything since the matching [`save`](Self::save).
    pub fn restore(&mut self) {
        if self.current.pop_save() {
            // The save never changed anything.
            #[cfg(feature = "clip_metrics")]
            {
                self.metrics.deferred_saves_elided += 1;
            }
            return;
        }

        let Some(prior) = self.saves.pop() else {
            warn!("ClipStack::restore called without a matching save");
            return;
        };
        self.current.remove_elements(&mut self.elements);
        self.invalidate_current_masks();
        self.current = prior;
        // Elements that only the popped record had invalidated apply again.
        self.current.restore_elements(&mut self.elements);
        trace!(state = %self.current.state(), "restored clip");
    }

    /// Intersects or subtracts `shape`, given in the space described by `local_to_device`.
    pub fn clip_shape(&mut self, local_to_device: &Transform, shape: Shape, aa: bool, op: ClipOp) {
        #[cfg(feature = "clip_metrics")]
        {
            self.metrics.clip_calls += 1;
        }

        if self.current.state() == ClipState::Empty {
            return;
        }

        let element = RawElement::new(
            &self.device_rect,
            *local_to_device,
            shape,
            aa,
            op,
            self.options.force_aa,
        );
        // Subtracting nothing is a no-op. Intersecting with nothing empties the clip, which
        // still has to be recorded.
        if element.shape().is_empty() && element.op() == ClipOp::Difference {
            trace!("skipping empty difference clip");
            self.count_discarded();
            return;
        }

        let was_deferred = self.writable_save_record();
        if self.current.add_element(element, &mut self.elements) {
            let gen_id = self.next_gen_id();
            self.current.set_gen_id(gen_id);
            if !was_deferred {
                // The record's geometry changed, so masks rendered for it are stale.
                self.invalidate_current_masks();
            }
            #[cfg(feature = "clip_metrics")]
            {
                self.metrics.elements_added += 1;
            }
            trace!(state = %self.current.state(), gen_id, "clip element added");
        } else {
            if was_deferred {
                // Nothing changed, so the save can go back to being deferred.
                if let Some(prior) = self.saves.pop() {
                    self.current = prior;
                    self.current.push_save();
                }
            }
            self.count_discarded();
            trace!("clip element does not change the clip");
        }
    }

    pub fn clip_rect(&mut self, local_to_device: &Transform, rect: Rect, aa: bool, op: ClipOp) {
        self.clip_shape(local_to_device, Shape::rect(rect), aa, op);
    }

    pub fn clip_rrect(&mut self, local_to_device: &Transform, rrect: RRect, aa: bool, op: ClipOp) {
        self.clip_shape(local_to_device, Shape::rrect(rrect), aa, op);
    }

    /// Clips to a path. Use [`clip_shape`](Self::clip_shape) with an inverted shape for an
    /// inverse fill.
    pub fn clip_path(&mut self, local_to_device: &Transform, path: PathShape, aa: bool, op: ClipOp) {
        self.clip_shape(local_to_device, Shape::path(path), aa, op);
    }

    /// Multiplies the clip's coverage by `shader`. Geometry, gen ID and masks are unaffected.
    pub fn clip_shader(&mut self, shader: ClipShader) {
        if self.current.state() == ClipState::Empty {
            return;
        }
        self.writable_save_record();
        self.current.add_shader(shader);
    }

    /// Replaces the clip of the current save level with a device-space rectangle.
    pub fn replace_clip(&mut self, rect: IRect) {
        let was_deferred = self.writable_save_record();
        if !was_deferred {
            self.current.remove_elements(&mut self.elements);
            self.invalidate_current_masks();
        }

        self.current.reset(&self.device_rect);
        if rect != self.device {
            self.clip_rect(
                &Transform::identity(),
                geometry::irect_to_rect(&rect),
                false,
                ClipOp::Intersect,
            );
        }
    }

    #[inline]
    pub fn state(&self) -> ClipState {
        self.current.state()
    }

    #[inline]
    pub fn device_bounds(&self) -> IRect {
        self.device
    }

    /// Identifies the current clip geometry. Two equal IDs from the same stack mean the same
    /// clip; 1 is always the empty clip and 2 the wide-open clip.
    #[inline]
    pub fn gen_id(&self) -> u32 {
        self.current.gen_id()
    }

    #[inline]
    pub fn shader(&self) -> Option<&ClipShader> {
        self.current.shader()
    }

    /// Number of `save` calls without a matching `restore`.
    pub fn save_count(&self) -> usize {
        let deferred: usize = self
            .saves
            .iter()
            .chain(std::iter::once(&self.current))
            .map(|record| record.deferred_saves() as usize)
            .sum();
        self.saves.len() + deferred
    }

    /// Pixel bounds that contain everything the clip lets through.
    pub fn conservative_bounds(&self) -> IRect {
        match self.current.state() {
            ClipState::Empty => IRect::zero(),
            ClipState::WideOpen => self.device,
            _ => {
                let bounds = match self.current.op() {
                    // The record's bounds describe what is cut out. Only holes that cut off a
                    // whole side of the device shrink what remains.
                    ClipOp::Difference => {
                        geometry::subtract(&self.device_rect, self.current.inner_bounds(), true)
                    }
                    ClipOp::Intersect => *self.current.outer_bounds(),
                };
                pixel_bounds(&bounds, true, BoundsType::Exterior)
                    .intersection(&self.device)
                    .unwrap_or_else(IRect::zero)
            }
        }
    }

    /// The active elements, newest first. Empty when the clip is empty or wide open.
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        let active = match self.current.state() {
            ClipState::Empty | ClipState::WideOpen => &self.elements[..0],
            _ => {
                let start = self.current.oldest_valid_index().min(self.elements.len());
                &self.elements[start..]
            }
        };
        active
            .iter()
            .rev()
            .filter(|e| !e.is_invalid())
            .map(RawElement::element)
    }

    /// Decides how a draw covering `draw_bounds` (in device space) is affected by the clip.
    pub fn pre_apply(&self, draw_bounds: &Rect, aa: bool) -> PreClipResult {
        let aa = aa || self.options.force_aa;
        let Some(pixels) = pixel_bounds(draw_bounds, aa, BoundsType::Exterior).intersection(&self.device)
        else {
            return PreClipResult::ClippedOut;
        };

        match self.current.state() {
            ClipState::Empty => return PreClipResult::ClippedOut,
            ClipState::WideOpen => return PreClipResult::Unclipped,
            _ => {}
        }

        // Draws are slightly shrunk so that edges sitting exactly on a clip edge count as inside.
        let inset = geometry::outset(draw_bounds, -geometry::BOUNDS_TOLERANCE);
        let shape = if geometry::is_empty(&inset) {
            Shape::rect(*draw_bounds)
        } else {
            Shape::rect(inset)
        };
        let identity = Transform::identity();
        let outer = geometry::irect_to_rect(&pixels);
        let inner = geometry::empty_rect();
        let draw = TransformedShape {
            local_to_device: &identity,
            device_to_local: &identity,
            shape: &shape,
            outer: &outer,
            inner: &inner,
            op: ClipOp::Intersect,
            aa,
            contains_checks_only_bounds: true,
        };

        match self.current.simplify_against(&draw) {
            SimplifyResult::Empty => PreClipResult::ClippedOut,
            SimplifyResult::BOnly => {
                if self.current.shader().is_some() {
                    PreClipResult::Clipped
                } else {
                    PreClipResult::Unclipped
                }
            }
            SimplifyResult::AOnly | SimplifyResult::Both => self.single_element_clip(),
        }
    }

    /// The clip as a single device-space round rect, when it is one.
    fn single_element_clip(&self) -> PreClipResult {
        let top = self.elements.last().map(RawElement::element);
        match (self.current.state(), top) {
            (ClipState::DeviceRect, Some(element)) => match element.shape.as_rect() {
                Some(r) => PreClipResult::ClippedToRRect {
                    rrect: RRect::from_rect(*r),
                    aa: element.aa,
                },
                None => PreClipResult::Clipped,
            },
            (ClipState::DeviceRRect, Some(element)) => match element.shape.as_rrect() {
                Some(rrect) => PreClipResult::ClippedToRRect {
                    rrect: *rrect,
                    aa: element.aa,
                },
                None => PreClipResult::Clipped,
            },
            _ => PreClipResult::Clipped,
        }
    }

    /// Registers a coverage mask rendered for the current clip over `draw_bounds`. Returns
    /// `None` when the clip is empty or wide open and no mask is needed. Recording the same
    /// mask twice returns the key already registered.
    pub fn record_mask(&mut self, draw_bounds: IRect) -> Option<MaskKey> {
        match self.current.state() {
            ClipState::Empty | ClipState::WideOpen => None,
            _ => {
                let key = MaskKey::new(self.current.gen_id(), draw_bounds);
                if self.masks.contains(&key) {
                    return Some(key);
                }
                self.masks.push(key);
                debug_assert!(self.masks.len() > self.current.start_mask_index());
                Some(key)
            }
        }
    }

    /// Finds a registered mask that can clip a draw with the given pixel bounds.
    pub fn find_mask(&self, draw_bounds: &IRect) -> Option<MaskKey> {
        let gen_id = self.current.gen_id();
        self.masks
            .iter()
            .rev()
            .find(|key| key.applies_to(gen_id, draw_bounds))
            .copied()
    }

    /// Keys of masks that no longer match any clip, oldest first.
    pub fn take_invalidated_masks(&mut self) -> Vec<MaskKey> {
        std::mem::take(&mut self.invalidated_masks)
    }

    #[cfg(feature = "clip_metrics")]
    pub fn metrics(&self) -> &ClipStackMetrics {
        &self.metrics
    }

    /// Makes sure the top record can be modified, materializing a deferred save if there is one.
    /// Returns true if a record was materialized.
    fn writable_save_record(&mut self) -> bool {
        if self.current.can_be_updated() {
            return false;
        }

        let undeferred = self.current.pop_save();
        debug_assert!(undeferred);
        let next = SaveRecord::from_prior(&self.current, self.masks.len(), self.elements.len());
        let prior = std::mem::replace(&mut self.current, next);
        self.saves.push(prior);
        #[cfg(feature = "clip_metrics")]
        {
            self.metrics.records_materialized += 1;
        }
        true
    }

    fn invalidate_current_masks(&mut self) {
        #[cfg(feature = "clip_metrics")]
        let before = self.invalidated_masks.len();
        self.current
            .invalidate_masks(&mut self.masks, &mut self.invalidated_masks);
        #[cfg(feature = "clip_metrics")]
        {
            self.metrics.masks_invalidated += (self.invalidated_masks.len() - before) as u32;
        }
    }

    fn next_gen_id(&mut self) -> u32 {
        let id = self.next_gen_id;
        self.next_gen_id = self.next_gen_id.wrapping_add(1);
        if self.next_gen_id < FIRST_GEN_ID {
            debug!("clip gen IDs wrapped around");
            self.next_gen_id = FIRST_GEN_ID;
        }
        id
    }

    fn count_discarded(&mut self) {
        #[cfg(feature = "clip_metrics")]
        {
            self.metrics.elements_discarded += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{irect, rect};
    use crate::shader::ConstantCoverage;

    fn stack() -> ClipStack {
        ClipStack::new(irect(0, 0, 100, 100))
    }

    fn clip(stack: &mut ClipStack, r: Rect, op: ClipOp) {
        stack.clip_rect(&Transform::identity(), r, true, op);
    }

    #[test]
    fn new_stack_is_wide_open() {
        let stack = stack();
        assert_eq!(stack.state(), ClipState::WideOpen);
        assert_eq!(stack.gen_id(), WIDE_OPEN_GEN_ID);
        assert_eq!(stack.conservative_bounds(), irect(0, 0, 100, 100));
        assert_eq!(stack.elements().count(), 0);
        assert_eq!(stack.save_count(), 0);
    }

    #[test]
    fn save_without_clip_stays_deferred() {
        let mut stack = stack();
        stack.save();
        stack.save();
        assert_eq!(stack.save_count(), 2);
        assert!(stack.saves.is_empty());
        stack.restore();
        stack.restore();
        assert_eq!(stack.save_count(), 0);
    }

    #[test]
    fn redundant_clip_after_save_does_not_materialize() {
        let mut stack = stack();
        clip(&mut stack, rect(10.0, 10.0, 50.0, 50.0), ClipOp::Intersect);
        let gen_id = stack.gen_id();
        stack.save();
        clip(&mut stack, rect(0.0, 0.0, 80.0, 80.0), ClipOp::Intersect);
        assert!(stack.saves.is_empty());
        assert_eq!(stack.save_count(), 1);
        assert_eq!(stack.gen_id(), gen_id);
        stack.restore();
        assert_eq!(stack.save_count(), 0);
    }

    #[test]
    fn restore_brings_back_the_outer_clip() {
        let mut stack = stack();
        clip(&mut stack, rect(10.0, 10.0, 50.0, 50.0), ClipOp::Intersect);
        let outer_gen = stack.gen_id();

        stack.save();
        clip(&mut stack, rect(20.0, 20.0, 30.0, 30.0), ClipOp::Intersect);
        assert_eq!(stack.conservative_bounds(), irect(20, 20, 30, 30));
        assert_ne!(stack.gen_id(), outer_gen);
        assert_eq!(stack.elements().count(), 1);

        stack.restore();
        assert_eq!(stack.gen_id(), outer_gen);
        assert_eq!(stack.conservative_bounds(), irect(10, 10, 50, 50));
        let elements: Vec<_> = stack.elements().collect();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].shape.as_rect(), Some(&rect(10.0, 10.0, 50.0, 50.0)));
    }

    #[test]
    fn unbalanced_restore_is_ignored() {
        let mut stack = stack();
        clip(&mut stack, rect(10.0, 10.0, 50.0, 50.0), ClipOp::Intersect);
        stack.restore();
        assert_eq!(stack.state(), ClipState::DeviceRect);
    }

    #[test]
    fn empty_clip_ignores_further_clips() {
        let mut stack = stack();
        clip(&mut stack, rect(10.0, 10.0, 20.0, 20.0), ClipOp::Intersect);
        clip(&mut stack, rect(30.0, 30.0, 40.0, 40.0), ClipOp::Intersect);
        assert_eq!(stack.state(), ClipState::Empty);
        assert_eq!(stack.conservative_bounds(), IRect::zero());
        assert_eq!(stack.elements().count(), 0);

        clip(&mut stack, rect(0.0, 0.0, 5.0, 5.0), ClipOp::Intersect);
        stack.clip_shader(ClipShader::new(ConstantCoverage(0.5)));
        assert_eq!(stack.state(), ClipState::Empty);
        assert!(stack.shader().is_none());
    }

    #[test]
    fn empty_difference_is_a_no_op() {
        let mut stack = stack();
        stack.save();
        clip(&mut stack, rect(200.0, 200.0, 300.0, 300.0), ClipOp::Difference);
        assert_eq!(stack.state(), ClipState::WideOpen);
        assert!(stack.saves.is_empty());
    }

    #[test]
    fn difference_stack_bounds_only_shrink_at_device_edges() {
        let mut stack = stack();
        clip(&mut stack, rect(20.0, 20.0, 40.0, 40.0), ClipOp::Difference);
        assert_eq!(stack.state(), ClipState::Complex);
        assert_eq!(stack.conservative_bounds(), irect(0, 0, 100, 100));

        stack.save();
        clip(&mut stack, rect(-10.0, -10.0, 110.0, 30.0), ClipOp::Difference);
        assert_eq!(stack.conservative_bounds(), irect(0, 30, 100, 100));
    }

    #[test]
    fn gen_ids_skip_reserved_values() {
        let mut stack = stack();
        stack.next_gen_id = u32::MAX;
        assert_eq!(stack.next_gen_id(), u32::MAX);
        assert_eq!(stack.next_gen_id(), FIRST_GEN_ID);
    }
}
