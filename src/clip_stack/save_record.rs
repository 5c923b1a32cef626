use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::geometry::{self, Rect};
use crate::shader::ClipShader;
use crate::shape::Shape;
use crate::transform::Transform;

use super::element::RawElement;
use super::mask::MaskKey;
use super::transformed_shape::{simplify, SimplifyResult, TransformedShape};
use super::types::{ClipOp, ClipState};

/// Most clips hold a single element.
pub(crate) type ElementStack = SmallVec<[RawElement; 1]>;
pub(crate) type MaskStack = SmallVec<[MaskKey; 4]>;

pub(crate) const INVALID_GEN_ID: u32 = 0;
pub(crate) const EMPTY_GEN_ID: u32 = 1;
pub(crate) const WIDE_OPEN_GEN_ID: u32 = 2;

/// One level of the save stack.
///
/// A record owns the elements from `start_element` to the top of the element stack and the masks
/// from `start_mask` up. Its bounds and op summarize every active element, including the ones
/// inherited from records below it.
#[derive(Debug, Clone)]
pub(crate) struct SaveRecord {
    inner: Rect,
    outer: Rect,
    shader: Option<ClipShader>,
    start_mask: usize,
    start_element: usize,
    /// Elements below this index are invalid for this record.
    oldest_valid: usize,
    /// Saves that haven't needed a record of their own yet.
    deferred_saves: u32,
    /// Difference only while every element is a difference.
    stack_op: ClipOp,
    state: ClipState,
    gen_id: u32,
}

impl SaveRecord {
    pub fn new(device_bounds: &Rect) -> Self {
        Self {
            inner: *device_bounds,
            outer: *device_bounds,
            shader: None,
            start_mask: 0,
            start_element: 0,
            oldest_valid: 0,
            deferred_saves: 0,
            stack_op: ClipOp::Intersect,
            state: ClipState::WideOpen,
            gen_id: INVALID_GEN_ID,
        }
    }

    /// Materializes a deferred save on top of `prior`. The geometry, and therefore the gen ID,
    /// is inherited until an element is added.
    pub fn from_prior(prior: &SaveRecord, start_mask: usize, start_element: usize) -> Self {
        debug_assert!(start_mask >= prior.start_mask);
        debug_assert!(start_element >= prior.start_element);
        Self {
            inner: prior.inner,
            outer: prior.outer,
            shader: prior.shader.clone(),
            start_mask,
            start_element,
            oldest_valid: prior.oldest_valid,
            deferred_saves: 0,
            stack_op: prior.stack_op,
            state: prior.state,
            gen_id: prior.gen_id,
        }
    }

    #[inline]
    pub fn first_active_element_index(&self) -> usize {
        self.start_element
    }

    #[inline]
    pub fn oldest_valid_index(&self) -> usize {
        self.oldest_valid
    }

    #[inline]
    pub fn can_be_updated(&self) -> bool {
        self.deferred_saves == 0
    }

    #[inline]
    pub fn deferred_saves(&self) -> u32 {
        self.deferred_saves
    }

    pub fn push_save(&mut self) {
        self.deferred_saves += 1;
    }

    /// Undoes a deferred save. Returns false if there was none and the record itself has to go.
    pub fn pop_save(&mut self) -> bool {
        if self.deferred_saves > 0 {
            self.deferred_saves -= 1;
            true
        } else {
            false
        }
    }

    pub fn state(&self) -> ClipState {
        if self.shader.is_some() && self.state != ClipState::Empty {
            ClipState::Complex
        } else {
            self.state
        }
    }

    #[inline]
    pub fn op(&self) -> ClipOp {
        self.stack_op
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
    pub fn shader(&self) -> Option<&ClipShader> {
        self.shader.as_ref()
    }

    pub fn gen_id(&self) -> u32 {
        match self.state {
            ClipState::Empty => EMPTY_GEN_ID,
            ClipState::WideOpen => WIDE_OPEN_GEN_ID,
            _ => {
                debug_assert!(self.gen_id != EMPTY_GEN_ID && self.gen_id != WIDE_OPEN_GEN_ID);
                self.gen_id
            }
        }
    }

    pub fn set_gen_id(&mut self, gen_id: u32) {
        debug_assert!(gen_id > WIDE_OPEN_GEN_ID);
        self.gen_id = gen_id;
    }

    /// Runs the combination table with this record's aggregate bounds as the older operand.
    /// The record only knows its bounds, so shape-level containment is skipped.
    pub fn simplify_against(&self, other: &TransformedShape<'_>) -> SimplifyResult {
        let identity = Transform::identity();
        let shape = Shape::rect(self.outer);
        let view = TransformedShape {
            local_to_device: &identity,
            device_to_local: &identity,
            shape: &shape,
            outer: &self.outer,
            inner: &self.inner,
            op: self.stack_op,
            aa: other.aa,
            contains_checks_only_bounds: true,
        };
        simplify(&view, other)
    }

    pub fn remove_elements(&self, elements: &mut ElementStack) {
        elements.truncate(self.start_element);
    }

    /// Revives elements that were only invalidated by a record that has since been popped.
    pub fn restore_elements(&self, elements: &mut ElementStack) {
        for e in elements.iter_mut().skip(self.oldest_valid).rev() {
            e.restore_valid(self);
        }
    }

    /// Moves the keys of every mask this record owns into `invalidated`.
    pub fn invalidate_masks(&self, masks: &mut MaskStack, invalidated: &mut Vec<MaskKey>) {
        if masks.len() > self.start_mask {
            let before = invalidated.len();
            invalidated.extend(masks.drain(self.start_mask..));
            debug!(
                count = invalidated.len() - before,
                gen_id = self.gen_id,
                "invalidated clip masks"
            );
        }
    }

    pub fn start_mask_index(&self) -> usize {
        self.start_mask
    }

    pub fn reset(&mut self, bounds: &Rect) {
        debug_assert!(self.can_be_updated());
        self.oldest_valid = self.start_element;
        self.outer = *bounds;
        self.inner = *bounds;
        self.stack_op = ClipOp::Intersect;
        self.state = ClipState::WideOpen;
        self.shader = None;
    }

    pub fn add_shader(&mut self, shader: ClipShader) {
        debug_assert!(self.can_be_updated());
        // Coverage multiplies, so the order of the layers doesn't change the result.
        self.shader = Some(match self.shader.take() {
            None => shader,
            Some(old) => ClipShader::modulate(shader, old),
        });
    }

    /// Adds a canonicalized element. Returns false if the clip is unchanged by it.
    pub fn add_element(&mut self, to_add: RawElement, elements: &mut ElementStack) -> bool {
        debug_assert!(self.can_be_updated());

        if self.state == ClipState::Empty {
            // Clips only shrink.
            return false;
        }
        if to_add.shape().is_empty() {
            debug_assert_eq!(to_add.op(), ClipOp::Intersect);
            self.collapse(elements);
            return true;
        }

        match self.simplify_against(&to_add.as_shape()) {
            SimplifyResult::Empty => {
                self.collapse(elements);
                return true;
            }
            SimplifyResult::AOnly => {
                trace!("element does not change the clip");
                return false;
            }
            SimplifyResult::BOnly => {
                trace!("element replaces the clip");
                self.replace_with_element(to_add, elements);
                return true;
            }
            SimplifyResult::Both => {}
        }

        if self.state == ClipState::WideOpen {
            self.replace_with_element(to_add, elements);
            return true;
        }

        match (self.stack_op, to_add.op()) {
            (ClipOp::Intersect, ClipOp::Intersect) => {
                self.outer = geometry::intersect(&self.outer, to_add.outer_bounds());
                self.inner = geometry::intersect(&self.inner, to_add.inner_bounds());
            }
            (ClipOp::Intersect, ClipOp::Difference) => {
                // The outer bounds only shrink when the hole cuts off a whole edge.
                self.outer = geometry::subtract(&self.outer, to_add.inner_bounds(), true);
                self.inner = geometry::subtract(&self.inner, to_add.outer_bounds(), false);
            }
            (ClipOp::Difference, ClipOp::Intersect) => {
                let old_outer = self.outer;
                self.outer = geometry::subtract(to_add.outer_bounds(), &self.inner, true);
                self.inner = geometry::subtract(to_add.inner_bounds(), &old_outer, false);
            }
            (ClipOp::Difference, ClipOp::Difference) => {
                self.outer = geometry::join(&self.outer, to_add.outer_bounds());
                if geometry::area(to_add.inner_bounds()) > geometry::area(&self.inner) {
                    self.inner = *to_add.inner_bounds();
                }
            }
        }

        debug_assert!(
            !geometry::is_empty(&self.outer)
                && (geometry::is_empty(&self.inner) || geometry::contains(&self.outer, &self.inner))
        );

        self.append_element(to_add, elements)
    }

    fn collapse(&mut self, elements: &mut ElementStack) {
        debug!(gen_id = self.gen_id, "clip collapsed to empty");
        self.state = ClipState::Empty;
        self.remove_elements(elements);
    }

    /// Reconciles `to_add` with every valid element and stores it, reusing a slot the new element
    /// invalidated when one is available.
    fn append_element(&mut self, mut to_add: RawElement, elements: &mut ElementStack) -> bool {
        let count = elements.len();
        // One past the youngest element that stays valid, never below this record's own elements.
        let mut target = self.start_element;
        let mut oldest_valid = count;
        let mut oldest_active_invalid = None;

        for i in (self.oldest_valid..count).rev() {
            let existing = &mut elements[i];
            // Marking with this record's first index is enough to restore correctly later.
            existing.update_for_element(&mut to_add, self);

            if to_add.is_invalid() {
                if existing.is_invalid() {
                    self.collapse(elements);
                    return true;
                }
                trace!(index = i, "element is already covered by an older one");
                return false;
            } else if existing.is_invalid() {
                trace!(index = i, "element made an older one redundant");
                if i >= self.start_element {
                    oldest_active_invalid = Some(i);
                }
            } else {
                oldest_valid = i;
                target = target.max(i + 1);
            }
        }

        self.oldest_valid = oldest_valid.min(oldest_active_invalid.unwrap_or(count));
        self.state = if oldest_valid == count {
            to_add.clip_type()
        } else {
            ClipState::Complex
        };
        if to_add.op() == ClipOp::Intersect {
            self.stack_op = ClipOp::Intersect;
        }

        let reuse = match oldest_active_invalid {
            Some(index) if index < target => Some(index),
            _ => {
                target += 1;
                None
            }
        };
        elements.truncate(target);
        match reuse {
            Some(index) => elements[index] = to_add,
            None if elements.len() < target => elements.push(to_add),
            None => {
                if let Some(top) = elements.last_mut() {
                    *top = to_add;
                }
            }
        }
        true
    }

    fn replace_with_element(&mut self, to_add: RawElement, elements: &mut ElementStack) {
        self.inner = *to_add.inner_bounds();
        self.outer = *to_add.outer_bounds();
        self.stack_op = to_add.op();
        self.state = to_add.clip_type();

        elements.truncate(self.start_element);
        elements.push(to_add);
        debug_assert_eq!(elements.len(), self.start_element + 1);

        // Everything owned by the records below is now irrelevant to this one.
        self.oldest_valid = self.start_element;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rect;
    use crate::shader::ConstantCoverage;

    fn device() -> Rect {
        rect(0.0, 0.0, 100.0, 100.0)
    }

    fn raw(r: Rect, op: ClipOp) -> RawElement {
        RawElement::new(&device(), Transform::identity(), Shape::rect(r), true, op, false)
    }

    #[test]
    fn first_element_replaces_wide_open() {
        let mut record = SaveRecord::new(&device());
        let mut elements = ElementStack::new();
        assert!(record.add_element(raw(rect(10.0, 10.0, 50.0, 50.0), ClipOp::Intersect), &mut elements));
        assert_eq!(record.state(), ClipState::DeviceRect);
        assert_eq!(elements.len(), 1);
        assert_eq!(record.outer_bounds(), &rect(10.0, 10.0, 50.0, 50.0));
    }

    #[test]
    fn nested_rects_keep_one_element() {
        let mut record = SaveRecord::new(&device());
        let mut elements = ElementStack::new();
        record.add_element(raw(rect(10.0, 10.0, 50.0, 50.0), ClipOp::Intersect), &mut elements);
        assert!(record.add_element(raw(rect(20.0, 20.0, 30.0, 30.0), ClipOp::Intersect), &mut elements));
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].shape().as_rect(), Some(&rect(20.0, 20.0, 30.0, 30.0)));

        // Larger than the current clip, so nothing changes.
        assert!(!record.add_element(raw(rect(0.0, 0.0, 60.0, 60.0), ClipOp::Intersect), &mut elements));
        assert_eq!(elements.len(), 1);
    }

    #[test]
    fn disjoint_intersect_empties_the_record() {
        let mut record = SaveRecord::new(&device());
        let mut elements = ElementStack::new();
        record.add_element(raw(rect(10.0, 10.0, 20.0, 20.0), ClipOp::Intersect), &mut elements);
        assert!(record.add_element(raw(rect(30.0, 30.0, 40.0, 40.0), ClipOp::Intersect), &mut elements));
        assert_eq!(record.state(), ClipState::Empty);
        assert_eq!(record.gen_id(), EMPTY_GEN_ID);
        assert!(elements.is_empty());

        // Nothing can be added once empty.
        assert!(!record.add_element(raw(rect(0.0, 0.0, 50.0, 50.0), ClipOp::Intersect), &mut elements));
    }

    #[test]
    fn difference_then_intersect_updates_bounds() {
        let mut record = SaveRecord::new(&device());
        let mut elements = ElementStack::new();
        record.add_element(raw(rect(40.0, 0.0, 100.0, 100.0), ClipOp::Difference), &mut elements);
        assert_eq!(record.op(), ClipOp::Difference);
        assert_eq!(record.state(), ClipState::Complex);

        record.add_element(raw(rect(20.0, 20.0, 60.0, 60.0), ClipOp::Intersect), &mut elements);
        assert_eq!(record.op(), ClipOp::Intersect);
        assert_eq!(record.state(), ClipState::Complex);
        assert_eq!(elements.len(), 2);
        // The hole spans the right side of the intersect rect entirely.
        assert_eq!(record.outer_bounds(), &rect(20.0, 20.0, 40.0, 60.0));
    }

    #[test]
    fn materialized_record_restores_invalidated_elements() {
        let mut base = SaveRecord::new(&device());
        let mut elements = ElementStack::new();
        base.add_element(raw(rect(10.0, 10.0, 50.0, 50.0), ClipOp::Intersect), &mut elements);
        // A rotated square poking into the top of the rect keeps the record's inner bounds empty.
        let diamond = RawElement::new(
            &device(),
            Transform::rotation_degrees(45.0).then_translate(30.0, 0.0),
            Shape::rect(rect(0.0, 0.0, 10.0, 10.0)),
            true,
            ClipOp::Intersect,
            false,
        );
        assert!(base.add_element(diamond, &mut elements));
        assert_eq!(elements.len(), 2);
        assert_eq!(base.state(), ClipState::Complex);

        let mut child = SaveRecord::from_prior(&base, 0, elements.len());
        // Inside the first rect, so it replaces it, but it only partially covers the diamond.
        assert!(child.add_element(raw(rect(25.0, 10.0, 45.0, 45.0), ClipOp::Intersect), &mut elements));
        assert_eq!(elements.len(), 3);
        assert!(elements[0].is_invalid());
        assert!(!elements[1].is_invalid());
        assert_eq!(child.oldest_valid_index(), 1);

        child.remove_elements(&mut elements);
        base.restore_elements(&mut elements);
        assert_eq!(elements.len(), 2);
        assert!(!elements[0].is_invalid());
    }

    #[test]
    fn deferred_saves_count_down() {
        let mut record = SaveRecord::new(&device());
        record.push_save();
        record.push_save();
        assert!(!record.can_be_updated());
        assert!(record.pop_save());
        assert!(record.pop_save());
        assert!(!record.pop_save());
        assert!(record.can_be_updated());
    }

    #[test]
    fn shader_makes_state_complex() {
        let mut record = SaveRecord::new(&device());
        record.add_shader(ClipShader::new(ConstantCoverage(0.5)));
        assert_eq!(record.state(), ClipState::Complex);
        record.add_shader(ClipShader::new(ConstantCoverage(0.5)));
        assert_eq!(record.shader().map(ClipShader::layer_count), Some(2));

        record.reset(&device());
        assert_eq!(record.state(), ClipState::WideOpen);
        assert!(record.shader().is_none());
    }

    #[test]
    fn masks_are_drained_from_the_owning_record() {
        let record = SaveRecord::from_prior(&SaveRecord::new(&device()), 1, 0);
        let mut masks = MaskStack::new();
        masks.push(MaskKey::new(3, crate::geometry::irect(0, 0, 10, 10)));
        masks.push(MaskKey::new(4, crate::geometry::irect(0, 0, 20, 20)));

        let mut invalidated = Vec::new();
        record.invalidate_masks(&mut masks, &mut invalidated);
        assert_eq!(masks.len(), 1);
        assert_eq!(invalidated.len(), 1);
        assert_eq!(invalidated[0].gen_id(), 4);
    }
}
