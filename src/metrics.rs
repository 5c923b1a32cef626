/// Counters describing how much work a [`ClipStack`](crate::ClipStack) did.
///
/// Available when the `clip_metrics` feature is enabled. `deferred_saves_elided` counts saves
/// that were popped again without ever needing a save record of their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipStackMetrics {
    /// Calls to any of the `clip_*` methods, including no-ops.
    pub clip_calls: u32,
    /// Clips that changed the stack.
    pub elements_added: u32,
    /// Clips that turned out not to change the clip.
    pub elements_discarded: u32,
    /// Save records created for a deferred save.
    pub records_materialized: u32,
    pub deferred_saves_elided: u32,
    /// Mask keys queued for invalidation.
    pub masks_invalidated: u32,
}

impl ClipStackMetrics {
    /// Merge another stack's counts into this accumulator.
    pub fn accumulate(&mut self, other: &Self) {
        self.clip_calls += other.clip_calls;
        self.elements_added += other.elements_added;
        self.elements_discarded += other.elements_discarded;
        self.records_materialized += other.records_materialized;
        self.deferred_saves_elided += other.deferred_saves_elided;
        self.masks_invalidated += other.masks_invalidated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_adds_every_counter() {
        let mut total = ClipStackMetrics {
            clip_calls: 1,
            elements_added: 1,
            ..Default::default()
        };
        let frame = ClipStackMetrics {
            clip_calls: 2,
            elements_discarded: 1,
            records_materialized: 1,
            deferred_saves_elided: 3,
            masks_invalidated: 4,
            ..Default::default()
        };
        total.accumulate(&frame);
        assert_eq!(total.clip_calls, 3);
        assert_eq!(total.elements_added, 1);
        assert_eq!(total.elements_discarded, 1);
        assert_eq!(total.records_materialized, 1);
        assert_eq!(total.deferred_saves_elided, 3);
        assert_eq!(total.masks_invalidated, 4);
    }
}
