use grafo_clip::{
    pixel_bounds, BoundsType, ClipOp, ClipStack, ClipState, Element, IRect, PathShape, RRect,
    Rect, Shape, Transform,
};

use crate::region::PixelRegion;

/// Stop permuting after this many orders (6!), however many clips a case has.
const MAX_ORDERS: usize = 720;

/// Where `save` calls are placed around the clips of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    Never,
    AtStart,
    AtEnd,
    BetweenEveryOp,
}

impl SavePolicy {
    pub const ALL: [SavePolicy; 4] = [
        SavePolicy::Never,
        SavePolicy::AtStart,
        SavePolicy::AtEnd,
        SavePolicy::BetweenEveryOp,
    ];

    fn name(self) -> &'static str {
        match self {
            SavePolicy::Never => "never",
            SavePolicy::AtStart => "start",
            SavePolicy::AtEnd => "end",
            SavePolicy::BetweenEveryOp => "between",
        }
    }
}

/// One clip call, or one element expected in the finished stack.
#[derive(Debug, Clone)]
pub struct ClipSpec {
    pub shape: Shape,
    pub local_to_device: Transform,
    pub aa: bool,
    pub op: ClipOp,
}

impl ClipSpec {
    fn matches(&self, element: &Element) -> bool {
        element.aa == self.aa
            && element.op == self.op
            && element.local_to_device == self.local_to_device
            && element.shape == self.shape
    }

    fn pixel_bounds_for_region(&self) -> (IRect, bool, bool) {
        let intersect = (self.op == ClipOp::Intersect) != self.shape.inverted();
        let identity = self.local_to_device.is_identity();
        if intersect {
            let device = self.local_to_device.map_rect(&self.shape.bounds());
            (
                pixel_bounds(&device, self.aa, BoundsType::Exterior),
                true,
                identity,
            )
        } else {
            let interior = match (identity, self.shape.as_rect(), self.shape.as_rrect()) {
                (true, Some(r), _) => pixel_bounds(r, self.aa, BoundsType::Interior),
                (true, None, Some(rr)) => {
                    pixel_bounds(&rr.inner_bounds(), self.aa, BoundsType::Interior)
                }
                _ => IRect::zero(),
            };
            (interior, false, false)
        }
    }
}

/// A list of clips, and the stack they are expected to produce in any order and under any
/// [`SavePolicy`].
///
/// ```rust
/// use grafo_clip::{irect, rect, ClipState};
/// use grafo_clip_scenarios::{ClipCase, SavePolicy};
///
/// let case = ClipCase::build("nested", irect(0, 0, 100, 100))
///     .actual()
///     .aa()
///     .rect(rect(0.0, 0.0, 50.0, 50.0))
///     .rect(rect(10.0, 10.0, 20.0, 20.0))
///     .finish_elements()
///     .expect()
///     .aa()
///     .rect(rect(10.0, 10.0, 20.0, 20.0))
///     .finish_elements()
///     .state(ClipState::DeviceRect)
///     .finish();
/// assert!(case.run(&[1, 0], SavePolicy::AtStart).is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ClipCase {
    name: String,
    device: IRect,
    state: ClipState,
    actual: Vec<ClipSpec>,
    expected: Vec<ClipSpec>,
}

impl ClipCase {
    pub fn build(name: &str, device: IRect) -> ClipCaseBuilder {
        ClipCaseBuilder {
            name: name.to_string(),
            device,
            state: ClipState::WideOpen,
            actual: Vec::new(),
            expected: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clips(&self) -> &[ClipSpec] {
        &self.actual
    }

    /// Applies the clips in `order` and returns a description of every expectation that failed.
    pub fn run(&self, order: &[usize], policy: SavePolicy) -> Vec<String> {
        debug_assert_eq!(order.len(), self.actual.len());
        let label = self.label(order, policy);
        let mut failures = Vec::new();

        let mut stack = ClipStack::new(self.device);
        if policy == SavePolicy::AtStart {
            stack.save();
        }
        let mut snapshots = Vec::new();
        for &i in order {
            if policy == SavePolicy::BetweenEveryOp {
                snapshots.push(ClipSnapshot::take(&stack));
                stack.save();
            }
            let clip = &self.actual[i];
            stack.clip_shape(&clip.local_to_device, clip.shape.clone(), clip.aa, clip.op);
        }
        if policy == SavePolicy::AtEnd {
            stack.save();
        }

        if stack.state() != self.state {
            failures.push(format!(
                "[{label}] clip state expected {} but got {}",
                self.state,
                stack.state()
            ));
        }

        let actual_bounds = stack.conservative_bounds();
        let (optimal_bounds, expect_optimal) = self.optimal_bounds();
        if expect_optimal && actual_bounds != optimal_bounds {
            failures.push(format!(
                "[{label}] bounds expected {optimal_bounds:?} but got {actual_bounds:?}"
            ));
        } else if !expect_optimal && !actual_bounds.contains_box(&optimal_bounds) {
            failures.push(format!(
                "[{label}] bounds {actual_bounds:?} are not conservative, optimal is {optimal_bounds:?}"
            ));
        }

        let mut matched = 0;
        for element in stack.elements() {
            let found = self.expected.iter().filter(|e| e.matches(element)).count();
            if found == 0 {
                failures.push(format!("[{label}] unexpected clip element {element:?}"));
            }
            matched += found.min(1);
        }
        if matched != self.expected.len() {
            failures.push(format!(
                "[{label}] matched only {matched} of {} expected elements",
                self.expected.len()
            ));
        }

        match policy {
            SavePolicy::Never => {}
            SavePolicy::AtEnd => {
                let before = ClipSnapshot::take(&stack);
                stack.restore();
                if let Some(difference) = before.difference(&ClipSnapshot::take(&stack)) {
                    failures.push(format!("[{label}] restoring an unused save: {difference}"));
                }
            }
            SavePolicy::AtStart => {
                stack.restore();
                if stack.state() != ClipState::WideOpen {
                    failures.push(format!(
                        "[{label}] restoring the save left the clip {} instead of wide-open",
                        stack.state()
                    ));
                }
            }
            SavePolicy::BetweenEveryOp => {
                // Each restore has to bring back exactly the clip that was current at its save.
                while let Some(before) = snapshots.pop() {
                    stack.restore();
                    let after = ClipSnapshot::take(&stack);
                    if let Some(difference) = before.difference(&after) {
                        failures.push(format!(
                            "[{label}] restore {} of {}: {difference}",
                            order.len() - snapshots.len(),
                            order.len()
                        ));
                    }
                }
                if stack.state() != ClipState::WideOpen {
                    failures.push(format!(
                        "[{label}] restoring every save left the clip {} instead of wide-open",
                        stack.state()
                    ));
                }
            }
        }

        failures
    }

    /// Runs every save policy for every order of the clips (up to 720 orders), generated with
    /// Heap's algorithm.
    pub fn run_all_orders(&self) -> Vec<String> {
        let n = self.actual.len();
        let mut order: Vec<usize> = (0..n).collect();
        let mut counters = vec![0; n];
        let mut failures = Vec::new();

        let run_policies = |order: &[usize], failures: &mut Vec<String>| {
            for policy in SavePolicy::ALL {
                failures.extend(self.run(order, policy));
            }
        };

        run_policies(&order, &mut failures);
        let mut runs = 1;
        let mut i = 0;
        while i < n && runs < MAX_ORDERS {
            if counters[i] < i {
                if i % 2 == 0 {
                    order.swap(0, i);
                } else {
                    order.swap(counters[i], i);
                }
                run_policies(&order, &mut failures);
                counters[i] += 1;
                i = 0;
                runs += 1;
            } else {
                counters[i] = 0;
                i += 1;
            }
        }
        failures
    }

    /// The tightest pixel bounds of the expected clip, and whether the stack should report
    /// exactly those. Difference elements only ever allow conservative bounds.
    fn optimal_bounds(&self) -> (IRect, bool) {
        if self.state == ClipState::Empty {
            return (IRect::zero(), true);
        }

        let mut expect_optimal = true;
        let mut region = PixelRegion::new(self.device);
        for element in &self.expected {
            let (bounds, intersect, optimal) = element.pixel_bounds_for_region();
            expect_optimal &= optimal;
            if intersect {
                region.intersect(&bounds);
            } else {
                region.difference(&bounds);
            }
        }
        (region.bounds(), expect_optimal)
    }

    fn label(&self, order: &[usize], policy: SavePolicy) -> String {
        let order: Vec<String> = order.iter().map(usize::to_string).collect();
        format!(
            "{} (save {}, order [{}])",
            self.name,
            policy.name(),
            order.join(",")
        )
    }
}

/// What a stack reports about its clip, compared across a save/restore pair.
struct ClipSnapshot {
    state: ClipState,
    bounds: IRect,
    elements: Vec<Element>,
}

impl ClipSnapshot {
    fn take(stack: &ClipStack) -> Self {
        Self {
            state: stack.state(),
            bounds: stack.conservative_bounds(),
            elements: stack.elements().cloned().collect(),
        }
    }

    /// Describes the first way `other` differs from this snapshot, if any. Elements are
    /// compared as a set.
    fn difference(&self, other: &ClipSnapshot) -> Option<String> {
        if self.state != other.state {
            return Some(format!("state {} became {}", self.state, other.state));
        }
        if self.bounds != other.bounds {
            return Some(format!(
                "bounds {:?} became {:?}",
                self.bounds, other.bounds
            ));
        }
        let same_elements = self.elements.len() == other.elements.len()
            && self.elements.iter().all(|e| other.elements.contains(e));
        if !same_elements {
            return Some(format!(
                "elements {:?} became {:?}",
                self.elements, other.elements
            ));
        }
        None
    }
}

/// Builds a [`ClipCase`] from the clips to apply and the elements expected afterwards.
pub struct ClipCaseBuilder {
    name: String,
    device: IRect,
    state: ClipState,
    actual: Vec<ClipSpec>,
    expected: Vec<ClipSpec>,
}

impl ClipCaseBuilder {
    /// Starts listing the clips to apply.
    pub fn actual(self) -> ElementsBuilder {
        ElementsBuilder::new(self, false)
    }

    /// Starts listing the elements the stack should end up with.
    pub fn expect(self) -> ElementsBuilder {
        ElementsBuilder::new(self, true)
    }

    /// Expects the clips to survive unchanged.
    pub fn expect_actual(mut self) -> Self {
        self.expected = self.actual.clone();
        self
    }

    pub fn state(mut self, state: ClipState) -> Self {
        self.state = state;
        self
    }

    pub fn finish(self) -> ClipCase {
        ClipCase {
            name: self.name,
            device: self.device,
            state: self.state,
            actual: self.actual,
            expected: self.expected,
        }
    }
}

/// Appends clips to a [`ClipCaseBuilder`]. The transform, AA and op set on the builder apply to
/// every following shape.
pub struct ElementsBuilder {
    builder: ClipCaseBuilder,
    expected: bool,
    local_to_device: Transform,
    aa: bool,
    op: ClipOp,
}

impl ElementsBuilder {
    fn new(builder: ClipCaseBuilder, expected: bool) -> Self {
        Self {
            builder,
            expected,
            local_to_device: Transform::identity(),
            aa: false,
            op: ClipOp::Intersect,
        }
    }

    pub fn local_to_device(mut self, transform: Transform) -> Self {
        self.local_to_device = transform;
        self
    }

    pub fn aa(mut self) -> Self {
        self.aa = true;
        self
    }

    pub fn non_aa(mut self) -> Self {
        self.aa = false;
        self
    }

    pub fn intersect(mut self) -> Self {
        self.op = ClipOp::Intersect;
        self
    }

    pub fn difference(mut self) -> Self {
        self.op = ClipOp::Difference;
        self
    }

    pub fn rect(self, r: Rect) -> Self {
        self.shape(Shape::rect(r))
    }

    pub fn rrect(self, rr: RRect) -> Self {
        self.shape(Shape::rrect(rr))
    }

    pub fn path(self, path: PathShape) -> Self {
        self.shape(Shape::path(path))
    }

    pub fn shape(self, shape: Shape) -> Self {
        let (local_to_device, aa, op) = (self.local_to_device, self.aa, self.op);
        self.push(shape, local_to_device, aa, op)
    }

    /// Adds a shape with its own transform, AA and op, leaving the builder's defaults alone.
    pub fn push(mut self, shape: Shape, local_to_device: Transform, aa: bool, op: ClipOp) -> Self {
        let spec = ClipSpec {
            shape,
            local_to_device,
            aa,
            op,
        };
        if self.expected {
            self.builder.expected.push(spec);
        } else {
            self.builder.actual.push(spec);
        }
        self
    }

    pub fn finish_elements(self) -> ClipCaseBuilder {
        self.builder
    }
}
