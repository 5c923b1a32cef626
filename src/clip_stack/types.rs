use std::fmt;

use crate::rrect::RRect;
use crate::shape::Shape;
use crate::transform::Transform;

/// How a clip shape restricts drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipOp {
    /// Keep only what is inside the shape.
    Intersect,
    /// Keep only what is outside the shape.
    Difference,
}

impl ClipOp {
    /// The op that an inverse-filled shape behaves as.
    #[inline]
    pub fn inverse(self) -> Self {
        match self {
            ClipOp::Intersect => ClipOp::Difference,
            ClipOp::Difference => ClipOp::Intersect,
        }
    }
}

/// A summary of the whole clip, so draws can pick a cheap way to apply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipState {
    /// Everything is clipped out.
    Empty,
    /// Nothing is clipped out.
    WideOpen,
    /// A single axis-aligned device-space rectangle.
    DeviceRect,
    /// A single axis-aligned device-space rounded rectangle.
    DeviceRRect,
    /// Anything else, including any clip with a shader.
    Complex,
}

impl fmt::Display for ClipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClipState::Empty => "empty",
            ClipState::WideOpen => "wide-open",
            ClipState::DeviceRect => "device-rect",
            ClipState::DeviceRRect => "device-rrect",
            ClipState::Complex => "complex",
        };
        f.write_str(name)
    }
}

/// One active clip, as stored by the stack.
///
/// Elements are canonical: the shape is never inverted (an inverse fill is stored as the
/// opposite op), and rect-preserving transforms of rectangles and rounded rectangles have been
/// applied to the geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub shape: Shape,
    pub local_to_device: Transform,
    pub op: ClipOp,
    pub aa: bool,
}

/// How the current clip affects a draw with given bounds.
#[derive(Debug, Clone, PartialEq)]
pub enum PreClipResult {
    /// The draw is entirely inside the clip.
    Unclipped,
    /// The draw is entirely outside the clip.
    ClippedOut,
    /// The clip must be applied to the draw.
    Clipped,
    /// The clip is exactly this device-space rounded rectangle, which may be a plain rectangle.
    ClippedToRRect { rrect: RRect, aa: bool },
}

/// Settings fixed for the lifetime of a [`ClipStack`](crate::ClipStack).
///
/// # Examples
///
/// ```rust
/// use grafo_clip::ClipStackOptions;
///
/// let options = ClipStackOptions::new().with_force_aa(true);
/// assert!(options.force_aa);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipStackOptions {
    /// Treat every clip and draw as anti-aliased, except axis-aligned clip rectangles which can
    /// always be applied as a scissor.
    pub force_aa: bool,
}

impl ClipStackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force_aa(mut self, force_aa: bool) -> Self {
        self.force_aa = force_aa;
        self
    }
}
