mod cache;
mod clip_stack;
mod error;
mod geometry;
#[cfg(feature = "clip_metrics")]
mod metrics;
mod rrect;
mod shader;
mod shape;
mod transform;

pub use cache::MaskCache;
pub use clip_stack::{
    ClipOp, ClipStack, ClipStackOptions, ClipState, Element, MaskKey, PreClipResult,
};
pub use error::GeometryError;
pub use geometry::{irect, irect_to_rect, pixel_bounds, rect, BoundsType, IRect, Point, Rect, Vector};
#[cfg(feature = "clip_metrics")]
pub use metrics::ClipStackMetrics;
pub use rrect::{Corner, RRect};
pub use shader::{ClipShader, ConstantCoverage, CoverageShader};
pub use shape::{PathShape, PathShapeBuilder, Shape, ShapeKind};
pub use transform::{HomogeneousPoint, Transform, TransformType, W0_PLANE_DISTANCE};
