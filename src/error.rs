// ── Error type ───────────────────────────────────────────────────────────────

/// Errors raised when constructing geometry from caller-provided values.
///
/// Clip operations themselves never fail; degenerate geometry is canonicalized instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("rectangle has non-finite coordinates")]
    NonFiniteRect,
    #[error("corner radii must be finite and non-negative")]
    InvalidRadii,
    #[error("transform matrix has non-finite entries")]
    NonFiniteMatrix,
}
