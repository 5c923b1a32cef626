//! Coverage shaders that can be layered on top of geometric clips.
//!
//! A clip shader does not change the clip's geometry; it scales the coverage of every pixel that
//! survives the geometric clip. Several shaders on the same save record multiply together.

use std::fmt::Debug;
use std::sync::Arc;

/// Produces coverage in `[0, 1]` for a device-space sample position.
pub trait CoverageShader: Send + Sync + Debug {
    fn coverage(&self, x: f32, y: f32) -> f32;
}

/// Constant coverage everywhere, mostly useful for fading a clipped layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantCoverage(pub f32);

impl CoverageShader for ConstantCoverage {
    fn coverage(&self, _x: f32, _y: f32) -> f32 {
        self.0.clamp(0.0, 1.0)
    }
}

#[derive(Debug)]
enum Node {
    Leaf(Arc<dyn CoverageShader>),
    Modulate { top: ClipShader, bottom: ClipShader },
}

/// A cheaply clonable handle to a clip shader or a product of clip shaders.
#[derive(Debug, Clone)]
pub struct ClipShader {
    node: Arc<Node>,
}

impl ClipShader {
    pub fn new(shader: impl CoverageShader + 'static) -> Self {
        Self::from_shared(Arc::new(shader))
    }

    pub fn from_shared(shader: Arc<dyn CoverageShader>) -> Self {
        Self {
            node: Arc::new(Node::Leaf(shader)),
        }
    }

    /// Coverage of `top` multiplied by coverage of `bottom`.
    pub fn modulate(top: ClipShader, bottom: ClipShader) -> Self {
        Self {
            node: Arc::new(Node::Modulate { top, bottom }),
        }
    }

    pub fn coverage(&self, x: f32, y: f32) -> f32 {
        match self.node.as_ref() {
            Node::Leaf(shader) => shader.coverage(x, y),
            Node::Modulate { top, bottom } => top.coverage(x, y) * bottom.coverage(x, y),
        }
    }

    /// Number of leaf shaders combined into this one.
    pub fn layer_count(&self) -> usize {
        match self.node.as_ref() {
            Node::Leaf(_) => 1,
            Node::Modulate { top, bottom } => top.layer_count() + bottom.layer_count(),
        }
    }

    /// True if both handles point at the same shader tree.
    pub fn ptr_eq(&self, other: &ClipShader) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct LeftHalf;

    impl CoverageShader for LeftHalf {
        fn coverage(&self, x: f32, _y: f32) -> f32 {
            if x < 50.0 {
                1.0
            } else {
                0.0
            }
        }
    }

    #[test]
    fn modulated_shaders_multiply() {
        let shader = ClipShader::modulate(
            ClipShader::new(ConstantCoverage(0.5)),
            ClipShader::new(LeftHalf),
        );
        assert_eq!(shader.layer_count(), 2);
        assert_eq!(shader.coverage(10.0, 0.0), 0.5);
        assert_eq!(shader.coverage(60.0, 0.0), 0.0);
    }

    #[test]
    fn constant_coverage_is_clamped() {
        assert_eq!(ClipShader::new(ConstantCoverage(3.0)).coverage(0.0, 0.0), 1.0);
        assert_eq!(ConstantCoverage(-1.0).coverage(0.0, 0.0), 0.0);
    }

    #[test]
    fn clones_share_the_tree() {
        let a = ClipShader::new(ConstantCoverage(1.0));
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&ClipShader::new(ConstantCoverage(1.0))));
    }
}
