use crate::Vec2;
use std::collections::HashMap;
use std::hash::Hash;

/// Provides node sizes during layout computation
pub trait NodeSizes<N> {
    fn size(&self, node: N) -> Vec2;
}

impl<N, F> NodeSizes<N> for F
where
    F: Fn(N) -> Vec2,
{
    fn size(&self, node: N) -> Vec2 {
        self(node)
    }
}

/// Nodes missing from the map are laid out as points
impl<N: Eq + Hash + Copy> NodeSizes<N> for HashMap<N, Vec2> {
    fn size(&self, node: N) -> Vec2 {
        self.get(&node).copied().unwrap_or_default()
    }
}

/// Sizes with width and height exchanged, used to lay out top to bottom in a
/// left to right frame
pub struct Transposed<'a, S>(pub &'a S);

impl<N, S> NodeSizes<N> for Transposed<'_, S>
where
    S: NodeSizes<N>,
{
    fn size(&self, node: N) -> Vec2 {
        self.0.size(node).transposed()
    }
}
