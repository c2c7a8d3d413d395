use crate::{NodeSizes, Point};
use std::collections::HashMap;
use std::hash::Hash;

/// A layout engine that computes positions for graph nodes
///
/// Generic over the graph type `G` so that engines can state their own
/// requirements: the layered engine needs directed neighbours, a force
/// directed one would be happy with an undirected graph.
pub trait LayoutEngine<G> {
    /// The type used to identify nodes in the graph
    type NodeId: Copy + Ord + Hash;

    /// The error returned when the graph can't be laid out
    type Error: std::error::Error;

    /// Compute the center of every node of the graph
    ///
    /// # Errors
    /// Engine specific, see [`Self::Error`].
    fn layout<S>(&self, graph: G, sizes: &S) -> Result<HashMap<Self::NodeId, Point>, Self::Error>
    where
        S: NodeSizes<Self::NodeId>;
}
