mod acyclic;
mod crossings;
mod layers;
mod positions;

use crate::{LayoutEngine, NodeSizes, Point, RankDir, Transposed, Vec2};
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{IntoNeighborsDirected, IntoNodeIdentifiers};
use petgraph::Direction;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;
use tracing::debug;

use acyclic::break_cycles;
use crossings::minimize_crossings;
use layers::assign_layers;
use positions::assign_coordinates;

/// Errors that can occur during layered layout computation
#[derive(Debug, Error)]
pub enum LayeredLayoutError<N>
where
    N: fmt::Debug,
{
    /// The graph contains a cycle at the given node and cycle breaking is off
    #[error("graph contains a cycle at node {0:?}")]
    GraphHasCycle(N),
}

/// Configuration for the layered (Sugiyama-style) layout
#[derive(Debug, Clone)]
pub struct LayeredLayout {
    /// Gaps between nodes, expressed in the left to right frame: `x` separates
    /// consecutive ranks, `y` separates nodes sharing a rank
    pub spacing: Vec2,

    pub rank_dir: RankDir,

    /// Reverse a feedback arc set instead of failing on cyclic graphs
    pub break_cycles: bool,

    /// Maximum sweeps for crossing minimization
    pub max_crossing_iterations: usize,

    /// Maximum sweeps for in-rank position optimization
    pub max_position_iterations: usize,
}

impl Default for LayeredLayout {
    fn default() -> Self {
        Self {
            spacing: Vec2::new(50.0, 50.0),
            rank_dir: RankDir::default(),
            break_cycles: true,
            max_crossing_iterations: 10,
            max_position_iterations: 50,
        }
    }
}

impl LayeredLayout {
    pub fn new(spacing: Vec2) -> Self {
        Self {
            spacing,
            ..Default::default()
        }
    }

    pub fn with_rank_dir(mut self, rank_dir: RankDir) -> Self {
        self.rank_dir = rank_dir;
        self
    }

    pub fn with_break_cycles(mut self, break_cycles: bool) -> Self {
        self.break_cycles = break_cycles;
        self
    }
}

/// Layer structure that can be cached and reused
#[derive(Debug, Clone)]
pub struct Layers<N>
where
    N: Copy + Ord + Hash,
{
    /// Acyclic copy of the input graph, self loops removed
    pub(crate) graph: DiGraphMap<N, ()>,

    /// Nodes organized into ranks, in their final order
    pub nodes: Vec<Vec<N>>,

    /// Edges that were reversed to make the graph acyclic, as given in the input
    pub reversed: Vec<(N, N)>,

    /// Number of edge crossings between adjacent ranks
    pub crossings: usize,
}

impl<N> Layers<N>
where
    N: Copy + Ord + Hash,
{
    /// Rank of the given node, if it was part of the graph
    pub fn rank_of(&self, node: N) -> Option<usize> {
        self.nodes.iter().position(|layer| layer.contains(&node))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(Vec::len).sum()
    }
}

impl LayeredLayout {
    /// Compute the rank structure
    ///
    /// Only depends on the graph structure, not on node sizes or direction,
    /// so the result can be cached while nodes are being resized.
    ///
    /// # Errors
    /// Returns [`LayeredLayoutError::GraphHasCycle`] if the graph is cyclic
    /// and `break_cycles` is off.
    pub fn compute_layers<G>(
        &self,
        graph: G,
    ) -> Result<Layers<G::NodeId>, LayeredLayoutError<G::NodeId>>
    where
        G: IntoNodeIdentifiers + IntoNeighborsDirected,
        G::NodeId: Copy + Ord + Hash + fmt::Debug,
    {
        let mut internal_graph = DiGraphMap::new();
        for node in graph.node_identifiers() {
            internal_graph.add_node(node);
        }
        for node in graph.node_identifiers() {
            for succ in graph.neighbors_directed(node, Direction::Outgoing) {
                if succ != node {
                    internal_graph.add_edge(node, succ, ());
                }
            }
        }

        let reversed = if self.break_cycles {
            break_cycles(&mut internal_graph)
        } else {
            Vec::new()
        };

        let layers = assign_layers(&internal_graph)?;
        let (layers, crossings) =
            minimize_crossings(&internal_graph, layers, self.max_crossing_iterations);

        debug!(
            "Layered {} nodes into {} ranks, {} reversed edges, {crossings} crossings",
            internal_graph.node_count(),
            layers.len(),
            reversed.len(),
        );

        Ok(Layers {
            graph: internal_graph,
            nodes: layers,
            reversed,
            crossings,
        })
    }

    /// Compute node centers from cached layers
    ///
    /// Cheap compared to [`Self::compute_layers`], rerun it when sizes or the
    /// rank direction change.
    pub fn compute_positions<N, S>(&self, layers: &Layers<N>, sizes: &S) -> HashMap<N, Point>
    where
        N: Copy + Ord + Hash,
        S: NodeSizes<N>,
    {
        match self.rank_dir {
            RankDir::LeftToRight => assign_coordinates(
                &layers.nodes,
                &layers.graph,
                sizes,
                self.spacing,
                self.max_position_iterations,
            ),
            RankDir::TopToBottom => assign_coordinates(
                &layers.nodes,
                &layers.graph,
                &Transposed(sizes),
                self.spacing,
                self.max_position_iterations,
            )
            .into_iter()
            .map(|(node, center)| (node, center.transposed()))
            .collect(),
        }
    }
}

impl<G> LayoutEngine<G> for LayeredLayout
where
    G: IntoNodeIdentifiers + IntoNeighborsDirected,
    G::NodeId: Copy + Ord + Hash + fmt::Debug,
{
    type NodeId = G::NodeId;
    type Error = LayeredLayoutError<G::NodeId>;

    fn layout<S>(&self, graph: G, sizes: &S) -> Result<HashMap<Self::NodeId, Point>, Self::Error>
    where
        S: NodeSizes<Self::NodeId>,
    {
        let layers = self.compute_layers(graph)?;
        Ok(self.compute_positions(&layers, sizes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const SIZE: Vec2 = Vec2 { x: 150.0, y: 50.0 };

    fn sizes(_node: u32) -> Vec2 {
        SIZE
    }

    fn chain() -> DiGraphMap<u32, ()> {
        DiGraphMap::from_edges([(1, 2), (2, 3)])
    }

    fn diamond() -> DiGraphMap<u32, ()> {
        DiGraphMap::from_edges([(1, 2), (1, 3), (2, 4), (3, 4)])
    }

    /// Rectangles of the laid out nodes must not intersect
    fn assert_no_overlap(centers: &HashMap<u32, Point>, size: Vec2) {
        let nodes: Vec<_> = centers.iter().collect();
        for (i, (a, pa)) in nodes.iter().enumerate() {
            for (b, pb) in nodes.iter().skip(i + 1) {
                let overlap_x = (pa.x - pb.x).abs() < size.x;
                let overlap_y = (pa.y - pb.y).abs() < size.y;
                assert!(
                    !(overlap_x && overlap_y),
                    "nodes {a} at {pa:?} and {b} at {pb:?} overlap"
                );
            }
        }
    }

    #[test]
    fn chain_left_to_right() {
        let engine = LayeredLayout::default();
        let centers = engine.layout(&chain(), &sizes).unwrap();

        assert_eq!(centers[&1], Point::new(75.0, 25.0));
        assert_eq!(centers[&2], Point::new(275.0, 25.0));
        assert_eq!(centers[&3], Point::new(475.0, 25.0));
    }

    #[test]
    fn chain_top_to_bottom() {
        let engine = LayeredLayout::default().with_rank_dir(RankDir::TopToBottom);
        let centers = engine.layout(&chain(), &sizes).unwrap();

        assert_eq!(centers[&1], Point::new(75.0, 25.0));
        assert_eq!(centers[&2], Point::new(75.0, 125.0));
        assert_eq!(centers[&3], Point::new(75.0, 225.0));
    }

    #[test]
    fn diamond_ranks_and_spacing() {
        let engine = LayeredLayout::default();
        let layers = engine.compute_layers(&diamond()).unwrap();

        assert_eq!(layers.nodes.len(), 3);
        assert_eq!(layers.rank_of(1), Some(0));
        assert_eq!(layers.rank_of(2), Some(1));
        assert_eq!(layers.rank_of(3), Some(1));
        assert_eq!(layers.rank_of(4), Some(2));
        assert_eq!(layers.crossings, 0);

        let centers = engine.compute_positions(&layers, &sizes);
        assert_eq!(centers[&2].x, centers[&3].x);
        assert!(centers[&1].x < centers[&2].x);
        assert!(centers[&2].x < centers[&4].x);
        assert!((centers[&2].y - centers[&3].y).abs() >= SIZE.y + engine.spacing.y);
        assert_no_overlap(&centers, SIZE);
    }

    #[test]
    fn content_starts_at_origin() {
        let engine = LayeredLayout::default().with_rank_dir(RankDir::TopToBottom);
        let centers = engine.layout(&diamond(), &sizes).unwrap();

        let min_x = centers.values().map(|c| c.x - SIZE.x / 2.0).fold(f32::MAX, f32::min);
        let min_y = centers.values().map(|c| c.y - SIZE.y / 2.0).fold(f32::MAX, f32::min);
        assert_eq!(min_x, 0.0);
        assert_eq!(min_y, 0.0);
    }

    #[test]
    fn cycles_are_broken() {
        let graph = DiGraphMap::<u32, ()>::from_edges([(1, 2), (2, 3), (3, 1)]);
        let engine = LayeredLayout::default();
        let layers = engine.compute_layers(&graph).unwrap();

        assert_eq!(layers.reversed, vec![(3, 1)]);
        assert_eq!(layers.nodes, vec![vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn cycles_fail_without_breaking() {
        let graph = DiGraphMap::<u32, ()>::from_edges([(1, 2), (2, 1)]);
        let engine = LayeredLayout::default().with_break_cycles(false);

        assert!(matches!(
            engine.compute_layers(&graph),
            Err(LayeredLayoutError::GraphHasCycle(_))
        ));
    }

    #[test]
    fn self_loops_are_ignored() {
        let graph = DiGraphMap::<u32, ()>::from_edges([(1, 1), (1, 2)]);
        let engine = LayeredLayout::default().with_break_cycles(false);
        let layers = engine.compute_layers(&graph).unwrap();

        assert!(layers.reversed.is_empty());
        assert_eq!(layers.nodes, vec![vec![1], vec![2]]);
    }

    #[test]
    fn disconnected_nodes_do_not_overlap() {
        let mut graph = DiGraphMap::<u32, ()>::new();
        for node in 1..=4 {
            graph.add_node(node);
        }
        graph.add_edge(5, 6, ());

        let engine = LayeredLayout::default();
        let centers = engine.layout(&graph, &sizes).unwrap();

        assert_eq!(centers.len(), 6);
        assert_no_overlap(&centers, SIZE);
    }

    #[test]
    fn sizes_from_map() {
        let graph = chain();
        let sizes: HashMap<u32, Vec2> = [
            (1, Vec2::new(100.0, 40.0)),
            (2, Vec2::new(200.0, 80.0)),
            (3, Vec2::new(100.0, 40.0)),
        ]
        .into_iter()
        .collect();

        let engine = LayeredLayout::new(Vec2::new(10.0, 10.0));
        let centers = engine.layout(&graph, &sizes).unwrap();

        assert_eq!(centers[&1].x, 50.0);
        assert_eq!(centers[&2].x, 100.0 + 10.0 + 100.0);
        assert_eq!(centers[&3].x, 100.0 + 10.0 + 200.0 + 10.0 + 50.0);
    }

    #[test]
    fn empty_graph() {
        let graph = DiGraphMap::<u32, ()>::new();
        let engine = LayeredLayout::default();
        let layers = engine.compute_layers(&graph).unwrap();

        assert_eq!(layers.node_count(), 0);
        assert!(engine.compute_positions(&layers, &sizes).is_empty());
    }
}
