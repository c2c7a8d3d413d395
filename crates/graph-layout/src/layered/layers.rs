use super::LayeredLayoutError;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Assign ranks to nodes based on topological order
///
/// - First pass: each node goes one rank after its furthest predecessor
/// - Second pass: nodes are moved toward their successors when possible,
///   shortening the edges leaving sources
///
/// Nodes keep the graph's insertion order inside a rank.
pub(crate) fn assign_layers<N>(
    graph: &DiGraphMap<N, ()>,
) -> Result<Vec<Vec<N>>, LayeredLayoutError<N>>
where
    N: Copy + Ord + Hash + fmt::Debug,
{
    let topo_order = toposort(graph, None)
        .map_err(|cycle| LayeredLayoutError::GraphHasCycle(cycle.node_id()))?;
    let mut rank: HashMap<N, usize> = HashMap::new();

    for &node in &topo_order {
        let max_pred_rank = graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|pred| rank.get(&pred).copied().unwrap_or(0) + 1)
            .max()
            .unwrap_or(0);
        rank.insert(node, max_pred_rank);
    }

    for &node in topo_order.iter().rev() {
        let current = rank.get(&node).copied().unwrap_or(0);
        let min_succ_rank = graph
            .neighbors_directed(node, Direction::Outgoing)
            .map(|succ| rank.get(&succ).copied().unwrap_or(0))
            .min();

        if let Some(min_succ_rank) = min_succ_rank {
            if min_succ_rank > current + 1 {
                rank.insert(node, min_succ_rank - 1);
            }
        }
    }

    let Some(max_rank) = rank.values().max().copied() else {
        return Ok(Vec::new());
    };

    let mut layers = vec![Vec::new(); max_rank + 1];
    for node in graph.nodes() {
        if let Some(&r) = rank.get(&node) {
            layers[r].push(node);
        }
    }

    Ok(layers)
}
